/*
    FloppyBay
    https://github.com/dbalsom/floppybay

    Copyright 2024 Daniel Balsom

    Permission is hereby granted, free of charge, to any person obtaining a
    copy of this software and associated documentation files (the “Software”),
    to deal in the Software without restriction, including without limitation
    the rights to use, copy, modify, merge, publish, distribute, sublicense,
    and/or sell copies of the Software, and to permit persons to whom the
    Software is furnished to do so, subject to the following conditions:

    The above copyright notice and this permission notice shall be included in
    all copies or substantial portions of the Software.

    THE SOFTWARE IS PROVIDED “AS IS”, WITHOUT WARRANTY OF ANY KIND, EXPRESS OR
    IMPLIED, INCLUDING BUT NOT LIMITED TO THE WARRANTIES OF MERCHANTABILITY,
    FITNESS FOR A PARTICULAR PURPOSE AND NONINFRINGEMENT. IN NO EVENT SHALL THE
    AUTHORS OR COPYRIGHT HOLDERS BE LIABLE FOR ANY CLAIM, DAMAGES OR OTHER
    LIABILITY, WHETHER IN AN ACTION OF CONTRACT, TORT OR OTHERWISE, ARISING
    FROM, OUT OF OR IN CONNECTION WITH THE SOFTWARE OR THE USE OR OTHER
    DEALINGS IN THE SOFTWARE.

    --------------------------------------------------------------------------

    src/drive/mod.rs

    Physical drive state and sector I/O.
*/

//! A [DriveState] models one of the two physical drives. While a disk is inserted the drive owns
//! a working copy of the catalog slot's [DiskImage], and translates (track, side, sector)
//! addresses into offsets within its canonical buffer.

pub mod transition;

use crate::{
    disk_image::DiskImage,
    drive::transition::DriveTransition,
    types::{DriveId, Geometry, ImageKind},
    FloppyError,
    DEFAULT_SECTOR_SIZE,
};

#[derive(Clone, Debug)]
pub struct DriveState {
    pub(crate) id: DriveId,
    pub(crate) active_slot: Option<usize>,
    pub(crate) inserted: bool,
    pub(crate) image: Option<DiskImage>,
    pub(crate) geometry: Geometry,
    pub(crate) ok_to_persist: bool,
    pub(crate) write_protected: bool,
    pub(crate) transition: DriveTransition,
}

impl DriveState {
    pub fn new(id: DriveId, transition_delay: u32) -> DriveState {
        DriveState {
            id,
            active_slot: None,
            inserted: false,
            image: None,
            geometry: Geometry::default(),
            ok_to_persist: false,
            write_protected: false,
            transition: DriveTransition::new(transition_delay),
        }
    }

    pub fn id(&self) -> DriveId {
        self.id
    }

    pub fn active_slot(&self) -> Option<usize> {
        self.active_slot
    }

    pub fn is_inserted(&self) -> bool {
        self.inserted
    }

    pub fn image(&self) -> Option<&DiskImage> {
        self.image.as_ref()
    }

    pub fn image_kind(&self) -> ImageKind {
        self.image.as_ref().map_or(ImageKind::None, |image| image.kind())
    }

    pub fn geometry(&self) -> Geometry {
        self.geometry
    }

    pub fn is_modified(&self) -> bool {
        self.image.as_ref().is_some_and(|image| image.is_modified())
    }

    pub fn ok_to_persist(&self) -> bool {
        self.ok_to_persist
    }

    /// Return true if the drive is explicitly write protected.
    pub fn is_write_protected(&self) -> bool {
        self.write_protected
    }

    pub fn transition(&self) -> &DriveTransition {
        &self.transition
    }

    /// Present a working copy of a slot's image to the controller.
    pub(crate) fn present(&mut self, slot: usize, mut image: DiskImage) {
        image.modified = false;
        self.geometry = image.geometry();
        self.ok_to_persist = image.can_persist();
        self.active_slot = Some(slot);
        self.image = Some(image);
        self.inserted = true;
    }

    /// Take the working copy out of the drive. The slot selection is kept.
    pub(crate) fn remove(&mut self) -> Option<DiskImage> {
        self.inserted = false;
        self.ok_to_persist = false;
        self.geometry = Geometry::default();
        self.image.take()
    }

    /// Translate an address into a byte offset within the canonical buffer, checking that a
    /// disk is inserted and that the address fits its geometry.
    pub fn sector_offset(&self, track: u16, side: u16, sector: u16) -> Result<usize, FloppyError> {
        if !self.inserted || self.image.is_none() {
            return Err(FloppyError::ImageUnavailable);
        }

        let geom = self.geometry;
        let out_of_range = || FloppyError::GeometryOutOfRange {
            track,
            side,
            sector,
            geometry: geom,
        };

        if side >= geom.sides {
            return Err(out_of_range());
        }
        if track >= geom.tracks {
            return Err(out_of_range());
        }
        if sector < 1 || sector > geom.sectors_per_track {
            return Err(out_of_range());
        }

        let track_size = geom.track_size();
        Ok(track_size * side as usize
            + track_size * geom.sides as usize * track as usize
            + DEFAULT_SECTOR_SIZE * (sector as usize - 1))
    }

    /// Resolve an address and sector count into a byte range. A negative count means the rest
    /// of the track.
    fn sector_range(
        &self,
        track: u16,
        side: u16,
        sector: u16,
        count: i32,
    ) -> Result<std::ops::Range<usize>, FloppyError> {
        let offset = self.sector_offset(track, side, sector)?;
        let count = if count < 0 {
            self.geometry.sectors_per_track as usize
        }
        else {
            count as usize
        };

        let end = offset + count * DEFAULT_SECTOR_SIZE;
        let len = self.image.as_ref().map_or(0, |image| image.data.len());
        if end > len {
            return Err(FloppyError::GeometryOutOfRange {
                track,
                side,
                sector,
                geometry: self.geometry,
            });
        }
        Ok(offset..end)
    }

    /// Read `count` sectors starting at the given address.
    pub fn read_sectors(&self, track: u16, side: u16, sector: u16, count: i32) -> Result<&[u8], FloppyError> {
        let range = self.sector_range(track, side, sector, count)?;
        log::trace!(
            "DriveState::read_sectors(): {} t:{} h:{} s:{} bytes: {}",
            self.id,
            track,
            side,
            sector,
            range.len()
        );
        match &self.image {
            Some(image) => Ok(&image.data[range]),
            None => Err(FloppyError::ImageUnavailable),
        }
    }

    /// Write whole sectors starting at the given address. `protected` is the combined write
    /// protection state of the drive; a protected drive is not touched.
    pub(crate) fn write_sectors(
        &mut self,
        track: u16,
        side: u16,
        sector: u16,
        data: &[u8],
        protected: bool,
    ) -> Result<(), FloppyError> {
        let count = data.len().div_ceil(DEFAULT_SECTOR_SIZE) as i32;
        let range = self.sector_range(track, side, sector, count)?;

        if protected {
            log::debug!("DriveState::write_sectors(): {} is write protected", self.id);
            return Err(FloppyError::WriteProtected);
        }

        let image = self.image.as_mut().ok_or(FloppyError::ImageUnavailable)?;
        image.data[range.start..range.start + data.len()].copy_from_slice(data);
        image.modified = true;

        log::trace!(
            "DriveState::write_sectors(): {} t:{} h:{} s:{} bytes: {}",
            self.id,
            track,
            side,
            sector,
            data.len()
        );
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::ImageFormat;

    fn drive_with_image(tracks: u16, sides: u16, spt: u16) -> DriveState {
        let len = tracks as usize * sides as usize * spt as usize * DEFAULT_SECTOR_SIZE;
        let mut data: Vec<u8> = (0..len).map(|i| (i / DEFAULT_SECTOR_SIZE) as u8).collect();
        data[..32].fill(0);
        data[13] = 2;
        data[19..21].copy_from_slice(&((len / 512) as u16).to_le_bytes());
        data[24] = spt as u8;
        data[26] = sides as u8;

        let image = DiskImage {
            display_name: "test.st".to_string(),
            data,
            source_format: Some(ImageFormat::St),
            kind: ImageKind::PlainSector,
            ..Default::default()
        };
        let mut drive = DriveState::new(DriveId::A, 18);
        drive.present(0, image);
        drive
    }

    #[test]
    fn test_offsets() {
        let drive = drive_with_image(80, 2, 9);
        assert_eq!(drive.geometry(), Geometry::new(80, 2, 9));
        assert_eq!(drive.sector_offset(0, 0, 1), Ok(0));
        assert_eq!(drive.sector_offset(0, 1, 1), Ok(9 * 512));
        assert_eq!(drive.sector_offset(1, 0, 3), Ok(2 * 9 * 512 + 2 * 512));
    }

    #[test]
    fn test_address_checks() {
        let drive = drive_with_image(80, 1, 9);
        assert!(matches!(
            drive.sector_offset(0, 1, 1),
            Err(FloppyError::GeometryOutOfRange { side: 1, .. })
        ));
        assert!(matches!(
            drive.sector_offset(80, 0, 1),
            Err(FloppyError::GeometryOutOfRange { track: 80, .. })
        ));
        assert!(drive.sector_offset(79, 0, 1).is_ok());
        assert!(drive.sector_offset(0, 0, 0).is_err());
        assert!(drive.sector_offset(0, 0, 10).is_err());
    }

    #[test]
    fn test_read_whole_track() {
        let drive = drive_with_image(80, 2, 9);
        let track = drive.read_sectors(3, 1, 1, -1).unwrap();
        assert_eq!(track.len(), 9 * 512);
        // Sector index 3 * 18 + 9 holds its own index in every byte.
        assert!(track[..512].iter().all(|&b| b == 63));
    }

    #[test]
    fn test_read_past_end() {
        let drive = drive_with_image(80, 1, 9);
        assert!(drive.read_sectors(79, 0, 9, 2).is_err());
        assert!(drive.read_sectors(79, 0, 9, 1).is_ok());
    }

    #[test]
    fn test_write_marks_modified() {
        let mut drive = drive_with_image(80, 1, 9);
        drive.write_sectors(5, 0, 2, &[0xAA; 512], false).unwrap();
        assert!(drive.is_modified());
        assert!(drive.read_sectors(5, 0, 2, 1).unwrap().iter().all(|&b| b == 0xAA));
    }

    #[test]
    fn test_write_protected_no_change() {
        let mut drive = drive_with_image(80, 1, 9);
        let before = drive.image().unwrap().data().to_vec();
        assert_eq!(
            drive.write_sectors(5, 0, 2, &[0xAA; 512], true),
            Err(FloppyError::WriteProtected)
        );
        assert_eq!(drive.image().unwrap().data(), &before[..]);
        assert!(!drive.is_modified());
    }

    #[test]
    fn test_empty_drive() {
        let drive = DriveState::new(DriveId::B, 18);
        assert_eq!(drive.read_sectors(0, 0, 1, 1), Err(FloppyError::ImageUnavailable));
    }
}
