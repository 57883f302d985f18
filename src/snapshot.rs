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

    src/snapshot.rs

    Save-state capture and restore for the drives of a catalog.
*/

//! Save-state support. A snapshot holds the frame tick and, for each drive, the inserted image,
//! its flags and the transition timer with its absolute ticks. Catalog slots are not captured;
//! on restore each inserted drive is matched back to a slot by display name.
//!
//! The blob is big-endian:
//!
//! ```text
//! "FBSS" version:u32 tick:u64
//! per drive, A then B:
//!   image_kind:u8 source_format:u8 inserted:u8 image_len:u32 image:[u8; image_len]
//!   name_len:u16 name:[u8; name_len]
//!   modified:u8 ok_to_persist:u8
//!   sides:u16 sectors_per_track:u16 archived:u8 header_len:u16 header:[u8; header_len]
//!   state1:u8 state1_start:u64 state2:u8 state2_start:u64
//! ```
//!
//! Image and header bytes are only present for inserted drives. The geometry is the one the drive
//! presented, restored as is rather than inferred again from the image.

use binrw::{binrw, BinRead, BinWrite};

use crate::{
    catalog::Catalog,
    disk_image::DiskImage,
    drive::transition::PendingTransition,
    io::Cursor,
    types::{DriveId, Geometry, ImageFormat, ImageKind, TransitionKind},
    FloppyError,
    MAX_IMAGE_SIZE,
};

pub const SNAPSHOT_VERSION: u32 = 1;

#[binrw]
#[brw(big, magic = b"FBSS")]
#[derive(Debug)]
struct SnapshotHeader {
    version: u32,
    tick:    u64,
}

#[binrw]
#[brw(big)]
#[derive(Debug, Default)]
struct DriveRecord {
    image_kind: u8,
    source_format: u8,
    inserted: u8,
    #[br(assert(image_len as usize <= MAX_IMAGE_SIZE, "image length {} is too large", image_len))]
    image_len: u32,
    #[br(count = if inserted != 0 { image_len as usize } else { 0 })]
    image: Vec<u8>,
    name_len: u16,
    #[br(count = name_len)]
    name: Vec<u8>,
    modified: u8,
    ok_to_persist: u8,
    sides: u16,
    sectors_per_track: u16,
    archived: u8,
    header_len: u16,
    #[br(count = if inserted != 0 { header_len as usize } else { 0 })]
    header: Vec<u8>,
    state1: u8,
    state1_start: u64,
    state2: u8,
    state2_start: u64,
}

/// A drive record after validation, ready to apply.
struct RestoredDrive {
    image: Option<DiskImage>,
    geometry: Geometry,
    ok_to_persist: bool,
    state1: Option<PendingTransition>,
    state2: Option<PendingTransition>,
}

fn pending(tag: u8, start: u64) -> Result<Option<PendingTransition>, FloppyError> {
    let kind = TransitionKind::from_tag(tag)
        .map_err(|tag| FloppyError::IncompatibleSnapshot(format!("bad transition tag {}", tag)))?;
    Ok(kind.map(|kind| PendingTransition { kind, start }))
}

impl DriveRecord {
    fn validate(self) -> Result<RestoredDrive, FloppyError> {
        let state1 = pending(self.state1, self.state1_start)?;
        let state2 = pending(self.state2, self.state2_start)?;

        if self.inserted == 0 {
            return Ok(RestoredDrive {
                image: None,
                geometry: Geometry::default(),
                ok_to_persist: false,
                state1,
                state2,
            });
        }

        let kind = ImageKind::from_tag(self.image_kind)
            .filter(|kind| *kind != ImageKind::None)
            .ok_or_else(|| FloppyError::IncompatibleSnapshot(format!("bad image kind {}", self.image_kind)))?;
        let source_format = ImageFormat::from_tag(self.source_format)
            .filter(|format| format.kind() == kind)
            .ok_or_else(|| FloppyError::IncompatibleSnapshot(format!("bad image format {}", self.source_format)))?;
        if self.image.is_empty() {
            return Err(FloppyError::IncompatibleSnapshot("inserted drive has no image".to_string()));
        }
        let name = String::from_utf8(self.name)
            .map_err(|_| FloppyError::IncompatibleSnapshot("image name is not valid UTF-8".to_string()))?;

        let geometry = Geometry::from_image_len(self.image.len(), self.sides, self.sectors_per_track);
        let image = DiskImage {
            display_name: name,
            data: self.image,
            source_format: Some(source_format),
            kind,
            archived: self.archived != 0,
            container_geometry: Some((self.sides, self.sectors_per_track)).filter(|(sides, spt)| *sides > 0 && *spt > 0),
            header: Some(self.header).filter(|header| !header.is_empty()),
            modified: self.modified != 0,
            ..Default::default()
        };

        Ok(RestoredDrive {
            image: Some(image),
            geometry,
            ok_to_persist: self.ok_to_persist != 0,
            state1,
            state2,
        })
    }
}

fn parse_snapshot(bytes: &[u8]) -> Result<(u64, [RestoredDrive; 2]), FloppyError> {
    let incompatible = |e: binrw::Error| FloppyError::IncompatibleSnapshot(e.to_string());
    let mut reader = Cursor::new(bytes);

    let header = SnapshotHeader::read(&mut reader).map_err(incompatible)?;
    if header.version != SNAPSHOT_VERSION {
        return Err(FloppyError::IncompatibleSnapshot(format!(
            "version {} (expected {})",
            header.version, SNAPSHOT_VERSION
        )));
    }

    let drive_a = DriveRecord::read(&mut reader).map_err(incompatible)?.validate()?;
    let drive_b = DriveRecord::read(&mut reader).map_err(incompatible)?.validate()?;
    Ok((header.tick, [drive_a, drive_b]))
}

impl Catalog {
    /// Capture the state of both drives.
    pub fn save_snapshot(&self) -> Result<Vec<u8>, FloppyError> {
        let mut writer = Cursor::new(Vec::new());
        SnapshotHeader {
            version: SNAPSHOT_VERSION,
            tick:    self.tick,
        }
        .write(&mut writer)?;

        for state in self.drives.iter() {
            let transition = state.transition();
            let mut record = DriveRecord {
                state1: TransitionKind::to_tag(transition.state1.map(|s| s.kind)),
                state1_start: transition.state1.map_or(0, |s| s.start),
                state2: TransitionKind::to_tag(transition.state2.map(|s| s.kind)),
                state2_start: transition.state2.map_or(0, |s| s.start),
                ..Default::default()
            };

            if let Some(image) = state.image().filter(|_| state.is_inserted()) {
                let name = image.name().as_bytes();
                record.image_kind = image.kind().to_tag();
                record.source_format = image.source_format().map_or(0, |format| format.to_tag());
                record.inserted = 1;
                record.image_len = u32::try_from(image.data().len())
                    .map_err(|_| FloppyError::EncodeError("image too large for a snapshot".to_string()))?;
                record.image = image.data().to_vec();
                record.name_len = u16::try_from(name.len())
                    .map_err(|_| FloppyError::EncodeError("image name too long for a snapshot".to_string()))?;
                record.name = name.to_vec();
                record.modified = image.is_modified() as u8;
                record.ok_to_persist = state.ok_to_persist() as u8;
                record.sides = state.geometry().sides;
                record.sectors_per_track = state.geometry().sectors_per_track;
                record.archived = image.is_archived() as u8;
                if let Some(header) = &image.header {
                    record.header_len = u16::try_from(header.len())
                        .map_err(|_| FloppyError::EncodeError("image header too long for a snapshot".to_string()))?;
                    record.header = header.clone();
                }
            }
            record.write(&mut writer)?;
        }

        log::debug!(
            "Catalog::save_snapshot(): {} bytes at tick {}",
            writer.get_ref().len(),
            self.tick
        );
        Ok(writer.into_inner())
    }

    /// Restore the state of both drives. The snapshot is validated completely before anything
    /// changes; a rejected snapshot leaves the catalog as it was.
    ///
    /// Drives inserted at the time of the restore are ejected first. Their changes are only
    /// persisted if [FloppyConfig::persist_on_restore](crate::FloppyConfig) allows it.
    pub fn restore_snapshot(&mut self, bytes: &[u8]) -> Result<(), FloppyError> {
        let (tick, restored) = parse_snapshot(bytes)?;

        let persist = self.config.persist_on_restore;
        for drive in [DriveId::A, DriveId::B] {
            self.eject(drive, persist);
        }

        self.tick = tick;
        // A slot may only be presented by one drive, even if two slots share a name.
        let mut claimed = None;
        for (drive, record) in [DriveId::A, DriveId::B].into_iter().zip(restored) {
            let slot = record.image.as_ref().and_then(|image| {
                self.slots
                    .iter()
                    .enumerate()
                    .position(|(idx, slot)| slot.display_name == image.display_name && claimed != Some(idx))
            });
            if slot.is_some() {
                claimed = slot;
            }
            let saved = match (&record.image, slot) {
                (Some(_), Some(slot)) => self.slots[slot].is_saved(),
                (Some(image), None) => self.save_store.exists(image.name()),
                _ => false,
            };

            let state = &mut self.drives[drive.index()];
            state.transition.state1 = record.state1;
            state.transition.state2 = record.state2;

            match record.image {
                Some(mut image) => {
                    state.active_slot = slot;
                    state.geometry = record.geometry;
                    // Content that already made it to the save store must be written again at
                    // the next eject, or the save would be lost.
                    image.modified |= saved;
                    state.image = Some(image);
                    state.inserted = true;
                    state.ok_to_persist = record.ok_to_persist;

                    match slot {
                        Some(slot) => log::debug!("Catalog::restore_snapshot(): {} -> slot {}", drive, slot),
                        None => log::warn!("Catalog::restore_snapshot(): {} holds an image that is not in the catalog", drive),
                    }
                }
                None => {
                    state.inserted = false;
                    state.image = None;
                    state.ok_to_persist = false;
                    state.geometry = Geometry::default();
                }
            }
        }

        log::info!("Catalog::restore_snapshot(): restored at tick {}", tick);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::FloppyConfig;

    fn st_image() -> Vec<u8> {
        let mut image = vec![0u8; 80 * 9 * 512];
        image[11..13].copy_from_slice(&512u16.to_le_bytes());
        image[13] = 2;
        image[19..21].copy_from_slice(&720u16.to_le_bytes());
        image[24] = 9;
        image[26] = 1;
        image
    }

    #[test]
    fn test_empty_catalog_snapshot() {
        let catalog = Catalog::new(FloppyConfig::default());
        let blob = catalog.save_snapshot().unwrap();
        // header + two empty drive records
        assert_eq!(blob.len(), 16 + 2 * (3 + 4 + 2 + 2 + 7 + 18));
        assert_eq!(&blob[0..4], b"FBSS");
    }

    #[test]
    fn test_bad_magic() {
        let mut catalog = Catalog::new(FloppyConfig::default());
        let mut blob = catalog.save_snapshot().unwrap();
        blob[0] = b'X';
        assert!(matches!(
            catalog.restore_snapshot(&blob),
            Err(FloppyError::IncompatibleSnapshot(_))
        ));
    }

    #[test]
    fn test_version_mismatch() {
        let mut catalog = Catalog::new(FloppyConfig::default());
        catalog.load_content(Some("game.st"), &st_image()).unwrap();
        let mut blob = catalog.save_snapshot().unwrap();
        blob[7] = 2;

        catalog.set_tick(77);
        assert!(matches!(
            catalog.restore_snapshot(&blob),
            Err(FloppyError::IncompatibleSnapshot(_))
        ));
        // Nothing changed.
        assert_eq!(catalog.tick(), 77);
        assert!(catalog.is_inserted(DriveId::A));
    }

    #[test]
    fn test_truncated() {
        let mut catalog = Catalog::new(FloppyConfig::default());
        catalog.load_content(Some("game.st"), &st_image()).unwrap();
        let blob = catalog.save_snapshot().unwrap();
        assert!(matches!(
            catalog.restore_snapshot(&blob[..blob.len() / 2]),
            Err(FloppyError::IncompatibleSnapshot(_))
        ));
        assert!(catalog.is_inserted(DriveId::A));
    }

    #[test]
    fn test_restore_transition_ticks() {
        let mut catalog = Catalog::new(FloppyConfig::default());
        catalog.set_tick(1234);
        catalog.load_content(Some("game.st"), &st_image()).unwrap();
        let blob = catalog.save_snapshot().unwrap();

        catalog.set_tick(5000);
        catalog.set_inserted(DriveId::A, false).unwrap();
        catalog.restore_snapshot(&blob).unwrap();

        assert_eq!(catalog.tick(), 1234);
        assert!(catalog.is_inserted(DriveId::A));
        assert_eq!(catalog.active_slot(DriveId::A), Some(0));
        let state1 = catalog.drive(DriveId::A).transition().state1().unwrap();
        assert_eq!(state1.kind, TransitionKind::Insert);
        assert_eq!(state1.start, 1234);
        assert_eq!(catalog.drive(DriveId::A).transition().state2(), None);
    }

    #[test]
    fn test_tick_at_limit_does_not_panic() {
        let mut catalog = Catalog::new(FloppyConfig::default());
        let mut blob = catalog.save_snapshot().unwrap();
        // Drive A record: 18 bytes of empty image fields, then the first transition.
        let state1 = 16 + 18;
        blob[state1] = 2;
        blob[state1 + 1..state1 + 9].copy_from_slice(&u64::MAX.to_be_bytes());

        catalog.restore_snapshot(&blob).unwrap();
        assert_eq!(
            catalog.current_write_protect_override(DriveId::A),
            crate::WriteProtectOverride::ForceProtected
        );
        catalog.set_tick(u64::MAX);
        catalog.advance_frame();
        assert_eq!(catalog.tick(), u64::MAX);
        assert_eq!(
            catalog.current_write_protect_override(DriveId::A),
            crate::WriteProtectOverride::None
        );
    }
}
