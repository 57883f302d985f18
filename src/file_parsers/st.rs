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

    src/file_parsers/st.rs

    A parser for ST images, a raw dump of every sector on the disk in
    side-major, track-major order. There is no header; geometry comes from
    the boot sector and the image size.
*/

use crate::{
    boot_sector::BootSector,
    file_parsers::{FormatCaps, SectorImage},
    geometry,
    io::{ReadSeek, ReadWriteSeek, SeekFrom},
    util::get_length,
    FloppyError,
    DEFAULT_SECTOR_SIZE,
    MAX_IMAGE_SIZE,
};

pub struct StFormat;

impl StFormat {
    pub(crate) fn extensions() -> Vec<&'static str> {
        vec!["st"]
    }

    pub(crate) fn capabilities() -> FormatCaps {
        FormatCaps::CAP_WRITE_BACK
    }

    /// An ST image has no signature, so we accept anything sector aligned that either has a
    /// size the geometry table knows, or starts with a BPB declaring 512-byte sectors.
    pub(crate) fn detect<RS: ReadSeek>(mut image: RS) -> bool {
        let raw_len = get_length(&mut image).map_or(0, |l| l as usize);
        if raw_len < DEFAULT_SECTOR_SIZE || raw_len % DEFAULT_SECTOR_SIZE != 0 {
            return false;
        }

        if geometry::known_layout(raw_len).is_some() {
            return true;
        }

        match BootSector::new(&mut image) {
            Ok(boot_sector) => boot_sector.bpb().is_valid(),
            Err(_) => false,
        }
    }

    pub(crate) fn load_image<RS: ReadSeek>(mut read_buf: RS) -> Result<SectorImage, FloppyError> {
        let raw_len = get_length(&mut read_buf)? as usize;

        if raw_len < DEFAULT_SECTOR_SIZE {
            log::error!("StFormat::load_image(): Image too small: {} bytes", raw_len);
            return Err(FloppyError::DecodeError(format!("ST image of {} bytes is too small", raw_len)));
        }
        if raw_len % DEFAULT_SECTOR_SIZE != 0 {
            log::error!(
                "StFormat::load_image(): Image size {} is not a multiple of the sector size",
                raw_len
            );
            return Err(FloppyError::DecodeError(format!(
                "ST image size {} is not a multiple of {}",
                raw_len, DEFAULT_SECTOR_SIZE
            )));
        }
        if raw_len > MAX_IMAGE_SIZE {
            return Err(FloppyError::DecodeError("ST image is too large".to_string()));
        }

        let mut data = vec![0u8; raw_len];
        read_buf.seek(SeekFrom::Start(0))?;
        read_buf.read_exact(&mut data)?;

        log::trace!("StFormat::load_image(): Read {} sectors", raw_len / DEFAULT_SECTOR_SIZE);
        Ok(SectorImage {
            data,
            ..Default::default()
        })
    }

    pub(crate) fn save_image<RWS: ReadWriteSeek>(image: &SectorImage, write_buf: &mut RWS) -> Result<(), FloppyError> {
        if image.data.is_empty() || image.data.len() % DEFAULT_SECTOR_SIZE != 0 {
            return Err(FloppyError::EncodeError(format!(
                "cannot write {} bytes as an ST image",
                image.data.len()
            )));
        }
        write_buf.write_all(&image.data)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    #[test]
    fn test_detect_by_size() {
        assert!(StFormat::detect(Cursor::new(vec![0u8; 80 * 9 * 512])));
        assert!(!StFormat::detect(Cursor::new(vec![0u8; 1000])));
    }

    #[test]
    fn test_detect_by_bpb() {
        let mut image = vec![0u8; 40 * 9 * 512];
        image[11..13].copy_from_slice(&512u16.to_le_bytes());
        image[24] = 9;
        image[26] = 1;
        assert!(StFormat::detect(Cursor::new(&image)));
        image[12] = 0;
        assert!(!StFormat::detect(Cursor::new(&image)));
    }

    #[test]
    fn test_load_rejects_ragged_size() {
        let result = StFormat::load_image(Cursor::new(vec![0u8; 513]));
        assert!(matches!(result, Err(FloppyError::DecodeError(_))));
    }

    #[test]
    fn test_save_is_identity() {
        let data: Vec<u8> = (0..1024).map(|i| (i % 251) as u8).collect();
        let image = StFormat::load_image(Cursor::new(&data)).unwrap();
        let mut out = Cursor::new(Vec::new());
        StFormat::save_image(&image, &mut out).unwrap();
        assert_eq!(out.into_inner(), data);
    }
}
