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

    src/file_parsers/dim.rs

    A parser for FastCopy Pro DIM images: a 32-byte header followed by a raw
    sector dump. Only images holding every sector of the disk are supported.
*/

use crate::{
    file_parsers::{FormatCaps, SectorImage},
    io::{Cursor, ReadSeek, ReadWriteSeek, SeekFrom},
    util::get_length,
    FloppyError,
    DEFAULT_SECTOR_SIZE,
    MAX_IMAGE_SIZE,
};
use binrw::{binrw, BinRead, BinWrite};

pub const DIM_SIGNATURE: u16 = 0x4242;
pub const DIM_HEADER_SIZE: usize = 32;

#[derive(Clone, Debug, Default)]
#[binrw]
#[brw(little)]
pub(crate) struct DimHeader {
    signature: u16,
    unused0: u8,
    used_sectors_only: u8, // Non-zero if only allocated sectors were copied.
    unused1: [u8; 2],
    sides: u8, // Stored as sides - 1
    unused2: u8,
    sectors_per_track: u8,
    unused3: u8,
    start_track: u8,
    unused4: u8,
    end_track: u8,
    density: u8,
    reserved: [u8; 18],
}

impl DimHeader {
    fn is_supported(&self) -> bool {
        self.signature == DIM_SIGNATURE && self.used_sectors_only == 0 && self.start_track == 0
    }
}

pub struct DimFormat;

impl DimFormat {
    pub(crate) fn extensions() -> Vec<&'static str> {
        vec!["dim"]
    }

    pub(crate) fn capabilities() -> FormatCaps {
        FormatCaps::CAP_WRITE_BACK | FormatCaps::CAP_GEOMETRY_HEADER
    }

    pub(crate) fn detect<RS: ReadSeek>(mut image: RS) -> bool {
        let mut detected = false;
        _ = image.seek(SeekFrom::Start(0));

        if let Ok(header) = DimHeader::read(&mut image) {
            detected = header.signature == DIM_SIGNATURE;
        }

        detected
    }

    pub(crate) fn load_image<RS: ReadSeek>(mut read_buf: RS) -> Result<SectorImage, FloppyError> {
        let raw_len = get_length(&mut read_buf)? as usize;
        if raw_len > MAX_IMAGE_SIZE {
            return Err(FloppyError::DecodeError("DIM image is too large".to_string()));
        }

        let mut header_buf = [0u8; DIM_HEADER_SIZE];
        read_buf
            .read_exact(&mut header_buf)
            .map_err(|_| FloppyError::DecodeError("DIM header truncated".to_string()))?;
        let header = DimHeader::read(&mut Cursor::new(&header_buf))?;

        if !header.is_supported() {
            log::error!(
                "DimFormat::load_image(): Unsupported DIM image: sig: {:04X} used sectors only: {} start track: {}",
                header.signature,
                header.used_sectors_only,
                header.start_track
            );
            return Err(FloppyError::DecodeError("not a supported DIM image".to_string()));
        }

        let data_len = raw_len - DIM_HEADER_SIZE;
        if data_len == 0 || data_len % DEFAULT_SECTOR_SIZE != 0 {
            return Err(FloppyError::DecodeError(format!(
                "DIM sector data of {} bytes is not a whole number of sectors",
                data_len
            )));
        }

        let mut data = vec![0u8; data_len];
        read_buf.read_exact(&mut data)?;

        log::trace!(
            "DimFormat::load_image(): sides: {} spt: {} end track: {} density: {}",
            header.sides as u16 + 1,
            header.sectors_per_track,
            header.end_track,
            header.density
        );

        Ok(SectorImage {
            data,
            sides: header.sides as u16 + 1,
            sectors_per_track: header.sectors_per_track as u16,
            header: Some(header_buf.to_vec()),
        })
    }

    /// Write the image back, re-using the original header if there is one so that fields we do
    /// not interpret survive. Geometry fields are patched to match `image`.
    pub(crate) fn save_image<RWS: ReadWriteSeek>(image: &SectorImage, write_buf: &mut RWS) -> Result<(), FloppyError> {
        let sides = image.sides as usize;
        let spt = image.sectors_per_track as usize;
        if sides == 0 || sides > 2 || spt == 0 || spt > u8::MAX as usize {
            return Err(FloppyError::EncodeError(format!(
                "cannot write DIM with {} sides and {} sectors per track",
                sides, spt
            )));
        }

        let track_size = spt * DEFAULT_SECTOR_SIZE * sides;
        if image.data.is_empty() || image.data.len() % track_size != 0 {
            return Err(FloppyError::EncodeError(format!(
                "image of {} bytes is not a whole number of tracks",
                image.data.len()
            )));
        }
        let track_ct = image.data.len() / track_size;
        if track_ct > u8::MAX as usize + 1 {
            return Err(FloppyError::EncodeError(format!("{} tracks is too many for DIM", track_ct)));
        }

        let mut header = match &image.header {
            Some(header_buf) => DimHeader::read(&mut Cursor::new(header_buf))?,
            None => DimHeader {
                signature: DIM_SIGNATURE,
                ..Default::default()
            },
        };
        header.sides = (sides - 1) as u8;
        header.sectors_per_track = spt as u8;
        header.start_track = 0;
        header.end_track = (track_ct - 1) as u8;

        header.write(write_buf)?;
        write_buf.write_all(&image.data)?;
        Ok(())
    }
}
