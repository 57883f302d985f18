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

    src/file_parsers/msa.rs

    A parser for Magic Shadow Archiver (MSA) images.
    
    An MSA file is a short big-endian header followed by each track of each
    side, in the same order as an ST image. Each track is prefixed with its
    stored length; a track shorter than a full track is run-length encoded
    with 0xE5 as the escape byte.
*/

use crate::{
    file_parsers::{FormatCaps, SectorImage},
    io::{ReadSeek, ReadWriteSeek, SeekFrom},
    util::get_length,
    FloppyError,
    DEFAULT_SECTOR_SIZE,
    MAX_IMAGE_SIZE,
};
use binrw::{binrw, BinRead, BinWrite};

pub const MSA_SIGNATURE: u16 = 0x0E0F;
pub const MSA_RLE_MARKER: u8 = 0xE5;
// Highest track number we will accept. Extended formats go a few tracks past 80.
pub const MSA_MAX_TRACK: u16 = 85;
pub const MSA_MAX_SPT: u16 = 64;

#[derive(Debug)]
#[binrw]
#[brw(big)]
pub(crate) struct MsaHeader {
    signature: u16,
    sectors_per_track: u16,
    sides: u16, // Stored as sides - 1
    start_track: u16,
    end_track: u16,
}

impl MsaHeader {
    fn is_valid(&self) -> bool {
        self.signature == MSA_SIGNATURE
            && (1..=MSA_MAX_SPT).contains(&self.sectors_per_track)
            && self.sides <= 1
            && self.start_track <= self.end_track
            && self.end_track <= MSA_MAX_TRACK
    }
}

pub struct MsaFormat;

impl MsaFormat {
    pub(crate) fn extensions() -> Vec<&'static str> {
        vec!["msa"]
    }

    pub(crate) fn capabilities() -> FormatCaps {
        FormatCaps::CAP_WRITE_BACK | FormatCaps::CAP_GEOMETRY_HEADER | FormatCaps::CAP_COMPRESSION
    }

    pub(crate) fn detect<RS: ReadSeek>(mut image: RS) -> bool {
        let mut detected = false;
        _ = image.seek(SeekFrom::Start(0));

        if let Ok(header) = MsaHeader::read(&mut image) {
            detected = header.is_valid();
        }

        detected
    }

    pub(crate) fn load_image<RS: ReadSeek>(mut read_buf: RS) -> Result<SectorImage, FloppyError> {
        let raw_len = get_length(&mut read_buf)? as usize;
        if raw_len > MAX_IMAGE_SIZE {
            return Err(FloppyError::DecodeError("MSA image is too large".to_string()));
        }

        let header = MsaHeader::read(&mut read_buf)?;
        if !header.is_valid() {
            log::error!("MsaFormat::load_image(): Invalid header: {:?}", header);
            return Err(FloppyError::DecodeError("invalid MSA header".to_string()));
        }

        let sides = header.sides + 1;
        let spt = header.sectors_per_track;
        let track_size = spt as usize * DEFAULT_SECTOR_SIZE;
        let track_ct = header.end_track as usize + 1;

        log::trace!(
            "MsaFormat::load_image(): sides: {} spt: {} tracks: {}-{}",
            sides,
            spt,
            header.start_track,
            header.end_track
        );

        // Tracks before the starting track are left blank.
        let mut data = vec![0u8; track_ct * sides as usize * track_size];
        let mut packed = Vec::with_capacity(track_size);

        for track in header.start_track as usize..track_ct {
            for side in 0..sides as usize {
                let stored_len = u16::read_be(&mut read_buf).map_err(|_| {
                    FloppyError::DecodeError(format!("MSA image truncated at track {} side {}", track, side))
                })? as usize;

                let offset = (track * sides as usize + side) * track_size;
                let out = &mut data[offset..offset + track_size];

                if stored_len == track_size {
                    read_buf.read_exact(out).map_err(|_| {
                        FloppyError::DecodeError(format!("MSA image truncated at track {} side {}", track, side))
                    })?;
                }
                else if stored_len > track_size {
                    return Err(FloppyError::DecodeError(format!(
                        "MSA track {} side {} stores {} bytes, more than a full track",
                        track, side, stored_len
                    )));
                }
                else {
                    packed.resize(stored_len, 0);
                    read_buf.read_exact(&mut packed).map_err(|_| {
                        FloppyError::DecodeError(format!("MSA image truncated at track {} side {}", track, side))
                    })?;
                    unpack_track(&packed, out).map_err(|e| {
                        log::error!("MsaFormat::load_image(): track {} side {}: {}", track, side, e);
                        e
                    })?;
                }
            }
        }

        Ok(SectorImage {
            data,
            sides,
            sectors_per_track: spt,
            header: None,
        })
    }

    /// Write the image as an MSA starting at track 0. The geometry is taken from `image`, which
    /// must describe `image.data` exactly.
    pub(crate) fn save_image<RWS: ReadWriteSeek>(image: &SectorImage, write_buf: &mut RWS) -> Result<(), FloppyError> {
        let sides = image.sides as usize;
        let spt = image.sectors_per_track as usize;
        if sides == 0 || sides > 2 || spt == 0 || spt > MSA_MAX_SPT as usize {
            return Err(FloppyError::EncodeError(format!(
                "cannot write MSA with {} sides and {} sectors per track",
                sides, spt
            )));
        }

        let track_size = spt * DEFAULT_SECTOR_SIZE;
        if image.data.is_empty() || image.data.len() % (track_size * sides) != 0 {
            return Err(FloppyError::EncodeError(format!(
                "image of {} bytes is not a whole number of tracks",
                image.data.len()
            )));
        }
        let track_ct = image.data.len() / (track_size * sides);
        if track_ct > MSA_MAX_TRACK as usize + 1 {
            return Err(FloppyError::EncodeError(format!("{} tracks is too many for MSA", track_ct)));
        }

        let header = MsaHeader {
            signature: MSA_SIGNATURE,
            sectors_per_track: spt as u16,
            sides: (sides - 1) as u16,
            start_track: 0,
            end_track: (track_ct - 1) as u16,
        };
        header.write(write_buf)?;

        for track_data in image.data.chunks_exact(track_size) {
            let packed = pack_track(track_data);
            if packed.len() < track_size {
                (packed.len() as u16).write_be(write_buf)?;
                write_buf.write_all(&packed)?;
            }
            else {
                (track_size as u16).write_be(write_buf)?;
                write_buf.write_all(track_data)?;
            }
        }

        Ok(())
    }
}

/// Expand one run-length encoded track into `out`, which must be filled exactly.
fn unpack_track(packed: &[u8], out: &mut [u8]) -> Result<(), FloppyError> {
    let mut src = 0;
    let mut dst = 0;

    while src < packed.len() {
        let byte = packed[src];
        if byte != MSA_RLE_MARKER {
            if dst >= out.len() {
                return Err(FloppyError::DecodeError("MSA track data overflows the track".to_string()));
            }
            out[dst] = byte;
            dst += 1;
            src += 1;
            continue;
        }

        let run = packed
            .get(src + 1..src + 4)
            .ok_or_else(|| FloppyError::DecodeError("MSA run truncated".to_string()))?;
        let value = run[0];
        let count = u16::from_be_bytes([run[1], run[2]]) as usize;
        if dst + count > out.len() {
            return Err(FloppyError::DecodeError("MSA run overflows the track".to_string()));
        }
        out[dst..dst + count].fill(value);
        dst += count;
        src += 4;
    }

    if dst != out.len() {
        return Err(FloppyError::DecodeError(format!(
            "MSA track expands to {} bytes, expected {}",
            dst,
            out.len()
        )));
    }
    Ok(())
}

/// Run-length encode one track. Runs of four or more, and any occurrence of the marker byte
/// itself, are escaped.
fn pack_track(track: &[u8]) -> Vec<u8> {
    let mut packed = Vec::with_capacity(track.len());
    let mut i = 0;

    while i < track.len() {
        let value = track[i];
        let run = track[i..].iter().take_while(|&&b| b == value).count();

        if run >= 4 || value == MSA_RLE_MARKER {
            packed.push(MSA_RLE_MARKER);
            packed.push(value);
            packed.extend_from_slice(&(run as u16).to_be_bytes());
        }
        else {
            packed.extend(std::iter::repeat(value).take(run));
        }
        i += run;
    }
    packed
}
