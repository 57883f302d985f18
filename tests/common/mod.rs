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

    tests/common/mod.rs

    Common support routines for tests
*/
#![allow(dead_code)]

use floppybay::{prelude::*, DEFAULT_SECTOR_SIZE};

use hex::encode;
use sha1::{Digest, Sha1};

pub fn init() {
    let _ = env_logger::builder().is_test(true).try_init();
}

#[allow(dead_code)]
pub fn compute_slice_hash(slice: &[u8]) -> String {
    let mut hasher = Sha1::new();
    hasher.update(slice);
    let result = hasher.finalize();

    encode(result)
}

/// Byte offset of a sector within a canonical buffer.
pub fn sector_address(track: usize, side: usize, sector: usize, sides: usize, spt: usize) -> usize {
    ((track * sides + side) * spt + (sector - 1)) * DEFAULT_SECTOR_SIZE
}

/// Write a BPB describing the given geometry into a boot sector. Byte 13 (sectors per cluster)
/// is non-zero, so the boot sector is considered trustworthy.
pub fn write_bpb(image: &mut [u8], sides: u16, spt: u16, total: u16) {
    image[11..13].copy_from_slice(&(DEFAULT_SECTOR_SIZE as u16).to_le_bytes());
    image[13] = 2;
    image[14..16].copy_from_slice(&1u16.to_le_bytes());
    image[16] = 2;
    image[17..19].copy_from_slice(&112u16.to_le_bytes());
    image[19..21].copy_from_slice(&total.to_le_bytes());
    image[21] = 0xF9;
    image[22..24].copy_from_slice(&5u16.to_le_bytes());
    image[24..26].copy_from_slice(&spt.to_le_bytes());
    image[26..28].copy_from_slice(&sides.to_le_bytes());
}

/// Build a raw ST image. Every sector but the boot sector starts with its own address, so reads
/// can be checked against where they came from.
pub fn st_image(tracks: usize, sides: u16, spt: u16) -> Vec<u8> {
    let total = tracks * sides as usize * spt as usize;
    let mut image = vec![0u8; total * DEFAULT_SECTOR_SIZE];
    write_bpb(&mut image, sides, spt, total as u16);

    for track in 0..tracks {
        for side in 0..sides as usize {
            for sector in 1..=spt as usize {
                if track == 0 && side == 0 && sector == 1 {
                    continue;
                }
                let offset = sector_address(track, side, sector, sides as usize, spt as usize);
                image[offset] = track as u8;
                image[offset + 1] = side as u8;
                image[offset + 2] = sector as u8;
                image[offset + 3] = 0xA5;
            }
        }
    }
    image
}

/// An ST image whose boot sector is neither a valid BPB holder nor executable.
pub fn untrusted_st_image(tracks: usize, sides: u16, spt: u16) -> Vec<u8> {
    let mut image = st_image(tracks, sides, spt);
    image[13] = 0;
    image[0] = 0x60;
    image
}

/// Build an MSA file with every track stored uncompressed.
pub fn msa_image(tracks: usize, sides: u16, spt: u16) -> Vec<u8> {
    msa_from_sectors(&st_image(tracks, sides, spt), tracks, sides, spt)
}

/// Wrap a canonical sector buffer in an uncompressed MSA file.
pub fn msa_from_sectors(sectors: &[u8], tracks: usize, sides: u16, spt: u16) -> Vec<u8> {
    let track_size = spt as usize * DEFAULT_SECTOR_SIZE;

    let mut file = Vec::new();
    for word in [0x0E0F, spt, sides - 1, 0, tracks as u16 - 1] {
        file.extend_from_slice(&word.to_be_bytes());
    }
    for track in sectors.chunks_exact(track_size) {
        file.extend_from_slice(&(track_size as u16).to_be_bytes());
        file.extend_from_slice(track);
    }
    file
}

/// Build a FastCopy DIM file holding every sector.
pub fn dim_image(tracks: usize, sides: u16, spt: u16) -> Vec<u8> {
    dim_from_sectors(&st_image(tracks, sides, spt), tracks, sides, spt)
}

/// Wrap a canonical sector buffer in a DIM file.
pub fn dim_from_sectors(sectors: &[u8], tracks: usize, sides: u16, spt: u16) -> Vec<u8> {
    let mut file = vec![0u8; 32];
    file[0] = 0x42;
    file[1] = 0x42;
    file[6] = (sides - 1) as u8;
    file[8] = spt as u8;
    file[12] = (tracks - 1) as u8;
    file.extend_from_slice(sectors);
    file
}

/// A sector buffer whose boot sector declares no geometry at all. The boot sector is still
/// trustworthy.
pub fn headerless_sectors(tracks: usize, sides: u16, spt: u16) -> Vec<u8> {
    let mut sectors = st_image(tracks, sides, spt);
    write_bpb(&mut sectors, 0, 0, 0);
    sectors
}

/// A catalog with default host policy and an in-memory save store.
pub fn catalog() -> Catalog {
    Catalog::new(FloppyConfig::default())
}
