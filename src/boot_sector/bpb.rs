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

    src/boot_sector/bpb.rs

    Routines for reading the BIOS Parameter Block of an Atari ST boot sector.
    
    TOS uses a little-endian BPB at the same offset a DOS disk does, extended
    with the sectors per track, side count and hidden sector count. Unlike DOS
    these values are frequently wrong on images made by third party tools, so
    nothing here is trusted without checking it against the image size.
*/

use crate::DEFAULT_SECTOR_SIZE;
use binrw::binrw;

// Offset of the bios parameter block in the boot sector.
pub const BPB_OFFSET: u64 = 0x0B;

#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[binrw]
#[brw(little)]
pub struct BiosParameterBlock {
    pub bytes_per_sector: u16,
    pub sectors_per_cluster: u8,
    pub reserved_sectors: u16,
    pub number_of_fats: u8,
    pub root_entries: u16,
    pub total_sectors: u16,
    pub media_descriptor: u8,
    pub sectors_per_fat: u16,
    pub sectors_per_track: u16,
    pub number_of_sides: u16,
    pub hidden_sectors: u16,
}

impl BiosParameterBlock {
    /// Perform a loose sanity check on the BPB. This should return true for any double density
    /// floppy a TOS machine could have formatted, including the common 10 and 11 sector
    /// extended formats.
    pub fn is_valid(&self) -> bool {
        if self.bytes_per_sector as usize != DEFAULT_SECTOR_SIZE {
            return false;
        }
        if self.sectors_per_track == 0 || self.sectors_per_track > 12 {
            return false;
        }
        if self.number_of_sides == 0 || self.number_of_sides > 2 {
            return false;
        }
        true
    }

    /// Total bytes the BPB claims the disk holds.
    pub fn declared_size(&self) -> usize {
        self.total_sectors as usize * DEFAULT_SECTOR_SIZE
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use binrw::BinRead;
    use std::io::Cursor;

    #[test]
    fn test_read_bpb() {
        let mut sector = [0u8; 32];
        sector[11..13].copy_from_slice(&512u16.to_le_bytes());
        sector[13] = 2;
        sector[19..21].copy_from_slice(&1440u16.to_le_bytes());
        sector[24..26].copy_from_slice(&9u16.to_le_bytes());
        sector[26..28].copy_from_slice(&2u16.to_le_bytes());

        let mut cursor = Cursor::new(&sector[BPB_OFFSET as usize..]);
        let bpb = BiosParameterBlock::read(&mut cursor).unwrap();

        assert_eq!(bpb.bytes_per_sector, 512);
        assert_eq!(bpb.sectors_per_cluster, 2);
        assert_eq!(bpb.total_sectors, 1440);
        assert_eq!(bpb.sectors_per_track, 9);
        assert_eq!(bpb.number_of_sides, 2);
        assert!(bpb.is_valid());
        assert_eq!(bpb.declared_size(), 737280);
    }
}
