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

    src/boot_sector/bootsector.rs

    Routines for reading boot sector data
    
*/

use crate::{
    boot_sector::bpb::{BiosParameterBlock, BPB_OFFSET},
    io::{Cursor, ReadSeek, Seek, SeekFrom, Write},
    FloppyError,
};
use binrw::BinRead;

pub const BOOT_SECTOR_SIZE: usize = 512;
/// The 16-bit word sum of a boot sector TOS will execute.
pub const EXECUTABLE_CHECKSUM: u16 = 0x1234;

#[derive(Clone, Debug)]
pub struct BootSector {
    pub(crate) bpb: BiosParameterBlock,
    pub(crate) sector_buf: Vec<u8>,
}

impl BootSector {
    pub fn new<T: ReadSeek>(buffer: &mut T) -> Result<Self, FloppyError> {
        let mut sector_buf = [0; BOOT_SECTOR_SIZE];
        buffer.seek(SeekFrom::Start(0))?;
        // Save a copy of the boot sector internally.
        buffer
            .read_exact(&mut sector_buf)
            .map_err(|_| FloppyError::DecodeError("image is shorter than a boot sector".to_string()))?;

        buffer.seek(SeekFrom::Start(BPB_OFFSET))?;
        let bpb = BiosParameterBlock::read(buffer)?;

        Ok(BootSector {
            bpb,
            sector_buf: sector_buf.to_vec(),
        })
    }

    /// Read the boot sector from the start of a canonical sector buffer.
    pub fn from_bytes(bytes: &[u8]) -> Result<Self, FloppyError> {
        BootSector::new(&mut Cursor::new(bytes))
    }

    pub fn bpb(&self) -> BiosParameterBlock {
        self.bpb
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.sector_buf
    }

    /// Sum the 256 big-endian words of the sector, wrapping at 16 bits.
    pub fn checksum(&self) -> u16 {
        self.sector_buf
            .chunks_exact(2)
            .fold(0u16, |sum, word| sum.wrapping_add(u16::from_be_bytes([word[0], word[1]])))
    }

    /// Return true if TOS would run this boot sector as a program.
    pub fn is_executable(&self) -> bool {
        self.checksum() == EXECUTABLE_CHECKSUM
    }

    /// Some blank images made by buggy formatting tools carry a zero sectors-per-cluster field.
    /// Neither a real machine nor we can use those reliably, unless the sector is a boot
    /// program (which need not carry a usable BPB at all).
    pub fn is_trustworthy(&self) -> bool {
        self.bpb.sectors_per_cluster != 0 || self.is_executable()
    }

    /// The side count and sectors per track the boot sector claims.
    pub fn declared_geometry(&self) -> (u16, u16) {
        (self.bpb.number_of_sides, self.bpb.sectors_per_track)
    }

    /// Dump the BPB values to a Write implementor for debugging purposes.
    pub fn dump_bpb<T: Write>(&self, buffer: &mut T) -> Result<(), crate::io::Error> {
        writeln!(buffer, "BIOS Parameter Block:")?;
        writeln!(buffer, "\tBytes per sector: {}", self.bpb.bytes_per_sector)?;
        writeln!(buffer, "\tSectors per cluster: {}", self.bpb.sectors_per_cluster)?;
        writeln!(buffer, "\tReserved sectors: {}", self.bpb.reserved_sectors)?;
        writeln!(buffer, "\tNumber of FATs: {}", self.bpb.number_of_fats)?;
        writeln!(buffer, "\tRoot entries: {}", self.bpb.root_entries)?;
        writeln!(buffer, "\tTotal sectors: {}", self.bpb.total_sectors)?;
        writeln!(buffer, "\tMedia descriptor: 0x{:02X}", self.bpb.media_descriptor)?;
        writeln!(buffer, "\tSectors per FAT: {}", self.bpb.sectors_per_fat)?;
        writeln!(buffer, "\tSectors per track: {}", self.bpb.sectors_per_track)?;
        writeln!(buffer, "\tNumber of sides: {}", self.bpb.number_of_sides)?;
        writeln!(buffer, "\tHidden sectors: {}", self.bpb.hidden_sectors)?;
        writeln!(buffer)?;
        writeln!(buffer, "Boot sector checksum: {:04X}", self.checksum())?;
        if self.is_executable() {
            writeln!(buffer, "Boot sector is executable.")?;
        }

        buffer.flush()?;
        Ok(())
    }
}

/// Return true if the first sector of `bytes` is safe to write back. An image too short to hold
/// a boot sector is never safe.
pub fn boot_sector_ok(bytes: &[u8]) -> bool {
    match BootSector::from_bytes(bytes) {
        Ok(boot_sector) => boot_sector.is_trustworthy(),
        Err(_) => false,
    }
}
