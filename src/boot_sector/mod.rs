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

    src/boot_sector/mod.rs

    Boot sector inspection for Atari ST format floppies.
    
*/

//! Routines to read the first sector of a disk image. The boot sector carries a BIOS parameter
//! block describing the media, and may also be an executable boot program. Both matter to us:
//! the parameter block seeds the drive geometry, and a malformed one means the image must not be
//! written back.

mod bootsector;
mod bpb;

pub use bootsector::{boot_sector_ok, BootSector, BOOT_SECTOR_SIZE, EXECUTABLE_CHECKSUM};
pub use bpb::{BiosParameterBlock, BPB_OFFSET};
