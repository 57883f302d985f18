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

    src/types/structs.rs

    Defines common structs
*/
use std::fmt::{self, Display, Formatter};

use crate::DEFAULT_SECTOR_SIZE;

/// The geometry a drive presents for an inserted image. All sectors are 512 bytes.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Geometry {
    pub tracks: u16,
    pub sides: u16,
    pub sectors_per_track: u16,
}

impl Geometry {
    pub fn new(tracks: u16, sides: u16, sectors_per_track: u16) -> Self {
        Geometry {
            tracks,
            sides,
            sectors_per_track,
        }
    }

    /// Build a geometry for an image of `image_len` bytes laid out with the given side and
    /// sector counts. The track count is whatever fits; a zero side or sector count yields zero
    /// tracks.
    pub fn from_image_len(image_len: usize, sides: u16, sectors_per_track: u16) -> Self {
        let tracks = (image_len / DEFAULT_SECTOR_SIZE)
            .checked_div(sectors_per_track as usize)
            .and_then(|t| t.checked_div(sides as usize))
            .unwrap_or(0);

        Geometry {
            tracks: tracks.min(u16::MAX as usize) as u16,
            sides,
            sectors_per_track,
        }
    }

    /// Bytes in one track of one side.
    #[inline]
    pub fn track_size(&self) -> usize {
        self.sectors_per_track as usize * DEFAULT_SECTOR_SIZE
    }

    #[inline]
    pub fn total_sectors(&self) -> usize {
        self.tracks as usize * self.sides as usize * self.sectors_per_track as usize
    }

    #[inline]
    pub fn total_size(&self) -> usize {
        self.total_sectors() * DEFAULT_SECTOR_SIZE
    }
}

impl Display for Geometry {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "[t:{:2} h:{} s:{:2}]",
            self.tracks, self.sides, self.sectors_per_track
        )
    }
}
