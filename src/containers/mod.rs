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

    src/containers/mod.rs

    A module supporting disk image container formats.
    Currently only ZIP is supported, the way Atari ST image collections are
    usually distributed.
*/
use crate::types::ImageFormat;
use std::fmt::{Display, Formatter, Result};

#[cfg(feature = "zip")]
pub mod zip;

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum DiskImageContainer {
    /// A disk image file of the given format.
    Raw(ImageFormat),
    /// A zip archive. The second element names the archive entry holding the disk image.
    Zip(ImageFormat, String),
}

impl DiskImageContainer {
    /// The format of the disk image itself, looking through any container.
    pub fn format(&self) -> ImageFormat {
        match self {
            DiskImageContainer::Raw(fmt) => *fmt,
            DiskImageContainer::Zip(fmt, _) => *fmt,
        }
    }

    pub fn is_archived(&self) -> bool {
        matches!(self, DiskImageContainer::Zip(..))
    }
}

impl Display for DiskImageContainer {
    fn fmt(&self, f: &mut Formatter) -> Result {
        match self {
            DiskImageContainer::Raw(fmt) => write!(f, "{}", fmt),
            DiskImageContainer::Zip(fmt, entry) => write!(f, "Zipped {} ({})", fmt, entry),
        }
    }
}
