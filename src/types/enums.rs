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

    src/types/enums.rs

    Defines common enum types
*/
use std::{
    fmt,
    fmt::{Display, Formatter},
};

/// One of the two physical floppy drives.
#[repr(usize)]
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Hash, strum::EnumIter)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum DriveId {
    #[default]
    A = 0,
    B = 1,
}

impl DriveId {
    #[inline]
    pub fn index(self) -> usize {
        self as usize
    }

    /// Return the drive on the other side of the bay.
    #[inline]
    pub fn other(self) -> DriveId {
        match self {
            DriveId::A => DriveId::B,
            DriveId::B => DriveId::A,
        }
    }

    pub fn letter(self) -> char {
        match self {
            DriveId::A => 'A',
            DriveId::B => 'B',
        }
    }
}

impl TryFrom<usize> for DriveId {
    type Error = usize;

    fn try_from(value: usize) -> Result<Self, Self::Error> {
        match value {
            0 => Ok(DriveId::A),
            1 => Ok(DriveId::B),
            _ => Err(value),
        }
    }
}

impl Display for DriveId {
    fn fmt(&self, f: &mut Formatter) -> fmt::Result {
        write!(f, "{}:", self.letter())
    }
}

/// `ImageFormat` lists the disk image file formats a catalog slot can be loaded from.
#[derive(Copy, Clone, Debug, Hash, Eq, PartialEq, strum::EnumIter)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum ImageFormat {
    /// A raw sector dump. Typically has extension ST.
    St,
    /// A Magic Shadow Archiver image, run-length compressed per track. Typically has extension MSA.
    Msa,
    /// A FastCopy Pro image, a raw sector dump behind a 32-byte header. Typically has extension DIM.
    Dim,
    /// Interchangeable Preservation Format image. Typically has extension IPF, CTR or RAW.
    Ipf,
    /// A Pasti image. Typically has extension STX.
    Stx,
    /// A zip archive holding one of the above.
    Zip,
}

impl ImageFormat {
    /// The kind of content this format decodes to. Zip archives are a container and produce the
    /// kind of whatever they hold, so they report [ImageKind::None] here.
    pub fn kind(self) -> ImageKind {
        use ImageFormat::*;
        match self {
            St | Msa | Dim => ImageKind::PlainSector,
            Ipf => ImageKind::ProtectedIpf,
            Stx => ImageKind::ProtectedStx,
            Zip => ImageKind::None,
        }
    }

    pub fn is_plain_sector(self) -> bool {
        self.kind() == ImageKind::PlainSector
    }

    pub fn is_protected(self) -> bool {
        matches!(self.kind(), ImageKind::ProtectedIpf | ImageKind::ProtectedStx)
    }

    pub fn extensions(self) -> &'static [&'static str] {
        use ImageFormat::*;
        match self {
            St => &["st"],
            Msa => &["msa"],
            Dim => &["dim"],
            Ipf => &["ipf", "ctr", "raw"],
            Stx => &["stx"],
            Zip => &["zip"],
        }
    }

    /// Stable numeric tag used in snapshots.
    pub(crate) fn to_tag(self) -> u8 {
        use ImageFormat::*;
        match self {
            St => 1,
            Msa => 2,
            Dim => 3,
            Ipf => 4,
            Stx => 5,
            Zip => 6,
        }
    }

    pub(crate) fn from_tag(tag: u8) -> Option<ImageFormat> {
        use ImageFormat::*;
        match tag {
            1 => Some(St),
            2 => Some(Msa),
            3 => Some(Dim),
            4 => Some(Ipf),
            5 => Some(Stx),
            6 => Some(Zip),
            _ => None,
        }
    }
}

impl Display for ImageFormat {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        use ImageFormat::*;
        let str = match self {
            St => "ST Sector",
            Msa => "MSA Sector",
            Dim => "DIM Sector",
            Ipf => "IPF Protected",
            Stx => "STX Protected",
            Zip => "Zip Archive",
        };
        write!(f, "{}", str)
    }
}

/// Identifies which decoder produced the content presented by a drive.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum ImageKind {
    #[default]
    None,
    PlainSector,
    ProtectedIpf,
    ProtectedStx,
}

impl ImageKind {
    pub(crate) fn to_tag(self) -> u8 {
        match self {
            ImageKind::None => 0,
            ImageKind::PlainSector => 1,
            ImageKind::ProtectedIpf => 2,
            ImageKind::ProtectedStx => 3,
        }
    }

    pub(crate) fn from_tag(tag: u8) -> Option<ImageKind> {
        match tag {
            0 => Some(ImageKind::None),
            1 => Some(ImageKind::PlainSector),
            2 => Some(ImageKind::ProtectedIpf),
            3 => Some(ImageKind::ProtectedStx),
            _ => None,
        }
    }
}

impl Display for ImageKind {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match self {
            ImageKind::None => write!(f, "None"),
            ImageKind::PlainSector => write!(f, "Plain Sector"),
            ImageKind::ProtectedIpf => write!(f, "Protected (IPF)"),
            ImageKind::ProtectedStx => write!(f, "Protected (STX)"),
        }
    }
}

/// A physical event recorded by a drive's transition timer.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum TransitionKind {
    Insert,
    Eject,
}

impl TransitionKind {
    pub(crate) fn to_tag(kind: Option<TransitionKind>) -> u8 {
        match kind {
            None => 0,
            Some(TransitionKind::Insert) => 1,
            Some(TransitionKind::Eject) => 2,
        }
    }

    pub(crate) fn from_tag(tag: u8) -> Result<Option<TransitionKind>, u8> {
        match tag {
            0 => Ok(None),
            1 => Ok(Some(TransitionKind::Insert)),
            2 => Ok(Some(TransitionKind::Eject)),
            _ => Err(tag),
        }
    }
}

/// How the write-protect line of a drive should be driven right now.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
pub enum WriteProtectOverride {
    /// No transition in progress; the line reflects the media.
    #[default]
    None,
    /// Media absent (eject phase): the line reads as protected.
    ForceProtected,
    /// Media arriving (insert phase): the line reads as unprotected.
    ForceUnprotected,
}
