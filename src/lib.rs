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
*/

//! # FloppyBay
//!
//! FloppyBay is the removable storage layer of an Atari ST class emulator core. It owns the
//! catalog of floppy images supplied by a host frontend, decodes them into a canonical
//! sector-major buffer, models the two physical drives (including the write-protect transition
//! that guest software uses to notice disk swaps), and serves bounds-checked sector reads and
//! writes to the emulated disk controller.
//!
//! The usual entry point is [Catalog]:
//!
//! ```
//! use floppybay::prelude::*;
//!
//! let mut catalog = Catalog::new(FloppyConfig::default());
//! let mut image = vec![0u8; 80 * 9 * 512];
//! image[13] = 2; // sectors per cluster, a sane boot sector
//! image[19..21].copy_from_slice(&720u16.to_le_bytes());
//! image[24] = 9;
//! image[26] = 1;
//!
//! catalog.load_content(Some("GAME.ST"), &image).unwrap();
//! assert!(catalog.is_inserted(DriveId::A));
//!
//! let sector = catalog.read_sectors(DriveId::A, 0, 0, 1, 1).unwrap();
//! assert_eq!(sector.len(), 512);
//! ```
//!
//! ## Features
//!
//! * `zip` (default, via `archives`): read disk images stored inside zip archives.
//! * `serde`: derive `Serialize`/`Deserialize` for [FloppyConfig] and the small enum types.

pub mod boot_sector;
pub mod catalog;
pub mod config;
pub mod containers;
pub mod detect;
pub mod disk_image;
pub mod drive;
pub mod file_parsers;
pub mod geometry;
pub mod io;
pub mod protected;
pub mod save_store;
pub mod snapshot;
pub mod types;
mod util;

use thiserror::Error;

/// Every sector this subsystem addresses is 512 bytes, whatever a boot sector claims.
pub const DEFAULT_SECTOR_SIZE: usize = 512;
/// Number of catalog slots available to a host frontend.
pub const MAX_DISKS: usize = 32;
/// Number of physical drives, A: and B:.
pub const MAX_DRIVES: usize = 2;
/// Vertical-blank ticks each phase of a disk change keeps the write-protect line overridden.
pub const DEFAULT_TRANSITION_DELAY: u32 = 18;
/// Guard against decompressing an unreasonably large file out of an archive.
pub const MAX_IMAGE_SIZE: usize = 100_000_000;

#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum FloppyError {
    #[error("Disk image format was not recognized from its name or content")]
    FormatUnrecognized,
    #[error("The disk image is truncated or corrupt: {0}")]
    DecodeError(String),
    #[error("No codec is available to decode {0} images")]
    ProtectedFormatUnavailable(types::ImageFormat),
    #[error("The disk image cannot be written back: {0}")]
    EncodeError(String),
    #[error("The image catalog is full")]
    CatalogFull,
    #[error("Catalog slot {0} does not exist")]
    InvalidSlot(usize),
    #[error("No image is selected for the drive")]
    NoImageSelected,
    #[error("The selected image has no valid content")]
    ImageUnavailable,
    #[error("Address out of range: track {track} side {side} sector {sector} (geometry {geometry})")]
    GeometryOutOfRange {
        track:    u16,
        side:     u16,
        sector:   u16,
        geometry: types::Geometry,
    },
    #[error("The disk in the drive is write protected")]
    WriteProtected,
    #[error("The snapshot is not compatible: {0}")]
    IncompatibleSnapshot(String),
    #[error("Failed to persist disk image: {0}")]
    PersistFailed(String),
    #[error("An IO error occurred: {0}")]
    IoError(String),
}

impl From<std::io::Error> for FloppyError {
    fn from(err: std::io::Error) -> Self {
        FloppyError::IoError(err.to_string())
    }
}

impl From<binrw::Error> for FloppyError {
    fn from(err: binrw::Error) -> Self {
        match err {
            binrw::Error::Io(e) => FloppyError::DecodeError(e.to_string()),
            binrw::Error::BadMagic { pos, .. } => FloppyError::DecodeError(format!("bad magic at offset {}", pos)),
            e => FloppyError::DecodeError(e.to_string()),
        }
    }
}

#[cfg(feature = "zip")]
impl From<zip::result::ZipError> for FloppyError {
    fn from(err: zip::result::ZipError) -> Self {
        match err {
            zip::result::ZipError::Io(e) => FloppyError::IoError(e.to_string()),
            e => FloppyError::DecodeError(e.to_string()),
        }
    }
}

pub use crate::{
    catalog::Catalog,
    config::{FloppyConfig, WriteProtection},
    disk_image::DiskImage,
    drive::{transition::DriveTransition, DriveState},
    protected::{ExternalCodec, ProtectedCodec, UnavailableCodec},
    save_store::{DirectorySaveStore, MemorySaveStore, SaveStore},
    types::{DriveId, Geometry, ImageFormat, ImageKind, TransitionKind, WriteProtectOverride},
};

pub mod prelude {
    pub use crate::{
        catalog::Catalog,
        config::{FloppyConfig, WriteProtection},
        disk_image::DiskImage,
        protected::{ExternalCodec, ProtectedCodec, UnavailableCodec},
        save_store::{MemorySaveStore, SaveStore},
        types::{DriveId, Geometry, ImageFormat, ImageKind, WriteProtectOverride},
        FloppyError,
        DEFAULT_SECTOR_SIZE,
    };
}
