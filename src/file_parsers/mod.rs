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

    src/file_parsers/mod.rs

    Parsers for the disk image file formats a catalog slot may be loaded from.
    
    Plain sector formats (ST, MSA, DIM) are decoded here into the canonical
    sector-major buffer and can be encoded back. Protected formats are only
    recognized here; decoding them is the job of a ProtectedCodec.
*/

use crate::{
    io::{ReadSeek, ReadWriteSeek, SeekFrom},
    types::ImageFormat,
    FloppyError,
};
use bitflags::bitflags;

pub mod dim;
pub mod msa;
pub mod st;

pub const IPF_SIGNATURE: &[u8; 4] = b"CAPS";
pub const STX_SIGNATURE: &[u8; 4] = b"RSY\0";
pub const ZIP_SIGNATURE: &[u8; 4] = b"PK\x03\x04";

bitflags! {
    /// Bit flags representing the capabilities of a specific image format.
    #[derive(Debug, Default, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
    #[rustfmt::skip]
    pub struct FormatCaps: u32 {
        const CAP_WRITE_BACK        = 0b0000_0000_0000_0001; // Modified images can be encoded back to this format
        const CAP_GEOMETRY_HEADER   = 0b0000_0000_0000_0010; // Stores sides and sectors per track in a file header
        const CAP_COMPRESSION       = 0b0000_0000_0000_0100; // Track data may be compressed
        const CAP_PROTECTION        = 0b0000_0000_0000_1000; // Can represent copy protected tracks
        const CAP_CONTAINER         = 0b0000_0000_0001_0000; // Holds another disk image file
    }
}

/// The result of parsing a plain sector image: the canonical buffer plus whatever geometry the
/// container recorded about it.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct SectorImage {
    /// Sector data in side-major, track-major, sector-major order at a 512-byte stride.
    pub data: Vec<u8>,
    /// Side count declared by the container, or 0 if the container has no header.
    pub sides: u16,
    /// Sectors per track declared by the container, or 0 if the container has no header.
    pub sectors_per_track: u16,
    /// The raw container header, kept so it can be re-emitted on write-back.
    pub header: Option<Vec<u8>>,
}

impl SectorImage {
    /// Container-declared geometry, if the container had any.
    pub fn container_geometry(&self) -> Option<(u16, u16)> {
        if self.sides > 0 && self.sectors_per_track > 0 {
            Some((self.sides, self.sectors_per_track))
        }
        else {
            None
        }
    }
}

pub(crate) const IMAGE_FORMATS: [ImageFormat; 6] = [
    ImageFormat::St,
    ImageFormat::Msa,
    ImageFormat::Dim,
    ImageFormat::Ipf,
    ImageFormat::Stx,
    ImageFormat::Zip,
];

/// Returns a list of advertised file extensions supported by available image format parsers.
/// This is a convenience function for use in file dialogs.
pub fn supported_extensions() -> Vec<&'static str> {
    IMAGE_FORMATS.iter().flat_map(|f| ImageParser::extensions(f)).collect()
}

/// Returns an ImageFormat enum variant based on the file extension provided. If the extension
/// is not recognized, None is returned.
pub fn format_from_ext(ext: &str) -> Option<ImageFormat> {
    for format in IMAGE_FORMATS.iter() {
        if ImageParser::extensions(format).contains(&ext.to_lowercase().as_str()) {
            return Some(*format);
        }
    }
    None
}

/// Returns a list of image formats that support the specified capabilities.
pub fn formats_from_caps(caps: FormatCaps) -> Vec<ImageFormat> {
    IMAGE_FORMATS
        .iter()
        .filter(|f| caps.is_empty() || f.capabilities().contains(caps))
        .copied()
        .collect()
}

fn detect_signature<RS: ReadSeek>(mut image: RS, signature: &[u8; 4]) -> bool {
    let mut buf = [0u8; 4];
    if image.seek(SeekFrom::Start(0)).is_err() {
        return false;
    }
    match image.read_exact(&mut buf) {
        Ok(_) => &buf == signature,
        Err(_) => false,
    }
}

/// Enum dispatch over the supported image formats.
pub trait ImageParser {
    /// Return the capability flags for this format.
    fn capabilities(&self) -> FormatCaps;
    /// Detect and return true if the image is of a format that the parser can read.
    fn detect<RS: ReadSeek>(&self, image_buf: RS) -> bool;
    /// Return a list of file extensions associated with the parser.
    fn extensions(&self) -> Vec<&'static str>;
    /// Decode an image file into a canonical sector buffer. Only plain sector formats can be
    /// decoded here.
    fn load_image<RS: ReadSeek>(&self, read_buf: RS) -> Result<SectorImage, FloppyError>;
    /// Encode a canonical sector buffer back into this format.
    fn save_image<RWS: ReadWriteSeek>(&self, image: &SectorImage, write_buf: &mut RWS) -> Result<(), FloppyError>;
}

impl ImageParser for ImageFormat {
    fn capabilities(&self) -> FormatCaps {
        match self {
            ImageFormat::St => st::StFormat::capabilities(),
            ImageFormat::Msa => msa::MsaFormat::capabilities(),
            ImageFormat::Dim => dim::DimFormat::capabilities(),
            ImageFormat::Ipf | ImageFormat::Stx => FormatCaps::CAP_PROTECTION,
            ImageFormat::Zip => FormatCaps::CAP_CONTAINER | FormatCaps::CAP_COMPRESSION,
        }
    }

    fn detect<RS: ReadSeek>(&self, image_buf: RS) -> bool {
        match self {
            ImageFormat::St => st::StFormat::detect(image_buf),
            ImageFormat::Msa => msa::MsaFormat::detect(image_buf),
            ImageFormat::Dim => dim::DimFormat::detect(image_buf),
            ImageFormat::Ipf => detect_signature(image_buf, IPF_SIGNATURE),
            ImageFormat::Stx => detect_signature(image_buf, STX_SIGNATURE),
            ImageFormat::Zip => detect_signature(image_buf, ZIP_SIGNATURE),
        }
    }

    fn extensions(&self) -> Vec<&'static str> {
        match self {
            ImageFormat::St => st::StFormat::extensions(),
            ImageFormat::Msa => msa::MsaFormat::extensions(),
            ImageFormat::Dim => dim::DimFormat::extensions(),
            _ => ImageFormat::extensions(*self).to_vec(),
        }
    }

    fn load_image<RS: ReadSeek>(&self, read_buf: RS) -> Result<SectorImage, FloppyError> {
        match self {
            ImageFormat::St => st::StFormat::load_image(read_buf),
            ImageFormat::Msa => msa::MsaFormat::load_image(read_buf),
            ImageFormat::Dim => dim::DimFormat::load_image(read_buf),
            ImageFormat::Ipf | ImageFormat::Stx => Err(FloppyError::ProtectedFormatUnavailable(*self)),
            ImageFormat::Zip => Err(FloppyError::DecodeError(
                "zip archives must be unpacked before parsing".to_string(),
            )),
        }
    }

    fn save_image<RWS: ReadWriteSeek>(&self, image: &SectorImage, write_buf: &mut RWS) -> Result<(), FloppyError> {
        match self {
            ImageFormat::St => st::StFormat::save_image(image, write_buf),
            ImageFormat::Msa => msa::MsaFormat::save_image(image, write_buf),
            ImageFormat::Dim => dim::DimFormat::save_image(image, write_buf),
            _ => Err(FloppyError::EncodeError(format!("{} images cannot be written back", self))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    #[test]
    fn test_format_from_ext() {
        assert_eq!(format_from_ext("MSA"), Some(ImageFormat::Msa));
        assert_eq!(format_from_ext("ctr"), Some(ImageFormat::Ipf));
        assert_eq!(format_from_ext("img"), None);
    }

    #[test]
    fn test_writable_formats() {
        let writable = formats_from_caps(FormatCaps::CAP_WRITE_BACK);
        assert_eq!(writable, vec![ImageFormat::St, ImageFormat::Msa, ImageFormat::Dim]);
        assert!(supported_extensions().contains(&"stx"));
    }

    #[test]
    fn test_detect_protected_signatures() {
        let mut ipf = b"CAPS".to_vec();
        ipf.extend_from_slice(&[0u8; 60]);
        assert!(ImageFormat::Ipf.detect(Cursor::new(&ipf)));
        assert!(!ImageFormat::Stx.detect(Cursor::new(&ipf)));
        assert!(!ImageFormat::Ipf.detect(Cursor::new(b"CA")));
    }

    #[test]
    fn test_protected_load_refused() {
        let ipf = b"CAPS".to_vec();
        assert_eq!(
            ImageFormat::Ipf.load_image(Cursor::new(&ipf)),
            Err(FloppyError::ProtectedFormatUnavailable(ImageFormat::Ipf))
        );
    }
}
