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

    src/protected.rs

    The capability interface for copy protected image formats.
    
    IPF and STX images describe tracks at a level this crate does not model.
    A host that links a codec for them can plug it in through ProtectedCodec;
    otherwise such images are recognized and politely refused.
*/
use crate::{types::ImageFormat, FloppyError, DEFAULT_SECTOR_SIZE};

/// Sector data recovered from a protected image by an external codec.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct DecodedImage {
    /// Canonical sector-major data at a 512-byte stride.
    pub data: Vec<u8>,
    pub sides: u16,
    pub sectors_per_track: u16,
}

/// Decode protected image formats into canonical sectors, or refuse.
pub trait ProtectedCodec {
    /// A short name for log messages.
    fn name(&self) -> &str;
    /// Return true if the codec can decode anything at all.
    fn is_available(&self) -> bool;
    fn decode(&self, format: ImageFormat, bytes: &[u8]) -> Result<DecodedImage, FloppyError>;
}

pub type BoxedCodec = Box<dyn ProtectedCodec + Send + Sync>;
pub type ProtectedDecoder = Box<dyn Fn(ImageFormat, &[u8]) -> Result<DecodedImage, FloppyError> + Send + Sync>;

/// The codec used when no external library is present. Every decode fails with
/// [FloppyError::ProtectedFormatUnavailable].
#[derive(Copy, Clone, Debug, Default)]
pub struct UnavailableCodec;

impl ProtectedCodec for UnavailableCodec {
    fn name(&self) -> &str {
        "unavailable"
    }

    fn is_available(&self) -> bool {
        false
    }

    fn decode(&self, format: ImageFormat, _bytes: &[u8]) -> Result<DecodedImage, FloppyError> {
        log::warn!("UnavailableCodec::decode(): no codec present for {} images", format);
        Err(FloppyError::ProtectedFormatUnavailable(format))
    }
}

/// A codec that delegates to a host-supplied decoder for a set of protected formats.
pub struct ExternalCodec {
    name: String,
    formats: Vec<ImageFormat>,
    decoder: ProtectedDecoder,
}

impl ExternalCodec {
    pub fn new<F>(name: &str, formats: &[ImageFormat], decoder: F) -> ExternalCodec
    where
        F: Fn(ImageFormat, &[u8]) -> Result<DecodedImage, FloppyError> + Send + Sync + 'static,
    {
        ExternalCodec {
            name: name.to_string(),
            formats: formats.iter().copied().filter(|f| f.is_protected()).collect(),
            decoder: Box::new(decoder),
        }
    }

    pub fn formats(&self) -> &[ImageFormat] {
        &self.formats
    }
}

impl ProtectedCodec for ExternalCodec {
    fn name(&self) -> &str {
        &self.name
    }

    fn is_available(&self) -> bool {
        !self.formats.is_empty()
    }

    fn decode(&self, format: ImageFormat, bytes: &[u8]) -> Result<DecodedImage, FloppyError> {
        if !self.formats.contains(&format) {
            return Err(FloppyError::ProtectedFormatUnavailable(format));
        }

        let decoded = (self.decoder)(format, bytes)?;

        // Don't trust the decoder to hand back something addressable.
        if decoded.data.is_empty() || decoded.data.len() % DEFAULT_SECTOR_SIZE != 0 {
            log::error!(
                "ExternalCodec::decode(): {} returned {} bytes, not a whole number of sectors",
                self.name,
                decoded.data.len()
            );
            return Err(FloppyError::DecodeError(format!(
                "{} codec returned {} bytes",
                self.name,
                decoded.data.len()
            )));
        }

        log::debug!(
            "ExternalCodec::decode(): {} decoded {} image: sides: {} spt: {}",
            self.name,
            format,
            decoded.sides,
            decoded.sectors_per_track
        );
        Ok(decoded)
    }
}
