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

    src/disk_image.rs

    The Disk Image Store: the canonical in-memory form of one catalog slot.
*/

//! A [DiskImage] owns the canonical sector buffer of an image, in side-major, track-major,
//! sector-major order at a fixed 512-byte stride, however the image was stored on the host.
//! [DiskImage::decode] produces one from a host file, and [DiskImage::encode_back] turns it
//! back into a file of its original format after the guest has written to it.

use crate::{
    boot_sector,
    containers::DiskImageContainer,
    detect::detect_image_format,
    file_parsers::{ImageParser, SectorImage},
    geometry,
    io::Cursor,
    protected::ProtectedCodec,
    types::{Geometry, ImageFormat, ImageKind},
    util::split_file_name,
    FloppyError,
};

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct DiskImage {
    pub(crate) display_name: String,
    pub(crate) data: Vec<u8>,
    pub(crate) source_format: Option<ImageFormat>,
    pub(crate) kind: ImageKind,
    pub(crate) archived: bool,
    pub(crate) container_geometry: Option<(u16, u16)>,
    pub(crate) header: Option<Vec<u8>>,
    pub(crate) modified: bool,
    pub(crate) saved: bool,
}

impl DiskImage {
    /// Create an empty image carrying only a name.
    pub fn empty(name: &str) -> DiskImage {
        DiskImage {
            display_name: name.to_string(),
            ..Default::default()
        }
    }

    /// Decode a host file into a canonical image. `name` is the host path or file name; its
    /// extension is used to pick the format when present.
    pub fn decode(name: Option<&str>, bytes: &[u8], codec: &dyn ProtectedCodec) -> Result<DiskImage, FloppyError> {
        let mut image_io = Cursor::new(bytes);
        let container = detect_image_format(name, &mut image_io)?;
        let display_name = name.map(|n| split_file_name(n).0.to_string()).unwrap_or_default();

        log::debug!("DiskImage::decode(): {} as {}", display_name, container);

        let mut image = match &container {
            DiskImageContainer::Raw(format) => DiskImage::decode_format(*format, bytes, codec)?,
            DiskImageContainer::Zip(format, entry) => {
                let inner = DiskImage::extract_entry(&mut image_io, entry)?;
                DiskImage::decode_format(*format, &inner, codec)?
            }
        };

        image.display_name = display_name;
        image.archived = container.is_archived();
        Ok(image)
    }

    #[cfg(feature = "zip")]
    fn extract_entry(image_io: &mut Cursor<&[u8]>, entry: &str) -> Result<Vec<u8>, FloppyError> {
        crate::containers::zip::extract_file(image_io, entry)
    }

    #[cfg(not(feature = "zip"))]
    fn extract_entry(_image_io: &mut Cursor<&[u8]>, _entry: &str) -> Result<Vec<u8>, FloppyError> {
        Err(FloppyError::FormatUnrecognized)
    }

    fn decode_format(format: ImageFormat, bytes: &[u8], codec: &dyn ProtectedCodec) -> Result<DiskImage, FloppyError> {
        match format.kind() {
            ImageKind::PlainSector => {
                let parsed = format.load_image(Cursor::new(bytes))?;
                Ok(DiskImage {
                    container_geometry: parsed.container_geometry(),
                    data: parsed.data,
                    header: parsed.header,
                    source_format: Some(format),
                    kind: ImageKind::PlainSector,
                    ..Default::default()
                })
            }
            ImageKind::ProtectedIpf | ImageKind::ProtectedStx => {
                let decoded = codec.decode(format, bytes)?;
                Ok(DiskImage {
                    container_geometry: Some((decoded.sides, decoded.sectors_per_track))
                        .filter(|(sides, spt)| *sides > 0 && *spt > 0),
                    data: decoded.data,
                    source_format: Some(format),
                    kind: format.kind(),
                    ..Default::default()
                })
            }
            ImageKind::None => Err(FloppyError::FormatUnrecognized),
        }
    }

    /// Encode the canonical buffer back into `format`. Only plain sector formats can be written;
    /// protected formats are never re-encoded.
    pub fn encode_back(&self, format: ImageFormat) -> Result<Vec<u8>, FloppyError> {
        if !format.is_plain_sector() {
            return Err(FloppyError::EncodeError(format!("{} images cannot be written back", format)));
        }
        if !self.is_populated() {
            return Err(FloppyError::EncodeError("image has no content".to_string()));
        }

        let geometry = self.geometry();
        let sector_image = SectorImage {
            data: self.data.clone(),
            sides: geometry.sides,
            sectors_per_track: geometry.sectors_per_track,
            header: self.header.clone(),
        };

        let mut out = Cursor::new(Vec::with_capacity(self.data.len() + 1024));
        format.save_image(&sector_image, &mut out)?;
        log::trace!(
            "DiskImage::encode_back(): {} encoded as {} ({} bytes)",
            self.display_name,
            format,
            out.get_ref().len()
        );
        Ok(out.into_inner())
    }

    /// The geometry a drive presents for this image: the boot sector's declaration, checked
    /// against the image size.
    pub fn geometry(&self) -> Geometry {
        geometry::find_disk_details(&self.data, self.container_geometry)
    }

    /// Return true if the boot sector is safe to write back.
    pub fn boot_sector_ok(&self) -> bool {
        boot_sector::boot_sector_ok(&self.data)
    }

    /// Return true if this image may ever be persisted: a plain sector image that did not come
    /// out of an archive, with a trustworthy boot sector.
    pub fn can_persist(&self) -> bool {
        self.kind == ImageKind::PlainSector && !self.archived && self.boot_sector_ok()
    }

    pub fn is_populated(&self) -> bool {
        self.kind != ImageKind::None && !self.data.is_empty()
    }

    pub fn name(&self) -> &str {
        &self.display_name
    }

    pub fn data(&self) -> &[u8] {
        &self.data
    }

    pub fn source_format(&self) -> Option<ImageFormat> {
        self.source_format
    }

    pub fn kind(&self) -> ImageKind {
        self.kind
    }

    pub fn is_archived(&self) -> bool {
        self.archived
    }

    pub fn is_modified(&self) -> bool {
        self.modified
    }

    /// True once the slot's content has been replaced by a saved copy, either loaded from the
    /// host save store or written back at eject.
    pub fn is_saved(&self) -> bool {
        self.saved
    }
}
