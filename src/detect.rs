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

    src/detect.rs

    Disk image format detection.
    
    The file name extension decides when there is one we recognize. Otherwise
    each parser gets a look at the content, most specific signatures first.
    ST images have no signature at all and are tried last.
*/
use crate::{
    containers::DiskImageContainer,
    file_parsers::{format_from_ext, ImageParser},
    io::ReadSeek,
    types::ImageFormat,
    util::split_file_name,
    FloppyError,
};

const DETECTION_ORDER: [ImageFormat; 6] = [
    ImageFormat::Zip,
    ImageFormat::Msa,
    ImageFormat::Dim,
    ImageFormat::Ipf,
    ImageFormat::Stx,
    ImageFormat::St,
];

/// Return the image format implied by the extension of a file name, if any.
pub fn format_from_name(name: &str) -> Option<ImageFormat> {
    let (_, ext) = split_file_name(name);
    ext.and_then(|ext| format_from_ext(&ext))
}

/// Identify an image format from content alone.
pub fn sniff_format<T: ReadSeek>(image_io: &mut T) -> Option<ImageFormat> {
    DETECTION_ORDER
        .iter()
        .copied()
        .find(|format| format.detect(&mut *image_io))
}

/// Attempt to detect the format of a disk image. If the format cannot be determined,
/// FormatUnrecognized is returned.
pub fn detect_image_format<T: ReadSeek>(
    name: Option<&str>,
    image_io: &mut T,
) -> Result<DiskImageContainer, FloppyError> {
    let format = match name.and_then(format_from_name) {
        Some(format) => {
            log::debug!("detect_image_format(): {:?} identified by name as {}", name, format);
            format
        }
        None => match sniff_format(image_io) {
            Some(format) => {
                log::debug!("detect_image_format(): {:?} identified by content as {}", name, format);
                format
            }
            None => {
                log::error!("detect_image_format(): {:?} extension or content unrecognized", name);
                return Err(FloppyError::FormatUnrecognized);
            }
        },
    };

    if format == ImageFormat::Zip {
        detect_zipped_format(image_io)
    }
    else {
        Ok(DiskImageContainer::Raw(format))
    }
}

/// Look inside a zip archive for the first entry that is a disk image. Entries are matched by
/// extension first; if none has a known extension, the first entry is checked by content.
#[cfg(feature = "zip")]
fn detect_zipped_format<T: ReadSeek>(image_io: &mut T) -> Result<DiskImageContainer, FloppyError> {
    use crate::containers::zip::{extract_file, file_listing};

    let listing = file_listing(image_io)?;

    for entry in listing.files.iter() {
        match format_from_name(&entry.name) {
            Some(ImageFormat::Zip) | None => continue,
            Some(format) => {
                log::debug!("detect_zipped_format(): using archive entry {} ({})", entry.name, format);
                return Ok(DiskImageContainer::Zip(format, entry.name.clone()));
            }
        }
    }

    if let Some(entry) = listing.files.first() {
        let file_buf = extract_file(image_io, &entry.name)?;
        let mut file_io = std::io::Cursor::new(file_buf);
        if let Some(format) = sniff_format(&mut file_io).filter(|f| *f != ImageFormat::Zip) {
            return Ok(DiskImageContainer::Zip(format, entry.name.clone()));
        }
    }

    log::error!("detect_zipped_format(): no disk image found in archive");
    Err(FloppyError::FormatUnrecognized)
}

#[cfg(not(feature = "zip"))]
fn detect_zipped_format<T: ReadSeek>(_image_io: &mut T) -> Result<DiskImageContainer, FloppyError> {
    log::error!("detect_zipped_format(): zip support is not enabled");
    Err(FloppyError::FormatUnrecognized)
}
