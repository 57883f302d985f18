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

    src/containers/zip.rs

    Code to handle a ZIP file container. Disk images for the ST are commonly
    distributed inside ZIP files. This module provides the utilities to list
    and extract them.
*/
use crate::{io::ReadSeek, FloppyError, MAX_IMAGE_SIZE};
use std::io::Read;

pub struct ZipFileEntry {
    pub name: String,
    pub size: u64,
}

pub struct ZipFileListing {
    pub files: Vec<ZipFileEntry>,
    pub total_size: u64,
}

/// Return whether the provided image is a ZIP file, and if so, how many files it holds.
pub fn detect_zip<T: ReadSeek>(image_io: &mut T) -> (bool, usize) {
    match zip::ZipArchive::new(image_io) {
        Ok(zip) => (true, zip.len()),
        Err(_) => (false, 0),
    }
}

pub fn file_listing<T: ReadSeek>(image_io: &mut T) -> Result<ZipFileListing, FloppyError> {
    let mut zip = zip::ZipArchive::new(image_io)?;
    let mut files = Vec::new();
    let mut total_size = 0;
    for i in 0..zip.len() {
        let file = zip.by_index(i)?;
        if file.is_dir() {
            continue;
        }
        if let Some(file_name) = file.enclosed_name() {
            files.push(ZipFileEntry {
                name: file_name.to_string_lossy().to_string(),
                size: file.size(),
            });
            total_size += file.size();
        }
    }

    Ok(ZipFileListing { files, total_size })
}

pub fn extract_file<T: ReadSeek>(image_io: &mut T, file_name: &str) -> Result<Vec<u8>, FloppyError> {
    let mut zip = zip::ZipArchive::new(image_io)?;
    let mut file = zip.by_name(file_name)?;

    // Sanity check, is file < 100MB? Let's not zip-bomb ourselves.
    if file.size() > MAX_IMAGE_SIZE as u64 {
        return Err(FloppyError::DecodeError(format!(
            "zip entry {} is too large: {} bytes",
            file_name,
            file.size()
        )));
    }

    let mut file_buf = Vec::new();
    file.read_to_end(&mut file_buf)?;
    Ok(file_buf)
}
