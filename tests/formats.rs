mod common;

use common::*;
use floppybay::{
    geometry::{infer, PLAUSIBLE_SECTORS_PER_TRACK, PLAUSIBLE_TRACKS, SINGLE_SIDED_LIMIT},
    prelude::*,
};

#[test]
fn test_infer_corrects_wrong_geometry() {
    init();
    for sides in [1u16, 2] {
        for spt in PLAUSIBLE_SECTORS_PER_TRACK {
            for tracks in PLAUSIBLE_TRACKS {
                let size = sides as usize * spt as usize * tracks * DEFAULT_SECTOR_SIZE;
                // The side count is guessed from size; combinations on the wrong side of the
                // limit are not in the table.
                if (size < SINGLE_SIDED_LIMIT) != (sides == 1) {
                    continue;
                }
                let wrong_sides = 3 - sides;
                let wrong_spt = if spt == 9 { 11 } else { 9 };
                assert_eq!(
                    infer(size, wrong_sides, wrong_spt),
                    (sides, spt),
                    "sides: {} spt: {} tracks: {}",
                    sides,
                    spt,
                    tracks
                );
            }
        }
    }
}

#[test]
fn test_infer_keeps_unknown_sizes() {
    init();
    assert_eq!(infer(40 * 9 * DEFAULT_SECTOR_SIZE, 1, 9), (1, 9));
    assert_eq!(infer(40 * 9 * DEFAULT_SECTOR_SIZE, 2, 5), (2, 5));
}

#[test]
fn test_wrong_bpb_is_corrected_on_insert() {
    init();
    let mut image = st_image(80, 2, 9);
    // Claim single sided, 10 sectors, and a total that does not match the file.
    write_bpb(&mut image, 1, 10, 800);

    let mut catalog = Catalog::new(FloppyConfig::default());
    catalog.load_content(Some("liar.st"), &image).unwrap();
    assert_eq!(catalog.drive(DriveId::A).geometry(), Geometry::new(80, 2, 9));
}

#[test]
fn test_plain_round_trip() {
    init();
    let st = st_image(80, 2, 9);
    let dim = dim_image(82, 2, 10);

    for (name, bytes) in [("disk.st", &st), ("disk.dim", &dim)] {
        let image = DiskImage::decode(Some(name), bytes, &UnavailableCodec).unwrap();
        let format = image.source_format().unwrap();
        let encoded = image.encode_back(format).unwrap();
        assert_eq!(compute_slice_hash(&encoded), compute_slice_hash(bytes), "{}", name);
    }
}

#[test]
fn test_msa_round_trip() {
    init();
    let raw = msa_image(80, 2, 9);
    let image = DiskImage::decode(Some("disk.msa"), &raw, &UnavailableCodec).unwrap();
    assert_eq!(image.source_format(), Some(ImageFormat::Msa));
    assert_eq!(image.data(), st_image(80, 2, 9).as_slice());

    // Our own output is stable under another decode/encode pass.
    let encoded = image.encode_back(ImageFormat::Msa).unwrap();
    assert!(encoded.len() < raw.len());
    let again = DiskImage::decode(Some("disk.msa"), &encoded, &UnavailableCodec).unwrap();
    assert_eq!(again.data(), image.data());
    assert_eq!(again.encode_back(ImageFormat::Msa).unwrap(), encoded);
}

#[test]
fn test_detect_without_name() {
    init();
    let msa = msa_image(80, 1, 9);
    let image = DiskImage::decode(None, &msa, &UnavailableCodec).unwrap();
    assert_eq!(image.source_format(), Some(ImageFormat::Msa));

    let st = st_image(80, 1, 9);
    let image = DiskImage::decode(None, &st, &UnavailableCodec).unwrap();
    assert_eq!(image.source_format(), Some(ImageFormat::St));

    assert_eq!(
        DiskImage::decode(None, &[0x12; 700], &UnavailableCodec),
        Err(FloppyError::FormatUnrecognized)
    );
}

#[test]
fn test_truncated_msa() {
    init();
    let msa = msa_image(80, 1, 9);
    assert!(matches!(
        DiskImage::decode(Some("disk.msa"), &msa[..msa.len() - 100], &UnavailableCodec),
        Err(FloppyError::DecodeError(_))
    ));
}

#[cfg(feature = "zip")]
#[test]
fn test_zipped_image() {
    use std::io::{Cursor, Write};
    use zip::{write::SimpleFileOptions, CompressionMethod, ZipWriter};

    init();
    let st = st_image(80, 1, 9);
    let mut writer = ZipWriter::new(Cursor::new(Vec::new()));
    let options = SimpleFileOptions::default().compression_method(CompressionMethod::Stored);
    writer.start_file("README.TXT", options).unwrap();
    writer.write_all(b"not a disk").unwrap();
    writer.start_file("GAME.ST", options).unwrap();
    writer.write_all(&st).unwrap();
    let archive = writer.finish().unwrap().into_inner();

    let mut catalog = Catalog::new(FloppyConfig::default());
    catalog.load_content(Some("game.zip"), &archive).unwrap();
    let drive = catalog.drive(DriveId::A);
    assert_eq!(drive.image().unwrap().source_format(), Some(ImageFormat::St));
    assert!(drive.image().unwrap().is_archived());
    assert!(!drive.ok_to_persist());
    assert_eq!(catalog.label(0).unwrap(), "[A:] game.zip");

    catalog.set_tick(100);
    catalog.write_sectors(DriveId::A, 1, 0, 1, &[0x99; 512]).unwrap();
    catalog.set_inserted(DriveId::A, false).unwrap();
    assert!(catalog.save_store().load("game.zip").is_none());
}
