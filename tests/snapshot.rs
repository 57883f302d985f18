mod common;

use common::*;
use floppybay::{prelude::*, TransitionKind};

#[test]
fn test_snapshot_restores_drive_contents() {
    init();
    let mut catalog = catalog();
    catalog
        .load_playlist(
            0,
            &[
                (Some("disk1.st"), st_image(80, 1, 9).as_slice()),
                (Some("disk2.msa"), msa_image(80, 2, 9).as_slice()),
            ],
        )
        .unwrap();
    catalog.set_tick(4000);
    catalog.write_sectors(DriveId::B, 7, 1, 2, &[0x3C; 512]).unwrap();
    let drive_b_hash = compute_slice_hash(catalog.drive(DriveId::B).image().unwrap().data());

    let blob = catalog.save_snapshot().unwrap();

    // Wander off: swap disks around and scribble.
    catalog.set_tick(9000);
    catalog.select(DriveId::B, 0).unwrap();
    catalog.set_inserted(DriveId::B, true).unwrap();
    assert!(!catalog.is_inserted(DriveId::A));

    catalog.restore_snapshot(&blob).unwrap();
    assert_eq!(catalog.tick(), 4000);
    assert_eq!(catalog.active_slot(DriveId::A), Some(0));
    assert_eq!(catalog.active_slot(DriveId::B), Some(1));
    assert!(catalog.is_inserted(DriveId::A));
    assert!(catalog.is_inserted(DriveId::B));

    let drive_b = catalog.drive(DriveId::B);
    assert_eq!(compute_slice_hash(drive_b.image().unwrap().data()), drive_b_hash);
    assert_eq!(drive_b.image().unwrap().source_format(), Some(ImageFormat::Msa));
    assert_eq!(drive_b.geometry(), Geometry::new(80, 2, 9));
    assert!(drive_b.is_modified());
    assert!(drive_b.ok_to_persist());
    assert_eq!(catalog.label(1).unwrap(), "[B:] disk2.msa");
}

#[test]
fn test_restore_does_not_persist_by_default() {
    init();
    let mut catalog = catalog();
    catalog.load_content(Some("game.st"), &st_image(80, 1, 9)).unwrap();
    let blob = catalog.save_snapshot().unwrap();

    catalog.set_tick(100);
    catalog.write_sectors(DriveId::A, 2, 0, 2, &[0x01; 512]).unwrap();
    catalog.restore_snapshot(&blob).unwrap();
    assert!(catalog.save_store().load("game.st").is_none());
    assert!(!catalog.drive(DriveId::A).is_modified());

    let mut catalog = Catalog::new(FloppyConfig::default().with_persist_on_restore(true));
    catalog.load_content(Some("game.st"), &st_image(80, 1, 9)).unwrap();
    let blob = catalog.save_snapshot().unwrap();
    catalog.set_tick(100);
    catalog.write_sectors(DriveId::A, 2, 0, 2, &[0x01; 512]).unwrap();
    catalog.restore_snapshot(&blob).unwrap();
    assert!(catalog.save_store().load("game.st").is_some());
}

#[test]
fn test_saved_slot_marks_restored_drive_modified() {
    init();
    let mut catalog = catalog();
    catalog.load_content(Some("game.st"), &st_image(80, 1, 9)).unwrap();
    catalog.set_tick(100);
    catalog.write_sectors(DriveId::A, 2, 0, 2, &[0x01; 512]).unwrap();
    catalog.set_inserted(DriveId::A, false).unwrap();
    catalog.set_inserted(DriveId::A, true).unwrap();
    assert!(catalog.slot(0).unwrap().is_saved());
    assert!(!catalog.drive(DriveId::A).is_modified());

    let blob = catalog.save_snapshot().unwrap();
    catalog.restore_snapshot(&blob).unwrap();
    assert!(catalog.drive(DriveId::A).is_modified());
}

#[test]
fn test_uncatalogued_image() {
    init();
    let mut catalog = catalog();
    catalog.load_content(Some("old.st"), &st_image(80, 1, 9)).unwrap();
    let blob = catalog.save_snapshot().unwrap();

    catalog.load_content(Some("new.st"), &st_image(80, 2, 9)).unwrap();
    catalog.restore_snapshot(&blob).unwrap();

    let drive = catalog.drive(DriveId::A);
    assert!(drive.is_inserted());
    assert_eq!(drive.active_slot(), None);
    assert_eq!(drive.image().unwrap().name(), "old.st");
    assert!(catalog.read_sectors(DriveId::A, 79, 0, 9, 1).is_ok());
    assert_eq!(catalog.label(0).unwrap(), "new.st");
}

#[test]
fn test_pending_transitions_survive() {
    init();
    let mut catalog = catalog();
    catalog.load_content(Some("game.st"), &st_image(80, 1, 9)).unwrap();
    catalog.set_tick(300);
    catalog.set_inserted(DriveId::A, false).unwrap();
    catalog.set_tick(305);
    catalog.set_inserted(DriveId::A, true).unwrap();
    let blob = catalog.save_snapshot().unwrap();

    let mut other = Catalog::new(FloppyConfig::default());
    other.load_content(Some("game.st"), &st_image(80, 1, 9)).unwrap();
    other.restore_snapshot(&blob).unwrap();

    let transition = other.drive(DriveId::A).transition();
    assert_eq!(transition.state1().map(|s| (s.kind, s.start)), Some((TransitionKind::Eject, 300)));
    assert_eq!(transition.state2().map(|s| (s.kind, s.start)), Some((TransitionKind::Insert, 318)));
    assert_eq!(
        other.current_write_protect_override(DriveId::A),
        WriteProtectOverride::ForceProtected
    );
    other.set_tick(318);
    assert_eq!(
        other.current_write_protect_override(DriveId::A),
        WriteProtectOverride::ForceUnprotected
    );
}

#[test]
fn test_container_geometry_survives_restore() {
    init();
    let sectors = headerless_sectors(40, 1, 9);
    let mut catalog = catalog();
    catalog.load_content(Some("short.msa"), &msa_from_sectors(&sectors, 40, 1, 9)).unwrap();
    assert_eq!(catalog.drive(DriveId::A).geometry(), Geometry::new(40, 1, 9));

    let blob = catalog.save_snapshot().unwrap();
    catalog.restore_snapshot(&blob).unwrap();
    assert_eq!(catalog.drive(DriveId::A).geometry(), Geometry::new(40, 1, 9));
    assert_eq!(catalog.read_sectors(DriveId::A, 5, 0, 3, 1).unwrap().len(), 512);

    // Write-back still knows the layout.
    catalog.set_tick(100);
    catalog.write_sectors(DriveId::A, 39, 0, 9, &[0x6D; 512]).unwrap();
    catalog.set_inserted(DriveId::A, false).unwrap();
    let saved = catalog.save_store().load("short.msa").unwrap();
    let image = DiskImage::decode(Some("short.msa"), &saved, &UnavailableCodec).unwrap();
    assert_eq!(image.geometry(), Geometry::new(40, 1, 9));
}

#[test]
fn test_dim_header_survives_restore() {
    init();
    let mut dim = dim_image(80, 2, 9);
    dim[13] = 0x02;
    dim[20] = 0x5A;

    let mut catalog = catalog();
    catalog.load_content(Some("fast.dim"), &dim).unwrap();
    let blob = catalog.save_snapshot().unwrap();
    catalog.restore_snapshot(&blob).unwrap();

    catalog.set_tick(100);
    catalog.write_sectors(DriveId::A, 3, 1, 4, &[0x21; 512]).unwrap();
    catalog.set_inserted(DriveId::A, false).unwrap();

    let saved = catalog.save_store().load("fast.dim").unwrap();
    assert_eq!(&saved[..32], &dim[..32]);
}

#[test]
fn test_duplicate_names_map_to_distinct_slots() {
    init();
    let image = st_image(80, 1, 9);
    let mut catalog = catalog();
    catalog
        .load_playlist(0, &[(Some("same.st"), image.as_slice()), (Some("same.st"), image.as_slice())])
        .unwrap();
    let blob = catalog.save_snapshot().unwrap();
    catalog.restore_snapshot(&blob).unwrap();

    assert_eq!(catalog.active_slot(DriveId::A), Some(0));
    assert_eq!(catalog.active_slot(DriveId::B), Some(1));
}
