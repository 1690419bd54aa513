mod common;

use common::init_logging;
use common::synthetic_image::{pattern, DotArray};
use rom_grid::image::io::save_rgb_png;
use rom_grid::persist::FormatVersion;
use rom_grid::prelude::*;
use rom_grid::Error;
use std::fs;
use std::path::{Path, PathBuf};

/// Write a 16x4 dot array to `dir/rom.png` and place an exact grid over it.
fn saved_photo_session(dir: &Path) -> (PathBuf, Session) {
    let array = DotArray::new(16, 4);
    let image = dir.join("rom.png");
    save_rgb_png(&array.render(pattern), &image).expect("write png");

    let raster = RasterBuffers::load(&image).expect("load png");
    let cfg = DecodeConfig {
        save_dat: true,
        ..DecodeConfig::default().with_default_radius(4)
    };
    let mut session =
        Session::new(raster, GroupLayout::new(8, 4).expect("layout"), cfg).expect("session");
    for col in 0..16 {
        session.insert_column(array.center(col, 0).0).expect("column");
    }
    for row in 0..4 {
        session.insert_row(array.center(0, row).1).expect("row");
    }
    (image, session)
}

#[test]
fn missing_image_is_a_load_error() {
    let dir = tempfile::tempdir().expect("tempdir");
    assert!(matches!(
        RasterBuffers::load(dir.path().join("absent.png")),
        Err(Error::ImageLoad { .. })
    ));
}

#[test]
fn save_and_reopen_round_trips() {
    init_logging();
    let dir = tempfile::tempdir().expect("tempdir");
    let (_, mut session) = saved_photo_session(dir.path());
    session.read_data().expect("read");
    session.toggle(BitXY::new(3, 2)).expect("manual edit");
    let saved = session.save().expect("save");
    assert_eq!(saved.slot, 0);

    let reopened = Session::open(&dir.path().join("rom.grid"), None, None).expect("reopen");
    assert_eq!(reopened.lines(), session.lines());
    assert_eq!(reopened.bits(), session.bits());
    assert_eq!(reopened.config(), session.config());
    assert_eq!(reopened.layout(), session.layout());
    assert_eq!(
        reopened.packed_bytes().expect("pack"),
        session.packed_bytes().expect("pack")
    );
}

#[test]
fn saves_use_fresh_slots_and_move_aliases() {
    init_logging();
    let dir = tempfile::tempdir().expect("tempdir");
    let (_, mut session) = saved_photo_session(dir.path());

    let first = session.save().expect("first save");
    assert_eq!(first.grid, dir.path().join("rom_s0.grid"));
    assert!(first.txt.is_none(), "no text export before a read");
    assert!(first.dat.is_empty());

    session.read_data().expect("read");
    let second = session.save().expect("second save");
    assert_eq!(second.slot, 1);
    assert_eq!(second.txt, Some(dir.path().join("rom_s1.txt")));
    assert_eq!(
        second.dat,
        vec![dir.path().join("rom_s1-0.dat"), dir.path().join("rom_s1-1.dat")]
    );

    // The first slot is untouched and the aliases follow the latest save.
    let slot0 = GridDocument::load(&first.grid).expect("slot 0");
    assert!(slot0.data.is_none());
    let alias = GridDocument::load(&dir.path().join("rom.grid")).expect("alias");
    assert!(alias.data.is_some());

    let text = fs::read_to_string(dir.path().join("rom.txt")).expect("txt alias");
    assert_eq!(text, session.text_export().expect("text"));

    let groups = session.packed_groups().expect("groups");
    for (g, bytes) in groups.iter().enumerate() {
        let dat = fs::read(dir.path().join(format!("rom_{g}.dat"))).expect("dat alias");
        assert_eq!(&dat, bytes);
    }
    assert!(!dir.path().join("rom.grid_").exists());
}

#[test]
fn failed_save_leaves_aliases_alone() {
    init_logging();
    let dir = tempfile::tempdir().expect("tempdir");
    let (_, mut session) = saved_photo_session(dir.path());
    session.read_data().expect("read");
    // A directory where the second data file should go makes that write fail.
    fs::create_dir(dir.path().join("rom_s0-1.dat")).expect("blocker");

    assert!(session.save().is_err());
    assert!(dir.path().join("rom_s0.grid").exists());
    assert!(fs::symlink_metadata(dir.path().join("rom.grid")).is_err());
    assert!(fs::symlink_metadata(dir.path().join("rom.txt")).is_err());
    assert!(fs::symlink_metadata(dir.path().join("rom_0.dat")).is_err());
}

#[test]
fn malformed_data_keeps_the_grid() {
    init_logging();
    let dir = tempfile::tempdir().expect("tempdir");
    let (_, session) = saved_photo_session(dir.path());
    let mut doc = session.to_document();
    doc.data = serde_json::from_str(r#"["1", "0", "1"]"#).expect("tokens");
    let grid = dir.path().join("broken.grid");
    doc.write(&grid).expect("write");

    let reopened = Session::open(&grid, Some(&dir.path().join("rom.png")), None).expect("open");
    assert_eq!(reopened.lines(), session.lines());
    assert!(!reopened.data_read());
}

#[test]
fn bad_bit_tokens_keep_the_grid() {
    init_logging();
    let dir = tempfile::tempdir().expect("tempdir");
    let (image, session) = saved_photo_session(dir.path());
    let mut tokens = vec!["0"; 63];
    tokens.push("2");
    let too_wide = vec!["10"; 32];
    for data in [tokens, too_wide] {
        let mut doc = session.to_document();
        doc.data = serde_json::from_value(serde_json::json!(data)).expect("tokens");
        let grid = dir.path().join("bad.grid");
        doc.write(&grid).expect("write");

        let reopened = Session::open(&grid, Some(&image), None).expect("open");
        assert_eq!(reopened.lines(), session.lines());
        assert!(!reopened.data_read());
    }
}

#[test]
fn legacy_document_loads_with_defaults() {
    init_logging();
    let dir = tempfile::tempdir().expect("tempdir");
    let (image, _) = saved_photo_session(dir.path());
    let grid = dir.path().join("legacy.grid");
    fs::write(
        &grid,
        r#"{
            "grid_points_x": [44, 20, 32, 32],
            "grid_points_y": [20],
            "data": "010",
            "config": {"radius": 4.0, "bit_thresh_div": 8, "LSB_Mode": true, "view": {"x": 0}},
            "img_fn": "rom.png"
        }"#,
    )
    .expect("write legacy");

    let doc = GridDocument::load(&grid).expect("load");
    assert_eq!(doc.version, FormatVersion(1, 0));

    let layout = GroupLayout::new(8, 1).expect("layout");
    let session = Session::open(&grid, None, Some(layout)).expect("open");
    assert_eq!(session.lines().columns(), &[20, 32, 44]);
    assert_eq!(session.bits().map(|b| b.to_bit_string()), Some("010".into()));
    assert_eq!(session.config().bit_thresh_div, 8);
    assert!(session.config().lsb_mode);
    assert_eq!(session.raster().source(), Some(image.as_path()));

    // Without a stored or supplied layout the document cannot be resumed.
    assert!(matches!(
        Session::open(&grid, None, None),
        Err(Error::Config(_))
    ));
}

#[test]
fn newer_major_version_is_rejected() {
    let dir = tempfile::tempdir().expect("tempdir");
    let grid = dir.path().join("future.grid");
    fs::write(
        &grid,
        r#"{"version": [2, 0], "grid_points_x": [], "grid_points_y": []}"#,
    )
    .expect("write");
    assert!(matches!(
        GridDocument::load(&grid),
        Err(Error::UnsupportedVersion { major: 2, .. })
    ));
}
