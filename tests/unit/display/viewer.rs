use super::*;

fn tile(x: i32, z: i32, color: u32) -> Tile {
    Tile {
        tile_x: x,
        tile_z: z,
        width: 2,
        height: 2,
        pixels: vec![color; 4],
    }
}

#[test]
fn in_memory_viewer_records_batches() {
    let v = InMemoryViewer::new("alice");
    assert_eq!(v.id(), ViewerId::new("alice"));
    assert_eq!(v.batch_count(), 0);
    assert!(v.last_batch().is_none());

    v.send_tiles(&[tile(0, 0, 1), tile(1, 0, 1)]).unwrap();
    v.send_tiles(&[tile(0, 0, 2)]).unwrap();
    assert_eq!(v.batch_count(), 2);
    assert_eq!(v.tile_count(), 3);
    assert_eq!(v.last_batch().unwrap()[0].pixels, vec![2; 4]);
}

#[test]
fn viewer_id_displays_its_name() {
    assert_eq!(ViewerId::new("bob").to_string(), "bob");
}

#[test]
fn tile_dir_viewer_writes_one_png_per_tile() {
    let nanos = std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .unwrap()
        .as_nanos();
    let dir = std::env::temp_dir()
        .join(format!("tilereel_viewer_{}_{nanos}", std::process::id()))
        .join("carol");

    let v = TileDirViewer::new("carol", &dir).unwrap();
    assert!(dir.is_dir());
    v.send_tiles(&[tile(3, -1, 0xFF00_FF00), tile(4, -1, 0xFF00_00FF)])
        .unwrap();

    let p = v.tile_path(3, -1);
    assert!(p.ends_with("tile_3_-1.png"));
    let img = image::open(&p).unwrap().to_rgba8();
    assert_eq!(img.dimensions(), (2, 2));
    assert_eq!(img.get_pixel(0, 0).0, [0, 255, 0, 255]);
    assert!(v.tile_path(4, -1).exists());

    let _ = std::fs::remove_dir_all(dir.parent().unwrap());
}

fn scratch(tag: &str) -> std::path::PathBuf {
    let nanos = std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .unwrap()
        .as_nanos();
    std::env::temp_dir().join(format!("tilereel_{tag}_{}_{nanos}", std::process::id()))
}

#[test]
fn viewer_names_cannot_leave_the_output_root() {
    let base = scratch("viewer_root");
    let root = base.join("out");

    for name in ["../escaped", "a/b", "/abs", "..", ".", ""] {
        let err = TileDirViewer::under(&root, name).unwrap_err();
        assert!(matches!(err, TileReelError::Config(_)), "{name}: {err}");
    }
    assert!(!base.join("escaped").exists());

    let v = TileDirViewer::under(&root, "dave").unwrap();
    assert_eq!(v.id(), ViewerId::new("dave"));
    assert!(root.join("dave").is_dir());
    assert!(v.tile_path(0, 0).starts_with(root.join("dave")));

    let _ = std::fs::remove_dir_all(&base);
}

#[test]
fn unwritable_tile_dir_is_a_delivery_error() {
    let dir = scratch("viewer_gone");
    let v = TileDirViewer::new("erin", &dir).unwrap();
    std::fs::remove_dir_all(&dir).unwrap();

    let err = v.send_tiles(&[tile(0, 0, 1)]).unwrap_err();
    assert!(matches!(err, TileReelError::Delivery(_)), "{err}");
    assert!(err.to_string().contains("erin"));
}
