use crate::foundation::error::TileReelResult;

use super::*;

struct FailingViewer;

impl Viewer for FailingViewer {
    fn id(&self) -> ViewerId {
        ViewerId::new("broken")
    }

    fn send_tiles(&self, _tiles: &[Tile]) -> TileReelResult<()> {
        Err(TileReelError::delivery("connection reset"))
    }
}

fn display() -> Display {
    Display::new("d1", 0, 0, 2, 2).unwrap()
}

#[test]
fn new_validates_inputs() {
    assert!(matches!(
        Display::new("", 0, 0, 1, 1),
        Err(TileReelError::Config(_))
    ));
    assert!(matches!(
        Display::new("d", 0, 0, 0, 3),
        Err(TileReelError::Config(_))
    ));
    assert!(matches!(
        Display::new("d", 0, 0, u32::MAX, 1),
        Err(TileReelError::Config(_))
    ));

    let d = Display::new("wall", -4, 7, 3, 2).unwrap();
    assert_eq!(d.pixel_width(), 96);
    assert_eq!(d.pixel_height(), 64);
    assert_eq!(d.total_pixels(), 96 * 64);
    assert_eq!(d.grid().origin_x, -4);
}

#[test]
fn viewer_membership_is_a_set() {
    let d = display();
    assert!(d.add_viewer(Arc::new(InMemoryViewer::new("a"))));
    assert!(!d.add_viewer(Arc::new(InMemoryViewer::new("a"))));
    assert!(d.add_viewer(Arc::new(InMemoryViewer::new("b"))));
    assert_eq!(d.viewer_count(), 2);
    assert_eq!(d.viewer_ids(), [ViewerId::new("a"), ViewerId::new("b")]);

    assert!(d.remove_viewer(&ViewerId::new("a")));
    assert!(!d.remove_viewer(&ViewerId::new("a")));
    assert!(!d.has_viewer(&ViewerId::new("a")));
    d.clear_viewers();
    assert_eq!(d.viewer_count(), 0);
}

#[test]
fn broadcast_delivers_every_tile_to_every_viewer() {
    let d = display();
    let a = Arc::new(InMemoryViewer::new("a"));
    let b = Arc::new(InMemoryViewer::new("b"));
    d.add_viewer(a.clone());
    d.add_viewer(b.clone());

    let report = d.fill(Color::RED).unwrap();
    assert_eq!(
        report,
        BroadcastReport {
            tiles: 4,
            delivered: 2,
            failed: 0
        }
    );
    for v in [&a, &b] {
        assert_eq!(v.batch_count(), 1);
        let batch = v.last_batch().unwrap();
        assert_eq!(batch.len(), 4);
        assert!(
            batch
                .iter()
                .all(|t| t.pixels.iter().all(|&p| p == Color::RED))
        );
    }
}

#[test]
fn wrong_size_is_rejected_before_any_delivery() {
    let d = display();
    let v = Arc::new(InMemoryViewer::new("a"));
    d.add_viewer(v.clone());

    let err = d.broadcast(&Arc::new(vec![0; 10])).unwrap_err();
    assert!(matches!(
        err,
        TileReelError::SizeMismatch {
            expected: 4096,
            actual: 10
        }
    ));
    assert_eq!(v.batch_count(), 0);
    assert!(d.last_frame().is_none());
}

#[test]
fn failing_viewer_does_not_block_the_others() {
    let d = display();
    let ok = Arc::new(InMemoryViewer::new("ok"));
    d.add_viewer(Arc::new(FailingViewer));
    d.add_viewer(ok.clone());

    let report = d.clear().unwrap();
    assert_eq!(report.delivered, 1);
    assert_eq!(report.failed, 1);
    assert_eq!(ok.batch_count(), 1);
}

#[test]
fn broadcast_without_viewers_still_records_last_frame() {
    let d = display();
    let frame: Pixels = Arc::new(vec![Color::BLUE; d.total_pixels()]);
    let report = d.broadcast(&frame).unwrap();
    assert_eq!(report.delivered, 0);
    assert!(Arc::ptr_eq(&d.last_frame().unwrap(), &frame));
}

#[test]
fn broadcast_to_targets_one_viewer() {
    let d = display();
    let a = Arc::new(InMemoryViewer::new("a"));
    let b = InMemoryViewer::new("b");
    d.add_viewer(a.clone());

    d.broadcast_to(&b, &vec![Color::GREEN; d.total_pixels()])
        .unwrap();
    assert_eq!(b.tile_count(), 4);
    assert_eq!(a.batch_count(), 0);
    assert!(d.broadcast_to(&b, &[0; 3]).is_err());
}

#[test]
fn builder_defaults_and_pixel_size() {
    let d = DisplayBuilder::default().build().unwrap();
    assert!(d.id().starts_with("display_"));
    assert_eq!((d.grid().tiles_wide, d.grid().tiles_high), (10, 6));

    let d = Display::builder()
        .id("b")
        .position(3, 4)
        .pixel_size(100, 64)
        .build()
        .unwrap();
    assert_eq!((d.grid().tiles_wide, d.grid().tiles_high), (4, 2));
    assert_eq!((d.grid().origin_x, d.grid().origin_z), (3, 4));
}

#[test]
fn display_text_summarizes_the_grid() {
    let d = display();
    d.add_viewer(Arc::new(InMemoryViewer::new("a")));
    assert_eq!(
        d.to_string(),
        "d1: 2x2 tiles at (0, 0), 64x64px, 1 viewers"
    );
}
