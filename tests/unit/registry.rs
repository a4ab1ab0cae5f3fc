use std::sync::atomic::{AtomicUsize, Ordering};

use super::*;
use crate::display::InMemoryViewer;
use crate::foundation::core::{Color, Fps, Pixels};
use crate::schedule::ManualTicker;
use crate::source::FnSource;
use crate::source::procedural::Solid;

fn registry() -> (Arc<ManualTicker>, DisplayRegistry) {
    let ticker = Arc::new(ManualTicker::new());
    (ticker.clone(), DisplayRegistry::new(ticker))
}

fn red() -> Arc<dyn FrameSource> {
    Arc::new(Solid { color: Color::RED })
}

fn opts(frame_count: u64) -> AnimationOpts {
    AnimationOpts {
        frame_count,
        fps: Fps::clamped(10),
        looping: true,
    }
}

#[test]
fn create_get_and_duplicate_ids() {
    let (_t, reg) = registry();
    let d = reg.create("d1", 0, 0, 2, 2).unwrap();
    assert_eq!(d.pixel_width(), 64);
    assert!(reg.exists("d1"));
    assert!(Arc::ptr_eq(&reg.get("d1").unwrap(), &d));

    let err = reg.create("d1", 5, 5, 1, 1).unwrap_err();
    assert!(matches!(err, TileReelError::Config(_)));
    assert_eq!(reg.get("d1").unwrap().grid().origin_x, 0);
    assert_eq!(reg.count(), 1);
}

#[test]
fn all_is_sorted_by_id() {
    let (_t, reg) = registry();
    for id in ["c", "a", "b"] {
        reg.create(id, 0, 0, 1, 1).unwrap();
    }
    reg.create_with(DisplayBuilder::default().id("aa").size(1, 1))
        .unwrap();
    let ids: Vec<String> = reg.all().iter().map(|d| d.id().to_string()).collect();
    assert_eq!(ids, ["a", "aa", "b", "c"]);
}

#[test]
fn unknown_ids_are_reported_not_errors() {
    let (_t, reg) = registry();
    assert!(reg.get("nope").is_none());
    assert!(!reg.remove("nope"));
    assert!(!reg.start_animation("nope", red(), opts(0)));
    assert!(!reg.stop_animation("nope"));
    assert!(!reg.pause_animation("nope"));
    assert!(!reg.resume_animation("nope"));
    assert!(!reg.seek_animation("nope", 3));
    assert!(!reg.is_animating("nope"));
    assert!(reg.current_frame("nope").is_none());
    assert!(!reg.add_viewer("nope", Arc::new(InMemoryViewer::new("v"))));
    assert!(!reg.remove_viewer("nope", &ViewerId::new("v")));
}

#[test]
fn two_by_two_looping_scenario() {
    let (ticker, reg) = registry();
    reg.create("d1", 0, 0, 2, 2).unwrap();
    let viewer = Arc::new(InMemoryViewer::new("v1"));
    assert!(reg.add_viewer("d1", viewer.clone()));

    assert!(reg.start_animation("d1", red(), opts(3)));
    assert!(reg.is_animating("d1"));
    ticker.fire_n(3);

    assert_eq!(reg.current_frame("d1"), Some(FrameIndex(0)));
    assert_eq!(viewer.batch_count(), 3);
    assert_eq!(viewer.tile_count(), 12);

    assert!(reg.stop_animation("d1"));
    assert!(!reg.is_animating("d1"));
    assert!(reg.current_frame("d1").is_none());
}

#[test]
fn restarting_replaces_the_previous_animation() {
    let (ticker, reg) = registry();
    reg.create("d1", 0, 0, 1, 1).unwrap();
    reg.add_viewer("d1", Arc::new(InMemoryViewer::new("v")));

    let first_calls = Arc::new(AtomicUsize::new(0));
    let c = first_calls.clone();
    let first: Arc<dyn FrameSource> =
        Arc::new(FnSource(move |_: FrameIndex, w: u32, h: u32| -> Option<Pixels> {
            c.fetch_add(1, Ordering::SeqCst);
            Some(Arc::new(vec![0; (w * h) as usize]))
        }));
    reg.start_animation("d1", first, opts(0));
    let old = reg.scheduler("d1").unwrap();
    ticker.fire();

    reg.start_animation("d1", red(), opts(0));
    assert!(!old.is_running());
    assert_eq!(ticker.live(), 1);
    ticker.fire_n(4);

    assert_eq!(first_calls.load(Ordering::SeqCst), 1);
    assert_eq!(reg.current_frame("d1"), Some(FrameIndex(4)));
}

#[test]
fn pause_resume_and_seek_route_to_the_scheduler() {
    let (ticker, reg) = registry();
    reg.create("d1", 0, 0, 1, 1).unwrap();
    reg.add_viewer("d1", Arc::new(InMemoryViewer::new("v")));
    reg.start_animation("d1", red(), opts(100));

    assert!(reg.pause_animation("d1"));
    assert!(reg.is_paused("d1"));
    assert!(!reg.pause_animation("d1"));
    ticker.fire_n(3);
    assert_eq!(reg.current_frame("d1"), Some(FrameIndex(0)));

    assert!(reg.seek_animation("d1", 500));
    assert_eq!(reg.current_frame("d1"), Some(FrameIndex(99)));
    assert!(reg.resume_animation("d1"));
    ticker.fire();
    assert_eq!(reg.current_frame("d1"), Some(FrameIndex(0)));
}

#[test]
fn remove_stops_the_animation_first() {
    let (ticker, reg) = registry();
    reg.create("d1", 0, 0, 1, 1).unwrap();
    reg.start_animation("d1", red(), opts(0));
    let s = reg.scheduler("d1").unwrap();

    assert!(reg.remove("d1"));
    assert!(!s.is_running());
    assert!(!reg.exists("d1"));
    assert_eq!(ticker.live(), 0);
}

#[test]
fn stop_all_and_remove_all() {
    let (ticker, reg) = registry();
    for id in ["a", "b"] {
        reg.create(id, 0, 0, 1, 1).unwrap();
        reg.start_animation(id, red(), opts(0));
    }
    assert_eq!(ticker.live(), 2);
    reg.stop_all();
    assert_eq!(ticker.live(), 0);
    assert_eq!(reg.count(), 2);

    reg.start_animation("a", red(), opts(0));
    reg.remove_all();
    assert_eq!(reg.count(), 0);
    assert_eq!(ticker.live(), 0);
}

#[test]
fn joining_viewer_gets_the_last_frame() {
    let (ticker, reg) = registry();
    reg.create("d1", 0, 0, 2, 1).unwrap();
    let first = Arc::new(InMemoryViewer::new("first"));
    reg.add_viewer("d1", first.clone());
    reg.start_animation("d1", red(), opts(0));
    ticker.fire();
    reg.stop_animation("d1");

    let late = Arc::new(InMemoryViewer::new("late"));
    assert!(reg.add_viewer("d1", late.clone()));
    assert_eq!(late.batch_count(), 1);
    assert_eq!(late.tile_count(), 2);
    assert_eq!(first.batch_count(), 1);

    // Fresh display: nothing to replay.
    reg.create("d2", 0, 0, 1, 1).unwrap();
    let v = Arc::new(InMemoryViewer::new("v"));
    reg.add_viewer("d2", v.clone());
    assert_eq!(v.batch_count(), 0);
}

#[test]
fn viewer_can_leave_one_or_every_display() {
    let (_t, reg) = registry();
    reg.create("a", 0, 0, 1, 1).unwrap();
    reg.create("b", 0, 0, 1, 1).unwrap();
    for id in ["a", "b"] {
        reg.add_viewer(id, Arc::new(InMemoryViewer::new("v")));
    }

    assert!(reg.remove_viewer("a", &ViewerId::new("v")));
    assert_eq!(reg.get("a").unwrap().viewer_count(), 0);
    assert_eq!(reg.get("b").unwrap().viewer_count(), 1);

    reg.remove_viewer_from_all(&ViewerId::new("v"));
    assert_eq!(reg.get("b").unwrap().viewer_count(), 0);
}

#[test]
fn dropping_the_registry_stops_everything() {
    let (ticker, reg) = registry();
    reg.create("d1", 0, 0, 1, 1).unwrap();
    reg.start_animation("d1", red(), opts(0));
    drop(reg);
    assert_eq!(ticker.live(), 0);
}

#[test]
fn summaries_flag_playing_displays() {
    let (_t, reg) = registry();
    reg.create("b", 0, 0, 1, 1).unwrap();
    reg.create("a", 2, 0, 1, 1).unwrap();
    reg.start_animation("b", red(), opts(0));

    let lines = reg.display_summaries();
    assert_eq!(lines.len(), 2);
    assert!(lines[0].starts_with("a: ") && !lines[0].ends_with("[PLAYING]"));
    assert!(lines[1].starts_with("b: ") && lines[1].ends_with("[PLAYING]"));
}
