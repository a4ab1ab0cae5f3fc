use std::path::PathBuf;

use super::*;
use crate::foundation::core::Color;
use crate::source::codec::write_png;

fn temp_dir(name: &str) -> PathBuf {
    let nanos = std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .unwrap()
        .as_nanos();
    let dir = std::env::temp_dir().join(format!(
        "tilereel_seq_{name}_{}_{nanos}",
        std::process::id()
    ));
    std::fs::create_dir_all(&dir).unwrap();
    dir
}

/// Write one solid-color 4x4 PNG per `(name, color)`.
fn write_frames(dir: &Path, frames: &[(&str, u32)]) {
    for (name, color) in frames {
        write_png(&dir.join(name), &[*color; 16], 4, 4).unwrap();
    }
}

#[test]
fn frame_number_takes_first_digit_run() {
    assert_eq!(frame_number("frame_0010.png"), 10);
    assert_eq!(frame_number("a12b34.png"), 12);
    assert_eq!(frame_number("cover.png"), 0);
    assert_eq!(frame_number("99999999999999999999999.png"), 0);
}

#[test]
fn frame_extensions_are_case_insensitive() {
    assert!(is_frame_file(Path::new("x/frame_1.PNG")));
    assert!(is_frame_file(Path::new("frame.jpeg")));
    assert!(!is_frame_file(Path::new("frame.gif")));
    assert!(!is_frame_file(Path::new("frame")));
}

#[test]
fn files_sort_numerically_not_lexically() {
    let dir = temp_dir("order");
    write_frames(
        &dir,
        &[
            ("frame_10.png", Color::BLUE),
            ("frame_2.png", Color::GREEN),
            ("frame_1.png", Color::RED),
        ],
    );
    std::fs::write(dir.join("notes.txt"), "ignored").unwrap();

    let names: Vec<String> = list_frame_files(&dir)
        .unwrap()
        .iter()
        .map(|p| p.file_name().unwrap().to_string_lossy().into_owned())
        .collect();
    assert_eq!(names, ["frame_1.png", "frame_2.png", "frame_10.png"]);
    assert!(is_valid_frame_directory(&dir));
    let _ = std::fs::remove_dir_all(&dir);
}

#[test]
fn empty_or_missing_directory_is_a_config_error() {
    let dir = temp_dir("empty");
    assert!(!is_valid_frame_directory(&dir));
    assert!(matches!(
        ImageSequence::open(&dir, true, true),
        Err(TileReelError::Config(_))
    ));
    assert!(matches!(
        ImageSequence::open(dir.join("missing"), true, true),
        Err(TileReelError::Config(_))
    ));
    let _ = std::fs::remove_dir_all(&dir);
}

#[test]
fn looping_wraps_and_non_looping_ends() {
    let dir = temp_dir("wrap");
    write_frames(
        &dir,
        &[
            ("frame_1.png", Color::RED),
            ("frame_2.png", Color::GREEN),
            ("frame_10.png", Color::BLUE),
        ],
    );

    let looping = ImageSequence::open(&dir, false, true).unwrap();
    assert_eq!(looping.frame_count(), 3);
    assert_eq!(looping.resolve(FrameIndex(4)), Some(1));
    let px = looping.get_frame(FrameIndex(5), 4, 4).unwrap().unwrap();
    assert_eq!(px[0], Color::BLUE);

    let once = ImageSequence::open(&dir, false, false).unwrap();
    assert_eq!(once.resolve(FrameIndex(2)), Some(2));
    assert!(once.get_frame(FrameIndex(3), 4, 4).unwrap().is_none());
    let _ = std::fs::remove_dir_all(&dir);
}

#[test]
fn frames_are_scaled_to_the_request() {
    let dir = temp_dir("scale");
    write_frames(&dir, &[("frame_1.png", Color::RED)]);
    let seq = ImageSequence::open(&dir, false, true).unwrap();
    let px = seq.get_frame(FrameIndex(0), 32, 64).unwrap().unwrap();
    assert_eq!(px.len(), 32 * 64);
    assert!(px.iter().all(|&p| p == Color::RED));
    let _ = std::fs::remove_dir_all(&dir);
}

#[test]
fn cache_returns_the_same_buffer() {
    let dir = temp_dir("cache");
    write_frames(&dir, &[("frame_1.png", Color::RED)]);

    let seq = ImageSequence::open(&dir, true, true).unwrap();
    let a = seq.get_frame(FrameIndex(0), 4, 4).unwrap().unwrap();
    let b = seq.get_frame(FrameIndex(1), 4, 4).unwrap().unwrap();
    assert!(Arc::ptr_eq(&a, &b));
    assert_eq!(seq.cached_frames(), 1);

    // First resolution wins.
    let c = seq.get_frame(FrameIndex(0), 8, 8).unwrap().unwrap();
    assert_eq!(c.len(), 16);

    seq.clear_cache();
    assert_eq!(seq.cached_frames(), 0);

    let uncached = ImageSequence::open(&dir, false, true).unwrap();
    uncached.get_frame(FrameIndex(0), 4, 4).unwrap();
    assert_eq!(uncached.cached_frames(), 0);
    let _ = std::fs::remove_dir_all(&dir);
}

#[test]
fn undecodable_frame_is_skipped() {
    let dir = temp_dir("corrupt");
    write_frames(&dir, &[("frame_1.png", Color::RED)]);
    std::fs::write(dir.join("frame_2.png"), b"not a png").unwrap();

    let seq = ImageSequence::open(&dir, true, true).unwrap();
    assert!(seq.get_frame(FrameIndex(1), 4, 4).unwrap().is_none());
    assert!(seq.get_frame(FrameIndex(0), 4, 4).unwrap().is_some());
    let _ = std::fs::remove_dir_all(&dir);
}

#[test]
fn preload_fills_cache_and_keeps_existing_entries() {
    let dir = temp_dir("preload");
    write_frames(
        &dir,
        &[
            ("f1.png", Color::RED),
            ("f2.png", Color::GREEN),
            ("f3.png", Color::BLUE),
        ],
    );

    let seq = ImageSequence::open(&dir, true, true).unwrap();
    let first = seq.get_frame(FrameIndex(0), 4, 4).unwrap().unwrap();
    assert_eq!(seq.preload_all(4, 4), 3);
    let again = seq.get_frame(FrameIndex(0), 4, 4).unwrap().unwrap();
    assert!(Arc::ptr_eq(&first, &again));
    let _ = std::fs::remove_dir_all(&dir);
}
