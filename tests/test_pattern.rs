//! The built-in test GIF.

mod common;

use common::{is_red, read_gif};

#[test]
fn test_gif_is_one_red_second() {
    let directory = tempfile::tempdir().expect("Failed to create temp dir");
    let path = vid2gif::generate_test_gif(directory.path().join("test.gif"))
        .expect("Failed to generate test GIF");

    let gif = read_gif(&path);
    assert_eq!((gif.width, gif.height), (100, 100));
    assert_eq!(gif.frames, 10);
    assert_eq!(gif.total_delay, 100);
    assert_eq!(gif.repeat, gif::Repeat::Infinite);
    assert!(is_red(gif.centre_pixel));
}

#[test]
fn test_gif_is_byte_for_byte_deterministic() {
    let directory = tempfile::tempdir().expect("Failed to create temp dir");
    let first = vid2gif::generate_test_gif(directory.path().join("a")).unwrap();
    let second = vid2gif::generate_test_gif(directory.path().join("b.GIF")).unwrap();

    assert_eq!(first, directory.path().join("a.gif"));
    assert_eq!(second, directory.path().join("b.GIF"));
    assert_eq!(std::fs::read(first).unwrap(), std::fs::read(second).unwrap());
}
