//! Probing and estimate integration tests.

mod common;

use vid2gif::{ConversionRequest, MediaProbe, SizeEstimate, ValidationReport};

use common::pattern_fixture;

#[test]
fn probe_reads_the_test_pattern() {
    let (_directory, source) = pattern_fixture();
    let metadata = MediaProbe::probe(&source).expect("Failed to probe");

    assert_eq!((metadata.width, metadata.height), (100, 100));
    assert_eq!(metadata.codec, "gif");
    assert!(
        (0.9..=1.1).contains(&metadata.duration.as_secs_f64()),
        "duration {:?}",
        metadata.duration
    );
    assert_eq!(metadata.path, source);
    assert!(metadata.file_size > 0);
}

#[test]
fn estimate_for_the_test_pattern() {
    let (_directory, source) = pattern_fixture();
    let metadata = MediaProbe::probe(&source).expect("Failed to probe");
    let request = ConversionRequest::new(&source)
        .with_resize_percent(50)
        .with_fps(10);

    let estimate = SizeEstimate::for_request(&metadata, &request);
    assert_eq!((estimate.width, estimate.height), (50, 50));
    assert!(estimate.frames.abs_diff(10) <= 1);
    assert!(!estimate.exceeds_warning());

    let report = ValidationReport::for_clip(&metadata, &estimate, (None, None));
    assert!(report.is_clean(), "{report}");
    assert!(report.info.iter().any(|line| line.contains("100x100")));
}

#[test]
fn probing_a_directory_is_not_found() {
    let directory = tempfile::tempdir().expect("Failed to create temp dir");
    assert!(matches!(
        MediaProbe::probe(directory.path()),
        Err(vid2gif::Vid2GifError::FileNotFound(_))
    ));
}
