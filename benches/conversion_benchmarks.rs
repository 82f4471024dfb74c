//! Benchmarks for probing, encoding, and full conversions.
//!
//! Run with: cargo bench
//!
//! The source clip is the built-in test pattern, written to a temporary
//! directory before each group runs.

use std::path::PathBuf;

use criterion::{BenchmarkId, Criterion};
use image::{Rgba, RgbaImage};
use tempfile::TempDir;
use vid2gif::gif::{GifOptions, GifWriter};
use vid2gif::{ConversionRequest, ConvertOptions, LibraryLogLevel, MediaProbe};

fn fixture() -> (TempDir, PathBuf) {
    let directory = tempfile::tempdir().unwrap();
    let path = vid2gif::generate_test_gif(directory.path().join("pattern.gif")).unwrap();
    (directory, path)
}

fn benchmark_probe(criterion: &mut Criterion) {
    vid2gif::set_library_log_level(LibraryLogLevel::Error);
    let (_directory, source) = fixture();

    criterion.bench_function("probe test pattern", |bencher| {
        bencher.iter(|| MediaProbe::probe(&source).unwrap());
    });
}

fn benchmark_gif_writer(criterion: &mut Criterion) {
    let mut group = criterion.benchmark_group("gif writer");
    for side in [64u32, 256] {
        let frame = RgbaImage::from_fn(side, side, |x, y| {
            Rgba([(x % 256) as u8, (y % 256) as u8, ((x + y) % 256) as u8, 255])
        });
        group.bench_with_input(BenchmarkId::from_parameter(side), &frame, |bencher, frame| {
            bencher.iter(|| {
                let mut writer =
                    GifWriter::new(Vec::new(), side, side, 15, &GifOptions::new()).unwrap();
                for _ in 0..5 {
                    writer.write_frame(frame.clone()).unwrap();
                }
                writer.finish().unwrap()
            });
        });
    }
    group.finish();
}

fn benchmark_conversion(criterion: &mut Criterion) {
    vid2gif::set_library_log_level(LibraryLogLevel::Error);
    let (directory, source) = fixture();
    let output = directory.path().join("bench.gif");

    let mut group = criterion.benchmark_group("imageio conversion");
    for percent in [25u32, 100] {
        let request = ConversionRequest::new(&source)
            .with_output(&output)
            .with_resize_percent(percent)
            .with_fps(10);
        group.bench_with_input(
            BenchmarkId::from_parameter(format!("{percent}%")),
            &request,
            |bencher, request| {
                bencher.iter(|| vid2gif::convert(request, &ConvertOptions::new()).unwrap());
            },
        );
    }
    group.finish();
}

fn benchmark_test_pattern(criterion: &mut Criterion) {
    criterion.bench_function("encode test pattern", |bencher| {
        bencher.iter(|| vid2gif::gif::encode_test_pattern(Vec::new()).unwrap());
    });
}

criterion::criterion_group!(
    benches,
    benchmark_probe,
    benchmark_gif_writer,
    benchmark_conversion,
    benchmark_test_pattern,
);
criterion::criterion_main!(benches);
