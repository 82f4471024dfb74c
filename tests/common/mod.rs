//! Shared helpers for the integration tests.
//!
//! Fixtures are generated on the fly from the built-in test pattern, so the
//! suite needs no checked-in media.

#![allow(dead_code)]

use std::fs::File;
use std::path::{Path, PathBuf};

use tempfile::TempDir;

/// A temporary directory holding `pattern.gif` (100x100 red, 1 s, 10 fps).
pub fn pattern_fixture() -> (TempDir, PathBuf) {
    let directory = tempfile::tempdir().expect("Failed to create temp dir");
    let path = vid2gif::generate_test_gif(directory.path().join("pattern.gif"))
        .expect("Failed to write test pattern");
    (directory, path)
}

/// Summary of a decoded GIF.
#[derive(Debug)]
pub struct GifSummary {
    pub width: u16,
    pub height: u16,
    pub frames: usize,
    /// Sum of frame delays in hundredths of a second.
    pub total_delay: u32,
    pub repeat: gif::Repeat,
    /// RGBA of the centre pixel of the first frame.
    pub centre_pixel: [u8; 4],
}

impl GifSummary {
    pub fn seconds(&self) -> f64 {
        f64::from(self.total_delay) / 100.0
    }
}

pub fn read_gif(path: &Path) -> GifSummary {
    let file = File::open(path).expect("Failed to open GIF");
    let mut options = gif::DecodeOptions::new();
    options.set_color_output(gif::ColorOutput::RGBA);
    let mut decoder = options.read_info(file).expect("Failed to read GIF header");

    let width = decoder.width();
    let height = decoder.height();
    let mut frames = 0;
    let mut total_delay = 0u32;
    let mut centre_pixel = [0u8; 4];

    while let Some(frame) = decoder.read_next_frame().expect("Failed to decode GIF frame") {
        if frames == 0 {
            let x = usize::from(frame.width / 2);
            let y = usize::from(frame.height / 2);
            let offset = (y * usize::from(frame.width) + x) * 4;
            centre_pixel.copy_from_slice(&frame.buffer[offset..offset + 4]);
        }
        frames += 1;
        total_delay += u32::from(frame.delay);
    }

    GifSummary {
        width,
        height,
        frames,
        total_delay,
        repeat: decoder.repeat(),
        centre_pixel,
    }
}

pub fn is_red(pixel: [u8; 4]) -> bool {
    pixel[0] > 200 && pixel[1] < 60 && pixel[2] < 60
}
