//! In-process GIF encoding.
//!
//! [`GifWriter`] streams RGBA frames into an animated GIF as they are
//! produced by the decoder, so a conversion never holds more than one
//! decoded frame in memory. Colour quantisation is done per frame by the
//! `gif` crate's NeuQuant-based quantiser.
//!
//! [`write_test_pattern`] produces the fixed red-square animation used by
//! `vid2gif --test` and by the test suite.
//!
//! # Example
//!
//! ```no_run
//! use image::{Rgba, RgbaImage};
//! use vid2gif::gif::{GifOptions, GifWriter};
//!
//! let mut writer = GifWriter::create("fade.gif", 64, 64, 10, &GifOptions::new())?;
//! for step in 0..10u8 {
//!     let frame = RgbaImage::from_pixel(64, 64, Rgba([step * 25, 0, 0, 255]));
//!     writer.write_frame(frame)?;
//! }
//! writer.finish()?;
//! # Ok::<(), vid2gif::Vid2GifError>(())
//! ```

use std::borrow::Cow;
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

use gif::{Encoder, Frame, Repeat};
use image::RgbaImage;

use crate::error::Vid2GifError;
use crate::utilities::frame_delay_at;

/// Side length of the test pattern in pixels.
pub const TEST_PATTERN_SIZE: u16 = 100;
/// Number of frames in the test pattern.
pub const TEST_PATTERN_FRAMES: u16 = 10;
/// Frame rate of the test pattern.
pub const TEST_PATTERN_FPS: u32 = 10;

/// Configuration for animated GIF output.
#[derive(Debug, Clone)]
pub struct GifOptions {
    /// How many times the GIF repeats. `None` means loop forever.
    pub repeat: Option<u16>,
    /// Quantiser speed, 1 (best) to 30 (fastest).
    pub speed: i32,
}

impl Default for GifOptions {
    fn default() -> Self {
        Self {
            repeat: None,
            speed: 10,
        }
    }
}

impl GifOptions {
    /// Create a new [`GifOptions`] with default settings.
    pub fn new() -> Self {
        Self::default()
    }

    /// Options for a request's loop flag: forever, or play once.
    pub fn looping(loop_forever: bool) -> Self {
        Self::new().repeat(if loop_forever { None } else { Some(0) })
    }

    /// Set the repeat count. `None` means loop forever, `Some(0)` plays once.
    pub fn repeat(mut self, repeat: Option<u16>) -> Self {
        self.repeat = repeat;
        self
    }

    /// Set the quantiser speed (clamped to `1..=30`).
    pub fn speed(mut self, speed: i32) -> Self {
        self.speed = speed.clamp(1, 30);
        self
    }

    fn gif_repeat(&self) -> Repeat {
        match self.repeat {
            None => Repeat::Infinite,
            Some(n) => Repeat::Finite(n),
        }
    }
}

fn encode_error(context: &str, error: impl std::fmt::Display) -> Vid2GifError {
    Vid2GifError::GifEncodeError(format!("{context}: {error}"))
}

fn dimension(value: u32) -> Result<u16, Vid2GifError> {
    u16::try_from(value).map_err(|_| {
        Vid2GifError::GifEncodeError(format!(
            "frame dimension {value} exceeds the GIF limit of {}",
            u16::MAX
        ))
    })
}

/// Streaming animated GIF writer.
pub struct GifWriter<W: Write> {
    encoder: Encoder<W>,
    width: u16,
    height: u16,
    fps: u32,
    speed: i32,
    frames_written: u64,
}

impl GifWriter<BufWriter<File>> {
    /// Create a GIF file at `path` for frames of `width` x `height` shown at
    /// `fps`.
    pub fn create<P: AsRef<Path>>(
        path: P,
        width: u32,
        height: u32,
        fps: u32,
        options: &GifOptions,
    ) -> Result<Self, Vid2GifError> {
        let file = File::create(path.as_ref())
            .map_err(|e| encode_error("Failed to create GIF file", e))?;
        Self::new(BufWriter::new(file), width, height, fps, options)
    }
}

impl<W: Write> GifWriter<W> {
    /// Wrap any writer.
    pub fn new(
        writer: W,
        width: u32,
        height: u32,
        fps: u32,
        options: &GifOptions,
    ) -> Result<Self, Vid2GifError> {
        let width = dimension(width)?;
        let height = dimension(height)?;
        let mut encoder = Encoder::new(writer, width, height, &[])
            .map_err(|e| encode_error("Failed to create GIF encoder", e))?;
        encoder
            .set_repeat(options.gif_repeat())
            .map_err(|e| encode_error("Failed to set GIF repeat", e))?;

        Ok(Self {
            encoder,
            width,
            height,
            fps,
            speed: options.speed,
            frames_written: 0,
        })
    }

    /// Quantise and append one frame.
    ///
    /// The frame must match the writer's dimensions.
    pub fn write_frame(&mut self, image: RgbaImage) -> Result<(), Vid2GifError> {
        if image.width() != u32::from(self.width) || image.height() != u32::from(self.height) {
            return Err(Vid2GifError::GifEncodeError(format!(
                "frame is {}x{}, expected {}x{}",
                image.width(),
                image.height(),
                self.width,
                self.height
            )));
        }

        let mut pixels = image.into_raw();
        let mut frame = Frame::from_rgba_speed(self.width, self.height, &mut pixels, self.speed);
        frame.delay = frame_delay_at(self.frames_written, self.fps);

        self.encoder
            .write_frame(&frame)
            .map_err(|e| encode_error("Failed to write GIF frame", e))?;
        self.frames_written += 1;
        Ok(())
    }

    /// Number of frames written so far.
    pub fn frames_written(&self) -> u64 {
        self.frames_written
    }

    /// Write the trailer and return the number of frames.
    ///
    /// # Errors
    ///
    /// A GIF without frames is rejected with
    /// [`Vid2GifError::GifEncodeError`].
    pub fn finish(self) -> Result<u64, Vid2GifError> {
        if self.frames_written == 0 {
            return Err(Vid2GifError::GifEncodeError(
                "no frames were produced for the requested time range".to_string(),
            ));
        }
        let mut writer = self
            .encoder
            .into_inner()
            .map_err(|e| encode_error("Failed to finish GIF", e))?;
        writer.flush()?;
        log::debug!("Finished GIF with {} frames", self.frames_written);
        Ok(self.frames_written)
    }
}

/// Encode the test pattern into any writer.
///
/// 100x100 solid red, 10 frames of 100 ms, looping forever. The output is a
/// pure function of these constants: it uses a fixed two-entry palette
/// instead of the quantiser, so the bytes are identical on every machine.
pub fn encode_test_pattern<W: Write>(writer: W) -> Result<W, Vid2GifError> {
    const PALETTE: [u8; 6] = [0xff, 0x00, 0x00, 0x00, 0x00, 0x00];

    let side = TEST_PATTERN_SIZE;
    let mut encoder = Encoder::new(writer, side, side, &PALETTE)
        .map_err(|e| encode_error("Failed to create GIF encoder", e))?;
    encoder
        .set_repeat(Repeat::Infinite)
        .map_err(|e| encode_error("Failed to set GIF repeat", e))?;

    let indices = vec![0u8; usize::from(side) * usize::from(side)];
    for index in 0..TEST_PATTERN_FRAMES {
        let frame = Frame {
            width: side,
            height: side,
            delay: frame_delay_at(u64::from(index), TEST_PATTERN_FPS),
            buffer: Cow::Borrowed(&indices[..]),
            ..Frame::default()
        };
        encoder
            .write_frame(&frame)
            .map_err(|e| encode_error("Failed to write GIF frame", e))?;
    }

    encoder
        .into_inner()
        .map_err(|e| encode_error("Failed to finish GIF", e))
}

/// Write the test pattern to `path`.
pub fn write_test_pattern<P: AsRef<Path>>(path: P) -> Result<(), Vid2GifError> {
    let file = File::create(path.as_ref())
        .map_err(|e| encode_error("Failed to create GIF file", e))?;
    let mut writer = encode_test_pattern(BufWriter::new(file))?;
    writer.flush()?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use image::Rgba;

    use super::*;

    fn decode(bytes: &[u8]) -> (u16, u16, Vec<u16>) {
        let mut options = gif::DecodeOptions::new();
        options.set_color_output(gif::ColorOutput::RGBA);
        let mut decoder = options.read_info(bytes).unwrap();
        let (width, height) = (decoder.width(), decoder.height());
        let mut delays = Vec::new();
        while let Some(frame) = decoder.read_next_frame().unwrap() {
            delays.push(frame.delay);
        }
        (width, height, delays)
    }

    #[test]
    fn writer_streams_frames_with_fps_delays() {
        let mut writer = GifWriter::new(Vec::new(), 8, 4, 15, &GifOptions::new()).unwrap();
        for shade in 0..15u8 {
            let frame = RgbaImage::from_pixel(8, 4, Rgba([shade * 10, 0, 255, 255]));
            writer.write_frame(frame).unwrap();
        }
        assert_eq!(writer.frames_written(), 15);

        let mut bytes = Vec::new();
        {
            let mut writer = GifWriter::new(&mut bytes, 8, 4, 15, &GifOptions::new()).unwrap();
            for _ in 0..15 {
                writer
                    .write_frame(RgbaImage::from_pixel(8, 4, Rgba([0, 0, 0, 255])))
                    .unwrap();
            }
            writer.finish().unwrap();
        }
        let (width, height, delays) = decode(&bytes);
        assert_eq!((width, height), (8, 4));
        assert_eq!(delays.len(), 15);
        assert_eq!(delays.iter().map(|&d| u32::from(d)).sum::<u32>(), 100);
    }

    #[test]
    fn mismatched_frame_is_rejected() {
        let mut writer = GifWriter::new(Vec::new(), 8, 8, 10, &GifOptions::new()).unwrap();
        let result = writer.write_frame(RgbaImage::new(4, 4));
        assert!(matches!(result, Err(Vid2GifError::GifEncodeError(_))));
    }

    #[test]
    fn empty_gif_is_an_error() {
        let writer = GifWriter::new(Vec::new(), 8, 8, 10, &GifOptions::new()).unwrap();
        assert!(writer.finish().is_err());
    }

    #[test]
    fn oversized_frames_are_rejected() {
        assert!(GifWriter::new(Vec::new(), 70_000, 8, 10, &GifOptions::new()).is_err());
    }

    #[test]
    fn test_pattern_is_one_red_second() {
        let bytes = encode_test_pattern(Vec::new()).unwrap();
        let (width, height, delays) = decode(&bytes);
        assert_eq!((width, height), (100, 100));
        assert_eq!(delays, vec![10; 10]);
        assert_eq!(encode_test_pattern(Vec::new()).unwrap(), bytes);
    }
}
