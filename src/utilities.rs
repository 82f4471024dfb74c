//! Internal utility functions.
//!
//! Helpers for pixel-data copying, timestamp conversion, output sizing, and
//! GIF frame timing that are shared by both backends.

use ffmpeg_next::{Rational, frame::Video as VideoFrame};

/// Copy pixel data from an FFmpeg video frame into a tightly-packed buffer.
///
/// `bytes_per_pixel` is the number of bytes per pixel of the frame's packed
/// format (4 for RGBA).
pub fn frame_to_buffer(
    video_frame: &VideoFrame,
    width: u32,
    height: u32,
    bytes_per_pixel: usize,
) -> Vec<u8> {
    let stride = video_frame.stride(0);
    let expected_stride = (width as usize) * bytes_per_pixel;
    let data = video_frame.data(0);

    if stride == expected_stride {
        data[..expected_stride * (height as usize)].to_vec()
    } else {
        let mut buffer = Vec::with_capacity(expected_stride * (height as usize));
        for row in 0..(height as usize) {
            let row_start = row * stride;
            buffer.extend_from_slice(&data[row_start..row_start + expected_stride]);
        }
        buffer
    }
}

/// Rescale a PTS value from stream time base to seconds.
pub fn pts_to_seconds(pts: i64, time_base: Rational) -> f64 {
    pts as f64 * f64::from(time_base.numerator()) / f64::from(time_base.denominator())
}

/// Convert seconds to a seek timestamp in AV_TIME_BASE (microseconds).
///
/// `Input::seek` seeks across all streams, which expects AV_TIME_BASE units
/// rather than any stream's time base.
pub fn seconds_to_seek_timestamp(seconds: f64) -> i64 {
    (seconds.max(0.0) * 1_000_000.0) as i64
}

/// Output dimensions for a resize percentage.
///
/// Each side is rounded and kept at least one pixel.
pub fn scaled_dimensions(width: u32, height: u32, percent: u32) -> (u32, u32) {
    let scale = f64::from(percent.clamp(1, 100)) / 100.0;
    let scaled = |side: u32| ((f64::from(side) * scale).round() as u32).max(1);
    (scaled(width), scaled(height))
}

/// GIF delay, in hundredths of a second, of the frame at `index` in a
/// sequence shown at `fps`.
///
/// GIF delays are integral centiseconds, so a rate like 15 fps cannot be
/// represented exactly per frame. Each delay is the difference of rounded
/// cumulative timestamps, which keeps the total playback time within half a
/// centisecond of `frames / fps`.
pub fn frame_delay_at(index: u64, fps: u32) -> u16 {
    let fps = f64::from(fps.max(1));
    let at = |n: u64| (n as f64 * 100.0 / fps).round() as u64;
    let delay = at(index + 1).saturating_sub(at(index));
    delay.clamp(1, u64::from(u16::MAX)) as u16
}
