//! Output size and frame-count estimates.
//!
//! The estimate is the size of the uncompressed RGB frame buffers the
//! encoder will handle, not the size of the final GIF. Real GIFs are usually
//! much smaller; the number is an upper bound used to warn before
//! converting something enormous.

use crate::metadata::VideoMetadata;
use crate::request::ConversionRequest;
use crate::utilities::scaled_dimensions;

/// Estimates above this many megabytes are flagged.
pub const WARN_SIZE_MB: f64 = 100.0;

/// Rough size of the output in megabytes (uncompressed frame buffers).
///
/// `floor(duration * fps)` frames of `width * height * 3` bytes each.
pub fn estimate_gif_size(duration: f64, width: u32, height: u32, fps: u32) -> f64 {
    let frames = estimated_frames(duration, fps);
    let bytes_per_frame = u64::from(width) * u64::from(height) * 3;
    (frames * bytes_per_frame) as f64 / (1024.0 * 1024.0)
}

fn estimated_frames(duration: f64, fps: u32) -> u64 {
    if duration <= 0.0 {
        return 0;
    }
    (duration * f64::from(fps)) as u64
}

/// Estimate for a specific request against probed metadata.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SizeEstimate {
    /// Number of output frames.
    pub frames: u64,
    /// Output width in pixels.
    pub width: u32,
    /// Output height in pixels.
    pub height: u32,
    /// Seconds of video that will be converted.
    pub duration: f64,
    /// Estimated size in megabytes.
    pub megabytes: f64,
}

impl SizeEstimate {
    /// Build an estimate from already-resolved output parameters.
    pub fn from_parts(duration: f64, width: u32, height: u32, fps: u32) -> Self {
        Self {
            frames: estimated_frames(duration, fps),
            width,
            height,
            duration: duration.max(0.0),
            megabytes: estimate_gif_size(duration, width, height, fps),
        }
    }

    /// Estimate for converting `metadata` with `request`.
    ///
    /// The trim window is clamped to the clip; an invalid window yields a
    /// zero-frame estimate rather than an error so the GUI can keep showing
    /// something while the user types.
    pub fn for_request(metadata: &VideoMetadata, request: &ConversionRequest) -> Self {
        let duration = request
            .trim_window(metadata.duration)
            .map(|(start, end)| end - start)
            .unwrap_or(0.0);
        let (width, height) =
            scaled_dimensions(metadata.width, metadata.height, request.resize_percent);
        Self::from_parts(duration, width, height, request.fps)
    }

    /// Returns `true` when the estimate exceeds [`WARN_SIZE_MB`].
    pub fn exceeds_warning(&self) -> bool {
        self.megabytes > WARN_SIZE_MB
    }
}
