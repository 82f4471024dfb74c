//! Probed video metadata.
//!
//! [`VideoMetadata`] is produced by [`MediaProbe::probe`](crate::MediaProbe)
//! and drives the size estimate, trim clamping, and the GUI's file info
//! panel.

use std::path::PathBuf;
use std::time::Duration;

/// Metadata for the best video stream of a file.
#[derive(Debug, Clone, PartialEq)]
#[must_use]
pub struct VideoMetadata {
    /// The probed file.
    pub path: PathBuf,
    /// Frame width in pixels.
    pub width: u32,
    /// Frame height in pixels.
    pub height: u32,
    /// Frames per second (may be approximate for variable-frame-rate
    /// content, zero if unknown).
    pub frames_per_second: f64,
    /// Total duration of the clip.
    pub duration: Duration,
    /// Codec name (e.g. `"h264"`, `"vp9"`, `"gif"`).
    pub codec: String,
    /// Size of the file on disk in bytes.
    pub file_size: u64,
}

impl VideoMetadata {
    /// File size in mebibytes, rounded to two decimals for display.
    pub fn size_megabytes(&self) -> f64 {
        let megabytes = self.file_size as f64 / (1024.0 * 1024.0);
        (megabytes * 100.0).round() / 100.0
    }

    /// Duration in seconds, rounded to two decimals for display.
    pub fn duration_seconds(&self) -> f64 {
        (self.duration.as_secs_f64() * 100.0).round() / 100.0
    }

    /// Estimated number of source frames.
    pub fn frame_count(&self) -> u64 {
        if self.frames_per_second > 0.0 {
            (self.duration.as_secs_f64() * self.frames_per_second) as u64
        } else {
            0
        }
    }
}
