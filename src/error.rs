//! Error types for the `vid2gif` crate.
//!
//! This module defines [`Vid2GifError`], the unified error type returned by
//! all fallible operations in the crate. Errors carry enough context (paths,
//! offending values, backend output) to be shown to a user verbatim, whether
//! on the console or in a GUI dialog.

use std::{io::Error as IoError, path::PathBuf, process::ExitStatus};

use ffmpeg_next::Error as FfmpegError;
use image::ImageError;
use thiserror::Error;

/// The unified error type for all `vid2gif` operations.
///
/// Every public function that can fail returns `Result<T, Vid2GifError>`.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum Vid2GifError {
    /// The source video does not exist or is not a regular file.
    #[error("Video not found: {0}")]
    FileNotFound(PathBuf),

    /// The media file could not be opened by FFmpeg.
    #[error("Failed to open media file at {path}: {reason}")]
    FileOpen {
        /// Path that was probed or decoded.
        path: PathBuf,
        /// Underlying reason the open failed.
        reason: String,
    },

    /// The file does not contain a video stream.
    #[error("No video stream found in file")]
    NoVideoStream,

    /// The resize percentage is outside `1..=100`.
    #[error("Resize percentage must be between 1 and 100 (got {0})")]
    InvalidResize(u32),

    /// The frame rate is zero.
    #[error("FPS must be a positive integer (got {0})")]
    InvalidFps(u32),

    /// A start or end time could not be parsed or is negative.
    #[error("Invalid time value: {0}")]
    InvalidTime(String),

    /// The trim window is empty or inverted.
    #[error("Invalid range: end time ({end}s) must be greater than start time ({start}s)")]
    InvalidRange {
        /// Start of the trim window, in seconds.
        start: f64,
        /// End of the trim window, in seconds.
        end: f64,
    },

    /// The output path points at the source video.
    #[error("Output {0} would overwrite the source video")]
    OutputIsSource(PathBuf),

    /// A video frame could not be decoded.
    #[error("Failed to decode video frame: {0}")]
    VideoDecodeError(String),

    /// GIF encoding failed.
    #[error("GIF encoding error: {0}")]
    GifEncodeError(String),

    /// The external `ffmpeg` executable could not be started.
    #[error("Failed to run {program}: {reason}")]
    BackendUnavailable {
        /// Program that was spawned.
        program: PathBuf,
        /// Underlying reason the spawn failed.
        reason: String,
    },

    /// The external `ffmpeg` executable exited unsuccessfully.
    #[error("ffmpeg exited with {status}: {stderr}")]
    BackendFailed {
        /// Exit status reported by the process.
        status: ExitStatus,
        /// The last lines the process wrote to stderr.
        stderr: String,
    },

    /// An unknown backend name was given.
    #[error("Unknown backend: {0} (expected imageio or ffmpeg)")]
    UnknownBackend(String),

    /// An error originating from the FFmpeg libraries.
    #[error("FFmpeg error: {0}")]
    FfmpegError(String),

    /// An I/O error occurred while reading or writing files.
    #[error("I/O error: {0}")]
    IoError(#[from] IoError),

    /// An error from the `image` crate while building a frame buffer.
    #[error("Image processing error: {0}")]
    ImageError(#[from] ImageError),

    /// The conversion was cancelled via a
    /// [`CancellationToken`](crate::CancellationToken).
    #[error("Operation cancelled")]
    Cancelled,
}

impl From<FfmpegError> for Vid2GifError {
    fn from(error: FfmpegError) -> Self {
        Vid2GifError::FfmpegError(error.to_string())
    }
}

impl Vid2GifError {
    /// Returns `true` for errors caused by the request itself rather than by
    /// the media or the backend.
    ///
    /// The CLI uses this to decide between a usage-style message and a
    /// conversion failure.
    pub fn is_invalid_request(&self) -> bool {
        matches!(
            self,
            Vid2GifError::InvalidResize(_)
                | Vid2GifError::InvalidFps(_)
                | Vid2GifError::InvalidTime(_)
                | Vid2GifError::InvalidRange { .. }
                | Vid2GifError::UnknownBackend(_)
                | Vid2GifError::OutputIsSource(_)
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn messages_include_offending_values() {
        assert_eq!(
            Vid2GifError::InvalidResize(150).to_string(),
            "Resize percentage must be between 1 and 100 (got 150)"
        );
        assert!(
            Vid2GifError::FileNotFound(PathBuf::from("clip.mp4"))
                .to_string()
                .contains("clip.mp4")
        );
        let range = Vid2GifError::InvalidRange {
            start: 2.0,
            end: 1.5,
        };
        assert!(range.to_string().contains("1.5s"));
    }

    #[test]
    fn request_errors_are_classified() {
        assert!(Vid2GifError::InvalidFps(0).is_invalid_request());
        assert!(!Vid2GifError::NoVideoStream.is_invalid_request());
        assert!(!Vid2GifError::Cancelled.is_invalid_request());
    }
}
