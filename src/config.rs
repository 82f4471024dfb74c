//! Conversion options.
//!
//! [`ConvertOptions`] is a builder that threads progress callbacks,
//! cancellation tokens, and tool locations through [`convert`](crate::convert)
//! without polluting the request itself. The request says *what* to produce;
//! the options say *how* to run.
//!
//! # Example
//!
//! ```no_run
//! use std::sync::Arc;
//!
//! use vid2gif::{CancellationToken, ConvertOptions, ProgressCallback, ProgressInfo};
//!
//! struct LogProgress;
//! impl ProgressCallback for LogProgress {
//!     fn on_progress(&self, info: &ProgressInfo) {
//!         println!("{:?}: {} frames", info.stage, info.current);
//!     }
//! }
//!
//! let token = CancellationToken::new();
//! let options = ConvertOptions::new()
//!     .with_progress(Arc::new(LogProgress))
//!     .with_cancellation(token.clone())
//!     .with_batch_size(5);
//! ```

use std::fmt::{Debug, Formatter, Result as FmtResult};
use std::path::{Path, PathBuf};
use std::sync::Arc;

use crate::backend::FFMPEG_PROGRAM;
use crate::progress::{CancellationToken, NoOpProgress, ProgressCallback};

/// Runtime options for a conversion.
#[derive(Clone)]
pub struct ConvertOptions {
    pub(crate) progress: Arc<dyn ProgressCallback>,
    pub(crate) cancellation: Option<CancellationToken>,
    pub(crate) batch_size: u64,
    pub(crate) ffmpeg_program: PathBuf,
}

impl Debug for ConvertOptions {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        f.debug_struct("ConvertOptions")
            .field("has_cancellation", &self.cancellation.is_some())
            .field("batch_size", &self.batch_size)
            .field("ffmpeg_program", &self.ffmpeg_program)
            .finish_non_exhaustive()
    }
}

impl Default for ConvertOptions {
    fn default() -> Self {
        Self::new()
    }
}

impl ConvertOptions {
    /// Defaults: no progress callback, no cancellation, batch size 1,
    /// `ffmpeg` looked up on `PATH`.
    pub fn new() -> Self {
        Self {
            progress: Arc::new(NoOpProgress),
            cancellation: None,
            batch_size: 1,
            ffmpeg_program: PathBuf::from(FFMPEG_PROGRAM),
        }
    }

    /// Attach a progress callback.
    #[must_use]
    pub fn with_progress(mut self, callback: Arc<dyn ProgressCallback>) -> Self {
        self.progress = callback;
        self
    }

    /// Attach a cancellation token.
    ///
    /// When the token is cancelled the conversion stops before its next
    /// frame and returns [`Vid2GifError::Cancelled`](crate::Vid2GifError::Cancelled).
    #[must_use]
    pub fn with_cancellation(mut self, token: CancellationToken) -> Self {
        self.cancellation = Some(token);
        self
    }

    /// Fire the progress callback every `size` frames (minimum 1).
    #[must_use]
    pub fn with_batch_size(mut self, size: u64) -> Self {
        self.batch_size = size.max(1);
        self
    }

    /// Use a specific `ffmpeg` executable for the external backend.
    #[must_use]
    pub fn with_ffmpeg_program<P: AsRef<Path>>(mut self, program: P) -> Self {
        self.ffmpeg_program = program.as_ref().to_path_buf();
        self
    }

    /// The configured `ffmpeg` executable.
    pub fn ffmpeg_program(&self) -> &Path {
        &self.ffmpeg_program
    }

    pub(crate) fn is_cancelled(&self) -> bool {
        self.cancellation
            .as_ref()
            .is_some_and(|token| token.is_cancelled())
    }

    pub(crate) fn message(&self, message: &str) {
        log::info!("{message}");
        self.progress.on_message(message);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn batch_size_is_clamped() {
        assert_eq!(ConvertOptions::new().with_batch_size(0).batch_size, 1);
    }

    #[test]
    fn cancellation_is_observed() {
        let token = CancellationToken::new();
        let options = ConvertOptions::new().with_cancellation(token.clone());
        assert!(!options.is_cancelled());
        token.cancel();
        assert!(options.is_cancelled());
    }

    #[test]
    fn default_program_is_ffmpeg() {
        assert_eq!(ConvertOptions::default().ffmpeg_program(), Path::new("ffmpeg"));
    }
}
