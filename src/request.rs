//! The conversion request value object.
//!
//! A [`ConversionRequest`] is built once per invocation (by the CLI, the GUI
//! form, or library callers) and handed to [`convert`](crate::convert). It
//! is never mutated by the conversion itself.
//!
//! # Example
//!
//! ```
//! use vid2gif::{Backend, ConversionRequest};
//!
//! let request = ConversionRequest::new("clip.mp4")
//!     .with_resize_percent(40)
//!     .with_fps(12)
//!     .with_trim(Some(1.0), Some(3.5))
//!     .with_backend(Backend::Ffmpeg);
//!
//! assert!(request.validate().is_ok());
//! assert_eq!(request.output_path(), std::path::PathBuf::from("clip.gif"));
//! ```

use std::ffi::OsString;
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::backend::Backend;
use crate::error::Vid2GifError;
use crate::validation;

/// Default resize percentage.
pub const DEFAULT_RESIZE_PERCENT: u32 = 50;
/// Default output frame rate.
pub const DEFAULT_FPS: u32 = 15;

/// Everything needed to convert one video to one GIF.
#[derive(Debug, Clone, PartialEq)]
#[must_use]
pub struct ConversionRequest {
    /// Path to the source video.
    pub source: PathBuf,
    /// Explicit output path. `None` derives `<stem>.gif` next to the source.
    pub output: Option<PathBuf>,
    /// Output size as a percentage of the source size (1..=100).
    pub resize_percent: u32,
    /// Output frames per second.
    pub fps: u32,
    /// Trim start in seconds.
    pub start: Option<f64>,
    /// Trim end in seconds.
    pub end: Option<f64>,
    /// Requested backend. May be replaced by the fallback rule.
    pub backend: Backend,
    /// Loop forever (`true`) or play once.
    pub loop_forever: bool,
}

impl ConversionRequest {
    /// Create a request with default settings for `source`.
    pub fn new<P: AsRef<Path>>(source: P) -> Self {
        Self {
            source: source.as_ref().to_path_buf(),
            output: None,
            resize_percent: DEFAULT_RESIZE_PERCENT,
            fps: DEFAULT_FPS,
            start: None,
            end: None,
            backend: Backend::Imageio,
            loop_forever: true,
        }
    }

    /// Set the output path.
    pub fn with_output<P: AsRef<Path>>(mut self, output: P) -> Self {
        self.output = Some(output.as_ref().to_path_buf());
        self
    }

    /// Set the resize percentage.
    pub fn with_resize_percent(mut self, percent: u32) -> Self {
        self.resize_percent = percent;
        self
    }

    /// Set the output frame rate.
    pub fn with_fps(mut self, fps: u32) -> Self {
        self.fps = fps;
        self
    }

    /// Set the trim start in seconds.
    pub fn with_start(mut self, start: Option<f64>) -> Self {
        self.start = start;
        self
    }

    /// Set the trim end in seconds.
    pub fn with_end(mut self, end: Option<f64>) -> Self {
        self.end = end;
        self
    }

    /// Set both trim bounds.
    pub fn with_trim(self, start: Option<f64>, end: Option<f64>) -> Self {
        self.with_start(start).with_end(end)
    }

    /// Set the backend.
    pub fn with_backend(mut self, backend: Backend) -> Self {
        self.backend = backend;
        self
    }

    /// Loop forever (`true`) or play once (`false`).
    pub fn with_loop(mut self, loop_forever: bool) -> Self {
        self.loop_forever = loop_forever;
        self
    }

    /// Check parameter ranges without touching the filesystem.
    ///
    /// # Errors
    ///
    /// [`Vid2GifError::InvalidResize`], [`Vid2GifError::InvalidFps`],
    /// [`Vid2GifError::InvalidTime`] or [`Vid2GifError::InvalidRange`].
    pub fn validate(&self) -> Result<(), Vid2GifError> {
        validation::validate_resize(self.resize_percent)?;
        validation::validate_fps(self.fps)?;
        validation::validate_times(self.start, self.end, None)?;
        Ok(())
    }

    /// Resize percentage as a scale factor in `(0, 1]`.
    pub fn scale(&self) -> f64 {
        f64::from(self.resize_percent.clamp(1, 100)) / 100.0
    }

    /// Trim window clamped to `duration`, if a duration is known.
    ///
    /// Returns `(start, end)` with the start defaulting to zero and the end
    /// defaulting to the clip duration.
    ///
    /// # Errors
    ///
    /// Returns [`Vid2GifError::InvalidRange`] when clamping empties the
    /// window, e.g. a start past the end of the clip.
    pub fn trim_window(&self, duration: Duration) -> Result<(f64, f64), Vid2GifError> {
        let seconds = duration.as_secs_f64();
        let (start, end) = validation::validate_times(
            self.start,
            self.end,
            (seconds > 0.0).then_some(seconds),
        )?;
        let start = start.unwrap_or(0.0);
        let end = end.unwrap_or(seconds);
        if seconds > 0.0 && end <= start {
            return Err(Vid2GifError::InvalidRange { start, end });
        }
        Ok((start, end))
    }

    /// Resolve the path the GIF will be written to.
    ///
    /// Without an explicit output the source's directory and stem are used.
    /// A `.gif` extension is appended when missing; any other extension is
    /// kept (`clip.mp4` as output becomes `clip.mp4.gif`).
    pub fn output_path(&self) -> PathBuf {
        let path = match &self.output {
            Some(output) => output.clone(),
            None => {
                let stem = self
                    .source
                    .file_stem()
                    .map(|stem| stem.to_os_string())
                    .unwrap_or_else(|| OsString::from("output"));
                let mut name = stem;
                name.push(".gif");
                match self.source.parent() {
                    Some(parent) => parent.join(name),
                    None => PathBuf::from(name),
                }
            }
        };
        ensure_gif_extension(path)
    }
}

/// Append `.gif` unless the path already ends with it (any case).
pub fn ensure_gif_extension(path: PathBuf) -> PathBuf {
    let has_gif = path
        .extension()
        .is_some_and(|extension| extension.eq_ignore_ascii_case("gif"));
    if has_gif {
        path
    } else {
        let mut raw = path.into_os_string();
        raw.push(".gif");
        PathBuf::from(raw)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_the_command_line() {
        let request = ConversionRequest::new("a.mp4");
        assert_eq!(request.resize_percent, 50);
        assert_eq!(request.fps, 15);
        assert_eq!(request.backend, Backend::Imageio);
        assert!(request.loop_forever);
        assert!(request.validate().is_ok());
    }

    #[test]
    fn output_defaults_next_to_source() {
        let request = ConversionRequest::new("videos/holiday.mov");
        assert_eq!(request.output_path(), PathBuf::from("videos/holiday.gif"));
    }

    #[test]
    fn output_gets_gif_extension_appended() {
        let request = ConversionRequest::new("a.mp4").with_output("out/result");
        assert_eq!(request.output_path(), PathBuf::from("out/result.gif"));

        let request = ConversionRequest::new("a.mp4").with_output("out/result.webm");
        assert_eq!(request.output_path(), PathBuf::from("out/result.webm.gif"));

        let request = ConversionRequest::new("a.mp4").with_output("out/RESULT.GIF");
        assert_eq!(request.output_path(), PathBuf::from("out/RESULT.GIF"));
    }

    #[test]
    fn scale_is_a_fraction() {
        let request = ConversionRequest::new("a.mp4").with_resize_percent(25);
        assert!((request.scale() - 0.25).abs() < f64::EPSILON);
    }

    #[test]
    fn validate_rejects_out_of_range_values() {
        assert!(matches!(
            ConversionRequest::new("a.mp4").with_resize_percent(0).validate(),
            Err(Vid2GifError::InvalidResize(0))
        ));
        assert!(matches!(
            ConversionRequest::new("a.mp4").with_resize_percent(150).validate(),
            Err(Vid2GifError::InvalidResize(150))
        ));
        assert!(matches!(
            ConversionRequest::new("a.mp4").with_fps(0).validate(),
            Err(Vid2GifError::InvalidFps(0))
        ));
        assert!(matches!(
            ConversionRequest::new("a.mp4")
                .with_trim(Some(3.0), Some(1.0))
                .validate(),
            Err(Vid2GifError::InvalidRange { .. })
        ));
    }

    #[test]
    fn trim_window_clamps_to_duration() {
        let request = ConversionRequest::new("a.mp4").with_trim(Some(1.0), Some(99.0));
        let (start, end) = request.trim_window(Duration::from_secs(4)).unwrap();
        assert_eq!(start, 1.0);
        assert_eq!(end, 4.0);
    }

    #[test]
    fn trim_window_defaults_to_whole_clip() {
        let request = ConversionRequest::new("a.mp4");
        let (start, end) = request.trim_window(Duration::from_millis(2500)).unwrap();
        assert_eq!(start, 0.0);
        assert_eq!(end, 2.5);
    }

    #[test]
    fn start_past_the_end_is_rejected() {
        let request = ConversionRequest::new("a.mp4").with_start(Some(10.0));
        assert!(matches!(
            request.trim_window(Duration::from_secs(4)),
            Err(Vid2GifError::InvalidRange { .. })
        ));
    }
}
