//! Input validation and pre-flight reports.
//!
//! The free functions here are the range checks every entry point runs
//! before a backend is invoked. [`ValidationReport`] summarises a probed clip
//! against a request so the GUI and `--estimate` can warn about conversions
//! that are likely to be slow or huge.
//!
//! # Example
//!
//! ```
//! use vid2gif::validation::{parse_time_field, validate_times};
//!
//! let start = parse_time_field("1.5").unwrap();
//! let end = parse_time_field("").unwrap();
//! assert_eq!(validate_times(start, end, Some(10.0)).unwrap(), (Some(1.5), None));
//! ```

use std::fmt::{Display, Formatter, Result as FmtResult};

use crate::error::Vid2GifError;
use crate::estimate::{SizeEstimate, WARN_SIZE_MB};
use crate::metadata::VideoMetadata;

/// Longest clip, in seconds, the GUI will convert. The CLI has no limit.
pub const MAX_GUI_DURATION_SECS: f64 = 30.0;

/// Check that a resize percentage is within `1..=100`.
pub fn validate_resize(percent: u32) -> Result<u32, Vid2GifError> {
    if (1..=100).contains(&percent) {
        Ok(percent)
    } else {
        Err(Vid2GifError::InvalidResize(percent))
    }
}

/// Check that a frame rate is positive.
pub fn validate_fps(fps: u32) -> Result<u32, Vid2GifError> {
    if fps > 0 {
        Ok(fps)
    } else {
        Err(Vid2GifError::InvalidFps(fps))
    }
}

/// Parse an optional time field in seconds.
///
/// Empty or whitespace-only input means "not set".
pub fn parse_time_field(value: &str) -> Result<Option<f64>, Vid2GifError> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Ok(None);
    }
    let seconds: f64 = trimmed.parse().map_err(|_| {
        Vid2GifError::InvalidTime(format!(
            "start/end times must be numbers (seconds), got {trimmed:?}"
        ))
    })?;
    check_time(seconds).map(Some)
}

fn check_time(seconds: f64) -> Result<f64, Vid2GifError> {
    if !seconds.is_finite() {
        return Err(Vid2GifError::InvalidTime(format!(
            "time must be a finite number, got {seconds}"
        )));
    }
    if seconds < 0.0 {
        return Err(Vid2GifError::InvalidTime(format!(
            "time must be >= 0, got {seconds}"
        )));
    }
    Ok(seconds)
}

/// Validate an optional trim window.
///
/// When `duration` is known both ends are clamped to `[0, duration]` first.
/// A window whose end is not after its start is rejected.
pub fn validate_times(
    start: Option<f64>,
    end: Option<f64>,
    duration: Option<f64>,
) -> Result<(Option<f64>, Option<f64>), Vid2GifError> {
    let mut start = start.map(check_time).transpose()?;
    let mut end = end.map(check_time).transpose()?;

    if let Some(duration) = duration {
        start = start.map(|s| s.clamp(0.0, duration));
        end = end.map(|e| e.clamp(0.0, duration));
    }

    if let (Some(s), Some(e)) = (start, end) {
        if e <= s {
            return Err(Vid2GifError::InvalidRange { start: s, end: e });
        }
    }

    Ok((start, end))
}

/// Notices and warnings about a probed clip.
#[derive(Debug, Clone, Default)]
pub struct ValidationReport {
    /// Informational notices (not problems).
    pub info: Vec<String>,
    /// Issues that do not stop a conversion but deserve attention.
    pub warnings: Vec<String>,
}

impl ValidationReport {
    /// Build a report for converting `metadata` with `estimate`.
    ///
    /// `requested` is the trim window as given by the user, before clamping.
    pub fn for_clip(
        metadata: &VideoMetadata,
        estimate: &SizeEstimate,
        requested: (Option<f64>, Option<f64>),
    ) -> Self {
        let mut report = ValidationReport::default();
        let duration = metadata.duration.as_secs_f64();

        report.info.push(format!(
            "Video: {} {}x{} @ {:.2} fps, {:.2}s, {:.2} MB",
            metadata.codec,
            metadata.width,
            metadata.height,
            metadata.frames_per_second,
            duration,
            metadata.size_megabytes(),
        ));
        report.info.push(format!(
            "Output: {}x{}, {} frames, est {:.1} MB",
            estimate.width, estimate.height, estimate.frames, estimate.megabytes,
        ));

        if duration > MAX_GUI_DURATION_SECS {
            report.warnings.push(format!(
                "Video is longer than {MAX_GUI_DURATION_SECS}s; the GUI will refuse it, use the CLI"
            ));
        }

        if estimate.exceeds_warning() {
            report.warnings.push(format!(
                "Estimated size {:.1} MB exceeds {WARN_SIZE_MB} MB",
                estimate.megabytes
            ));
        }

        if metadata.frames_per_second <= 0.0 {
            report
                .warnings
                .push("Source frame rate is unknown; frame timing comes from timestamps".into());
        }

        let (start, end) = requested;
        if duration > 0.0 {
            if start.is_some_and(|s| s > duration) {
                report
                    .warnings
                    .push(format!("Start time clamped to clip duration ({duration:.2}s)"));
            }
            if end.is_some_and(|e| e > duration) {
                report
                    .warnings
                    .push(format!("End time clamped to clip duration ({duration:.2}s)"));
            }
        }

        report
    }

    /// Returns `true` if there is nothing to warn about.
    pub fn is_clean(&self) -> bool {
        self.warnings.is_empty()
    }
}

impl Display for ValidationReport {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        for item in &self.info {
            writeln!(f, "[INFO] {item}")?;
        }
        for item in &self.warnings {
            writeln!(f, "[WARN] {item}")?;
        }
        Ok(())
    }
}
