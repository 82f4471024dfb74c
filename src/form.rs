//! Desktop form state, independent of any GUI toolkit.
//!
//! [`ConversionForm`] holds the text the user typed and the metadata of the
//! selected clip, and turns them into a [`ConversionRequest`]. The `gui`
//! feature renders it with iced; everything here is plain data so it can be
//! unit-tested without a window.

use std::collections::VecDeque;
use std::ops::RangeInclusive;
use std::path::{Path, PathBuf};

use crate::backend::Backend;
use crate::error::Vid2GifError;
use crate::estimate::SizeEstimate;
use crate::metadata::VideoMetadata;
use crate::request::{ConversionRequest, DEFAULT_FPS, DEFAULT_RESIZE_PERCENT};
use crate::validation::{MAX_GUI_DURATION_SECS, parse_time_field, validate_fps};

/// Range of the resize slider, in percent.
pub const RESIZE_SLIDER_RANGE: RangeInclusive<u32> = 10..=100;

/// Output name used when the field is left empty.
pub const FALLBACK_OUTPUT_NAME: &str = "output.gif";

/// Extensions offered by the file picker.
pub const VIDEO_EXTENSIONS: [&str; 8] = ["mp4", "mov", "avi", "mkv", "webm", "flv", "wmv", "m4v"];

/// Clean up a path delivered by drag and drop.
///
/// Some platforms wrap paths containing spaces in braces or quotes.
pub fn clean_dropped_path(raw: &str) -> PathBuf {
    let trimmed = raw.trim();
    let unwrapped = trimmed
        .strip_prefix('{')
        .and_then(|rest| rest.strip_suffix('}'))
        .or_else(|| {
            trimmed
                .strip_prefix('"')
                .and_then(|rest| rest.strip_suffix('"'))
        })
        .unwrap_or(trimmed);
    PathBuf::from(unwrapped)
}

/// Display strings for the file info panel.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MetadataLabels {
    pub size: String,
    pub resolution: String,
    pub fps: String,
    pub duration: String,
}

impl MetadataLabels {
    /// Placeholders shown before a clip is loaded.
    pub fn empty() -> Self {
        Self {
            size: "Size: -".into(),
            resolution: "Res: -".into(),
            fps: "FPS: -".into(),
            duration: "Dur: -".into(),
        }
    }

    pub fn for_metadata(metadata: &VideoMetadata) -> Self {
        Self {
            size: format!("Size: {} MB", metadata.size_megabytes()),
            resolution: format!("Res: {}x{}", metadata.width, metadata.height),
            fps: format!("FPS: {:.2}", metadata.frames_per_second),
            duration: format!("Dur: {}s", metadata.duration_seconds()),
        }
    }
}

/// Where the form is in its convert cycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum FormPhase {
    #[default]
    Idle,
    /// Waiting for the user to allow overwriting the output.
    ConfirmingOverwrite,
    Converting,
}

/// What the window should do after Convert was pressed.
#[derive(Debug, Clone, PartialEq)]
pub enum ConvertStep {
    /// Run the conversion now.
    Start(ConversionRequest),
    /// The output exists; ask before running.
    ConfirmOverwrite(ConversionRequest),
}

/// Everything the form shows and edits.
#[derive(Debug, Clone)]
pub struct ConversionForm {
    pub video: Option<PathBuf>,
    pub metadata: Option<VideoMetadata>,
    pub output_name: String,
    pub output_dir: Option<PathBuf>,
    pub resize_percent: u32,
    pub fps: String,
    pub start: String,
    pub end: String,
    pub backend: Backend,
    pub loop_forever: bool,
    pub phase: FormPhase,
}

impl Default for ConversionForm {
    fn default() -> Self {
        Self {
            video: None,
            metadata: None,
            output_name: String::new(),
            output_dir: None,
            resize_percent: DEFAULT_RESIZE_PERCENT,
            fps: DEFAULT_FPS.to_string(),
            start: String::new(),
            end: String::new(),
            backend: Backend::Imageio,
            loop_forever: true,
            phase: FormPhase::Idle,
        }
    }
}

impl ConversionForm {
    pub fn new() -> Self {
        Self::default()
    }

    /// Select a video: fills in the output name and directory and forgets
    /// the previous clip's metadata.
    ///
    /// # Errors
    ///
    /// [`Vid2GifError::FileNotFound`] if `path` is not a file; the form is
    /// left unchanged.
    pub fn select_video(&mut self, path: PathBuf) -> Result<(), Vid2GifError> {
        if !path.is_file() {
            return Err(Vid2GifError::FileNotFound(path));
        }
        let stem = path
            .file_stem()
            .map(|stem| stem.to_string_lossy().into_owned())
            .unwrap_or_else(|| "output".into());
        self.output_name = format!("{stem}.gif");
        self.output_dir = path.parent().map(Path::to_path_buf);
        self.metadata = None;
        self.video = Some(path);
        Ok(())
    }

    /// Attach probed metadata, ignoring results for a clip that is no
    /// longer selected.
    pub fn set_metadata(&mut self, metadata: VideoMetadata) -> bool {
        if self.video.as_deref() != Some(metadata.path.as_path()) {
            return false;
        }
        self.metadata = Some(metadata);
        true
    }

    /// Set the slider value, clamped to [`RESIZE_SLIDER_RANGE`].
    pub fn set_resize_percent(&mut self, percent: u32) {
        self.resize_percent =
            percent.clamp(*RESIZE_SLIDER_RANGE.start(), *RESIZE_SLIDER_RANGE.end());
    }

    /// Full output path: directory (or the video's) plus name (or
    /// [`FALLBACK_OUTPUT_NAME`]).
    pub fn output_path(&self) -> PathBuf {
        let name = match self.output_name.trim() {
            "" => FALLBACK_OUTPUT_NAME,
            name => name,
        };
        let directory = self
            .output_dir
            .clone()
            .filter(|dir| !dir.as_os_str().is_empty())
            .or_else(|| {
                self.video
                    .as_deref()
                    .and_then(Path::parent)
                    .map(Path::to_path_buf)
            });
        match directory {
            Some(directory) => directory.join(name),
            None => PathBuf::from(name),
        }
    }

    fn parsed_fps(&self) -> Result<u32, Vid2GifError> {
        let text = self.fps.trim();
        let fps: u32 = text.parse().map_err(|_| {
            Vid2GifError::InvalidTime(format!("FPS must be a positive integer, got {text:?}"))
        })?;
        validate_fps(fps)
    }

    /// `true` when the selected clip is too long for the GUI.
    pub fn exceeds_gui_limit(&self) -> bool {
        self.metadata
            .as_ref()
            .is_some_and(|metadata| metadata.duration.as_secs_f64() > MAX_GUI_DURATION_SECS)
    }

    /// Whether the Convert button should be enabled.
    pub fn can_convert(&self) -> bool {
        self.phase == FormPhase::Idle && self.video.is_some() && !self.exceeds_gui_limit()
    }

    /// Handle a Convert press. Returns `Ok(None)` while another conversion
    /// is pending or running; only one runs at a time.
    ///
    /// # Errors
    ///
    /// Field errors from [`build_request`](Self::build_request); the form
    /// stays idle.
    pub fn begin_conversion(&mut self) -> Result<Option<ConvertStep>, Vid2GifError> {
        if !self.can_convert() {
            return Ok(None);
        }
        let request = self.build_request()?;
        if request.output_path().exists() {
            self.phase = FormPhase::ConfirmingOverwrite;
            Ok(Some(ConvertStep::ConfirmOverwrite(request)))
        } else {
            self.phase = FormPhase::Converting;
            Ok(Some(ConvertStep::Start(request)))
        }
    }

    /// Record the answer to the overwrite question. Returns `true` when the
    /// conversion should start; answers that arrive when no question is
    /// open are ignored.
    pub fn answer_overwrite(&mut self, overwrite: bool) -> bool {
        if self.phase != FormPhase::ConfirmingOverwrite {
            return false;
        }
        self.phase = if overwrite {
            FormPhase::Converting
        } else {
            FormPhase::Idle
        };
        overwrite
    }

    /// A running conversion ended, successfully or not.
    pub fn finish_conversion(&mut self) {
        self.phase = FormPhase::Idle;
    }

    pub fn is_converting(&self) -> bool {
        self.phase == FormPhase::Converting
    }

    /// Build the request for the current field values.
    ///
    /// # Errors
    ///
    /// Field parse errors and range errors, phrased for display.
    pub fn build_request(&self) -> Result<ConversionRequest, Vid2GifError> {
        let video = self
            .video
            .clone()
            .ok_or_else(|| Vid2GifError::FileNotFound(PathBuf::new()))?;
        let fps = self.parsed_fps()?;
        let start = parse_time_field(&self.start)?;
        let end = parse_time_field(&self.end)?;

        let request = ConversionRequest::new(video)
            .with_output(self.output_path())
            .with_resize_percent(self.resize_percent)
            .with_fps(fps)
            .with_trim(start, end)
            .with_backend(self.backend)
            .with_loop(self.loop_forever);
        request.validate()?;
        if let Some(metadata) = &self.metadata {
            request.trim_window(metadata.duration)?;
        }
        Ok(request)
    }

    /// Estimate for the current fields, if they parse and a clip is loaded.
    pub fn estimate(&self) -> Option<SizeEstimate> {
        let metadata = self.metadata.as_ref()?;
        let fps = self.parsed_fps().ok()?;
        let start = parse_time_field(&self.start).ok()?;
        let end = parse_time_field(&self.end).ok()?;
        let request = ConversionRequest::new(&metadata.path)
            .with_resize_percent(self.resize_percent)
            .with_fps(fps)
            .with_trim(start, end);
        Some(SizeEstimate::for_request(metadata, &request))
    }

    /// Text of the estimate label.
    pub fn estimate_label(&self) -> String {
        if self.exceeds_gui_limit() {
            return format!("⚠ Over {MAX_GUI_DURATION_SECS}s: use CLI");
        }
        match self.estimate() {
            Some(estimate) if estimate.exceeds_warning() => {
                format!("Est {:.1}MB ⚠", estimate.megabytes)
            }
            Some(estimate) => format!("Est {:.1}MB", estimate.megabytes),
            None => "Est frames: -".into(),
        }
    }

    pub fn metadata_labels(&self) -> MetadataLabels {
        self.metadata
            .as_ref()
            .map(MetadataLabels::for_metadata)
            .unwrap_or_else(MetadataLabels::empty)
    }
}

/// A bounded log console with `[HH:MM:SS]` prefixes.
#[derive(Debug, Clone)]
pub struct LogConsole {
    lines: VecDeque<LogLine>,
    capacity: usize,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LogLine {
    pub text: String,
    pub is_error: bool,
}

impl LogConsole {
    pub fn new(capacity: usize) -> Self {
        Self {
            lines: VecDeque::with_capacity(capacity.min(1024)),
            capacity: capacity.max(1),
        }
    }

    /// Append `message` stamped with `clock` (already formatted `HH:MM:SS`).
    pub fn push(&mut self, clock: &str, message: &str, is_error: bool) {
        if self.lines.len() == self.capacity {
            self.lines.pop_front();
        }
        self.lines.push_back(LogLine {
            text: format!("[{clock}] {message}"),
            is_error,
        });
    }

    pub fn lines(&self) -> impl Iterator<Item = &LogLine> {
        self.lines.iter()
    }

    pub fn len(&self) -> usize {
        self.lines.len()
    }

    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use super::*;

    fn metadata(path: &Path, seconds: u64) -> VideoMetadata {
        VideoMetadata {
            path: path.to_path_buf(),
            width: 640,
            height: 480,
            frames_per_second: 30.0,
            duration: Duration::from_secs(seconds),
            codec: "h264".into(),
            file_size: 2 * 1024 * 1024,
        }
    }

    fn form_with_clip(seconds: u64) -> (tempfile::TempDir, ConversionForm) {
        let directory = tempfile::tempdir().unwrap();
        let video = directory.path().join("holiday clip.mp4");
        std::fs::write(&video, b"not really a video").unwrap();
        let mut form = ConversionForm::new();
        form.select_video(video.clone()).unwrap();
        assert!(form.set_metadata(metadata(&video, seconds)));
        (directory, form)
    }

    #[test]
    fn dropped_paths_lose_their_wrapping() {
        assert_eq!(
            clean_dropped_path("{/tmp/my clip.mp4}"),
            PathBuf::from("/tmp/my clip.mp4")
        );
        assert_eq!(clean_dropped_path(" \"/a b.mov\" "), PathBuf::from("/a b.mov"));
        assert_eq!(clean_dropped_path("/plain.mp4"), PathBuf::from("/plain.mp4"));
    }

    #[test]
    fn selecting_a_missing_file_changes_nothing() {
        let mut form = ConversionForm::new();
        assert!(form.select_video(PathBuf::from("/no/such/video.mp4")).is_err());
        assert!(form.video.is_none());
        assert!(!form.can_convert());
    }

    #[test]
    fn selecting_a_video_fills_output_fields() {
        let (directory, form) = form_with_clip(5);
        assert_eq!(form.output_name, "holiday clip.gif");
        assert_eq!(form.output_dir.as_deref(), Some(directory.path()));
        assert_eq!(form.output_path(), directory.path().join("holiday clip.gif"));
        assert!(form.can_convert());
    }

    #[test]
    fn empty_output_name_falls_back() {
        let (directory, mut form) = form_with_clip(5);
        form.output_name = "  ".into();
        form.output_dir = None;
        assert_eq!(form.output_path(), directory.path().join("output.gif"));
    }

    #[test]
    fn stale_metadata_is_ignored() {
        let (_directory, mut form) = form_with_clip(5);
        assert!(!form.set_metadata(metadata(Path::new("/elsewhere.mp4"), 3)));
        assert_eq!(form.metadata.as_ref().unwrap().duration, Duration::from_secs(5));
    }

    #[test]
    fn long_clips_must_use_the_cli() {
        let (_directory, form) = form_with_clip(31);
        assert!(form.exceeds_gui_limit());
        assert!(!form.can_convert());
        assert!(form.estimate_label().contains("use CLI"));
    }

    #[test]
    fn estimate_label_tracks_fields() {
        let (_directory, mut form) = form_with_clip(10);
        // 10s * 15fps of 320x240x3.
        assert_eq!(form.estimate_label(), "Est 33.0MB");
        form.set_resize_percent(100);
        assert!(form.estimate_label().ends_with('⚠'));
        form.fps = "fast".into();
        assert_eq!(form.estimate_label(), "Est frames: -");
    }

    #[test]
    fn slider_is_clamped() {
        let mut form = ConversionForm::new();
        form.set_resize_percent(3);
        assert_eq!(form.resize_percent, 10);
        form.set_resize_percent(250);
        assert_eq!(form.resize_percent, 100);
    }

    #[test]
    fn request_reflects_fields() {
        let (directory, mut form) = form_with_clip(10);
        form.fps = " 12 ".into();
        form.start = "1.5".into();
        form.end = "4".into();
        form.backend = Backend::Ffmpeg;
        form.loop_forever = false;
        let request = form.build_request().unwrap();
        assert_eq!(request.fps, 12);
        assert_eq!((request.start, request.end), (Some(1.5), Some(4.0)));
        assert_eq!(request.backend, Backend::Ffmpeg);
        assert!(!request.loop_forever);
        assert_eq!(request.output_path(), directory.path().join("holiday clip.gif"));
    }

    #[test]
    fn bad_fields_become_messages() {
        let (_directory, mut form) = form_with_clip(10);
        form.fps = "0".into();
        assert!(matches!(form.build_request(), Err(Vid2GifError::InvalidFps(0))));
        form.fps = "ten".into();
        assert!(form.build_request().unwrap_err().to_string().contains("FPS"));
        form.fps = "10".into();
        form.start = "5".into();
        form.end = "2".into();
        assert!(matches!(
            form.build_request(),
            Err(Vid2GifError::InvalidRange { .. })
        ));
        form.start = "20".into();
        form.end = String::new();
        assert!(form.build_request().is_err());
    }

    #[test]
    fn only_one_conversion_at_a_time() {
        let (_directory, mut form) = form_with_clip(5);
        let step = form.begin_conversion().unwrap();
        assert!(matches!(step, Some(ConvertStep::Start(_))));
        assert!(form.is_converting());
        assert!(!form.can_convert());
        assert_eq!(form.begin_conversion().unwrap(), None);
        form.finish_conversion();
        assert!(form.can_convert());
    }

    #[test]
    fn overwrite_question_blocks_a_second_convert() {
        let (_directory, mut form) = form_with_clip(5);
        std::fs::write(form.output_path(), b"old gif").unwrap();

        let step = form.begin_conversion().unwrap();
        assert!(matches!(step, Some(ConvertStep::ConfirmOverwrite(_))));
        assert_eq!(form.phase, FormPhase::ConfirmingOverwrite);
        assert!(!form.can_convert());
        assert_eq!(form.begin_conversion().unwrap(), None);

        assert!(form.answer_overwrite(true));
        assert!(form.is_converting());
        // A second answer for the same question must not start another run.
        assert!(!form.answer_overwrite(true));
        assert!(form.is_converting());
    }

    #[test]
    fn declining_overwrite_returns_to_idle() {
        let (_directory, mut form) = form_with_clip(5);
        std::fs::write(form.output_path(), b"old gif").unwrap();
        form.begin_conversion().unwrap();
        assert!(!form.answer_overwrite(false));
        assert_eq!(form.phase, FormPhase::Idle);
        assert!(form.can_convert());
    }

    #[test]
    fn field_errors_leave_the_form_idle() {
        let (_directory, mut form) = form_with_clip(5);
        form.fps = "0".into();
        assert!(form.begin_conversion().is_err());
        assert_eq!(form.phase, FormPhase::Idle);
    }

    #[test]
    fn console_is_bounded_and_stamped() {
        let mut console = LogConsole::new(2);
        console.push("10:00:00", "one", false);
        console.push("10:00:01", "two", false);
        console.push("10:00:02", "three", true);
        let lines: Vec<_> = console.lines().map(|line| line.text.as_str()).collect();
        assert_eq!(lines, vec!["[10:00:01] two", "[10:00:02] three"]);
        assert!(console.lines().last().unwrap().is_error);
    }
}
