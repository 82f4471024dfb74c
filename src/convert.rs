//! The conversion entry points.
//!
//! [`convert`] runs the whole pipeline for one [`ConversionRequest`]:
//! validate, probe, clamp the trim window, estimate, resolve the backend
//! (with the `ffmpeg` fallback rule), and encode. [`generate_test_gif`]
//! writes the built-in test pattern without touching any video.

use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};

use crate::backend::{self, Backend};
use crate::config::ConvertOptions;
use crate::decode::{self, FrameSampler};
use crate::error::Vid2GifError;
use crate::estimate::SizeEstimate;
use crate::external;
use crate::gif::write_test_pattern;
use crate::metadata::VideoMetadata;
use crate::probe::MediaProbe;
use crate::request::{ConversionRequest, ensure_gif_extension};
use crate::utilities::scaled_dimensions;

/// Fully resolved parameters handed to a backend.
#[derive(Debug, Clone, PartialEq)]
pub(crate) struct EncodePlan {
    pub(crate) source: PathBuf,
    pub(crate) output: PathBuf,
    /// Window start in seconds.
    pub(crate) start: f64,
    /// Window end in seconds; `None` when the clip duration is unknown and
    /// no end was requested.
    pub(crate) end: Option<f64>,
    pub(crate) width: u32,
    pub(crate) height: u32,
    pub(crate) fps: u32,
    pub(crate) loop_forever: bool,
}

impl EncodePlan {
    /// Output frames the window holds, when it has an end.
    pub(crate) fn expected_frames(&self) -> Option<u64> {
        FrameSampler::new(self.start, self.end, self.fps).expected_frames()
    }
}

/// What a finished conversion produced.
#[derive(Debug, Clone)]
pub struct ConversionOutcome {
    /// Where the GIF was written.
    pub output: PathBuf,
    /// The backend that actually ran.
    pub backend: Backend,
    /// `true` when `ffmpeg` was requested but `imageio` ran instead.
    pub fell_back: bool,
    /// Frames written, when the backend reports them.
    pub frames_written: Option<u64>,
    /// Metadata of the source video.
    pub metadata: VideoMetadata,
    /// The pre-conversion estimate.
    pub estimate: SizeEstimate,
    /// Wall-clock time spent.
    pub elapsed: Duration,
}

/// Convert a video to an animated GIF.
///
/// Status lines ("Loading video...", "Writing GIF (FPS: 15)...") go to
/// [`ProgressCallback::on_message`](crate::ProgressCallback::on_message) and
/// the `log` facade; frame progress goes to
/// [`ProgressCallback::on_progress`](crate::ProgressCallback::on_progress).
///
/// The GIF is written to a hidden file next to the output and moved into
/// place once complete, so an existing file at the output path is only
/// replaced by a finished conversion.
///
/// # Errors
///
/// Invalid parameters are rejected before any file is opened. Beyond that:
/// [`Vid2GifError::FileNotFound`], [`Vid2GifError::FileOpen`],
/// [`Vid2GifError::NoVideoStream`], backend failures, and
/// [`Vid2GifError::Cancelled`].
///
/// # Example
///
/// ```no_run
/// use vid2gif::{Backend, ConversionRequest, ConvertOptions};
///
/// let request = ConversionRequest::new("clip.mp4")
///     .with_resize_percent(30)
///     .with_trim(Some(2.0), Some(5.0))
///     .with_backend(Backend::Ffmpeg);
/// let outcome = vid2gif::convert(&request, &ConvertOptions::new())?;
/// println!("wrote {}", outcome.output.display());
/// # Ok::<(), vid2gif::Vid2GifError>(())
/// ```
pub fn convert(
    request: &ConversionRequest,
    options: &ConvertOptions,
) -> Result<ConversionOutcome, Vid2GifError> {
    let started = Instant::now();
    request.validate()?;
    if !request.source.is_file() {
        return Err(Vid2GifError::FileNotFound(request.source.clone()));
    }

    options.message("Loading video...");
    let metadata = MediaProbe::probe(&request.source)?;
    let (start, end) = request.trim_window(metadata.duration)?;
    let (width, height) =
        scaled_dimensions(metadata.width, metadata.height, request.resize_percent);
    let estimate = SizeEstimate::for_request(&metadata, request);
    if estimate.exceeds_warning() {
        log::warn!(
            "Estimated output is {:.1} MB ({} frames at {}x{})",
            estimate.megabytes,
            estimate.frames,
            width,
            height
        );
    }

    let output = request.output_path();
    if output.exists() {
        if same_file(&output, &request.source) {
            return Err(Vid2GifError::OutputIsSource(output));
        }
        log::warn!("Overwriting {}", output.display());
    }

    options.message(&format!("Resizing video ({}%)...", request.resize_percent));
    let resolved = backend::resolve(request.backend, options.ffmpeg_program());
    if resolved.fell_back {
        options.message("[warn] FFmpeg not found. Falling back to imageio.");
    }

    let staging = staging_path(&output);
    let plan = EncodePlan {
        source: request.source.clone(),
        output: staging.clone(),
        start,
        end: (end > start).then_some(end),
        width,
        height,
        fps: request.fps,
        loop_forever: request.loop_forever,
    };
    log::debug!("Encoding with {}: {plan:?}", resolved.backend);

    options.message(&format!("Writing GIF (FPS: {})...", request.fps));
    let result = match (resolved.backend, resolved.program.as_deref()) {
        (Backend::Ffmpeg, Some(program)) => external::encode_with_ffmpeg(program, &plan, options),
        _ => decode::encode_in_process(&plan, options),
    };

    let frames = match result.and_then(|frames| {
        std::fs::rename(&staging, &output)?;
        Ok(frames)
    }) {
        Ok(frames) => frames,
        Err(error) => {
            remove_partial_output(&staging);
            return Err(error);
        }
    };

    options.message(&format!("[ok] GIF saved: {}", output.display()));
    Ok(ConversionOutcome {
        output,
        backend: resolved.backend,
        fell_back: resolved.fell_back,
        frames_written: (frames > 0).then_some(frames),
        metadata,
        estimate,
        elapsed: started.elapsed(),
    })
}

fn same_file(a: &Path, b: &Path) -> bool {
    match (std::fs::canonicalize(a), std::fs::canonicalize(b)) {
        (Ok(a), Ok(b)) => a == b,
        _ => false,
    }
}

/// Sibling of `output` that backends write into. Keeps the `.gif`
/// extension, which `ffmpeg` uses to pick the muxer.
fn staging_path(output: &Path) -> PathBuf {
    let stem = output
        .file_stem()
        .map(|stem| stem.to_string_lossy().into_owned())
        .unwrap_or_else(|| "output".into());
    output.with_file_name(format!(".{stem}.partial.gif"))
}

fn remove_partial_output(output: &Path) {
    if output.exists() {
        if let Err(error) = std::fs::remove_file(output) {
            log::debug!("Could not remove {}: {error}", output.display());
        }
    }
}

/// Write the built-in test GIF (100x100 red, 1 s at 10 fps, looping) to
/// `path`, appending `.gif` if needed. Returns the path written.
///
/// # Example
///
/// ```no_run
/// let path = vid2gif::generate_test_gif("sample")?;
/// assert_eq!(path, std::path::PathBuf::from("sample.gif"));
/// # Ok::<(), vid2gif::Vid2GifError>(())
/// ```
pub fn generate_test_gif<P: AsRef<Path>>(path: P) -> Result<PathBuf, Vid2GifError> {
    let path = ensure_gif_extension(path.as_ref().to_path_buf());
    write_test_pattern(&path)?;
    log::info!("[ok] Test GIF generated: {}", path.display());
    Ok(path)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn invalid_requests_fail_before_touching_the_filesystem() {
        let request = ConversionRequest::new("/no/such/file.mp4").with_resize_percent(0);
        assert!(matches!(
            convert(&request, &ConvertOptions::new()),
            Err(Vid2GifError::InvalidResize(0))
        ));
    }

    #[test]
    fn missing_source_is_reported() {
        let request = ConversionRequest::new("/no/such/file.mp4");
        assert!(matches!(
            convert(&request, &ConvertOptions::new()),
            Err(Vid2GifError::FileNotFound(_))
        ));
    }

    #[test]
    fn output_may_not_replace_the_source() {
        let directory = tempfile::tempdir().unwrap();
        let source = generate_test_gif(directory.path().join("clip.gif")).unwrap();
        let result = convert(&ConversionRequest::new(&source), &ConvertOptions::new());
        assert!(matches!(result, Err(Vid2GifError::OutputIsSource(_))));
        assert!(source.is_file());
    }

    fn plan(start: f64, end: Option<f64>, fps: u32) -> EncodePlan {
        EncodePlan {
            source: PathBuf::from("clip.mp4"),
            output: PathBuf::from("clip.gif"),
            start,
            end,
            width: 10,
            height: 10,
            fps,
            loop_forever: true,
        }
    }

    #[test]
    fn expected_frames_ignore_float_noise() {
        assert_eq!(plan(0.2, Some(0.8), 10).expected_frames(), Some(6));
        assert_eq!(plan(0.0, Some(1.0), 15).expected_frames(), Some(15));
        assert_eq!(plan(0.0, Some(1.05), 10).expected_frames(), Some(11));
        assert_eq!(plan(0.0, None, 10).expected_frames(), None);
    }

    #[test]
    fn staging_file_sits_next_to_the_output() {
        assert_eq!(
            staging_path(Path::new("/tmp/out/clip.gif")),
            PathBuf::from("/tmp/out/.clip.partial.gif")
        );
    }

    #[test]
    fn failed_conversion_keeps_the_existing_output() {
        let directory = tempfile::tempdir().unwrap();
        let source = generate_test_gif(directory.path().join("clip.gif")).unwrap();
        let output = directory.path().join("previous.gif");
        std::fs::write(&output, b"previous gif").unwrap();

        let token = crate::progress::CancellationToken::new();
        token.cancel();
        let request = ConversionRequest::new(&source).with_output(&output);
        let options = ConvertOptions::new().with_cancellation(token);
        assert!(matches!(
            convert(&request, &options),
            Err(Vid2GifError::Cancelled)
        ));
        assert_eq!(std::fs::read(&output).unwrap(), b"previous gif");
        assert!(!staging_path(&output).exists());
    }

    #[test]
    fn test_gif_gets_extension() {
        let directory = tempfile::tempdir().unwrap();
        let path = generate_test_gif(directory.path().join("pattern")).unwrap();
        assert_eq!(path, directory.path().join("pattern.gif"));
        assert!(path.is_file());
    }
}
