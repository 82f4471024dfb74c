//! Lightweight media file probing.
//!
//! [`MediaProbe`] opens a file, reads the metadata of its best video
//! stream, and closes the demuxer again. The GUI probes as soon as a file is
//! selected; [`convert`](crate::convert) probes before every conversion to
//! clamp the trim window and compute the estimate.

use std::path::Path;
use std::time::Duration;

use ffmpeg_next::{codec::context::Context as CodecContext, format::context::Input, media::Type};

use crate::error::Vid2GifError;
use crate::metadata::VideoMetadata;
use crate::utilities::pts_to_seconds;

/// Lightweight media file probe.
///
/// # Example
///
/// ```no_run
/// use vid2gif::MediaProbe;
///
/// let metadata = MediaProbe::probe("input.mp4")?;
/// println!(
///     "{}x{} @ {:.2} fps, {:.2}s",
///     metadata.width, metadata.height, metadata.frames_per_second, metadata.duration_seconds()
/// );
/// # Ok::<(), vid2gif::Vid2GifError>(())
/// ```
pub struct MediaProbe;

impl MediaProbe {
    /// Probe a media file and return the metadata of its best video stream.
    ///
    /// # Errors
    ///
    /// - [`Vid2GifError::FileNotFound`] if the path is not a file.
    /// - [`Vid2GifError::FileOpen`] if FFmpeg cannot open it.
    /// - [`Vid2GifError::NoVideoStream`] if it holds no video.
    pub fn probe<P: AsRef<Path>>(path: P) -> Result<VideoMetadata, Vid2GifError> {
        let path = path.as_ref();
        if !path.is_file() {
            return Err(Vid2GifError::FileNotFound(path.to_path_buf()));
        }
        log::debug!("Probing {}", path.display());

        let input = open_input(path)?;
        let metadata = read_metadata(path, &input)?;

        log::debug!(
            "Probed {}: {}x{} @ {:.3} fps, {:?} [{}]",
            path.display(),
            metadata.width,
            metadata.height,
            metadata.frames_per_second,
            metadata.duration,
            metadata.codec,
        );
        Ok(metadata)
    }
}

/// Open `path` as an FFmpeg input, mapping failures to [`Vid2GifError::FileOpen`].
pub(crate) fn open_input(path: &Path) -> Result<Input, Vid2GifError> {
    crate::ffmpeg::init().map_err(|error| Vid2GifError::FileOpen {
        path: path.to_path_buf(),
        reason: error.to_string(),
    })?;
    ffmpeg_next::format::input(&path).map_err(|error| Vid2GifError::FileOpen {
        path: path.to_path_buf(),
        reason: error.to_string(),
    })
}

fn read_metadata(path: &Path, input: &Input) -> Result<VideoMetadata, Vid2GifError> {
    let stream = input
        .streams()
        .best(Type::Video)
        .ok_or(Vid2GifError::NoVideoStream)?;

    let decoder_context =
        CodecContext::from_parameters(stream.parameters()).map_err(|error| {
            Vid2GifError::FileOpen {
                path: path.to_path_buf(),
                reason: format!("Failed to read video codec parameters: {error}"),
            }
        })?;
    let decoder = decoder_context
        .decoder()
        .video()
        .map_err(|error| Vid2GifError::FileOpen {
            path: path.to_path_buf(),
            reason: format!("Failed to create video decoder: {error}"),
        })?;

    let frame_rate = stream.avg_frame_rate();
    let frames_per_second = if frame_rate.denominator() != 0 && frame_rate.numerator() > 0 {
        f64::from(frame_rate)
    } else {
        let rate = stream.rate();
        if rate.denominator() != 0 && rate.numerator() > 0 {
            f64::from(rate)
        } else {
            0.0
        }
    };

    // Container duration is in AV_TIME_BASE; fall back to the stream's own.
    let container_microseconds = input.duration();
    let duration = if container_microseconds > 0 {
        Duration::from_micros(container_microseconds as u64)
    } else if stream.duration() > 0 {
        Duration::from_secs_f64(pts_to_seconds(stream.duration(), stream.time_base()))
    } else {
        Duration::ZERO
    };

    let codec = decoder
        .codec()
        .map(|codec| codec.name().to_string())
        .unwrap_or_else(|| stream.parameters().id().name().to_string());

    let file_size = std::fs::metadata(path)?.len();

    Ok(VideoMetadata {
        path: path.to_path_buf(),
        width: decoder.width(),
        height: decoder.height(),
        frames_per_second,
        duration,
        codec,
        file_size,
    })
}
