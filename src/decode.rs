//! The in-process (`imageio`) backend.
//!
//! Frames are decoded with the FFmpeg libraries, resampled onto a fixed
//! output clock, scaled to the output size, and streamed into a
//! [`GifWriter`]. Output frame `k` sits at `start + k / fps` and shows the
//! most recent source frame whose timestamp is not after it, so slow sources
//! are repeated and fast sources are thinned without drifting.

use std::io::Write;
use std::mem;

use ffmpeg_next::{
    Rational,
    codec::context::Context as CodecContext,
    format::Pixel,
    frame::Video as VideoFrame,
    media::Type,
    software::scaling::{Context as ScalingContext, Flags as ScalingFlags},
};
use image::RgbaImage;

use crate::config::ConvertOptions;
use crate::convert::EncodePlan;
use crate::error::Vid2GifError;
use crate::gif::{GifOptions, GifWriter};
use crate::probe::open_input;
use crate::progress::{ConversionStage, ProgressTracker};
use crate::utilities::{frame_to_buffer, pts_to_seconds, seconds_to_seek_timestamp};

/// Two timestamps closer than this are the same instant.
const EPSILON: f64 = 1e-9;

/// FFmpeg's "no timestamp" marker (`AV_NOPTS_VALUE`).
const NO_TIMESTAMP: i64 = i64::MIN;

/// The output clock: which output frames a source frame covers.
#[derive(Debug, Clone)]
pub(crate) struct FrameSampler {
    start: f64,
    end: Option<f64>,
    step: f64,
    next: u64,
}

impl FrameSampler {
    pub(crate) fn new(start: f64, end: Option<f64>, fps: u32) -> Self {
        Self {
            start,
            end,
            step: 1.0 / f64::from(fps.max(1)),
            next: 0,
        }
    }

    /// Timestamp of output frame `index`.
    pub(crate) fn time_of(&self, index: u64) -> f64 {
        self.start + index as f64 * self.step
    }

    /// Output frames the window holds, if it has an end.
    pub(crate) fn expected_frames(&self) -> Option<u64> {
        self.end.map(|end| {
            let span = (end - self.start) / self.step;
            (span - EPSILON).ceil().max(0.0) as u64
        })
    }

    /// Claim every output frame before `limit` (and before the window end).
    ///
    /// Returns how many frames were claimed.
    pub(crate) fn take_before(&mut self, limit: f64) -> u64 {
        let limit = match self.end {
            Some(end) => limit.min(end),
            None => limit,
        };
        let first = self.next;
        while self.time_of(self.next) < limit - EPSILON {
            self.next += 1;
        }
        self.next - first
    }

    /// Frames claimed so far.
    pub(crate) fn claimed(&self) -> u64 {
        self.next
    }

    /// `true` once the next output frame is past the window end.
    pub(crate) fn is_finished(&self) -> bool {
        self.end
            .is_some_and(|end| self.time_of(self.next) >= end - EPSILON)
    }

    fn step(&self) -> f64 {
        self.step
    }

    fn end(&self) -> Option<f64> {
        self.end
    }
}

/// Decodes, resamples, and encodes.
struct Pipeline<'a, W: Write> {
    writer: GifWriter<W>,
    sampler: FrameSampler,
    scaler: Option<ScalingContext>,
    pending: VideoFrame,
    pending_time: Option<f64>,
    scaled: VideoFrame,
    width: u32,
    height: u32,
    tracker: ProgressTracker,
    options: &'a ConvertOptions,
}

impl<W: Write> Pipeline<'_, W> {
    /// Take ownership of a decoded frame at `time` seconds.
    ///
    /// Output frames before `time` are filled with the previously pending
    /// frame. Returns `true` once the window is complete.
    fn push(&mut self, decoded: &mut VideoFrame, time: f64) -> Result<bool, Vid2GifError> {
        if self.pending_time.is_some() {
            let count = self.sampler.take_before(time);
            self.emit(count)?;
        }
        mem::swap(&mut self.pending, decoded);
        self.pending_time = Some(time);
        Ok(self.sampler.is_finished())
    }

    /// Fill the rest of the window with the last frame and close the GIF.
    fn finish(mut self) -> Result<u64, Vid2GifError> {
        if let Some(time) = self.pending_time {
            let limit = self.sampler.end().unwrap_or(time + self.sampler.step());
            let count = self.sampler.take_before(limit);
            self.emit(count)?;
        }
        self.tracker.finish();
        self.writer.finish()
    }

    fn emit(&mut self, count: u64) -> Result<(), Vid2GifError> {
        if count == 0 {
            return Ok(());
        }
        let image = self.scale_pending()?;
        let first = self.sampler.claimed() - count;
        for index in first..first + count {
            if self.options.is_cancelled() {
                return Err(Vid2GifError::Cancelled);
            }
            self.writer.write_frame(image.clone())?;
            self.tracker.advance(Some(self.sampler.time_of(index)));
        }
        Ok(())
    }

    fn scale_pending(&mut self) -> Result<RgbaImage, Vid2GifError> {
        let scaler = match &mut self.scaler {
            Some(scaler) => scaler,
            slot => slot.insert(ScalingContext::get(
                self.pending.format(),
                self.pending.width(),
                self.pending.height(),
                Pixel::RGBA,
                self.width,
                self.height,
                ScalingFlags::BILINEAR,
            )?),
        };
        scaler.run(&self.pending, &mut self.scaled)?;

        let buffer = frame_to_buffer(&self.scaled, self.width, self.height, 4);
        RgbaImage::from_raw(self.width, self.height, buffer).ok_or_else(|| {
            Vid2GifError::VideoDecodeError(
                "Failed to construct RGBA image from decoded frame data".to_string(),
            )
        })
    }
}

/// Seconds since the stream start for a decoded frame.
fn frame_time(frame: &VideoFrame, time_base: Rational, start_offset: i64) -> Option<f64> {
    frame
        .timestamp()
        .or_else(|| frame.pts())
        .map(|pts| pts_to_seconds(pts - start_offset, time_base))
}

/// Run the in-process backend for `plan`. Returns the number of frames
/// written.
pub(crate) fn encode_in_process(
    plan: &EncodePlan,
    options: &ConvertOptions,
) -> Result<u64, Vid2GifError> {
    let mut input = open_input(&plan.source)?;

    let (stream_index, time_base, start_offset, frame_interval, mut decoder) = {
        let stream = input
            .streams()
            .best(Type::Video)
            .ok_or(Vid2GifError::NoVideoStream)?;
        let start_offset = match stream.start_time() {
            NO_TIMESTAMP => 0,
            offset => offset,
        };
        let rate = stream.avg_frame_rate();
        let frame_interval = if rate.numerator() > 0 && rate.denominator() > 0 {
            f64::from(rate.invert())
        } else {
            1.0 / f64::from(plan.fps.max(1))
        };
        let decoder_context = CodecContext::from_parameters(stream.parameters())?;
        let decoder = decoder_context.decoder().video()?;
        (
            stream.index(),
            stream.time_base(),
            start_offset,
            frame_interval,
            decoder,
        )
    };

    if plan.start > 0.0 {
        let offset_seconds = pts_to_seconds(start_offset, time_base);
        let target = seconds_to_seek_timestamp(plan.start + offset_seconds);
        if let Err(error) = input.seek(target, ..target) {
            log::debug!("Seek to {:.3}s failed ({error}); decoding from the start", plan.start);
        }
    }

    let sampler = FrameSampler::new(plan.start, plan.end, plan.fps);
    let tracker = ProgressTracker::new(
        options.progress.clone(),
        ConversionStage::Encoding,
        plan.expected_frames(),
        options.batch_size,
    );
    let writer = GifWriter::create(
        &plan.output,
        plan.width,
        plan.height,
        plan.fps,
        &GifOptions::looping(plan.loop_forever),
    )?;

    let mut pipeline = Pipeline {
        writer,
        sampler,
        scaler: None,
        pending: VideoFrame::empty(),
        pending_time: None,
        scaled: VideoFrame::empty(),
        width: plan.width,
        height: plan.height,
        tracker,
        options,
    };

    let mut decoded = VideoFrame::empty();
    let mut last_time: Option<f64> = None;
    let mut next_time = |frame: &VideoFrame| {
        let time = frame_time(frame, time_base, start_offset)
            .or_else(|| last_time.map(|last| last + frame_interval))
            .unwrap_or(0.0);
        last_time = Some(time);
        time
    };

    let mut finished = false;
    'packets: for (stream, packet) in input.packets() {
        if stream.index() != stream_index {
            continue;
        }
        if options.is_cancelled() {
            return Err(Vid2GifError::Cancelled);
        }

        decoder
            .send_packet(&packet)
            .map_err(|error| Vid2GifError::VideoDecodeError(error.to_string()))?;

        while decoder.receive_frame(&mut decoded).is_ok() {
            let time = next_time(&decoded);
            if pipeline.push(&mut decoded, time)? {
                finished = true;
                break 'packets;
            }
        }
    }

    if !finished {
        decoder
            .send_eof()
            .map_err(|error| Vid2GifError::VideoDecodeError(error.to_string()))?;
        while decoder.receive_frame(&mut decoded).is_ok() {
            let time = next_time(&decoded);
            if pipeline.push(&mut decoded, time)? {
                break;
            }
        }
    }

    if options.is_cancelled() {
        return Err(Vid2GifError::Cancelled);
    }
    pipeline.finish()
}
