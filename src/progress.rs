//! Progress reporting and cancellation support.
//!
//! This module provides [`ProgressCallback`] for monitoring a conversion,
//! [`CancellationToken`] for cooperative cancellation, and [`ProgressInfo`]
//! for detailed progress snapshots.
//!
//! # Example
//!
//! ```no_run
//! use std::sync::Arc;
//!
//! use vid2gif::{
//!     ConversionRequest, ConvertOptions, ProgressCallback, ProgressInfo, Vid2GifError,
//! };
//!
//! struct PrintProgress;
//!
//! impl ProgressCallback for PrintProgress {
//!     fn on_progress(&self, info: &ProgressInfo) {
//!         if let Some(pct) = info.percentage {
//!             println!("[{:?}] {pct:.1}% complete", info.stage);
//!         }
//!     }
//!
//!     fn on_message(&self, message: &str) {
//!         println!("{message}");
//!     }
//! }
//!
//! let options = ConvertOptions::new().with_progress(Arc::new(PrintProgress));
//! vid2gif::convert(&ConversionRequest::new("input.mp4"), &options)?;
//! # Ok::<(), Vid2GifError>(())
//! ```

use std::sync::{
    Arc,
    atomic::{AtomicBool, Ordering},
};
use std::time::{Duration, Instant};

/// The phase a conversion is in.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[non_exhaustive]
pub enum ConversionStage {
    /// Decoding, resampling, and encoding frames in-process.
    Encoding,
    /// Waiting on the external `ffmpeg` process.
    ExternalEncoding,
}

/// A snapshot of conversion progress.
///
/// Delivered to [`ProgressCallback::on_progress`] at a cadence controlled
/// by [`ConvertOptions::with_batch_size`](crate::ConvertOptions::with_batch_size).
#[derive(Debug, Clone)]
pub struct ProgressInfo {
    /// What kind of work is being performed.
    pub stage: ConversionStage,
    /// How many output frames have been written so far.
    pub current: u64,
    /// Total output frames expected, if known ahead of time.
    pub total: Option<u64>,
    /// Completion percentage (0.0 - 100.0), if `total` is known.
    pub percentage: Option<f32>,
    /// Wall-clock time elapsed since the stage started.
    pub elapsed: Duration,
    /// Estimated time remaining, based on current throughput.
    pub estimated_remaining: Option<Duration>,
    /// Source timestamp of the latest output frame, in seconds.
    pub current_timestamp: Option<f64>,
}

/// Trait for receiving progress updates during a conversion.
///
/// Implementations must be [`Send`] and [`Sync`] because the GUI runs
/// conversions on a worker thread.
///
/// Callbacks are **infallible**: they observe but cannot halt the
/// operation. Use [`CancellationToken`] for cooperative cancellation.
pub trait ProgressCallback: Send + Sync {
    /// Called at regular intervals while frames are produced.
    fn on_progress(&self, info: &ProgressInfo);

    /// Called with human-readable status lines ("Loading video...").
    fn on_message(&self, _message: &str) {}
}

/// A no-op implementation that discards all progress notifications.
///
/// This is the default when no callback is configured.
pub(crate) struct NoOpProgress;

impl ProgressCallback for NoOpProgress {
    fn on_progress(&self, _info: &ProgressInfo) {}
}

/// Cooperative cancellation token backed by an [`AtomicBool`].
///
/// Clone this token and share it between threads; call
/// [`cancel`](CancellationToken::cancel) from any thread to stop the
/// associated conversion before its next frame.
///
/// # Example
///
/// ```
/// use vid2gif::CancellationToken;
///
/// let token = CancellationToken::new();
/// assert!(!token.is_cancelled());
///
/// token.cancel();
/// assert!(token.is_cancelled());
/// ```
#[derive(Debug, Clone)]
pub struct CancellationToken {
    cancelled: Arc<AtomicBool>,
}

impl CancellationToken {
    /// Create a new, non-cancelled token.
    pub fn new() -> Self {
        Self {
            cancelled: Arc::new(AtomicBool::new(false)),
        }
    }

    /// Request cancellation. All clones observe it.
    pub fn cancel(&self) {
        self.cancelled.store(true, Ordering::Release);
    }

    /// Check whether cancellation has been requested.
    pub fn is_cancelled(&self) -> bool {
        self.cancelled.load(Ordering::Acquire)
    }
}

impl Default for CancellationToken {
    fn default() -> Self {
        Self::new()
    }
}

/// Tracks progress timing and emits callbacks.
pub(crate) struct ProgressTracker {
    callback: Arc<dyn ProgressCallback>,
    stage: ConversionStage,
    total: Option<u64>,
    current: u64,
    batch_size: u64,
    start_time: Instant,
    items_since_last_report: u64,
}

impl ProgressTracker {
    pub(crate) fn new(
        callback: Arc<dyn ProgressCallback>,
        stage: ConversionStage,
        total: Option<u64>,
        batch_size: u64,
    ) -> Self {
        Self {
            callback,
            stage,
            total,
            current: 0,
            batch_size: batch_size.max(1),
            start_time: Instant::now(),
            items_since_last_report: 0,
        }
    }

    /// Record one written frame and fire the callback if the batch
    /// threshold is reached.
    pub(crate) fn advance(&mut self, timestamp: Option<f64>) {
        self.advance_to(self.current + 1, timestamp);
    }

    /// Jump to an absolute frame count (the external backend reports
    /// totals, not increments).
    pub(crate) fn advance_to(&mut self, current: u64, timestamp: Option<f64>) {
        if current <= self.current {
            return;
        }
        self.items_since_last_report += current - self.current;
        self.current = current;

        if self.items_since_last_report >= self.batch_size {
            self.report(timestamp);
            self.items_since_last_report = 0;
        }
    }

    /// Unconditionally emit a final progress report.
    pub(crate) fn finish(&mut self) {
        self.report(None);
    }

    pub(crate) fn current(&self) -> u64 {
        self.current
    }

    fn report(&self, timestamp: Option<f64>) {
        let elapsed = self.start_time.elapsed();

        let percentage = self
            .total
            .filter(|&t| t > 0)
            .map(|t| ((self.current as f32 / t as f32) * 100.0).min(100.0));

        let estimated_remaining = if self.current > 0 {
            self.total.map(|t| {
                let remaining = t.saturating_sub(self.current);
                elapsed.mul_f64(remaining as f64 / self.current as f64)
            })
        } else {
            None
        };

        let info = ProgressInfo {
            stage: self.stage,
            current: self.current,
            total: self.total,
            percentage,
            elapsed,
            estimated_remaining,
            current_timestamp: timestamp,
        };

        self.callback.on_progress(&info);
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Mutex;

    use super::*;

    #[derive(Default)]
    struct Recorder {
        infos: Mutex<Vec<ProgressInfo>>,
    }

    impl ProgressCallback for Recorder {
        fn on_progress(&self, info: &ProgressInfo) {
            self.infos.lock().unwrap().push(info.clone());
        }
    }

    #[test]
    fn tracker_reports_per_batch() {
        let recorder = Arc::new(Recorder::default());
        let mut tracker =
            ProgressTracker::new(recorder.clone(), ConversionStage::Encoding, Some(10), 3);
        for _ in 0..10 {
            tracker.advance(None);
        }
        tracker.finish();

        let infos = recorder.infos.lock().unwrap();
        let currents: Vec<u64> = infos.iter().map(|info| info.current).collect();
        assert_eq!(currents, vec![3, 6, 9, 10]);
        assert_eq!(infos.last().unwrap().percentage, Some(100.0));
    }

    #[test]
    fn absolute_updates_ignore_regressions() {
        let recorder = Arc::new(Recorder::default());
        let mut tracker =
            ProgressTracker::new(recorder.clone(), ConversionStage::ExternalEncoding, None, 1);
        tracker.advance_to(5, None);
        tracker.advance_to(4, None);
        tracker.advance_to(8, Some(0.5));
        assert_eq!(tracker.current(), 8);

        let infos = recorder.infos.lock().unwrap();
        assert_eq!(infos.len(), 2);
        assert!(infos.iter().all(|info| info.percentage.is_none()));
        assert_eq!(infos[1].current_timestamp, Some(0.5));
    }
}
