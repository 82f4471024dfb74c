//! # vid2gif
//!
//! Convert short video clips to animated GIFs, with optional trimming,
//! resizing, and frame-rate control.
//!
//! Two backends produce the GIF. The default `imageio` backend decodes the
//! video in-process through the FFmpeg libraries (via
//! [`ffmpeg-next`](https://crates.io/crates/ffmpeg-next)) and quantises
//! frames with the [`gif`](https://crates.io/crates/gif) crate. The `ffmpeg`
//! backend shells out to the `ffmpeg` executable and its palette filters,
//! falling back to `imageio` when the executable cannot be found.
//!
//! ## Quick Start
//!
//! ### Convert a Clip
//!
//! ```no_run
//! use vid2gif::{ConversionRequest, ConvertOptions};
//!
//! let request = ConversionRequest::new("input.mp4")
//!     .with_resize_percent(50)
//!     .with_fps(15)
//!     .with_trim(Some(1.0), Some(4.0));
//! let outcome = vid2gif::convert(&request, &ConvertOptions::new()).unwrap();
//! println!("{}", outcome.output.display());
//! ```
//!
//! ### Estimate Before Converting
//!
//! ```no_run
//! use vid2gif::{ConversionRequest, MediaProbe, SizeEstimate};
//!
//! let metadata = MediaProbe::probe("input.mp4").unwrap();
//! let request = ConversionRequest::new("input.mp4").with_resize_percent(25);
//! let estimate = SizeEstimate::for_request(&metadata, &request);
//! println!("~{:.1} MB", estimate.megabytes);
//! ```
//!
//! ### Generate the Test Pattern
//!
//! ```no_run
//! vid2gif::generate_test_gif("test_output.gif").unwrap();
//! ```
//!
//! ## Binaries
//!
//! - `vid2gif`: the command-line converter.
//! - `vid2gif-gui`: a single-window desktop form (feature `gui`).
//!
//! ## Requirements
//!
//! FFmpeg development libraries must be installed to build. The `ffmpeg`
//! backend additionally needs the `ffmpeg` executable at run time.

pub mod backend;
pub mod config;
mod convert;
mod decode;
pub mod error;
pub mod estimate;
mod external;
pub mod ffmpeg;
pub mod form;
pub mod gif;
#[cfg(feature = "gui")]
pub mod gui;
pub mod metadata;
pub mod probe;
pub mod progress;
pub mod request;
pub mod utilities;
pub mod validation;

pub use backend::{Backend, ffmpeg_available};
pub use config::ConvertOptions;
pub use convert::{ConversionOutcome, convert, generate_test_gif};
pub use error::Vid2GifError;
pub use estimate::{SizeEstimate, WARN_SIZE_MB, estimate_gif_size};
pub use ffmpeg::{LibraryLogLevel, set_library_log_level};
pub use gif::GifOptions;
pub use metadata::VideoMetadata;
pub use probe::MediaProbe;
pub use progress::{CancellationToken, ConversionStage, ProgressCallback, ProgressInfo};
pub use request::{ConversionRequest, DEFAULT_FPS, DEFAULT_RESIZE_PERCENT};
pub use validation::{MAX_GUI_DURATION_SECS, ValidationReport};
