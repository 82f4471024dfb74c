//! FFmpeg library setup.
//!
//! The FFmpeg libraries print warnings straight to stderr through their own
//! logging system, separate from the [`log`](https://crates.io/crates/log)
//! records this crate emits. [`set_library_log_level`] tunes that output;
//! [`init`] performs the one-time library initialisation every probe and
//! decode goes through.

use std::str::FromStr;

use ffmpeg_next::util::log::Level;

use crate::error::Vid2GifError;

/// Verbosity of FFmpeg's own console output.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum LibraryLogLevel {
    /// Print nothing.
    Quiet,
    /// Unrecoverable and recoverable errors only. Default for the CLI.
    #[default]
    Error,
    /// Errors and warnings (FFmpeg's own default).
    Warning,
    /// Informational messages.
    Info,
    /// Debugging messages.
    Debug,
    /// Everything.
    Trace,
}

impl LibraryLogLevel {
    fn to_ffmpeg_level(self) -> Level {
        match self {
            LibraryLogLevel::Quiet => Level::Quiet,
            LibraryLogLevel::Error => Level::Error,
            LibraryLogLevel::Warning => Level::Warning,
            LibraryLogLevel::Info => Level::Info,
            LibraryLogLevel::Debug => Level::Debug,
            LibraryLogLevel::Trace => Level::Trace,
        }
    }
}

impl FromStr for LibraryLogLevel {
    type Err = String;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.to_ascii_lowercase().as_str() {
            "quiet" | "off" => Ok(LibraryLogLevel::Quiet),
            "error" => Ok(LibraryLogLevel::Error),
            "warning" | "warn" => Ok(LibraryLogLevel::Warning),
            "info" => Ok(LibraryLogLevel::Info),
            "debug" => Ok(LibraryLogLevel::Debug),
            "trace" => Ok(LibraryLogLevel::Trace),
            other => Err(format!(
                "unsupported log level {other:?} (quiet, error, warning, info, debug, trace)"
            )),
        }
    }
}

/// Set FFmpeg's internal log verbosity.
///
/// This does **not** affect the crate's `log` records.
pub fn set_library_log_level(level: LibraryLogLevel) {
    ffmpeg_next::util::log::set_level(level.to_ffmpeg_level());
}

/// Initialise the FFmpeg libraries. Safe to call repeatedly.
pub(crate) fn init() -> Result<(), Vid2GifError> {
    ffmpeg_next::init()
        .map_err(|error| Vid2GifError::FfmpegError(format!("initialisation failed: {error}")))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn level_names_parse() {
        assert_eq!("QUIET".parse::<LibraryLogLevel>(), Ok(LibraryLogLevel::Quiet));
        assert_eq!("warn".parse::<LibraryLogLevel>(), Ok(LibraryLogLevel::Warning));
        assert!("loud".parse::<LibraryLogLevel>().is_err());
    }
}
