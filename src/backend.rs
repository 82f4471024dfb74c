//! Backend selection and the `ffmpeg` fallback rule.
//!
//! Two backends can produce the output GIF:
//!
//! - [`Backend::Imageio`] decodes the source in-process through the FFmpeg
//!   libraries and quantises frames with the `gif` crate. It needs nothing
//!   beyond the libraries the crate links against.
//! - [`Backend::Ffmpeg`] runs the external `ffmpeg` executable with a
//!   palette-generating filter graph. It usually gives better colours but
//!   requires `ffmpeg` on `PATH`.
//!
//! When `ffmpeg` is requested but cannot be found, conversion falls back to
//! `imageio` with a warning instead of failing.

use std::fmt::{Display, Formatter, Result as FmtResult};
use std::path::{Path, PathBuf};
use std::str::FromStr;

use crate::error::Vid2GifError;

/// Default name of the external executable.
pub const FFMPEG_PROGRAM: &str = "ffmpeg";

/// Which tool encodes the GIF.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Backend {
    /// In-process decoding and encoding.
    #[default]
    Imageio,
    /// The external `ffmpeg` executable.
    Ffmpeg,
}

impl Backend {
    /// All backends, in the order they are offered to users.
    pub const ALL: [Backend; 2] = [Backend::Imageio, Backend::Ffmpeg];

    /// The name used on the command line and in the GUI.
    pub fn name(self) -> &'static str {
        match self {
            Backend::Imageio => "imageio",
            Backend::Ffmpeg => "ffmpeg",
        }
    }
}

impl Display for Backend {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        f.write_str(self.name())
    }
}

impl FromStr for Backend {
    type Err = Vid2GifError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "imageio" => Ok(Backend::Imageio),
            "ffmpeg" => Ok(Backend::Ffmpeg),
            other => Err(Vid2GifError::UnknownBackend(other.to_string())),
        }
    }
}

/// Locate the `ffmpeg` executable.
///
/// A bare program name is looked up on `PATH`; anything containing a path
/// separator must point at an existing file.
pub fn locate_ffmpeg(program: &Path) -> Option<PathBuf> {
    if program.components().count() > 1 {
        return program.is_file().then(|| program.to_path_buf());
    }
    which::which(program).ok()
}

/// Returns `true` if `ffmpeg` is available on `PATH`.
pub fn ffmpeg_available() -> bool {
    locate_ffmpeg(Path::new(FFMPEG_PROGRAM)).is_some()
}

/// Outcome of [`resolve`]: the backend to use and, for `ffmpeg`, the
/// executable to run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedBackend {
    /// Effective backend.
    pub backend: Backend,
    /// Executable for [`Backend::Ffmpeg`].
    pub program: Option<PathBuf>,
    /// `true` when `ffmpeg` was requested but unavailable.
    pub fell_back: bool,
}

/// Apply the fallback rule to the requested backend.
pub fn resolve(requested: Backend, program: &Path) -> ResolvedBackend {
    match requested {
        Backend::Imageio => ResolvedBackend {
            backend: Backend::Imageio,
            program: None,
            fell_back: false,
        },
        Backend::Ffmpeg => match locate_ffmpeg(program) {
            Some(found) => {
                log::debug!("Using ffmpeg executable at {}", found.display());
                ResolvedBackend {
                    backend: Backend::Ffmpeg,
                    program: Some(found),
                    fell_back: false,
                }
            }
            None => {
                log::warn!(
                    "{} not found, falling back to imageio",
                    program.display()
                );
                ResolvedBackend {
                    backend: Backend::Imageio,
                    program: None,
                    fell_back: true,
                }
            }
        },
    }
}
