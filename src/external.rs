//! The external `ffmpeg` backend.
//!
//! Runs the `ffmpeg` executable with a two-pass palette filter graph
//! (`palettegen` + `paletteuse`) in a single invocation. Progress is read
//! from `-progress pipe:1` on stdout while a helper thread drains stderr so
//! the child can never block on a full pipe.

use std::collections::VecDeque;
use std::ffi::OsString;
use std::io::{BufRead, BufReader};
use std::path::Path;
use std::process::{Command, Stdio};
use std::thread;

use crate::config::ConvertOptions;
use crate::convert::EncodePlan;
use crate::error::Vid2GifError;
use crate::progress::{ConversionStage, ProgressTracker};

/// Lines of stderr kept for error reports.
const STDERR_TAIL_LINES: usize = 10;

/// Filter graph: resample, scale, then build and apply a per-clip palette.
pub(crate) fn filter_graph(fps: u32, width: u32, height: u32) -> String {
    format!(
        "fps={fps},scale={width}:{height}:flags=lanczos,split[a][b];[a]palettegen[p];[b][p]paletteuse"
    )
}

/// Format seconds the way `ffmpeg` expects for `-ss` and `-t`.
fn seconds_arg(seconds: f64) -> String {
    format!("{seconds:.3}")
}

/// Command-line arguments for converting `plan`.
pub(crate) fn build_ffmpeg_args(plan: &EncodePlan) -> Vec<OsString> {
    let mut args: Vec<OsString> = ["-hide_banner", "-loglevel", "error", "-y"]
        .into_iter()
        .map(OsString::from)
        .collect();

    if plan.start > 0.0 {
        args.push("-ss".into());
        args.push(seconds_arg(plan.start).into());
    }
    if let Some(end) = plan.end {
        args.push("-t".into());
        args.push(seconds_arg(end - plan.start).into());
    }

    args.push("-i".into());
    args.push(plan.source.clone().into_os_string());
    args.push("-vf".into());
    args.push(filter_graph(plan.fps, plan.width, plan.height).into());
    // GIF loop extension: 0 loops forever, -1 omits it (play once).
    args.push("-loop".into());
    args.push(if plan.loop_forever { "0" } else { "-1" }.into());
    args.push("-progress".into());
    args.push("pipe:1".into());
    args.push("-nostats".into());
    args.push(plan.output.clone().into_os_string());
    args
}

/// Parse a `frame=N` line from `-progress` output.
fn parse_progress_frame(line: &str) -> Option<u64> {
    line.trim().strip_prefix("frame=")?.trim().parse().ok()
}

/// Run `program` for `plan`. Returns the last frame count `ffmpeg` reported.
pub(crate) fn encode_with_ffmpeg(
    program: &Path,
    plan: &EncodePlan,
    options: &ConvertOptions,
) -> Result<u64, Vid2GifError> {
    let args = build_ffmpeg_args(plan);
    log::debug!(
        "Running {} {}",
        program.display(),
        args.iter()
            .map(|arg| arg.to_string_lossy())
            .collect::<Vec<_>>()
            .join(" ")
    );

    let mut child = Command::new(program)
        .args(&args)
        .stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .spawn()
        .map_err(|error| Vid2GifError::BackendUnavailable {
            program: program.to_path_buf(),
            reason: error.to_string(),
        })?;

    let stderr_handle = child.stderr.take().map(|stderr| {
        thread::spawn(move || {
            let mut recent: VecDeque<String> = VecDeque::with_capacity(STDERR_TAIL_LINES);
            for line in BufReader::new(stderr).lines().map_while(Result::ok) {
                if recent.len() >= STDERR_TAIL_LINES {
                    recent.pop_front();
                }
                recent.push_back(line);
            }
            recent.into_iter().collect::<Vec<_>>().join("\n")
        })
    });

    let mut tracker = ProgressTracker::new(
        options.progress.clone(),
        ConversionStage::ExternalEncoding,
        plan.expected_frames(),
        options.batch_size,
    );

    let mut cancelled = false;
    if let Some(stdout) = child.stdout.take() {
        for line in BufReader::new(stdout).lines().map_while(Result::ok) {
            if options.is_cancelled() {
                cancelled = true;
                break;
            }
            if let Some(frame) = parse_progress_frame(&line) {
                let timestamp = plan.start + frame as f64 / f64::from(plan.fps.max(1));
                tracker.advance_to(frame, Some(timestamp));
            }
        }
    }

    if cancelled {
        log::debug!("Cancelling ffmpeg (pid {})", child.id());
        if let Err(error) = child.kill() {
            log::debug!("Failed to kill ffmpeg: {error}");
        }
        let _ = child.wait();
        if let Some(handle) = stderr_handle {
            let _ = handle.join();
        }
        return Err(Vid2GifError::Cancelled);
    }

    let status = child.wait()?;
    let stderr = stderr_handle
        .and_then(|handle| handle.join().ok())
        .unwrap_or_default();

    if !status.success() {
        return Err(Vid2GifError::BackendFailed { status, stderr });
    }
    if !stderr.is_empty() {
        log::debug!("ffmpeg stderr:\n{stderr}");
    }

    tracker.finish();
    Ok(tracker.current())
}

#[cfg(test)]
mod tests {
    use std::path::PathBuf;

    use super::*;

    fn plan(start: f64, end: Option<f64>, loop_forever: bool) -> EncodePlan {
        EncodePlan {
            source: PathBuf::from("in put.mp4"),
            output: PathBuf::from("out.gif"),
            start,
            end,
            width: 320,
            height: 180,
            fps: 12,
            loop_forever,
        }
    }

    fn strings(args: &[OsString]) -> Vec<String> {
        args.iter()
            .map(|arg| arg.to_string_lossy().into_owned())
            .collect()
    }

    #[test]
    fn full_clip_arguments() {
        let args = strings(&build_ffmpeg_args(&plan(0.0, None, true)));
        assert_eq!(
            args,
            vec![
                "-hide_banner",
                "-loglevel",
                "error",
                "-y",
                "-i",
                "in put.mp4",
                "-vf",
                "fps=12,scale=320:180:flags=lanczos,split[a][b];[a]palettegen[p];[b][p]paletteuse",
                "-loop",
                "0",
                "-progress",
                "pipe:1",
                "-nostats",
                "out.gif",
            ]
        );
    }

    #[test]
    fn trim_becomes_seek_and_duration() {
        let args = strings(&build_ffmpeg_args(&plan(1.5, Some(4.0), false)));
        let ss = args.iter().position(|arg| arg == "-ss").unwrap();
        assert_eq!(args[ss + 1], "1.500");
        let t = args.iter().position(|arg| arg == "-t").unwrap();
        assert_eq!(args[t + 1], "2.500");
        let input = args.iter().position(|arg| arg == "-i").unwrap();
        assert!(ss < input && t < input);
        let lp = args.iter().position(|arg| arg == "-loop").unwrap();
        assert_eq!(args[lp + 1], "-1");
    }

    #[test]
    fn progress_lines() {
        assert_eq!(parse_progress_frame("frame=42"), Some(42));
        assert_eq!(parse_progress_frame("frame= 7 "), Some(7));
        assert_eq!(parse_progress_frame("fps=10.0"), None);
        assert_eq!(parse_progress_frame("frame=N/A"), None);
    }
}
