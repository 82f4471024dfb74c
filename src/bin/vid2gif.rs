use std::{
    path::{Path, PathBuf},
    sync::Arc,
    time::Duration,
};

use clap::{CommandFactory, Parser};
use clap_complete::Shell;
use colored::Colorize;
use indicatif::{ProgressBar, ProgressStyle};
use serde_json::json;
use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};
use vid2gif::{
    Backend, ConversionOutcome, ConversionRequest, ConvertOptions, LibraryLogLevel, MediaProbe,
    ProgressCallback, ProgressInfo, SizeEstimate, ValidationReport, Vid2GifError,
    validation::parse_time_field,
};

const CLI_AFTER_HELP: &str = "Examples:\n  vid2gif clip.mp4\n  vid2gif clip.mp4 -o out.gif --resize 30 --fps 10 --start 2 --end 5\n  vid2gif clip.mp4 --program ffmpeg --no-loop --progress\n  vid2gif clip.mp4 --estimate --json\n  vid2gif --test -o sample.gif\n  vid2gif --completions zsh > _vid2gif";

/// Environment variable holding a `tracing` filter directive.
const LOG_ENV: &str = "VID2GIF_LOG";

/// Default output of `--test`.
const TEST_OUTPUT: &str = "test.gif";

#[derive(Debug, Parser)]
#[command(
    name = "vid2gif",
    version,
    about = "Convert a video clip to an animated GIF",
    after_help = CLI_AFTER_HELP
)]
struct Cli {
    /// Input video file.
    #[arg(required_unless_present_any = ["test", "completions"])]
    video: Option<PathBuf>,

    /// Output GIF path (defaults to the video name with a .gif extension).
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Output size as a percentage of the source (1-100).
    #[arg(long, default_value_t = vid2gif::DEFAULT_RESIZE_PERCENT,
          value_parser = clap::value_parser!(u32).range(1..=100))]
    resize: u32,

    /// Output frames per second.
    #[arg(long, default_value_t = vid2gif::DEFAULT_FPS,
          value_parser = clap::value_parser!(u32).range(1..))]
    fps: u32,

    /// Trim start in seconds.
    #[arg(long, value_parser = parse_seconds)]
    start: Option<f64>,

    /// Trim end in seconds.
    #[arg(long, value_parser = parse_seconds)]
    end: Option<f64>,

    /// Conversion backend (imageio, ffmpeg).
    #[arg(long, default_value = "imageio", value_parser = parse_backend)]
    program: Backend,

    /// Loop the GIF forever (the default; kept for compatibility).
    #[arg(long = "loop", overrides_with = "no_loop")]
    loop_forever: bool,

    /// Play the GIF once instead of looping.
    #[arg(long, overrides_with = "loop_forever")]
    no_loop: bool,

    /// Write a 1-second red test GIF and exit.
    #[arg(long)]
    test: bool,

    /// Print the size estimate without converting.
    #[arg(long)]
    estimate: bool,

    /// Print results as machine-readable JSON.
    #[arg(long)]
    json: bool,

    /// Show a progress bar.
    #[arg(long)]
    progress: bool,

    /// Show debug logging.
    #[arg(long)]
    verbose: bool,

    /// FFmpeg library log level (quiet, error, warning, info, debug, trace).
    #[arg(long)]
    log_level: Option<LibraryLogLevel>,

    /// Path to the ffmpeg executable for --program ffmpeg.
    #[arg(long, value_name = "PATH")]
    ffmpeg_path: Option<PathBuf>,

    /// Print shell completions and exit.
    #[arg(long, value_name = "SHELL")]
    completions: Option<Shell>,
}

fn parse_seconds(value: &str) -> Result<f64, String> {
    match parse_time_field(value) {
        Ok(Some(seconds)) => Ok(seconds),
        Ok(None) => Err("expected a number of seconds".to_string()),
        Err(error) => Err(error.to_string()),
    }
}

fn parse_backend(value: &str) -> Result<Backend, String> {
    value.parse::<Backend>().map_err(|error| error.to_string())
}

fn init_logging(verbose: bool) {
    let default_level = if verbose { "debug" } else { "warn" };
    let filter =
        EnvFilter::try_from_env(LOG_ENV).unwrap_or_else(|_| EnvFilter::new(default_level));
    let stderr_layer = fmt::layer()
        .with_writer(std::io::stderr)
        .with_target(verbose)
        .without_time();

    // A second initialisation (tests) is harmless.
    let _ = tracing_subscriber::registry()
        .with(filter)
        .with(stderr_layer)
        .try_init();
}

/// Prints status lines and drives an optional progress bar.
struct TerminalProgress {
    bar: Option<ProgressBar>,
    quiet: bool,
}

impl TerminalProgress {
    fn new(show_bar: bool, quiet: bool) -> Self {
        let bar = show_bar.then(|| {
            let bar = ProgressBar::new(0);
            bar.set_style(
                ProgressStyle::with_template("{spinner} [{elapsed_precise}] {bar:40} {pos}/{len} frames {msg}")
                    .unwrap_or_else(|_| ProgressStyle::default_bar()),
            );
            bar.enable_steady_tick(Duration::from_millis(120));
            bar
        });
        Self { bar, quiet }
    }

    fn finish(&self) {
        if let Some(bar) = &self.bar {
            bar.finish_and_clear();
        }
    }
}

fn styled_status(message: &str) -> String {
    if let Some(rest) = message.strip_prefix("[ok]") {
        format!("{}{rest}", "[ok]".green().bold())
    } else if let Some(rest) = message.strip_prefix("[warn]") {
        format!("{}{}", "[warn]".yellow().bold(), rest.yellow())
    } else {
        message.to_string()
    }
}

impl ProgressCallback for TerminalProgress {
    fn on_progress(&self, info: &ProgressInfo) {
        if let Some(bar) = &self.bar {
            if let Some(total) = info.total {
                bar.set_length(total);
            }
            bar.set_position(info.current);
            if let Some(timestamp) = info.current_timestamp {
                bar.set_message(format!("@ {timestamp:.2}s"));
            }
        }
    }

    fn on_message(&self, message: &str) {
        if self.quiet {
            return;
        }
        match &self.bar {
            Some(bar) => bar.println(styled_status(message)),
            None => println!("{}", styled_status(message)),
        }
    }
}

fn build_request(cli: &Cli, video: &Path) -> ConversionRequest {
    let mut request = ConversionRequest::new(video)
        .with_resize_percent(cli.resize)
        .with_fps(cli.fps)
        .with_trim(cli.start, cli.end)
        .with_backend(cli.program)
        .with_loop(cli.loop_forever || !cli.no_loop);
    if let Some(output) = &cli.output {
        request = request.with_output(output);
    }
    request
}

fn print_estimate(
    request: &ConversionRequest,
    json_output: bool,
) -> Result<(), Box<dyn std::error::Error>> {
    request.validate()?;
    let metadata = MediaProbe::probe(&request.source)?;
    request.trim_window(metadata.duration)?;
    let estimate = SizeEstimate::for_request(&metadata, request);
    let report = ValidationReport::for_clip(&metadata, &estimate, (request.start, request.end));

    if json_output {
        let payload = json!({
            "video": {
                "path": metadata.path,
                "width": metadata.width,
                "height": metadata.height,
                "fps": metadata.frames_per_second,
                "duration_seconds": metadata.duration.as_secs_f64(),
                "codec": metadata.codec,
                "size_mb": metadata.size_megabytes(),
            },
            "estimate": {
                "width": estimate.width,
                "height": estimate.height,
                "frames": estimate.frames,
                "duration_seconds": estimate.duration,
                "megabytes": estimate.megabytes,
                "exceeds_warning": estimate.exceeds_warning(),
            },
            "warnings": report.warnings,
        });
        println!("{}", serde_json::to_string_pretty(&payload)?);
    } else {
        for line in &report.info {
            println!("{} {line}", "[info]".cyan().bold());
        }
        for line in &report.warnings {
            println!("{} {}", "[warn]".yellow().bold(), line.yellow());
        }
    }
    Ok(())
}

fn print_outcome(outcome: &ConversionOutcome) -> Result<(), Box<dyn std::error::Error>> {
    let payload = json!({
        "output": outcome.output,
        "backend": outcome.backend.name(),
        "fell_back": outcome.fell_back,
        "frames_written": outcome.frames_written,
        "width": outcome.estimate.width,
        "height": outcome.estimate.height,
        "estimated_megabytes": outcome.estimate.megabytes,
        "elapsed_seconds": outcome.elapsed.as_secs_f64(),
    });
    println!("{}", serde_json::to_string_pretty(&payload)?);
    Ok(())
}

fn run() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    if let Some(shell) = cli.completions {
        let mut command = Cli::command();
        clap_complete::generate(shell, &mut command, "vid2gif", &mut std::io::stdout());
        return Ok(());
    }

    if let Some(level) = cli.log_level {
        vid2gif::set_library_log_level(level);
    } else {
        vid2gif::set_library_log_level(LibraryLogLevel::default());
    }

    if cli.test {
        let target = cli.output.clone().unwrap_or_else(|| PathBuf::from(TEST_OUTPUT));
        let path = vid2gif::generate_test_gif(target)?;
        if cli.json {
            println!("{}", serde_json::to_string_pretty(&json!({ "output": path }))?);
        } else {
            println!("{}", styled_status(&format!("[ok] Test GIF generated: {}", path.display())));
        }
        return Ok(());
    }

    let video = cli
        .video
        .as_deref()
        .ok_or("a VIDEO argument is required unless --test is given")?;
    let request = build_request(&cli, video);

    if cli.estimate {
        return print_estimate(&request, cli.json);
    }

    let reporter = Arc::new(TerminalProgress::new(cli.progress && !cli.json, cli.json));
    let mut options = ConvertOptions::new()
        .with_progress(reporter.clone())
        .with_batch_size(1);
    if let Some(program) = &cli.ffmpeg_path {
        options = options.with_ffmpeg_program(program);
    }

    let result = vid2gif::convert(&request, &options);
    reporter.finish();
    let outcome = result?;

    if cli.json {
        print_outcome(&outcome)?;
    }
    Ok(())
}

fn exit_code(error: &(dyn std::error::Error + 'static)) -> i32 {
    match error.downcast_ref::<Vid2GifError>() {
        Some(error) if error.is_invalid_request() => 2,
        _ => 1,
    }
}

fn main() {
    if let Err(error) = run() {
        eprintln!("{} {error}", "error:".red().bold());
        std::process::exit(exit_code(error.as_ref()));
    }
}
