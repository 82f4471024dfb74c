//! The desktop form (feature `gui`).
//!
//! A single iced window around [`ConversionForm`]: pick or drop a video,
//! adjust the settings, and convert. Probing and conversion run on Tokio's
//! blocking pool; the window polls their shared progress on a timer while a
//! conversion is in flight.

use std::path::PathBuf;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use iced::widget::{
    button, checkbox, column, container, pick_list, progress_bar, row, scrollable, slider, text,
    text_input,
};
use iced::{Element, Length, Subscription, Task, event, window};

use crate::backend::{Backend, ffmpeg_available};
use crate::config::ConvertOptions;
use crate::convert::convert;
use crate::form::{
    ConversionForm, ConvertStep, LogConsole, RESIZE_SLIDER_RANGE, VIDEO_EXTENSIONS,
    clean_dropped_path,
};
use crate::metadata::VideoMetadata;
use crate::probe::MediaProbe;
use crate::progress::{ProgressCallback, ProgressInfo};
use crate::request::ConversionRequest;

const WINDOW_WIDTH: f32 = 560.0;
const WINDOW_HEIGHT: f32 = 780.0;
const CONSOLE_LINES: usize = 500;
const POLL_INTERVAL: Duration = Duration::from_millis(100);

/// Launch the window. Blocks until it is closed.
pub fn run() -> iced::Result {
    iced::application(App::boot, App::update, App::view)
        .title(App::title)
        .window_size((WINDOW_WIDTH, WINDOW_HEIGHT))
        .subscription(App::subscription)
        .run()
}

#[derive(Debug, Default)]
struct ProgressState {
    percent: f32,
    messages: Vec<String>,
}

/// Progress shared between the conversion worker and the window.
#[derive(Debug, Default)]
struct SharedProgress {
    state: Mutex<ProgressState>,
}

impl SharedProgress {
    fn reset(&self) {
        if let Ok(mut state) = self.state.lock() {
            *state = ProgressState::default();
        }
    }

    fn drain(&self) -> (f32, Vec<String>) {
        match self.state.lock() {
            Ok(mut state) => (state.percent, std::mem::take(&mut state.messages)),
            Err(_) => (0.0, Vec::new()),
        }
    }
}

impl ProgressCallback for SharedProgress {
    fn on_progress(&self, info: &ProgressInfo) {
        if let (Some(percent), Ok(mut state)) = (info.percentage, self.state.lock()) {
            state.percent = percent;
        }
    }

    fn on_message(&self, message: &str) {
        if let Ok(mut state) = self.state.lock() {
            state.messages.push(message.to_string());
        }
    }
}

#[derive(Debug, Clone)]
enum Message {
    SelectVideo,
    VideoPicked(Option<PathBuf>),
    FileDropped(PathBuf),
    MetadataLoaded(Result<VideoMetadata, String>),
    ChooseOutputDir,
    OutputDirPicked(Option<PathBuf>),
    OutputNameChanged(String),
    OutputDirChanged(String),
    ResizeChanged(u32),
    FpsChanged(String),
    StartChanged(String),
    EndChanged(String),
    BackendSelected(Backend),
    LoopToggled(bool),
    Convert,
    OverwriteAnswered(ConversionRequest, bool),
    ConversionFinished(Result<PathBuf, String>),
    DialogClosed,
    Tick,
}

struct App {
    form: ConversionForm,
    console: LogConsole,
    status: String,
    progress: f32,
    shared: Arc<SharedProgress>,
}

fn clock() -> String {
    chrono::Local::now().format("%H:%M:%S").to_string()
}

fn show_dialog(level: rfd::MessageLevel, title: &str, description: String) -> Task<Message> {
    let dialog = rfd::AsyncMessageDialog::new()
        .set_level(level)
        .set_title(title)
        .set_description(description)
        .set_buttons(rfd::MessageButtons::Ok);
    Task::perform(dialog.show(), |_| Message::DialogClosed)
}

impl App {
    fn new() -> Self {
        App {
            form: ConversionForm::new(),
            console: LogConsole::new(CONSOLE_LINES),
            status: String::new(),
            progress: 0.0,
            shared: Arc::new(SharedProgress::default()),
        }
    }

    fn boot() -> (Self, Task<Message>) {
        let mut app = App::new();

        let task = if ffmpeg_available() {
            Task::none()
        } else {
            app.log("FFmpeg not found on PATH; only the imageio program is available", false);
            show_dialog(
                rfd::MessageLevel::Warning,
                "FFmpeg Missing",
                "FFmpeg not found on PATH. You can still use the 'imageio' program, \
                 but the 'ffmpeg' option will fall back to it."
                    .to_string(),
            )
        };
        (app, task)
    }

    fn title(&self) -> String {
        match &self.form.video {
            Some(video) => format!(
                "vid2gif - {}",
                video.file_name().unwrap_or_default().to_string_lossy()
            ),
            None => "vid2gif".to_string(),
        }
    }

    fn log(&mut self, message: &str, is_error: bool) {
        if is_error {
            log::error!("{message}");
        } else {
            log::info!("{message}");
        }
        self.console.push(&clock(), message, is_error);
    }

    fn set_file(&mut self, path: PathBuf) -> Task<Message> {
        match self.form.select_video(path.clone()) {
            Ok(()) => {
                self.log(&format!("Selected file: {}", path.display()), false);
                self.status = "Reading metadata...".into();
                self.progress = 0.0;
                Task::perform(
                    async move {
                        tokio::task::spawn_blocking(move || MediaProbe::probe(&path))
                            .await
                            .map_err(|error| error.to_string())
                            .and_then(|result| result.map_err(|error| error.to_string()))
                    },
                    Message::MetadataLoaded,
                )
            }
            Err(_) => {
                self.log(&format!("Invalid file dropped: {}", path.display()), true);
                Task::none()
            }
        }
    }

    fn start_conversion(&mut self, request: ConversionRequest) -> Task<Message> {
        self.progress = 0.0;
        self.status = "Converting...".into();
        self.shared.reset();
        self.log("Starting conversion...", false);

        let options = ConvertOptions::new().with_progress(self.shared.clone());
        Task::perform(
            async move {
                tokio::task::spawn_blocking(move || convert(&request, &options))
                    .await
                    .map_err(|error| error.to_string())
                    .and_then(|result| {
                        result
                            .map(|outcome| outcome.output)
                            .map_err(|error| error.to_string())
                    })
            },
            Message::ConversionFinished,
        )
    }

    fn drain_progress(&mut self) {
        let (percent, messages) = self.shared.drain();
        self.progress = percent;
        for message in messages {
            self.console.push(&clock(), &message, false);
        }
    }

    fn update(&mut self, message: Message) -> Task<Message> {
        match message {
            Message::SelectVideo => Task::perform(
                async {
                    rfd::AsyncFileDialog::new()
                        .add_filter("Video files", &VIDEO_EXTENSIONS[..])
                        .add_filter("All files", &["*"][..])
                        .pick_file()
                        .await
                        .map(|handle| handle.path().to_path_buf())
                },
                Message::VideoPicked,
            ),
            Message::VideoPicked(Some(path)) => self.set_file(path),
            Message::VideoPicked(None) => Task::none(),
            Message::FileDropped(path) => {
                let path = clean_dropped_path(&path.to_string_lossy());
                self.set_file(path)
            }
            Message::MetadataLoaded(Ok(metadata)) => {
                let duration = metadata.duration_seconds();
                if self.form.set_metadata(metadata) {
                    if self.form.exceeds_gui_limit() {
                        self.status = "Video exceeds the GUI limit; use the CLI for large files".into();
                        self.log(
                            &format!(
                                "Video duration {duration}s exceeds GUI limit of {}s. Use CLI for better performance.",
                                crate::validation::MAX_GUI_DURATION_SECS
                            ),
                            false,
                        );
                    } else {
                        self.status = "Metadata loaded".into();
                        self.log("Metadata loaded", false);
                    }
                }
                Task::none()
            }
            Message::MetadataLoaded(Err(error)) => {
                self.status = "Metadata error".into();
                self.log(&format!("Failed to read metadata: {error}"), true);
                Task::none()
            }
            Message::ChooseOutputDir => Task::perform(
                async {
                    rfd::AsyncFileDialog::new()
                        .pick_folder()
                        .await
                        .map(|handle| handle.path().to_path_buf())
                },
                Message::OutputDirPicked,
            ),
            Message::OutputDirPicked(Some(directory)) => {
                self.form.output_dir = Some(directory);
                Task::none()
            }
            Message::OutputDirPicked(None) | Message::DialogClosed => Task::none(),
            Message::OutputNameChanged(name) => {
                self.form.output_name = name;
                Task::none()
            }
            Message::OutputDirChanged(directory) => {
                self.form.output_dir = Some(PathBuf::from(directory));
                Task::none()
            }
            Message::ResizeChanged(percent) => {
                self.form.set_resize_percent(percent);
                Task::none()
            }
            Message::FpsChanged(fps) => {
                self.form.fps = fps;
                Task::none()
            }
            Message::StartChanged(start) => {
                self.form.start = start;
                Task::none()
            }
            Message::EndChanged(end) => {
                self.form.end = end;
                Task::none()
            }
            Message::BackendSelected(backend) => {
                self.form.backend = backend;
                Task::none()
            }
            Message::LoopToggled(loop_forever) => {
                self.form.loop_forever = loop_forever;
                Task::none()
            }
            Message::Convert => match self.form.begin_conversion() {
                Ok(None) => Task::none(),
                Ok(Some(ConvertStep::Start(request))) => self.start_conversion(request),
                Ok(Some(ConvertStep::ConfirmOverwrite(request))) => {
                    let output = request.output_path();
                    let dialog = rfd::AsyncMessageDialog::new()
                        .set_level(rfd::MessageLevel::Warning)
                        .set_title("Overwrite?")
                        .set_description(format!("{} exists. Overwrite?", output.display()))
                        .set_buttons(rfd::MessageButtons::YesNo);
                    Task::perform(dialog.show(), move |answer| {
                        Message::OverwriteAnswered(
                            request,
                            matches!(answer, rfd::MessageDialogResult::Yes),
                        )
                    })
                }
                Err(error) => {
                    self.status = "Error".into();
                    self.log(&format!("ERROR: {error}"), true);
                    show_dialog(rfd::MessageLevel::Error, "Error", error.to_string())
                }
            },
            Message::OverwriteAnswered(request, overwrite) => {
                if self.form.answer_overwrite(overwrite) {
                    self.start_conversion(request)
                } else {
                    Task::none()
                }
            }
            Message::Tick => {
                self.drain_progress();
                Task::none()
            }
            Message::ConversionFinished(result) => {
                self.drain_progress();
                self.form.finish_conversion();
                match result {
                    Ok(output) => {
                        self.progress = 100.0;
                        self.status = "Conversion Complete!".into();
                        self.log(&format!("SUCCESS: GIF saved at {}", output.display()), false);
                        show_dialog(
                            rfd::MessageLevel::Info,
                            "Success",
                            format!("GIF created successfully!\n\n{}", output.display()),
                        )
                    }
                    Err(error) => {
                        self.status = "Error".into();
                        self.log(&format!("ERROR: {error}"), true);
                        show_dialog(rfd::MessageLevel::Error, "Error", error)
                    }
                }
            }
        }
    }

    fn subscription(&self) -> Subscription<Message> {
        let drops = event::listen_with(|event, _status, _window| match event {
            event::Event::Window(window::Event::FileDropped(path)) => {
                Some(Message::FileDropped(path))
            }
            _ => None,
        });

        if self.form.is_converting() {
            Subscription::batch([
                drops,
                iced::time::every(POLL_INTERVAL).map(|_| Message::Tick),
            ])
        } else {
            drops
        }
    }

    fn view(&self) -> Element<'_, Message> {
        let file_label = match &self.form.video {
            Some(video) => text(video.file_name().unwrap_or_default().to_string_lossy().into_owned()),
            None => text("No file selected"),
        };

        let labels = self.form.metadata_labels();
        let info = column![
            text("File Info").size(14),
            row![text(labels.size), text(labels.resolution)].spacing(16),
            row![text(labels.fps), text(labels.duration)].spacing(16),
            text(self.form.estimate_label()),
        ]
        .spacing(4);

        let output_dir = self
            .form
            .output_dir
            .as_ref()
            .map(|dir| dir.to_string_lossy().into_owned())
            .unwrap_or_default();

        let settings = column![
            text("Settings").size(14),
            row![
                text("Output Name:").width(110),
                text_input("output.gif", &self.form.output_name).on_input(Message::OutputNameChanged),
            ]
            .spacing(8),
            row![
                text("Output Dir:").width(110),
                text_input("same as video", &output_dir).on_input(Message::OutputDirChanged),
                button("Choose...").on_press(Message::ChooseOutputDir),
            ]
            .spacing(8),
            row![
                text("Resize:").width(110),
                slider(RESIZE_SLIDER_RANGE, self.form.resize_percent, Message::ResizeChanged),
                text(format!("{}%", self.form.resize_percent)).width(48),
            ]
            .spacing(8),
            row![
                text("FPS:").width(110),
                text_input("15", &self.form.fps).on_input(Message::FpsChanged).width(80),
            ]
            .spacing(8),
            row![
                text("Start (s):").width(110),
                text_input("", &self.form.start).on_input(Message::StartChanged).width(80),
                text("End (s):"),
                text_input("", &self.form.end).on_input(Message::EndChanged).width(80),
            ]
            .spacing(8),
            row![
                text("Program:").width(110),
                pick_list(Backend::ALL, Some(self.form.backend), Message::BackendSelected),
            ]
            .spacing(8),
            checkbox(self.form.loop_forever)
                .label("Loop forever")
                .on_toggle(Message::LoopToggled),
        ]
        .spacing(8);

        let convert_button = button(text("Convert to GIF"))
            .width(Length::Fill)
            .on_press_maybe(self.form.can_convert().then_some(Message::Convert));

        let console = scrollable(
            column(self.console.lines().map(|line| -> Element<'_, Message> {
                let label = text(line.text.clone()).size(12);
                if line.is_error {
                    label.style(text::danger).into()
                } else {
                    label.into()
                }
            }))
            .spacing(2),
        )
        .height(Length::Fill);

        container(
            column![
                text("Drag & Drop a video here or click Select").size(16),
                button("Select Video").on_press(Message::SelectVideo),
                file_label,
                info,
                settings,
                convert_button,
                progress_bar(0.0..=100.0, self.progress),
                text(&self.status),
                text("Log Console:"),
                console,
            ]
            .spacing(12),
        )
        .padding(16)
        .into()
    }
}
