use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

fn main() -> iced::Result {
    let filter = EnvFilter::try_from_env("VID2GIF_LOG").unwrap_or_else(|_| EnvFilter::new("info"));
    let _ = tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().with_writer(std::io::stderr))
        .try_init();

    vid2gif::set_library_log_level(vid2gif::LibraryLogLevel::Error);
    vid2gif::gui::run()
}
