use tracing::metadata::LevelFilter;
use tracing_subscriber::{
    Layer, layer::SubscriberExt, util::SubscriberInitExt,
};

#[derive(Default)]
pub struct Logger;

impl Logger {
    /// Initialize the global tracing subscriber.
    ///
    /// The level comes from `HALYARD_LOG` when set, otherwise trace in
    /// debug builds and info in release builds. Call once at process
    /// startup; calling twice panics (the global subscriber is already
    /// set), which surfaces wiring mistakes early.
    pub fn init() {
        let level = if let Ok(level) = std::env::var("HALYARD_LOG") {
            match level.to_ascii_lowercase().as_str() {
                "error" => LevelFilter::ERROR,
                "warn" => LevelFilter::WARN,
                "info" => LevelFilter::INFO,
                "debug" => LevelFilter::DEBUG,
                "trace" => LevelFilter::TRACE,
                _ => LevelFilter::INFO,
            }
        } else if cfg!(debug_assertions) {
            LevelFilter::TRACE
        } else {
            LevelFilter::INFO
        };

        tracing_subscriber::Registry::default()
            .with(
                (if cfg!(debug_assertions) {
                    tracing_subscriber::fmt::layer()
                } else {
                    tracing_subscriber::fmt::layer()
                        .with_file(false)
                        .with_line_number(false)
                })
                .compact()
                .with_ansi(true)
                .with_filter(level),
            )
            .init();
    }
}
