//! Tracing setup for the binary.
//!
//! Logs go to stderr, filtered by `RUST_LOG` or the configured level. With
//! file logging enabled a daily rolling file is also written to the logs
//! directory.

use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{EnvFilter, Layer, fmt};
use weaver_core::config::LoggingSettings;
use weaver_infrastructure::WeaverPaths;

const LOG_FILE_PREFIX: &str = "weaver.log";

/// Installs the global subscriber. Keep the returned guard alive until exit
/// so buffered file output is flushed.
pub fn init(settings: &LoggingSettings, paths: &WeaverPaths) -> Option<WorkerGuard> {
    let filter = || {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&settings.log_level))
    };

    let stderr_layer = fmt::layer()
        .with_writer(std::io::stderr)
        .with_target(false)
        .with_filter(filter());

    let logs_dir = settings
        .file_logging
        .then(|| paths.logs_dir().ok())
        .flatten()
        .filter(|dir| std::fs::create_dir_all(dir).is_ok());

    let (file_layer, guard) = match logs_dir {
        Some(dir) => {
            let appender = tracing_appender::rolling::daily(&dir, LOG_FILE_PREFIX);
            let (writer, guard) = tracing_appender::non_blocking(appender);
            let layer = fmt::layer()
                .with_writer(writer)
                .with_ansi(false)
                .with_filter(filter());
            (Some(layer), Some(guard))
        }
        None => (None, None),
    };

    let installed = tracing_subscriber::registry()
        .with(stderr_layer)
        .with(file_layer)
        .try_init();
    if let Err(err) = installed {
        eprintln!("Logging already initialised: {err}");
    }

    guard
}
