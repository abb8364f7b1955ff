use std::fs;
use std::path::PathBuf;

use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::EnvFilter;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

use crate::config::log_dir;

const LOG_FILE_PREFIX: &str = "lightide.log";
const DEFAULT_FILTER: &str = "lightide=info";

/// Keeps the background log writer alive; dropping it flushes pending lines.
pub(crate) struct LoggingGuard {
    _guard: WorkerGuard,
}

fn ensure_dir(preferred: PathBuf) -> Option<PathBuf> {
    if fs::create_dir_all(&preferred).is_ok() {
        return Some(preferred);
    }
    let fallback = std::env::temp_dir().join("lightide").join("logs");
    fs::create_dir_all(&fallback).ok()?;
    Some(fallback)
}

/// Logs panics, then hands them to the previously installed hook.
fn install_panic_logging() {
    let previous = std::panic::take_hook();
    std::panic::set_hook(Box::new(move |panic_info| {
        tracing::error!(panic = %panic_info, "panic");
        previous(panic_info);
    }));
}

/// Installs the file subscriber. The terminal belongs to the UI, so nothing
/// is written to stdout or stderr. Returns `None` when logging could not be
/// set up; the editor runs without it.
pub(crate) fn init() -> Option<LoggingGuard> {
    let log_dir = ensure_dir(log_dir())?;

    let file_appender = tracing_appender::rolling::daily(&log_dir, LOG_FILE_PREFIX);
    let (non_blocking, guard) = tracing_appender::non_blocking(file_appender);

    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_FILTER));

    let subscriber = tracing_subscriber::registry().with(env_filter).with(
        tracing_subscriber::fmt::layer()
            .with_writer(non_blocking)
            .with_ansi(false)
            .with_target(true)
            .with_line_number(true),
    );

    if subscriber.try_init().is_err() {
        return None;
    }

    install_panic_logging();

    tracing::info!(log_dir = %log_dir.display(), "tracing initialized");

    Some(LoggingGuard { _guard: guard })
}
