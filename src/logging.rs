//! File-backed tracing setup. Diagnostics go to the log file, never to the
//! interactive terminal.

use std::path::Path;

use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::EnvFilter;

/// Install the global subscriber writing to `log_path`. The returned guard
/// must stay alive for the process lifetime or buffered lines are dropped.
/// Returns `None` when the log destination cannot be prepared; the app still
/// runs, just without diagnostics.
pub fn init(log_path: &Path) -> Option<WorkerGuard> {
    let directory = log_path.parent()?;
    if std::fs::create_dir_all(directory).is_err() {
        return None;
    }
    let file_name = log_path.file_name()?;

    let appender = tracing_appender::rolling::never(directory, file_name);
    let (writer, guard) = tracing_appender::non_blocking(appender);

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let installed = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(writer)
        .with_ansi(false)
        .try_init()
        .is_ok();

    installed.then_some(guard)
}
