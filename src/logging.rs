use std::fs;
use std::path::Path;

use tracing_appender::non_blocking::WorkerGuard;
use tracing_appender::rolling;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use crate::error::CoreResult;

/// Daily rotating log files under `log_dir`, plus a stderr layer when
/// `console` is set. stdout stays reserved for command output.
///
/// `RUST_LOG` overrides the level; otherwise `debug` when `verbose`, else `info`.
///
/// The returned guard must be held for the lifetime of the process or
/// buffered lines are lost. A second call in the same process keeps the
/// first subscriber.
pub fn setup_logging(
    log_dir: &Path,
    log_prefix: &str,
    verbose: bool,
    console: bool,
) -> CoreResult<WorkerGuard> {
    fs::create_dir_all(log_dir)?;

    let file_appender = rolling::daily(log_dir, log_prefix);
    let (non_blocking, guard) = tracing_appender::non_blocking(file_appender);

    let default_level = if verbose { "debug" } else { "info" };
    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));

    let file_layer = tracing_subscriber::fmt::layer()
        .with_writer(non_blocking)
        .with_ansi(false)
        .with_target(true)
        .with_thread_ids(true)
        .with_file(true)
        .with_line_number(true);

    let console_layer = console.then(|| {
        tracing_subscriber::fmt::layer()
            .with_writer(std::io::stderr)
            .with_target(false)
    });

    let _ = tracing_subscriber::registry()
        .with(env_filter)
        .with(file_layer)
        .with(console_layer)
        .try_init();

    tracing::info!(
        dir = %log_dir.display(),
        prefix = log_prefix,
        verbose,
        console,
        "logging initialized"
    );

    Ok(guard)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_log_directory_created() {
        let temp_dir = tempfile::tempdir().unwrap();
        let log_dir = temp_dir.path().join("logs");

        // Only one global subscriber per process; a failed init is fine here.
        let _guard = setup_logging(&log_dir, "test", false, false).unwrap();

        assert!(log_dir.is_dir());
    }
}
