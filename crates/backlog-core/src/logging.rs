use crate::BacklogResult;
use tracing_subscriber::EnvFilter;

/// Environment variable naming a file that receives DEBUG-level logs.
pub const DEBUG_LOG_VAR: &str = "BACKLOG_DEBUG_LOG";

/// Install the global tracing subscriber.
///
/// With `BACKLOG_DEBUG_LOG` set, everything down to DEBUG is appended to that
/// file. Otherwise logs go to stderr filtered by `RUST_LOG` (default `warn`),
/// keeping stdout free for JSON responses.
pub fn init_tracing() -> BacklogResult<()> {
    if let Ok(log_path) = std::env::var(DEBUG_LOG_VAR) {
        let log_file = std::fs::OpenOptions::new()
            .create(true)
            .append(true)
            .open(&log_path)?;

        tracing_subscriber::fmt()
            .with_writer(log_file)
            .with_max_level(tracing::Level::DEBUG)
            .with_target(true)
            .with_thread_ids(true)
            .with_file(true)
            .with_line_number(true)
            .with_ansi(false)
            .init();
    } else {
        let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_writer(std::io::stderr)
            .with_target(true)
            .init();
    }
    Ok(())
}
