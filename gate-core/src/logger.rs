//! Tracing initialization. Logs go to stderr so stdout stays free for command output; an
//! optional log file receives the same lines.

use std::fs::{File, OpenOptions};
use std::io;
use std::sync::Arc;

use tracing_subscriber::fmt::writer::{MakeWriterExt, OptionalWriter};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter, Registry};

fn env_filter() -> EnvFilter {
    EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"))
}

fn open_log_file(log_file_path: &str) -> anyhow::Result<Arc<File>> {
    if let Some(parent) = std::path::Path::new(log_file_path).parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent)?;
        }
    }
    let file = OpenOptions::new()
        .create(true)
        .append(true)
        .open(log_file_path)?;
    Ok(Arc::new(file))
}

/// Installs the global subscriber writing to stderr and, with `log_file_path`, appending to
/// that file too. Creates missing parent directories.
///
/// Level comes from `RUST_LOG` (default `info`); load `.env` before calling this.
pub fn init_tracing(log_file_path: Option<&str>) -> anyhow::Result<()> {
    let file = log_file_path.map(open_log_file).transpose()?;
    let file_writer = move || match &file {
        Some(f) => OptionalWriter::some(Arc::clone(f)),
        None => OptionalWriter::none(),
    };
    let writer = io::stderr.and(file_writer);

    let fmt_layer = tracing_subscriber::fmt::layer()
        .with_writer(writer)
        .with_ansi(log_file_path.is_none())
        .with_target(true)
        .with_thread_ids(true)
        .with_level(true)
        .with_file(false)
        .with_line_number(false);

    Registry::default()
        .with(env_filter())
        .with(fmt_layer)
        .try_init()
        .map_err(|e| anyhow::anyhow!("Failed to set global subscriber: {}", e))?;

    Ok(())
}
