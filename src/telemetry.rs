//! Tracing subscriber setup.
//!
//! Every event goes to stdout, filtered by `RUST_LOG` and formatted per
//! `LOG_FORMAT`. When `LOG_FILE_PATH` is set, access events are also
//! written to a daily-rotated file through a non-blocking writer.

use std::path::Path;

use anyhow::{Context, Result};
use tracing::Subscriber;
use tracing_appender::non_blocking::{NonBlocking, WorkerGuard};
use tracing_appender::rolling::{RollingFileAppender, Rotation};
use tracing_subscriber::filter::{LevelFilter, Targets};
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::registry::LookupSpan;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{EnvFilter, Layer, fmt};

use crate::config::Config;
use crate::gateway::ACCESS_LOG_TARGET;

/// Rotated access log files kept on disk.
pub const MAX_LOG_FILES: usize = 7;

/// Installs the global subscriber.
///
/// The returned guard flushes the access log file on drop, so it must
/// live as long as the process.
///
/// # Errors
///
/// Returns an error if `RUST_LOG` is not a valid filter, the log file
/// cannot be opened, or a global subscriber is already set.
pub fn init(config: &Config) -> Result<Option<WorkerGuard>> {
    let filter = EnvFilter::try_new(&config.log_level)
        .with_context(|| format!("RUST_LOG '{}' is not a valid filter", config.log_level))?;

    let stdout = if config.log_format == "json" {
        fmt::layer().json().boxed()
    } else {
        fmt::layer().boxed()
    };

    let (file, guard) = match config.log_file_path.as_deref() {
        Some(path) => {
            let (writer, guard) = access_log_writer(Path::new(path), MAX_LOG_FILES)?;
            (Some(access_layer(writer)), Some(guard))
        }
        None => (None, None),
    };

    tracing_subscriber::registry()
        .with(stdout.with_filter(filter))
        .with(file)
        .try_init()
        .context("failed to install tracing subscriber")?;

    Ok(guard)
}

/// Opens a daily-rotated, non-blocking writer for `path`.
///
/// The file name is used as the prefix of each rotated file
/// (`logs/api.log` becomes `logs/api.log.2026-01-31`).
pub fn access_log_writer(path: &Path, max_files: usize) -> Result<(NonBlocking, WorkerGuard)> {
    let directory = path
        .parent()
        .filter(|dir| !dir.as_os_str().is_empty())
        .unwrap_or(Path::new("."));
    let prefix = path
        .file_name()
        .and_then(|name| name.to_str())
        .with_context(|| format!("LOG_FILE_PATH '{}' has no file name", path.display()))?;

    std::fs::create_dir_all(directory)
        .with_context(|| format!("failed to create log directory {}", directory.display()))?;

    let appender = RollingFileAppender::builder()
        .rotation(Rotation::DAILY)
        .filename_prefix(prefix)
        .max_log_files(max_files)
        .build(directory)
        .with_context(|| format!("failed to open access log {}", path.display()))?;

    Ok(tracing_appender::non_blocking(appender))
}

/// Plain-text layer that only accepts [`ACCESS_LOG_TARGET`] events.
pub fn access_layer<S>(writer: NonBlocking) -> impl Layer<S>
where
    S: Subscriber + for<'a> LookupSpan<'a>,
{
    fmt::layer()
        .with_writer(writer)
        .with_ansi(false)
        .with_filter(Targets::new().with_target(ACCESS_LOG_TARGET, LevelFilter::INFO))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use std::path::PathBuf;
    use std::time::Duration;

    use crate::gateway::{RequestLogger, RequestRecord};

    fn scratch_dir(name: &str) -> PathBuf {
        let dir = std::env::temp_dir().join(format!("apigate-{}-{}", name, std::process::id()));
        let _ = fs::remove_dir_all(&dir);
        dir
    }

    fn read_all(dir: &Path) -> String {
        let mut contents = String::new();
        for entry in fs::read_dir(dir).unwrap() {
            contents.push_str(&fs::read_to_string(entry.unwrap().path()).unwrap());
        }
        contents
    }

    #[test]
    fn test_access_file_receives_only_access_events() {
        let dir = scratch_dir("access-log");
        let (writer, guard) = access_log_writer(&dir.join("api.log"), 2).unwrap();
        let subscriber = tracing_subscriber::registry().with(access_layer(writer));

        tracing::subscriber::with_default(subscriber, || {
            RequestLogger::new().log(&RequestRecord {
                method: "GET",
                path: "/api/v1/protected",
                client: "10.0.0.7",
                status: 429,
                latency: Duration::from_millis(3),
            });
            tracing::info!("server listening");
        });
        drop(guard);

        let contents = read_all(&dir);
        assert!(contents.contains("GET /api/v1/protected | Status: 429 | IP: 10.0.0.7"));
        assert!(!contents.contains("server listening"));
        assert!(!contents.contains("\x1b["));

        let names: Vec<String> = fs::read_dir(&dir)
            .unwrap()
            .map(|e| e.unwrap().file_name().to_string_lossy().into_owned())
            .collect();
        assert!(names.iter().all(|n| n.starts_with("api.log")), "{names:?}");

        fs::remove_dir_all(&dir).ok();
    }

    #[test]
    fn test_writer_rejects_path_without_file_name() {
        assert!(access_log_writer(Path::new("/"), 2).is_err());
    }
}
