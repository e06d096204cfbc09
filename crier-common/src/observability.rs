//! Logging bootstrap shared by the workspace binaries.
//!
//! [`init_logging`] installs the global `tracing` subscriber: a
//! daily-rolling file sink plus an optional stderr mirror for hosted
//! environments that capture process output. `RUST_LOG` overrides the
//! configured filter when set. The first call wins; later calls hand back
//! the path that call resolved.

use std::path::{Path, PathBuf};
use std::sync::OnceLock;

use anyhow::Context;
use chrono::Local;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_appender::rolling;
use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

// The guard must live for the life of the process or buffered lines are
// dropped on exit.
static WORKER: OnceLock<WorkerGuard> = OnceLock::new();
static ACTIVE_LOG: OnceLock<PathBuf> = OnceLock::new();

/// Encoding of the emitted log lines.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogFormat {
    Text,
    Json,
}

impl LogFormat {
    /// Lenient parse for config values; anything unrecognized is `Text`.
    pub fn parse(value: &str) -> Self {
        match value.trim().to_ascii_lowercase().as_str() {
            "json" => Self::Json,
            _ => Self::Text,
        }
    }
}

/// Options for [`init_logging`].
#[derive(Debug, Clone)]
pub struct LogConfig {
    /// Component name; prefixes the log file.
    pub app_name: &'static str,
    /// Target directory. `None` falls back to `CRIER_LOG_DIR`, then
    /// `~/.local/share/<app_name>`.
    pub log_dir: Option<PathBuf>,
    /// Mirror events to stderr alongside the file sink.
    pub emit_stderr: bool,
    pub format: LogFormat,
    /// Filter applied when `RUST_LOG` is unset.
    pub default_filter: String,
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            app_name: "crier",
            log_dir: None,
            emit_stderr: true,
            format: LogFormat::Text,
            default_filter: "info".to_string(),
        }
    }
}

/// Install the global subscriber and return the active log file path.
pub fn init_logging(config: LogConfig) -> anyhow::Result<PathBuf> {
    if let Some(active) = ACTIVE_LOG.get() {
        return Ok(active.clone());
    }

    let dir = pick_log_dir(&config);
    std::fs::create_dir_all(&dir)
        .with_context(|| format!("cannot create log directory {}", dir.display()))?;

    // tracing-appender writes "<prefix>.YYYY-MM-DD" for daily rotation.
    let prefix = format!("{}.log", config.app_name);
    let active = dir.join(format!("{prefix}.{}", Local::now().format("%Y-%m-%d")));

    let (file_writer, guard) = tracing_appender::non_blocking(rolling::daily(&dir, prefix));
    let _ = WORKER.set(guard);

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(&config.default_filter));

    let to_stderr = config.emit_stderr;
    match config.format {
        LogFormat::Text => tracing_subscriber::registry()
            .with(filter)
            .with(fmt::layer().with_writer(file_writer).with_ansi(false))
            .with(to_stderr.then(|| fmt::layer().with_writer(std::io::stderr)))
            .try_init(),
        LogFormat::Json => tracing_subscriber::registry()
            .with(filter)
            .with(fmt::layer().json().with_writer(file_writer))
            .with(to_stderr.then(|| fmt::layer().json().with_writer(std::io::stderr)))
            .try_init(),
    }
    .map_err(|e| anyhow::anyhow!("tracing init failed: {e}"))?;

    let _ = ACTIVE_LOG.set(active.clone());
    tracing::info!(path = %active.display(), "observability.init");
    Ok(active)
}

fn pick_log_dir(config: &LogConfig) -> PathBuf {
    if let Some(dir) = &config.log_dir {
        return expand_tilde(dir);
    }
    if let Ok(dir) = std::env::var("CRIER_LOG_DIR") {
        return expand_tilde(Path::new(&dir));
    }
    match std::env::var("HOME") {
        Ok(home) => Path::new(&home)
            .join(".local")
            .join("share")
            .join(config.app_name),
        Err(_) => PathBuf::from(".").join(config.app_name),
    }
}

fn expand_tilde(path: &Path) -> PathBuf {
    match (
        path.to_str().and_then(|s| s.strip_prefix("~/")),
        std::env::var("HOME"),
    ) {
        (Some(rest), Ok(home)) => Path::new(&home).join(rest),
        _ => path.to_path_buf(),
    }
}
