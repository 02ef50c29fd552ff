use chrono::Local;
use std::path::PathBuf;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LogLevel {
    Debug,
    #[default]
    Info,
    Warn,
    Error,
}

impl LogLevel {
    pub fn parse(s: &str) -> Self {
        match s.to_uppercase().as_str() {
            "DEBUG" => LogLevel::Debug,
            "INFO" => LogLevel::Info,
            "WARN" => LogLevel::Warn,
            "ERROR" => LogLevel::Error,
            _ => LogLevel::Info,
        }
    }

    fn directive(&self) -> &'static str {
        match self {
            LogLevel::Debug => "debug",
            LogLevel::Info => "info",
            LogLevel::Warn => "warn",
            LogLevel::Error => "error",
        }
    }
}

impl std::fmt::Display for LogLevel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            LogLevel::Debug => write!(f, "DEBUG"),
            LogLevel::Info => write!(f, "INFO"),
            LogLevel::Warn => write!(f, "WARN"),
            LogLevel::Error => write!(f, "ERROR"),
        }
    }
}

/// Keeps the background log writer alive. Drop it only at process exit, or
/// buffered lines are lost.
#[derive(Default)]
pub struct LoggingGuard {
    pub log_path: Option<PathBuf>,
    _worker: Option<WorkerGuard>,
}

fn env_filter(level: LogLevel) -> EnvFilter {
    EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level.directive()))
}

/// Install the global tracing subscriber.
///
/// `RUST_LOG` overrides `level`. With `print` set, lines go to stderr (stdout
/// stays clean for command output); otherwise to a timestamped file under
/// `log_dir`. A second call is a no-op.
pub fn init_tracing(level: LogLevel, log_dir: Option<PathBuf>, print: bool) -> LoggingGuard {
    if print {
        let _ = tracing_subscriber::registry()
            .with(env_filter(level))
            .with(fmt::layer().with_writer(std::io::stderr))
            .try_init();
        return LoggingGuard::default();
    }

    let log_dir = log_dir.unwrap_or_else(|| PathBuf::from("."));
    let timestamp = Local::now().format("%Y-%m-%dT%H%M%S").to_string();
    let log_path = log_dir.join(format!("{}.log", timestamp));

    if let Some(parent) = log_path.parent() {
        let _ = std::fs::create_dir_all(parent);
    }

    let file = std::fs::OpenOptions::new()
        .create(true)
        .write(true)
        .truncate(true)
        .open(&log_path)
        .ok();

    match file {
        Some(file) => {
            let (non_blocking, worker) = tracing_appender::non_blocking(file);
            let _ = tracing_subscriber::registry()
                .with(env_filter(level))
                .with(fmt::layer().with_writer(non_blocking).with_ansi(false))
                .try_init();
            LoggingGuard {
                log_path: Some(log_path),
                _worker: Some(worker),
            }
        }
        None => {
            let _ = tracing_subscriber::registry()
                .with(env_filter(level))
                .with(fmt::layer().with_writer(std::io::stderr))
                .try_init();
            LoggingGuard::default()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_level_parse_is_case_insensitive() {
        assert_eq!(LogLevel::parse("debug"), LogLevel::Debug);
        assert_eq!(LogLevel::parse("WARN"), LogLevel::Warn);
        assert_eq!(LogLevel::parse("verbose"), LogLevel::Info);
    }

    #[test]
    fn test_level_display_round_trips_through_parse() {
        for level in [
            LogLevel::Debug,
            LogLevel::Info,
            LogLevel::Warn,
            LogLevel::Error,
        ] {
            assert_eq!(LogLevel::parse(&level.to_string()), level);
        }
    }

    #[test]
    fn test_file_logging_creates_log_file() {
        let dir = std::env::temp_dir().join(format!("nblm-log-test-{}", std::process::id()));
        let guard = init_tracing(LogLevel::Debug, Some(dir.clone()), false);
        let path = guard.log_path.clone().expect("log path");
        assert!(path.starts_with(&dir));
        assert!(path.exists());
        drop(guard);
        let _ = std::fs::remove_dir_all(&dir);
    }
}
