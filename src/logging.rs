//! Logging to standard output and to per-kind log files.
//!
//! Every event goes to standard output with a compact timestamp. INFO events
//! are also appended to `info.log`, WARN and ERROR events to `error.log`, both
//! inside the configured log directory and message-only.
//!
//! Log files are best effort: if a file cannot be opened or written the line
//! is dropped and the watcher carries on. A full disk or a read-only log
//! directory never stops event processing.
//!
//! # Configuration
//!
//! ```toml
//! log_dir = "/var/log/repowatch"
//!
//! [logging]
//! default = "info"
//!
//! [logging.modules]
//! repowatch = "debug"
//! ```
//!
//! `RUST_LOG` takes precedence over config:
//! ```bash
//! RUST_LOG=repowatch=debug repowatch watch
//! ```

use std::fs::{File, OpenOptions};
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::sync::Once;

use tracing::{Level, Metadata};
use tracing_subscriber::fmt::MakeWriter;
use tracing_subscriber::fmt::time::FormatTime;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{EnvFilter, Layer};

use crate::config::LoggingConfig;

static INIT: Once = Once::new();

/// Compact time format: HH:MM:SS.mmm
struct CompactTime;

impl FormatTime for CompactTime {
    fn format_time(&self, w: &mut tracing_subscriber::fmt::format::Writer<'_>) -> std::fmt::Result {
        write!(w, "{}", chrono::Local::now().format("%H:%M:%S%.3f"))
    }
}

/// Which log file a line belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogKind {
    Info,
    Error,
}

impl LogKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            LogKind::Info => "info",
            LogKind::Error => "error",
        }
    }

    /// DEBUG and TRACE stay off disk.
    pub fn for_level(level: &Level) -> Option<Self> {
        if *level == Level::ERROR || *level == Level::WARN {
            Some(LogKind::Error)
        } else if *level == Level::INFO {
            Some(LogKind::Info)
        } else {
            None
        }
    }
}

/// `MakeWriter` that appends each line to `<dir>/<kind>.log`.
#[derive(Debug, Clone)]
pub struct LogFiles {
    dir: PathBuf,
}

impl LogFiles {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn path_for(&self, kind: LogKind) -> PathBuf {
        self.dir.join(format!("{}.log", kind.as_str()))
    }

    /// Open the file for `kind` in append mode, or a sink if that fails.
    pub fn open(&self, kind: LogKind) -> LogFile {
        OpenOptions::new()
            .create(true)
            .append(true)
            .open(self.path_for(kind))
            .map(LogFile::File)
            .unwrap_or(LogFile::Sink)
    }
}

impl<'a> MakeWriter<'a> for LogFiles {
    type Writer = LogFile;

    fn make_writer(&'a self) -> Self::Writer {
        LogFile::Sink
    }

    fn make_writer_for(&'a self, meta: &Metadata<'_>) -> Self::Writer {
        match LogKind::for_level(meta.level()) {
            Some(kind) => self.open(kind),
            None => LogFile::Sink,
        }
    }
}

/// Writer that never reports an error.
pub enum LogFile {
    File(File),
    Sink,
}

impl io::Write for LogFile {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        if let LogFile::File(file) = self {
            if file.write_all(buf).is_err() {
                *self = LogFile::Sink;
            }
        }
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        if let LogFile::File(file) = self {
            let _ = file.flush();
        }
        Ok(())
    }
}

fn build_filter(config: &LoggingConfig) -> EnvFilter {
    // RUST_LOG env var takes precedence over config
    if std::env::var("RUST_LOG").is_ok() {
        return EnvFilter::from_default_env();
    }

    let mut filter_str = config.default.clone();
    for (module, level) in &config.modules {
        filter_str.push_str(&format!(",{module}={level}"));
    }
    EnvFilter::new(&filter_str)
}

/// Initialize logging with configuration.
///
/// Call once at startup. Safe to call multiple times (only first call takes
/// effect). With `log_dir` set, INFO and ERROR lines are also appended to the
/// log files there.
pub fn init_with_config(config: &LoggingConfig, log_dir: Option<&Path>) {
    INIT.call_once(|| {
        let stdout_layer = tracing_subscriber::fmt::layer()
            .with_target(false)
            .with_timer(CompactTime)
            .with_level(true)
            .with_filter(build_filter(config));

        let file_layer = log_dir.map(|dir| {
            tracing_subscriber::fmt::layer()
                .with_writer(LogFiles::new(dir))
                .with_ansi(false)
                .without_time()
                .with_level(false)
                .with_target(false)
                .with_filter(build_filter(config))
        });

        tracing_subscriber::registry()
            .with(stdout_layer)
            .with(file_layer)
            .init();
    });
}

/// Log an event with component context.
///
/// # Examples
/// ```ignore
/// log_event!("repos", "adding repo", "{}", path.display());
/// log_event!("watcher", "started");
/// ```
#[macro_export]
macro_rules! log_event {
    ($component:expr, $event:expr) => {
        tracing::info!("[{}] {}", $component, $event)
    };
    ($component:expr, $event:expr, $($arg:tt)*) => {
        tracing::info!("[{}] {}: {}", $component, $event, format!($($arg)*))
    };
}

/// Debug-only event logging.
///
/// # Examples
/// ```ignore
/// debug_event!("files", "pattern mismatch", "{}", path.display());
/// ```
#[macro_export]
macro_rules! debug_event {
    ($component:expr, $event:expr) => {
        tracing::debug!("[{}] {}", $component, $event)
    };
    ($component:expr, $event:expr, $($arg:tt)*) => {
        tracing::debug!("[{}] {}: {}", $component, $event, format!($($arg)*))
    };
}
