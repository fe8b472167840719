//! Subscriber setup for the `tenure` binary

use std::fs::{self, File, OpenOptions};
use std::io::{self, Write};
use std::path::Path;
use std::sync::{Arc, Mutex};

use anyhow::Context;
use tenure_config::LoggingSettings;
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Writer that flushes each write through to the shared log file.
pub struct FileWriterGuard {
    file: Arc<Mutex<File>>,
}

impl FileWriterGuard {
    pub fn new(file: Arc<Mutex<File>>) -> Self {
        Self { file }
    }

    fn with_file<T>(&self, f: impl FnOnce(&mut File) -> io::Result<T>) -> io::Result<T> {
        let mut file = self
            .file
            .lock()
            .map_err(|_| io::Error::other("log file mutex was poisoned"))?;
        f(&mut file)
    }
}

impl Write for FileWriterGuard {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.with_file(|file| {
            let written = file.write(buf)?;
            file.flush()?;
            Ok(written)
        })
    }

    fn flush(&mut self) -> io::Result<()> {
        self.with_file(|file| file.flush())
    }
}

/// Filter for the subscriber: `RUST_LOG` wins, then `--debug`, then the configured level
pub fn build_filter(settings: &LoggingSettings, debug: bool) -> anyhow::Result<EnvFilter> {
    if let Ok(filter) = EnvFilter::try_from_default_env() {
        return Ok(filter);
    }
    let directive = if debug { "debug" } else { settings.level.as_str() };
    EnvFilter::try_new(directive)
        .with_context(|| format!("Invalid log level '{}'", directive))
}

fn open_log_file(path: &Path) -> anyhow::Result<File> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent)
            .with_context(|| format!("Could not create log directory {}", parent.display()))?;
    }
    OpenOptions::new()
        .create(true)
        .append(true)
        .open(path)
        .with_context(|| format!("Could not open log file {}", path.display()))
}

/// Install the global subscriber, writing to stderr or the configured file
pub fn init(settings: &LoggingSettings, debug: bool) -> anyhow::Result<()> {
    let filter = build_filter(settings, debug)?;

    match settings.file {
        Some(ref path) => {
            let shared_file = Arc::new(Mutex::new(open_log_file(path)?));
            tracing_subscriber::registry()
                .with(filter)
                .with(
                    fmt::layer()
                        .with_writer(move || FileWriterGuard::new(shared_file.clone()))
                        .with_ansi(false),
                )
                .try_init()?;
        }
        None => {
            tracing_subscriber::registry()
                .with(filter)
                .with(
                    fmt::layer()
                        .with_target(false)
                        .with_ansi(false)
                        .with_writer(io::stderr),
                )
                .try_init()?;
        }
    }
    Ok(())
}
