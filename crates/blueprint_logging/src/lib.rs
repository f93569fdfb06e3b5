//! Shared logging utilities for Blueprint binaries.

use anyhow::{Context, Result};
use std::fs::{self, File, OpenOptions};
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter, Layer};

pub const DEFAULT_LOG_FILTER: &str = "blueprint=info,blueprint_schema=info";
const VERBOSE_LOG_FILTER: &str = "blueprint=debug,blueprint_schema=debug";
const HOME_ENV: &str = "BLUEPRINT_HOME";
const MAX_LOG_FILES: usize = 5;
const MAX_LOG_FILE_SIZE: u64 = 10 * 1024 * 1024;

/// Logging configuration shared by Blueprint binaries.
pub struct LogConfig<'a> {
    pub app_name: &'a str,
    pub verbose: bool,
}

/// Initialize tracing with a size-rolling file writer and stderr output.
///
/// `RUST_LOG` overrides the default filter for both layers; `verbose` only
/// widens the console.
pub fn init_logging(config: LogConfig<'_>) -> Result<()> {
    let log_dir = ensure_logs_dir().context("Failed to ensure log directory")?;
    let file_writer = SharedRollingWriter::new(&log_dir, config.app_name)
        .context("Failed to initialize rolling log writer")?;

    let file_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(DEFAULT_LOG_FILTER));
    let console_filter = if config.verbose {
        EnvFilter::new(VERBOSE_LOG_FILTER)
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_LOG_FILTER))
    };

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::fmt::layer()
                .with_writer(file_writer)
                .with_ansi(false)
                .with_filter(file_filter),
        )
        .with(
            tracing_subscriber::fmt::layer()
                .with_writer(std::io::stderr)
                .with_target(false)
                .with_filter(console_filter),
        )
        .try_init()
        .context("A global tracing subscriber is already installed")?;

    Ok(())
}

/// Blueprint home directory: `$BLUEPRINT_HOME`, else `~/.blueprint`.
pub fn blueprint_home() -> Result<PathBuf> {
    if let Some(override_path) = std::env::var_os(HOME_ENV) {
        return Ok(PathBuf::from(override_path));
    }
    let home = dirs::home_dir().context("Could not determine home directory")?;
    Ok(home.join(".blueprint"))
}

/// Logs directory: `<home>/logs`
pub fn logs_dir() -> Result<PathBuf> {
    Ok(blueprint_home()?.join("logs"))
}

/// Ensure the logs directory exists.
pub fn ensure_logs_dir() -> Result<PathBuf> {
    let logs = logs_dir()?;
    fs::create_dir_all(&logs)
        .with_context(|| format!("Failed to create logs directory: {}", logs.display()))?;
    Ok(logs)
}

/// Appends to `<name>.log`, shifting it to `<name>.log.1 .. .N` once it grows
/// past `max_size`.
struct RollingFileAppender {
    dir: PathBuf,
    stem: String,
    max_files: usize,
    max_size: u64,
    file: Option<File>,
    written: u64,
}

impl RollingFileAppender {
    fn open(dir: &Path, app_name: &str, max_files: usize, max_size: u64) -> io::Result<Self> {
        fs::create_dir_all(dir)?;
        let mut appender = Self {
            dir: dir.to_path_buf(),
            stem: sanitize_name(app_name),
            max_files: max_files.max(1),
            max_size,
            file: None,
            written: 0,
        };
        appender.reopen()?;
        if appender.written > appender.max_size {
            appender.roll()?;
        }
        Ok(appender)
    }

    fn active_path(&self) -> PathBuf {
        self.dir.join(format!("{}.log", self.stem))
    }

    fn archive_path(&self, generation: usize) -> PathBuf {
        self.dir.join(format!("{}.log.{}", self.stem, generation))
    }

    fn reopen(&mut self) -> io::Result<()> {
        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(self.active_path())?;
        self.written = file.metadata()?.len();
        self.file = Some(file);
        Ok(())
    }

    fn roll(&mut self) -> io::Result<()> {
        if let Some(mut file) = self.file.take() {
            let _ = file.flush();
        }
        let archives = self.max_files - 1;
        if archives > 0 {
            let oldest = self.archive_path(archives);
            if oldest.exists() {
                fs::remove_file(&oldest)?;
            }
            for generation in (1..archives).rev() {
                let from = self.archive_path(generation);
                if from.exists() {
                    fs::rename(&from, self.archive_path(generation + 1))?;
                }
            }
            let active = self.active_path();
            if active.exists() {
                fs::rename(&active, self.archive_path(1))?;
            }
        } else {
            fs::remove_file(self.active_path())?;
        }
        self.reopen()
    }
}

impl Write for RollingFileAppender {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        if self.written > 0 && self.written + buf.len() as u64 > self.max_size {
            self.roll()?;
        }
        let file = self
            .file
            .as_mut()
            .ok_or_else(|| io::Error::new(io::ErrorKind::Other, "log file unavailable"))?;
        let n = file.write(buf)?;
        self.written += n as u64;
        Ok(n)
    }

    fn flush(&mut self) -> io::Result<()> {
        match self.file.as_mut() {
            Some(file) => file.flush(),
            None => Ok(()),
        }
    }
}

#[derive(Clone)]
struct SharedRollingWriter {
    inner: Arc<Mutex<RollingFileAppender>>,
}

impl SharedRollingWriter {
    fn new(dir: &Path, app_name: &str) -> Result<Self> {
        let appender = RollingFileAppender::open(dir, app_name, MAX_LOG_FILES, MAX_LOG_FILE_SIZE)
            .with_context(|| format!("Failed to open log file for {}", app_name))?;
        Ok(Self {
            inner: Arc::new(Mutex::new(appender)),
        })
    }

    fn with_appender<T>(&self, f: impl FnOnce(&mut RollingFileAppender) -> io::Result<T>) -> io::Result<T> {
        let mut guard = self
            .inner
            .lock()
            .map_err(|_| io::Error::new(io::ErrorKind::Other, "log writer lock poisoned"))?;
        f(&mut guard)
    }
}

impl Write for SharedRollingWriter {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.with_appender(|appender| appender.write(buf))
    }

    fn flush(&mut self) -> io::Result<()> {
        self.with_appender(|appender| appender.flush())
    }
}

impl<'a> tracing_subscriber::fmt::MakeWriter<'a> for SharedRollingWriter {
    type Writer = SharedRollingWriter;

    fn make_writer(&'a self) -> Self::Writer {
        self.clone()
    }
}

fn sanitize_name(name: &str) -> String {
    let cleaned: String = name
        .chars()
        .map(|ch| if ch.is_ascii_alphanumeric() || ch == '-' || ch == '_' { ch } else { '_' })
        .collect();
    if cleaned.is_empty() {
        "blueprint".to_string()
    } else {
        cleaned
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_sanitize_name() {
        assert_eq!(sanitize_name("blueprint"), "blueprint");
        assert_eq!(sanitize_name("edit/login v2"), "edit_login_v2");
        assert_eq!(sanitize_name(""), "blueprint");
    }

    #[test]
    fn test_appender_writes_active_file() {
        let dir = TempDir::new().unwrap();
        let mut appender = RollingFileAppender::open(dir.path(), "cli", 3, 1024).unwrap();
        appender.write_all(b"hello\n").unwrap();
        appender.flush().unwrap();

        let contents = fs::read_to_string(dir.path().join("cli.log")).unwrap();
        assert_eq!(contents, "hello\n");
    }

    #[test]
    fn test_appender_rolls_and_caps_archives() {
        let dir = TempDir::new().unwrap();
        let mut appender = RollingFileAppender::open(dir.path(), "cli", 3, 8).unwrap();
        for line in ["aaaaaa\n", "bbbbbb\n", "cccccc\n", "dddddd\n"] {
            appender.write_all(line.as_bytes()).unwrap();
        }
        appender.flush().unwrap();

        let read = |name: &str| fs::read_to_string(dir.path().join(name)).unwrap();
        assert_eq!(read("cli.log"), "dddddd\n");
        assert_eq!(read("cli.log.1"), "cccccc\n");
        assert_eq!(read("cli.log.2"), "bbbbbb\n");
        assert!(!dir.path().join("cli.log.3").exists());
    }

    #[test]
    fn test_appender_resumes_existing_file() {
        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join("cli.log"), "earlier\n").unwrap();
        let mut appender = RollingFileAppender::open(dir.path(), "cli", 2, 1024).unwrap();
        appender.write_all(b"later\n").unwrap();
        appender.flush().unwrap();

        let contents = fs::read_to_string(dir.path().join("cli.log")).unwrap();
        assert_eq!(contents, "earlier\nlater\n");
    }

    #[test]
    fn test_shared_writer_appends_through_clones() {
        let dir = TempDir::new().unwrap();
        let writer = SharedRollingWriter::new(dir.path(), "shared").unwrap();
        let mut first = writer.clone();
        let mut second = writer.clone();
        first.write_all(b"one\n").unwrap();
        second.write_all(b"two\n").unwrap();
        second.flush().unwrap();

        let contents = fs::read_to_string(dir.path().join("shared.log")).unwrap();
        assert_eq!(contents, "one\ntwo\n");
    }
}
