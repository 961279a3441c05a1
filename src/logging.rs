use std::fs::{File, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

use anyhow::{Context, Result};
use tracing::Level;
use tracing_subscriber::FmtSubscriber;
use tracing_subscriber::fmt::MakeWriter;

use crate::platform::{NativePlatform, Platform};

pub const LOG_LEVEL_ENV: &str = "PIPIO_STUDIO_LOG";
pub const LOG_FILE_NAME: &str = "studio.log";

/// Writes formatted events to the session log file and, when verbose, to stderr.
#[derive(Clone)]
pub(crate) struct StudioMakeWriter {
    pub file: Arc<Mutex<File>>,
    pub mirror_stderr: bool,
}

impl<'a> MakeWriter<'a> for StudioMakeWriter {
    type Writer = StudioWriter;

    fn make_writer(&'a self) -> Self::Writer {
        StudioWriter {
            file: Arc::clone(&self.file),
            mirror_stderr: self.mirror_stderr,
        }
    }
}

pub(crate) struct StudioWriter {
    file: Arc<Mutex<File>>,
    mirror_stderr: bool,
}

impl std::io::Write for StudioWriter {
    fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
        {
            let mut file = self.file.lock().unwrap_or_else(|e| e.into_inner());
            file.write_all(buf)?;
        }
        if self.mirror_stderr {
            std::io::stderr().write_all(buf)?;
        }
        Ok(buf.len())
    }

    fn flush(&mut self) -> std::io::Result<()> {
        self.file
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .flush()?;
        if self.mirror_stderr {
            std::io::stderr().flush()?;
        }
        Ok(())
    }
}

pub fn level_from_env() -> Level {
    std::env::var(LOG_LEVEL_ENV)
        .ok()
        .and_then(|raw| parse_level(&raw))
        .unwrap_or(Level::INFO)
}

pub fn parse_level(raw: &str) -> Option<Level> {
    raw.trim().parse::<Level>().ok()
}

pub fn default_log_path() -> PathBuf {
    NativePlatform::log_dir().join(LOG_FILE_NAME)
}

/// Install the global subscriber. Returns the log file path.
pub fn init(log_path: &Path, verbose: bool) -> Result<PathBuf> {
    if let Some(dir) = log_path.parent() {
        std::fs::create_dir_all(dir)
            .with_context(|| format!("Failed to create log dir {}", dir.display()))?;
        NativePlatform::restrict_dir_permissions(dir);
    }
    let file = OpenOptions::new()
        .create(true)
        .append(true)
        .open(log_path)
        .with_context(|| format!("Failed to open log file {}", log_path.display()))?;
    NativePlatform::restrict_file_permissions(log_path);

    let make_writer = StudioMakeWriter {
        file: Arc::new(Mutex::new(file)),
        mirror_stderr: verbose,
    };
    let level = if verbose { Level::DEBUG } else { level_from_env() };
    let subscriber = FmtSubscriber::builder()
        .with_max_level(level)
        .with_ansi(false)
        .with_writer(make_writer)
        .finish();
    tracing::subscriber::set_global_default(subscriber).ok();
    Ok(log_path.to_path_buf())
}
