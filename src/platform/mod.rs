use std::path::{Path, PathBuf};

pub const DATA_DIR_ENV: &str = "PIPIO_STUDIO_HOME";

/// Platform-specific filesystem conventions behind a common interface so
/// call sites stay free of `#[cfg]` blocks.
pub trait Platform {
    /// Set restrictive *directory* permissions (0o700 on Unix, no-op on Windows).
    fn restrict_dir_permissions(path: &Path);

    /// Set restrictive *file* permissions (0o600 on Unix, no-op on Windows).
    fn restrict_file_permissions(path: &Path);

    /// Root data directory.
    /// Unix: `~/.pipio-studio`, Windows: `%APPDATA%\pipio-studio`.
    fn data_dir() -> PathBuf;

    fn config_dir() -> PathBuf {
        Self::data_dir()
    }

    fn log_dir() -> PathBuf {
        Self::data_dir().join("logs")
    }
}

/// `PIPIO_STUDIO_HOME` overrides the platform default.
pub(crate) fn resolve_data_dir(default: PathBuf) -> PathBuf {
    match std::env::var_os(DATA_DIR_ENV) {
        Some(dir) if !dir.is_empty() => PathBuf::from(dir),
        _ => default,
    }
}

#[cfg(unix)]
mod unix;
#[cfg(unix)]
pub use unix::NativePlatform;

#[cfg(windows)]
mod windows;
#[cfg(windows)]
pub use windows::NativePlatform;
