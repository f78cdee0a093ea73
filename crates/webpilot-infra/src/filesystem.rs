//! Data-directory layout for webpilot.

use std::path::{Path, PathBuf};

/// Environment variable overriding the data directory.
pub const DATA_DIR_ENV: &str = "WEBPILOT_DATA_DIR";

/// Resolve the webpilot data directory.
///
/// Priority:
/// 1. `WEBPILOT_DATA_DIR` environment variable
/// 2. `~/.webpilot`
/// 3. `./.webpilot` when no home directory is available
pub fn resolve_data_dir() -> PathBuf {
    if let Ok(dir) = std::env::var(DATA_DIR_ENV) {
        return PathBuf::from(dir);
    }

    if let Some(home) = dirs::home_dir() {
        return home.join(".webpilot");
    }

    PathBuf::from(".webpilot")
}

/// Resolve a configured directory against the data dir. Absolute paths are
/// used as-is.
pub fn resolve_under(data_dir: &Path, configured: &str) -> PathBuf {
    let path = Path::new(configured);
    if path.is_absolute() {
        path.to_path_buf()
    } else {
        data_dir.join(path)
    }
}
