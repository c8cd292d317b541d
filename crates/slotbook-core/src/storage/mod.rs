mod config;
pub mod grid_store;

pub use config::{Config, DEFAULT_SLOTS};
pub use grid_store::{GridStore, JsonGridStore, MemoryGridStore};

use std::path::{Path, PathBuf};

use serde::de::DeserializeOwned;
use serde::Serialize;

use crate::error::{ConfigError, PersistenceError};

/// Returns the slotbook data directory, creating it if needed.
///
/// `SLOTBOOK_DATA_DIR` overrides the location outright. Otherwise this is
/// `~/.config/slotbook[-dev]/`, with `SLOTBOOK_ENV=dev` selecting the
/// development directory.
///
/// # Errors
/// Returns an error if creating the directory fails.
pub fn data_dir() -> Result<PathBuf, ConfigError> {
    let dir = match std::env::var_os("SLOTBOOK_DATA_DIR") {
        Some(dir) if !dir.is_empty() => PathBuf::from(dir),
        _ => {
            let base_dir = dirs::home_dir()
                .unwrap_or_else(|| PathBuf::from("."))
                .join(".config");

            let env = std::env::var("SLOTBOOK_ENV").unwrap_or_else(|_| "production".to_string());

            if env == "dev" {
                base_dir.join("slotbook-dev")
            } else {
                base_dir.join("slotbook")
            }
        }
    };

    std::fs::create_dir_all(&dir)
        .map_err(|e| ConfigError::DataDir(format!("{}: {e}", dir.display())))?;
    Ok(dir)
}

/// Write `contents` to `path` through a sibling `.tmp` file and a rename, so
/// a crash never leaves a torn file behind.
pub(crate) fn write_atomic(path: &Path, contents: &[u8]) -> Result<(), PersistenceError> {
    let io_err = |path: &Path| {
        let path = path.to_path_buf();
        move |source| PersistenceError::Io { path, source }
    };

    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent).map_err(io_err(parent))?;
    }

    let mut temp = path.as_os_str().to_owned();
    temp.push(".tmp");
    let temp = PathBuf::from(temp);

    std::fs::write(&temp, contents).map_err(io_err(&temp))?;
    std::fs::rename(&temp, path).map_err(io_err(path))?;
    Ok(())
}

/// Serialize `value` as pretty JSON and write it atomically.
pub(crate) fn save_json<T: Serialize + ?Sized>(path: &Path, value: &T) -> Result<(), PersistenceError> {
    let mut content = serde_json::to_vec_pretty(value).map_err(PersistenceError::Encode)?;
    content.push(b'\n');
    write_atomic(path, &content)
}

/// Read a JSON file. A missing or blank file yields `None`.
pub(crate) fn load_json<T: DeserializeOwned>(path: &Path) -> Result<Option<T>, PersistenceError> {
    let content = match std::fs::read_to_string(path) {
        Ok(content) => content,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
        Err(source) => {
            return Err(PersistenceError::Io {
                path: path.to_path_buf(),
                source,
            })
        }
    };

    if content.trim().is_empty() {
        return Ok(None);
    }

    serde_json::from_str(&content)
        .map(Some)
        .map_err(|source| PersistenceError::Decode {
            path: path.to_path_buf(),
            source,
        })
}
