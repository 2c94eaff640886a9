//! Configuration file resolution, TOML loading and atomic writes
//!
//! Config file resolution follows a fixed priority order:
//! 1. Command-line argument (highest priority)
//! 2. Environment variable
//! 3. Per-user config file (`~/.config/eduscout/config.toml` on Linux)
//! 4. System config file (`/etc/eduscout/config.toml`, Linux only)
//!
//! A missing config file is never fatal: callers fall back to compiled defaults.

use crate::{Error, Result};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

/// Application directory name under the platform config dir
pub const APP_DIR_NAME: &str = "eduscout";

/// Config file name inside [`APP_DIR_NAME`]
pub const CONFIG_FILE_NAME: &str = "config.toml";

/// Logging configuration
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct LoggingConfig {
    /// Log level or `EnvFilter` directive (trace, debug, info, warn, error)
    #[serde(default = "default_log_level")]
    pub level: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
        }
    }
}

fn default_log_level() -> String {
    "info".to_string()
}

/// Standard User-Agent for outbound HTTP clients
pub fn get_user_agent() -> String {
    format!(
        "EduScout/{} (+https://github.com/eduscout/eduscout)",
        env!("CARGO_PKG_VERSION")
    )
}

/// Resolve the config file path.
///
/// Returns `None` when no candidate exists; a path given explicitly on the
/// command line or via the environment is returned even if it does not exist,
/// so the caller can report it.
pub fn resolve_config_path(cli_arg: Option<&Path>, env_var_name: &str) -> Option<PathBuf> {
    // Priority 1: Command-line argument
    if let Some(path) = cli_arg {
        return Some(path.to_path_buf());
    }

    // Priority 2: Environment variable
    if let Ok(path) = std::env::var(env_var_name) {
        if !path.trim().is_empty() {
            return Some(PathBuf::from(path));
        }
    }

    // Priority 3: Per-user config
    if let Some(user_config) = dirs::config_dir().map(|d| d.join(APP_DIR_NAME).join(CONFIG_FILE_NAME)) {
        if user_config.exists() {
            return Some(user_config);
        }
    }

    // Priority 4: System config (Linux only)
    if cfg!(target_os = "linux") {
        let system_config = PathBuf::from("/etc").join(APP_DIR_NAME).join(CONFIG_FILE_NAME);
        if system_config.exists() {
            return Some(system_config);
        }
    }

    None
}

/// Read and parse a TOML file into `T`
pub fn load_toml_file<T: DeserializeOwned>(path: &Path) -> Result<T> {
    let content = std::fs::read_to_string(path).map_err(|e| {
        Error::Config(format!("Failed to read {}: {}", path.display(), e))
    })?;
    let parsed = toml::from_str(&content)?;
    debug!(path = %path.display(), "Loaded TOML config");
    Ok(parsed)
}

/// Load a TOML file, degrading to `T::default()` when the file is missing.
///
/// A file that exists but fails to parse is still an error.
pub fn load_toml_or_default<T: DeserializeOwned + Default>(path: Option<&Path>) -> Result<T> {
    match path {
        Some(p) if p.exists() => load_toml_file(p),
        Some(p) => {
            warn!(path = %p.display(), "Config file not found, using built-in defaults");
            Ok(T::default())
        }
        None => {
            debug!("No config file configured, using built-in defaults");
            Ok(T::default())
        }
    }
}

/// Write `contents` to `path` atomically (temp file + rename).
///
/// The temp file lives next to the target so the rename never crosses
/// filesystems. Parent directories are created as needed.
pub fn write_atomic(path: &Path, contents: &[u8]) -> Result<()> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent)?;
        }
    }

    let file_name = path
        .file_name()
        .ok_or_else(|| Error::InvalidInput(format!("Not a file path: {}", path.display())))?;
    let mut tmp_name = file_name.to_os_string();
    tmp_name.push(".tmp");
    let tmp_path = path.with_file_name(tmp_name);

    std::fs::write(&tmp_path, contents)?;
    if let Err(e) = std::fs::rename(&tmp_path, path) {
        // Best-effort cleanup; the rename error is what matters
        let _ = std::fs::remove_file(&tmp_path);
        return Err(Error::Io(e));
    }
    Ok(())
}
