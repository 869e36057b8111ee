//! Store configuration loader.
//!
//! Reads `vectable.toml` and deserializes it into [`StoreConfig`]. Unlike
//! search defaults, the schema has no fallback, so a missing or malformed
//! file is an error.

use std::ffi::OsString;
use std::path::{Path, PathBuf};

use thiserror::Error;
use vectable_types::config::StoreConfig;

/// Environment variable naming the config file.
pub const CONFIG_ENV: &str = "VECTABLE_CONFIG";

/// File looked up in the working directory when nothing else is given.
pub const DEFAULT_CONFIG_FILE: &str = "vectable.toml";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config file {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse config file {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },
}

/// Pick the config file: explicit path, then `$VECTABLE_CONFIG`, then
/// `./vectable.toml`.
pub fn resolve_config_path(explicit: Option<&Path>) -> PathBuf {
    resolve_with_env(explicit, std::env::var_os(CONFIG_ENV))
}

fn resolve_with_env(explicit: Option<&Path>, env: Option<OsString>) -> PathBuf {
    if let Some(path) = explicit {
        return path.to_path_buf();
    }
    match env {
        Some(value) if !value.is_empty() => PathBuf::from(value),
        _ => PathBuf::from(DEFAULT_CONFIG_FILE),
    }
}

/// Parse a config document.
pub fn parse_config(content: &str, path: &Path) -> Result<StoreConfig, ConfigError> {
    toml::from_str(content).map_err(|source| ConfigError::Parse {
        path: path.to_path_buf(),
        source,
    })
}

/// Read and parse the config file at `path`.
pub async fn load_config(path: &Path) -> Result<StoreConfig, ConfigError> {
    let content = tokio::fs::read_to_string(path)
        .await
        .map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;

    let config = parse_config(&content, path)?;
    tracing::debug!(
        path = %path.display(),
        table = %config.schema.name,
        length = config.vector.length,
        "loaded store config"
    );
    Ok(config)
}
