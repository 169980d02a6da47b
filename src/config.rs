//! Server configuration parsed from environment variables.

use std::num::ParseIntError;
use std::path::PathBuf;

pub const DEFAULT_PORT: u16 = 3000;
pub const DEFAULT_SITE_DIR: &str = "site";
pub const DEFAULT_PKG_DIR: &str = "board/pkg";

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("invalid PORT '{value}': {source}")]
    InvalidPort {
        value: String,
        #[source]
        source: ParseIntError,
    },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServerConfig {
    pub port: u16,
    /// Static page, scripts and styles; served for every unmatched path.
    pub site_dir: PathBuf,
    /// The persisted layout document, re-read on every request.
    pub layout_path: PathBuf,
    pub images_dir: PathBuf,
    /// `wasm-pack` output for the `board` crate.
    pub pkg_dir: PathBuf,
}

impl ServerConfig {
    /// Build typed config from environment variables.
    ///
    /// Optional:
    /// - `PORT`: default 3000
    /// - `SITE_DIR`: default `site`
    /// - `LAYOUT_PATH`: default `<SITE_DIR>/images.json`
    /// - `IMAGES_DIR`: default `<SITE_DIR>/images`
    /// - `PKG_DIR`: default `board/pkg`
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build config from any key lookup; `from_env` passes the process environment.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let port = match non_empty(lookup("PORT")) {
            Some(value) => value
                .trim()
                .parse::<u16>()
                .map_err(|source| ConfigError::InvalidPort { value, source })?,
            None => DEFAULT_PORT,
        };

        let site_dir = non_empty(lookup("SITE_DIR")).map_or_else(|| PathBuf::from(DEFAULT_SITE_DIR), PathBuf::from);
        let layout_path =
            non_empty(lookup("LAYOUT_PATH")).map_or_else(|| site_dir.join("images.json"), PathBuf::from);
        let images_dir = non_empty(lookup("IMAGES_DIR")).map_or_else(|| site_dir.join("images"), PathBuf::from);
        let pkg_dir = non_empty(lookup("PKG_DIR")).map_or_else(|| PathBuf::from(DEFAULT_PKG_DIR), PathBuf::from);

        Ok(Self { port, site_dir, layout_path, images_dir, pkg_dir })
    }
}

fn non_empty(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.trim().is_empty())
}

#[cfg(test)]
#[path = "config_test.rs"]
mod tests;
