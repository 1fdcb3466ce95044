//! TOML configuration file support.
//!
//! Settings for the `encode` command can be kept in a file instead of flags:
//!
//! ```toml
//! # dataobj.toml
//! [encode]
//! page_size_hint = 1048576
//! compression_level = 9
//! max_section_columns = 512
//! max_section_bytes = 67108864
//! ```
//!
//! Flags given on the command line take precedence over the file.

use anyhow::{Context, Result};
use serde::Deserialize;
use std::path::Path;

/// Root configuration structure for dataobj.toml files.
#[derive(Debug, Default, Deserialize)]
pub struct Config {
    /// Encode-specific settings.
    #[serde(default)]
    pub encode: EncodeConfig,
}

/// Configuration for the encode command.
#[derive(Debug, Default, Deserialize)]
pub struct EncodeConfig {
    /// Target page size in bytes.
    pub page_size_hint: Option<usize>,

    /// ZSTD level for label columns (1-22), or 0 to store them uncompressed.
    pub compression_level: Option<i32>,

    /// Maximum number of columns in the streams section.
    pub max_section_columns: Option<usize>,

    /// Maximum number of page bytes in the streams section.
    pub max_section_bytes: Option<usize>,
}

impl Config {
    /// Load configuration from a TOML file.
    pub fn from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;

        Self::from_str(&content)
    }

    /// Parse configuration from a TOML string.
    pub fn from_str(content: &str) -> Result<Self> {
        toml::from_str(content).context("Failed to parse TOML configuration")
    }
}
