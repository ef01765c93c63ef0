use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::data::query::{Query, SortDirection};

pub const DEFAULT_SOURCE_URL: &str = "https://jsonplaceholder.typicode.com/comments/";

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub source: SourceConfig,
    pub view: ViewConfig,
    pub logging: LoggingConfig,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SourceConfig {
    /// Endpoint serving the record batch as a JSON array
    pub url: String,

    /// Request timeout in seconds
    pub timeout_secs: u64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ViewConfig {
    /// Rows per page
    pub page_size: usize,

    /// Column sorted on after every load
    pub default_sort_column: String,

    pub default_sort_direction: SortDirection,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Level used when RUST_LOG is not set: "error", "warn", "info", "debug", "trace"
    pub level: String,

    /// Entries kept in the in-memory log buffer
    pub buffer_size: usize,
}

impl Default for SourceConfig {
    fn default() -> Self {
        Self {
            url: DEFAULT_SOURCE_URL.to_string(),
            timeout_secs: 30,
        }
    }
}

impl Default for ViewConfig {
    fn default() -> Self {
        Self {
            page_size: 50,
            default_sort_column: "id".to_string(),
            default_sort_direction: SortDirection::Ascending,
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            buffer_size: 1000,
        }
    }
}

impl SourceConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs.max(1))
    }
}

impl ViewConfig {
    /// Initial query: default sort, first page, no search or filters
    pub fn initial_query(&self) -> Query {
        Query::new(
            self.page_size,
            self.default_sort_column.as_str(),
            self.default_sort_direction,
        )
    }
}

impl Config {
    /// Load config from the default location
    pub fn load() -> Result<Self> {
        let config_path = Self::get_config_path()?;

        if !config_path.exists() {
            // Create default config if it doesn't exist
            let default_config = Self::default();
            default_config.save()?;
            return Ok(default_config);
        }

        Self::load_from(&config_path)
    }

    /// Load config from an explicit path
    pub fn load_from(path: &Path) -> Result<Self> {
        let contents = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file {}", path.display()))?;
        let config: Config = toml::from_str(&contents)
            .with_context(|| format!("Invalid config file {}", path.display()))?;
        Ok(config)
    }

    /// Save config to the default location
    pub fn save(&self) -> Result<()> {
        let config_path = Self::get_config_path()?;
        self.save_to(&config_path)
    }

    pub fn save_to(&self, path: &Path) -> Result<()> {
        // Ensure parent directory exists
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }

        let contents = toml::to_string_pretty(self)?;
        fs::write(path, contents)
            .with_context(|| format!("Failed to write config file {}", path.display()))?;

        Ok(())
    }

    /// Get the default config file path
    pub fn get_config_path() -> Result<PathBuf> {
        let config_dir = dirs::config_dir()
            .ok_or_else(|| anyhow::anyhow!("Could not determine config directory"))?;

        Ok(config_dir.join("record-grid").join("config.toml"))
    }

    /// Create a default config file with comments
    pub fn create_default_with_comments() -> String {
        r#"# Record Grid Configuration File
# Location: ~/.config/record-grid/config.toml (Linux)
#           ~/Library/Application Support/record-grid/config.toml (macOS)
#           %APPDATA%\record-grid\config.toml (Windows)

[source]
# Endpoint returning the records as a JSON array of
# { "id", "name", "email", "body" } objects
url = "https://jsonplaceholder.typicode.com/comments/"

# Give up on the request after this many seconds
timeout_secs = 30

[view]
# Rows shown per page
page_size = 50

# Sort applied after every load: column field and "ascending" / "descending"
default_sort_column = "id"
default_sort_direction = "ascending"

[logging]
# Used when RUST_LOG is not set: "error", "warn", "info", "debug", "trace"
level = "info"

# Number of recent log entries kept in memory
buffer_size = 1000
"#
        .to_string()
    }
}
