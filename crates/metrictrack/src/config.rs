//! Configuration management for metrictrack.
//!
//! This module provides configuration loading and validation using figment,
//! supporting TOML config files, environment variables, and defaults.

use std::path::PathBuf;

use figment::{
    providers::{Env, Format, Serialized, Toml},
    Figment,
};
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::report::{DEFAULT_MAX_NAME_LEN, DEFAULT_TEMPLATE};
use crate::store::DEFAULT_KEY;
use crate::validate::Schema;
use crate::view::{ViewOptions, DEFAULT_FALLBACK_SECTION};

/// Default configuration file name.
const CONFIG_FILE_NAME: &str = "config.toml";

/// Default data directory name.
const DATA_DIR_NAME: &str = "metrictrack";

/// Default database file name.
const DATABASE_FILE_NAME: &str = "metrics.db";

/// Default templates directory name inside the data directory.
const TEMPLATES_DIR_NAME: &str = "templates";

/// Application configuration.
///
/// Configuration is loaded from (in order of precedence, highest first):
/// 1. Environment variables (prefixed with `METRICTRACK_`)
/// 2. TOML config file at `~/.config/metrictrack/config.toml`
/// 3. Default values
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Storage configuration.
    pub storage: StorageConfig,
    /// Report configuration.
    pub reports: ReportsConfig,
    /// View configuration.
    pub view: ViewConfig,
    /// Import configuration.
    pub import: ImportConfig,
}

/// Storage-related configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StorageConfig {
    /// Path to the database file.
    /// Defaults to `~/.local/share/metrictrack/metrics.db`
    pub database_path: Option<PathBuf>,
    /// Key the collection is stored under.
    pub key: String,
}

/// Report-related configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ReportsConfig {
    /// Directory holding report templates.
    /// Defaults to `~/.local/share/metrictrack/templates`
    pub templates_dir: Option<PathBuf>,
    /// Template used when a record names none.
    pub default_template: String,
    /// Directory generated reports are saved to.
    pub output_dir: PathBuf,
    /// Maximum number of name characters in a report file name.
    pub max_name_len: usize,
}

/// View-related configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ViewConfig {
    /// Group records by section.
    pub grouped: bool,
    /// Known sections in display order. Empty means every tag is shown as
    /// its own group.
    pub sections: Vec<String>,
    /// Title of the bucket for missing or unknown sections.
    pub fallback_section: String,
}

/// Import-related configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ImportConfig {
    /// Check `section` fields of imported records.
    pub require_sections: bool,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            database_path: None, // Will be resolved to default at runtime
            key: DEFAULT_KEY.to_string(),
        }
    }
}

impl Default for ReportsConfig {
    fn default() -> Self {
        Self {
            templates_dir: None,
            default_template: DEFAULT_TEMPLATE.to_string(),
            output_dir: PathBuf::from("."),
            max_name_len: DEFAULT_MAX_NAME_LEN,
        }
    }
}

impl Default for ViewConfig {
    fn default() -> Self {
        Self {
            grouped: true,
            sections: Vec::new(),
            fallback_section: DEFAULT_FALLBACK_SECTION.to_string(),
        }
    }
}

impl Default for ImportConfig {
    fn default() -> Self {
        Self {
            require_sections: true,
        }
    }
}

impl Config {
    /// Load configuration from all sources.
    ///
    /// # Errors
    ///
    /// Returns an error if configuration loading or parsing fails.
    pub fn load() -> Result<Self> {
        Self::load_from(None)
    }

    /// Load configuration with an optional custom config path.
    ///
    /// # Errors
    ///
    /// Returns an error if configuration loading or parsing fails.
    pub fn load_from(config_path: Option<PathBuf>) -> Result<Self> {
        let config_file = config_path.unwrap_or_else(Self::default_config_path);

        let figment = Figment::new()
            .merge(Serialized::defaults(Config::default()))
            .merge(Toml::file(&config_file))
            // Keys contain single underscores, so nesting uses a double one:
            // METRICTRACK_REPORTS__MAX_NAME_LEN=30
            .merge(Env::prefixed("METRICTRACK_").split("__"));

        let config: Config = figment.extract()?;
        config.validate()?;
        Ok(config)
    }

    /// Get the default configuration file path.
    #[must_use]
    pub fn default_config_path() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from(".config"))
            .join(DATA_DIR_NAME)
            .join(CONFIG_FILE_NAME)
    }

    /// Get the default data directory path.
    #[must_use]
    pub fn default_data_dir() -> PathBuf {
        dirs::data_local_dir()
            .unwrap_or_else(|| PathBuf::from(".local/share"))
            .join(DATA_DIR_NAME)
    }

    /// Validate the configuration.
    ///
    /// # Errors
    ///
    /// Returns an error if any configuration values are invalid.
    pub fn validate(&self) -> Result<()> {
        if self.storage.key.trim().is_empty() {
            return Err(Error::ConfigValidation {
                message: "storage.key must not be empty".to_string(),
            });
        }

        if self.reports.max_name_len == 0 {
            return Err(Error::ConfigValidation {
                message: "reports.max_name_len must be greater than 0".to_string(),
            });
        }

        if self.reports.default_template.trim().is_empty() {
            return Err(Error::ConfigValidation {
                message: "reports.default_template must not be empty".to_string(),
            });
        }

        if self.view.fallback_section.trim().is_empty() {
            return Err(Error::ConfigValidation {
                message: "view.fallback_section must not be empty".to_string(),
            });
        }

        if let Some(blank) = self.view.sections.iter().position(|s| s.trim().is_empty()) {
            return Err(Error::ConfigValidation {
                message: format!("view.sections[{blank}] must not be empty"),
            });
        }

        Ok(())
    }

    /// Get the database path, resolving defaults if not set.
    #[must_use]
    pub fn database_path(&self) -> PathBuf {
        self.storage
            .database_path
            .clone()
            .unwrap_or_else(|| Self::default_data_dir().join(DATABASE_FILE_NAME))
    }

    /// Get the templates directory, resolving defaults if not set.
    #[must_use]
    pub fn templates_dir(&self) -> PathBuf {
        self.reports
            .templates_dir
            .clone()
            .unwrap_or_else(|| Self::default_data_dir().join(TEMPLATES_DIR_NAME))
    }

    /// The view derivation options.
    #[must_use]
    pub fn view_options(&self) -> ViewOptions {
        ViewOptions {
            grouped: self.view.grouped,
            sections: self.view.sections.clone(),
            fallback_section: self.view.fallback_section.clone(),
        }
    }

    /// The schema imports are validated against.
    #[must_use]
    pub fn import_schema(&self) -> Schema {
        if self.import.require_sections {
            Schema::Sectioned
        } else {
            Schema::Flat
        }
    }
}
