use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::data::{LayerDef, LayerId};
use crate::theme::{Theme, ThemePresets};
use crate::widgets::{WidgetCatalog, WidgetClassDef};

pub mod validator;

pub use validator::{validate_config, ValidationIssue, ValidationResult, ValidationSeverity};

// Embed default configuration
const DEFAULT_CONFIG: &str = include_str!("../defaults/config.toml");

const CONFIG_FILE_NAME: &str = "config.toml";

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub logging: LoggingConfig,
    /// Layers, bottom to top
    #[serde(default = "LayerDef::standard_layers")]
    pub layers: Vec<LayerDef>,
    #[serde(default)]
    pub theme: Theme,
    #[serde(default)]
    pub widgets: WidgetsConfig,
    /// File this config was read from (None for the embedded default)
    #[serde(skip)]
    pub source: Option<PathBuf>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Filter directive used when RUST_LOG is not set
    #[serde(default = "default_log_level")]
    pub level: String,
    /// Log file; stderr when unset. Relative paths are under the config dir.
    #[serde(default)]
    pub file: Option<PathBuf>,
}

fn default_log_level() -> String {
    "info".to_string()
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            file: None,
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct WidgetsConfig {
    /// Simulated storage latency for async class loads
    #[serde(default)]
    pub load_latency_ms: u64,
    #[serde(default)]
    pub classes: Vec<WidgetClassDef>,
}

impl Default for Config {
    fn default() -> Self {
        toml::from_str(DEFAULT_CONFIG).unwrap_or_else(|e| {
            tracing::error!("Embedded default config is invalid: {}", e);
            Self {
                logging: LoggingConfig::default(),
                layers: LayerDef::standard_layers(),
                theme: Theme::default(),
                widgets: WidgetsConfig::default(),
                source: None,
            }
        })
    }
}

impl Config {
    /// Load config: explicit path, then `<config dir>/config.toml`, then the
    /// embedded default
    pub fn load(explicit: Option<&Path>) -> Result<Self> {
        if let Some(path) = explicit {
            return Self::load_from_path(path);
        }
        Self::load_from_dir(&Self::config_dir()?)
    }

    /// Load `config.toml` from `dir`, or the embedded default if there is none
    pub fn load_from_dir(dir: &Path) -> Result<Self> {
        let path = dir.join(CONFIG_FILE_NAME);
        if path.exists() {
            Self::load_from_path(&path)
        } else {
            tracing::debug!("No config at {:?}; using embedded default", path);
            Ok(Self::default())
        }
    }

    pub fn load_from_path(path: &Path) -> Result<Self> {
        let contents =
            fs::read_to_string(path).context(format!("Failed to read config file: {:?}", path))?;
        let mut config: Config = toml::from_str(&contents)
            .context(format!("Failed to parse config file: {:?}", path))?;
        config.source = Some(path.to_path_buf());
        tracing::debug!(
            "Loaded config from {:?}: {} layers, {} widget classes",
            path,
            config.layers.len(),
            config.widgets.classes.len()
        );
        Ok(config)
    }

    /// Get the base layerstack directory (~/.layerstack/)
    /// Can be overridden with LAYERSTACK_DIR environment variable
    pub fn config_dir() -> Result<PathBuf> {
        if let Ok(custom_dir) = std::env::var("LAYERSTACK_DIR") {
            return Ok(PathBuf::from(custom_dir));
        }

        let home = dirs::home_dir().context("Could not find home directory")?;
        Ok(home.join(".layerstack"))
    }

    /// Log file location, if file logging is configured
    pub fn log_file_path(&self) -> Result<Option<PathBuf>> {
        match &self.logging.file {
            None => Ok(None),
            Some(file) if file.is_absolute() => Ok(Some(file.clone())),
            Some(file) => {
                let base = match self.source.as_deref().and_then(Path::parent) {
                    Some(dir) => dir.to_path_buf(),
                    None => Self::config_dir()?,
                };
                Ok(Some(base.join(file)))
            }
        }
    }

    pub fn validate(&self) -> ValidationResult {
        validate_config(self)
    }

    /// Find a declared layer by full tag or short name (`Modal`)
    pub fn find_layer(&self, name: &str) -> Option<&LayerDef> {
        self.layers
            .iter()
            .find(|l| l.id.as_str() == name)
            .or_else(|| self.layers.iter().find(|l| l.id.matches_name(name)))
    }

    pub fn layer_ids(&self) -> Vec<LayerId> {
        self.layers.iter().map(|l| l.id.clone()).collect()
    }

    /// Effective theme: the configured colors over the named preset
    pub fn theme(&self) -> Theme {
        match ThemePresets::get(&self.theme.name) {
            Some(preset) => self.theme.clone().merged_over(&preset),
            None => self.theme.clone(),
        }
    }

    pub fn load_latency(&self) -> Duration {
        Duration::from_millis(self.widgets.load_latency_ms)
    }

    /// Widget catalog built from `[[widgets.classes]]`
    pub fn catalog(&self) -> WidgetCatalog {
        WidgetCatalog::from_defs(self.widgets.classes.iter().cloned())
            .with_load_latency(self.load_latency())
    }
}
