use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::error::{AppError, Result};

/// Row count above which accumulated headlines are deduplicated and flushed.
pub const DEFAULT_CUTOFF: usize = 16384;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    #[serde(default = "default_cutoff")]
    pub cutoff: usize,

    #[serde(default = "default_show_progress")]
    pub show_progress: bool,
}

fn default_cutoff() -> usize {
    DEFAULT_CUTOFF
}

fn default_show_progress() -> bool {
    true
}

impl Default for Config {
    fn default() -> Self {
        Self {
            cutoff: default_cutoff(),
            show_progress: default_show_progress(),
        }
    }
}

impl Config {
    /// Load from `path` if given, otherwise from the default location when it exists.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let config = match path {
            Some(path) => Self::from_file(path)?,
            None => {
                let default_path = Self::config_path();
                if default_path.exists() {
                    Self::from_file(&default_path)?
                } else {
                    Config::default()
                }
            }
        };
        config.validate()?;
        Ok(config)
    }

    fn from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let config: Config = toml::from_str(&content)?;
        Ok(config)
    }

    /// Apply command line overrides on top of file values.
    pub fn with_overrides(mut self, cutoff: Option<usize>, no_progress: bool) -> Result<Self> {
        if let Some(cutoff) = cutoff {
            self.cutoff = cutoff;
        }
        if no_progress {
            self.show_progress = false;
        }
        self.validate()?;
        Ok(self)
    }

    fn validate(&self) -> Result<()> {
        if self.cutoff == 0 {
            return Err(AppError::Config("cutoff must be at least 1".to_string()));
        }
        Ok(())
    }

    pub fn config_path() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("headline-merge")
            .join("config.toml")
    }
}
