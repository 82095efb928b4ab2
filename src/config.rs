use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::convert::ExposureTriple;

/// Top-level configuration for the exposure-equiv CLI.
///
/// Controls the preset catalog, the default conversion target, and output behavior.
///
/// # Loading
///
/// ```rust,no_run
/// use exposure_equiv::config::Config;
/// use exposure_equiv::convert::ExposureTriple;
///
/// // From a JSON file
/// let config = Config::load(Some("config.json".as_ref())).unwrap();
///
/// // Or use defaults and customize
/// let mut config = Config::default();
/// config.default_target = ExposureTriple::new(5.6, "1/60", 400u32);
/// config.fallback_dimensions = Some((4032, 3024));
/// ```
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Path to a camera/lens preset catalog (JSON).
    #[serde(default)]
    pub catalog_path: Option<String>,
    /// Target used when no target flags are given on the command line.
    pub default_target: ExposureTriple,
    /// Image size to report when an image's metadata cannot be decoded.
    #[serde(default)]
    pub fallback_dimensions: Option<(u32, u32)>,
    /// Output behavior.
    #[serde(default)]
    pub output: OutputConfig,
}

/// Output configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct OutputConfig {
    /// If `true`, print results as JSON instead of log lines.
    pub json: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            catalog_path: None,
            default_target: ExposureTriple::new(8.0, "1/125", 100u32),
            fallback_dimensions: None,
            output: OutputConfig::default(),
        }
    }
}

impl Config {
    /// Resolve the config file path — same directory as the executable.
    pub fn config_path() -> Result<PathBuf> {
        let exe_path = std::env::current_exe().context("Failed to get executable path")?;
        let exe_dir = exe_path
            .parent()
            .context("Failed to get executable directory")?;
        Ok(exe_dir.join("config.json"))
    }

    /// Load config from the given path, or from the default location.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let config_path = match path {
            Some(p) => p.to_path_buf(),
            None => Self::config_path()?,
        };

        if !config_path.exists() {
            log::warn!(
                "Config file not found at {}. Using defaults.",
                config_path.display()
            );
            return Ok(Self::default());
        }

        let contents =
            std::fs::read_to_string(&config_path).context("Failed to read config file")?;
        let config: Config =
            serde_json::from_str(&contents).context("Failed to parse config file")?;
        Ok(config)
    }

    /// Save config to the given path, or to the default location.
    pub fn save(&self, path: Option<&Path>) -> Result<()> {
        let config_path = match path {
            Some(p) => p.to_path_buf(),
            None => Self::config_path()?,
        };

        let contents = serde_json::to_string_pretty(self).context("Failed to serialize config")?;
        std::fs::write(&config_path, contents).context("Failed to write config file")?;
        log::info!("Config saved to {}", config_path.display());
        Ok(())
    }
}
