use anyhow::{Context, Result};
use crate::pick::Pick;
use common::ImageMode;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

/// Main configuration structure
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct Config {
    /// Image sources (files, directories or glob patterns) used when none are
    /// given on the command line
    #[serde(default)]
    pub images: Vec<String>,

    #[serde(default)]
    pub general: GeneralSettings,

    #[serde(default)]
    pub display: DisplaySettings,
}

/// General settings
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct GeneralSettings {
    #[serde(default = "default_log_level")]
    pub log_level: String,

    #[serde(default = "default_mode")]
    pub mode: String,

    #[serde(default)]
    pub rotate: bool,

    #[serde(default = "default_color")]
    pub color: String,

    #[serde(default)]
    pub watch: bool,

    /// Which of the `images` to draw
    #[serde(default)]
    pub pick: Pick,
}

impl Default for GeneralSettings {
    fn default() -> Self {
        Self {
            log_level: default_log_level(),
            mode: default_mode(),
            rotate: false,
            color: default_color(),
            watch: false,
            pick: Pick::default(),
        }
    }
}

fn default_log_level() -> String {
    "info".to_string()
}
fn default_mode() -> String {
    "scale".to_string()
}
fn default_color() -> String {
    crate::session::DEFAULT_COLOR.to_string()
}

/// Hex digits of an X colour spec, one to four digits per channel. Eight
/// digits are also taken, the alpha pair being ignored.
fn is_hex_color_spec(digits: &str) -> bool {
    matches!(digits.len(), 3 | 6 | 8 | 9 | 12) && digits.chars().all(|c| c.is_ascii_hexdigit())
}

/// Display settings
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct DisplaySettings {
    /// Use at most this many of the monitors reported by the X server
    #[serde(default)]
    pub monitor_limit: Option<usize>,
}

impl Config {
    /// Load configuration from the default location
    pub fn load() -> Result<Self> {
        let config_path = Self::default_config_path()?;
        Self::load_from_path(&config_path)
    }

    /// Load configuration from a specific path
    pub fn load_from_path(path: &Path) -> Result<Self> {
        if !path.exists() {
            log::debug!(
                "Config file not found at {}, using defaults",
                path.display()
            );
            return Ok(Self::default());
        }

        let contents = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;

        let config: Config = toml::from_str(&contents)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))?;

        log::debug!("Loaded configuration from {}", path.display());
        config.validate()?;

        Ok(config)
    }

    /// Get the default config file path
    pub fn default_config_path() -> Result<PathBuf> {
        let config_dir = dirs::config_dir()
            .context("Failed to get config directory")?
            .join("setwallpaper");

        Ok(config_dir.join("config.toml"))
    }

    /// Validate configuration
    fn validate(&self) -> Result<()> {
        match self.general.log_level.as_str() {
            "trace" | "debug" | "info" | "warn" | "error" => {}
            _ => anyhow::bail!("Invalid log level: {}", self.general.log_level),
        }

        let color = &self.general.color;
        if let Some(digits) = color.strip_prefix('#')
            && !is_hex_color_spec(digits)
        {
            anyhow::bail!("Invalid color: {} (expected #RGB, #RRGGBB or #RRRRGGGGBBBB)", color);
        }

        if self.display.monitor_limit == Some(0) {
            anyhow::bail!("Invalid monitor_limit: must be at least 1");
        }

        Ok(())
    }

    /// Placement mode, falling back to scale for unknown names
    pub fn mode(&self) -> ImageMode {
        match self.general.mode.parse() {
            Ok(mode) => mode,
            Err(_) => {
                log::warn!(
                    "Unknown mode '{}' in config, using {}",
                    self.general.mode,
                    ImageMode::default()
                );
                ImageMode::default()
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert_eq!(config.general.log_level, "info");
        assert_eq!(config.general.color, "#000000");
        assert_eq!(config.mode(), ImageMode::Scale);
        assert!(!config.general.rotate);
        assert!(!config.general.watch);
        assert_eq!(config.general.pick, Pick::All);
        assert!(config.display.monitor_limit.is_none());
        assert!(config.images.is_empty());
    }

    #[test]
    fn test_parse_full_config() {
        let toml = r##"
images = ["~/Pictures/walls/*.png", "/usr/share/backgrounds/default.jpg"]

[general]
log_level = "debug"
mode = "fill"
rotate = true
color = "#1a1a2e"
watch = true
pick = "closest"

[display]
monitor_limit = 8
"##;

        let config: Config = toml::from_str(toml).unwrap();
        assert!(config.validate().is_ok());
        assert_eq!(config.images.len(), 2);
        assert_eq!(config.general.log_level, "debug");
        assert_eq!(config.mode(), ImageMode::Zoom);
        assert!(config.general.rotate);
        assert!(config.general.watch);
        assert_eq!(config.general.color, "#1a1a2e");
        assert_eq!(config.general.pick, Pick::Closest);
        assert_eq!(config.display.monitor_limit, Some(8));
    }

    #[test]
    fn test_partial_config_uses_defaults() {
        let config: Config = toml::from_str("[general]\nrotate = true\n").unwrap();
        assert!(config.general.rotate);
        assert_eq!(config.general.log_level, "info");
        assert_eq!(config.general.mode, "scale");
    }

    #[test]
    fn test_unknown_mode_falls_back_to_scale() {
        let config: Config = toml::from_str("[general]\nmode = \"tile\"\n").unwrap();
        assert!(config.validate().is_ok());
        assert_eq!(config.mode(), ImageMode::Scale);
    }

    #[test]
    fn test_validate_rejects_bad_values() {
        let mut config = Config::default();
        config.general.log_level = "loud".to_string();
        assert!(config.validate().is_err());

        let mut config = Config::default();
        config.general.color = "#12345".to_string();
        assert!(config.validate().is_err());

        config.general.color = "#+1+2+3".to_string();
        assert!(config.validate().is_err());

        // Colour names and short or long hex forms are resolved by the X server
        for color in ["midnight blue", "#fff", "#FFF000AAA", "#ffffffffffff", "#1a1a2e"] {
            config.general.color = color.to_string();
            assert!(config.validate().is_ok(), "{color}");
        }

        let mut config = Config::default();
        config.display.monitor_limit = Some(0);
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_load_from_path() {
        let dir = tempfile::tempdir().unwrap();

        let missing = dir.path().join("missing.toml");
        let config = Config::load_from_path(&missing).unwrap();
        assert_eq!(config.general.log_level, "info");

        let path = dir.path().join("config.toml");
        fs::write(&path, "[general]\ncolor = \"navy\"\n").unwrap();
        let config = Config::load_from_path(&path).unwrap();
        assert_eq!(config.general.color, "navy");

        fs::write(&path, "[general\n").unwrap();
        assert!(Config::load_from_path(&path).is_err());

        fs::write(&path, "[general]\nlog_level = \"chatty\"\n").unwrap();
        assert!(Config::load_from_path(&path).is_err());
    }

    #[test]
    fn test_default_config_path() {
        if let Ok(path) = Config::default_config_path() {
            assert!(path.ends_with("setwallpaper/config.toml"));
        }
    }
}
