use anyhow::{Context, Result};
use serde::Deserialize;
use std::path::{Path, PathBuf};
use tracing::info;

#[derive(Debug, Deserialize, Clone, Default)]
#[serde(default)]
pub struct LinemarkConfig {
    pub logging: LoggingConfig,
    pub storage: StorageConfig,
    pub display: DisplayConfig,
    pub autosave: AutosaveConfig,
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct LoggingConfig {
    pub level: String,
}

#[derive(Debug, Deserialize, Clone, Default)]
#[serde(default)]
pub struct StorageConfig {
    /// Custom bookmark directory. `None` means the platform data dir.
    pub data_dir: Option<String>,
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct DisplayConfig {
    pub sign_text: String,
    pub sign_hl: String,
    pub annotation_prefix: String,
    pub annotation_hl: String,
    pub show_annotations: bool,
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct AutosaveConfig {
    pub enabled: bool,
    pub delay_ms: u64,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".into(),
        }
    }
}

impl Default for DisplayConfig {
    fn default() -> Self {
        Self {
            sign_text: "⚑".into(),
            sign_hl: "LinemarkSign".into(),
            annotation_prefix: "  ▸ ".into(),
            annotation_hl: "LinemarkAnnotation".into(),
            show_annotations: true,
        }
    }
}

impl Default for AutosaveConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            delay_ms: 500,
        }
    }
}

/// Returns the platform data directory for bookmarks, e.g. `~/.local/share/linemark/`.
pub fn default_data_dir() -> PathBuf {
    dirs::data_dir()
        .or_else(dirs::home_dir)
        .unwrap_or_else(|| PathBuf::from("."))
        .join("linemark")
}

/// Returns the default config file path: `~/.config/linemark/config.toml`
pub fn default_config_path() -> PathBuf {
    dirs::config_dir()
        .or_else(dirs::home_dir)
        .unwrap_or_else(|| PathBuf::from("."))
        .join("linemark")
        .join("config.toml")
}

impl LinemarkConfig {
    /// Load config from TOML file (if it exists) then apply env var overrides.
    pub fn load() -> Result<Self> {
        Self::load_from(default_config_path())
    }

    /// Load from a specific path, then apply env var overrides.
    pub fn load_from(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let mut config = if path.exists() {
            let contents =
                std::fs::read_to_string(path).context("failed to read config file")?;
            toml::from_str(&contents).context("failed to parse config TOML")?
        } else {
            info!("no config file at {}, using defaults", path.display());
            LinemarkConfig::default()
        };

        config.apply_env_overrides();
        Ok(config)
    }

    /// Apply environment variable overrides (LINEMARK_DATA_DIR, LINEMARK_LOG_LEVEL).
    fn apply_env_overrides(&mut self) {
        if let Ok(val) = std::env::var("LINEMARK_DATA_DIR") {
            self.storage.data_dir = Some(val);
        }
        if let Ok(val) = std::env::var("LINEMARK_LOG_LEVEL") {
            self.logging.level = val;
        }
    }
}

/// Expand a leading `~` to the home directory.
pub fn expand_tilde(path: &str) -> PathBuf {
    let home = || dirs::home_dir().unwrap_or_else(|| PathBuf::from("."));
    if path == "~" {
        home()
    } else if let Some(rest) = path.strip_prefix("~/") {
        home().join(rest)
    } else {
        PathBuf::from(path)
    }
}

/// Expand `~` and guarantee a trailing separator, as expected for a data directory.
pub fn normalize_data_dir(path: &str) -> String {
    let mut dir = expand_tilde(path).to_string_lossy().into_owned();
    if !dir.ends_with(std::path::MAIN_SEPARATOR) {
        dir.push(std::path::MAIN_SEPARATOR);
    }
    dir
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_is_valid() {
        let config = LinemarkConfig::default();
        assert_eq!(config.logging.level, "info");
        assert!(config.storage.data_dir.is_none());
        assert!(config.display.show_annotations);
        assert!(config.autosave.enabled);
        assert_eq!(config.autosave.delay_ms, 500);
        assert!(default_data_dir().ends_with("linemark"));
    }

    #[test]
    fn parse_toml_config() {
        let toml_str = r#"
[logging]
level = "debug"

[storage]
data_dir = "/tmp/marks"

[display]
annotation_prefix = " >> "
"#;
        let config: LinemarkConfig = toml::from_str(toml_str).unwrap();
        assert_eq!(config.logging.level, "debug");
        assert_eq!(config.storage.data_dir.as_deref(), Some("/tmp/marks"));
        assert_eq!(config.display.annotation_prefix, " >> ");
        // defaults still apply for unset fields
        assert_eq!(config.display.sign_text, "⚑");
        assert_eq!(config.autosave.delay_ms, 500);
    }

    #[test]
    fn env_overrides_apply() {
        let mut config = LinemarkConfig::default();
        std::env::set_var("LINEMARK_DATA_DIR", "/tmp/override");
        std::env::set_var("LINEMARK_LOG_LEVEL", "trace");

        config.apply_env_overrides();

        assert_eq!(config.storage.data_dir.as_deref(), Some("/tmp/override"));
        assert_eq!(config.logging.level, "trace");

        std::env::remove_var("LINEMARK_DATA_DIR");
        std::env::remove_var("LINEMARK_LOG_LEVEL");
    }

    #[test]
    fn data_dir_gets_trailing_separator() {
        let sep = std::path::MAIN_SEPARATOR;
        assert_eq!(normalize_data_dir("/tmp/marks"), format!("/tmp/marks{sep}"));
        assert_eq!(normalize_data_dir("/tmp/marks/"), "/tmp/marks/");
    }

    #[test]
    fn tilde_expands_to_home() {
        let Some(home) = dirs::home_dir() else {
            return;
        };
        assert_eq!(expand_tilde("~/marks"), home.join("marks"));
        assert!(normalize_data_dir("~/marks").starts_with(&*home.to_string_lossy()));
    }
}
