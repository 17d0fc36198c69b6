use anyhow::{bail, Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

use crate::conversation::{is_valid_name_format, DEFAULT_NAME_FORMAT};
use crate::events::ConversationRole;
use crate::ui::theme::ThemeKind;

/// Main application configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// chrono format used to name new conversations
    pub name_format: String,

    /// Role attached to submitted input until changed with /role
    pub default_role: ConversationRole,

    /// OpenChat home directory
    #[serde(skip)]
    pub openchat_home: PathBuf,

    /// UI preferences
    pub ui: UiConfig,

    /// Logging preferences
    pub log: LogConfig,
}

/// UI configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct UiConfig {
    pub theme: ThemeKind,
    pub show_timestamps: bool,
}

/// Logging configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LogConfig {
    /// Filter directive, overridden by RUST_LOG
    pub level: String,
    /// Log file used while the terminal UI owns the screen
    pub file: Option<PathBuf>,
}

impl Default for Config {
    fn default() -> Self {
        Config {
            name_format: DEFAULT_NAME_FORMAT.to_string(),
            default_role: ConversationRole::User,
            openchat_home: default_home(),
            ui: UiConfig::default(),
            log: LogConfig::default(),
        }
    }
}

impl Default for UiConfig {
    fn default() -> Self {
        UiConfig {
            theme: ThemeKind::Dark,
            show_timestamps: true,
        }
    }
}

impl Default for LogConfig {
    fn default() -> Self {
        LogConfig {
            level: "info".to_string(),
            file: None,
        }
    }
}

impl Config {
    /// Default location of the config file
    pub fn default_path() -> PathBuf {
        default_home().join("config.toml")
    }

    /// Load configuration from `path`, falling back to defaults when absent
    pub fn load_from(path: &Path) -> Result<Self> {
        let mut config = if path.exists() {
            let content = fs::read_to_string(path)
                .with_context(|| format!("Failed to read config file {}", path.display()))?;
            toml::from_str::<Config>(&content)
                .with_context(|| format!("Failed to parse config file {}", path.display()))?
        } else {
            Config::default()
        };

        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            config.openchat_home = parent.to_path_buf();
        }
        config.validate()?;

        Ok(config)
    }

    /// Save configuration to `path`
    pub fn save_to(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent).context("Failed to create config directory")?;
        }
        let content = toml::to_string_pretty(self).context("Failed to serialize config")?;
        fs::write(path, content).context("Failed to write config file")?;
        Ok(())
    }

    /// Log file the terminal UI writes to
    pub fn log_file(&self) -> PathBuf {
        self.log
            .file
            .clone()
            .unwrap_or_else(|| self.openchat_home.join("openchat.log"))
    }

    fn validate(&self) -> Result<()> {
        if !is_valid_name_format(&self.name_format) {
            bail!("Invalid name_format '{}' in config", self.name_format);
        }
        Ok(())
    }
}

fn default_home() -> PathBuf {
    dirs::home_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(".openchat")
}
