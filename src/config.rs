use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

/// Environment variable that overrides the configured API base URL.
pub const API_URL_ENV: &str = "MOODMATE_API_URL";

/// Main application configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Base URL of the companion service, without a trailing slash
    pub api_url: String,

    /// Per-request timeout
    pub request_timeout_secs: u64,

    /// UI preferences
    pub ui: UiConfig,

    /// Speech playback and dictation
    pub voice: VoiceConfig,

    /// Log output
    pub logging: LoggingConfig,
}

/// UI configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct UiConfig {
    /// Delay between revealed characters of a bot reply
    pub reveal_tick_ms: u64,
    pub show_timestamps: bool,
}

/// Voice configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct VoiceConfig {
    /// Speak bot replies aloud
    pub playback: bool,
    /// Text-to-speech program and leading arguments; the reply is appended
    pub speak_command: Option<Vec<String>>,
    /// Speech-to-text program; its first stdout line is the transcript
    pub dictation_command: Option<Vec<String>>,
    pub language: String,
}

/// Logging configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    pub level: String,
    /// Log file for the interactive UI
    pub file: Option<PathBuf>,
}

impl Default for Config {
    fn default() -> Self {
        Config {
            api_url: "http://localhost:8000/api".to_string(),
            request_timeout_secs: 30,
            ui: UiConfig::default(),
            voice: VoiceConfig::default(),
            logging: LoggingConfig::default(),
        }
    }
}

impl Default for UiConfig {
    fn default() -> Self {
        UiConfig {
            reveal_tick_ms: 30,
            show_timestamps: true,
        }
    }
}

impl Default for VoiceConfig {
    fn default() -> Self {
        VoiceConfig {
            playback: true,
            speak_command: None,
            dictation_command: None,
            language: "en-US".to_string(),
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        LoggingConfig {
            level: "info".to_string(),
            file: None,
        }
    }
}

impl Config {
    /// Home directory for config and logs (`~/.moodmate`)
    pub fn home_dir() -> Result<PathBuf> {
        let home = dirs::home_dir().context("Could not find home directory")?;
        Ok(home.join(".moodmate"))
    }

    /// Default config file location
    pub fn default_path() -> Result<PathBuf> {
        Ok(Self::home_dir()?.join("config.toml"))
    }

    /// Load configuration from the default location, writing defaults on first run
    pub fn load() -> Result<Self> {
        let path = Self::default_path()?;
        if !path.exists() {
            let config = Config::default();
            config.save_to(&path)?;
            return Ok(config.with_env_overrides());
        }
        Self::load_from(&path)
    }

    /// Load configuration from an explicit file
    pub fn load_from(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file {}", path.display()))?;
        let config: Config = toml::from_str(&content)
            .with_context(|| format!("Failed to parse config file {}", path.display()))?;
        Ok(config.with_env_overrides())
    }

    /// Save configuration to a file, creating parent directories
    pub fn save_to(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).context("Failed to create config directory")?;
        }
        let content = self.to_toml()?;
        fs::write(path, content).context("Failed to write config file")?;
        Ok(())
    }

    pub fn to_toml(&self) -> Result<String> {
        toml::to_string_pretty(self).context("Failed to serialize config")
    }

    fn with_env_overrides(mut self) -> Self {
        if let Ok(url) = std::env::var(API_URL_ENV) {
            if !url.trim().is_empty() {
                self.set_api_url(url);
            }
        }
        self
    }

    /// Replace the API base URL, dropping any trailing slash
    pub fn set_api_url(&mut self, url: impl Into<String>) {
        self.api_url = url.into().trim().trim_end_matches('/').to_string();
    }

    pub fn reveal_tick(&self) -> std::time::Duration {
        std::time::Duration::from_millis(self.ui.reveal_tick_ms.max(1))
    }

    pub fn request_timeout(&self) -> std::time::Duration {
        std::time::Duration::from_secs(self.request_timeout_secs.max(1))
    }

    /// Log file for the interactive UI, defaulting under the home directory
    pub fn log_file(&self) -> Result<PathBuf> {
        match &self.logging.file {
            Some(path) => Ok(path.clone()),
            None => Ok(Self::home_dir()?.join("logs").join("moodmate.log")),
        }
    }
}
