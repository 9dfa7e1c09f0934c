// TOML config adapter - Configuration management using TOML files

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::{debug, info};

use crate::domain::errors::*;

/// Environment variable pointing at a config file
pub const CONFIG_ENV: &str = "REELVAULT_CONFIG";

/// Config file looked up in the working directory when nothing else is given
pub const DEFAULT_CONFIG_FILE: &str = "reelvault.toml";

const VALID_LOG_LEVELS: [&str; 5] = ["trace", "debug", "info", "warn", "error"];

/// Application configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    /// ffmpeg binary
    pub ffmpeg_path: PathBuf,
    /// ffprobe binary
    pub ffprobe_path: PathBuf,
    /// Root for archive and working directories
    pub staged_path: PathBuf,
    pub log: LogSettings,
    pub encoder: EncoderSettings,
}

/// Logging configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LogSettings {
    pub level: String,
    pub json: bool,
}

/// Compatibility transcode parameters
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EncoderSettings {
    pub video_codec: String,
    pub audio_codec: String,
    /// Constant Rate Factor (0-51)
    pub crf: u8,
    pub preset: String,
    pub pixel_format: String,
    pub container: String,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            ffmpeg_path: PathBuf::from("ffmpeg"),
            ffprobe_path: PathBuf::from("ffprobe"),
            staged_path: PathBuf::from("staged"),
            log: LogSettings::default(),
            encoder: EncoderSettings::default(),
        }
    }
}

impl Default for LogSettings {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            json: false,
        }
    }
}

impl Default for EncoderSettings {
    fn default() -> Self {
        Self {
            video_codec: "libx264".to_string(),
            audio_codec: "aac".to_string(),
            crf: 23,
            preset: "veryfast".to_string(),
            pixel_format: "yuv420p".to_string(),
            container: "mp4".to_string(),
        }
    }
}

impl AppConfig {
    /// Load configuration following precedence: Env > File > Defaults.
    ///
    /// CLI overrides are applied by the caller afterwards. An explicitly named
    /// file must exist; the implicit `reelvault.toml` is optional.
    pub fn load(explicit_path: Option<&Path>) -> Result<Self, DomainError> {
        let mut config = match Self::resolve_config_path(explicit_path)? {
            Some(path) => {
                info!("Loading configuration from: {}", path.display());
                Self::from_file(&path)?
            }
            None => {
                debug!("No config file found, using defaults");
                Self::default()
            }
        };

        config.apply_env_overrides(|key| std::env::var(key).ok())?;
        config.validate()?;
        Ok(config)
    }

    fn resolve_config_path(explicit_path: Option<&Path>) -> Result<Option<PathBuf>, DomainError> {
        if let Some(path) = explicit_path {
            if !path.exists() {
                return Err(DomainError::Config(format!(
                    "Config file does not exist: {}",
                    path.display()
                )));
            }
            return Ok(Some(path.to_path_buf()));
        }

        if let Some(path) = std::env::var_os(CONFIG_ENV) {
            let path = PathBuf::from(path);
            if !path.exists() {
                return Err(DomainError::Config(format!(
                    "{} points at a missing file: {}",
                    CONFIG_ENV,
                    path.display()
                )));
            }
            return Ok(Some(path));
        }

        let default_path = PathBuf::from(DEFAULT_CONFIG_FILE);
        Ok(default_path.exists().then_some(default_path))
    }

    /// Read and parse a TOML file
    pub fn from_file(path: &Path) -> Result<Self, DomainError> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| DomainError::fs("read config file", path, e))?;
        Self::from_toml_str(&content)
    }

    /// Parse TOML content; missing keys fall back to defaults
    pub fn from_toml_str(content: &str) -> Result<Self, DomainError> {
        toml::from_str(content)
            .map_err(|e| DomainError::Config(format!("Failed to parse TOML config: {}", e)))
    }

    /// Serialize to TOML, e.g. to write a starter config
    pub fn to_toml_string(&self) -> Result<String, DomainError> {
        toml::to_string_pretty(self)
            .map_err(|e| DomainError::Config(format!("Failed to serialize config: {}", e)))
    }

    /// Apply `REELVAULT_*` overrides using the given variable lookup
    pub fn apply_env_overrides<F>(&mut self, lookup: F) -> Result<(), DomainError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut env_overrides = 0;

        if let Some(value) = lookup("REELVAULT_FFMPEG") {
            self.ffmpeg_path = PathBuf::from(value);
            env_overrides += 1;
        }
        if let Some(value) = lookup("REELVAULT_FFPROBE") {
            self.ffprobe_path = PathBuf::from(value);
            env_overrides += 1;
        }
        if let Some(value) = lookup("REELVAULT_STAGED_PATH") {
            self.staged_path = PathBuf::from(value);
            env_overrides += 1;
        }
        if let Some(value) = lookup("REELVAULT_LOG_LEVEL") {
            self.log.level = value;
            env_overrides += 1;
        }
        if let Some(value) = lookup("REELVAULT_LOG_JSON") {
            self.log.json = value.parse().map_err(|e| {
                DomainError::Config(format!("Invalid boolean for REELVAULT_LOG_JSON: {}", e))
            })?;
            env_overrides += 1;
        }
        if let Some(value) = lookup("REELVAULT_CRF") {
            self.encoder.crf = value
                .parse()
                .map_err(|e| DomainError::Config(format!("Invalid REELVAULT_CRF value: {}", e)))?;
            env_overrides += 1;
        }
        if let Some(value) = lookup("REELVAULT_PRESET") {
            self.encoder.preset = value;
            env_overrides += 1;
        }

        if env_overrides > 0 {
            debug!("Applied {} environment variable overrides", env_overrides);
        }
        Ok(())
    }

    /// Validate configuration
    pub fn validate(&self) -> Result<(), DomainError> {
        if !VALID_LOG_LEVELS.contains(&self.log.level.to_lowercase().as_str()) {
            return Err(DomainError::Config(format!(
                "Invalid log level: {}. Valid levels: {}",
                self.log.level,
                VALID_LOG_LEVELS.join(", ")
            )));
        }
        if self.encoder.crf > 51 {
            return Err(DomainError::Config("CRF value cannot exceed 51".to_string()));
        }
        if self.encoder.preset.trim().is_empty() {
            return Err(DomainError::Config("Encoder preset cannot be empty".to_string()));
        }
        if self.ffmpeg_path.as_os_str().is_empty() || self.ffprobe_path.as_os_str().is_empty() {
            return Err(DomainError::Config(
                "ffmpeg and ffprobe paths cannot be empty".to_string(),
            ));
        }
        Ok(())
    }
}
