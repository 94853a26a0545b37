// Copyright (c) 2025, Jason Jenkins
// SPDX-License-Identifier: BSD-3-Clause

//! Configuration file support.
//!
//! Settings are read from a YAML file. Every field has a default, so a
//! partial file (or none at all) is valid.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Environment variable naming an explicit configuration file.
pub const CONFIG_ENV: &str = "MEMECRAFT_CONFIG";

/// Configuration file looked up in the working directory.
pub const DEFAULT_CONFIG_FILE: &str = "memecraft.yaml";

/// Current configuration file format version.
pub const CONFIG_VERSION: u32 = 1;

/// Log level setting for the application.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    Error,
    Warn,
    #[default]
    Info,
    Debug,
    Trace,
}

impl LogLevel {
    /// Convert to log crate's LevelFilter.
    pub fn to_level_filter(self) -> log::LevelFilter {
        match self {
            LogLevel::Error => log::LevelFilter::Error,
            LogLevel::Warn => log::LevelFilter::Warn,
            LogLevel::Info => log::LevelFilter::Info,
            LogLevel::Debug => log::LevelFilter::Debug,
            LogLevel::Trace => log::LevelFilter::Trace,
        }
    }
}

/// Application configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    /// Version of the configuration file format
    pub version: u32,
    pub log_level: LogLevel,
    pub font: FontSettings,
    pub api: ApiSettings,
    pub network: NetworkSettings,
    pub export: ExportSettings,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            version: CONFIG_VERSION,
            log_level: LogLevel::default(),
            font: FontSettings::default(),
            api: ApiSettings::default(),
            network: NetworkSettings::default(),
            export: ExportSettings::default(),
        }
    }
}

/// Caption typeface.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FontSettings {
    /// TrueType/OpenType file; the bundled face is used when unset.
    pub path: Option<PathBuf>,
    /// Thicken glyphs for a bold look. Turn off for fonts that are already bold.
    pub synthetic_bold: bool,
}

impl Default for FontSettings {
    fn default() -> Self {
        Self {
            path: None,
            synthetic_bold: true,
        }
    }
}

/// Generative model endpoint.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ApiSettings {
    pub endpoint: String,
    /// Environment variable holding the API key.
    pub api_key_env: String,
    pub suggestion_model: String,
    pub edit_model: String,
    pub timeout_secs: u64,
}

impl Default for ApiSettings {
    fn default() -> Self {
        Self {
            endpoint: "https://generativelanguage.googleapis.com/v1beta".to_string(),
            api_key_env: "GEMINI_API_KEY".to_string(),
            suggestion_model: "gemini-2.5-flash".to_string(),
            edit_model: "gemini-2.5-flash-image".to_string(),
            timeout_secs: 90,
        }
    }
}

/// Remote image loading.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct NetworkSettings {
    /// Treat remote images served without `Access-Control-Allow-Origin` as
    /// unreadable: they display, but cannot be exported or re-encoded.
    pub strict_cross_origin: bool,
}

/// Export sink settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ExportSettings {
    /// Suggested name for downloaded images.
    pub file_name: String,
}

impl Default for ExportSettings {
    fn default() -> Self {
        Self {
            file_name: "meme.png".to_string(),
        }
    }
}

impl AppConfig {
    /// Parse configuration from YAML text.
    pub fn from_yaml(yaml: &str) -> Result<Self, ConfigError> {
        let config: AppConfig = serde_yaml::from_str(yaml)?;
        if config.version > CONFIG_VERSION {
            return Err(ConfigError::VersionTooNew {
                file_version: config.version,
                supported_version: CONFIG_VERSION,
            });
        }
        Ok(config)
    }

    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let yaml = std::fs::read_to_string(path)?;
        Self::from_yaml(&yaml)
    }

    /// The file to read: `$MEMECRAFT_CONFIG`, else `memecraft.yaml` if present.
    pub fn locate() -> Option<PathBuf> {
        if let Some(path) = std::env::var_os(CONFIG_ENV) {
            return Some(PathBuf::from(path));
        }
        let local = PathBuf::from(DEFAULT_CONFIG_FILE);
        local.exists().then_some(local)
    }
}

/// Errors that can occur when loading configuration.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// YAML parsing error
    #[error("Failed to parse configuration: {0}")]
    Parse(#[from] serde_yaml::Error),

    /// Configuration version is newer than supported
    #[error("Configuration file version {file_version} is newer than supported version {supported_version}")]
    VersionTooNew {
        file_version: u32,
        supported_version: u32,
    },

    /// I/O error when reading config
    #[error("Failed to read configuration: {0}")]
    Io(#[from] std::io::Error),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_file_gives_defaults() {
        let config = AppConfig::from_yaml("{}").unwrap();
        assert_eq!(config, AppConfig::default());
        assert_eq!(config.export.file_name, "meme.png");
        assert!(config.font.synthetic_bold);
    }

    #[test]
    fn test_partial_sections_keep_other_defaults() {
        let config = AppConfig::from_yaml(
            "log_level: debug\napi:\n  edit_model: custom-image-model\nnetwork:\n  strict_cross_origin: true\n",
        )
        .unwrap();
        assert_eq!(config.log_level, LogLevel::Debug);
        assert_eq!(config.api.edit_model, "custom-image-model");
        assert_eq!(config.api.api_key_env, "GEMINI_API_KEY");
        assert!(config.network.strict_cross_origin);
    }

    #[test]
    fn test_newer_version_rejected() {
        let err = AppConfig::from_yaml("version: 99").unwrap_err();
        assert!(matches!(err, ConfigError::VersionTooNew { file_version: 99, .. }));
    }

    #[test]
    fn test_load_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("memecraft.yaml");
        std::fs::write(
            &path,
            "version: 1\nfont:\n  path: /fonts/Anton-Regular.ttf\n  synthetic_bold: false\nexport:\n  file_name: out.png\n",
        )
        .unwrap();

        let config = AppConfig::from_file(&path).unwrap();
        assert_eq!(config.font.path, Some(PathBuf::from("/fonts/Anton-Regular.ttf")));
        assert!(!config.font.synthetic_bold);
        assert_eq!(config.export.file_name, "out.png");
        assert_eq!(config.api, ApiSettings::default());
    }

    #[test]
    fn test_missing_file_is_io_error() {
        let err = AppConfig::from_file(Path::new("/nonexistent/memecraft.yaml")).unwrap_err();
        assert!(matches!(err, ConfigError::Io(_)));
    }
}
