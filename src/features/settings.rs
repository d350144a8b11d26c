//! Application settings persistence
//!
//! Handles saving and loading user preferences.

use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Application settings
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Settings {
    /// Analysis gateway location
    #[serde(default)]
    pub backend: BackendSettings,
    /// Network settings
    #[serde(default)]
    pub network: NetworkSettings,
    /// Score animation
    #[serde(default)]
    pub animation: AnimationSettings,
    /// AI question settings
    #[serde(default)]
    pub ai: AiSettings,
}

/// Analysis gateway settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BackendSettings {
    /// Base URL the `/upload`, `/ask-ai` and `/health` paths hang off
    pub base_url: String,
    /// Whole-request timeout in seconds
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

fn default_timeout_secs() -> u64 {
    100
}

/// Score animation settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnimationSettings {
    /// Delay between score increments
    pub tick_ms: u64,
}

impl AnimationSettings {
    pub fn tick(&self) -> Duration {
        Duration::from_millis(self.tick_ms.max(1))
    }
}

/// AI question settings
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AiSettings {
    /// Key sent with questions when the caller supplies none
    #[serde(default)]
    pub api_key: Option<String>,
}

/// Proxy type for network settings
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum ProxyType {
    /// No proxy
    #[default]
    None,
    /// HTTP proxy
    Http,
    /// HTTPS proxy
    Https,
    /// SOCKS5 proxy
    Socks5,
    /// Use system proxy settings
    System,
}

/// Network settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NetworkSettings {
    /// Proxy type
    pub proxy_type: ProxyType,
    /// Proxy host address
    pub proxy_host: String,
    /// Proxy port
    pub proxy_port: u16,
    /// Proxy username (optional)
    pub proxy_username: Option<String>,
    /// Proxy password (optional)
    pub proxy_password: Option<String>,
}

impl NetworkSettings {
    /// Build proxy URL string from settings
    /// Returns None if proxy is disabled or invalid
    pub fn proxy_url(&self) -> Option<String> {
        let scheme = match self.proxy_type {
            ProxyType::None => return None,
            ProxyType::System => {
                return std::env::var("HTTP_PROXY")
                    .or_else(|_| std::env::var("http_proxy"))
                    .or_else(|_| std::env::var("HTTPS_PROXY"))
                    .or_else(|_| std::env::var("https_proxy"))
                    .ok();
            }
            ProxyType::Http => "http",
            ProxyType::Https => "https",
            ProxyType::Socks5 => "socks5",
        };

        if self.proxy_host.is_empty() || self.proxy_port == 0 {
            return None;
        }

        let auth = match (&self.proxy_username, &self.proxy_password) {
            (Some(user), Some(pass)) if !user.is_empty() => format!("{}:{}@", user, pass),
            (Some(user), None) if !user.is_empty() => format!("{}@", user),
            _ => String::new(),
        };

        Some(format!(
            "{}://{}{}:{}",
            scheme, auth, self.proxy_host, self.proxy_port
        ))
    }
}

impl Default for BackendSettings {
    fn default() -> Self {
        Self {
            base_url: "http://127.0.0.1:5000".to_string(),
            timeout_secs: default_timeout_secs(),
        }
    }
}

impl Default for AnimationSettings {
    fn default() -> Self {
        Self { tick_ms: 20 }
    }
}

impl Default for NetworkSettings {
    fn default() -> Self {
        Self {
            proxy_type: ProxyType::None,
            proxy_host: String::new(),
            proxy_port: 0,
            proxy_username: None,
            proxy_password: None,
        }
    }
}

impl Settings {
    /// Get the settings file path
    pub fn file_path() -> Option<PathBuf> {
        directories::ProjectDirs::from("com", "smartviz", "SmartViz")
            .map(|dirs| dirs.config_dir().join("settings.json"))
    }

    /// Load settings from file, or return defaults if not found
    pub fn load() -> Self {
        Self::file_path()
            .and_then(|path| match Self::load_from_file(&path) {
                Ok(settings) => Some(settings),
                Err(SettingsError::Io(_)) => None,
                Err(e) => {
                    tracing::warn!("Ignoring settings at {:?}: {}", path, e);
                    None
                }
            })
            .unwrap_or_default()
    }

    /// Load settings from a specific file
    pub fn load_from_file(path: &Path) -> Result<Self, SettingsError> {
        let content =
            std::fs::read_to_string(path).map_err(|e| SettingsError::Io(e.to_string()))?;
        serde_json::from_str(&content).map_err(|e| SettingsError::Parse(e.to_string()))
    }

    /// Save settings to the default file
    pub fn save(&self) -> Result<(), SettingsError> {
        if let Some(path) = Self::file_path() {
            self.save_to_file(&path)
        } else {
            Err(SettingsError::Io(
                "Could not determine config directory".to_string(),
            ))
        }
    }

    /// Save settings to a specific file
    pub fn save_to_file(&self, path: &Path) -> Result<(), SettingsError> {
        // Ensure parent directory exists
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).map_err(|e| SettingsError::Io(e.to_string()))?;
        }

        let content =
            serde_json::to_string_pretty(self).map_err(|e| SettingsError::Parse(e.to_string()))?;
        std::fs::write(path, content).map_err(|e| SettingsError::Io(e.to_string()))?;
        Ok(())
    }
}

/// Errors that can occur with settings
#[derive(Debug, Clone, thiserror::Error)]
pub enum SettingsError {
    #[error("IO error: {0}")]
    Io(String),
    #[error("Parse error: {0}")]
    Parse(String),
}
