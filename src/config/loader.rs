//! Configuration structures and loading logic.

use crate::api::client::{Endpoints, DEFAULT_TIMEOUT};
use crate::api::device::{DEFAULT_DEVICE_ID, DEFAULT_INSTALL_ID, MOBILE_USER_AGENT};
use crate::config::modes::{DownloadMode, FilenameKey};
use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Main configuration structure.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub account: AccountConfig,

    #[serde(default)]
    pub device: DeviceConfig,

    #[serde(default)]
    pub options: OptionsConfig,

    #[serde(default)]
    pub signer: SignerConfig,

    #[serde(default)]
    pub endpoints: EndpointsConfig,
}

/// Account credentials configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AccountConfig {
    /// Session cookie sent with signed requests. May be empty.
    #[serde(default)]
    pub cookie: String,

    /// Mobile client user agent string.
    #[serde(default = "default_user_agent")]
    pub user_agent: String,
}

/// Simulated device identifiers.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DeviceConfig {
    pub device_id: Option<String>,
    pub install_id: Option<String>,
}

/// Download options configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OptionsConfig {
    /// Download mode (links, user).
    #[serde(default)]
    pub download_mode: DownloadMode,

    /// Base directory for downloads.
    #[serde(default)]
    pub download_directory: Option<PathBuf>,

    /// Ordered filename components.
    #[serde(default = "FilenameKey::default_format")]
    pub filename_format: Vec<FilenameKey>,

    /// Minimum spacing between upstream API requests.
    #[serde(default = "default_request_delay_ms")]
    pub request_delay_ms: u64,

    /// Per-request timeout.
    #[serde(default = "default_request_timeout_secs")]
    pub request_timeout_secs: u64,

    /// Maximum number of feed items to collect in user mode. 0 means no limit.
    #[serde(default)]
    pub feed_limit: usize,

    /// Whether to show per-file download messages.
    #[serde(default = "default_true")]
    pub show_downloads: bool,
}

impl Default for OptionsConfig {
    fn default() -> Self {
        Self {
            download_mode: DownloadMode::default(),
            download_directory: None,
            filename_format: FilenameKey::default_format(),
            request_delay_ms: default_request_delay_ms(),
            request_timeout_secs: default_request_timeout_secs(),
            feed_limit: 0,
            show_downloads: true,
        }
    }
}

/// External signer configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SignerConfig {
    /// Program invoked as `<command> gorgon|ladon|argus`.
    pub command: Option<PathBuf>,
}

/// Optional endpoint overrides.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct EndpointsConfig {
    pub search_user: Option<String>,
    pub user_profile: Option<String>,
    pub user_feed: Option<String>,
    pub item_details: Option<String>,
}

fn default_user_agent() -> String {
    MOBILE_USER_AGENT.to_string()
}

fn default_true() -> bool {
    true
}

fn default_request_delay_ms() -> u64 {
    1000
}

fn default_request_timeout_secs() -> u64 {
    DEFAULT_TIMEOUT.as_secs()
}

impl Config {
    /// Load configuration from a TOML file.
    pub fn load(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path).map_err(|e| {
            if e.kind() == std::io::ErrorKind::NotFound {
                Error::Config(format!(
                    "Configuration file not found: {}. Create one from config.example.toml",
                    path.display()
                ))
            } else {
                Error::Io(e)
            }
        })?;

        let config: Config = toml::from_str(&content)?;
        Ok(config)
    }

    /// Load configuration, falling back to defaults when the file is absent.
    pub fn load_or_default(path: &Path) -> Result<Self> {
        if !path.exists() {
            tracing::warn!(
                "Configuration file {} not found, using defaults",
                path.display()
            );
            return Ok(Self::default());
        }
        Self::load(path)
    }

    /// Save configuration to a TOML file.
    pub fn save(&self, path: &Path) -> Result<()> {
        let content = toml::to_string_pretty(self)
            .map_err(|e| Error::Config(format!("Failed to serialize config: {}", e)))?;
        fs::write(path, content)?;
        Ok(())
    }

    /// Cookie to send, if one is configured.
    pub fn cookie(&self) -> Option<&str> {
        Some(self.account.cookie.as_str()).filter(|c| !c.is_empty())
    }

    pub fn device_id(&self) -> &str {
        self.device.device_id.as_deref().unwrap_or(DEFAULT_DEVICE_ID)
    }

    pub fn install_id(&self) -> &str {
        self.device.install_id.as_deref().unwrap_or(DEFAULT_INSTALL_ID)
    }

    /// Fill in missing device identifiers and save to file if path provided.
    ///
    /// Returns whether anything changed.
    pub fn ensure_device(&mut self, path: Option<&Path>) -> Result<bool> {
        if self.device.device_id.is_some() && self.device.install_id.is_some() {
            return Ok(false);
        }

        self.device.device_id = Some(self.device_id().to_string());
        self.device.install_id = Some(self.install_id().to_string());

        if let Some(path) = path {
            self.save(path)?;
        }

        Ok(true)
    }

    pub fn request_delay(&self) -> Duration {
        Duration::from_millis(self.options.request_delay_ms)
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.options.request_timeout_secs)
    }

    /// Item limit for feed collection, if any.
    pub fn feed_limit(&self) -> Option<usize> {
        Some(self.options.feed_limit).filter(|&n| n > 0)
    }

    /// Production endpoints with configured overrides applied.
    pub fn endpoints(&self) -> Endpoints {
        let defaults = Endpoints::default();
        let pick = |value: &Option<String>, default: String| {
            value.clone().filter(|v| !v.is_empty()).unwrap_or(default)
        };

        Endpoints {
            search_user: pick(&self.endpoints.search_user, defaults.search_user),
            user_profile: pick(&self.endpoints.user_profile, defaults.user_profile),
            user_feed: pick(&self.endpoints.user_feed, defaults.user_feed),
            item_details: pick(&self.endpoints.item_details, defaults.item_details),
        }
    }
}

impl Default for AccountConfig {
    fn default() -> Self {
        Self {
            cookie: String::new(),
            user_agent: default_user_agent(),
        }
    }
}
