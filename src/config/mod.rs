//! Configuration module for the tiktok-downloader.
//!
//! This module handles:
//! - Loading configuration from TOML files
//! - CLI argument parsing and merging
//! - Configuration validation

pub mod loader;
pub mod modes;
pub mod validation;

pub use loader::{
    AccountConfig, Config, DeviceConfig, EndpointsConfig, OptionsConfig, SignerConfig,
};
pub use modes::{DownloadMode, FilenameKey};
pub use validation::{parse_item_id, validate_config, validate_username};
