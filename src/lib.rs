//! TikTok Downloader - download TikTok videos and photo posts.
//!
//! This library provides functionality for downloading content from TikTok
//! through the mobile API and a public mirror.
//!
//! # Features
//!
//! - Download posts from a list of share links
//! - Page through a user's feed and download every post
//! - Pluggable request signing (external signer program)
//! - Configurable filenames built from ID, timestamp and description
//! - Rate-limited lookups with cooperative cancellation
//!
//! # Example
//!
//! ```no_run
//! use std::path::Path;
//! use std::sync::Arc;
//! use tiktok_downloader::api::{DeviceIdentityProvider, SignaturePipeline};
//! use tiktok_downloader::download::{DownloadOrchestrator, HttpFileSink, OrchestratorOptions};
//! use tiktok_downloader::{Config, TikTokApi};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = Config::load(Path::new("config.toml"))?;
//!     let api = TikTokApi::new(
//!         DeviceIdentityProvider::new(config.device_id(), config.install_id()),
//!         SignaturePipeline::unconfigured(),
//!         config.endpoints(),
//!         None,
//!         config.request_timeout(),
//!     )?;
//!
//!     let orchestrator = DownloadOrchestrator::new(
//!         Arc::new(api),
//!         Arc::new(HttpFileSink::new(config.request_timeout(), true)?),
//!         OrchestratorOptions::default(),
//!     );
//!     orchestrator
//!         .run(["https://www.tiktok.com/@someone/video/7300000000000000001"])
//!         .await?;
//!     Ok(())
//! }
//! ```

pub mod api;
pub mod cli;
pub mod config;
pub mod download;
pub mod error;
pub mod fs;
pub mod media;
pub mod output;

// Re-exports for convenience
pub use api::TikTokApi;
pub use config::{Config, DownloadMode};
pub use download::{
    collect_user_feed, DownloadOrchestrator, DownloadQueueItem, DownloadStats, QueueStatus,
};
pub use error::{Error, Result};
pub use media::{CanonicalItem, ItemType};
