//! TikTok API module.
//!
//! This module provides:
//! - HTTP client for the TikTok mobile API and the public mirror
//! - Device identity simulation
//! - Request signing through pluggable signers
//! - API response types

pub mod client;
pub mod device;
pub mod params;
pub mod signer;
pub mod types;

pub use client::{Endpoints, TikTokApi, DEFAULT_TIMEOUT, FEED_PAGE_SIZE};
pub use device::{DeviceIdentity, DeviceIdentityProvider};
pub use params::{ParamValue, RequestParams};
pub use signer::{SignInput, SignaturePipeline, SignatureHeaderSet, Signer, SignerKind};
pub use types::*;
