//! Simulated mobile device identity.
//!
//! A stable device/install pair makes the session look like one physical
//! handset; the per-request fields are regenerated for every call.

use std::time::{SystemTime, UNIX_EPOCH};

use rand::RngCore;
use uuid::Uuid;

use crate::api::params::RequestParams;

/// Default installation device ID.
pub const DEFAULT_DEVICE_ID: &str = "7555746395380368897";

/// Default installation install ID.
pub const DEFAULT_INSTALL_ID: &str = "7580036180676593416";

/// Application ID of the lite client.
pub const APP_ID: i64 = 1340;

/// Version code reported by the simulated client.
const VERSION_CODE: i64 = 410405;

/// Version name reported by the simulated client.
const VERSION_NAME: &str = "41.4.5";

/// User agent of the simulated client.
pub const MOBILE_USER_AGENT: &str = "com.zhiliaoapp.musically.go/420004 (Linux; U; Android 9; en_US; SM-G998B; Build/SP1A.210812.016;tt-ok/3.12.13.44.lite-ul)";

/// One snapshot of the simulated device.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeviceIdentity {
    /// Stable device ID.
    pub device_id: String,
    /// Stable install ID.
    pub install_id: String,
    /// Per-request device token (`cdid`).
    pub session_device_token: String,
    /// Per-request open UDID, 8 random bytes hex-encoded.
    pub open_udid: String,
    /// Request time in seconds.
    pub unix_timestamp: i64,
    /// Request time in milliseconds (`_rticket`).
    pub request_ticket: i64,
}

/// Produces device identities for outgoing requests.
#[derive(Debug, Clone)]
pub struct DeviceIdentityProvider {
    device_id: String,
    install_id: String,
}

impl Default for DeviceIdentityProvider {
    fn default() -> Self {
        Self::new(DEFAULT_DEVICE_ID, DEFAULT_INSTALL_ID)
    }
}

impl DeviceIdentityProvider {
    pub fn new(device_id: impl Into<String>, install_id: impl Into<String>) -> Self {
        Self {
            device_id: device_id.into(),
            install_id: install_id.into(),
        }
    }

    pub fn device_id(&self) -> &str {
        &self.device_id
    }

    pub fn install_id(&self) -> &str {
        &self.install_id
    }

    /// Current identity with fresh ephemeral fields.
    pub fn current(&self) -> DeviceIdentity {
        let now_ms = now_millis();
        DeviceIdentity {
            device_id: self.device_id.clone(),
            install_id: self.install_id.clone(),
            session_device_token: Uuid::new_v4().to_string(),
            open_udid: random_hex(8),
            unix_timestamp: now_ms / 1000,
            request_ticket: now_ms,
        }
    }

    /// Fingerprint parameters for a fresh identity.
    pub fn base_params(&self) -> RequestParams {
        base_params(&self.current())
    }
}

/// Fingerprint parameters that prefix every signed request.
pub fn base_params(identity: &DeviceIdentity) -> RequestParams {
    RequestParams::new()
        .with("_rticket", identity.request_ticket)
        .with("device_id", &identity.device_id)
        .with("ts", identity.unix_timestamp)
        .with("iid", &identity.install_id)
        .with("openudid", &identity.open_udid)
        .with("cdid", &identity.session_device_token)
        .with("manifest_version_code", VERSION_CODE)
        .with("app_language", "en")
        .with("app_type", "normal")
        .with("app_package", "com.zhiliaoapp.musically.go")
        .with("channel", "googleplay")
        .with("device_type", "SM-G998B")
        .with("language", "en")
        .with("host_abi", "x86_64")
        .with("locale", "en")
        .with("resolution", "900*1600")
        .with("update_version_code", VERSION_CODE)
        .with("ac2", "wifi")
        .with("sys_region", "US")
        .with("os_api", 28)
        .with("timezone_name", "Asia/Saigon")
        .with("dpi", 240)
        .with("carrier_region", "VN")
        .with("ac", "wifi")
        .with("os", "android")
        .with("os_version", "9")
        .with("timezone_offset", 25200)
        .with("version_code", VERSION_CODE)
        .with("app_name", "musically_go")
        .with("ab_version", VERSION_NAME)
        .with("version_name", VERSION_NAME)
        .with("device_brand", "samsung")
        .with("op_region", "VN")
        .with("ssmix", "a")
        .with("device_platform", "android")
        .with("build_number", VERSION_NAME)
        .with("region", "US")
        .with("aid", APP_ID)
}

/// Current time in seconds.
pub fn unix_now() -> i64 {
    now_millis() / 1000
}

fn now_millis() -> i64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis() as i64)
        .unwrap_or(0)
}

fn random_hex(len: usize) -> String {
    let mut bytes = vec![0u8; len];
    rand::thread_rng().fill_bytes(&mut bytes);
    bytes.iter().map(|b| format!("{:02x}", b)).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::params::ParamValue;

    #[test]
    fn test_stable_fields_are_constant() {
        let provider = DeviceIdentityProvider::new("111", "222");
        let a = provider.current();
        let b = provider.current();
        assert_eq!(a.device_id, "111");
        assert_eq!(a.install_id, "222");
        assert_eq!(a.device_id, b.device_id);
        assert_eq!(a.install_id, b.install_id);
    }

    #[test]
    fn test_ephemeral_fields_regenerate() {
        let provider = DeviceIdentityProvider::default();
        let a = provider.current();
        let b = provider.current();
        assert_ne!(a.session_device_token, b.session_device_token);
        assert_ne!(a.open_udid, b.open_udid);
    }

    #[test]
    fn test_open_udid_is_16_hex_chars() {
        let identity = DeviceIdentityProvider::default().current();
        assert_eq!(identity.open_udid.len(), 16);
        assert!(identity.open_udid.chars().all(|c| c.is_ascii_hexdigit()));
    }

    #[test]
    fn test_timestamp_matches_ticket() {
        let identity = DeviceIdentityProvider::default().current();
        assert_eq!(identity.unix_timestamp, identity.request_ticket / 1000);
        assert!(identity.unix_timestamp > 1_600_000_000);
    }

    #[test]
    fn test_base_params_order_and_values() {
        let identity = DeviceIdentity {
            device_id: "d".into(),
            install_id: "i".into(),
            session_device_token: "c".into(),
            open_udid: "o".into(),
            unix_timestamp: 1700000000,
            request_ticket: 1700000000123,
        };
        let params = base_params(&identity);
        let keys: Vec<&str> = params.iter().map(|(k, _)| k).take(6).collect();
        assert_eq!(keys, ["_rticket", "device_id", "ts", "iid", "openudid", "cdid"]);
        assert_eq!(params.get("aid"), Some(&ParamValue::Int(APP_ID)));
        assert_eq!(params.get("ts"), Some(&ParamValue::Int(1700000000)));
        assert!(params.serialize().ends_with("&aid=1340"));
    }
}
