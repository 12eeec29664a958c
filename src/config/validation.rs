//! Configuration validation logic.

use std::sync::OnceLock;

use crate::config::loader::Config;
use crate::config::modes::{DownloadMode, FilenameKey};
use crate::error::{Error, Result};
use regex::Regex;

/// Minimum username length.
const MIN_USERNAME_LENGTH: usize = 2;

/// Maximum username length.
const MAX_USERNAME_LENGTH: usize = 24;

/// Upper bound for the spacing between API requests.
const MAX_REQUEST_DELAY_MS: u64 = 60_000;

/// Bounds for the per-request timeout.
const MIN_TIMEOUT_SECS: u64 = 1;
const MAX_TIMEOUT_SECS: u64 = 600;

fn item_id_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| Regex::new(r"(?:video|photo)/(\d+)").expect("valid regex"))
}

fn username_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| Regex::new(r"^[A-Za-z0-9_.]+$").expect("valid regex"))
}

/// Validate the entire configuration for the given mode.
pub fn validate_config(config: &Config, mode: DownloadMode) -> Result<()> {
    validate_filename_format(&config.options.filename_format)?;
    validate_request_delay(config.options.request_delay_ms)?;
    validate_request_timeout(config.options.request_timeout_secs)?;

    // Only the mobile API endpoints are signed; user mode depends on them.
    if mode == DownloadMode::User && config.signer.command.is_none() {
        return Err(Error::MissingConfig(
            "signer.command (required to sign user lookups and feed requests)".to_string(),
        ));
    }

    if let Some(command) = &config.signer.command {
        if command.as_os_str().is_empty() {
            return Err(Error::ConfigValidation {
                field: "signer.command".to_string(),
                message: "Signer command cannot be empty".to_string(),
            });
        }
    }

    Ok(())
}

/// Validate the filename format keys.
pub fn validate_filename_format(keys: &[FilenameKey]) -> Result<()> {
    for (i, key) in keys.iter().enumerate() {
        if keys[..i].contains(key) {
            return Err(Error::ConfigValidation {
                field: "filename_format".to_string(),
                message: format!("Filename key '{}' appears more than once", key),
            });
        }
    }
    Ok(())
}

pub fn validate_request_delay(delay_ms: u64) -> Result<()> {
    if delay_ms > MAX_REQUEST_DELAY_MS {
        return Err(Error::ConfigValidation {
            field: "request_delay_ms".to_string(),
            message: format!(
                "Request delay must be at most {} ms (got {})",
                MAX_REQUEST_DELAY_MS, delay_ms
            ),
        });
    }
    Ok(())
}

pub fn validate_request_timeout(timeout_secs: u64) -> Result<()> {
    if !(MIN_TIMEOUT_SECS..=MAX_TIMEOUT_SECS).contains(&timeout_secs) {
        return Err(Error::ConfigValidation {
            field: "request_timeout_secs".to_string(),
            message: format!(
                "Request timeout must be between {} and {} seconds (got {})",
                MIN_TIMEOUT_SECS, MAX_TIMEOUT_SECS, timeout_secs
            ),
        });
    }
    Ok(())
}

/// Validate a username and return it without a leading `@`.
pub fn validate_username(username: &str) -> Result<String> {
    let clean_username = username.trim().trim_start_matches('@');

    if clean_username.len() < MIN_USERNAME_LENGTH {
        return Err(Error::ConfigValidation {
            field: "user".to_string(),
            message: format!(
                "Username '{}' is too short (minimum {} characters)",
                username, MIN_USERNAME_LENGTH
            ),
        });
    }

    if clean_username.len() > MAX_USERNAME_LENGTH {
        return Err(Error::ConfigValidation {
            field: "user".to_string(),
            message: format!(
                "Username '{}' is too long (maximum {} characters)",
                username, MAX_USERNAME_LENGTH
            ),
        });
    }

    if !username_pattern().is_match(clean_username) {
        return Err(Error::ConfigValidation {
            field: "user".to_string(),
            message: format!(
                "Username '{}' contains invalid characters. Only letters, digits, underscores and periods allowed.",
                username
            ),
        });
    }

    Ok(clean_username.to_string())
}

/// Extract the numeric item ID from a share URL.
pub fn parse_item_id(input: &str) -> Option<String> {
    item_id_pattern()
        .captures(input)
        .and_then(|captures| captures.get(1))
        .map(|id| id.as_str().to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    #[test]
    fn test_parse_item_id() {
        assert_eq!(
            parse_item_id("https://www.tiktok.com/@someone/video/7300000000000000001?lang=en")
                .as_deref(),
            Some("7300000000000000001")
        );
        assert_eq!(
            parse_item_id("https://www.tiktok.com/@someone/photo/42").as_deref(),
            Some("42")
        );
        assert!(parse_item_id("https://vm.tiktok.com/ZMabcdef/").is_none());
        assert!(parse_item_id("").is_none());
    }

    #[test]
    fn test_valid_username() {
        assert_eq!(validate_username("@some.one_1").unwrap(), "some.one_1");
        assert_eq!(validate_username("  abc ").unwrap(), "abc");
    }

    #[test]
    fn test_invalid_username() {
        assert!(validate_username("a").is_err());
        assert!(validate_username("has space").is_err());
        assert!(validate_username("x".repeat(25).as_str()).is_err());
    }

    #[test]
    fn test_duplicate_filename_keys() {
        assert!(validate_filename_format(&[FilenameKey::Id, FilenameKey::Timestamp]).is_ok());
        assert!(validate_filename_format(&[]).is_ok());
        assert!(validate_filename_format(&[FilenameKey::Id, FilenameKey::Id]).is_err());
    }

    #[test]
    fn test_bounds() {
        assert!(validate_request_delay(0).is_ok());
        assert!(validate_request_delay(MAX_REQUEST_DELAY_MS + 1).is_err());
        assert!(validate_request_timeout(0).is_err());
        assert!(validate_request_timeout(30).is_ok());
    }

    #[test]
    fn test_user_mode_requires_signer() {
        let mut config = Config::default();
        assert!(validate_config(&config, DownloadMode::Links).is_ok());
        assert!(matches!(
            validate_config(&config, DownloadMode::User),
            Err(Error::MissingConfig(_))
        ));

        config.signer.command = Some(PathBuf::from("/usr/local/bin/tt-signer"));
        assert!(validate_config(&config, DownloadMode::User).is_ok());
    }
}
