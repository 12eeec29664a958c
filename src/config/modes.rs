//! Download mode and filename format definitions.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Available download modes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DownloadMode {
    /// Download the posts behind a list of share links (default).
    #[default]
    Links,
    /// Page through a user's feed and download every post.
    User,
}

impl fmt::Display for DownloadMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DownloadMode::Links => write!(f, "links"),
            DownloadMode::User => write!(f, "user"),
        }
    }
}

impl FromStr for DownloadMode {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "links" => Ok(DownloadMode::Links),
            "user" => Ok(DownloadMode::User),
            _ => Err(format!("Unknown download mode: {}", s)),
        }
    }
}

/// A component of the generated filename.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FilenameKey {
    Id,
    Timestamp,
    Description,
}

impl FilenameKey {
    /// The default filename layout: the item ID alone.
    pub fn default_format() -> Vec<FilenameKey> {
        vec![FilenameKey::Id]
    }
}

impl fmt::Display for FilenameKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FilenameKey::Id => write!(f, "id"),
            FilenameKey::Timestamp => write!(f, "timestamp"),
            FilenameKey::Description => write!(f, "description"),
        }
    }
}

impl FromStr for FilenameKey {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "id" => Ok(FilenameKey::Id),
            "timestamp" => Ok(FilenameKey::Timestamp),
            "description" | "desc" => Ok(FilenameKey::Description),
            _ => Err(format!("Unknown filename key: {}", s)),
        }
    }
}
