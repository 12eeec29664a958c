//! Canonical item representation.

use chrono::{DateTime, TimeZone, Utc};
use serde::Serialize;

/// Type of post content.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum ItemType {
    Photo,
    Video,
}

impl ItemType {
    /// File extension used for this content type.
    pub fn extension(&self) -> &'static str {
        match self {
            ItemType::Photo => "jpg",
            ItemType::Video => "mp4",
        }
    }
}

/// Engagement counters.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct ItemStats {
    pub likes: u64,
    pub comments: u64,
    pub shares: u64,
    pub views: u64,
    pub collects: u64,
}

/// Video renditions picked for download.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct VideoInfo {
    pub cover_uri: String,
    pub mp4_uri: String,
}

/// Downloadable payload of an item. Exactly one kind per item.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum MediaContent {
    Video(VideoInfo),
    /// Image URLs in display order.
    Photo(Vec<String>),
}

/// A post, independent of the upstream schema it came from.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CanonicalItem {
    pub id: String,
    pub url: String,
    pub description: String,
    /// Creation time in epoch seconds.
    pub created_at: i64,
    pub stats: ItemStats,
    pub content: MediaContent,
    pub music_uri: String,
}

impl CanonicalItem {
    pub fn item_type(&self) -> ItemType {
        match self.content {
            MediaContent::Video(_) => ItemType::Video,
            MediaContent::Photo(_) => ItemType::Photo,
        }
    }

    pub fn video(&self) -> Option<&VideoInfo> {
        match &self.content {
            MediaContent::Video(video) => Some(video),
            MediaContent::Photo(_) => None,
        }
    }

    pub fn images(&self) -> Option<&[String]> {
        match &self.content {
            MediaContent::Photo(images) => Some(images),
            MediaContent::Video(_) => None,
        }
    }

    /// Creation time, if it is a valid timestamp.
    pub fn created_at_utc(&self) -> Option<DateTime<Utc>> {
        Utc.timestamp_opt(self.created_at, 0).single()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn video_item() -> CanonicalItem {
        CanonicalItem {
            id: "1".into(),
            url: String::new(),
            description: String::new(),
            created_at: 1700000000,
            stats: ItemStats::default(),
            content: MediaContent::Video(VideoInfo::default()),
            music_uri: String::new(),
        }
    }

    #[test]
    fn test_item_type_follows_content() {
        let mut item = video_item();
        assert_eq!(item.item_type(), ItemType::Video);
        assert!(item.video().is_some());
        assert!(item.images().is_none());

        item.content = MediaContent::Photo(vec!["a".into()]);
        assert_eq!(item.item_type(), ItemType::Photo);
        assert!(item.video().is_none());
        assert_eq!(item.images().unwrap().len(), 1);
    }

    #[test]
    fn test_created_at_utc() {
        let item = video_item();
        let dt = item.created_at_utc().unwrap();
        assert_eq!(dt.format("%Y-%m-%d").to_string(), "2023-11-14");
    }

    #[test]
    fn test_serialized_type_is_uppercase() {
        assert_eq!(serde_json::to_string(&ItemType::Photo).unwrap(), "\"PHOTO\"");
    }
}
