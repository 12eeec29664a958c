//! Normalization of raw upstream items.
//!
//! Both upstream schemas map onto [`CanonicalItem`]. Missing fields become
//! empty strings, zero counters or empty lists so that schema drift degrades
//! output instead of failing it.

use serde_json::Value;

use crate::api::types::RawItem;
use crate::media::item::{CanonicalItem, ItemStats, MediaContent, VideoInfo};

/// One video rendition candidate.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Rendition {
    pub width: u64,
    pub height: u64,
    pub url_list: Vec<String>,
}

impl Rendition {
    /// Read a `bit_rate` entry (`play_addr.{width,height,url_list}`).
    pub fn from_bit_rate(entry: &Value) -> Self {
        Self {
            width: u64_at(entry, "/play_addr/width"),
            height: u64_at(entry, "/play_addr/height"),
            url_list: strings_at(entry, "/play_addr/url_list"),
        }
    }

    pub fn resolution(&self) -> u64 {
        self.width.saturating_mul(self.height)
    }

    /// Preferred URL of this rendition (the last candidate).
    pub fn url(&self) -> Option<&str> {
        self.url_list.last().map(String::as_str)
    }
}

/// Select the rendition with the largest `width * height`.
///
/// Ties keep the earlier rendition, so a list with no usable dimensions
/// yields its first element.
pub fn select_best_rendition(renditions: &[Rendition]) -> Option<&Rendition> {
    let mut iter = renditions.iter();
    let mut best = iter.next()?;
    for candidate in iter {
        if candidate.resolution() > best.resolution() {
            best = candidate;
        }
    }
    Some(best)
}

/// Normalize a raw item of either schema.
pub fn normalize(raw: &RawItem) -> CanonicalItem {
    match raw {
        RawItem::Internal(item) => normalize_internal(item),
        RawItem::Mirror { data, url } => normalize_mirror(data, url),
    }
}

fn normalize_internal(item: &Value) -> CanonicalItem {
    let content = if is_present(item, "/image_post_info") {
        let images = item
            .pointer("/image_post_info/images")
            .and_then(Value::as_array)
            .map(|images| {
                images
                    .iter()
                    .map(|img| str_at(img, "/display_image/url_list/0"))
                    .collect()
            })
            .unwrap_or_default();
        MediaContent::Photo(images)
    } else {
        let renditions: Vec<Rendition> = item
            .pointer("/video/bit_rate")
            .and_then(Value::as_array)
            .map(|list| list.iter().map(Rendition::from_bit_rate).collect())
            .unwrap_or_default();
        let mp4_uri = select_best_rendition(&renditions)
            .and_then(Rendition::url)
            .unwrap_or_default()
            .to_string();
        MediaContent::Video(VideoInfo {
            cover_uri: str_at(item, "/video/origin_cover/url_list/0"),
            mp4_uri,
        })
    };

    CanonicalItem {
        id: str_at(item, "/aweme_id"),
        url: str_at(item, "/share_url"),
        description: str_at(item, "/desc"),
        created_at: i64_at(item, "/create_time"),
        stats: ItemStats {
            likes: u64_at(item, "/statistics/digg_count"),
            comments: u64_at(item, "/statistics/comment_count"),
            shares: u64_at(item, "/statistics/share_count"),
            views: u64_at(item, "/statistics/play_count"),
            collects: u64_at(item, "/statistics/collect_count"),
        },
        content,
        music_uri: str_at(item, "/music/play_url/url_list/0"),
    }
}

fn normalize_mirror(data: &Value, url: &str) -> CanonicalItem {
    let content = if is_present(data, "/images") {
        MediaContent::Photo(strings_at(data, "/images"))
    } else {
        MediaContent::Video(VideoInfo {
            cover_uri: first_non_empty(data, &["/cover", "/origin_cover"]),
            mp4_uri: first_non_empty(data, &["/hdplay", "/play"]),
        })
    };

    CanonicalItem {
        id: str_at(data, "/id"),
        url: url.to_string(),
        description: str_at(data, "/title"),
        created_at: i64_at(data, "/create_time"),
        stats: ItemStats {
            likes: u64_at(data, "/digg_count"),
            comments: u64_at(data, "/comment_count"),
            shares: u64_at(data, "/share_count"),
            views: u64_at(data, "/play_count"),
            collects: u64_at(data, "/collect_count"),
        },
        content,
        music_uri: first_non_empty(data, &["/music", "/music_info/play"]),
    }
}

fn is_present(value: &Value, pointer: &str) -> bool {
    value.pointer(pointer).is_some_and(|v| !v.is_null())
}

fn str_at(value: &Value, pointer: &str) -> String {
    match value.pointer(pointer) {
        Some(Value::String(s)) => s.clone(),
        Some(Value::Number(n)) => n.to_string(),
        _ => String::new(),
    }
}

fn first_non_empty(value: &Value, pointers: &[&str]) -> String {
    pointers
        .iter()
        .map(|p| str_at(value, p))
        .find(|s| !s.is_empty())
        .unwrap_or_default()
}

fn strings_at(value: &Value, pointer: &str) -> Vec<String> {
    value
        .pointer(pointer)
        .and_then(Value::as_array)
        .map(|list| {
            list.iter()
                .filter_map(|v| v.as_str().map(str::to_string))
                .collect()
        })
        .unwrap_or_default()
}

fn u64_at(value: &Value, pointer: &str) -> u64 {
    match value.pointer(pointer) {
        Some(Value::Number(n)) => n.as_u64().unwrap_or(0),
        Some(Value::String(s)) => s.parse().unwrap_or(0),
        _ => 0,
    }
}

fn i64_at(value: &Value, pointer: &str) -> i64 {
    match value.pointer(pointer) {
        Some(Value::Number(n)) => n.as_i64().unwrap_or(0),
        Some(Value::String(s)) => s.parse().unwrap_or(0),
        _ => 0,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::media::item::ItemType;
    use serde_json::json;

    fn rendition(width: u64, height: u64, url: &str) -> Rendition {
        Rendition {
            width,
            height,
            url_list: vec![format!("{}-a", url), url.to_string()],
        }
    }

    #[test]
    fn test_best_rendition_maximizes_area() {
        let list = vec![
            rendition(540, 960, "sd"),
            rendition(1080, 1920, "fhd"),
            rendition(720, 1280, "hd"),
        ];
        assert_eq!(select_best_rendition(&list).unwrap().url(), Some("fhd"));
    }

    #[test]
    fn test_best_rendition_tie_keeps_first() {
        let list = vec![
            rendition(720, 1280, "first"),
            rendition(1280, 720, "second"),
            rendition(360, 640, "small"),
        ];
        assert_eq!(select_best_rendition(&list).unwrap().url(), Some("first"));
    }

    #[test]
    fn test_best_rendition_all_zero_returns_first() {
        let list = vec![rendition(0, 0, "a"), rendition(0, 0, "b"), rendition(0, 5, "c")];
        assert_eq!(select_best_rendition(&list).unwrap().url(), Some("a"));
    }

    #[test]
    fn test_best_rendition_ignores_url_length() {
        let list = vec![
            rendition(1080, 1920, "x"),
            rendition(720, 1280, "a-much-longer-url-that-sorts-last-zzzz"),
        ];
        assert_eq!(select_best_rendition(&list).unwrap().url(), Some("x"));
    }

    #[test]
    fn test_best_rendition_empty() {
        assert!(select_best_rendition(&[]).is_none());
    }

    #[test]
    fn test_rendition_from_bit_rate_missing_dimensions() {
        let r = Rendition::from_bit_rate(&json!({"play_addr": {"url_list": ["u1", "u2"]}}));
        assert_eq!(r.resolution(), 0);
        assert_eq!(r.url(), Some("u2"));
    }

    fn internal_video() -> Value {
        json!({
            "aweme_id": "7300000000000000001",
            "share_url": "https://www.tiktok.com/@a/video/7300000000000000001",
            "desc": "hello world",
            "create_time": 1700000000,
            "statistics": {
                "digg_count": 10, "comment_count": 2, "share_count": 3,
                "play_count": 400, "collect_count": 5
            },
            "video": {
                "origin_cover": {"url_list": ["https://cdn/cover.jpg"]},
                "bit_rate": [
                    {"play_addr": {"width": 576, "height": 1024, "url_list": ["https://cdn/sd-1", "https://cdn/sd-2"]}},
                    {"play_addr": {"width": 1080, "height": 1920, "url_list": ["https://cdn/hd-1", "https://cdn/hd-2"]}}
                ]
            },
            "music": {"play_url": {"url_list": ["https://cdn/music.mp3"]}}
        })
    }

    #[test]
    fn test_normalize_internal_video() {
        let item = normalize(&RawItem::Internal(internal_video()));
        assert_eq!(item.id, "7300000000000000001");
        assert_eq!(item.description, "hello world");
        assert_eq!(item.created_at, 1700000000);
        assert_eq!(item.stats.views, 400);
        assert_eq!(item.stats.collects, 5);
        assert_eq!(item.item_type(), ItemType::Video);
        let video = item.video().unwrap();
        assert_eq!(video.mp4_uri, "https://cdn/hd-2");
        assert_eq!(video.cover_uri, "https://cdn/cover.jpg");
        assert_eq!(item.music_uri, "https://cdn/music.mp3");
        assert!(item.images().is_none());
    }

    #[test]
    fn test_normalize_internal_photo() {
        let raw = json!({
            "aweme_id": "7300000000000000002",
            "create_time": "1700000001",
            "statistics": {"digg_count": 1},
            "image_post_info": {
                "images": [
                    {"display_image": {"url_list": ["https://cdn/1.jpg", "https://cdn/1b.jpg"]}},
                    {"display_image": {"url_list": ["https://cdn/2.jpg"]}}
                ]
            },
            "video": {"bit_rate": []}
        });
        let item = normalize(&RawItem::Internal(raw));
        assert_eq!(item.item_type(), ItemType::Photo);
        assert_eq!(item.created_at, 1700000001);
        assert_eq!(
            item.images().unwrap(),
            ["https://cdn/1.jpg".to_string(), "https://cdn/2.jpg".to_string()]
        );
        assert!(item.video().is_none());
    }

    #[test]
    fn test_normalize_internal_missing_fields_defaults() {
        let item = normalize(&RawItem::Internal(json!({"aweme_id": 42})));
        assert_eq!(item.id, "42");
        assert_eq!(item.description, "");
        assert_eq!(item.created_at, 0);
        assert_eq!(item.stats, ItemStats::default());
        assert_eq!(item.video().unwrap().mp4_uri, "");
    }

    #[test]
    fn test_normalize_mirror_video() {
        let data = json!({
            "id": "7300000000000000003",
            "title": "mirror title",
            "create_time": 1700000002,
            "digg_count": 7, "comment_count": 8, "share_count": 9,
            "play_count": 10, "collect_count": 11,
            "origin_cover": "https://m/origin.jpg",
            "play": "https://m/play.mp4",
            "hdplay": "https://m/hd.mp4",
            "music_info": {"play": "https://m/music.mp3"}
        });
        let url = "https://www.tiktok.com/@a/video/7300000000000000003";
        let item = normalize(&RawItem::Mirror {
            data,
            url: url.to_string(),
        });
        assert_eq!(item.url, url);
        assert_eq!(item.description, "mirror title");
        assert_eq!(item.stats.likes, 7);
        assert_eq!(item.stats.collects, 11);
        let video = item.video().unwrap();
        assert_eq!(video.mp4_uri, "https://m/hd.mp4");
        assert_eq!(video.cover_uri, "https://m/origin.jpg");
        assert_eq!(item.music_uri, "https://m/music.mp3");
    }

    #[test]
    fn test_normalize_mirror_falls_back_to_play() {
        let data = json!({"id": "1", "hdplay": "", "play": "https://m/play.mp4"});
        let item = normalize(&RawItem::Mirror {
            data,
            url: String::new(),
        });
        assert_eq!(item.video().unwrap().mp4_uri, "https://m/play.mp4");
    }

    #[test]
    fn test_normalize_mirror_photo() {
        let data = json!({
            "id": "7300000000000000004",
            "images": ["https://m/1.jpg", "https://m/2.jpg", "https://m/3.jpg"],
            "play": "https://m/slideshow.mp4",
            "music": "https://m/music.mp3"
        });
        let item = normalize(&RawItem::Mirror {
            data,
            url: String::new(),
        });
        assert_eq!(item.item_type(), ItemType::Photo);
        assert_eq!(item.images().unwrap().len(), 3);
        assert_eq!(item.images().unwrap()[0], "https://m/1.jpg");
        assert!(item.video().is_none());
        assert_eq!(item.music_uri, "https://m/music.mp3");
    }

    #[test]
    fn test_both_schemas_populate_exactly_one_payload() {
        let raws = vec![
            RawItem::Internal(internal_video()),
            RawItem::Internal(json!({"image_post_info": {"images": []}})),
            RawItem::Internal(json!({})),
            RawItem::Mirror {
                data: json!({"images": []}),
                url: String::new(),
            },
            RawItem::Mirror {
                data: json!({"images": null, "play": "p"}),
                url: String::new(),
            },
        ];
        for raw in &raws {
            let item = normalize(raw);
            assert!(item.video().is_some() != item.images().is_some());
            match item.item_type() {
                ItemType::Video => assert!(item.video().is_some()),
                ItemType::Photo => assert!(item.images().is_some()),
            }
        }
    }
}
