//! API response type definitions.

use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;

/// Profile envelope for the user profile endpoint.
#[derive(Debug, Deserialize)]
pub struct UserProfileResponse {
    pub user: Option<RawUser>,
}

/// User as returned by the mobile API.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct RawUser {
    #[serde(default, deserialize_with = "string_or_number")]
    pub uid: String,
    #[serde(default)]
    pub unique_id: String,
    #[serde(default)]
    pub sec_uid: String,
    #[serde(default)]
    pub follower_count: u64,
    #[serde(default)]
    pub following_count: u64,
    pub avatar_larger: Option<UrlList>,
    pub avatar_medium: Option<UrlList>,
    pub avatar_thumb: Option<UrlList>,
}

/// Image/URL container used across the mobile API.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct UrlList {
    #[serde(default)]
    pub url_list: Vec<String>,
}

impl UrlList {
    fn first(&self) -> Option<&str> {
        self.url_list.first().map(String::as_str)
    }
}

/// Normalized user profile.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UserInfo {
    pub uid: String,
    pub unique_id: String,
    pub sec_uid: String,
    pub follower_count: u64,
    pub following_count: u64,
    pub avatar_uri: String,
}

impl From<RawUser> for UserInfo {
    fn from(user: RawUser) -> Self {
        let avatar_uri = [&user.avatar_larger, &user.avatar_medium, &user.avatar_thumb]
            .into_iter()
            .flatten()
            .find_map(|list| list.first().filter(|u| !u.is_empty()))
            .unwrap_or_default()
            .to_string();

        Self {
            uid: user.uid,
            unique_id: user.unique_id,
            sec_uid: user.sec_uid,
            follower_count: user.follower_count,
            following_count: user.following_count,
            avatar_uri,
        }
    }
}

/// Feed page envelope.
#[derive(Debug, Default, Deserialize)]
pub struct FeedResponse {
    #[serde(default)]
    pub has_more: Value,
    #[serde(default)]
    pub aweme_list: Option<Vec<Value>>,
    #[serde(default)]
    pub min_cursor: Value,
    #[serde(default)]
    pub max_cursor: Value,
}

/// Upstream value of `has_more` meaning another page exists.
pub const HAS_MORE_SENTINEL: i64 = 1;

impl FeedResponse {
    /// Cursor state for the next request.
    pub fn page_cursor(&self) -> PageCursor {
        PageCursor {
            cursor: cursor_string(&self.min_cursor),
            max_cursor: cursor_string(&self.max_cursor),
            has_more: self.has_more.as_i64() == Some(HAS_MORE_SENTINEL),
        }
    }
}

fn cursor_string(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Number(n) => n.to_string(),
        _ => String::new(),
    }
}

/// Pagination state, fed back verbatim into the next feed request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PageCursor {
    pub cursor: String,
    pub max_cursor: String,
    pub has_more: bool,
}

impl PageCursor {
    /// Cursor for the first page.
    pub fn start() -> Self {
        Self {
            cursor: "0".to_string(),
            max_cursor: "0".to_string(),
            has_more: true,
        }
    }
}

/// One page of a user's feed.
#[derive(Debug, Clone)]
pub struct FeedPage {
    pub items: Vec<RawItem>,
    pub cursor: PageCursor,
}

/// Public mirror envelope.
#[derive(Debug, Deserialize)]
pub struct MirrorResponse {
    #[serde(default)]
    pub code: i64,
    #[serde(default)]
    pub msg: String,
    #[serde(default)]
    pub data: Option<Value>,
}

/// An item as returned upstream, tagged with the schema it follows.
#[derive(Debug, Clone, PartialEq)]
pub enum RawItem {
    /// Mobile API schema (`aweme_id`, `statistics`, `video.bit_rate`, ...).
    Internal(Value),
    /// Public mirror schema (`id`, `digg_count`, `hdplay`, ...). The share
    /// URL the item was requested with travels along.
    Mirror { data: Value, url: String },
}

/// Depth-first search for the first value stored under `key`.
///
/// Object keys are visited in document order; arrays are searched element by
/// element. The first match wins.
pub fn find_value_by_key<'a>(value: &'a Value, key: &str) -> Option<&'a Value> {
    match value {
        Value::Object(map) => {
            for (k, v) in map {
                if k == key {
                    return Some(v);
                }
                if v.is_object() || v.is_array() {
                    if let Some(found) = find_value_by_key(v, key) {
                        return Some(found);
                    }
                }
            }
            None
        }
        Value::Array(items) => items.iter().find_map(|v| find_value_by_key(v, key)),
        _ => None,
    }
}

/// Render a string or number value as a string.
pub fn value_as_string(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

fn string_or_number<'de, D>(deserializer: D) -> std::result::Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Value::deserialize(deserializer)?;
    Ok(value_as_string(&value).unwrap_or_default())
}
