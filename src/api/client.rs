//! TikTok mobile API HTTP client.

use std::time::Duration;

use reqwest::{header, Client, Response};
use serde::de::DeserializeOwned;
use serde_json::Value;

use crate::api::device::{DeviceIdentityProvider, MOBILE_USER_AGENT};
use crate::api::params::RequestParams;
use crate::api::signer::SignaturePipeline;
use crate::api::types::*;
use crate::error::{Error, Result};

/// Items requested per feed page.
pub const FEED_PAGE_SIZE: i64 = 21;

/// Default per-request timeout.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

/// Origin host the feed endpoint is proxied for.
const FEED_ORIGIN_HOST: &str = "api22-normal-c-alisg.tiktokv.com";

/// Upstream endpoint URLs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Endpoints {
    pub search_user: String,
    pub user_profile: String,
    pub user_feed: String,
    pub item_details: String,
}

impl Default for Endpoints {
    fn default() -> Self {
        Self {
            search_user: "https://api22-normal-c-alisg.tiktokv.com/aweme/v1/discover/search/"
                .to_string(),
            user_profile: "https://api22-normal-c-alisg.tiktokv.com/aweme/v1/user/profile/other/"
                .to_string(),
            user_feed: "https://aggr22-normal-alisg.tiktokv.com/aweme/v1/aweme/post/".to_string(),
            item_details: "https://www.tikwm.com/api/".to_string(),
        }
    }
}

/// TikTok API client with device simulation and request signing.
pub struct TikTokApi {
    client: Client,
    device: DeviceIdentityProvider,
    signer: SignaturePipeline,
    endpoints: Endpoints,
}

impl TikTokApi {
    /// Create a new API client.
    pub fn new(
        device: DeviceIdentityProvider,
        signer: SignaturePipeline,
        endpoints: Endpoints,
        user_agent: Option<&str>,
        timeout: Duration,
    ) -> Result<Self> {
        let client = Client::builder()
            .user_agent(user_agent.unwrap_or(MOBILE_USER_AGENT))
            .timeout(timeout)
            .build()
            .map_err(|e| Error::Request(format!("Failed to create HTTP client: {}", e)))?;

        Ok(Self {
            client,
            device,
            signer,
            endpoints,
        })
    }

    pub fn device(&self) -> &DeviceIdentityProvider {
        &self.device
    }

    pub fn endpoints(&self) -> &Endpoints {
        &self.endpoints
    }

    /// Make a signed GET request and return the JSON body.
    ///
    /// The query string is serialized once, signed, and sent unchanged.
    async fn signed_get(
        &self,
        base_url: &str,
        params: &RequestParams,
        cookie: Option<&str>,
        extra_headers: header::HeaderMap,
    ) -> Result<Value> {
        let query = params.serialize();
        let cookie = cookie.filter(|c| !c.is_empty());
        let signature = self.signer.sign(&query, cookie, None).await?;

        let mut headers = extra_headers;
        headers.extend(signature.to_header_map()?);
        if let Some(cookie) = cookie {
            let value = header::HeaderValue::from_str(cookie)
                .map_err(|e| Error::ConfigValidation {
                    field: "cookie".to_string(),
                    message: format!("Cookie is not a valid header value: {}", e),
                })?;
            headers.insert(header::COOKIE, value);
        }

        let url = format!("{}?{}", base_url, query);
        tracing::debug!("GET {}", base_url);

        let response = self
            .client
            .get(&url)
            .headers(headers)
            .send()
            .await?;

        read_json(response, base_url).await
    }

    /// Search for a username and return the first user ID in the results.
    pub async fn fetch_user_id(&self, username: &str, cookie: Option<&str>) -> Result<String> {
        let params = self
            .device
            .base_params()
            .with("cursor", "0")
            .with("enable_lite_workflow", "1")
            .with("enter_from", "web")
            .with("enable_lite_cut", "1")
            .with("backtrace", "")
            .with("keyword", username)
            .with("count", "1")
            .with("last_search_id", "")
            .with("end_to_end_search_session_id", "")
            .with("query_correct_type", "1")
            .with("search_source", "search_history")
            .with("search_id", "")
            .with("request_tag_from", "h5");

        let body = self
            .signed_get(
                &self.endpoints.search_user,
                &params,
                cookie,
                header::HeaderMap::new(),
            )
            .await?;

        find_value_by_key(&body, "uid")
            .and_then(value_as_string)
            .filter(|uid| !uid.is_empty() && uid != "0")
            .ok_or_else(|| Error::NotFound(format!("No user ID found for '{}'", username)))
    }

    /// Fetch a user's profile and check it belongs to `username`.
    pub async fn fetch_user_profile(
        &self,
        username: &str,
        user_id: &str,
        cookie: Option<&str>,
    ) -> Result<UserInfo> {
        let params = self
            .device
            .base_params()
            .with("sec_user_id", "")
            .with("user_id", user_id)
            .with("unique_id", username)
            .with("lite_flow_schedule", "new");

        let mut headers = header::HeaderMap::new();
        headers.insert(
            header::CONTENT_TYPE,
            header::HeaderValue::from_static("application/x-www-form-urlencoded"),
        );

        let body = self
            .signed_get(&self.endpoints.user_profile, &params, cookie, headers)
            .await?;
        let response: UserProfileResponse = parse_envelope(body, "user profile")?;
        let user = response
            .user
            .ok_or_else(|| Error::Parse("User profile response has no 'user' field".into()))?;

        if !user.unique_id.eq_ignore_ascii_case(username) {
            return Err(Error::NotFound(format!(
                "User {} not found (search returned '{}')",
                username, user.unique_id
            )));
        }

        Ok(UserInfo::from(user))
    }

    /// Resolve a username to its profile.
    pub async fn get_user_info_by_username(
        &self,
        username: &str,
        cookie: Option<&str>,
    ) -> Result<UserInfo> {
        let user_id = self.fetch_user_id(username, cookie).await?;
        tracing::debug!("Resolved {} to user ID {}", username, user_id);
        self.fetch_user_profile(username, &user_id, cookie).await
    }

    /// Fetch one page of a user's feed.
    pub async fn fetch_user_feed(
        &self,
        sec_uid: &str,
        cursor: &str,
        max_cursor: &str,
        cookie: Option<&str>,
    ) -> Result<FeedPage> {
        let params = self
            .device
            .base_params()
            .with("source", "0")
            .with("max_cursor", max_cursor)
            .with("cursor", cursor)
            .with("sec_user_id", sec_uid)
            .with("count", FEED_PAGE_SIZE.to_string())
            .with("filter_private", "1")
            .with("lite_flow_schedule", "new")
            .with("cdn_cache_is_login", "1")
            .with("cdn_cache_strategy", "v0")
            .with("data_saver_type", "1")
            .with("data_saver_work", "false")
            .with("page_type", "2");

        let mut headers = header::HeaderMap::new();
        headers.insert(
            header::CONTENT_TYPE,
            header::HeaderValue::from_static("application/x-www-form-urlencoded"),
        );
        headers.insert(
            "x-tt-ttnet-origin-host",
            header::HeaderValue::from_static(FEED_ORIGIN_HOST),
        );

        let body = self
            .signed_get(&self.endpoints.user_feed, &params, cookie, headers)
            .await?;
        let response: FeedResponse = parse_envelope(body, "user feed")?;
        let cursor = response.page_cursor();
        let items = response
            .aweme_list
            .unwrap_or_default()
            .into_iter()
            .map(RawItem::Internal)
            .collect::<Vec<_>>();

        tracing::debug!(
            "Feed page: {} item(s), has_more={}",
            items.len(),
            cursor.has_more
        );

        Ok(FeedPage { items, cursor })
    }

    /// Fetch a single item by share URL through the public mirror.
    ///
    /// The mirror is a separate service and is not signed.
    pub async fn fetch_item_details(&self, share_url: &str) -> Result<RawItem> {
        let endpoint = &self.endpoints.item_details;
        tracing::debug!("POST {} for {}", endpoint, share_url);

        let response = self
            .client
            .post(endpoint)
            .header(
                header::CONTENT_TYPE,
                "application/x-www-form-urlencoded; charset=UTF-8",
            )
            .body(
                RequestParams::new()
                    .with("url", share_url)
                    .with("hd", 1i64)
                    .serialize(),
            )
            .send()
            .await?;

        let body = read_json(response, endpoint).await?;
        let envelope: MirrorResponse = parse_envelope(body, "item details")?;

        if envelope.code != 0 {
            return Err(Error::Parse(format!(
                "Item details for {} rejected (code {}): {}",
                share_url, envelope.code, envelope.msg
            )));
        }

        match envelope.data {
            Some(data) if data.is_object() => Ok(RawItem::Mirror {
                data,
                url: share_url.to_string(),
            }),
            _ => Err(Error::Parse(format!(
                "Item details for {} have no data: {}",
                share_url, envelope.msg
            ))),
        }
    }
}

/// Check the status and decode a JSON body.
async fn read_json(response: Response, endpoint: &str) -> Result<Value> {
    let status = response.status();
    tracing::debug!("Response status: {}", status);

    if !status.is_success() {
        return Err(Error::Request(format!("HTTP {} from {}", status, endpoint)));
    }

    let text = response.text().await?;
    tracing::debug!("Response length: {} bytes", text.len());

    serde_json::from_str(&text).map_err(|e| {
        Error::Parse(format!(
            "Invalid JSON from {}: {} - Response: {}",
            endpoint,
            e,
            text.chars().take(200).collect::<String>()
        ))
    })
}

fn parse_envelope<T: DeserializeOwned>(body: Value, what: &str) -> Result<T> {
    serde_json::from_value(body).map_err(|e| Error::Parse(format!("Failed to parse {}: {}", what, e)))
}
