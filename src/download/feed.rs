//! User feed collection.

use std::time::Duration;

use async_trait::async_trait;

use crate::api::{FeedPage, PageCursor, TikTokApi, UserInfo};
use crate::error::Result;
use crate::media::{normalize, CanonicalItem};

/// Upstream operations needed to walk a user's feed.
#[async_trait]
pub trait FeedSource: Send + Sync {
    async fn user_info(&self, username: &str, cookie: Option<&str>) -> Result<UserInfo>;

    async fn feed_page(
        &self,
        sec_uid: &str,
        cursor: &PageCursor,
        cookie: Option<&str>,
    ) -> Result<FeedPage>;
}

#[async_trait]
impl FeedSource for TikTokApi {
    async fn user_info(&self, username: &str, cookie: Option<&str>) -> Result<UserInfo> {
        self.get_user_info_by_username(username, cookie).await
    }

    async fn feed_page(
        &self,
        sec_uid: &str,
        cursor: &PageCursor,
        cookie: Option<&str>,
    ) -> Result<FeedPage> {
        self.fetch_user_feed(sec_uid, &cursor.cursor, &cursor.max_cursor, cookie)
            .await
    }
}

/// A user's profile and the posts collected from their feed.
#[derive(Debug, Clone)]
pub struct UserFeed {
    pub user: UserInfo,
    pub items: Vec<CanonicalItem>,
}

/// Resolve `username` and page through their feed.
///
/// Pages start from the `"0"/"0"` cursor and each returned cursor is fed back
/// unchanged. Collection stops when upstream reports no more pages, when
/// `limit` items are collected, or when a page does not move the cursor.
/// Requests are spaced by `delay`.
pub async fn collect_user_feed(
    source: &dyn FeedSource,
    username: &str,
    cookie: Option<&str>,
    limit: Option<usize>,
    delay: Duration,
) -> Result<UserFeed> {
    let user = source.user_info(username, cookie).await?;
    tracing::info!(
        "Collecting feed for {} ({} followers)",
        user.unique_id,
        user.follower_count
    );

    let mut items = Vec::new();
    let mut cursor = PageCursor::start();
    let mut page_number = 0usize;

    loop {
        tokio::time::sleep(delay).await;

        let page = source.feed_page(&user.sec_uid, &cursor, cookie).await?;
        page_number += 1;
        tracing::debug!("Page {}: {} item(s)", page_number, page.items.len());

        items.extend(page.items.iter().map(normalize));

        if let Some(limit) = limit {
            if items.len() >= limit {
                items.truncate(limit);
                tracing::debug!("Reached item limit of {}", limit);
                break;
            }
        }

        if !page.cursor.has_more {
            break;
        }

        if page.cursor.cursor == cursor.cursor && page.cursor.max_cursor == cursor.max_cursor {
            tracing::warn!("Feed cursor did not advance, stopping after page {}", page_number);
            break;
        }

        cursor = page.cursor;
    }

    tracing::info!(
        "Collected {} item(s) from {} page(s)",
        items.len(),
        page_number
    );

    Ok(UserFeed { user, items })
}
