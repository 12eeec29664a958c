//! Download queue and per-item state tracking.

use std::collections::HashSet;
use std::fmt;
use std::sync::{Arc, Mutex, MutexGuard};

use serde::Serialize;

use crate::config::parse_item_id;
use crate::media::CanonicalItem;

/// Lifecycle of a queued item.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum QueueStatus {
    Pending,
    Downloading,
    Success,
    Error,
}

impl QueueStatus {
    pub fn is_terminal(&self) -> bool {
        matches!(self, QueueStatus::Success | QueueStatus::Error)
    }

    /// Whether moving from `self` to `next` is allowed.
    pub fn can_transition_to(&self, next: QueueStatus) -> bool {
        matches!(
            (self, next),
            (QueueStatus::Pending, QueueStatus::Downloading)
                | (QueueStatus::Downloading, QueueStatus::Success)
                | (QueueStatus::Downloading, QueueStatus::Error)
        )
    }
}

impl fmt::Display for QueueStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            QueueStatus::Pending => write!(f, "pending"),
            QueueStatus::Downloading => write!(f, "downloading"),
            QueueStatus::Success => write!(f, "success"),
            QueueStatus::Error => write!(f, "error"),
        }
    }
}

/// One entry of the download queue.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DownloadQueueItem {
    pub id: String,
    pub original_url: String,
    pub status: QueueStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<CanonicalItem>,
}

impl DownloadQueueItem {
    pub fn new(id: impl Into<String>, original_url: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            original_url: original_url.into(),
            status: QueueStatus::Pending,
            error: None,
            data: None,
        }
    }
}

/// Change applied to a queue entry.
#[derive(Debug, Clone)]
pub enum QueueUpdate {
    Downloading,
    Success(Option<CanonicalItem>),
    Error(String),
}

impl QueueUpdate {
    fn status(&self) -> QueueStatus {
        match self {
            QueueUpdate::Downloading => QueueStatus::Downloading,
            QueueUpdate::Success(_) => QueueStatus::Success,
            QueueUpdate::Error(_) => QueueStatus::Error,
        }
    }
}

/// Counts of queue entries per status.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct QueueSummary {
    pub pending: usize,
    pub downloading: usize,
    pub success: usize,
    pub error: usize,
}

impl QueueSummary {
    pub fn total(&self) -> usize {
        self.pending + self.downloading + self.success + self.error
    }
}

/// Shared, ordered download queue.
///
/// All mutation goes through [`DownloadQueue::update`].
#[derive(Debug, Clone, Default)]
pub struct DownloadQueue {
    items: Arc<Mutex<Vec<DownloadQueueItem>>>,
}

impl DownloadQueue {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, Vec<DownloadQueueItem>> {
        // A panic while holding the lock cannot leave an entry half-updated.
        self.items.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Append an entry unless one with the same ID is already queued.
    pub fn push(&self, item: DownloadQueueItem) -> bool {
        let mut items = self.lock();
        if items.iter().any(|existing| existing.id == item.id) {
            return false;
        }
        items.push(item);
        true
    }

    /// Apply an update to the entry with the given ID.
    ///
    /// Returns `false` and leaves the entry untouched if the ID is unknown or
    /// the transition is not allowed.
    pub fn update(&self, id: &str, update: QueueUpdate) -> bool {
        let mut items = self.lock();
        let Some(entry) = items.iter_mut().find(|item| item.id == id) else {
            tracing::warn!("Queue update for unknown item {}", id);
            return false;
        };

        let next = update.status();
        if !entry.status.can_transition_to(next) {
            tracing::warn!(
                "Rejected queue transition for {}: {} -> {}",
                id,
                entry.status,
                next
            );
            return false;
        }

        entry.status = next;
        match update {
            QueueUpdate::Downloading => {}
            QueueUpdate::Success(data) => {
                if data.is_some() {
                    entry.data = data;
                }
            }
            QueueUpdate::Error(message) => entry.error = Some(message),
        }
        true
    }

    pub fn get(&self, id: &str) -> Option<DownloadQueueItem> {
        self.lock().iter().find(|item| item.id == id).cloned()
    }

    pub fn status(&self, id: &str) -> Option<QueueStatus> {
        self.lock().iter().find(|item| item.id == id).map(|item| item.status)
    }

    /// Copy of all entries in queue order.
    pub fn snapshot(&self) -> Vec<DownloadQueueItem> {
        self.lock().clone()
    }

    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }

    pub fn summary(&self) -> QueueSummary {
        let mut summary = QueueSummary::default();
        for item in self.lock().iter() {
            match item.status {
                QueueStatus::Pending => summary.pending += 1,
                QueueStatus::Downloading => summary.downloading += 1,
                QueueStatus::Success => summary.success += 1,
                QueueStatus::Error => summary.error += 1,
            }
        }
        summary
    }
}

/// Split free-form input into queue entries.
///
/// Lines are split on whitespace; tokens without a recognizable item ID are
/// dropped and the first occurrence of each ID wins.
pub fn parse_queue_input(input: &str) -> Vec<DownloadQueueItem> {
    dedup_urls(input.split_whitespace())
}

/// Build queue entries from URLs, deduplicated by item ID.
pub fn dedup_urls<I, S>(urls: I) -> Vec<DownloadQueueItem>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let mut seen = HashSet::new();
    let mut entries = Vec::new();

    for url in urls {
        let url = url.as_ref().trim();
        match parse_item_id(url) {
            Some(id) if seen.insert(id.clone()) => entries.push(DownloadQueueItem::new(id, url)),
            Some(id) => tracing::debug!("Skipping duplicate item {}", id),
            None => {
                if !url.is_empty() {
                    tracing::warn!("No item ID found in '{}', skipping", url);
                }
            }
        }
    }

    entries
}
