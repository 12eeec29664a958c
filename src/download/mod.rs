//! Download module for content downloading.
//!
//! This module provides:
//! - The download queue and its per-item state machine
//! - The orchestrator driving lookups and file phases
//! - User feed collection
//! - The file sink writing media to disk
//! - Download statistics

pub mod feed;
pub mod orchestrator;
pub mod queue;
pub mod sink;
pub mod state;

pub use feed::{collect_user_feed, FeedSource, UserFeed};
pub use orchestrator::{
    download_item, DownloadOrchestrator, ItemSource, OrchestratorOptions, DEFAULT_MIN_DELAY,
};
pub use queue::{
    dedup_urls, parse_queue_input, DownloadQueue, DownloadQueueItem, QueueStatus, QueueSummary,
    QueueUpdate,
};
pub use sink::{FileSink, HttpFileSink};
pub use state::DownloadStats;
