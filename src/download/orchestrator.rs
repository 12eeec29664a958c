//! Download orchestration: detail lookups, file phases, cancellation.

use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use indicatif::ProgressBar;
use tokio::task::JoinSet;
use tokio_util::sync::CancellationToken;

use crate::api::TikTokApi;
use crate::config::FilenameKey;
use crate::download::queue::{
    dedup_urls, DownloadQueue, DownloadQueueItem, QueueSummary, QueueUpdate,
};
use crate::download::sink::FileSink;
use crate::error::{Error, Result};
use crate::fs::naming::build_filename;
use crate::fs::paths::{photo_paths, resolve_destination, video_path};
use crate::media::{normalize, CanonicalItem, MediaContent};

/// Default spacing between detail lookups.
pub const DEFAULT_MIN_DELAY: Duration = Duration::from_secs(1);

/// Resolves a share URL to a canonical item.
#[async_trait]
pub trait ItemSource: Send + Sync {
    async fn fetch_item(&self, url: &str) -> Result<CanonicalItem>;
}

#[async_trait]
impl ItemSource for TikTokApi {
    async fn fetch_item(&self, url: &str) -> Result<CanonicalItem> {
        let raw = self.fetch_item_details(url).await?;
        Ok(normalize(&raw))
    }
}

/// Orchestrator settings.
#[derive(Debug, Clone)]
pub struct OrchestratorOptions {
    /// Explicit destination; falls back to the Downloads directory.
    pub destination: Option<PathBuf>,
    pub filename_format: Vec<FilenameKey>,
    pub min_delay: Duration,
}

impl Default for OrchestratorOptions {
    fn default() -> Self {
        Self {
            destination: None,
            filename_format: FilenameKey::default_format(),
            min_delay: DEFAULT_MIN_DELAY,
        }
    }
}

/// Drives queued items through lookup and download.
///
/// Detail lookups run one at a time, spaced by `min_delay`. Each successful
/// lookup launches a file phase that runs in the background; a failing item
/// never affects the others.
pub struct DownloadOrchestrator {
    source: Arc<dyn ItemSource>,
    sink: Arc<dyn FileSink>,
    options: OrchestratorOptions,
    queue: DownloadQueue,
    cancel: CancellationToken,
    pending: Arc<AtomicUsize>,
    progress: Option<ProgressBar>,
}

impl DownloadOrchestrator {
    pub fn new(
        source: Arc<dyn ItemSource>,
        sink: Arc<dyn FileSink>,
        options: OrchestratorOptions,
    ) -> Self {
        Self {
            source,
            sink,
            options,
            queue: DownloadQueue::new(),
            cancel: CancellationToken::new(),
            pending: Arc::new(AtomicUsize::new(0)),
            progress: None,
        }
    }

    /// Report finished items on a progress bar.
    pub fn with_progress(mut self, progress: ProgressBar) -> Self {
        self.progress = Some(progress);
        self
    }

    /// Token that stops the run before the next lookup when cancelled.
    pub fn cancel_token(&self) -> CancellationToken {
        self.cancel.clone()
    }

    pub fn cancel(&self) {
        self.cancel.cancel();
    }

    /// Number of launched file phases that have not finished.
    pub fn pending(&self) -> usize {
        self.pending.load(Ordering::SeqCst)
    }

    pub fn queue(&self) -> &DownloadQueue {
        &self.queue
    }

    pub fn summary(&self) -> QueueSummary {
        self.queue.summary()
    }

    /// Download the items behind a list of share URLs.
    pub async fn run<I, S>(&self, urls: I) -> Result<QueueSummary>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let entries = self.enqueue(dedup_urls(urls));
        let destination = self.prepare_destination().await?;
        if let Some(pb) = &self.progress {
            pb.set_length(entries.len() as u64);
        }

        tracing::info!(
            "Processing {} item(s) into {}",
            entries.len(),
            destination.display()
        );

        let mut tasks = JoinSet::new();
        let total = entries.len();

        for (index, entry) in entries.into_iter().enumerate() {
            if self.cancel.is_cancelled() {
                tracing::info!("Cancelled, {} item(s) left pending", total - index);
                break;
            }

            self.queue.update(&entry.id, QueueUpdate::Downloading);

            match self.source.fetch_item(&entry.original_url).await {
                Ok(item) => self.launch(&mut tasks, entry.id, item, &destination),
                Err(e) => {
                    tracing::warn!("Failed to fetch details for {}: {}", entry.id, e);
                    self.finish_failed(&entry.id, e.to_string());
                }
            }

            if index + 1 < total {
                tokio::select! {
                    _ = tokio::time::sleep(self.options.min_delay) => {}
                    _ = self.cancel.cancelled() => {}
                }
            }
        }

        self.wait_all(tasks).await;
        Ok(self.summary())
    }

    /// Download already-resolved items.
    pub async fn run_items(&self, items: Vec<CanonicalItem>) -> Result<QueueSummary> {
        let destination = self.prepare_destination().await?;
        let mut tasks = JoinSet::new();
        let mut queued = Vec::with_capacity(items.len());

        for item in items {
            if self
                .queue
                .push(DownloadQueueItem::new(item.id.clone(), item.url.clone()))
            {
                queued.push(item);
            } else {
                tracing::debug!("Skipping duplicate item {}", item.id);
            }
        }

        if let Some(pb) = &self.progress {
            pb.set_length(queued.len() as u64);
        }

        for item in queued {
            if self.cancel.is_cancelled() {
                tracing::info!("Cancelled, remaining items left pending");
                break;
            }
            self.queue.update(&item.id, QueueUpdate::Downloading);
            self.launch(&mut tasks, item.id.clone(), item, &destination);
        }

        self.wait_all(tasks).await;
        Ok(self.summary())
    }

    fn enqueue(&self, entries: Vec<DownloadQueueItem>) -> Vec<DownloadQueueItem> {
        entries
            .into_iter()
            .filter(|entry| self.queue.push(entry.clone()))
            .collect()
    }

    async fn prepare_destination(&self) -> Result<PathBuf> {
        let destination = resolve_destination(self.options.destination.as_deref());
        tokio::fs::create_dir_all(&destination).await?;
        Ok(destination)
    }

    /// Start the file phase for an item without waiting for it.
    fn launch(
        &self,
        tasks: &mut JoinSet<()>,
        id: String,
        item: CanonicalItem,
        destination: &Path,
    ) {
        // Upstream ids are untrusted; only numeric ids are used in paths.
        let Some(file_id) = [item.id.as_str(), id.as_str()]
            .into_iter()
            .find(|candidate| is_numeric_id(candidate))
            .map(str::to_string)
        else {
            tracing::warn!("Item {} has no usable id {:?}", id, item.id);
            self.finish_failed(
                &id,
                Error::InvalidFilename(format!("non-numeric item id {:?}", item.id)).to_string(),
            );
            return;
        };

        let sink = Arc::clone(&self.sink);
        let queue = self.queue.clone();
        let pending = Arc::clone(&self.pending);
        let progress = self.progress.clone();
        let base_name = if file_id == item.id {
            build_filename(&item, &self.options.filename_format)
        } else {
            let mut named = item.clone();
            named.id = file_id;
            build_filename(&named, &self.options.filename_format)
        };
        let destination = destination.to_path_buf();

        pending.fetch_add(1, Ordering::SeqCst);
        tasks.spawn(async move {
            match download_item(sink.as_ref(), &item, &destination, &base_name).await {
                Ok(paths) => {
                    tracing::info!("Downloaded {} ({} file(s))", id, paths.len());
                    queue.update(&id, QueueUpdate::Success(Some(item)));
                }
                Err(e) => {
                    tracing::warn!("Failed to download {}: {}", id, e);
                    queue.update(&id, QueueUpdate::Error(e.to_string()));
                }
            }
            pending.fetch_sub(1, Ordering::SeqCst);
            if let Some(pb) = progress {
                pb.inc(1);
            }
        });
    }

    fn finish_failed(&self, id: &str, message: String) {
        self.queue.update(id, QueueUpdate::Error(message));
        if let Some(pb) = &self.progress {
            pb.inc(1);
        }
    }

    async fn wait_all(&self, mut tasks: JoinSet<()>) {
        while let Some(result) = tasks.join_next().await {
            if let Err(e) = result {
                tracing::error!("Download task failed: {}", e);
            }
        }
    }
}

fn is_numeric_id(id: &str) -> bool {
    !id.is_empty() && id.bytes().all(|b| b.is_ascii_digit())
}

/// Write an item's files under `destination`.
///
/// Videos become `<base_name>.mp4`; photo posts become `<base_name>/1.jpg`
/// onward, fetched concurrently.
pub async fn download_item(
    sink: &dyn FileSink,
    item: &CanonicalItem,
    destination: &Path,
    base_name: &str,
) -> Result<Vec<PathBuf>> {
    match &item.content {
        MediaContent::Video(video) => {
            let path = video_path(destination, base_name);
            sink.write(&video.mp4_uri, &path).await?;
            Ok(vec![path])
        }
        MediaContent::Photo(images) => {
            if images.is_empty() {
                return Err(Error::Download(format!("Photo post {} has no images", item.id)));
            }
            let paths = photo_paths(destination, base_name, images.len());
            // Wait for every image before reporting the first error.
            let results = futures::future::join_all(
                images
                    .iter()
                    .zip(&paths)
                    .map(|(url, path)| sink.write(url, path)),
            )
            .await;
            results.into_iter().collect::<Result<Vec<()>>>()?;
            Ok(paths)
        }
    }
}
