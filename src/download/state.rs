//! Download statistics tracking.

use crate::download::queue::{DownloadQueueItem, QueueStatus};
use crate::media::MediaContent;

/// Per-run download statistics.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct DownloadStats {
    pub video_count: u64,
    pub photo_post_count: u64,
    pub image_count: u64,
    pub failed_count: u64,
    /// Items never started, e.g. after cancellation.
    pub skipped_count: u64,
}

impl DownloadStats {
    /// Tally a queue snapshot.
    pub fn from_queue(entries: &[DownloadQueueItem]) -> Self {
        let mut stats = Self::default();
        for entry in entries {
            match entry.status {
                QueueStatus::Success => stats.add_success(entry),
                QueueStatus::Error => stats.failed_count += 1,
                QueueStatus::Pending | QueueStatus::Downloading => stats.skipped_count += 1,
            }
        }
        stats
    }

    fn add_success(&mut self, entry: &DownloadQueueItem) {
        match entry.data.as_ref().map(|item| &item.content) {
            Some(MediaContent::Photo(images)) => {
                self.photo_post_count += 1;
                self.image_count += images.len() as u64;
            }
            Some(MediaContent::Video(_)) | None => self.video_count += 1,
        }
    }

    /// Get total downloaded item count.
    pub fn total_downloaded(&self) -> u64 {
        self.video_count + self.photo_post_count
    }

    /// Get total file count.
    pub fn total_files(&self) -> u64 {
        self.video_count + self.image_count
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::media::{CanonicalItem, ItemStats, VideoInfo};

    fn entry(id: &str, status: QueueStatus, content: Option<MediaContent>) -> DownloadQueueItem {
        let mut entry = DownloadQueueItem::new(id, id);
        entry.status = status;
        entry.data = content.map(|content| CanonicalItem {
            id: id.to_string(),
            url: String::new(),
            description: String::new(),
            created_at: 0,
            stats: ItemStats::default(),
            content,
            music_uri: String::new(),
        });
        entry
    }

    #[test]
    fn test_from_queue() {
        let entries = vec![
            entry("1", QueueStatus::Success, Some(MediaContent::Video(VideoInfo::default()))),
            entry(
                "2",
                QueueStatus::Success,
                Some(MediaContent::Photo(vec!["a".into(), "b".into(), "c".into()])),
            ),
            entry("3", QueueStatus::Error, None),
            entry("4", QueueStatus::Pending, None),
        ];

        let stats = DownloadStats::from_queue(&entries);
        assert_eq!(stats.video_count, 1);
        assert_eq!(stats.photo_post_count, 1);
        assert_eq!(stats.image_count, 3);
        assert_eq!(stats.failed_count, 1);
        assert_eq!(stats.skipped_count, 1);
        assert_eq!(stats.total_downloaded(), 2);
        assert_eq!(stats.total_files(), 4);
    }
}
