//! File sink: streams remote files to disk.

use std::path::Path;
use std::time::Duration;

use async_trait::async_trait;
use futures::StreamExt;
use indicatif::{ProgressBar, ProgressStyle};
use reqwest::Client;
use tokio::fs::File;
use tokio::io::AsyncWriteExt;

use crate::api::device::MOBILE_USER_AGENT;
use crate::error::{Error, Result};

/// Minimum file size to show progress bar (20 MB).
const PROGRESS_THRESHOLD: u64 = 20 * 1024 * 1024;

/// Writes a remote file to a local path.
#[async_trait]
pub trait FileSink: Send + Sync {
    /// Fetch `url` and write it to `destination`, creating parent directories.
    async fn write(&self, url: &str, destination: &Path) -> Result<()>;
}

/// [`FileSink`] backed by an HTTP client.
pub struct HttpFileSink {
    client: Client,
    show_progress: bool,
}

impl HttpFileSink {
    /// `timeout` bounds connecting and each read, not the whole transfer.
    pub fn new(timeout: Duration, show_progress: bool) -> Result<Self> {
        let client = Client::builder()
            .user_agent(MOBILE_USER_AGENT)
            .connect_timeout(timeout)
            .read_timeout(timeout)
            .build()
            .map_err(|e| Error::Request(format!("Failed to create HTTP client: {}", e)))?;

        Ok(Self {
            client,
            show_progress,
        })
    }

    fn progress_bar(&self, content_length: Option<u64>) -> Option<ProgressBar> {
        let length = content_length.filter(|&l| self.show_progress && l > PROGRESS_THRESHOLD)?;
        let pb = ProgressBar::new(length);
        if let Ok(style) = ProgressStyle::default_bar()
            .template("{spinner:.green} [{bar:40.cyan/blue}] {bytes}/{total_bytes} ({eta})")
        {
            pb.set_style(style.progress_chars("#>-"));
        }
        Some(pb)
    }
}

#[async_trait]
impl FileSink for HttpFileSink {
    async fn write(&self, url: &str, destination: &Path) -> Result<()> {
        if url.is_empty() {
            return Err(Error::Download(format!(
                "No source URL for {}",
                destination.display()
            )));
        }

        if let Some(parent) = destination.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }

        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|e| Error::Download(format!("Failed to fetch {}: {}", url, e)))?;

        if !response.status().is_success() {
            return Err(Error::Download(format!(
                "HTTP {} fetching {}",
                response.status(),
                url
            )));
        }

        let progress = self.progress_bar(response.content_length());

        // Stream to file
        let mut file = File::create(destination).await?;
        let mut stream = response.bytes_stream();
        let mut downloaded: u64 = 0;

        while let Some(chunk) = stream.next().await {
            let chunk = chunk.map_err(|e| Error::Download(format!("Stream error: {}", e)))?;
            file.write_all(&chunk).await?;
            downloaded += chunk.len() as u64;

            if let Some(ref pb) = progress {
                pb.set_position(downloaded);
            }
        }

        file.flush().await?;

        if let Some(pb) = progress {
            pb.finish_and_clear();
        }

        tracing::debug!("Wrote {} bytes to {}", downloaded, destination.display());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    #[tokio::test]
    async fn test_write_creates_parents_and_streams_body() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/file.mp4"))
            .respond_with(ResponseTemplate::new(200).set_body_bytes(b"video-bytes".to_vec()))
            .mount(&server)
            .await;

        let dir = TempDir::new().unwrap();
        let dest = dir.path().join("nested").join("file.mp4");
        let sink = HttpFileSink::new(Duration::from_secs(5), false).unwrap();

        sink.write(&format!("{}/file.mp4", server.uri()), &dest)
            .await
            .unwrap();
        assert_eq!(std::fs::read(&dest).unwrap(), b"video-bytes");
    }

    #[tokio::test]
    async fn test_http_error_is_download_error() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(404))
            .mount(&server)
            .await;

        let dir = TempDir::new().unwrap();
        let sink = HttpFileSink::new(Duration::from_secs(5), false).unwrap();
        let err = sink
            .write(&format!("{}/gone.jpg", server.uri()), &dir.path().join("1.jpg"))
            .await
            .unwrap_err();
        assert!(matches!(err, Error::Download(_)));
    }

    #[tokio::test]
    async fn test_stalled_response_times_out() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_bytes(b"late".to_vec())
                    .set_delay(Duration::from_secs(5)),
            )
            .mount(&server)
            .await;

        let dir = TempDir::new().unwrap();
        let sink = HttpFileSink::new(Duration::from_millis(500), false).unwrap();
        let started = std::time::Instant::now();
        let err = sink
            .write(&format!("{}/slow.mp4", server.uri()), &dir.path().join("slow.mp4"))
            .await
            .unwrap_err();

        assert!(matches!(err, Error::Download(_)));
        assert!(started.elapsed() < Duration::from_secs(4));
    }

    #[test]
    fn test_empty_url_rejected() {
        let dir = TempDir::new().unwrap();
        let sink = HttpFileSink::new(Duration::from_secs(5), false).unwrap();
        let result = tokio_test::block_on(sink.write("", &dir.path().join("x.mp4")));
        tokio_test::assert_err!(result);
        assert!(!dir.path().join("x.mp4").exists());
    }
}
