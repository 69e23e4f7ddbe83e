//! Download orchestrator — streams a resolved URL into a local artifact.
//!
//! Chunks are written as they arrive; nothing is buffered whole in memory.
//! The reported size is taken from the filesystem after the writer is flushed
//! and closed, never from Content-Length.

use futures_util::StreamExt;
use reqwest::Client;
use std::time::Duration;
use tokio::io::{AsyncWriteExt, BufWriter};
use url::Url;

use crate::core::config;
use crate::download::artifact::LocalArtifact;
use crate::download::error::DownloadError;

/// Streams remote media into artifacts.
#[derive(Clone)]
pub struct Fetcher {
    client: Client,
}

impl Fetcher {
    pub fn new() -> Result<Self, DownloadError> {
        Self::with_timeouts(config::network::read_timeout(), config::network::download_timeout())
    }

    /// Builds a fetcher that gives up after `read` of silence or `total` overall.
    ///
    /// A stalled media host must fail the run, otherwise the conversation
    /// stays queued behind it.
    pub fn with_timeouts(read: Duration, total: Duration) -> Result<Self, DownloadError> {
        let client = Client::builder()
            .user_agent("Mozilla/5.0 (compatible; tapebot)")
            .connect_timeout(config::network::connect_timeout())
            .read_timeout(read)
            .timeout(total)
            .build()
            .map_err(DownloadError::transport)?;

        Ok(Self { client })
    }

    /// Uses a caller-provided client (shared connection pool, tests).
    pub fn with_client(client: Client) -> Self {
        Self { client }
    }

    /// Downloads `url` into `artifact` and returns the measured size in bytes.
    ///
    /// Either side failing aborts the whole operation; the partially written
    /// file stays owned by `artifact` for the caller to remove.
    pub async fn fetch(&self, url: &Url, artifact: &mut LocalArtifact) -> Result<u64, DownloadError> {
        let file = artifact
            .take_writer()
            .ok_or_else(|| DownloadError::Io(std::io::Error::other("artifact writer already consumed")))?;

        log::info!("📥 Downloading {} → {}", url.host_str().unwrap_or("?"), artifact.path().display());

        let response = self
            .client
            .get(url.clone())
            .send()
            .await
            .map_err(DownloadError::transport)?;
        if !response.status().is_success() {
            return Err(DownloadError::Status(response.status()));
        }

        let mut writer = BufWriter::new(file);
        let mut stream = response.bytes_stream();
        let mut written: u64 = 0;

        while let Some(chunk) = stream.next().await {
            let chunk = chunk.map_err(DownloadError::transport)?;
            writer.write_all(&chunk).await?;
            written += chunk.len() as u64;
        }

        writer.flush().await?;
        let mut file = writer.into_inner();
        file.sync_all().await?;
        drop(file);

        let size = tokio::fs::metadata(artifact.path()).await?.len();
        if size != written {
            log::warn!(
                "Artifact {} measured {} bytes but {} were streamed",
                artifact.path().display(),
                size,
                written
            );
        }
        artifact.record_size(size);

        log::info!(
            "✅ Download complete: {} ({:.2} MB)",
            artifact.path().display(),
            size as f64 / (1024.0 * 1024.0)
        );

        Ok(size)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    #[tokio::test]
    async fn test_fetch_writes_and_measures() {
        let server = MockServer::start().await;
        let body = vec![7u8; 256 * 1024 + 13];
        Mock::given(method("GET"))
            .and(path("/get/abc.mp4"))
            .respond_with(ResponseTemplate::new(200).set_body_bytes(body.clone()))
            .mount(&server)
            .await;

        let dir = tempfile::tempdir().unwrap();
        let mut artifact = LocalArtifact::create(dir.path(), "abc").await.unwrap();
        let url = Url::parse(&format!("{}/get/abc.mp4", server.uri())).unwrap();

        let size = Fetcher::new().unwrap().fetch(&url, &mut artifact).await.unwrap();

        assert_eq!(size, body.len() as u64);
        assert_eq!(artifact.size_bytes(), Some(size));
        assert_eq!(std::fs::read(artifact.path()).unwrap(), body);
        artifact.remove().await.unwrap();
    }

    #[tokio::test]
    async fn test_fetch_rejects_error_status() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(404))
            .mount(&server)
            .await;

        let dir = tempfile::tempdir().unwrap();
        let mut artifact = LocalArtifact::create(dir.path(), "abc").await.unwrap();
        let url = Url::parse(&format!("{}/gone.mp4", server.uri())).unwrap();

        let err = Fetcher::new().unwrap().fetch(&url, &mut artifact).await.unwrap_err();
        assert!(matches!(err, DownloadError::Status(s) if s == reqwest::StatusCode::NOT_FOUND));
        assert_eq!(artifact.size_bytes(), None);
        artifact.remove().await.unwrap();
    }

    #[tokio::test]
    async fn test_stalled_host_times_out() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_bytes(vec![1u8; 10])
                    .set_delay(Duration::from_secs(30)),
            )
            .mount(&server)
            .await;

        let dir = tempfile::tempdir().unwrap();
        let mut artifact = LocalArtifact::create(dir.path(), "abc").await.unwrap();
        let url = Url::parse(&format!("{}/token/v.mp4?sig=single-use", server.uri())).unwrap();
        let fetcher = Fetcher::with_timeouts(Duration::from_millis(200), Duration::from_secs(1)).unwrap();

        let err = tokio::time::timeout(Duration::from_secs(10), fetcher.fetch(&url, &mut artifact))
            .await
            .expect("fetch should give up on its own")
            .unwrap_err();

        assert!(matches!(err, DownloadError::Transport(_)), "{:?}", err);
        assert!(!err.to_string().contains("single-use"));
        assert_eq!(artifact.size_bytes(), None);
        artifact.remove().await.unwrap();
    }

    #[test]
    fn test_default_timeouts_are_bounded() {
        assert!(config::network::read_timeout() < config::network::download_timeout());
        assert!(Fetcher::new().is_ok());
    }

    #[tokio::test]
    async fn test_writer_is_single_use() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(200).set_body_bytes(vec![1u8; 10]))
            .mount(&server)
            .await;

        let dir = tempfile::tempdir().unwrap();
        let mut artifact = LocalArtifact::create(dir.path(), "abc").await.unwrap();
        let url = Url::parse(&format!("{}/v.mp4", server.uri())).unwrap();
        let fetcher = Fetcher::new().unwrap();

        fetcher.fetch(&url, &mut artifact).await.unwrap();
        let err = fetcher.fetch(&url, &mut artifact).await.unwrap_err();
        assert!(matches!(err, DownloadError::Io(_)));
        artifact.remove().await.unwrap();
    }
}
