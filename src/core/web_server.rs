//! Static file endpoint for oversized videos.
//!
//! Used when no relay session is configured: the most recently published
//! artifact is served at `/` and `/video.mp4` on STATIC_PORT (default 3000).

use axum::{routing::get, Router};
use std::net::SocketAddr;
use std::path::{Path, PathBuf};
use tokio::net::TcpListener;
use tower_http::services::ServeFile;

/// Name of the single published slot inside the publish directory.
pub const PUBLISHED_FILE_NAME: &str = "video.mp4";

/// Path of the published slot for a publish directory.
pub fn published_path(publish_dir: &Path) -> PathBuf {
    publish_dir.join(PUBLISHED_FILE_NAME)
}

/// Builds the router serving the published slot.
pub fn static_router(publish_dir: &Path) -> Router {
    let file = published_path(publish_dir);

    Router::new()
        .route_service("/", ServeFile::new(&file))
        .route_service("/video.mp4", ServeFile::new(&file))
        .route("/health", get(|| async { "ok" }))
}

/// Start the static file server.
pub async fn start_static_server(port: u16, publish_dir: PathBuf) -> Result<(), std::io::Error> {
    let addr = SocketAddr::from(([0, 0, 0, 0], port));
    let app = static_router(&publish_dir);

    log::info!("Starting static file server on http://{}", addr);
    log::info!("  /           - last published video");
    log::info!("  /video.mp4  - last published video");
    log::info!("  /health     - Health check");

    let listener = TcpListener::bind(&addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_serves_published_file() {
        let dir = tempfile::tempdir().unwrap();
        tokio::fs::write(published_path(dir.path()), b"video-bytes").await.unwrap();

        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let app = static_router(dir.path());
        tokio::spawn(async move {
            let _ = axum::serve(listener, app).await;
        });

        let body = reqwest::get(format!("http://{}/video.mp4", addr))
            .await
            .unwrap()
            .bytes()
            .await
            .unwrap();
        assert_eq!(&body[..], b"video-bytes");

        let health = reqwest::get(format!("http://{}/health", addr)).await.unwrap();
        assert_eq!(health.text().await.unwrap(), "ok");
    }

    #[tokio::test]
    async fn test_missing_file_is_404() {
        let dir = tempfile::tempdir().unwrap();
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let app = static_router(dir.path());
        tokio::spawn(async move {
            let _ = axum::serve(listener, app).await;
        });

        let resp = reqwest::get(format!("http://{}/", addr)).await.unwrap();
        assert_eq!(resp.status(), reqwest::StatusCode::NOT_FOUND);
    }
}
