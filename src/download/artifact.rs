//! Local artifact — the on-disk copy of one request's video.
//!
//! Each run gets its own path `<video_id>-<uuid>.mp4`, created with
//! create-or-fail semantics so two runs can never write to the same file.
//! The artifact is removed with [`LocalArtifact::remove`] on every exit path;
//! `Drop` removes it synchronously if the owning run was abandoned mid-way.

use std::io;
use std::path::{Path, PathBuf};
use tokio::fs::{File, OpenOptions};
use uuid::Uuid;

use crate::core::validation::sanitize_file_stem;
use crate::download::error::DownloadError;

/// Exclusively owned downloaded file.
#[derive(Debug)]
pub struct LocalArtifact {
    path: PathBuf,
    writer: Option<File>,
    size_bytes: Option<u64>,
    removed: bool,
}

impl LocalArtifact {
    /// Atomically creates a fresh artifact file in `dir` for `video_id`.
    pub async fn create(dir: &Path, video_id: &str) -> Result<Self, DownloadError> {
        tokio::fs::create_dir_all(dir).await?;

        let file_name = format!("{}-{}.mp4", sanitize_file_stem(video_id), Uuid::new_v4().simple());
        let path = dir.join(file_name);

        let writer = OpenOptions::new()
            .write(true)
            .create_new(true)
            .open(&path)
            .await
            .map_err(|e| match e.kind() {
                io::ErrorKind::AlreadyExists => DownloadError::Collision(path.clone()),
                _ => DownloadError::Io(e),
            })?;

        log::debug!("Created artifact {}", path.display());

        Ok(Self {
            path,
            writer: Some(writer),
            size_bytes: None,
            removed: false,
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Measured size, available once the download finished.
    pub fn size_bytes(&self) -> Option<u64> {
        self.size_bytes
    }

    /// Hands out the write half; only the first call gets it.
    pub(crate) fn take_writer(&mut self) -> Option<File> {
        self.writer.take()
    }

    pub(crate) fn record_size(&mut self, size: u64) {
        self.size_bytes = Some(size);
    }

    /// Deletes the file. A file that is already gone counts as removed.
    pub async fn remove(mut self) -> io::Result<()> {
        // Close our handle before unlinking.
        drop(self.writer.take());
        self.removed = true;

        match tokio::fs::remove_file(&self.path).await {
            Ok(()) => {
                log::debug!("Removed artifact {}", self.path.display());
                Ok(())
            }
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e),
        }
    }
}

impl Drop for LocalArtifact {
    fn drop(&mut self) {
        if self.removed {
            return;
        }
        drop(self.writer.take());
        match std::fs::remove_file(&self.path) {
            Ok(()) => log::warn!("Artifact {} removed on drop (run abandoned)", self.path.display()),
            Err(e) if e.kind() == io::ErrorKind::NotFound => {}
            Err(e) => log::error!("Failed to remove abandoned artifact {}: {}", self.path.display(), e),
        }
    }
}
