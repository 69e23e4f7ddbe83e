//! Recording implementations of `ChatTransport`, `LinkResolver`, `FileRelay`
//! and `StageObserver`.

#![allow(dead_code)]

use async_trait::async_trait;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicI32, AtomicUsize, Ordering};
use std::sync::Mutex;
use std::time::Duration;
use url::Url;

use tapebot::core::validation::SourceLink;
use tapebot::download::error::{ResolveError, TransportError};
use tapebot::download::pipeline::{PipelineStage, StageObserver};
use tapebot::download::request::DownloadRequest;
use tapebot::download::resolver::{LinkResolver, ResolvedDownload};
use tapebot::download::transport::{ChatTransport, MessageRef};
use tapebot::relay::{FileRelay, RelayError};

/// One outbound chat operation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Sent {
    Text {
        id: MessageRef,
        reply_to: MessageRef,
        text: String,
    },
    Edit {
        id: MessageRef,
        text: String,
    },
    Delete {
        id: MessageRef,
    },
    /// Size is read from disk at upload time
    Video {
        reply_to: MessageRef,
        size: u64,
    },
}

/// Chat transport that records every call.
pub struct RecordingTransport {
    sent: Mutex<Vec<Sent>>,
    next_id: AtomicI32,
    fail_video: Option<TransportError>,
    fail_edit: Option<TransportError>,
}

impl RecordingTransport {
    pub fn new() -> Self {
        Self {
            sent: Mutex::new(Vec::new()),
            next_id: AtomicI32::new(100),
            fail_video: None,
            fail_edit: None,
        }
    }

    pub fn failing_video(mut self, err: TransportError) -> Self {
        self.fail_video = Some(err);
        self
    }

    pub fn failing_edits(mut self, err: TransportError) -> Self {
        self.fail_edit = Some(err);
        self
    }

    pub fn sent(&self) -> Vec<Sent> {
        self.sent.lock().unwrap().clone()
    }

    /// Texts of all replies, in order.
    pub fn replies(&self) -> Vec<String> {
        self.sent()
            .into_iter()
            .filter_map(|s| match s {
                Sent::Text { text, .. } => Some(text),
                _ => None,
            })
            .collect()
    }

    fn record(&self, sent: Sent) {
        self.sent.lock().unwrap().push(sent);
    }
}

#[async_trait]
impl ChatTransport for RecordingTransport {
    async fn reply_text(&self, reply_to: MessageRef, text: &str) -> Result<MessageRef, TransportError> {
        let id = self.next_id.fetch_add(1, Ordering::SeqCst);
        self.record(Sent::Text {
            id,
            reply_to,
            text: text.to_string(),
        });
        Ok(id)
    }

    async fn edit_text(&self, message: MessageRef, text: &str) -> Result<(), TransportError> {
        if let Some(err) = &self.fail_edit {
            return Err(err.clone());
        }
        self.record(Sent::Edit {
            id: message,
            text: text.to_string(),
        });
        Ok(())
    }

    async fn delete(&self, message: MessageRef) -> Result<(), TransportError> {
        self.record(Sent::Delete { id: message });
        Ok(())
    }

    async fn reply_video(&self, reply_to: MessageRef, path: &Path) -> Result<(), TransportError> {
        if let Some(err) = &self.fail_video {
            return Err(err.clone());
        }
        let size = std::fs::metadata(path)
            .map_err(|e| TransportError::Api(format!("video file unreadable: {}", e)))?
            .len();
        self.record(Sent::Video { reply_to, size });
        Ok(())
    }
}

/// Resolver returning a fixed URL (or a fixed failure) and counting calls.
pub struct StubResolver {
    direct_url: Url,
    reject: bool,
    delay: Duration,
    calls: AtomicUsize,
}

impl StubResolver {
    pub fn ok(direct_url: Url) -> Self {
        Self {
            direct_url,
            reject: false,
            delay: Duration::ZERO,
            calls: AtomicUsize::new(0),
        }
    }

    pub fn rejecting() -> Self {
        Self {
            reject: true,
            ..Self::ok(Url::parse("http://unused.invalid/").unwrap())
        }
    }

    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl LinkResolver for StubResolver {
    async fn resolve(&self, _link: &SourceLink) -> Result<ResolvedDownload, ResolveError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if !self.delay.is_zero() {
            tokio::time::sleep(self.delay).await;
        }
        if self.reject {
            return Err(ResolveError::Rejected {
                status: 403,
                msg: "Username or password invalid".to_string(),
            });
        }
        Ok(ResolvedDownload {
            direct_url: self.direct_url.clone(),
            name: Some("video.mp4".to_string()),
            reported_size: None,
        })
    }
}

/// One relay upload as seen by the relay.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RelayedFile {
    pub destination: i64,
    pub path: PathBuf,
    pub caption: String,
    pub size: u64,
}

/// Relay that records uploads instead of talking to Telegram.
#[derive(Default)]
pub struct RecordingRelay {
    sent: Mutex<Vec<RelayedFile>>,
    fail: bool,
}

impl RecordingRelay {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn failing() -> Self {
        Self {
            fail: true,
            ..Self::default()
        }
    }

    pub fn sent(&self) -> Vec<RelayedFile> {
        self.sent.lock().unwrap().clone()
    }
}

#[async_trait]
impl FileRelay for RecordingRelay {
    async fn send_file(&self, destination: i64, path: &Path, caption: &str) -> Result<(), RelayError> {
        if self.fail {
            return Err(RelayError::NotAuthorized);
        }
        let size = std::fs::metadata(path)?.len();
        self.sent.lock().unwrap().push(RelayedFile {
            destination,
            path: path.to_path_buf(),
            caption: caption.to_string(),
            size,
        });
        Ok(())
    }
}

/// Observer that records `(conversation, message, stage)` for every transition.
#[derive(Default)]
pub struct RecordingObserver {
    events: Mutex<Vec<(i64, MessageRef, PipelineStage)>>,
}

impl RecordingObserver {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn events(&self) -> Vec<(i64, MessageRef, PipelineStage)> {
        self.events.lock().unwrap().clone()
    }

    /// Stages seen for one request, in order.
    pub fn stages_of(&self, message_id: MessageRef) -> Vec<PipelineStage> {
        self.events()
            .into_iter()
            .filter(|(_, id, _)| *id == message_id)
            .map(|(_, _, stage)| stage)
            .collect()
    }

    /// Position of the first matching event, if any.
    pub fn position(&self, message_id: MessageRef, stage: PipelineStage) -> Option<usize> {
        self.events()
            .iter()
            .position(|(_, id, s)| *id == message_id && *s == stage)
    }
}

impl StageObserver for RecordingObserver {
    fn on_stage(&self, request: &DownloadRequest, stage: PipelineStage) {
        self.events
            .lock()
            .unwrap()
            .push((request.conversation.0, request.message_id, stage));
    }
}
