//! Download-and-delivery pipeline.
//!
//! One run handles one request:
//!   validate link → resolve direct URL → stream to artifact → route delivery
//!   → clean up (artifact removed, status message finished)
//!
//! Stages are an ordered list driven by a fixed loop. Each stage either lets
//! the run continue or ends it with an outcome; any stage error becomes a
//! `Failed` outcome. Cleanup runs after the loop on every path.

use std::path::{Path, PathBuf};
use std::sync::Arc;
use strum::{Display, IntoStaticStr};

use crate::core::validation::SourceLink;
use crate::download::artifact::LocalArtifact;
use crate::download::delivery::{DeliveryOutcome, DeliveryRouter};
use crate::download::error::PipelineError;
use crate::download::fetch::Fetcher;
use crate::download::request::DownloadRequest;
use crate::download::resolver::{LinkResolver, ResolvedDownload};
use crate::download::status::{self, StatusMessage};
use crate::download::transport::ChatTransport;

/// Where a run currently is.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display, IntoStaticStr)]
#[strum(serialize_all = "snake_case")]
pub enum PipelineStage {
    Idle,
    Validating,
    Resolving,
    Downloading,
    Routing,
    CleaningUp,
    Failed,
}

/// Stages in execution order.
pub const STAGES: [PipelineStage; 4] = [
    PipelineStage::Validating,
    PipelineStage::Resolving,
    PipelineStage::Downloading,
    PipelineStage::Routing,
];

/// Receives every stage transition of every run.
pub trait StageObserver: Send + Sync {
    fn on_stage(&self, request: &DownloadRequest, stage: PipelineStage);
}

/// Default observer: debug-level log line per transition.
pub struct LogObserver;

impl StageObserver for LogObserver {
    fn on_stage(&self, request: &DownloadRequest, stage: PipelineStage) {
        log::debug!(
            "chat {} msg {}: {}",
            request.conversation,
            request.message_id,
            stage
        );
    }
}

/// Result of a finished run.
#[derive(Debug)]
pub struct RunReport {
    pub outcome: DeliveryOutcome,
    /// Artifact path used by the run, if one was created
    pub artifact_path: Option<PathBuf>,
}

/// State threaded through the stages of one run.
#[derive(Default)]
struct RunState {
    link: Option<SourceLink>,
    resolved: Option<ResolvedDownload>,
    artifact: Option<LocalArtifact>,
    status: Option<StatusMessage>,
}

enum Flow {
    Continue,
    Finish(DeliveryOutcome),
}

/// The per-request pipeline. Shared by all conversations.
pub struct Pipeline {
    resolver: Arc<dyn LinkResolver>,
    fetcher: Fetcher,
    router: DeliveryRouter,
    download_dir: PathBuf,
    observer: Arc<dyn StageObserver>,
}

impl Pipeline {
    pub fn new(resolver: Arc<dyn LinkResolver>, fetcher: Fetcher, router: DeliveryRouter, download_dir: PathBuf) -> Self {
        Self {
            resolver,
            fetcher,
            router,
            download_dir,
            observer: Arc::new(LogObserver),
        }
    }

    pub fn with_observer(mut self, observer: Arc<dyn StageObserver>) -> Self {
        self.observer = observer;
        self
    }

    pub fn download_dir(&self) -> &Path {
        &self.download_dir
    }

    pub fn router(&self) -> &DeliveryRouter {
        &self.router
    }

    /// Executes one run to completion. Never leaves a file or status behind.
    pub async fn run(&self, request: &DownloadRequest, transport: &dyn ChatTransport) -> RunReport {
        let mut state = RunState::default();
        let mut outcome = None;

        for stage in STAGES {
            self.observer.on_stage(request, stage);
            match self.run_stage(stage, request, transport, &mut state).await {
                Ok(Flow::Continue) => {}
                Ok(Flow::Finish(done)) => {
                    outcome = Some(done);
                    break;
                }
                Err(e) => {
                    self.observer.on_stage(request, PipelineStage::Failed);
                    outcome = Some(DeliveryOutcome::Failed(e));
                    break;
                }
            }
        }

        let outcome = outcome.unwrap_or_else(|| {
            // Routing always finishes the run; reaching here means the stage list is broken.
            log::error!("Pipeline ended without an outcome for chat {}", request.conversation);
            DeliveryOutcome::Failed(missing("outcome"))
        });

        self.observer.on_stage(request, PipelineStage::CleaningUp);
        let artifact_path = self.clean_up(request, transport, &mut state, &outcome).await;
        self.observer.on_stage(request, PipelineStage::Idle);

        match &outcome {
            DeliveryOutcome::Failed(e) => log::warn!(
                "Run for chat {} (msg {}) failed at {}: {}",
                request.conversation,
                request.message_id,
                e.kind(),
                e
            ),
            done => log::info!(
                "Run for chat {} (msg {}) finished: {}",
                request.conversation,
                request.message_id,
                done
            ),
        }

        RunReport { outcome, artifact_path }
    }

    async fn run_stage(
        &self,
        stage: PipelineStage,
        request: &DownloadRequest,
        transport: &dyn ChatTransport,
        state: &mut RunState,
    ) -> Result<Flow, PipelineError> {
        match stage {
            PipelineStage::Validating => {
                state.link = Some(SourceLink::parse(&request.source_text)?);
                Ok(Flow::Continue)
            }
            PipelineStage::Resolving => {
                state.status = Some(StatusMessage::post(transport, request.message_id, status::DOWNLOADING).await?);
                let link = state.link.as_ref().ok_or_else(|| missing("link"))?;
                state.resolved = Some(self.resolver.resolve(link).await?);
                Ok(Flow::Continue)
            }
            PipelineStage::Downloading => {
                if let Some(status) = state.status.as_mut() {
                    status.update(transport, status::FETCHING).await;
                }
                let link = state.link.as_ref().ok_or_else(|| missing("link"))?;
                let resolved = state.resolved.take().ok_or_else(|| missing("resolved URL"))?;

                // Stored before fetching so a partial file is cleaned up too.
                let artifact = state
                    .artifact
                    .insert(LocalArtifact::create(&self.download_dir, link.video_id()).await?);
                self.fetcher.fetch(&resolved.direct_url, artifact).await?;
                Ok(Flow::Continue)
            }
            PipelineStage::Routing => {
                if let Some(status) = state.status.as_mut() {
                    status.update(transport, status::UPLOADING).await;
                }
                let artifact = state.artifact.as_ref().ok_or_else(|| missing("artifact"))?;
                let outcome = self.router.route(artifact, request, transport).await?;
                Ok(Flow::Finish(outcome))
            }
            PipelineStage::Idle | PipelineStage::CleaningUp | PipelineStage::Failed => Ok(Flow::Continue),
        }
    }

    /// Removes the artifact and resolves the status message to a terminal state.
    async fn clean_up(
        &self,
        request: &DownloadRequest,
        transport: &dyn ChatTransport,
        state: &mut RunState,
        outcome: &DeliveryOutcome,
    ) -> Option<PathBuf> {
        let artifact_path = match state.artifact.take() {
            Some(artifact) => {
                let path = artifact.path().to_path_buf();
                if let Err(e) = artifact.remove().await {
                    log::error!("Failed to remove artifact {}: {}", path.display(), e);
                }
                Some(path)
            }
            None => None,
        };

        let status = state.status.take();
        match outcome {
            DeliveryOutcome::Failed(e) if !e.is_reportable() => {
                log::info!("Chat {} blocked the bot, not replying", request.conversation);
            }
            DeliveryOutcome::Failed(e) => match status {
                Some(status) => status.finish_err(transport, e.user_message()).await,
                None => {
                    if let Err(send_err) = transport.reply_text(request.message_id, e.user_message()).await {
                        log::error!("Failed to report failure to chat {}: {}", request.conversation, send_err);
                    }
                }
            },
            _ => {
                if let Some(status) = status {
                    status.finish_ok(transport).await;
                }
            }
        }

        artifact_path
    }
}

fn missing(what: &str) -> PipelineError {
    log::error!("Pipeline state missing {}", what);
    PipelineError::Internal(format!("pipeline state missing {}", what))
}
