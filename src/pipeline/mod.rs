//! Batch driver: fetch, extract, classify and store one channel at a time.

pub mod progress;
pub mod secondary;
pub mod store;
pub mod urls;

pub use progress::{ItemStatus, ProgressSnapshot, RunState};
pub use secondary::{SecondaryClassifier, SecondaryVerdict};
pub use store::{ChannelRecord, ChannelStore, FailureRecord, MemoryStore};

use chrono::Utc;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;
use thiserror::Error;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tracing::{info, instrument, warn};
use url::Url;
use uuid::Uuid;

use crate::classifier::{ClassifierConfig, classify};
use crate::extractor::{
    ChannelInfo, ExtractError, VideoInfo, extract_channel_page, extract_video_page,
};
use crate::fetcher::{BlockedError, FetchError, Fetcher};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PipelineConfig {
    /// Origin that handles and channel ids are resolved against.
    pub base_url: String,
    pub fetch_videos: bool,
    pub video_limit: usize,
    /// Topic handed to the secondary classifier.
    pub secondary_topic: String,
    /// Skip candidates the store already has a record for.
    pub skip_classified: bool,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            base_url: "https://www.youtube.com".to_string(),
            fetch_videos: true,
            video_limit: 30,
            secondary_topic: "general".to_string(),
            skip_classified: true,
        }
    }
}

#[derive(Error, Debug)]
pub enum PipelineError {
    #[error("not a channel handle, id or url: {0}")]
    InvalidCandidate(String),

    #[error("invalid base url: {0}")]
    BaseUrl(#[from] url::ParseError),

    #[error(transparent)]
    Fetch(#[from] FetchError),

    #[error(transparent)]
    Extract(#[from] ExtractError),

    #[error("no channel data found at {0}")]
    Unresolved(String),

    #[error("classifier panicked")]
    ClassifierPanicked,

    #[error("store error: {0}")]
    Store(String),
}

/// How a batch ended.
#[derive(Debug, Clone)]
pub enum BatchOutcome {
    Completed(ProgressSnapshot),
    Cancelled(ProgressSnapshot),
    /// A block page stopped the batch at `input`; nothing after it was fetched.
    Halted {
        snapshot: ProgressSnapshot,
        input: String,
        blocked: BlockedError,
    },
}

impl BatchOutcome {
    pub fn snapshot(&self) -> &ProgressSnapshot {
        match self {
            Self::Completed(s) | Self::Cancelled(s) => s,
            Self::Halted { snapshot, .. } => snapshot,
        }
    }
}

pub struct Pipeline {
    fetcher: Arc<Fetcher>,
    store: Arc<dyn ChannelStore>,
    secondary: Option<Arc<dyn SecondaryClassifier>>,
    classifier: ClassifierConfig,
    config: PipelineConfig,
    base_url: Url,
    session: Uuid,
}

impl Pipeline {
    pub fn new(
        fetcher: Arc<Fetcher>,
        store: Arc<dyn ChannelStore>,
        classifier: ClassifierConfig,
        config: PipelineConfig,
    ) -> Result<Self, PipelineError> {
        let base_url = Url::parse(&config.base_url)?;
        Ok(Self {
            fetcher,
            store,
            secondary: None,
            classifier,
            config,
            base_url,
            session: Uuid::new_v4(),
        })
    }

    pub fn with_secondary(mut self, secondary: Arc<dyn SecondaryClassifier>) -> Self {
        self.secondary = Some(secondary);
        self
    }

    pub fn session(&self) -> Uuid {
        self.session
    }

    /// Process `candidates` in order, skipping failed items, until done,
    /// cancelled or blocked.
    #[instrument(skip_all, fields(session = %self.session, total = candidates.len()))]
    pub async fn run(
        &self,
        candidates: &[String],
        progress: Option<&mpsc::Sender<ProgressSnapshot>>,
        cancel: &CancellationToken,
    ) -> Result<BatchOutcome, PipelineError> {
        let pending = if self.config.skip_classified {
            self.store
                .needing_classification(candidates)
                .await
                .map_err(|e| PipelineError::Store(format!("{e:#}")))?
        } else {
            candidates.to_vec()
        };
        let pending_set: HashSet<&String> = pending.iter().collect();

        let mut snapshot = ProgressSnapshot::new(self.session, candidates.len());
        for _ in candidates.iter().filter(|c| !pending_set.contains(c)) {
            snapshot.record(ItemStatus::Skipped);
        }
        info!("Processing {} of {} candidates", pending.len(), candidates.len());

        for input in &pending {
            snapshot.current = Some(input.clone());
            send(progress, &snapshot).await;

            let result = tokio::select! {
                biased;
                _ = cancel.cancelled() => {
                    info!("Batch cancelled at {}", input);
                    snapshot.state = RunState::Cancelled;
                    send(progress, &snapshot).await;
                    return Ok(BatchOutcome::Cancelled(snapshot));
                }
                result = self.process(input) => result,
            };

            let status = match result {
                Ok(status) => status,
                Err(PipelineError::Fetch(FetchError::Blocked(blocked))) => {
                    warn!(
                        "Blocked at {} (marker {}, http {}); halting batch: {}",
                        blocked.url, blocked.marker, blocked.status, blocked.snippet
                    );
                    self.note_failure(input, blocked.to_string(), true).await;
                    snapshot.state = RunState::Halted;
                    send(progress, &snapshot).await;
                    return Ok(BatchOutcome::Halted {
                        snapshot,
                        input: input.clone(),
                        blocked,
                    });
                }
                Err(err) => {
                    warn!("Skipping {}: {}", input, err);
                    self.note_failure(input, err.to_string(), false).await;
                    ItemStatus::Failed
                }
            };
            snapshot.record(status);
        }

        snapshot.state = RunState::Finished;
        snapshot.current = None;
        send(progress, &snapshot).await;
        info!(
            "Batch finished: {} accepted, {} rejected, {} failed, {} skipped",
            snapshot.accepted, snapshot.rejected, snapshot.failed, snapshot.skipped
        );
        Ok(BatchOutcome::Completed(snapshot))
    }

    #[instrument(skip(self))]
    async fn process(&self, input: &str) -> Result<ItemStatus, PipelineError> {
        let target = urls::resolve(&self.base_url, input)
            .ok_or_else(|| PipelineError::InvalidCandidate(input.to_string()))?;

        let about_url = target.about_url();
        let html = self.fetcher.fetch_text(&about_url, None).await?;
        let channel =
            extract_channel_page(&html)?.ok_or_else(|| PipelineError::Unresolved(about_url))?;
        if !channel.is_stable() {
            warn!("Channel {} has no stable id", input);
        }

        let videos = self.fetch_videos(&target).await?;

        let verdict = std::panic::catch_unwind(AssertUnwindSafe(|| {
            classify(&channel, &videos, &self.classifier)
        }))
        .map_err(|_| PipelineError::ClassifierPanicked)?;
        info!(
            passed = verdict.passed,
            stage = ?verdict.failed_stage,
            "Classified {}: {}",
            input,
            verdict.reason
        );

        let (secondary, secondary_error) = if verdict.passed {
            self.consult_secondary(&channel, &videos).await
        } else {
            (None, None)
        };

        let record = ChannelRecord {
            input: input.to_string(),
            channel,
            videos,
            verdict,
            secondary,
            secondary_error,
            classified_at: Utc::now(),
        };
        let status = if !record.verdict.passed {
            ItemStatus::Rejected
        } else if record.is_suitable() {
            ItemStatus::Accepted
        } else {
            ItemStatus::SecondaryRejected
        };

        self.store
            .save_channel(record)
            .await
            .map_err(|e| PipelineError::Store(format!("{e:#}")))?;
        Ok(status)
    }

    /// A missing videos page never fails the channel; a block page does.
    async fn fetch_videos(&self, target: &urls::ChannelTarget) -> Result<Vec<VideoInfo>, PipelineError> {
        if !self.config.fetch_videos || self.config.video_limit == 0 {
            return Ok(Vec::new());
        }
        match self.fetcher.fetch_text(&target.videos_url(), None).await {
            Ok(html) => Ok(extract_video_page(&html, self.config.video_limit)),
            Err(err) if err.is_blocked() => Err(err.into()),
            Err(err) => {
                warn!("No videos for {}: {}", target.input, err);
                Ok(Vec::new())
            }
        }
    }

    async fn consult_secondary(
        &self,
        channel: &ChannelInfo,
        videos: &[VideoInfo],
    ) -> (Option<SecondaryVerdict>, Option<String>) {
        let Some(secondary) = &self.secondary else {
            return (None, None);
        };
        let titles: Vec<String> = videos.iter().filter_map(|v| v.title.clone()).collect();
        match secondary
            .analyze(
                channel.title.as_deref().unwrap_or_default(),
                channel.description.as_deref().unwrap_or_default(),
                &titles,
                &self.config.secondary_topic,
            )
            .await
        {
            Ok(verdict) => (Some(verdict), None),
            Err(err) => {
                warn!("Secondary classifier failed: {:#}", err);
                (None, Some(format!("{err:#}")))
            }
        }
    }

    async fn note_failure(&self, input: &str, error: String, blocked: bool) {
        let failure = FailureRecord {
            input: input.to_string(),
            error,
            blocked,
            failed_at: Utc::now(),
        };
        if let Err(e) = self.store.record_failure(failure).await {
            warn!("Failed to record failure for {}: {:#}", input, e);
        }
    }
}

async fn send(progress: Option<&mpsc::Sender<ProgressSnapshot>>, snapshot: &ProgressSnapshot) {
    if let Some(progress) = progress {
        let _ = progress.send(snapshot.clone()).await;
    }
}
