use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::sync::{Mutex, MutexGuard};

use crate::classifier::FilterVerdict;
use crate::extractor::{ChannelInfo, VideoInfo};
use crate::pipeline::secondary::SecondaryVerdict;

/// A classified channel, ready to persist.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChannelRecord {
    pub input: String,
    pub channel: ChannelInfo,
    pub videos: Vec<VideoInfo>,
    pub verdict: FilterVerdict,
    pub secondary: Option<SecondaryVerdict>,
    pub secondary_error: Option<String>,
    pub classified_at: DateTime<Utc>,
}

impl ChannelRecord {
    /// Accepted by the rules and, when consulted, by the secondary classifier.
    pub fn is_suitable(&self) -> bool {
        self.verdict.passed && self.secondary.as_ref().is_none_or(|s| s.suitable)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FailureRecord {
    pub input: String,
    pub error: String,
    pub blocked: bool,
    pub failed_at: DateTime<Utc>,
}

/// Persistence boundary of the pipeline.
#[async_trait]
pub trait ChannelStore: Send + Sync {
    /// Insert or replace; records with a stable channel id replace earlier
    /// records for the same id.
    async fn save_channel(&self, record: ChannelRecord) -> anyhow::Result<()>;

    async fn record_failure(&self, failure: FailureRecord) -> anyhow::Result<()>;

    /// Inputs among `candidates` that still need extraction/classification.
    async fn needing_classification(&self, candidates: &[String]) -> anyhow::Result<Vec<String>>;
}

/// In-process store for the CLI and tests.
#[derive(Debug, Default)]
pub struct MemoryStore {
    records: Mutex<Vec<ChannelRecord>>,
    failures: Mutex<Vec<FailureRecord>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn records(&self) -> Vec<ChannelRecord> {
        lock(&self.records).clone()
    }

    pub fn failures(&self) -> Vec<FailureRecord> {
        lock(&self.failures).clone()
    }
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

#[async_trait]
impl ChannelStore for MemoryStore {
    async fn save_channel(&self, record: ChannelRecord) -> anyhow::Result<()> {
        let mut records = lock(&self.records);
        let existing = record
            .channel
            .is_stable()
            .then(|| records.iter().position(|r| r.channel.id == record.channel.id))
            .flatten()
            .or_else(|| records.iter().position(|r| r.input == record.input));
        match existing {
            Some(i) => records[i] = record,
            None => records.push(record),
        }
        Ok(())
    }

    async fn record_failure(&self, failure: FailureRecord) -> anyhow::Result<()> {
        lock(&self.failures).push(failure);
        Ok(())
    }

    async fn needing_classification(&self, candidates: &[String]) -> anyhow::Result<Vec<String>> {
        let records = lock(&self.records);
        Ok(candidates
            .iter()
            .filter(|c| !records.iter().any(|r| &r.input == *c))
            .cloned()
            .collect())
    }
}
