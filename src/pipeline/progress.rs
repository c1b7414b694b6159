use serde::Serialize;
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum RunState {
    Running,
    Finished,
    /// Stopped by a block page; needs an operator before resuming.
    Halted,
    Cancelled,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ItemStatus {
    Accepted,
    Rejected,
    /// Passed the rules, turned down by the secondary classifier.
    SecondaryRejected,
    Failed,
    Skipped,
}

/// Point-in-time view of a batch, sent after every item.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ProgressSnapshot {
    pub session: Uuid,
    pub state: RunState,
    pub total: usize,
    pub processed: usize,
    pub accepted: usize,
    pub rejected: usize,
    pub failed: usize,
    pub skipped: usize,
    pub current: Option<String>,
    pub last_status: Option<ItemStatus>,
}

impl ProgressSnapshot {
    pub fn new(session: Uuid, total: usize) -> Self {
        Self {
            session,
            state: RunState::Running,
            total,
            processed: 0,
            accepted: 0,
            rejected: 0,
            failed: 0,
            skipped: 0,
            current: None,
            last_status: None,
        }
    }

    pub fn record(&mut self, status: ItemStatus) {
        self.processed += 1;
        match status {
            ItemStatus::Accepted => self.accepted += 1,
            ItemStatus::Rejected | ItemStatus::SecondaryRejected => self.rejected += 1,
            ItemStatus::Failed => self.failed += 1,
            ItemStatus::Skipped => self.skipped += 1,
        }
        self.last_status = Some(status);
    }
}
