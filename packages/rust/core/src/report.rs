//! Per-entry outcomes of a run and their aggregate.

use std::time::Duration;

use tracing::{error, info};

use releasebot_shared::EntryKey;

/// What happened to one entry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EntryOutcome {
    /// Published; `post_id` is the destination's id for the new post.
    Posted { post_id: String },
    /// Key already in the ledger.
    Skipped,
    /// Render or submit failed; the key was not recorded and the entry will be retried next run.
    Failed { reason: String },
}

/// Outcome of one entry together with what identifies it in logs.
#[derive(Debug, Clone)]
pub struct EntryReport {
    pub key: EntryKey,
    pub url: String,
    pub title: String,
    pub outcome: EntryOutcome,
}

/// Result of a full run, in processing (oldest-first) order.
#[derive(Debug, Default)]
pub struct RunReport {
    pub entries: Vec<EntryReport>,
    pub elapsed: Duration,
}

impl RunReport {
    pub fn posted(&self) -> usize {
        self.count(|o| matches!(o, EntryOutcome::Posted { .. }))
    }

    pub fn skipped(&self) -> usize {
        self.count(|o| matches!(o, EntryOutcome::Skipped))
    }

    pub fn failed(&self) -> usize {
        self.count(|o| matches!(o, EntryOutcome::Failed { .. }))
    }

    fn count(&self, pred: impl Fn(&EntryOutcome) -> bool) -> usize {
        self.entries.iter().filter(|e| pred(&e.outcome)).count()
    }

    /// Emit one log event per entry, then a summary.
    pub fn log(&self) {
        for entry in &self.entries {
            match &entry.outcome {
                EntryOutcome::Posted { post_id } => info!(
                    key = %entry.key,
                    url = %entry.url,
                    %post_id,
                    "posted entry"
                ),
                EntryOutcome::Skipped => info!(
                    key = %entry.key,
                    url = %entry.url,
                    "entry already posted"
                ),
                EntryOutcome::Failed { reason } => error!(
                    key = %entry.key,
                    url = %entry.url,
                    %reason,
                    "failed to publish entry"
                ),
            }
        }

        info!(
            total = self.entries.len(),
            posted = self.posted(),
            skipped = self.skipped(),
            failed = self.failed(),
            elapsed_ms = self.elapsed.as_millis() as u64,
            "run finished"
        );
    }
}
