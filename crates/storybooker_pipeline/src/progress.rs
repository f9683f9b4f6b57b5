//! Single-writer job progress.

use chrono::Utc;
use std::collections::BTreeMap;
use storybooker_core::{
    DegradedAsset, DocumentHandle, ErrorDetail, JobArtifacts, JobId, JobSnapshot, JobStatus,
};
use tokio::sync::watch;
use tracing::{info, warn};

/// Progress at the start of each phase.
pub mod milestones {
    /// Pinned characters loading
    pub const LOADING: u8 = 0;
    /// Story writing
    pub const STORY: u8 = 5;
    /// Story accepted
    pub const STORY_READY: u8 = 10;
    /// Cover in flight
    pub const COVER: u8 = 11;
    /// Character extraction in flight
    pub const CHARACTERS: u8 = 12;
    /// Reference images in flight
    pub const REFERENCES: u8 = 14;
    /// Art direction spans `PROMPTS..PROMPTS + PROMPTS_SPAN`
    pub const PROMPTS: u8 = 14;
    /// Width of the art direction range
    pub const PROMPTS_SPAN: u8 = 16;
    /// Page images span `IMAGES..IMAGES + IMAGES_SPAN`
    pub const IMAGES: u8 = 30;
    /// Width of the page image range
    pub const IMAGES_SPAN: u8 = 30;
    /// Every page image attempted
    pub const IMAGES_DONE: u8 = 60;
    /// Editions span `EDITIONS..EDITIONS + EDITIONS_SPAN`
    pub const EDITIONS: u8 = 70;
    /// Width of the edition range
    pub const EDITIONS_SPAN: u8 = 25;
    /// Completed
    pub const DONE: u8 = 100;
}

/// `base + span * done / total`, `base` when `total` is zero.
pub fn scaled(base: u8, span: u8, done: usize, total: usize) -> u8 {
    if total == 0 {
        return base;
    }
    let offset = usize::from(span) * done.min(total) / total;
    base.saturating_add(u8::try_from(offset).unwrap_or(span))
}

/// Owns the only sender of a job's snapshot channel.
///
/// Progress never decreases and the terminal state is written once; later
/// writes are ignored.
#[derive(Debug)]
pub struct ProgressReporter {
    id: JobId,
    tx: watch::Sender<JobSnapshot>,
}

impl ProgressReporter {
    /// Reporter for a new pending job, with its first receiver.
    pub fn new(id: JobId, languages: Vec<String>) -> (Self, watch::Receiver<JobSnapshot>) {
        let (tx, rx) = watch::channel(JobSnapshot::pending(id, languages));
        (Self { id, tx }, rx)
    }

    /// Job this reporter writes.
    pub fn id(&self) -> JobId {
        self.id
    }

    /// Another receiver for the snapshot.
    pub fn subscribe(&self) -> watch::Receiver<JobSnapshot> {
        self.tx.subscribe()
    }

    /// Copy of the current snapshot.
    pub fn snapshot(&self) -> JobSnapshot {
        self.tx.borrow().clone()
    }

    fn update(&self, change: impl FnOnce(&mut JobSnapshot)) {
        self.tx.send_if_modified(|snapshot| {
            if snapshot.status.is_terminal() {
                return false;
            }
            change(snapshot);
            snapshot.updated_at = Utc::now();
            true
        });
    }

    /// Pending to Processing.
    pub fn start(&self) {
        self.update(|s| {
            s.status = JobStatus::Processing;
            s.current_step = "Starting".to_string();
        });
        info!(job = %self.id, "Job started");
    }

    /// Enter a step at `progress`, clamped so progress never decreases.
    pub fn step(&self, progress: u8, label: impl Into<String>) {
        let label = label.into();
        self.update(|s| {
            s.progress = s.progress.max(progress.min(milestones::DONE - 1));
            s.current_step = label;
        });
    }

    /// Raise progress without changing the step label.
    pub fn advance(&self, progress: u8) {
        self.update(|s| s.progress = s.progress.max(progress.min(milestones::DONE - 1)));
    }

    /// Record a non-fatal missing asset.
    pub fn degraded(&self, asset: impl Into<String>, reason: impl Into<String>) {
        let degraded = DegradedAsset {
            asset: asset.into(),
            reason: reason.into(),
        };
        warn!(job = %self.id, asset = %degraded.asset, reason = %degraded.reason, "Asset degraded");
        self.update(|s| s.degraded.push(degraded));
    }

    /// Edit intermediate artifacts.
    pub fn artifacts(&self, change: impl FnOnce(&mut JobArtifacts)) {
        self.update(|s| change(&mut s.artifacts));
    }

    /// Terminal success.
    pub fn complete(&self, outputs: BTreeMap<String, DocumentHandle>) {
        self.update(|s| {
            s.status = JobStatus::Completed;
            s.progress = milestones::DONE;
            s.current_step = "Completed".to_string();
            s.outputs_by_language = outputs;
        });
        info!(job = %self.id, "Job completed");
    }

    /// Terminal failure.
    pub fn fail(&self, detail: ErrorDetail) {
        warn!(job = %self.id, kind = %detail.kind, phase = %detail.phase, message = %detail.message, "Job failed");
        self.update(|s| {
            s.status = JobStatus::Failed;
            s.current_step = format!("Failed during {}", detail.phase);
            s.outputs_by_language.clear();
            s.error_detail = Some(detail);
        });
    }
}
