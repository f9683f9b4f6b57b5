//! Submission and observation of jobs.

use crate::progress::ProgressReporter;
use crate::runner::JobRunner;
use crate::Services;
use std::collections::HashMap;
use std::sync::Arc;
use storybooker_core::{JobId, JobRequest, JobSnapshot};
use storybooker_error::{JobError, JobErrorKind, StorybookerResult};
use tokio::sync::{RwLock, watch};
use tracing::{debug, info, instrument};

/// Every job this process has accepted, keyed by id.
///
/// The registry only holds receivers. Each job's runner task holds the
/// single sender, so observers never write job state.
#[derive(Debug, Clone)]
pub struct JobRegistry {
    services: Arc<Services>,
    jobs: Arc<RwLock<HashMap<JobId, watch::Receiver<JobSnapshot>>>>,
}

impl JobRegistry {
    /// Registry dispatching jobs against `services`.
    pub fn new(services: Arc<Services>) -> Self {
        Self {
            services,
            jobs: Arc::new(RwLock::new(HashMap::new())),
        }
    }

    /// Shared collaborators.
    pub fn services(&self) -> &Arc<Services> {
        &self.services
    }

    /// Validate `request`, register a pending job and start it in the
    /// background.
    ///
    /// # Errors
    ///
    /// Rejects requests that fail normalization or pin characters the
    /// character store does not know. No job is created in that case.
    #[instrument(skip(self, request), fields(theme = %request.theme))]
    pub async fn submit(&self, request: JobRequest) -> StorybookerResult<JobId> {
        let request = request.normalized(&self.services.limits)?;

        for id in &request.pinned_character_ids {
            if !self.services.characters.exists(id).await? {
                return Err(JobError::new(
                    JobErrorKind::ContractViolation,
                    format!("unknown character id '{}'", id),
                )
                .into());
            }
        }

        let id = JobId::new();
        let (reporter, rx) = ProgressReporter::new(id, request.languages.clone());
        self.jobs.write().await.insert(id, rx);

        let runner = JobRunner::new(Arc::clone(&self.services), request, reporter);
        tokio::spawn(runner.run());
        info!(job = %id, "Job submitted");
        Ok(id)
    }

    /// Latest snapshot of a job.
    pub async fn snapshot(&self, id: JobId) -> Option<JobSnapshot> {
        self.jobs.read().await.get(&id).map(|rx| rx.borrow().clone())
    }

    /// Receiver that observes every change to a job.
    pub async fn subscribe(&self, id: JobId) -> Option<watch::Receiver<JobSnapshot>> {
        self.jobs.read().await.get(&id).cloned()
    }

    /// Wait until a job reaches Completed or Failed.
    ///
    /// Returns `None` for unknown ids.
    pub async fn wait(&self, id: JobId) -> Option<JobSnapshot> {
        let mut rx = self.subscribe(id).await?;
        // A closed channel means the runner finished; its last write is terminal.
        if let Ok(snapshot) = rx.wait_for(|s| s.status.is_terminal()).await {
            return Some(snapshot.clone());
        }
        debug!(job = %id, "Runner dropped before observer caught up");
        let snapshot = rx.borrow().clone();
        Some(snapshot)
    }

    /// Snapshots of every known job.
    pub async fn list(&self) -> Vec<JobSnapshot> {
        let mut snapshots: Vec<JobSnapshot> = self
            .jobs
            .read()
            .await
            .values()
            .map(|rx| rx.borrow().clone())
            .collect();
        snapshots.sort_by_key(|s| s.created_at);
        snapshots
    }
}
