use std::cmp::Reverse;
use std::collections::HashMap;

use tokio::sync::RwLock;

use crate::error::{GonkError, Result};
use crate::scheduler::job::{Job, JobId, JobOutcome, JobStatus};

/// Registry of every job submitted during the process lifetime.
///
/// All reads and writes of a record happen under one lock, so a reader never
/// observes a half-applied result. Records are never removed.
#[derive(Debug, Default)]
pub struct JobStore {
    inner: RwLock<StoreInner>,
}

#[derive(Debug, Default)]
struct StoreInner {
    jobs: HashMap<JobId, Job>,
    next_seq: u64,
}

impl JobStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a new `running` job and return its identifier.
    pub async fn create(&self, script: String, args: String, command: String) -> JobId {
        self.record(script, args, command, JobStatus::Running).await.id
    }

    /// Insert a new `queued` job that will start once a slot frees up.
    pub async fn create_queued(&self, script: String, args: String, command: String) -> JobId {
        self.record(script, args, command, JobStatus::Queued).await.id
    }

    /// Insert a new job in `status` and return a copy of the record as stored.
    pub(crate) async fn record(
        &self,
        script: String,
        args: String,
        command: String,
        status: JobStatus,
    ) -> Job {
        let mut inner = self.inner.write().await;

        let mut id = JobId::generate();
        while inner.jobs.contains_key(&id) {
            id = JobId::generate();
        }

        let mut job = Job::new(id.clone(), script, args, command, status);
        job.seq = inner.next_seq;
        inner.next_seq += 1;
        inner.jobs.insert(id, job.clone());
        job
    }

    /// Move a `queued` job to `running`.
    pub async fn mark_running(&self, id: &JobId) -> Result<()> {
        let mut inner = self.inner.write().await;
        let job = inner
            .jobs
            .get_mut(id)
            .ok_or_else(|| GonkError::JobNotFound(id.to_string()))?;

        match job.status {
            JobStatus::Queued => {
                job.status = JobStatus::Running;
                Ok(())
            }
            JobStatus::Running => Ok(()),
            JobStatus::Success | JobStatus::Error => {
                Err(GonkError::JobAlreadyFinished(id.to_string()))
            }
        }
    }

    /// Record the terminal outcome of a job.
    ///
    /// Fails without touching the record if the job is unknown or already
    /// terminal.
    pub async fn complete(&self, id: &JobId, outcome: JobOutcome) -> Result<JobStatus> {
        let mut inner = self.inner.write().await;
        let job = inner
            .jobs
            .get_mut(id)
            .ok_or_else(|| GonkError::JobNotFound(id.to_string()))?;

        if job.status.is_terminal() {
            return Err(GonkError::JobAlreadyFinished(id.to_string()));
        }

        job.finish(outcome);
        Ok(job.status)
    }

    pub async fn get(&self, id: &JobId) -> Option<Job> {
        self.inner.read().await.jobs.get(id).cloned()
    }

    /// All jobs, most recently started first.
    pub async fn snapshot(&self) -> Vec<Job> {
        let mut jobs: Vec<Job> = self.inner.read().await.jobs.values().cloned().collect();
        jobs.sort_by_key(|j| Reverse((j.started, j.seq)));
        jobs
    }

    pub async fn len(&self) -> usize {
        self.inner.read().await.jobs.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.inner.read().await.jobs.is_empty()
    }
}
