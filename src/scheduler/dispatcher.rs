use std::path::Path;
use std::sync::Arc;

use tokio::sync::Semaphore;

use crate::browser::is_runnable_script;
use crate::error::{GonkError, Result};
use crate::scheduler::args::split_args;
use crate::scheduler::job::{Job, JobId, JobOutcome, JobStatus};
use crate::scheduler::store::JobStore;
use crate::worker::{Invocation, ScriptRunner};

/// Accepts run requests, records them in the [`JobStore`] and hands each
/// one to its own background task.
///
/// `submit` returns as soon as the job is recorded; it never waits for the
/// process. Each job is attempted exactly once.
#[derive(Debug, Clone)]
pub struct Dispatcher {
    store: Arc<JobStore>,
    runner: Arc<ScriptRunner>,
    slots: Option<Arc<Semaphore>>,
    require_runnable: bool,
}

impl Dispatcher {
    pub fn new(store: Arc<JobStore>, runner: ScriptRunner) -> Self {
        Self {
            store,
            runner: Arc::new(runner),
            slots: None,
            require_runnable: false,
        }
    }

    /// Cap the number of jobs running at once. Extra jobs wait as `queued`.
    pub fn with_max_concurrent(mut self, limit: usize) -> Self {
        self.slots = Some(Arc::new(Semaphore::new(limit.max(1))));
        self
    }

    /// Only accept scripts classified as runnable by the browser.
    pub fn require_runnable(mut self, require: bool) -> Self {
        self.require_runnable = require;
        self
    }

    pub fn store(&self) -> &Arc<JobStore> {
        &self.store
    }

    /// Status a freshly submitted job is created with.
    pub fn initial_status(&self) -> JobStatus {
        if self.slots.is_some() {
            JobStatus::Queued
        } else {
            JobStatus::Running
        }
    }

    /// Validate a run request, record it and start it in the background.
    pub async fn submit(&self, script: &str, args: &str) -> Result<JobId> {
        self.submit_job(script, args).await.map(|job| job.id)
    }

    /// Like [`Dispatcher::submit`], but returns the record as it was created,
    /// before the background task could change it.
    ///
    /// `script` is stored exactly as supplied; surrounding whitespace only
    /// matters for the emptiness check.
    pub async fn submit_job(&self, script: &str, args: &str) -> Result<Job> {
        if script.trim().is_empty() {
            return Err(GonkError::InvalidSubmission(
                "No script specified".to_string(),
            ));
        }
        if self.require_runnable && !is_runnable_script(Path::new(script)) {
            return Err(GonkError::InvalidSubmission(format!(
                "Not a Python file: {}",
                script
            )));
        }

        let tokens = split_args(args)?;
        let command = self.runner.describe(script, &tokens);
        let invocation = Invocation::new(script, tokens);

        let job = self
            .store
            .record(
                script.to_string(),
                args.to_string(),
                command,
                self.initial_status(),
            )
            .await;

        tracing::info!(job_id = %job.id, script, args, "Job submitted");

        let store = self.store.clone();
        let runner = self.runner.clone();
        let slots = self.slots.clone();
        let job_id = job.id.clone();
        tokio::spawn(async move {
            Self::execute(store, runner, slots, job_id, invocation).await;
        });

        Ok(job)
    }

    async fn execute(
        store: Arc<JobStore>,
        runner: Arc<ScriptRunner>,
        slots: Option<Arc<Semaphore>>,
        job_id: JobId,
        invocation: Invocation,
    ) {
        // Held until the job is complete.
        let _permit = match slots {
            Some(slots) => match slots.acquire_owned().await {
                Ok(permit) => Some(permit),
                Err(_) => {
                    // The semaphore is never closed.
                    Self::finish(
                        &store,
                        &job_id,
                        JobOutcome::LaunchFailed {
                            message: "Job slots unavailable".to_string(),
                        },
                    )
                    .await;
                    return;
                }
            },
            None => None,
        };

        if let Err(e) = store.mark_running(&job_id).await {
            tracing::error!(job_id = %job_id, error = %e, "Cannot start job");
            return;
        }

        tracing::info!(job_id = %job_id, script = %invocation.script.display(), "Job started");
        let outcome = runner.run(&invocation).await;
        Self::finish(&store, &job_id, outcome).await;
    }

    async fn finish(store: &JobStore, job_id: &JobId, outcome: JobOutcome) {
        let exit_code = match &outcome {
            JobOutcome::Exited { code, .. } => Some(*code),
            _ => None,
        };

        match store.complete(job_id, outcome).await {
            Ok(status) => {
                tracing::info!(job_id = %job_id, status = %status, exit_code = ?exit_code, "Job finished");
            }
            Err(e) => {
                tracing::error!(job_id = %job_id, error = %e, "Ignoring completion for job");
            }
        }
    }
}
