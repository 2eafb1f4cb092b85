//! Shared helpers for integration tests.
//!
//! Scripts are written into a temporary directory and run through `sh`, so
//! the tests do not depend on a Python toolchain being installed.

#![allow(dead_code)]

use std::future::Future;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use gonkecutor::config::RunnerConfig;
use gonkecutor::scheduler::{Dispatcher, Job, JobId, JobStore};
use gonkecutor::worker::ScriptRunner;

pub const JOB_TIMEOUT: Duration = Duration::from_secs(10);

pub fn sh_runner() -> ScriptRunner {
    ScriptRunner::new(RunnerConfig::new(["sh"]))
}

/// Dispatcher over a fresh store, running scripts with `sh`.
pub fn sh_dispatcher() -> (Dispatcher, Arc<JobStore>) {
    let store = Arc::new(JobStore::new());
    let dispatcher = Dispatcher::new(store.clone(), sh_runner()).require_runnable(true);
    (dispatcher, store)
}

/// Write a script file and return its path.
pub fn write_script(dir: &Path, name: &str, body: &str) -> PathBuf {
    let path = dir.join(name);
    std::fs::write(&path, body).unwrap();
    path
}

/// Poll until a condition holds or the timeout elapses.
pub async fn wait_for<F, Fut>(
    condition: F,
    timeout_duration: Duration,
    poll_interval: Duration,
) -> bool
where
    F: Fn() -> Fut,
    Fut: Future<Output = bool>,
{
    let start = tokio::time::Instant::now();
    while start.elapsed() < timeout_duration {
        if condition().await {
            return true;
        }
        tokio::time::sleep(poll_interval).await;
    }
    false
}

/// Wait for a job to reach a terminal state and return it.
pub async fn wait_for_terminal(store: &JobStore, id: &JobId) -> Job {
    let finished = wait_for(
        || async {
            store
                .get(id)
                .await
                .is_some_and(|job| job.status.is_terminal())
        },
        JOB_TIMEOUT,
        Duration::from_millis(20),
    )
    .await;
    assert!(finished, "job {} did not finish in time", id);
    store.get(id).await.unwrap()
}
