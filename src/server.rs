use std::sync::Arc;

use tokio_util::sync::CancellationToken;

use crate::config::ServerConfig;
use crate::dashboard::{run_dashboard, DashboardState};
use crate::scheduler::{Dispatcher, JobStore};
use crate::worker::ScriptRunner;

/// Owns the job store and dispatcher and serves them over HTTP.
pub struct Server {
    pub config: ServerConfig,
    pub job_store: Arc<JobStore>,
    pub dispatcher: Dispatcher,
}

impl Server {
    pub fn new(config: ServerConfig) -> Self {
        let job_store = Arc::new(JobStore::new());

        let mut dispatcher = Dispatcher::new(
            job_store.clone(),
            ScriptRunner::new(config.runner.clone()),
        )
        .require_runnable(config.require_runnable);
        if let Some(limit) = config.max_concurrent_jobs {
            dispatcher = dispatcher.with_max_concurrent(limit);
        }

        Self {
            config,
            job_store,
            dispatcher,
        }
    }

    pub fn dashboard_state(&self) -> DashboardState {
        DashboardState {
            dispatcher: self.dispatcher.clone(),
            base_dir: Arc::new(self.config.base_dir.clone()),
            preview_max_bytes: self.config.preview_max_bytes,
        }
    }

    /// Serve until `shutdown` is cancelled.
    ///
    /// Jobs still running at shutdown are not waited for, and their processes
    /// are left running.
    ///
    /// # Errors
    ///
    /// Returns an error if the listen address cannot be bound or the HTTP
    /// server fails.
    pub async fn run(self, shutdown: CancellationToken) -> std::io::Result<()> {
        tracing::info!(
            listen_addr = %self.config.listen_addr,
            base_dir = %self.config.base_dir.display(),
            interpreter = ?self.config.runner.interpreter,
            max_concurrent_jobs = ?self.config.max_concurrent_jobs,
            "Starting gonkecutor"
        );

        let state = self.dashboard_state();
        run_dashboard(self.config.listen_addr, state, shutdown).await?;

        let unfinished = self
            .job_store
            .snapshot()
            .await
            .into_iter()
            .filter(|job| !job.status.is_terminal())
            .count();
        tracing::info!(unfinished, "Server stopped");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::RunnerConfig;
    use crate::scheduler::JobStatus;
    use std::path::PathBuf;

    fn test_config() -> ServerConfig {
        ServerConfig::new("127.0.0.1:0".parse().unwrap(), PathBuf::from("/tmp"))
            .with_runner(RunnerConfig::new(["sh"]))
    }

    #[test]
    fn server_without_cap_starts_jobs_running() {
        let server = Server::new(test_config());
        assert_eq!(server.dispatcher.initial_status(), JobStatus::Running);
    }

    #[test]
    fn server_with_cap_queues_jobs() {
        let server = Server::new(test_config().with_max_concurrent_jobs(2));
        assert_eq!(server.dispatcher.initial_status(), JobStatus::Queued);
    }

    #[test]
    fn dashboard_state_carries_config() {
        let server = Server::new(test_config().with_preview_max_bytes(10));
        let state = server.dashboard_state();
        assert_eq!(*state.base_dir, PathBuf::from("/tmp"));
        assert_eq!(state.preview_max_bytes, 10);
        assert!(Arc::ptr_eq(state.dispatcher.store(), &server.job_store));
    }

    #[tokio::test]
    async fn run_stops_on_shutdown() {
        let server = Server::new(test_config());
        let shutdown = CancellationToken::new();
        shutdown.cancel();
        server.run(shutdown).await.unwrap();
    }
}
