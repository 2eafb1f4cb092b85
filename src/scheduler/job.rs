use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize, Serializer};
use uuid::Uuid;

/// Short opaque job identifier (8 lowercase hex characters).
///
/// Uniqueness is enforced by [`JobStore`](crate::scheduler::JobStore), which
/// re-rolls on collision while holding its write lock.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct JobId(String);

impl JobId {
    pub fn generate() -> Self {
        let mut hex = Uuid::new_v4().simple().to_string();
        hex.truncate(8);
        Self(hex)
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<&str> for JobId {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

impl From<String> for JobId {
    fn from(s: String) -> Self {
        Self(s)
    }
}

impl std::fmt::Display for JobId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum JobStatus {
    /// Waiting for a slot when a concurrency cap is configured.
    Queued,
    Running,
    Success,
    Error,
}

impl JobStatus {
    pub fn is_terminal(self) -> bool {
        matches!(self, JobStatus::Success | JobStatus::Error)
    }
}

impl std::fmt::Display for JobStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            JobStatus::Queued => write!(f, "queued"),
            JobStatus::Running => write!(f, "running"),
            JobStatus::Success => write!(f, "success"),
            JobStatus::Error => write!(f, "error"),
        }
    }
}

/// Terminal result produced by the script runner for one invocation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum JobOutcome {
    /// The process ran and exited with a code.
    Exited {
        code: i32,
        stdout: String,
        stderr: String,
    },
    /// The process ran but was terminated without an exit code.
    Killed {
        signal: Option<i32>,
        stdout: String,
        stderr: String,
    },
    /// The process could not be started at all.
    LaunchFailed { message: String },
}

impl JobOutcome {
    /// Exit code `0` is the only outcome mapped to success.
    pub fn status(&self) -> JobStatus {
        match self {
            JobOutcome::Exited { code: 0, .. } => JobStatus::Success,
            _ => JobStatus::Error,
        }
    }
}

/// Lifecycle record of one script run.
#[derive(Debug, Clone, Serialize)]
pub struct Job {
    pub id: JobId,
    /// Script path exactly as supplied by the caller.
    pub script: String,
    pub script_name: String,
    /// Raw, untokenized argument string.
    pub args: String,
    pub command: String,
    pub status: JobStatus,
    #[serde(serialize_with = "epoch_seconds")]
    pub started: DateTime<Utc>,
    #[serde(serialize_with = "optional_epoch_seconds")]
    pub finished: Option<DateTime<Utc>>,
    pub returncode: Option<i32>,
    pub stdout: Option<String>,
    pub stderr: Option<String>,
    pub error: Option<String>,
    /// Creation order inside the store; breaks ties between equal `started`.
    #[serde(skip)]
    pub(crate) seq: u64,
}

impl Job {
    pub fn new(id: JobId, script: String, args: String, command: String, status: JobStatus) -> Self {
        let script_name = std::path::Path::new(&script)
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| script.clone());

        Self {
            id,
            script,
            script_name,
            args,
            command,
            status,
            started: Utc::now(),
            finished: None,
            returncode: None,
            stdout: None,
            stderr: None,
            error: None,
            seq: 0,
        }
    }

    /// Apply a terminal outcome. Callers must check the job is not terminal.
    pub(crate) fn finish(&mut self, outcome: JobOutcome) {
        self.status = outcome.status();
        self.finished = Some(Utc::now());

        match outcome {
            JobOutcome::Exited {
                code,
                stdout,
                stderr,
            } => {
                self.returncode = Some(code);
                self.stdout = Some(stdout);
                self.stderr = Some(stderr);
                self.error = None;
            }
            JobOutcome::Killed {
                signal,
                stdout,
                stderr,
            } => {
                self.returncode = None;
                self.stdout = Some(stdout);
                self.stderr = Some(stderr);
                self.error = Some(match signal {
                    Some(sig) => format!("Process terminated by signal {}", sig),
                    None => "Process terminated without an exit code".to_string(),
                });
            }
            JobOutcome::LaunchFailed { message } => {
                self.returncode = None;
                self.error = Some(message);
            }
        }
    }
}

fn to_epoch_seconds(ts: &DateTime<Utc>) -> f64 {
    ts.timestamp_millis() as f64 / 1000.0
}

fn epoch_seconds<S: Serializer>(ts: &DateTime<Utc>, s: S) -> Result<S::Ok, S::Error> {
    s.serialize_f64(to_epoch_seconds(ts))
}

fn optional_epoch_seconds<S: Serializer>(
    ts: &Option<DateTime<Utc>>,
    s: S,
) -> Result<S::Ok, S::Error> {
    match ts {
        Some(ts) => s.serialize_some(&to_epoch_seconds(ts)),
        None => s.serialize_none(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn running_job() -> Job {
        Job::new(
            JobId::from("abcd1234"),
            "/tmp/scripts/a.py".to_string(),
            "--x 1".to_string(),
            "python /tmp/scripts/a.py --x 1".to_string(),
            JobStatus::Running,
        )
    }

    #[test]
    fn job_id_is_short_hex() {
        let id = JobId::generate();
        assert_eq!(id.as_str().len(), 8);
        assert!(id.as_str().chars().all(|c| c.is_ascii_hexdigit()));
    }

    #[test]
    fn new_job_has_no_result_fields() {
        let job = running_job();
        assert_eq!(job.status, JobStatus::Running);
        assert_eq!(job.script_name, "a.py");
        assert!(job.finished.is_none());
        assert!(job.returncode.is_none());
        assert!(job.stdout.is_none());
        assert!(job.stderr.is_none());
        assert!(job.error.is_none());
    }

    #[test]
    fn outcome_status_mapping() {
        let ok = JobOutcome::Exited {
            code: 0,
            stdout: String::new(),
            stderr: String::new(),
        };
        let failed = JobOutcome::Exited {
            code: 2,
            stdout: String::new(),
            stderr: String::new(),
        };
        let launch = JobOutcome::LaunchFailed {
            message: "boom".to_string(),
        };
        assert_eq!(ok.status(), JobStatus::Success);
        assert_eq!(failed.status(), JobStatus::Error);
        assert_eq!(launch.status(), JobStatus::Error);
    }

    #[test]
    fn finish_with_nonzero_exit_keeps_error_empty() {
        let mut job = running_job();
        job.finish(JobOutcome::Exited {
            code: 2,
            stdout: String::new(),
            stderr: "bad arg\n".to_string(),
        });
        assert_eq!(job.status, JobStatus::Error);
        assert_eq!(job.returncode, Some(2));
        assert_eq!(job.stderr.as_deref(), Some("bad arg\n"));
        assert!(job.error.is_none());
        assert!(job.finished.is_some());
    }

    #[test]
    fn finish_with_signal_reports_error() {
        let mut job = running_job();
        job.finish(JobOutcome::Killed {
            signal: Some(9),
            stdout: String::new(),
            stderr: String::new(),
        });
        assert_eq!(job.status, JobStatus::Error);
        assert!(job.returncode.is_none());
        assert_eq!(job.error.as_deref(), Some("Process terminated by signal 9"));
    }

    #[test]
    fn serializes_wire_shape() {
        let job = running_job();
        let json = serde_json::to_value(&job).unwrap();
        assert_eq!(json["id"], "abcd1234");
        assert_eq!(json["status"], "running");
        assert_eq!(json["script"], "/tmp/scripts/a.py");
        assert!(json["started"].is_f64());
        assert!(json["finished"].is_null());
        assert!(json["returncode"].is_null());
        assert!(json.get("seq").is_none());
    }
}
