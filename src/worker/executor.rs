use std::path::{Path, PathBuf};
use std::process::{ExitStatus, Output, Stdio};

use tokio::process::Command;

use crate::config::RunnerConfig;
use crate::scheduler::JobOutcome;

/// Fully resolved invocation of one script.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Invocation {
    pub script: PathBuf,
    pub args: Vec<String>,
}

impl Invocation {
    pub fn new(script: impl Into<PathBuf>, args: Vec<String>) -> Self {
        Self {
            script: script.into(),
            args,
        }
    }
}

/// Runs scripts through the configured interpreter and captures their
/// output in full.
///
/// Each call to [`ScriptRunner::run`] spawns its own process with its own
/// pipes, so concurrent runs never share state.
#[derive(Debug, Clone)]
pub struct ScriptRunner {
    config: RunnerConfig,
}

impl ScriptRunner {
    pub fn new(config: RunnerConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &RunnerConfig {
        &self.config
    }

    /// Human-readable command line for `script` and its tokenized `args`.
    pub fn describe(&self, script: &str, args: &[String]) -> String {
        self.config
            .interpreter
            .iter()
            .map(String::as_str)
            .chain(std::iter::once(script))
            .chain(args.iter().map(String::as_str))
            .collect::<Vec<_>>()
            .join(" ")
    }

    /// Run the invocation to completion.
    ///
    /// Never fails: problems starting the process are reported as
    /// [`JobOutcome::LaunchFailed`].
    pub async fn run(&self, invocation: &Invocation) -> JobOutcome {
        let script = match resolve_script(&invocation.script).await {
            Ok(path) => path,
            Err(message) => {
                tracing::warn!(script = %invocation.script.display(), error = %message, "Script launch failed");
                return JobOutcome::LaunchFailed { message };
            }
        };

        let Some((program, leading)) = self.config.interpreter.split_first() else {
            return JobOutcome::LaunchFailed {
                message: "No interpreter configured".to_string(),
            };
        };

        let mut cmd = Command::new(program);
        cmd.args(leading)
            .arg(&script)
            .args(&invocation.args)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped());

        if let Some(dir) = script.parent() {
            cmd.current_dir(dir);
        }

        tracing::debug!(program = %program, script = %script.display(), args = ?invocation.args, "Spawning script process");

        let result = cmd.output().await;
        Self::process_output(program, result)
    }

    fn process_output(program: &str, result: std::io::Result<Output>) -> JobOutcome {
        match result {
            Ok(output) => {
                let stdout = String::from_utf8_lossy(&output.stdout).into_owned();
                let stderr = String::from_utf8_lossy(&output.stderr).into_owned();

                match output.status.code() {
                    Some(code) => JobOutcome::Exited {
                        code,
                        stdout,
                        stderr,
                    },
                    None => JobOutcome::Killed {
                        signal: exit_signal(&output.status),
                        stdout,
                        stderr,
                    },
                }
            }
            Err(e) => {
                tracing::warn!(program = %program, error = %e, "Failed to launch interpreter");
                JobOutcome::LaunchFailed {
                    message: format!("Failed to launch '{}': {}", program, e),
                }
            }
        }
    }
}

/// Canonicalize the script path and make sure it names a regular file.
async fn resolve_script(script: &Path) -> Result<PathBuf, String> {
    let resolved = tokio::fs::canonicalize(script)
        .await
        .map_err(|e| format!("Script not found: {}: {}", script.display(), e))?;

    let metadata = tokio::fs::metadata(&resolved)
        .await
        .map_err(|e| format!("Cannot read script {}: {}", resolved.display(), e))?;

    if !metadata.is_file() {
        return Err(format!("Script is not a file: {}", resolved.display()));
    }

    Ok(resolved)
}

#[cfg(unix)]
fn exit_signal(status: &ExitStatus) -> Option<i32> {
    use std::os::unix::process::ExitStatusExt;
    status.signal()
}

#[cfg(not(unix))]
fn exit_signal(_status: &ExitStatus) -> Option<i32> {
    None
}
