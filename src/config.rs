use std::net::SocketAddr;
use std::path::PathBuf;

use crate::error::{GonkError, Result};

/// Upper bound on the bytes returned by the preview endpoint.
pub const DEFAULT_PREVIEW_MAX_BYTES: u64 = 100 * 1024;

/// How scripts are launched.
///
/// The interpreter is the program plus any leading arguments placed before
/// the script path, e.g. `["uv", "run", "python"]` runs
/// `uv run python /abs/script.py <args...>`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunnerConfig {
    pub interpreter: Vec<String>,
}

impl Default for RunnerConfig {
    fn default() -> Self {
        Self {
            interpreter: vec!["uv".to_string(), "run".to_string(), "python".to_string()],
        }
    }
}

impl RunnerConfig {
    pub fn new<I, S>(interpreter: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            interpreter: interpreter.into_iter().map(Into::into).collect(),
        }
    }

    /// Parse an interpreter command line with shell-style quoting, so a
    /// program path containing spaces can be quoted.
    pub fn from_command_line(line: &str) -> Result<Self> {
        let parts = shell_words::split(line)
            .map_err(|e| GonkError::InvalidArguments(format!("interpreter '{}': {}", line, e)))?;
        if parts.is_empty() {
            return Err(GonkError::InvalidArguments(
                "interpreter must name a program".to_string(),
            ));
        }
        Ok(Self { interpreter: parts })
    }
}

#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub listen_addr: SocketAddr,
    /// Directory the browser opens when no path is given.
    pub base_dir: PathBuf,
    pub runner: RunnerConfig,
    /// When set, at most this many jobs run at once; the rest wait as `queued`.
    pub max_concurrent_jobs: Option<usize>,
    pub preview_max_bytes: u64,
    /// Reject submissions the browser would not classify as runnable scripts.
    pub require_runnable: bool,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            // SAFETY: This is a hardcoded valid address that will always parse
            listen_addr: "0.0.0.0:5000"
                .parse()
                .expect("default listen address is valid"),
            base_dir: default_base_dir(),
            runner: RunnerConfig::default(),
            max_concurrent_jobs: None,
            preview_max_bytes: DEFAULT_PREVIEW_MAX_BYTES,
            require_runnable: true,
        }
    }
}

impl ServerConfig {
    pub fn new(listen_addr: SocketAddr, base_dir: PathBuf) -> Self {
        Self {
            listen_addr,
            base_dir,
            ..Default::default()
        }
    }

    pub fn with_runner(mut self, runner: RunnerConfig) -> Self {
        self.runner = runner;
        self
    }

    pub fn with_max_concurrent_jobs(mut self, limit: usize) -> Self {
        self.max_concurrent_jobs = Some(limit);
        self
    }

    pub fn with_preview_max_bytes(mut self, bytes: u64) -> Self {
        self.preview_max_bytes = bytes;
        self
    }

    pub fn allow_any_script(mut self) -> Self {
        self.require_runnable = false;
        self
    }
}

fn default_base_dir() -> PathBuf {
    std::env::var_os("HOME")
        .map(PathBuf::from)
        .filter(|p| p.is_dir())
        .unwrap_or_else(|| PathBuf::from("."))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn runner_config_default() {
        let cfg = RunnerConfig::default();
        assert_eq!(cfg.interpreter, vec!["uv", "run", "python"]);
    }

    #[test]
    fn runner_config_from_command_line() {
        let cfg = RunnerConfig::from_command_line("  python3   -u ").unwrap();
        assert_eq!(cfg.interpreter, vec!["python3", "-u"]);
    }

    #[test]
    fn runner_config_from_quoted_command_line() {
        let cfg = RunnerConfig::from_command_line(r#""/opt/my tools/python3" -u"#).unwrap();
        assert_eq!(cfg.interpreter, vec!["/opt/my tools/python3", "-u"]);
    }

    #[test]
    fn runner_config_from_blank_command_line() {
        assert!(RunnerConfig::from_command_line("").is_err());
        assert!(RunnerConfig::from_command_line("   ").is_err());
    }

    #[test]
    fn runner_config_rejects_unbalanced_quotes() {
        assert!(matches!(
            RunnerConfig::from_command_line("'python3"),
            Err(GonkError::InvalidArguments(_))
        ));
    }

    #[test]
    fn server_config_default() {
        let cfg = ServerConfig::default();
        assert_eq!(cfg.listen_addr.to_string(), "0.0.0.0:5000");
        assert_eq!(cfg.runner, RunnerConfig::default());
        assert!(cfg.max_concurrent_jobs.is_none());
        assert_eq!(cfg.preview_max_bytes, 100 * 1024);
        assert!(cfg.require_runnable);
    }

    #[test]
    fn server_config_builders() {
        let addr: SocketAddr = "127.0.0.1:8080".parse().unwrap();
        let cfg = ServerConfig::new(addr, PathBuf::from("/srv/scripts"))
            .with_runner(RunnerConfig::new(["sh"]))
            .with_max_concurrent_jobs(2)
            .with_preview_max_bytes(16)
            .allow_any_script();

        assert_eq!(cfg.listen_addr, addr);
        assert_eq!(cfg.base_dir, PathBuf::from("/srv/scripts"));
        assert_eq!(cfg.runner.interpreter, vec!["sh"]);
        assert_eq!(cfg.max_concurrent_jobs, Some(2));
        assert_eq!(cfg.preview_max_bytes, 16);
        assert!(!cfg.require_runnable);
    }
}
