use clap::Parser;
use std::net::{IpAddr, SocketAddr};
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

use gonkecutor::config::{RunnerConfig, ServerConfig, DEFAULT_PREVIEW_MAX_BYTES};
use gonkecutor::server::Server;
use gonkecutor::shutdown::install_shutdown_handler;

#[derive(Parser, Debug)]
#[command(name = "gonkecutor")]
#[command(version)]
#[command(about = "Browse a directory, run Python scripts and poll their results")]
struct Args {
    /// Directory the browser opens at (defaults to the home directory)
    #[arg(env = "GONKECUTOR_ROOT")]
    root: Option<PathBuf>,

    /// Address to bind the HTTP server to
    #[arg(long, env = "GONKECUTOR_HOST", default_value = "0.0.0.0")]
    host: IpAddr,

    /// Port for the HTTP server
    #[arg(long, short = 'p', env = "GONKECUTOR_PORT", default_value = "5000")]
    port: u16,

    /// Interpreter command placed before the script path
    #[arg(long, env = "GONKECUTOR_INTERPRETER", default_value = "uv run python")]
    interpreter: String,

    /// Maximum number of scripts running at once (unlimited when omitted)
    #[arg(long, env = "GONKECUTOR_MAX_CONCURRENT")]
    max_concurrent: Option<usize>,

    /// Largest file preview in bytes before truncation
    #[arg(long, default_value_t = DEFAULT_PREVIEW_MAX_BYTES)]
    preview_max_bytes: u64,

    /// Accept scripts without a `.py` suffix
    #[arg(long)]
    allow_any_script: bool,
}

fn build_config(args: Args) -> Result<ServerConfig, Box<dyn std::error::Error>> {
    let runner = RunnerConfig::from_command_line(&args.interpreter)?;

    let mut config = ServerConfig {
        listen_addr: SocketAddr::new(args.host, args.port),
        runner,
        preview_max_bytes: args.preview_max_bytes,
        ..ServerConfig::default()
    };

    if let Some(root) = args.root {
        let root = root
            .canonicalize()
            .map_err(|e| format!("cannot open root directory {}: {}", root.display(), e))?;
        if !root.is_dir() {
            return Err(format!("root is not a directory: {}", root.display()).into());
        }
        config.base_dir = root;
    }

    if let Some(limit) = args.max_concurrent {
        if limit == 0 {
            return Err("--max-concurrent must be at least 1".into());
        }
        config = config.with_max_concurrent_jobs(limit);
    }

    if args.allow_any_script {
        config = config.allow_any_script();
    }

    Ok(config)
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let config = build_config(Args::parse())?;
    let shutdown = install_shutdown_handler();

    Server::new(config).run(shutdown).await?;
    Ok(())
}
