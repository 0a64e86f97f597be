//! # pathway
//!
//! Pathway server binary: resolves settings, installs logging and metrics,
//! then serves WebSocket sessions until interrupted.

#![deny(unsafe_code)]

mod logging;

use std::path::PathBuf;

use anyhow::{Context, Result, bail};
use clap::Parser;
use pathway_server::{PathwayServer, ServerConfig};
use pathway_settings::loader::{load_settings_with_env, parse_log_level, settings_path};
use pathway_settings::{LoadedSettings, PathwaySettings};
use tracing::{info, warn};

/// Pathway waypoint graph server.
#[derive(Parser, Debug)]
#[command(name = "pathway", version, about = "WebSocket waypoint graph server with A* search")]
struct Cli {
    /// Settings file (default `~/.pathway/settings.json`).
    #[arg(long)]
    config: Option<PathBuf>,

    /// Host to bind.
    #[arg(long)]
    host: Option<String>,

    /// Port to bind (0 for auto-assign).
    #[arg(long)]
    port: Option<u16>,

    /// Tokio worker threads.
    #[arg(long)]
    threads: Option<usize>,

    /// Seconds a session may stay silent before it is closed.
    #[arg(long)]
    idle_timeout_secs: Option<u64>,

    /// Log level when `RUST_LOG` is unset (trace, debug, info, warn, error).
    #[arg(long)]
    log_level: Option<String>,

    /// Emit JSON log lines.
    #[arg(long)]
    json_logs: bool,
}

impl Cli {
    /// Resolve settings: file and environment first, then flags on top,
    /// then validation of the result.
    fn settings<F>(&self, env: F) -> Result<LoadedSettings>
    where
        F: Fn(&str) -> Option<String>,
    {
        let path = match &self.config {
            Some(path) if !path.exists() => bail!("config file not found: {}", path.display()),
            Some(path) => path.clone(),
            None => settings_path(),
        };
        let mut loaded = load_settings_with_env(&path, env)
            .with_context(|| format!("failed to load settings from {}", path.display()))?;
        self.apply(&mut loaded.settings)?;
        loaded.settings.validate().context("invalid settings")?;
        Ok(loaded)
    }

    fn apply(&self, settings: &mut PathwaySettings) -> Result<()> {
        if let Some(host) = &self.host {
            settings.server.host.clone_from(host);
        }
        if let Some(port) = self.port {
            settings.server.port = port;
        }
        if let Some(threads) = self.threads {
            settings.server.threads = threads;
        }
        if let Some(secs) = self.idle_timeout_secs {
            settings.server.idle_timeout_secs = secs;
        }
        if let Some(level) = &self.log_level {
            settings.logging.level =
                parse_log_level(level).with_context(|| format!("unknown log level: {level}"))?;
        }
        if self.json_logs {
            settings.logging.json = true;
        }
        Ok(())
    }
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    let LoadedSettings { settings, rejected } = cli.settings(|name| std::env::var(name).ok())?;
    logging::init(&settings.logging);
    for var in &rejected {
        warn!(key = var.key, value = %var.value, "invalid env var, ignoring");
    }

    let runtime = tokio::runtime::Builder::new_multi_thread()
        .worker_threads(settings.server.threads)
        .thread_name("pathway-worker")
        .enable_all()
        .build()
        .context("failed to build tokio runtime")?;
    runtime.block_on(serve(settings))
}

async fn serve(settings: PathwaySettings) -> Result<()> {
    let metrics = pathway_server::metrics::install_recorder()
        .context("failed to install metrics recorder")?;
    let server = PathwayServer::new(ServerConfig::from(&settings.server), metrics);

    let (addr, handle) = server
        .listen()
        .await
        .with_context(|| format!("failed to bind {}", server.config().bind_addr()))?;
    info!(
        %addr,
        threads = settings.server.threads,
        idle_timeout_secs = settings.server.idle_timeout_secs,
        "pathway ready"
    );

    tokio::signal::ctrl_c()
        .await
        .context("failed to listen for shutdown signal")?;
    info!("shutdown signal received");
    server.shutdown().graceful_shutdown(vec![handle], None).await;
    Ok(())
}
