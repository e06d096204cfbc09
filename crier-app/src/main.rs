use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Result, anyhow};
use clap::Parser;
use crier_chat::{ChannelId, ChatError, DiscordApi};
use crier_common::observability::{LogConfig, LogFormat, init_logging};
use crier_config::{CrierConfig, CrierConfigLoader, DiagnosticsLevel, resolve_config_path};
use crier_monitor::{Monitor, MonitorSettings};
use crier_social::TwitterApi;
use tracing::{error, info, warn};

mod health;

/// Watches feed accounts and relays new posts to a chat channel.
#[derive(Parser, Debug)]
#[command(name = "crier", version, about)]
struct Args {
    /// Configuration file; defaults to ./crier.yaml, then the user config
    /// directory. Without a file the environment must carry everything.
    #[arg(long)]
    config: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    // 1) Load config (env wins over file)
    let mut loader = CrierConfigLoader::new();
    if let Some(path) = resolve_config_path(args.config.as_deref()) {
        loader = loader.with_file(&path);
    }
    let cfg: CrierConfig = loader.load()?;

    init_logging(LogConfig {
        log_dir: cfg.logging.dir.as_ref().map(PathBuf::from),
        emit_stderr: cfg.logging.stderr,
        format: LogFormat::parse(&cfg.logging.format),
        default_filter: cfg.logging.filter.clone(),
        ..LogConfig::default()
    })?;

    // 2) Fatal checks before anything touches the network
    cfg.validate()?;

    run(cfg).await
}

async fn run(cfg: CrierConfig) -> Result<()> {
    let handles = cfg.normalized_handles();
    let channel = ChannelId(cfg.channel_id()?);

    let feed = Arc::new(TwitterApi::new(&cfg.feed.bearer_token)?);
    let chat = Arc::new(DiscordApi::new(&cfg.chat.bot_token)?);

    let settings = MonitorSettings {
        handles,
        channel,
        interval: cfg.interval(),
        page_size: cfg.feed.page_size,
        spoiler_tag: cfg.monitor.spoiler_tag.clone(),
        skip_initial_backlog: cfg.monitor.skip_initial_backlog,
        verbose: cfg.monitor.diagnostics == DiagnosticsLevel::Verbose,
    };
    let mut monitor = Monitor::new(settings, feed, chat.clone())?;

    info!(
        interval_secs = cfg.monitor.interval_secs,
        keepalive = cfg.keepalive.enabled,
        "app.start"
    );

    if cfg.keepalive.enabled {
        tokio::spawn(health::serve(cfg.keepalive.port));
    }

    // The monitor starts immediately and skips cycles until the chat
    // handshake lands; readiness is polled, not awaited.
    let connect_task = tokio::spawn(connect_with_backoff(chat.clone()));
    let monitor_task = tokio::spawn(async move { monitor.run().await });

    tokio::select! {
        _ = tokio::signal::ctrl_c() => {
            info!("app.shutdown_signal");
            return Ok(());
        }
        res = connect_task => res??,
    }

    tokio::select! {
        _ = tokio::signal::ctrl_c() => {
            info!("app.shutdown_signal");
        }
        res = monitor_task => {
            // run() has no normal return; this is a crashed task.
            error!(result = ?res, "app.monitor_stopped");
            return Err(anyhow!("monitor task stopped unexpectedly"));
        }
    }
    Ok(())
}

/// Retry the chat handshake until it succeeds, with capped exponential
/// backoff. The monitor observes the outcome through `is_ready`.
async fn connect_with_backoff(chat: Arc<DiscordApi>) -> Result<()> {
    let mut backoff = Duration::from_secs(1);
    loop {
        match chat.connect().await {
            Ok(user) => {
                info!(bot = %user.username, "app.chat_connected");
                return Ok(());
            }
            // A rejected token will not fix itself.
            Err(ChatError::Forbidden(msg)) => {
                return Err(anyhow!("chat authentication rejected: {msg}"));
            }
            Err(err) => {
                warn!(
                    error = %err,
                    retry_in_secs = backoff.as_secs(),
                    "app.chat_connect_failed"
                );
                tokio::time::sleep(backoff).await;
                backoff = (backoff * 2).min(Duration::from_secs(30));
            }
        }
    }
}
