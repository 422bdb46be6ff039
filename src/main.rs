//! Nocturne Bot - Main Entry Point
//!
//! Console front-end for the dispatch core: reads command lines from stdin,
//! routes them through the dispatcher, and prints replies. A platform
//! adapter would replace the stdin loop and the console chat port.

use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Parser;
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing::{debug, info};
use tracing_subscriber::EnvFilter;

use nocturne::chat::{ChannelId, ChatPort, ConsoleChat, GuildId, UserId};
use nocturne::commands::{builtin, CommandContext, CommandDispatcher, Invocation};
use nocturne::config::{BotData, BotSettings};

/// Guild chat bot with fuzzy command dispatch.
#[derive(Parser, Debug)]
#[command(name = "nocturne")]
#[command(about = "Dispatch chat commands from a local console session")]
#[command(version)]
struct Args {
    /// Data directory for property files and telemetry (overrides NOCTURNE_DATA_DIR).
    #[arg(short, long)]
    data_dir: Option<String>,

    /// Path to the .env file for environment variables.
    #[arg(long, default_value = ".env")]
    env_file: String,

    /// Log level (trace, debug, info, warn, error).
    #[arg(short, long, default_value = "info")]
    log_level: String,

    /// Guild id the console session simulates.
    #[arg(long, default_value_t = 1)]
    guild: u64,

    /// User id the console session simulates.
    #[arg(long, default_value_t = 1)]
    user: u64,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    // Initialize logging
    init_logging(&args.log_level);

    // Load environment variables
    if let Err(e) = dotenvy::from_filename(&args.env_file) {
        debug!("Could not load .env file ({}): {}", args.env_file, e);
    }

    let mut settings = BotSettings::from_env_with_defaults();
    if let Some(data_dir) = args.data_dir {
        settings.data_dir = data_dir.into();
    }

    // Open storage and select the backend
    let data = Arc::new(
        BotData::init(&settings)
            .await
            .context("Failed to initialize bot data storage")?,
    );

    let registry = builtin::default_registry();
    let dispatcher = CommandDispatcher::new(Arc::clone(&registry));
    let chat: Arc<dyn ChatPort> = Arc::new(ConsoleChat::new());

    let guild = GuildId(args.guild);
    let channel = ChannelId(1);
    let author = UserId(args.user);

    info!("Nocturne is running with {} commands.", registry.len());
    info!(
        "Type `{}help` for a command list. Use Ctrl+C to stop.",
        data.prefix(guild).await
    );

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    loop {
        tokio::select! {
            _ = tokio::signal::ctrl_c() => {
                info!("Received Ctrl+C, shutting down...");
                break;
            }
            line = lines.next_line() => {
                match line.context("Failed to read from stdin")? {
                    Some(line) => {
                        let prefix = data.prefix(guild).await;
                        let Some(invocation) = Invocation::parse(&line, &prefix) else {
                            debug!("Ignoring non-command input");
                            continue;
                        };
                        let ctx = CommandContext::new(
                            guild,
                            channel,
                            author,
                            line.clone(),
                            Arc::clone(&data),
                            Arc::clone(&chat),
                        );
                        let outcome = dispatcher.dispatch(&invocation, &ctx).await;
                        debug!("Dispatch outcome: {outcome:?}");
                    }
                    None => break,
                }
            }
        }
    }

    info!("Shutting down...");
    data.save_telemetry()
        .context("Failed to save telemetry snapshot")?;

    Ok(())
}

/// Initializes the logging subsystem.
fn init_logging(level: &str) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .init();
}
