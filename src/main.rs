use std::io;
use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use tracing::debug;

use moodmate::api::HttpCompanionApi;
use moodmate::app::{self, ChatOptions};
use moodmate::commands;
use moodmate::config::Config;
use moodmate::logging::{self, LogTarget};
use moodmate::voice::{SilentSpeaker, Speaker, speaker_from_config};

#[derive(Parser)]
#[command(name = "moodmate")]
#[command(version)]
#[command(about = "Terminal chat client for an emotion-aware companion", long_about = None)]
struct Cli {
    /// Config file (defaults to ~/.moodmate/config.toml)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Companion API base URL, e.g. http://localhost:8000/api
    #[arg(long, global = true)]
    api_url: Option<String>,

    /// Do not speak replies aloud
    #[arg(long, global = true)]
    mute: bool,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Open the interactive chat (default)
    Chat {
        /// Resume an existing session id
        #[arg(long)]
        session: Option<String>,
    },
    /// Send one message and print the reply
    Send {
        /// Continue an existing session id
        #[arg(long)]
        session: Option<String>,
        #[arg(required = true, num_args = 1..)]
        text: Vec<String>,
    },
    /// Show mood stats for a session
    Stats { user_id: Option<String> },
    /// Show the conversation history for a session
    History { user_id: String },
    /// Print the effective configuration
    Config,
}

fn load_config(cli: &Cli) -> Result<(Config, PathBuf)> {
    let (mut config, path) = match &cli.config {
        Some(path) => (Config::load_from(path)?, path.clone()),
        None => (Config::load()?, Config::default_path()?),
    };
    if let Some(url) = &cli.api_url {
        config.set_api_url(url.clone());
    }
    Ok((config, path))
}

fn client(config: &Config) -> Result<HttpCompanionApi> {
    HttpCompanionApi::from_config(config).context("Failed to build HTTP client")
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    let (config, path) = load_config(&cli)?;

    match cli.command.unwrap_or(Commands::Chat { session: None }) {
        Commands::Chat { session } => {
            let log_file = config.log_file()?;
            logging::init(LogTarget::File(&log_file), &config.logging.level)?;
            debug!(config = %path.display(), "config loaded");
            app::run(
                &config,
                ChatOptions {
                    session,
                    muted: cli.mute,
                },
            )
            .await
        }
        Commands::Send { session, text } => {
            logging::init(LogTarget::Stderr, &config.logging.level)?;
            let api = client(&config)?;
            let speaker: Arc<dyn Speaker> = if cli.mute {
                Arc::new(SilentSpeaker)
            } else {
                speaker_from_config(&config.voice)
            };
            commands::send_message(
                &api,
                speaker.as_ref(),
                &mut io::stdout(),
                &text.join(" "),
                session,
                config.reveal_tick(),
            )
            .await
        }
        Commands::Stats { user_id } => {
            logging::init(LogTarget::Stderr, &config.logging.level)?;
            let api = client(&config)?;
            commands::show_stats(&api, &mut io::stdout(), user_id.as_deref()).await
        }
        Commands::History { user_id } => {
            logging::init(LogTarget::Stderr, &config.logging.level)?;
            let api = client(&config)?;
            commands::show_history(&api, &mut io::stdout(), &user_id).await
        }
        Commands::Config => commands::show_config(&mut io::stdout(), &config, &path),
    }
}
