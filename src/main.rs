use std::env;
use std::process;

use clap::{Parser, Subcommand};
use tracing::error;
use tracing_subscriber::EnvFilter;

use study_copilot::cli;
use study_copilot::config::{self, AppConfig, BridgeSettings, ChatSettings};
use study_copilot::error::AppError;
use study_copilot::runtime;

const DEFAULT_RUN_MODE: &str = "chat";

#[derive(Parser)]
#[command(name = "study-copilot", about = "Personal study assistant with a Google Calendar bridge")]
struct Cli {
    /// Key=value config file; env vars fill in anything missing.
    #[arg(long)]
    config: Option<String>,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Interactive chat loop (default).
    Chat,
    /// Run the local calendar bridge server.
    Bridge,
    /// Move an upcoming event, found by exact summary, to a new window.
    Reschedule {
        summary: String,
        /// New start, RFC3339 with offset.
        start: String,
        /// New end, RFC3339 with offset.
        end: String,
    },
    /// Delete one event by provider id.
    DeleteEvent { event_id: String },
}

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .init();

    let args = Cli::parse();
    let config = match args.config.or_else(|| env::var("CONFIG_FILE").ok()) {
        Some(path) => match AppConfig::from_file(&path) {
            Ok(config) => config,
            Err(err) => fatal(err),
        },
        None => AppConfig::default(),
    };

    let command = args.command.unwrap_or_else(|| {
        match config
            .get("RUN_MODE")
            .unwrap_or_else(|| DEFAULT_RUN_MODE.to_string())
            .as_str()
        {
            "bridge" => Commands::Bridge,
            _ => Commands::Chat,
        }
    });

    let result = match command {
        Commands::Chat => match ChatSettings::load(&config) {
            Ok(settings) => cli::chat_loop(settings).await,
            Err(err) => fatal(err),
        },
        Commands::Bridge => match BridgeSettings::load(&config) {
            Ok(settings) => runtime::run_bridge(settings).await,
            Err(err) => fatal(err),
        },
        Commands::Reschedule {
            summary,
            start,
            end,
        } => cli::reschedule(&config::bridge_url(&config), &summary, &start, &end).await,
        Commands::DeleteEvent { event_id } => {
            cli::delete_event(&config::bridge_url(&config), &event_id).await
        }
    };

    if let Err(err) = result {
        fatal(err);
    }
}

fn fatal(err: AppError) -> ! {
    error!("{err}");
    process::exit(1);
}
