mod config;
mod ingest_cmd;
mod query_cmd;
mod terminal_output;

use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::Result;
use clap::{Parser, Subcommand};

use config::Settings;

#[derive(Parser)]
#[command(name = "menusnap")]
#[command(about = "menusnap: photograph a menu, get it back structured")]
#[command(version)]
struct Cli {
    /// Config file to use instead of ~/.menusnap/config.yaml
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Upload menu photos, extract the menu and fetch dish images
    Ingest {
        /// Photos of the menu pages (non-images are skipped)
        #[arg(required = true)]
        paths: Vec<PathBuf>,
        /// Google Maps link of the restaurant
        #[arg(long)]
        maps_url: Option<String>,
        /// Print the result as JSON
        #[arg(long)]
        json: bool,
    },
    /// Query the extraction status of a run once
    Status {
        run_id: String,
        #[arg(long)]
        json: bool,
    },
    /// Fetch the dish images of a run once
    Images {
        run_id: String,
        #[arg(long)]
        json: bool,
    },
    /// Inspect configuration
    #[command(subcommand)]
    Config(ConfigCommands),
}

#[derive(Subcommand)]
enum ConfigCommands {
    /// Print the effective config with secrets masked
    Show,
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();
    match run(cli).await {
        Ok(code) => code,
        Err(e) => {
            terminal_output::note_error(&format!("{e:#}"));
            ExitCode::FAILURE
        }
    }
}

async fn run(cli: Cli) -> Result<ExitCode> {
    let settings = Settings::load(cli.config.as_deref()).await?;
    menusnap_logging::init_logger(
        &settings.log_dir,
        settings.config.log_level(),
        settings.config.log_json(),
    );
    tracing::debug!(config = %settings.path.display(), base_url = settings.config.base_url(), "Starting menusnap");

    match cli.command {
        Commands::Ingest {
            paths,
            maps_url,
            json,
        } => ingest_cmd::run(&settings, &paths, maps_url, json).await,
        Commands::Status { run_id, json } => query_cmd::status(&settings, &run_id, json).await,
        Commands::Images { run_id, json } => query_cmd::images(&settings, &run_id, json).await,
        Commands::Config(ConfigCommands::Show) => {
            settings.show()?;
            Ok(ExitCode::SUCCESS)
        }
    }
}
