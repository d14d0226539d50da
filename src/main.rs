//! loom - terminal client for the storyloom writing server
//!
//! Run without arguments to launch the TUI, or use subcommands for CLI mode.

use std::fs::OpenOptions;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use clap::Parser;
use tracing_subscriber::EnvFilter;

use storyloom::api::ApiClient;
use storyloom::cli::commands::{Cli, Commands};
use storyloom::cli::{config, generate, projects};
use storyloom::core::config::Config;
use storyloom::core::session::SessionStore;
use storyloom::error::Result;
use storyloom::tui::App;

#[tokio::main]
async fn main() {
    let cli = Cli::parse();
    init_logging(cli.command.is_none(), cli.config.as_deref());

    if let Err(e) = run(cli).await {
        tracing::error!("{}", e);
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}

/// Log to stderr in CLI mode; the TUI owns the terminal, so it logs to a file
fn init_logging(tui: bool, config_file: Option<&Path>) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));

    let log_dir = match config_file.and_then(Path::parent) {
        Some(dir) => Some(dir.to_path_buf()),
        None => Config::config_dir().ok(),
    };
    let log_file = log_dir.filter(|_| tui).and_then(|dir| {
        std::fs::create_dir_all(&dir).ok()?;
        OpenOptions::new()
            .create(true)
            .append(true)
            .open(dir.join("loom.log"))
            .ok()
    });

    match log_file {
        Some(file) => tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_ansi(false)
            .with_writer(Mutex::new(file))
            .init(),
        None if tui => tracing_subscriber::fmt()
            .with_env_filter(EnvFilter::new("off"))
            .init(),
        None => tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_writer(std::io::stderr)
            .init(),
    }
}

async fn run(cli: Cli) -> Result<()> {
    let config_path = match cli.config {
        Some(path) => path,
        None => Config::config_path()?,
    };

    match cli.command {
        // Config commands edit the file and never touch the server
        Some(Commands::Config(args)) => config::handle_config(args.command, &config_path),

        command => {
            let mut settings = Config::load_from(&config_path)?;
            settings.apply_overrides(cli.api_url.as_deref())?;
            let client = ApiClient::new(&settings, SessionStore::new())?;
            tracing::debug!("Using server {}", settings.api_url);

            match command {
                None => run_tui(settings, config_path, client).await,
                Some(Commands::Projects) => projects::handle_projects(&client).await,
                Some(Commands::Generate(args)) => {
                    generate::handle_generate(args.command, &client, settings.ai_model).await
                }
                Some(Commands::Config(_)) => Ok(()),
            }
        }
    }
}

/// Run the TUI application
async fn run_tui(settings: Config, config_path: PathBuf, client: ApiClient) -> Result<()> {
    let mut app = App::new(settings, config_path, client);
    app.run().await
}
