//! CLI command definitions using clap
//!
//! Defines the command structure for the `loom` CLI tool.

use std::path::PathBuf;

use clap::{Parser, Subcommand, ValueEnum};

/// loom - terminal client for the storyloom writing server
///
/// Run without arguments to launch the TUI mode.
#[derive(Parser, Debug)]
#[command(name = "loom", version, about, long_about = None)]
pub struct Cli {
    /// Server URL for this run (overrides the config file and LOOM_API_URL)
    #[arg(long, global = true, value_name = "URL")]
    pub api_url: Option<String>,

    /// Use this config file instead of the default location
    #[arg(long, global = true, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Subcommand to execute
    #[command(subcommand)]
    pub command: Option<Commands>,
}

/// Available commands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// List projects on the server
    Projects,

    /// Generate content with the AI
    Generate(GenerateArgs),

    /// Manage configuration
    Config(ConfigArgs),
}

// ─────────────────────────────────────────────────────────────────────────────
// Generate Commands
// ─────────────────────────────────────────────────────────────────────────────

/// Generation commands
#[derive(Parser, Debug)]
pub struct GenerateArgs {
    #[command(subcommand)]
    pub command: GenerateCommand,
}

#[derive(Subcommand, Debug)]
pub enum GenerateCommand {
    /// Stream a new character to stdout
    Character {
        /// Project id
        #[arg(long, short)]
        project: String,

        /// What the character should be about
        #[arg(long, short)]
        keywords: String,

        /// Password of a protected project
        #[arg(long)]
        password: Option<String>,

        /// Only print the character, do not add it to the project
        #[arg(long)]
        no_save: bool,
    },
}

// ─────────────────────────────────────────────────────────────────────────────
// Config Commands
// ─────────────────────────────────────────────────────────────────────────────

/// Configuration commands
#[derive(Parser, Debug)]
pub struct ConfigArgs {
    #[command(subcommand)]
    pub command: ConfigCommand,
}

#[derive(Subcommand, Debug)]
pub enum ConfigCommand {
    /// Set a configuration value
    Set {
        /// Configuration key
        key: ConfigKey,

        /// Configuration value
        value: String,
    },

    /// Get a configuration value
    Get {
        /// Configuration key
        key: ConfigKey,
    },

    /// Reset a configuration value to its default
    Remove {
        /// Configuration key
        key: ConfigKey,
    },
}

/// Available configuration keys
#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
pub enum ConfigKey {
    /// Server base URL
    #[value(name = "api-url")]
    ApiUrl,

    /// AI model used for generation
    #[value(name = "ai-model")]
    AiModel,

    /// Delay before live validation runs, in milliseconds
    #[value(name = "validation-debounce-ms")]
    ValidationDebounceMs,

    /// Seconds between background reloads of the open project
    #[value(name = "refresh-interval-secs")]
    RefreshIntervalSecs,

    /// Per-request timeout in seconds
    #[value(name = "request-timeout-secs")]
    RequestTimeoutSecs,
}
