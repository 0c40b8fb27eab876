//! CLI module for deepresearch
//!
//! Provides command-line interface parsing and handling for the deepresearch binary.
//! Uses clap for argument parsing and owo-colors for colored terminal output.

pub mod config;
pub mod init;
pub mod output;
pub mod research;

use clap::{Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

/// deepresearch - Multi-Agent Deep Research
///
/// Plans web searches for a topic, runs them concurrently, writes a cited
/// report and delivers it by email.
#[derive(Parser, Debug)]
#[command(
    name = "deepresearch",
    author = "Dirmacs <build@dirmacs.com>",
    version,
    about = "deepresearch - Multi-Agent Deep Research",
    long_about = "Plans web searches for a topic, runs them concurrently, writes a long-form\n\
                  cited report from the results and delivers it by email or as a preview.\n\n\
                  Run without arguments to start the HTTP server, or use 'run' for a one-off report.",
    after_help = "EXAMPLES:\n    \
                  deepresearch init                       # Scaffold deepresearch.toml\n    \
                  deepresearch run \"fusion startups\"      # Research a topic, preview the email\n    \
                  deepresearch run \"fusion startups\" --send\n    \
                  deepresearch                            # Start the server\n    \
                  deepresearch --config my.toml serve     # Use a custom config file"
)]
pub struct Cli {
    /// Path to the configuration file
    #[arg(short, long, default_value = "deepresearch.toml", global = true)]
    pub config: PathBuf,

    /// Enable verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Disable colored output
    #[arg(long, global = true)]
    pub no_color: bool,

    /// Emit logs as JSON lines
    #[arg(long, global = true)]
    pub log_json: bool,

    /// Subcommand to execute
    #[command(subcommand)]
    pub command: Option<Commands>,
}

/// LLM provider choices for scaffolding
#[derive(ValueEnum, Clone, Copy, Debug, PartialEq, Eq)]
pub enum ProviderChoice {
    Ollama,
    Openai,
}

/// Available CLI subcommands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Research a topic and print progress and the final report
    Run {
        /// Topic to research
        topic: String,

        /// Send the report by email instead of previewing it
        #[arg(long)]
        send: bool,

        /// Do not save the rendered HTML report
        #[arg(long)]
        no_save: bool,

        /// Abort the run after this many seconds
        #[arg(long, value_name = "SECS")]
        timeout: Option<u64>,
    },

    /// Start the HTTP server (default)
    Serve {
        /// Host address, overriding the configuration
        #[arg(long)]
        host: Option<String>,

        /// Port, overriding the configuration
        #[arg(long)]
        port: Option<u16>,
    },

    /// Initialize a new project with configuration files
    ///
    /// Creates deepresearch.toml, .env.example and .gitignore.
    Init {
        /// Directory to initialize (defaults to current directory)
        #[arg(default_value = ".")]
        path: PathBuf,

        /// Overwrite existing files
        #[arg(short, long)]
        force: bool,

        /// LLM provider to configure
        #[arg(long, value_enum, default_value = "ollama")]
        provider: ProviderChoice,

        /// Host address for the server
        #[arg(long, default_value = "127.0.0.1")]
        host: String,

        /// Port for the server
        #[arg(long, default_value = "3000")]
        port: u16,
    },

    /// Show the effective configuration
    Config {
        /// Fail when the configuration is invalid
        #[arg(long)]
        validate: bool,
    },
}

impl Cli {
    /// Parse CLI arguments
    pub fn parse_args() -> Self {
        Self::parse()
    }
}
