//! Init command implementation
//!
//! Scaffolds a new deepresearch project with the configuration files it needs.

use super::output::Output;
use super::ProviderChoice;
use std::fs;
use std::path::{Path, PathBuf};

/// Result of the init operation
#[derive(Debug)]
pub enum InitResult {
    /// Initialization completed successfully
    Success,
    /// Project already exists (deepresearch.toml found)
    AlreadyExists,
    /// An error occurred during initialization
    Error(String),
}

/// Configuration for the init command
pub struct InitConfig {
    /// Directory to initialize
    pub path: PathBuf,
    /// Overwrite existing files
    pub force: bool,
    /// LLM provider to configure
    pub provider: ProviderChoice,
    /// Host address for the server
    pub host: String,
    /// Port for the server
    pub port: u16,
}

/// Run the init command
pub fn run(config: InitConfig, output: &Output) -> InitResult {
    output.banner();
    output.header("Initializing deepresearch");

    let base_path = &config.path;

    let config_path = base_path.join("deepresearch.toml");
    if config_path.exists() && !config.force {
        output.warning("deepresearch.toml already exists!");
        output.hint("Use --force to overwrite existing files");
        return InitResult::AlreadyExists;
    }

    if let Err(e) = fs::create_dir_all(base_path.join("output")) {
        output.error(&format!("Failed to create output directory: {}", e));
        return InitResult::Error(e.to_string());
    }
    output.created("directory", "output");

    output.subheader("Creating configuration files");

    if let Err(e) = write_file(&config_path, &generate_config_toml(&config), config.force) {
        output.error(&format!("Failed to create deepresearch.toml: {}", e));
        return InitResult::Error(e.to_string());
    }
    output.created("config", "deepresearch.toml");

    let env_example_path = base_path.join(".env.example");
    if let Err(e) = write_file(&env_example_path, &generate_env_example(), config.force) {
        output.error(&format!("Failed to create .env.example: {}", e));
        return InitResult::Error(e.to_string());
    }
    output.created("env", ".env.example");

    let gitignore_path = base_path.join(".gitignore");
    if gitignore_path.exists() {
        output.skipped(".gitignore", "already exists");
    } else if let Err(e) = write_file(&gitignore_path, &generate_gitignore(), false) {
        output.warning(&format!("Failed to create .gitignore: {}", e));
    } else {
        output.created("file", ".gitignore");
    }

    output.complete("deepresearch project initialized successfully!");

    output.header("Next Steps");
    output.newline();
    output.info("1. Set up environment variables:");
    output.command("cp .env.example .env");
    output.command("# Edit .env and set RESEND_API_KEY and TO_EMAIL to send reports");
    output.newline();

    match config.provider {
        ProviderChoice::Ollama => {
            output.info("2. Start Ollama (if not running):");
            output.command("ollama serve");
            output.command("ollama pull llama3.2");
        }
        ProviderChoice::Openai => {
            output.info("2. Set OPENAI_API_KEY in .env");
        }
    }
    output.newline();

    output.info("3. Research something:");
    output.command("deepresearch run \"the state of solid-state batteries\"");
    output.newline();

    output.hint(&format!(
        "Or start the server: deepresearch serve (http://{}:{})",
        config.host, config.port
    ));

    InitResult::Success
}

fn write_file(path: &Path, content: &str, force: bool) -> std::io::Result<()> {
    if path.exists() && !force {
        return Ok(());
    }
    fs::write(path, content)
}

fn generate_config_toml(config: &InitConfig) -> String {
    let provider_section = match config.provider {
        ProviderChoice::Openai => {
            r#"# OpenAI API (set OPENAI_API_KEY in .env)
[provider]
type = "openai"
api_key_env = "OPENAI_API_KEY"
api_base = "https://api.openai.com/v1"
model = "gpt-4o-mini"
"#
        }
        ProviderChoice::Ollama => {
            r#"# Ollama - Local inference (no API key required)
[provider]
type = "ollama"
base_url = "http://localhost:11434"
model = "llama3.2"
"#
        }
    };

    format!(
        r#"# deepresearch Configuration
# ==========================
# Generated by: deepresearch init
#
# Secrets are never stored here. Sections name the environment variable
# that holds them; put the values in .env.

# =============================================================================
# Server Configuration
# =============================================================================
[server]
host = "{host}"
port = {port}
log_level = "info"

# =============================================================================
# LLM Provider
# =============================================================================
{provider_section}
# =============================================================================
# Research Pipeline
# =============================================================================
[research]
searches_per_plan = 5
results_per_search = 5
summary_word_limit = 300
# max_concurrent_searches = 3
# run_timeout_secs = 600

# =============================================================================
# Delivery
# =============================================================================
[delivery]
# "preview" renders the email without sending; "send" emails it
mode = "preview"
api_url = "https://api.resend.com/emails"
api_key_env = "RESEND_API_KEY"
from_email = "onboarding@resend.dev"
from_name = "Deep Research"
# to_email = "you@example.com"

# =============================================================================
# Report Output
# =============================================================================
[output]
save_html = true
directory = "output"
"#,
        host = config.host,
        port = config.port,
        provider_section = provider_section,
    )
}

fn generate_env_example() -> String {
    r#"# deepresearch environment variables
# Copy to .env and fill in the values you need.

# Logging (overrides server.log_level)
RUST_LOG=info

# OpenAI provider
OPENAI_API_KEY=

# Email delivery through Resend
RESEND_API_KEY=
FROM_EMAIL=onboarding@resend.dev
TO_EMAIL=
"#
    .to_string()
}

fn generate_gitignore() -> String {
    r#"# Generated reports
/output/

# Environment
.env

# Build
/target/

# OS files
.DS_Store
"#
    .to_string()
}
