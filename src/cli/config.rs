//! Config command implementation

use super::output::Output;
use crate::utils::toml_config::{ProviderConfig, ResearchConfig};
use std::path::Path;

/// Print the effective configuration and any warnings.
///
/// Returns `false` when `--validate` was given and the configuration is
/// missing or invalid.
pub fn run(path: &Path, validate: bool, output: &Output) -> bool {
    output.header("Configuration");

    let config = if validate {
        ResearchConfig::load(path)
    } else {
        ResearchConfig::load_or_default(path)
    };

    let config = match config {
        Ok(config) => config,
        Err(e) => {
            output.error(&format!("{}: {}", path.display(), e));
            return false;
        }
    };

    if path.exists() {
        output.kv("file", &path.display().to_string());
    } else {
        output.kv("file", "(not found, using defaults)");
    }

    print_config(&config, output);

    match config.validate_with_warnings() {
        Ok(warnings) if warnings.is_empty() => {
            output.newline();
            output.success("Configuration is valid");
            true
        }
        Ok(warnings) => {
            output.subheader("Warnings");
            for warning in &warnings {
                output.warning(&warning.message);
            }
            true
        }
        Err(e) => {
            output.error(&e.to_string());
            false
        }
    }
}

fn print_config(config: &ResearchConfig, output: &Output) {
    output.subheader("Server");
    output.kv("address", &format!("{}:{}", config.server.host, config.server.port));
    output.kv("log_level", &config.server.log_level);

    output.subheader("Provider");
    match &config.provider {
        ProviderConfig::Ollama { base_url, model } => {
            output.kv("type", "ollama");
            output.kv("base_url", base_url);
            output.kv("model", model);
        }
        ProviderConfig::OpenAI {
            api_key_env,
            api_base,
            model,
        } => {
            output.kv("type", "openai");
            output.kv("api_base", api_base);
            output.kv("model", model);
            output.kv("api_key_env", api_key_env);
        }
    }

    let research = &config.research;
    output.subheader("Research");
    output.kv("searches_per_plan", &research.searches_per_plan.to_string());
    output.kv("results_per_search", &research.results_per_search.to_string());
    output.kv("summary_word_limit", &research.summary_word_limit.to_string());
    output.kv(
        "max_concurrent_searches",
        &research
            .max_concurrent_searches
            .map_or_else(|| "unbounded".to_string(), |n| n.to_string()),
    );
    output.kv(
        "run_timeout_secs",
        &research
            .run_timeout_secs
            .map_or_else(|| "none".to_string(), |n| n.to_string()),
    );

    let delivery = &config.delivery;
    output.subheader("Delivery");
    output.kv("mode", &delivery.mode.to_string());
    output.kv("api_url", &delivery.api_url);
    output.kv(
        "api_key",
        if delivery.api_key().is_some() {
            "set"
        } else {
            "not set"
        },
    );
    output.kv("from", &format!("{} <{}>", delivery.from_name, delivery.from_email));
    output.kv(
        "to",
        delivery.recipient().as_deref().unwrap_or("(not configured)"),
    );

    output.subheader("Output");
    output.kv("save_html", &config.output.save_html.to_string());
    output.kv("directory", &config.output.directory.display().to_string());
}
