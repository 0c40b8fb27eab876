use anyhow::{bail, Context};
use deepresearch::{
    api::routes::create_app,
    cli::{self, output::Output, Cli, Commands},
    research::model::DeliveryMode,
    AppState, ResearchConfig, ResearchOrchestrator,
};
use owo_colors::OwoColorize;
use std::path::Path;
use tokio_util::sync::CancellationToken;
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

#[tokio::main]
async fn main() {
    if let Err(e) = run().await {
        eprintln!("{} {:#}", "Error:".red().bold(), e);
        std::process::exit(1);
    }
}

async fn run() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    let cli = Cli::parse_args();
    let output = if cli.no_color {
        Output::no_color()
    } else {
        Output::new()
    };

    match cli.command {
        Some(Commands::Init {
            path,
            force,
            provider,
            host,
            port,
        }) => {
            let config = cli::init::InitConfig {
                path,
                force,
                provider,
                host,
                port,
            };
            match cli::init::run(config, &output) {
                cli::init::InitResult::Error(e) => bail!("init failed: {}", e),
                _ => Ok(()),
            }
        }
        Some(Commands::Config { validate }) => {
            if cli::config::run(&cli.config, validate, &output) {
                Ok(())
            } else {
                bail!("invalid configuration")
            }
        }
        Some(Commands::Run {
            topic,
            send,
            no_save,
            timeout,
        }) => {
            let mut config = load_config(&cli.config)?;
            if no_save {
                config.output.save_html = false;
            }
            if timeout.is_some() {
                config.research.run_timeout_secs = timeout;
            }
            config.validate()?;
            init_tracing(&config.server.log_level, cli.verbose, cli.log_json);

            let mode = if send {
                DeliveryMode::Send
            } else {
                config.delivery.mode
            };
            research_once(&config, &topic, mode, &output).await
        }
        Some(Commands::Serve { host, port }) => {
            let mut config = load_config(&cli.config)?;
            if let Some(host) = host {
                config.server.host = host;
            }
            if let Some(port) = port {
                config.server.port = port;
            }
            init_tracing(&config.server.log_level, cli.verbose, cli.log_json);
            serve(config, &output).await
        }
        None => {
            let config = load_config(&cli.config)?;
            init_tracing(&config.server.log_level, cli.verbose, cli.log_json);
            serve(config, &output).await
        }
    }
}

fn load_config(path: &Path) -> anyhow::Result<ResearchConfig> {
    ResearchConfig::load_or_default(path)
        .with_context(|| format!("failed to load {}", path.display()))
}

/// Install the global subscriber.
///
/// Filter precedence: `--verbose`, then `RUST_LOG`, then `server.log_level`.
fn init_tracing(log_level: &str, verbose: bool, json: bool) {
    let filter = if verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(log_level))
    };

    let registry = tracing_subscriber::registry().with(filter);
    if json {
        registry
            .with(fmt::layer().json().with_writer(std::io::stderr))
            .init();
    } else {
        registry
            .with(fmt::layer().with_writer(std::io::stderr))
            .init();
    }
}

async fn research_once(
    config: &ResearchConfig,
    topic: &str,
    mode: DeliveryMode,
    output: &Output,
) -> anyhow::Result<()> {
    for warning in config.validate_with_warnings()? {
        output.warning(&warning.message);
    }

    let orchestrator = ResearchOrchestrator::from_config(config).await?;

    let cancel = CancellationToken::new();
    let on_interrupt = cancel.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            tracing::warn!("interrupt received, cancelling run");
            on_interrupt.cancel();
        }
    });

    match cli::research::execute(&orchestrator, topic, mode, cancel, output).await {
        Some(result) if result.is_success() => Ok(()),
        Some(result) => bail!(result
            .error
            .unwrap_or_else(|| "research failed".to_string())),
        None => bail!("research ended without a result"),
    }
}

async fn serve(config: ResearchConfig, output: &Output) -> anyhow::Result<()> {
    for warning in config.validate_with_warnings()? {
        tracing::warn!("{}", warning);
    }

    let orchestrator = ResearchOrchestrator::from_config(&config).await?;
    let addr = format!("{}:{}", config.server.host, config.server.port);

    let state = AppState::new(config, orchestrator);
    let shutdown = state.shutdown.clone();
    let app = create_app(state);

    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("failed to bind {}", addr))?;

    output.banner();
    output.info(&format!("Listening on http://{}", addr));
    output.info(&format!("OpenAPI document at http://{}/api-docs/openapi.json", addr));
    tracing::info!(%addr, "server started");

    axum::serve(listener, app)
        .with_graceful_shutdown(async move {
            if tokio::signal::ctrl_c().await.is_ok() {
                tracing::info!("shutdown signal received");
            }
            shutdown.cancel();
        })
        .await?;

    tracing::info!("server stopped");
    Ok(())
}
