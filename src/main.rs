//! runrelay binary entry point.

use std::sync::Arc;

use clap::Parser;
use runrelay::cli::{AskArgs, Cli, Commands, ServeArgs};
use runrelay::config::RelayConfig;
use runrelay::orchestrator::{RecordMode, RunOrchestrator};
use runrelay::types::{ErrorResponse, TurnRequest};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

#[tokio::main]
async fn main() {
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with(fmt::layer().with_writer(std::io::stderr))
        .init();

    let cli = Cli::parse();
    let result = match RelayConfig::load(cli.config.as_deref()) {
        Ok(config) => match cli.command {
            Commands::Serve(args) => handle_serve(config, args).await,
            Commands::Ask(args) => handle_ask(config, args).await,
        },
        Err(e) => Err(e.into()),
    };

    if let Err(e) = result {
        eprintln!("Error: {e}");
        std::process::exit(1);
    }
}

async fn handle_serve(
    mut config: RelayConfig,
    args: ServeArgs,
) -> Result<(), Box<dyn std::error::Error>> {
    if let Some(bind) = args.bind {
        config.bind_addr = bind;
    }
    let orchestrator = Arc::new(RunOrchestrator::from_config(&config)?);
    runrelay::server::serve(&config.bind_addr, orchestrator).await?;
    Ok(())
}

async fn handle_ask(config: RelayConfig, args: AskArgs) -> Result<(), Box<dyn std::error::Error>> {
    // The process exits right after printing, so a detached recorder task
    // would be dropped.
    let orchestrator = RunOrchestrator::from_config(&config)?.with_record_mode(RecordMode::Inline);
    let request = TurnRequest {
        message: args.message,
        user_id: args.user,
        thread_id: args.thread,
    };

    let rendered = match orchestrator.handle_turn(&request).await {
        Ok(outcome) => serde_json::to_string_pretty(&outcome.to_response())?,
        Err(err) => {
            let body = serde_json::to_string_pretty(&ErrorResponse::new(err.to_string()))?;
            println!("{body}");
            return Err(err.into());
        }
    };
    println!("{rendered}");
    Ok(())
}
