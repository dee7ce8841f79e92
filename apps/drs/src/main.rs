//! drs - client for GA4GH Data Repository Service servers
//!
//! This is the CLI application. It loads configuration, builds the operations
//! context and runs `get` while draining progress events into tracing. The
//! `schemes` command only lists what the client supports.

mod cli;
mod display;
mod error;
mod logging;

use crate::cli::{Cli, Commands, GetArgs, GlobalArgs};
use crate::display::OutputRenderer;
use crate::error::CliError;
use crate::logging::{init_tracing, log_event_with_tracing};
use clap::Parser;
use drs_config::Config;
use drs_events::{EventReceiver, EventSender};
use drs_net::{validate_url, HttpTransport};
use drs_ops::{GetOutcome, GetRequest, OpsContextBuilder, OpsCtx};
use std::future::Future;
use std::process;
use std::sync::Arc;
use tokio::select;
use tracing::{error, info, warn};

#[tokio::main]
async fn main() {
    let cli = Cli::parse();
    let silent = cli.global.silent;

    if let Err(e) = init_tracing(&cli.global) {
        eprintln!("Error: {e}");
        process::exit(1);
    }

    match run(cli).await {
        Ok(true) => info!("exiting with exit code: 0"),
        Ok(false) => {
            info!("exiting with exit code: 1");
            process::exit(1);
        }
        Err(e) => {
            error!("Application error: {}", e);
            if !silent {
                eprintln!("Error: {e}");
            }
            process::exit(1);
        }
    }
}

/// Main application logic; `Ok(false)` when any object or branch failed
async fn run(cli: Cli) -> Result<bool, CliError> {
    info!("Starting drs v{}", env!("CARGO_PKG_VERSION"));
    match cli.command {
        Commands::Get(args) => run_get(&cli.global, &args).await,
        Commands::Schemes => {
            if !cli.global.silent {
                OutputRenderer::new(cli.global.json).render_schemes()?;
            }
            Ok(true)
        }
    }
}

async fn run_get(global: &GlobalArgs, args: &GetArgs) -> Result<bool, CliError> {
    // Load configuration with proper precedence:
    // 1. Start with file config (or defaults)
    let mut config = Config::load_or_default(global.config.as_deref()).await?;

    // 2. Merge environment variables
    config.merge_env()?;

    // 3. Apply CLI flags (highest precedence)
    apply_cli_config(&mut config, args)?;
    config.validate()?;

    if config.network.suppress_ssl_verify {
        warn!(
            "SSL verification is turned off. We recommend turning verification on \
             unless it is necessary that it be off."
        );
    }

    info!("validating command-line arguments");
    validate_url(&args.url)?;

    let (event_sender, event_receiver) = drs_events::channel();
    let ctx = build_ops_context(&args.url, &config, event_sender)?;

    let request = GetRequest {
        object_id: args.object_id.clone(),
        expand: args.expand,
        download: args.download,
        output_dir: config.output_dir(),
    };

    let outcome = execute_with_events(drs_ops::get(&ctx, &request), event_receiver).await?;
    write_outputs(global, args, &outcome).await?;

    Ok(outcome.is_success())
}

/// Run an operation while draining its events into tracing
async fn execute_with_events<F>(
    operation: F,
    mut event_receiver: EventReceiver,
) -> Result<GetOutcome, CliError>
where
    F: Future<Output = Result<GetOutcome, drs_errors::Error>>,
{
    let mut operation = Box::pin(operation);

    loop {
        select! {
            // Operation completed
            result = &mut operation => {
                // Drain any remaining events
                while let Ok(event) = event_receiver.try_recv() {
                    log_event_with_tracing(&event);
                }
                return result.map_err(CliError::from);
            }

            // Event received
            Some(event) = event_receiver.recv() => {
                log_event_with_tracing(&event);
            }
        }
    }
}

/// Print or write the metadata and the report
async fn write_outputs(
    global: &GlobalArgs,
    args: &GetArgs,
    outcome: &GetOutcome,
) -> Result<(), CliError> {
    if let Some(path) = &args.output_metadata {
        tokio::fs::write(path, format!("{}\n", outcome.metadata)).await?;
        info!("metadata written to {}", path.display());
    } else if !global.silent {
        println!("{}", outcome.metadata);
    }

    let Some(report) = &outcome.report else {
        info!("object/bundle download not requested");
        return Ok(());
    };

    if let Some(path) = &args.report {
        let json = serde_json::to_string_pretty(report)
            .map_err(|e| CliError::Io(std::io::Error::other(e)))?;
        tokio::fs::write(path, format!("{json}\n")).await?;
        info!("report written to {}", path.display());
    }

    if !global.silent {
        OutputRenderer::new(global.json).render_report(report)?;
    }
    Ok(())
}

/// Build operations context with all required components
fn build_ops_context(
    base_url: &str,
    config: &Config,
    event_sender: EventSender,
) -> Result<OpsCtx, CliError> {
    let transport = HttpTransport::new(base_url, drs_ops::net_config(config))?
        .with_event_sender(event_sender.clone());

    let ctx = OpsContextBuilder::new()
        .with_transport(Arc::new(transport))
        .with_event_sender(event_sender)
        .with_config(config)?
        .build()?;

    Ok(ctx)
}

/// Apply CLI configuration overrides (highest precedence)
fn apply_cli_config(config: &mut Config, args: &GetArgs) -> Result<(), CliError> {
    if let Some(workers) = args.workers {
        if workers == 0 {
            return Err(CliError::InvalidArguments(
                "--workers must be at least 1".to_string(),
            ));
        }
        config.general.workers = workers;
    }
    if let Some(dir) = &args.output_dir {
        config.download.output_dir = Some(dir.clone());
    }
    if let Some(checksum) = &args.checksum {
        config.download.checksum = Some(checksum.clone());
    }
    if let Some(token) = &args.authtoken {
        config.auth.token = Some(token.clone());
    }
    if args.suppress_ssl_verify {
        config.network.suppress_ssl_verify = true;
    }
    Ok(())
}
