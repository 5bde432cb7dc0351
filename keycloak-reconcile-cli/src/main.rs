mod cli;
mod error;
mod state;

use clap::Parser;
use keycloak_reconcile::{AppConfig, EnvConfigurationAdapter, LogFormat, LoggingConfig};
use serde::Serialize;
use serde_json::Value;
use std::io::Read;
use std::path::Path;
use std::process::ExitCode;
use tracing::{error, info};
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use crate::cli::{Cli, Command};
use crate::error::CliError;
use crate::state::AppState;

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    let config = AppConfig::from_env();
    let logging = config.as_ref().map(|c| c.logging.clone()).unwrap_or_default();
    init_tracing(&logging);

    let result = match config {
        Ok(config) => run(&cli, config).await,
        Err(e) => Err(CliError::from(e)),
    };

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!(command = cli.command.name(), "{}", e);
            eprintln!("error: {e}");
            e.exit_code()
        }
    }
}

async fn run(cli: &Cli, config: AppConfig) -> Result<(), CliError> {
    let adapter = EnvConfigurationAdapter::from_config(config)?;
    let state = AppState::new(&adapter, cli.command.name(), cli.command.needs_destination())?;
    let service = &state.service;

    match &cli.command {
        Command::Diff { kind } => {
            let report = service.diff(*kind).await?;
            info!(kind = %kind, records = report.len(), "Diff finished");
            print_json(&report, cli.compact)
        }
        Command::Sync { kind, key } => {
            let report = service.sync(*kind, key).await?;
            info!(
                kind = %kind,
                key = %key,
                action = ?report.action,
                warnings = report.warnings.len(),
                "Sync finished"
            );
            print_json(&report, cli.compact)
        }
        Command::Rbac { kind, key, stats_only } => {
            let analysis = service.analyze(*kind, key).await?;
            if *stats_only {
                print_json(&analysis.statistics, cli.compact)
            } else {
                print_json(&analysis, cli.compact)
            }
        }
        Command::Export { target } => {
            let document = service.export(*target).await?;
            print_json(&document, cli.compact)
        }
        Command::Import { target, file } => {
            let document = read_document(file)?;
            let report = service.import(*target, document).await?;
            info!(target_kind = %target, failed = report.failures.len(), "Import finished");
            print_json(&report, cli.compact)
        }
    }
}

/// Parse a JSON document from `path`, or from stdin when the path is `-`
fn read_document(path: &Path) -> Result<Value, CliError> {
    let input_error = |message: String| CliError::Input {
        path: path.display().to_string(),
        message,
    };

    let raw = if path == Path::new("-") {
        let mut buffer = String::new();
        std::io::stdin()
            .read_to_string(&mut buffer)
            .map_err(|e| input_error(e.to_string()))?;
        buffer
    } else {
        std::fs::read_to_string(path).map_err(|e| input_error(e.to_string()))?
    };

    serde_json::from_str(&raw).map_err(|e| input_error(e.to_string()))
}

fn print_json<T: Serialize>(value: &T, compact: bool) -> Result<(), CliError> {
    let rendered = if compact {
        serde_json::to_string(value)?
    } else {
        serde_json::to_string_pretty(value)?
    };
    println!("{rendered}");
    Ok(())
}

/// RUST_LOG wins over LOG_LEVEL. Output goes to stderr so stdout stays parseable.
fn init_tracing(logging: &LoggingConfig) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        EnvFilter::new(format!(
            "keycloak_reconcile={level},kc_reconcile={level}",
            level = logging.level
        ))
    });
    let registry = tracing_subscriber::registry().with(filter);

    match logging.format {
        LogFormat::Compact => registry
            .with(fmt::layer().compact().with_writer(std::io::stderr))
            .init(),
        LogFormat::Pretty => registry
            .with(fmt::layer().pretty().with_writer(std::io::stderr))
            .init(),
        LogFormat::Json => registry
            .with(fmt::layer().json().with_writer(std::io::stderr))
            .init(),
    }
}
