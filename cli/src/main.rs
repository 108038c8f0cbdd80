mod replay;

use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use tracing_subscriber::{EnvFilter, fmt, prelude::*};

use vigil_config::{VigilConfig, load_data, load_schema};
use vigil_core::{model, predicates, validate, watch_properties};

#[derive(Debug, Parser)]
#[command(name = "vigil", version, about = "Schema checks and guarded model replays")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Validate a data file against a schema descriptor.
    Check {
        #[arg(long)]
        schema: PathBuf,
        #[arg(long)]
        data: PathBuf,
        /// Label used as the root of error paths.
        #[arg(long, default_value = "data")]
        name: String,
    },
    /// Print the paths a model with this schema watches.
    Paths {
        #[arg(long)]
        schema: PathBuf,
    },
    /// Print registered type names.
    Types,
    /// Build a guarded model and replay a mutation script against it.
    Replay {
        #[arg(long)]
        schema: PathBuf,
        #[arg(long)]
        data: PathBuf,
        #[arg(long)]
        ops: PathBuf,
        /// Model name; also selects `[models.<name>]` options from the config.
        #[arg(long, default_value = "replay")]
        name: String,
    },
}

fn init_tracing() {
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(std::io::stderr))
        .with(env_filter)
        .init();
}

fn load_config() -> Option<VigilConfig> {
    match VigilConfig::load() {
        Ok(config) => config,
        Err(err) => {
            tracing::warn!(path = %err.path().display(), "ignoring config: {err}");
            None
        }
    }
}

fn main() -> Result<ExitCode> {
    init_tracing();
    let cli = Cli::parse();

    let config = load_config().unwrap_or_default();
    config.apply_environment();

    match cli.command {
        Command::Check { schema, data, name } => {
            let schema = load_schema(&schema)?;
            let data = load_data(&data)?;
            match validate(&data, &schema, &name) {
                Ok(()) => {
                    println!("ok");
                    Ok(ExitCode::SUCCESS)
                }
                Err(err) => {
                    println!("{err}");
                    Ok(ExitCode::FAILURE)
                }
            }
        }
        Command::Paths { schema } => {
            for path in watch_properties(&load_schema(&schema)?) {
                println!("{path}");
            }
            Ok(ExitCode::SUCCESS)
        }
        Command::Types => {
            for name in predicates::registered_names() {
                println!("{name}");
            }
            Ok(ExitCode::SUCCESS)
        }
        Command::Replay {
            schema,
            data,
            ops,
            name,
        } => {
            let schema = load_schema(&schema)?;
            let data = load_data(&data)?;
            let ops = replay::parse_ops(load_data(&ops)?)
                .with_context(|| format!("reading ops for model '{name}'"))?;
            let store = replay::builtin_store(&name, data, schema);
            let target = match model(store, config.model_options(&name)) {
                Ok(target) => target,
                Err(err) => {
                    println!("{err}");
                    return Ok(ExitCode::FAILURE);
                }
            };
            match replay::run(&target, &ops) {
                Ok(()) => {
                    println!("ok ({} ops)", ops.len());
                    Ok(ExitCode::SUCCESS)
                }
                Err(err) => {
                    println!("{err:#}");
                    Ok(ExitCode::FAILURE)
                }
            }
        }
    }
}
