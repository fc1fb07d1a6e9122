//! schema_delta CLI
//!
//! Compares two database schemas and writes the migration script.

use std::io;

use anyhow::Context;
use clap::{Parser, Subcommand, ValueEnum};
use tracing::{info, Level};
use tracing_subscriber::FmtSubscriber;

use schema_delta::config::{self, Config};
use schema_delta::output;
use schema_delta::utils::logging;
use schema_delta::{SchemaAnalyzer, SchemaDeltaClient};

/// Diff two database schemas into a DDL migration script.
#[derive(Parser)]
#[command(name = "schema_delta")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Configuration file.
    #[arg(short, long, default_value = "schema_delta.toml")]
    config: String,

    /// Enable verbose output (when the config has no [logging] section).
    #[arg(short, long)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Introspect both sides and write the migration script.
    Diff {
        /// Write to this file instead of the configured output path.
        #[arg(short, long)]
        output: Option<String>,

        /// Print the script to stdout instead of writing a file.
        #[arg(long)]
        stdout: bool,

        /// Skip rename detection.
        #[arg(long)]
        no_renames: bool,

        /// Do not wrap the diff statements in a transaction.
        #[arg(long)]
        no_transaction: bool,
    },

    /// Dump one side's raw column records as JSON (readable by the `file` driver).
    Snapshot {
        /// Which configured database to read.
        #[arg(short, long, value_enum, default_value_t = Side::Source)]
        side: Side,

        /// Write to this file instead of stdout.
        #[arg(short, long)]
        output: Option<String>,
    },
}

#[derive(Clone, Copy, ValueEnum)]
enum Side {
    Source,
    Target,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let mut config = config::load_from_file(&cli.config)
        .with_context(|| format!("loading {}", cli.config))?;

    if !logging::init_logging(&config.logging)? {
        let level = if cli.verbose { Level::DEBUG } else { Level::INFO };
        let subscriber = FmtSubscriber::builder()
            .with_max_level(level)
            .with_writer(io::stderr)
            .finish();
        tracing::subscriber::set_global_default(subscriber)?;
    }

    match cli.command {
        Commands::Diff {
            output: output_path,
            stdout,
            no_renames,
            no_transaction,
        } => {
            apply_overrides(&mut config, output_path, no_renames, no_transaction);
            let client = SchemaDeltaClient::new(config);

            if stdout {
                let plan = client.generate_plan().await?;
                output::write_to(&plan.script, &mut io::stdout().lock())?;
            } else {
                let path = client.sync().await?;
                info!("Migration script written to {}", path.display());
            }
        }

        Commands::Snapshot { side, output } => {
            let database = match side {
                Side::Source => &config.source,
                Side::Target => &config.target,
            };
            let snapshot = SchemaAnalyzer::new(database).snapshot().await?;
            let json = serde_json::to_string_pretty(&snapshot.to_records())?;

            match output {
                Some(path) => {
                    std::fs::write(&path, json + "\n")
                        .with_context(|| format!("writing {}", path))?;
                    info!(tables = snapshot.len(), "Snapshot written to {}", path);
                }
                None => println!("{}", json),
            }
        }
    }

    Ok(())
}

fn apply_overrides(
    config: &mut Config,
    output_path: Option<String>,
    no_renames: bool,
    no_transaction: bool,
) {
    if let Some(path) = output_path {
        config.output.path = path;
    }
    if no_renames {
        config.diff.detect_renames = false;
    }
    if no_transaction {
        config.diff.wrap_in_transaction = false;
    }
}
