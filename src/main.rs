//! Microscope CLI - Call graphs of Java and Kotlin services as Turtle

mod commands;

use clap::{Parser, Subcommand};
use commands::ScanArgs;
use microscope::ui;
use std::path::PathBuf;
use std::process::ExitCode;
use tokio_util::sync::CancellationToken;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

#[derive(Parser)]
#[command(name = "microscope")]
#[command(version)]
#[command(about = "Knowledge graph of method calls and instantiations across Java and Kotlin sources")]
#[command(long_about = r#"
Microscope walks the Java and Kotlin sources of a service and records:
  • Classes and methods, keyed by qualified name and arity
  • CALLS and INSTANTIATES edges, flagged low-confidence when unresolved
  • Spring endpoints and Retrofit client routes on methods

Example usage:
  microscope init
  microscope scan --path ./order-service --output order-service.ttl
  microscope inspect --input order-service.ttl --json
"#)]
struct Cli {
    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Scan a source tree and write the model as Turtle
    Scan {
        /// Root directory of the sources
        #[arg(short, long)]
        path: PathBuf,

        /// Output file (default: model.ttl, or `output` from the config)
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Config file (default: ./microscope.toml when present)
        #[arg(short, long)]
        config: Option<PathBuf>,

        /// Worker threads
        #[arg(short, long, conflicts_with = "sequential")]
        jobs: Option<usize>,

        /// Walk files one at a time on the current thread
        #[arg(long)]
        sequential: bool,

        /// Gitignore-style pattern to exclude (repeatable)
        #[arg(short, long)]
        exclude: Vec<String>,

        /// Drop targets whose owner starts with this prefix (repeatable)
        #[arg(long = "ignore-owner")]
        ignore_owner: Vec<String>,
    },

    /// Print statistics of a model file
    Inspect {
        /// Turtle file written by `scan`
        #[arg(short, long)]
        input: PathBuf,

        /// Print JSON instead of a table
        #[arg(long)]
        json: bool,

        /// Also list callers and callees of this method key, e.g. `method:com.acme.A.foo(0)`
        #[arg(short, long)]
        method: Option<String>,
    },

    /// Write a starter microscope.toml
    Init {
        /// Where to write the config
        #[arg(short, long)]
        path: Option<PathBuf>,

        /// Overwrite an existing config
        #[arg(short, long)]
        force: bool,
    },
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    // Initialize logging
    let filter = if cli.verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::new("info")
    };

    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(std::io::stderr))
        .with(filter)
        .init();

    match run(cli.command) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            ui::error(&format!("{:#}", e));
            ExitCode::FAILURE
        }
    }
}

fn run(command: Commands) -> anyhow::Result<()> {
    match command {
        Commands::Scan {
            path,
            output,
            config,
            jobs,
            sequential,
            exclude,
            ignore_owner,
        } => {
            let cancel = CancellationToken::new();
            let handler_token = cancel.clone();
            if let Err(e) = ctrlc::set_handler(move || handler_token.cancel()) {
                tracing::warn!("Failed to install the Ctrl-C handler: {}", e);
            }

            let args = ScanArgs {
                path,
                output,
                config,
                jobs,
                sequential,
                exclude,
                ignore_owner,
            };
            commands::run_scan(args, cancel)
        }
        Commands::Inspect { input, json, method } => commands::run_inspect(input, json, method),
        Commands::Init { path, force } => commands::run_init(path, force),
    }
}
