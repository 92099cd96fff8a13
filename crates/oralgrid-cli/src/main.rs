//! oralgrid CLI — the user-facing command-line interface.

use std::path::PathBuf;
use std::process;

use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

mod commands;
mod form;
mod render;

#[derive(Parser)]
#[command(
    name = "oralgrid",
    version,
    about = "Oral presentation evaluation grid"
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Start an interactive evaluation session
    Session {
        /// Catalog TOML file (defaults to the built-in grid)
        #[arg(long)]
        catalog: Option<PathBuf>,

        /// Config file path
        #[arg(long)]
        config: Option<PathBuf>,

        /// Directory for exports and HTML results
        #[arg(long)]
        output: Option<PathBuf>,
    },

    /// Aggregate a previously exported evaluations file
    Report {
        /// Exported evaluations JSON
        #[arg(long)]
        input: PathBuf,

        /// Only count evaluations of this subject
        #[arg(long)]
        subject: Option<String>,

        /// Output format: text, markdown, html, json
        #[arg(long, default_value = "text")]
        format: String,

        /// Write to this file instead of stdout
        #[arg(long)]
        output: Option<PathBuf>,

        /// Catalog TOML file the export was made with
        #[arg(long)]
        catalog: Option<PathBuf>,

        /// Config file path
        #[arg(long)]
        config: Option<PathBuf>,
    },

    /// Validate a catalog TOML file
    Validate {
        /// Path to the catalog file
        #[arg(long)]
        catalog: PathBuf,
    },

    /// Create a starter config and catalog
    Init,
}

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("oralgrid=info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    let result = match cli.command {
        Commands::Session {
            catalog,
            config,
            output,
        } => commands::session::execute(catalog, config, output),
        Commands::Report {
            input,
            subject,
            format,
            output,
            catalog,
            config,
        } => commands::report::execute(input, subject, format, output, catalog, config),
        Commands::Validate { catalog } => commands::validate::execute(catalog),
        Commands::Init => commands::init::execute(),
    };

    if let Err(e) = result {
        eprintln!("Error: {e:#}");
        process::exit(1);
    }
}
