//! implant: command-line generator for dental implant meshes.
//!
//! Thin glue over `implant-mesh`: reads parameters from defaults, a TOML/JSON
//! file and per-field flags, runs the generator and writes STL or OBJ.
//!
//! # Logging
//!
//! `RUST_LOG` takes precedence over `-v`:
//! - `RUST_LOG=implant_mesh=info` - One line per stage
//! - `RUST_LOG=implant_mesh=debug` - Grid, triangulation and validation detail
//! - `RUST_LOG=implant_mesh::timing=info` - Stage timings
//!
//! # Example
//!
//! ```bash
//! # Default implant
//! implant generate -o dental_implant.stl
//!
//! # Narrower implant from a config file, with a finer thread
//! implant generate -c implant.toml --body-radius 1.75 --thread-pitch 0.8 -o narrow.stl
//!
//! # Start a config file from the defaults
//! implant params > implant.toml
//! ```

use std::path::PathBuf;

use anyhow::Result;
use clap::{Parser, Subcommand, ValueEnum};
use colored::Colorize;
use tracing_subscriber::{EnvFilter, fmt, prelude::*};

mod commands;
mod output;

use commands::generate::{GenerateArgs, ParamArgs};
use commands::{check, generate, params};

/// implant - Generate screw-shaped dental implant meshes.
///
/// Builds a closed, outward-wound triangle mesh of an implant body (apex
/// taper, threaded shaft, flared collar) and writes it as STL or OBJ.
#[derive(Parser)]
#[command(name = "implant")]
#[command(author, version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Print results as text or JSON
    #[arg(long, global = true, default_value = "text")]
    format: OutputFormat,

    /// Print nothing but errors
    #[arg(long, short, global = true)]
    quiet: bool,

    /// Log more (-v stages, -vv details, -vvv everything)
    #[arg(long, short, global = true, action = clap::ArgAction::Count)]
    verbose: u8,
}

#[derive(Clone, Copy, ValueEnum)]
pub enum OutputFormat {
    /// Labelled lines for people
    Text,
    /// One JSON document for scripts
    Json,
}

#[derive(Subcommand)]
enum Commands {
    /// Generate an implant mesh and write it to a file
    Generate {
        #[command(flatten)]
        args: GenerateArgs,

        #[command(flatten)]
        overrides: ParamArgs,
    },

    /// Print the default parameter set
    Params {
        /// Print JSON instead of TOML
        #[arg(long)]
        json: bool,
    },

    /// Validate a parameter file without generating
    Check {
        /// Parameter file (.toml or .json)
        config: PathBuf,
    },
}

/// Install a stderr subscriber unless `--quiet` was given.
fn init_tracing(verbose: u8, quiet: bool) {
    if quiet {
        return;
    }

    // RUST_LOG wins over -v flags
    let filter = if std::env::var("RUST_LOG").is_ok() {
        EnvFilter::from_default_env()
    } else {
        let level = match verbose {
            0 => "warn",
            1 => "implant_mesh=info,implant_cli=info",
            2 => "implant_mesh=debug,implant_cli=debug",
            _ => "trace",
        };
        EnvFilter::try_new(level).unwrap_or_else(|_| EnvFilter::new("warn"))
    };

    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(std::io::stderr).compact())
        .with(filter)
        .init();
}

fn main() -> Result<()> {
    #[cfg(debug_assertions)]
    miette::set_panic_hook();

    let cli = Cli::parse();

    init_tracing(cli.verbose, cli.quiet);

    let result = match &cli.command {
        Commands::Generate { args, overrides } => generate::run(args, overrides, &cli),
        Commands::Params { json } => params::run(*json, &cli),
        Commands::Check { config } => check::run(config, &cli),
    };

    if let Err(e) = &result {
        if !cli.quiet {
            if let Some(implant_err) = e.downcast_ref::<implant_mesh::ImplantError>() {
                eprintln!("{} {:#}", "error:".red().bold(), e);
                eprintln!("  {}: {}", "Code".cyan(), implant_err.code());
                eprintln!(
                    "  {}: {}",
                    "Suggestion".green(),
                    implant_err.recovery_suggestion()
                );
            } else {
                eprintln!("{} {:#}", "error:".red().bold(), e);
            }
        }
        std::process::exit(1);
    }

    Ok(())
}
