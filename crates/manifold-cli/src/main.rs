//! Manifold CLI - compile deployment values into Kubernetes resources.
//!
//! This is the entry point for the `manifold` binary. It reads one YAML
//! document from stdin (or `--file`) and writes a JSON array of objects to
//! stdout. Logs and errors go to stderr.

use std::io::{self, Read, Write};
use std::path::{Path, PathBuf};
use std::process::ExitCode;

use anyhow::Context;
use clap::Parser;
use manifold_render::{RenderConfig, RenderError};
use manifold_schema::SchemaError;
use tracing::{debug, error};
use tracing_subscriber::EnvFilter;

/// Manifold CLI - compile deployment values into Kubernetes resources.
#[derive(Parser, Debug)]
#[command(name = "manifold")]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Read values from this file instead of stdin.
    #[arg(short, long, env = "MANIFOLD_FILE")]
    file: Option<PathBuf>,

    /// Indent the JSON output.
    #[arg(long, default_value = "false")]
    pretty: bool,

    /// Enable debug logging.
    #[arg(short, long, default_value = "false")]
    verbose: bool,
}

fn main() -> ExitCode {
    let args = Args::parse();

    init_tracing(args.verbose);

    match run(&args) {
        Ok(output) => {
            let mut stdout = io::stdout().lock();
            if let Err(e) = writeln!(stdout, "{output}") {
                eprintln!("error while writing the output: {e}");
                return ExitCode::FAILURE;
            }
            ExitCode::SUCCESS
        }
        Err(e) => {
            error!(user_error = is_user_error(&e), "Compilation failed");
            eprintln!("{e:#}");
            ExitCode::FAILURE
        }
    }
}

fn init_tracing(verbose: bool) {
    let filter = if verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"))
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .init();
}

/// Run the whole pipeline and return the serialized output.
fn run(args: &Args) -> anyhow::Result<String> {
    let (source, text) = match &args.file {
        Some(path) => (path.display().to_string(), read_file(path)?),
        None => ("stdin".to_string(), read_stdin()?),
    };
    debug!(source = %source, bytes = text.len(), "Read input document");

    let input = manifold_schema::parse_values(&text)
        .with_context(|| format!("error while parsing from {source}"))?;

    let config = RenderConfig::from_env();
    let values = manifold_render::prepare_values(input)
        .context("error while preparing the deployment values")?;
    let manifests = manifold_render::render(&values, &config)
        .context("error while rendering the resources")?;

    Ok(manifold_render::to_json(&manifests, args.pretty)?)
}

fn read_stdin() -> anyhow::Result<String> {
    let mut text = String::new();
    io::stdin()
        .read_to_string(&mut text)
        .context("error while reading from stdin")?;
    Ok(text)
}

fn read_file(path: &Path) -> anyhow::Result<String> {
    std::fs::read_to_string(path)
        .with_context(|| format!("error while reading {}", path.display()))
}

fn is_user_error(err: &anyhow::Error) -> bool {
    if let Some(e) = err.downcast_ref::<RenderError>() {
        return e.is_user_error();
    }
    err.downcast_ref::<SchemaError>().is_some()
}
