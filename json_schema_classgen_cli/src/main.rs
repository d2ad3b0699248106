//! Binary to generate Rust types from a JSON Schema file.
//!
//! Usage: `json-schema-classgen <SCHEMA_PATH> <OUTPUT_PATH> [--namespace <NS>] [--deny-invalid-unknown-json-schema]`
//!
//! Prints a one-line outcome to stdout and exits non-zero on failure.
//! Diagnostics go to stderr and are filtered by `RUST_LOG` (default `warn`).

use clap::{Arg, ArgAction, Parser};
use json_schema_classgen::{GenerateSettings, generate_from_file};
use std::path::PathBuf;
use std::process::ExitCode;
use tracing_subscriber::EnvFilter;

#[derive(Debug, Parser)]
#[command(
    name = "json-schema-classgen",
    version,
    about,
    disable_version_flag = true,
    arg(Arg::new("version")
        .short('v')
        .long("version")
        .action(ArgAction::Version)
        .help("Print version"))
)]
struct Cli {
    /// JSON Schema file to read.
    schema_path: PathBuf,

    /// Rust source file to write; missing parent directories are created.
    output_path: PathBuf,

    /// Wrap generated items in `pub mod` blocks, e.g. `Acme.Models` or `acme::models`.
    /// An empty name emits the items at the top level.
    #[arg(short, long, default_value = "Generated")]
    namespace: String,

    /// Fail on unknown or unsupported JSON Schema keywords instead of ignoring them.
    #[arg(long)]
    deny_invalid_unknown_json_schema: bool,
}

fn init_tracing() {
    let filter: EnvFilter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn main() -> ExitCode {
    init_tracing();
    let cli: Cli = Cli::parse();
    tracing::debug!(?cli, "parsed arguments");

    let settings: GenerateSettings = GenerateSettings::default()
        .with_namespace(cli.namespace)
        .with_deny_invalid_unknown_json_schema(cli.deny_invalid_unknown_json_schema);
    match generate_from_file(&cli.schema_path, &cli.output_path, &settings) {
        Ok(()) => {
            println!(
                "Rust types generated successfully at {}",
                cli.output_path.display()
            );
            ExitCode::SUCCESS
        }
        Err(e) => {
            tracing::debug!(error = ?e, "generation failed");
            println!("Error generating Rust code: {e}");
            ExitCode::FAILURE
        }
    }
}
