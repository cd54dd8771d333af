//! Mantis resolver CLI - inspect group-by resolution for a semantic manifest
//!
//! Usage:
//!   mantis-resolve items <manifest.json> [--metric <name>]... [--purpose filter]
//!   mantis-resolve resolve <manifest.json> --metric <name> <input>...
//!   mantis-resolve graph <manifest.json>
//!
//! Examples:
//!   mantis-resolve items manifest.json --metric bookings
//!   mantis-resolve resolve manifest.json --metric bookings metric_time__month listing__country
//!   mantis-resolve graph manifest.json --output json

use clap::{Parser, Subcommand, ValueEnum};
use mantis_resolver::resolution::ResolutionPurpose;
use mantis_resolver::{SemanticManifest, SemanticResolver, Settings};
use std::fs;
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "mantis-resolve")]
#[command(about = "Resolve group-by items against a semantic manifest")]
#[command(version)]
struct Cli {
    /// Settings file (defaults to MANTIS_RESOLVER_CONFIG, ./mantis.toml, then the user config dir)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Log verbosity; RUST_LOG overrides it
    #[arg(short, long, global = true, action = clap::ArgAction::Count)]
    verbose: u8,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// List the items a query over the given metrics may use
    Items {
        /// Path to the manifest JSON file
        manifest: PathBuf,

        /// Metrics in the query (none means a query without metrics)
        #[arg(short, long = "metric")]
        metrics: Vec<String>,

        /// Where the items will be used
        #[arg(short, long, default_value = "group-by")]
        purpose: PurposeArg,

        /// Output format
        #[arg(short, long, default_value = "text")]
        output: OutputFormat,
    },

    /// Resolve group-by inputs for a query
    Resolve {
        /// Path to the manifest JSON file
        manifest: PathBuf,

        /// Metrics in the query
        #[arg(short, long = "metric")]
        metrics: Vec<String>,

        /// Group-by inputs, e.g. metric_time__month or "Dimension('listing__country')"
        inputs: Vec<String>,

        #[arg(short, long, default_value = "group-by")]
        purpose: PurposeArg,

        #[arg(short, long, default_value = "text")]
        output: OutputFormat,
    },

    /// Print the semantic graph built from a manifest
    Graph {
        /// Path to the manifest JSON file
        manifest: PathBuf,

        #[arg(short, long, default_value = "text")]
        output: OutputFormat,
    },
}

#[derive(Clone, Copy, ValueEnum)]
enum PurposeArg {
    GroupBy,
    Filter,
}

impl From<PurposeArg> for ResolutionPurpose {
    fn from(arg: PurposeArg) -> Self {
        match arg {
            PurposeArg::GroupBy => ResolutionPurpose::GroupBy,
            PurposeArg::Filter => ResolutionPurpose::Filter,
        }
    }
}

#[derive(Clone, Copy, ValueEnum)]
enum OutputFormat {
    /// Human-readable listing
    Text,
    /// Pretty-printed JSON
    Json,
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let settings = match load_settings(cli.config.as_deref()) {
        Ok(s) => s,
        Err(e) => {
            eprintln!("Error loading settings: {}", e);
            return ExitCode::FAILURE;
        }
    };

    match cli.command {
        Commands::Items {
            manifest,
            metrics,
            purpose,
            output,
        } => cmd_items(&manifest, settings, &metrics, purpose.into(), output),
        Commands::Resolve {
            manifest,
            metrics,
            inputs,
            purpose,
            output,
        } => cmd_resolve(&manifest, settings, &metrics, &inputs, purpose.into(), output),
        Commands::Graph { manifest, output } => cmd_graph(&manifest, settings, output),
    }
}

fn init_tracing(verbose: u8) {
    let default = match verbose {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn load_settings(path: Option<&Path>) -> Result<Settings, mantis_resolver::config::SettingsError> {
    match path {
        Some(path) => Settings::from_file(path),
        None => Settings::load(),
    }
}

fn load_resolver(file: &Path, settings: Settings) -> Result<SemanticResolver, ExitCode> {
    let source = match fs::read_to_string(file) {
        Ok(s) => s,
        Err(e) => {
            eprintln!("Error reading file '{}': {}", file.display(), e);
            return Err(ExitCode::FAILURE);
        }
    };

    SemanticManifest::from_json_str(&source)
        .and_then(|manifest| SemanticResolver::new(manifest, settings.resolver))
        .map_err(|e| {
            eprintln!("Error: {}", e);
            ExitCode::FAILURE
        })
}

fn print_json<T: serde::Serialize>(value: &T) -> ExitCode {
    match serde_json::to_string_pretty(value) {
        Ok(json) => {
            println!("{}", json);
            ExitCode::SUCCESS
        }
        Err(e) => {
            eprintln!("Error serializing output: {}", e);
            ExitCode::FAILURE
        }
    }
}

fn cmd_items(
    file: &Path,
    settings: Settings,
    metrics: &[String],
    purpose: ResolutionPurpose,
    output: OutputFormat,
) -> ExitCode {
    let resolver = match load_resolver(file, settings) {
        Ok(r) => r,
        Err(code) => return code,
    };
    let metric_names: Vec<&str> = metrics.iter().map(String::as_str).collect();
    let group_by = match resolver.for_metrics(&metric_names) {
        Ok(g) => g,
        Err(e) => {
            eprintln!("Error: {}", e);
            return ExitCode::FAILURE;
        }
    };

    let available = group_by.resolve_available_items(purpose, None);
    match output {
        OutputFormat::Json => print_json(&available),
        OutputFormat::Text => {
            if available.items.is_empty() {
                println!("No items available.");
            } else {
                println!("Items:");
                for item in &available.items {
                    println!("  - {} ({})", item.key.qualified_name(), item.kind.as_str());
                }
            }
            if !available.issues.is_empty() {
                println!();
                println!("Issues:");
                for issue in &available.issues {
                    println!("  {}", issue);
                }
            }
            ExitCode::SUCCESS
        }
    }
}

fn cmd_resolve(
    file: &Path,
    settings: Settings,
    metrics: &[String],
    inputs: &[String],
    purpose: ResolutionPurpose,
    output: OutputFormat,
) -> ExitCode {
    let resolver = match load_resolver(file, settings) {
        Ok(r) => r,
        Err(code) => return code,
    };
    let metric_names: Vec<&str> = metrics.iter().map(String::as_str).collect();
    let group_by = match resolver.for_metrics(&metric_names) {
        Ok(g) => g,
        Err(e) => {
            eprintln!("Error: {}", e);
            return ExitCode::FAILURE;
        }
    };

    let result = group_by.resolve_request(inputs, purpose);

    let printed = match output {
        OutputFormat::Json => match serde_json::to_string_pretty(&result) {
            Ok(json) => {
                println!("{}", json);
                true
            }
            Err(e) => {
                eprintln!("Error serializing output: {}", e);
                false
            }
        },
        OutputFormat::Text => {
            for resolved in &result.resolved {
                let order = if resolved.descending { " DESC" } else { "" };
                println!("{} -> {}{}", resolved.input, resolved.output_name, order);
            }
            for issue in &result.issues {
                eprintln!("{}", issue);
            }
            true
        }
    };
    ExitCode::from(resolve_status(printed, result.has_errors()))
}

/// Exit status of `resolve`: 1 when output failed or any issue is an error.
fn resolve_status(printed: bool, has_errors: bool) -> u8 {
    if printed && !has_errors {
        0
    } else {
        1
    }
}

fn cmd_graph(file: &Path, settings: Settings, output: OutputFormat) -> ExitCode {
    let resolver = match load_resolver(file, settings) {
        Ok(r) => r,
        Err(code) => return code,
    };

    let snapshot = resolver.graph().snapshot();
    match output {
        OutputFormat::Json => print_json(&snapshot),
        OutputFormat::Text => {
            print!("{}", snapshot.to_text());
            ExitCode::SUCCESS
        }
    }
}
