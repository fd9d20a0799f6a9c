//! Unfold CLI entry point.

mod cli;

use std::path::{Path, PathBuf};

use clap::Parser;
use cli::{Cli, Command, OutputFormat};
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};
use unfold::ir::{Module, parse_module, print_module};
use unfold::passes::{SourceProgram, compile_with_diagnostics, stage_unfold_tuples};

fn main() {
    init_tracing();
    let cli = Cli::parse();

    match cli.command {
        Command::Run {
            file,
            entry,
            format,
            stats,
        } => run_file(file, entry, format, stats),
        Command::Print { file, format } => print_file(&file, format),
    }
}

/// Log to stderr, filtered by `RUST_LOG` (default: warn).
fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
    let formatter = tracing_subscriber::fmt::layer()
        .with_target(false)
        .with_writer(std::io::stderr);

    tracing_subscriber::registry()
        .with(formatter)
        .with(filter)
        .init();
}

fn read_source(path: &Path) -> String {
    match std::fs::read_to_string(path) {
        Ok(text) => text,
        Err(e) => {
            eprintln!("Error reading {}: {e}", path.display());
            std::process::exit(1);
        }
    }
}

fn run_file(path: PathBuf, entry: String, format: OutputFormat, show_stats: bool) {
    let text = read_source(&path);
    tracing::debug!("compiling {} with entry @{}", path.display(), entry);

    let db = salsa::DatabaseImpl::default();
    let source = SourceProgram::new(&db, path, text, entry);
    let result = compile_with_diagnostics(&db, source);

    for diag in &result.diagnostics {
        eprintln!("{diag}");
    }
    if result.has_errors() {
        std::process::exit(1);
    }
    let Some(module) = result.module else {
        std::process::exit(1);
    };

    if show_stats {
        if let Some(output) = stage_unfold_tuples(&db, source) {
            let stats = output.stats;
            if stats.is_empty() {
                eprintln!("no tuples unfolded");
            } else {
                eprintln!("flattened params: {}", stats.flattened_params);
                eprintln!("removed bindings: {}", stats.removed_bindings);
                eprintln!("expanded calls:   {}", stats.expanded_calls);
            }
        }
    }

    emit(&module, format);
}

fn print_file(path: &Path, format: OutputFormat) {
    let text = read_source(path);
    match parse_module(&text) {
        Ok(module) => emit(&module, format),
        Err(e) => {
            eprintln!("{}: {e}", path.display());
            std::process::exit(1);
        }
    }
}

fn emit(module: &Module, format: OutputFormat) {
    match format {
        OutputFormat::Text => print!("{}", print_module(module)),
        OutputFormat::Json => match serde_json::to_string_pretty(module) {
            Ok(json) => println!("{json}"),
            Err(e) => {
                eprintln!("Error serializing module: {e}");
                std::process::exit(1);
            }
        },
    }
}
