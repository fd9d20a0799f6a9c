//! Command-line interface for the tuple unfolding pass.

use std::path::PathBuf;

use clap::{Parser, Subcommand, ValueEnum};

#[derive(Parser)]
#[command(name = "unfold")]
#[command(about = "Flatten tuple values in unfold IR programs", long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand)]
pub enum Command {
    /// Run tuple unfolding on a program and print the result
    Run {
        /// Program to rewrite
        file: PathBuf,
        /// Function whose signature is preserved
        #[arg(long, default_value = "main")]
        entry: String,
        #[arg(long, value_enum, default_value_t = OutputFormat::Text)]
        format: OutputFormat,
        /// Print rewrite statistics to stderr
        #[arg(long)]
        stats: bool,
    },
    /// Parse a program and print it back
    Print {
        file: PathBuf,
        #[arg(long, value_enum, default_value_t = OutputFormat::Text)]
        format: OutputFormat,
    },
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    /// IR text format
    Text,
    /// Serialized module as JSON
    Json,
}
