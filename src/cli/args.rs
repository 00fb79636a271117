//! CLI argument definitions using clap
//!
//! Commands:
//! - docschema check --config <path> [--schema-dir <dir>]
//! - docschema validate --model <name> [--input <file>]
//! - docschema ingest [--input <file>]

use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// docschema - Declarative document schemas with coercion and validation
#[derive(Parser, Debug)]
#[command(name = "docschema")]
#[command(version, about, long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Load every schema and check cross-model references
    Check {
        /// Path to configuration file
        #[arg(long, default_value = "./docschema.json")]
        config: PathBuf,

        /// Schema directory, overriding the configuration file
        #[arg(long)]
        schema_dir: Option<PathBuf>,
    },

    /// Validate a single JSON record against a model
    Validate {
        /// Path to configuration file
        #[arg(long, default_value = "./docschema.json")]
        config: PathBuf,

        /// Schema directory, overriding the configuration file
        #[arg(long)]
        schema_dir: Option<PathBuf>,

        /// Model name to validate against
        #[arg(long)]
        model: String,

        /// Read the record from a file instead of stdin
        #[arg(long)]
        input: Option<PathBuf>,
    },

    /// Create documents from NDJSON `{"model", "record"}` lines
    Ingest {
        /// Path to configuration file
        #[arg(long, default_value = "./docschema.json")]
        config: PathBuf,

        /// Schema directory, overriding the configuration file
        #[arg(long)]
        schema_dir: Option<PathBuf>,

        /// Read lines from a file instead of stdin
        #[arg(long)]
        input: Option<PathBuf>,
    },
}

impl Cli {
    /// Parse command line arguments
    pub fn parse_args() -> Self {
        Cli::parse()
    }
}
