//! CLI module for docschema
//!
//! Provides command-line interface for:
//! - check: Load schemas and cross-check references
//! - validate: Validate one record and print the document
//! - ingest: Create NDJSON records through the repository

mod args;
mod commands;
mod errors;
mod io;

pub use args::{Cli, Command};
pub use commands::{check, ingest, run, run_command, validate, Config};
pub use errors::{CliError, CliErrorCode, CliResult};
pub use io::{read_lines, read_record, write_error, write_rejected, write_response, write_value};
