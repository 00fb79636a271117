//! JSON I/O handling for CLI
//!
//! - Input: one JSON record, or NDJSON lines, from stdin or a file
//! - Output: one JSON object per line (stdout from `run_command`)
//! - UTF-8 only

use std::fs::{self, File};
use std::io::{self, BufRead, BufReader, Read, Write};
use std::path::Path;

use serde_json::{json, Value};

use super::errors::{CliError, CliResult};
use crate::schema::Violation;

/// Opens `input`, or stdin when absent.
fn open_input(input: Option<&Path>) -> CliResult<Box<dyn BufRead>> {
    match input {
        Some(path) => {
            let file = File::open(path).map_err(|e| {
                CliError::io_error(format!("Failed to open {}: {}", path.display(), e))
            })?;
            Ok(Box::new(BufReader::new(file)))
        }
        None => Ok(Box::new(BufReader::new(io::stdin()))),
    }
}

/// Read a single JSON record from a file or stdin
pub fn read_record(input: Option<&Path>) -> CliResult<Value> {
    let content = match input {
        Some(path) => fs::read_to_string(path).map_err(|e| {
            CliError::io_error(format!("Failed to read {}: {}", path.display(), e))
        })?,
        None => {
            let mut buf = String::new();
            io::stdin().lock().read_to_string(&mut buf)?;
            buf
        }
    };

    if content.trim().is_empty() {
        return Err(CliError::io_error("Empty input"));
    }

    Ok(serde_json::from_str(&content)?)
}

/// Read NDJSON lines, skipping blank ones
///
/// Each item carries its 1-based line number. A line that is not JSON is
/// yielded as an error so the caller can report it and move on.
pub fn read_lines(input: Option<&Path>) -> CliResult<impl Iterator<Item = (usize, CliResult<Value>)>> {
    let reader = open_input(input)?;
    Ok(reader
        .lines()
        .enumerate()
        .filter_map(|(index, line)| {
            let parsed = match line {
                Ok(line) if line.trim().is_empty() => return None,
                Ok(line) => serde_json::from_str(&line).map_err(CliError::from),
                Err(e) => Err(CliError::from(e)),
            };
            Some((index + 1, parsed))
        }))
}

/// Write a success response
pub fn write_response<W: Write>(out: &mut W, data: Value) -> CliResult<()> {
    write_value(
        out,
        &json!({
            "status": "ok",
            "data": data
        }),
    )
}

/// Write a rejected-record response
pub fn write_rejected<W: Write>(out: &mut W, violations: &[Violation]) -> CliResult<()> {
    write_value(
        out,
        &json!({
            "status": "rejected",
            "violations": violations
        }),
    )
}

/// Write an error response
pub fn write_error<W: Write>(out: &mut W, code: &str, message: &str) -> CliResult<()> {
    write_value(
        out,
        &json!({
            "status": "error",
            "code": code,
            "message": message
        }),
    )
}

/// Write a JSON value as one line
pub fn write_value<W: Write>(out: &mut W, value: &Value) -> CliResult<()> {
    serde_json::to_writer(&mut *out, value)?;
    writeln!(out)?;
    out.flush()?;

    Ok(())
}
