//! CLI command implementations
//!
//! Each command follows the same boot sequence:
//! 1. Load configuration (the `--schema-dir` flag may stand in for the file)
//! 2. Install the log subscriber
//! 3. Load every schema and resolve cross-model references
//! 4. Run the command

use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use serde::Deserialize;
use serde_json::{json, Value};

use crate::observability::{self, log_event_with_fields, Event, LogConfig, MetricsRegistry};
use crate::schema::{SchemaRegistry, SchemaValidator, UnknownFields, ValidationResult};
use crate::store::{MemoryStore, PersistError, Repository};

use super::args::Command;
use super::errors::{CliError, CliResult};
use super::io::{read_lines, read_record, write_error, write_rejected, write_response, write_value};

/// Configuration file structure
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Config {
    /// Directory holding one `*.json` definition per model (required)
    pub schema_dir: PathBuf,

    /// Log level and output format (optional, default info/text)
    #[serde(default)]
    pub log: LogConfig,

    /// Unknown-field policy forced onto every loaded schema (optional)
    #[serde(default)]
    pub unknown_fields: Option<UnknownFields>,
}

impl Config {
    /// Load configuration from file
    pub fn load(path: &Path) -> CliResult<Self> {
        let content = fs::read_to_string(path)
            .map_err(|e| CliError::config_error(format!("Failed to read config: {}", e)))?;

        let config: Config = serde_json::from_str(&content)
            .map_err(|e| CliError::config_error(format!("Invalid config JSON: {}", e)))?;

        config.validate()?;

        Ok(config)
    }

    /// Loads the file if present, then applies the schema directory override.
    ///
    /// A missing config file is only tolerated when `schema_dir` is given.
    pub fn resolve(path: &Path, schema_dir: Option<PathBuf>) -> CliResult<Self> {
        let mut config = match schema_dir {
            Some(_) if !path.exists() => Config {
                schema_dir: PathBuf::new(),
                log: LogConfig::default(),
                unknown_fields: None,
            },
            _ => Self::load(path)?,
        };

        if let Some(dir) = schema_dir {
            config.schema_dir = dir;
        }
        config.validate()?;

        Ok(config)
    }

    fn validate(&self) -> CliResult<()> {
        if self.schema_dir.as_os_str().is_empty() {
            return Err(CliError::config_error("schema_dir must not be empty"));
        }

        if self.log.level.trim().is_empty() {
            return Err(CliError::config_error("log.level must not be empty"));
        }

        Ok(())
    }
}

/// Parse arguments and run the selected command
pub fn run() -> CliResult<()> {
    let cli = super::args::Cli::parse_args();
    run_command(cli.command)
}

/// Run one command with its responses on stdout
pub fn run_command(cmd: Command) -> CliResult<()> {
    let stdout = io::stdout();
    let mut out = stdout.lock();
    match cmd {
        Command::Check { config, schema_dir } => check(&config, schema_dir, &mut out),
        Command::Validate {
            config,
            schema_dir,
            model,
            input,
        } => validate(&config, schema_dir, &model, input.as_deref(), &mut out),
        Command::Ingest {
            config,
            schema_dir,
            input,
        } => ingest(&config, schema_dir, input.as_deref(), &mut out),
    }
}

/// Load and cross-check every schema, then print a summary
pub fn check<W: Write>(config_path: &Path, schema_dir: Option<PathBuf>, out: &mut W) -> CliResult<()> {
    let (_, registry) = boot(config_path, schema_dir, out)?;

    let models: Vec<Value> = registry
        .all_schemas()
        .map(|schema| {
            json!({
                "name": schema.name(),
                "collection": schema.collection(),
                "fields": schema.fields().len(),
            })
        })
        .collect();

    write_response(out, json!({ "models": models }))
}

/// Validate one record read from `input` or stdin
///
/// Prints the normalized document, or the violations and fails.
pub fn validate<W: Write>(
    config_path: &Path,
    schema_dir: Option<PathBuf>,
    model: &str,
    input: Option<&Path>,
    out: &mut W,
) -> CliResult<()> {
    let (_, registry) = boot(config_path, schema_dir, out)?;
    let record = read_record(input)?;

    let validator = SchemaValidator::new(&registry);
    match validator.validate_document(model, &record)? {
        ValidationResult::Accepted(doc) => {
            log_event_with_fields(Event::ValidationAccepted, &[("model", model)]);
            write_response(out, Value::Object(doc))
        }
        ValidationResult::Rejected(violations) => {
            log_event_with_fields(
                Event::ValidationRejected,
                &[("model", model), ("violations", &violations.len().to_string())],
            );
            write_rejected(out, &violations)?;
            Err(CliError::rejected(violations.len()))
        }
    }
}

/// Create every NDJSON `{"model", "record"}` line in an in-memory store
///
/// A failing line is reported in the output and does not stop the run.
pub fn ingest<W: Write>(
    config_path: &Path,
    schema_dir: Option<PathBuf>,
    input: Option<&Path>,
    out: &mut W,
) -> CliResult<()> {
    let (_, registry) = boot(config_path, schema_dir, out)?;
    let store = MemoryStore::new();
    let metrics = MetricsRegistry::new();
    let repository = Repository::new(&registry, &store, &metrics);

    observability::log_event(Event::IngestStart);

    let mut lines = 0usize;
    for (line, parsed) in read_lines(input)? {
        lines += 1;
        let request = match parsed {
            Ok(request) => request,
            Err(e) => {
                write_line_error(out, line, e.code_str(), e.message())?;
                continue;
            }
        };

        let Some(model) = request.get("model").and_then(Value::as_str) else {
            write_line_error(out, line, "DOCSCHEMA_CLI_IO_ERROR", "Missing string field 'model'")?;
            continue;
        };
        let record = request.get("record").cloned().unwrap_or(Value::Null);

        match repository.create(model, &record) {
            Ok(doc) => write_value(out, &json!({"line": line, "status": "ok", "data": doc}))?,
            Err(PersistError::Invalid(violations)) => write_value(
                out,
                &json!({
                    "line": line,
                    "status": "rejected",
                    "violations": violations
                }),
            )?,
            Err(e) => write_line_error(out, line, e.code(), &e.to_string())?,
        }
    }

    let snapshot = metrics.snapshot();
    log_event_with_fields(
        Event::IngestComplete,
        &[
            ("created", &snapshot.documents_created.to_string()),
            ("lines", &lines.to_string()),
            ("rejected", &snapshot.validations_rejected.to_string()),
        ],
    );

    write_response(out, json!({ "lines": lines, "metrics": snapshot }))
}

fn write_line_error<W: Write>(out: &mut W, line: usize, code: &str, message: &str) -> CliResult<()> {
    write_value(
        out,
        &json!({
            "line": line,
            "status": "error",
            "code": code,
            "message": message
        }),
    )
}

/// Shared boot: config, logging, schemas
fn boot<W: Write>(
    config_path: &Path,
    schema_dir: Option<PathBuf>,
    out: &mut W,
) -> CliResult<(Config, SchemaRegistry)> {
    let config = Config::resolve(config_path, schema_dir)?;
    observability::init(&config.log)?;

    let dir = config.schema_dir.display().to_string();
    log_event_with_fields(Event::ConfigLoaded, &[("schema_dir", &dir)]);

    let registry = load_registry(&config, out)?;

    Ok((config, registry))
}

fn load_registry<W: Write>(config: &Config, out: &mut W) -> CliResult<SchemaRegistry> {
    let mut registry = SchemaRegistry::new().with_policy_override(config.unknown_fields);
    let dir = config.schema_dir.display().to_string();

    match registry.load_dir(&config.schema_dir) {
        Ok(count) => {
            log_event_with_fields(
                Event::SchemasLoaded,
                &[("count", &count.to_string()), ("schema_dir", &dir)],
            );
            Ok(registry)
        }
        Err(e) => {
            log_event_with_fields(
                Event::SchemasFailed,
                &[("error", &e.to_string()), ("schema_dir", &dir)],
            );
            write_error(out, e.code().code(), e.message())?;
            Err(e.into())
        }
    }
}
