//! Structured logging
//!
//! - One log line = one `Event`
//! - Fields rendered as a JSON object with sorted keys
//! - Output goes to stderr; stdout is reserved for command responses
//! - `DOCSCHEMA_LOG` overrides the configured filter

use std::collections::BTreeMap;

use serde::Deserialize;
use serde_json::{Map, Value};
use tracing::Level;
use tracing_subscriber::EnvFilter;

use super::events::Event;
use super::{ObservabilityError, ObservabilityResult};

/// Environment variable that overrides the configured filter
pub const LOG_ENV: &str = "DOCSCHEMA_LOG";

/// Log line format
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    #[default]
    Text,
    Json,
}

/// Logging section of the configuration file
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct LogConfig {
    /// Filter directive, e.g. "info" or "docschema=debug"
    #[serde(default = "default_level")]
    pub level: String,
    #[serde(default)]
    pub format: LogFormat,
}

fn default_level() -> String {
    "info".to_string()
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            level: default_level(),
            format: LogFormat::default(),
        }
    }
}

/// Installs the global subscriber.
///
/// A subscriber installed earlier (e.g. by a test harness) is left in place.
pub fn init(config: &LogConfig) -> ObservabilityResult<()> {
    let filter = match EnvFilter::try_from_env(LOG_ENV) {
        Ok(filter) => filter,
        Err(_) => EnvFilter::try_new(&config.level).map_err(|e| {
            ObservabilityError::new(format!("Invalid log level '{}': {}", config.level, e))
        })?,
    };

    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false);

    let _ = match config.format {
        LogFormat::Json => builder.json().try_init(),
        LogFormat::Text => builder.try_init(),
    };
    Ok(())
}

/// Emits an event with the given fields.
pub fn log(event: Event, fields: &[(&str, &str)]) {
    let rendered = render_fields(fields);
    let name = event.as_str();
    let level = event.level();
    if level == Level::ERROR {
        tracing::error!(event = name, fields = %rendered);
    } else if level == Level::WARN {
        tracing::warn!(event = name, fields = %rendered);
    } else if level == Level::INFO {
        tracing::info!(event = name, fields = %rendered);
    } else if level == Level::DEBUG {
        tracing::debug!(event = name, fields = %rendered);
    } else {
        tracing::trace!(event = name, fields = %rendered);
    }
}

/// Renders fields as a JSON object; keys come out sorted.
fn render_fields(fields: &[(&str, &str)]) -> String {
    let sorted: BTreeMap<String, Value> = fields
        .iter()
        .map(|(k, v)| (k.to_string(), Value::String(v.to_string())))
        .collect();
    let map: Map<String, Value> = sorted.into_iter().collect();
    Value::Object(map).to_string()
}
