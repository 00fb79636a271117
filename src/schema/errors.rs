//! Schema error types
//!
//! Two families live here:
//! - `SchemaError`: a schema definition or registry problem (programming error,
//!   surfaced when a schema is built, loaded, or looked up)
//! - `Violation`: a single validation failure, returned as data inside
//!   `ValidationResult::Rejected`, never as an `Err`
//!
//! Error codes:
//! - DOCSCHEMA_MALFORMED_SCHEMA
//! - DOCSCHEMA_DUPLICATE_FIELD
//! - DOCSCHEMA_CONFLICTING_CONSTRAINT
//! - DOCSCHEMA_INVALID_PATTERN
//! - DOCSCHEMA_UNKNOWN_MODEL
//! - DOCSCHEMA_DUPLICATE_MODEL
//! - DOCSCHEMA_UNRESOLVED_REFERENCE

use std::fmt;
use std::sync::LazyLock;

use regex::{Captures, Regex};
use serde::Serialize;
use serde_json::Value;

/// Schema definition and registry error codes
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SchemaErrorCode {
    /// Definition file unreadable or structurally invalid
    MalformedSchema,
    /// Field name declared twice, or not a legal name
    DuplicateField,
    /// Constraints that can never be satisfied together
    ConflictingConstraint,
    /// Pattern failed to compile
    InvalidPattern,
    /// Model name not registered
    UnknownModel,
    /// Model name registered twice
    DuplicateModel,
    /// Reference field targets an unregistered model
    UnresolvedReference,
}

impl SchemaErrorCode {
    /// Returns the stable string code
    pub fn code(&self) -> &'static str {
        match self {
            SchemaErrorCode::MalformedSchema => "DOCSCHEMA_MALFORMED_SCHEMA",
            SchemaErrorCode::DuplicateField => "DOCSCHEMA_DUPLICATE_FIELD",
            SchemaErrorCode::ConflictingConstraint => "DOCSCHEMA_CONFLICTING_CONSTRAINT",
            SchemaErrorCode::InvalidPattern => "DOCSCHEMA_INVALID_PATTERN",
            SchemaErrorCode::UnknownModel => "DOCSCHEMA_UNKNOWN_MODEL",
            SchemaErrorCode::DuplicateModel => "DOCSCHEMA_DUPLICATE_MODEL",
            SchemaErrorCode::UnresolvedReference => "DOCSCHEMA_UNRESOLVED_REFERENCE",
        }
    }
}

impl fmt::Display for SchemaErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.code())
    }
}

/// Schema error type with context
#[derive(Debug, Clone)]
pub struct SchemaError {
    code: SchemaErrorCode,
    message: String,
    /// Model name if applicable
    model: Option<String>,
    /// Field path if applicable
    path: Option<String>,
}

impl SchemaError {
    fn new(code: SchemaErrorCode, message: String) -> Self {
        Self {
            code,
            message,
            model: None,
            path: None,
        }
    }

    /// Create an error for a malformed definition (file or in-memory)
    pub fn malformed_schema(source: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::new(
            SchemaErrorCode::MalformedSchema,
            format!("Malformed schema '{}': {}", source.into(), reason.into()),
        )
    }

    /// Create an error for a bad option inside one field definition
    ///
    /// The field's path is attached by the enclosing field map.
    pub fn invalid_field_option(reason: impl Into<String>) -> Self {
        Self::new(SchemaErrorCode::MalformedSchema, reason.into())
    }

    /// Create a duplicate or illegal field name error
    pub fn duplicate_field(path: impl Into<String>) -> Self {
        let path = path.into();
        Self {
            path: Some(path.clone()),
            ..Self::new(
                SchemaErrorCode::DuplicateField,
                format!("Field '{}' is declared more than once", path),
            )
        }
    }

    /// Create an illegal field name error
    pub fn illegal_field_name(path: impl Into<String>, reason: &str) -> Self {
        let path = path.into();
        Self {
            path: Some(path.clone()),
            ..Self::new(
                SchemaErrorCode::DuplicateField,
                format!("Field name '{}' is not allowed: {}", path, reason),
            )
        }
    }

    /// Create a conflicting-constraint error
    pub fn conflicting_constraint(path: impl Into<String>, reason: impl Into<String>) -> Self {
        let path = path.into();
        Self {
            path: Some(path.clone()),
            ..Self::new(
                SchemaErrorCode::ConflictingConstraint,
                format!("Field '{}': {}", path, reason.into()),
            )
        }
    }

    /// Create an invalid pattern error
    pub fn invalid_pattern(pattern: &str, reason: impl fmt::Display) -> Self {
        Self::new(
            SchemaErrorCode::InvalidPattern,
            format!("Pattern '{}' does not compile: {}", pattern, reason),
        )
    }

    /// Create an unknown model error
    pub fn unknown_model(model: impl Into<String>) -> Self {
        let model = model.into();
        Self {
            model: Some(model.clone()),
            ..Self::new(
                SchemaErrorCode::UnknownModel,
                format!("Model '{}' not found", model),
            )
        }
    }

    /// Create a duplicate model error
    pub fn duplicate_model(model: impl Into<String>) -> Self {
        let model = model.into();
        Self {
            model: Some(model.clone()),
            ..Self::new(
                SchemaErrorCode::DuplicateModel,
                format!("Model '{}' is already registered and immutable", model),
            )
        }
    }

    /// Create an unresolved reference error
    pub fn unresolved_reference(
        model: impl Into<String>,
        path: impl Into<String>,
        target: &str,
    ) -> Self {
        let model = model.into();
        let path = path.into();
        Self {
            message: format!(
                "Model '{}' field '{}' references unknown model '{}'",
                model, path, target
            ),
            code: SchemaErrorCode::UnresolvedReference,
            model: Some(model),
            path: Some(path),
        }
    }

    /// Attach the model name
    pub fn in_model(mut self, model: impl Into<String>) -> Self {
        self.model = Some(model.into());
        self
    }

    /// Returns the error code
    pub fn code(&self) -> SchemaErrorCode {
        self.code
    }

    /// Returns the error message
    pub fn message(&self) -> &str {
        &self.message
    }

    /// Returns the model name if applicable
    pub fn model(&self) -> Option<&str> {
        self.model.as_deref()
    }

    /// Returns the field path if applicable
    pub fn path(&self) -> Option<&str> {
        self.path.as_deref()
    }
}

impl fmt::Display for SchemaError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.code.code(), self.message)?;
        if let Some(model) = &self.model {
            write!(f, " (model {})", model)?;
        }
        Ok(())
    }
}

impl std::error::Error for SchemaError {}

/// Result type for schema operations
pub type SchemaResult<T> = Result<T, SchemaError>;

/// Kind of validation failure
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ViolationKind {
    /// Required field absent or blank
    MissingRequiredField,
    /// Value cannot be interpreted as the declared type
    TypeMismatch,
    /// Length or numeric range outside the declared bounds
    OutOfBounds,
    /// Text does not match the declared pattern
    PatternMismatch,
    /// Value not in the enumerated set
    NotInAllowedSet,
    /// Key not declared by the schema (reject policy only)
    UndeclaredField,
}

impl ViolationKind {
    /// Returns the short code used in rendered output
    pub fn code(&self) -> &'static str {
        match self {
            ViolationKind::MissingRequiredField => "required",
            ViolationKind::TypeMismatch => "cast",
            ViolationKind::OutOfBounds => "bounds",
            ViolationKind::PatternMismatch => "pattern",
            ViolationKind::NotInAllowedSet => "enum",
            ViolationKind::UndeclaredField => "strict",
        }
    }
}

impl fmt::Display for ViolationKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.code())
    }
}

/// A single validation failure at a dotted field path
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Violation {
    /// Field path (e.g., "profile.firstName", "posts.2")
    pub path: String,
    /// Failure kind
    pub kind: ViolationKind,
    /// Human-readable message, templates already rendered
    pub message: String,
}

impl Violation {
    pub fn new(path: impl Into<String>, kind: ViolationKind, message: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            kind,
            message: message.into(),
        }
    }

    pub fn missing_field(path: &str, custom: Option<&str>) -> Self {
        let template = custom.unwrap_or("Path `{PATH}` is required.");
        Self::new(
            path,
            ViolationKind::MissingRequiredField,
            render(template, &[("PATH", path)]),
        )
    }

    pub fn type_mismatch(path: &str, expected: &str, actual: &Value) -> Self {
        Self::new(
            path,
            ViolationKind::TypeMismatch,
            format!(
                "Cast to {} failed for value {} ({}) at path `{}`",
                expected,
                display_value(actual),
                json_type_name(actual),
                path
            ),
        )
    }

    pub fn out_of_bounds(path: &str, message: String) -> Self {
        Self::new(path, ViolationKind::OutOfBounds, message)
    }

    pub fn pattern_mismatch(path: &str, custom: Option<&str>, value: &str) -> Self {
        let template = custom.unwrap_or("Path `{PATH}` is invalid ({VALUE}).");
        Self::new(
            path,
            ViolationKind::PatternMismatch,
            render(template, &[("PATH", path), ("VALUE", value)]),
        )
    }

    pub fn not_in_allowed_set(path: &str, custom: Option<&str>, value: &str) -> Self {
        let template = custom.unwrap_or("`{VALUE}` is not a valid enum value for path `{PATH}`.");
        Self::new(
            path,
            ViolationKind::NotInAllowedSet,
            render(template, &[("PATH", path), ("VALUE", value)]),
        )
    }

    pub fn undeclared_field(path: &str) -> Self {
        Self::new(
            path,
            ViolationKind::UndeclaredField,
            format!("Field `{}` is not in schema and strict mode rejects it", path),
        )
    }
}

impl fmt::Display for Violation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} [{}]: {}", self.path, self.kind, self.message)
    }
}

/// `{KEY}` tokens in message templates.
static PLACEHOLDER_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\{([A-Z]+)\}").expect("valid regex"));

/// Substitutes `{KEY}` placeholders in a message template.
///
/// Substituted values are never rescanned; unknown keys are left as written.
pub(crate) fn render(template: &str, vars: &[(&str, &str)]) -> String {
    PLACEHOLDER_RE
        .replace_all(template, |caps: &Captures<'_>| {
            let key = &caps[1];
            vars.iter()
                .find(|(name, _)| *name == key)
                .map_or_else(|| caps[0].to_string(), |(_, value)| value.to_string())
        })
        .into_owned()
}

/// Text form of a value for messages: strings unquoted, everything else as JSON.
pub(crate) fn display_value(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

/// Returns the JSON type name for error messages.
pub(crate) fn json_type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}
