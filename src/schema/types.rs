//! Schema type definitions
//!
//! Supported types:
//! - text: UTF-8 string with case folding, trimming, length, pattern and enum rules
//! - number: integer or float with inclusive min/max
//! - boolean
//! - date: normalized to RFC 3339 UTC
//! - reference: opaque key into another model's collection
//! - object: nested ordered field set
//! - list: homogeneous list with a single element field spec
//!
//! Schemas are built once (programmatically or from a JSON definition) and
//! are immutable afterwards. Construction rejects definitions that can never
//! validate anything.

use std::fmt;
use std::sync::Arc;

use chrono::{SecondsFormat, Utc};
use indexmap::IndexMap;
use regex::Regex;
use serde::de::{self, Deserializer, MapAccess, Visitor};
use serde::Deserialize;
use serde_json::Value;
use uuid::Uuid;

use super::errors::{SchemaError, SchemaErrorCode, SchemaResult};

/// A rule value with an optional custom failure message.
#[derive(Debug, Clone, PartialEq)]
pub struct Constraint<T> {
    pub value: T,
    pub message: Option<String>,
}

impl<T> Constraint<T> {
    /// Constraint using the default failure message
    pub fn new(value: T) -> Self {
        Self {
            value,
            message: None,
        }
    }

    /// Constraint with a custom message template
    pub fn with_message(value: T, message: impl Into<String>) -> Self {
        Self {
            value,
            message: Some(message.into()),
        }
    }

    pub fn message(&self) -> Option<&str> {
        self.message.as_deref()
    }
}

// Accepts `v`, `[v, "message"]` or `{"value": v, "message": "..."}`.
#[derive(Deserialize)]
#[serde(untagged)]
enum ConstraintRepr<T> {
    Bare(T),
    Pair(T, String),
    Full {
        value: T,
        #[serde(default)]
        message: Option<String>,
    },
}

impl<'de, T: Deserialize<'de>> Deserialize<'de> for Constraint<T> {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        Ok(match ConstraintRepr::deserialize(deserializer)? {
            ConstraintRepr::Bare(value) => Constraint::new(value),
            ConstraintRepr::Pair(value, message) => Constraint::with_message(value, message),
            ConstraintRepr::Full { value, message } => Constraint { value, message },
        })
    }
}

/// Compiled pattern that must match the whole text.
#[derive(Clone)]
pub struct Pattern {
    source: String,
    regex: Regex,
}

impl Pattern {
    pub fn new(source: impl Into<String>) -> SchemaResult<Self> {
        let source = source.into();
        let regex = Regex::new(&format!("^(?:{})$", source))
            .map_err(|e| SchemaError::invalid_pattern(&source, e))?;
        Ok(Self { source, regex })
    }

    /// The pattern as written, without the implicit anchors
    pub fn source(&self) -> &str {
        &self.source
    }

    pub fn is_match(&self, text: &str) -> bool {
        self.regex.is_match(text)
    }
}

impl fmt::Debug for Pattern {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("Pattern").field(&self.source).finish()
    }
}

/// Enumerated set of permitted text values.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AllowedValues {
    pub values: Vec<String>,
    /// Template; `{VALUE}` is replaced with the offending value
    pub message: Option<String>,
}

impl AllowedValues {
    pub fn new<I, S>(values: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            values: values.into_iter().map(Into::into).collect(),
            message: None,
        }
    }

    pub fn with_message(mut self, message: impl Into<String>) -> Self {
        self.message = Some(message.into());
        self
    }

    pub fn contains(&self, value: &str) -> bool {
        self.values.iter().any(|v| v == value)
    }
}

#[derive(Deserialize)]
#[serde(untagged)]
enum AllowedRepr {
    List(Vec<String>),
    Full {
        values: Vec<String>,
        #[serde(default)]
        message: Option<String>,
    },
}

impl<'de> Deserialize<'de> for AllowedValues {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        Ok(match AllowedRepr::deserialize(deserializer)? {
            AllowedRepr::List(values) => AllowedValues::new(values),
            AllowedRepr::Full { values, message } => AllowedValues { values, message },
        })
    }
}

/// Rules for text fields.
#[derive(Debug, Clone, Default)]
pub struct TextRules {
    pub trim: bool,
    pub lowercase: bool,
    pub uppercase: bool,
    pub min_length: Option<Constraint<usize>>,
    pub max_length: Option<Constraint<usize>>,
    pub pattern: Option<Constraint<Pattern>>,
    pub allowed: Option<AllowedValues>,
}

impl TextRules {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn trim(mut self) -> Self {
        self.trim = true;
        self
    }

    pub fn lowercase(mut self) -> Self {
        self.lowercase = true;
        self
    }

    pub fn uppercase(mut self) -> Self {
        self.uppercase = true;
        self
    }

    pub fn min_length(mut self, min: usize) -> Self {
        self.min_length = Some(Constraint::new(min));
        self
    }

    pub fn min_length_with(mut self, min: usize, message: impl Into<String>) -> Self {
        self.min_length = Some(Constraint::with_message(min, message));
        self
    }

    pub fn max_length(mut self, max: usize) -> Self {
        self.max_length = Some(Constraint::new(max));
        self
    }

    pub fn max_length_with(mut self, max: usize, message: impl Into<String>) -> Self {
        self.max_length = Some(Constraint::with_message(max, message));
        self
    }

    pub fn pattern(mut self, pattern: Pattern) -> Self {
        self.pattern = Some(Constraint::new(pattern));
        self
    }

    pub fn pattern_with(mut self, pattern: Pattern, message: impl Into<String>) -> Self {
        self.pattern = Some(Constraint::with_message(pattern, message));
        self
    }

    pub fn one_of(mut self, allowed: AllowedValues) -> Self {
        self.allowed = Some(allowed);
        self
    }

    /// Applies trim then case folding.
    pub(crate) fn normalize(&self, text: String) -> String {
        let text = if self.trim {
            text.trim().to_string()
        } else {
            text
        };
        if self.lowercase {
            text.to_lowercase()
        } else if self.uppercase {
            text.to_uppercase()
        } else {
            text
        }
    }

    fn check(&self, path: &str) -> SchemaResult<()> {
        if self.lowercase && self.uppercase {
            return Err(SchemaError::conflicting_constraint(
                path,
                "lowercase and uppercase are mutually exclusive",
            ));
        }
        if let (Some(min), Some(max)) = (&self.min_length, &self.max_length) {
            if min.value > max.value {
                return Err(SchemaError::conflicting_constraint(
                    path,
                    format!("min_length {} exceeds max_length {}", min.value, max.value),
                ));
            }
        }
        if let Some(allowed) = &self.allowed {
            if allowed.values.is_empty() {
                return Err(SchemaError::conflicting_constraint(
                    path,
                    "enum must list at least one value",
                ));
            }
        }
        Ok(())
    }
}

/// Rules for number fields. Bounds are inclusive.
#[derive(Debug, Clone, Default)]
pub struct NumberRules {
    pub min: Option<Constraint<f64>>,
    pub max: Option<Constraint<f64>>,
}

impl NumberRules {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn min(mut self, min: f64) -> Self {
        self.min = Some(Constraint::new(min));
        self
    }

    pub fn min_with(mut self, min: f64, message: impl Into<String>) -> Self {
        self.min = Some(Constraint::with_message(min, message));
        self
    }

    pub fn max(mut self, max: f64) -> Self {
        self.max = Some(Constraint::new(max));
        self
    }

    pub fn max_with(mut self, max: f64, message: impl Into<String>) -> Self {
        self.max = Some(Constraint::with_message(max, message));
        self
    }

    fn check(&self, path: &str) -> SchemaResult<()> {
        for bound in [&self.min, &self.max].into_iter().flatten() {
            if !bound.value.is_finite() {
                return Err(SchemaError::conflicting_constraint(
                    path,
                    "numeric bounds must be finite",
                ));
            }
        }
        if let (Some(min), Some(max)) = (&self.min, &self.max) {
            if min.value > max.value {
                return Err(SchemaError::conflicting_constraint(
                    path,
                    format!("min {} exceeds max {}", min.value, max.value),
                ));
            }
        }
        Ok(())
    }
}

/// Default for an absent field.
///
/// Generators run on every validation call, never at schema construction.
#[derive(Clone)]
pub enum DefaultValue {
    Static(Value),
    /// Current UTC time, RFC 3339 with milliseconds
    Now,
    /// Random v4 UUID
    Uuid,
    Generated(Arc<dyn Fn() -> Value + Send + Sync>),
}

impl DefaultValue {
    pub fn from_fn<F>(f: F) -> Self
    where
        F: Fn() -> Value + Send + Sync + 'static,
    {
        DefaultValue::Generated(Arc::new(f))
    }

    /// Produces the value to substitute.
    pub fn produce(&self) -> Value {
        match self {
            DefaultValue::Static(v) => v.clone(),
            DefaultValue::Now => {
                Value::String(Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true))
            }
            DefaultValue::Uuid => Value::String(Uuid::new_v4().to_string()),
            DefaultValue::Generated(f) => f(),
        }
    }
}

impl fmt::Debug for DefaultValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DefaultValue::Static(v) => f.debug_tuple("Static").field(v).finish(),
            DefaultValue::Now => write!(f, "Now"),
            DefaultValue::Uuid => write!(f, "Uuid"),
            DefaultValue::Generated(_) => write!(f, "Generated(<fn>)"),
        }
    }
}

/// Field data type with its type-specific rules
#[derive(Debug, Clone)]
pub enum FieldType {
    Text(TextRules),
    Number(NumberRules),
    Boolean,
    Date,
    /// Opaque key into the collection of `model`
    Reference { model: String },
    Object(Fields),
    List(Box<FieldSpec>),
}

impl FieldType {
    /// Returns the type name for error messages
    pub fn type_name(&self) -> &'static str {
        match self {
            FieldType::Text(_) => "text",
            FieldType::Number(_) => "number",
            FieldType::Boolean => "boolean",
            FieldType::Date => "date",
            FieldType::Reference { .. } => "reference",
            FieldType::Object(_) => "object",
            FieldType::List(_) => "list",
        }
    }
}

/// Required marker with an optional custom message
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Required {
    pub message: Option<String>,
}

/// Declarative description of one field
#[derive(Debug, Clone, Deserialize)]
#[serde(try_from = "RawFieldSpec")]
pub struct FieldSpec {
    pub field_type: FieldType,
    pub required: Option<Required>,
    /// Enforced by the storage layer, never by the validator
    pub unique: bool,
    pub default: Option<DefaultValue>,
}

impl FieldSpec {
    fn of(field_type: FieldType) -> Self {
        Self {
            field_type,
            required: None,
            unique: false,
            default: None,
        }
    }

    pub fn text(rules: TextRules) -> Self {
        Self::of(FieldType::Text(rules))
    }

    pub fn number(rules: NumberRules) -> Self {
        Self::of(FieldType::Number(rules))
    }

    pub fn boolean() -> Self {
        Self::of(FieldType::Boolean)
    }

    pub fn date() -> Self {
        Self::of(FieldType::Date)
    }

    pub fn reference(model: impl Into<String>) -> Self {
        Self::of(FieldType::Reference {
            model: model.into(),
        })
    }

    pub fn object(fields: Fields) -> Self {
        Self::of(FieldType::Object(fields))
    }

    pub fn list(element: FieldSpec) -> Self {
        Self::of(FieldType::List(Box::new(element)))
    }

    pub fn required(mut self) -> Self {
        self.required = Some(Required { message: None });
        self
    }

    pub fn required_with(mut self, message: impl Into<String>) -> Self {
        self.required = Some(Required {
            message: Some(message.into()),
        });
        self
    }

    pub fn unique(mut self) -> Self {
        self.unique = true;
        self
    }

    pub fn default_value(mut self, value: impl Into<Value>) -> Self {
        self.default = Some(DefaultValue::Static(value.into()));
        self
    }

    pub fn default_with(mut self, default: DefaultValue) -> Self {
        self.default = Some(default);
        self
    }

    pub fn is_required(&self) -> bool {
        self.required.is_some()
    }

    fn check(&self, path: &str) -> SchemaResult<()> {
        match &self.field_type {
            FieldType::Text(rules) => rules.check(path),
            FieldType::Number(rules) => rules.check(path),
            FieldType::Boolean | FieldType::Date => Ok(()),
            FieldType::Reference { model } => {
                if model.trim().is_empty() {
                    return Err(SchemaError::conflicting_constraint(
                        path,
                        "reference must name a target model",
                    ));
                }
                Ok(())
            }
            FieldType::Object(fields) => fields.check(path),
            FieldType::List(element) => element.check(path),
        }
    }
}

/// Ordered field set with unique, legal names
#[derive(Debug, Clone, Default)]
pub struct Fields(IndexMap<String, FieldSpec>);

impl Fields {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builds a field set, rejecting duplicate or illegal names.
    pub fn build<I, K>(entries: I) -> SchemaResult<Self>
    where
        I: IntoIterator<Item = (K, FieldSpec)>,
        K: Into<String>,
    {
        let mut fields = Self::new();
        for (name, spec) in entries {
            fields.insert(name, spec)?;
        }
        Ok(fields)
    }

    pub fn insert(&mut self, name: impl Into<String>, spec: FieldSpec) -> SchemaResult<()> {
        let name = name.into();
        if name.is_empty() {
            return Err(SchemaError::illegal_field_name(name, "empty"));
        }
        if name.contains('.') {
            return Err(SchemaError::illegal_field_name(name, "contains '.'"));
        }
        if name.starts_with('$') {
            return Err(SchemaError::illegal_field_name(name, "starts with '$'"));
        }
        if self.0.contains_key(&name) {
            return Err(SchemaError::duplicate_field(name));
        }
        self.0.insert(name, spec);
        Ok(())
    }

    pub fn get(&self, name: &str) -> Option<&FieldSpec> {
        self.0.get(name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.0.contains_key(name)
    }

    pub fn iter(&self) -> indexmap::map::Iter<'_, String, FieldSpec> {
        self.0.iter()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    fn check(&self, prefix: &str) -> SchemaResult<()> {
        for (name, spec) in self {
            spec.check(&join_path(prefix, name))?;
        }
        Ok(())
    }
}

impl<'a> IntoIterator for &'a Fields {
    type Item = (&'a String, &'a FieldSpec);
    type IntoIter = indexmap::map::Iter<'a, String, FieldSpec>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.iter()
    }
}

impl<'de> Deserialize<'de> for Fields {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        struct FieldsVisitor;

        impl<'de> Visitor<'de> for FieldsVisitor {
            type Value = Fields;

            fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str("a map of field names to field definitions")
            }

            fn visit_map<A: MapAccess<'de>>(self, mut map: A) -> Result<Fields, A::Error> {
                let mut fields = Fields::new();
                while let Some((name, raw)) = map.next_entry::<String, Value>()? {
                    let spec = FieldSpec::deserialize(raw)
                        .map_err(|e| de::Error::custom(locate(&name, &e.to_string())))?;
                    fields.insert(name, spec).map_err(de::Error::custom)?;
                }
                Ok(fields)
            }
        }

        deserializer.deserialize_map(FieldsVisitor)
    }
}

const LOCATED: &str = "field `";

/// Prefixes a field definition error with its dotted path.
///
/// Errors already located by a nested field map get the parent name joined on.
fn locate(name: &str, message: &str) -> String {
    let code = format!("{}: ", SchemaErrorCode::MalformedSchema.code());
    let message = message.strip_prefix(code.as_str()).unwrap_or(message);
    match message
        .strip_prefix(LOCATED)
        .and_then(|rest| rest.split_once("`: "))
    {
        Some((inner, reason)) => format!("{}{}`: {}", LOCATED, join_path(name, inner), reason),
        None => format!("{}{}`: {}", LOCATED, name, message),
    }
}

/// Policy for record keys the schema does not declare
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum UnknownFields {
    /// Drop them from the normalized record
    #[default]
    Strip,
    /// Copy them through unchanged
    Keep,
    /// Report each one as a violation
    Reject,
}

/// Complete, immutable schema for one model
#[derive(Debug, Clone, Deserialize)]
#[serde(try_from = "RawSchema")]
pub struct Schema {
    name: String,
    collection: String,
    unknown_fields: UnknownFields,
    fields: Fields,
}

impl Schema {
    /// Creates a schema, checking every field definition.
    pub fn new(name: impl Into<String>, fields: Fields) -> SchemaResult<Self> {
        let name = name.into();
        let collection = default_collection(&name);
        Self::assemble(name, collection, UnknownFields::default(), fields)
    }

    pub fn builder(name: impl Into<String>) -> SchemaBuilder {
        SchemaBuilder {
            name: name.into(),
            collection: None,
            unknown_fields: UnknownFields::default(),
            entries: Vec::new(),
        }
    }

    fn assemble(
        name: String,
        collection: String,
        unknown_fields: UnknownFields,
        fields: Fields,
    ) -> SchemaResult<Self> {
        if name.trim().is_empty() {
            return Err(SchemaError::malformed_schema("<in-memory>", "model name is empty"));
        }
        if collection.trim().is_empty() {
            return Err(SchemaError::malformed_schema(&name, "collection name is empty"));
        }
        fields.check("").map_err(|e| e.in_model(&name))?;
        Ok(Self {
            name,
            collection,
            unknown_fields,
            fields,
        })
    }

    /// Model name
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Collection the storage layer keeps documents of this model in
    pub fn collection(&self) -> &str {
        &self.collection
    }

    pub fn unknown_fields(&self) -> UnknownFields {
        self.unknown_fields
    }

    pub fn fields(&self) -> &Fields {
        &self.fields
    }

    /// Returns the schema with a different unknown-field policy.
    pub fn with_unknown_fields(mut self, policy: UnknownFields) -> Self {
        self.unknown_fields = policy;
        self
    }

    /// Every reference field as (dotted path, target model), lists included.
    pub fn references(&self) -> Vec<(String, &str)> {
        let mut out = Vec::new();
        collect_references(&self.fields, "", &mut out);
        out
    }

    /// Dotted paths of every unique field reachable through nested objects.
    pub fn unique_paths(&self) -> Vec<String> {
        let mut out = Vec::new();
        collect_unique(&self.fields, "", &mut out);
        out
    }
}

fn collect_references<'a>(fields: &'a Fields, prefix: &str, out: &mut Vec<(String, &'a str)>) {
    for (name, spec) in fields {
        let path = join_path(prefix, name);
        collect_type_references(&spec.field_type, path, out);
    }
}

fn collect_type_references<'a>(
    field_type: &'a FieldType,
    path: String,
    out: &mut Vec<(String, &'a str)>,
) {
    match field_type {
        FieldType::Reference { model } => out.push((path, model.as_str())),
        FieldType::Object(fields) => collect_references(fields, &path, out),
        FieldType::List(element) => collect_type_references(&element.field_type, path, out),
        _ => {}
    }
}

fn collect_unique(fields: &Fields, prefix: &str, out: &mut Vec<String>) {
    for (name, spec) in fields {
        let path = join_path(prefix, name);
        if spec.unique {
            out.push(path.clone());
        }
        if let FieldType::Object(nested) = &spec.field_type {
            collect_unique(nested, &path, out);
        }
    }
}

/// Builder for programmatic schema construction
pub struct SchemaBuilder {
    name: String,
    collection: Option<String>,
    unknown_fields: UnknownFields,
    entries: Vec<(String, FieldSpec)>,
}

impl SchemaBuilder {
    pub fn collection(mut self, collection: impl Into<String>) -> Self {
        self.collection = Some(collection.into());
        self
    }

    pub fn unknown_fields(mut self, policy: UnknownFields) -> Self {
        self.unknown_fields = policy;
        self
    }

    pub fn field(mut self, name: impl Into<String>, spec: FieldSpec) -> Self {
        self.entries.push((name.into(), spec));
        self
    }

    pub fn build(self) -> SchemaResult<Schema> {
        let fields = Fields::build(self.entries).map_err(|e| e.in_model(&self.name))?;
        let collection = self
            .collection
            .unwrap_or_else(|| default_collection(&self.name));
        Schema::assemble(self.name, collection, self.unknown_fields, fields)
    }
}

/// Lowercased model name with a plural `s`.
fn default_collection(name: &str) -> String {
    let lower = name.to_lowercase();
    if lower.ends_with('s') {
        lower
    } else {
        format!("{}s", lower)
    }
}

/// Creates a field path from prefix and field name.
pub(crate) fn join_path(prefix: &str, field: &str) -> String {
    if prefix.is_empty() {
        field.to_string()
    } else {
        format!("{}.{}", prefix, field)
    }
}

// ---------------------------------------------------------------------------
// Definition-file representation
// ---------------------------------------------------------------------------

#[derive(Deserialize)]
#[serde(deny_unknown_fields)]
struct RawSchema {
    name: String,
    #[serde(default)]
    collection: Option<String>,
    #[serde(default)]
    unknown_fields: UnknownFields,
    fields: Fields,
}

impl TryFrom<RawSchema> for Schema {
    type Error = SchemaError;

    fn try_from(raw: RawSchema) -> SchemaResult<Self> {
        let collection = raw
            .collection
            .unwrap_or_else(|| default_collection(&raw.name));
        Schema::assemble(raw.name, collection, raw.unknown_fields, raw.fields)
    }
}

#[derive(Deserialize)]
#[serde(rename_all = "lowercase")]
enum RawKind {
    #[serde(alias = "string")]
    Text,
    Number,
    Boolean,
    Date,
    #[serde(alias = "objectid")]
    Reference,
    Object,
    #[serde(alias = "array")]
    List,
}

#[derive(Deserialize)]
#[serde(rename_all = "lowercase")]
enum GeneratorName {
    Now,
    Uuid,
}

#[derive(Deserialize)]
#[serde(deny_unknown_fields)]
struct RawFieldSpec {
    #[serde(rename = "type")]
    kind: RawKind,
    #[serde(default)]
    required: Option<Constraint<bool>>,
    #[serde(default)]
    unique: bool,
    #[serde(default)]
    default: Option<Value>,
    #[serde(default)]
    default_fn: Option<GeneratorName>,
    #[serde(default)]
    trim: bool,
    #[serde(default)]
    lowercase: bool,
    #[serde(default)]
    uppercase: bool,
    #[serde(default)]
    min_length: Option<Constraint<usize>>,
    #[serde(default)]
    max_length: Option<Constraint<usize>>,
    #[serde(default)]
    pattern: Option<Constraint<String>>,
    #[serde(default, rename = "enum")]
    allowed: Option<AllowedValues>,
    #[serde(default)]
    min: Option<Constraint<f64>>,
    #[serde(default)]
    max: Option<Constraint<f64>>,
    #[serde(default, rename = "ref")]
    reference: Option<String>,
    #[serde(default)]
    fields: Option<Fields>,
    #[serde(default)]
    of: Option<Box<FieldSpec>>,
}

fn misplaced(present: bool, option: &str, kind: &str) -> SchemaResult<()> {
    if present {
        return Err(SchemaError::invalid_field_option(format!(
            "option `{}` is only valid for {} fields",
            option, kind
        )));
    }
    Ok(())
}

fn missing(option: &str, kind: &str) -> SchemaError {
    SchemaError::invalid_field_option(format!("{} fields need `{}`", kind, option))
}

impl TryFrom<RawFieldSpec> for FieldSpec {
    type Error = SchemaError;

    fn try_from(raw: RawFieldSpec) -> SchemaResult<Self> {
        let RawFieldSpec {
            kind,
            required,
            unique,
            default,
            default_fn,
            trim,
            lowercase,
            uppercase,
            min_length,
            max_length,
            pattern,
            allowed,
            min,
            max,
            reference,
            fields,
            of,
        } = raw;

        if !matches!(kind, RawKind::Text) {
            misplaced(trim, "trim", "text")?;
            misplaced(lowercase, "lowercase", "text")?;
            misplaced(uppercase, "uppercase", "text")?;
            misplaced(min_length.is_some(), "min_length", "text")?;
            misplaced(max_length.is_some(), "max_length", "text")?;
            misplaced(pattern.is_some(), "pattern", "text")?;
            misplaced(allowed.is_some(), "enum", "text")?;
        }
        if !matches!(kind, RawKind::Number) {
            misplaced(min.is_some(), "min", "number")?;
            misplaced(max.is_some(), "max", "number")?;
        }
        if !matches!(kind, RawKind::Reference) {
            misplaced(reference.is_some(), "ref", "reference")?;
        }
        if !matches!(kind, RawKind::Object) {
            misplaced(fields.is_some(), "fields", "object")?;
        }
        if !matches!(kind, RawKind::List) {
            misplaced(of.is_some(), "of", "list")?;
        }

        let field_type = match kind {
            RawKind::Text => {
                let pattern = match pattern {
                    Some(c) => Some(Constraint {
                        value: Pattern::new(c.value)?,
                        message: c.message,
                    }),
                    None => None,
                };
                FieldType::Text(TextRules {
                    trim,
                    lowercase,
                    uppercase,
                    min_length,
                    max_length,
                    pattern,
                    allowed,
                })
            }
            RawKind::Number => FieldType::Number(NumberRules { min, max }),
            RawKind::Boolean => FieldType::Boolean,
            RawKind::Date => FieldType::Date,
            RawKind::Reference => FieldType::Reference {
                model: reference.ok_or_else(|| missing("ref", "reference"))?,
            },
            RawKind::Object => FieldType::Object(fields.ok_or_else(|| missing("fields", "object"))?),
            RawKind::List => FieldType::List(of.ok_or_else(|| missing("of", "list"))?),
        };

        let default = match (default, default_fn) {
            (Some(_), Some(_)) => {
                return Err(SchemaError::invalid_field_option(
                    "`default` and `default_fn` are mutually exclusive",
                ))
            }
            (Some(value), None) => Some(DefaultValue::Static(value)),
            (None, Some(GeneratorName::Now)) => Some(DefaultValue::Now),
            (None, Some(GeneratorName::Uuid)) => Some(DefaultValue::Uuid),
            (None, None) => None,
        };

        Ok(FieldSpec {
            field_type,
            required: required
                .filter(|c| c.value)
                .map(|c| Required { message: c.message }),
            unique,
            default,
        })
    }
}
