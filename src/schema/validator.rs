//! Document validation
//!
//! Per-field processing order:
//! 1. Default substitution (absent or null keys; generators run now)
//! 2. Required check (absent or whitespace-only counts as missing)
//! 3. Type coercion
//! 4. Normalization (trim, case folding)
//! 5. Bounds, pattern and enum checks, all evaluated
//!
//! Every field is checked independently and every failure is collected.
//! Validation is pure: no I/O, no shared state, no logging.

use chrono::{DateTime, Datelike, NaiveDate, NaiveDateTime, SecondsFormat, Utc};
use serde_json::{Map, Number, Value};
use uuid::Uuid;

use super::errors::{display_value, render, SchemaError, SchemaResult, Violation};
use super::loader::SchemaRegistry;
use super::types::{join_path, FieldSpec, FieldType, Fields, NumberRules, Schema, TextRules, UnknownFields};

/// A normalized record
pub type Document = Map<String, Value>;

/// Path reported when the record itself is not an object
pub const ROOT_PATH: &str = "$root";

/// Outcome of one validation call
#[derive(Debug, Clone, PartialEq)]
pub enum ValidationResult {
    /// Record after defaults, coercion and normalization
    Accepted(Document),
    /// Every failure, in schema order
    Rejected(Vec<Violation>),
}

impl ValidationResult {
    pub fn is_accepted(&self) -> bool {
        matches!(self, ValidationResult::Accepted(_))
    }

    pub fn document(&self) -> Option<&Document> {
        match self {
            ValidationResult::Accepted(doc) => Some(doc),
            ValidationResult::Rejected(_) => None,
        }
    }

    pub fn violations(&self) -> &[Violation] {
        match self {
            ValidationResult::Accepted(_) => &[],
            ValidationResult::Rejected(violations) => violations,
        }
    }

    pub fn into_result(self) -> Result<Document, Vec<Violation>> {
        match self {
            ValidationResult::Accepted(doc) => Ok(doc),
            ValidationResult::Rejected(violations) => Err(violations),
        }
    }
}

impl Schema {
    /// Validates a candidate record against this schema.
    pub fn validate(&self, record: &Value) -> ValidationResult {
        let mut violations = Vec::new();

        let Some(obj) = record.as_object() else {
            violations.push(Violation::type_mismatch(ROOT_PATH, "object", record));
            return ValidationResult::Rejected(violations);
        };

        let mut doc = Document::new();

        // `_id` is implicit unless declared
        if !self.fields().contains("_id") {
            if let Some(id) = obj.get("_id").filter(|v| !v.is_null()) {
                match cast_reference(id) {
                    Some(key) => {
                        doc.insert("_id".into(), Value::String(key));
                    }
                    None => violations.push(Violation::type_mismatch("_id", "reference", id)),
                }
            }
        }

        let mut ctx = Context {
            policy: self.unknown_fields(),
            violations,
        };
        ctx.validate_object(self.fields(), obj, "", &mut doc);

        if ctx.violations.is_empty() {
            ValidationResult::Accepted(doc)
        } else {
            ValidationResult::Rejected(ctx.violations)
        }
    }
}

struct Context {
    policy: UnknownFields,
    violations: Vec<Violation>,
}

impl Context {
    fn validate_object(&mut self, fields: &Fields, obj: &Map<String, Value>, prefix: &str, doc: &mut Document) {
        for (name, spec) in fields {
            let path = join_path(prefix, name);
            if let Some(value) = self.validate_field(spec, obj.get(name), &path) {
                doc.insert(name.clone(), value);
            }
        }

        for (key, value) in obj {
            if fields.contains(key) || (prefix.is_empty() && key == "_id") {
                continue;
            }
            match self.policy {
                UnknownFields::Strip => {}
                UnknownFields::Keep => {
                    doc.insert(key.clone(), value.clone());
                }
                UnknownFields::Reject => {
                    self.violations
                        .push(Violation::undeclared_field(&join_path(prefix, key)));
                }
            }
        }
    }

    fn validate_field(&mut self, spec: &FieldSpec, raw: Option<&Value>, path: &str) -> Option<Value> {
        let value = match raw.filter(|v| !v.is_null()) {
            Some(v) => Some(v.clone()),
            None => spec.default.as_ref().map(|d| d.produce()),
        };

        let value = match value {
            Some(v) if !is_blank(&v) => v,
            _ => {
                if let Some(required) = &spec.required {
                    self.violations
                        .push(Violation::missing_field(path, required.message.as_deref()));
                }
                return None;
            }
        };

        self.check_value(&spec.field_type, &value, path)
    }

    fn check_value(&mut self, field_type: &FieldType, value: &Value, path: &str) -> Option<Value> {
        match field_type {
            FieldType::Text(rules) => {
                let Some(text) = cast_text(value) else {
                    self.violations.push(Violation::type_mismatch(path, "text", value));
                    return None;
                };
                let text = rules.normalize(text);
                self.check_text(rules, &text, path);
                Some(Value::String(text))
            }
            FieldType::Number(rules) => {
                let Some(number) = cast_number(value) else {
                    self.violations.push(Violation::type_mismatch(path, "number", value));
                    return None;
                };
                self.check_number(rules, &number, path);
                Some(Value::Number(number))
            }
            FieldType::Boolean => match cast_boolean(value) {
                Some(b) => Some(Value::Bool(b)),
                None => {
                    self.violations.push(Violation::type_mismatch(path, "boolean", value));
                    None
                }
            },
            FieldType::Date => match cast_date(value) {
                Some(date) => Some(Value::String(
                    date.to_rfc3339_opts(SecondsFormat::Millis, true),
                )),
                None => {
                    self.violations.push(Violation::type_mismatch(path, "date", value));
                    None
                }
            },
            FieldType::Reference { .. } => match cast_reference(value) {
                Some(key) => Some(Value::String(key)),
                None => {
                    self.violations
                        .push(Violation::type_mismatch(path, "reference", value));
                    None
                }
            },
            FieldType::Object(fields) => {
                let Some(obj) = value.as_object() else {
                    self.violations.push(Violation::type_mismatch(path, "object", value));
                    return None;
                };
                let mut nested = Document::new();
                self.validate_object(fields, obj, path, &mut nested);
                Some(Value::Object(nested))
            }
            FieldType::List(element) => {
                let items = match value {
                    Value::Array(items) => items.as_slice(),
                    single => std::slice::from_ref(single),
                };
                let mut out = Vec::with_capacity(items.len());
                for (index, item) in items.iter().enumerate() {
                    let item_path = join_path(path, &index.to_string());
                    if item.is_null() {
                        self.violations.push(Violation::type_mismatch(
                            &item_path,
                            element.field_type.type_name(),
                            item,
                        ));
                        continue;
                    }
                    if let Some(v) = self.check_value(&element.field_type, item, &item_path) {
                        out.push(v);
                    }
                }
                Some(Value::Array(out))
            }
        }
    }

    fn check_text(&mut self, rules: &TextRules, text: &str, path: &str) {
        let length = text.chars().count();
        let length_str = length.to_string();

        if let Some(min) = &rules.min_length {
            if length < min.value {
                let bound = min.value.to_string();
                let template = min.message().unwrap_or(
                    "Path `{PATH}` (`{VALUE}`, length {LENGTH}) is shorter than the minimum allowed length ({MINLENGTH}).",
                );
                self.violations.push(Violation::out_of_bounds(
                    path,
                    render(
                        template,
                        &[("PATH", path), ("VALUE", text), ("LENGTH", &length_str), ("MINLENGTH", &bound)],
                    ),
                ));
            }
        }

        if let Some(max) = &rules.max_length {
            if length > max.value {
                let bound = max.value.to_string();
                let template = max.message().unwrap_or(
                    "Path `{PATH}` (`{VALUE}`, length {LENGTH}) is longer than the maximum allowed length ({MAXLENGTH}).",
                );
                self.violations.push(Violation::out_of_bounds(
                    path,
                    render(
                        template,
                        &[("PATH", path), ("VALUE", text), ("LENGTH", &length_str), ("MAXLENGTH", &bound)],
                    ),
                ));
            }
        }

        if let Some(pattern) = &rules.pattern {
            if !pattern.value.is_match(text) {
                self.violations
                    .push(Violation::pattern_mismatch(path, pattern.message(), text));
            }
        }

        if let Some(allowed) = &rules.allowed {
            if !allowed.contains(text) {
                self.violations.push(Violation::not_in_allowed_set(
                    path,
                    allowed.message.as_deref(),
                    text,
                ));
            }
        }
    }

    fn check_number(&mut self, rules: &NumberRules, number: &Number, path: &str) {
        let value = number.to_string();

        if let Some(min) = &rules.min {
            if below(number, min.value) {
                let bound = min.value.to_string();
                let template = min
                    .message()
                    .unwrap_or("Path `{PATH}` ({VALUE}) is less than minimum allowed value ({MIN}).");
                self.violations.push(Violation::out_of_bounds(
                    path,
                    render(template, &[("PATH", path), ("VALUE", &value), ("MIN", &bound)]),
                ));
            }
        }

        if let Some(max) = &rules.max {
            if above(number, max.value) {
                let bound = max.value.to_string();
                let template = max
                    .message()
                    .unwrap_or("Path `{PATH}` ({VALUE}) is more than maximum allowed value ({MAX}).");
                self.violations.push(Violation::out_of_bounds(
                    path,
                    render(template, &[("PATH", path), ("VALUE", &value), ("MAX", &bound)]),
                ));
            }
        }
    }
}

/// Integers compare exactly against finite bounds; `f64` loses precision past 2^53.
fn integer_value(number: &Number) -> Option<i128> {
    number
        .as_i64()
        .map(i128::from)
        .or_else(|| number.as_u64().map(i128::from))
}

fn below(number: &Number, bound: f64) -> bool {
    match integer_value(number) {
        Some(i) => i < bound.ceil() as i128,
        None => number.as_f64().map_or(false, |n| n < bound),
    }
}

fn above(number: &Number, bound: f64) -> bool {
    match integer_value(number) {
        Some(i) => i > bound.floor() as i128,
        None => number.as_f64().map_or(false, |n| n > bound),
    }
}

fn is_blank(value: &Value) -> bool {
    matches!(value, Value::String(s) if s.trim().is_empty())
}

fn cast_text(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.clone()),
        Value::Number(_) | Value::Bool(_) => Some(display_value(value)),
        _ => None,
    }
}

fn cast_number(value: &Value) -> Option<Number> {
    match value {
        Value::Number(n) => Some(n.clone()),
        Value::String(s) => {
            let s = s.trim();
            if let Ok(i) = s.parse::<i64>() {
                return Some(Number::from(i));
            }
            s.parse::<f64>().ok().and_then(Number::from_f64)
        }
        _ => None,
    }
}

fn cast_boolean(value: &Value) -> Option<bool> {
    match value {
        Value::Bool(b) => Some(*b),
        Value::Number(n) => match n.as_i64() {
            Some(1) => Some(true),
            Some(0) => Some(false),
            _ => None,
        },
        Value::String(s) => match s.trim().to_ascii_lowercase().as_str() {
            "true" | "1" | "yes" => Some(true),
            "false" | "0" | "no" => Some(false),
            _ => None,
        },
        _ => None,
    }
}

/// Dates outside four-digit years have no plain RFC 3339 form.
const DATE_YEARS: std::ops::RangeInclusive<i32> = 0..=9999;

fn cast_date(value: &Value) -> Option<DateTime<Utc>> {
    parse_date(value).filter(|date| DATE_YEARS.contains(&date.year()))
}

fn parse_date(value: &Value) -> Option<DateTime<Utc>> {
    match value {
        Value::String(s) => {
            let s = s.trim();
            if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
                return Some(dt.with_timezone(&Utc));
            }
            if let Ok(naive) = NaiveDateTime::parse_from_str(s, "%Y-%m-%dT%H:%M:%S%.f") {
                return Some(naive.and_utc());
            }
            NaiveDate::parse_from_str(s, "%Y-%m-%d")
                .ok()
                .and_then(|d| d.and_hms_opt(0, 0, 0))
                .map(|naive| naive.and_utc())
        }
        Value::Number(n) => n.as_i64().and_then(DateTime::from_timestamp_millis),
        _ => None,
    }
}

/// Normalizes a reference key: 24 hex digits (object id) or a UUID.
pub(crate) fn cast_reference(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => normalize_key(s),
        Value::Object(obj) => obj.get("_id").and_then(Value::as_str).and_then(normalize_key),
        _ => None,
    }
}

fn normalize_key(key: &str) -> Option<String> {
    let key = key.trim();
    if key.len() == 24 && key.chars().all(|c| c.is_ascii_hexdigit()) {
        return Some(key.to_ascii_lowercase());
    }
    Uuid::parse_str(key).ok().map(|id| id.to_string())
}

/// Validator that resolves models through a registry.
pub struct SchemaValidator<'a> {
    registry: &'a SchemaRegistry,
}

impl<'a> SchemaValidator<'a> {
    pub fn new(registry: &'a SchemaRegistry) -> Self {
        Self { registry }
    }

    /// Validates a record against the named model.
    ///
    /// # Errors
    ///
    /// Returns `SchemaError` (DOCSCHEMA_UNKNOWN_MODEL) if the model is not
    /// registered. Validation failures are returned inside `Ok`.
    pub fn validate_document(&self, model: &str, record: &Value) -> SchemaResult<ValidationResult> {
        let schema = self
            .registry
            .get(model)
            .ok_or_else(|| SchemaError::unknown_model(model))?;
        Ok(schema.validate(record))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::errors::ViolationKind;
    use crate::schema::types::{AllowedValues, DefaultValue, Pattern};
    use serde_json::json;

    fn user_schema() -> Schema {
        let profile = Fields::build([
            ("firstName", FieldSpec::text(TextRules::new().trim()).required()),
            ("lastName", FieldSpec::text(TextRules::new().trim()).required()),
        ])
        .unwrap();

        Schema::builder("User")
            .field(
                "username",
                FieldSpec::text(TextRules::new().trim().lowercase().min_length(3).max_length(30))
                    .required_with("Username is required")
                    .unique(),
            )
            .field(
                "email",
                FieldSpec::text(
                    TextRules::new()
                        .lowercase()
                        .pattern_with(Pattern::new(r"[^@\s]+@[^@\s]+\.[^@\s]+").unwrap(), "Invalid email"),
                )
                .required(),
            )
            .field("age", FieldSpec::number(NumberRules::new().min(18.0).max(120.0)))
            .field(
                "role",
                FieldSpec::text(TextRules::new().one_of(
                    AllowedValues::new(["user", "admin"]).with_message("{VALUE} is not a valid role"),
                ))
                .default_value("user"),
            )
            .field("active", FieldSpec::boolean().default_value(true))
            .field("createdAt", FieldSpec::date())
            .field("profile", FieldSpec::object(profile))
            .field("posts", FieldSpec::list(FieldSpec::reference("Post")))
            .build()
            .unwrap()
    }

    fn kinds_at(violations: &[Violation], path: &str) -> Vec<ViolationKind> {
        violations.iter().filter(|v| v.path == path).map(|v| v.kind).collect()
    }

    #[test]
    fn test_valid_record_is_accepted_with_defaults() {
        let result = user_schema().validate(&json!({
            "username": "Alice",
            "email": "alice@example.com"
        }));
        let doc = result.into_result().unwrap();
        assert_eq!(doc["username"], "alice");
        assert_eq!(doc["role"], "user");
        assert_eq!(doc["active"], true);
        assert!(!doc.contains_key("age"));
        assert!(!doc.contains_key("profile"));
    }

    #[test]
    fn test_root_must_be_object() {
        let result = user_schema().validate(&json!(["not", "an", "object"]));
        assert_eq!(result.violations().len(), 1);
        assert_eq!(result.violations()[0].path, ROOT_PATH);
        assert_eq!(result.violations()[0].kind, ViolationKind::TypeMismatch);
    }

    #[test]
    fn test_custom_required_message() {
        let result = user_schema().validate(&json!({"email": "a@b.co"}));
        let violations = result.violations();
        assert_eq!(violations.len(), 1);
        assert_eq!(violations[0].path, "username");
        assert_eq!(violations[0].message, "Username is required");
    }

    #[test]
    fn test_blank_text_counts_as_missing() {
        let result = user_schema().validate(&json!({"username": "   ", "email": "a@b.co"}));
        assert_eq!(
            kinds_at(result.violations(), "username"),
            vec![ViolationKind::MissingRequiredField]
        );
    }

    #[test]
    fn test_null_counts_as_absent_and_takes_default() {
        let doc = user_schema()
            .validate(&json!({"username": "bob", "email": "b@b.co", "role": null}))
            .into_result()
            .unwrap();
        assert_eq!(doc["role"], "user");
    }

    #[test]
    fn test_blank_optional_field_is_dropped() {
        let doc = user_schema()
            .validate(&json!({"username": "bob", "email": "b@b.co", "age": " "}))
            .into_result()
            .unwrap();
        assert!(!doc.contains_key("age"));
    }

    #[test]
    fn test_number_coercion_from_text() {
        let doc = user_schema()
            .validate(&json!({"username": "bob", "email": "b@b.co", "age": "42"}))
            .into_result()
            .unwrap();
        assert_eq!(doc["age"], json!(42));
    }

    #[test]
    fn test_number_type_mismatch_skips_bounds() {
        let result = user_schema().validate(&json!({"username": "bob", "email": "b@b.co", "age": "old"}));
        assert_eq!(kinds_at(result.violations(), "age"), vec![ViolationKind::TypeMismatch]);
    }

    #[test]
    fn test_number_bounds_are_inclusive() {
        let schema = user_schema();
        for age in [18, 120] {
            let result = schema.validate(&json!({"username": "bob", "email": "b@b.co", "age": age}));
            assert!(result.is_accepted(), "age {} should be accepted", age);
        }
        let result = schema.validate(&json!({"username": "bob", "email": "b@b.co", "age": 121}));
        assert_eq!(kinds_at(result.violations(), "age"), vec![ViolationKind::OutOfBounds]);
        assert!(result.violations()[0].message.contains("120"));
    }

    #[test]
    fn test_large_integer_bounds_compare_exactly() {
        let schema = Schema::builder("Counter")
            .field(
                "n",
                FieldSpec::number(NumberRules::new().min(-9007199254740992.0).max(9007199254740992.0)),
            )
            .build()
            .unwrap();

        assert!(schema.validate(&json!({"n": 9007199254740992i64})).is_accepted());
        let over = schema.validate(&json!({"n": 9007199254740993i64}));
        assert_eq!(kinds_at(over.violations(), "n"), vec![ViolationKind::OutOfBounds]);
        let under = schema.validate(&json!({"n": -9007199254740993i64}));
        assert_eq!(kinds_at(under.violations(), "n"), vec![ViolationKind::OutOfBounds]);
        let huge = schema.validate(&json!({"n": u64::MAX}));
        assert_eq!(kinds_at(huge.violations(), "n"), vec![ViolationKind::OutOfBounds]);
    }

    #[test]
    fn test_fractional_bounds_against_integers() {
        let schema = Schema::builder("Rating")
            .field("stars", FieldSpec::number(NumberRules::new().min(0.5).max(4.5)))
            .build()
            .unwrap();

        assert!(schema.validate(&json!({"stars": 1})).is_accepted());
        assert!(schema.validate(&json!({"stars": 4})).is_accepted());
        assert!(!schema.validate(&json!({"stars": 0})).is_accepted());
        assert!(!schema.validate(&json!({"stars": 5})).is_accepted());
        assert!(schema.validate(&json!({"stars": 4.5})).is_accepted());
    }

    #[test]
    fn test_all_text_checks_run_for_one_field() {
        let schema = Schema::builder("Code")
            .field(
                "code",
                FieldSpec::text(
                    TextRules::new()
                        .max_length(3)
                        .pattern(Pattern::new("[a-z]+").unwrap())
                        .one_of(AllowedValues::new(["abc"])),
                ),
            )
            .build()
            .unwrap();

        let result = schema.validate(&json!({"code": "ABCD1"}));
        assert_eq!(
            kinds_at(result.violations(), "code"),
            vec![
                ViolationKind::OutOfBounds,
                ViolationKind::PatternMismatch,
                ViolationKind::NotInAllowedSet
            ]
        );
    }

    #[test]
    fn test_placeholder_in_value_is_reported_verbatim() {
        let schema = Schema::builder("Code")
            .field("code", FieldSpec::text(TextRules::new().max_length(5)))
            .build()
            .unwrap();
        let result = schema.validate(&json!({"code": "{MAXLENGTH}"}));
        assert_eq!(
            result.violations()[0].message,
            "Path `code` (`{MAXLENGTH}`, length 11) is longer than the maximum allowed length (5)."
        );
    }

    #[test]
    fn test_enum_compares_after_case_folding() {
        let schema = Schema::builder("Flag")
            .field(
                "level",
                FieldSpec::text(TextRules::new().lowercase().one_of(AllowedValues::new(["low", "high"]))),
            )
            .build()
            .unwrap();
        let doc = schema.validate(&json!({"level": "HIGH"})).into_result().unwrap();
        assert_eq!(doc["level"], "high");
    }

    #[test]
    fn test_boolean_coercion() {
        let schema = user_schema();
        for (raw, expected) in [(json!("yes"), true), (json!(0), false), (json!("FALSE"), false)] {
            let doc = schema
                .validate(&json!({"username": "bob", "email": "b@b.co", "active": raw}))
                .into_result()
                .unwrap();
            assert_eq!(doc["active"], expected);
        }
        let result = schema.validate(&json!({"username": "bob", "email": "b@b.co", "active": "maybe"}));
        assert_eq!(kinds_at(result.violations(), "active"), vec![ViolationKind::TypeMismatch]);
    }

    #[test]
    fn test_date_normalization() {
        let schema = user_schema();
        let cases = [
            (json!("2024-03-01"), "2024-03-01T00:00:00.000Z"),
            (json!("2024-03-01T10:30:00+02:00"), "2024-03-01T08:30:00.000Z"),
            (json!("2024-03-01T10:30:00.5"), "2024-03-01T10:30:00.500Z"),
            (json!(0), "1970-01-01T00:00:00.000Z"),
        ];
        for (raw, expected) in cases {
            let doc = schema
                .validate(&json!({"username": "bob", "email": "b@b.co", "createdAt": raw}))
                .into_result()
                .unwrap();
            assert_eq!(doc["createdAt"], expected);
        }
    }

    #[test]
    fn test_date_year_range_survives_revalidation() {
        let schema = user_schema();
        let record = |at: Value| json!({"username": "bob", "email": "b@b.co", "createdAt": at});

        for (epoch, expected) in [
            (253402300799999i64, "9999-12-31T23:59:59.999Z"),
            (-62167219200000i64, "0000-01-01T00:00:00.000Z"),
        ] {
            let doc = schema.validate(&record(json!(epoch))).into_result().unwrap();
            assert_eq!(doc["createdAt"], expected);
            let again = schema.validate(&Value::Object(doc.clone())).into_result().unwrap();
            assert_eq!(again, doc);
        }

        for epoch in [253402300800000i64, -62167219200001i64] {
            let result = schema.validate(&record(json!(epoch)));
            assert_eq!(kinds_at(result.violations(), "createdAt"), vec![ViolationKind::TypeMismatch]);
        }

        let shifted = schema.validate(&record(json!("0000-01-01T00:30:00+01:00")));
        assert_eq!(kinds_at(shifted.violations(), "createdAt"), vec![ViolationKind::TypeMismatch]);
    }

    #[test]
    fn test_references_are_normalized() {
        let doc = user_schema()
            .validate(&json!({
                "username": "bob",
                "email": "b@b.co",
                "posts": [
                    "507F1F77BCF86CD799439011",
                    {"_id": "67e55044-10b1-426f-9247-bb680e5fe0c8"}
                ]
            }))
            .into_result()
            .unwrap();
        assert_eq!(
            doc["posts"],
            json!(["507f1f77bcf86cd799439011", "67e55044-10b1-426f-9247-bb680e5fe0c8"])
        );
    }

    #[test]
    fn test_invalid_reference_element_reports_index() {
        let result = user_schema().validate(&json!({
            "username": "bob",
            "email": "b@b.co",
            "posts": ["507f1f77bcf86cd799439011", "not-an-id"]
        }));
        assert_eq!(kinds_at(result.violations(), "posts.1"), vec![ViolationKind::TypeMismatch]);
        assert!(kinds_at(result.violations(), "posts.0").is_empty());
    }

    #[test]
    fn test_single_value_wraps_into_list() {
        let doc = user_schema()
            .validate(&json!({"username": "bob", "email": "b@b.co", "posts": "507f1f77bcf86cd799439011"}))
            .into_result()
            .unwrap();
        assert_eq!(doc["posts"], json!(["507f1f77bcf86cd799439011"]));
    }

    #[test]
    fn test_nested_object_must_be_object() {
        let result = user_schema().validate(&json!({"username": "bob", "email": "b@b.co", "profile": "x"}));
        assert_eq!(kinds_at(result.violations(), "profile"), vec![ViolationKind::TypeMismatch]);
    }

    #[test]
    fn test_required_absent_object_is_not_recursed() {
        let nested = Fields::build([("street", FieldSpec::text(TextRules::new()).required())]).unwrap();
        let schema = Schema::builder("Shop")
            .field("address", FieldSpec::object(nested).required())
            .build()
            .unwrap();
        let result = schema.validate(&json!({}));
        assert_eq!(result.violations().len(), 1);
        assert_eq!(result.violations()[0].path, "address");
    }

    #[test]
    fn test_unknown_field_policies() {
        let build = |policy| {
            Schema::builder("Note")
                .unknown_fields(policy)
                .field("title", FieldSpec::text(TextRules::new()))
                .build()
                .unwrap()
        };
        let record = json!({"title": "t", "extra": 1});

        let stripped = build(UnknownFields::Strip).validate(&record).into_result().unwrap();
        assert!(!stripped.contains_key("extra"));

        let kept = build(UnknownFields::Keep).validate(&record).into_result().unwrap();
        assert_eq!(kept["extra"], 1);

        let rejected = build(UnknownFields::Reject).validate(&record);
        assert_eq!(
            kinds_at(rejected.violations(), "extra"),
            vec![ViolationKind::UndeclaredField]
        );
    }

    #[test]
    fn test_implicit_id_is_normalized_and_kept() {
        let schema = Schema::builder("Note")
            .unknown_fields(UnknownFields::Reject)
            .field("title", FieldSpec::text(TextRules::new()))
            .build()
            .unwrap();
        let doc = schema
            .validate(&json!({"_id": "507F1F77BCF86CD799439011", "title": "t"}))
            .into_result()
            .unwrap();
        assert_eq!(doc["_id"], "507f1f77bcf86cd799439011");

        let result = schema.validate(&json!({"_id": 5, "title": "t"}));
        assert_eq!(kinds_at(result.violations(), "_id"), vec![ViolationKind::TypeMismatch]);
    }

    #[test]
    fn test_generated_default_evaluated_at_validation_time() {
        use std::sync::atomic::{AtomicI64, Ordering};
        use std::sync::Arc;

        let counter = Arc::new(AtomicI64::new(0));
        let c = counter.clone();
        let schema = Schema::builder("Ticket")
            .field(
                "seq",
                FieldSpec::number(NumberRules::new())
                    .default_with(DefaultValue::from_fn(move || json!(c.fetch_add(1, Ordering::SeqCst)))),
            )
            .build()
            .unwrap();

        assert_eq!(counter.load(Ordering::SeqCst), 0);
        let first = schema.validate(&json!({})).into_result().unwrap();
        let second = schema.validate(&json!({})).into_result().unwrap();
        assert_eq!(first["seq"], 0);
        assert_eq!(second["seq"], 1);
    }

    #[test]
    fn test_now_default_is_a_valid_date() {
        let schema = Schema::builder("Event")
            .field("at", FieldSpec::date().default_with(DefaultValue::Now))
            .build()
            .unwrap();
        let doc = schema.validate(&json!({})).into_result().unwrap();
        let at = doc["at"].as_str().unwrap();
        assert!(DateTime::parse_from_rfc3339(at).is_ok());
        assert!(at.ends_with('Z'));
    }

    #[test]
    fn test_unknown_model_through_registry() {
        let registry = SchemaRegistry::new();
        let validator = SchemaValidator::new(&registry);
        let err = validator.validate_document("Ghost", &json!({})).unwrap_err();
        assert_eq!(err.code().code(), "DOCSCHEMA_UNKNOWN_MODEL");
    }
}
