//! Input schemas: JSON Schema generation and all-or-nothing argument validation.
//!
//! Every tool input is a plain struct deriving `Deserialize` and `JsonSchema`.
//! The schema advertised to clients is generated from that type, and incoming
//! arguments are checked against the very same generated schema before they
//! are deserialised. Nothing is coerced: `"10"` is not an integer.

use schemars::gen::SchemaSettings;
use schemars::JsonSchema;
use serde::de::DeserializeOwned;
use serde_json::{json, Map, Value};

use crate::error::{ValidationErrors, Violation};

/// A validated, strongly typed tool input.
pub trait ToolInput: DeserializeOwned + JsonSchema + Send + Sized {
    /// Format and cross-field rules the schema cannot express. Runs on the raw
    /// arguments in the same pass as schema validation, so a single call
    /// reports every violation. Fields of the wrong type are already reported
    /// by the schema and should be skipped here.
    fn check_args(_args: &Map<String, Value>, _errs: &mut ValidationErrors) {}

    /// Build an instance from an untyped argument mapping.
    fn from_args(args: Value) -> Result<Self, ValidationErrors> {
        parse_with(&input_schema::<Self>(), args)
    }
}

/// Generate the JSON Schema for a tool input, with every subschema inlined so
/// the result is self-contained.
pub fn input_schema<T: JsonSchema>() -> Value {
    let generator = SchemaSettings::draft07()
        .with(|s| {
            s.inline_subschemas = true;
        })
        .into_generator();
    let root = generator.into_root_schema_for::<T>();
    serde_json::to_value(root).unwrap_or_else(|_| json!({ "type": "object" }))
}

/// Validate `args` against `schema` and `T`'s own rules and, only if both
/// pass, deserialise it into `T`.
pub fn parse_with<T: ToolInput>(schema: &Value, args: Value) -> Result<T, ValidationErrors> {
    let mut errs = ValidationErrors::new();
    if !args.is_object() {
        errs.push("", Violation::NotAnObject);
        return Err(errs);
    }
    check_value(schema, &args, "", &mut errs);
    if let Value::Object(fields) = &args {
        T::check_args(fields, &mut errs);
    }
    errs.into_result()?;

    let input: T = serde_path_to_error::deserialize(args).map_err(|e| {
        let mut errs = ValidationErrors::new();
        let path = e.path().to_string();
        let field = if path == "." { String::new() } else { path };
        errs.push(
            field,
            Violation::Invalid {
                reason: e.into_inner().to_string(),
            },
        );
        errs
    })?;
    Ok(input)
}

fn check_value(schema: &Value, value: &Value, path: &str, errs: &mut ValidationErrors) {
    let schema = match schema {
        Value::Bool(true) => return,
        Value::Bool(false) => {
            errs.push(
                path,
                Violation::Invalid {
                    reason: "no value is allowed here".into(),
                },
            );
            return;
        }
        Value::Object(obj) => obj,
        _ => return,
    };

    if let Some(Value::Array(branches)) = schema.get("allOf") {
        for branch in branches {
            check_value(branch, value, path, errs);
        }
    }

    for key in ["anyOf", "oneOf"] {
        if let Some(Value::Array(branches)) = schema.get(key) {
            check_any_of(branches, value, path, errs);
        }
    }

    if let Some(types) = schema.get("type") {
        let allowed = type_names(types);
        if !allowed.iter().any(|t| matches_type(t, value)) {
            errs.push(
                path,
                Violation::WrongType {
                    expected: allowed.join(" or "),
                    found: json_type(value).into(),
                },
            );
            return;
        }
    }

    if value.is_null() {
        return;
    }

    if let Some(Value::Array(options)) = schema.get("enum") {
        if !options.contains(value) {
            errs.push(
                path,
                Violation::UnknownEnumValue {
                    value: display_scalar(value),
                    allowed: options.iter().map(display_scalar).collect(),
                },
            );
            return;
        }
    }

    match value {
        Value::Number(n) => check_number(schema, n.as_f64().unwrap_or(f64::NAN), path, errs),
        Value::String(s) => check_string(schema, s, path, errs),
        Value::Array(items) => check_array(schema, items, path, errs),
        Value::Object(fields) => check_object(schema, fields, path, errs),
        _ => {}
    }
}

/// Valid if any branch accepts the value. Otherwise report the branch that
/// came closest, so the caller sees one coherent explanation.
fn check_any_of(branches: &[Value], value: &Value, path: &str, errs: &mut ValidationErrors) {
    let mut best: Option<ValidationErrors> = None;
    for branch in branches {
        let mut scratch = ValidationErrors::new();
        check_value(branch, value, path, &mut scratch);
        if scratch.is_empty() {
            return;
        }
        let closer = best
            .as_ref()
            .map_or(true, |b| scratch.violations().len() < b.violations().len());
        if closer {
            best = Some(scratch);
        }
    }
    if let Some(best) = best {
        for v in best.violations() {
            errs.push(v.field.clone(), v.violation.clone());
        }
    }
}

fn check_number(schema: &Map<String, Value>, n: f64, path: &str, errs: &mut ValidationErrors) {
    let min = schema.get("minimum").and_then(Value::as_f64);
    let max = schema.get("maximum").and_then(Value::as_f64);
    let excl_min = schema.get("exclusiveMinimum").and_then(Value::as_f64);
    let excl_max = schema.get("exclusiveMaximum").and_then(Value::as_f64);

    let below = min.is_some_and(|m| n < m) || excl_min.is_some_and(|m| n <= m);
    let above = max.is_some_and(|m| n > m) || excl_max.is_some_and(|m| n >= m);
    if below || above {
        errs.push(
            path,
            Violation::OutOfRange {
                value: n,
                min: min.or(excl_min),
                max: max.or(excl_max),
            },
        );
    }
}

fn check_string(schema: &Map<String, Value>, s: &str, path: &str, errs: &mut ValidationErrors) {
    let len = s.chars().count() as u64;
    if let Some(min) = schema.get("minLength").and_then(Value::as_u64) {
        if len < min {
            errs.push(
                path,
                Violation::Invalid {
                    reason: format!("must be at least {min} characters"),
                },
            );
        }
    }
    if let Some(max) = schema.get("maxLength").and_then(Value::as_u64) {
        if len > max {
            errs.push(
                path,
                Violation::Invalid {
                    reason: format!("must be at most {max} characters"),
                },
            );
        }
    }
}

fn check_array(schema: &Map<String, Value>, items: &[Value], path: &str, errs: &mut ValidationErrors) {
    let len = items.len() as u64;
    if let Some(min) = schema.get("minItems").and_then(Value::as_u64) {
        if len < min {
            errs.push(
                path,
                Violation::Invalid {
                    reason: format!("must contain at least {min} items"),
                },
            );
        }
    }
    if let Some(max) = schema.get("maxItems").and_then(Value::as_u64) {
        if len > max {
            errs.push(
                path,
                Violation::Invalid {
                    reason: format!("must contain at most {max} items"),
                },
            );
        }
    }
    if let Some(item_schema) = schema.get("items") {
        for (i, item) in items.iter().enumerate() {
            check_value(item_schema, item, &format!("{path}[{i}]"), errs);
        }
    }
}

fn check_object(
    schema: &Map<String, Value>,
    fields: &Map<String, Value>,
    path: &str,
    errs: &mut ValidationErrors,
) {
    let empty = Map::new();
    let properties = schema
        .get("properties")
        .and_then(Value::as_object)
        .unwrap_or(&empty);

    if let Some(Value::Array(required)) = schema.get("required") {
        for name in required.iter().filter_map(Value::as_str) {
            if !fields.contains_key(name) {
                errs.push(join_path(path, name), Violation::Missing);
            }
        }
    }

    for (name, value) in fields {
        let field_path = join_path(path, name);
        match properties.get(name) {
            Some(prop) => check_value(prop, value, &field_path, errs),
            None => match schema.get("additionalProperties") {
                Some(Value::Bool(false)) => errs.push(field_path, Violation::UnknownField),
                Some(extra @ Value::Object(_)) => check_value(extra, value, &field_path, errs),
                _ => {}
            },
        }
    }
}

fn join_path(parent: &str, field: &str) -> String {
    if parent.is_empty() {
        field.to_string()
    } else {
        format!("{parent}.{field}")
    }
}

fn type_names(types: &Value) -> Vec<String> {
    match types {
        Value::String(t) => vec![t.clone()],
        Value::Array(ts) => ts
            .iter()
            .filter_map(Value::as_str)
            .map(str::to_string)
            .collect(),
        _ => Vec::new(),
    }
}

fn matches_type(expected: &str, value: &Value) -> bool {
    match expected {
        "null" => value.is_null(),
        "boolean" => value.is_boolean(),
        "string" => value.is_string(),
        "array" => value.is_array(),
        "object" => value.is_object(),
        "number" => value.is_number(),
        "integer" => value.is_i64() || value.is_u64(),
        _ => false,
    }
}

fn json_type(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(n) if n.is_i64() || n.is_u64() => "integer",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

fn display_scalar(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}
