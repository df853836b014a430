//! Configuration validation against a [`Schema`].
//!
//! Resources run this before any API call so that malformed configuration is
//! reported as field-scoped diagnostics instead of a remote error.
//!
//! # Example
//!
//! ```
//! use stackit_provider::schema::{Attribute, Schema, Validator};
//! use stackit_provider::validation::validate;
//! use serde_json::json;
//!
//! let schema = Schema::v0()
//!     .with_attribute("name", Attribute::required_string())
//!     .with_attribute(
//!         "maintenance_window",
//!         Attribute::required_int64().with_validator(Validator::Int64Between { min: 1, max: 24 }),
//!     );
//!
//! let diagnostics = validate(&schema, &json!({"name": "nightly", "maintenance_window": 2}));
//! assert!(diagnostics.is_empty());
//!
//! let diagnostics = validate(&schema, &json!({"name": "nightly", "maintenance_window": 30}));
//! assert_eq!(diagnostics.len(), 1);
//! assert_eq!(diagnostics[0].attribute, Some("maintenance_window".to_string()));
//! ```

use crate::schema::{
    Attribute, AttributeType, Diagnostic, NestedAttributes, NestingMode, ObjectValidator, Schema,
    Validator,
};
use serde_json::{Map, Value};
use std::collections::HashMap;

/// Validate a JSON value against a schema.
///
/// Returns a list of diagnostics; an empty list means the value is valid.
///
/// - Required attributes must be present and non-null
/// - Computed-only attributes are skipped (the provider sets them)
/// - Types must match, nested attributes are validated recursively
/// - Attribute and object validators run on present values
pub fn validate(schema: &Schema, value: &Value) -> Vec<Diagnostic> {
    let mut diagnostics = Vec::new();
    match value {
        Value::Object(obj) => validate_attributes(&schema.attributes, obj, "", &mut diagnostics),
        Value::Null => {},
        other => diagnostics.push(
            Diagnostic::error("Expected object").with_detail(format!("Got {}", value_type_name(other))),
        ),
    }
    diagnostics
}

/// Validate a JSON value, returning `Err` with the diagnostics if any were produced.
pub fn validate_result(schema: &Schema, value: &Value) -> Result<(), Vec<Diagnostic>> {
    let diagnostics = validate(schema, value);
    if diagnostics.is_empty() {
        Ok(())
    } else {
        Err(diagnostics)
    }
}

/// Check if a JSON value is valid against a schema.
pub fn is_valid(schema: &Schema, value: &Value) -> bool {
    validate(schema, value).is_empty()
}

fn validate_attributes(
    attributes: &HashMap<String, Attribute>,
    obj: &Map<String, Value>,
    path: &str,
    diagnostics: &mut Vec<Diagnostic>,
) {
    let mut names: Vec<&String> = attributes.keys().collect();
    names.sort();
    for name in names {
        let attr = &attributes[name];
        let attr_path = join_path(path, name);
        validate_attribute(attr, obj.get(name.as_str()), &attr_path, diagnostics);
    }
}

fn validate_attribute(
    attr: &Attribute,
    value: Option<&Value>,
    path: &str,
    diagnostics: &mut Vec<Diagnostic>,
) {
    if attr.flags.computed && !attr.flags.optional && !attr.flags.required {
        return;
    }

    let value = match value {
        None | Some(Value::Null) => {
            if attr.flags.required {
                diagnostics.push(
                    Diagnostic::error(format!("Missing required attribute '{}'", path))
                        .with_detail("This attribute is required and must be provided")
                        .with_attribute(path),
                );
            }
            return;
        },
        Some(v) => v,
    };

    match &attr.nested {
        Some(nested) => validate_nested(nested, value, path, diagnostics),
        None => {
            if validate_type(&attr.attr_type, value, path, diagnostics) {
                // Validators of list and set attributes apply to each element.
                let elements: Vec<(String, &Value)> = match value.as_array() {
                    Some(arr) => arr
                        .iter()
                        .enumerate()
                        .map(|(i, elem)| (format!("{}.{}", path, i), elem))
                        .collect(),
                    None => vec![(path.to_string(), value)],
                };
                for validator in &attr.validators {
                    for (elem_path, elem) in &elements {
                        if let Some(diag) = check_validator(validator, elem, elem_path) {
                            diagnostics.push(diag);
                        }
                    }
                }
            }
        },
    }
}

fn validate_nested(
    nested: &NestedAttributes,
    value: &Value,
    path: &str,
    diagnostics: &mut Vec<Diagnostic>,
) {
    match nested.nesting_mode {
        NestingMode::Single => match value.as_object() {
            Some(obj) => validate_nested_object(nested, obj, path, diagnostics),
            None => diagnostics.push(type_error(path, "object", value)),
        },
        NestingMode::List | NestingMode::Set => match value.as_array() {
            Some(items) => {
                for (i, item) in items.iter().enumerate() {
                    let item_path = format!("{}.{}", path, i);
                    match item.as_object() {
                        Some(obj) => validate_nested_object(nested, obj, &item_path, diagnostics),
                        None => diagnostics.push(type_error(&item_path, "object", item)),
                    }
                }
            },
            None => diagnostics.push(type_error(path, "list", value)),
        },
    }
}

fn validate_nested_object(
    nested: &NestedAttributes,
    obj: &Map<String, Value>,
    path: &str,
    diagnostics: &mut Vec<Diagnostic>,
) {
    validate_attributes(&nested.attributes, obj, path, diagnostics);
    for validator in &nested.validators {
        match validator {
            ObjectValidator::AtMostOneTrue(names) => {
                let set: Vec<&String> = names
                    .iter()
                    .filter(|name| obj.get(name.as_str()) == Some(&Value::Bool(true)))
                    .collect();
                if set.len() > 1 {
                    let listed = set.iter().map(|s| s.as_str()).collect::<Vec<_>>().join(", ");
                    diagnostics.push(
                        Diagnostic::error(format!("Conflicting attributes at '{}'", path))
                            .with_detail(format!("At most one of {} may be true", listed))
                            .with_attribute(join_path(path, set[1])),
                    );
                }
            },
        }
    }
}

/// Returns `true` when the value has the expected type.
fn validate_type(
    attr_type: &AttributeType,
    value: &Value,
    path: &str,
    diagnostics: &mut Vec<Diagnostic>,
) -> bool {
    let before = diagnostics.len();
    match attr_type {
        AttributeType::String => {
            if !value.is_string() {
                diagnostics.push(type_error(path, "string", value));
            }
        },
        AttributeType::Int64 => {
            if !is_int64(value) {
                diagnostics.push(type_error(path, "int64", value));
            }
        },
        AttributeType::Bool => {
            if !value.is_boolean() {
                diagnostics.push(type_error(path, "bool", value));
            }
        },
        AttributeType::List(element_type) | AttributeType::Set(element_type) => {
            if let Some(arr) = value.as_array() {
                for (i, elem) in arr.iter().enumerate() {
                    validate_type(element_type, elem, &format!("{}.{}", path, i), diagnostics);
                }
            } else {
                diagnostics.push(type_error(path, "list", value));
            }
        },
        AttributeType::Map(value_type) => {
            if let Some(obj) = value.as_object() {
                for (key, val) in obj {
                    validate_type(value_type, val, &format!("{}.{}", path, key), diagnostics);
                }
            } else {
                diagnostics.push(type_error(path, "map", value));
            }
        },
        AttributeType::Object(attrs) => {
            if let Some(obj) = value.as_object() {
                for (name, attr_type) in attrs {
                    if let Some(v) = obj.get(name).filter(|v| !v.is_null()) {
                        validate_type(attr_type, v, &join_path(path, name), diagnostics);
                    }
                }
            } else {
                diagnostics.push(type_error(path, "object", value));
            }
        },
    }
    diagnostics.len() == before
}

fn check_validator(validator: &Validator, value: &Value, path: &str) -> Option<Diagnostic> {
    let invalid = |detail: String| {
        Some(
            Diagnostic::error(format!("Invalid value for attribute '{}'", path))
                .with_detail(detail)
                .with_attribute(path),
        )
    };

    match validator {
        Validator::Uuid => {
            let s = value.as_str()?;
            if uuid::Uuid::parse_str(s).is_err() {
                return invalid(format!("{:?} is not a valid UUID", s));
            }
        },
        Validator::OneOf(allowed) => {
            let s = value.as_str()?;
            if !allowed.iter().any(|a| a == s) {
                return invalid(format!("{:?} must be one of {:?}", s, allowed));
            }
        },
        Validator::LengthAtLeast(min) => {
            let s = value.as_str()?;
            if s.chars().count() < *min {
                return invalid(format!("must be at least {} character(s) long", min));
            }
        },
        Validator::Int64Between { min, max } => {
            let n = value.as_i64()?;
            if n < *min || n > *max {
                return invalid(format!("{} must be between {} and {}", n, min, max));
            }
        },
        Validator::NoSeparator => {
            let s = value.as_str()?;
            if s.contains(crate::import::SEPARATOR) {
                return invalid(format!(
                    "{:?} must not contain '{}'",
                    s,
                    crate::import::SEPARATOR
                ));
            }
        },
        Validator::Cidr => {
            let s = value.as_str()?;
            if !s.contains('/') || s.parse::<ipnetwork::IpNetwork>().is_err() {
                return invalid(format!("{:?} is not a network in CIDR notation", s));
            }
        },
    }
    None
}

fn join_path(base: &str, name: &str) -> String {
    if base.is_empty() {
        name.to_string()
    } else {
        format!("{}.{}", base, name)
    }
}

fn value_type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "bool",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

fn is_int64(value: &Value) -> bool {
    match value {
        Value::Number(n) => {
            n.is_i64()
                || n.as_f64()
                    .map(|f| f.fract() == 0.0 && f >= i64::MIN as f64 && f <= i64::MAX as f64)
                    .unwrap_or(false)
        },
        _ => false,
    }
}

fn type_error(path: &str, expected: &str, got: &Value) -> Diagnostic {
    Diagnostic::error(format!("Invalid type for attribute '{}'", path))
        .with_detail(format!("Expected {}, got {}", expected, value_type_name(got)))
        .with_attribute(path)
}
