//! Pre-check: schema, bound, and enumeration validation of a config-style
//! intent's `config_data` against the scope definition hydrated from the in-
//! memory config catalog.

use crate::collaborators::{ConfigFieldSchema, ConfigFieldType, ConfigScope};
use crate::error::{CoreError, Result};
use serde_json::Value;
use std::collections::HashMap;

/// Runs every declared field's type/bound/enum check against `config_data`.
/// Fields absent from `scope` are not validated, since the catalog is the
/// single source of truth for what is checkable. `scope_name` is threaded
/// into every error so a caller sees which scope a field belongs to without
/// having to carry that context back out of this module separately.
pub fn run(scope_name: &str, scope: &ConfigScope, config_data: &HashMap<String, Value>) -> Result<()> {
    for (field, value) in config_data {
        let Some(schema) = scope.get(field) else {
            continue;
        };

        check_type(scope_name, field, value, schema)?;
        check_bounds(scope_name, field, value, schema)?;
        check_enum(scope_name, field, value, schema)?;
    }
    Ok(())
}

fn check_type(scope_name: &str, field: &str, value: &Value, schema: &ConfigFieldSchema) -> Result<()> {
    let matches = match schema.field_type {
        ConfigFieldType::Integer => value.is_i64() || value.is_u64(),
        // `number` accepts integers too.
        ConfigFieldType::Number => value.is_number(),
        ConfigFieldType::String => value.is_string(),
        ConfigFieldType::Boolean => value.is_boolean(),
        ConfigFieldType::Array => value.is_array(),
        ConfigFieldType::Object => value.is_object(),
    };

    if matches {
        Ok(())
    } else {
        Err(CoreError::PreCheckFailed {
            scope: scope_name.to_string(),
            field: field.to_string(),
            message: format!(
                "expected type {:?}, got {} ({value})",
                schema.field_type,
                json_type_name(value)
            ),
        })
    }
}

fn check_bounds(scope_name: &str, field: &str, value: &Value, schema: &ConfigFieldSchema) -> Result<()> {
    if schema.min.is_none() && schema.max.is_none() {
        return Ok(());
    }
    let Some(number) = value.as_f64() else {
        return Ok(());
    };

    if let Some(min) = schema.min {
        if number < min {
            return Err(CoreError::PreCheckFailed {
                scope: scope_name.to_string(),
                field: field.to_string(),
                message: format!("value {value} is below the minimum of {min}"),
            });
        }
    }
    if let Some(max) = schema.max {
        if number > max {
            return Err(CoreError::PreCheckFailed {
                scope: scope_name.to_string(),
                field: field.to_string(),
                message: format!("value {value} exceeds the maximum of {max}"),
            });
        }
    }
    Ok(())
}

fn check_enum(scope_name: &str, field: &str, value: &Value, schema: &ConfigFieldSchema) -> Result<()> {
    let Some(options) = &schema.options else {
        return Ok(());
    };

    // An empty declared enum admits no value at all.
    let candidates: Vec<&Value> = match value.as_array() {
        Some(items) => items.iter().collect(),
        None => vec![value],
    };

    for candidate in candidates {
        if !options.contains(candidate) {
            return Err(CoreError::PreCheckFailed {
                scope: scope_name.to_string(),
                field: field.to_string(),
                message: format!("value {candidate} is not one of the declared options {options:?}"),
            });
        }
    }
    Ok(())
}

fn json_type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}
