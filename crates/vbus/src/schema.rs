// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! JSON schema inference, method signature schemas, and value validation.
//!
//! A closure carries no runtime-inspectable parameter list, so
//! [`MethodSchema`] must always be built explicitly — by hand or via the
//! [`method_schema`] macro.

use jsonschema::Validator;
use serde_json::{json, Value};

use crate::error::{Result, VbusError};

/// The params/returns schema pair attached to a `Method` element, the Rust
/// analogue of `MethodDef.to_json()`.
#[derive(Debug, Clone)]
pub struct MethodSchema {
    pub params: Value,
    pub returns: Value,
}

/// One parameter in a method's positional signature.
pub struct ParamSpec {
    pub name: &'static str,
    pub json_type: &'static str,
}

impl MethodSchema {
    /// Build a schema from an explicit parameter list and return type,
    /// mirroring `MethodDef.to_json`'s `{"params": {"type": "array", "items": [...]}, "returns": {"type": ...}}`
    /// shape.
    pub fn new(params: &[ParamSpec], return_type: &'static str) -> Self {
        let items: Vec<Value> = params
            .iter()
            .map(|p| json!({"type": p.json_type, "description": p.name}))
            .collect();
        Self {
            params: json!({"type": "array", "items": items}),
            returns: json!({"type": return_type}),
        }
    }

    /// Render in the wire shape used by a `Method` element's `to_repr`:
    /// `{"params": {"schema": ...}, "returns": {"schema": ...}}`.
    pub fn to_json(&self) -> Value {
        json!({
            "params": {"schema": self.params},
            "returns": {"schema": self.returns},
        })
    }
}

/// Infer a minimal JSON schema describing the shape of `value`, used when a
/// node attribute doesn't carry an explicit schema (spec §4.2).
pub fn infer_schema(value: &Value) -> Value {
    match value {
        Value::Null => json!({"type": "null"}),
        Value::Bool(_) => json!({"type": "boolean"}),
        Value::Number(n) if n.is_i64() || n.is_u64() => json!({"type": "integer"}),
        Value::Number(_) => json!({"type": "number"}),
        Value::String(_) => json!({"type": "string"}),
        Value::Array(items) => {
            let item_schema = items.first().map(infer_schema).unwrap_or(json!({}));
            json!({"type": "array", "items": item_schema})
        }
        Value::Object(map) => {
            let properties: serde_json::Map<String, Value> =
                map.iter().map(|(k, v)| (k.clone(), infer_schema(v))).collect();
            json!({"type": "object", "properties": properties})
        }
    }
}

/// Strip any top-level `$schema` meta-field a caller-supplied schema may
/// carry before handing it to the validator, matching the loose schemas
/// accepted throughout the original's attribute definitions.
fn normalize_schema(schema: &Value) -> Value {
    let mut schema = schema.clone();
    if let Some(obj) = schema.as_object_mut() {
        obj.remove("$schema");
    }
    schema
}

/// Validate `value` against `schema`, returning [`VbusError::Validation`] on
/// the first failure. The Rust analogue of `jsonschema.validate`.
pub fn validate(value: &Value, schema: &Value) -> Result<()> {
    let schema = normalize_schema(schema);
    let validator = Validator::new(&schema).map_err(|e| VbusError::Validation(e.to_string()))?;
    validator
        .validate(value)
        .map_err(|e| VbusError::Validation(e.to_string()))
}

/// Declaratively build a [`MethodSchema`] from a `(name: Type, ...) -> Type`
/// signature, the static analogue of the original's reflective
/// `inspect.getfullargspec`-based introspection.
///
/// ```ignore
/// let schema = method_schema!((a: Integer, b: Integer) -> Integer);
/// ```
#[macro_export]
macro_rules! method_schema {
    (($($name:ident : $ty:ident),* $(,)?) -> $ret:ident) => {
        $crate::schema::MethodSchema::new(
            &[$($crate::method_schema!(@param $name, $ty)),*],
            $crate::method_schema!(@type $ret),
        )
    };
    (@param $name:ident, $ty:ident) => {
        $crate::schema::ParamSpec {
            name: stringify!($name),
            json_type: $crate::method_schema!(@type $ty),
        }
    };
    (@type String) => { "string" };
    (@type Integer) => { "integer" };
    (@type Number) => { "number" };
    (@type Boolean) => { "boolean" };
    (@type Null) => { "null" };
}

#[cfg(test)]
#[path = "schema_tests.rs"]
mod tests;
