//! Turns a step payload into the JSON body the API expects.

use crate::payload::{FieldValue, FileRef, StepPayload};
use heck::ToSnakeCase;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Number, Value};
use std::collections::BTreeMap;

/// How a step payload maps onto the API body. Keys default to snake_case of
/// the form field name.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ApiShape {
    /// Form field name → API key.
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub renames: BTreeMap<String, String>,
    /// Nested groups whose children are lifted to the top level.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub flatten: Vec<String>,
    /// UI-only fields that never reach the API.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub omit: Vec<String>,
}

impl ApiShape {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn rename(mut self, field: impl Into<String>, api_key: impl Into<String>) -> Self {
        self.renames.insert(field.into(), api_key.into());
        self
    }

    pub fn flatten(mut self, field: impl Into<String>) -> Self {
        self.flatten.push(field.into());
        self
    }

    pub fn omit(mut self, field: impl Into<String>) -> Self {
        self.omit.push(field.into());
        self
    }

    fn api_key(&self, field: &str) -> String {
        self.renames
            .get(field)
            .cloned()
            .unwrap_or_else(|| field.to_snake_case())
    }
}

/// Builds the request body: renames and flattening from `shape`, snake_case
/// for every other key, omitted fields dropped.
pub fn to_api_body(payload: &StepPayload, shape: &ApiShape) -> Value {
    let mut body = Map::new();
    for (field, value) in payload.iter() {
        if shape.omit.iter().any(|f| f == field) {
            continue;
        }
        if shape.flatten.iter().any(|f| f == field) {
            if let FieldValue::Map(children) = value {
                for (child, child_value) in children {
                    body.insert(child.to_snake_case(), field_to_json(child_value));
                }
                continue;
            }
        }
        body.insert(shape.api_key(field), field_to_json(value));
    }
    Value::Object(body)
}

pub fn field_to_json(value: &FieldValue) -> Value {
    match value {
        FieldValue::Null => Value::Null,
        FieldValue::Bool(b) => Value::Bool(*b),
        FieldValue::Number(n) => number_to_json(*n),
        FieldValue::String(s) => Value::String(s.clone()),
        FieldValue::File(file) => file_to_json(file),
        FieldValue::List(items) => Value::Array(items.iter().map(field_to_json).collect()),
        FieldValue::Map(map) => Value::Object(
            map.iter()
                .map(|(k, v)| (k.to_snake_case(), field_to_json(v)))
                .collect(),
        ),
    }
}

fn number_to_json(n: f64) -> Value {
    if n.fract() == 0.0 && n.abs() < i64::MAX as f64 {
        return Value::Number(Number::from(n as i64));
    }
    Number::from_f64(n).map(Value::Number).unwrap_or(Value::Null)
}

fn file_to_json(file: &FileRef) -> Value {
    let mut obj = Map::new();
    obj.insert("file_name".to_string(), Value::String(file.name.clone()));
    obj.insert("mime_type".to_string(), Value::String(file.mime_type.clone()));
    obj.insert("size".to_string(), Value::Number(Number::from(file.size)));
    if let Some(sha256) = &file.sha256 {
        obj.insert("sha256".to_string(), Value::String(sha256.clone()));
    }
    Value::Object(obj)
}
