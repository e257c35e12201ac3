//! Metadata normalization.
//!
//! Both parser strategies produce a loose key/value bag (YAML frontmatter
//! or an object literal lifted out of the syntax tree). This module narrows
//! that bag into [`Metadata`]. Unknown keys and values of the wrong type
//! are dropped; normalization never fails.

use serde_json::{Map, Value};

use crate::models::{Metadata, Priority, Stability};

/// Project a raw key/value bag onto the canonical metadata schema.
pub fn normalize_metadata(raw: &Map<String, Value>) -> Metadata {
    Metadata {
        priority: raw.get("priority").and_then(Value::as_str).and_then(Priority::parse),
        category: string_field(raw, "category"),
        token_cost: raw.get("token_cost").and_then(token_cost_value),
        requires: raw.get("requires").and_then(string_array),
        stability: raw
            .get("stability")
            .and_then(Value::as_str)
            .and_then(Stability::parse),
        lang: string_field(raw, "lang"),
    }
}

/// Normalize an arbitrary JSON value; anything but an object yields empty metadata.
pub fn normalize_value(raw: &Value) -> Metadata {
    match raw {
        Value::Object(map) => normalize_metadata(map),
        _ => Metadata::default(),
    }
}

fn string_field(raw: &Map<String, Value>, key: &str) -> Option<String> {
    raw.get(key).and_then(Value::as_str).map(str::to_string)
}

/// Non-negative integers only. Integral floats such as `120.0` are accepted.
fn token_cost_value(value: &Value) -> Option<u64> {
    let Value::Number(n) = value else {
        return None;
    };
    if let Some(u) = n.as_u64() {
        return Some(u);
    }
    let f = n.as_f64()?;
    if f.is_finite() && f >= 0.0 && f.fract() == 0.0 && f <= u64::MAX as f64 {
        Some(f as u64)
    } else {
        None
    }
}

/// The whole array must be strings, otherwise the field is dropped.
fn string_array(value: &Value) -> Option<Vec<String>> {
    value
        .as_array()?
        .iter()
        .map(|v| v.as_str().map(str::to_string))
        .collect()
}
