//! Render parameters with deep merge support

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value as JsonValue};
use std::path::Path;

use crate::error::{CoreError, Result};

/// Parameter tree handed to templates as `values`
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Values(pub JsonValue);

impl Values {
    /// Empty object
    pub fn new() -> Self {
        Self(JsonValue::Object(Map::new()))
    }

    /// Load values from a YAML file
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        Self::from_yaml(&std::fs::read_to_string(path.as_ref())?)
    }

    /// Parse values from YAML. An empty document yields empty values.
    pub fn from_yaml(yaml: &str) -> Result<Self> {
        let value: JsonValue = serde_yaml::from_str(yaml)?;
        Ok(Self::normalized(value))
    }

    pub fn from_json(json: &str) -> Result<Self> {
        let value: JsonValue = serde_json::from_str(json)?;
        Ok(Self::normalized(value))
    }

    fn normalized(value: JsonValue) -> Self {
        match value {
            JsonValue::Null => Self::new(),
            other => Self(other),
        }
    }

    /// Deep merge `overlay` into `self`.
    ///
    /// Objects merge key by key; scalars and arrays from the overlay replace
    /// what was there.
    pub fn merge(&mut self, overlay: &Values) {
        deep_merge(&mut self.0, &overlay.0);
    }

    /// Consuming variant of [`Values::merge`]
    pub fn merged(mut self, overlay: &Values) -> Self {
        self.merge(overlay);
        self
    }

    /// Set a value by dotted path, creating intermediate objects
    pub fn set(&mut self, path: &str, value: JsonValue) -> Result<()> {
        let mut parts = path.split('.').peekable();
        let mut current = &mut self.0;

        while let Some(part) = parts.next() {
            if part.is_empty() {
                return Err(CoreError::ValuesMerge {
                    message: format!("empty segment in path '{}'", path),
                });
            }
            if !current.is_object() {
                *current = JsonValue::Object(Map::new());
            }
            let JsonValue::Object(map) = &mut *current else {
                unreachable!("replaced with an object above");
            };
            if parts.peek().is_none() {
                map.insert(part.to_string(), value);
                return Ok(());
            }
            current = map
                .entry(part.to_string())
                .or_insert_with(|| JsonValue::Object(Map::new()));
        }

        Ok(())
    }

    /// Look up a value by dotted path
    pub fn get(&self, path: &str) -> Option<&JsonValue> {
        path.split('.')
            .try_fold(&self.0, |current, part| current.as_object()?.get(part))
    }

    pub fn inner(&self) -> &JsonValue {
        &self.0
    }

    pub fn into_inner(self) -> JsonValue {
        self.0
    }

    pub fn is_empty(&self) -> bool {
        match &self.0 {
            JsonValue::Object(map) => map.is_empty(),
            JsonValue::Null => true,
            _ => false,
        }
    }

    /// Build values from `key=value` pairs, as given on a command line
    pub fn from_set_args<S: AsRef<str>>(args: &[S]) -> Result<Self> {
        let mut values = Values::new();
        for arg in args {
            let arg = arg.as_ref();
            let (key, raw) = arg.split_once('=').ok_or_else(|| CoreError::ValuesMerge {
                message: format!("Invalid --set format: '{}'. Expected key=value", arg),
            })?;
            values.set(key, parse_scalar(raw))?;
        }
        Ok(values)
    }
}

/// Interpret a `--set` right-hand side
fn parse_scalar(raw: &str) -> JsonValue {
    match raw {
        "true" => return JsonValue::Bool(true),
        "false" => return JsonValue::Bool(false),
        "null" => return JsonValue::Null,
        _ => {}
    }
    if let Ok(int) = raw.parse::<i64>() {
        return JsonValue::from(int);
    }
    if let Some(number) = raw
        .parse::<f64>()
        .ok()
        .and_then(serde_json::Number::from_f64)
    {
        return JsonValue::Number(number);
    }
    if raw.starts_with('[') || raw.starts_with('{') {
        if let Ok(parsed) = serde_json::from_str(raw) {
            return parsed;
        }
    }
    JsonValue::String(raw.to_string())
}

fn deep_merge(base: &mut JsonValue, overlay: &JsonValue) {
    match (base, overlay) {
        (JsonValue::Object(base_map), JsonValue::Object(overlay_map)) => {
            for (key, overlay_value) in overlay_map {
                match base_map.get_mut(key) {
                    Some(base_value) => deep_merge(base_value, overlay_value),
                    None => {
                        base_map.insert(key.clone(), overlay_value.clone());
                    }
                }
            }
        }
        (base, overlay) => *base = overlay.clone(),
    }
}
