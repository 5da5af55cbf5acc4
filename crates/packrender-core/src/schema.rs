//! Values schema
//!
//! Two formats are accepted:
//! - standard JSON Schema (`values.schema.json`, or YAML with `$schema`/`type: object`)
//! - a simplified YAML format (`schemaVersion: packrender/v1`) converted to
//!   JSON Schema before validation

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value as JsonValue, json};
use std::collections::BTreeMap;
use std::path::Path;

use crate::error::{CoreError, Result, ValidationErrorInfo};
use crate::values::Values;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum PropertyType {
    String,
    Number,
    Integer,
    Boolean,
    Array,
    Object,
    Any,
}

impl PropertyType {
    fn json_name(self) -> Option<&'static str> {
        match self {
            Self::String => Some("string"),
            Self::Number => Some("number"),
            Self::Integer => Some("integer"),
            Self::Boolean => Some("boolean"),
            Self::Array => Some("array"),
            Self::Object => Some("object"),
            Self::Any => None,
        }
    }
}

/// One property in the simplified format
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PropertySpec {
    #[serde(rename = "type")]
    pub prop_type: PropertyType,

    #[serde(default)]
    pub description: Option<String>,

    #[serde(default)]
    pub default: Option<JsonValue>,

    #[serde(default)]
    pub required: bool,

    #[serde(default, rename = "enum")]
    pub enum_values: Option<Vec<JsonValue>>,

    #[serde(default)]
    pub pattern: Option<String>,

    #[serde(default)]
    pub min: Option<f64>,

    #[serde(default)]
    pub max: Option<f64>,

    #[serde(default)]
    pub min_length: Option<usize>,

    #[serde(default)]
    pub max_length: Option<usize>,

    #[serde(default)]
    pub properties: Option<BTreeMap<String, PropertySpec>>,

    #[serde(default)]
    pub items: Option<Box<PropertySpec>>,
}

/// Root of the simplified format
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SimpleSchema {
    pub schema_version: String,

    #[serde(default)]
    pub title: Option<String>,

    #[serde(default)]
    pub properties: BTreeMap<String, PropertySpec>,
}

#[derive(Debug, Clone)]
pub enum Schema {
    JsonSchema(JsonValue),
    Simple(SimpleSchema),
}

impl Schema {
    /// Load a schema file, detecting its format
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path)?;
        let is_json_file = path.extension().is_some_and(|ext| ext == "json");

        let parsed: std::result::Result<JsonValue, String> = if is_json_file {
            serde_json::from_str(&content).map_err(|e| e.to_string())
        } else {
            serde_yaml::from_str(&content).map_err(|e| e.to_string())
        };
        let raw = parsed.map_err(|e| CoreError::InvalidSchema {
            message: format!("{}: {}", path.display(), e),
        })?;

        Self::from_value(raw, is_json_file)
    }

    /// Parse a JSON Schema document
    pub fn from_json_schema(json: &str) -> Result<Self> {
        Ok(Schema::JsonSchema(serde_json::from_str(json)?))
    }

    /// Parse a simplified schema document
    pub fn from_simple_yaml(yaml: &str) -> Result<Self> {
        Ok(Schema::Simple(serde_yaml::from_str(yaml)?))
    }

    fn from_value(raw: JsonValue, force_json_schema: bool) -> Result<Self> {
        let is_simple = !force_json_schema
            && raw
                .get("schemaVersion")
                .and_then(JsonValue::as_str)
                .is_some_and(|v| v.starts_with("packrender/"));

        if is_simple {
            let simple = serde_json::from_value(raw).map_err(|e| CoreError::InvalidSchema {
                message: e.to_string(),
            })?;
            Ok(Schema::Simple(simple))
        } else {
            Ok(Schema::JsonSchema(raw))
        }
    }

    /// Equivalent JSON Schema document
    pub fn to_json_schema(&self) -> JsonValue {
        match self {
            Schema::JsonSchema(v) => v.clone(),
            Schema::Simple(s) => {
                let mut root = object_schema(&s.properties);
                root.insert(
                    "$schema".into(),
                    json!("http://json-schema.org/draft-07/schema#"),
                );
                if let Some(title) = &s.title {
                    root.insert("title".into(), json!(title));
                }
                JsonValue::Object(root)
            }
        }
    }

    /// Defaults declared in the schema, as a values tree
    pub fn defaults(&self) -> Values {
        let tree = match self {
            Schema::JsonSchema(v) => json_schema_defaults(v),
            Schema::Simple(s) => simple_defaults(&s.properties),
        };
        match tree {
            Some(value @ JsonValue::Object(_)) => Values(value),
            _ => Values::new(),
        }
    }
}

fn object_schema(props: &BTreeMap<String, PropertySpec>) -> Map<String, JsonValue> {
    let mut schema = Map::new();
    schema.insert("type".into(), json!("object"));
    schema.insert(
        "properties".into(),
        JsonValue::Object(
            props
                .iter()
                .map(|(name, prop)| (name.clone(), property_schema(prop)))
                .collect(),
        ),
    );

    let required: Vec<&String> = props
        .iter()
        .filter(|(_, prop)| prop.required)
        .map(|(name, _)| name)
        .collect();
    if !required.is_empty() {
        schema.insert("required".into(), json!(required));
    }
    schema
}

fn property_schema(prop: &PropertySpec) -> JsonValue {
    let mut schema = match &prop.properties {
        Some(nested) => object_schema(nested),
        None => Map::new(),
    };

    if let Some(name) = prop.prop_type.json_name() {
        schema.insert("type".into(), json!(name));
    }

    let optional = [
        ("description", prop.description.as_ref().map(|v| json!(v))),
        ("default", prop.default.clone()),
        ("enum", prop.enum_values.as_ref().map(|v| json!(v))),
        ("pattern", prop.pattern.as_ref().map(|v| json!(v))),
        ("minimum", prop.min.map(|v| json!(v))),
        ("maximum", prop.max.map(|v| json!(v))),
        ("minLength", prop.min_length.map(|v| json!(v))),
        ("maxLength", prop.max_length.map(|v| json!(v))),
        ("items", prop.items.as_deref().map(property_schema)),
    ];
    for (key, value) in optional {
        if let Some(value) = value {
            schema.insert(key.into(), value);
        }
    }

    JsonValue::Object(schema)
}

fn json_schema_defaults(schema: &JsonValue) -> Option<JsonValue> {
    let obj = schema.as_object()?;
    if let Some(default) = obj.get("default") {
        return Some(default.clone());
    }

    let props = obj.get("properties")?.as_object()?;
    let defaults: Map<String, JsonValue> = props
        .iter()
        .filter_map(|(key, prop)| Some((key.clone(), json_schema_defaults(prop)?)))
        .collect();

    (!defaults.is_empty()).then_some(JsonValue::Object(defaults))
}

fn simple_defaults(props: &BTreeMap<String, PropertySpec>) -> Option<JsonValue> {
    let defaults: Map<String, JsonValue> = props
        .iter()
        .filter_map(|(name, prop)| {
            let value = match (&prop.default, &prop.properties) {
                (Some(default), _) => default.clone(),
                (None, Some(nested)) => simple_defaults(nested)?,
                (None, None) => return None,
            };
            Some((name.clone(), value))
        })
        .collect();

    (!defaults.is_empty()).then_some(JsonValue::Object(defaults))
}

/// Outcome of validating values against a schema
#[derive(Debug)]
pub struct ValidationResult {
    pub is_valid: bool,
    pub errors: Vec<ValidationErrorInfo>,
}

/// Schema compiled once, validated many times
pub struct SchemaValidator {
    compiled: jsonschema::Validator,
    defaults: Values,
}

impl SchemaValidator {
    pub fn new(schema: &Schema) -> Result<Self> {
        let compiled = jsonschema::validator_for(&schema.to_json_schema()).map_err(|e| {
            CoreError::InvalidSchema {
                message: e.to_string(),
            }
        })?;

        Ok(Self {
            compiled,
            defaults: schema.defaults(),
        })
    }

    pub fn validate(&self, values: &JsonValue) -> ValidationResult {
        if self.compiled.is_valid(values) {
            return ValidationResult {
                is_valid: true,
                errors: Vec::new(),
            };
        }

        let errors = self
            .compiled
            .iter_errors(values)
            .map(|e| {
                let path = e.instance_path.to_string();
                ValidationErrorInfo {
                    path: if path.is_empty() {
                        "(root)".to_string()
                    } else {
                        path
                    },
                    message: e.to_string().replace('"', "'"),
                }
            })
            .collect();

        ValidationResult {
            is_valid: false,
            errors,
        }
    }

    pub fn defaults(&self) -> &Values {
        &self.defaults
    }
}
