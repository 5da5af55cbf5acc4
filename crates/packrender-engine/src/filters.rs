//! Filters for writing Kubernetes manifests

use base64::Engine as _;
use minijinja::{Error, ErrorKind, Value};
use sha2::{Digest, Sha256};

fn invalid(message: impl Into<String>) -> Error {
    Error::new(ErrorKind::InvalidOperation, message.into())
}

fn to_json_value(value: &Value) -> Result<serde_json::Value, Error> {
    serde_json::to_value(value).map_err(|e| invalid(e.to_string()))
}

fn display_string(value: &Value) -> String {
    value
        .as_str()
        .map(str::to_string)
        .unwrap_or_else(|| value.to_string())
}

/// `{{ values.resources | toyaml }}`
pub fn toyaml(value: Value) -> Result<String, Error> {
    let yaml = serde_yaml::to_string(&to_json_value(&value)?).map_err(|e| invalid(e.to_string()))?;
    Ok(yaml.trim_start_matches("---\n").trim_end().to_string())
}

/// `{{ values.config | tojson }}`
pub fn tojson(value: Value) -> Result<String, Error> {
    serde_json::to_string(&to_json_value(&value)?).map_err(|e| invalid(e.to_string()))
}

pub fn b64encode(value: String) -> String {
    base64::engine::general_purpose::STANDARD.encode(value)
}

pub fn b64decode(value: String) -> Result<String, Error> {
    let bytes = base64::engine::general_purpose::STANDARD
        .decode(value.trim())
        .map_err(|e| invalid(format!("base64 decode error: {}", e)))?;
    String::from_utf8(bytes).map_err(|e| invalid(format!("UTF-8 decode error: {}", e)))
}

/// Double-quote, escaping backslashes and quotes
pub fn quote(value: Value) -> String {
    let text = display_string(&value);
    format!("\"{}\"", text.replace('\\', "\\\\").replace('"', "\\\""))
}

/// Single-quote using YAML escaping
pub fn squote(value: Value) -> String {
    format!("'{}'", display_string(&value).replace('\'', "''"))
}

/// Indent every non-empty line by `spaces`
pub fn indent(value: String, spaces: usize) -> String {
    let pad = " ".repeat(spaces);
    value
        .lines()
        .map(|line| {
            if line.is_empty() {
                String::new()
            } else {
                format!("{}{}", pad, line)
            }
        })
        .collect::<Vec<_>>()
        .join("\n")
}

/// Like `indent`, starting on a fresh line
pub fn nindent(value: String, spaces: usize) -> String {
    format!("\n{}", indent(value, spaces))
}

/// `{{ values.image.repository | required("image.repository is required") }}`
pub fn required(value: Value, message: Option<String>) -> Result<Value, Error> {
    let missing = value.is_undefined() || value.is_none() || value.as_str() == Some("");
    if missing {
        Err(invalid(
            message.unwrap_or_else(|| "required value is missing".to_string()),
        ))
    } else {
        Ok(value)
    }
}

/// Cut to at most `length` characters
pub fn trunc(value: String, length: usize) -> String {
    value.chars().take(length).collect()
}

pub fn trimprefix(value: String, prefix: String) -> String {
    match value.strip_prefix(prefix.as_str()) {
        Some(rest) => rest.to_string(),
        None => value,
    }
}

pub fn trimsuffix(value: String, suffix: String) -> String {
    match value.strip_suffix(suffix.as_str()) {
        Some(rest) => rest.to_string(),
        None => value,
    }
}

/// Hex SHA-256 digest, handy for config checksum annotations
pub fn sha256(value: String) -> String {
    format!("{:x}", Sha256::digest(value.as_bytes()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_toyaml() {
        let value = Value::from_serialize(serde_json::json!({"cpu": "100m", "memory": "64Mi"}));
        assert_eq!(toyaml(value).unwrap(), "cpu: 100m\nmemory: 64Mi");
    }

    #[test]
    fn test_tojson() {
        let value = Value::from_serialize(serde_json::json!({"a": [1, 2]}));
        assert_eq!(tojson(value).unwrap(), r#"{"a":[1,2]}"#);
    }

    #[test]
    fn test_base64() {
        assert_eq!(b64encode("hello".into()), "aGVsbG8=");
        assert_eq!(b64decode("aGVsbG8=".into()).unwrap(), "hello");
        assert!(b64decode("%%%".into()).is_err());
    }

    #[test]
    fn test_quoting() {
        assert_eq!(quote(Value::from("say \"hi\"")), r#""say \"hi\"""#);
        assert_eq!(quote(Value::from(8080)), "\"8080\"");
        assert_eq!(squote(Value::from("it's")), "'it''s'");
    }

    #[test]
    fn test_indentation() {
        assert_eq!(indent("a: 1\n\nb: 2".into(), 2), "  a: 1\n\n  b: 2");
        assert_eq!(nindent("a: 1".into(), 4), "\n    a: 1");
    }

    #[test]
    fn test_required() {
        assert!(required(Value::UNDEFINED, None).is_err());
        assert!(required(Value::from(""), Some("need it".into()))
            .unwrap_err()
            .to_string()
            .contains("need it"));
        assert_eq!(required(Value::from(3), None).unwrap(), Value::from(3));
    }

    #[test]
    fn test_string_helpers() {
        assert_eq!(trunc("abcdef".into(), 3), "abc");
        assert_eq!(trunc("ab".into(), 3), "ab");
        assert_eq!(trimprefix("v1.2".into(), "v".into()), "1.2");
        assert_eq!(trimsuffix("app.yaml".into(), ".yaml".into()), "app");
        assert_eq!(trimsuffix("app".into(), ".yaml".into()), "app");
    }

    #[test]
    fn test_sha256() {
        assert_eq!(
            sha256("abc".into()),
            "ba7816bf8f01cfea414140de5dae2223b00361a396177a9cb410ff61f20015ad"
        );
    }
}
