//! Global functions available in templates

use minijinja::value::Rest;
use minijinja::{Error, ErrorKind, Value};

/// Abort rendering with a message: `{{ fail("tls.secretName is required") }}`
pub fn fail(message: String) -> Result<Value, Error> {
    Err(Error::new(ErrorKind::InvalidOperation, message))
}

/// Build a map from alternating keys and values: `dict("app", name, "tier", "web")`
pub fn dict(args: Rest<Value>) -> Result<Value, Error> {
    if args.len() % 2 != 0 {
        return Err(Error::new(
            ErrorKind::InvalidOperation,
            "dict requires an even number of arguments (key-value pairs)",
        ));
    }

    let mut map = serde_json::Map::new();
    for pair in args.chunks(2) {
        let key = pair[0]
            .as_str()
            .ok_or_else(|| Error::new(ErrorKind::InvalidOperation, "dict keys must be strings"))?;
        let value = serde_json::to_value(&pair[1])
            .map_err(|e| Error::new(ErrorKind::InvalidOperation, e.to_string()))?;
        map.insert(key.to_string(), value);
    }

    Ok(Value::from_serialize(serde_json::Value::Object(map)))
}

pub fn list(args: Rest<Value>) -> Value {
    Value::from(args.0)
}

/// `ternary("yes", "no", condition)`
pub fn ternary(when_true: Value, when_false: Value, condition: Value) -> Value {
    if condition.is_true() {
        when_true
    } else {
        when_false
    }
}

/// Current UTC time, RFC 3339 with second precision
pub fn now() -> String {
    chrono::Utc::now().format("%Y-%m-%dT%H:%M:%SZ").to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn env() -> minijinja::Environment<'static> {
        let mut env = minijinja::Environment::new();
        env.add_function("dict", dict);
        env.add_function("list", list);
        env.add_function("ternary", ternary);
        env.add_function("fail", fail);
        env.add_function("now", now);
        env
    }

    fn eval(template: &str) -> Result<String, Error> {
        env().render_str(template, ())
    }

    #[test]
    fn test_dict_and_list() {
        assert_eq!(eval(r#"{{ dict("a", 1, "b", "x").b }}"#).unwrap(), "x");
        assert_eq!(eval("{{ list(1, 2, 3) | length }}").unwrap(), "3");
        assert!(eval(r#"{{ dict("a") }}"#).is_err());
    }

    #[test]
    fn test_ternary() {
        assert_eq!(eval(r#"{{ ternary("on", "off", true) }}"#).unwrap(), "on");
        assert_eq!(eval(r#"{{ ternary("on", "off", 0) }}"#).unwrap(), "off");
    }

    #[test]
    fn test_fail() {
        let err = eval(r#"{{ fail("boom") }}"#).unwrap_err();
        assert!(err.to_string().contains("boom"));
    }

    #[test]
    fn test_now_format() {
        let stamp = eval("{{ now() }}").unwrap();
        assert!(chrono::NaiveDateTime::parse_from_str(&stamp, "%Y-%m-%dT%H:%M:%SZ").is_ok());
    }
}
