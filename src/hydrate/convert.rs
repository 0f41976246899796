//! Native value conversions.
//!
//! These are the leaf conversions of hydration: raw JSON values cast into
//! the fixed native kinds. Collection and nested-object conversion live in
//! the engine because they recurse.

use std::any::Any;

use chrono::{DateTime, NaiveDate, NaiveDateTime};
use serde_json::Value;

use super::HydrateError;
use crate::metadata::NativeKind;

/// The loose zero-value check: raw values that skip conversion entirely and
/// are assigned as-is.
pub(crate) fn is_empty_value(value: &Value) -> bool {
    match value {
        Value::Null => true,
        Value::Bool(b) => !b,
        Value::Number(n) => n.as_f64().is_some_and(|f| f == 0.0),
        Value::String(s) => s.is_empty() || s == "0",
        Value::Array(items) => items.is_empty(),
        Value::Object(map) => map.is_empty(),
    }
}

/// Unwraps a raw value to its natural Rust shape for an unconverted
/// assignment. Scalars land as `i64`/`f64`/`bool`/`String`; arrays and
/// objects stay `Value`.
pub(crate) fn raw_value(value: &Value) -> Box<dyn Any> {
    match value {
        Value::Bool(b) => Box::new(*b),
        Value::Number(n) => match n.as_i64() {
            Some(i) => Box::new(i),
            None => Box::new(n.as_f64().unwrap_or(0.0)),
        },
        Value::String(s) => Box::new(s.clone()),
        Value::Null | Value::Array(_) | Value::Object(_) => Box::new(value.clone()),
    }
}

/// Converts a raw value to one of the fixed native kinds.
pub(crate) fn native(kind: NativeKind, value: &Value) -> Result<Box<dyn Any>, HydrateError> {
    match kind {
        NativeKind::Int => Ok(Box::new(to_int(value)?)),
        NativeKind::Float => Ok(Box::new(to_float(value)?)),
        NativeKind::Bool => Ok(Box::new(!is_empty_value(value))),
        NativeKind::Str => Ok(Box::new(to_string(value)?)),
        NativeKind::Array => match value {
            Value::Array(_) | Value::Object(_) => Ok(Box::new(value.clone())),
            _ => Err(HydrateError::Conversion("value is not array".to_string())),
        },
        NativeKind::Date => Ok(Box::new(to_date(value)?)),
    }
}

fn to_int(value: &Value) -> Result<i64, HydrateError> {
    match value {
        Value::Number(n) => n
            .as_i64()
            .or_else(|| n.as_f64().map(|f| f as i64))
            .ok_or_else(|| HydrateError::Conversion(format!("'{n}' is not an integer"))),
        Value::String(s) => s
            .parse::<i64>()
            .or_else(|_| s.parse::<f64>().map(|f| f as i64))
            .map_err(|_| HydrateError::Conversion(format!("'{s}' is not an integer"))),
        Value::Bool(b) => Ok(i64::from(*b)),
        other => Err(HydrateError::Conversion(format!(
            "cannot convert {} to integer",
            kind_of(other)
        ))),
    }
}

fn to_float(value: &Value) -> Result<f64, HydrateError> {
    match value {
        Value::Number(n) => n
            .as_f64()
            .ok_or_else(|| HydrateError::Conversion(format!("'{n}' is not a float"))),
        Value::String(s) => s
            .parse::<f64>()
            .map_err(|_| HydrateError::Conversion(format!("'{s}' is not a float"))),
        other => Err(HydrateError::Conversion(format!(
            "cannot convert {} to float",
            kind_of(other)
        ))),
    }
}

fn to_string(value: &Value) -> Result<String, HydrateError> {
    match value {
        Value::String(s) => Ok(s.clone()),
        Value::Number(n) => Ok(n.to_string()),
        Value::Bool(b) => Ok(b.to_string()),
        other => Err(HydrateError::Conversion(format!(
            "cannot convert {} to string",
            kind_of(other)
        ))),
    }
}

fn to_date(value: &Value) -> Result<NaiveDateTime, HydrateError> {
    match value {
        Value::String(s) => parse_date_default(s),
        Value::Number(n) => n
            .as_i64()
            .and_then(|secs| DateTime::from_timestamp(secs, 0))
            .map(|dt| dt.naive_utc())
            .ok_or_else(|| HydrateError::Conversion(format!("'{n}' is not a timestamp"))),
        other => Err(HydrateError::Conversion(format!(
            "cannot convert {} to date",
            kind_of(other)
        ))),
    }
}

/// Default (implicit) date parsing: RFC 3339 first, then the common
/// unzoned layouts, then a bare date at midnight.
fn parse_date_default(s: &str) -> Result<NaiveDateTime, HydrateError> {
    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Ok(dt.naive_utc());
    }

    for format in ["%Y-%m-%dT%H:%M:%S", "%Y-%m-%d %H:%M:%S"] {
        if let Ok(dt) = NaiveDateTime::parse_from_str(s, format) {
            return Ok(dt);
        }
    }

    if let Ok(date) = NaiveDate::parse_from_str(s, "%Y-%m-%d") {
        if let Some(dt) = date.and_hms_opt(0, 0, 0) {
            return Ok(dt);
        }
    }

    Err(HydrateError::Conversion(format!("unparseable date '{s}'")))
}

/// Parses a date using an explicit format string, falling back to date-only
/// formats at midnight.
pub(crate) fn date_with_format(format: &str, value: &Value) -> Result<NaiveDateTime, HydrateError> {
    let Value::String(s) = value else {
        return Err(HydrateError::Conversion(format!(
            "cannot convert {} to date",
            kind_of(value)
        )));
    };

    if let Ok(dt) = NaiveDateTime::parse_from_str(s, format) {
        return Ok(dt);
    }

    NaiveDate::parse_from_str(s, format)
        .ok()
        .and_then(|date| date.and_hms_opt(0, 0, 0))
        .ok_or_else(|| {
            HydrateError::Conversion(format!("'{s}' does not match date format '{format}'"))
        })
}

fn kind_of(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "bool",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn native_as<T: 'static + Clone>(kind: NativeKind, value: &Value) -> T {
        native(kind, value)
            .unwrap()
            .downcast_ref::<T>()
            .unwrap()
            .clone()
    }

    #[test]
    fn test_int_casts() {
        assert_eq!(native_as::<i64>(NativeKind::Int, &json!(42)), 42);
        assert_eq!(native_as::<i64>(NativeKind::Int, &json!("42")), 42);
        assert_eq!(native_as::<i64>(NativeKind::Int, &json!("42.9")), 42);
        assert_eq!(native_as::<i64>(NativeKind::Int, &json!(true)), 1);
        assert!(matches!(
            native(NativeKind::Int, &json!("forty-two")),
            Err(HydrateError::Conversion(_))
        ));
    }

    #[test]
    fn test_float_is_coerced_explicitly() {
        assert_eq!(native_as::<f64>(NativeKind::Float, &json!(1.5)), 1.5);
        assert_eq!(native_as::<f64>(NativeKind::Float, &json!(3)), 3.0);
        assert_eq!(native_as::<f64>(NativeKind::Float, &json!("2.5")), 2.5);
    }

    #[test]
    fn test_string_casts() {
        assert_eq!(native_as::<String>(NativeKind::Str, &json!("a")), "a");
        assert_eq!(native_as::<String>(NativeKind::Str, &json!(7)), "7");
        assert_eq!(native_as::<String>(NativeKind::Str, &json!(true)), "true");
        assert!(matches!(
            native(NativeKind::Str, &json!([1])),
            Err(HydrateError::Conversion(_))
        ));
    }

    #[test]
    fn test_bool_truthiness() {
        assert!(native_as::<bool>(NativeKind::Bool, &json!(1)));
        assert!(native_as::<bool>(NativeKind::Bool, &json!("yes")));
        assert!(!native_as::<bool>(NativeKind::Bool, &json!("0")));
    }

    #[test]
    fn test_array_passthrough_and_mismatch() {
        let value = json!([1, 2, 3]);
        assert_eq!(native_as::<Value>(NativeKind::Array, &value), value);

        let err = native(NativeKind::Array, &json!("scalar")).unwrap_err();
        assert!(matches!(
            err,
            HydrateError::Conversion(ref msg) if msg == "value is not array"
        ));
    }

    #[test]
    fn test_date_default_parsing() {
        let expected = NaiveDate::from_ymd_opt(2024, 1, 15)
            .unwrap()
            .and_hms_opt(10, 30, 0)
            .unwrap();

        assert_eq!(
            native_as::<NaiveDateTime>(NativeKind::Date, &json!("2024-01-15T10:30:00Z")),
            expected
        );
        assert_eq!(
            native_as::<NaiveDateTime>(NativeKind::Date, &json!("2024-01-15 10:30:00")),
            expected
        );
        assert_eq!(
            native_as::<NaiveDateTime>(NativeKind::Date, &json!("2024-01-15")),
            expected.date().and_hms_opt(0, 0, 0).unwrap()
        );
        assert!(matches!(
            native(NativeKind::Date, &json!("not a date")),
            Err(HydrateError::Conversion(_))
        ));
    }

    #[test]
    fn test_date_from_timestamp() {
        let dt = native_as::<NaiveDateTime>(NativeKind::Date, &json!(86_400));
        assert_eq!(
            dt,
            NaiveDate::from_ymd_opt(1970, 1, 2)
                .unwrap()
                .and_hms_opt(0, 0, 0)
                .unwrap()
        );
    }

    #[test]
    fn test_date_with_explicit_format() {
        let dt = date_with_format("%d/%m/%Y", &json!("15/01/2024")).unwrap();
        assert_eq!(dt.date(), NaiveDate::from_ymd_opt(2024, 1, 15).unwrap());

        assert!(matches!(
            date_with_format("%d/%m/%Y", &json!("2024-01-15")),
            Err(HydrateError::Conversion(_))
        ));
    }

    #[test]
    fn test_empty_value_check() {
        for value in [json!(null), json!(false), json!(0), json!(0.0), json!(""), json!("0"), json!([]), json!({})] {
            assert!(is_empty_value(&value), "{value} should be empty");
        }
        for value in [json!(true), json!(1), json!("x"), json!([0]), json!({"a": 1})] {
            assert!(!is_empty_value(&value), "{value} should not be empty");
        }
    }

    #[test]
    fn test_raw_value_unwraps_scalars() {
        assert_eq!(*raw_value(&json!(0)).downcast_ref::<i64>().unwrap(), 0);
        assert_eq!(*raw_value(&json!(0.5)).downcast_ref::<f64>().unwrap(), 0.5);
        assert!(!raw_value(&json!(false)).downcast_ref::<bool>().unwrap());
        assert_eq!(raw_value(&json!("")).downcast_ref::<String>().unwrap(), "");
        assert!(raw_value(&json!([])).downcast_ref::<Value>().is_some());
    }
}
