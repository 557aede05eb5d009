//! Typed field extraction from command payloads.
//!
//! Payloads arrive as untyped JSON mappings; these helpers pull out one
//! field of the expected type, returning `None` on absence or type
//! mismatch so handlers can attach their own required-field messages.

use serde_json::{Map, Value};

/// A string field.
pub(crate) fn str_field<'a>(data: &'a Map<String, Value>, key: &str) -> Option<&'a str> {
    data.get(key).and_then(Value::as_str)
}

/// A numeric field, accepting any JSON number.
pub(crate) fn f64_field(data: &Map<String, Value>, key: &str) -> Option<f64> {
    data.get(key).and_then(Value::as_f64)
}

/// A boolean field.
pub(crate) fn bool_field(data: &Map<String, Value>, key: &str) -> Option<bool> {
    data.get(key).and_then(Value::as_bool)
}

/// A non-negative integer field narrowed to `usize`.
pub(crate) fn usize_field(data: &Map<String, Value>, key: &str) -> Option<usize> {
    data.get(key)
        .and_then(Value::as_u64)
        .and_then(|n| usize::try_from(n).ok())
}

/// A non-negative integer field narrowed to `u32`.
pub(crate) fn u32_field(data: &Map<String, Value>, key: &str) -> Option<u32> {
    data.get(key)
        .and_then(Value::as_u64)
        .and_then(|n| u32::try_from(n).ok())
}

/// An array field.
pub(crate) fn array_field<'a>(data: &'a Map<String, Value>, key: &str) -> Option<&'a Vec<Value>> {
    data.get(key).and_then(Value::as_array)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn data() -> Map<String, Value> {
        serde_json::from_str(r#"{"name":"Mouth","value":0.5,"on":true,"index":3}"#).unwrap()
    }

    #[test]
    fn extracts_present_fields() {
        let data = data();
        assert_eq!(str_field(&data, "name"), Some("Mouth"));
        assert_eq!(f64_field(&data, "value"), Some(0.5));
        assert_eq!(bool_field(&data, "on"), Some(true));
        assert_eq!(usize_field(&data, "index"), Some(3));
        assert_eq!(u32_field(&data, "index"), Some(3));
    }

    #[test]
    fn type_mismatch_is_none() {
        let data = data();
        assert_eq!(str_field(&data, "value"), None);
        assert_eq!(f64_field(&data, "name"), None);
        assert_eq!(usize_field(&data, "value"), None);
        assert_eq!(bool_field(&data, "missing"), None);
    }
}
