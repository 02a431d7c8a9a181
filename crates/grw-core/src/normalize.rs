//! Update normalization.
//!
//! The platform client hands over deeply nested objects full of boxed
//! scalars (`{value: ...}` / `{v: ...}`) and big-integer encodings. Every
//! update is flattened to plain JSON before any field is inspected.

use serde_json::{Map, Value};

/// Normalize one provider update into a plain, JSON-safe value.
///
/// Total by design: a field that cannot be converted keeps its string
/// form, because partial information beats a dropped event.
pub fn normalize_update(v: &Value) -> Value {
    match v {
        Value::Object(obj) => {
            if let Some(inner) = boxed_scalar(obj) {
                return coerce_decimal(normalize_update(inner));
            }
            let mut out = Map::with_capacity(obj.len());
            for (key, field) in obj {
                out.insert(key.clone(), normalize_update(field));
            }
            Value::Object(out)
        }
        Value::Array(items) => Value::Array(items.iter().map(normalize_update).collect()),
        other => other.clone(),
    }
}

/// A single-field `{value: X}` / `{v: X}` wrapper, as produced by the
/// provider's boxed-scalar and big-integer types.
fn boxed_scalar(obj: &Map<String, Value>) -> Option<&Value> {
    if obj.len() != 1 {
        return None;
    }
    obj.get("value").or_else(|| obj.get("v"))
}

/// Decimal strings inside a wrapper are integer encodings; values too
/// large for i64 keep their string representation.
fn coerce_decimal(v: Value) -> Value {
    let Value::String(s) = &v else {
        return v;
    };
    if s.is_empty() || !s.chars().all(|c| c.is_ascii_digit()) {
        return v;
    }
    match s.parse::<i64>() {
        Ok(n) => Value::from(n),
        Err(_) => v,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn unwraps_boxed_decimal_strings_to_numbers() {
        let v = json!({ "id": { "value": "123" } });
        assert_eq!(normalize_update(&v), json!({ "id": 123 }));

        let v = json!({ "id": { "v": "456" } });
        assert_eq!(normalize_update(&v), json!({ "id": 456 }));
    }

    #[test]
    fn unwraps_nested_wrappers_recursively() {
        let v = json!({ "id": { "value": { "v": "9" } } });
        assert_eq!(normalize_update(&v), json!({ "id": 9 }));
    }

    #[test]
    fn oversized_decimal_strings_stay_strings() {
        let v = json!({ "id": { "value": "99999999999999999999999999" } });
        assert_eq!(
            normalize_update(&v),
            json!({ "id": "99999999999999999999999999" })
        );
    }

    #[test]
    fn plain_scalars_and_arrays_pass_through() {
        let v = json!({
            "text": "hello",
            "flag": true,
            "n": 7,
            "items": [{ "value": "1" }, "two", null]
        });
        assert_eq!(
            normalize_update(&v),
            json!({
                "text": "hello",
                "flag": true,
                "n": 7,
                "items": [1, "two", null]
            })
        );
    }

    #[test]
    fn multi_field_objects_are_not_unwrapped() {
        let v = json!({ "value": "1", "other": 2 });
        assert_eq!(normalize_update(&v), json!({ "value": "1", "other": 2 }));
    }

    #[test]
    fn non_decimal_wrapper_contents_survive() {
        let v = json!({ "slug": { "value": "AstralShard-777" } });
        assert_eq!(normalize_update(&v), json!({ "slug": "AstralShard-777" }));
    }
}
