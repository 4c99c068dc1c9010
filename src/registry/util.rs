use serde_json::{Map, Value};

/// String field of a JSON object; anything that is not a string reads as empty.
pub(super) fn str_field(data: &Value, key: &str) -> String {
    data.get(key)
        .and_then(Value::as_str)
        .unwrap_or_default()
        .to_string()
}

pub(super) fn object_field(data: &Value, key: &str) -> Map<String, Value> {
    data.get(key)
        .and_then(Value::as_object)
        .cloned()
        .unwrap_or_default()
}

pub(super) fn array_field<'a>(data: &'a Value, key: &str) -> &'a [Value] {
    data.get(key)
        .and_then(Value::as_array)
        .map(Vec::as_slice)
        .unwrap_or_default()
}

pub(super) fn truncate_chars(text: &str, max_chars: usize) -> String {
    if max_chars == 0 {
        return String::new();
    }
    let count = text.chars().count();
    if count <= max_chars {
        return text.to_string();
    }
    let mut out: String = text.chars().take(max_chars.saturating_sub(1)).collect();
    out.push('…');
    out
}

#[cfg(test)]
mod tests {
    use super::{array_field, object_field, str_field, truncate_chars};
    use serde_json::json;

    #[test]
    fn fields_default_on_wrong_types() {
        let data = json!({ "name": 7, "meta": "x", "items": {} });
        assert_eq!(str_field(&data, "name"), "");
        assert!(object_field(&data, "meta").is_empty());
        assert!(array_field(&data, "items").is_empty());
    }

    #[test]
    fn fields_default_on_null_input() {
        assert_eq!(str_field(&json!(null), "name"), "");
        assert!(array_field(&json!(null), "items").is_empty());
    }

    #[test]
    fn truncate_marks_cut() {
        assert_eq!(truncate_chars("abcdef", 4), "abc…");
        assert_eq!(truncate_chars("abc", 4), "abc");
    }
}
