//! Pure payload/query transformations shared by the request layer.

use serde_json::{Map, Value};

/// Flatten a JSON object into query pairs the gateway's parameter parser
/// understands. One level deep: a top-level field whose value is itself an
/// object contributes one `outer[inner]` pair per inner key; scalar fields
/// pass through unchanged.
pub(crate) fn flatten_params(params: &Value) -> Vec<(String, String)> {
    let mut query = Vec::new();

    let Some(object) = params.as_object() else {
        return query;
    };

    for (key, value) in object {
        match value {
            Value::Object(inner) => {
                for (prop, item) in inner {
                    query.push((format!("{key}[{prop}]"), scalar_to_string(item)));
                }
            }
            other => query.push((key.clone(), scalar_to_string(other))),
        }
    }

    query
}

/// Merge caller-supplied overrides into a computed default payload.
/// A caller-supplied field always wins over the default.
pub(crate) fn merge_overrides(base: &mut Map<String, Value>, overrides: Option<Value>) {
    if let Some(Value::Object(fields)) = overrides {
        for (key, value) in fields {
            base.insert(key, value);
        }
    }
}

fn scalar_to_string(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn flattens_nested_objects_one_level_deep() {
        let params = json!({
            "filters": { "CODE": "001", "ACTIVE": 1 },
            "plain": "x",
            "count": 5,
        });

        let mut query = flatten_params(&params);
        query.sort();

        assert_eq!(
            query,
            vec![
                ("count".to_string(), "5".to_string()),
                ("filters[ACTIVE]".to_string(), "1".to_string()),
                ("filters[CODE]".to_string(), "001".to_string()),
                ("plain".to_string(), "x".to_string()),
            ]
        );
    }

    #[test]
    fn flatten_of_non_object_is_empty() {
        assert!(flatten_params(&json!(null)).is_empty());
        assert!(flatten_params(&json!([1, 2])).is_empty());
    }

    #[test]
    fn caller_overrides_win_over_defaults() {
        let mut base = json!({ "service": "login", "username": "demo" })
            .as_object()
            .cloned()
            .unwrap();

        merge_overrides(&mut base, Some(json!({ "username": "other", "extra": 1 })));

        assert_eq!(base["service"], "login");
        assert_eq!(base["username"], "other");
        assert_eq!(base["extra"], 1);
    }

    #[test]
    fn merge_with_no_overrides_is_identity() {
        let mut base = json!({ "a": 1 }).as_object().cloned().unwrap();
        merge_overrides(&mut base, None);
        assert_eq!(base.len(), 1);
        assert_eq!(base["a"], 1);
    }
}
