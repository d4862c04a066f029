//! Field-name normalization for backend payloads
//!
//! Older backend records mix `snake_case` and `camelCase` keys, use Mongo's
//! `_id`, and some phase records store `start`/`end` instead of
//! `fechaInicio`/`fechaFin`. Everything is rewritten to the camelCase names
//! the domain types deserialize from, once, before deserialization.

use serde_json::{Map, Value};

/// `fecha_inicio` → `fechaInicio`; keys without inner underscores are unchanged
pub fn camel_case(key: &str) -> String {
    if !key.contains('_') || key.starts_with('_') {
        return key.to_string();
    }
    let mut out = String::with_capacity(key.len());
    let mut upper = false;
    for c in key.chars() {
        if c == '_' {
            upper = !out.is_empty();
        } else if upper {
            out.extend(c.to_uppercase());
            upper = false;
        } else {
            out.push(c);
        }
    }
    out
}

fn canonical_key(key: &str) -> String {
    match key {
        "_id" => "id".to_string(),
        "start" => "fechaInicio".to_string(),
        "end" => "fechaFin".to_string(),
        other => camel_case(other),
    }
}

fn is_id_key(key: &str) -> bool {
    key == "id" || key.ends_with("Id")
}

fn normalize_object(map: Map<String, Value>) -> Map<String, Value> {
    let mut out = Map::with_capacity(map.len());
    // Keys already in canonical form win over aliases
    let (canonical, aliased): (Vec<_>, Vec<_>) = map
        .into_iter()
        .partition(|(key, _)| canonical_key(key) == *key);

    for (key, value) in canonical.into_iter().chain(aliased) {
        let key = canonical_key(&key);
        if out.contains_key(&key) {
            continue;
        }
        let value = match value {
            Value::Number(n) if is_id_key(&key) => Value::String(n.to_string()),
            other => normalize(other),
        };
        out.insert(key, value);
    }
    out
}

/// Recursively rewrite keys to their canonical names
///
/// Numeric ids are turned into strings.
pub fn normalize(value: Value) -> Value {
    match value {
        Value::Object(map) => Value::Object(normalize_object(map)),
        Value::Array(items) => Value::Array(items.into_iter().map(normalize).collect()),
        other => other,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_camel_case() {
        assert_eq!(camel_case("fecha_inicio"), "fechaInicio");
        assert_eq!(camel_case("fecha_preparacion_qa"), "fechaPreparacionQa");
        assert_eq!(camel_case("fechaInicio"), "fechaInicio");
        assert_eq!(camel_case("__v"), "__v");
    }

    #[test]
    fn test_nested_keys_and_ids() {
        let raw = json!({
            "_id": "abc",
            "project_id": 42,
            "fases": {
                "planning": { "fecha_inicio": "2025-01-01", "start": "2024-01-01" },
                "refinement": { "revisiones": [ { "fecha_completado": "2025-02-01" } ] }
            }
        });
        let value = normalize(raw);
        assert_eq!(value["id"], "abc");
        assert_eq!(value["projectId"], "42");
        assert_eq!(value["fases"]["planning"]["fechaInicio"], "2025-01-01");
        assert_eq!(
            value["fases"]["refinement"]["revisiones"][0]["fechaCompletado"],
            "2025-02-01"
        );
    }

    #[test]
    fn test_canonical_key_wins() {
        let value = normalize(json!({ "id": "real", "_id": "mongo" }));
        assert_eq!(value["id"], "real");
    }
}
