// src/utils/serializer.rs
use indexmap::IndexMap;
use serde::ser::{Serialize, SerializeMap, Serializer};
use serde_json::{json, Value};
use uuid::Uuid;

pub struct OrderedValue(IndexMap<String, Value>);

impl OrderedValue {
    pub fn new() -> Self {
        OrderedValue(IndexMap::new())
    }

    pub fn insert(&mut self, key: &str, value: Value) {
        self.0.insert(key.to_string(), value);
    }
}

impl Default for OrderedValue {
    fn default() -> Self {
        Self::new()
    }
}

impl Serialize for OrderedValue {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        let mut map = serializer.serialize_map(Some(self.0.len()))?;
        for (k, v) in &self.0 {
            map.serialize_entry(k, v)?;
        }
        map.end()
    }
}

pub fn create_ordered_response(request_id: &str, data: Value) -> OrderedValue {
    let mut ordered = OrderedValue::new();
    ordered.insert("requestId", Value::String(request_id.to_string()));
    ordered.insert("success", Value::Bool(true));
    ordered.insert("data", data);
    ordered
}

/// Success envelope: `{ "requestId", "success": true, "data" }` with a fresh request id.
pub fn success_response(data: Value) -> Value {
    let request_id = Uuid::new_v4().to_string();
    serde_json::to_value(create_ordered_response(&request_id, data)).unwrap_or(Value::Null)
}

pub fn failure_response(message: impl Into<String>) -> Value {
    json!({
        "success": false,
        "message": message.into()
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn envelope_keeps_key_order() {
        let ordered = create_ordered_response("abc", json!({"human": "1"}));
        let text = serde_json::to_string(&ordered).unwrap();
        assert_eq!(text, r#"{"requestId":"abc","success":true,"data":{"human":"1"}}"#);
    }

    #[test]
    fn success_response_has_request_id() {
        let response = success_response(json!([]));
        let request_id = response["requestId"].as_str().unwrap();
        assert!(Uuid::parse_str(request_id).is_ok());
        assert_eq!(response["success"], json!(true));
    }

    #[test]
    fn failure_response_shape() {
        assert_eq!(failure_response("nope"), json!({"success": false, "message": "nope"}));
    }
}
