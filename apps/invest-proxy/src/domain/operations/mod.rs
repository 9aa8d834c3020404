//! Operations Post-processing
//!
//! The statistics consumer can ask for broker commission entries to be
//! dropped from an operations list to cut traffic. The rest of the document
//! is kept as-is, including field order.

use serde_json::Value;

/// `operationType` of the entries removed by [`strip_commission_operations`].
pub const COMMISSION_OPERATION_TYPE: &str = "BrokerCommission";

/// Remove commission entries from a raw upstream operations response.
///
/// # Errors
///
/// Returns the parse error when `body` is not JSON.
pub fn strip_commissions(body: &[u8]) -> Result<Vec<u8>, serde_json::Error> {
    let mut document: Value = serde_json::from_slice(body)?;
    let removed = strip_commission_operations(&mut document);
    tracing::debug!(removed, "Commission operations removed");
    serde_json::to_vec(&document)
}

/// Remove commission entries from `payload.operations` in place.
///
/// Documents without a non-empty `payload` are left untouched. A payload
/// with no `operations` list gets an empty one. Returns the number of
/// entries removed.
pub fn strip_commission_operations(document: &mut Value) -> usize {
    let Some(payload) = document.get_mut("payload") else {
        return 0;
    };
    if is_empty_value(payload) {
        return 0;
    }
    let Some(payload) = payload.as_object_mut() else {
        return 0;
    };

    match payload.get_mut("operations") {
        Some(Value::Array(operations)) => {
            let before = operations.len();
            operations.retain(|op| !is_commission(op));
            before - operations.len()
        }
        None | Some(Value::Null) => {
            payload.insert("operations".to_string(), Value::Array(Vec::new()));
            0
        }
        Some(_) => 0,
    }
}

fn is_commission(operation: &Value) -> bool {
    operation.get("operationType").and_then(Value::as_str) == Some(COMMISSION_OPERATION_TYPE)
}

/// `null`, `false`, zero, `""`, `"0"`, `[]` and `{}` all count as empty.
fn is_empty_value(value: &Value) -> bool {
    match value {
        Value::Null => true,
        Value::Bool(b) => !b,
        Value::Number(n) => n.as_f64() == Some(0.0),
        Value::String(s) => s.is_empty() || s == "0",
        Value::Array(a) => a.is_empty(),
        Value::Object(o) => o.is_empty(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn operations(document: &Value) -> Vec<&str> {
        document["payload"]["operations"]
            .as_array()
            .unwrap()
            .iter()
            .map(|op| op["id"].as_str().unwrap())
            .collect()
    }

    #[test]
    fn removes_commissions_and_keeps_order() {
        let mut document = json!({
            "trackingId": "abc",
            "payload": {
                "operations": [
                    {"id": "1", "operationType": "Buy"},
                    {"id": "2", "operationType": "BrokerCommission"},
                    {"id": "3", "operationType": "Dividend"}
                ]
            },
            "status": "Ok"
        });

        let removed = strip_commission_operations(&mut document);

        assert_eq!(removed, 1);
        assert_eq!(operations(&document), vec!["1", "3"]);
    }

    #[test]
    fn removes_every_commission() {
        let mut document = json!({
            "payload": {"operations": [
                {"id": "1", "operationType": "BrokerCommission"},
                {"id": "2", "operationType": "BrokerCommission"},
                {"id": "3", "operationType": "Sell"},
                {"id": "4", "operationType": "BrokerCommission"}
            ]}
        });

        assert_eq!(strip_commission_operations(&mut document), 3);
        assert_eq!(operations(&document), vec!["3"]);
    }

    #[test]
    fn inserts_empty_operations_when_missing() {
        let mut document = json!({"payload": {"other": 1}});
        assert_eq!(strip_commission_operations(&mut document), 0);
        assert_eq!(document["payload"]["operations"], json!([]));
    }

    #[test]
    fn leaves_documents_with_empty_payload_alone() {
        let mut document = json!({"payload": {}, "status": "Error"});
        let before = document.clone();
        assert_eq!(strip_commission_operations(&mut document), 0);
        assert_eq!(document, before);

        let mut document = json!({"status": "Error"});
        let before = document.clone();
        strip_commission_operations(&mut document);
        assert_eq!(document, before);
    }

    #[test]
    fn byte_level_strip_preserves_field_order() {
        let body = br#"{"trackingId":"t","payload":{"operations":[{"operationType":"BrokerCommission","id":"x"},{"operationType":"Buy","id":"y"}]},"status":"Ok"}"#;

        let cleaned = strip_commissions(body).unwrap();

        assert_eq!(
            String::from_utf8(cleaned).unwrap(),
            r#"{"trackingId":"t","payload":{"operations":[{"operationType":"Buy","id":"y"}]},"status":"Ok"}"#
        );
    }

    #[test]
    fn rejects_non_json_bodies() {
        assert!(strip_commissions(b"<html>Bad Gateway</html>").is_err());
    }
}
