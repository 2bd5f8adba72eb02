use serde_json::Value;

use crate::error::{CoreError, Result};

/// Normalize a platform response into its data payload.
///
/// Depending on the transport the success envelope arrives either directly
/// (`{"message": "Success", "data": ...}`) or wrapped one level deeper
/// (`{"message": {"message": "Success", "data": ...}}`). Failures carry an
/// `error` string at the same depth. This is the only place in the crate that
/// looks at raw envelopes; everything downstream sees a typed result.
pub fn unwrap_envelope(method: &'static str, body: Value) -> Result<Value> {
    let envelope = match body {
        Value::Object(mut map) if map.get("message").is_some_and(Value::is_object) => {
            map.remove("message").unwrap_or(Value::Null)
        }
        other => other,
    };

    if let Some(reason) = envelope.get("error").and_then(Value::as_str) {
        return Err(CoreError::Api {
            method,
            reason: reason.to_string(),
        });
    }

    match envelope.get("message").and_then(Value::as_str) {
        Some("Success") => Ok(envelope.get("data").cloned().unwrap_or(Value::Null)),
        Some(status) => Err(CoreError::Api {
            method,
            reason: format!("unexpected status {status:?}"),
        }),
        None => Err(CoreError::Envelope {
            method,
            reason: "neither a success marker nor an error field".to_string(),
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    const METHOD: &str = "test.method";

    #[test]
    fn direct_success_yields_data() {
        let body = json!({"message": "Success", "data": {"comments": []}});
        let data = unwrap_envelope(METHOD, body).unwrap();
        assert_eq!(data, json!({"comments": []}));
    }

    #[test]
    fn double_wrapped_success_yields_data() {
        let body = json!({"message": {"message": "Success", "data": {"comments": []}}});
        let data = unwrap_envelope(METHOD, body).unwrap();
        assert_eq!(data, json!({"comments": []}));
    }

    #[test]
    fn success_without_data_yields_null() {
        let body = json!({"message": "Success"});
        assert_eq!(unwrap_envelope(METHOD, body).unwrap(), Value::Null);
    }

    #[test]
    fn direct_error_surfaces_reason() {
        let body = json!({"error": "User is not registered as a doctor"});
        let err = unwrap_envelope(METHOD, body).unwrap_err();
        assert!(err.to_string().contains("not registered as a doctor"));
    }

    #[test]
    fn wrapped_error_surfaces_reason() {
        let body = json!({"message": {"message": "Error", "error": "Session not found"}});
        let err = unwrap_envelope(METHOD, body).unwrap_err();
        assert!(err.to_string().contains("Session not found"));
    }

    #[test]
    fn non_success_status_is_an_error() {
        let body = json!({"message": "Error"});
        assert!(matches!(
            unwrap_envelope(METHOD, body),
            Err(CoreError::Api { .. })
        ));
    }

    #[test]
    fn unrecognized_shape_is_an_envelope_error() {
        let body = json!({"unexpected": true});
        assert!(matches!(
            unwrap_envelope(METHOD, body),
            Err(CoreError::Envelope { .. })
        ));
    }
}
