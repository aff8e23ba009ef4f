//! Structural validation of untrusted search responses.
//!
//! The service payload is checked field by field before any typed value is
//! built. A single malformed source rejects the whole response.

use serde_json::{Map, Value};

use crate::error::{RagError, RagResult};
use crate::types::{Citation, IdKind, MsgId, SearchResponse};

/// Parse a raw response body and validate it.
///
/// An unparsable body is treated like a transport failure (a gateway error
/// page, a truncated read) and is retryable; only a parsed payload with the
/// wrong shape is a `Validation` error.
pub fn parse_response(body: &str, id_kind: IdKind) -> RagResult<SearchResponse> {
    let value: Value = serde_json::from_str(body)
        .map_err(|e| RagError::transport(format!("response body is not valid JSON ({})", e)))?;
    validate_response(value, id_kind)
}

/// Validate a decoded JSON payload and convert it into a `SearchResponse`.
pub fn validate_response(value: Value, id_kind: IdKind) -> RagResult<SearchResponse> {
    let Value::Object(mut payload) = value else {
        return Err(RagError::Validation(
            "Invalid response format: expected object".to_string(),
        ));
    };

    let llm_answer = match payload.remove("llm_answer") {
        Some(Value::String(answer)) => answer,
        _ => {
            return Err(RagError::Validation(
                "Invalid response: missing or invalid llm_answer".to_string(),
            ))
        }
    };

    let raw_sources = match payload.remove("sources") {
        Some(Value::Array(items)) => items,
        _ => {
            return Err(RagError::Validation(
                "Invalid response: sources must be an array".to_string(),
            ))
        }
    };

    let sources = raw_sources
        .into_iter()
        .enumerate()
        .map(|(index, item)| validate_source(index, item, id_kind))
        .collect::<RagResult<Vec<_>>>()?;

    Ok(SearchResponse { llm_answer, sources })
}

fn validate_source(index: usize, item: Value, id_kind: IdKind) -> RagResult<Citation> {
    let invalid = |what: &str| {
        RagError::Validation(format!(
            "Invalid source format at index {}: {}",
            index, what
        ))
    };

    let Value::Object(mut source) = item else {
        return Err(invalid("expected object"));
    };

    let msg_id = source
        .remove("msg_id")
        .and_then(|v| to_msg_id(v, id_kind))
        .ok_or_else(|| invalid("missing or invalid msg_id"))?;

    let user_name = take_string(&mut source, "user_name")
        .ok_or_else(|| invalid("missing or invalid user_name"))?;
    let msg_date = take_string(&mut source, "msg_date")
        .ok_or_else(|| invalid("missing or invalid msg_date"))?;
    let msg_text = take_string(&mut source, "msg_text")
        .ok_or_else(|| invalid("missing or invalid msg_text"))?;

    let reply_to_msg_id = match source.remove("reply_to_msg_id") {
        None | Some(Value::Null) => None,
        Some(v) => Some(to_msg_id(v, id_kind).ok_or_else(|| {
            invalid(&format!(
                "invalid reply_to_msg_id (expected {} or null)",
                id_kind.as_str()
            ))
        })?),
    };

    Ok(Citation {
        msg_id,
        user_name,
        msg_date,
        msg_text,
        reply_to_msg_id,
    })
}

fn take_string(source: &mut Map<String, Value>, field: &str) -> Option<String> {
    match source.remove(field) {
        Some(Value::String(s)) => Some(s),
        _ => None,
    }
}

/// Accept only the configured identifier representation.
fn to_msg_id(value: Value, id_kind: IdKind) -> Option<MsgId> {
    match (id_kind, value) {
        (IdKind::Text, Value::String(s)) => Some(MsgId::Text(s)),
        (IdKind::Integer, Value::Number(n)) => n.as_i64().map(MsgId::Integer),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn source(id: Value) -> Value {
        json!({
            "msg_id": id,
            "user_name": "user1",
            "msg_date": "2025-01-01",
            "msg_text": "Source text",
        })
    }

    fn expect_validation(value: Value, id_kind: IdKind) -> String {
        match validate_response(value, id_kind) {
            Err(RagError::Validation(message)) => message,
            other => panic!("expected validation error, got {:?}", other),
        }
    }

    #[test]
    fn test_valid_response_round_trips() {
        let payload = json!({
            "llm_answer": "This is the answer",
            "sources": [
                source(json!("1")),
                {
                    "msg_id": "2",
                    "reply_to_msg_id": "1",
                    "user_name": "user2",
                    "msg_date": "2025-01-02T10:00:00Z",
                    "msg_text": "Reply"
                }
            ]
        });

        let response = validate_response(payload, IdKind::Text).unwrap();
        assert_eq!(response.llm_answer, "This is the answer");
        assert_eq!(response.sources.len(), 2);
        assert_eq!(response.sources[0].msg_id, MsgId::Text("1".into()));
        assert_eq!(response.sources[0].reply_to_msg_id, None);
        assert_eq!(
            response.sources[1].reply_to_msg_id,
            Some(MsgId::Text("1".into()))
        );
    }

    #[test]
    fn test_empty_sources_allowed() {
        let response =
            validate_response(json!({"llm_answer": "", "sources": []}), IdKind::Text).unwrap();
        assert!(response.sources.is_empty());
    }

    #[test]
    fn test_extra_fields_ignored() {
        let mut item = source(json!(5));
        item["score"] = json!(0.9);
        let payload = json!({"llm_answer": "a", "sources": [item], "took_ms": 12});
        assert!(validate_response(payload, IdKind::Integer).is_ok());
    }

    #[test]
    fn test_top_level_shapes_rejected() {
        for payload in [json!(null), json!("string"), json!(123), json!([])] {
            let message = expect_validation(payload, IdKind::Text);
            assert!(message.contains("expected object"));
        }

        let message = expect_validation(json!({"sources": []}), IdKind::Text);
        assert!(message.contains("llm_answer"));

        let message = expect_validation(json!({"llm_answer": 123, "sources": []}), IdKind::Text);
        assert!(message.contains("llm_answer"));

        let message = expect_validation(json!({"llm_answer": "a"}), IdKind::Text);
        assert!(message.contains("sources must be an array"));

        let message =
            expect_validation(json!({"llm_answer": "a", "sources": "nope"}), IdKind::Text);
        assert!(message.contains("sources must be an array"));
    }

    #[test]
    fn test_bad_source_reports_index_and_field() {
        let payload = json!({
            "llm_answer": "a",
            "sources": [source(json!("1")), source(json!("2")), source(json!(3))]
        });
        let message = expect_validation(payload, IdKind::Text);
        assert_eq!(
            message,
            "Invalid source format at index 2: missing or invalid msg_id"
        );
    }

    #[test]
    fn test_missing_text_field() {
        let mut item = source(json!("1"));
        item.as_object_mut().unwrap().remove("msg_text");
        let message = expect_validation(json!({"llm_answer": "a", "sources": [item]}), IdKind::Text);
        assert_eq!(
            message,
            "Invalid source format at index 0: missing or invalid msg_text"
        );

        let message = expect_validation(
            json!({"llm_answer": "a", "sources": [{"invalid": "source"}]}),
            IdKind::Text,
        );
        assert!(message.contains("index 0"));

        let message = expect_validation(json!({"llm_answer": "a", "sources": [null]}), IdKind::Text);
        assert!(message.contains("expected object"));
    }

    #[test]
    fn test_reply_must_match_id_kind() {
        let mut item = source(json!(10));
        item["reply_to_msg_id"] = json!("9");
        let message =
            expect_validation(json!({"llm_answer": "a", "sources": [item]}), IdKind::Integer);
        assert!(message.contains("reply_to_msg_id"));
        assert!(message.contains("integer"));

        let mut item = source(json!(10));
        item["reply_to_msg_id"] = json!(null);
        assert!(
            validate_response(json!({"llm_answer": "a", "sources": [item]}), IdKind::Integer)
                .is_ok()
        );
    }

    #[test]
    fn test_integer_ids_reject_floats() {
        let payload = json!({"llm_answer": "a", "sources": [source(json!(1.5))]});
        let message = expect_validation(payload, IdKind::Integer);
        assert!(message.contains("msg_id"));
    }

    #[test]
    fn test_non_json_body_is_retryable_network_error() {
        let err = parse_response("<html>oops</html>", IdKind::Text).unwrap_err();
        assert!(err.is_retryable());
        assert!(matches!(err, RagError::Network { status: None, .. }));
        assert!(err.to_string().contains("not valid JSON"));
    }

    #[test]
    fn test_mixed_id_kinds_rejected_under_text() {
        let payload = json!({
            "llm_answer": "a",
            "sources": [
                source(json!("1")),
                {
                    "msg_id": "2",
                    "reply_to_msg_id": 1,
                    "user_name": "user2",
                    "msg_date": "2025-01-02",
                    "msg_text": "Reply"
                }
            ]
        });
        let message = expect_validation(payload, IdKind::Text);
        assert_eq!(
            message,
            "Invalid source format at index 1: invalid reply_to_msg_id (expected string or null)"
        );
    }
}
