//! Decoding of the service's JSON response envelope.
//!
//! Every endpoint answers with `{"stat": "OK", "response": ...}` on success
//! or `{"stat": "FAIL", "message": ..., "message_detail": ...}` on failure,
//! independent of the HTTP status. The envelope is modeled as a tagged enum;
//! anything that does not decode into it is a protocol error.

use crate::api::{ApiResponse, Error};
use reqwest::StatusCode;
use serde::Deserialize;
use serde_json::Value;

#[derive(Debug, Deserialize)]
#[serde(tag = "stat")]
enum Envelope {
    #[serde(rename = "OK")]
    Ok { response: Value },
    #[serde(rename = "FAIL")]
    Fail {
        message: Option<String>,
        message_detail: Option<String>,
    },
}

/// Extract the success payload from an API exchange.
///
/// # Errors
/// Returns `Error::Protocol` for any non-200 status, and for 200 responses
/// whose body is not a well-formed `OK` envelope. Malformed JSON never
/// panics; it is converted into the same protocol error path.
pub fn parse_response(response: &ApiResponse) -> Result<Value, Error> {
    if response.status != StatusCode::OK {
        // Decode the failure envelope for a better message when possible,
        // but a non-200 status is a protocol error no matter what.
        let message = match serde_json::from_slice::<Envelope>(&response.body) {
            Ok(Envelope::Fail {
                message: Some(message),
                message_detail: Some(detail),
            }) => format!("{message} ({detail})"),
            Ok(Envelope::Fail {
                message: Some(message),
                ..
            }) => message,
            _ => response.reason.clone(),
        };
        return Err(protocol_error(response, message));
    }

    match serde_json::from_slice::<Envelope>(&response.body) {
        Ok(Envelope::Ok { response: payload }) => Ok(payload),
        Ok(Envelope::Fail { message, .. }) => Err(protocol_error(
            response,
            format!(
                "error response: {}",
                message.unwrap_or_else(|| "unknown".to_string())
            ),
        )),
        Err(e) => Err(protocol_error(response, format!("bad response: {e}"))),
    }
}

fn protocol_error(response: &ApiResponse, message: String) -> Error {
    Error::Protocol {
        status: response.status.as_u16(),
        reason: response.reason.clone(),
        message,
        body: response.body.clone(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bytes::Bytes;
    use serde_json::json;

    fn response(status: StatusCode, body: &str) -> ApiResponse {
        ApiResponse {
            status,
            reason: status.canonical_reason().unwrap_or_default().to_string(),
            body: Bytes::copy_from_slice(body.as_bytes()),
        }
    }

    #[test]
    fn success_envelope_round_trips() {
        let payload = parse_response(&response(
            StatusCode::OK,
            r#"{"stat": "OK", "response": {"result": "allow", "status": "ok"}}"#,
        ))
        .expect("envelope should parse");
        assert_eq!(payload, json!({"result": "allow", "status": "ok"}));
    }

    #[test]
    fn ok_with_fail_stat_is_a_protocol_error() {
        let err = parse_response(&response(
            StatusCode::OK,
            r#"{"stat": "FAIL", "message": "Invalid integration key"}"#,
        ))
        .expect_err("FAIL stat should error");
        match err {
            Error::Protocol {
                status, message, ..
            } => {
                assert_eq!(status, 200);
                assert!(message.contains("Invalid integration key"));
            }
            other => panic!("expected protocol error, got {other:?}"),
        }
    }

    #[test]
    fn ok_with_missing_response_field_is_a_protocol_error() {
        let err = parse_response(&response(StatusCode::OK, r#"{"stat": "OK"}"#))
            .expect_err("missing response field should error");
        assert!(err.is_protocol());
    }

    #[test]
    fn ok_with_unknown_stat_is_a_protocol_error() {
        let err = parse_response(&response(
            StatusCode::OK,
            r#"{"stat": "MAYBE", "response": {}}"#,
        ))
        .expect_err("unknown stat should error");
        assert!(err.is_protocol());
    }

    #[test]
    fn malformed_json_is_a_protocol_error() {
        let err = parse_response(&response(StatusCode::OK, "not json at all"))
            .expect_err("malformed body should error");
        match err {
            Error::Protocol { message, .. } => assert!(message.contains("bad response")),
            other => panic!("expected protocol error, got {other:?}"),
        }
    }

    #[test]
    fn non_200_is_always_a_protocol_error_even_with_success_body() {
        let err = parse_response(&response(
            StatusCode::INTERNAL_SERVER_ERROR,
            r#"{"stat": "OK", "response": {"result": "allow"}}"#,
        ))
        .expect_err("non-200 should error");
        match err {
            Error::Protocol { status, reason, .. } => {
                assert_eq!(status, 500);
                assert_eq!(reason, "Internal Server Error");
            }
            other => panic!("expected protocol error, got {other:?}"),
        }
    }

    #[test]
    fn non_200_fail_envelope_enriches_the_message() {
        let err = parse_response(&response(
            StatusCode::UNAUTHORIZED,
            r#"{"stat": "FAIL", "message": "Invalid signature", "message_detail": "check skew"}"#,
        ))
        .expect_err("401 should error");
        match err {
            Error::Protocol { message, .. } => {
                assert_eq!(message, "Invalid signature (check skew)");
            }
            other => panic!("expected protocol error, got {other:?}"),
        }
    }

    #[test]
    fn non_200_without_detail_uses_message_alone() {
        let err = parse_response(&response(
            StatusCode::BAD_REQUEST,
            r#"{"stat": "FAIL", "message": "Missing user"}"#,
        ))
        .expect_err("400 should error");
        match err {
            Error::Protocol { message, .. } => assert_eq!(message, "Missing user"),
            other => panic!("expected protocol error, got {other:?}"),
        }
    }

    #[test]
    fn non_200_garbage_body_falls_back_to_reason() {
        let err = parse_response(&response(StatusCode::BAD_GATEWAY, "<html>oops</html>"))
            .expect_err("502 should error");
        match err {
            Error::Protocol {
                message, reason, ..
            } => {
                assert_eq!(message, reason);
            }
            other => panic!("expected protocol error, got {other:?}"),
        }
    }
}
