//! Maps raw backend outcomes onto [`PreviewError`].

use crate::error::{PreviewError, TransportError, DEFAULT_RETRY_AFTER_SECS};
use crate::preview::BackendResponse;
use crate::recipe::{ApiErrorBody, PreviewPayload, NO_PREFERENCES_ERROR};

const NETWORK_ERROR: &str = "Network error. Please check your connection.";

/// Classify a response.
///
/// Every non-2xx response needs a readable error body; one that does not parse becomes
/// `Server error (<status>)` whatever the status. Fields missing from a readable body fall
/// back to per-status defaults.
pub fn classify_response(response: &BackendResponse) -> Result<PreviewPayload, PreviewError> {
    let status = response.status;
    if response.is_success() {
        return serde_json::from_str(&response.body)
            .map_err(|e| PreviewError::unknown(format!("Invalid preview response: {e}")));
    }

    let Some(body) = parse_error_body(&response.body) else {
        return Err(PreviewError::unknown(format!("Server error ({status})")));
    };

    match status {
        400 if body.error.as_deref() == Some(NO_PREFERENCES_ERROR) => {
            Err(PreviewError::NoPreferences)
        }
        400 => Err(PreviewError::unknown(body.message.unwrap_or_else(|| "Bad request".to_owned()))),
        404 => Err(PreviewError::NotFound),
        429 => Err(PreviewError::RateLimit {
            retry_after_secs: body.retry_after.unwrap_or(DEFAULT_RETRY_AFTER_SECS),
        }),
        503 | 504 => Err(PreviewError::ServiceUnavailable),
        _ => Err(PreviewError::unknown(
            body.message.unwrap_or_else(|| "An unexpected error occurred".to_owned()),
        )),
    }
}

/// Classify a failure to obtain any response.
pub fn classify_transport(err: &TransportError) -> PreviewError {
    let message = err.message.trim();
    if message.is_empty() {
        PreviewError::unknown(NETWORK_ERROR)
    } else {
        PreviewError::unknown(message)
    }
}

fn parse_error_body(body: &str) -> Option<ApiErrorBody> {
    serde_json::from_str(body).ok()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn response(status: u16, body: serde_json::Value) -> BackendResponse {
        BackendResponse::json(status, &body)
    }

    #[test]
    fn bad_request_with_preferences_marker() {
        let body = json!({
            "error": "No dietary preferences",
            "message": "set them",
            "action": "/profile"
        });
        let res = response(400, body);
        assert_eq!(classify_response(&res), Err(PreviewError::NoPreferences));
    }

    #[test]
    fn bad_request_without_marker_uses_message() {
        let res = response(400, json!({ "error": "Validation failed", "message": "Invalid id" }));
        assert_eq!(classify_response(&res), Err(PreviewError::unknown("Invalid id")));

        let res = response(400, json!({ "error": "Validation failed" }));
        assert_eq!(classify_response(&res), Err(PreviewError::unknown("Bad request")));
    }

    #[test]
    fn status_decides_kind_for_readable_bodies() {
        let res = response(404, json!({ "error": "Recipe not found" }));
        assert_eq!(classify_response(&res), Err(PreviewError::NotFound));
        for status in [503, 504] {
            assert_eq!(
                classify_response(&response(status, json!({}))),
                Err(PreviewError::ServiceUnavailable)
            );
        }
    }

    #[test]
    fn rate_limit_reads_retry_after_or_defaults() {
        let res = response(429, json!({ "retry_after": 42 }));
        assert_eq!(classify_response(&res), Err(PreviewError::RateLimit { retry_after_secs: 42 }));

        let res = response(429, json!({ "error": "Rate limit exceeded" }));
        assert_eq!(classify_response(&res), Err(PreviewError::RateLimit { retry_after_secs: 60 }));
    }

    #[test]
    fn unreadable_body_reports_status_for_every_error_status() {
        for status in [400, 404, 429, 500, 502, 503, 504] {
            let res = BackendResponse::new(status, "<html>gateway</html>");
            assert_eq!(
                classify_response(&res),
                Err(PreviewError::unknown(format!("Server error ({status})"))),
                "status {status}"
            );
        }
        let res = BackendResponse::new(404, "");
        assert_eq!(classify_response(&res), Err(PreviewError::unknown("Server error (404)")));
    }

    #[test]
    fn other_statuses_use_message_or_generic_text() {
        let res = response(500, json!({ "error": "Internal", "message": "database down" }));
        assert_eq!(classify_response(&res), Err(PreviewError::unknown("database down")));

        let res = response(418, json!({}));
        assert_eq!(
            classify_response(&res),
            Err(PreviewError::unknown("An unexpected error occurred"))
        );
    }

    #[test]
    fn malformed_success_body_is_unknown() {
        let res = BackendResponse::new(200, "{}");
        match classify_response(&res) {
            Err(PreviewError::Unknown { message: Some(m) }) => {
                assert!(m.starts_with("Invalid preview response"))
            }
            other => panic!("expected unknown error, got {:?}", other),
        }
    }

    #[test]
    fn transport_failure_messages() {
        assert_eq!(
            classify_transport(&TransportError::new("connection refused")),
            PreviewError::unknown("connection refused")
        );
        assert_eq!(
            classify_transport(&TransportError::new("")),
            PreviewError::unknown("Network error. Please check your connection.")
        );
    }
}
