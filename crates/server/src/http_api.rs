use crate::coordinator::CoordinatorError;
use axum::{
    body::Body,
    http::{Response as HttpResponse, StatusCode},
    response::Response,
};
use converse_protocol::{ErrorCode, ErrorEnvelope};
use serde::Serialize;

pub(crate) fn status_for(code: ErrorCode) -> StatusCode {
    match code {
        ErrorCode::Validation => StatusCode::BAD_REQUEST,
        ErrorCode::Duplicate | ErrorCode::Conflict | ErrorCode::IndexExhausted => {
            StatusCode::CONFLICT
        }
        ErrorCode::NotFound => StatusCode::NOT_FOUND,
        ErrorCode::Timeout => StatusCode::GATEWAY_TIMEOUT,
        ErrorCode::Internal => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

pub(crate) fn hint_for(code: ErrorCode) -> Option<String> {
    match code {
        ErrorCode::Validation => Some(
            "Topic path labels may only contain letters, digits, '_' and '-', joined by '.'."
                .to_string(),
        ),
        ErrorCode::Duplicate => {
            Some("Choose a path that does not already exist in this group.".to_string())
        }
        ErrorCode::IndexExhausted => Some(
            "Too many comments are packed between the same two turns; anchor to a later turn."
                .to_string(),
        ),
        ErrorCode::Conflict => Some("The operation raced a concurrent write; retry.".to_string()),
        _ => None,
    }
}

/// Full detail goes to the server log; the client sees the stable code and a
/// sanitized message.
pub(crate) fn error_response(err: &CoordinatorError) -> Response {
    let code = err.code();
    if code == ErrorCode::Internal {
        log::error!("request failed: {err:?}");
    } else {
        log::info!("request rejected ({}): {err}", code.as_str());
    }

    let envelope = ErrorEnvelope {
        code,
        message: err.public_message(),
        details: None,
        hint: hint_for(code),
    };
    build_response(status_for(code), &envelope)
}

pub(crate) fn build_response<T: Serialize>(status: StatusCode, body: &T) -> Response {
    match serde_json::to_vec(body) {
        Ok(bytes) => HttpResponse::builder()
            .status(status)
            .header("content-type", "application/json")
            .body(Body::from(bytes))
            .expect("valid HTTP response"),
        Err(err) => {
            log::error!("response serialization failed: {err}");
            HttpResponse::builder()
                .status(StatusCode::INTERNAL_SERVER_ERROR)
                .body(Body::empty())
                .expect("valid HTTP response")
        }
    }
}
