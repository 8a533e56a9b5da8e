//! Middleware for logging requests and responses.

use axum::{
    Json,
    body::{Body, Bytes},
    extract::Request,
    http::{HeaderMap, StatusCode, header::CONTENT_TYPE},
    middleware::Next,
    response::{IntoResponse, Response},
};
use serde_json::{Value, json};

use crate::Error;

/// The maximum number of characters of a body that is logged at the `info` level.
pub const LOG_BODY_LENGTH_LIMIT: usize = 64;

/// JSON fields whose values are replaced before a body is logged.
const REDACTED_FIELDS: [&str; 2] = ["password", "token"];
const REDACTED_VALUE: &str = "********";

/// Log the request and response for each request.
///
/// Both the request and response are logged at the `info` level.
/// If a body is longer than [LOG_BODY_LENGTH_LIMIT] characters, it is
/// truncated and the full body is logged at the `debug` level.
///
/// Passwords and tokens in JSON bodies are redacted, and bodies that are not
/// text, such as the chart images, are only logged by their size.
pub async fn logging_middleware(request: Request, next: Next) -> Response {
    let (parts, body) = request.into_parts();
    let body_bytes = match axum::body::to_bytes(body, usize::MAX).await {
        Ok(bytes) => bytes,
        Err(error) => {
            tracing::warn!("Could not read request body: {error}");
            return Error::InvalidPayload("could not read request body".to_owned())
                .into_response();
        }
    };

    log_body(
        &format!("Received request: {parts:#?}"),
        &parts.headers,
        &body_bytes,
    );

    let request = Request::from_parts(parts, Body::from(body_bytes));
    let response = next.run(request).await;

    let (parts, body) = response.into_parts();
    let body_bytes = match axum::body::to_bytes(body, usize::MAX).await {
        Ok(bytes) => bytes,
        Err(error) => {
            tracing::error!("Could not read response body: {error}");
            return (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(json!({ "error": "Internal server error" })),
            )
                .into_response();
        }
    };

    log_body(
        &format!("Sending response: {parts:#?}"),
        &parts.headers,
        &body_bytes,
    );

    Response::from_parts(parts, Body::from(body_bytes))
}

fn log_body(head: &str, headers: &HeaderMap, body: &Bytes) {
    let body = display_body(headers, body);

    if body.chars().count() > LOG_BODY_LENGTH_LIMIT {
        let truncated: String = body.chars().take(LOG_BODY_LENGTH_LIMIT).collect();
        tracing::info!("{head}\nbody: {truncated}...");
        tracing::debug!("Full body: {body:?}");
    } else {
        tracing::info!("{head}\nbody: {body:?}");
    }
}

/// The text to log for `body`.
fn display_body(headers: &HeaderMap, body: &Bytes) -> String {
    let content_type = headers
        .get(CONTENT_TYPE)
        .and_then(|value| value.to_str().ok())
        .unwrap_or_default();

    if content_type.starts_with("application/json") {
        if let Ok(mut json) = serde_json::from_slice::<Value>(body) {
            redact_fields(&mut json);
            return json.to_string();
        }
    }

    match std::str::from_utf8(body) {
        Ok(text) if !content_type.starts_with("image/") => text.to_owned(),
        _ => format!("<{} bytes of binary data>", body.len()),
    }
}

fn redact_fields(json: &mut Value) {
    match json {
        Value::Object(map) => {
            for (key, value) in map.iter_mut() {
                if REDACTED_FIELDS.contains(&key.as_str()) {
                    *value = Value::String(REDACTED_VALUE.to_owned());
                } else {
                    redact_fields(value);
                }
            }
        }
        Value::Array(values) => values.iter_mut().for_each(redact_fields),
        _ => {}
    }
}

#[cfg(test)]
mod tests {
    use axum::{
        body::Bytes,
        http::{HeaderMap, HeaderValue, header::CONTENT_TYPE},
    };
    use serde_json::json;

    use super::display_body;

    fn headers_with_content_type(content_type: &'static str) -> HeaderMap {
        let mut headers = HeaderMap::new();
        headers.insert(CONTENT_TYPE, HeaderValue::from_static(content_type));
        headers
    }

    #[test]
    fn redacts_password_and_token() {
        let body = json!({
            "email": "foo@bar.baz",
            "password": "hunter2",
            "nested": { "token": "abc.def.ghi" },
        });

        let text = display_body(
            &headers_with_content_type("application/json"),
            &Bytes::from(body.to_string()),
        );

        assert!(!text.contains("hunter2"));
        assert!(!text.contains("abc.def.ghi"));
        assert!(text.contains("foo@bar.baz"));
    }

    #[test]
    fn logs_images_by_size() {
        let text = display_body(
            &headers_with_content_type("image/png"),
            &Bytes::from_static(b"\x89PNG\r\n\x1a\n"),
        );

        assert_eq!(text, "<8 bytes of binary data>");
    }

    #[test]
    fn logs_plain_text_as_is() {
        let text = display_body(&HeaderMap::new(), &Bytes::from_static(b"hello"));

        assert_eq!(text, "hello");
    }
}
