//! Test assertions for pipeline responses.

use axum::http::StatusCode;
use axum::response::Response;

/// Reads a response into its status and body text.
///
/// # Panics
///
/// Panics if the body cannot be read.
pub async fn response_text(response: Response) -> (StatusCode, String) {
    let status = response.status();
    let body = match axum::body::to_bytes(response.into_body(), usize::MAX).await {
        Ok(body) => body,
        Err(e) => panic!("could not read response body: {e}"),
    };
    (status, String::from_utf8_lossy(&body).into_owned())
}

/// Asserts that a response is a pipeline halt with `status` and a body
/// containing `needle`.
pub async fn assert_halted(response: Response, status: StatusCode, needle: &str) {
    let content_type = response
        .headers()
        .get(axum::http::header::CONTENT_TYPE)
        .and_then(|value| value.to_str().ok())
        .map(ToString::to_string);
    let (actual, body) = response_text(response).await;

    assert_eq!(actual, status, "Expected status {status}, got {actual} ({body:?})");
    assert!(
        body.contains(needle),
        "Expected body to contain {needle:?}, got {body:?}"
    );
    assert_eq!(
        content_type.as_deref(),
        Some(crate::errors::PLAIN_TEXT_UTF8),
        "Expected a plain text halt response"
    );
}
