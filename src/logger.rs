//! Request/response logging hooks.

use bytes::Bytes;
use http::StatusCode;

use crate::{Endpoint, ErrorKind, Request};

const MAX_LOGGED_BODY_CHARS: usize = 1000;

/// Receives every outgoing request and every outcome.
///
/// Logging is fire-and-forget: implementations must not block and cannot affect
/// the result of a call.
pub trait NetworkLogger: Send + Sync {
    fn log_request(&self, request: &Request);

    /// Called once per transport attempt with either the response or the error.
    fn log_response(
        &self,
        endpoint: &Endpoint,
        status: Option<StatusCode>,
        body: Option<&Bytes>,
        error: Option<&ErrorKind>,
    );
}

/// Emits `tracing` events for requests and responses.
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingLogger;

impl NetworkLogger for TracingLogger {
    fn log_request(&self, request: &Request) {
        tracing::debug!(
            method = %request.method,
            url = %request.url,
            headers = ?request.headers,
            body = %preview(&request.body),
            "Sending request"
        );
    }

    fn log_response(
        &self,
        endpoint: &Endpoint,
        status: Option<StatusCode>,
        body: Option<&Bytes>,
        error: Option<&ErrorKind>,
    ) {
        let body = body.map(|b| preview(b)).unwrap_or_default();

        match (status, error) {
            (Some(status), _) if status.is_success() => tracing::debug!(
                path = %endpoint.path(),
                status = status.as_u16(),
                body = %body,
                "Response received"
            ),
            (Some(status), _) => tracing::warn!(
                path = %endpoint.path(),
                status = status.as_u16(),
                body = %body,
                "Error response received"
            ),
            (None, Some(error)) => tracing::warn!(
                path = %endpoint.path(),
                error = %error,
                "Request failed"
            ),
            (None, None) => tracing::warn!(path = %endpoint.path(), "Request failed"),
        }
    }
}

/// Renders a body for logs, truncated to a readable length.
fn preview(body: &[u8]) -> String {
    let text = String::from_utf8_lossy(body);
    if text.chars().count() > MAX_LOGGED_BODY_CHARS {
        let truncated: String = text.chars().take(MAX_LOGGED_BODY_CHARS).collect();
        format!("{truncated}... (truncated)")
    } else {
        text.into_owned()
    }
}
