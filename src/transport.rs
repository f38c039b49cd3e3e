//! The wire transport capability.
//!
//! The engine only needs "send this request, give me status, headers and body, or
//! fail". [`ReqwestTransport`] is the default implementation; tests and embedders
//! can supply their own.

use async_trait::async_trait;
use bytes::Bytes;
use http::header::CACHE_CONTROL;
use http::{HeaderMap, HeaderValue, StatusCode};

use crate::endpoint::CachePolicy;
use crate::{ErrorKind, Request};

/// A response as returned by the transport, before validation.
#[derive(Debug, Clone)]
pub struct HttpResponse {
    pub status: StatusCode,
    pub headers: HeaderMap,
    pub body: Bytes,
}

impl HttpResponse {
    pub fn new(status: StatusCode, body: impl Into<Bytes>) -> Self {
        Self {
            status,
            headers: HeaderMap::new(),
            body: body.into(),
        }
    }
}

/// A failure below the HTTP layer.
///
/// Every variant is retried by the engine.
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum TransportError {
    /// The request did not complete within its timeout.
    #[error("Request timed out")]
    Timeout,

    /// The device has no network path at all.
    #[error("Not connected: {0}")]
    NotConnected(String),

    /// The connection could not be established (refused, DNS, TLS handshake).
    #[error("Connection failed: {0}")]
    Connect(String),

    #[error("{0}")]
    Other(String),
}

impl From<TransportError> for ErrorKind {
    fn from(error: TransportError) -> Self {
        match error {
            TransportError::Timeout => ErrorKind::RequestTimeout,
            TransportError::NotConnected(_) => ErrorKind::NoConnection,
            TransportError::Connect(msg) => ErrorKind::RequestFailed(msg),
            TransportError::Other(msg) => ErrorKind::RequestFailed(msg),
        }
    }
}

impl From<reqwest::Error> for TransportError {
    fn from(error: reqwest::Error) -> Self {
        if error.is_timeout() {
            TransportError::Timeout
        } else if error.is_connect() {
            TransportError::Connect(error.to_string())
        } else {
            TransportError::Other(error.to_string())
        }
    }
}

/// Executes HTTP requests.
#[async_trait]
pub trait Transport: Send + Sync {
    async fn execute(&self, request: Request) -> Result<HttpResponse, TransportError>;
}

/// A [`Transport`] backed by a pooled `reqwest::Client`.
///
/// Honors the request timeout. [`CachePolicy::ReloadIgnoringCache`] adds
/// `Cache-Control: no-cache` unless the request already sets it; the other cache
/// policies need no action since reqwest keeps no cache.
#[derive(Debug, Clone, Default)]
pub struct ReqwestTransport {
    client: reqwest::Client,
}

impl ReqwestTransport {
    /// Creates a transport with a default `reqwest::Client`.
    pub fn new() -> Self {
        Self::default()
    }

    /// Wraps an existing, pre-configured client.
    pub fn with_client(client: reqwest::Client) -> Self {
        Self { client }
    }
}

#[async_trait]
impl Transport for ReqwestTransport {
    async fn execute(&self, request: Request) -> Result<HttpResponse, TransportError> {
        let Request {
            method,
            url,
            mut headers,
            body,
            timeout,
            cache_policy,
        } = request;

        if cache_policy == CachePolicy::ReloadIgnoringCache && !headers.contains_key(CACHE_CONTROL) {
            headers.insert(CACHE_CONTROL, HeaderValue::from_static("no-cache"));
        }

        let mut builder = self
            .client
            .request(method, url)
            .headers(headers)
            .timeout(timeout);
        if !body.is_empty() {
            builder = builder.body(body);
        }

        let response = builder.send().await?;
        let status = response.status();
        let headers = response.headers().clone();
        let body = response.bytes().await?;

        Ok(HttpResponse {
            status,
            headers,
            body,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_mapping() {
        assert_eq!(
            ErrorKind::from(TransportError::Timeout),
            ErrorKind::RequestTimeout
        );
        assert_eq!(
            ErrorKind::from(TransportError::NotConnected("offline".into())),
            ErrorKind::NoConnection
        );
        assert_eq!(
            ErrorKind::from(TransportError::Connect("refused".into())),
            ErrorKind::RequestFailed("refused".into())
        );
        assert_eq!(
            ErrorKind::from(TransportError::Other("reset".into())),
            ErrorKind::RequestFailed("reset".into())
        );
    }
}
