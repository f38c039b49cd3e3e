//! Successful call results.
//!
//! [`Response`] wraps the decoded data together with the raw body and the
//! metadata of the attempt that succeeded.

use bytes::Bytes;
use http::{HeaderMap, StatusCode};
use serde::Deserialize;
use std::time::Duration;

/// A successful (validated) HTTP response.
///
/// # Examples
///
/// ```no_run
/// use relaycall::{Client, Endpoint};
/// use http::Method;
/// use serde::Deserialize;
///
/// #[derive(Deserialize)]
/// struct Kanji {
///     kanji: String,
///     stroke_count: u32,
/// }
///
/// # async fn example() -> relaycall::Result<()> {
/// let client = Client::builder().base_url("https://kanjiapi.dev/v1/")?.build()?;
///
/// let response = client
///     .request::<Kanji>(&Endpoint::new(Method::GET, "/kanji/走"))
///     .await?;
///
/// println!("{} has {} strokes", response.kanji, response.stroke_count);
/// println!("took {:?} over {} attempt(s)", response.latency, response.attempts);
/// # Ok(())
/// # }
/// ```
#[derive(Debug, Clone)]
pub struct Response<T> {
    /// The decoded response data.
    pub data: T,

    /// The raw response body.
    pub raw_body: Bytes,

    pub status: StatusCode,

    pub headers: HeaderMap,

    /// Time from the start of the call until the response arrived, including
    /// connectivity waits and backoff between attempts.
    pub latency: Duration,

    /// The attempt that succeeded (1 if no retry was needed).
    pub attempts: usize,
}

impl<T> Response<T> {
    pub fn new(
        data: T,
        raw_body: Bytes,
        status: StatusCode,
        headers: HeaderMap,
        latency: Duration,
        attempts: usize,
    ) -> Self {
        Self {
            data,
            raw_body,
            status,
            headers,
            latency,
            attempts,
        }
    }

    /// Maps the response data while keeping the metadata.
    ///
    /// # Examples
    ///
    /// ```
    /// # use relaycall::Response;
    /// # use bytes::Bytes;
    /// # use http::{HeaderMap, StatusCode};
    /// # use std::time::Duration;
    /// let response = Response::new(
    ///     42,
    ///     Bytes::from_static(b"42"),
    ///     StatusCode::OK,
    ///     HeaderMap::new(),
    ///     Duration::from_millis(100),
    ///     1,
    /// );
    ///
    /// let string_response = response.map(|n| n.to_string());
    /// assert_eq!(string_response.data, "42");
    /// ```
    pub fn map<U, F>(self, f: F) -> Response<U>
    where
        F: FnOnce(T) -> U,
    {
        Response {
            data: f(self.data),
            raw_body: self.raw_body,
            status: self.status,
            headers: self.headers,
            latency: self.latency,
            attempts: self.attempts,
        }
    }

    /// Returns `true` if the call needed more than one attempt.
    pub fn was_retried(&self) -> bool {
        self.attempts > 1
    }

    /// Returns a header value by name.
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers.get(name)?.to_str().ok()
    }

    /// Consumes the response, returning only the data.
    pub fn into_data(self) -> T {
        self.data
    }
}

impl<T> AsRef<T> for Response<T> {
    fn as_ref(&self) -> &T {
        &self.data
    }
}

impl<T> std::ops::Deref for Response<T> {
    type Target = T;

    fn deref(&self) -> &Self::Target {
        &self.data
    }
}

/// Decodes the body of endpoints that return nothing useful.
///
/// An empty 2xx body is decoded as JSON `null`, which this type accepts.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
pub struct EmptyResponse;

#[cfg(test)]
mod tests {
    use super::*;
    use http::HeaderValue;

    fn response(attempts: usize) -> Response<()> {
        let mut headers = HeaderMap::new();
        headers.insert("content-type", HeaderValue::from_static("application/json"));
        Response::new(
            (),
            Bytes::new(),
            StatusCode::OK,
            headers,
            Duration::from_millis(5),
            attempts,
        )
    }

    #[test]
    fn test_was_retried() {
        assert!(!response(1).was_retried());
        assert!(response(3).was_retried());
    }

    #[test]
    fn test_header_lookup() {
        assert_eq!(response(1).header("content-type"), Some("application/json"));
        assert_eq!(response(1).header("x-missing"), None);
    }

    #[test]
    fn test_empty_response_from_null() {
        assert_eq!(
            serde_json::from_slice::<EmptyResponse>(b"null").unwrap(),
            EmptyResponse
        );
    }
}
