//! Declarative descriptions of API calls.

use bytes::Bytes;
use http::Method;
use serde::Serialize;
use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use crate::multipart::MultipartPart;
use crate::retry::RetryPolicy;

/// The default per-request timeout.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(60);

/// A value that can be serialized into a JSON request body.
///
/// Implemented for every `Serialize + Debug` type. Serialization is deferred until
/// the request is built, so a failing value surfaces as
/// [`ErrorKind::EncodingFailed`](crate::ErrorKind::EncodingFailed).
pub trait JsonPayload: fmt::Debug + Send + Sync {
    fn to_json(&self) -> serde_json::Result<Vec<u8>>;
}

impl<T> JsonPayload for T
where
    T: Serialize + fmt::Debug + Send + Sync,
{
    fn to_json(&self) -> serde_json::Result<Vec<u8>> {
        serde_json::to_vec(self)
    }
}

/// The body or query payload of an endpoint.
#[derive(Debug, Clone)]
pub enum Task {
    /// No body and no query parameters.
    Plain,

    /// Pairs encoded into the URL query.
    Parameters(BTreeMap<String, String>),

    /// A JSON body.
    JsonBody(Arc<dyn JsonPayload>),

    /// A `multipart/form-data` body.
    Multipart(Vec<MultipartPart>),

    /// A body sent verbatim.
    RawData(Bytes),
}

impl Task {
    /// Wraps a serializable value as a JSON body.
    pub fn json<T>(value: T) -> Self
    where
        T: Serialize + fmt::Debug + Send + Sync + 'static,
    {
        Task::JsonBody(Arc::new(value))
    }

    /// Builds a `Parameters` task from key/value pairs.
    pub fn parameters<K, V>(pairs: impl IntoIterator<Item = (K, V)>) -> Self
    where
        K: Into<String>,
        V: Into<String>,
    {
        Task::Parameters(
            pairs
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        )
    }
}

/// Cache behavior requested for an endpoint.
///
/// The engine passes it through untouched; what it means is up to the transport.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum CachePolicy {
    #[default]
    UseProtocolCachePolicy,
    ReloadIgnoringCache,
    ReturnCacheDataElseLoad,
    ReturnCacheDataDontLoad,
}

/// An immutable description of one API call.
///
/// # Examples
///
/// ```
/// use relaycall::{DelayStrategy, Endpoint, RetryPolicy, Task};
/// use http::Method;
/// use std::time::Duration;
///
/// let endpoint = Endpoint::new(Method::GET, "/search")
///     .with_task(Task::parameters([("q", "rust"), ("page", "2")]))
///     .with_timeout(Duration::from_secs(10))
///     .with_retry_policy(RetryPolicy::new(
///         5,
///         Duration::from_millis(200),
///         DelayStrategy::Linear,
///     ));
///
/// assert!(endpoint.needs_interceptor());
/// ```
#[derive(Debug, Clone)]
pub struct Endpoint {
    path: String,
    method: Method,
    headers: BTreeMap<String, String>,
    task: Task,
    cache_policy: CachePolicy,
    timeout: Duration,
    retry_policy: RetryPolicy,
    needs_interceptor: bool,
}

impl Endpoint {
    /// Creates an endpoint with a `Plain` task and default policies.
    pub fn new(method: Method, path: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            method,
            headers: BTreeMap::new(),
            task: Task::Plain,
            cache_policy: CachePolicy::default(),
            timeout: DEFAULT_TIMEOUT,
            retry_policy: RetryPolicy::default(),
            needs_interceptor: true,
        }
    }

    /// Adds a header. Names and values are validated when the request is built.
    pub fn with_header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.insert(name.into(), value.into());
        self
    }

    /// Adds several headers at once.
    pub fn with_headers<K, V>(mut self, headers: impl IntoIterator<Item = (K, V)>) -> Self
    where
        K: Into<String>,
        V: Into<String>,
    {
        self.headers
            .extend(headers.into_iter().map(|(k, v)| (k.into(), v.into())));
        self
    }

    /// Sets the body or query payload.
    pub fn with_task(mut self, task: Task) -> Self {
        self.task = task;
        self
    }

    /// Sets the cache policy handed to the transport.
    pub fn with_cache_policy(mut self, cache_policy: CachePolicy) -> Self {
        self.cache_policy = cache_policy;
        self
    }

    /// Sets the per-request timeout.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Sets how transport failures are retried.
    pub fn with_retry_policy(mut self, retry_policy: RetryPolicy) -> Self {
        self.retry_policy = retry_policy;
        self
    }

    /// Skips the client's interceptor for this endpoint (e.g. public routes).
    pub fn without_interceptor(mut self) -> Self {
        self.needs_interceptor = false;
        self
    }

    /// The path appended to the client's base URL.
    pub fn path(&self) -> &str {
        &self.path
    }

    /// The HTTP method.
    pub fn method(&self) -> &Method {
        &self.method
    }

    /// The endpoint-specific headers.
    pub fn headers(&self) -> &BTreeMap<String, String> {
        &self.headers
    }

    /// The body or query payload.
    pub fn task(&self) -> &Task {
        &self.task
    }

    /// The requested cache behavior.
    pub fn cache_policy(&self) -> CachePolicy {
        self.cache_policy
    }

    /// The per-request timeout.
    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    /// The retry policy for transport failures.
    pub fn retry_policy(&self) -> &RetryPolicy {
        &self.retry_policy
    }

    /// Whether the client's interceptor runs for this endpoint.
    pub fn needs_interceptor(&self) -> bool {
        self.needs_interceptor
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let endpoint = Endpoint::new(Method::GET, "/kanji/走");

        assert_eq!(endpoint.path(), "/kanji/走");
        assert_eq!(endpoint.method(), &Method::GET);
        assert!(endpoint.headers().is_empty());
        assert!(matches!(endpoint.task(), Task::Plain));
        assert_eq!(endpoint.cache_policy(), CachePolicy::UseProtocolCachePolicy);
        assert_eq!(endpoint.timeout(), DEFAULT_TIMEOUT);
        assert_eq!(endpoint.retry_policy(), &RetryPolicy::default());
        assert!(endpoint.needs_interceptor());
    }

    #[test]
    fn test_builder_methods() {
        let endpoint = Endpoint::new(Method::POST, "/upload")
            .with_header("X-Trace", "1")
            .with_headers([("X-A", "a"), ("X-B", "b")])
            .with_task(Task::RawData(Bytes::from_static(b"raw")))
            .with_cache_policy(CachePolicy::ReloadIgnoringCache)
            .with_timeout(Duration::from_secs(5))
            .with_retry_policy(RetryPolicy::no_retry())
            .without_interceptor();

        assert_eq!(endpoint.headers().len(), 3);
        assert_eq!(endpoint.headers()["X-Trace"], "1");
        assert!(matches!(endpoint.task(), Task::RawData(b) if &b[..] == b"raw"));
        assert_eq!(endpoint.timeout(), Duration::from_secs(5));
        assert_eq!(endpoint.retry_policy().max_attempts(), 1);
        assert!(!endpoint.needs_interceptor());
    }

    #[test]
    fn test_json_task_defers_serialization() {
        #[derive(Debug, Serialize)]
        struct Body {
            id: u32,
        }

        let task = Task::json(Body { id: 7 });
        match task {
            Task::JsonBody(payload) => assert_eq!(payload.to_json().unwrap(), br#"{"id":7}"#),
            other => panic!("unexpected task {:?}", other),
        }
    }
}
