//! Request adaptation before send.
//!
//! An [`Interceptor`] runs after the request is built and before it reaches the
//! transport, for every endpoint whose `needs_interceptor` flag is set. This is
//! where authentication tokens, signatures and common headers belong.

use async_trait::async_trait;
use std::sync::Arc;

use crate::error::BoxError;
use crate::request::{Request, APPLICATION_JSON};

/// Adapts a built request before it is sent.
///
/// A failure is handled exactly like a transport failure: it is logged and the
/// attempt is retried according to the endpoint's retry policy.
///
/// # Examples
///
/// ```
/// use async_trait::async_trait;
/// use relaycall::{BoxError, Interceptor, Request};
///
/// struct ApiKey(String);
///
/// #[async_trait]
/// impl Interceptor for ApiKey {
///     async fn adapt(&self, mut request: Request) -> Result<Request, BoxError> {
///         request.set_header("x-api-key", &self.0)?;
///         Ok(request)
///     }
/// }
/// ```
#[async_trait]
pub trait Interceptor: Send + Sync {
    async fn adapt(&self, request: Request) -> Result<Request, BoxError>;
}

/// Sets `Accept: application/json`.
#[derive(Debug, Clone, Copy, Default)]
pub struct DefaultInterceptor;

#[async_trait]
impl Interceptor for DefaultInterceptor {
    async fn adapt(&self, mut request: Request) -> Result<Request, BoxError> {
        request.set_header("accept", APPLICATION_JSON)?;
        Ok(request)
    }
}

/// Sets one fixed header, e.g. a static bearer token.
#[derive(Debug, Clone)]
pub struct HeaderInterceptor {
    name: String,
    value: String,
    sensitive: bool,
}

impl HeaderInterceptor {
    pub fn new(name: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            value: value.into(),
            sensitive: false,
        }
    }

    /// `Authorization: Bearer {token}`, hidden from request logs.
    pub fn bearer(token: impl AsRef<str>) -> Self {
        Self::new("authorization", format!("Bearer {}", token.as_ref())).sensitive()
    }

    /// Marks the header value as sensitive so loggers never print it.
    pub fn sensitive(mut self) -> Self {
        self.sensitive = true;
        self
    }
}

#[async_trait]
impl Interceptor for HeaderInterceptor {
    async fn adapt(&self, mut request: Request) -> Result<Request, BoxError> {
        if self.sensitive {
            request.set_sensitive_header(&self.name, &self.value)?;
        } else {
            request.set_header(&self.name, &self.value)?;
        }
        Ok(request)
    }
}

/// Runs several interceptors in order, stopping at the first failure.
#[derive(Clone, Default)]
pub struct InterceptorChain {
    interceptors: Vec<Arc<dyn Interceptor>>,
}

impl InterceptorChain {
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends an interceptor to the end of the chain.
    pub fn with(mut self, interceptor: impl Interceptor + 'static) -> Self {
        self.interceptors.push(Arc::new(interceptor));
        self
    }

    pub fn len(&self) -> usize {
        self.interceptors.len()
    }

    pub fn is_empty(&self) -> bool {
        self.interceptors.is_empty()
    }
}

#[async_trait]
impl Interceptor for InterceptorChain {
    async fn adapt(&self, request: Request) -> Result<Request, BoxError> {
        let mut request = request;
        for interceptor in &self.interceptors {
            request = interceptor.adapt(request).await?;
        }
        Ok(request)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{Endpoint, RequestBuilder};
    use http::Method;
    use url::Url;

    fn request() -> Request {
        let base = Url::parse("https://api.example.com").unwrap();
        RequestBuilder::build(&Endpoint::new(Method::GET, "/x"), &base).unwrap()
    }

    struct Failing;

    #[async_trait]
    impl Interceptor for Failing {
        async fn adapt(&self, _request: Request) -> Result<Request, BoxError> {
            Err("token refresh failed".into())
        }
    }

    #[tokio::test]
    async fn test_default_sets_accept() {
        let adapted = DefaultInterceptor.adapt(request()).await.unwrap();
        assert_eq!(adapted.header("accept"), Some("application/json"));
    }

    #[tokio::test]
    async fn test_bearer() {
        let adapted = HeaderInterceptor::bearer("abc").adapt(request()).await.unwrap();
        assert_eq!(adapted.header("authorization"), Some("Bearer abc"));
    }

    #[tokio::test]
    async fn test_bearer_token_is_hidden_from_debug_output() {
        let adapted = HeaderInterceptor::bearer("secret-token")
            .adapt(request())
            .await
            .unwrap();

        assert!(adapted.headers.get("authorization").unwrap().is_sensitive());
        let logged = format!("{:?}", adapted.headers);
        assert!(logged.contains("Sensitive"));
        assert!(!logged.contains("secret-token"));
    }

    #[tokio::test]
    async fn test_plain_header_stays_visible() {
        let adapted = HeaderInterceptor::new("x-client", "relaycall")
            .adapt(request())
            .await
            .unwrap();

        assert!(!adapted.headers.get("x-client").unwrap().is_sensitive());
        assert!(format!("{:?}", adapted.headers).contains("relaycall"));
    }

    #[tokio::test]
    async fn test_chain_runs_in_order() {
        let chain = InterceptorChain::new()
            .with(HeaderInterceptor::new("x-order", "first"))
            .with(HeaderInterceptor::new("x-order", "second"))
            .with(DefaultInterceptor);

        let adapted = chain.adapt(request()).await.unwrap();
        assert_eq!(adapted.header("x-order"), Some("second"));
        assert_eq!(adapted.header("accept"), Some("application/json"));
        assert_eq!(chain.len(), 3);
    }

    #[tokio::test]
    async fn test_chain_stops_at_failure() {
        let chain = InterceptorChain::new()
            .with(Failing)
            .with(HeaderInterceptor::new("x-after", "1"));

        let err = chain.adapt(request()).await.unwrap_err();
        assert_eq!(err.to_string(), "token refresh failed");
    }

    #[tokio::test]
    async fn test_invalid_header_fails() {
        let err = HeaderInterceptor::new("bad name", "v")
            .adapt(request())
            .await
            .unwrap_err();
        assert!(err.to_string().contains("Invalid header name"));
    }
}
