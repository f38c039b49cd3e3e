//! The execution engine.
//!
//! [`Client`] turns endpoints into calls: it waits for connectivity, builds and
//! intercepts the request, sends it through the transport, validates the status and
//! retries transport-level failures according to the endpoint's [`RetryPolicy`].
//! Use [`ClientBuilder`] to configure one.

use bytes::Bytes;
use serde::de::DeserializeOwned;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;
use tokio::time::Instant;
use url::Url;

use crate::connectivity::{ConnectivityGate, ConnectivityMonitor};
use crate::interceptor::{DefaultInterceptor, Interceptor};
use crate::logger::{NetworkLogger, TracingLogger};
use crate::request::{Request, RequestBuilder};
use crate::retry::RetryPolicy;
use crate::transport::{HttpResponse, ReqwestTransport, Transport};
use crate::validator::{DefaultResponseValidator, ResponseValidator};
use crate::{Endpoint, ErrorKind, ErrorModel, Response, Result};

/// When the engine waits on the connectivity gate.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum ConnectivityWait {
    /// Before every attempt, whatever the endpoint's policy says.
    #[default]
    Always,

    /// Only for endpoints whose [`RetryPolicy::wait_for_connectivity`] is set.
    PerPolicy,
}

/// Executes [`Endpoint`]s with retry, validation and error mapping.
///
/// The client is cheap to clone and safe to share between tasks; calls do not
/// share state apart from the connectivity gate.
///
/// # Examples
///
/// ```no_run
/// use relaycall::{Client, DelayStrategy, Endpoint, RetryPolicy};
/// use http::Method;
/// use serde::Deserialize;
/// use std::time::Duration;
///
/// #[derive(Deserialize)]
/// struct Kanji {
///     kanji: String,
///     stroke_count: u32,
/// }
///
/// # async fn example() -> relaycall::Result<()> {
/// let client = Client::builder()
///     .base_url("https://kanjiapi.dev/v1/")?
///     .build()?;
///
/// let endpoint = Endpoint::new(Method::GET, "/kanji/走")
///     .with_timeout(Duration::from_secs(5))
///     .with_retry_policy(RetryPolicy::new(3, Duration::from_secs(1), DelayStrategy::Exponential));
///
/// let kanji = client.request::<Kanji>(&endpoint).await?;
/// println!("{}: {} strokes", kanji.kanji, kanji.stroke_count);
/// # Ok(())
/// # }
/// ```
#[derive(Clone)]
pub struct Client {
    inner: Arc<ClientInner>,
}

struct ClientInner {
    base_url: Url,
    transport: Arc<dyn Transport>,
    interceptor: Arc<dyn Interceptor>,
    validator: Arc<dyn ResponseValidator>,
    logger: Arc<dyn NetworkLogger>,
    connectivity: Arc<dyn ConnectivityGate>,
    connectivity_wait: ConnectivityWait,
}

impl Client {
    /// Creates a new `ClientBuilder`.
    pub fn builder() -> ClientBuilder {
        ClientBuilder::new()
    }

    /// The base URL every endpoint path is appended to.
    pub fn base_url(&self) -> &Url {
        &self.inner.base_url
    }

    /// Executes an endpoint and returns the validated raw response.
    ///
    /// Transport-level failures (connection errors, transport timeouts, interceptor
    /// failures) are retried with backoff until the policy's attempts run out; the
    /// last one is returned. A request that cannot be built and any response the
    /// validator rejects end the call immediately.
    ///
    /// The returned response carries the body as both `data` and `raw_body`.
    pub async fn execute(&self, endpoint: &Endpoint) -> Result<Response<Bytes>> {
        let start_time = Instant::now();
        let policy = *endpoint.retry_policy();
        let mut attempt = 0;

        loop {
            attempt += 1;

            self.await_connectivity(&policy).await;

            let request = self.build_request(endpoint)?;

            let kind = match self.send(endpoint, request, attempt).await {
                Ok(response) => return self.validate(response, start_time.elapsed(), attempt),
                Err(kind) => kind,
            };

            tracing::warn!(
                error = %kind,
                attempt = attempt,
                max_attempts = policy.max_attempts(),
                method = %endpoint.method(),
                path = %endpoint.path(),
                "Request attempt failed"
            );

            match policy.delay_after(attempt) {
                Some(delay) => {
                    tracing::info!(
                        delay_ms = delay.as_millis() as u64,
                        attempt = attempt,
                        "Retrying request after delay"
                    );
                    tokio::time::sleep(delay).await;
                }
                None => return Err(kind.into()),
            }
        }
    }

    /// Executes an endpoint and decodes its JSON body into `T`.
    ///
    /// Decoding happens after the retry loop: a body that does not match `T` fails
    /// with [`ErrorKind::DecodingFailed`] and is never retried. An empty body is
    /// decoded as `null`, see [`EmptyResponse`](crate::EmptyResponse).
    pub async fn request<T>(&self, endpoint: &Endpoint) -> Result<Response<T>>
    where
        T: DeserializeOwned,
    {
        let response = self.execute(endpoint).await?;
        let data = decode::<T>(&response)?;
        Ok(response.map(|_| data))
    }

    /// Executes an endpoint and returns its raw body.
    pub async fn data(&self, endpoint: &Endpoint) -> Result<Bytes> {
        Ok(self.execute(endpoint).await?.data)
    }

    /// Sends `body` as the request body and decodes the JSON response.
    ///
    /// Uploads are attempted once: the first failure of any kind is returned.
    pub async fn upload<T>(&self, endpoint: &Endpoint, body: impl Into<Bytes>) -> Result<Response<T>>
    where
        T: DeserializeOwned,
    {
        let response = self.send_once(endpoint, Some(body.into())).await?;
        let data = decode::<T>(&response)?;
        Ok(response.map(|_| data))
    }

    /// Downloads the response body to `destination`, replacing any existing file.
    ///
    /// The body is written to a temporary file next to `destination` and moved into
    /// place once complete. Downloads are attempted once; file system failures are
    /// reported as [`ErrorKind::RequestFailed`].
    pub async fn download(&self, endpoint: &Endpoint, destination: impl AsRef<Path>) -> Result<PathBuf> {
        let destination = destination.as_ref().to_path_buf();
        let response = self.send_once(endpoint, None).await?;

        persist(&response.raw_body, &destination).await.map_err(|e| {
            tracing::error!(
                error = %e,
                destination = %destination.display(),
                "Failed to store downloaded file"
            );
            ErrorModel::from(ErrorKind::RequestFailed(e.to_string()))
        })?;

        tracing::info!(
            destination = %destination.display(),
            bytes = response.raw_body.len(),
            "Download complete"
        );
        Ok(destination)
    }

    /// Runs one build → intercept → send → validate pass without retries.
    async fn send_once(&self, endpoint: &Endpoint, body: Option<Bytes>) -> Result<Response<Bytes>> {
        let start_time = Instant::now();

        self.await_connectivity(endpoint.retry_policy()).await;

        let mut request = self.build_request(endpoint)?;
        if let Some(body) = body {
            request.body = body;
        }

        let response = self.send(endpoint, request, 1).await?;
        self.validate(response, start_time.elapsed(), 1)
    }

    async fn await_connectivity(&self, policy: &RetryPolicy) {
        let should_wait = match self.inner.connectivity_wait {
            ConnectivityWait::Always => true,
            ConnectivityWait::PerPolicy => policy.wait_for_connectivity(),
        };
        if !should_wait {
            return;
        }

        if !self.inner.connectivity.is_connected().await {
            tracing::info!("Waiting for network connectivity");
        }
        self.inner.connectivity.wait_for_connection().await;
    }

    fn build_request(&self, endpoint: &Endpoint) -> Result<Request> {
        RequestBuilder::build(endpoint, &self.inner.base_url).inspect_err(|e| {
            tracing::error!(
                error = %e,
                method = %endpoint.method(),
                path = %endpoint.path(),
                "Failed to build request"
            );
        })
    }

    /// Intercepts and sends one request, mapping every failure to an [`ErrorKind`].
    async fn send(
        &self,
        endpoint: &Endpoint,
        request: Request,
        attempt: usize,
    ) -> std::result::Result<HttpResponse, ErrorKind> {
        let request = if endpoint.needs_interceptor() {
            match self.inner.interceptor.adapt(request).await {
                Ok(request) => request,
                Err(e) => {
                    let kind = ErrorKind::RequestFailed(e.to_string());
                    self.inner.logger.log_response(endpoint, None, None, Some(&kind));
                    return Err(kind);
                }
            }
        } else {
            request
        };

        tracing::debug!(
            method = %request.method,
            url = %request.url,
            attempt = attempt,
            "Executing HTTP request"
        );
        self.inner.logger.log_request(&request);

        match self.inner.transport.execute(request).await {
            Ok(response) => {
                self.inner.logger.log_response(
                    endpoint,
                    Some(response.status),
                    Some(&response.body),
                    None,
                );
                Ok(response)
            }
            Err(error) => {
                let kind = ErrorKind::from(error);
                self.inner.logger.log_response(endpoint, None, None, Some(&kind));
                Err(kind)
            }
        }
    }

    fn validate(&self, response: HttpResponse, latency: Duration, attempts: usize) -> Result<Response<Bytes>> {
        let HttpResponse {
            status,
            headers,
            body,
        } = response;

        tracing::info!(
            status = status.as_u16(),
            latency_ms = latency.as_millis() as u64,
            attempts = attempts,
            "Received HTTP response"
        );

        match self.inner.validator.validate(status) {
            Ok(()) => Ok(Response::new(
                body.clone(),
                body,
                status,
                headers,
                latency,
                attempts,
            )),
            Err(kind) => {
                if status.is_client_error() {
                    tracing::error!(status = status.as_u16(), error = %kind, "Client error (4xx)");
                } else if status.is_server_error() {
                    tracing::warn!(status = status.as_u16(), error = %kind, "Server error (5xx)");
                }
                Err(ErrorModel::from_response(status, kind, body, &headers))
            }
        }
    }
}

fn decode<T: DeserializeOwned>(response: &Response<Bytes>) -> Result<T> {
    let body = &response.raw_body;
    let input: &[u8] = if body.iter().all(u8::is_ascii_whitespace) {
        b"null"
    } else {
        body
    };

    serde_json::from_slice(input).map_err(|e| {
        tracing::error!(
            error = %e,
            status = response.status.as_u16(),
            raw_response = %String::from_utf8_lossy(body),
            "Failed to deserialize response"
        );
        ErrorModel::decoding(response.status, e)
    })
}

async fn persist(body: &[u8], destination: &Path) -> io::Result<()> {
    let file_name = destination.file_name().ok_or_else(|| {
        io::Error::new(io::ErrorKind::InvalidInput, "destination has no file name")
    })?;
    let mut temp_name = file_name.to_os_string();
    temp_name.push(format!(".{:016x}.part", rand::random::<u64>()));
    let temp_path = destination.with_file_name(temp_name);

    tokio::fs::write(&temp_path, body).await?;

    let moved = async {
        if tokio::fs::try_exists(destination).await? {
            tokio::fs::remove_file(destination).await?;
        }
        tokio::fs::rename(&temp_path, destination).await
    }
    .await;

    if moved.is_err() {
        let _ = tokio::fs::remove_file(&temp_path).await;
    }
    moved
}

/// Builder for configuring and creating a [`Client`].
///
/// Every collaborator has a default: [`ReqwestTransport`], [`DefaultInterceptor`],
/// [`DefaultResponseValidator`], [`TracingLogger`] and a fresh, connected
/// [`ConnectivityMonitor`]. Pass a shared monitor with
/// [`connectivity`](Self::connectivity) to gate several clients on the same
/// reachability signal.
///
/// # Examples
///
/// ```no_run
/// use relaycall::{ClientBuilder, ConnectivityMonitor, HeaderInterceptor, InterceptorChain, DefaultInterceptor};
/// use std::sync::Arc;
///
/// # fn example() -> relaycall::Result<()> {
/// let monitor = Arc::new(ConnectivityMonitor::new());
///
/// let client = ClientBuilder::new()
///     .base_url("https://api.example.com")?
///     .interceptor(
///         InterceptorChain::new()
///             .with(DefaultInterceptor)
///             .with(HeaderInterceptor::bearer("token")),
///     )
///     .connectivity(monitor.clone())
///     .build()?;
///
/// // Feed reachability changes from wherever they are observed.
/// monitor.set_connected(false);
/// # Ok(())
/// # }
/// ```
pub struct ClientBuilder {
    base_url: Option<Url>,
    transport: Option<Arc<dyn Transport>>,
    interceptor: Arc<dyn Interceptor>,
    validator: Arc<dyn ResponseValidator>,
    logger: Arc<dyn NetworkLogger>,
    connectivity: Arc<dyn ConnectivityGate>,
    connectivity_wait: ConnectivityWait,
}

impl ClientBuilder {
    /// Creates a new `ClientBuilder` with default collaborators.
    pub fn new() -> Self {
        Self {
            base_url: None,
            transport: None,
            interceptor: Arc::new(DefaultInterceptor),
            validator: Arc::new(DefaultResponseValidator),
            logger: Arc::new(TracingLogger),
            connectivity: Arc::new(ConnectivityMonitor::new()),
            connectivity_wait: ConnectivityWait::default(),
        }
    }

    /// Sets the base URL every endpoint path is appended to.
    ///
    /// # Errors
    ///
    /// Returns [`ErrorKind::InvalidUrl`] if the URL cannot be parsed.
    pub fn base_url(mut self, url: impl AsRef<str>) -> Result<Self> {
        let url = Url::parse(url.as_ref()).map_err(|e| {
            tracing::error!(error = %e, url = url.as_ref(), "Invalid base URL");
            ErrorModel::from(ErrorKind::InvalidUrl)
        })?;
        self.base_url = Some(url);
        Ok(self)
    }

    /// Replaces the default reqwest transport.
    pub fn transport(mut self, transport: impl Transport + 'static) -> Self {
        self.transport = Some(Arc::new(transport));
        self
    }

    /// Replaces the interceptor applied to endpoints that need one.
    pub fn interceptor(mut self, interceptor: impl Interceptor + 'static) -> Self {
        self.interceptor = Arc::new(interceptor);
        self
    }

    /// Replaces the status code validator.
    pub fn validator(mut self, validator: impl ResponseValidator + 'static) -> Self {
        self.validator = Arc::new(validator);
        self
    }

    /// Replaces the request/response logger.
    pub fn logger(mut self, logger: impl NetworkLogger + 'static) -> Self {
        self.logger = Arc::new(logger);
        self
    }

    /// Sets the (usually shared) connectivity gate.
    pub fn connectivity(mut self, gate: Arc<dyn ConnectivityGate>) -> Self {
        self.connectivity = gate;
        self
    }

    /// Chooses when calls wait on the connectivity gate.
    ///
    /// Defaults to [`ConnectivityWait::Always`].
    pub fn connectivity_wait(mut self, mode: ConnectivityWait) -> Self {
        self.connectivity_wait = mode;
        self
    }

    /// Builds the configured `Client`.
    ///
    /// # Errors
    ///
    /// Returns [`ErrorKind::InvalidUrl`] if no base URL was provided and
    /// [`ErrorKind::RequestFailed`] if the default transport cannot be created.
    pub fn build(self) -> Result<Client> {
        let base_url = self.base_url.ok_or_else(|| {
            tracing::error!("Base URL is required");
            ErrorModel::from(ErrorKind::InvalidUrl)
        })?;

        let transport = match self.transport {
            Some(transport) => transport,
            None => {
                let http_client = reqwest::Client::builder().build().map_err(|e| {
                    ErrorModel::from(ErrorKind::RequestFailed(format!(
                        "Failed to build HTTP client: {}",
                        e
                    )))
                })?;
                Arc::new(ReqwestTransport::with_client(http_client))
            }
        };

        Ok(Client {
            inner: Arc::new(ClientInner {
                base_url,
                transport,
                interceptor: self.interceptor,
                validator: self.validator,
                logger: self.logger,
                connectivity: self.connectivity,
                connectivity_wait: self.connectivity_wait,
            }),
        })
    }
}

impl Default for ClientBuilder {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_build_requires_base_url() {
        let err = ClientBuilder::new().build().err().expect("missing base URL");
        assert_eq!(err.kind(), &ErrorKind::InvalidUrl);
    }

    #[test]
    fn test_invalid_base_url() {
        let err = ClientBuilder::new().base_url("not a url").err().expect("invalid URL");
        assert_eq!(err.kind(), &ErrorKind::InvalidUrl);
    }

    #[test]
    fn test_base_url_kept() {
        let client = Client::builder()
            .base_url("https://kanjiapi.dev/v1/")
            .unwrap()
            .build()
            .unwrap();
        assert_eq!(client.base_url().as_str(), "https://kanjiapi.dev/v1/");
    }

    #[tokio::test]
    async fn test_persist_replaces_existing_file() {
        let dir = tempfile::tempdir().unwrap();
        let destination = dir.path().join("kanji.json");
        tokio::fs::write(&destination, b"old").await.unwrap();

        persist(b"new", &destination).await.unwrap();

        assert_eq!(tokio::fs::read(&destination).await.unwrap(), b"new");
        let leftovers = std::fs::read_dir(dir.path()).unwrap().count();
        assert_eq!(leftovers, 1);
    }

    #[tokio::test]
    async fn test_persist_into_missing_directory_fails() {
        let dir = tempfile::tempdir().unwrap();
        let destination = dir.path().join("missing").join("file.bin");

        assert!(persist(b"data", &destination).await.is_err());
    }
}
