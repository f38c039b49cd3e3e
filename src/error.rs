//! Error types for endpoint calls.
//!
//! Every failure, whether it comes from building the request, the transport, the
//! server's status code or decoding the body, is normalized into an [`ErrorModel`].
//! The model keeps the HTTP status code and the raw response body when the server
//! actually answered, so callers can re-decode a server-specific error payload.

use bytes::Bytes;
use http::{HeaderMap, StatusCode};
use serde::de::DeserializeOwned;

use crate::rate_limit::RateLimitInfo;

/// The kind of failure behind an [`ErrorModel`].
///
/// The display text of each variant is the human-readable description surfaced to
/// users.
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum ErrorKind {
    /// The device is offline.
    #[error("No internet connection available")]
    NoConnection,

    /// The endpoint path could not be turned into a valid URL.
    #[error("Invalid URL")]
    InvalidUrl,

    /// HTTP 400.
    #[error("Bad request")]
    BadRequest,

    /// HTTP 401.
    #[error("Unauthorized access")]
    Unauthorized,

    /// HTTP 403.
    #[error("Access forbidden")]
    Forbidden,

    /// HTTP 404.
    #[error("Resource not found")]
    NotFound,

    /// HTTP 408, or a timeout raised by the transport.
    #[error("Request timed out")]
    RequestTimeout,

    /// HTTP 429.
    #[error("Too many requests")]
    TooManyRequests,

    /// HTTP 500.
    #[error("Internal server error")]
    InternalServerError,

    /// HTTP 503.
    #[error("Service unavailable")]
    ServiceUnavailable,

    /// Any other status code rejected by the validator.
    #[error("Bad response with status code: {0}")]
    BadResponse(u16),

    /// A successful response body did not match the expected shape.
    #[error("Decoding failed: {0}")]
    DecodingFailed(String),

    /// The request body or headers could not be encoded.
    #[error("Encoding failed: {0}")]
    EncodingFailed(String),

    /// The request failed below the HTTP layer (connection refused, DNS, interceptor
    /// failure, file system error during a download).
    #[error("Request failed: {0}")]
    RequestFailed(String),

    /// Reserved for validators that check the response content type.
    #[error("Invalid content type")]
    InvalidContentType,

    /// Reserved for transports that pin certificates.
    #[error("Certificate pinning validation failed")]
    CertificatePinningFailed,

    #[error("Unknown error occurred")]
    Unknown,
}

impl ErrorKind {
    /// Returns `true` for kinds produced while constructing the request.
    ///
    /// These are deterministic for a given endpoint and are never retried.
    pub fn is_construction_error(&self) -> bool {
        matches!(self, ErrorKind::InvalidUrl | ErrorKind::EncodingFailed(_))
    }
}

/// A normalized failure of an endpoint call.
///
/// # Examples
///
/// ```no_run
/// use relaycall::{Client, Endpoint, ErrorKind};
/// use http::Method;
/// use serde::Deserialize;
///
/// #[derive(Deserialize)]
/// struct ApiError { message: String }
///
/// # async fn example() -> relaycall::Result<()> {
/// let client = Client::builder().base_url("https://api.example.com")?.build()?;
///
/// match client.data(&Endpoint::new(Method::GET, "/users/1")).await {
///     Ok(body) => println!("{} bytes", body.len()),
///     Err(e) if e.kind() == &ErrorKind::NotFound => println!("no such user"),
///     Err(e) => {
///         eprintln!("{} (status {:?})", e, e.code());
///         if let Ok(payload) = e.decode_body::<ApiError>() {
///             eprintln!("server said: {}", payload.message);
///         }
///     }
/// }
/// # Ok(())
/// # }
/// ```
#[derive(thiserror::Error, Debug, Clone)]
#[error("{kind}")]
pub struct ErrorModel {
    code: Option<u16>,
    kind: ErrorKind,
    raw_body: Option<Bytes>,
    rate_limit: Option<RateLimitInfo>,
}

impl ErrorModel {
    /// Builds the error for a response the validator rejected.
    ///
    /// The body is kept only when the server actually sent one.
    pub(crate) fn from_response(
        status: StatusCode,
        kind: ErrorKind,
        body: Bytes,
        headers: &HeaderMap,
    ) -> Self {
        let rate_limit = Some(RateLimitInfo::from_headers(headers)).filter(|info| info.is_present());

        Self {
            code: Some(status.as_u16()),
            kind,
            raw_body: (!body.is_empty()).then_some(body),
            rate_limit,
        }
    }

    /// Builds the error for a 2xx body that failed to decode.
    pub(crate) fn decoding(status: StatusCode, cause: impl ToString) -> Self {
        Self {
            code: Some(status.as_u16()),
            kind: ErrorKind::DecodingFailed(cause.to_string()),
            raw_body: None,
            rate_limit: None,
        }
    }

    /// The HTTP status code, when the failure came from a server response.
    pub fn code(&self) -> Option<u16> {
        self.code
    }

    /// The kind of failure.
    pub fn kind(&self) -> &ErrorKind {
        &self.kind
    }

    /// The raw body of a rejected (non-2xx) response.
    pub fn raw_body(&self) -> Option<&Bytes> {
        self.raw_body.as_ref()
    }

    /// Rate limit hints sent with a rejected response, if any.
    pub fn rate_limit(&self) -> Option<&RateLimitInfo> {
        self.rate_limit.as_ref()
    }

    /// The human-readable description of this error.
    pub fn description(&self) -> String {
        self.kind.to_string()
    }

    /// Decodes the raw response body as a caller-defined error payload.
    ///
    /// Fails with [`ErrorKind::DecodingFailed`] when there is no body or it does
    /// not match `E`.
    pub fn decode_body<E: DeserializeOwned>(&self) -> std::result::Result<E, ErrorKind> {
        let body = self
            .raw_body
            .as_ref()
            .ok_or_else(|| ErrorKind::DecodingFailed("no response body".to_string()))?;
        serde_json::from_slice(body).map_err(|e| ErrorKind::DecodingFailed(e.to_string()))
    }
}

impl From<ErrorKind> for ErrorModel {
    fn from(kind: ErrorKind) -> Self {
        Self {
            code: None,
            kind,
            raw_body: None,
            rate_limit: None,
        }
    }
}

/// A specialized `Result` type for endpoint calls.
pub type Result<T> = std::result::Result<T, ErrorModel>;

/// A boxed error returned by pluggable components such as interceptors.
pub type BoxError = Box<dyn std::error::Error + Send + Sync>;
