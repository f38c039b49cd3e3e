//! Turning an [`Endpoint`] into a transport-ready [`Request`].

use bytes::Bytes;
use http::header::CONTENT_TYPE;
use http::{HeaderMap, HeaderName, HeaderValue, Method};
use std::time::Duration;
use url::Url;

use crate::endpoint::{CachePolicy, Endpoint, Task};
use crate::multipart;
use crate::{ErrorKind, ErrorModel, Result};

pub(crate) const APPLICATION_JSON: &str = "application/json";
const MULTIPART_FORM_DATA: &str = "multipart/form-data";

/// A fully resolved HTTP request.
///
/// Interceptors receive and return this value; transports execute it.
#[derive(Debug, Clone)]
pub struct Request {
    pub method: Method,
    pub url: Url,
    pub headers: HeaderMap,
    /// Empty for tasks without a body.
    pub body: Bytes,
    pub timeout: Duration,
    pub cache_policy: CachePolicy,
}

impl Request {
    /// Sets a header, replacing any previous value.
    ///
    /// # Errors
    ///
    /// Returns [`ErrorKind::EncodingFailed`] if the name or value is not a valid
    /// header.
    pub fn set_header(&mut self, name: &str, value: &str) -> std::result::Result<(), ErrorKind> {
        let (name, value) = header_pair(name, value)?;
        self.headers.insert(name, value);
        Ok(())
    }

    /// Sets a header whose value must not show up in logs, such as credentials.
    ///
    /// The value is marked sensitive, so `Debug` output renders it as `Sensitive`.
    pub fn set_sensitive_header(&mut self, name: &str, value: &str) -> std::result::Result<(), ErrorKind> {
        let (name, mut value) = header_pair(name, value)?;
        value.set_sensitive(true);
        self.headers.insert(name, value);
        Ok(())
    }

    /// Returns a header value as a string, if present and visible ASCII.
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers.get(name)?.to_str().ok()
    }
}

/// Builds [`Request`]s from endpoints.
pub struct RequestBuilder;

impl RequestBuilder {
    /// Resolves `endpoint` against `base_url`.
    ///
    /// The endpoint path is appended to the base URL's path. Query parameters,
    /// bodies and content types follow the endpoint's [`Task`].
    ///
    /// # Errors
    ///
    /// * [`ErrorKind::InvalidUrl`] if the joined URL cannot be parsed
    /// * [`ErrorKind::EncodingFailed`] if a header or the JSON body cannot be encoded
    ///
    /// # Examples
    ///
    /// ```
    /// use relaycall::{Endpoint, RequestBuilder, Task};
    /// use http::Method;
    /// use url::Url;
    ///
    /// let base = Url::parse("https://kanjiapi.dev/v1/").unwrap();
    /// let endpoint = Endpoint::new(Method::GET, "/search")
    ///     .with_task(Task::parameters([("q", "water")]));
    ///
    /// let request = RequestBuilder::build(&endpoint, &base).unwrap();
    /// assert_eq!(request.url.as_str(), "https://kanjiapi.dev/v1/search?q=water");
    /// ```
    pub fn build(endpoint: &Endpoint, base_url: &Url) -> Result<Request> {
        let mut url = join_url(base_url, endpoint.path())?;

        let mut headers = HeaderMap::new();
        for (name, value) in endpoint.headers() {
            let (name, value) = header_pair(name, value)?;
            headers.insert(name, value);
        }

        let body = match endpoint.task() {
            Task::Plain => Bytes::new(),
            Task::Parameters(params) => {
                if !params.is_empty() {
                    let mut query = url.query_pairs_mut();
                    for (key, value) in params {
                        query.append_pair(key, value);
                    }
                }
                Bytes::new()
            }
            Task::JsonBody(payload) => {
                let json = payload
                    .to_json()
                    .map_err(|e| ErrorKind::EncodingFailed(e.to_string()))?;
                headers.insert(CONTENT_TYPE, HeaderValue::from_static(APPLICATION_JSON));
                Bytes::from(json)
            }
            Task::RawData(data) => data.clone(),
            Task::Multipart(parts) => {
                let boundary = multipart::generate_boundary();
                let content_type = format!("{MULTIPART_FORM_DATA}; boundary={boundary}");
                let value = HeaderValue::try_from(content_type)
                    .map_err(|e| ErrorKind::EncodingFailed(e.to_string()))?;
                headers.insert(CONTENT_TYPE, value);
                multipart::encode(parts, &boundary)
            }
        };

        Ok(Request {
            method: endpoint.method().clone(),
            url,
            headers,
            body,
            timeout: endpoint.timeout(),
            cache_policy: endpoint.cache_policy(),
        })
    }
}

fn join_url(base_url: &Url, path: &str) -> Result<Url> {
    if base_url.cannot_be_a_base() {
        return Err(ErrorKind::InvalidUrl.into());
    }

    let mut joined = base_url.clone();
    joined.set_query(None);
    joined.set_fragment(None);

    let base = joined.as_str().trim_end_matches('/');
    let path = path.trim_start_matches('/');
    let raw = if path.is_empty() {
        base.to_string()
    } else {
        format!("{base}/{path}")
    };

    Url::parse(&raw).map_err(|e| {
        tracing::error!(error = %e, url = %raw, "Failed to resolve endpoint URL");
        ErrorModel::from(ErrorKind::InvalidUrl)
    })
}

fn header_pair(name: &str, value: &str) -> std::result::Result<(HeaderName, HeaderValue), ErrorKind> {
    let name = HeaderName::try_from(name)
        .map_err(|e| ErrorKind::EncodingFailed(format!("Invalid header name: {}", e)))?;
    let value = HeaderValue::try_from(value)
        .map_err(|e| ErrorKind::EncodingFailed(format!("Invalid header value: {}", e)))?;
    Ok((name, value))
}
