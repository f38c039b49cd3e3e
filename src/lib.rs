//! # Relaycall - declarative HTTP endpoint execution
//!
//! Relaycall executes declaratively described HTTP endpoints against a base URL.
//! Each call waits for network connectivity, runs the request through an
//! interceptor, sends it over a pluggable transport, validates the status code and
//! retries transport-level failures with configurable backoff. Every failure is
//! reported through a single [`ErrorModel`].
//!
//! ## Quick Start
//!
//! ```no_run
//! use relaycall::{Client, DelayStrategy, Endpoint, RetryPolicy, Task};
//! use http::Method;
//! use serde::{Deserialize, Serialize};
//! use std::time::Duration;
//!
//! #[derive(Debug, Serialize)]
//! struct CreateNote {
//!     text: String,
//! }
//!
//! #[derive(Deserialize)]
//! struct Kanji {
//!     kanji: String,
//!     stroke_count: u32,
//! }
//!
//! #[tokio::main]
//! async fn main() -> relaycall::Result<()> {
//!     let client = Client::builder()
//!         .base_url("https://kanjiapi.dev/v1/")?
//!         .build()?;
//!
//!     // GET with three attempts and 1s, 2s backoff between them
//!     let endpoint = Endpoint::new(Method::GET, "/kanji/走")
//!         .with_retry_policy(RetryPolicy::new(3, Duration::from_secs(1), DelayStrategy::Exponential));
//!
//!     let kanji = client.request::<Kanji>(&endpoint).await?;
//!     println!("{} has {} strokes ({:?})", kanji.kanji, kanji.stroke_count, kanji.latency);
//!
//!     // POST a JSON body
//!     let note = Endpoint::new(Method::POST, "/notes").with_task(Task::json(CreateNote {
//!         text: "practice 走".to_string(),
//!     }));
//!     let raw = client.data(&note).await?;
//!     println!("{} bytes", raw.len());
//!
//!     Ok(())
//! }
//! ```
//!
//! ## Error Handling
//!
//! Non-2xx responses are never retried and keep the status code, the raw body and
//! any rate-limit headers:
//!
//! ```no_run
//! use relaycall::{Client, Endpoint, ErrorKind};
//! use http::Method;
//!
//! # async fn example() -> relaycall::Result<()> {
//! # let client = Client::builder().base_url("https://api.example.com")?.build()?;
//! match client.data(&Endpoint::new(Method::GET, "/endpoint")).await {
//!     Ok(body) => println!("Success: {} bytes", body.len()),
//!     Err(e) if e.kind() == &ErrorKind::TooManyRequests => {
//!         let wait = e.rate_limit().and_then(|info| info.retry_after);
//!         eprintln!("Rate limited, retry after {:?}", wait);
//!     }
//!     Err(e) => {
//!         eprintln!("{} (status {:?})", e.description(), e.code());
//!         if let Some(body) = e.raw_body() {
//!             eprintln!("  Raw response: {}", String::from_utf8_lossy(body));
//!         }
//!     }
//! }
//! # Ok(())
//! # }
//! ```
//!
//! ## Connectivity
//!
//! By default every attempt waits on the client's [`ConnectivityGate`]. Feed a
//! shared [`ConnectivityMonitor`] from whatever observes reachability, or switch to
//! [`ConnectivityWait::PerPolicy`] so only endpoints whose policy asks for it wait:
//!
//! ```no_run
//! use relaycall::{Client, ConnectivityMonitor, ConnectivityWait};
//! use std::sync::Arc;
//!
//! # fn example() -> relaycall::Result<()> {
//! let monitor = Arc::new(ConnectivityMonitor::new());
//! let client = Client::builder()
//!     .base_url("https://api.example.com")?
//!     .connectivity(monitor.clone())
//!     .connectivity_wait(ConnectivityWait::PerPolicy)
//!     .build()?;
//! # Ok(())
//! # }
//! ```

mod client;
pub mod connectivity;
pub mod endpoint;
mod error;
pub mod interceptor;
pub mod logger;
pub mod multipart;
pub mod rate_limit;
pub mod request;
mod response;
pub mod retry;
mod transport;
pub mod validator;

pub use client::{Client, ClientBuilder, ConnectivityWait};
pub use connectivity::{ConnectivityGate, ConnectivityMonitor};
pub use endpoint::{CachePolicy, Endpoint, JsonPayload, Task};
pub use error::{BoxError, ErrorKind, ErrorModel, Result};
pub use interceptor::{DefaultInterceptor, HeaderInterceptor, Interceptor, InterceptorChain};
pub use logger::{NetworkLogger, TracingLogger};
pub use multipart::MultipartPart;
pub use rate_limit::RateLimitInfo;
pub use request::{Request, RequestBuilder};
pub use response::{EmptyResponse, Response};
pub use retry::{DelayStrategy, RetryPolicy};
pub use transport::{HttpResponse, ReqwestTransport, Transport, TransportError};
pub use validator::{DefaultResponseValidator, ResponseValidator};
