//! Looks up a kanji and prints its entry.
//!
//! This example shows how to:
//! - Create a client with the default stack
//! - Describe a call with an `Endpoint` and a `RetryPolicy`
//! - Decode the JSON response and inspect the error model on failure
//!
//! Run with: `cargo run --example kanji -- 走`
//!
//! Set `KANJI_API_URL` to point at another server.

use http::Method;
use relaycall::{Client, DelayStrategy, Endpoint, RetryPolicy};
use serde::Deserialize;
use std::time::Duration;

const DEFAULT_BASE_URL: &str = "https://kanjiapi.dev/v1/";

#[derive(Debug, Deserialize)]
struct Kanji {
    kanji: String,
    stroke_count: u32,
    #[serde(default)]
    meanings: Vec<String>,
    #[serde(default)]
    on_readings: Vec<String>,
    #[serde(default)]
    kun_readings: Vec<String>,
}

#[tokio::main]
async fn main() -> relaycall::Result<()> {
    // Initialize tracing for logging
    tracing_subscriber::fmt()
        .with_env_filter("relaycall=debug,kanji=info")
        .init();

    let character = std::env::args().nth(1).unwrap_or_else(|| "走".to_string());
    let base_url = std::env::var("KANJI_API_URL").unwrap_or_else(|_| DEFAULT_BASE_URL.to_string());

    let client = Client::builder().base_url(&base_url)?.build()?;

    let endpoint = Endpoint::new(Method::GET, format!("/kanji/{character}"))
        .with_timeout(Duration::from_secs(10))
        .with_retry_policy(RetryPolicy::new(
            3,
            Duration::from_secs(1),
            DelayStrategy::Exponential,
        ));

    match client.request::<Kanji>(&endpoint).await {
        Ok(response) => {
            println!("=== {} ===", response.kanji);
            println!("Strokes: {}", response.stroke_count);
            println!("Meanings: {}", response.meanings.join(", "));
            println!("On: {}", response.on_readings.join("、"));
            println!("Kun: {}", response.kun_readings.join("、"));
            println!();
            println!("Latency: {:?}", response.latency);
            println!("Attempts: {}", response.attempts);
        }
        Err(e) => {
            eprintln!("Lookup failed: {}", e);
            if let Some(code) = e.code() {
                eprintln!("  Status: {}", code);
            }
            if let Some(body) = e.raw_body() {
                eprintln!("  Body: {}", String::from_utf8_lossy(body));
            }
            return Err(e);
        }
    }

    Ok(())
}
