//! Rate limit hints parsed from rejected responses.
//!
//! The engine never retries HTTP-level failures, so these hints are surfaced on the
//! [`ErrorModel`](crate::ErrorModel) for callers that want to schedule a retry of
//! their own.

use http::HeaderMap;
use std::time::{Duration, SystemTime, UNIX_EPOCH};

/// Information extracted from rate limit headers.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RateLimitInfo {
    /// When the rate limit resets (from `X-RateLimit-Reset` or `RateLimit-Reset`).
    pub reset_at: Option<SystemTime>,

    /// How long to wait before retrying (from `Retry-After`).
    pub retry_after: Option<Duration>,

    /// Number of requests remaining in the current window.
    pub remaining: Option<u64>,
}

impl RateLimitInfo {
    /// Extracts rate limit information from HTTP response headers.
    ///
    /// Understands `Retry-After` (seconds or HTTP date), `X-RateLimit-Reset` and
    /// `RateLimit-Reset` (Unix timestamps) and `X-RateLimit-Remaining`.
    ///
    /// # Examples
    ///
    /// ```
    /// use relaycall::rate_limit::RateLimitInfo;
    /// use http::HeaderMap;
    ///
    /// let mut headers = HeaderMap::new();
    /// headers.insert("retry-after", "60".parse().unwrap());
    ///
    /// let info = RateLimitInfo::from_headers(&headers);
    /// assert_eq!(info.retry_after, Some(std::time::Duration::from_secs(60)));
    /// ```
    pub fn from_headers(headers: &HeaderMap) -> Self {
        Self {
            reset_at: parse_rate_limit_reset(headers),
            retry_after: parse_retry_after(headers),
            remaining: parse_rate_limit_remaining(headers),
        }
    }

    /// Returns `true` if any rate limit header was found.
    pub fn is_present(&self) -> bool {
        self.reset_at.is_some() || self.retry_after.is_some() || self.remaining.is_some()
    }

    /// Returns the recommended delay before retrying, capped by `max_wait`.
    ///
    /// `Retry-After` wins over the reset timestamp.
    pub fn delay(&self, max_wait: Duration) -> Option<Duration> {
        if let Some(retry_after) = self.retry_after {
            return Some(retry_after.min(max_wait));
        }

        let until_reset = self.reset_at?.duration_since(SystemTime::now()).ok()?;
        Some(until_reset.min(max_wait))
    }
}

fn parse_retry_after(headers: &HeaderMap) -> Option<Duration> {
    let header = headers.get("retry-after")?.to_str().ok()?;

    if let Ok(seconds) = header.parse::<u64>() {
        return Some(Duration::from_secs(seconds));
    }

    httpdate::parse_http_date(header)
        .ok()?
        .duration_since(SystemTime::now())
        .ok()
}

fn parse_rate_limit_reset(headers: &HeaderMap) -> Option<SystemTime> {
    ["x-ratelimit-reset", "ratelimit-reset"]
        .iter()
        .filter_map(|name| headers.get(*name)?.to_str().ok()?.parse::<u64>().ok())
        .map(|timestamp| UNIX_EPOCH + Duration::from_secs(timestamp))
        .next()
}

fn parse_rate_limit_remaining(headers: &HeaderMap) -> Option<u64> {
    headers
        .get("x-ratelimit-remaining")?
        .to_str()
        .ok()?
        .parse()
        .ok()
}

#[cfg(test)]
mod tests {
    use super::*;
    use http::HeaderValue;

    #[test]
    fn test_parse_retry_after_seconds() {
        let mut headers = HeaderMap::new();
        headers.insert("retry-after", HeaderValue::from_static("60"));

        assert_eq!(parse_retry_after(&headers), Some(Duration::from_secs(60)));
    }

    #[test]
    fn test_parse_retry_after_http_date() {
        let mut headers = HeaderMap::new();
        let when = SystemTime::now() + Duration::from_secs(120);
        headers.insert(
            "retry-after",
            HeaderValue::from_str(&httpdate::fmt_http_date(when)).unwrap(),
        );

        let delay = parse_retry_after(&headers).expect("delay");
        assert!(delay <= Duration::from_secs(120));
        assert!(delay >= Duration::from_secs(100));
    }

    #[test]
    fn test_reset_prefers_x_header() {
        let mut headers = HeaderMap::new();
        headers.insert("x-ratelimit-reset", HeaderValue::from_static("100"));
        headers.insert("ratelimit-reset", HeaderValue::from_static("200"));

        assert_eq!(
            parse_rate_limit_reset(&headers),
            Some(UNIX_EPOCH + Duration::from_secs(100))
        );
    }

    #[test]
    fn test_draft_reset_header() {
        let mut headers = HeaderMap::new();
        headers.insert("ratelimit-reset", HeaderValue::from_static("200"));

        assert_eq!(
            parse_rate_limit_reset(&headers),
            Some(UNIX_EPOCH + Duration::from_secs(200))
        );
    }

    #[test]
    fn test_parse_rate_limit_remaining() {
        let mut headers = HeaderMap::new();
        headers.insert("x-ratelimit-remaining", HeaderValue::from_static("42"));

        assert_eq!(parse_rate_limit_remaining(&headers), Some(42));
    }

    #[test]
    fn test_no_headers_means_not_present() {
        let info = RateLimitInfo::from_headers(&HeaderMap::new());
        assert!(!info.is_present());
        assert_eq!(info.delay(Duration::from_secs(10)), None);
    }

    #[test]
    fn test_delay_capped_by_max_wait() {
        let info = RateLimitInfo {
            reset_at: None,
            retry_after: Some(Duration::from_secs(600)),
            remaining: Some(0),
        };

        assert_eq!(
            info.delay(Duration::from_secs(300)),
            Some(Duration::from_secs(300))
        );
    }
}
