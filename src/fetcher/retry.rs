use chrono::{DateTime, Utc};
use reqwest::StatusCode;
use std::time::Duration;

/// Statuses that indicate throttling or a transient upstream failure.
pub fn is_retryable_status(status: StatusCode) -> bool {
    matches!(status.as_u16(), 429 | 502 | 503 | 504)
}

/// Exponential backoff: `min(cap, base * 2^attempt)`.
pub fn calculate_backoff_delay(attempt: u32, base: Duration, cap: Duration) -> Duration {
    // 2^20 already exceeds any sane cap
    let capped_attempt = attempt.min(20);
    let base_ms = u64::try_from(base.as_millis()).unwrap_or(u64::MAX);
    let delay_ms = base_ms.saturating_mul(1_u64 << capped_attempt);
    Duration::from_millis(delay_ms).min(cap)
}

/// Parse a `Retry-After` header value relative to `now`.
///
/// Digit-only values are seconds. Anything else is tried as an HTTP date; dates
/// in the past yield zero. Unparseable values yield `None`.
pub fn parse_retry_after(value: &str, now: DateTime<Utc>) -> Option<Duration> {
    let value = value.trim();
    if !value.is_empty() && value.bytes().all(|b| b.is_ascii_digit()) {
        return value.parse::<u64>().ok().map(Duration::from_secs);
    }

    let date = DateTime::parse_from_rfc2822(value)
        .ok()?
        .with_timezone(&Utc);
    Some((date - now).to_std().unwrap_or(Duration::ZERO))
}
