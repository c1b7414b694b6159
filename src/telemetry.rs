//! Logging setup and the fetch-event sink that writes to it.

use tracing::{debug, info, warn};
use tracing_subscriber::EnvFilter;

use crate::fetcher::{FetchEvent, FetchEventSink};

pub const ENV_LOG_FORMAT: &str = "LOG_FORMAT";
const DEFAULT_FILTER: &str = "info";

/// Install the global subscriber. `RUST_LOG` filters, `LOG_FORMAT=json`
/// switches to one JSON object per line.
pub fn init_tracing() -> anyhow::Result<()> {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_FILTER));
    let json = std::env::var(ENV_LOG_FORMAT).is_ok_and(|v| v.eq_ignore_ascii_case("json"));

    let builder = tracing_subscriber::fmt().with_env_filter(filter);
    let result = if json {
        builder.json().with_current_span(true).try_init()
    } else {
        builder.try_init()
    };
    result.map_err(|e| anyhow::anyhow!("failed to install tracing subscriber: {e}"))
}

/// Forwards fetch events to `tracing`; waits and retries at debug/info,
/// blocks at warn.
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingSink;

impl FetchEventSink for TracingSink {
    fn emit(&self, event: FetchEvent) {
        match event {
            FetchEvent::QueueWait { url } => debug!(%url, "Waiting for a fetch slot"),
            FetchEvent::QueueAcquired { url, waited_ms } => {
                debug!(%url, waited_ms, "Fetch slot acquired")
            }
            FetchEvent::HostWait { host, wait_ms } => debug!(%host, wait_ms, "Pacing host"),
            FetchEvent::AttemptStarted { url, attempt } => debug!(%url, attempt, "Fetching"),
            FetchEvent::AttemptFinished {
                url,
                attempt,
                status,
                latency_ms,
            } => debug!(%url, attempt, ?status, latency_ms, "Fetch finished"),
            FetchEvent::LossyDecode { url, charset } => {
                debug!(%url, %charset, "Body decoded with replacement characters")
            }
            FetchEvent::BlockDetected {
                url,
                host,
                status,
                marker,
            } => warn!(%url, %host, status, %marker, "Block page detected"),
            FetchEvent::RetryScheduled {
                url,
                attempt,
                reason,
                wait_ms,
            } => info!(%url, attempt, wait_ms, "Retrying: {}", reason),
        }
    }
}
