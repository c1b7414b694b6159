use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::time::Duration;

use crate::fetcher::block::BlockMarker;

/// Character encoding detected for a response body.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum Charset {
    Utf8,
    Windows1252,
    ShiftJis,
    Gb2312,
    Big5,
    Other(String),
}

impl Charset {
    pub fn from_encoding(encoding: &'static encoding_rs::Encoding) -> Self {
        use std::ptr;

        if ptr::eq(encoding, encoding_rs::UTF_8) {
            Self::Utf8
        } else if ptr::eq(encoding, encoding_rs::WINDOWS_1252) {
            Self::Windows1252
        } else if ptr::eq(encoding, encoding_rs::SHIFT_JIS) {
            Self::ShiftJis
        } else if ptr::eq(encoding, encoding_rs::GBK) || ptr::eq(encoding, encoding_rs::GB18030) {
            Self::Gb2312
        } else if ptr::eq(encoding, encoding_rs::BIG5) {
            Self::Big5
        } else {
            Self::Other(encoding.name().to_string())
        }
    }

    pub fn encoding(&self) -> &'static encoding_rs::Encoding {
        match self {
            Self::Utf8 => encoding_rs::UTF_8,
            Self::Windows1252 => encoding_rs::WINDOWS_1252,
            Self::ShiftJis => encoding_rs::SHIFT_JIS,
            Self::Gb2312 => encoding_rs::GBK,
            Self::Big5 => encoding_rs::BIG5,
            Self::Other(name) => {
                encoding_rs::Encoding::for_label(name.as_bytes()).unwrap_or(encoding_rs::UTF_8)
            }
        }
    }
}

/// Minimum spacing between two requests to the same host.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct HostPacing {
    pub min_interval_ms: u64,
    pub jitter_ms: u64,
}

impl HostPacing {
    pub fn min_interval(&self) -> Duration {
        Duration::from_millis(self.min_interval_ms)
    }
}

impl Default for HostPacing {
    fn default() -> Self {
        Self {
            min_interval_ms: 1500,
            jitter_ms: 750,
        }
    }
}

/// Fetcher configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct FetcherConfig {
    /// Maximum number of requests in flight across all hosts.
    pub concurrency: usize,
    /// Pacing used for hosts without an override.
    pub pacing: HostPacing,
    /// Per-hostname pacing overrides.
    pub host_pacing: HashMap<String, HostPacing>,
    /// Retries after the first attempt.
    pub max_retries: u32,
    /// Bound on a single attempt, headers and body included.
    pub timeout_ms: u64,
    pub backoff_base_ms: u64,
    pub backoff_cap_ms: u64,
    /// How much of each body is scanned for block markers.
    pub block_scan_bytes: usize,
    pub max_body_bytes: u64,
    pub user_agent: String,
    pub block_markers: Vec<BlockMarker>,
}

impl FetcherConfig {
    pub fn pacing_for(&self, host: &str) -> HostPacing {
        self.host_pacing.get(host).copied().unwrap_or(self.pacing)
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }
}

impl Default for FetcherConfig {
    fn default() -> Self {
        Self {
            concurrency: 2,
            pacing: HostPacing::default(),
            host_pacing: HashMap::new(),
            max_retries: 3,
            timeout_ms: 20_000,
            backoff_base_ms: 500,
            backoff_cap_ms: 60_000,
            block_scan_bytes: 64 * 1024,
            max_body_bytes: 8 * 1024 * 1024,
            user_agent: "Mozilla/5.0 (X11; Linux x86_64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/129.0 Safari/537.36".to_string(),
            block_markers: BlockMarker::defaults(),
        }
    }
}

/// Structured events emitted while a fetch progresses.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum FetchEvent {
    QueueWait {
        url: String,
    },
    QueueAcquired {
        url: String,
        waited_ms: u64,
    },
    HostWait {
        host: String,
        wait_ms: u64,
    },
    AttemptStarted {
        url: String,
        attempt: u32,
    },
    AttemptFinished {
        url: String,
        attempt: u32,
        status: Option<u16>,
        latency_ms: u64,
    },
    /// The body had byte sequences invalid for `charset`.
    LossyDecode {
        url: String,
        charset: String,
    },
    BlockDetected {
        url: String,
        host: String,
        status: u16,
        marker: String,
    },
    RetryScheduled {
        url: String,
        attempt: u32,
        reason: String,
        wait_ms: u64,
    },
}

/// Receiver of fetch events. Implementations must not block.
pub trait FetchEventSink: Send + Sync {
    fn emit(&self, event: FetchEvent);
}

/// Discards every event.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoopSink;

impl FetchEventSink for NoopSink {
    fn emit(&self, _event: FetchEvent) {}
}

/// Forwards events into an unbounded channel; dropped once the receiver is gone.
#[derive(Debug, Clone)]
pub struct ChannelSink {
    sender: tokio::sync::mpsc::UnboundedSender<FetchEvent>,
}

impl ChannelSink {
    pub fn new(sender: tokio::sync::mpsc::UnboundedSender<FetchEvent>) -> Self {
        Self { sender }
    }
}

impl FetchEventSink for ChannelSink {
    fn emit(&self, event: FetchEvent) {
        let _ = self.sender.send(event);
    }
}

pub(crate) fn millis(d: Duration) -> u64 {
    u64::try_from(d.as_millis()).unwrap_or(u64::MAX)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pacing_override_falls_back_to_default() {
        let mut config = FetcherConfig::default();
        config.host_pacing.insert(
            "www.youtube.com".to_string(),
            HostPacing {
                min_interval_ms: 4000,
                jitter_ms: 0,
            },
        );

        assert_eq!(config.pacing_for("www.youtube.com").min_interval_ms, 4000);
        assert_eq!(config.pacing_for("example.com"), config.pacing);
    }

    #[test]
    fn config_deserializes_partial_document() {
        let config: FetcherConfig =
            serde_json::from_str(r#"{"concurrency": 5, "max_retries": 1}"#).unwrap();
        assert_eq!(config.concurrency, 5);
        assert_eq!(config.max_retries, 1);
        assert_eq!(config.backoff_base_ms, 500);
        assert!(!config.block_markers.is_empty());
    }

    #[test]
    fn charset_round_trips_through_encoding() {
        assert_eq!(Charset::from_encoding(encoding_rs::UTF_8), Charset::Utf8);
        assert_eq!(Charset::Big5.encoding(), encoding_rs::BIG5);
        let other = Charset::from_encoding(encoding_rs::KOI8_R);
        assert_eq!(other.encoding(), encoding_rs::KOI8_R);
    }
}
