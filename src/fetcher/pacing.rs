//! Per-host request pacing.

use dashmap::DashMap;
use dashmap::mapref::entry::Entry;
use rand::Rng;
use std::time::Duration;
use tokio::time::Instant;

use crate::fetcher::types::HostPacing;

/// Remembers when each host was last (or will next be) requested.
///
/// `reserve` books the next start time for a host while holding the map entry,
/// so concurrent callers targeting one host are spaced apart rather than all
/// observing the same stale timestamp.
#[derive(Debug, Default)]
pub struct HostPacer {
    last_request: DashMap<String, Instant>,
}

impl HostPacer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Reserve a start slot for `host` and return how long to sleep before it.
    pub fn reserve(&self, host: &str, pacing: HostPacing) -> Duration {
        let now = Instant::now();
        match self.last_request.entry(host.to_string()) {
            Entry::Occupied(mut entry) => {
                let earliest = *entry.get() + pacing.min_interval();
                let wait = earliest.saturating_duration_since(now) + jitter(pacing.jitter_ms);
                entry.insert(now + wait);
                wait
            }
            Entry::Vacant(entry) => {
                entry.insert(now);
                Duration::ZERO
            }
        }
    }
}

fn jitter(max_ms: u64) -> Duration {
    if max_ms == 0 {
        return Duration::ZERO;
    }
    Duration::from_millis(rand::thread_rng().gen_range(0..=max_ms))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pacing(min_interval_ms: u64, jitter_ms: u64) -> HostPacing {
        HostPacing {
            min_interval_ms,
            jitter_ms,
        }
    }

    #[tokio::test]
    async fn first_request_to_host_is_immediate() {
        let pacer = HostPacer::new();
        assert_eq!(pacer.reserve("a.example", pacing(1000, 0)), Duration::ZERO);
        assert_eq!(pacer.reserve("b.example", pacing(1000, 0)), Duration::ZERO);
    }

    #[tokio::test]
    async fn back_to_back_reservations_are_spaced() {
        let pacer = HostPacer::new();
        let p = pacing(1000, 0);
        pacer.reserve("a.example", p);
        let second = pacer.reserve("a.example", p);
        let third = pacer.reserve("a.example", p);

        assert!(second > Duration::from_millis(900) && second <= Duration::from_millis(1000));
        assert!(third > Duration::from_millis(1900) && third <= Duration::from_millis(2000));
    }

    #[tokio::test]
    async fn jitter_stays_within_bound() {
        let pacer = HostPacer::new();
        let p = pacing(100, 50);
        pacer.reserve("a.example", p);
        let wait = pacer.reserve("a.example", p);
        assert!(wait <= Duration::from_millis(150));
    }
}
