use std::sync::Arc;
use tokio::sync::{AcquireError, OwnedSemaphorePermit, Semaphore};

/// Bounds the number of requests in flight. Waiters are served in arrival
/// order because tokio's semaphore is fair.
#[derive(Debug, Clone)]
pub struct ConcurrencyGate {
    permits: Arc<Semaphore>,
}

impl ConcurrencyGate {
    pub fn new(limit: usize) -> Self {
        Self {
            permits: Arc::new(Semaphore::new(limit.max(1))),
        }
    }

    /// True when a caller arriving now would have to queue.
    pub fn is_saturated(&self) -> bool {
        self.permits.available_permits() == 0
    }

    pub async fn acquire(&self) -> Result<OwnedSemaphorePermit, AcquireError> {
        self.permits.clone().acquire_owned().await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn permits_are_bounded_and_released() {
        let gate = ConcurrencyGate::new(2);
        let a = gate.acquire().await.unwrap();
        assert!(!gate.is_saturated());
        let _b = gate.acquire().await.unwrap();
        assert!(gate.is_saturated());

        drop(a);
        assert!(!gate.is_saturated());
    }

    #[tokio::test]
    async fn zero_limit_is_raised_to_one() {
        let gate = ConcurrencyGate::new(0);
        assert!(!gate.is_saturated());
        let _permit = gate.acquire().await.unwrap();
        assert!(gate.is_saturated());
    }
}
