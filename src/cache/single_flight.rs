//! Per-key fetch deduplication.
//!
//! A caller holding the [`FlightGuard`] for a key is the only one fetching it.
//! Others wait in `acquire` and re-check the cache once they get in.

use std::sync::Arc;

use dashmap::DashMap;
use tokio::sync::{Mutex, OwnedMutexGuard};

#[derive(Debug, Default, Clone)]
pub struct SingleFlight {
    flights: Arc<DashMap<String, Arc<Mutex<()>>>>,
}

/// Held for the duration of one fetch. Dropping it lets the next waiter in.
#[derive(Debug)]
pub struct FlightGuard {
    key: String,
    flights: Arc<DashMap<String, Arc<Mutex<()>>>>,
    guard: Option<OwnedMutexGuard<()>>,
}

impl SingleFlight {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn acquire(&self, key: &str) -> FlightGuard {
        let lock = self
            .flights
            .entry(key.to_string())
            .or_default()
            .clone();
        let guard = lock.lock_owned().await;

        FlightGuard {
            key: key.to_string(),
            flights: self.flights.clone(),
            guard: Some(guard),
        }
    }

    /// Keys with a fetch in flight or waiters queued.
    pub fn in_flight(&self) -> usize {
        self.flights.len()
    }
}

impl Drop for FlightGuard {
    fn drop(&mut self) {
        // Release first so our owned Arc is gone before the count check.
        self.guard.take();
        self.flights
            .remove_if(&self.key, |_, lock| Arc::strong_count(lock) == 1);
    }
}
