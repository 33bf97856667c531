//! In-flight invocation tracking
//!
//! Guarantees at most one live process per (source, document) pair. A
//! request that arrives while the same pair is already executing awaits the
//! pending invocation and shares its outcome instead of spawning a sibling
//! process against the same content.

use std::collections::HashMap;
use std::sync::Mutex;

use futures::FutureExt;
use futures::future::{BoxFuture, Shared};

use crate::models::document::DocumentId;
use crate::models::outcome::Outcome;

type FlightKey = (u64, DocumentId);
type SharedFlight = Shared<BoxFuture<'static, Outcome>>;

#[derive(Default)]
pub struct InflightMap {
    flights: Mutex<HashMap<FlightKey, SharedFlight>>,
}

impl InflightMap {
    pub fn new() -> Self {
        Self::default()
    }

    /// Run `work` for the key, or join an already-running invocation.
    pub async fn run(&self, key: FlightKey, work: BoxFuture<'static, Outcome>) -> Outcome {
        let (flight, owner) = {
            let mut flights = self.flights.lock().expect("inflight lock poisoned");
            match flights.get(&key) {
                Some(existing) => {
                    tracing::debug!("Joining in-flight invocation for {:?}", key);
                    (existing.clone(), false)
                }
                None => {
                    let shared = work.shared();
                    flights.insert(key.clone(), shared.clone());
                    (shared, true)
                }
            }
        };

        let outcome = flight.await;

        if owner {
            let mut flights = self.flights.lock().expect("inflight lock poisoned");
            flights.remove(&key);
        }
        outcome
    }

    #[cfg(test)]
    pub fn len(&self) -> usize {
        self.flights.lock().unwrap().len()
    }
}
