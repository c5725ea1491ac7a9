//! People-related components.
//!
//! A passenger entity carries the boarding state machine itself
//! ([`Passenger`]) plus the bookkeeping the engine needs for statistics.

use serde::{Deserialize, Serialize};

pub use liftsim_logic::boarding::{Passenger, PassengerPhase};

/// When a passenger showed up and when they got on a car, in simulation ms
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Arrival {
    pub spawned_at_ms: u64,
    pub boarded_at_ms: Option<u64>,
}

impl Arrival {
    pub fn new(spawned_at_ms: u64) -> Self {
        Self {
            spawned_at_ms,
            boarded_at_ms: None,
        }
    }

    /// Time spent waiting for a car, or `None` while still waiting
    pub fn wait_ms(&self) -> Option<u64> {
        self.boarded_at_ms
            .map(|boarded| boarded.saturating_sub(self.spawned_at_ms))
    }
}
