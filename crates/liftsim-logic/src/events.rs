//! Discrete events emitted by the core for a rendering layer to observe.
//!
//! The core never computes positions. Anything a renderer needs to animate
//! (doors, car travel, people walking in or out) is signalled here.

use serde::{Deserialize, Serialize};

use crate::direction::Direction;

/// Stable passenger identity, assigned by whoever spawns the passenger.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct PassengerId(pub u64);

impl std::fmt::Display for PassengerId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "#{}", self.0)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "event")]
pub enum SimEvent {
    CarStartedMoving {
        car: String,
        from: i32,
        to: i32,
        direction: Direction,
    },
    CarArrived {
        car: String,
        floor: i32,
    },
    CarDoorsOpening {
        car: String,
        floor: i32,
    },
    CarDoorsClosed {
        car: String,
        floor: i32,
    },
    PassengerSpawned {
        passenger: PassengerId,
        start: i32,
        end: i32,
    },
    PassengerBoarded {
        passenger: PassengerId,
        car: String,
    },
    PassengerAlighted {
        passenger: PassengerId,
        car: String,
    },
    ButtonLit {
        car: String,
        floor: i32,
        direction: Direction,
        lit: bool,
    },
}

impl SimEvent {
    /// Every floor number this event mentions.
    pub fn floors(&self) -> Vec<i32> {
        match self {
            SimEvent::CarStartedMoving { from, to, .. } => vec![*from, *to],
            SimEvent::CarArrived { floor, .. }
            | SimEvent::CarDoorsOpening { floor, .. }
            | SimEvent::CarDoorsClosed { floor, .. }
            | SimEvent::ButtonLit { floor, .. } => vec![*floor],
            SimEvent::PassengerSpawned { start, end, .. } => vec![*start, *end],
            SimEvent::PassengerBoarded { .. } | SimEvent::PassengerAlighted { .. } => Vec::new(),
        }
    }
}
