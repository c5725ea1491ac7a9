//! Errors rejected at the call boundary.
//!
//! Nothing here is raised for internal inconsistency: a car queried out of
//! contract (e.g. `next_stop_floor` while not moving) is a programming error
//! and trips a debug assertion instead.

use thiserror::Error;

use crate::direction::Direction;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LiftError {
    /// Floor 0, or a floor outside the building.
    #[error("floor {floor} is not served (valid floors are {bottom}..={top}, excluding 0)")]
    InvalidFloor { floor: i32, bottom: i32, top: i32 },

    /// No hall button exists for this floor/direction pair.
    #[error("no {direction} hall button at floor {floor}")]
    InvalidDirection { floor: i32, direction: Direction },

    /// A dispatch request named a car that is not in the building.
    #[error("unknown car '{0}'")]
    UnknownCar(String),

    #[error("passenger trip starts and ends at floor {0}")]
    ZeroLengthTrip(i32),
}
