//! Pure dispatch and scheduling logic for LiftSim.
//!
//! This crate holds everything about elevator group control that does not
//! depend on a clock, a random source, or a renderer. Functions take plain
//! data and push discrete [`events::SimEvent`]s into a caller-owned buffer,
//! which keeps every rule unit-testable in isolation.
//!
//! # Module Overview
//!
//! | Module | Purpose |
//! |--------|---------|
//! | [`boarding`] | Passenger lifecycle, hall-call planning, boarding and alighting |
//! | [`car`] | Per-car door/motion state machine and request queues |
//! | [`direction`] | Travel direction of cars and passengers |
//! | [`dispatcher`] | Best-car selection for a synchronized group |
//! | [`error`] | Errors rejected at the call boundary |
//! | [`events`] | Events observed by a rendering layer |
//! | [`floors`] | Served floor range (no floor 0) and floor arithmetic |
//! | [`hall_calls`] | Hall call button registry with group mirroring |

pub mod boarding;
pub mod car;
pub mod direction;
pub mod dispatcher;
pub mod error;
pub mod events;
pub mod floors;
pub mod hall_calls;

pub use car::{Car, CarPhase, CarSnapshot};
pub use direction::Direction;
pub use error::LiftError;
pub use events::{PassengerId, SimEvent};
pub use floors::FloorRange;
