//! LiftSim Core - Elevator Group Simulation Engine
//!
//! Runs the pure dispatch rules from `liftsim_logic` on a logical clock:
//! cars step through their door and motion phases, a residence-style
//! arrival generator spawns passengers, and passengers call, board and
//! ride cars until they reach their floor.
//!
//! # Architecture
//!
//! - **Scheduler**: periodic tickers per car (decision, travel, doors) plus
//!   the arrival generator and the waiting-passenger poll. Ticks run one at
//!   a time in time order, so a run is reproducible from its seed.
//! - **Entities**: passengers live in a `hecs` world as [`components::Passenger`]
//!   plus [`components::Arrival`].
//! - **Systems**: logic that runs on a tick and updates cars and passengers.
//!
//! # Example
//!
//! ```rust,no_run
//! use liftsim_core::prelude::*;
//!
//! let config = BuildingConfig::load("data/building.json").unwrap();
//! let mut engine = SimulationEngine::new(config).unwrap();
//!
//! loop {
//!     engine.update(100);
//!     for event in engine.drain_events() {
//!         println!("{:?}", event);
//!     }
//! }
//! ```

pub mod components;
pub mod config;
pub mod engine;
pub mod scheduler;
pub mod systems;
pub mod traffic;

/// Commonly used types for convenient importing
pub mod prelude {
    pub use crate::components::*;
    pub use crate::config::{BuildingConfig, ConfigError};
    pub use crate::engine::{BuildingSnapshot, SimulationEngine};
    pub use crate::systems::TrafficStats;
    pub use liftsim_logic::{Car, Direction, FloorRange, LiftError, PassengerId, SimEvent};
}
