//! Component definitions for passenger entities.
//!
//! Components are pure data structs attached to entities.
//! They have no behavior - that lives in systems and in `liftsim_logic`.

mod people;

pub use people::*;
