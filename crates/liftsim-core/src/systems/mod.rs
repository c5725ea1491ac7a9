//! Systems - logic that runs on scheduler ticks

mod cars;
mod passengers;

pub use cars::*;
pub use passengers::*;
