//! Travel direction shared by cars, hall calls and passengers.

use serde::{Deserialize, Serialize};

/// Direction of travel. `None` marks a suspended car with no resolved heading.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Direction {
    Up,
    Down,
    None,
}

impl Direction {
    /// Flip UP and DOWN. `None` stays `None`.
    pub fn opposite(self) -> Self {
        match self {
            Direction::Up => Direction::Down,
            Direction::Down => Direction::Up,
            Direction::None => Direction::None,
        }
    }

    /// Heading of a trip: DOWN when `end <= start`, otherwise UP.
    pub fn of_trip(start: i32, end: i32) -> Self {
        if end <= start {
            Direction::Down
        } else {
            Direction::Up
        }
    }

    /// True for UP and DOWN, the only directions a hall button can carry.
    pub fn is_travel(self) -> bool {
        self != Direction::None
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Direction::Up => "up",
            Direction::Down => "down",
            Direction::None => "none",
        }
    }
}

impl std::fmt::Display for Direction {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}
