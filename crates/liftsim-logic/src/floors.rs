//! Served floor range and floor arithmetic.
//!
//! Floors are signed and skip zero: a building with two underground levels
//! and eight above ground serves `-2, -1, 1, 2, ..., 8`. Ground is floor 1.

use serde::{Deserialize, Serialize};

use crate::direction::Direction;
use crate::error::LiftError;

/// Ground floor; arrivals mostly start or end here.
pub const GROUND_FLOOR: i32 = 1;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct FloorRange {
    above_ground: i32,
    underground: i32,
}

impl FloorRange {
    /// Both counts are clamped at zero; validation of sensible sizes lives
    /// with the building configuration.
    pub fn new(above_ground: i32, underground: i32) -> Self {
        Self {
            above_ground: above_ground.max(0),
            underground: underground.max(0),
        }
    }

    pub fn above_ground(&self) -> i32 {
        self.above_ground
    }

    pub fn underground(&self) -> i32 {
        self.underground
    }

    /// Highest served floor.
    pub fn top(&self) -> i32 {
        self.above_ground
    }

    /// Lowest served floor.
    pub fn bottom(&self) -> i32 {
        if self.underground > 0 {
            -self.underground
        } else {
            GROUND_FLOOR
        }
    }

    /// Number of served floors.
    pub fn len(&self) -> usize {
        (self.above_ground + self.underground) as usize
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn contains(&self, floor: i32) -> bool {
        floor != 0 && floor >= self.bottom() && floor <= self.top()
    }

    /// Validate a floor coming in from outside the core.
    pub fn check(&self, floor: i32) -> Result<i32, LiftError> {
        if self.contains(floor) {
            Ok(floor)
        } else {
            Err(LiftError::InvalidFloor {
                floor,
                bottom: self.bottom(),
                top: self.top(),
            })
        }
    }

    /// All served floors, bottom to top.
    pub fn floors(&self) -> impl Iterator<Item = i32> {
        (self.bottom()..=self.top()).filter(|&f| f != 0)
    }

    /// Whether a hall button exists: the top floor has no UP button and the
    /// bottom floor has no DOWN button.
    pub fn has_button(&self, floor: i32, direction: Direction) -> bool {
        if !self.contains(floor) {
            return false;
        }
        match direction {
            Direction::Up => floor < self.top(),
            Direction::Down => floor > self.bottom(),
            Direction::None => false,
        }
    }

    /// Validate a hall call floor/direction pair.
    pub fn check_button(&self, floor: i32, direction: Direction) -> Result<(), LiftError> {
        self.check(floor)?;
        if self.has_button(floor, direction) {
            Ok(())
        } else {
            Err(LiftError::InvalidDirection { floor, direction })
        }
    }

    /// One floor closer to `to`, jumping straight between -1 and 1.
    pub fn step_toward(from: i32, to: i32) -> i32 {
        if to > from {
            if from == -1 {
                1
            } else {
                from + 1
            }
        } else if to < from {
            if from == 1 {
                -1
            } else {
                from - 1
            }
        } else {
            from
        }
    }

    /// Number of floors travelled between `a` and `b` (the missing floor 0
    /// is not counted).
    pub fn distance(a: i32, b: i32) -> u32 {
        let raw = (a - b).unsigned_abs();
        if (a < 0) != (b < 0) {
            raw - 1
        } else {
            raw
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bounds() {
        let range = FloorRange::new(8, 2);
        assert_eq!(range.top(), 8);
        assert_eq!(range.bottom(), -2);
        assert_eq!(range.len(), 10);
        assert_eq!(range.floors().count(), 10);
        assert!(range.floors().all(|f| f != 0));
    }

    #[test]
    fn test_no_underground() {
        let range = FloorRange::new(5, 0);
        assert_eq!(range.bottom(), 1);
        assert_eq!(range.floors().collect::<Vec<_>>(), vec![1, 2, 3, 4, 5]);
    }

    #[test]
    fn test_floor_zero_rejected() {
        let range = FloorRange::new(8, 2);
        assert!(!range.contains(0));
        assert_eq!(
            range.check(0),
            Err(LiftError::InvalidFloor {
                floor: 0,
                bottom: -2,
                top: 8
            })
        );
        assert!(range.check(9).is_err());
        assert!(range.check(-3).is_err());
        assert_eq!(range.check(-2), Ok(-2));
    }

    #[test]
    fn test_buttons_at_extremes() {
        let range = FloorRange::new(8, 2);
        assert!(!range.has_button(8, Direction::Up));
        assert!(range.has_button(8, Direction::Down));
        assert!(!range.has_button(-2, Direction::Down));
        assert!(range.has_button(-2, Direction::Up));
        assert!(!range.has_button(3, Direction::None));
        assert!(range.check_button(8, Direction::Up).is_err());
    }

    #[test]
    fn test_step_skips_zero() {
        assert_eq!(FloorRange::step_toward(-1, 4), 1);
        assert_eq!(FloorRange::step_toward(1, -2), -1);
        assert_eq!(FloorRange::step_toward(3, 5), 4);
        assert_eq!(FloorRange::step_toward(3, 3), 3);
    }

    #[test]
    fn test_distance() {
        assert_eq!(FloorRange::distance(1, -1), 1);
        assert_eq!(FloorRange::distance(-2, 3), 4);
        assert_eq!(FloorRange::distance(8, 2), 6);
        assert_eq!(FloorRange::distance(4, 4), 0);
    }
}
