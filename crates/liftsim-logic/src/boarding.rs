//! Boarding protocol: how a waiting passenger finds and enters a car.
//!
//! A passenger calls every car in reach, then keeps polling those cars.
//! They board the first one that has its doors fully open at their start
//! floor and is heading their way. Alighting is driven by the car itself
//! when its doors open at the passenger's end floor.

use serde::{Deserialize, Serialize};

use crate::car::Car;
use crate::direction::Direction;
use crate::error::LiftError;
use crate::events::{PassengerId, SimEvent};
use crate::floors::FloorRange;

/// Lifecycle of a passenger. Walking phases are presentation-only and last
/// a single poll in the core.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PassengerPhase {
    Enter,
    Waiting,
    WalkIn,
    MoveWithLift,
    WalkOut,
    Exit,
}

/// One hall call a newly arrived passenger has to place.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CallTarget {
    /// One call reaches the whole group; any member can take it.
    Group { name: String, via: String },
    Car(String),
}

impl CallTarget {
    /// Car the call is placed at.
    pub fn car_id(&self) -> &str {
        match self {
            CallTarget::Group { via, .. } => via,
            CallTarget::Car(id) => id,
        }
    }
}

/// Calls to place and cars to watch for a passenger who can reach `cars`.
///
/// Grouped cars get one call per group, placed at the first member seen;
/// each independent car gets its own. Every car in reach is watched.
pub fn plan_hall_calls(cars: &[Car]) -> (Vec<CallTarget>, Vec<String>) {
    let mut calls = Vec::new();
    let mut watched = Vec::with_capacity(cars.len());
    let mut seen_groups: Vec<&str> = Vec::new();

    for car in cars {
        watched.push(car.id().to_string());
        match car.group() {
            Some(group) => {
                if !seen_groups.contains(&group) {
                    seen_groups.push(group);
                    calls.push(CallTarget::Group {
                        name: group.to_string(),
                        via: car.id().to_string(),
                    });
                }
            }
            None => calls.push(CallTarget::Car(car.id().to_string())),
        }
    }
    (calls, watched)
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Passenger {
    pub id: PassengerId,
    pub start_floor: i32,
    pub end_floor: i32,
    pub phase: PassengerPhase,
    /// Cars this passenger is watching, in the order they were called.
    pub requested_cars: Vec<String>,
    /// Car boarded, once on board.
    pub car: Option<String>,
}

impl Passenger {
    pub fn new(id: PassengerId, start_floor: i32, end_floor: i32, range: FloorRange) -> Result<Self, LiftError> {
        range.check(start_floor)?;
        range.check(end_floor)?;
        if start_floor == end_floor {
            return Err(LiftError::ZeroLengthTrip(start_floor));
        }
        Ok(Self {
            id,
            start_floor,
            end_floor,
            phase: PassengerPhase::Enter,
            requested_cars: Vec::new(),
            car: None,
        })
    }

    pub fn direction(&self) -> Direction {
        Direction::of_trip(self.start_floor, self.end_floor)
    }

    pub fn is_waiting(&self) -> bool {
        self.phase == PassengerPhase::Waiting
    }

    pub fn is_done(&self) -> bool {
        self.phase == PassengerPhase::Exit
    }

    /// Calls placed; start watching the requested cars.
    pub fn start_waiting(&mut self, requested_cars: Vec<String>) {
        self.requested_cars = requested_cars;
        self.phase = PassengerPhase::Waiting;
    }

    /// Doors fully open at our floor and heading our way.
    pub fn can_board(&self, car: &Car) -> bool {
        car.is_door_open()
            && car.current_floor() == self.start_floor
            && car.direction() == self.direction()
    }

    /// First watched car we could step into right now, as an index into `cars`.
    pub fn find_boardable(&self, cars: &[Car]) -> Option<usize> {
        if !self.is_waiting() {
            return None;
        }
        self.requested_cars.iter().find_map(|id| {
            cars.iter()
                .position(|c| c.id() == id)
                .filter(|&i| self.can_board(&cars[i]))
        })
    }

    /// Step into `car`. Adds our end floor to its destinations and drops
    /// interest in every other car.
    pub fn board(&mut self, car: &mut Car, events: &mut Vec<SimEvent>) -> Result<(), LiftError> {
        car.add_passenger(self.id, self.end_floor)?;
        self.phase = PassengerPhase::WalkIn;
        self.car = Some(car.id().to_string());
        self.requested_cars.clear();
        events.push(SimEvent::PassengerBoarded {
            passenger: self.id,
            car: car.id().to_string(),
        });
        Ok(())
    }

    /// Called when the car released us at our end floor.
    pub fn alight(&mut self) {
        self.phase = PassengerPhase::WalkOut;
    }

    /// Finish a walking phase.
    pub fn advance(&mut self) {
        self.phase = match self.phase {
            PassengerPhase::WalkIn => PassengerPhase::MoveWithLift,
            PassengerPhase::WalkOut => PassengerPhase::Exit,
            other => other,
        };
    }
}
