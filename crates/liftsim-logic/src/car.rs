//! Car state machine: door/motion phase, request queues, next-stop choice.
//!
//! A car cycles `Idle → Opening → Waiting → Closing → Idle`, and leaves
//! `Idle` for `Moving` once a destination is chosen. `Moving` always ends
//! in `Opening` at the target floor and cannot be redirected: requests that
//! arrive en route are queued and only considered at the next decision.
//!
//! Three periodic steps drive a car, each owned by the scheduler:
//! - [`Car::operate`] - reversal, request clearing, next destination
//! - [`Car::step_motion`] - one floor of travel
//! - [`Car::step_doors`] - one door tick (alighting happens here)

use std::collections::{BTreeMap, BTreeSet};

use serde::{Deserialize, Serialize};

use crate::direction::Direction;
use crate::error::LiftError;
use crate::events::{PassengerId, SimEvent};
use crate::floors::FloorRange;
use crate::hall_calls::HallCallRegistry;

/// Door/motion phase of a car.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum CarPhase {
    /// Stationary with doors fully closed; the decision point.
    Idle,
    Opening,
    /// Doors fully open, boarding window.
    Waiting,
    Closing,
    Moving,
}

#[derive(Debug, Clone)]
pub struct Car {
    id: String,
    group: Option<String>,
    range: FloorRange,
    floor: i32,
    direction: Direction,
    phase: CarPhase,
    up_requests: BTreeSet<i32>,
    down_requests: BTreeSet<i32>,
    destinations: BTreeSet<i32>,
    /// onboard passenger → end floor
    passengers: BTreeMap<PassengerId, i32>,
    /// Flip direction once the current target is reached.
    need_reverse: bool,
    target: Option<i32>,
    dwell_elapsed: u32,
}

impl Car {
    /// Create an idle car with closed doors and no direction.
    pub fn new(
        id: impl Into<String>,
        group: Option<String>,
        range: FloorRange,
        initial_floor: i32,
    ) -> Result<Self, LiftError> {
        range.check(initial_floor)?;
        Ok(Self {
            id: id.into(),
            group,
            range,
            floor: initial_floor,
            direction: Direction::None,
            phase: CarPhase::Idle,
            up_requests: BTreeSet::new(),
            down_requests: BTreeSet::new(),
            destinations: BTreeSet::new(),
            passengers: BTreeMap::new(),
            need_reverse: false,
            target: None,
            dwell_elapsed: 0,
        })
    }

    // ── Accessors ──────────────────────────────────────────────────────

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn group(&self) -> Option<&str> {
        self.group.as_deref()
    }

    pub fn is_synchronized(&self) -> bool {
        self.group.is_some()
    }

    pub fn current_floor(&self) -> i32 {
        self.floor
    }

    pub fn direction(&self) -> Direction {
        self.direction
    }

    pub fn phase(&self) -> CarPhase {
        self.phase
    }

    pub fn is_moving(&self) -> bool {
        self.phase == CarPhase::Moving
    }

    /// Doors fully open.
    pub fn is_door_open(&self) -> bool {
        self.phase == CarPhase::Waiting
    }

    /// Doors fully closed and stationary.
    pub fn is_door_closed(&self) -> bool {
        self.phase == CarPhase::Idle
    }

    /// Floor the car is travelling to. Only meaningful while moving; callers
    /// must check [`Car::is_moving`] first.
    pub fn next_stop_floor(&self) -> i32 {
        debug_assert!(
            self.is_moving(),
            "next_stop_floor queried on car {} while {:?}",
            self.id,
            self.phase
        );
        self.target.unwrap_or(self.floor)
    }

    pub fn need_reverse(&self) -> bool {
        self.need_reverse
    }

    pub fn up_requests(&self) -> &BTreeSet<i32> {
        &self.up_requests
    }

    pub fn down_requests(&self) -> &BTreeSet<i32> {
        &self.down_requests
    }

    pub fn destinations(&self) -> &BTreeSet<i32> {
        &self.destinations
    }

    pub fn passenger_count(&self) -> usize {
        self.passengers.len()
    }

    pub fn has_passenger(&self, passenger: PassengerId) -> bool {
        self.passengers.contains_key(&passenger)
    }

    pub fn has_pending_work(&self) -> bool {
        !self.up_requests.is_empty()
            || !self.down_requests.is_empty()
            || !self.destinations.is_empty()
            || !self.passengers.is_empty()
    }

    // ── Inbound calls ──────────────────────────────────────────────────

    /// Queue a hall request. Returns `false` when it was already pending.
    pub fn add_request(&mut self, floor: i32, direction: Direction) -> Result<bool, LiftError> {
        self.range.check_button(floor, direction)?;
        let added = match direction {
            Direction::Up => self.up_requests.insert(floor),
            Direction::Down => self.down_requests.insert(floor),
            Direction::None => false,
        };
        Ok(added)
    }

    /// Take a passenger on board; their end floor becomes a destination.
    pub fn add_passenger(&mut self, passenger: PassengerId, end_floor: i32) -> Result<(), LiftError> {
        self.range.check(end_floor)?;
        self.passengers.insert(passenger, end_floor);
        self.destinations.insert(end_floor);
        Ok(())
    }

    // ── Periodic steps ─────────────────────────────────────────────────

    /// Decision step. Does nothing while moving; otherwise applies a pending
    /// reversal, clears the request matching the current floor and direction,
    /// and once the doors are closed picks the next destination.
    pub fn operate(&mut self, registry: &mut HallCallRegistry, events: &mut Vec<SimEvent>) {
        if self.is_moving() {
            return;
        }

        // Flip before clearing so waiting passengers see the new heading
        if self.need_reverse {
            self.need_reverse = false;
            self.direction = self.direction.opposite();
            log::debug!("car {} reversed to {} at floor {}", self.id, self.direction, self.floor);
        }

        self.remove_request(self.floor, self.direction, registry, events);

        if !self.is_door_closed() {
            return;
        }

        match self.direction {
            Direction::Up => self.handle_going_up(events),
            Direction::Down => self.handle_going_down(events),
            Direction::None => self.resolve_direction(events),
        }
    }

    /// Advance one floor toward the target. On reaching it the car stops
    /// and starts opening its doors.
    pub fn step_motion(&mut self, events: &mut Vec<SimEvent>) {
        if !self.is_moving() {
            return;
        }
        let target = match self.target {
            Some(target) => target,
            None => {
                // Moving without a target cannot be produced by start_moving
                debug_assert!(false, "car {} moving without a target", self.id);
                self.phase = CarPhase::Idle;
                return;
            }
        };

        if self.floor != target {
            self.floor = FloorRange::step_toward(self.floor, target);
        }
        if self.floor == target {
            self.arrive(events);
        }
    }

    /// One door tick. Returns the passengers who got off on this tick.
    pub fn step_doors(&mut self, dwell_ticks: u32, events: &mut Vec<SimEvent>) -> Vec<PassengerId> {
        match self.phase {
            CarPhase::Opening => {
                self.phase = CarPhase::Waiting;
                self.dwell_elapsed = 0;
                self.release_passengers(events)
            }
            CarPhase::Waiting => {
                self.dwell_elapsed += 1;
                if self.dwell_elapsed >= dwell_ticks {
                    self.phase = CarPhase::Closing;
                }
                Vec::new()
            }
            CarPhase::Closing => {
                self.phase = CarPhase::Idle;
                events.push(SimEvent::CarDoorsClosed {
                    car: self.id.clone(),
                    floor: self.floor,
                });
                Vec::new()
            }
            CarPhase::Idle | CarPhase::Moving => Vec::new(),
        }
    }

    // ── Internals ──────────────────────────────────────────────────────

    fn remove_request(
        &mut self,
        floor: i32,
        direction: Direction,
        registry: &mut HallCallRegistry,
        events: &mut Vec<SimEvent>,
    ) {
        // The registry mirrors this across the whole group
        registry.turn_off(&self.id, floor, direction, events);
        match direction {
            Direction::Up => {
                self.up_requests.remove(&floor);
            }
            Direction::Down => {
                self.down_requests.remove(&floor);
            }
            Direction::None => {}
        }
    }

    /// Nearest stop going up: the lowest destination after merging every
    /// UP request above the car.
    fn handle_going_up(&mut self, events: &mut Vec<SimEvent>) {
        let above: Vec<i32> = self
            .up_requests
            .iter()
            .copied()
            .filter(|&f| f > self.floor)
            .collect();
        self.destinations.extend(above);

        match self.destinations.pop_first() {
            Some(next) => self.start_moving(next, events),
            None => self.resolve_direction(events),
        }
    }

    /// Nearest stop going down: the highest destination after merging every
    /// DOWN request below the car.
    fn handle_going_down(&mut self, events: &mut Vec<SimEvent>) {
        let below: Vec<i32> = self
            .down_requests
            .iter()
            .copied()
            .filter(|&f| f < self.floor)
            .collect();
        self.destinations.extend(below);

        match self.destinations.pop_last() {
            Some(next) => self.start_moving(next, events),
            None => self.resolve_direction(events),
        }
    }

    /// Pick a heading from scratch. The new direction points at the nearest
    /// floor with any request (ties go to the lower floor). When that floor
    /// only wants the opposite direction, the car sweeps to the far end of
    /// the opposite-direction callers first and reverses there: a car at 10
    /// with UP calls at 8, 6 and 4 goes to 4 and collects them on the way up.
    fn resolve_direction(&mut self, events: &mut Vec<SimEvent>) {
        self.direction = Direction::None;
        self.need_reverse = false;

        let floor = self.floor;
        let nearest = self
            .up_requests
            .union(&self.down_requests)
            .copied()
            .min_by_key(|&f| FloorRange::distance(floor, f));
        let nearest = match nearest {
            Some(nearest) => nearest,
            None => return,
        };

        let up_here = self.up_requests.contains(&nearest);
        let down_here = self.down_requests.contains(&nearest);

        let target = if floor >= nearest {
            self.direction = Direction::Down;
            if up_here && !down_here {
                self.need_reverse = true;
                self.up_requests.first().copied().unwrap_or(nearest)
            } else {
                nearest
            }
        } else {
            self.direction = Direction::Up;
            if down_here && !up_here {
                self.need_reverse = true;
                self.down_requests.last().copied().unwrap_or(nearest)
            } else {
                nearest
            }
        };

        log::debug!(
            "car {} at {} resolved {} toward {} (nearest request {}, reverse={})",
            self.id,
            floor,
            self.direction,
            target,
            nearest,
            self.need_reverse
        );
        self.start_moving(target, events);
    }

    fn start_moving(&mut self, target: i32, events: &mut Vec<SimEvent>) {
        self.phase = CarPhase::Moving;
        self.target = Some(target);
        events.push(SimEvent::CarStartedMoving {
            car: self.id.clone(),
            from: self.floor,
            to: target,
            direction: self.direction,
        });
    }

    fn arrive(&mut self, events: &mut Vec<SimEvent>) {
        self.target = None;
        self.destinations.remove(&self.floor);
        self.phase = CarPhase::Opening;
        log::debug!("car {} arrived at {}", self.id, self.floor);
        events.push(SimEvent::CarArrived {
            car: self.id.clone(),
            floor: self.floor,
        });
        events.push(SimEvent::CarDoorsOpening {
            car: self.id.clone(),
            floor: self.floor,
        });
    }

    fn release_passengers(&mut self, events: &mut Vec<SimEvent>) -> Vec<PassengerId> {
        let leavers: Vec<PassengerId> = self
            .passengers
            .iter()
            .filter(|(_, &end)| end == self.floor)
            .map(|(&id, _)| id)
            .collect();
        for id in &leavers {
            self.passengers.remove(id);
            events.push(SimEvent::PassengerAlighted {
                passenger: *id,
                car: self.id.clone(),
            });
        }
        leavers
    }

    pub fn snapshot(&self) -> CarSnapshot {
        CarSnapshot {
            id: self.id.clone(),
            group: self.group.clone(),
            floor: self.floor,
            direction: self.direction,
            phase: self.phase,
            up_requests: self.up_requests.iter().copied().collect(),
            down_requests: self.down_requests.iter().copied().collect(),
            destinations: self.destinations.iter().copied().collect(),
            passengers: self.passengers.len(),
            next_stop: if self.is_moving() { self.target } else { None },
            need_reverse: self.need_reverse,
        }
    }
}

/// Read-only view of a car for status displays and harness output.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CarSnapshot {
    pub id: String,
    pub group: Option<String>,
    pub floor: i32,
    pub direction: Direction,
    pub phase: CarPhase,
    pub up_requests: Vec<i32>,
    pub down_requests: Vec<i32>,
    pub destinations: Vec<i32>,
    pub passengers: usize,
    pub next_stop: Option<i32>,
    pub need_reverse: bool,
}
