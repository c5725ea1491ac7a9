//! Passenger systems - hall calls, boarding, walking and departure

use hecs::{Entity, World};
use serde::{Deserialize, Serialize};

use liftsim_logic::boarding::plan_hall_calls;
use liftsim_logic::dispatcher::dispatch_hall_call;
use liftsim_logic::hall_calls::HallCallRegistry;
use liftsim_logic::{Car, PassengerId, SimEvent};

use crate::components::{Arrival, Passenger, PassengerPhase};

/// Running totals over every passenger the engine has seen
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TrafficStats {
    pub spawned: u64,
    pub boarded: u64,
    /// Passengers who reached their end floor and left
    pub served: u64,
    /// Sum of spawn-to-boarding times
    pub total_wait_ms: u64,
}

impl TrafficStats {
    pub fn average_wait_ms(&self) -> Option<f64> {
        if self.boarded == 0 {
            None
        } else {
            Some(self.total_wait_ms as f64 / self.boarded as f64)
        }
    }
}

/// One waiting-poll: departures, walking, boarding, then hall calls.
pub fn waiting_system(
    world: &mut World,
    cars: &mut [Car],
    registry: &mut HallCallRegistry,
    events: &mut Vec<SimEvent>,
    stats: &mut TrafficStats,
    now_ms: u64,
) {
    stats.served += despawn_finished(world) as u64;
    walking_system(world);
    boarding_system(world, cars, events, stats, now_ms);
    hall_call_system(world, cars, registry, events);
}

/// Remove passengers who have walked out. Returns how many left.
pub fn despawn_finished(world: &mut World) -> usize {
    let done: Vec<(Entity, PassengerId, i32)> = world
        .query::<&Passenger>()
        .iter()
        .filter(|(_, p)| p.is_done())
        .map(|(entity, p)| (entity, p.id, p.end_floor))
        .collect();

    for (entity, id, floor) in &done {
        let _ = world.despawn(*entity);
        log::info!("passenger {} left at floor {}", id, floor);
    }
    done.len()
}

/// Walking in or out takes a single poll.
pub fn walking_system(world: &mut World) {
    for (_, passenger) in world.query_mut::<&mut Passenger>() {
        passenger.advance();
    }
}

/// Passengers in a phase, ordered by id so ticks are reproducible.
fn passengers_in(world: &World, phase: PassengerPhase) -> Vec<(PassengerId, Entity)> {
    let mut found: Vec<(PassengerId, Entity)> = world
        .query::<&Passenger>()
        .iter()
        .filter(|(_, p)| p.phase == phase)
        .map(|(entity, p)| (p.id, entity))
        .collect();
    found.sort_by_key(|(id, _)| *id);
    found
}

/// Waiting passengers step into any watched car that is open at their
/// floor and heading their way.
pub fn boarding_system(
    world: &mut World,
    cars: &mut [Car],
    events: &mut Vec<SimEvent>,
    stats: &mut TrafficStats,
    now_ms: u64,
) {
    for (id, entity) in passengers_in(world, PassengerPhase::Waiting) {
        let Ok((passenger, arrival)) = world.query_one_mut::<(&mut Passenger, &mut Arrival)>(entity) else {
            continue;
        };
        let Some(index) = passenger.find_boardable(cars) else {
            continue;
        };

        match passenger.board(&mut cars[index], events) {
            Ok(()) => {
                arrival.boarded_at_ms = Some(now_ms);
                stats.boarded += 1;
                stats.total_wait_ms += arrival.wait_ms().unwrap_or(0);
                log::debug!("passenger {} boarded {} at floor {}", id, cars[index].id(), passenger.start_floor);
            }
            Err(err) => log::warn!("passenger {} could not board {}: {}", id, cars[index].id(), err),
        }
    }
}

/// New arrivals press every reachable button and start waiting. A waiting
/// passenger whose buttons have all gone dark without a ride presses again.
pub fn hall_call_system(
    world: &mut World,
    cars: &mut [Car],
    registry: &mut HallCallRegistry,
    events: &mut Vec<SimEvent>,
) {
    let (calls, watched) = plan_hall_calls(cars);

    let mut pressing = passengers_in(world, PassengerPhase::Enter);
    for (id, entity) in passengers_in(world, PassengerPhase::Waiting) {
        let Ok(passenger) = world.get::<&Passenger>(entity) else {
            continue;
        };
        let dark = !passenger
            .requested_cars
            .iter()
            .any(|car| registry.is_lit(car, passenger.start_floor, passenger.direction()));
        if dark {
            log::debug!("passenger {} pressing again at floor {}", id, passenger.start_floor);
            pressing.push((id, entity));
        }
    }

    for (id, entity) in pressing {
        let Ok(mut passenger) = world.get::<&mut Passenger>(entity) else {
            continue;
        };
        let (floor, direction) = (passenger.start_floor, passenger.direction());
        for call in &calls {
            if let Err(err) = dispatch_hall_call(cars, registry, call.car_id(), floor, direction, events) {
                log::warn!("hall call {}{} for passenger {} rejected: {}", floor, direction, id, err);
            }
        }
        if passenger.phase == PassengerPhase::Enter {
            passenger.start_waiting(watched.clone());
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use liftsim_logic::{Direction, FloorRange};

    fn range() -> FloorRange {
        FloorRange::new(8, 1)
    }

    fn building() -> (Vec<Car>, HallCallRegistry) {
        let mut registry = HallCallRegistry::new(range());
        let mut cars = Vec::new();
        for (id, group, floor) in [("S1", Some("SYNC"), 1), ("S2", Some("SYNC"), 6), ("I1", None, 3)] {
            registry.register_car(id, group);
            cars.push(Car::new(id, group.map(String::from), range(), floor).unwrap());
        }
        (cars, registry)
    }

    fn spawn(world: &mut World, id: u64, start: i32, end: i32) -> Entity {
        let passenger = Passenger::new(PassengerId(id), start, end, range()).unwrap();
        world.spawn((passenger, Arrival::new(0)))
    }

    #[test]
    fn test_new_passenger_calls_group_and_independent() {
        let (mut cars, mut registry) = building();
        let mut world = World::new();
        let mut events = Vec::new();
        let entity = spawn(&mut world, 1, 4, 8);

        hall_call_system(&mut world, &mut cars, &mut registry, &mut events);

        let passenger = world.get::<&Passenger>(entity).unwrap();
        assert!(passenger.is_waiting());
        assert_eq!(passenger.requested_cars, vec!["S1", "S2", "I1"]);
        for car in ["S1", "S2", "I1"] {
            assert!(registry.is_lit(car, 4, Direction::Up));
        }
        // Exactly one group member plus the independent car took the request
        let takers = cars.iter().filter(|c| c.up_requests().contains(&4)).count();
        assert_eq!(takers, 2);
        assert!(cars[2].up_requests().contains(&4));
    }

    #[test]
    fn test_dark_buttons_are_pressed_again() {
        let (mut cars, mut registry) = building();
        let mut world = World::new();
        let mut events = Vec::new();
        spawn(&mut world, 1, 2, 5);
        hall_call_system(&mut world, &mut cars, &mut registry, &mut events);

        for car in ["S1", "I1"] {
            registry.turn_off(car, 2, Direction::Up, &mut events);
        }
        assert!(!registry.is_lit("S2", 2, Direction::Up));

        hall_call_system(&mut world, &mut cars, &mut registry, &mut events);
        assert!(registry.is_lit("S2", 2, Direction::Up));
        assert!(registry.is_lit("I1", 2, Direction::Up));
    }

    #[test]
    fn test_walking_and_departure() {
        let mut world = World::new();
        let entity = spawn(&mut world, 1, 1, 3);
        world.get::<&mut Passenger>(entity).unwrap().phase = PassengerPhase::WalkOut;

        assert_eq!(despawn_finished(&mut world), 0);
        walking_system(&mut world);
        assert!(world.get::<&Passenger>(entity).unwrap().is_done());
        assert_eq!(despawn_finished(&mut world), 1);
        assert!(!world.contains(entity));
    }

    #[test]
    fn test_average_wait() {
        let mut stats = TrafficStats::default();
        assert_eq!(stats.average_wait_ms(), None);
        stats.boarded = 4;
        stats.total_wait_ms = 10_000;
        assert_eq!(stats.average_wait_ms(), Some(2500.0));
    }
}
