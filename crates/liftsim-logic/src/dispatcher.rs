//! Group dispatcher: picks the one car in a synchronized group that will
//! actually serve a new hall call.
//!
//! Priority for an UP call at floor `f` (DOWN mirrors it):
//! 1. a car moving UP whose next stop is at or below `f` (picks it up en route)
//! 2. the nearest suspended car (direction NONE)
//! 3. of the cars moving DOWN, the highest one (closest to reversing)
//! 4. a car moving UP whose next stop is already past `f`
//! 5. the first car of the group
//!
//! The result depends only on the cars' states and their order, never on
//! when calls arrived, so repeated calls return the same car.

use crate::car::Car;
use crate::direction::Direction;
use crate::error::LiftError;
use crate::events::SimEvent;
use crate::floors::FloorRange;
use crate::hall_calls::HallCallRegistry;

/// Read-only car state the dispatcher is allowed to see.
pub trait CarView {
    fn current_floor(&self) -> i32;
    fn direction(&self) -> Direction;
    fn is_moving(&self) -> bool;
    /// Only called when `is_moving()` is true.
    fn next_stop_floor(&self) -> i32;
}

impl CarView for Car {
    fn current_floor(&self) -> i32 {
        Car::current_floor(self)
    }

    fn direction(&self) -> Direction {
        Car::direction(self)
    }

    fn is_moving(&self) -> bool {
        Car::is_moving(self)
    }

    fn next_stop_floor(&self) -> i32 {
        Car::next_stop_floor(self)
    }
}

impl<T: CarView + ?Sized> CarView for &T {
    fn current_floor(&self) -> i32 {
        (**self).current_floor()
    }

    fn direction(&self) -> Direction {
        (**self).direction()
    }

    fn is_moving(&self) -> bool {
        (**self).is_moving()
    }

    fn next_stop_floor(&self) -> i32 {
        (**self).next_stop_floor()
    }
}

/// Where the car will next stop: its target while moving, otherwise the
/// floor it is standing at.
fn heading_floor<C: CarView>(car: &C) -> i32 {
    if car.is_moving() {
        car.next_stop_floor()
    } else {
        car.current_floor()
    }
}

/// Pick the best car for a hall call. Returns an index into `cars`, or
/// `None` for an empty group.
pub fn pick_best_car<C: CarView>(request_floor: i32, direction: Direction, cars: &[C]) -> Option<usize> {
    match cars.len() {
        0 => None,
        1 => Some(0),
        _ => Some(match direction {
            Direction::Up => best_for_up(request_floor, cars),
            Direction::Down => best_for_down(request_floor, cars),
            Direction::None => 0,
        }),
    }
}

fn best_for_up<C: CarView>(floor: i32, cars: &[C]) -> usize {
    // Going up too and still below us
    if let Some(i) = cars
        .iter()
        .position(|c| c.direction() == Direction::Up && heading_floor(c) <= floor)
    {
        return i;
    }
    if let Some(i) = nearest_suspended(floor, cars) {
        return i;
    }
    // Going down but about to finish its sweep
    if let Some(i) = extreme_in_direction(Direction::Down, cars) {
        return i;
    }
    // Going up but already past us
    if let Some(i) = cars
        .iter()
        .position(|c| c.direction() == Direction::Up && heading_floor(c) > floor)
    {
        return i;
    }
    0
}

fn best_for_down<C: CarView>(floor: i32, cars: &[C]) -> usize {
    if let Some(i) = cars
        .iter()
        .position(|c| c.direction() == Direction::Down && heading_floor(c) >= floor)
    {
        return i;
    }
    if let Some(i) = nearest_suspended(floor, cars) {
        return i;
    }
    if let Some(i) = extreme_in_direction(Direction::Up, cars) {
        return i;
    }
    if let Some(i) = cars
        .iter()
        .position(|c| c.direction() == Direction::Down && heading_floor(c) < floor)
    {
        return i;
    }
    0
}

/// Nearest car with no direction; the first one wins ties.
fn nearest_suspended<C: CarView>(floor: i32, cars: &[C]) -> Option<usize> {
    let mut best: Option<(usize, u32)> = None;
    for (i, car) in cars.iter().enumerate() {
        if car.direction() != Direction::None {
            continue;
        }
        let distance = FloorRange::distance(car.current_floor(), floor);
        if best.map_or(true, |(_, d)| distance < d) {
            best = Some((i, distance));
        }
    }
    best.map(|(i, _)| i)
}

/// Among cars heading `direction`, the one furthest along its sweep: the
/// highest car when moving DOWN, the lowest when moving UP.
fn extreme_in_direction<C: CarView>(direction: Direction, cars: &[C]) -> Option<usize> {
    let mut best: Option<(usize, i32)> = None;
    for (i, car) in cars.iter().enumerate() {
        if car.direction() != direction {
            continue;
        }
        let floor = car.current_floor();
        let better = match best {
            None => true,
            Some((_, f)) => match direction {
                Direction::Down => floor > f,
                Direction::Up => floor < f,
                Direction::None => false,
            },
        };
        if better {
            best = Some((i, floor));
        }
    }
    best.map(|(i, _)| i)
}

/// Route a hall call placed at `target_car`.
///
/// An independent car lights its own button and queues the request. A
/// grouped car lights the button on every member, then only the member
/// chosen by [`pick_best_car`] queues it. Returns the index (into `cars`)
/// of the car that received the request.
pub fn dispatch_hall_call(
    cars: &mut [Car],
    registry: &mut HallCallRegistry,
    target_car: &str,
    floor: i32,
    direction: Direction,
    events: &mut Vec<SimEvent>,
) -> Result<Option<usize>, LiftError> {
    registry.range().check_button(floor, direction)?;
    let index = cars
        .iter()
        .position(|c| c.id() == target_car)
        .ok_or_else(|| LiftError::UnknownCar(target_car.to_string()))?;

    let group = match cars[index].group() {
        Some(group) => group.to_string(),
        None => {
            registry.turn_on(target_car, floor, direction, events);
            cars[index].add_request(floor, direction)?;
            return Ok(Some(index));
        }
    };

    // Mirrored to every member by the registry
    registry.turn_on(target_car, floor, direction, events);

    let members: Vec<usize> = registry
        .group_members(&group)
        .iter()
        .filter_map(|id| cars.iter().position(|c| c.id() == id))
        .collect();
    let chosen = {
        let views: Vec<&Car> = members.iter().map(|&i| &cars[i]).collect();
        pick_best_car(floor, direction, &views).map(|i| members[i])
    };

    match chosen {
        Some(i) => {
            log::debug!(
                "group {} call {}{} assigned to {}",
                group,
                floor,
                direction,
                cars[i].id()
            );
            cars[i].add_request(floor, direction)?;
            Ok(Some(i))
        }
        None => {
            log::debug!("group {} has no cars, call {}{} unassigned", group, floor, direction);
            Ok(None)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug, Clone, Copy)]
    struct Fake {
        floor: i32,
        direction: Direction,
        next_stop: Option<i32>,
    }

    impl Fake {
        fn suspended(floor: i32) -> Self {
            Self {
                floor,
                direction: Direction::None,
                next_stop: None,
            }
        }

        fn moving(floor: i32, direction: Direction, next_stop: i32) -> Self {
            Self {
                floor,
                direction,
                next_stop: Some(next_stop),
            }
        }
    }

    impl CarView for Fake {
        fn current_floor(&self) -> i32 {
            self.floor
        }

        fn direction(&self) -> Direction {
            self.direction
        }

        fn is_moving(&self) -> bool {
            self.next_stop.is_some()
        }

        fn next_stop_floor(&self) -> i32 {
            self.next_stop.unwrap_or(self.floor)
        }
    }

    #[test]
    fn test_empty_and_single() {
        let none: [Fake; 0] = [];
        assert_eq!(pick_best_car(3, Direction::Up, &none), None);
        let one = [Fake::moving(9, Direction::Down, 8)];
        assert_eq!(pick_best_car(3, Direction::Up, &one), Some(0));
    }

    #[test]
    fn test_up_prefers_car_passing_through() {
        let cars = [
            Fake::suspended(4),
            Fake::moving(1, Direction::Up, 2),
        ];
        assert_eq!(pick_best_car(5, Direction::Up, &cars), Some(1));
    }

    #[test]
    fn test_up_nearest_suspended() {
        let cars = [
            Fake::suspended(9),
            Fake::suspended(3),
            Fake::moving(8, Direction::Down, 6),
        ];
        assert_eq!(pick_best_car(4, Direction::Up, &cars), Some(1));
    }

    #[test]
    fn test_suspended_tie_first_match() {
        let cars = [Fake::suspended(2), Fake::suspended(6)];
        assert_eq!(pick_best_car(4, Direction::Down, &cars), Some(0));
    }

    #[test]
    fn test_up_highest_down_mover() {
        let cars = [
            Fake::moving(3, Direction::Down, 2),
            Fake::moving(7, Direction::Down, 5),
            Fake::moving(6, Direction::Up, 8),
        ];
        assert_eq!(pick_best_car(4, Direction::Up, &cars), Some(1));
    }

    #[test]
    fn test_up_overshooting_car() {
        let cars = [
            Fake::moving(3, Direction::Up, 6),
            Fake::moving(5, Direction::Up, 9),
        ];
        assert_eq!(pick_best_car(2, Direction::Up, &cars), Some(0));
    }

    #[test]
    fn test_down_mirrors_up() {
        let passing = [
            Fake::suspended(1),
            Fake::moving(9, Direction::Down, 6),
        ];
        assert_eq!(pick_best_car(5, Direction::Down, &passing), Some(1));

        let up_movers = [
            Fake::moving(6, Direction::Up, 8),
            Fake::moving(2, Direction::Up, 4),
        ];
        assert_eq!(pick_best_car(5, Direction::Down, &up_movers), Some(1));

        let missed = [
            Fake::moving(4, Direction::Down, 3),
            Fake::moving(3, Direction::Down, 1),
        ];
        assert_eq!(pick_best_car(5, Direction::Down, &missed), Some(0));
    }

    #[test]
    fn test_stationary_car_heads_from_current_floor() {
        // Direction UP with doors open at 3: it will leave from 3
        let cars = [
            Fake::suspended(9),
            Fake {
                floor: 3,
                direction: Direction::Up,
                next_stop: None,
            },
        ];
        assert_eq!(pick_best_car(6, Direction::Up, &cars), Some(1));
    }

    #[test]
    fn test_deterministic() {
        let cars = [
            Fake::moving(2, Direction::Up, 7),
            Fake::suspended(10),
            Fake::moving(8, Direction::Down, 5),
        ];
        let first = pick_best_car(6, Direction::Down, &cars);
        for _ in 0..10 {
            assert_eq!(pick_best_car(6, Direction::Down, &cars), first);
        }
    }

    fn group_setup() -> (Vec<Car>, HallCallRegistry) {
        let range = FloorRange::new(12, 0);
        let mut registry = HallCallRegistry::new(range);
        let mut cars = Vec::new();
        for (id, group, floor) in [("S1", Some("G"), 1), ("S2", Some("G"), 10), ("I1", None, 5)] {
            registry.register_car(id, group);
            cars.push(Car::new(id, group.map(String::from), range, floor).unwrap());
        }
        (cars, registry)
    }

    #[test]
    fn test_dispatch_independent_car() {
        let (mut cars, mut registry) = group_setup();
        let mut events = Vec::new();
        let chosen = dispatch_hall_call(&mut cars, &mut registry, "I1", 3, Direction::Up, &mut events);
        assert_eq!(chosen, Ok(Some(2)));
        assert!(registry.is_lit("I1", 3, Direction::Up));
        assert!(!registry.is_lit("S1", 3, Direction::Up));
        assert!(cars[2].up_requests().contains(&3));
    }

    #[test]
    fn test_dispatch_group_lights_all_assigns_one() {
        let (mut cars, mut registry) = group_setup();
        let mut events = Vec::new();
        let chosen = dispatch_hall_call(&mut cars, &mut registry, "S1", 9, Direction::Down, &mut events)
            .unwrap();
        // Both suspended, S2 at 10 is nearest
        assert_eq!(chosen, Some(1));
        assert!(registry.is_lit("S1", 9, Direction::Down));
        assert!(registry.is_lit("S2", 9, Direction::Down));
        assert!(cars[1].down_requests().contains(&9));
        assert!(cars[0].down_requests().is_empty());
    }

    #[test]
    fn test_dispatch_rejects_bad_input() {
        let (mut cars, mut registry) = group_setup();
        let mut events = Vec::new();
        assert_eq!(
            dispatch_hall_call(&mut cars, &mut registry, "X9", 3, Direction::Up, &mut events),
            Err(LiftError::UnknownCar("X9".into()))
        );
        assert!(dispatch_hall_call(&mut cars, &mut registry, "S1", 0, Direction::Up, &mut events).is_err());
        assert!(events.is_empty());
    }
}
