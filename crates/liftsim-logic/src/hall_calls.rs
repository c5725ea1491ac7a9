//! Hall call button registry.
//!
//! Single source of truth for which hall buttons are lit. Buttons are keyed
//! by (car, floor, direction) and created once when a car is registered.
//! Cars in a synchronized group share their buttons: lighting or clearing
//! one member's button does the same on every member, which is what lets
//! any member's arrival satisfy the shared call.

use std::collections::{BTreeMap, HashMap};

use serde::Serialize;

use crate::direction::Direction;
use crate::events::SimEvent;
use crate::floors::FloorRange;

#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
pub struct ButtonKey {
    pub car: String,
    pub floor: i32,
    pub direction: Direction,
}

#[derive(Debug, Clone)]
pub struct HallCallRegistry {
    range: FloorRange,
    buttons: BTreeMap<ButtonKey, bool>,
    /// group name → member car ids, in registration order
    groups: BTreeMap<String, Vec<String>>,
    /// car id → group name, for grouped cars only
    membership: HashMap<String, String>,
}

impl HallCallRegistry {
    pub fn new(range: FloorRange) -> Self {
        Self {
            range,
            buttons: BTreeMap::new(),
            groups: BTreeMap::new(),
            membership: HashMap::new(),
        }
    }

    /// Create every hall button for a car. Registering the same car twice
    /// keeps the existing lit state.
    pub fn register_car(&mut self, car_id: &str, group: Option<&str>) {
        for floor in self.range.floors() {
            for direction in [Direction::Up, Direction::Down] {
                if self.range.has_button(floor, direction) {
                    self.buttons
                        .entry(ButtonKey {
                            car: car_id.to_string(),
                            floor,
                            direction,
                        })
                        .or_insert(false);
                }
            }
        }

        if let Some(name) = group {
            let members = self.groups.entry(name.to_string()).or_default();
            if !members.iter().any(|m| m == car_id) {
                members.push(car_id.to_string());
            }
            self.membership
                .insert(car_id.to_string(), name.to_string());
        }
    }

    pub fn range(&self) -> FloorRange {
        self.range
    }

    pub fn group_of(&self, car_id: &str) -> Option<&str> {
        self.membership.get(car_id).map(String::as_str)
    }

    /// Members of a group in registration order; empty for unknown groups.
    pub fn group_members(&self, group: &str) -> &[String] {
        self.groups.get(group).map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn group_names(&self) -> impl Iterator<Item = &str> {
        self.groups.keys().map(String::as_str)
    }

    /// Cars whose button mirrors this car's: the whole group, or just the car.
    fn mirrored_cars(&self, car_id: &str) -> Vec<String> {
        match self.group_of(car_id) {
            Some(group) => self.group_members(group).to_vec(),
            None => vec![car_id.to_string()],
        }
    }

    pub fn turn_on(&mut self, car_id: &str, floor: i32, direction: Direction, events: &mut Vec<SimEvent>) {
        self.set_lit(car_id, floor, direction, true, events);
    }

    pub fn turn_off(&mut self, car_id: &str, floor: i32, direction: Direction, events: &mut Vec<SimEvent>) {
        self.set_lit(car_id, floor, direction, false, events);
    }

    /// Idempotent. Missing buttons (UP at the top floor, DOWN at the bottom,
    /// direction `None`) are ignored.
    fn set_lit(
        &mut self,
        car_id: &str,
        floor: i32,
        direction: Direction,
        lit: bool,
        events: &mut Vec<SimEvent>,
    ) {
        for car in self.mirrored_cars(car_id) {
            let key = ButtonKey {
                car,
                floor,
                direction,
            };
            if let Some(state) = self.buttons.get_mut(&key) {
                if *state != lit {
                    *state = lit;
                    events.push(SimEvent::ButtonLit {
                        car: key.car.clone(),
                        floor,
                        direction,
                        lit,
                    });
                }
            }
        }
    }

    pub fn is_lit(&self, car_id: &str, floor: i32, direction: Direction) -> bool {
        let key = ButtonKey {
            car: car_id.to_string(),
            floor,
            direction,
        };
        self.buttons.get(&key).copied().unwrap_or(false)
    }

    pub fn has_button(&self, car_id: &str, floor: i32, direction: Direction) -> bool {
        let key = ButtonKey {
            car: car_id.to_string(),
            floor,
            direction,
        };
        self.buttons.contains_key(&key)
    }

    /// All currently lit buttons, ordered by car, floor, direction.
    pub fn lit_buttons(&self) -> Vec<&ButtonKey> {
        self.buttons
            .iter()
            .filter(|(_, lit)| **lit)
            .map(|(key, _)| key)
            .collect()
    }

    pub fn button_count(&self) -> usize {
        self.buttons.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn registry() -> HallCallRegistry {
        let mut registry = HallCallRegistry::new(FloorRange::new(8, 2));
        registry.register_car("SYNC#1", Some("SYNC"));
        registry.register_car("SYNC#2", Some("SYNC"));
        registry.register_car("ASYNC#1", None);
        registry
    }

    #[test]
    fn test_button_layout() {
        let registry = registry();
        // 10 floors, 2 buttons each, minus top UP and bottom DOWN
        assert_eq!(registry.button_count(), 3 * 18);
        assert!(!registry.has_button("ASYNC#1", 8, Direction::Up));
        assert!(!registry.has_button("ASYNC#1", -2, Direction::Down));
        assert!(!registry.has_button("ASYNC#1", 0, Direction::Up));
    }

    #[test]
    fn test_group_mirroring() {
        let mut registry = registry();
        let mut events = Vec::new();

        registry.turn_on("SYNC#1", 4, Direction::Up, &mut events);
        assert!(registry.is_lit("SYNC#1", 4, Direction::Up));
        assert!(registry.is_lit("SYNC#2", 4, Direction::Up));
        assert!(!registry.is_lit("ASYNC#1", 4, Direction::Up));
        assert_eq!(events.len(), 2);

        registry.turn_off("SYNC#2", 4, Direction::Up, &mut events);
        assert!(!registry.is_lit("SYNC#1", 4, Direction::Up));
        assert!(!registry.is_lit("SYNC#2", 4, Direction::Up));
        assert_eq!(events.len(), 4);
    }

    #[test]
    fn test_idempotent() {
        let mut registry = registry();
        let mut events = Vec::new();

        registry.turn_on("ASYNC#1", 2, Direction::Down, &mut events);
        registry.turn_on("ASYNC#1", 2, Direction::Down, &mut events);
        assert_eq!(events.len(), 1);

        registry.turn_off("ASYNC#1", 2, Direction::Down, &mut events);
        registry.turn_off("ASYNC#1", 2, Direction::Down, &mut events);
        assert_eq!(events.len(), 2);
        assert!(registry.lit_buttons().is_empty());
    }

    #[test]
    fn test_missing_button_ignored() {
        let mut registry = registry();
        let mut events = Vec::new();
        registry.turn_on("ASYNC#1", 8, Direction::Up, &mut events);
        registry.turn_on("ASYNC#1", 3, Direction::None, &mut events);
        assert!(events.is_empty());
    }

    #[test]
    fn test_groups() {
        let registry = registry();
        assert_eq!(registry.group_of("SYNC#2"), Some("SYNC"));
        assert_eq!(registry.group_of("ASYNC#1"), None);
        assert_eq!(registry.group_members("SYNC"), ["SYNC#1", "SYNC#2"]);
        assert!(registry.group_members("NOPE").is_empty());
    }
}
