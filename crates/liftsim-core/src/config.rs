//! Building configuration, loaded from JSON.
//!
//! Every field has a default so partial files work; the defaults describe
//! a ten-floor residence (two levels underground) with a synchronized pair
//! of cars and one independent car.

use std::collections::{BTreeMap, HashSet};
use std::path::Path;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use liftsim_logic::FloorRange;

/// Total floors a building may have.
pub const MIN_FLOORS: i32 = 3;
pub const MAX_FLOORS: i32 = 13;
pub const MAX_UNDERGROUNDS: i32 = 3;
pub const MIN_ELEVATORS: usize = 1;
pub const MAX_ELEVATORS: usize = 6;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("cannot read config: {0}")]
    Io(#[from] std::io::Error),
    #[error("malformed config: {0}")]
    Json(#[from] serde_json::Error),
    #[error("invalid config: {0}")]
    Invalid(String),
}

/// A named set of cars dispatched together.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GroupConfig {
    pub name: String,
    pub cars: Vec<String>,
}

/// Logical durations in milliseconds of simulation time.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TimingConfig {
    /// Cadence of each car's decision step.
    pub operate_interval_ms: u64,
    /// Cadence of door transitions.
    pub door_step_ms: u64,
    /// How long doors stay fully open.
    pub dwell_ms: u64,
    /// Travel time per floor.
    pub floor_travel_ms: u64,
    /// Cadence of the arrival generator.
    pub controller_interval_ms: u64,
    /// How often waiting passengers check the cars they called.
    pub wait_poll_ms: u64,
}

impl Default for TimingConfig {
    fn default() -> Self {
        Self {
            operate_interval_ms: 500,
            door_step_ms: 100,
            dwell_ms: 2000,
            floor_travel_ms: 750,
            controller_interval_ms: 500,
            wait_poll_ms: 500,
        }
    }
}

impl TimingConfig {
    /// Door ticks spent fully open.
    pub fn dwell_ticks(&self) -> u32 {
        let step = self.door_step_ms.max(1);
        self.dwell_ms.div_ceil(step).max(1) as u32
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TrafficConfig {
    /// Spawn random passengers on controller ticks.
    pub enabled: bool,
    /// Chance per controller tick that a passenger shows up, when the
    /// building is not already busy.
    pub spawn_chance_percent: u8,
}

impl Default for TrafficConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            spawn_chance_percent: 20,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BuildingConfig {
    pub above_ground: i32,
    pub underground: i32,
    pub groups: Vec<GroupConfig>,
    pub independent: Vec<String>,
    /// Fixed starting floors; cars not listed start on a random floor.
    pub initial_floors: BTreeMap<String, i32>,
    pub timing: TimingConfig,
    pub traffic: TrafficConfig,
    /// Seed for the arrival generator and initial floors.
    pub seed: Option<u64>,
}

impl Default for BuildingConfig {
    fn default() -> Self {
        Self {
            above_ground: 8,
            underground: 2,
            groups: vec![GroupConfig {
                name: "SYNC".to_string(),
                cars: vec!["SYNC#1".to_string(), "SYNC#2".to_string()],
            }],
            independent: vec!["ASYNC#1".to_string()],
            initial_floors: BTreeMap::new(),
            timing: TimingConfig::default(),
            traffic: TrafficConfig::default(),
            seed: None,
        }
    }
}

impl BuildingConfig {
    pub fn from_json_str(json: &str) -> Result<Self, ConfigError> {
        let config: BuildingConfig = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path)?;
        Self::from_json_str(&contents)
    }

    pub fn floor_range(&self) -> FloorRange {
        FloorRange::new(self.above_ground, self.underground)
    }

    pub fn total_floors(&self) -> i32 {
        self.above_ground + self.underground
    }

    /// Every car as (id, group), groups first in declaration order.
    pub fn cars(&self) -> Vec<(String, Option<String>)> {
        let grouped = self
            .groups
            .iter()
            .flat_map(|g| g.cars.iter().map(move |id| (id.clone(), Some(g.name.clone()))));
        let independent = self.independent.iter().map(|id| (id.clone(), None));
        grouped.chain(independent).collect()
    }

    pub fn car_count(&self) -> usize {
        self.groups.iter().map(|g| g.cars.len()).sum::<usize>() + self.independent.len()
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        let invalid = |msg: String| Err(ConfigError::Invalid(msg));

        let total = self.total_floors();
        if !(MIN_FLOORS..=MAX_FLOORS).contains(&total) {
            return invalid(format!("{} floors, expected {}..={}", total, MIN_FLOORS, MAX_FLOORS));
        }
        if !(0..=MAX_UNDERGROUNDS).contains(&self.underground) {
            return invalid(format!(
                "{} underground floors, expected 0..={}",
                self.underground, MAX_UNDERGROUNDS
            ));
        }
        // Arrivals need a ground floor and at least one floor above it
        if self.above_ground < 2 {
            return invalid(format!("{} floors above ground, need at least 2", self.above_ground));
        }

        let count = self.car_count();
        if !(MIN_ELEVATORS..=MAX_ELEVATORS).contains(&count) {
            return invalid(format!("{} cars, expected {}..={}", count, MIN_ELEVATORS, MAX_ELEVATORS));
        }

        let mut seen = HashSet::new();
        for (id, _) in self.cars() {
            if id.trim().is_empty() {
                return invalid("empty car id".to_string());
            }
            if !seen.insert(id.clone()) {
                return invalid(format!("duplicate car id '{}'", id));
            }
        }
        let mut group_names = HashSet::new();
        for group in &self.groups {
            if group.cars.is_empty() {
                return invalid(format!("group '{}' has no cars", group.name));
            }
            if !group_names.insert(group.name.as_str()) {
                return invalid(format!("duplicate group '{}'", group.name));
            }
        }

        let range = self.floor_range();
        for (id, &floor) in &self.initial_floors {
            if !seen.contains(id) {
                return invalid(format!("initial floor given for unknown car '{}'", id));
            }
            if !range.contains(floor) {
                return invalid(format!("initial floor {} of car '{}' is not served", floor, id));
            }
        }

        let t = &self.timing;
        let intervals = [
            ("operate_interval_ms", t.operate_interval_ms),
            ("door_step_ms", t.door_step_ms),
            ("dwell_ms", t.dwell_ms),
            ("floor_travel_ms", t.floor_travel_ms),
            ("controller_interval_ms", t.controller_interval_ms),
            ("wait_poll_ms", t.wait_poll_ms),
        ];
        for (name, value) in intervals {
            if value == 0 {
                return invalid(format!("{} must be positive", name));
            }
        }
        // A waiting passenger must get to see the doors open after the car
        // has settled its direction
        if t.dwell_ms < t.operate_interval_ms + t.wait_poll_ms {
            return invalid(format!(
                "dwell_ms {} shorter than operate_interval_ms + wait_poll_ms ({})",
                t.dwell_ms,
                t.operate_interval_ms + t.wait_poll_ms
            ));
        }
        if self.traffic.spawn_chance_percent > 100 {
            return invalid(format!(
                "spawn_chance_percent {} above 100",
                self.traffic.spawn_chance_percent
            ));
        }

        Ok(())
    }
}
