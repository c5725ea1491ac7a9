//! Simulation engine - main entry point for running the simulation

use hecs::World;
use rand::rngs::StdRng;
use rand::SeedableRng;
use serde::Serialize;

use liftsim_logic::dispatcher::dispatch_hall_call;
use liftsim_logic::hall_calls::{ButtonKey, HallCallRegistry};
use liftsim_logic::{Car, CarSnapshot, Direction, FloorRange, LiftError, PassengerId, SimEvent};

use crate::components::*;
use crate::config::{BuildingConfig, ConfigError};
use crate::scheduler::{Scheduler, TickKind};
use crate::systems::*;
use crate::traffic::{is_traffic_clear, pick_trip, random_floor};

/// Main simulation engine
pub struct SimulationEngine {
    /// ECS world holding one entity per passenger
    pub world: World,
    config: BuildingConfig,
    range: FloorRange,
    cars: Vec<Car>,
    registry: HallCallRegistry,
    scheduler: Scheduler,
    rng: StdRng,
    events: Vec<SimEvent>,
    stats: TrafficStats,
    /// Logical clock in milliseconds
    sim_time_ms: u64,
    next_passenger_id: u64,
    dwell_ticks: u32,
}

/// Whole-building state at one instant, for status output
#[derive(Debug, Clone, Serialize)]
pub struct BuildingSnapshot {
    pub sim_time_ms: u64,
    pub cars: Vec<CarSnapshot>,
    pub lit_buttons: Vec<ButtonKey>,
    pub passengers: usize,
    pub waiting: usize,
    pub stats: TrafficStats,
}

impl SimulationEngine {
    /// Build a simulation from a validated config. Cars without a fixed
    /// initial floor start on a random one.
    pub fn new(config: BuildingConfig) -> Result<Self, ConfigError> {
        config.validate()?;

        let range = config.floor_range();
        let mut rng = match config.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };

        let mut registry = HallCallRegistry::new(range);
        let mut cars = Vec::with_capacity(config.car_count());
        for (id, group) in config.cars() {
            let floor = match config.initial_floors.get(&id) {
                Some(&floor) => floor,
                None => random_floor(range, &mut rng),
            };
            registry.register_car(&id, group.as_deref());
            let car = Car::new(id, group, range, floor).map_err(|e| ConfigError::Invalid(e.to_string()))?;
            cars.push(car);
        }

        let timing = &config.timing;
        let mut scheduler = Scheduler::new();
        for i in 0..cars.len() {
            scheduler.register(TickKind::Operate(i), timing.operate_interval_ms, 0);
            scheduler.register(TickKind::Motion(i), timing.floor_travel_ms, 0);
            scheduler.register(TickKind::Doors(i), timing.door_step_ms, 0);
        }
        scheduler.register(TickKind::Traffic, timing.controller_interval_ms, 0);
        scheduler.register(TickKind::Waiting, timing.wait_poll_ms, 0);
        if !config.traffic.enabled {
            scheduler.set_enabled(|k| k == TickKind::Traffic, false, 0);
        }

        log::info!(
            "building ready: {} cars over floors {}..={}, traffic {}",
            cars.len(),
            range.bottom(),
            range.top(),
            if config.traffic.enabled { "on" } else { "off" }
        );

        Ok(Self {
            world: World::new(),
            dwell_ticks: timing.dwell_ticks(),
            config,
            range,
            cars,
            registry,
            scheduler,
            rng,
            events: Vec::new(),
            stats: TrafficStats::default(),
            sim_time_ms: 0,
            next_passenger_id: 1,
        })
    }

    /// Advance the logical clock by `delta_ms`, running every tick that
    /// falls due on the way, one at a time and in time order.
    pub fn update(&mut self, delta_ms: u64) {
        let until = self.sim_time_ms + delta_ms;
        while let Some((kind, at)) = self.scheduler.pop_due(until) {
            self.sim_time_ms = at;
            self.run_tick(kind);
        }
        self.sim_time_ms = until;
    }

    fn run_tick(&mut self, kind: TickKind) {
        log::trace!("{:?} at {}ms", kind, self.sim_time_ms);
        match kind {
            TickKind::Operate(i) => self.cars[i].operate(&mut self.registry, &mut self.events),
            TickKind::Motion(i) => self.cars[i].step_motion(&mut self.events),
            TickKind::Doors(i) => {
                door_system(&mut self.world, &mut self.cars[i], self.dwell_ticks, &mut self.events);
            }
            TickKind::Traffic => self.traffic_tick(),
            TickKind::Waiting => waiting_system(
                &mut self.world,
                &mut self.cars,
                &mut self.registry,
                &mut self.events,
                &mut self.stats,
                self.sim_time_ms,
            ),
        }
    }

    fn traffic_tick(&mut self) {
        let clear = is_traffic_clear(
            self.passenger_count(),
            self.cars.len(),
            self.range.len(),
            self.config.traffic.spawn_chance_percent,
            &mut self.rng,
        );
        if !clear {
            return;
        }
        let (start, end) = pick_trip(self.range, &mut self.rng);
        if let Err(err) = self.spawn_passenger(start, end) {
            log::warn!("generated trip {} -> {} rejected: {}", start, end, err);
        }
    }

    /// Add a passenger at `start` heading for `end`. They press the hall
    /// buttons on the next waiting poll.
    pub fn spawn_passenger(&mut self, start: i32, end: i32) -> Result<PassengerId, LiftError> {
        let id = PassengerId(self.next_passenger_id);
        let passenger = Passenger::new(id, start, end, self.range)?;
        self.next_passenger_id += 1;

        self.world.spawn((passenger, Arrival::new(self.sim_time_ms)));
        self.stats.spawned += 1;
        self.events.push(SimEvent::PassengerSpawned {
            passenger: id,
            start,
            end,
        });
        log::info!("passenger {} appeared at floor {} going to {}", id, start, end);
        Ok(id)
    }

    /// Place a hall call at a car's button. Returns the id of the car that
    /// took the request.
    pub fn request_hall_call(
        &mut self,
        car_id: &str,
        floor: i32,
        direction: Direction,
    ) -> Result<Option<String>, LiftError> {
        let chosen = dispatch_hall_call(
            &mut self.cars,
            &mut self.registry,
            car_id,
            floor,
            direction,
            &mut self.events,
        )?;
        Ok(chosen.map(|i| self.cars[i].id().to_string()))
    }

    fn car_index(&self, car_id: &str) -> Result<usize, LiftError> {
        self.cars
            .iter()
            .position(|c| c.id() == car_id)
            .ok_or_else(|| LiftError::UnknownCar(car_id.to_string()))
    }

    /// Stop or resume a car's periodic steps. Takes effect between ticks;
    /// a stopped car keeps its state and queued requests.
    pub fn set_car_running(&mut self, car_id: &str, running: bool) -> Result<(), LiftError> {
        let index = self.car_index(car_id)?;
        self.scheduler.set_enabled(
            move |k| matches!(k, TickKind::Operate(j) | TickKind::Motion(j) | TickKind::Doors(j) if j == index),
            running,
            self.sim_time_ms,
        );
        log::info!("car {} {}", car_id, if running { "resumed" } else { "stopped" });
        Ok(())
    }

    pub fn is_car_running(&self, car_id: &str) -> bool {
        self.car_index(car_id)
            .map(|i| self.scheduler.is_enabled(TickKind::Operate(i)))
            .unwrap_or(false)
    }

    /// Start or stop the arrival generator. Passengers already in the
    /// building carry on.
    pub fn set_traffic_enabled(&mut self, enabled: bool) {
        self.scheduler
            .set_enabled(|k| k == TickKind::Traffic, enabled, self.sim_time_ms);
    }

    pub fn is_traffic_enabled(&self) -> bool {
        self.scheduler.is_enabled(TickKind::Traffic)
    }

    /// Take every event emitted since the last call.
    pub fn drain_events(&mut self) -> Vec<SimEvent> {
        std::mem::take(&mut self.events)
    }

    pub fn snapshot(&self) -> BuildingSnapshot {
        BuildingSnapshot {
            sim_time_ms: self.sim_time_ms,
            cars: self.cars.iter().map(Car::snapshot).collect(),
            lit_buttons: self.registry.lit_buttons().into_iter().cloned().collect(),
            passengers: self.passenger_count(),
            waiting: self.waiting_count(),
            stats: self.stats,
        }
    }

    pub fn cars(&self) -> &[Car] {
        &self.cars
    }

    pub fn car(&self, car_id: &str) -> Option<&Car> {
        self.cars.iter().find(|c| c.id() == car_id)
    }

    pub fn registry(&self) -> &HallCallRegistry {
        &self.registry
    }

    pub fn config(&self) -> &BuildingConfig {
        &self.config
    }

    pub fn floor_range(&self) -> FloorRange {
        self.range
    }

    pub fn stats(&self) -> TrafficStats {
        self.stats
    }

    /// Simulation time in milliseconds
    pub fn sim_time_ms(&self) -> u64 {
        self.sim_time_ms
    }

    /// Passengers currently in the building
    pub fn passenger_count(&self) -> usize {
        self.world.query::<&Passenger>().iter().count()
    }

    /// Passengers who have not boarded yet
    pub fn waiting_count(&self) -> usize {
        self.world
            .query::<&Passenger>()
            .iter()
            .filter(|(_, p)| matches!(p.phase, PassengerPhase::Enter | PassengerPhase::Waiting))
            .count()
    }

    /// Copies of every passenger, ordered by id
    pub fn passengers(&self) -> Vec<Passenger> {
        let mut all: Vec<Passenger> = self
            .world
            .query::<&Passenger>()
            .iter()
            .map(|(_, p)| p.clone())
            .collect();
        all.sort_by_key(|p| p.id);
        all
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::TrafficConfig;
    use std::collections::BTreeMap;

    fn quiet_config(cars: &[(&str, i32)]) -> BuildingConfig {
        BuildingConfig {
            groups: Vec::new(),
            independent: cars.iter().map(|(id, _)| id.to_string()).collect(),
            initial_floors: cars.iter().map(|(id, f)| (id.to_string(), *f)).collect::<BTreeMap<_, _>>(),
            traffic: TrafficConfig {
                enabled: false,
                ..Default::default()
            },
            seed: Some(1),
            ..Default::default()
        }
    }

    fn seeded(seed: u64) -> SimulationEngine {
        SimulationEngine::new(BuildingConfig {
            seed: Some(seed),
            ..Default::default()
        })
        .unwrap()
    }

    #[test]
    fn test_engine_creation() {
        let engine = seeded(7);
        assert_eq!(engine.cars().len(), 3);
        assert_eq!(engine.passenger_count(), 0);
        assert_eq!(engine.sim_time_ms(), 0);
        assert!(engine.cars().iter().all(|c| engine.floor_range().contains(c.current_floor())));
        assert!(engine.is_traffic_enabled());
        assert!(engine.registry().lit_buttons().is_empty());
    }

    #[test]
    fn test_rejects_invalid_config() {
        let config = BuildingConfig {
            above_ground: 1,
            underground: 3,
            ..Default::default()
        };
        assert!(SimulationEngine::new(config).is_err());
    }

    #[test]
    fn test_initial_floors() {
        let engine = SimulationEngine::new(quiet_config(&[("A", -2), ("B", 8)])).unwrap();
        assert_eq!(engine.car("A").unwrap().current_floor(), -2);
        assert_eq!(engine.car("B").unwrap().current_floor(), 8);
        assert!(engine.car("C").is_none());
    }

    #[test]
    fn test_update_advances_clock() {
        let mut engine = SimulationEngine::new(quiet_config(&[("A", 1)])).unwrap();
        engine.update(1234);
        engine.update(66);
        assert_eq!(engine.sim_time_ms(), 1300);
    }

    #[test]
    fn test_single_ride() {
        let mut engine = SimulationEngine::new(quiet_config(&[("A", 1)])).unwrap();
        let id = engine.spawn_passenger(1, 5).unwrap();
        assert_eq!(id, PassengerId(1));
        assert_eq!(engine.waiting_count(), 1);

        // Call placed on the first poll; the car stops at floor 1 and
        // turns to face UP before the doors open
        engine.update(2000);
        assert_eq!(engine.stats().boarded, 1);
        assert_eq!(engine.stats().total_wait_ms, 2000);
        assert!(engine.car("A").unwrap().has_passenger(id));

        engine.update(18_000);
        assert_eq!(engine.passenger_count(), 0);
        assert_eq!(engine.stats().served, 1);
        assert_eq!(engine.car("A").unwrap().current_floor(), 5);

        let events = engine.drain_events();
        assert!(events.contains(&SimEvent::PassengerAlighted {
            passenger: id,
            car: "A".into(),
        }));
        assert!(events.contains(&SimEvent::CarArrived {
            car: "A".into(),
            floor: 5,
        }));
        assert!(engine.drain_events().is_empty());
    }

    #[test]
    fn test_spawn_rejects_bad_trips() {
        let mut engine = SimulationEngine::new(quiet_config(&[("A", 1)])).unwrap();
        assert!(matches!(
            engine.spawn_passenger(0, 4),
            Err(LiftError::InvalidFloor { floor: 0, .. })
        ));
        assert!(engine.spawn_passenger(3, 3).is_err());
        assert_eq!(engine.passenger_count(), 0);
        assert_eq!(engine.stats().spawned, 0);
    }

    #[test]
    fn test_group_hall_call() {
        let mut config = BuildingConfig {
            traffic: TrafficConfig {
                enabled: false,
                ..Default::default()
            },
            seed: Some(3),
            ..Default::default()
        };
        config.initial_floors.insert("SYNC#1".into(), 1);
        config.initial_floors.insert("SYNC#2".into(), 8);
        let mut engine = SimulationEngine::new(config).unwrap();

        let chosen = engine.request_hall_call("SYNC#1", 7, Direction::Down).unwrap();
        assert_eq!(chosen.as_deref(), Some("SYNC#2"));
        assert!(engine.registry().is_lit("SYNC#1", 7, Direction::Down));
        assert!(engine.registry().is_lit("SYNC#2", 7, Direction::Down));
        assert!(!engine.registry().is_lit("ASYNC#1", 7, Direction::Down));

        assert!(matches!(
            engine.request_hall_call("NOPE", 7, Direction::Down),
            Err(LiftError::UnknownCar(_))
        ));
        assert!(engine.request_hall_call("SYNC#1", 8, Direction::Up).is_err());
    }

    #[test]
    fn test_stopped_car_holds_still() {
        let mut engine = SimulationEngine::new(quiet_config(&[("A", 1)])).unwrap();
        engine.set_car_running("A", false).unwrap();
        assert!(!engine.is_car_running("A"));
        engine.request_hall_call("A", 5, Direction::Down).unwrap();

        engine.update(5000);
        assert_eq!(engine.car("A").unwrap().current_floor(), 1);
        assert!(!engine.car("A").unwrap().is_moving());

        engine.set_car_running("A", true).unwrap();
        engine.update(10_000);
        assert_eq!(engine.car("A").unwrap().current_floor(), 5);
        assert!(!engine.registry().is_lit("A", 5, Direction::Down));
        assert!(engine.set_car_running("Z", true).is_err());
    }

    #[test]
    fn test_traffic_disabled_spawns_nobody() {
        let mut engine = SimulationEngine::new(quiet_config(&[("A", 1), ("B", 3)])).unwrap();
        engine.update(60_000);
        assert_eq!(engine.stats().spawned, 0);
        assert!(engine.drain_events().is_empty());
    }

    #[test]
    fn test_same_seed_same_run() {
        let mut a = seeded(99);
        let mut b = seeded(99);
        for _ in 0..120 {
            a.update(500);
            b.update(500);
        }
        assert_eq!(a.drain_events(), b.drain_events());
        assert_eq!(a.stats(), b.stats());
    }

    #[test]
    fn test_busy_building_drains() {
        let mut engine = seeded(2024);
        let mut events = Vec::new();
        for _ in 0..240 {
            engine.update(500);
            events.extend(engine.drain_events());
        }
        assert!(engine.stats().spawned > 0);

        engine.set_traffic_enabled(false);
        for _ in 0..1200 {
            engine.update(500);
            events.extend(engine.drain_events());
        }

        assert!(events.iter().all(|e| !e.floors().contains(&0)));
        assert_eq!(engine.passenger_count(), 0);
        assert_eq!(engine.stats().served, engine.stats().spawned);
        assert!(engine.registry().lit_buttons().is_empty());
    }

    #[test]
    fn test_snapshot() {
        let mut engine = SimulationEngine::new(quiet_config(&[("A", 2)])).unwrap();
        engine.spawn_passenger(2, 4).unwrap();
        let snap = engine.snapshot();
        assert_eq!(snap.cars.len(), 1);
        assert_eq!(snap.cars[0].floor, 2);
        assert_eq!(snap.passengers, 1);
        assert_eq!(snap.waiting, 1);
        assert_eq!(snap.stats.spawned, 1);
        assert!(serde_json::to_string(&snap).unwrap().contains("\"sim_time_ms\":0"));
    }
}
