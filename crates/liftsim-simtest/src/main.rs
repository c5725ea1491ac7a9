//! LiftSim Headless Simulation Harness
//!
//! Validates the dispatch rules and long seeded runs without a renderer.
//! Runs entirely in-process on the logical clock.
//!
//! Usage:
//!   cargo run -p liftsim-simtest
//!   cargo run -p liftsim-simtest -- --verbose
//!   cargo run -p liftsim-simtest -- --config path/to/building.json
//!
//! Set `RUST_LOG=debug` to trace every dispatch decision.

use liftsim_core::config::{BuildingConfig, ConfigError, TrafficConfig};
use liftsim_core::engine::SimulationEngine;
use liftsim_logic::dispatcher::{dispatch_hall_call, pick_best_car};
use liftsim_logic::hall_calls::HallCallRegistry;
use liftsim_logic::{Car, Direction, FloorRange, SimEvent};

// ── Building config (same JSON a renderer would load) ───────────────────
const BUILDING_JSON: &str = include_str!("../../../data/building.json");

// ── Test harness ────────────────────────────────────────────────────────

struct TestResult {
    name: String,
    passed: bool,
    detail: String,
}

fn main() {
    env_logger::init();

    let args: Vec<String> = std::env::args().collect();
    let verbose = args.iter().any(|a| a == "--verbose");
    let config_path = args
        .iter()
        .position(|a| a == "--config")
        .and_then(|i| args.get(i + 1));

    println!("=== LiftSim Simulation Harness ===\n");

    let config = match config_path {
        Some(path) => {
            log::info!("loading building from {}", path);
            BuildingConfig::load(path)
        }
        None => BuildingConfig::from_json_str(BUILDING_JSON),
    };

    let mut results = Vec::new();

    // 1. Building config
    results.extend(validate_config(&config, verbose));

    // 2. Dispatch scenarios on hand-built cars
    results.extend(validate_dispatch_scenarios(verbose));

    // 3. Dispatcher repeatability
    results.extend(validate_dispatcher_determinism(verbose));

    // 4. Long seeded run, then drain
    if let Ok(config) = config {
        results.extend(validate_long_run(config, verbose));
    }

    // ── Summary ──
    println!();
    let passed = results.iter().filter(|r| r.passed).count();
    let failed = results.iter().filter(|r| !r.passed).count();
    let total = results.len();

    for r in &results {
        let icon = if r.passed { "✓" } else { "✗" };
        if !r.passed || verbose {
            println!("  {} {}: {}", icon, r.name, r.detail);
        }
    }

    println!(
        "\n=== RESULT: {}/{} passed, {} failed ===",
        passed, total, failed
    );

    if failed > 0 {
        std::process::exit(1);
    }
}

// ── 1. Building Config ──────────────────────────────────────────────────

fn validate_config(config: &Result<BuildingConfig, ConfigError>, verbose: bool) -> Vec<TestResult> {
    println!("--- Building Config ---");
    let mut results = Vec::new();

    let config = match config {
        Ok(c) => c,
        Err(e) => {
            results.push(TestResult {
                name: "config_load".into(),
                passed: false,
                detail: e.to_string(),
            });
            return results;
        }
    };

    let range = config.floor_range();
    results.push(TestResult {
        name: "config_floor_range".into(),
        passed: !range.contains(0) && range.len() == config.total_floors() as usize,
        detail: format!(
            "floors {}..={} ({} served, 0 skipped)",
            range.bottom(),
            range.top(),
            range.len()
        ),
    });

    let cars = config.cars();
    results.push(TestResult {
        name: "config_cars".into(),
        passed: cars.len() == config.car_count(),
        detail: format!(
            "{} cars in {} groups + {} independent",
            cars.len(),
            config.groups.len(),
            config.independent.len()
        ),
    });

    if verbose {
        for (id, group) in &cars {
            println!("    {} ({})", id, group.as_deref().unwrap_or("independent"));
        }
    }

    // Bad configs must be refused, not clamped
    let bad = [
        ("floor 0 start", r#"{ "initial_floors": { "ASYNC#1": 0 } }"#),
        ("too many floors", r#"{ "above_ground": 12, "underground": 3 }"#),
        ("no cars", r#"{ "groups": [], "independent": [] }"#),
        ("short dwell", r#"{ "timing": { "dwell_ms": 200 } }"#),
    ];
    let accepted: Vec<&str> = bad
        .iter()
        .filter(|(_, json)| BuildingConfig::from_json_str(json).is_ok())
        .map(|(name, _)| *name)
        .collect();
    results.push(TestResult {
        name: "config_rejects_invalid".into(),
        passed: accepted.is_empty(),
        detail: if accepted.is_empty() {
            format!("{} invalid configs rejected", bad.len())
        } else {
            format!("accepted: {}", accepted.join(", "))
        },
    });

    results
}

// ── 2. Dispatch Scenarios ───────────────────────────────────────────────

fn building(range: FloorRange, layout: &[(&str, Option<&str>, i32)]) -> (Vec<Car>, HallCallRegistry) {
    let mut registry = HallCallRegistry::new(range);
    let mut cars = Vec::new();
    for &(id, group, floor) in layout {
        registry.register_car(id, group);
        if let Ok(car) = Car::new(id, group.map(String::from), range, floor) {
            cars.push(car);
        }
    }
    (cars, registry)
}

fn validate_dispatch_scenarios(_verbose: bool) -> Vec<TestResult> {
    println!("--- Dispatch Scenarios ---");
    let mut results = Vec::new();
    let range = FloorRange::new(12, 2);
    let mut events = Vec::new();

    // Independent car at 1, call UP at 5
    let (mut cars, mut registry) = building(range, &[("A", None, 1)]);
    let ok = dispatch_hall_call(&mut cars, &mut registry, "A", 5, Direction::Up, &mut events).is_ok();
    cars[0].operate(&mut registry, &mut events);
    results.push(TestResult {
        name: "scenario_independent_up".into(),
        passed: ok && cars[0].is_moving() && cars[0].next_stop_floor() == 5,
        detail: format!("car at 1 heading {} to {:?}", cars[0].direction(), cars[0].snapshot().next_stop),
    });

    // Group: A moving UP to 3, B suspended at 10, call DOWN at 7 goes to B
    let (mut cars, mut registry) = building(range, &[("A", Some("SYNC"), 1), ("B", Some("SYNC"), 10)]);
    let _ = cars[0].add_request(3, Direction::Up);
    cars[0].operate(&mut registry, &mut events);
    let chosen = dispatch_hall_call(&mut cars, &mut registry, "A", 7, Direction::Down, &mut events);
    results.push(TestResult {
        name: "scenario_group_suspended_wins".into(),
        passed: matches!(chosen, Ok(Some(1)))
            && registry.is_lit("A", 7, Direction::Down)
            && registry.is_lit("B", 7, Direction::Down),
        detail: format!("chosen {:?}, button lit on both members", chosen),
    });

    // Car at 8, single UP caller at 2: head DOWN, reverse on arrival
    let (mut cars, mut registry) = building(range, &[("A", None, 8)]);
    let _ = cars[0].add_request(2, Direction::Up);
    cars[0].operate(&mut registry, &mut events);
    let heading = cars[0].direction();
    let target = cars[0].snapshot().next_stop;
    while cars[0].is_moving() {
        cars[0].step_motion(&mut events);
    }
    cars[0].operate(&mut registry, &mut events);
    results.push(TestResult {
        name: "scenario_single_caller_below".into(),
        passed: heading == Direction::Down && target == Some(2) && cars[0].direction() == Direction::Up,
        detail: format!("went {} to {:?}, then faced {}", heading, target, cars[0].direction()),
    });

    // Car at 3, both directions requested at 6: no reversal
    let (mut cars, mut registry) = building(range, &[("A", None, 3)]);
    let _ = cars[0].add_request(6, Direction::Down);
    let _ = cars[0].add_request(6, Direction::Up);
    cars[0].operate(&mut registry, &mut events);
    results.push(TestResult {
        name: "scenario_both_directions".into(),
        passed: cars[0].direction() == Direction::Up && !cars[0].need_reverse(),
        detail: format!("heading {}, reverse={}", cars[0].direction(), cars[0].need_reverse()),
    });

    // Floor 0 is refused everywhere
    let (mut cars, mut registry) = building(range, &[("A", None, 1)]);
    let refused = dispatch_hall_call(&mut cars, &mut registry, "A", 0, Direction::Up, &mut events).is_err()
        && cars[0].add_request(0, Direction::Down).is_err()
        && Car::new("Z", None, range, 0).is_err();
    results.push(TestResult {
        name: "scenario_floor_zero_refused".into(),
        passed: refused && !cars[0].has_pending_work(),
        detail: "hall call, request and initial floor 0 all rejected".into(),
    });

    results
}

// ── 3. Dispatcher Determinism ───────────────────────────────────────────

fn validate_dispatcher_determinism(verbose: bool) -> Vec<TestResult> {
    println!("--- Dispatcher Determinism ---");
    let range = FloorRange::new(10, 2);
    let (mut cars, mut registry) = building(
        range,
        &[("S1", Some("SYNC"), -2), ("S2", Some("SYNC"), 4), ("S3", Some("SYNC"), 9)],
    );
    let mut events = Vec::new();
    let _ = cars[0].add_request(6, Direction::Up);
    cars[0].operate(&mut registry, &mut events);
    let _ = cars[2].add_request(3, Direction::Down);
    cars[2].operate(&mut registry, &mut events);

    let views: Vec<&Car> = cars.iter().collect();
    let mut mismatches = 0;
    let mut sweep = Vec::new();
    for floor in range.floors() {
        for direction in [Direction::Up, Direction::Down] {
            if !range.has_button(floor, direction) {
                continue;
            }
            let first = pick_best_car(floor, direction, &views);
            for _ in 0..10 {
                if pick_best_car(floor, direction, &views) != first {
                    mismatches += 1;
                }
            }
            sweep.push((floor, direction, first));
        }
    }

    if verbose {
        for (floor, direction, choice) in &sweep {
            let id = choice.map(|i| cars[i].id()).unwrap_or("-");
            println!("    {:>3}{} -> {}", floor, direction, id);
        }
    }

    vec![TestResult {
        name: "dispatcher_repeatable".into(),
        passed: mismatches == 0,
        detail: format!("{} calls swept, {} mismatches", sweep.len(), mismatches),
    }]
}

// ── 4. Long Run ─────────────────────────────────────────────────────────

fn validate_long_run(config: BuildingConfig, verbose: bool) -> Vec<TestResult> {
    println!("--- Long Run ---");
    let mut results = Vec::new();

    let config = BuildingConfig {
        seed: config.seed.or(Some(1)),
        traffic: TrafficConfig {
            enabled: true,
            ..config.traffic
        },
        ..config
    };

    let mut engine = match SimulationEngine::new(config.clone()) {
        Ok(e) => e,
        Err(e) => {
            results.push(TestResult {
                name: "run_engine_start".into(),
                passed: false,
                detail: e.to_string(),
            });
            return results;
        }
    };

    // 10 minutes of traffic in 100ms frames
    let mut events = Vec::new();
    for _ in 0..6000 {
        engine.update(100);
        events.extend(engine.drain_events());
    }
    let busy = engine.stats();

    // Stop arrivals and let everyone finish their trip
    engine.set_traffic_enabled(false);
    for _ in 0..6000 {
        engine.update(100);
        events.extend(engine.drain_events());
        if engine.passenger_count() == 0 && engine.registry().lit_buttons().is_empty() {
            break;
        }
    }
    let done = engine.stats();

    results.push(TestResult {
        name: "run_spawned_passengers".into(),
        passed: busy.spawned > 0,
        detail: format!("{} spawned, {} boarded in 10 min", busy.spawned, busy.boarded),
    });

    let zero_events = events.iter().filter(|e| e.floors().contains(&0)).count();
    results.push(TestResult {
        name: "run_no_floor_zero".into(),
        passed: zero_events == 0,
        detail: format!("{} events, {} mention floor 0", events.len(), zero_events),
    });

    results.push(TestResult {
        name: "run_everyone_served".into(),
        passed: engine.passenger_count() == 0 && done.served == done.spawned,
        detail: format!(
            "{}/{} served, {} still inside",
            done.served,
            done.spawned,
            engine.passenger_count()
        ),
    });

    let lit = engine.registry().lit_buttons().len();
    results.push(TestResult {
        name: "run_buttons_cleared".into(),
        passed: lit == 0,
        detail: format!("{} buttons still lit", lit),
    });

    let boarded = events
        .iter()
        .filter(|e| matches!(e, SimEvent::PassengerBoarded { .. }))
        .count() as u64;
    let alighted = events
        .iter()
        .filter(|e| matches!(e, SimEvent::PassengerAlighted { .. }))
        .count() as u64;
    results.push(TestResult {
        name: "run_rides_balance".into(),
        passed: boarded == done.boarded && alighted == boarded,
        detail: format!("{} boardings, {} alightings", boarded, alighted),
    });

    results.push(TestResult {
        name: "run_average_wait".into(),
        passed: done.average_wait_ms().map_or(false, |w| w < 120_000.0),
        detail: match done.average_wait_ms() {
            Some(w) => format!("average wait {:.1}s", w / 1000.0),
            None => "nobody boarded".into(),
        },
    });

    // Same seed, same run
    let mut replay = match SimulationEngine::new(config) {
        Ok(e) => e,
        Err(_) => return results,
    };
    let mut replay_events = Vec::new();
    for _ in 0..6000 {
        replay.update(100);
        replay_events.extend(replay.drain_events());
    }
    let prefix = replay_events.len().min(events.len());
    results.push(TestResult {
        name: "run_reproducible".into(),
        passed: replay.stats() == busy && replay_events[..] == events[..prefix],
        detail: format!("{} events replayed", replay_events.len()),
    });

    if verbose {
        match serde_json::to_string_pretty(&engine.snapshot()) {
            Ok(json) => println!("{}", json),
            Err(e) => println!("    snapshot failed: {}", e),
        }
    }

    results
}
