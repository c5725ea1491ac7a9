//! Arrival generator - residence-style traffic.
//!
//! Half of all trips start at the ground floor and head upstairs (a small
//! slice go to the basement instead); the other half start upstairs and
//! head home to the ground floor (a small slice visit a neighbour).

use rand::Rng;

use liftsim_logic::floors::{FloorRange, GROUND_FLOOR};

/// Percentage of trips that leave the usual ground-floor pattern.
const DETOUR_PERCENT: u32 = 5;

/// Uniformly random served floor.
pub fn random_floor<R: Rng>(range: FloorRange, rng: &mut R) -> i32 {
    let floors: Vec<i32> = range.floors().collect();
    floors[rng.gen_range(0..floors.len())]
}

/// Random (start, end) trip. Requires at least two floors above ground.
pub fn pick_trip<R: Rng>(range: FloorRange, rng: &mut R) -> (i32, i32) {
    let top = range.top();
    let detour = rng.gen_range(0..100) < DETOUR_PERCENT;

    if rng.gen_bool(0.5) {
        let end = if detour && range.underground() > 0 {
            -rng.gen_range(1..=range.underground())
        } else {
            rng.gen_range(2..=top)
        };
        (GROUND_FLOOR, end)
    } else {
        let start = rng.gen_range(2..=top);
        if !detour {
            return (start, GROUND_FLOOR);
        }
        let others: Vec<i32> = range
            .floors()
            .filter(|&f| f != GROUND_FLOOR && f != start)
            .collect();
        if others.is_empty() {
            (start, GROUND_FLOOR)
        } else {
            (start, others[rng.gen_range(0..others.len())])
        }
    }
}

/// Whether a new passenger should appear on this controller tick: the
/// building must not be crowded and the spawn roll must succeed.
pub fn is_traffic_clear<R: Rng>(
    active_passengers: usize,
    car_count: usize,
    floor_count: usize,
    spawn_chance_percent: u8,
    rng: &mut R,
) -> bool {
    if active_passengers > car_count * floor_count / 2 {
        return false;
    }
    rng.gen_range(0..100u32) < u32::from(spawn_chance_percent)
}
