//! Car systems - door ticks and the passengers they release

use hecs::World;
use liftsim_logic::{Car, SimEvent};

use crate::components::Passenger;

/// Run one door tick on `car`. Passengers released at their end floor start
/// walking out. Returns how many got off.
pub fn door_system(world: &mut World, car: &mut Car, dwell_ticks: u32, events: &mut Vec<SimEvent>) -> usize {
    let leavers = car.step_doors(dwell_ticks, events);
    if leavers.is_empty() {
        return 0;
    }

    let mut released = 0;
    for (_, passenger) in world.query_mut::<&mut Passenger>() {
        if leavers.contains(&passenger.id) {
            passenger.alight();
            released += 1;
        }
    }
    if released != leavers.len() {
        log::warn!(
            "car {} released {} passengers but only {} are in the world",
            car.id(),
            leavers.len(),
            released
        );
    }
    released
}
