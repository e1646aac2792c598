//! Drone dispatch: tracks one drone per home station and assigns the
//! closest IDLE drone to each alerted turbine.
//!
//! ## Per-drone state machine
//!
//! ```text
//! IDLE ──[assigned a target]──▶ TRAVELLING ──[close to target]──▶ INSPECTING
//!  ▲                                                                  │
//!  └──[close to station]── RETURNING ◀──[inspection_ticks exhausted]──┘
//! ```
//!
//! Grounded in `drone_scheduling/ds.py`'s `loop`/`Drone` — the single-
//! drone-per-target algorithm, not the rejected multi-drone coalition path
//! in `drone_scheduling/utils.py`/`drone.py`. Movement (`move_towards`,
//! `is_close_to`) stays in raw (lat, lng)-degree space exactly as `ds.py`
//! computes it, using the literal `DRONE_SPEED`/`MARGIN` constants it
//! defines in degrees. Picking the nearest IDLE drone for a new alert uses
//! the metric-projection distance (`Point::distance_metres`, grounded in
//! `drone_scheduling/utils.py`'s `MFACTOR_LAT`/`MFACTOR_LONG`) instead of
//! `ds.py`'s raw degree distance, so that dispatch is not distorted by
//! longitude degrees covering fewer metres than latitude degrees do.

use std::sync::Arc;

use tracing::{error, info};
use windfarm_common::geometry::Point;

/// Degrees; a drone within this distance of its destination has arrived.
pub const MARGIN: f64 = 0.001;

/// Degrees/tick, applied identically on both axes.
pub const DRONE_SPEED: Point = Point { lat: 0.002, lng: 0.002 };

pub const DEFAULT_INSPECTION_TICKS: u32 = 10;

#[derive(Debug, Clone, PartialEq)]
pub struct Station {
    pub id: String,
    pub pos: Point,
}

#[derive(Debug, Clone, PartialEq)]
pub enum DroneState {
    Idle,
    Travelling { target_id: String, target_pos: Point },
    Inspecting { target_id: String, ticks_remaining: u32 },
    Returning,
}

impl DroneState {
    /// The `drone_positions` status string: any non-idle state reports
    /// "travelling", matching `ds.py`'s two-valued status field.
    pub fn status_label(&self) -> &'static str {
        match self {
            DroneState::Idle => "idle",
            _ => "travelling",
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Drone {
    pub id: String,
    pub home: Arc<Station>,
    pub pos: Point,
    pub state: DroneState,
}

impl Drone {
    pub fn at_station(id: impl Into<String>, home: Arc<Station>) -> Drone {
        let pos = home.pos;
        Drone { id: id.into(), home, pos, state: DroneState::Idle }
    }

    fn set_target(&mut self, target_id: String, target_pos: Point) {
        self.state = DroneState::Travelling { target_id, target_pos };
    }

    /// Advances this drone by one scheduler tick. Returns the turbine ID
    /// whose inspection just finished, if any, for the caller to append to
    /// `finished_inspections`.
    pub fn advance(&mut self, inspection_ticks: u32) -> Option<String> {
        match std::mem::replace(&mut self.state, DroneState::Idle) {
            DroneState::Idle => {
                self.state = DroneState::Idle;
                None
            }
            DroneState::Travelling { target_id, target_pos } => {
                self.pos = move_towards(self.pos, target_pos);
                if is_close_to(self.pos, target_pos) {
                    info!("Drone[{}] reached WT[{target_id}]", self.id);
                    self.state = DroneState::Inspecting { target_id, ticks_remaining: inspection_ticks };
                } else {
                    self.state = DroneState::Travelling { target_id, target_pos };
                }
                None
            }
            DroneState::Inspecting { target_id, ticks_remaining } => {
                if ticks_remaining > 0 {
                    self.state = DroneState::Inspecting { target_id, ticks_remaining: ticks_remaining - 1 };
                    None
                } else {
                    info!("Drone[{}] finished inspection of WT[{target_id}]", self.id);
                    self.state = DroneState::Returning;
                    Some(target_id)
                }
            }
            DroneState::Returning => {
                let home_pos = self.home.pos;
                self.pos = move_towards(self.pos, home_pos);
                self.state = if is_close_to(self.pos, home_pos) {
                    info!("Drone[{}] reached station", self.id);
                    DroneState::Idle
                } else {
                    DroneState::Returning
                };
                None
            }
        }
    }
}

/// Moves `pos` towards `dest`, clamped to [`DRONE_SPEED`]'s magnitude per
/// tick. Mirrors `ds.py::Drone.move_towards`: the clamp compares against
/// `DRONE_SPEED`'s diagonal magnitude but, since both axes are equal,
/// rescaling the unit direction by the scalar `DRONE_SPEED.lat` reproduces
/// its componentwise `Vec * Vec` multiply exactly.
pub fn move_towards(pos: Point, dest: Point) -> Point {
    let delta = dest.sub(pos);
    let delta = if delta.magnitude() > DRONE_SPEED.magnitude() {
        delta.normalized().scale(DRONE_SPEED.lat)
    } else {
        delta
    };
    pos.add(delta)
}

pub fn is_close_to(pos: Point, dest: Point) -> bool {
    dest.sub(pos).magnitude() < MARGIN
}

/// Merges freshly read `sensor_alerts` into the carried-over fault queue,
/// preserving arrival order and skipping ids already queued.
pub fn union_into_queue(queue: &mut Vec<String>, alerts: &[String]) {
    for id in alerts {
        if !queue.contains(id) {
            queue.push(id.clone());
        }
    }
}

/// Assigns the closest IDLE drone to each queued turbine id, in order,
/// stopping as soon as no IDLE drones remain. Unknown turbine ids are
/// logged and dropped; assigned ids are dropped from `queue`; ids left
/// unassigned because no drone was free stay queued for the next tick.
pub fn dispatch(queue: &mut Vec<String>, drones: &mut [Drone], turbines: &[(String, Point)]) {
    let mut i = 0;
    while i < queue.len() {
        let wt_id = queue[i].clone();
        let Some(&(_, wt_pos)) = turbines.iter().find(|(id, _)| *id == wt_id) else {
            error!("sensor_alerts: unknown WT id {wt_id}");
            queue.remove(i);
            continue;
        };
        match nearest_idle(drones, wt_pos) {
            Some(drone_idx) => {
                drones[drone_idx].set_target(wt_id.clone(), wt_pos);
                info!("Assigned Drone[{}] to WT[{wt_id}]", drones[drone_idx].id);
                queue.remove(i);
            }
            None => break,
        }
    }
}

fn nearest_idle(drones: &[Drone], target: Point) -> Option<usize> {
    drones
        .iter()
        .enumerate()
        .filter(|(_, d)| d.state == DroneState::Idle)
        .map(|(idx, d)| (idx, target.distance_metres(d.pos)))
        .fold(None, |best: Option<(usize, f64)>, (idx, dist)| match best {
            Some((_, best_dist)) if best_dist <= dist => best,
            _ => Some((idx, dist)),
        })
        .map(|(idx, _)| idx)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn station(id: &str, pos: Point) -> Arc<Station> {
        Arc::new(Station { id: id.into(), pos })
    }

    #[test]
    fn idle_drone_never_moves() {
        let mut d = Drone::at_station("Drone_0", station("A", Point::new(0.0, 0.0)));
        assert!(d.advance(DEFAULT_INSPECTION_TICKS).is_none());
        assert_eq!(d.state, DroneState::Idle);
    }

    #[test]
    fn travelling_drone_reaches_target_and_switches_to_inspecting() {
        let mut d = Drone::at_station("Drone_0", station("A", Point::new(0.0, 0.0)));
        d.set_target("wt-000".into(), Point::new(0.0005, 0.0005));
        for _ in 0..5 {
            d.advance(DEFAULT_INSPECTION_TICKS);
            if matches!(d.state, DroneState::Inspecting { .. }) {
                break;
            }
        }
        assert!(matches!(d.state, DroneState::Inspecting { ref target_id, ticks_remaining } if target_id == "wt-000" && ticks_remaining == DEFAULT_INSPECTION_TICKS));
    }

    #[test]
    fn inspecting_drone_finishes_after_ticks_and_returns() {
        let mut d = Drone::at_station("Drone_0", station("A", Point::new(0.0, 0.0)));
        d.state = DroneState::Inspecting { target_id: "wt-000".into(), ticks_remaining: 2 };
        assert_eq!(d.advance(10), None);
        assert_eq!(d.advance(10), None);
        assert_eq!(d.advance(10), Some("wt-000".to_string()));
        assert_eq!(d.state, DroneState::Returning);
    }

    #[test]
    fn returning_drone_reaches_station_and_goes_idle() {
        let home = station("A", Point::new(0.0, 0.0));
        let mut d = Drone { id: "Drone_0".into(), pos: Point::new(0.0005, 0.0005), home: home.clone(), state: DroneState::Returning };
        for _ in 0..5 {
            d.advance(10);
            if d.state == DroneState::Idle {
                break;
            }
        }
        assert_eq!(d.state, DroneState::Idle);
    }

    #[test]
    fn union_into_queue_skips_duplicates_and_preserves_order() {
        let mut queue = vec!["wt-000".to_string()];
        union_into_queue(&mut queue, &["wt-001".to_string(), "wt-000".to_string()]);
        assert_eq!(queue, vec!["wt-000", "wt-001"]);
    }

    #[test]
    fn dispatch_assigns_the_nearer_drone_and_drains_the_queue() {
        let far = Drone::at_station("Drone_far", station("A", Point::new(10.0, 10.0)));
        let near = Drone::at_station("Drone_near", station("B", Point::new(0.0, 0.0)));
        let mut drones = vec![far, near];
        let turbines = vec![("wt-000".to_string(), Point::new(0.1, 0.1))];
        let mut queue = vec!["wt-000".to_string()];

        dispatch(&mut queue, &mut drones, &turbines);

        assert!(queue.is_empty());
        assert!(matches!(drones[0].state, DroneState::Idle));
        assert!(matches!(drones[1].state, DroneState::Travelling { .. }));
    }

    #[test]
    fn dispatch_stops_once_no_idle_drones_remain() {
        let mut drone = Drone::at_station("Drone_0", station("A", Point::new(0.0, 0.0)));
        drone.set_target("wt-existing".into(), Point::new(1.0, 1.0));
        let mut drones = vec![drone];
        let turbines = vec![("wt-000".to_string(), Point::new(0.1, 0.1))];
        let mut queue = vec!["wt-000".to_string()];

        dispatch(&mut queue, &mut drones, &turbines);

        assert_eq!(queue, vec!["wt-000"]);
    }

    #[test]
    fn dispatch_drops_unknown_turbine_ids() {
        let mut drones = vec![Drone::at_station("Drone_0", station("A", Point::new(0.0, 0.0)))];
        let turbines: Vec<(String, Point)> = Vec::new();
        let mut queue = vec!["does-not-exist".to_string()];

        dispatch(&mut queue, &mut drones, &turbines);

        assert!(queue.is_empty());
        assert!(matches!(drones[0].state, DroneState::Idle));
    }
}
