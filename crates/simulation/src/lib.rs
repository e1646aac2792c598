//! The Simulation Engine: a deterministic-under-seed tick loop that
//! advances the environment and every turbine, assembles a readings
//! snapshot, and pushes it onto the bounded `readings_queue`. Grounded in
//! `datagen/datagen/types.py::Simulation` (`get_readings`, `tick`, `loop`),
//! generalized from its `ReadingsT` dict-building to [`windfarm_common::Value`].

pub mod component;
pub mod config;
pub mod environment;
pub mod fault;
pub mod turbine;

use rand::rngs::StdRng;
use windfarm_common::mapcfg::MapConfig;
use windfarm_common::Value;

use crate::config::Config;
use crate::environment::Environment;
use crate::turbine::{turbines_from_map_config, WindTurbine};

/// The running simulation: environment, turbine fleet, and tick counters.
/// Lifetime = process lifetime, matching the spec's "recreated once,
/// mutated each tick" note on [`Environment`].
pub struct Simulation {
    cfg: Config,
    rng: StdRng,
    env: Environment,
    wts: Vec<WindTurbine>,
    ticks: u64,
    uptime_seconds: f64,
}

impl Simulation {
    pub fn new(mut rng: StdRng, cfg: Config, map: &MapConfig) -> anyhow::Result<Simulation> {
        let env = Environment::from_config(&mut rng, &cfg);
        let wts = turbines_from_map_config(&mut rng, &cfg, &env, map)?;
        Ok(Simulation { cfg, rng, env, wts, ticks: 0, uptime_seconds: 0.0 })
    }

    /// Ticks the environment and every turbine once, without assembling or
    /// publishing readings. Used both by the main tick loop and by the
    /// startup warmup (spec §4.2: "ticks `warmup` times with no
    /// publishing, so that autocorrelated residuals stabilize").
    pub fn tick(&mut self) {
        self.env.tick(&mut self.rng);
        for wt in &mut self.wts {
            wt.tick(&mut self.rng, &self.cfg, &self.env);
        }
        self.ticks += 1;
        self.uptime_seconds += self.cfg.tick_freq as f64;
    }

    pub fn warmup(&mut self, ticks: u32) {
        for _ in 0..ticks {
            self.tick();
        }
    }

    /// Injects a fault of the first registered type onto the named
    /// turbine, for the `add_faults` external control surface (spec §4.2
    /// step 1). Unknown turbine ids are ignored (Lookup error: logged and
    /// skipped, never fatal).
    pub fn inject_fault(&mut self, wt_id: &str) {
        if let Some(wt) = self.wts.iter_mut().find(|wt| wt.id == wt_id) {
            crate::fault::inject_first_registered(&mut self.rng, &mut wt.faults);
        } else {
            tracing::error!("add_faults: unknown WT id {wt_id}");
        }
    }

    pub fn tick_freq(&self) -> u32 {
        self.cfg.tick_freq
    }

    pub fn history_length(&self) -> usize {
        self.cfg.history_length
    }

    /// Assembles the current tick's readings snapshot: `{ticks, uptime,
    /// env-readings, wts: [...]}`, matching
    /// `datagen/datagen/types.py::Simulation.get_readings`.
    pub fn readings(&self) -> Value {
        let wts: Vec<Value> = self.wts.iter().map(|wt| wt.readings()).collect();
        let mut obj = match self.env.readings() {
            Value::Object(m) => m,
            _ => unreachable!("Environment::readings always returns an object"),
        };
        obj.insert("ticks".to_string(), Value::Number(self.ticks as f64));
        obj.insert("uptime".to_string(), Value::Number(self.uptime_seconds));
        obj.insert("wts".to_string(), Value::Array(wts));
        Value::Object(obj)
    }
}

/// Pushes `reading` onto `queue`, dropping the oldest entry once
/// `history_length` is exceeded. Matches spec §4.2 step 6's bounded
/// `readings_queue` semantics.
pub fn push_bounded(queue: &mut Vec<Value>, reading: Value, history_length: usize) {
    queue.push(reading);
    while queue.len() > history_length {
        queue.remove(0);
    }
}

/// Builds the `{msg, level}` pair logged whenever a fault is injected
/// through `add_faults`, for callers that want a human-readable line to
/// hand to `Client::log`.
pub fn add_fault_log_message(wt_id: &str) -> String {
    format!("Manually injected a fault on WT[{wt_id}]")
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use windfarm_common::mapcfg::parse_map_config;

    const SAMPLE_MAP: &str = r#"
models:
  - name: v80
    capacity: 1500000
    cut_in: 3.0
    rated: 12.0
    rotor_rpm: 15.0
turbines:
  - id: wt-000
    lat: 53.9
    lng: 1.9
    model: v80
  - id: wt-001
    lat: 53.91
    lng: 1.91
    model: v80
stations: []
"#;

    fn sample_sim(seed: u64) -> Simulation {
        let map = parse_map_config(SAMPLE_MAP).unwrap();
        let cfg = Config { history_length: 5, tick_freq: 3600, ..Config::default() };
        Simulation::new(StdRng::seed_from_u64(seed), cfg, &map).unwrap()
    }

    #[test]
    fn readings_contain_one_entry_per_turbine_with_unique_ids() {
        let sim = sample_sim(1);
        let obj = sim.readings().as_object().unwrap().clone();
        let wts = obj["wts"].as_array().unwrap();
        assert_eq!(wts.len(), 2);
        let ids: Vec<&str> = wts.iter().map(|w| w.as_object().unwrap()["wt_id"].as_str().unwrap()).collect();
        assert_eq!(ids, vec!["wt-000", "wt-001"]);
    }

    #[test]
    fn ticks_field_increments_monotonically() {
        let mut sim = sample_sim(2);
        let mut queue = Vec::new();
        for _ in 0..3 {
            push_bounded(&mut queue, sim.readings(), sim.history_length());
            sim.tick();
        }
        let ticks: Vec<f64> = queue.iter().map(|r| r.as_object().unwrap()["ticks"].as_f64().unwrap()).collect();
        assert_eq!(ticks, vec![0.0, 1.0, 2.0]);
    }

    #[test]
    fn push_bounded_drops_the_oldest_entry_on_overflow() {
        let mut queue = Vec::new();
        for i in 0..10 {
            push_bounded(&mut queue, Value::Number(i as f64), 5);
        }
        assert_eq!(queue.len(), 5);
        assert_eq!(queue.first(), Some(&Value::Number(5.0)));
        assert_eq!(queue.last(), Some(&Value::Number(9.0)));
    }

    #[test]
    fn warmup_advances_ticks_without_exposing_intermediate_readings() {
        let mut sim = sample_sim(3);
        sim.warmup(10);
        let obj = sim.readings().as_object().unwrap().clone();
        assert_eq!(obj["ticks"].as_f64(), Some(10.0));
    }

    #[test]
    fn inject_fault_on_known_turbine_appends_to_its_fault_list() {
        let mut sim = sample_sim(4);
        sim.inject_fault("wt-000");
        let obj = sim.readings().as_object().unwrap().clone();
        let wts = obj["wts"].as_array().unwrap();
        let wt0 = wts[0].as_object().unwrap();
        let faults = wt0["_faults"].as_array().unwrap();
        assert_eq!(faults.len(), 1);
    }

    #[test]
    fn inject_fault_on_unknown_turbine_is_a_no_op() {
        let mut sim = sample_sim(5);
        sim.inject_fault("does-not-exist");
        let obj = sim.readings().as_object().unwrap().clone();
        let wts = obj["wts"].as_array().unwrap();
        for wt in wts {
            assert!(wt.as_object().unwrap()["_faults"].as_array().unwrap().is_empty());
        }
    }

    #[test]
    fn every_emitted_reading_has_all_five_env_fields_alongside_wts() {
        let sim = sample_sim(6);
        let obj = sim.readings().as_object().unwrap().clone();
        for key in ["env_wind_angle", "env_wind_mag", "env_temp", "wave_mag", "visibility", "ticks", "uptime", "wts"] {
            assert!(obj.contains_key(key), "missing {key}");
        }
    }
}
