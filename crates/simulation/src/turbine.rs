//! A single wind turbine: its fixed model parameters, its three
//! components, and the faults currently afflicting it. Grounded in
//! `datagen/datagen/types.py`'s `WindTurbineModel`/`WindTurbine` and
//! `wind_turbines_from_config`.

use std::sync::Arc;

use rand::rngs::StdRng;
use serde::{Deserialize, Serialize};
use windfarm_common::mapcfg::MapConfig;
use windfarm_common::value_object;
use windfarm_common::Value;

use crate::component::{Component, Generator, Rotor, Tower};
use crate::config::Config;
use crate::environment::Environment;
use crate::fault::{maybe_spawn_faults, Fault};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WindTurbineModel {
    pub name: String,
    /// Rated capacity in watts, e.g. 1_500_000.0 for 1.5 megawatts.
    pub capacity: f64,
    /// Cut-in wind speed, m/s.
    pub cut_in: f64,
    /// Rated wind speed, m/s.
    pub rated: f64,
    /// Maximum rotor speed, rotations/min.
    pub rotor_rpm: f64,
}

pub struct WindTurbine {
    pub id: String,
    pub model: Arc<WindTurbineModel>,
    pub tower: Tower,
    pub rotor: Rotor,
    pub generator: Generator,
    pub faults: Vec<Fault>,
}

impl WindTurbine {
    pub fn factory(rng: &mut StdRng, cfg: &Config, env: &Environment, model: Arc<WindTurbineModel>, id: String) -> WindTurbine {
        WindTurbine {
            id,
            tower: Tower::factory(rng, cfg),
            rotor: Rotor::factory(),
            generator: Generator::factory(env),
            model,
            faults: Vec::new(),
        }
    }

    /// Advances the turbine by one tick: runs fault `before_tick` hooks,
    /// then the three components in the original's order
    /// (generator, tower, rotor — so the generator reads the rotor speed
    /// from *before* this tick's rotor update), then rolls for new faults,
    /// then runs fault `after_tick` hooks, which apply degradation on top
    /// of the freshly ticked readings.
    pub fn tick(&mut self, rng: &mut StdRng, cfg: &Config, env: &Environment) {
        for fault in &mut self.faults {
            fault.before_tick();
        }

        let prev_rotor_rps = self.rotor.rps;
        self.generator.tick(rng, cfg, &self.model, env.temp, prev_rotor_rps);
        self.tower.tick(rng, cfg);
        self.rotor.tick(rng, cfg, &self.model, env.wind.mag);

        maybe_spawn_faults(rng, cfg.tick_freq, &self.id, &mut self.faults);

        for fault in &self.faults {
            fault.after_tick(&mut self.rotor.rps, &mut self.generator.power);
        }
    }

    pub fn readings(&self) -> Value {
        let mut obj = std::collections::BTreeMap::new();
        obj.insert("wt_id".to_string(), Value::from(self.id.clone()));
        obj.insert("model_name".to_string(), Value::from(self.model.name.clone()));
        obj.insert(
            "_faults".to_string(),
            Value::Array(self.faults.iter().map(|f| Value::from(f.to_string())).collect()),
        );
        for component_readings in [self.generator.readings(), self.tower.readings(), self.rotor.readings()] {
            if let Value::Object(fields) = component_readings {
                obj.extend(fields);
            }
        }
        Value::Object(obj)
    }
}

/// Builds the turbine fleet from a parsed map configuration, resolving
/// each turbine's named model and reporting an error through
/// [`MapConfig::validate`] before construction if any model is unknown.
pub fn turbines_from_map_config(rng: &mut StdRng, cfg: &Config, env: &Environment, map: &MapConfig) -> anyhow::Result<Vec<WindTurbine>> {
    map.validate()?;
    let mut wts = Vec::with_capacity(map.turbines.len());
    for placement in &map.turbines {
        let m = map.model_for(placement).expect("validated above");
        let model = Arc::new(WindTurbineModel {
            name: m.name.clone(),
            capacity: m.capacity,
            cut_in: m.cut_in,
            rated: m.rated,
            rotor_rpm: m.rotor_rpm,
        });
        wts.push(WindTurbine::factory(rng, cfg, env, model, placement.id.clone()));
    }
    Ok(wts)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;

    fn sample_model() -> Arc<WindTurbineModel> {
        Arc::new(WindTurbineModel {
            name: "v90".into(),
            capacity: 1_500_000.0,
            cut_in: 5.0,
            rated: 15.0,
            rotor_rpm: 20.0,
        })
    }

    #[test]
    fn readings_include_component_and_identity_fields() {
        let mut rng = StdRng::seed_from_u64(1);
        let cfg = Config::default();
        let env = Environment::from_config(&mut rng, &cfg);
        let wt = WindTurbine::factory(&mut rng, &cfg, &env, sample_model(), "wt-000".into());
        let obj = wt.readings().as_object().unwrap().clone();
        for key in ["wt_id", "model_name", "_faults", "tower_vib_freq", "rotor_rps", "generator_temp", "power"] {
            assert!(obj.contains_key(key), "missing key {key}");
        }
        assert_eq!(obj["wt_id"].as_str(), Some("wt-000"));
    }

    #[test]
    fn ticking_updates_rotor_speed_from_zero_when_windy() {
        let mut rng = StdRng::seed_from_u64(2);
        let cfg = Config::default();
        let env = Environment::from_config(&mut rng, &cfg);
        let mut wt = WindTurbine::factory(&mut rng, &cfg, &env, sample_model(), "wt-000".into());
        assert_eq!(wt.rotor.rps, 0.0);
        let mut windy_env = Environment::from_config(&mut rng, &cfg);
        windy_env.wind.mag = 20.0;
        wt.tick(&mut rng, &cfg, &windy_env);
        assert!(wt.rotor.rps > 0.0);
    }

    #[test]
    fn fault_string_representation_appears_in_readings_once_spawned() {
        let mut rng = StdRng::seed_from_u64(3);
        let cfg = Config::default();
        let env = Environment::from_config(&mut rng, &cfg);
        let mut wt = WindTurbine::factory(&mut rng, &cfg, &env, sample_model(), "wt-000".into());
        wt.faults.push(Fault::RotorBladeSurfaceCrack { rps_factor: 0.9 });
        let obj = wt.readings().as_object().unwrap().clone();
        let faults = obj["_faults"].as_array().unwrap();
        assert_eq!(faults.len(), 1);
        assert_eq!(faults[0].as_str(), Some("RotorBladeSurfaceCrack[rps_factor=0.90000]"));
    }
}
