//! The three fixed wind turbine subsystems: tower, rotor, and generator.
//! Grounded in `datagen/datagen/types.py`'s `Tower`/`Rotor`/`Generator`
//! classes, which originally conformed to a `Component` `Protocol`. Since
//! the component set is closed and each `tick` reads different turbine
//! state, the protocol is not reified as a single polymorphic trait here;
//! instead each component exposes its own `tick`, taking exactly the model
//! parameters and environment fields it needs, and `WindTurbine::tick`
//! (in `turbine.rs`) sequences the three calls explicitly. Only
//! `readings`, which every component produces independent of the others'
//! state, is shared through the [`Component`] trait.

use rand::rngs::StdRng;
use rand_distr::{Distribution, Normal};
use serde::{Deserialize, Serialize};
use windfarm_common::autocorr::smooth_step;
use windfarm_common::value_object;
use windfarm_common::Value;

use crate::config::Config;
use crate::environment::Environment;
use crate::turbine::WindTurbineModel;

pub trait Component {
    fn readings(&self) -> Value;
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Tower {
    pub vib_freq: f64,
}

impl Tower {
    pub fn factory(rng: &mut StdRng, cfg: &Config) -> Tower {
        let vib_freq = Normal::new(cfg.tower_vib_freq_mean, cfg.tower_vib_freq_var)
            .unwrap()
            .sample(rng)
            .max(0.0);
        Tower { vib_freq }
    }

    pub fn tick(&mut self, rng: &mut StdRng, cfg: &Config) {
        let vib_freq = Normal::new(cfg.tower_vib_freq_mean, cfg.tower_vib_freq_var)
            .unwrap()
            .sample(rng)
            .max(0.0);
        self.vib_freq = vib_freq;
    }
}

impl Component for Tower {
    fn readings(&self) -> Value {
        value_object! { "tower_vib_freq" => self.vib_freq }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Rotor {
    pub rps: f64,
}

impl Rotor {
    pub fn factory() -> Rotor {
        Rotor { rps: 0.0 }
    }

    pub fn tick(&mut self, rng: &mut StdRng, cfg: &Config, model: &WindTurbineModel, wind_mag: f64) {
        let mut rps = smooth_step(wind_mag, model.cut_in, model.rated - model.cut_in);
        rps *= model.rotor_rpm / cfg.ticks_per_minute();
        rps *= Normal::new(1.0, cfg.rotor_rps_relative_var).unwrap().sample(rng);
        self.rps = rps.max(0.0);
    }
}

impl Component for Rotor {
    fn readings(&self) -> Value {
        value_object! { "rotor_rps" => self.rps }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Generator {
    pub temp: f64,
    pub power: f64,
}

impl Generator {
    pub fn factory(env: &Environment) -> Generator {
        Generator { temp: env.temp, power: 0.0 }
    }

    /// `rotor_rps` is the rotor speed from *before* this tick's rotor
    /// update, matching the original's component order
    /// (`[generator, tower, rotor]`) where the generator reads the
    /// previous tick's rotor speed.
    pub fn tick(&mut self, rng: &mut StdRng, cfg: &Config, model: &WindTurbineModel, env_temp: f64, rotor_rps: f64) {
        let temp_d = Normal::new(cfg.gen_temp_diff_mean, cfg.gen_temp_diff_var).unwrap().sample(rng);
        self.temp = env_temp + temp_d;
        self.power = model.capacity * rotor_rps / (model.rotor_rpm / cfg.ticks_per_minute());
    }
}

impl Component for Generator {
    fn readings(&self) -> Value {
        value_object! { "generator_temp" => self.temp, "power" => self.power }
    }
}
