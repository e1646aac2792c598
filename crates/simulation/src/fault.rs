//! Wind turbine fault injection. Grounded in `datagen/datagen/types.py`'s
//! `Fault` hierarchy (`RotorBladeSurfaceCrack`, `GeneratorDamage`) and its
//! `WindTurbine.wt_fault` decorator, which registered a fault class against
//! a spawn probability in a module-level dict. Rust has no decorator
//! equivalent, so the registry here is an explicit static table of
//! `(name, probability, constructor)` built with [`register_fault`],
//! checked once per tick in [`maybe_spawn_faults`].

use rand::rngs::StdRng;
use rand::Rng;
use rand_distr::{Beta, Distribution};
use serde::{Deserialize, Serialize};
use tracing::info;

/// Per-tick base spawn probability, matching `datagen/datagen/types.py`'s
/// module-level `P = 1e-8`; actual spawn chance is `P * cfg.tick_freq`.
pub const BASE_FAULT_PROBABILITY: f64 = 1e-8;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum Fault {
    RotorBladeSurfaceCrack { rps_factor: f64 },
    GeneratorDamage { power_factor: f64 },
}

impl Fault {
    pub fn name(&self) -> &'static str {
        match self {
            Fault::RotorBladeSurfaceCrack { .. } => "RotorBladeSurfaceCrack",
            Fault::GeneratorDamage { .. } => "GeneratorDamage",
        }
    }

    /// Hook run before a turbine's components tick. Neither known fault
    /// type has pre-tick behavior, matching the original's `bofore_tick`
    /// no-op default.
    pub fn before_tick(&mut self) {}

    /// Hook run after a turbine's components tick; applies the fault's
    /// degradation onto the already-ticked component readings.
    pub fn after_tick(&self, rotor_rps: &mut f64, generator_power: &mut f64) {
        match self {
            Fault::RotorBladeSurfaceCrack { rps_factor } => *rotor_rps *= rps_factor,
            Fault::GeneratorDamage { power_factor } => *generator_power *= power_factor,
        }
    }
}

impl std::fmt::Display for Fault {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Fault::RotorBladeSurfaceCrack { rps_factor } => write!(f, "RotorBladeSurfaceCrack[rps_factor={rps_factor:.5}]"),
            Fault::GeneratorDamage { power_factor } => write!(f, "GeneratorDamage[power_factor={power_factor:.5}]"),
        }
    }
}

type FaultCtor = fn(&mut StdRng) -> Fault;

struct FaultType {
    probability: f64,
    ctor: FaultCtor,
}

/// Registers a fault type at a given per-tick base probability with a
/// constructor that draws its severity parameter from the rng. Used to
/// build the static [`FAULT_REGISTRY`] below.
const fn register_fault(probability: f64, ctor: FaultCtor) -> FaultType {
    FaultType { probability, ctor }
}

fn rotor_blade_surface_crack(rng: &mut StdRng) -> Fault {
    let rps_factor = Beta::new(20.0, 2.0).unwrap().sample(rng);
    Fault::RotorBladeSurfaceCrack { rps_factor }
}

fn generator_damage(rng: &mut StdRng) -> Fault {
    let power_factor = Beta::new(20.0, 2.0).unwrap().sample(rng);
    Fault::GeneratorDamage { power_factor }
}

static FAULT_REGISTRY: &[FaultType] = &[
    register_fault(BASE_FAULT_PROBABILITY, rotor_blade_surface_crack),
    register_fault(BASE_FAULT_PROBABILITY, generator_damage),
];

/// Rolls each registered fault type against `probability * tick_freq` and
/// appends any that spawn to `faults`, logging the new fault at `info`
/// the way the original's `WindTurbine.tick` did.
pub fn maybe_spawn_faults(rng: &mut StdRng, tick_freq: u32, wt_id: &str, faults: &mut Vec<Fault>) {
    for fault_type in FAULT_REGISTRY {
        if rng.gen::<f64>() < fault_type.probability * tick_freq as f64 {
            let new_fault = (fault_type.ctor)(rng);
            info!("WT[{wt_id}]: New fault {new_fault}");
            faults.push(new_fault);
        }
    }
}

/// Injects a fault of the first registered type, for the `add_faults`
/// external control surface (spec §4.2 step 1: "enqueue a fault of the
/// first registered type").
pub fn inject_first_registered(rng: &mut StdRng, faults: &mut Vec<Fault>) {
    let fault_type = &FAULT_REGISTRY[0];
    faults.push((fault_type.ctor)(rng));
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;

    #[test]
    fn display_format_matches_the_original_python_repr() {
        let fault = Fault::RotorBladeSurfaceCrack { rps_factor: 0.95432 };
        assert_eq!(fault.to_string(), "RotorBladeSurfaceCrack[rps_factor=0.95432]");
    }

    #[test]
    fn after_tick_applies_the_expected_factor() {
        let fault = Fault::RotorBladeSurfaceCrack { rps_factor: 0.5 };
        let mut rps = 10.0;
        let mut power = 100.0;
        fault.after_tick(&mut rps, &mut power);
        assert_eq!(rps, 5.0);
        assert_eq!(power, 100.0, "rotor fault must not touch generator power");

        let fault = Fault::GeneratorDamage { power_factor: 0.25 };
        let mut rps = 10.0;
        let mut power = 100.0;
        fault.after_tick(&mut rps, &mut power);
        assert_eq!(rps, 10.0, "generator fault must not touch rotor rps");
        assert_eq!(power, 25.0);
    }

    #[test]
    fn vanishingly_small_tick_freq_almost_never_spawns_a_fault() {
        let mut rng = StdRng::seed_from_u64(1);
        let mut faults = Vec::new();
        for _ in 0..1000 {
            maybe_spawn_faults(&mut rng, 1, "wt-0", &mut faults);
        }
        assert!(faults.is_empty(), "probability * tick_freq = 1e-8 should not spawn in 1000 rolls");
    }

    #[test]
    fn a_guaranteed_roll_spawns_a_fault_of_each_registered_type() {
        let mut rng = StdRng::seed_from_u64(2);
        let mut faults = Vec::new();
        let huge_tick_freq = (2.0 / BASE_FAULT_PROBABILITY) as u32;
        maybe_spawn_faults(&mut rng, huge_tick_freq, "wt-0", &mut faults);
        assert_eq!(faults.len(), FAULT_REGISTRY.len());
    }

    #[test]
    fn inject_first_registered_adds_exactly_one_fault_of_the_first_type() {
        let mut rng = StdRng::seed_from_u64(9);
        let mut faults = Vec::new();
        inject_first_registered(&mut rng, &mut faults);
        assert_eq!(faults.len(), 1);
        assert_eq!(faults[0].name(), "RotorBladeSurfaceCrack");
    }

    #[test]
    fn fault_severity_factors_are_drawn_from_a_unit_interval_beta() {
        let mut rng = StdRng::seed_from_u64(3);
        for _ in 0..50 {
            let fault = rotor_blade_surface_crack(&mut rng);
            if let Fault::RotorBladeSurfaceCrack { rps_factor } = fault {
                assert!((0.0..=1.0).contains(&rps_factor));
            }
        }
    }
}
