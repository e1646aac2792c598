//! The static map description: turbine models, turbine placements, and
//! drone station placements. Grounded in
//! `datagen/datagen/types.py::wind_turbines_from_config` and
//! `drone_scheduling/ds.py::Drone.from_map` — the original splits this
//! across two modules; here it's one shared shape since both the Simulation
//! and the Scheduler read the same `map_cfg` slot.

use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TurbineModel {
    pub name: String,
    /// Rated capacity, in watts.
    pub capacity: f64,
    /// Cut-in wind speed, metres/second.
    pub cut_in: f64,
    /// Rated wind speed, metres/second.
    pub rated: f64,
    /// Maximum rotor RPM.
    pub rotor_rpm: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TurbinePlacement {
    pub id: String,
    pub lat: f64,
    pub lng: f64,
    pub model: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StationPlacement {
    pub id: String,
    pub lat: f64,
    pub lng: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MapConfig {
    pub models: Vec<TurbineModel>,
    pub turbines: Vec<TurbinePlacement>,
    #[serde(default)]
    pub stations: Vec<StationPlacement>,
}

#[derive(Debug, Error, PartialEq)]
pub enum MapConfigError {
    #[error("turbine {turbine_id} references unknown model {model_name}")]
    UnknownModel { turbine_id: String, model_name: String },
}

impl MapConfig {
    pub fn model_for(&self, turbine: &TurbinePlacement) -> Option<&TurbineModel> {
        self.models.iter().find(|m| m.name == turbine.model)
    }

    /// Validates that every turbine references a known model, per the
    /// spec's "unknown model -> fatal" parsing error mode.
    pub fn validate(&self) -> Result<(), MapConfigError> {
        for wt in &self.turbines {
            if self.model_for(wt).is_none() {
                return Err(MapConfigError::UnknownModel {
                    turbine_id: wt.id.clone(),
                    model_name: wt.model.clone(),
                });
            }
        }
        Ok(())
    }

    pub fn turbine_position(&self, id: &str) -> Option<(f64, f64)> {
        self.turbines.iter().find(|t| t.id == id).map(|t| (t.lat, t.lng))
    }
}

pub fn parse_map_config(yaml: &str) -> Result<MapConfig, serde_yaml::Error> {
    serde_yaml::from_str(yaml)
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = r#"
models:
  - name: vestas-v80
    capacity: 1500000
    cut_in: 3.0
    rated: 12.0
    rotor_rpm: 15.0
turbines:
  - id: wt-000
    lat: 53.9
    lng: 1.9
    model: vestas-v80
stations:
  - id: station-a
    lat: 53.8
    lng: 1.8
"#;

    #[test]
    fn parses_a_well_formed_map_config() {
        let cfg = parse_map_config(SAMPLE).unwrap();
        assert_eq!(cfg.models.len(), 1);
        assert_eq!(cfg.turbines.len(), 1);
        assert_eq!(cfg.stations.len(), 1);
    }

    #[test]
    fn validate_accepts_known_models() {
        let cfg = parse_map_config(SAMPLE).unwrap();
        assert!(cfg.validate().is_ok());
    }

    #[test]
    fn validate_rejects_unknown_model_reference() {
        let mut cfg = parse_map_config(SAMPLE).unwrap();
        cfg.turbines[0].model = "nonexistent".into();
        let err = cfg.validate().unwrap_err();
        assert_eq!(
            err,
            MapConfigError::UnknownModel {
                turbine_id: "wt-000".into(),
                model_name: "nonexistent".into(),
            }
        );
    }

    #[test]
    fn missing_required_field_is_a_parse_error() {
        let bad = "models: []\nturbines:\n  - id: wt-000\n    lat: 1.0\n";
        assert!(parse_map_config(bad).is_err());
    }

    #[test]
    fn stations_default_to_empty_when_absent() {
        let without_stations = "models: []\nturbines: []\n";
        let cfg = parse_map_config(without_stations).unwrap();
        assert!(cfg.stations.is_empty());
    }

    #[test]
    fn turbine_position_looks_up_by_id() {
        let cfg = parse_map_config(SAMPLE).unwrap();
        assert_eq!(cfg.turbine_position("wt-000"), Some((53.9, 1.9)));
        assert_eq!(cfg.turbine_position("missing"), None);
    }
}
