//! Simulation configuration. Grounded in `datagen/datagen/config.py`'s
//! `Config` dataclass: the field names, defaults, and the
//! load-only-what's-overridden-and-reject-unknown-keys semantics are
//! carried over directly; the `eval()`-based arithmetic expression support
//! is reimplemented with the checked evaluator in
//! `windfarm_common::expr` instead of a real `eval`.

use serde::{Deserialize, Serialize};
use thiserror::Error;
use windfarm_common::expr;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Config {
    pub ticks_per_second: f64,
    pub wts: u32,
    pub tick_freq: u32,
    pub wind_mag_mean: f64,
    pub wind_mag_var: f64,
    pub wind_angle_jitter: f64,
    pub wind_mag_jitter: f64,
    pub temp_mean: f64,
    pub temp_jitter: f64,
    pub temp_annual_spread: f64,
    pub temp_daily_spread: f64,
    pub temp_daily_std: f64,
    pub temp_annual_std: f64,
    pub rotor_rps_relative_var: f64,
    pub tower_vib_freq_mean: f64,
    pub tower_vib_freq_var: f64,
    pub gen_temp_diff_mean: f64,
    pub gen_temp_diff_var: f64,
    pub history_length: usize,
    pub wave_mag_mean: f64,
    pub wave_mag_var: f64,
    pub visibility_mean: f64,
    pub visibility_var: f64,
}

impl Default for Config {
    fn default() -> Self {
        Config {
            ticks_per_second: 1.0,
            wts: 3,
            tick_freq: 60 * 60,
            wind_mag_mean: 5.5,
            wind_mag_var: 3.1,
            wind_angle_jitter: 0.5,
            wind_mag_jitter: 0.5,
            temp_mean: 8.1,
            temp_jitter: 0.5,
            temp_annual_spread: 10.0,
            temp_daily_spread: 7.0,
            temp_daily_std: 2.0,
            temp_annual_std: 2.0,
            rotor_rps_relative_var: 0.01,
            tower_vib_freq_mean: 4.3e3,
            tower_vib_freq_var: 2e2,
            gen_temp_diff_mean: 2.0,
            gen_temp_diff_var: 0.5,
            history_length: 1024,
            wave_mag_mean: 1.5,
            wave_mag_var: 0.5,
            visibility_mean: 20.0,
            visibility_var: 3.0,
        }
    }
}

#[derive(Debug, Error, PartialEq)]
pub enum ConfigError {
    #[error("unknown config field: {0}")]
    UnknownField(String),
    #[error("invalid type for field {field}: expected a number")]
    InvalidType { field: String },
    #[error("could not evaluate arithmetic expression for field {field}: {source}")]
    BadExpression { field: String, source: expr::ExprError },
    #[error(transparent)]
    Yaml(#[from] serde_yaml::Error),
}

impl Config {
    pub fn ticks_per_day(&self) -> f64 {
        24.0 * 60.0 * 60.0 / self.tick_freq as f64
    }

    pub fn ticks_per_minute(&self) -> f64 {
        60.0 / self.tick_freq as f64
    }

    /// Matches `datagen/datagen/config.py::Config.ticks_per_year`'s literal
    /// `356` (not `365`) day count.
    pub fn ticks_per_year(&self) -> f64 {
        356.0 * 24.0 * 60.0 * 60.0 / self.tick_freq as f64
    }

    /// Loads overrides from YAML on top of [`Config::default`]. Any key not
    /// matching a known field is a fatal `UnknownField` error; string
    /// values on numeric fields are evaluated as arithmetic expressions.
    pub fn from_yaml(yaml: &str) -> Result<Config, ConfigError> {
        let mut cfg = Config::default();
        let raw: serde_yaml::Mapping = serde_yaml::from_str(yaml)?;
        for (k, v) in raw {
            let key = k.as_str().unwrap_or_default().to_string();
            cfg.apply_override(&key, v)?;
        }
        Ok(cfg)
    }

    fn apply_override(&mut self, key: &str, value: serde_yaml::Value) -> Result<(), ConfigError> {
        macro_rules! set_f64 {
            ($field:ident) => {{
                self.$field = numeric_field(key, value)?;
            }};
        }
        match key {
            "ticks_per_second" => set_f64!(ticks_per_second),
            "wts" => self.wts = numeric_field(key, value)? as u32,
            "tick_freq" => self.tick_freq = numeric_field(key, value)? as u32,
            "wind_mag_mean" => set_f64!(wind_mag_mean),
            "wind_mag_var" => set_f64!(wind_mag_var),
            "wind_angle_jitter" => set_f64!(wind_angle_jitter),
            "wind_mag_jitter" => set_f64!(wind_mag_jitter),
            "temp_mean" => set_f64!(temp_mean),
            "temp_jitter" => set_f64!(temp_jitter),
            "temp_annual_spread" => set_f64!(temp_annual_spread),
            "temp_daily_spread" => set_f64!(temp_daily_spread),
            "temp_daily_std" => set_f64!(temp_daily_std),
            "temp_annual_std" => set_f64!(temp_annual_std),
            "rotor_rps_relative_var" => set_f64!(rotor_rps_relative_var),
            "tower_vib_freq_mean" => set_f64!(tower_vib_freq_mean),
            "tower_vib_freq_var" => set_f64!(tower_vib_freq_var),
            "gen_temp_diff_mean" => set_f64!(gen_temp_diff_mean),
            "gen_temp_diff_var" => set_f64!(gen_temp_diff_var),
            "history_length" => self.history_length = numeric_field(key, value)? as usize,
            "wave_mag_mean" => set_f64!(wave_mag_mean),
            "wave_mag_var" => set_f64!(wave_mag_var),
            "visibility_mean" => set_f64!(visibility_mean),
            "visibility_var" => set_f64!(visibility_var),
            other => return Err(ConfigError::UnknownField(other.to_string())),
        }
        Ok(())
    }
}

fn numeric_field(field: &str, value: serde_yaml::Value) -> Result<f64, ConfigError> {
    match value {
        serde_yaml::Value::Number(n) => n
            .as_f64()
            .ok_or_else(|| ConfigError::InvalidType { field: field.to_string() }),
        serde_yaml::Value::String(s) => {
            expr::eval(&s).map_err(|source| ConfigError::BadExpression { field: field.to_string(), source })
        }
        _ => Err(ConfigError::InvalidType { field: field.to_string() }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_matches_documented_defaults() {
        let cfg = Config::default();
        assert_eq!(cfg.wts, 3);
        assert_eq!(cfg.tick_freq, 3600);
        assert_eq!(cfg.history_length, 1024);
    }

    #[test]
    fn loads_a_partial_override() {
        let cfg = Config::from_yaml("wts: 5\nhistory_length: 10\n").unwrap();
        assert_eq!(cfg.wts, 5);
        assert_eq!(cfg.history_length, 10);
        assert_eq!(cfg.tick_freq, 3600, "fields not mentioned keep their default");
    }

    #[test]
    fn unknown_field_is_fatal() {
        let err = Config::from_yaml("not_a_real_field: 1\n").unwrap_err();
        assert_eq!(err, ConfigError::UnknownField("not_a_real_field".into()));
    }

    #[test]
    fn string_arithmetic_expression_is_evaluated_for_numeric_fields() {
        let cfg = Config::from_yaml("tick_freq: \"60 * 60\"\n").unwrap();
        assert_eq!(cfg.tick_freq, 3600);
    }

    #[test]
    fn non_numeric_string_on_a_numeric_field_is_an_error() {
        let err = Config::from_yaml("tick_freq: \"not a number\"\n").unwrap_err();
        assert!(matches!(err, ConfigError::BadExpression { .. }));
    }

    #[test]
    fn round_trips_through_yaml_serialization() {
        let cfg = Config::default();
        let yaml = serde_yaml::to_string(&cfg).unwrap();
        let back: Config = serde_yaml::from_str(&yaml).unwrap();
        assert_eq!(cfg, back);
    }

    #[test]
    fn derived_tick_rates_follow_tick_freq() {
        let cfg = Config { tick_freq: 3600, ..Config::default() };
        assert!((cfg.ticks_per_minute() - (60.0 / 3600.0)).abs() < 1e-12);
        assert!((cfg.ticks_per_day() - 24.0).abs() < 1e-9);
    }
}
