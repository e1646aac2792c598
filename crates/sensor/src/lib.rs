//! Sensor classifier: flags turbines whose power output has dropped well
//! below what their peers are producing at the same tick. Reimplements
//! `sensor_service/sensor_service/__init__.py::get_fault_alerts`/`_get_fprob`
//! without a dataframe library — the readings queue is small enough that
//! plain grouped `Vec`s are the idiomatic Rust equivalent.

use std::collections::{BTreeMap, HashMap};

use windfarm_common::Value;

/// Per-tick reference is the 75th percentile of power across all turbines.
pub const DEFAULT_THRESHOLD: f64 = -0.08;
pub const DEFAULT_WIDTH: f64 = 0.05;
/// Rolling window over the smoothed fault probability, in ticks.
pub const ROLLING_WINDOW: usize = 30;
/// Minimum valid samples in the rolling window before a prediction is made.
pub const MIN_PERIODS: usize = 20;
/// Minimum distinct ticks required in the readings queue before classifying.
pub const MIN_UNIQUE_TICKS: usize = 25;
/// Ticks a turbine is excluded from re-alerting after it alerts once.
pub const COOLDOWN_TICKS: u32 = 100;

struct Row {
    tick: i64,
    wt_id: String,
    power: f64,
}

/// Stateful fault classifier: the logistic scoring and rolling mean are
/// recomputed fresh from the readings queue passed to each call, but the
/// per-turbine cooldown persists across calls.
pub struct Classifier {
    threshold: f64,
    width: f64,
    cooldowns: HashMap<String, u32>,
}

impl Default for Classifier {
    fn default() -> Self {
        Classifier { threshold: DEFAULT_THRESHOLD, width: DEFAULT_WIDTH, cooldowns: HashMap::new() }
    }
}

impl Classifier {
    pub fn new() -> Classifier {
        Classifier::default()
    }

    /// Returns the turbine ids newly alerting at the most recent tick in
    /// `readings_queue`, applying the per-turbine cooldown, and advances
    /// every active cooldown by one tick.
    pub fn classify(&mut self, readings_queue: &[Value]) -> Vec<String> {
        let rows = flatten_rows(readings_queue);
        let unique_ticks: std::collections::BTreeSet<i64> = rows.iter().map(|r| r.tick).collect();
        if unique_ticks.len() < MIN_UNIQUE_TICKS {
            return Vec::new();
        }

        let reference = reference_per_tick(&rows);
        let mut by_wt: BTreeMap<String, Vec<(i64, f64)>> = BTreeMap::new();
        for row in &rows {
            let refv = reference[&row.tick];
            let dev = (row.power - refv) / refv;
            let fprob = logistic(dev, self.threshold, self.width);
            by_wt.entry(row.wt_id.clone()).or_default().push((row.tick, fprob));
        }

        let max_tick = *unique_ticks.iter().max().expect("checked non-empty above");
        let mut alerting: Vec<String> = Vec::new();
        for (wt_id, series) in &by_wt {
            if let Some(smoothed) = rolling_mean_at(series, max_tick) {
                if smoothed > 0.5 {
                    alerting.push(wt_id.clone());
                }
            }
        }

        let mut alerts = Vec::new();
        for wt_id in alerting {
            if !self.cooldowns.contains_key(&wt_id) {
                alerts.push(wt_id.clone());
                self.cooldowns.insert(wt_id, COOLDOWN_TICKS);
            }
        }
        self.tick_cooldowns();
        alerts
    }

    fn tick_cooldowns(&mut self) {
        let expired: Vec<String> = self
            .cooldowns
            .iter_mut()
            .filter_map(|(k, v)| {
                if *v == 0 {
                    Some(k.clone())
                } else {
                    *v -= 1;
                    None
                }
            })
            .collect();
        for k in expired {
            self.cooldowns.remove(&k);
        }
    }
}

fn flatten_rows(readings_queue: &[Value]) -> Vec<Row> {
    let mut rows = Vec::new();
    for entry in readings_queue {
        let Some(obj) = entry.as_object() else { continue };
        let Some(tick) = obj.get("ticks").and_then(Value::as_f64) else { continue };
        let Some(wts) = obj.get("wts").and_then(Value::as_array) else { continue };
        for wt in wts {
            let Some(wobj) = wt.as_object() else { continue };
            let (Some(wt_id), Some(power)) =
                (wobj.get("wt_id").and_then(Value::as_str), wobj.get("power").and_then(Value::as_f64))
            else {
                continue;
            };
            rows.push(Row { tick: tick as i64, wt_id: wt_id.to_string(), power });
        }
    }
    rows
}

fn reference_per_tick(rows: &[Row]) -> HashMap<i64, f64> {
    let mut by_tick: BTreeMap<i64, Vec<f64>> = BTreeMap::new();
    for row in rows {
        by_tick.entry(row.tick).or_default().push(row.power);
    }
    by_tick.into_iter().map(|(tick, powers)| (tick, percentile(&powers, 0.75))).collect()
}

/// Linear-interpolated percentile, matching numpy/pandas' default `quantile`
/// method.
fn percentile(values: &[f64], q: f64) -> f64 {
    let mut sorted = values.to_vec();
    sorted.sort_by(|a, b| a.partial_cmp(b).unwrap());
    let n = sorted.len();
    if n == 1 {
        return sorted[0];
    }
    let pos = q * (n as f64 - 1.0);
    let lo = pos.floor() as usize;
    let hi = pos.ceil() as usize;
    if lo == hi {
        sorted[lo]
    } else {
        let frac = pos - lo as f64;
        sorted[lo] + (sorted[hi] - sorted[lo]) * frac
    }
}

fn logistic(dev: f64, threshold: f64, width: f64) -> f64 {
    1.0 / (1.0 + ((dev - threshold) / width).exp())
}

/// `series` is `(tick, fprob)` pairs in ascending tick order for one
/// turbine. Returns the rolling mean of the trailing [`ROLLING_WINDOW`]
/// samples ending at `target_tick`, or `None` if fewer than [`MIN_PERIODS`]
/// samples are available (matching pandas' `rolling(30,
/// min_periods=20).mean()` followed by `dropna`).
fn rolling_mean_at(series: &[(i64, f64)], target_tick: i64) -> Option<f64> {
    let idx = series.iter().position(|(tick, _)| *tick == target_tick)?;
    let lo = idx.saturating_sub(ROLLING_WINDOW - 1);
    let window = &series[lo..=idx];
    if window.len() < MIN_PERIODS {
        return None;
    }
    Some(window.iter().map(|(_, f)| f).sum::<f64>() / window.len() as f64)
}
