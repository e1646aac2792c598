//! The Scheduler process: dispatches drones from their home stations to
//! alerted turbines and back, publishing `drone_positions` and appending to
//! `finished_inspections` once a second. Grounded in
//! `drone_scheduling/ds.py::loop`/`cli.py`.

use std::collections::BTreeMap;
use std::sync::atomic::Ordering;
use std::sync::Arc;
use std::time::Duration;

use clap::Parser;
use tracing::info;
use windfarm_common::cli::{init_logging, shutdown_flag, ManagerArgs};
use windfarm_common::geometry::Point;
use windfarm_common::{Slot, Value};

use manager::Client;
use scheduler::{dispatch, union_into_queue, Drone, Station, DEFAULT_INSPECTION_TICKS};

const TIME_DELTA: Duration = Duration::from_secs(1);

#[derive(Parser)]
#[command(about = "Dispatches inspection drones across the wind farm")]
struct Cli {
    #[command(flatten)]
    manager: ManagerArgs,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    init_logging();
    let _cli = Cli::parse();

    let client = Client::connect(
        "drone_scheduling",
        &_cli.manager.manager_host,
        _cli.manager.manager_port,
        _cli.manager.authkey_bytes(),
    )
    .await?;

    info!("Waiting for map_cfg");
    let map_cfg = client.wait_for_slot(Slot::MapCfg).await?;
    let turbines = turbines_from_map_cfg(&map_cfg);
    let mut drones = drones_from_map_cfg(&map_cfg);
    info!("Starting with {} drones across {} stations", drones.len(), count_stations(&map_cfg));

    client.set_slot(Slot::DronePositions, Value::Array(Vec::new())).await?;

    let mut fault_queue: Vec<String> = Vec::new();
    let running = shutdown_flag();

    while running.load(Ordering::SeqCst) {
        if let Some(Value::Array(alerts)) = client.get_slot(Slot::SensorAlerts).await? {
            let ids: Vec<String> = alerts.iter().filter_map(|v| v.as_str().map(str::to_string)).collect();
            union_into_queue(&mut fault_queue, &ids);
        }

        dispatch(&mut fault_queue, &mut drones, &turbines);

        let mut finished = Vec::new();
        for drone in &mut drones {
            if let Some(wt_id) = drone.advance(DEFAULT_INSPECTION_TICKS) {
                finished.push(wt_id);
            }
        }

        for wt_id in &finished {
            client.append_slot(Slot::FinishedInspections, Value::String(wt_id.clone())).await?;
        }

        client.set_slot(Slot::DronePositions, drone_positions(&drones)).await?;

        tokio::time::sleep(TIME_DELTA).await;
    }

    info!("Scheduler loop terminated");
    Ok(())
}

fn turbines_from_map_cfg(map_cfg: &Value) -> Vec<(String, Point)> {
    let Some(turbines) = map_cfg.as_object().and_then(|o| o.get("turbines")).and_then(|v| v.as_array()) else {
        return Vec::new();
    };
    turbines.iter().filter_map(point_entry).collect()
}

fn count_stations(map_cfg: &Value) -> usize {
    map_cfg
        .as_object()
        .and_then(|o| o.get("stations"))
        .and_then(|v| v.as_array())
        .map(|a| a.len())
        .unwrap_or(0)
}

/// Builds one drone per station listed in `map_cfg`, matching
/// `ds.py::Drone.from_map`'s one-drone-per-station seeding.
fn drones_from_map_cfg(map_cfg: &Value) -> Vec<Drone> {
    let Some(stations) = map_cfg.as_object().and_then(|o| o.get("stations")).and_then(|v| v.as_array()) else {
        return Vec::new();
    };
    stations
        .iter()
        .enumerate()
        .filter_map(|(idx, entry)| {
            let (id, pos) = point_entry(entry)?;
            let station = Arc::new(Station { id, pos });
            Some(Drone::at_station(format!("Drone_{idx}"), station))
        })
        .collect()
}

fn point_entry(entry: &Value) -> Option<(String, Point)> {
    let obj = entry.as_object()?;
    let id = obj.get("id")?.as_str()?.to_string();
    let lat = obj.get("lat")?.as_f64()?;
    let lng = obj.get("lng")?.as_f64()?;
    Some((id, Point::new(lat, lng).biased()))
}

fn drone_positions(drones: &[Drone]) -> Value {
    Value::Array(
        drones
            .iter()
            .map(|d| {
                let unbiased = d.pos.unbiased();
                let mut obj = BTreeMap::new();
                obj.insert("drone_id".to_string(), Value::String(d.id.clone()));
                obj.insert("lat".to_string(), Value::Number(unbiased.lat));
                obj.insert("lng".to_string(), Value::Number(unbiased.lng));
                obj.insert("status".to_string(), Value::String(d.state.status_label().to_string()));
                Value::Object(obj)
            })
            .collect(),
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_map() -> Value {
        windfarm_common::value_object! {
            "turbines" => Value::Array(vec![windfarm_common::value_object! {
                "id" => "wt-000",
                "lat" => 53.9,
                "lng" => 1.9,
            }]),
            "stations" => Value::Array(vec![windfarm_common::value_object! {
                "id" => "station-a",
                "lat" => 53.8,
                "lng" => 1.8,
            }]),
        }
    }

    #[test]
    fn turbines_and_drones_are_parsed_from_map_cfg() {
        let map = sample_map();
        let turbines = turbines_from_map_cfg(&map);
        assert_eq!(turbines.len(), 1);
        assert_eq!(turbines[0].0, "wt-000");

        let drones = drones_from_map_cfg(&map);
        assert_eq!(drones.len(), 1);
        assert_eq!(drones[0].id, "Drone_0");
    }

    #[test]
    fn drone_positions_reports_unbiased_coordinates_and_status() {
        let map = sample_map();
        let drones = drones_from_map_cfg(&map);
        let positions = drone_positions(&drones);
        let entry = positions.as_array().unwrap()[0].as_object().unwrap();
        assert_eq!(entry["status"].as_str(), Some("idle"));
        assert!((entry["lat"].as_f64().unwrap() - 53.8).abs() < 1e-9);
        assert!((entry["lng"].as_f64().unwrap() - 1.8).abs() < 1e-9);
    }

    #[test]
    fn missing_stations_key_yields_no_drones() {
        let map = windfarm_common::value_object! { "turbines" => Value::Array(Vec::new()) };
        assert!(drones_from_map_cfg(&map).is_empty());
    }
}
