//! Read-through HTTP view of the shared namespace, plus the disable/enable
//! and manual-fault-injection command endpoints. Grounded on the teacher's
//! `hub/src/web.rs` (`AppState`, `axum::Router`, `tower::oneshot` test
//! style); the endpoint list and per-turbine status derivation are grounded
//! on `original_source/api/api/__init__.py` and `original_source/datagen/datagen/api.py`.

use std::collections::BTreeMap;

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Json};
use axum::routing::{get, post};
use axum::Router;
use serde_json::json;

use manager::Client;
use windfarm_common::{Slot, Value};

use crate::db::Db;

#[derive(Clone)]
pub struct AppState {
    pub client: std::sync::Arc<Client>,
    pub db: Db,
}

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/readings", get(get_readings))
        .route("/wind-turbines", get(get_wind_turbines))
        .route("/wind-turbines/{id}", get(get_wind_turbine))
        .route("/wind-turbines/{id}/disable", post(disable_wind_turbine))
        .route("/wind-turbines/{id}/enable", post(enable_wind_turbine))
        .route("/env-sensors", get(get_env_sensors))
        .route("/map", get(get_map))
        .route("/drones", get(get_drones))
        .route("/logs", get(get_logs))
        .route("/add-fault/{id}", post(add_fault))
        .with_state(state)
}

fn not_found() -> impl IntoResponse {
    (StatusCode::NOT_FOUND, Json(json!({ "msg": "Not found" })))
}

fn unavailable() -> impl IntoResponse {
    StatusCode::SERVICE_UNAVAILABLE
}

async fn latest_reading(client: &Client) -> Option<Value> {
    let Value::Array(queue) = client.get_slot(Slot::ReadingsQueue).await.ok()?? else {
        return None;
    };
    queue.last().cloned()
}

fn turbine_entries(map_cfg: &Value) -> Vec<Value> {
    map_cfg
        .as_object()
        .and_then(|o| o.get("turbines"))
        .and_then(Value::as_array)
        .map(<[Value]>::to_vec)
        .unwrap_or_default()
}

fn find_turbine<'a>(turbines: &'a [Value], id: &str) -> Option<&'a Value> {
    turbines.iter().find(|t| t.as_object().and_then(|o| o.get("id")).and_then(Value::as_str) == Some(id))
}

fn wt_faults(reading: Option<&Value>, id: &str) -> Vec<Value> {
    let Some(reading) = reading else { return Vec::new() };
    let Some(wts) = reading.as_object().and_then(|o| o.get("wts")).and_then(Value::as_array) else {
        return Vec::new();
    };
    wts.iter()
        .find(|wt| wt.as_object().and_then(|o| o.get("wt_id")).and_then(Value::as_str) == Some(id))
        .and_then(|wt| wt.as_object())
        .and_then(|o| o.get("_faults"))
        .and_then(Value::as_array)
        .map(<[Value]>::to_vec)
        .unwrap_or_default()
}

/// `status` is derived from the idle-override flag first, then whether the
/// turbine's most recent readings carry any active fault, matching the
/// spec's `{idle, warning, running}` three-way classification.
fn status_for(disabled: bool, faults: &[Value]) -> &'static str {
    if disabled {
        "idle"
    } else if faults.is_empty() {
        "running"
    } else {
        "warning"
    }
}

async fn get_readings(State(state): State<AppState>) -> impl IntoResponse {
    match latest_reading(&state.client).await {
        Some(reading) => Json(reading).into_response(),
        None => unavailable().into_response(),
    }
}

async fn get_wind_turbines(State(state): State<AppState>) -> impl IntoResponse {
    let Some(map_cfg) = state.client.get_slot(Slot::MapCfg).await.ok().flatten() else {
        return unavailable().into_response();
    };
    let reading = latest_reading(&state.client).await;
    let turbines = turbine_entries(&map_cfg);

    let mut out = Vec::with_capacity(turbines.len());
    for wt in &turbines {
        let Some(id) = wt.as_object().and_then(|o| o.get("id")).and_then(Value::as_str) else { continue };
        let disabled = state.db.is_disabled(id).await.unwrap_or(false);
        let faults = wt_faults(reading.as_ref(), id);
        out.push(summarize_turbine(wt, disabled, &faults));
    }
    Json(Value::Array(out)).into_response()
}

async fn get_wind_turbine(State(state): State<AppState>, Path(id): Path<String>) -> impl IntoResponse {
    let Some(map_cfg) = state.client.get_slot(Slot::MapCfg).await.ok().flatten() else {
        return unavailable().into_response();
    };
    let turbines = turbine_entries(&map_cfg);
    let Some(wt) = find_turbine(&turbines, &id) else {
        return not_found().into_response();
    };
    let reading = latest_reading(&state.client).await;
    let disabled = state.db.is_disabled(&id).await.unwrap_or(false);
    let faults = wt_faults(reading.as_ref(), &id);
    Json(summarize_turbine(wt, disabled, &faults)).into_response()
}

fn summarize_turbine(wt: &Value, disabled: bool, faults: &[Value]) -> Value {
    let mut obj = wt.as_object().cloned().unwrap_or_default();
    obj.insert("status".to_string(), Value::String(status_for(disabled, faults).to_string()));
    obj.insert("_faults".to_string(), Value::Array(faults.to_vec()));
    Value::Object(obj)
}

async fn disable_wind_turbine(State(state): State<AppState>, Path(id): Path<String>) -> impl IntoResponse {
    set_disabled(&state, &id, true).await
}

async fn enable_wind_turbine(State(state): State<AppState>, Path(id): Path<String>) -> impl IntoResponse {
    set_disabled(&state, &id, false).await
}

async fn set_disabled(state: &AppState, id: &str, disabled: bool) -> axum::response::Response {
    let Some(map_cfg) = state.client.get_slot(Slot::MapCfg).await.ok().flatten() else {
        return unavailable().into_response();
    };
    let turbines = turbine_entries(&map_cfg);
    if find_turbine(&turbines, id).is_none() {
        return not_found().into_response();
    }
    match state.db.set_disabled(id, disabled).await {
        Ok(()) => Json(json!({ "msg": "ok" })).into_response(),
        Err(_) => unavailable().into_response(),
    }
}

async fn get_env_sensors(State(state): State<AppState>) -> impl IntoResponse {
    let Some(reading) = latest_reading(&state.client).await else {
        return unavailable().into_response();
    };
    let Some(obj) = reading.as_object() else {
        return unavailable().into_response();
    };
    let env: BTreeMap<String, Value> = obj.iter().filter(|(k, _)| *k != "wts").map(|(k, v)| (k.clone(), v.clone())).collect();
    Json(Value::Object(env)).into_response()
}

async fn get_map(State(state): State<AppState>) -> impl IntoResponse {
    match state.client.get_slot(Slot::MapCfg).await.ok().flatten() {
        Some(map_cfg) => Json(map_cfg).into_response(),
        None => unavailable().into_response(),
    }
}

async fn get_drones(State(state): State<AppState>) -> impl IntoResponse {
    let drones = state.client.get_slot(Slot::DronePositions).await.ok().flatten().unwrap_or(Value::Array(Vec::new()));
    Json(drones)
}

async fn get_logs(State(state): State<AppState>) -> impl IntoResponse {
    let logs = state.client.get_slot(Slot::Logs).await.ok().flatten().unwrap_or(Value::Array(Vec::new()));
    Json(logs)
}

async fn add_fault(State(state): State<AppState>, Path(id): Path<String>) -> impl IntoResponse {
    let Some(map_cfg) = state.client.get_slot(Slot::MapCfg).await.ok().flatten() else {
        return unavailable().into_response();
    };
    let turbines = turbine_entries(&map_cfg);
    if find_turbine(&turbines, &id).is_none() {
        return not_found().into_response();
    }

    let mut queue = match state.client.get_slot(Slot::AddFaults).await {
        Ok(Some(Value::Array(ids))) => ids,
        _ => Vec::new(),
    };
    queue.push(Value::String(id));
    match state.client.set_slot(Slot::AddFaults, Value::Array(queue)).await {
        Ok(()) => Json(json!({ "msg": "ok" })).into_response(),
        Err(_) => unavailable().into_response(),
    }
}
