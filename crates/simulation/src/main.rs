//! The Simulation process: owns the turbine fleet and environment, ticks
//! them at wall-clock pace, and publishes `map_cfg` and `readings_queue` to
//! the shared namespace. Grounded in `datagen/cli.py::main`/`_build_sim`.

use std::sync::atomic::Ordering;
use std::time::Duration;

use clap::Parser;
use rand::rngs::StdRng;
use rand::SeedableRng;
use tracing::info;
use windfarm_common::cli::{init_logging, shutdown_flag, ManagerArgs};
use windfarm_common::mapcfg::parse_map_config;
use windfarm_common::{Slot, Value};

use manager::Client;
use simulation::config::Config;
use simulation::{add_fault_log_message, push_bounded, Simulation};

#[derive(Parser)]
#[command(about = "Simulates wind turbines and environmental conditions for the wind farm platform")]
struct Cli {
    #[command(flatten)]
    manager: ManagerArgs,

    /// Seed for the random number generator; omit for a nondeterministic run.
    #[arg(long)]
    seed: Option<u64>,

    /// Number of ticks to warm up the simulation after initialisation.
    #[arg(long, default_value_t = 10)]
    warmup: u32,

    /// YAML file with simulation constants; unrecognised fields are fatal.
    #[arg(long)]
    config: Option<std::path::PathBuf>,

    /// YAML file describing turbines, models, and drone stations.
    #[arg(long)]
    map: std::path::PathBuf,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    init_logging();
    let cli = Cli::parse();

    let cfg = match &cli.config {
        Some(path) => {
            let yaml = std::fs::read_to_string(path)?;
            Config::from_yaml(&yaml).map_err(|e| anyhow::anyhow!("invalid simulation config: {e}"))?
        }
        None => Config::default(),
    };

    let map_yaml = std::fs::read_to_string(&cli.map)?;
    let map = parse_map_config(&map_yaml)?;
    map.validate()?;

    let rng = match cli.seed {
        Some(seed) => StdRng::seed_from_u64(seed),
        None => StdRng::from_entropy(),
    };

    let client = Client::connect(
        "datagen_sim",
        &cli.manager.manager_host,
        cli.manager.manager_port,
        cli.manager.authkey_bytes(),
    )
    .await?;

    client.set_slot(Slot::MapCfg, yaml_to_value(&map_yaml)?).await?;

    let period = Duration::from_secs_f64(1.0 / cfg.ticks_per_second);
    let mut sim = Simulation::new(rng, cfg, &map)?;
    info!("Starting warmup");
    sim.warmup(cli.warmup);
    info!("Done");

    let mut readings_queue: Vec<Value> = Vec::new();
    let running = shutdown_flag();

    while running.load(Ordering::SeqCst) {
        drain_add_faults(&client, &mut sim).await?;

        sim.tick();
        push_bounded(&mut readings_queue, sim.readings(), sim.history_length());
        client.set_slot(Slot::ReadingsQueue, Value::Array(readings_queue.clone())).await?;

        tokio::time::sleep(period).await;
    }

    info!("Simulation loop terminated");
    Ok(())
}

/// Reads `add_faults`, clears it, and injects a fault of the first
/// registered type for each listed turbine id, per spec §4.2 step 1.
async fn drain_add_faults(client: &Client, sim: &mut Simulation) -> anyhow::Result<()> {
    let Some(Value::Array(ids)) = client.get_slot(Slot::AddFaults).await? else {
        return Ok(());
    };
    if ids.is_empty() {
        return Ok(());
    }
    client.set_slot(Slot::AddFaults, Value::Array(Vec::new())).await?;
    for id in ids {
        if let Some(wt_id) = id.as_str() {
            sim.inject_fault(wt_id);
            client.log(&add_fault_log_message(wt_id), "info").await?;
        }
    }
    Ok(())
}

/// Converts a parsed map YAML document into a [`Value`] tree for
/// publication on `map_cfg`, since consumers (Scheduler, API) read it
/// structurally rather than through [`windfarm_common::mapcfg::MapConfig`].
fn yaml_to_value(yaml: &str) -> anyhow::Result<Value> {
    let doc: serde_yaml::Value = serde_yaml::from_str(yaml)?;
    Ok(yaml_value_to_value(&doc))
}

fn yaml_value_to_value(yaml: &serde_yaml::Value) -> Value {
    match yaml {
        serde_yaml::Value::Null => Value::String(String::new()),
        serde_yaml::Value::Bool(b) => Value::String(b.to_string()),
        serde_yaml::Value::Number(n) => Value::Number(n.as_f64().unwrap_or(0.0)),
        serde_yaml::Value::String(s) => Value::String(s.clone()),
        serde_yaml::Value::Sequence(seq) => Value::Array(seq.iter().map(yaml_value_to_value).collect()),
        serde_yaml::Value::Mapping(map) => {
            let mut m = std::collections::BTreeMap::new();
            for (k, v) in map {
                if let Some(key) = k.as_str() {
                    m.insert(key.to_string(), yaml_value_to_value(v));
                }
            }
            Value::Object(m)
        }
        serde_yaml::Value::Tagged(t) => yaml_value_to_value(&t.value),
    }
}
