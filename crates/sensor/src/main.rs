//! The Sensor process: classifies the current `readings_queue` once a
//! second and publishes newly alerting turbine ids to `sensor_alerts`.
//! Grounded in `sensor_service/cli.py::main`.

use std::sync::atomic::Ordering;
use std::time::Duration;

use clap::Parser;
use tracing::info;
use windfarm_common::cli::{init_logging, shutdown_flag, ManagerArgs};
use windfarm_common::{Slot, Value};

use manager::Client;
use sensor::Classifier;

const TICK_PERIOD: Duration = Duration::from_secs(1);
const AWAIT_READINGS_PERIOD: Duration = Duration::from_millis(100);

#[derive(Parser)]
#[command(about = "Flags underperforming turbines from the readings stream")]
struct Cli {
    #[command(flatten)]
    manager: ManagerArgs,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    init_logging();
    let cli = Cli::parse();

    let client = Client::connect(
        "sensor_service",
        &cli.manager.manager_host,
        cli.manager.manager_port,
        cli.manager.authkey_bytes(),
    )
    .await?;

    let mut classifier = Classifier::new();
    let running = shutdown_flag();

    while running.load(Ordering::SeqCst) {
        let Some(Value::Array(readings_queue)) = client.get_slot(Slot::ReadingsQueue).await? else {
            tokio::time::sleep(AWAIT_READINGS_PERIOD).await;
            continue;
        };
        if readings_queue.is_empty() {
            tokio::time::sleep(AWAIT_READINGS_PERIOD).await;
            continue;
        }

        let alerts = classifier.classify(&readings_queue);
        if !alerts.is_empty() {
            info!("New fault alerts: {alerts:?}");
            for wt_id in &alerts {
                client.log(&format!("Sensor alert raised for WT[{wt_id}]"), "warning").await?;
            }
        }
        client.set_slot(Slot::SensorAlerts, Value::Array(alerts.into_iter().map(Value::String).collect())).await?;

        tokio::time::sleep(TICK_PERIOD).await;
    }

    info!("Sensor loop terminated");
    Ok(())
}
