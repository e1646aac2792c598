//! The API Gateway process: connects to the manager, opens the idle-override
//! database, and serves the HTTP surface described in `api::routes`.
//! Grounded in `original_source/api/api/__init__.py::main`'s bootstrap
//! sequence (connect as a manager client, then start serving HTTP).

use std::sync::Arc;

use clap::Parser;
use tracing::info;
use windfarm_common::cli::{init_logging, ManagerArgs};

use api::{router, AppState, Db};
use manager::Client;

#[derive(Parser)]
#[command(about = "Serves the HTTP view of the wind farm's shared state")]
struct Cli {
    #[command(flatten)]
    manager: ManagerArgs,

    /// Host the HTTP server binds on.
    #[arg(long, default_value = "127.0.0.1")]
    host: String,

    /// Port the HTTP server listens on.
    #[arg(long, default_value_t = 8080)]
    port: u16,

    /// SQLite connection string for the idle-override store.
    #[arg(long, default_value = "sqlite:windfarm-api.db")]
    db_url: String,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    init_logging();
    let cli = Cli::parse();

    let client = Client::connect(
        "api",
        &cli.manager.manager_host,
        cli.manager.manager_port,
        cli.manager.authkey_bytes(),
    )
    .await?;

    let db = Db::connect(&cli.db_url).await?;
    db.migrate().await?;

    let state = AppState { client: Arc::new(client), db };
    let app = router(state);

    let addr = format!("{}:{}", cli.host, cli.port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    info!("Serving API at {addr}");
    axum::serve(listener, app).await?;

    Ok(())
}
