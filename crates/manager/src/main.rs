use clap::Parser;
use tracing::info;
use windfarm_common::cli::init_logging;

use manager::Server;

#[derive(Parser)]
#[command(about = "Hosts the shared-state namespace for the wind farm simulation platform")]
struct Cli {
    /// Host to bind the manager's listening socket on.
    #[arg(long, default_value = "127.0.0.1")]
    host: String,

    /// Port to bind the manager's listening socket on.
    #[arg(long, default_value_t = 6789)]
    port: u16,

    /// Pre-shared key clients must authenticate with.
    #[arg(long, default_value = "GPIG")]
    authkey: String,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    init_logging();
    let cli = Cli::parse();
    info!("Running manager on {}:{}", cli.host, cli.port);
    let server = Server::new(cli.host, cli.port, cli.authkey.into_bytes());
    server.run().await
}
