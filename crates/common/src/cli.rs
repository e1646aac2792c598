//! Shared CLI surface for the manager connection, mirrored across all five
//! binaries. Grounded in `manager/manager/__init__.py::add_manager_arguments`
//! and `manager/manager/common.py::add_logging_args` — the original attaches
//! these as extra `argparse` arguments to every process's parser; here each
//! binary's `clap::Parser` struct does `#[command(flatten)]` on
//! [`ManagerArgs`] to the same effect.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use clap::Args;

#[derive(Debug, Args)]
pub struct ManagerArgs {
    /// Host the shared-state manager listens on / the client connects to.
    #[arg(long, default_value = "127.0.0.1")]
    pub manager_host: String,

    /// Port the shared-state manager listens on / the client connects to.
    #[arg(long, default_value_t = 6789)]
    pub manager_port: u16,

    /// Pre-shared key authenticating this client to the manager.
    #[arg(long, default_value = "GPIG")]
    pub manager_authkey: String,
}

impl ManagerArgs {
    pub fn authkey_bytes(&self) -> Vec<u8> {
        self.manager_authkey.clone().into_bytes()
    }
}

/// Initializes `tracing_subscriber` from `RUST_LOG` (default `info`),
/// replacing the original's YAML `logging.config.dictConfig` file with the
/// idiomatic Rust env-filter approach used by this workspace's other
/// binaries.
pub fn init_logging() {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();
}

/// Spawns a task that flips the returned flag to `false` on SIGINT/Ctrl-C,
/// per the spec's "loops check a boolean `running` flag each iteration to
/// allow graceful shutdown" — no work is cancelled mid-sleep, a tick loop
/// just declines to start another iteration once the flag drops.
pub fn shutdown_flag() -> Arc<AtomicBool> {
    let running = Arc::new(AtomicBool::new(true));
    let flag = running.clone();
    tokio::spawn(async move {
        let _ = tokio::signal::ctrl_c().await;
        flag.store(false, Ordering::SeqCst);
    });
    running
}
