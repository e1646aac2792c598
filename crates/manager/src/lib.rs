pub mod client;
pub mod namespace;
pub mod server;

pub use client::Client;
pub use namespace::{Namespace, SharedNamespace};
pub use server::Server;
