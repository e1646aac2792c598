//! The API Gateway: a read-through HTTP view of the shared namespace plus
//! the disable/enable/add-fault command endpoints. Grounded on the
//! teacher's `hub/src/web.rs`/`hub/src/db.rs` shape.

pub mod db;
pub mod routes;

pub use db::Db;
pub use routes::{router, AppState};
