//! HTTP API module for health, surebet, status and metrics endpoints.

pub mod handlers;
pub mod routes;

pub use handlers::{AppState, ScanStats, SurebetQuery};
pub use routes::create_router;
