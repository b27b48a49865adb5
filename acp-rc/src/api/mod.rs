//! HTTP API handlers for acp-rc
//!
//! Phase workers and job runners report failures here; an external
//! scheduler drives the sweep endpoint; dashboards read the recovery log.

pub mod health;
pub mod hooks;
pub mod items;
pub mod log;
pub mod sweep;

pub use health::health_routes;
pub use hooks::hook_routes;
pub use items::item_routes;
pub use log::log_routes;
pub use sweep::sweep_routes;
