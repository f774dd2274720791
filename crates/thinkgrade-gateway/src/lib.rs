//! thinkgrade-gateway: the HTTP evaluation gateway.
//!
//! Admission control (origin allow-list and fixed-window rate limit), the
//! `/evaluate` endpoint backed by [`thinkgrade_core::engine::EvaluationEngine`],
//! detached result notifications and the configuration that drives them.

pub mod admission;
pub mod config;
pub mod error;
pub mod notifier;
pub mod server;
pub mod tasks;

pub use config::{load_config_from, GatewayConfig};
pub use error::GatewayError;
pub use server::{router, run, serve, AppState};
