//! # palace-observability
//!
//! Observability-Crate fuer Palace:
//! - Health-Check-Endpunkt (`/health`)
//! - Structured Logging (Text oder JSON) via tracing-subscriber

pub mod health;
pub mod logging;

pub use health::{health_router, HealthQuelle, HealthResponse, HealthStatus};
pub use logging::logging_initialisieren;
