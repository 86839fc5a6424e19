#![forbid(unsafe_code)]
//! platelog-core library.
//!
//! # Conventions
//!
//! - **Errors**: typed `thiserror` enums at module boundaries, each mapping to
//!   an [`error::ErrorCode`]; `anyhow::Result` for config and database glue.
//! - **Logging**: Use `tracing` macros (`info!`, `warn!`, `error!`, `debug!`, `trace!`).

pub mod calendar;
pub mod config;
pub mod db;
pub mod error;
pub mod logging;
pub mod model;
pub mod period;
pub mod store;

pub use calendar::{DateRange, PeriodError};
pub use model::{DedupKey, Event, EventId, Rating};
pub use period::{Period, PeriodKey, PeriodKind};
pub use store::{EventSource, OrderStore, SavedOrders, StoreError};
