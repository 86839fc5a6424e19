#![forbid(unsafe_code)]
//! platelog-rank library.
//!
//! Best-of rankings for weeks, months, and years, merged with saved manual
//! orders, plus categorical distributions for proportion charts.
//!
//! # Conventions
//!
//! - **Errors**: typed `thiserror` errors carrying an
//!   [`ErrorCode`](platelog_core::error::ErrorCode).
//! - **Logging**: Use `tracing` macros (`info!`, `warn!`, `error!`, `debug!`, `trace!`).
//! - **Purity**: [`RankingEngine`] and [`ProportionAggregator`] only read the
//!   snapshots they are given. Store access goes through [`RankingService`].

pub mod order;
pub mod policy;
pub mod proportion;
pub mod ranking;
pub mod service;

pub use order::{PersistenceError, ReorderError, merge_order, move_entry, persist_order};
pub use policy::{PresentationPolicy, RatingFilter};
pub use proportion::{Distribution, LabelCount, ProportionAggregator, Segment, UNSPECIFIED};
pub use ranking::{RankingConfig, RankingEngine};
pub use service::{RankingError, RankingService};
