//! Development feasibility engine: monthly cashflow grids across scenarios,
//! investment KPIs and comparable snapshots.

pub mod cashflow;
pub mod config;
pub mod error;
mod lenient;
pub mod snapshots;
pub mod telemetry;
