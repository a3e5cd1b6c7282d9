//! Dataset ingest and metric computation for sprint metrics.
//!
//! [`reader`] turns a raw document into a typed dataset, the metric modules
//! compute tables from it, and [`analysis`] ties the two together.

pub mod analysis;
pub mod developer;
pub mod reader;
pub mod registry;
pub mod sprint;
pub mod throughput;

#[cfg(test)]
mod fixtures;

pub use metrics_core as core;
