//! Core types for sprint metrics.
//!
//! Domain model, status normalization, grouping and calendar helpers, the
//! uniform metric table, settings and the shared error type.

pub mod calendar;
pub mod error;
pub mod formatting;
pub mod grouping;
pub mod models;
pub mod normalizer;
pub mod settings;
pub mod table;

pub use error::{MetricsError, Result};
