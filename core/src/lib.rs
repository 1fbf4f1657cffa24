//! Case-assignment engine for chromosome karyotype review.
//!
//! Scans for newly scanned samples, assigns each new case a primary and
//! secondary analyst and a counter by quota-weighted rotation, and
//! persists the assignment once.

pub mod allocation;
pub mod clock;
pub mod config;
pub mod error;
pub mod quota;
pub mod reconcile;
pub mod review;
pub mod scanner;
pub mod service;
pub mod store;
pub mod types;
