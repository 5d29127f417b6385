//! Dashboard monitor server
//!
//! Hosts the monitoring core behind an HTTP API with health checks and
//! Prometheus metrics.

pub mod api;
pub mod config;
