//! CLI command implementations

pub mod alerts;
pub mod monitoring;
pub mod session;
pub mod simulate;
