//! Published monitoring state and alert bookkeeping

mod alerts;
mod store;

pub use alerts::AlertStore;
pub use store::{MonitorEvent, MonitoringStore, StopReason};
