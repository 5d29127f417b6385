//! Alert list with acknowledgement state
//!
//! Newest alerts come first. Acknowledgement is monotonic: once an alert id
//! has been acknowledged it stays acknowledged, even when the sample source
//! later resends the same alert unacknowledged.

use std::collections::HashSet;

use serde::{Deserialize, Serialize};

use crate::models::Alert;

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AlertStore {
    alerts: Vec<Alert>,
}

impl AlertStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace the full list, keeping local acknowledgements
    ///
    /// Returns the alerts whose ids were not in the previous list.
    pub fn set_all(&mut self, alerts: Vec<Alert>) -> Vec<Alert> {
        let known: HashSet<&str> = self.alerts.iter().map(|a| a.id.as_str()).collect();
        let acknowledged: HashSet<&str> = self
            .alerts
            .iter()
            .filter(|a| a.acknowledged)
            .map(|a| a.id.as_str())
            .collect();

        let mut fresh = Vec::new();
        let merged: Vec<Alert> = alerts
            .into_iter()
            .map(|mut alert| {
                if acknowledged.contains(alert.id.as_str()) {
                    alert.acknowledged = true;
                }
                if !known.contains(alert.id.as_str()) {
                    fresh.push(alert.clone());
                }
                alert
            })
            .collect();

        self.alerts = merged;
        fresh
    }

    /// Prepend a single alert
    pub fn add(&mut self, alert: Alert) {
        self.alerts.insert(0, alert);
    }

    /// Mark an alert as acknowledged
    ///
    /// Returns false when no alert has this id; the list is left untouched.
    pub fn acknowledge(&mut self, id: &str) -> bool {
        match self.alerts.iter_mut().find(|a| a.id == id) {
            Some(alert) => {
                alert.acknowledged = true;
                true
            }
            None => false,
        }
    }

    pub fn alerts(&self) -> &[Alert] {
        &self.alerts
    }

    pub fn unacknowledged(&self) -> impl Iterator<Item = &Alert> {
        self.alerts.iter().filter(|a| !a.acknowledged)
    }

    pub fn len(&self) -> usize {
        self.alerts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.alerts.is_empty()
    }

    pub fn into_vec(self) -> Vec<Alert> {
        self.alerts
    }
}

impl From<Vec<Alert>> for AlertStore {
    fn from(alerts: Vec<Alert>) -> Self {
        Self { alerts }
    }
}
