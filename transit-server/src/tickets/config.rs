//! Ticket lifecycle configuration.

use chrono::Duration;
use serde::{Deserialize, Serialize};

/// When an issued ticket becomes active.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ActivationPolicy {
    /// Active from the first validation scan inside the validity window.
    #[default]
    OnFirstScan,
    /// Active as soon as the validity window opens, scanned or not.
    AtValidFrom,
}

/// Configuration for issuing and validating tickets.
#[derive(Debug, Clone)]
pub struct TicketConfig {
    /// How long a ticket stays valid after issuance (minutes).
    pub validity_mins: i64,

    pub activation: ActivationPolicy,
}

impl TicketConfig {
    /// Create a new configuration with the given parameters.
    pub fn new(validity_mins: i64, activation: ActivationPolicy) -> Self {
        Self {
            validity_mins,
            activation,
        }
    }

    /// Returns the validity period as a Duration.
    pub fn validity(&self) -> Duration {
        Duration::minutes(self.validity_mins)
    }
}

impl Default for TicketConfig {
    fn default() -> Self {
        Self {
            validity_mins: 4 * 60,
            activation: ActivationPolicy::OnFirstScan,
        }
    }
}
