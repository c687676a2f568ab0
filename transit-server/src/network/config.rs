//! Configuration for building the network graph.

use chrono::Duration;

/// Defaults applied to ride edges that carry no authored figures.
#[derive(Debug, Clone)]
pub struct NetworkConfig {
    /// Distance assumed between adjacent stations (km).
    pub default_distance_km: f64,

    /// Travel time assumed between adjacent stations (minutes).
    pub default_duration_mins: i64,
}

impl NetworkConfig {
    /// Create a new configuration with the given defaults.
    pub fn new(default_distance_km: f64, default_duration_mins: i64) -> Self {
        Self {
            default_distance_km,
            default_duration_mins,
        }
    }

    /// Returns the default hop duration as a Duration.
    pub fn default_duration(&self) -> Duration {
        Duration::minutes(self.default_duration_mins)
    }
}

impl Default for NetworkConfig {
    fn default() -> Self {
        Self {
            default_distance_km: 1.0,
            default_duration_mins: 10,
        }
    }
}
