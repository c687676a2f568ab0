//! Search configuration for the journey planner.

use chrono::Duration;

/// Configuration parameters for journey search.
#[derive(Debug, Clone)]
pub struct PlannerConfig {
    /// Number of journeys returned when the caller doesn't ask for a count.
    pub max_results: usize,

    /// Upper bound on the number of journeys a caller may ask for.
    pub result_limit: usize,

    /// Penalty added each time a journey changes line or starts a walk
    /// (minutes).
    pub transfer_penalty_mins: i64,
}

impl PlannerConfig {
    /// Create a new configuration with the given parameters.
    pub fn new(max_results: usize, result_limit: usize, transfer_penalty_mins: i64) -> Self {
        Self {
            max_results,
            result_limit,
            transfer_penalty_mins,
        }
    }

    /// Returns the transfer penalty as a Duration.
    pub fn transfer_penalty(&self) -> Duration {
        Duration::minutes(self.transfer_penalty_mins)
    }

    /// The number of journeys to return for a request.
    pub fn results_for(&self, requested: Option<usize>) -> usize {
        requested
            .unwrap_or(self.max_results)
            .min(self.result_limit)
    }
}

impl Default for PlannerConfig {
    fn default() -> Self {
        Self {
            max_results: 3,
            result_limit: 10,
            transfer_penalty_mins: 5,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config() {
        let config = PlannerConfig::default();

        assert_eq!(config.max_results, 3);
        assert_eq!(config.result_limit, 10);
        assert_eq!(config.transfer_penalty_mins, 5);
        assert_eq!(config.transfer_penalty(), Duration::minutes(5));
    }

    #[test]
    fn results_for_clamps_to_limit() {
        let config = PlannerConfig::new(2, 4, 0);

        assert_eq!(config.results_for(None), 2);
        assert_eq!(config.results_for(Some(3)), 3);
        assert_eq!(config.results_for(Some(40)), 4);
    }
}
