//! Configuration for the scheduling engine.

use serde::{Deserialize, Serialize};

use crate::models::Objective;

/// Default cap on branch-and-bound nodes per run.
pub const DEFAULT_MAX_SEARCH_NODES: u64 = 1_000_000;

/// Per-run engine settings. Passed explicitly into every run; nothing is
/// shared between runs.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct EngineConfig {
    /// Objective to maximize (hybrid carries its blend coefficient)
    pub objective: Objective,
    /// Verbosity level: 0=silent, 1=changes, 2=checks, 3=debug
    pub verbosity: u8,
    /// Node budget for the exact search; 0 returns the DP incumbent as is
    pub max_search_nodes: u64,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            objective: Objective::Attendance,
            verbosity: 0,
            max_search_nodes: DEFAULT_MAX_SEARCH_NODES,
        }
    }
}

impl EngineConfig {
    pub fn new(objective: Objective) -> Self {
        Self {
            objective,
            ..Self::default()
        }
    }

    pub fn with_verbosity(mut self, verbosity: u8) -> Self {
        self.verbosity = verbosity;
        self
    }

    pub fn with_max_search_nodes(mut self, max_search_nodes: u64) -> Self {
        self.max_search_nodes = max_search_nodes;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = EngineConfig::default();
        assert_eq!(config.objective, Objective::Attendance);
        assert_eq!(config.verbosity, 0);
        assert_eq!(config.max_search_nodes, DEFAULT_MAX_SEARCH_NODES);
    }

    #[test]
    fn test_builder() {
        let config = EngineConfig::new(Objective::Hybrid { alpha: 0.3 })
            .with_verbosity(2)
            .with_max_search_nodes(0);
        assert_eq!(config.objective, Objective::Hybrid { alpha: 0.3 });
        assert_eq!(config.verbosity, 2);
        assert_eq!(config.max_search_nodes, 0);
    }
}
