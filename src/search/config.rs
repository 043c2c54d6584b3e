//! MCTS configuration parameters.

use std::time::Duration;

/// Configuration for a Monte-Carlo Tree Search.
#[derive(Debug, Clone)]
pub struct MctsConfig {
    /// Number of search passes per call to `search`.
    pub passes: u32,

    /// Worker threads. 1 runs passes sequentially on the caller's thread.
    pub threads: usize,

    /// Exploration constant `C` in the UCT/PUCT formulas.
    pub exploration: f32,

    /// Weight of the virtual-loss penalty applied to in-flight children
    /// during parallel search. 0 disables the penalty (the counter is still
    /// kept).
    pub virtual_loss: f32,

    /// Optional wall-clock budget. The search stops after the in-flight
    /// passes complete once it is exceeded, even if fewer than `passes` ran.
    pub time_budget: Option<Duration>,
}

impl Default for MctsConfig {
    fn default() -> Self {
        Self {
            passes: 300,
            threads: 1,
            exploration: 2.0,
            virtual_loss: 1.0,
            time_budget: None,
        }
    }
}

impl MctsConfig {
    /// Create a fast config for testing.
    pub fn for_testing() -> Self {
        Self {
            passes: 40,
            ..Self::default()
        }
    }

    /// Builder pattern: set number of passes.
    pub fn with_passes(mut self, n: u32) -> Self {
        self.passes = n;
        self
    }

    /// Builder pattern: set worker thread count (at least 1).
    pub fn with_threads(mut self, n: usize) -> Self {
        self.threads = n.max(1);
        self
    }

    /// Builder pattern: set the exploration constant.
    pub fn with_exploration(mut self, c: f32) -> Self {
        self.exploration = c;
        self
    }

    /// Builder pattern: set the virtual-loss weight.
    pub fn with_virtual_loss(mut self, weight: f32) -> Self {
        self.virtual_loss = weight;
        self
    }

    /// Builder pattern: set the wall-clock budget.
    pub fn with_time_budget(mut self, budget: Duration) -> Self {
        self.time_budget = Some(budget);
        self
    }
}
