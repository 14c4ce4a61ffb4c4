//! Configuration for the Tessera analyzer.
//!
//! [`AnalyzerConfig`] controls the fixed-point iteration ceiling, rule
//! tracing, and which pushdown rewrites are enabled.

use serde::{Deserialize, Serialize};

use common_error::{ensure, TesseraResult};

/// Default ceiling on passes for a fixed-point batch.
pub const DEFAULT_MAX_ITERATIONS: usize = 1000;

/// Analyzer configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct AnalyzerConfig {
    /// Maximum passes for batches that iterate to a fixed point.
    pub max_iterations: usize,
    /// Record before/after plans for every rule that changes the tree.
    pub enable_trace: bool,
    /// Pushdown switches.
    pub pushdown: PushdownConfig,
}

impl Default for AnalyzerConfig {
    fn default() -> Self {
        Self {
            max_iterations: DEFAULT_MAX_ITERATIONS,
            enable_trace: false,
            pushdown: PushdownConfig::default(),
        }
    }
}

impl AnalyzerConfig {
    /// Set the iteration ceiling for fixed-point batches.
    pub fn with_max_iterations(mut self, max: usize) -> Self {
        self.max_iterations = max;
        self
    }

    /// Enable or disable tracing.
    pub fn with_trace(mut self, enable: bool) -> Self {
        self.enable_trace = enable;
        self
    }

    /// Replace the pushdown switches.
    pub fn with_pushdown(mut self, pushdown: PushdownConfig) -> Self {
        self.pushdown = pushdown;
        self
    }

    /// Parse and validate a configuration from JSON.
    ///
    /// Missing fields take their default values.
    pub fn from_json(json: &str) -> TesseraResult<Self> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    /// Check that the configuration can drive an analyzer.
    pub fn validate(&self) -> TesseraResult<()> {
        ensure!(
            self.max_iterations > 0,
            InvalidParameter: "max_iterations must be at least 1"
        );
        Ok(())
    }
}

/// Which pushdown rewrites the analyzer performs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PushdownConfig {
    /// Narrow pushdown-capable tables to the columns the query reads.
    pub projections: bool,
    /// Move single-table predicates into pushdown-capable tables.
    pub filters: bool,
}

impl Default for PushdownConfig {
    fn default() -> Self {
        Self {
            projections: true,
            filters: true,
        }
    }
}

impl PushdownConfig {
    /// Disable every pushdown rewrite.
    pub const fn disabled() -> Self {
        Self {
            projections: false,
            filters: false,
        }
    }
}
