//! What an analysis did, for tracing and diagnostics.

use std::fmt::Write;
use std::sync::Arc;

use tessera_logical::Plan;

/// A trace entry for a single rule application that changed the plan.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RuleTrace {
    /// Batch the rule ran in.
    pub batch: String,
    /// The name of the rule that was applied.
    pub rule_name: String,
    /// Pass within the batch, starting at 1.
    pub pass: usize,
    /// The plan before the rule was applied (as explain string).
    pub before: String,
    /// The plan after the rule was applied (as explain string).
    pub after: String,
}

/// The result of an analysis with diagnostics.
#[derive(Debug, Clone)]
pub struct AnalyzedPlan {
    /// The final plan.
    pub plan: Arc<Plan>,
    /// Total passes across all batches.
    pub passes: usize,
    /// Number of rule applications that changed the plan.
    pub rules_applied: usize,
    /// Detailed trace of rule applications (if tracing was enabled).
    pub trace: Vec<RuleTrace>,
    /// Batches that hit their iteration ceiling without reaching a fixed point.
    pub unconverged: Vec<String>,
}

impl AnalyzedPlan {
    pub(crate) fn new(plan: Arc<Plan>) -> Self {
        Self {
            plan,
            passes: 0,
            rules_applied: 0,
            trace: Vec::new(),
            unconverged: Vec::new(),
        }
    }

    /// Whether every fixed-point batch converged.
    pub fn converged(&self) -> bool {
        self.unconverged.is_empty()
    }

    /// Format the trace as a human-readable string.
    pub fn format_trace(&self) -> String {
        let mut output = format!(
            "Analysis completed in {} passes, {} rules applied\n",
            self.passes, self.rules_applied
        );

        for batch in &self.unconverged {
            let _ = writeln!(output, "  batch '{batch}' did not reach a fixed point");
        }

        if self.trace.is_empty() {
            output.push_str("  (no trace available)\n");
        }
        for (i, entry) in self.trace.iter().enumerate() {
            let _ = write!(
                output,
                "\n--- {}: {} ({}, pass {}) ---\nBefore:\n{}After:\n{}",
                i + 1,
                entry.rule_name,
                entry.batch,
                entry.pass,
                entry.before,
                entry.after
            );
        }

        output
    }
}
