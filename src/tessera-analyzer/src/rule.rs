//! Analyzer rule trait and batches.

use std::fmt;
use std::sync::Arc;

use common_error::{GenericError, TesseraError, TesseraResult};
use tessera_logical::{Plan, Scope, Transformed};

use crate::{Analyzer, Context};

/// A named rewrite of a whole plan tree.
///
/// A rule must return its input unchanged when it has nothing to improve:
/// batches iterate until no rule reports a change, so a rule that keeps
/// rewriting an already-rewritten tree only stops at the batch ceiling.
pub trait AnalyzerRule: Send + Sync {
    /// Get the name of this rule.
    fn name(&self) -> &str;

    /// Get a description of what this rule does.
    fn description(&self) -> &str {
        "No description available"
    }

    /// Apply this rule to the plan.
    fn apply(
        &self,
        analyzer: &Analyzer,
        ctx: &Context,
        plan: Arc<Plan>,
        scope: &Scope,
    ) -> TesseraResult<Transformed<Arc<Plan>>>;
}

/// Signature of closures usable as rules through [`FnRule`].
pub type RuleFn = dyn Fn(&Analyzer, &Context, Arc<Plan>, &Scope) -> Result<Arc<Plan>, GenericError>
    + Send
    + Sync;

/// A rule backed by a closure, for callers extending the analyzer.
///
/// Errors the closure returns are wrapped in `RuleFailed` unless they
/// already are a `TesseraError`.
pub struct FnRule {
    name: String,
    f: Box<RuleFn>,
}

impl FnRule {
    /// Wrap `f` as a rule called `name`.
    pub fn new<F>(name: impl Into<String>, f: F) -> Self
    where
        F: Fn(&Analyzer, &Context, Arc<Plan>, &Scope) -> Result<Arc<Plan>, GenericError>
            + Send
            + Sync
            + 'static,
    {
        Self {
            name: name.into(),
            f: Box::new(f),
        }
    }
}

impl fmt::Debug for FnRule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FnRule").field("name", &self.name).finish()
    }
}

impl AnalyzerRule for FnRule {
    fn name(&self) -> &str {
        &self.name
    }

    fn description(&self) -> &str {
        "User-supplied rule"
    }

    fn apply(
        &self,
        analyzer: &Analyzer,
        ctx: &Context,
        plan: Arc<Plan>,
        scope: &Scope,
    ) -> TesseraResult<Transformed<Arc<Plan>>> {
        let before = Arc::clone(&plan);
        let after = (self.f)(analyzer, ctx, plan, scope)
            .map_err(|e| TesseraError::rule_failed(&self.name, e))?;
        let changed = !Arc::ptr_eq(&before, &after) && before != after;
        Ok(Transformed::new(after, changed))
    }
}

/// The phase a batch runs in. Phases run in declaration order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Phase {
    /// Resolution, pushdown, and post-analyze rules.
    Analysis,
    /// Custom rules that run before validation.
    PreValidation,
    /// Checks that the analyzed plan is complete and valid.
    Validation,
    /// Custom rules that run after validation.
    PostValidation,
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Analysis => "analysis",
            Self::PreValidation => "pre-validation",
            Self::Validation => "validation",
            Self::PostValidation => "post-validation",
        };
        f.write_str(name)
    }
}

/// An ordered group of rules applied together until a fixed point or
/// `iterations` passes, whichever comes first.
pub struct Batch {
    /// Batch name, used in logs and traces.
    pub description: String,
    /// Phase the batch belongs to.
    pub phase: Phase,
    /// Maximum number of passes.
    pub iterations: usize,
    /// Rules, applied in order on every pass.
    pub rules: Vec<Box<dyn AnalyzerRule>>,
}

impl Batch {
    /// Create a batch.
    pub fn new(
        description: impl Into<String>,
        phase: Phase,
        iterations: usize,
        rules: Vec<Box<dyn AnalyzerRule>>,
    ) -> Self {
        Self {
            description: description.into(),
            phase,
            iterations,
            rules,
        }
    }

    /// Names of the rules in this batch, in order.
    pub fn rule_names(&self) -> Vec<&str> {
        self.rules.iter().map(|r| r.name()).collect()
    }
}

impl fmt::Debug for Batch {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Batch")
            .field("description", &self.description)
            .field("phase", &self.phase)
            .field("iterations", &self.iterations)
            .field("rules", &self.rule_names())
            .finish()
    }
}
