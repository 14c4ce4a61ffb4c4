//! The analyzer: ordered batches of rules run to a fixed point.

use std::sync::Arc;

use common_config::AnalyzerConfig;
use common_error::TesseraResult;
use log::{debug, warn};
use tessera_catalog::Catalog;
use tessera_logical::{Plan, Scope};

use crate::report::{AnalyzedPlan, RuleTrace};
use crate::rule::{AnalyzerRule, Batch, Phase};
use crate::rules;
use crate::Context;

/// Turns a parsed plan into a resolved, validated one.
///
/// # Batches
///
/// | Batch          | Phase           | Passes         |
/// |----------------|-----------------|----------------|
/// | resolution     | analysis        | max_iterations |
/// | pushdown       | analysis        | 1              |
/// | post-analyze   | analysis        | max_iterations |
/// | pre-validation | pre-validation  | 1              |
/// | validation     | validation      | 1              |
/// | post-validation| post-validation | 1              |
///
/// The three custom batches exist only when rules were added to them
/// through [`AnalyzerBuilder`].
///
/// # Termination
///
/// A batch stops after the first pass in which no rule changed the plan,
/// or after its pass budget. A batch that exhausts its budget is logged and
/// reported in [`AnalyzedPlan::unconverged`]; analysis continues with the
/// plan as it stands.
pub struct Analyzer {
    catalog: Arc<Catalog>,
    config: AnalyzerConfig,
    batches: Vec<Batch>,
}

impl Analyzer {
    /// An analyzer with the default rules and configuration.
    pub fn new(catalog: Arc<Catalog>) -> Self {
        AnalyzerBuilder::new(catalog).assemble()
    }

    /// An analyzer with the default rules and a custom configuration.
    ///
    /// Fails with `InvalidParameter` if the configuration does not validate.
    pub fn with_config(catalog: Arc<Catalog>, config: AnalyzerConfig) -> TesseraResult<Self> {
        AnalyzerBuilder::new(catalog).with_config(config).build()
    }

    /// Start building an analyzer with extra rules.
    pub fn builder(catalog: Arc<Catalog>) -> AnalyzerBuilder {
        AnalyzerBuilder::new(catalog)
    }

    /// The catalog tables are resolved against.
    pub fn catalog(&self) -> &Catalog {
        &self.catalog
    }

    /// Analyzer configuration.
    pub fn config(&self) -> &AnalyzerConfig {
        &self.config
    }

    /// Batches, in execution order.
    pub fn batches(&self) -> &[Batch] {
        &self.batches
    }

    /// Total number of rules across all batches.
    pub fn rule_count(&self) -> usize {
        self.batches.iter().map(|b| b.rules.len()).sum()
    }

    /// Number of rules an analyzer without extra rules has.
    pub fn default_rule_count() -> usize {
        rules::default_batches(&AnalyzerConfig::default())
            .iter()
            .map(|b| b.rules.len())
            .sum()
    }

    /// Upper bound on the rule-engine passes one analysis performs,
    /// excluding nested subquery analyses.
    pub fn max_passes(&self) -> usize {
        self.batches.iter().map(|b| b.iterations.max(1)).sum()
    }

    /// Analyze `plan` against the catalog.
    ///
    /// `scope` is empty for top-level queries and carries the enclosing
    /// schemas when analyzing a subquery.
    pub fn analyze(&self, ctx: &Context, plan: Arc<Plan>, scope: &Scope) -> TesseraResult<Arc<Plan>> {
        Ok(self.analyze_with_report(ctx, plan, scope)?.plan)
    }

    /// Analyze `plan`, reporting passes, rule applications and (when
    /// tracing is enabled) every intermediate plan.
    pub fn analyze_with_report(
        &self,
        ctx: &Context,
        plan: Arc<Plan>,
        scope: &Scope,
    ) -> TesseraResult<AnalyzedPlan> {
        let mut report = AnalyzedPlan::new(plan);

        for batch in &self.batches {
            self.run_batch(batch, ctx, scope, &mut report)?;
        }

        Ok(report)
    }

    fn run_batch(
        &self,
        batch: &Batch,
        ctx: &Context,
        scope: &Scope,
        report: &mut AnalyzedPlan,
    ) -> TesseraResult<()> {
        let max_passes = batch.iterations.max(1);
        let mut pass = 0;

        loop {
            if pass >= max_passes {
                if batch.iterations > 1 {
                    warn!(
                        "Batch '{}' reached max iterations ({}) without a fixed point",
                        batch.description, max_passes
                    );
                    report.unconverged.push(batch.description.clone());
                }
                break;
            }

            pass += 1;
            report.passes += 1;
            let mut changed_this_pass = false;

            for rule in &batch.rules {
                let before = Arc::clone(&report.plan);
                let result = rule.apply(self, ctx, Arc::clone(&before), scope)?;

                if result.changed && !Arc::ptr_eq(&before, &result.data) && before != result.data
                {
                    changed_this_pass = true;
                    report.rules_applied += 1;

                    debug!(
                        "Rule '{}' applied in pass {} of batch '{}'",
                        rule.name(),
                        pass,
                        batch.description
                    );

                    if self.config.enable_trace {
                        report.trace.push(RuleTrace {
                            batch: batch.description.clone(),
                            rule_name: rule.name().to_string(),
                            pass,
                            before: before.explain(),
                            after: result.data.explain(),
                        });
                    }
                }

                report.plan = result.data;
            }

            if !changed_this_pass {
                debug!(
                    "No changes in pass {} of batch '{}', reached fixed point",
                    pass, batch.description
                );
                break;
            }
        }

        Ok(())
    }
}

impl std::fmt::Debug for Analyzer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Analyzer")
            .field("config", &self.config)
            .field("batches", &self.batches)
            .finish_non_exhaustive()
    }
}

/// Builder adding custom rules around the default batches.
pub struct AnalyzerBuilder {
    catalog: Arc<Catalog>,
    config: AnalyzerConfig,
    post_analyze: Vec<Box<dyn AnalyzerRule>>,
    pre_validation: Vec<Box<dyn AnalyzerRule>>,
    post_validation: Vec<Box<dyn AnalyzerRule>>,
}

impl AnalyzerBuilder {
    /// Start from the default rules and configuration.
    pub fn new(catalog: Arc<Catalog>) -> Self {
        Self {
            catalog,
            config: AnalyzerConfig::default(),
            post_analyze: Vec::new(),
            pre_validation: Vec::new(),
            post_validation: Vec::new(),
        }
    }

    /// Use a custom configuration.
    pub fn with_config(mut self, config: AnalyzerConfig) -> Self {
        self.config = config;
        self
    }

    /// Add a rule run to a fixed point after pushdown.
    pub fn add_post_analyze_rule<R: AnalyzerRule + 'static>(mut self, rule: R) -> Self {
        self.post_analyze.push(Box::new(rule));
        self
    }

    /// Add a rule run once before validation.
    pub fn add_pre_validation_rule<R: AnalyzerRule + 'static>(mut self, rule: R) -> Self {
        self.pre_validation.push(Box::new(rule));
        self
    }

    /// Add a rule run once after validation.
    pub fn add_post_validation_rule<R: AnalyzerRule + 'static>(mut self, rule: R) -> Self {
        self.post_validation.push(Box::new(rule));
        self
    }

    /// Validate the configuration and assemble the batches.
    pub fn build(self) -> TesseraResult<Analyzer> {
        self.config.validate()?;
        Ok(self.assemble())
    }

    fn assemble(self) -> Analyzer {
        let mut batches = Vec::new();
        let mut defaults = rules::default_batches(&self.config).into_iter().peekable();

        while let Some(batch) = defaults.next_if(|b| b.phase == Phase::Analysis) {
            batches.push(batch);
        }
        if !self.post_analyze.is_empty() {
            batches.push(Batch::new(
                "post-analyze",
                Phase::Analysis,
                self.config.max_iterations,
                self.post_analyze,
            ));
        }
        if !self.pre_validation.is_empty() {
            batches.push(Batch::new(
                "pre-validation",
                Phase::PreValidation,
                1,
                self.pre_validation,
            ));
        }
        batches.extend(defaults);
        if !self.post_validation.is_empty() {
            batches.push(Batch::new(
                "post-validation",
                Phase::PostValidation,
                1,
                self.post_validation,
            ));
        }

        Analyzer {
            catalog: self.catalog,
            config: self.config,
            batches,
        }
    }
}
