//! Checks run once analysis has finished rewriting.

use std::sync::Arc;

use common_error::{TesseraError, TesseraResult};
use tessera_logical::{Expr, Plan, Scope, Transformed};

use crate::{Analyzer, AnalyzerRule, Context};

/// Fail unless every node and expression in the plan is resolved.
pub struct ValidateResolved;

impl AnalyzerRule for ValidateResolved {
    fn name(&self) -> &str {
        "validate_resolved"
    }

    fn description(&self) -> &str {
        "Reject plans with unresolved nodes"
    }

    fn apply(
        &self,
        _analyzer: &Analyzer,
        _ctx: &Context,
        plan: Arc<Plan>,
        _scope: &Scope,
    ) -> TesseraResult<Transformed<Arc<Plan>>> {
        if let Some(node) = first_unresolved(&plan) {
            return Err(TesseraError::not_resolved(format!(
                "{} is not resolved",
                describe(node)
            )));
        }
        Ok(Transformed::no(plan))
    }
}

/// The deepest node that is unresolved itself, rather than only through a
/// child.
fn first_unresolved(plan: &Plan) -> Option<&Plan> {
    if plan.resolved() {
        return None;
    }
    plan.children()
        .into_iter()
        .find_map(|child| first_unresolved(child))
        .or(Some(plan))
}

fn describe(node: &Plan) -> String {
    match node {
        Plan::UnresolvedTable { name, .. } => format!("table {name}"),
        _ => {
            let unresolved: Vec<String> = node
                .expressions()
                .into_iter()
                .filter(|e| !e.resolved())
                .map(ToString::to_string)
                .collect();
            if unresolved.is_empty() {
                node.name().to_string()
            } else {
                format!("{} expression {}", node.name(), unresolved.join(", "))
            }
        }
    }
}

/// Fail when a `GroupBy` outputs a column that is neither aggregated nor
/// one of its grouping expressions.
pub struct ValidateGroupBy;

impl AnalyzerRule for ValidateGroupBy {
    fn name(&self) -> &str {
        "validate_group_by"
    }

    fn description(&self) -> &str {
        "Reject non-aggregated outputs missing from GROUP BY"
    }

    fn apply(
        &self,
        _analyzer: &Analyzer,
        _ctx: &Context,
        plan: Arc<Plan>,
        _scope: &Scope,
    ) -> TesseraResult<Transformed<Arc<Plan>>> {
        let mut offending = None;
        find_ungrouped(&plan, &mut offending);
        if let Some(expr) = offending {
            return Err(TesseraError::validation(format!(
                "expression '{expr}' must appear in GROUP BY or be aggregated"
            )));
        }
        Ok(Transformed::no(plan))
    }
}

fn find_ungrouped(plan: &Plan, out: &mut Option<String>) {
    if out.is_some() {
        return;
    }
    if let Plan::GroupBy {
        aggregates,
        grouping,
        ..
    } = plan
    {
        if let Some(expr) = aggregates.iter().find(|e| !is_grouped(e, grouping)) {
            *out = Some(expr.to_string());
            return;
        }
    }
    for child in plan.children() {
        find_ungrouped(child, out);
    }
}

fn unalias(expr: &Expr) -> &Expr {
    match expr {
        Expr::Alias { expr, .. } => unalias(expr),
        other => other,
    }
}

fn is_grouped(expr: &Expr, grouping: &[Expr]) -> bool {
    let expr = unalias(expr);
    expr.contains_aggregate()
        || matches!(expr, Expr::Literal(_))
        || grouping.iter().any(|g| unalias(g) == expr)
}

#[cfg(test)]
mod tests {
    use tessera_logical::expr::col;
    use tessera_logical::{AggExpr, AggFunc, PlanBuilder};

    use super::*;
    use crate::testing::{analyzer, ctx, mytable, resolved};

    fn field(plan: &Plan, index: usize) -> Expr {
        Expr::field(index, &plan.schema().columns()[index])
    }

    #[test]
    fn test_resolved_plan_passes() {
        let plan = PlanBuilder::from(resolved(mytable())).limit(1).build();

        let result = ValidateResolved
            .apply(&analyzer(), &ctx(), Arc::clone(&plan), &Scope::new())
            .unwrap();
        assert!(!result.changed);
        assert!(Arc::ptr_eq(&plan, &result.data));
    }

    #[test]
    fn test_unresolved_plan_fails() {
        let plan = PlanBuilder::from(resolved(mytable()))
            .project(vec![col("x")])
            .limit(1)
            .build();

        let err = ValidateResolved
            .apply(&analyzer(), &ctx(), plan, &Scope::new())
            .unwrap_err();
        assert!(matches!(err, TesseraError::PlanNotResolved(ref msg) if msg == "Project expression x is not resolved"));
    }

    #[test]
    fn test_group_by_outputs() {
        let table = resolved(mytable());
        let sum = Expr::Aggregate(AggExpr::new(AggFunc::Sum, field(&table, 1)));

        let valid = PlanBuilder::from(Arc::clone(&table))
            .group_by(
                vec![field(&table, 0).alias("k"), sum.clone()],
                vec![field(&table, 0)],
            )
            .build();
        assert!(ValidateGroupBy
            .apply(&analyzer(), &ctx(), valid, &Scope::new())
            .is_ok());

        let invalid = PlanBuilder::from(Arc::clone(&table))
            .group_by(vec![field(&table, 2), sum], vec![field(&table, 0)])
            .build();
        let err = ValidateGroupBy
            .apply(&analyzer(), &ctx(), invalid, &Scope::new())
            .unwrap_err();
        assert!(matches!(err, TesseraError::ValidationError(ref msg) if msg.contains("mytable.t")));
    }
}
