//! Expand `*` and `table.*`.

use std::sync::Arc;

use common_error::{TesseraError, TesseraResult};
use log::trace;
use tessera_core::Schema;
use tessera_logical::{Expr, Plan, Scope, Transformed};

use crate::{Analyzer, AnalyzerRule, Context};

/// Replace top-level stars in `Project` and `GroupBy` with one field per
/// matching input column, in schema order.
///
/// Runs only once the node's input is resolved, since an unresolved input
/// has no schema to expand against.
pub struct ResolveStars;

impl AnalyzerRule for ResolveStars {
    fn name(&self) -> &str {
        "resolve_stars"
    }

    fn description(&self) -> &str {
        "Expand wildcards into the columns they stand for"
    }

    fn apply(
        &self,
        _analyzer: &Analyzer,
        _ctx: &Context,
        plan: Arc<Plan>,
        _scope: &Scope,
    ) -> TesseraResult<Transformed<Arc<Plan>>> {
        plan.transform_up(&mut |node| {
            let rewritten = match node.as_ref() {
                Plan::Project { projections, input } if has_star(projections, input) => {
                    Plan::Project {
                        projections: expand(projections, &input.schema())?,
                        input: Arc::clone(input),
                    }
                }
                Plan::GroupBy {
                    aggregates,
                    grouping,
                    input,
                } if has_star(aggregates, input) => Plan::GroupBy {
                    aggregates: expand(aggregates, &input.schema())?,
                    grouping: grouping.clone(),
                    input: Arc::clone(input),
                },
                _ => return Ok(Transformed::no(node)),
            };
            Ok(Transformed::yes(Arc::new(rewritten)))
        })
    }
}

fn has_star(exprs: &[Expr], input: &Plan) -> bool {
    input.resolved() && exprs.iter().any(|e| matches!(e, Expr::Star(_)))
}

fn expand(exprs: &[Expr], schema: &Schema) -> TesseraResult<Vec<Expr>> {
    let mut out = Vec::with_capacity(exprs.len().max(schema.len()));
    for expr in exprs {
        match expr {
            Expr::Star(None) => {
                out.extend(
                    schema
                        .iter()
                        .enumerate()
                        .map(|(i, col)| Expr::field(i, col)),
                );
            }
            Expr::Star(Some(table)) => {
                let before = out.len();
                out.extend(
                    schema
                        .iter()
                        .enumerate()
                        .filter(|(_, col)| col.source.eq_ignore_ascii_case(table))
                        .map(|(i, col)| Expr::field(i, col)),
                );
                if out.len() == before {
                    return Err(TesseraError::table_not_found(table));
                }
            }
            other => out.push(other.clone()),
        }
    }
    trace!(
        "Expanded stars to [{}]",
        out.iter().map(ToString::to_string).collect::<Vec<_>>().join(", ")
    );
    Ok(out)
}

#[cfg(test)]
mod tests {
    use common_error::TesseraError;
    use tessera_logical::expr::{col, qstar, star};
    use tessera_logical::PlanBuilder;

    use super::*;
    use crate::testing::{analyzer, ctx, mytable, mytable2, resolved};

    fn apply(plan: Arc<Plan>) -> TesseraResult<Transformed<Arc<Plan>>> {
        ResolveStars.apply(&analyzer(), &ctx(), plan, &Scope::new())
    }

    fn projections(plan: &Plan) -> Vec<String> {
        plan.expressions().iter().map(ToString::to_string).collect()
    }

    #[test]
    fn test_star_expands_in_schema_order() {
        let plan = PlanBuilder::from(resolved(mytable()))
            .project(vec![star()])
            .build();

        let result = apply(plan).unwrap();
        assert!(result.changed);
        assert_eq!(
            projections(&result.data),
            vec!["mytable.i", "mytable.f", "mytable.t"]
        );
        assert!(result.data.resolved());
    }

    #[test]
    fn test_qualified_star_and_siblings() {
        let plan = PlanBuilder::from(resolved(mytable()))
            .cross_join(resolved(mytable2()))
            .project(vec![col("i"), qstar("mytable2")])
            .build();

        let result = apply(plan).unwrap();
        assert_eq!(
            projections(&result.data),
            vec!["i", "mytable2.i2", "mytable2.f2", "mytable2.t2"]
        );
        let fields: Vec<usize> = result.data.expressions()[1..]
            .iter()
            .filter_map(|e| e.as_field())
            .map(|f| f.index)
            .collect();
        assert_eq!(fields, vec![3, 4, 5]);
    }

    #[test]
    fn test_unknown_qualifier() {
        let plan = PlanBuilder::from(resolved(mytable()))
            .project(vec![qstar("nope")])
            .build();

        let err = apply(plan).unwrap_err();
        assert!(matches!(err, TesseraError::TableNotFound(ref t) if t == "nope"));
    }

    #[test]
    fn test_waits_for_resolved_input() {
        let plan = PlanBuilder::table("mytable").project(vec![star()]).build();

        let result = apply(Arc::clone(&plan)).unwrap();
        assert!(!result.changed);
    }
}
