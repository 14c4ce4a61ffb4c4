//! Narrow tables to the columns a query reads.

use std::collections::HashMap;
use std::sync::Arc;

use common_error::{internal_err, TesseraResult};
use log::debug;
use tessera_core::ColumnIndex;
use tessera_logical::{Expr, GetField, Plan, Scope, Transformed};

use super::{collect_leaves, decorated, pushdown_allowed, replace_leaves};
use crate::{Analyzer, AnalyzerRule, Context};

/// Narrow every projectable table to the columns referenced anywhere in
/// the plan, then re-derive every field position against the narrowed
/// schemas.
///
/// Only runs when the plan's output is defined by a `Project` or `GroupBy`
/// (possibly under `Limit`, `Filter` or `Decorated`): without one, the
/// table's full row is the output. Tables that already carry a projection
/// or whose columns are all unreferenced are left alone.
pub struct PushdownProjections;

impl AnalyzerRule for PushdownProjections {
    fn name(&self) -> &str {
        "pushdown_projections"
    }

    fn description(&self) -> &str {
        "Narrow projectable tables to the columns the query reads"
    }

    fn apply(
        &self,
        analyzer: &Analyzer,
        _ctx: &Context,
        plan: Arc<Plan>,
        scope: &Scope,
    ) -> TesseraResult<Transformed<Arc<Plan>>> {
        if !analyzer.config().pushdown.projections
            || !pushdown_allowed(&plan, scope)
            || !defines_output(&plan)
            || has_ambiguous_fields(&plan)
        {
            return Ok(Transformed::no(plan));
        }

        let mut required = Vec::new();
        collect_fields(&plan, &mut required);

        let leaves = collect_leaves(&plan, &|_| true);
        let mut replacements = Vec::new();
        for leaf in &leaves {
            let Some(projectable) = leaf.table.table().as_projectable() else {
                continue;
            };
            if projectable.projection().is_some() {
                continue;
            }

            let columns: Vec<String> = leaf
                .table
                .schema()
                .iter()
                .filter(|c| {
                    required.iter().any(|f| {
                        f.name.eq_ignore_ascii_case(&c.name) && leaf.answers_to(&f.table)
                    })
                })
                .map(|c| c.name.clone())
                .collect();
            if columns.is_empty() {
                continue;
            }

            debug!("Projecting table '{}' to {:?}", leaf.table.name(), columns);
            let description = format!("Projected table access on [{}]", columns.join(" "));
            replacements.push((leaf.node, decorated(description, projectable.with_projection(columns))));
        }

        if replacements.is_empty() {
            return Ok(Transformed::no(Arc::clone(&plan)));
        }

        let narrowed = replace_leaves(Arc::clone(&plan), &replacements)?;
        narrowed.and_then(reindex)
    }
}

fn defines_output(plan: &Plan) -> bool {
    match plan {
        Plan::Project { .. } | Plan::GroupBy { .. } => true,
        Plan::Limit { input, .. } | Plan::Filter { input, .. } | Plan::Decorated { input, .. } => {
            defines_output(input)
        }
        _ => false,
    }
}

/// Whether some field cannot be re-derived by name because its node's
/// input holds its `(table, name)` pair more than once.
fn has_ambiguous_fields(plan: &Plan) -> bool {
    plan.exists(&|node| {
        let expressions = node.expressions();
        if expressions.is_empty() {
            return false;
        }

        let mut counts: HashMap<(String, String), usize> = HashMap::new();
        for c in node.input_schema().iter() {
            *counts
                .entry((c.source.to_ascii_lowercase(), c.name.to_ascii_lowercase()))
                .or_default() += 1;
        }
        expressions.iter().flat_map(|e| e.fields()).any(|f| {
            let key = (f.table.to_ascii_lowercase(), f.name.to_ascii_lowercase());
            counts.get(&key).is_some_and(|n| *n > 1)
        })
    })
}

fn collect_fields<'a>(plan: &'a Plan, out: &mut Vec<&'a GetField>) {
    for expr in plan.expressions() {
        out.extend(expr.fields());
    }
    for child in plan.children() {
        collect_fields(child, out);
    }
}

/// Point every field at the position its column now has in its node's
/// input row.
fn reindex(plan: Arc<Plan>) -> TesseraResult<Transformed<Arc<Plan>>> {
    plan.transform_up(&mut |node| {
        if node.expressions().is_empty() {
            return Ok(Transformed::no(node));
        }

        let index = ColumnIndex::new(&node.input_schema());
        node.transform_expressions_up(&mut |expr| match expr {
            Expr::GetField(field) => {
                let Some(position) = index.get(&field.table, &field.name) else {
                    internal_err!("field {field} vanished after pushdown");
                };
                Ok(Transformed::new(
                    Expr::GetField(field.with_index(position)),
                    position != field.index,
                ))
            }
            other => Ok(Transformed::no(other)),
        })
    })
}

#[cfg(test)]
mod tests {
    use tessera_logical::PlanBuilder;
    use tessera_logical::expr::lit;

    use super::*;
    use crate::testing::{catalog, ctx, mytable, mytable2, resolved};

    fn field(plan: &Plan, index: usize) -> Expr {
        Expr::field(index, &plan.schema().columns()[index])
    }

    fn apply(plan: Arc<Plan>) -> Transformed<Arc<Plan>> {
        PushdownProjections
            .apply(&Analyzer::new(catalog()), &ctx(), plan, &Scope::new())
            .unwrap()
    }

    #[test]
    fn test_narrows_and_reindexes() {
        let joined = PlanBuilder::from(resolved(mytable()))
            .cross_join(resolved(mytable2()))
            .build();
        let plan = PlanBuilder::from(Arc::clone(&joined))
            .filter(field(&joined, 2).eq(lit("x")))
            .project(vec![field(&joined, 4)])
            .build();

        let result = apply(plan);
        assert!(result.changed);

        let Plan::Project { projections, input } = result.data.as_ref() else {
            panic!("expected project");
        };
        assert_eq!(projections[0].as_field().unwrap().index, 1);
        assert_eq!(
            input.schema().column_names(),
            vec!["t", "f2"],
            "{}",
            result.data
        );

        let Plan::Filter { predicate, input } = input.as_ref() else {
            panic!("expected filter");
        };
        assert_eq!(predicate.fields()[0].index, 0);
        let Plan::CrossJoin { left, .. } = input.as_ref() else {
            panic!("expected cross join");
        };
        let Plan::Decorated { description, .. } = left.as_ref() else {
            panic!("expected decorated table");
        };
        assert_eq!(description, "Projected table access on [t]");
    }

    #[test]
    fn test_bare_table_keeps_all_columns() {
        let plan = PlanBuilder::from(resolved(mytable())).limit(1).build();

        let result = apply(Arc::clone(&plan));
        assert!(!result.changed);
        assert!(Arc::ptr_eq(&plan, &result.data));
    }

    #[test]
    fn test_alias_names_count() {
        let aliased = PlanBuilder::from(resolved(mytable())).alias("a").build();
        let plan = PlanBuilder::from(Arc::clone(&aliased))
            .project(vec![field(&aliased, 1)])
            .build();

        let result = apply(plan);
        let Plan::Project { input, .. } = result.data.as_ref() else {
            panic!("expected project");
        };
        let Plan::TableAlias { input, .. } = input.as_ref() else {
            panic!("expected alias outside the decoration");
        };
        assert!(matches!(input.as_ref(), Plan::Decorated { description, .. }
            if description == "Projected table access on [f]"));
    }

    #[test]
    fn test_self_join_without_alias_is_skipped() {
        let joined = PlanBuilder::from(resolved(mytable()))
            .cross_join(resolved(mytable()))
            .build();
        let plan = PlanBuilder::from(Arc::clone(&joined))
            .project(vec![field(&joined, 3)])
            .build();

        let result = apply(plan);
        assert!(!result.changed);
    }

    #[test]
    fn test_repeated_output_column_under_limit() {
        let table = resolved(mytable());
        let plan = PlanBuilder::from(Arc::clone(&table))
            .project(vec![field(&table, 2), field(&table, 2)])
            .limit(0)
            .build();

        let result = apply(plan);
        assert!(result.changed);

        let Plan::Limit { input, .. } = result.data.as_ref() else {
            panic!("expected limit");
        };
        let Plan::Project { projections, input } = input.as_ref() else {
            panic!("expected project");
        };
        assert!(projections.iter().all(|p| p.as_field().unwrap().index == 0));
        assert!(matches!(input.as_ref(), Plan::Decorated { description, .. }
            if description == "Projected table access on [t]"));
    }

    #[test]
    fn test_ambiguous_field_is_skipped() {
        let joined = PlanBuilder::from(resolved(mytable()))
            .cross_join(resolved(mytable2()))
            .build();
        let repeated = PlanBuilder::from(Arc::clone(&joined))
            .project(vec![field(&joined, 0), field(&joined, 0)])
            .build();
        let plan = PlanBuilder::from(Arc::clone(&repeated))
            .project(vec![field(&repeated, 1)])
            .build();

        let result = apply(plan);
        assert!(!result.changed);
    }
}
