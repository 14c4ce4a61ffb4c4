//! Rewrite natural joins into explicit joins.

use std::sync::Arc;

use common_error::TesseraResult;
use tessera_logical::{Expr, Plan, Scope, Transformed};

use crate::{Analyzer, AnalyzerRule, Context};

/// Expand `NaturalJoin` once both sides are resolved.
///
/// Columns whose names (ignoring case) appear on both sides are the join
/// columns. The result is an `InnerJoin` on the equality of every pair,
/// under a `Project` listing the join columns once (from the left side)
/// followed by the remaining left and right columns. Sides with no common
/// column become a `CrossJoin`.
pub struct ResolveNaturalJoins;

impl AnalyzerRule for ResolveNaturalJoins {
    fn name(&self) -> &str {
        "resolve_natural_joins"
    }

    fn description(&self) -> &str {
        "Expand natural joins into inner joins on their common columns"
    }

    fn apply(
        &self,
        _analyzer: &Analyzer,
        _ctx: &Context,
        plan: Arc<Plan>,
        _scope: &Scope,
    ) -> TesseraResult<Transformed<Arc<Plan>>> {
        plan.transform_up(&mut |node| match node.as_ref() {
            Plan::NaturalJoin { left, right } if left.resolved() && right.resolved() => {
                Ok(Transformed::yes(expand(left, right)))
            }
            _ => Ok(Transformed::no(node)),
        })
    }
}

fn expand(left: &Arc<Plan>, right: &Arc<Plan>) -> Arc<Plan> {
    let left_schema = left.schema();
    let right_schema = right.schema();
    let offset = left_schema.len();

    // (left position, right position) of each join column, in left order
    let mut pairs = Vec::new();
    for (l, lcol) in left_schema.iter().enumerate() {
        if let Some(r) = right_schema
            .iter()
            .position(|rcol| rcol.name.eq_ignore_ascii_case(&lcol.name))
        {
            pairs.push((l, r));
        }
    }

    let joined = left_schema.concat(&right_schema);
    let field = |index: usize| Expr::field(index, &joined.columns()[index]);

    let condition = Expr::conjunction(
        pairs
            .iter()
            .map(|&(l, r)| field(l).eq(field(offset + r))),
    );
    let Some(condition) = condition else {
        return Arc::new(Plan::CrossJoin {
            left: Arc::clone(left),
            right: Arc::clone(right),
        });
    };

    let mut projections: Vec<Expr> = pairs.iter().map(|&(l, _)| field(l)).collect();
    projections.extend(
        (0..offset)
            .filter(|l| !pairs.iter().any(|(pl, _)| pl == l))
            .map(field),
    );
    projections.extend(
        (0..right_schema.len())
            .filter(|r| !pairs.iter().any(|(_, pr)| pr == r))
            .map(|r| field(offset + r)),
    );

    let join = Plan::InnerJoin {
        left: Arc::clone(left),
        right: Arc::clone(right),
        condition,
    };

    Arc::new(Plan::Project {
        projections,
        input: Arc::new(join),
    })
}

#[cfg(test)]
mod tests {
    use tessera_core::DataType;
    use tessera_logical::PlanBuilder;
    use tessera_catalog::MemoryTable;

    use super::*;
    use crate::testing::{analyzer, ctx, mytable, mytable2, resolved, schema};

    fn apply(plan: Arc<Plan>) -> Transformed<Arc<Plan>> {
        ResolveNaturalJoins
            .apply(&analyzer(), &ctx(), plan, &Scope::new())
            .unwrap()
    }

    #[test]
    fn test_common_columns_become_inner_join() {
        let other = MemoryTable::new(
            "other",
            schema(&[("t", DataType::Text), ("x", DataType::Int64), ("i", DataType::Int32)]),
        );
        let plan = PlanBuilder::from(resolved(mytable()))
            .natural_join(resolved(other))
            .build();

        let result = apply(plan);
        assert!(result.changed);

        let Plan::Project { projections, input } = result.data.as_ref() else {
            panic!("expected project");
        };
        let names: Vec<String> = projections.iter().map(ToString::to_string).collect();
        assert_eq!(
            names,
            vec!["mytable.i", "mytable.t", "mytable.f", "other.x"]
        );

        let Plan::InnerJoin { condition, .. } = input.as_ref() else {
            panic!("expected inner join");
        };
        let indexes: Vec<usize> = condition.fields().iter().map(|f| f.index).collect();
        assert_eq!(indexes, vec![0, 5, 2, 3]);
        assert!(result.data.resolved());
    }

    #[test]
    fn test_disjoint_sides_become_cross_join() {
        let plan = PlanBuilder::from(resolved(mytable()))
            .natural_join(resolved(mytable2()))
            .build();

        let result = apply(plan);
        assert!(matches!(result.data.as_ref(), Plan::CrossJoin { .. }));
        assert_eq!(result.data.schema().len(), 6);
    }

    #[test]
    fn test_waits_for_resolved_sides() {
        let plan = PlanBuilder::table("mytable")
            .natural_join(resolved(mytable2()))
            .build();

        let result = apply(Arc::clone(&plan));
        assert!(!result.changed);
        assert!(Arc::ptr_eq(&plan, &result.data));
    }
}
