//! Bind column names to positions.

use std::sync::Arc;

use common_error::TesseraResult;
use tessera_core::{ColumnRef, Schema};
use tessera_logical::{Expr, Plan, Scope, Transformed};

use crate::{Analyzer, AnalyzerRule, Context};

/// Replace unresolved column references with `GetField`s.
///
/// A reference is looked up in the node's input row first, then in each
/// enclosing scope level, innermost first. Nodes whose children are not yet
/// resolved are left for a later pass.
pub struct ResolveColumns;

impl AnalyzerRule for ResolveColumns {
    fn name(&self) -> &str {
        "resolve_columns"
    }

    fn description(&self) -> &str {
        "Bind column references to input positions"
    }

    fn apply(
        &self,
        _analyzer: &Analyzer,
        _ctx: &Context,
        plan: Arc<Plan>,
        scope: &Scope,
    ) -> TesseraResult<Transformed<Arc<Plan>>> {
        plan.transform_up(&mut |node| {
            if node.expressions().is_empty() || !node.children().iter().all(|c| c.resolved()) {
                return Ok(Transformed::no(node));
            }

            let input = node.input_schema();
            node.transform_expressions_up(&mut |expr| resolve(expr, &input, scope))
        })
    }
}

fn resolve(expr: Expr, input: &Schema, scope: &Scope) -> TesseraResult<Transformed<Expr>> {
    let column = match &expr {
        Expr::UnresolvedColumn(name) => ColumnRef::new(name),
        Expr::UnresolvedQualifiedColumn { table, name } => ColumnRef::qualified(table, name),
        _ => return Ok(Transformed::no(expr)),
    };

    if let Some(index) = column.resolve(input)? {
        let field = input
            .column(index)
            .map(|c| Expr::field(index, c))
            .ok_or_else(|| column.not_found())?;
        return Ok(Transformed::yes(field));
    }

    match scope.resolve(&column, input.len())? {
        Some((index, c)) => Ok(Transformed::yes(Expr::field(index, c))),
        None => Err(column.not_found()),
    }
}

#[cfg(test)]
mod tests {
    use common_error::TesseraError;
    use tessera_core::{Column, DataType};
    use tessera_logical::expr::{col, lit, qcol};
    use tessera_logical::PlanBuilder;

    use super::*;
    use crate::testing::{analyzer, ctx, mytable, mytable2, resolved};

    fn apply(plan: Arc<Plan>, scope: &Scope) -> TesseraResult<Transformed<Arc<Plan>>> {
        ResolveColumns.apply(&analyzer(), &ctx(), plan, scope)
    }

    #[test]
    fn test_resolves_against_input() {
        let plan = PlanBuilder::from(resolved(mytable()))
            .cross_join(resolved(mytable2()))
            .filter(col("I2").eq(lit(1)))
            .project(vec![qcol("mytable", "t")])
            .build();

        let result = apply(plan, &Scope::new()).unwrap();
        assert!(result.data.resolved());

        let Plan::Project { projections, input } = result.data.as_ref() else {
            panic!("expected project");
        };
        assert_eq!(projections[0].as_field().unwrap().index, 2);
        let fields = input.expressions()[0].fields();
        assert_eq!(fields[0].index, 3);
        assert_eq!(fields[0].name, "i2");
    }

    #[test]
    fn test_falls_back_to_scope() {
        let outer = Schema::new(vec![
            Column::new("a", "outer", DataType::Int64),
            Column::new("b", "outer", DataType::Int64),
        ]);
        let plan = PlanBuilder::from(resolved(mytable()))
            .filter(col("b").eq(col("i")))
            .build();

        let result = apply(plan, &Scope::new().push(outer)).unwrap();
        let indexes: Vec<usize> = result.data.expressions()[0]
            .fields()
            .iter()
            .map(|f| f.index)
            .collect();
        // mytable has three columns, so outer.b sits at 3 + 1
        assert_eq!(indexes, vec![4, 0]);
    }

    #[test]
    fn test_unknown_column() {
        let plan = PlanBuilder::from(resolved(mytable()))
            .project(vec![col("o")])
            .build();

        let err = apply(plan, &Scope::new()).unwrap_err();
        assert!(matches!(err, TesseraError::ColumnNotFound { ref name, .. } if name == "o"));
    }

    #[test]
    fn test_ambiguous_column() {
        let plan = PlanBuilder::from(resolved(mytable()))
            .cross_join(resolved(mytable().renamed("other")))
            .project(vec![col("i")])
            .build();

        let err = apply(plan, &Scope::new()).unwrap_err();
        assert!(matches!(err, TesseraError::AmbiguousColumn { .. }));
    }

    #[test]
    fn test_unresolved_child_is_skipped() {
        let plan = PlanBuilder::table("mytable").project(vec![col("i")]).build();

        let result = apply(Arc::clone(&plan), &Scope::new()).unwrap();
        assert!(!result.changed);
        assert!(Arc::ptr_eq(&plan, &result.data));
    }
}
