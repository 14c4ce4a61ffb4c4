//! Drop projections that reproduce their input.

use std::sync::Arc;

use common_error::TesseraResult;
use tessera_logical::{Expr, Plan, Scope, Transformed};

use crate::{Analyzer, AnalyzerRule, Context};

/// Remove every resolved `Project` whose expressions are exactly its
/// input's columns, in order.
pub struct EraseProjection;

impl AnalyzerRule for EraseProjection {
    fn name(&self) -> &str {
        "erase_projection"
    }

    fn description(&self) -> &str {
        "Remove projections that repeat their input unchanged"
    }

    fn apply(
        &self,
        _analyzer: &Analyzer,
        _ctx: &Context,
        plan: Arc<Plan>,
        _scope: &Scope,
    ) -> TesseraResult<Transformed<Arc<Plan>>> {
        plan.transform_up(&mut |node| match node.as_ref() {
            Plan::Project { projections, input } if is_identity(projections, input) => {
                Ok(Transformed::yes(Arc::clone(input)))
            }
            _ => Ok(Transformed::no(node)),
        })
    }
}

fn is_identity(projections: &[Expr], input: &Plan) -> bool {
    let schema = input.schema();
    input.resolved()
        && projections.len() == schema.len()
        && projections.iter().zip(schema.iter()).enumerate().all(|(i, (expr, column))| {
            matches!(expr, Expr::GetField(field)
                if field.index == i && column.matches(&field.table, &field.name))
        })
}
