//! Analyze subquery plans in the scope of their enclosing node.

use std::sync::Arc;

use common_error::TesseraResult;
use log::debug;
use tessera_logical::{Expr, Plan, Scope, Transformed};

use crate::{Analyzer, AnalyzerRule, Context};

/// Run the full analyzer over every unresolved subquery.
///
/// The subquery is analyzed with the enclosing node's input row pushed as
/// the innermost scope level, so its correlated references resolve to
/// positions past the end of its own input.
pub struct ResolveSubqueries;

impl AnalyzerRule for ResolveSubqueries {
    fn name(&self) -> &str {
        "resolve_subqueries"
    }

    fn description(&self) -> &str {
        "Analyze subqueries against their enclosing scope"
    }

    fn apply(
        &self,
        analyzer: &Analyzer,
        ctx: &Context,
        plan: Arc<Plan>,
        scope: &Scope,
    ) -> TesseraResult<Transformed<Arc<Plan>>> {
        plan.transform_up(&mut |node| {
            let pending = node
                .expressions()
                .into_iter()
                .any(|e| e.exists(&|e| matches!(e, Expr::Subquery(p) if !p.resolved())));
            if !pending || !node.children().iter().all(|c| c.resolved()) {
                return Ok(Transformed::no(node));
            }

            let inner = scope.push(node.input_schema());
            node.transform_expressions_up(&mut |expr| match expr {
                Expr::Subquery(subquery) if !subquery.resolved() => {
                    debug!("Analyzing subquery at scope depth {}", inner.depth());
                    let analyzed = analyzer.analyze(ctx, subquery, &inner)?;
                    Ok(Transformed::yes(Expr::Subquery(analyzed)))
                }
                other => Ok(Transformed::no(other)),
            })
        })
    }
}
