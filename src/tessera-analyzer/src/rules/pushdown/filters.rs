//! Move single-table predicates into tables that can evaluate them.

use std::sync::Arc;

use common_error::{TesseraError, TesseraResult};
use log::{debug, trace};
use tessera_core::Schema;
use tessera_logical::{Expr, Plan, Scope, Transformed};

use super::{collect_leaves, decorated, pushdown_allowed, replace_leaves, Leaf};
use crate::{Analyzer, AnalyzerRule, Context};

/// Push the conjuncts of each `Filter` that reference a single table into
/// that table.
///
/// A conjunct is pushed when exactly one table below the filter, reachable
/// through joins, aliases, filters and decorations, is known by the name
/// its fields carry; the table accepts filters, has not been narrowed by a
/// projection, and agrees to handle the predicate. The table is wrapped in
/// a `Decorated` node listing what was pushed. Conjuncts that cannot be
/// pushed stay in the filter, which disappears once empty.
pub struct PushdownFilters;

impl AnalyzerRule for PushdownFilters {
    fn name(&self) -> &str {
        "pushdown_filters"
    }

    fn description(&self) -> &str {
        "Push single-table predicates into filterable tables"
    }

    fn apply(
        &self,
        analyzer: &Analyzer,
        _ctx: &Context,
        plan: Arc<Plan>,
        scope: &Scope,
    ) -> TesseraResult<Transformed<Arc<Plan>>> {
        if !analyzer.config().pushdown.filters || !pushdown_allowed(&plan, scope) {
            return Ok(Transformed::no(plan));
        }

        plan.transform_up(&mut |node| {
            let Plan::Filter { predicate, input } = node.as_ref() else {
                return Ok(Transformed::no(node));
            };

            match push_filter(predicate, input)? {
                Some(rewritten) => Ok(Transformed::yes(rewritten)),
                None => Ok(Transformed::no(node)),
            }
        })
    }
}

fn descends(plan: &Plan) -> bool {
    matches!(
        plan,
        Plan::InnerJoin { .. } | Plan::CrossJoin { .. } | Plan::Filter { .. } | Plan::Decorated { .. }
    )
}

fn push_filter(predicate: &Expr, input: &Arc<Plan>) -> TesseraResult<Option<Arc<Plan>>> {
    let leaves = collect_leaves(input, &descends);
    let input_schema = input.schema();

    let mut pushed: Vec<Vec<Expr>> = vec![Vec::new(); leaves.len()];
    let mut kept = Vec::new();
    for conjunct in predicate.split_conjunction() {
        match target(conjunct, &leaves, &input_schema)? {
            Some((leaf, filter)) => pushed[leaf].push(filter),
            None => {
                trace!("Keeping predicate {conjunct} above its input");
                kept.push(conjunct.clone());
            }
        }
    }

    let mut replacements = Vec::new();
    for (leaf, filters) in leaves.iter().zip(pushed) {
        let Some(filterable) = leaf.table.table().as_filterable() else {
            continue;
        };
        if filters.is_empty() {
            continue;
        }

        let description = format!(
            "Filtered table access on [{}]",
            filters
                .iter()
                .map(ToString::to_string)
                .collect::<Vec<_>>()
                .join(", ")
        );
        debug!("Pushing {} filter(s) into table '{}'", filters.len(), leaf.table.name());
        replacements.push((leaf.node, decorated(description, filterable.with_filters(filters))));
    }

    if replacements.is_empty() {
        return Ok(None);
    }

    let input = replace_leaves(Arc::clone(input), &replacements)?.data;
    let rewritten = match Expr::conjunction(kept) {
        Some(predicate) => Arc::new(Plan::Filter { predicate, input }),
        None => input,
    };
    Ok(Some(rewritten))
}

/// The leaf `conjunct` can be pushed into, with the conjunct re-expressed
/// against that table's own columns.
fn target(
    conjunct: &Expr,
    leaves: &[Leaf<'_>],
    input_schema: &Schema,
) -> TesseraResult<Option<(usize, Expr)>> {
    let fields = conjunct.fields();
    let Some(first) = fields.first() else {
        return Ok(None);
    };
    let source = first.table.as_str();
    if !fields.iter().all(|f| f.table.eq_ignore_ascii_case(source)) {
        return Ok(None);
    }

    let mut matching = leaves
        .iter()
        .enumerate()
        .filter(|(_, leaf)| leaf.visible_name().eq_ignore_ascii_case(source));
    let (Some((index, leaf)), None) = (matching.next(), matching.next()) else {
        return Ok(None);
    };

    // every column the filter sees under this name must come from the leaf
    let labelled = input_schema
        .iter()
        .filter(|c| c.source.eq_ignore_ascii_case(source))
        .count();
    if labelled != leaf.table.schema().len() || leaf.table.projection().is_some() {
        return Ok(None);
    }
    let Some(filterable) = leaf.table.table().as_filterable() else {
        return Ok(None);
    };

    let table_schema = leaf.table.schema();
    let rebased = conjunct.clone().transform_up(&mut |expr| match expr {
        Expr::GetField(field) => {
            let index = table_schema
                .iter()
                .position(|c| c.name.eq_ignore_ascii_case(&field.name))
                .ok_or_else(|| {
                    TesseraError::internal(format!(
                        "field {field} is not a column of table {}",
                        leaf.table.name()
                    ))
                })?;
            Ok(Transformed::new(
                Expr::GetField(field.with_index(index)),
                index != field.index,
            ))
        }
        other => Ok(Transformed::no(other)),
    })?;

    if !filterable.handles_filter(&rebased.data) {
        return Ok(None);
    }
    Ok(Some((index, rebased.data)))
}
