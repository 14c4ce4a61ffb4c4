//! Pushdown of predicates and projections into tables.
//!
//! Both rewrites only run over a top-level, fully resolved plan without
//! subqueries: correlated positions inside a subquery depend on the width
//! of the enclosing rows, which narrowing a table would change.

mod filters;
mod projections;

use std::sync::Arc;

use common_error::TesseraResult;
use tessera_logical::{Plan, ResolvedTable, Scope, Transformed};

pub use filters::PushdownFilters;
pub use projections::PushdownProjections;

fn pushdown_allowed(plan: &Plan, scope: &Scope) -> bool {
    scope.is_empty() && plan.resolved() && !plan.contains_subquery()
}

/// A table leaf and the names its columns are known by on the way up.
struct Leaf<'a> {
    node: &'a Plan,
    table: &'a ResolvedTable,
    /// Aliases above the leaf, outermost first.
    aliases: Vec<&'a str>,
}

impl Leaf<'_> {
    /// The name the top of the walk sees this table's columns under.
    fn visible_name(&self) -> &str {
        self.aliases.first().copied().unwrap_or(self.table.name())
    }

    /// Whether a column labelled `source` anywhere on the path may come
    /// from this table.
    fn answers_to(&self, source: &str) -> bool {
        self.table.name().eq_ignore_ascii_case(source)
            || self.aliases.iter().any(|a| a.eq_ignore_ascii_case(source))
    }
}

/// Collect table leaves below `plan`, descending only into nodes accepted
/// by `descend`.
fn collect_leaves<'a, F>(plan: &'a Plan, descend: &F) -> Vec<Leaf<'a>>
where
    F: Fn(&Plan) -> bool,
{
    fn walk<'a, F>(plan: &'a Plan, aliases: &mut Vec<&'a str>, descend: &F, out: &mut Vec<Leaf<'a>>)
    where
        F: Fn(&Plan) -> bool,
    {
        match plan {
            Plan::ResolvedTable(table) => out.push(Leaf {
                node: plan,
                table,
                aliases: aliases.clone(),
            }),
            Plan::TableAlias { alias, input } => {
                aliases.push(alias);
                walk(input, aliases, descend, out);
                aliases.pop();
            }
            node if descend(node) => {
                for child in node.children() {
                    walk(child, aliases, descend, out);
                }
            }
            _ => {}
        }
    }

    let mut out = Vec::new();
    walk(plan, &mut Vec::new(), descend, &mut out);
    out
}

/// Swap each leaf node for its replacement.
///
/// Leaves are identified by address, so `plan` must be the tree (or a
/// subtree of the tree) they were collected from.
fn replace_leaves(
    plan: Arc<Plan>,
    replacements: &[(&Plan, Arc<Plan>)],
) -> TesseraResult<Transformed<Arc<Plan>>> {
    plan.transform_up(&mut |node| {
        let replacement = replacements
            .iter()
            .find(|(leaf, _)| std::ptr::eq(*leaf, node.as_ref()));
        match replacement {
            Some((_, replacement)) => Ok(Transformed::yes(Arc::clone(replacement))),
            None => Ok(Transformed::no(node)),
        }
    })
}

fn decorated(description: String, table: Arc<dyn tessera_logical::Table>) -> Arc<Plan> {
    Arc::new(Plan::Decorated {
        description,
        input: Arc::new(Plan::ResolvedTable(ResolvedTable::new(table))),
    })
}
