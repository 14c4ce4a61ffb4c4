//! Explain output for plans.

use common_display::{DisplayTree, TreeNode};

use super::Plan;
use crate::expr::Expr;

fn join(exprs: &[Expr]) -> String {
    exprs
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join(", ")
}

impl TreeNode for Plan {
    fn name(&self) -> String {
        Plan::name(self).to_string()
    }

    fn children(&self) -> Vec<&dyn TreeNode> {
        Plan::children(self)
            .into_iter()
            .map(|c| c.as_ref() as &dyn TreeNode)
            .collect()
    }

    fn details(&self) -> Option<String> {
        match self {
            Self::UnresolvedTable { name, database } => Some(match database {
                Some(db) => format!("{db}.{name}"),
                None => name.clone(),
            }),
            Self::ResolvedTable(table) => {
                let mut details = table.name().to_string();
                if let Some(projection) = table.projection() {
                    details.push_str(&format!(" projection=[{}]", projection.join(", ")));
                }
                if !table.filters().is_empty() {
                    details.push_str(&format!(" filters=[{}]", join(table.filters())));
                }
                Some(details)
            }
            Self::Project { projections, .. } => Some(join(projections)),
            Self::Filter { predicate, .. } => Some(predicate.to_string()),
            Self::GroupBy {
                aggregates,
                grouping,
                ..
            } => Some(format!(
                "aggregates=[{}] grouping=[{}]",
                join(aggregates),
                join(grouping)
            )),
            Self::Limit { limit, .. } => Some(limit.to_string()),
            Self::InnerJoin { condition, .. } => Some(condition.to_string()),
            Self::TableAlias { alias, .. } => Some(alias.clone()),
            Self::Decorated { description, .. } => Some(description.clone()),
            Self::CrossJoin { .. } | Self::NaturalJoin { .. } | Self::Describe { .. } => None,
        }
    }
}

impl Plan {
    /// Render the plan as an indented tree.
    pub fn explain(&self) -> String {
        DisplayTree::new(self).to_string()
    }
}

impl std::fmt::Display for Plan {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", DisplayTree::new(self))
    }
}
