//! The plan tree.
//!
//! Plans are immutable: every node owns its children through `Arc`, and a
//! rewrite produces a new tree that shares unchanged subtrees with the old
//! one.

mod builder;
mod display;
mod transform;

use std::fmt;
use std::sync::Arc;

use common_error::{TesseraError, TesseraResult};
use tessera_core::{Column, DataType, Schema};

use crate::expr::Expr;
use crate::table::Table;

pub use builder::PlanBuilder;
pub use transform::Transformed;

/// A table bound to a catalog handle.
#[derive(Clone)]
pub struct ResolvedTable {
    table: Arc<dyn Table>,
}

impl ResolvedTable {
    /// Bind a table handle.
    pub fn new(table: Arc<dyn Table>) -> Self {
        Self { table }
    }

    /// The underlying table.
    pub fn table(&self) -> &Arc<dyn Table> {
        &self.table
    }

    /// Table name.
    pub fn name(&self) -> &str {
        self.table.name()
    }

    /// Columns the table produces.
    pub fn schema(&self) -> &Schema {
        self.table.schema()
    }

    /// Projection pushed into the table, if any.
    pub fn projection(&self) -> Option<&[String]> {
        self.table.as_projectable().and_then(|p| p.projection())
    }

    /// Predicates pushed into the table.
    pub fn filters(&self) -> &[Expr] {
        self.table
            .as_filterable()
            .map(|f| f.filters())
            .unwrap_or_default()
    }
}

impl PartialEq for ResolvedTable {
    fn eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.table, &other.table)
            || (self.name() == other.name()
                && self.schema() == other.schema()
                && self.projection() == other.projection()
                && self.filters() == other.filters())
    }
}

impl fmt::Debug for ResolvedTable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ResolvedTable")
            .field("name", &self.name())
            .field("projection", &self.projection())
            .field("filters", &self.filters())
            .finish()
    }
}

/// A node in the query plan.
#[derive(Debug, Clone, PartialEq)]
pub enum Plan {
    /// A table referenced by name, not yet looked up.
    UnresolvedTable {
        /// Table name.
        name: String,
        /// Database qualifier; the session's current database if absent.
        database: Option<String>,
    },

    /// A table bound to its catalog handle.
    ResolvedTable(ResolvedTable),

    /// Compute one output column per expression.
    Project {
        /// Output expressions.
        projections: Vec<Expr>,
        /// Input plan.
        input: Arc<Self>,
    },

    /// Keep rows satisfying a predicate.
    Filter {
        /// Boolean predicate.
        predicate: Expr,
        /// Input plan.
        input: Arc<Self>,
    },

    /// Group rows and compute aggregates.
    GroupBy {
        /// Output expressions, aggregates or grouping expressions.
        aggregates: Vec<Expr>,
        /// Grouping expressions.
        grouping: Vec<Expr>,
        /// Input plan.
        input: Arc<Self>,
    },

    /// Keep the first `limit` rows.
    Limit {
        /// Row count.
        limit: u64,
        /// Input plan.
        input: Arc<Self>,
    },

    /// Join on an explicit condition.
    InnerJoin {
        /// Left input.
        left: Arc<Self>,
        /// Right input.
        right: Arc<Self>,
        /// Join condition over the concatenated row.
        condition: Expr,
    },

    /// Cartesian product.
    CrossJoin {
        /// Left input.
        left: Arc<Self>,
        /// Right input.
        right: Arc<Self>,
    },

    /// Join on every column name the two sides share. Never resolved: it
    /// must be rewritten into an inner or cross join.
    NaturalJoin {
        /// Left input.
        left: Arc<Self>,
        /// Right input.
        right: Arc<Self>,
    },

    /// Re-label the input's columns as coming from `alias`.
    TableAlias {
        /// Alias name.
        alias: String,
        /// Input plan.
        input: Arc<Self>,
    },

    /// Describe the input's schema as `(name, type)` rows.
    Describe {
        /// Plan being described.
        input: Arc<Self>,
    },

    /// A transparent wrapper recording which rewrite produced its input.
    Decorated {
        /// Human-readable description of the rewrite.
        description: String,
        /// Wrapped plan.
        input: Arc<Self>,
    },
}

impl Plan {
    /// Node name, used for display.
    pub const fn name(&self) -> &'static str {
        match self {
            Self::UnresolvedTable { .. } => "UnresolvedTable",
            Self::ResolvedTable(_) => "ResolvedTable",
            Self::Project { .. } => "Project",
            Self::Filter { .. } => "Filter",
            Self::GroupBy { .. } => "GroupBy",
            Self::Limit { .. } => "Limit",
            Self::InnerJoin { .. } => "InnerJoin",
            Self::CrossJoin { .. } => "CrossJoin",
            Self::NaturalJoin { .. } => "NaturalJoin",
            Self::TableAlias { .. } => "TableAlias",
            Self::Describe { .. } => "Describe",
            Self::Decorated { .. } => "Decorated",
        }
    }

    /// Direct children, left to right.
    pub fn children(&self) -> Vec<&Arc<Self>> {
        match self {
            Self::UnresolvedTable { .. } | Self::ResolvedTable(_) => vec![],
            Self::Project { input, .. }
            | Self::Filter { input, .. }
            | Self::GroupBy { input, .. }
            | Self::Limit { input, .. }
            | Self::TableAlias { input, .. }
            | Self::Describe { input }
            | Self::Decorated { input, .. } => vec![input],
            Self::InnerJoin { left, right, .. }
            | Self::CrossJoin { left, right }
            | Self::NaturalJoin { left, right } => vec![left, right],
        }
    }

    /// This node with its children replaced.
    ///
    /// Fails with `InternalError` if `children` has the wrong length.
    pub fn with_new_children(&self, children: Vec<Arc<Self>>) -> TesseraResult<Self> {
        let expected = self.children().len();
        if children.len() != expected {
            return Err(TesseraError::internal(format!(
                "{} expects {expected} children, got {}",
                self.name(),
                children.len()
            )));
        }

        self.rebuild(&mut children.into_iter())
            .ok_or_else(|| TesseraError::internal(format!("{} lost a child", self.name())))
    }

    fn rebuild(&self, children: &mut impl Iterator<Item = Arc<Self>>) -> Option<Self> {
        Some(match self {
            Self::UnresolvedTable { .. } | Self::ResolvedTable(_) => self.clone(),
            Self::Project { projections, .. } => Self::Project {
                projections: projections.clone(),
                input: children.next()?,
            },
            Self::Filter { predicate, .. } => Self::Filter {
                predicate: predicate.clone(),
                input: children.next()?,
            },
            Self::GroupBy {
                aggregates,
                grouping,
                ..
            } => Self::GroupBy {
                aggregates: aggregates.clone(),
                grouping: grouping.clone(),
                input: children.next()?,
            },
            Self::Limit { limit, .. } => Self::Limit {
                limit: *limit,
                input: children.next()?,
            },
            Self::TableAlias { alias, .. } => Self::TableAlias {
                alias: alias.clone(),
                input: children.next()?,
            },
            Self::Describe { .. } => Self::Describe {
                input: children.next()?,
            },
            Self::Decorated { description, .. } => Self::Decorated {
                description: description.clone(),
                input: children.next()?,
            },
            Self::InnerJoin { condition, .. } => Self::InnerJoin {
                left: children.next()?,
                right: children.next()?,
                condition: condition.clone(),
            },
            Self::CrossJoin { .. } => Self::CrossJoin {
                left: children.next()?,
                right: children.next()?,
            },
            Self::NaturalJoin { .. } => Self::NaturalJoin {
                left: children.next()?,
                right: children.next()?,
            },
        })
    }

    /// Expressions owned by this node (not its children).
    pub fn expressions(&self) -> Vec<&Expr> {
        match self {
            Self::Project { projections, .. } => projections.iter().collect(),
            Self::Filter { predicate, .. } => vec![predicate],
            Self::GroupBy {
                aggregates,
                grouping,
                ..
            } => aggregates.iter().chain(grouping).collect(),
            Self::InnerJoin { condition, .. } => vec![condition],
            _ => vec![],
        }
    }

    /// The row the expressions of this node are evaluated against: the
    /// concatenated schemas of its children.
    pub fn input_schema(&self) -> Schema {
        self.children()
            .into_iter()
            .fold(Schema::empty(), |acc, child| acc.concat(&child.schema()))
    }

    /// Output schema.
    ///
    /// Only well-defined once the node is resolved; unresolved nodes report
    /// an empty schema.
    pub fn schema(&self) -> Schema {
        match self {
            Self::UnresolvedTable { .. } | Self::NaturalJoin { .. } => Schema::empty(),
            Self::ResolvedTable(table) => table.schema().clone(),
            Self::Project { projections, .. } => project_schema(projections),
            Self::GroupBy { aggregates, .. } => project_schema(aggregates),
            Self::Filter { input, .. }
            | Self::Limit { input, .. }
            | Self::Decorated { input, .. } => input.schema(),
            Self::InnerJoin { left, right, .. } | Self::CrossJoin { left, right } => {
                left.schema().concat(&right.schema())
            }
            Self::TableAlias { alias, input } => input.schema().with_source(alias),
            Self::Describe { .. } => Schema::new(vec![
                Column::new("name", "", DataType::Text).with_nullable(false),
                Column::new("type", "", DataType::Text).with_nullable(false),
            ]),
        }
    }

    /// True iff this node and all descendants carry no unresolved references.
    pub fn resolved(&self) -> bool {
        match self {
            Self::UnresolvedTable { .. } | Self::NaturalJoin { .. } => false,
            Self::ResolvedTable(_) => true,
            _ => {
                self.expressions().into_iter().all(Expr::resolved)
                    && self.children().into_iter().all(|c| c.resolved())
            }
        }
    }

    /// Check whether any node in the tree satisfies `predicate`.
    pub fn exists<F>(&self, predicate: &F) -> bool
    where
        F: Fn(&Self) -> bool,
    {
        predicate(self) || self.children().into_iter().any(|c| c.exists(predicate))
    }

    /// Check whether any expression in the tree contains a subquery.
    pub fn contains_subquery(&self) -> bool {
        self.exists(&|node| {
            node.expressions()
                .into_iter()
                .any(Expr::contains_subquery)
        })
    }

    /// The table handle, if this is a resolved table.
    pub fn as_resolved_table(&self) -> Option<&ResolvedTable> {
        match self {
            Self::ResolvedTable(table) => Some(table),
            _ => None,
        }
    }
}

fn project_schema(exprs: &[Expr]) -> Schema {
    if exprs.iter().all(Expr::resolved) {
        exprs.iter().map(Expr::to_column).collect()
    } else {
        Schema::empty()
    }
}

impl From<ResolvedTable> for Plan {
    fn from(table: ResolvedTable) -> Self {
        Self::ResolvedTable(table)
    }
}

#[cfg(test)]
pub(crate) mod test_utils {
    use std::sync::Arc;

    use tessera_core::{Column, DataType, Schema};

    use crate::table::Table;

    /// A plain table without pushdown capabilities.
    #[derive(Debug)]
    pub struct TestTable {
        pub name: String,
        pub schema: Schema,
    }

    impl Table for TestTable {
        fn name(&self) -> &str {
            &self.name
        }

        fn schema(&self) -> &Schema {
            &self.schema
        }
    }

    pub fn table(name: &str, columns: &[(&str, DataType)]) -> Arc<dyn Table> {
        Arc::new(TestTable {
            name: name.to_string(),
            schema: columns
                .iter()
                .map(|(c, ty)| Column::new(*c, name, *ty))
                .collect(),
        })
    }
}
