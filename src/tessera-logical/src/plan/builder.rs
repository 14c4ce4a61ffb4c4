//! Fluent construction of plan trees.

use std::sync::Arc;

use super::{Plan, ResolvedTable};
use crate::expr::Expr;
use crate::table::Table;

/// Builder for constructing plans bottom-up.
///
/// ```
/// use tessera_logical::expr::{col, lit, star};
/// use tessera_logical::PlanBuilder;
///
/// // SELECT * FROM mytable WHERE i = 1 LIMIT 10
/// let plan = PlanBuilder::table("mytable")
///     .filter(col("i").eq(lit(1)))
///     .project(vec![star()])
///     .limit(10)
///     .build();
/// assert!(!plan.resolved());
/// ```
#[derive(Debug, Clone)]
pub struct PlanBuilder {
    plan: Arc<Plan>,
}

impl PlanBuilder {
    /// Start from a table in the session's current database.
    pub fn table(name: impl Into<String>) -> Self {
        Self::from(Plan::UnresolvedTable {
            name: name.into(),
            database: None,
        })
    }

    /// Start from a table in a named database.
    pub fn table_in(database: impl Into<String>, name: impl Into<String>) -> Self {
        Self::from(Plan::UnresolvedTable {
            name: name.into(),
            database: Some(database.into()),
        })
    }

    /// Start from an already-bound table.
    pub fn resolved(table: Arc<dyn Table>) -> Self {
        Self::from(Plan::ResolvedTable(ResolvedTable::new(table)))
    }

    /// Add a projection.
    pub fn project(self, projections: Vec<Expr>) -> Self {
        Self::from(Plan::Project {
            projections,
            input: self.plan,
        })
    }

    /// Add a filter.
    pub fn filter(self, predicate: Expr) -> Self {
        Self::from(Plan::Filter {
            predicate,
            input: self.plan,
        })
    }

    /// Add a grouping.
    pub fn group_by(self, aggregates: Vec<Expr>, grouping: Vec<Expr>) -> Self {
        Self::from(Plan::GroupBy {
            aggregates,
            grouping,
            input: self.plan,
        })
    }

    /// Add a limit.
    pub fn limit(self, limit: u64) -> Self {
        Self::from(Plan::Limit {
            limit,
            input: self.plan,
        })
    }

    /// Inner join with `right` on `condition`.
    pub fn inner_join(self, right: impl Into<Arc<Plan>>, condition: Expr) -> Self {
        Self::from(Plan::InnerJoin {
            left: self.plan,
            right: right.into(),
            condition,
        })
    }

    /// Cross join with `right`.
    pub fn cross_join(self, right: impl Into<Arc<Plan>>) -> Self {
        Self::from(Plan::CrossJoin {
            left: self.plan,
            right: right.into(),
        })
    }

    /// Natural join with `right`.
    pub fn natural_join(self, right: impl Into<Arc<Plan>>) -> Self {
        Self::from(Plan::NaturalJoin {
            left: self.plan,
            right: right.into(),
        })
    }

    /// Alias the current plan.
    pub fn alias(self, alias: impl Into<String>) -> Self {
        Self::from(Plan::TableAlias {
            alias: alias.into(),
            input: self.plan,
        })
    }

    /// Describe the current plan.
    pub fn describe(self) -> Self {
        Self::from(Plan::Describe { input: self.plan })
    }

    /// Wrap the current plan in a decorated node.
    pub fn decorate(self, description: impl Into<String>) -> Self {
        Self::from(Plan::Decorated {
            description: description.into(),
            input: self.plan,
        })
    }

    /// Build the final plan.
    pub fn build(self) -> Arc<Plan> {
        self.plan
    }
}

impl From<Plan> for PlanBuilder {
    fn from(plan: Plan) -> Self {
        Self {
            plan: Arc::new(plan),
        }
    }
}

impl From<Arc<Plan>> for PlanBuilder {
    fn from(plan: Arc<Plan>) -> Self {
        Self { plan }
    }
}

impl From<PlanBuilder> for Arc<Plan> {
    fn from(builder: PlanBuilder) -> Self {
        builder.plan
    }
}
