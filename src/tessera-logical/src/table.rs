//! Table handles as seen by the analyzer.
//!
//! Storage is an external collaborator. A table exposes its name and schema;
//! projection and filter pushdown are optional capabilities discovered at
//! runtime through [`Table::as_projectable`] and [`Table::as_filterable`].

use std::fmt::Debug;
use std::sync::Arc;

use tessera_core::Schema;

use crate::expr::Expr;

/// A row source the catalog can hand out.
pub trait Table: Debug + Send + Sync {
    /// Table name.
    fn name(&self) -> &str;

    /// Columns this table produces, after any projection.
    fn schema(&self) -> &Schema;

    /// Projection capability, if the table supports it.
    fn as_projectable(&self) -> Option<&dyn ProjectableTable> {
        None
    }

    /// Filter capability, if the table supports it.
    fn as_filterable(&self) -> Option<&dyn FilterableTable> {
        None
    }
}

/// A table that can be narrowed to a subset of its columns.
pub trait ProjectableTable: Send + Sync {
    /// Column names this table is narrowed to, if any.
    fn projection(&self) -> Option<&[String]>;

    /// A new table producing only `columns`, in that order.
    fn with_projection(&self, columns: Vec<String>) -> Arc<dyn Table>;
}

/// A table that can evaluate predicates while reading.
///
/// Pushed predicates reference columns by their position in the table's
/// unprojected schema.
pub trait FilterableTable: Send + Sync {
    /// Predicates already pushed into this table.
    fn filters(&self) -> &[Expr];

    /// A new table that additionally applies `filters`.
    fn with_filters(&self, filters: Vec<Expr>) -> Arc<dyn Table>;

    /// Whether this table can evaluate `filter` itself.
    fn handles_filter(&self, _filter: &Expr) -> bool {
        true
    }
}
