//! In-memory table handles.

use std::sync::Arc;

use tessera_core::Schema;
use tessera_logical::{Expr, FilterableTable, ProjectableTable, Table};

/// A table that lives in memory.
///
/// Created with [`MemoryTable::new`] it declares no pushdown capability;
/// created with [`MemoryTable::with_pushdown`] it accepts both projections
/// and filters, and every pushdown returns a new narrowed handle.
#[derive(Debug, Clone)]
pub struct MemoryTable {
    name: String,
    schema: Schema,
    projection: Option<(Vec<String>, Schema)>,
    filters: Vec<Expr>,
    pushdown: bool,
}

impl MemoryTable {
    /// A table without pushdown capability. Every column is labelled as
    /// coming from `name`.
    pub fn new(name: impl Into<String>, schema: Schema) -> Self {
        let name = name.into();
        Self {
            schema: schema.with_source(&name),
            name,
            projection: None,
            filters: Vec::new(),
            pushdown: false,
        }
    }

    /// A table accepting projection and filter pushdown.
    pub fn with_pushdown(name: impl Into<String>, schema: Schema) -> Self {
        Self {
            pushdown: true,
            ..Self::new(name, schema)
        }
    }

    /// The same table registered under another name.
    #[must_use]
    pub fn renamed(&self, name: impl Into<String>) -> Self {
        let name = name.into();
        Self {
            schema: self.schema.with_source(&name),
            projection: self
                .projection
                .as_ref()
                .map(|(cols, schema)| (cols.clone(), schema.with_source(&name))),
            name,
            ..self.clone()
        }
    }
}

impl Table for MemoryTable {
    fn name(&self) -> &str {
        &self.name
    }

    fn schema(&self) -> &Schema {
        self.projection
            .as_ref()
            .map_or(&self.schema, |(_, schema)| schema)
    }

    fn as_projectable(&self) -> Option<&dyn ProjectableTable> {
        self.pushdown.then_some(self as &dyn ProjectableTable)
    }

    fn as_filterable(&self) -> Option<&dyn FilterableTable> {
        self.pushdown.then_some(self as &dyn FilterableTable)
    }
}

impl ProjectableTable for MemoryTable {
    fn projection(&self) -> Option<&[String]> {
        self.projection.as_ref().map(|(cols, _)| cols.as_slice())
    }

    fn with_projection(&self, columns: Vec<String>) -> Arc<dyn Table> {
        let schema = self.schema.project(&columns);
        Arc::new(Self {
            projection: Some((columns, schema)),
            ..self.clone()
        })
    }
}

impl FilterableTable for MemoryTable {
    fn filters(&self) -> &[Expr] {
        &self.filters
    }

    fn with_filters(&self, filters: Vec<Expr>) -> Arc<dyn Table> {
        let mut table = self.clone();
        table.filters.extend(filters);
        Arc::new(table)
    }
}
