//! Fixtures shared by the rule unit tests.

use std::sync::Arc;

use tessera_catalog::{Catalog, Database, MemoryTable};
use tessera_core::{Column, DataType, Schema};
use tessera_logical::{Plan, PlanBuilder};

use crate::{Analyzer, Context};

pub fn schema(columns: &[(&str, DataType)]) -> Schema {
    columns
        .iter()
        .map(|(name, ty)| Column::new(*name, "", *ty))
        .collect()
}

pub fn mytable() -> MemoryTable {
    MemoryTable::with_pushdown(
        "mytable",
        schema(&[
            ("i", DataType::Int32),
            ("f", DataType::Float64),
            ("t", DataType::Text),
        ]),
    )
}

pub fn mytable2() -> MemoryTable {
    MemoryTable::with_pushdown(
        "mytable2",
        schema(&[
            ("i2", DataType::Int32),
            ("f2", DataType::Float64),
            ("t2", DataType::Text),
        ]),
    )
}

/// A catalog with `mytable` and `mytable2` in database `mydb`.
pub fn catalog() -> Arc<Catalog> {
    let catalog = Catalog::new();
    let db = catalog.add_database(Database::new("mydb"));
    db.add_table(Arc::new(mytable()));
    db.add_table(Arc::new(mytable2()));
    Arc::new(catalog)
}

pub fn analyzer() -> Analyzer {
    Analyzer::new(catalog())
}

pub fn ctx() -> Context {
    Context::new().with_current_database("mydb")
}

pub fn resolved(table: MemoryTable) -> Arc<Plan> {
    PlanBuilder::resolved(Arc::new(table)).build()
}
