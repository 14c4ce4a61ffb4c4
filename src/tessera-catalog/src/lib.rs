//! Catalog of databases and tables for the Tessera analyzer.
//!
//! The catalog is the lookup service table resolution runs against:
//! database name to [`Database`], table name to table handle. Registration
//! is serialized behind locks; lookups may run from concurrent analyses.
//!
//! [`MemoryTable`] is an in-memory table handle that can optionally declare
//! projection and filter pushdown.

mod catalog;
mod memory;

pub use catalog::{Catalog, Database};
pub use memory::MemoryTable;
