//! Rule-based analysis of logical query plans.
//!
//! The [`Analyzer`] takes a freshly parsed [`Plan`](tessera_logical::Plan),
//! with table and column names as written, and rewrites it through ordered
//! batches of rules:
//!
//! 1. **Resolution** (to a fixed point): bind tables through the
//!    [`Catalog`](tessera_catalog::Catalog), expand natural joins and stars,
//!    bind columns to positions (including correlated references through
//!    the [`Scope`](tessera_logical::Scope)) and analyze subqueries.
//! 2. **Pushdown** (once): hand predicates and required columns to tables
//!    that accept them, recording each in a `Decorated` node, and drop
//!    projections that only repeat their input.
//! 3. **Validation** (once): reject plans that are still unresolved or
//!    that use non-grouped columns in a `GroupBy`.
//!
//! Custom rules can be added after pushdown, before validation and after
//! validation through [`AnalyzerBuilder`].
//!
//! # Example
//!
//! ```rust
//! use std::sync::Arc;
//!
//! use tessera_analyzer::{Analyzer, Context};
//! use tessera_catalog::{Catalog, Database, MemoryTable};
//! use tessera_core::{Column, DataType, Schema};
//! use tessera_logical::expr::col;
//! use tessera_logical::{PlanBuilder, Scope};
//!
//! let catalog = Arc::new(Catalog::new());
//! let db = catalog.add_database(Database::new("mydb"));
//! db.add_table(Arc::new(MemoryTable::new(
//!     "mytable",
//!     Schema::new(vec![Column::new("i", "", DataType::Int32)]),
//! )));
//!
//! let analyzer = Analyzer::new(catalog);
//! let ctx = Context::new().with_current_database("mydb");
//! let plan = PlanBuilder::table("mytable").project(vec![col("i")]).build();
//!
//! let analyzed = analyzer.analyze(&ctx, plan, &Scope::new()).unwrap();
//! assert!(analyzed.resolved());
//! ```

mod analyzer;
mod context;
mod report;
mod rule;
pub mod rules;

#[cfg(test)]
pub(crate) mod testing;

pub use analyzer::{Analyzer, AnalyzerBuilder};
pub use context::Context;
pub use report::{AnalyzedPlan, RuleTrace};
pub use rule::{AnalyzerRule, Batch, FnRule, Phase, RuleFn};
