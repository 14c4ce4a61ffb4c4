//! Logical plan layer for the Tessera query analyzer.
//!
//! `tessera-logical` defines what the analyzer operates on:
//!
//! - **Expressions** ([`Expr`]): unresolved column references and wildcards
//!   as written in a query, the positional [`GetField`] references they
//!   resolve to, and the opaque operator/literal/aggregate shapes around them
//! - **Plans** ([`Plan`]): an immutable tree of nodes sharing unchanged
//!   subtrees through `Arc`, with derived schemas and a `resolved()` predicate
//! - **Tables** ([`Table`]): the storage capability interface, with optional
//!   projection and filter pushdown
//! - **Scopes** ([`Scope`]): enclosing query schemas for correlated subqueries
//! - **Rewriting** ([`Transformed`], [`Plan::transform_up`],
//!   [`Plan::transform_down`]): traversal orders as a named contract
//!
//! # Example
//!
//! ```rust
//! use tessera_logical::PlanBuilder;
//! use tessera_logical::expr::{col, lit};
//!
//! // SELECT i FROM mytable WHERE i > 1
//! let plan = PlanBuilder::table("mytable")
//!     .filter(col("i").gt(lit(1)))
//!     .project(vec![col("i")])
//!     .build();
//!
//! assert!(!plan.resolved());
//! println!("{}", plan.explain());
//! ```

pub mod expr;
pub mod plan;
pub mod scope;
pub mod table;

pub use expr::{AggExpr, AggFunc, BinaryOp, Expr, GetField, UnaryOp};
pub use plan::{Plan, PlanBuilder, ResolvedTable, Transformed};
pub use scope::Scope;
pub use table::{FilterableTable, ProjectableTable, Table};
