//! Schema system for Tessera.
//!
//! This module provides:
//! - `Column` and `Schema` for ordered column descriptors
//! - `ColumnRef` for qualified and unqualified column references
//! - `ColumnIndex` for immutable `(table, column)` position lookups

mod column_index;
mod column_ref;
mod schema_impl;

pub use column_index::ColumnIndex;
pub use column_ref::ColumnRef;
pub use schema_impl::{Column, Schema};
