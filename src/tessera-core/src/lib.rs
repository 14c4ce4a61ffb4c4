//! Core data model for the Tessera query analyzer.
//!
//! This crate provides the schema-level types every other layer builds on:
//! - `DataType` and `Value` for the type system
//! - `Column` and `Schema` for ordered column descriptors
//! - `ColumnRef` for resolving written column names against a schema
//! - `ColumnIndex` for positional lookups by `(table, column)`

pub mod schema;
pub mod types;

pub use schema::{Column, ColumnIndex, ColumnRef, Schema};
pub use types::{DataType, Value};
