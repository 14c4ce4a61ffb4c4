//! Tessera - rule-based SQL query analyzer
//!
//! Tessera takes a parsed query plan with names as written, binds it to a
//! catalog, expands natural joins and wildcards, resolves (correlated)
//! column references to positions, and pushes filters and projections into
//! tables that accept them.

#![forbid(unsafe_code)]
#![allow(clippy::module_name_repetitions)]

// Re-export core crates
pub use common_config as config;
pub use common_display as display;
pub use common_error as error;
pub use tessera_analyzer as analyzer;
pub use tessera_catalog as catalog;
pub use tessera_core as core;
pub use tessera_logical as logical;

/// Tessera version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
