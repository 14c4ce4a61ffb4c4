//! Error types and result aliases for Tessera.
//!
//! Every crate in the workspace reports failures through [`TesseraError`].
//! Errors raised by user-supplied analyzer rules are carried as
//! [`GenericError`] inside [`TesseraError::RuleFailed`].

mod error;

pub use error::{GenericError, TesseraError, TesseraResult};
