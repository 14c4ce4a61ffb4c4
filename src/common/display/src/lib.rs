//! Display utilities for Tessera plans.
//!
//! Plans render as indented trees; see [`DisplayTree`].

mod tree;

pub use tree::{DisplayTree, TreeNode};
