//! Expression surface of plan nodes.

mod agg;
mod expression;
mod ops;

pub use agg::{AggExpr, AggFunc};
pub use expression::{Expr, GetField, col, lit, qcol, qstar, star};
pub use ops::{BinaryOp, UnaryOp};
