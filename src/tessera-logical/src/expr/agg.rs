//! Aggregate functions.

use serde::{Deserialize, Serialize};
use tessera_core::DataType;

use super::Expr;

/// Aggregate function types.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum AggFunc {
    /// Count rows (or non-null values)
    Count,
    /// Sum of values
    Sum,
    /// Minimum value
    Min,
    /// Maximum value
    Max,
    /// Average value
    Avg,
}

impl AggFunc {
    /// Get the result type of this aggregate function given the input type.
    pub const fn result_type(&self, input: &DataType) -> DataType {
        match self {
            Self::Count => DataType::Int64,
            Self::Sum => match input {
                DataType::Float64 => DataType::Float64,
                _ => DataType::Int64,
            },
            Self::Min | Self::Max => *input,
            Self::Avg => DataType::Float64,
        }
    }

    /// Get the function name for display.
    pub const fn name(&self) -> &'static str {
        match self {
            Self::Count => "COUNT",
            Self::Sum => "SUM",
            Self::Min => "MIN",
            Self::Max => "MAX",
            Self::Avg => "AVG",
        }
    }
}

impl std::fmt::Display for AggFunc {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

/// An aggregate call. `COUNT(*)` has no argument.
#[derive(Debug, Clone, PartialEq)]
pub struct AggExpr {
    /// The aggregate function.
    pub func: AggFunc,
    /// The input expression.
    pub arg: Option<Box<Expr>>,
}

impl AggExpr {
    /// Create a new aggregate over `arg`.
    pub fn new(func: AggFunc, arg: Expr) -> Self {
        Self {
            func,
            arg: Some(Box::new(arg)),
        }
    }

    /// `COUNT(*)`.
    pub const fn count_star() -> Self {
        Self {
            func: AggFunc::Count,
            arg: None,
        }
    }

    /// Result type of this aggregate.
    pub fn data_type(&self) -> DataType {
        let input = self.arg.as_ref().map_or(DataType::Null, |a| a.data_type());
        self.func.result_type(&input)
    }
}

impl std::fmt::Display for AggExpr {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match &self.arg {
            Some(arg) => write!(f, "{}({arg})", self.func),
            None => write!(f, "{}(*)", self.func),
        }
    }
}
