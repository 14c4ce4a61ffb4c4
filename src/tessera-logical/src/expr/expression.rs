//! Expressions carried by plan nodes.
//!
//! The analyzer rewrites the unresolved shapes (`UnresolvedColumn`,
//! `UnresolvedQualifiedColumn`, `Star`) into positional [`GetField`]
//! references. The remaining variants are opaque to analysis: they are
//! inspected for the fields they reference but never evaluated.

use std::fmt;
use std::sync::Arc;

use common_error::TesseraResult;
use tessera_core::{Column, DataType, Value};

use super::{AggExpr, BinaryOp, UnaryOp};
use crate::plan::{Plan, Transformed};

/// A resolved column reference by position.
///
/// `index` is relative to the row the owning plan node sees: the
/// concatenated schemas of its children, followed by any enclosing scopes.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct GetField {
    /// Position in the row visible to the owning node.
    pub index: usize,
    /// Column type.
    pub data_type: DataType,
    /// Source table (or alias) of the column.
    pub table: String,
    /// Column name.
    pub name: String,
    /// Whether the column can contain nulls.
    pub nullable: bool,
}

impl GetField {
    /// Reference `column` at `index`.
    pub fn new(index: usize, column: &Column) -> Self {
        Self {
            index,
            data_type: column.data_type,
            table: column.source.clone(),
            name: column.name.clone(),
            nullable: column.nullable,
        }
    }

    /// The same reference at a different position.
    #[must_use]
    pub fn with_index(&self, index: usize) -> Self {
        Self {
            index,
            ..self.clone()
        }
    }
}

impl fmt::Display for GetField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.table.is_empty() {
            write!(f, "{}", self.name)
        } else {
            write!(f, "{}.{}", self.table, self.name)
        }
    }
}

/// An expression tree.
#[derive(Debug, Clone, PartialEq)]
pub enum Expr {
    /// A literal constant value.
    Literal(Value),

    /// A column name not yet bound to a schema position.
    UnresolvedColumn(String),

    /// A `table.column` reference not yet bound to a schema position.
    UnresolvedQualifiedColumn {
        /// Table qualifier.
        table: String,
        /// Column name.
        name: String,
    },

    /// `*` or `table.*`.
    Star(Option<String>),

    /// A resolved column reference.
    GetField(GetField),

    /// A named expression.
    Alias {
        /// Output name.
        name: String,
        /// Aliased expression.
        expr: Box<Self>,
    },

    /// A binary operation.
    Binary {
        /// Left operand.
        left: Box<Self>,
        /// Binary operator.
        op: BinaryOp,
        /// Right operand.
        right: Box<Self>,
    },

    /// A unary operation.
    Unary {
        /// Unary operator.
        op: UnaryOp,
        /// Operand.
        expr: Box<Self>,
    },

    /// An aggregate call (only valid in `GroupBy`).
    Aggregate(AggExpr),

    /// A scalar subquery, possibly correlated with the enclosing query.
    Subquery(Arc<Plan>),
}

impl Expr {
    /// Create a binary expression.
    pub fn binary(left: Self, op: BinaryOp, right: Self) -> Self {
        Self::Binary {
            left: Box::new(left),
            op,
            right: Box::new(right),
        }
    }

    /// Create a unary expression.
    pub fn unary(op: UnaryOp, expr: Self) -> Self {
        Self::Unary {
            op,
            expr: Box::new(expr),
        }
    }

    /// Reference `column` at `index`.
    pub fn field(index: usize, column: &Column) -> Self {
        Self::GetField(GetField::new(index, column))
    }

    /// Create an aliased expression.
    #[must_use]
    pub fn alias(self, name: impl Into<String>) -> Self {
        Self::Alias {
            name: name.into(),
            expr: Box::new(self),
        }
    }

    // ========== Convenience builders ==========

    /// Create an AND expression.
    #[must_use]
    pub fn and(self, other: Self) -> Self {
        Self::binary(self, BinaryOp::And, other)
    }

    /// Create an OR expression.
    #[must_use]
    pub fn or(self, other: Self) -> Self {
        Self::binary(self, BinaryOp::Or, other)
    }

    /// Create an equality expression.
    #[must_use]
    pub fn eq(self, other: Self) -> Self {
        Self::binary(self, BinaryOp::Eq, other)
    }

    /// Create an inequality expression.
    #[must_use]
    pub fn not_eq(self, other: Self) -> Self {
        Self::binary(self, BinaryOp::NotEq, other)
    }

    /// Create a less than expression.
    #[must_use]
    pub fn lt(self, other: Self) -> Self {
        Self::binary(self, BinaryOp::Lt, other)
    }

    /// Create a greater than expression.
    #[must_use]
    pub fn gt(self, other: Self) -> Self {
        Self::binary(self, BinaryOp::Gt, other)
    }

    /// Create a NOT expression.
    #[must_use]
    pub fn not(self) -> Self {
        Self::unary(UnaryOp::Not, self)
    }

    /// Create an IS NULL expression.
    #[must_use]
    pub fn is_null(self) -> Self {
        Self::unary(UnaryOp::IsNull, self)
    }

    // ========== Properties ==========

    /// True iff this expression contains no unbound names.
    pub fn resolved(&self) -> bool {
        match self {
            Self::UnresolvedColumn(_) | Self::UnresolvedQualifiedColumn { .. } | Self::Star(_) => {
                false
            }
            Self::Subquery(plan) => plan.resolved(),
            _ => self.children().into_iter().all(Self::resolved),
        }
    }

    /// Result type. Unresolved references report `Null`.
    pub fn data_type(&self) -> DataType {
        match self {
            Self::Literal(v) => v.data_type(),
            Self::GetField(field) => field.data_type,
            Self::Alias { expr, .. } => expr.data_type(),
            Self::Binary { left, op, right } => {
                op.result_type(&left.data_type(), &right.data_type())
            }
            Self::Unary { op, expr } => op.result_type(&expr.data_type()),
            Self::Aggregate(agg) => agg.data_type(),
            Self::Subquery(plan) => plan
                .schema()
                .column(0)
                .map_or(DataType::Null, |c| c.data_type),
            Self::UnresolvedColumn(_) | Self::UnresolvedQualifiedColumn { .. } | Self::Star(_) => {
                DataType::Null
            }
        }
    }

    /// Whether this expression can evaluate to null.
    pub fn nullable(&self) -> bool {
        match self {
            Self::Literal(v) => v.is_null(),
            Self::GetField(field) => field.nullable,
            Self::Alias { expr, .. } => expr.nullable(),
            Self::Binary { left, right, .. } => left.nullable() || right.nullable(),
            Self::Unary { op, expr } => op.propagates_null() && expr.nullable(),
            Self::Aggregate(agg) => agg.func != super::AggFunc::Count,
            _ => true,
        }
    }

    /// Name of the output column this expression produces in a projection.
    pub fn name(&self) -> String {
        match self {
            Self::GetField(field) => field.name.clone(),
            Self::Alias { name, .. } => name.clone(),
            Self::UnresolvedColumn(name) | Self::UnresolvedQualifiedColumn { name, .. } => {
                name.clone()
            }
            other => other.to_string(),
        }
    }

    /// Column descriptor this expression produces in a projection.
    pub fn to_column(&self) -> Column {
        let source = match self {
            Self::GetField(field) => field.table.as_str(),
            _ => "",
        };
        Column::new(self.name(), source, self.data_type()).with_nullable(self.nullable())
    }

    /// Direct sub-expressions. Subquery plans are not included.
    pub fn children(&self) -> Vec<&Self> {
        match self {
            Self::Alias { expr, .. } | Self::Unary { expr, .. } => vec![expr.as_ref()],
            Self::Binary { left, right, .. } => vec![left.as_ref(), right.as_ref()],
            Self::Aggregate(agg) => agg.arg.iter().map(|arg| &**arg).collect(),
            _ => vec![],
        }
    }

    /// The resolved field, if this is a `GetField`.
    pub fn as_field(&self) -> Option<&GetField> {
        match self {
            Self::GetField(field) => Some(field),
            _ => None,
        }
    }

    /// Check whether this expression or any sub-expression satisfies `predicate`.
    pub fn exists<F>(&self, predicate: &F) -> bool
    where
        F: Fn(&Self) -> bool,
    {
        predicate(self) || self.children().into_iter().any(|c| c.exists(predicate))
    }

    /// Check whether this expression contains an aggregate call.
    pub fn contains_aggregate(&self) -> bool {
        self.exists(&|e| matches!(e, Self::Aggregate(_)))
    }

    /// Check whether this expression contains a subquery.
    pub fn contains_subquery(&self) -> bool {
        self.exists(&|e| matches!(e, Self::Subquery(_)))
    }

    /// Every `GetField` in this expression, in depth-first order.
    pub fn fields(&self) -> Vec<&GetField> {
        fn collect<'a>(expr: &'a Expr, out: &mut Vec<&'a GetField>) {
            if let Expr::GetField(field) = expr {
                out.push(field);
            }
            for child in expr.children() {
                collect(child, out);
            }
        }

        let mut out = Vec::new();
        collect(self, &mut out);
        out
    }

    /// The operands of a chain of `AND`s.
    pub fn split_conjunction(&self) -> Vec<&Self> {
        match self {
            Self::Binary {
                left,
                op: BinaryOp::And,
                right,
            } => {
                let mut parts = left.split_conjunction();
                parts.extend(right.split_conjunction());
                parts
            }
            other => vec![other],
        }
    }

    /// Join `exprs` with `AND`, or `None` if there are none.
    pub fn conjunction(exprs: impl IntoIterator<Item = Self>) -> Option<Self> {
        exprs.into_iter().reduce(Self::and)
    }

    // ========== Rewriting ==========

    /// Rewrite this expression bottom-up: children first, then `f` on the
    /// rebuilt node. Subquery plans are left alone.
    pub fn transform_up<F>(self, f: &mut F) -> TesseraResult<Transformed<Self>>
    where
        F: FnMut(Self) -> TesseraResult<Transformed<Self>>,
    {
        let rebuilt = self.map_children(|child| child.transform_up(f))?;
        let node = f(rebuilt.data)?;
        Ok(Transformed::new(node.data, rebuilt.changed || node.changed))
    }

    fn map_children<F>(self, mut f: F) -> TesseraResult<Transformed<Self>>
    where
        F: FnMut(Self) -> TesseraResult<Transformed<Self>>,
    {
        let transformed = match self {
            Self::Alias { name, expr } => f(*expr)?.map_data(|expr| Self::Alias {
                name,
                expr: Box::new(expr),
            }),
            Self::Unary { op, expr } => f(*expr)?.map_data(|expr| Self::unary(op, expr)),
            Self::Binary { left, op, right } => {
                let left = f(*left)?;
                let right = f(*right)?;
                Transformed::new(
                    Self::binary(left.data, op, right.data),
                    left.changed || right.changed,
                )
            }
            Self::Aggregate(AggExpr {
                func,
                arg: Some(arg),
            }) => f(*arg)?.map_data(|arg| Self::Aggregate(AggExpr::new(func, arg))),
            other => Transformed::no(other),
        };
        Ok(transformed)
    }
}

fn fmt_operand(expr: &Expr, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    if matches!(expr, Expr::Binary { .. }) {
        write!(f, "({expr})")
    } else {
        write!(f, "{expr}")
    }
}

impl fmt::Display for Expr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Literal(v) => write!(f, "{v}"),
            Self::UnresolvedColumn(name) => write!(f, "{name}"),
            Self::UnresolvedQualifiedColumn { table, name } => write!(f, "{table}.{name}"),
            Self::Star(None) => write!(f, "*"),
            Self::Star(Some(table)) => write!(f, "{table}.*"),
            Self::GetField(field) => write!(f, "{field}"),
            Self::Alias { name, expr } => write!(f, "{expr} as {name}"),
            Self::Binary { left, op, right } => {
                fmt_operand(left, f)?;
                write!(f, " {op} ")?;
                fmt_operand(right, f)
            }
            Self::Unary { op, expr } => match op {
                UnaryOp::Not => write!(f, "NOT {expr}"),
                UnaryOp::Neg => write!(f, "-{expr}"),
                UnaryOp::IsNull => write!(f, "{expr} IS NULL"),
                UnaryOp::IsNotNull => write!(f, "{expr} IS NOT NULL"),
            },
            Self::Aggregate(agg) => write!(f, "{agg}"),
            Self::Subquery(plan) => write!(f, "(subquery: {})", plan.name()),
        }
    }
}

/// Create an unresolved column reference.
pub fn col(name: impl Into<String>) -> Expr {
    Expr::UnresolvedColumn(name.into())
}

/// Create an unresolved `table.column` reference.
pub fn qcol(table: impl Into<String>, name: impl Into<String>) -> Expr {
    Expr::UnresolvedQualifiedColumn {
        table: table.into(),
        name: name.into(),
    }
}

/// `*`.
pub const fn star() -> Expr {
    Expr::Star(None)
}

/// `table.*`.
pub fn qstar(table: impl Into<String>) -> Expr {
    Expr::Star(Some(table.into()))
}

/// Create a literal expression.
pub fn lit(value: impl Into<Value>) -> Expr {
    Expr::Literal(value.into())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::expr::AggFunc;

    fn field(index: usize, table: &str, name: &str) -> Expr {
        Expr::field(index, &Column::new(name, table, DataType::Int32))
    }

    #[test]
    fn test_resolved() {
        assert!(!col("i").resolved());
        assert!(!star().resolved());
        assert!(!field(0, "t", "i").eq(col("x")).resolved());
        assert!(field(0, "t", "i").eq(lit(1)).resolved());
    }

    #[test]
    fn test_display() {
        let pred = field(0, "mytable", "i").eq(lit(1));
        assert_eq!(pred.to_string(), "mytable.i = 1");

        let nested = pred.clone().and(field(1, "mytable", "t").is_null());
        assert_eq!(nested.to_string(), "(mytable.i = 1) AND mytable.t IS NULL");

        assert_eq!(qstar("a").to_string(), "a.*");
        assert_eq!(
            Expr::Aggregate(AggExpr::count_star()).alias("n").to_string(),
            "COUNT(*) as n"
        );
    }

    #[test]
    fn test_output_columns() {
        let aliased = field(2, "mytable", "i").alias("foo");
        let column = aliased.to_column();
        assert_eq!(column.name, "foo");
        assert_eq!(column.source, "");
        assert_eq!(column.data_type, DataType::Int32);

        let plain = field(2, "mytable", "i").to_column();
        assert_eq!(plain.qualified_name(), "mytable.i");
    }

    #[test]
    fn test_data_types() {
        assert_eq!(field(0, "t", "i").gt(lit(1)).data_type(), DataType::Bool);
        assert_eq!(
            Expr::Aggregate(AggExpr::new(AggFunc::Avg, field(0, "t", "i"))).data_type(),
            DataType::Float64
        );
        assert!(!Expr::Aggregate(AggExpr::count_star()).nullable());
    }

    #[test]
    fn test_split_and_join_conjunction() {
        let a = field(0, "t", "a").eq(lit(1));
        let b = field(1, "t", "b").eq(lit(2));
        let c = field(2, "t", "c").eq(lit(3));
        let pred = a.clone().and(b.clone()).and(c.clone());

        let parts = pred.split_conjunction();
        assert_eq!(parts, vec![&a, &b, &c]);

        let rejoined = Expr::conjunction(parts.into_iter().cloned()).unwrap();
        assert_eq!(rejoined, pred);
        assert_eq!(Expr::conjunction(Vec::new()), None);
    }

    #[test]
    fn test_fields() {
        let pred = field(0, "a", "x").eq(field(3, "b", "y")).and(lit(true));
        let names: Vec<_> = pred.fields().iter().map(|f| f.to_string()).collect();
        assert_eq!(names, vec!["a.x", "b.y"]);
    }

    #[test]
    fn test_transform_up_reports_changes() {
        let expr = col("i").eq(lit(1));

        let unchanged = expr.clone().transform_up(&mut |e| Ok(Transformed::no(e))).unwrap();
        assert!(!unchanged.changed);
        assert_eq!(unchanged.data, expr);

        let rewritten = expr
            .transform_up(&mut |e| match e {
                Expr::UnresolvedColumn(_) => Ok(Transformed::yes(field(0, "t", "i"))),
                other => Ok(Transformed::no(other)),
            })
            .unwrap();
        assert!(rewritten.changed);
        assert_eq!(rewritten.data, field(0, "t", "i").eq(lit(1)));
    }
}
