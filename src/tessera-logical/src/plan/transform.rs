//! Tree rewriting.
//!
//! Two traversal orders are provided and are part of the contract:
//! [`Plan::transform_up`] rewrites children before their parent,
//! [`Plan::transform_down`] rewrites a parent before descending into the
//! children of the rewritten node. Both return the original `Arc` for every
//! subtree the rewrite left alone.

use std::sync::Arc;

use common_error::TesseraResult;

use super::Plan;
use crate::expr::Expr;

/// The result of a rewrite, with a flag recording whether anything changed.
#[derive(Debug, Clone, PartialEq)]
pub struct Transformed<T> {
    /// The (potentially rewritten) value.
    pub data: T,
    /// Whether the value was actually changed.
    pub changed: bool,
}

impl<T> Transformed<T> {
    /// Create a new result.
    pub fn new(data: T, changed: bool) -> Self {
        Self { data, changed }
    }

    /// A result recording a change.
    pub fn yes(data: T) -> Self {
        Self::new(data, true)
    }

    /// A result recording no change.
    pub fn no(data: T) -> Self {
        Self::new(data, false)
    }

    /// Map the value, keeping the change flag.
    pub fn map_data<U, F: FnOnce(T) -> U>(self, f: F) -> Transformed<U> {
        Transformed::new(f(self.data), self.changed)
    }

    /// Continue with a further rewrite, accumulating the change flag.
    pub fn and_then<F>(self, f: F) -> TesseraResult<Self>
    where
        F: FnOnce(T) -> TesseraResult<Self>,
    {
        let next = f(self.data)?;
        Ok(Self::new(next.data, self.changed || next.changed))
    }
}

type PlanRewrite = TesseraResult<Transformed<Arc<Plan>>>;

impl Plan {
    /// Rewrite the tree bottom-up: `f` sees each node after its children
    /// have been rewritten.
    pub fn transform_up<F>(self: Arc<Self>, f: &mut F) -> PlanRewrite
    where
        F: FnMut(Arc<Self>) -> PlanRewrite,
    {
        self.map_children(|child| child.transform_up(f))?
            .and_then(|node| f(node))
    }

    /// Rewrite the tree top-down: `f` sees each node before its children,
    /// and traversal continues into the children of whatever `f` returns.
    pub fn transform_down<F>(self: Arc<Self>, f: &mut F) -> PlanRewrite
    where
        F: FnMut(Arc<Self>) -> PlanRewrite,
    {
        f(self)?.and_then(|node| node.map_children(|child| child.transform_down(f)))
    }

    /// Apply `f` to each direct child, rebuilding this node only if some
    /// child changed.
    pub fn map_children<F>(self: Arc<Self>, mut f: F) -> PlanRewrite
    where
        F: FnMut(Arc<Self>) -> PlanRewrite,
    {
        let children = self.children();
        if children.is_empty() {
            return Ok(Transformed::no(self));
        }

        let mut changed = false;
        let mut rewritten = Vec::with_capacity(children.len());
        for child in children {
            let result = f(Arc::clone(child))?;
            changed |= result.changed;
            rewritten.push(result.data);
        }

        if changed {
            Ok(Transformed::yes(Arc::new(self.with_new_children(rewritten)?)))
        } else {
            Ok(Transformed::no(self))
        }
    }

    /// Apply `f` to each expression owned by this node, rebuilding the node
    /// only if some expression changed. Children are not visited.
    pub fn map_expressions<F>(self: Arc<Self>, mut f: F) -> PlanRewrite
    where
        F: FnMut(Expr) -> TesseraResult<Transformed<Expr>>,
    {
        let rewritten = match self.as_ref() {
            Self::Project { projections, input } => {
                map_all(projections, &mut f)?.map_data(|projections| Self::Project {
                    projections,
                    input: Arc::clone(input),
                })
            }
            Self::Filter { predicate, input } => {
                f(predicate.clone())?.map_data(|predicate| Self::Filter {
                    predicate,
                    input: Arc::clone(input),
                })
            }
            Self::GroupBy {
                aggregates,
                grouping,
                input,
            } => {
                let aggregates = map_all(aggregates, &mut f)?;
                let grouping = map_all(grouping, &mut f)?;
                Transformed::new(
                    Self::GroupBy {
                        aggregates: aggregates.data,
                        grouping: grouping.data,
                        input: Arc::clone(input),
                    },
                    aggregates.changed || grouping.changed,
                )
            }
            Self::InnerJoin {
                left,
                right,
                condition,
            } => f(condition.clone())?.map_data(|condition| Self::InnerJoin {
                left: Arc::clone(left),
                right: Arc::clone(right),
                condition,
            }),
            _ => return Ok(Transformed::no(self)),
        };

        if rewritten.changed {
            Ok(Transformed::yes(Arc::new(rewritten.data)))
        } else {
            Ok(Transformed::no(self))
        }
    }

    /// Rewrite every expression owned by this node bottom-up with `f`.
    pub fn transform_expressions_up<F>(self: Arc<Self>, f: &mut F) -> PlanRewrite
    where
        F: FnMut(Expr) -> TesseraResult<Transformed<Expr>>,
    {
        self.map_expressions(|expr| expr.transform_up(f))
    }
}

fn map_all<F>(exprs: &[Expr], f: &mut F) -> TesseraResult<Transformed<Vec<Expr>>>
where
    F: FnMut(Expr) -> TesseraResult<Transformed<Expr>>,
{
    let mut changed = false;
    let mut out = Vec::with_capacity(exprs.len());
    for expr in exprs {
        let result = f(expr.clone())?;
        changed |= result.changed;
        out.push(result.data);
    }
    Ok(Transformed::new(out, changed))
}

#[cfg(test)]
mod tests {
    use tessera_core::DataType;

    use super::*;
    use crate::expr::{col, lit};
    use crate::plan::PlanBuilder;
    use crate::plan::test_utils::table;

    fn sample() -> Arc<Plan> {
        let left = PlanBuilder::resolved(table("a", &[("x", DataType::Int32)]));
        let right = PlanBuilder::resolved(table("b", &[("y", DataType::Int32)]));
        left.cross_join(right)
            .filter(col("x").eq(lit(1)))
            .limit(5)
            .build()
    }

    #[test]
    fn test_noop_transform_shares_tree() {
        let plan = sample();
        let result = Arc::clone(&plan)
            .transform_up(&mut |node| Ok(Transformed::no(node)))
            .unwrap();

        assert!(!result.changed);
        assert!(Arc::ptr_eq(&plan, &result.data));
    }

    #[test]
    fn test_transform_up_visits_children_first() {
        let mut order = Vec::new();
        sample()
            .transform_up(&mut |node| {
                order.push(node.name());
                Ok(Transformed::no(node))
            })
            .unwrap();

        assert_eq!(
            order,
            vec!["ResolvedTable", "ResolvedTable", "CrossJoin", "Filter", "Limit"]
        );
    }

    #[test]
    fn test_transform_down_visits_parents_first() {
        let mut order = Vec::new();
        sample()
            .transform_down(&mut |node| {
                order.push(node.name());
                Ok(Transformed::no(node))
            })
            .unwrap();

        assert_eq!(
            order,
            vec!["Limit", "Filter", "CrossJoin", "ResolvedTable", "ResolvedTable"]
        );
    }

    #[test]
    fn test_rewrite_shares_unchanged_subtrees() {
        let plan = sample();
        let Plan::Limit { input: filter, .. } = plan.as_ref() else {
            panic!("expected limit");
        };
        let Plan::Filter { input: join, .. } = filter.as_ref() else {
            panic!("expected filter");
        };

        let result = Arc::clone(&plan)
            .transform_up(&mut |node| match node.as_ref() {
                Plan::Limit { input, .. } => Ok(Transformed::yes(Arc::new(Plan::Limit {
                    limit: 10,
                    input: Arc::clone(input),
                }))),
                _ => Ok(Transformed::no(node)),
            })
            .unwrap();

        assert!(result.changed);
        let Plan::Limit { limit, input } = result.data.as_ref() else {
            panic!("expected limit");
        };
        assert_eq!(*limit, 10);
        assert!(Arc::ptr_eq(input, filter));
        assert!(Arc::ptr_eq(input.children()[0], join));
    }

    #[test]
    fn test_transform_expressions() {
        let plan = sample();
        let Plan::Limit { input: filter, .. } = plan.as_ref() else {
            panic!("expected limit");
        };

        let result = Arc::clone(filter)
            .transform_expressions_up(&mut |expr| match expr {
                Expr::Literal(_) => Ok(Transformed::yes(lit(2))),
                other => Ok(Transformed::no(other)),
            })
            .unwrap();

        assert!(result.changed);
        let Plan::Filter { predicate, .. } = result.data.as_ref() else {
            panic!("expected filter");
        };
        assert_eq!(predicate, &col("x").eq(lit(2)));
    }
}
