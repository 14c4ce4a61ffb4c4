//! Tree display utilities for query plans.

use std::fmt;

/// A node that can be rendered by [`DisplayTree`].
pub trait TreeNode {
    /// Short name of this node, e.g. `Project`.
    fn name(&self) -> String;

    /// Child nodes, in display order.
    fn children(&self) -> Vec<&dyn TreeNode>;

    /// Extra details rendered in parentheses after the name.
    fn details(&self) -> Option<String> {
        None
    }
}

/// Renders a [`TreeNode`] hierarchy with box-drawing connectors:
///
/// ```text
/// Project(mytable.i)
///  └─ ResolvedTable(mytable)
/// ```
pub struct DisplayTree<'a> {
    root: &'a dyn TreeNode,
}

impl<'a> DisplayTree<'a> {
    /// Create a new display tree.
    pub fn new(root: &'a dyn TreeNode) -> Self {
        Self { root }
    }

    fn header(node: &dyn TreeNode) -> String {
        match node.details() {
            Some(details) => format!("{}({details})", node.name()),
            None => node.name(),
        }
    }

    fn fmt_children(f: &mut fmt::Formatter<'_>, node: &dyn TreeNode, prefix: &str) -> fmt::Result {
        let children = node.children();
        let count = children.len();

        for (i, child) in children.into_iter().enumerate() {
            let last = i + 1 == count;
            let connector = if last { " └─ " } else { " ├─ " };
            writeln!(f, "{prefix}{connector}{}", Self::header(child))?;

            let child_prefix = format!("{prefix}{}", if last { "    " } else { " │  " });
            Self::fmt_children(f, child, &child_prefix)?;
        }

        Ok(())
    }
}

impl fmt::Display for DisplayTree<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "{}", Self::header(self.root))?;
        Self::fmt_children(f, self.root, "")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct TestNode {
        name: &'static str,
        details: Option<&'static str>,
        children: Vec<TestNode>,
    }

    impl TestNode {
        fn leaf(name: &'static str) -> Self {
            Self {
                name,
                details: None,
                children: vec![],
            }
        }
    }

    impl TreeNode for TestNode {
        fn name(&self) -> String {
            self.name.to_string()
        }

        fn children(&self) -> Vec<&dyn TreeNode> {
            self.children.iter().map(|c| c as &dyn TreeNode).collect()
        }

        fn details(&self) -> Option<String> {
            self.details.map(str::to_string)
        }
    }

    #[test]
    fn test_display_tree() {
        let tree = TestNode {
            name: "Join",
            details: Some("a.i = b.i"),
            children: vec![
                TestNode {
                    name: "Filter",
                    details: None,
                    children: vec![TestNode::leaf("A")],
                },
                TestNode::leaf("B"),
            ],
        };

        let expected = "\
Join(a.i = b.i)
 ├─ Filter
 │   └─ A
 └─ B
";
        assert_eq!(DisplayTree::new(&tree).to_string(), expected);
    }

    #[test]
    fn test_single_node() {
        assert_eq!(DisplayTree::new(&TestNode::leaf("T")).to_string(), "T\n");
    }
}
