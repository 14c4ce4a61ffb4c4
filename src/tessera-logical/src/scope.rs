//! Enclosing query contexts for correlated column resolution.

use common_error::TesseraResult;
use tessera_core::{Column, ColumnRef, Schema};

/// A chain of enclosing query schemas, innermost first.
///
/// When a column reference is not satisfied by a node's own input, it is
/// looked up in each level in turn. The row visible to a correlated
/// expression is the node's input row followed by every level's row, so a
/// match in a level is offset by the widths of the input and all inner
/// levels.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Scope {
    levels: Vec<Schema>,
}

impl Scope {
    /// An empty scope, as used for top-level queries.
    pub fn new() -> Self {
        Self::default()
    }

    /// A scope with `schema` as its new innermost level.
    #[must_use]
    pub fn push(&self, schema: Schema) -> Self {
        let mut levels = Vec::with_capacity(self.levels.len() + 1);
        levels.push(schema);
        levels.extend(self.levels.iter().cloned());
        Self { levels }
    }

    /// Levels, innermost first.
    pub fn levels(&self) -> &[Schema] {
        &self.levels
    }

    /// Check if there are no enclosing queries.
    pub fn is_empty(&self) -> bool {
        self.levels.is_empty()
    }

    /// Number of enclosing queries.
    pub fn depth(&self) -> usize {
        self.levels.len()
    }

    /// Resolve `column` in the enclosing levels.
    ///
    /// `input_len` is the width of the resolving node's own input row. The
    /// first level with a match wins; more than one match within that level
    /// is ambiguous.
    pub fn resolve(
        &self,
        column: &ColumnRef,
        input_len: usize,
    ) -> TesseraResult<Option<(usize, &Column)>> {
        let mut offset = input_len;
        for level in &self.levels {
            if let Some(pos) = column.resolve(level)? {
                return Ok(level.column(pos).map(|c| (offset + pos, c)));
            }
            offset += level.len();
        }
        Ok(None)
    }
}

#[cfg(test)]
mod tests {
    use common_error::TesseraError;
    use tessera_core::DataType;

    use super::*;

    fn schema(table: &str, names: &[&str]) -> Schema {
        names
            .iter()
            .map(|n| Column::new(*n, table, DataType::Int64))
            .collect()
    }

    #[test]
    fn test_push_is_innermost_first() {
        let scope = Scope::new()
            .push(schema("outer", &["a"]))
            .push(schema("inner", &["b"]));

        assert_eq!(scope.depth(), 2);
        assert_eq!(scope.levels()[0].columns()[0].source, "inner");
    }

    #[test]
    fn test_resolve_offsets() {
        let scope = Scope::new()
            .push(schema("outer", &["a", "b", "c"]))
            .push(schema("inner", &["x", "y"]));

        // input row (4) + inner level (2) + position in outer (1)
        let (index, column) = scope.resolve(&ColumnRef::new("b"), 4).unwrap().unwrap();
        assert_eq!(index, 7);
        assert_eq!(column.source, "outer");

        let (index, _) = scope.resolve(&ColumnRef::new("y"), 4).unwrap().unwrap();
        assert_eq!(index, 5);

        assert!(scope.resolve(&ColumnRef::new("z"), 4).unwrap().is_none());
    }

    #[test]
    fn test_inner_level_shadows_outer() {
        let scope = Scope::new()
            .push(schema("outer", &["a"]))
            .push(schema("inner", &["a"]));

        let (index, column) = scope.resolve(&ColumnRef::new("a"), 0).unwrap().unwrap();
        assert_eq!(index, 0);
        assert_eq!(column.source, "inner");
    }

    #[test]
    fn test_ambiguous_within_level() {
        let level = schema("t1", &["a"]).concat(&schema("t2", &["a"]));
        let scope = Scope::new().push(level);

        let err = scope.resolve(&ColumnRef::new("a"), 0).unwrap_err();
        assert!(matches!(err, TesseraError::AmbiguousColumn { .. }));
    }
}
