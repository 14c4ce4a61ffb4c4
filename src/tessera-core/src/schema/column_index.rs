//! Positional lookup of `(table, column)` pairs.

use std::collections::HashMap;

use super::Schema;

/// Immutable map from `(source, name)` to schema position.
///
/// Built once from a schema and passed by reference to whatever needs to
/// re-derive column positions. Keys are compared ignoring ASCII case; when a
/// pair occurs more than once the first position wins.
#[derive(Debug, Clone, Default)]
pub struct ColumnIndex {
    positions: HashMap<(String, String), usize>,
    len: usize,
}

impl ColumnIndex {
    /// Index every column of `schema`.
    pub fn new(schema: &Schema) -> Self {
        let mut positions = HashMap::with_capacity(schema.len());
        for (i, col) in schema.iter().enumerate() {
            positions
                .entry((col.source.to_ascii_lowercase(), col.name.to_ascii_lowercase()))
                .or_insert(i);
        }
        Self {
            positions,
            len: schema.len(),
        }
    }

    /// Position of `name` from `source`.
    pub fn get(&self, source: &str, name: &str) -> Option<usize> {
        self.positions
            .get(&(source.to_ascii_lowercase(), name.to_ascii_lowercase()))
            .copied()
    }

    /// Number of columns in the indexed schema.
    pub fn len(&self) -> usize {
        self.len
    }

    /// Check if the indexed schema was empty.
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }
}

impl From<&Schema> for ColumnIndex {
    fn from(schema: &Schema) -> Self {
        Self::new(schema)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::Column;
    use crate::types::DataType;

    #[test]
    fn test_lookup() {
        let schema = Schema::new(vec![
            Column::new("i", "a", DataType::Int32),
            Column::new("i", "b", DataType::Int32),
            Column::new("i", "a", DataType::Int32),
        ]);
        let index = ColumnIndex::new(&schema);

        assert_eq!(index.get("A", "I"), Some(0));
        assert_eq!(index.get("b", "i"), Some(1));
        assert_eq!(index.get("c", "i"), None);
        assert_eq!(index.len(), 3);
    }
}
