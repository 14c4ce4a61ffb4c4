//! Ordered column descriptors.

use serde::{Deserialize, Serialize};

use crate::types::DataType;

/// A column descriptor: `(name, source table, type, nullable)`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Column {
    /// Column name.
    pub name: String,
    /// Name of the table (or alias) the column comes from.
    pub source: String,
    /// Data type.
    pub data_type: DataType,
    /// Whether this column can contain nulls.
    pub nullable: bool,
}

impl Column {
    /// Create a new nullable column.
    pub fn new(name: impl Into<String>, source: impl Into<String>, data_type: DataType) -> Self {
        Self {
            name: name.into(),
            source: source.into(),
            data_type,
            nullable: true,
        }
    }

    /// Set nullable for this column.
    pub fn with_nullable(mut self, nullable: bool) -> Self {
        self.nullable = nullable;
        self
    }

    /// Set the source table for this column.
    pub fn with_source(mut self, source: impl Into<String>) -> Self {
        self.source = source.into();
        self
    }

    /// `source.name`, or just `name` for columns without a source.
    pub fn qualified_name(&self) -> String {
        if self.source.is_empty() {
            self.name.clone()
        } else {
            format!("{}.{}", self.source, self.name)
        }
    }

    /// Check whether this column is `name` from `source`, ignoring ASCII case.
    pub fn matches(&self, source: &str, name: &str) -> bool {
        self.source.eq_ignore_ascii_case(source) && self.name.eq_ignore_ascii_case(name)
    }
}

/// An ordered sequence of column descriptors.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Schema {
    columns: Vec<Column>,
}

impl Schema {
    /// Create a schema with the given columns.
    pub fn new(columns: Vec<Column>) -> Self {
        Self { columns }
    }

    /// Create an empty schema.
    pub fn empty() -> Self {
        Self::default()
    }

    /// Columns in order.
    pub fn columns(&self) -> &[Column] {
        &self.columns
    }

    /// Column at `index`.
    pub fn column(&self, index: usize) -> Option<&Column> {
        self.columns.get(index)
    }

    /// Iterate over columns in order.
    pub fn iter(&self) -> std::slice::Iter<'_, Column> {
        self.columns.iter()
    }

    /// Check if the schema is empty.
    pub fn is_empty(&self) -> bool {
        self.columns.is_empty()
    }

    /// Get the number of columns.
    pub fn len(&self) -> usize {
        self.columns.len()
    }

    /// Get all column names.
    pub fn column_names(&self) -> Vec<&str> {
        self.columns.iter().map(|c| c.name.as_str()).collect()
    }

    /// Position of the first column named `name` from `source`.
    pub fn index_of(&self, source: &str, name: &str) -> Option<usize> {
        self.columns.iter().position(|c| c.matches(source, name))
    }

    /// Check whether any column comes from `source`.
    pub fn has_source(&self, source: &str) -> bool {
        self.columns
            .iter()
            .any(|c| c.source.eq_ignore_ascii_case(source))
    }

    /// This schema followed by `other`, as produced by a join.
    pub fn concat(&self, other: &Self) -> Self {
        let mut columns = Vec::with_capacity(self.len() + other.len());
        columns.extend(self.columns.iter().cloned());
        columns.extend(other.columns.iter().cloned());
        Self { columns }
    }

    /// The same columns, all re-labelled as coming from `source`.
    pub fn with_source(&self, source: &str) -> Self {
        Self {
            columns: self
                .columns
                .iter()
                .map(|c| c.clone().with_source(source))
                .collect(),
        }
    }

    /// The named columns, in the order given. Unknown names are skipped.
    pub fn project<S: AsRef<str>>(&self, names: &[S]) -> Self {
        let columns = names
            .iter()
            .filter_map(|n| {
                self.columns
                    .iter()
                    .find(|c| c.name.eq_ignore_ascii_case(n.as_ref()))
                    .cloned()
            })
            .collect();
        Self { columns }
    }
}

impl FromIterator<Column> for Schema {
    fn from_iter<I: IntoIterator<Item = Column>>(iter: I) -> Self {
        Self {
            columns: iter.into_iter().collect(),
        }
    }
}

impl<'a> IntoIterator for &'a Schema {
    type Item = &'a Column;
    type IntoIter = std::slice::Iter<'a, Column>;

    fn into_iter(self) -> Self::IntoIter {
        self.columns.iter()
    }
}

impl std::fmt::Display for Schema {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "Schema {{")?;
        for col in &self.columns {
            writeln!(
                f,
                "  {}: {}{}",
                col.qualified_name(),
                col.data_type,
                if col.nullable { " (nullable)" } else { "" }
            )?;
        }
        write!(f, "}}")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn mytable() -> Schema {
        Schema::new(vec![
            Column::new("i", "mytable", DataType::Int32).with_nullable(false),
            Column::new("f", "mytable", DataType::Float64),
            Column::new("t", "mytable", DataType::Text),
        ])
    }

    #[test]
    fn test_schema_creation() {
        let schema = mytable();

        assert_eq!(schema.len(), 3);
        assert_eq!(schema.column_names(), vec!["i", "f", "t"]);
        assert!(!schema.columns()[0].nullable);
        assert_eq!(schema.columns()[2].qualified_name(), "mytable.t");
    }

    #[test]
    fn test_index_of_ignores_case() {
        let schema = mytable();

        assert_eq!(schema.index_of("MyTable", "T"), Some(2));
        assert_eq!(schema.index_of("other", "t"), None);
        assert!(schema.has_source("MYTABLE"));
    }

    #[test]
    fn test_concat_keeps_order() {
        let other = Schema::new(vec![Column::new("i2", "mytable2", DataType::Int64)]);
        let joined = mytable().concat(&other);

        assert_eq!(joined.column_names(), vec!["i", "f", "t", "i2"]);
        assert_eq!(joined.index_of("mytable2", "i2"), Some(3));
    }

    #[test]
    fn test_schema_projection() {
        let projected = mytable().project(&["t", "i"]);

        assert_eq!(projected.column_names(), vec!["t", "i"]);
        assert_eq!(projected.columns()[1].data_type, DataType::Int32);
    }

    #[test]
    fn test_with_source() {
        let aliased = mytable().with_source("a");

        assert!(aliased.iter().all(|c| c.source == "a"));
        assert_eq!(aliased.column_names(), mytable().column_names());
    }
}
