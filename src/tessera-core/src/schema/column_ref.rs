//! Column reference resolution.

use serde::{Deserialize, Serialize};

use common_error::{TesseraError, TesseraResult};

use super::Schema;

/// Reference to a column as written in a query, possibly qualified by table.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ColumnRef {
    /// Optional table qualifier.
    pub qualifier: Option<String>,
    /// Column name.
    pub name: String,
}

impl ColumnRef {
    /// Create a new column reference.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            qualifier: None,
            name: name.into(),
        }
    }

    /// Create a new qualified column reference.
    pub fn qualified(qualifier: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            qualifier: Some(qualifier.into()),
            name: name.into(),
        }
    }

    fn matches(&self, column: &super::Column) -> bool {
        column.name.eq_ignore_ascii_case(&self.name)
            && self
                .qualifier
                .as_deref()
                .is_none_or(|q| column.source.eq_ignore_ascii_case(q))
    }

    /// Resolve this reference against a schema.
    ///
    /// Returns `Ok(None)` when nothing matches so callers can continue with
    /// an enclosing scope, and `AmbiguousColumn` listing each candidate
    /// table once, in name order, when more than one column matches.
    pub fn resolve(&self, schema: &Schema) -> TesseraResult<Option<usize>> {
        let matches: Vec<usize> = schema
            .iter()
            .enumerate()
            .filter(|(_, col)| self.matches(col))
            .map(|(i, _)| i)
            .collect();

        match matches.as_slice() {
            [] => Ok(None),
            [index] => Ok(Some(*index)),
            _ => {
                let mut tables: Vec<String> = matches
                    .iter()
                    .filter_map(|&i| schema.column(i))
                    .map(|c| c.source.clone())
                    .collect();
                tables.sort_unstable();
                tables.dedup();
                Err(TesseraError::ambiguous_column(&self.name, tables))
            }
        }
    }

    /// The error reported when this reference resolves nowhere.
    pub fn not_found(&self) -> TesseraError {
        TesseraError::column_not_found(self.qualifier.as_deref(), &self.name)
    }
}

impl std::fmt::Display for ColumnRef {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match &self.qualifier {
            Some(q) => write!(f, "{q}.{}", self.name),
            None => write!(f, "{}", self.name),
        }
    }
}
