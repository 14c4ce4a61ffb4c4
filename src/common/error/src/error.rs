//! Core error types for Tessera.

use thiserror::Error;

/// Result type alias using `TesseraError`.
pub type TesseraResult<T> = std::result::Result<T, TesseraError>;

/// Generic boxed error for external error sources.
pub type GenericError = Box<dyn std::error::Error + Send + Sync>;

/// Core error type for analysis operations.
///
/// All variants are terminal for the analyze call that produced them.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum TesseraError {
    /// Table does not exist in the active database.
    #[error("TableNotFound: table not found: {0}")]
    TableNotFound(String),

    /// Database is not registered in the catalog.
    #[error("DatabaseNotFound: database not found: {0}")]
    DatabaseNotFound(String),

    /// Column reference matched nothing in the child schema or any enclosing scope.
    #[error("ColumnNotFound: {}", display_column(.table.as_deref(), .name))]
    ColumnNotFound {
        /// Column name as written.
        name: String,
        /// Qualifier, if the reference was qualified.
        table: Option<String>,
    },

    /// Unqualified column reference matched more than one column.
    #[error("AmbiguousColumn: column \"{name}\" could refer to {}", .tables.join(", "))]
    AmbiguousColumn {
        /// Column name as written.
        name: String,
        /// Source tables of the candidate columns.
        tables: Vec<String>,
    },

    /// A user-supplied rule returned an error that is not a `TesseraError`.
    #[error("RuleFailed: rule '{rule}' failed: {source}")]
    RuleFailed {
        /// Name of the failing rule.
        rule: String,
        /// The error the rule produced.
        #[source]
        source: GenericError,
    },

    /// The analyzed plan still contains unresolved nodes.
    #[error("PlanNotResolved: {0}")]
    PlanNotResolved(String),

    /// Plan is resolved but semantically invalid.
    #[error("ValidationError: {0}")]
    ValidationError(String),

    /// Invalid parameter provided.
    #[error("InvalidParameter: {0}")]
    InvalidParameter(String),

    /// Internal error (bug in Tessera).
    #[error("InternalError: {0}")]
    InternalError(String),

    /// JSON serialization error.
    #[error("SerdeJsonError: {0}")]
    SerdeJsonError(#[from] serde_json::Error),
}

fn display_column(table: Option<&str>, name: &str) -> String {
    match table {
        Some(table) => format!("column not found: {table}.{name}"),
        None => format!("column not found: {name}"),
    }
}

impl TesseraError {
    /// Create a new `TableNotFound` error.
    pub fn table_not_found<S: Into<String>>(name: S) -> Self {
        Self::TableNotFound(name.into())
    }

    /// Create a new `DatabaseNotFound` error.
    pub fn database_not_found<S: Into<String>>(name: S) -> Self {
        Self::DatabaseNotFound(name.into())
    }

    /// Create a new `ColumnNotFound` error.
    pub fn column_not_found<S: Into<String>>(table: Option<&str>, name: S) -> Self {
        Self::ColumnNotFound {
            name: name.into(),
            table: table.map(str::to_string),
        }
    }

    /// Create a new `AmbiguousColumn` error.
    pub fn ambiguous_column<S: Into<String>>(name: S, tables: Vec<String>) -> Self {
        Self::AmbiguousColumn {
            name: name.into(),
            tables,
        }
    }

    /// Wrap an error produced by a user-supplied rule.
    ///
    /// An error that already is a `TesseraError` is returned unchanged.
    pub fn rule_failed<S: Into<String>>(rule: S, source: GenericError) -> Self {
        match source.downcast::<Self>() {
            Ok(err) => *err,
            Err(source) => Self::RuleFailed {
                rule: rule.into(),
                source,
            },
        }
    }

    /// Create a new `PlanNotResolved` error.
    pub fn not_resolved<S: Into<String>>(msg: S) -> Self {
        Self::PlanNotResolved(msg.into())
    }

    /// Create a new `ValidationError`.
    pub fn validation<S: Into<String>>(msg: S) -> Self {
        Self::ValidationError(msg.into())
    }

    /// Create a new `InternalError`.
    pub fn internal<S: Into<String>>(msg: S) -> Self {
        Self::InternalError(msg.into())
    }
}

/// Ensure a condition holds, returning an `InternalError` if not.
#[macro_export]
macro_rules! ensure {
    ($cond:expr, $msg:expr) => {
        if !$cond {
            return Err($crate::TesseraError::InternalError($msg.to_string()));
        }
    };
    ($cond:expr, $variant:ident: $($msg:tt)*) => {
        if !$cond {
            return Err($crate::TesseraError::$variant(format!($($msg)*)));
        }
    };
}

/// Return early with an `InternalError`.
#[macro_export]
macro_rules! internal_err {
    ($($arg:tt)*) => {
        return Err($crate::TesseraError::InternalError(format!($($arg)*)))
    };
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug)]
    struct Boom;

    impl std::fmt::Display for Boom {
        fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
            write!(f, "boom")
        }
    }

    impl std::error::Error for Boom {}

    #[test]
    fn test_error_display() {
        let err = TesseraError::table_not_found("nonexistant");
        assert_eq!(err.to_string(), "TableNotFound: table not found: nonexistant");

        let err = TesseraError::column_not_found(Some("mytable"), "o");
        assert_eq!(err.to_string(), "ColumnNotFound: column not found: mytable.o");

        let err = TesseraError::ambiguous_column("i", vec!["a".into(), "b".into()]);
        assert_eq!(
            err.to_string(),
            "AmbiguousColumn: column \"i\" could refer to a, b"
        );
    }

    #[test]
    fn test_rule_failed_wraps_foreign_errors() {
        let err = TesseraError::rule_failed("custom", Box::new(Boom));
        assert!(matches!(err, TesseraError::RuleFailed { ref rule, .. } if rule == "custom"));
        assert_eq!(err.to_string(), "RuleFailed: rule 'custom' failed: boom");
        assert!(std::error::Error::source(&err).is_some());
    }

    #[test]
    fn test_rule_failed_keeps_tessera_errors() {
        let source: GenericError = Box::new(TesseraError::table_not_found("t"));
        let err = TesseraError::rule_failed("custom", source);
        assert!(matches!(err, TesseraError::TableNotFound(ref t) if t == "t"));
    }

    #[test]
    fn test_ensure_macro() {
        fn check(flag: bool) -> TesseraResult<()> {
            ensure!(flag, ValidationError: "flag was {}", flag);
            Ok(())
        }

        assert!(check(true).is_ok());
        assert!(matches!(check(false), Err(TesseraError::ValidationError(_))));
    }

    #[test]
    fn test_internal_err_macro() {
        fn fail(what: &str) -> TesseraResult<()> {
            internal_err!("lost {what}");
        }

        assert!(matches!(fail("x"), Err(TesseraError::InternalError(ref m)) if m == "lost x"));
    }
}
