//! Per-call session context.

/// Session state an analysis runs under.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Context {
    current_database: String,
}

impl Context {
    /// A context with no current database selected.
    pub fn new() -> Self {
        Self::default()
    }

    /// Select the database unqualified table names resolve in.
    pub fn with_current_database(mut self, database: impl Into<String>) -> Self {
        self.current_database = database.into();
        self
    }

    /// The database unqualified table names resolve in.
    pub fn current_database(&self) -> &str {
        &self.current_database
    }
}
