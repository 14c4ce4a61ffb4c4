//! Database and table registries.

use std::collections::HashMap;
use std::sync::{Arc, RwLock};

use common_error::{TesseraError, TesseraResult};
use log::debug;
use tessera_logical::Table;

/// A named set of tables. Names are compared ignoring ASCII case.
#[derive(Debug)]
pub struct Database {
    name: String,
    tables: RwLock<HashMap<String, Arc<dyn Table>>>,
}

impl Database {
    /// Create an empty database.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            tables: RwLock::new(HashMap::new()),
        }
    }

    /// Database name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Register `table` under its own name, replacing any previous table
    /// with that name.
    pub fn add_table(&self, table: Arc<dyn Table>) {
        debug!("Registering table '{}' in database '{}'", table.name(), self.name);
        self.tables
            .write()
            .expect("table registry lock poisoned")
            .insert(table.name().to_ascii_lowercase(), table);
    }

    /// Look up a table.
    ///
    /// Fails with `TableNotFound` if no table has that name.
    pub fn table(&self, name: &str) -> TesseraResult<Arc<dyn Table>> {
        self.tables
            .read()
            .expect("table registry lock poisoned")
            .get(&name.to_ascii_lowercase())
            .cloned()
            .ok_or_else(|| TesseraError::table_not_found(name))
    }

    /// Registered table names, sorted.
    pub fn table_names(&self) -> Vec<String> {
        let mut names: Vec<String> = self
            .tables
            .read()
            .expect("table registry lock poisoned")
            .values()
            .map(|t| t.name().to_string())
            .collect();
        names.sort();
        names
    }
}

/// The set of databases known to the analyzer.
#[derive(Debug, Default)]
pub struct Catalog {
    databases: RwLock<HashMap<String, Arc<Database>>>,
}

impl Catalog {
    /// Create a new empty catalog.
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a database, replacing any previous database with that name.
    pub fn add_database(&self, database: Database) -> Arc<Database> {
        debug!("Registering database '{}'", database.name());
        let database = Arc::new(database);
        self.databases
            .write()
            .expect("database registry lock poisoned")
            .insert(database.name().to_ascii_lowercase(), Arc::clone(&database));
        database
    }

    /// Look up a database.
    ///
    /// Fails with `DatabaseNotFound` if no database has that name.
    pub fn database(&self, name: &str) -> TesseraResult<Arc<Database>> {
        self.databases
            .read()
            .expect("database registry lock poisoned")
            .get(&name.to_ascii_lowercase())
            .cloned()
            .ok_or_else(|| TesseraError::database_not_found(name))
    }

    /// Look up `table` in `database`.
    pub fn table(&self, database: &str, table: &str) -> TesseraResult<Arc<dyn Table>> {
        self.database(database)?.table(table)
    }

    /// Registered database names, sorted.
    pub fn database_names(&self) -> Vec<String> {
        let mut names: Vec<String> = self
            .databases
            .read()
            .expect("database registry lock poisoned")
            .values()
            .map(|db| db.name().to_string())
            .collect();
        names.sort();
        names
    }
}

#[cfg(test)]
mod tests {
    use std::thread;

    use tessera_core::{Column, DataType, Schema};

    use super::*;
    use crate::MemoryTable;

    fn mytable() -> Arc<dyn Table> {
        Arc::new(MemoryTable::new(
            "mytable",
            Schema::new(vec![Column::new("i", "mytable", DataType::Int32)]),
        ))
    }

    #[test]
    fn test_catalog_operations() {
        let catalog = Catalog::new();
        let db = catalog.add_database(Database::new("mydb"));
        db.add_table(mytable());

        assert_eq!(catalog.database_names(), vec!["mydb"]);
        assert_eq!(db.table_names(), vec!["mytable"]);
        assert_eq!(catalog.table("MYDB", "MyTable").unwrap().name(), "mytable");
    }

    #[test]
    fn test_missing_names() {
        let catalog = Catalog::new();
        catalog.add_database(Database::new("mydb"));

        let err = catalog.database("nope").unwrap_err();
        assert!(matches!(err, TesseraError::DatabaseNotFound(ref n) if n == "nope"));

        let err = catalog.table("mydb", "nonexistant").unwrap_err();
        assert!(matches!(err, TesseraError::TableNotFound(ref n) if n == "nonexistant"));
    }

    #[test]
    fn test_concurrent_lookups() {
        let catalog = Arc::new(Catalog::new());
        catalog.add_database(Database::new("mydb")).add_table(mytable());

        let handles: Vec<_> = (0..4)
            .map(|_| {
                let catalog = Arc::clone(&catalog);
                thread::spawn(move || catalog.table("mydb", "mytable").is_ok())
            })
            .collect();

        for handle in handles {
            assert!(handle.join().unwrap());
        }
    }
}
