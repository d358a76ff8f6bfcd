//! Implements a SQLite backed catalog store.

use std::sync::{Arc, Mutex};

use rusqlite::{Connection, Row};
use time::UtcOffset;

use crate::{
    Error,
    catalog::core::{CatalogEntry, CatalogKind, CatalogName, CatalogStore, NewCatalogEntry},
};

/// Create the tables for every [CatalogKind].
///
/// # Errors
///
/// This function will return an error if the SQL query failed.
pub fn create_catalog_tables(connection: &Connection) -> Result<(), rusqlite::Error> {
    for kind in [CatalogKind::Category, CatalogKind::PaymentMethod] {
        connection.execute(
            &format!(
                "CREATE TABLE IF NOT EXISTS {} (
                    id INTEGER PRIMARY KEY,
                    name TEXT NOT NULL UNIQUE,
                    label TEXT,
                    is_active INTEGER NOT NULL DEFAULT 1,
                    created_at TEXT NOT NULL
                )",
                kind.table()
            ),
            (),
        )?;
    }

    Ok(())
}

/// Creates and retrieves catalog entries of one kind to/from a SQLite database.
#[derive(Debug, Clone)]
pub struct SQLiteCatalogStore {
    connection: Arc<Mutex<Connection>>,
    kind: CatalogKind,
}

impl SQLiteCatalogStore {
    /// Create a new catalog store for entries of `kind`.
    pub fn new(connection: Arc<Mutex<Connection>>, kind: CatalogKind) -> Self {
        Self { connection, kind }
    }
}

impl CatalogStore for SQLiteCatalogStore {
    fn kind(&self) -> CatalogKind {
        self.kind
    }

    /// Insert an entry into the database.
    ///
    /// # Errors
    /// This function will return an error if there is an SQL error, including
    /// when the name is already taken.
    fn create(&self, entry: NewCatalogEntry) -> Result<CatalogEntry, Error> {
        let created_at = entry.created_at.to_offset(UtcOffset::UTC);

        let id = self
            .connection
            .lock()
            .map_err(|_| Error::DatabaseLockError)?
            .prepare(&format!(
                "INSERT INTO {} (name, label, is_active, created_at)
                VALUES (?1, ?2, ?3, ?4)
                RETURNING id",
                self.kind.table()
            ))?
            .query_row(
                (
                    entry.name.as_ref(),
                    entry.label.as_deref(),
                    entry.is_active,
                    created_at,
                ),
                |row| row.get(0),
            )?;

        Ok(CatalogEntry {
            id,
            name: entry.name,
            label: entry.label,
            is_active: entry.is_active,
            created_at,
        })
    }

    /// Retrieve the entry named `name`.
    ///
    /// # Errors
    /// This function will return an [Error::NotFound] if there is no such
    /// entry or an [Error::SqlError] if there is an SQL error.
    fn get_by_name(&self, name: &str) -> Result<CatalogEntry, Error> {
        self.connection
            .lock()
            .map_err(|_| Error::DatabaseLockError)?
            .prepare(&format!(
                "SELECT id, name, label, is_active, created_at FROM {} WHERE name = :name",
                self.kind.table()
            ))?
            .query_row(&[(":name", name)], map_catalog_row)
            .map_err(|error| error.into())
    }
}

fn map_catalog_row(row: &Row) -> Result<CatalogEntry, rusqlite::Error> {
    let raw_name: String = row.get(1)?;

    Ok(CatalogEntry {
        id: row.get(0)?,
        name: CatalogName::new_unchecked(&raw_name),
        label: row.get(2)?,
        is_active: row.get(3)?,
        created_at: row.get(4)?,
    })
}

#[cfg(test)]
mod catalog_store_tests {
    use std::sync::{Arc, Mutex};

    use rusqlite::Connection;
    use time::macros::datetime;

    use crate::{
        Error,
        catalog::core::{CatalogKind, CatalogName, CatalogStore, NewCatalogEntry},
    };

    use super::{SQLiteCatalogStore, create_catalog_tables};

    fn get_test_connection() -> Arc<Mutex<Connection>> {
        let connection = Connection::open_in_memory().unwrap();
        create_catalog_tables(&connection).unwrap();

        Arc::new(Mutex::new(connection))
    }

    fn new_entry(name: &str) -> NewCatalogEntry {
        NewCatalogEntry {
            name: CatalogName::new_unchecked(name),
            label: Some(name.to_uppercase()),
            is_active: true,
            created_at: datetime!(2024-01-15 09:00:00 UTC),
        }
    }

    #[test]
    fn sql_is_valid() {
        let connection = Connection::open_in_memory().unwrap();

        assert_eq!(Ok(()), create_catalog_tables(&connection));
    }

    #[test]
    fn create_entry_succeeds() {
        let store = SQLiteCatalogStore::new(get_test_connection(), CatalogKind::Category);

        let entry = store.create(new_entry("food")).unwrap();

        assert!(entry.id > 0);
        assert_eq!(entry.name.as_ref(), "food");
        assert_eq!(entry.label.as_deref(), Some("FOOD"));
        assert!(entry.is_active);
    }

    #[test]
    fn get_entry_by_name_succeeds() {
        let store = SQLiteCatalogStore::new(get_test_connection(), CatalogKind::PaymentMethod);
        let inserted = store.create(new_entry("card")).unwrap();

        let selected = store.get_by_name("card");

        assert_eq!(Ok(inserted), selected);
    }

    #[test]
    fn get_entry_with_unknown_name_returns_not_found() {
        let store = SQLiteCatalogStore::new(get_test_connection(), CatalogKind::Category);
        store.create(new_entry("food")).unwrap();

        assert_eq!(store.get_by_name("Food"), Err(Error::NotFound));
    }

    #[test]
    fn kinds_use_separate_tables() {
        let connection = get_test_connection();
        let categories = SQLiteCatalogStore::new(connection.clone(), CatalogKind::Category);
        let payment_methods = SQLiteCatalogStore::new(connection, CatalogKind::PaymentMethod);

        categories.create(new_entry("cash")).unwrap();

        assert_eq!(payment_methods.get_by_name("cash"), Err(Error::NotFound));
        assert!(payment_methods.create(new_entry("cash")).is_ok());
    }

    #[test]
    fn duplicate_insert_is_rejected_by_unique_constraint() {
        let store = SQLiteCatalogStore::new(get_test_connection(), CatalogKind::Category);
        store.create(new_entry("food")).unwrap();

        let result = store.create(new_entry("food"));

        assert!(matches!(result, Err(Error::SqlError(_))));
    }
}
