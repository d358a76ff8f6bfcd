//! Implements a SQLite backed store for account book entries.

use std::{
    str::FromStr,
    sync::{Arc, Mutex},
};

use axum::extract::FromRef;
use rusqlite::{Connection, Row, types::Type};
use rust_decimal::Decimal;
use time::UtcOffset;

use crate::{
    AppState, DatabaseId, Error,
    ledger::core::{
        DateRange, LedgerRecord, LedgerRecordView, LinkedName, NewLedgerRecord, PaymentType,
    },
};

/// Creates and retrieves account book entries.
pub trait LedgerStore {
    /// Add a new entry to the store.
    fn create(&self, record: NewLedgerRecord) -> Result<LedgerRecord, Error>;

    /// Get the entry with the ID `idx` along with its category and payment method names.
    ///
    /// Returns [Error::NotFound] if there is no such entry.
    fn get_view(&self, idx: DatabaseId) -> Result<LedgerRecordView, Error>;

    /// Get the entries created within `range`, oldest first.
    fn search(&self, range: DateRange) -> Result<Vec<LedgerRecordView>, Error>;
}

/// Create the account book table.
///
/// Must be called after the user and catalog tables exist.
///
/// # Errors
///
/// This function will return an error if the SQL query failed.
pub fn create_ledger_table(connection: &Connection) -> Result<(), rusqlite::Error> {
    connection.execute(
        "CREATE TABLE IF NOT EXISTS account_book (
            idx INTEGER PRIMARY KEY,
            title TEXT NOT NULL,
            payment_amount TEXT NOT NULL,
            payment_type TEXT NOT NULL CHECK (payment_type IN ('income', 'expense')),
            created_at TEXT NOT NULL,
            updated_at TEXT NOT NULL,
            category_id INTEGER NOT NULL,
            payment_method_id INTEGER,
            user_id INTEGER NOT NULL,
            FOREIGN KEY(category_id) REFERENCES category(id),
            FOREIGN KEY(payment_method_id) REFERENCES payment_method(id),
            FOREIGN KEY(user_id) REFERENCES user(id)
        )",
        (),
    )?;

    connection.execute(
        "CREATE INDEX IF NOT EXISTS idx_account_book_created_at ON account_book(created_at)",
        (),
    )?;

    Ok(())
}

const SELECT_VIEW: &str = "SELECT a.idx, a.title, a.payment_type, a.payment_amount, a.created_at,
        c.name, p.name
    FROM account_book a
    INNER JOIN category c ON c.id = a.category_id
    LEFT JOIN payment_method p ON p.id = a.payment_method_id";

/// Stores account book entries in a SQLite database.
#[derive(Debug, Clone)]
pub struct SQLiteLedgerStore {
    connection: Arc<Mutex<Connection>>,
}

impl SQLiteLedgerStore {
    /// Create a new ledger store.
    pub fn new(connection: Arc<Mutex<Connection>>) -> Self {
        Self { connection }
    }
}

impl LedgerStore for SQLiteLedgerStore {
    /// Insert an entry into the database.
    ///
    /// # Errors
    /// This function will return an [Error::SqlError] if there is an SQL
    /// error, e.g. the category does not exist.
    fn create(&self, record: NewLedgerRecord) -> Result<LedgerRecord, Error> {
        let created_at = record.created_at.to_offset(UtcOffset::UTC);
        let updated_at = record.updated_at.to_offset(UtcOffset::UTC);

        let idx = self
            .connection
            .lock()
            .map_err(|_| Error::DatabaseLockError)?
            .prepare(
                "INSERT INTO account_book (title, payment_amount, payment_type, created_at,
                    updated_at, category_id, payment_method_id, user_id)
                VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)
                RETURNING idx",
            )?
            .query_row(
                (
                    &record.title,
                    record.payment_amount.to_string(),
                    record.payment_type.as_str(),
                    created_at,
                    updated_at,
                    record.category_id,
                    record.payment_method_id,
                    record.user_id.as_i64(),
                ),
                |row| row.get(0),
            )?;

        Ok(LedgerRecord {
            idx,
            title: record.title,
            payment_amount: record.payment_amount,
            payment_type: record.payment_type,
            created_at,
            updated_at,
            category_id: record.category_id,
            payment_method_id: record.payment_method_id,
            user_id: record.user_id,
        })
    }

    fn get_view(&self, idx: DatabaseId) -> Result<LedgerRecordView, Error> {
        self.connection
            .lock()
            .map_err(|_| Error::DatabaseLockError)?
            .prepare(&format!("{SELECT_VIEW} WHERE a.idx = :idx"))?
            .query_row(&[(":idx", &idx)], map_view_row)
            .map_err(|error| error.into())
    }

    /// Get the entries created on or after the start date and on or before
    /// the end date, in UTC.
    ///
    /// # Errors
    /// This function will return an [Error::SqlError] if there is an SQL error.
    fn search(&self, range: DateRange) -> Result<Vec<LedgerRecordView>, Error> {
        // Timestamps are stored as UTC text starting with the date, so a date
        // string compares correctly against them.
        let start = range.start.map(|date| date.to_string());
        let end = range
            .end
            .and_then(|date| date.next_day())
            .map(|date| date.to_string());

        self.connection
            .lock()
            .map_err(|_| Error::DatabaseLockError)?
            .prepare(&format!(
                "{SELECT_VIEW}
                WHERE (:start IS NULL OR a.created_at >= :start)
                AND (:end IS NULL OR a.created_at < :end)
                ORDER BY a.created_at ASC, a.idx ASC"
            ))?
            .query_map(
                rusqlite::named_params! {":start": start, ":end": end},
                map_view_row,
            )?
            .map(|maybe_view| maybe_view.map_err(Error::from))
            .collect()
    }
}

fn map_view_row(row: &Row) -> Result<LedgerRecordView, rusqlite::Error> {
    let raw_payment_type: String = row.get(2)?;
    let payment_type = PaymentType::from_str(&raw_payment_type).map_err(|error| {
        rusqlite::Error::FromSqlConversionFailure(2, Type::Text, error.message.into())
    })?;

    let raw_amount: String = row.get(3)?;
    let payment_amount = Decimal::from_str(&raw_amount)
        .map_err(|error| rusqlite::Error::FromSqlConversionFailure(3, Type::Text, Box::new(error)))?;

    let payment_method: Option<String> = row.get(6)?;

    Ok(LedgerRecordView {
        idx: row.get(0)?,
        title: row.get(1)?,
        payment_type,
        payment_amount,
        created_at: row.get(4)?,
        category: LinkedName { name: row.get(5)? },
        payment_method: payment_method.map(|name| LinkedName { name }),
    })
}

/// The state needed by the account book routes.
#[derive(Debug, Clone)]
pub struct LedgerState {
    /// The store for account book entries.
    pub ledger_store: SQLiteLedgerStore,
}

impl FromRef<AppState> for LedgerState {
    fn from_ref(state: &AppState) -> Self {
        Self {
            ledger_store: SQLiteLedgerStore::new(state.db_connection.clone()),
        }
    }
}

#[cfg(test)]
mod ledger_store_tests {
    use rust_decimal::Decimal;
    use time::{OffsetDateTime, macros::{date, datetime}};

    use crate::{
        AppState, CatalogKind, DatabaseId, Error, UserID,
        ledger::core::{DateRange, NewLedgerRecord, PaymentType},
        test_utils::{get_test_app_state, insert_test_catalog_entry, insert_test_user},
    };

    use super::{LedgerStore, SQLiteLedgerStore};

    struct Fixture {
        store: SQLiteLedgerStore,
        user_id: UserID,
        category_id: DatabaseId,
        payment_method_id: DatabaseId,
    }

    fn get_fixture() -> Fixture {
        let state: AppState = get_test_app_state();
        let user = insert_test_user(&state, "testuser123", "Test@1234567");
        let category_id = insert_test_catalog_entry(&state, CatalogKind::Category, "food");
        let payment_method_id =
            insert_test_catalog_entry(&state, CatalogKind::PaymentMethod, "card");

        Fixture {
            store: SQLiteLedgerStore::new(state.db_connection.clone()),
            user_id: user.id,
            category_id,
            payment_method_id,
        }
    }

    fn new_record(fixture: &Fixture, created_at: OffsetDateTime) -> NewLedgerRecord {
        NewLedgerRecord {
            title: "Groceries for the week".to_owned(),
            payment_amount: Decimal::new(5240, 2),
            payment_type: PaymentType::Expense,
            created_at,
            updated_at: created_at,
            category_id: fixture.category_id,
            payment_method_id: Some(fixture.payment_method_id),
            user_id: fixture.user_id,
        }
    }

    #[test]
    fn create_then_get_view() {
        let fixture = get_fixture();
        let created = fixture
            .store
            .create(new_record(&fixture, datetime!(2024-01-15 09:30:00 UTC)))
            .unwrap();

        let view = fixture.store.get_view(created.idx).unwrap();

        assert_eq!(view.idx, created.idx);
        assert_eq!(view.title, "Groceries for the week");
        assert_eq!(view.payment_amount.to_string(), "52.40");
        assert_eq!(view.payment_type, PaymentType::Expense);
        assert_eq!(view.created_at, datetime!(2024-01-15 09:30:00 UTC));
        assert_eq!(view.category.name, "food");
        assert_eq!(view.payment_method.map(|method| method.name).as_deref(), Some("card"));
    }

    #[test]
    fn get_view_without_payment_method() {
        let fixture = get_fixture();
        let record = NewLedgerRecord {
            payment_method_id: None,
            ..new_record(&fixture, datetime!(2024-01-15 09:30:00 UTC))
        };
        let created = fixture.store.create(record).unwrap();

        let view = fixture.store.get_view(created.idx).unwrap();

        assert_eq!(view.payment_method, None);
    }

    #[test]
    fn get_view_of_missing_entry_is_not_found() {
        let fixture = get_fixture();

        assert_eq!(fixture.store.get_view(42), Err(Error::NotFound));
    }

    #[test]
    fn create_with_unknown_category_fails() {
        let fixture = get_fixture();
        let record = NewLedgerRecord {
            category_id: fixture.category_id + 100,
            ..new_record(&fixture, datetime!(2024-01-15 09:30:00 UTC))
        };

        assert!(matches!(fixture.store.create(record), Err(Error::SqlError(_))));
    }

    #[test]
    fn search_filters_inclusive_date_range() {
        let fixture = get_fixture();
        for created_at in [
            datetime!(2023-12-31 23:59:59 UTC),
            datetime!(2024-01-01 00:00:00 UTC),
            datetime!(2024-01-15 12:00:00 UTC),
            datetime!(2024-01-31 23:59:59 UTC),
            datetime!(2024-02-01 00:00:00 UTC),
        ] {
            fixture.store.create(new_record(&fixture, created_at)).unwrap();
        }

        let january = fixture
            .store
            .search(DateRange {
                start: Some(date!(2024 - 01 - 01)),
                end: Some(date!(2024 - 01 - 31)),
            })
            .unwrap();

        let created: Vec<_> = january.iter().map(|view| view.created_at).collect();
        assert_eq!(
            created,
            [
                datetime!(2024-01-01 00:00:00 UTC),
                datetime!(2024-01-15 12:00:00 UTC),
                datetime!(2024-01-31 23:59:59 UTC),
            ]
        );
    }

    #[test]
    fn search_without_bounds_returns_everything_in_order() {
        let fixture = get_fixture();
        let later = fixture
            .store
            .create(new_record(&fixture, datetime!(2024-03-01 00:00:00 UTC)))
            .unwrap();
        let earlier = fixture
            .store
            .create(new_record(&fixture, datetime!(2024-01-01 00:00:00 UTC)))
            .unwrap();

        let all = fixture.store.search(DateRange::default()).unwrap();

        let ids: Vec<_> = all.iter().map(|view| view.idx).collect();
        assert_eq!(ids, [earlier.idx, later.idx]);
    }

    #[test]
    fn search_with_only_start_is_open_ended() {
        let fixture = get_fixture();
        fixture
            .store
            .create(new_record(&fixture, datetime!(2023-06-01 00:00:00 UTC)))
            .unwrap();
        let kept = fixture
            .store
            .create(new_record(&fixture, datetime!(2030-06-01 00:00:00 UTC)))
            .unwrap();

        let found = fixture
            .store
            .search(DateRange {
                start: Some(date!(2024 - 01 - 01)),
                end: None,
            })
            .unwrap();

        assert_eq!(found.len(), 1);
        assert_eq!(found[0].idx, kept.idx);
    }

    #[test]
    fn search_with_no_matches_is_empty() {
        let fixture = get_fixture();

        let found = fixture
            .store
            .search(DateRange {
                start: Some(date!(2024 - 01 - 01)),
                end: Some(date!(2024 - 01 - 31)),
            })
            .unwrap();

        assert!(found.is_empty());
    }
}
