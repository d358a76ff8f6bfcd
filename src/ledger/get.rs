//! Getting a single account book entry by ID.

use axum::{
    Json,
    extract::{Path, State, rejection::PathRejection},
};

use crate::{
    DatabaseId, Error,
    ledger::{
        core::LedgerRecordView,
        store::{LedgerState, LedgerStore},
    },
    validation::parse_path,
};

/// Get the entry with the ID `idx`, or `None` if there is no such entry.
///
/// Entries are not filtered by owner.
///
/// # Errors
///
/// Returns [Error::Retrieval] if the store failed; the cause is logged.
pub fn get_ledger_record<S: LedgerStore>(
    idx: DatabaseId,
    store: &S,
) -> Result<Option<LedgerRecordView>, Error> {
    match store.get_view(idx) {
        Ok(view) => Ok(Some(view)),
        Err(Error::NotFound) => Ok(None),
        Err(error) => {
            tracing::error!("account-book GET idx - Could not get entry {idx}: {error}");
            Err(Error::Retrieval("account book entry"))
        }
    }
}

/// A route handler for getting an account book entry.
///
/// Responds with `null` if the entry does not exist.
pub async fn get_ledger_record_endpoint(
    State(state): State<LedgerState>,
    idx: Result<Path<DatabaseId>, PathRejection>,
) -> Result<Json<Option<LedgerRecordView>>, Error> {
    let idx = parse_path(idx)?;

    get_ledger_record(idx, &state.ledger_store).map(Json)
}

#[cfg(test)]
mod get_ledger_record_tests {
    use rust_decimal::Decimal;
    use time::OffsetDateTime;

    use crate::{
        DatabaseId, Error,
        ledger::{
            core::{
                DateRange, LedgerRecord, LedgerRecordView, LinkedName, NewLedgerRecord,
                PaymentType,
            },
            store::LedgerStore,
        },
    };

    use super::get_ledger_record;

    struct StubLedgerStore {
        result: fn(DatabaseId) -> Result<LedgerRecordView, Error>,
    }

    impl LedgerStore for StubLedgerStore {
        fn create(&self, _record: NewLedgerRecord) -> Result<LedgerRecord, Error> {
            unimplemented!()
        }

        fn get_view(&self, idx: DatabaseId) -> Result<LedgerRecordView, Error> {
            (self.result)(idx)
        }

        fn search(&self, _range: DateRange) -> Result<Vec<LedgerRecordView>, Error> {
            unimplemented!()
        }
    }

    #[test]
    fn returns_existing_entry() {
        let store = StubLedgerStore {
            result: |idx| {
                Ok(LedgerRecordView {
                    idx,
                    title: "Groceries for the week".to_owned(),
                    payment_type: PaymentType::Expense,
                    payment_amount: Decimal::new(5240, 2),
                    created_at: OffsetDateTime::UNIX_EPOCH,
                    category: LinkedName {
                        name: "food".to_owned(),
                    },
                    payment_method: None,
                })
            },
        };

        let view = get_ledger_record(3, &store).unwrap();

        assert_eq!(view.map(|view| view.idx), Some(3));
    }

    #[test]
    fn missing_entry_is_none() {
        let store = StubLedgerStore {
            result: |_| Err(Error::NotFound),
        };

        assert_eq!(get_ledger_record(404, &store), Ok(None));
    }

    #[test]
    fn store_failure_is_retrieval_error() {
        let store = StubLedgerStore {
            result: |_| Err(Error::DatabaseLockError),
        };

        assert_eq!(
            get_ledger_record(1, &store),
            Err(Error::Retrieval("account book entry"))
        );
    }
}
