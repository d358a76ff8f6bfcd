//! Account book entries: validated creation, lookup by ID and search by date.

mod core;
mod create;
mod get;
mod search;
mod store;

pub use core::{
    AmountInput, DateRange, LedgerForm, LedgerRecord, LedgerRecordView, LinkedName,
    NewLedgerRecord, PaymentType, ValidatedLedgerFields,
};
pub use create::{create_ledger_record, create_ledger_record_endpoint};
pub use get::{get_ledger_record, get_ledger_record_endpoint};
pub use search::{search_ledger_records, search_ledger_records_endpoint};
pub use store::{LedgerStore, SQLiteLedgerStore, create_ledger_table};
