//! Creating account book entries.

use axum::{
    Extension, Json,
    extract::{State, rejection::JsonRejection},
    http::StatusCode,
};
use time::OffsetDateTime;

use crate::{
    AuthenticatedUser, Error,
    ledger::{
        core::{LedgerForm, LedgerRecord, NewLedgerRecord},
        store::{LedgerState, LedgerStore},
    },
    validation::parse_json,
};

/// Validate `form` and save it as an entry owned by `owner`.
///
/// Any owner ID in `form` is ignored.
///
/// # Errors
///
/// This function will return a:
/// - [Error::Validation] if any field is invalid; the store is not called,
/// - [Error::Persistence] if the store failed, e.g. the category does not
///   exist; the cause is logged.
pub fn create_ledger_record<S: LedgerStore>(
    form: LedgerForm,
    owner: &AuthenticatedUser,
    store: &S,
) -> Result<LedgerRecord, Error> {
    let fields = form.validate()?;
    let now = OffsetDateTime::now_utc();

    store
        .create(NewLedgerRecord {
            title: fields.title,
            payment_amount: fields.payment_amount,
            payment_type: fields.payment_type,
            created_at: now,
            updated_at: now,
            category_id: fields.category_id,
            payment_method_id: fields.payment_method_id,
            user_id: owner.id,
        })
        .map_err(|error| {
            tracing::error!("account-book CREATE - {error}");
            Error::Persistence("account book entry")
        })
}

/// A route handler for creating an account book entry for the logged in user.
pub async fn create_ledger_record_endpoint(
    State(state): State<LedgerState>,
    Extension(user): Extension<AuthenticatedUser>,
    payload: Result<Json<LedgerForm>, JsonRejection>,
) -> Result<(StatusCode, Json<LedgerRecord>), Error> {
    let form = parse_json(payload)?;

    create_ledger_record(form, &user, &state.ledger_store)
        .map(|record| (StatusCode::CREATED, Json(record)))
}
