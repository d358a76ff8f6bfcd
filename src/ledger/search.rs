//! Searching account book entries by creation date.

use axum::{
    Json,
    extract::{Query, State, rejection::QueryRejection},
};
use serde::{Deserialize, Serialize};

use crate::{
    Error,
    ledger::{
        core::{DateRange, LedgerRecordView},
        store::{LedgerState, LedgerStore},
    },
    validation::parse_query,
};

/// The query string for searching entries.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SearchQuery {
    /// The first day to include, as `YYYY-MM-DD`.
    pub start_date: Option<String>,
    /// The last day to include, as `YYYY-MM-DD`.
    pub end_date: Option<String>,
}

/// Get the entries created within `range`, ordered by creation time.
///
/// # Errors
///
/// Returns [Error::Retrieval] if the store failed; the cause is logged.
pub fn search_ledger_records<S: LedgerStore>(
    range: DateRange,
    store: &S,
) -> Result<Vec<LedgerRecordView>, Error> {
    store.search(range).map_err(|error| {
        tracing::error!("account-book GET search - Could not search {range:?}: {error}");
        Error::Retrieval("account book entries")
    })
}

/// A route handler for searching account book entries by date.
pub async fn search_ledger_records_endpoint(
    State(state): State<LedgerState>,
    query: Result<Query<SearchQuery>, QueryRejection>,
) -> Result<Json<Vec<LedgerRecordView>>, Error> {
    let query = parse_query(query)?;
    let range = DateRange::parse(query.start_date.as_deref(), query.end_date.as_deref())?;

    search_ledger_records(range, &state.ledger_store).map(Json)
}


#[cfg(test)]
mod search_ledger_records_endpoint_tests {
    use axum::{Router, http::StatusCode, routing::get};
    use axum_test::TestServer;
    use serde_json::Value;

    use crate::{endpoints, test_utils::get_test_app_state};

    use super::search_ledger_records_endpoint;

    fn get_test_server() -> TestServer {
        let app = Router::new()
            .route(
                endpoints::ACCOUNT_BOOK_SEARCH,
                get(search_ledger_records_endpoint),
            )
            .with_state(get_test_app_state());

        TestServer::try_new(app).expect("Could not create test server.")
    }

    #[tokio::test]
    async fn empty_store_gives_empty_list() {
        let server = get_test_server();

        let response = server
            .get(endpoints::ACCOUNT_BOOK_SEARCH)
            .add_query_param("startDate", "2024-01-01")
            .add_query_param("endDate", "2024-01-31")
            .await;

        response.assert_status_ok();
        assert_eq!(response.json::<Value>(), serde_json::json!([]));
    }

    #[tokio::test]
    async fn malformed_date_is_bad_request() {
        let server = get_test_server();

        let response = server
            .get(endpoints::ACCOUNT_BOOK_SEARCH)
            .add_query_param("startDate", "2024/01/01")
            .await;

        response.assert_status(StatusCode::BAD_REQUEST);
        assert_eq!(
            response.json::<Value>()["message"],
            serde_json::json!(["startDate must be in YYYY-MM-DD format"])
        );
    }
}
