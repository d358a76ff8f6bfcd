//! Defines the endpoints for creating categories and payment methods.

use axum::{
    Json,
    extract::{FromRef, State, rejection::JsonRejection},
    http::StatusCode,
};
use serde::{Deserialize, Serialize};

use crate::{
    AppState, Error,
    catalog::{
        core::{CatalogEntry, CatalogKind, CatalogName, CatalogStore, create_catalog_entry},
        store::SQLiteCatalogStore,
    },
    validation::parse_json,
};

/// The state needed to create catalog entries.
#[derive(Debug, Clone)]
pub struct CatalogState {
    /// The store for categories.
    pub category_store: SQLiteCatalogStore,
    /// The store for payment methods.
    pub payment_method_store: SQLiteCatalogStore,
}

impl FromRef<AppState> for CatalogState {
    fn from_ref(state: &AppState) -> Self {
        Self {
            category_store: SQLiteCatalogStore::new(
                state.db_connection.clone(),
                CatalogKind::Category,
            ),
            payment_method_store: SQLiteCatalogStore::new(
                state.db_connection.clone(),
                CatalogKind::PaymentMethod,
            ),
        }
    }
}

/// The request body for creating a category or payment method.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct CatalogForm {
    /// The unique name, e.g. "food".
    pub name: String,
    /// An optional human readable label, e.g. "Food".
    #[serde(default)]
    pub label: Option<String>,
}

/// A route handler for creating a new category.
pub async fn create_category_endpoint(
    State(state): State<CatalogState>,
    payload: Result<Json<CatalogForm>, JsonRejection>,
) -> Result<(StatusCode, Json<CatalogEntry>), Error> {
    create_entry(&state.category_store, payload)
}

/// A route handler for creating a new payment method.
pub async fn create_payment_method_endpoint(
    State(state): State<CatalogState>,
    payload: Result<Json<CatalogForm>, JsonRejection>,
) -> Result<(StatusCode, Json<CatalogEntry>), Error> {
    create_entry(&state.payment_method_store, payload)
}

fn create_entry<S: CatalogStore>(
    store: &S,
    payload: Result<Json<CatalogForm>, JsonRejection>,
) -> Result<(StatusCode, Json<CatalogEntry>), Error> {
    let form = parse_json(payload)?;
    let name = CatalogName::new(store.kind(), &form.name)
        .map_err(|error| Error::Validation(vec![error]))?;

    create_catalog_entry(name, form.label, store).map(|entry| (StatusCode::CREATED, Json(entry)))
}
