//! Application router configuration with protected and unprotected route definitions.

use axum::{
    Router, middleware,
    routing::{get, post},
};

use crate::{
    AppState,
    auth::{auth_guard, post_log_in},
    catalog::{create_category_endpoint, create_payment_method_endpoint},
    endpoints,
    ledger::{
        create_ledger_record_endpoint, get_ledger_record_endpoint, search_ledger_records_endpoint,
    },
    not_found::get_404_not_found,
    register_user::register_user_endpoint,
};

/// Return a router with all the app's routes.
pub fn build_router(state: AppState) -> Router {
    let unprotected_routes = Router::new()
        .route(endpoints::USERS, post(register_user_endpoint))
        .route(endpoints::LOG_IN, post(post_log_in))
        .route(endpoints::CATEGORY, post(create_category_endpoint))
        .route(
            endpoints::PAYMENT_METHOD,
            post(create_payment_method_endpoint),
        )
        .route(
            endpoints::ACCOUNT_BOOK_SEARCH,
            get(search_ledger_records_endpoint),
        );

    let protected_routes = Router::new()
        .route(endpoints::ACCOUNT_BOOK, post(create_ledger_record_endpoint))
        .route(endpoints::ACCOUNT_BOOK_ENTRY, get(get_ledger_record_endpoint))
        .layer(middleware::from_fn_with_state(state.clone(), auth_guard));

    protected_routes
        .merge(unprotected_routes)
        .fallback(get_404_not_found)
        .with_state(state)
}
