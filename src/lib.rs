//! Account Book is a REST API for keeping a personal finance ledger.
//!
//! Users register a handle and password, log in to receive a bearer token,
//! and then record income and expense entries that reference a category and
//! an optional payment method. Entries can be fetched by ID or searched by
//! date range.

#![warn(missing_docs)]

use std::{net::SocketAddr, time::Duration};

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use axum_server::Handle;
use serde_json::json;
use tokio::signal;

mod app_state;
mod auth;
mod catalog;
mod config;
mod database_id;
mod db;
mod endpoints;
mod ledger;
mod logging;
mod not_found;
mod password;
mod register_user;
mod routing;
mod user;
mod validation;

#[cfg(test)]
mod test_utils;

pub use app_state::AppState;
pub use auth::{AuthenticatedUser, Claims, TokenKeys, authenticate};
pub use catalog::{
    CatalogEntry, CatalogKind, CatalogName, CatalogStore, NewCatalogEntry, SQLiteCatalogStore,
    create_catalog_entry,
};
pub use config::{BCRYPT_COST_VAR, JWT_SECRET_VAR, parse_password_cost};
pub use database_id::DatabaseId;
pub use db::initialize as initialize_db;
pub use ledger::{
    AmountInput, DateRange, LedgerForm, LedgerRecord, LedgerRecordView, LedgerStore, LinkedName,
    NewLedgerRecord, PaymentType, SQLiteLedgerStore, ValidatedLedgerFields, create_ledger_record,
    get_ledger_record, search_ledger_records,
};
pub use logging::{LOG_BODY_LENGTH_LIMIT, logging_middleware};
pub use password::{PasswordHash, ValidatedPassword};
pub use register_user::register_user;
pub use routing::build_router;
pub use user::{NewUser, SQLiteUserStore, User, UserID, UserName, UserStore};
pub use validation::FieldError;

/// An async task that waits for either the ctrl+c or terminate signal, whichever comes first, and
/// then signals the server to shut down gracefully.
///
/// `handle` is a handle to an Axum `Server`.
pub async fn graceful_shutdown(handle: Handle<SocketAddr>) {
    let ctrl_c = async {
        signal::ctrl_c()
            .await
            .expect("failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        signal::unix::signal(signal::unix::SignalKind::terminate())
            .expect("failed to install signal handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            tracing::debug!("Received ctrl+c signal.");
            handle.graceful_shutdown(Some(Duration::from_secs(1)));
        },
        _ = terminate => {
            tracing::debug!("Received terminate signal.");
            handle.graceful_shutdown(Some(Duration::from_secs(1)));
        },
    }
}

/// The errors that may occur in the application.
///
/// The variants fall into three groups:
/// - validation errors, which are shown to the client verbatim,
/// - recoverable domain errors (conflicts and unauthorized requests), which
///   are also shown to the client,
/// - internal faults, where the cause is logged on the server and the client
///   only receives a generic message.
#[derive(Debug, thiserror::Error, PartialEq)]
pub enum Error {
    /// One or more fields in the request were invalid.
    #[error("invalid request: {}", validation::join_messages(.0))]
    Validation(Vec<FieldError>),

    /// A category or payment method with the same name already exists.
    #[error("a {kind} named \"{name}\" already exists")]
    DuplicateName {
        /// The human readable name of the catalog, e.g. "category".
        kind: &'static str,
        /// The name that is already taken.
        name: String,
    },

    /// A user with the same handle already exists.
    #[error("a user with the handle \"{0}\" already exists")]
    DuplicateIdentity(String),

    /// There is no registered user with the given handle.
    #[error("the user does not exist")]
    UnknownIdentity,

    /// The handle or password was empty, or the password did not match.
    #[error("the handle or password is incorrect")]
    InvalidCredentials,

    /// The request did not carry a valid bearer token.
    #[error("a valid bearer token is required")]
    Unauthenticated,

    /// A record could not be saved.
    ///
    /// The string names what was being created, e.g. "category".
    #[error("an error occurred while creating the {0}")]
    Persistence(&'static str),

    /// A record could not be read.
    ///
    /// The string names what was being read, e.g. "account book entry".
    #[error("an error occurred while retrieving the {0}")]
    Retrieval(&'static str),

    /// The password could not be hashed while registering a user.
    #[error("an error occurred while creating the user")]
    Credential,

    /// An unexpected error occurred while logging in.
    #[error("an error occurred while logging in")]
    Authentication,

    /// The requested resource was not found.
    ///
    /// Internally, this error may occur when a query returns no rows.
    #[error("the requested resource could not be found")]
    NotFound,

    /// An unexpected error occurred with the underlying hashing library.
    ///
    /// The error string should only be logged for debugging on the server.
    #[error("hashing failed: {0}")]
    HashingError(String),

    /// A token could not be signed.
    #[error("could not create token: {0}")]
    TokenCreation(String),

    /// A setting read at start up has an invalid value.
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    /// Could not acquire the database lock
    #[error("could not acquire the database lock")]
    DatabaseLockError,

    /// An unhandled/unexpected SQL error.
    #[error("an unexpected SQL error occurred: {0}")]
    SqlError(rusqlite::Error),
}

impl From<rusqlite::Error> for Error {
    fn from(value: rusqlite::Error) -> Self {
        match value {
            rusqlite::Error::QueryReturnedNoRows => Error::NotFound,
            error => Error::SqlError(error),
        }
    }
}

impl IntoResponse for Error {
    fn into_response(self) -> Response {
        let status = match &self {
            Error::Validation(_) => StatusCode::BAD_REQUEST,
            Error::DuplicateName { .. } | Error::DuplicateIdentity(_) => StatusCode::CONFLICT,
            Error::UnknownIdentity | Error::InvalidCredentials | Error::Unauthenticated => {
                StatusCode::UNAUTHORIZED
            }
            Error::NotFound => return not_found::get_404_not_found_response(),
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        };

        let message = match self {
            Error::Validation(errors) => json!(
                errors
                    .iter()
                    .map(|error| error.message.clone())
                    .collect::<Vec<_>>()
            ),
            error @ (Error::DuplicateName { .. }
            | Error::DuplicateIdentity(_)
            | Error::UnknownIdentity
            | Error::InvalidCredentials
            | Error::Unauthenticated
            | Error::Persistence(_)
            | Error::Retrieval(_)
            | Error::Credential
            | Error::Authentication) => json!(error.to_string()),
            // Any errors that are not handled above are not intended to be shown to the client.
            error => {
                tracing::error!("An unexpected error occurred: {}", error);
                json!("an unexpected error occurred")
            }
        };

        let body = Json(json!({
            "statusCode": status.as_u16(),
            "message": message,
            "error": status.canonical_reason().unwrap_or_default(),
        }));

        (status, body).into_response()
    }
}

#[cfg(test)]
mod error_response_tests {
    use axum::{body::to_bytes, http::StatusCode, response::IntoResponse};
    use serde_json::Value;

    use crate::{Error, FieldError};

    async fn into_json(error: Error) -> (StatusCode, Value) {
        let response = error.into_response();
        let status = response.status();
        let body = to_bytes(response.into_body(), usize::MAX).await.unwrap();

        (status, serde_json::from_slice(&body).unwrap())
    }

    #[tokio::test]
    async fn duplicate_name_is_conflict_with_name_in_message() {
        let (status, body) = into_json(Error::DuplicateName {
            kind: "category",
            name: "food".to_owned(),
        })
        .await;

        assert_eq!(status, StatusCode::CONFLICT);
        assert_eq!(body["statusCode"], 409);
        assert_eq!(body["error"], "Conflict");
        assert!(body["message"].as_str().unwrap().contains("food"));
    }

    #[tokio::test]
    async fn validation_lists_every_field_message() {
        let (status, body) = into_json(Error::Validation(vec![
            FieldError::new("title", "title is too short"),
            FieldError::new("paymentType", "paymentType is invalid"),
        ]))
        .await;

        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(
            body["message"],
            serde_json::json!(["title is too short", "paymentType is invalid"])
        );
    }

    #[tokio::test]
    async fn credential_errors_are_unauthorized() {
        for error in [
            Error::UnknownIdentity,
            Error::InvalidCredentials,
            Error::Unauthenticated,
        ] {
            let (status, _) = into_json(error).await;

            assert_eq!(status, StatusCode::UNAUTHORIZED);
        }
    }

    #[tokio::test]
    async fn internal_causes_are_not_shown_to_client() {
        let (status, body) = into_json(Error::HashingError("secret detail".to_owned())).await;

        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert!(!body["message"].as_str().unwrap().contains("secret detail"));
    }

    #[tokio::test]
    async fn persistence_error_shows_generic_message() {
        let (status, body) = into_json(Error::Persistence("category")).await;

        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(
            body["message"],
            "an error occurred while creating the category"
        );
    }
}
