//! This file defines the log-in operation and the route that exchanges a
//! handle and password for a bearer token.

use axum::{
    Json,
    extract::{FromRef, State, rejection::JsonRejection},
    http::StatusCode,
};
use serde::{Deserialize, Serialize};
use time::{Duration, OffsetDateTime};

use crate::{
    AppState, Error,
    auth::token::{TokenKeys, encode_token},
    user::{SQLiteUserStore, UserStore},
    validation::parse_json,
};

/// The state needed to perform a login.
#[derive(Clone)]
pub struct LoginState {
    /// The store holding registered users.
    pub user_store: SQLiteUserStore,
    /// The keys used to sign tokens.
    pub token_keys: TokenKeys,
    /// How long issued tokens are valid for.
    pub token_duration: Duration,
}

impl FromRef<AppState> for LoginState {
    fn from_ref(state: &AppState) -> Self {
        Self {
            user_store: SQLiteUserStore::new(state.db_connection.clone()),
            token_keys: state.token_keys.clone(),
            token_duration: state.token_duration,
        }
    }
}

/// The request body for logging in.
///
/// Missing fields are treated as empty strings, which are rejected as
/// invalid credentials.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct LogInForm {
    /// The handle entered during log-in.
    #[serde(default, alias = "userName")]
    pub handle: String,
    /// The password entered during log-in.
    #[serde(default)]
    pub password: String,
}

/// Check `password` against the user registered as `user_name` and issue a
/// signed token on success.
///
/// # Errors
///
/// This function will return a:
/// - [Error::InvalidCredentials] if either argument is empty (the store is
///   not queried) or the password does not match,
/// - [Error::UnknownIdentity] if no user has the handle `user_name`,
/// - [Error::Authentication] if anything else went wrong; the cause is logged.
pub fn authenticate<S: UserStore>(
    user_name: &str,
    password: &str,
    store: &S,
    keys: &TokenKeys,
    token_duration: Duration,
) -> Result<String, Error> {
    if user_name.is_empty() || password.is_empty() {
        return Err(Error::InvalidCredentials);
    }

    let user = match store.get_by_name(user_name) {
        Ok(user) => user,
        Err(Error::NotFound) => return Err(Error::UnknownIdentity),
        Err(error) => {
            tracing::error!("USER LOGIN - Could not look up user {user_name}: {error}");
            return Err(Error::Authentication);
        }
    };

    let is_password_valid = user.password_hash.verify(password).map_err(|error| {
        tracing::error!("USER LOGIN - Could not verify password for user {user_name}: {error}");
        Error::Authentication
    })?;

    if !is_password_valid {
        return Err(Error::InvalidCredentials);
    }

    encode_token(
        &user.user_name,
        OffsetDateTime::now_utc(),
        token_duration,
        keys,
    )
    .map_err(|error| {
        tracing::error!("USER LOGIN - Could not issue token for user {user_name}: {error}");
        Error::Authentication
    })
}

/// Handler for log-in requests via the POST method.
///
/// Responds with the bearer token as plain text. Password verification runs
/// on the blocking thread pool.
pub async fn post_log_in(
    State(state): State<LoginState>,
    payload: Result<Json<LogInForm>, JsonRejection>,
) -> Result<(StatusCode, String), Error> {
    let form = parse_json(payload)?;

    tokio::task::spawn_blocking(move || {
        authenticate(
            &form.handle,
            &form.password,
            &state.user_store,
            &state.token_keys,
            state.token_duration,
        )
    })
    .await
    .map_err(|error| {
        tracing::error!("USER LOGIN - Log-in task did not complete: {error}");
        Error::Authentication
    })?
    .map(|token| (StatusCode::CREATED, token))
}
