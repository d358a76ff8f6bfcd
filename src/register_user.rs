//! User registration: the uniqueness-checked create operation and its route.

use axum::{
    Json,
    extract::{FromRef, State, rejection::JsonRejection},
    http::StatusCode,
};
use serde::{Deserialize, Serialize};
use time::OffsetDateTime;

use crate::{
    AppState, Error, FieldError, PasswordHash, UserName, ValidatedPassword,
    user::{NewUser, SQLiteUserStore, UserStore},
    validation::parse_json,
};

/// The message returned when a user has been registered.
pub const REGISTRATION_CONFIRMATION: &str = "User created successfully.";

/// The state needed to register a user.
#[derive(Debug, Clone)]
pub struct RegistrationState {
    /// The store holding registered users.
    pub user_store: SQLiteUserStore,
    /// The bcrypt cost for hashing the new password.
    pub password_cost: u32,
}

impl FromRef<AppState> for RegistrationState {
    fn from_ref(state: &AppState) -> Self {
        Self {
            user_store: SQLiteUserStore::new(state.db_connection.clone()),
            password_cost: state.password_cost,
        }
    }
}

/// The request body for registering a user.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RegisterForm {
    /// The handle to register.
    #[serde(alias = "userName")]
    pub handle: String,
    /// The plaintext password.
    pub password: String,
}

/// Register a new user with the handle `user_name`.
///
/// The handle is checked against existing users before the password is
/// hashed. As with catalog entries, two concurrent registrations of the same
/// handle can both pass the check; the unique constraint rejects the second
/// insert and it is reported as [Error::Persistence].
///
/// # Errors
///
/// This function will return a:
/// - [Error::DuplicateIdentity] if the handle is taken; nothing is written,
/// - [Error::Credential] if the password could not be hashed,
/// - [Error::Persistence] if the store failed.
pub fn register_user<S: UserStore>(
    user_name: UserName,
    password: ValidatedPassword,
    password_cost: u32,
    store: &S,
) -> Result<&'static str, Error> {
    match store.get_by_name(user_name.as_ref()) {
        Ok(_) => {
            tracing::warn!("USER CREATE - Attempted to register existing handle {user_name}");
            return Err(Error::DuplicateIdentity(user_name.to_string()));
        }
        Err(Error::NotFound) => {}
        Err(error) => {
            tracing::error!("USER CREATE - Could not check for existing handle {user_name}: {error}");
            return Err(Error::Persistence("user"));
        }
    }

    let password_hash = PasswordHash::new(password, password_cost).map_err(|error| {
        tracing::error!("USER CREATE - Could not hash password for {user_name}: {error}");
        Error::Credential
    })?;

    store
        .create(NewUser {
            user_name,
            password_hash,
            registered_at: OffsetDateTime::now_utc(),
        })
        .map_err(|error| {
            tracing::error!("USER CREATE - {error}");
            Error::Persistence("user")
        })?;

    Ok(REGISTRATION_CONFIRMATION)
}

/// A route handler for registering a new user.
///
/// Every invalid field is reported at once. Hashing runs on the blocking
/// thread pool.
pub async fn register_user_endpoint(
    State(state): State<RegistrationState>,
    payload: Result<Json<RegisterForm>, JsonRejection>,
) -> Result<(StatusCode, String), Error> {
    let form = parse_json(payload)?;

    let (user_name, password) = match (
        UserName::new(&form.handle),
        ValidatedPassword::new(&form.password),
    ) {
        (Ok(user_name), Ok(password)) => (user_name, password),
        (user_name, password) => {
            let mut errors: Vec<FieldError> = user_name.err().into_iter().collect();
            errors.extend(password.err().unwrap_or_default());
            return Err(Error::Validation(errors));
        }
    };

    let RegistrationState {
        user_store,
        password_cost,
    } = state;

    tokio::task::spawn_blocking(move || {
        register_user(user_name, password, password_cost, &user_store)
    })
    .await
    .map_err(|error| {
        tracing::error!("USER CREATE - Registration task did not complete: {error}");
        Error::Persistence("user")
    })?
    .map(|message| (StatusCode::CREATED, message.to_owned()))
}


#[cfg(test)]
mod register_user_endpoint_tests {
    use axum::{Router, http::StatusCode, routing::post};
    use axum_test::TestServer;
    use serde_json::{Value, json};

    use crate::{endpoints, test_utils::get_test_app_state};

    use super::{REGISTRATION_CONFIRMATION, register_user_endpoint};

    fn get_test_server() -> TestServer {
        let app = Router::new()
            .route(endpoints::USERS, post(register_user_endpoint))
            .with_state(get_test_app_state());

        TestServer::try_new(app).expect("Could not create test server.")
    }

    #[tokio::test]
    async fn register_succeeds() {
        let server = get_test_server();

        let response = server
            .post(endpoints::USERS)
            .json(&json!({"handle": "testuser123", "password": "Test@1234567"}))
            .await;

        response.assert_status(StatusCode::CREATED);
        response.assert_text(REGISTRATION_CONFIRMATION);
    }

    #[tokio::test]
    async fn register_duplicate_is_conflict() {
        let server = get_test_server();
        let body = json!({"handle": "testuser123", "password": "Test@1234567"});
        server
            .post(endpoints::USERS)
            .json(&body)
            .await
            .assert_status(StatusCode::CREATED);

        let response = server.post(endpoints::USERS).json(&body).await;

        response.assert_status(StatusCode::CONFLICT);
        assert!(
            response.json::<Value>()["message"]
                .as_str()
                .unwrap()
                .contains("testuser123")
        );
    }

    #[tokio::test]
    async fn register_reports_every_invalid_field() {
        let server = get_test_server();

        let response = server
            .post(endpoints::USERS)
            .json(&json!({"handle": "short", "password": "password"}))
            .await;

        response.assert_status(StatusCode::BAD_REQUEST);
        let messages = response.json::<Value>()["message"]
            .as_array()
            .unwrap()
            .len();
        assert!(messages >= 2);
    }

    #[tokio::test]
    async fn register_with_unknown_field_is_bad_request() {
        let server = get_test_server();

        server
            .post(endpoints::USERS)
            .json(&json!({
                "handle": "testuser123",
                "password": "Test@1234567",
                "isAdmin": true
            }))
            .await
            .assert_status(StatusCode::BAD_REQUEST);
    }
}
