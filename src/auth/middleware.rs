//! Authentication middleware that validates bearer tokens.

use axum::{
    extract::{FromRef, Request, State},
    middleware::Next,
    response::{IntoResponse, Response},
};
use axum_extra::{
    TypedHeader,
    headers::{Authorization, authorization::Bearer},
    typed_header::TypedHeaderRejection,
};

use crate::{
    AppState, Error, UserID, UserName,
    auth::token::{TokenKeys, decode_token},
    user::{SQLiteUserStore, UserStore},
};

/// The state needed for the auth middleware.
#[derive(Clone)]
pub struct AuthState {
    /// The store used to look up the user named in a token.
    pub user_store: SQLiteUserStore,
    /// The keys used to verify tokens.
    pub token_keys: TokenKeys,
}

impl FromRef<AppState> for AuthState {
    fn from_ref(state: &AppState) -> Self {
        Self {
            user_store: SQLiteUserStore::new(state.db_connection.clone()),
            token_keys: state.token_keys.clone(),
        }
    }
}

/// The user that made an authenticated request.
#[derive(Debug, Clone, PartialEq)]
pub struct AuthenticatedUser {
    /// The ID of the user.
    pub id: UserID,
    /// The handle of the user.
    pub user_name: UserName,
}

/// Middleware function that checks for a valid bearer token.
///
/// The [AuthenticatedUser] is placed into the request extensions and the
/// request is executed normally if the token is valid and names a registered
/// user, otherwise a 401 response is returned.
///
/// **Note**: Route handlers can use the function argument
/// `Extension(user): Extension<AuthenticatedUser>` to receive the user.
pub async fn auth_guard(
    State(state): State<AuthState>,
    bearer: Result<TypedHeader<Authorization<Bearer>>, TypedHeaderRejection>,
    mut request: Request,
    next: Next,
) -> Response {
    let Ok(TypedHeader(Authorization(bearer))) = bearer else {
        return Error::Unauthenticated.into_response();
    };

    match resolve_user(bearer.token(), &state.user_store, &state.token_keys) {
        Ok(user) => {
            request.extensions_mut().insert(user);
            next.run(request).await
        }
        Err(error) => error.into_response(),
    }
}

fn resolve_user<S: UserStore>(
    token: &str,
    store: &S,
    keys: &TokenKeys,
) -> Result<AuthenticatedUser, Error> {
    let claims = decode_token(token, keys)?;

    match store.get_by_name(&claims.sub) {
        Ok(user) => Ok(AuthenticatedUser {
            id: user.id,
            user_name: user.user_name,
        }),
        Err(Error::NotFound) => {
            tracing::debug!("Token names unknown user {}", claims.sub);
            Err(Error::Unauthenticated)
        }
        Err(error) => {
            tracing::error!("Could not look up user {} for token: {error}", claims.sub);
            Err(error)
        }
    }
}
