//! Authentication middleware that validates bearer tokens.

use std::sync::{Arc, Mutex};

use axum::{
    extract::{FromRef, Request, State},
    http::HeaderMap,
    middleware::Next,
    response::{IntoResponse, Response},
};
use axum_extra::headers::{Authorization, HeaderMapExt, authorization::Bearer};
use rusqlite::Connection;

use crate::{
    AppState, Error,
    auth::token::{JwtKeys, Session, decode_token, token_is_active},
    db::lock_connection,
};

/// The state needed for the auth middleware
#[derive(Debug, Clone)]
pub struct AuthState {
    /// The keys for verifying access tokens.
    pub jwt_keys: JwtKeys,
    /// The database connection for checking that tokens have not been revoked.
    pub db_connection: Arc<Mutex<Connection>>,
}

impl FromRef<AppState> for AuthState {
    fn from_ref(state: &AppState) -> Self {
        Self {
            jwt_keys: state.jwt_keys.clone(),
            db_connection: state.db_connection.clone(),
        }
    }
}

/// Middleware function that checks for a valid bearer token in the `Authorization` header.
///
/// The [Session] is placed into the request and the request executed normally if the token is
/// valid, otherwise a 401 response is returned.
///
/// **Note**: Route handlers can use the function argument `Extension(session): Extension<Session>`
/// to receive the session.
pub async fn auth_guard(
    State(state): State<AuthState>,
    mut request: Request,
    next: Next,
) -> Response {
    match authenticate(&state, request.headers()) {
        Ok(session) => {
            request.extensions_mut().insert(session);
            next.run(request).await
        }
        Err(error) => error.into_response(),
    }
}

fn authenticate(state: &AuthState, headers: &HeaderMap) -> Result<Session, Error> {
    let Some(Authorization(bearer)) = headers.typed_get::<Authorization<Bearer>>() else {
        return Err(Error::Unauthenticated);
    };

    let session = decode_token(bearer.token(), &state.jwt_keys)?.session()?;

    let connection = lock_connection(&state.db_connection)?;
    if !token_is_active(session.token_id, session.user_id, &connection)? {
        tracing::debug!(
            "access token {} for user {} has expired or been revoked",
            session.token_id,
            session.user_id
        );
        return Err(Error::Unauthenticated);
    }

    Ok(session)
}
