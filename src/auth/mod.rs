//! Registration, log-in and bearer token authentication.

mod client_ip;
mod log_in;
mod log_out;
mod me;
mod middleware;
mod register;
mod token;

use std::sync::{Arc, Mutex};

use axum::{
    Json,
    extract::FromRef,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use rusqlite::Connection;
use serde::Serialize;
use time::Duration;

use crate::{AppState, user::User};

pub use client_ip::ClientIp;
pub use log_in::log_in_endpoint;
pub use log_out::log_out_endpoint;
pub use me::{delete_me_endpoint, get_me_endpoint};
pub use middleware::{AuthState, auth_guard};
pub use register::register_endpoint;
pub use token::{
    AccessToken, DEFAULT_TOKEN_DURATION, JwtKeys, Session, create_access_token_table, issue_token,
};

/// The state needed by the endpoints that issue, revoke or inspect access tokens.
#[derive(Debug, Clone)]
pub struct SessionState {
    /// The keys for signing access tokens.
    pub jwt_keys: JwtKeys,
    /// How long newly issued access tokens are valid for.
    pub token_duration: Duration,
    /// The database connection for managing users and tokens.
    pub db_connection: Arc<Mutex<Connection>>,
}

impl FromRef<AppState> for SessionState {
    fn from_ref(state: &AppState) -> Self {
        Self {
            jwt_keys: state.jwt_keys.clone(),
            token_duration: state.token_duration,
            db_connection: state.db_connection.clone(),
        }
    }
}

/// The body sent to a client that has just registered or logged in.
#[derive(Debug, Serialize)]
struct TokenResponse<'a> {
    message: &'a str,
    user: &'a User,
    access_token: &'a str,
    token_type: &'static str,
}

fn token_response(status: StatusCode, message: &str, user: &User, token: &AccessToken) -> Response {
    let body = TokenResponse {
        message,
        user,
        access_token: &token.token,
        token_type: "Bearer",
    };

    (status, Json(body)).into_response()
}
