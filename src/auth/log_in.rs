//! Defines the endpoint for logging in with an email and password.

use axum::{extract::State, http::StatusCode, response::Response};
use serde::Deserialize;
use serde_json::json;

use crate::{
    Error, ValidationErrors,
    activity::record_activity,
    auth::{ClientIp, SessionState, token::issue_token, token_response},
    db::lock_connection,
    extract::ApiJson,
    user::get_user_by_email,
};

/// The request body for logging in.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct LogInRequest {
    /// The email address the user registered with.
    pub email: String,
    /// The user's password.
    pub password: String,
}

/// A route handler for exchanging an email and password for an access token.
///
/// An unknown email and a wrong password give the same
/// [Error::InvalidCredentials] so that registered emails are not leaked.
pub async fn log_in_endpoint(
    State(state): State<SessionState>,
    ClientIp(ip_address): ClientIp,
    ApiJson(request): ApiJson<LogInRequest>,
) -> Result<Response, Error> {
    let mut errors = ValidationErrors::default();
    if request.email.trim().is_empty() {
        errors.add("email", "The email field is required.");
    }
    if request.password.is_empty() {
        errors.add("password", "The password field is required.");
    }
    errors.into_result()?;

    let connection = lock_connection(&state.db_connection)?;

    let user = match get_user_by_email(request.email.trim(), &connection) {
        Ok(user) => user,
        Err(Error::NotFound) => return Err(Error::InvalidCredentials),
        Err(error) => return Err(error),
    };

    let is_password_valid = user
        .password_hash
        .verify(&request.password)
        .map_err(|error| Error::HashingError(error.to_string()))?;
    if !is_password_valid {
        tracing::debug!("failed log-in attempt for user {}", user.id);
        return Err(Error::InvalidCredentials);
    }

    let token = issue_token(user.id, state.token_duration, &state.jwt_keys, &connection)?;

    record_activity(
        &*connection,
        user.id,
        "User logged in",
        json!({ "email": user.email, "ip_address": ip_address }),
    );

    Ok(token_response(StatusCode::OK, "Login successful", &user, &token))
}
