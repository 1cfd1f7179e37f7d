//! Defines the endpoint for revoking the access token a request was made with.

use axum::{Extension, Json, extract::State, response::IntoResponse, response::Response};
use serde_json::json;

use crate::{
    Error, Session,
    activity::record_activity,
    auth::{SessionState, token::revoke_token},
    db::lock_connection,
    user::get_user_by_id,
};

/// A route handler for logging out.
///
/// Only the token used for this request is revoked, other sessions of the
/// same user stay logged in.
pub async fn log_out_endpoint(
    State(state): State<SessionState>,
    Extension(session): Extension<Session>,
) -> Result<Response, Error> {
    let connection = lock_connection(&state.db_connection)?;
    let user = get_user_by_id(session.user_id, &connection)?;

    revoke_token(session.token_id, &connection)?;

    record_activity(
        &*connection,
        user.id,
        "User logged out",
        json!({ "email": user.email }),
    );

    Ok(Json(json!({ "message": "Logout successful" })).into_response())
}
