//! Defines the endpoints for the current user's account.

use axum::{Extension, Json, extract::State, response::IntoResponse, response::Response};
use serde_json::json;

use crate::{
    Error, Session,
    auth::SessionState,
    db::lock_connection,
    user::{delete_user, get_user_by_id},
};

/// A route handler for getting the current user.
pub async fn get_me_endpoint(
    State(state): State<SessionState>,
    Extension(session): Extension<Session>,
) -> Result<Response, Error> {
    let connection = lock_connection(&state.db_connection)?;
    let user = get_user_by_id(session.user_id, &connection)?;

    Ok(Json(json!({ "user": user })).into_response())
}

/// A route handler for deleting the current user's account.
///
/// Everything the user owns, including their access tokens, is deleted with
/// them.
pub async fn delete_me_endpoint(
    State(state): State<SessionState>,
    Extension(session): Extension<Session>,
) -> Result<Response, Error> {
    let connection = lock_connection(&state.db_connection)?;
    delete_user(session.user_id, &connection)?;

    tracing::info!("deleted user {}", session.user_id);

    Ok(Json(json!({ "message": "Account deleted successfully" })).into_response())
}
