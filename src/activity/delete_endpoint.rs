//! Defines the endpoint for deleting an entry from the current user's activity log.

use axum::{
    Extension,
    extract::{Path, State},
    http::StatusCode,
    response::Response,
};

use crate::{
    Error, Session,
    activity::{
        ActivityState,
        core::{ActivityLogId, delete_activity},
    },
    db::lock_connection,
    response::message,
};

/// A route handler for deleting an activity log entry owned by the current user.
pub async fn delete_log_endpoint(
    State(state): State<ActivityState>,
    Extension(session): Extension<Session>,
    Path(log_id): Path<ActivityLogId>,
) -> Result<Response, Error> {
    let connection = lock_connection(&state.db_connection)?;

    match delete_activity(log_id, session.user_id, &connection)? {
        0 => Err(Error::NotFound),
        _ => Ok(message(StatusCode::OK, "Log deleted successfully")),
    }
}
