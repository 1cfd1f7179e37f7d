//! Defines the endpoint for getting a single entry of the current user's activity log.

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
        core::{ActivityLogId, get_activity},
    },
    db::lock_connection,
    response::envelope,
};

/// A route handler for getting an activity log entry owned by the current user.
///
/// Entries belonging to other users are reported as not found.
pub async fn get_log_endpoint(
    State(state): State<ActivityState>,
    Extension(session): Extension<Session>,
    Path(log_id): Path<ActivityLogId>,
) -> Result<Response, Error> {
    let connection = lock_connection(&state.db_connection)?;
    let entry = get_activity(log_id, session.user_id, &connection)?;

    Ok(envelope(StatusCode::OK, "Log retrieved successfully", entry))
}
