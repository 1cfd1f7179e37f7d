//! Defines the endpoint for deleting a wish.

use axum::{
    Extension,
    extract::{Path, State},
    http::StatusCode,
    response::Response,
};
use serde_json::json;

use crate::{
    Error, Session,
    activity::record_activity,
    db::lock_connection,
    response::message,
    wish::{
        WishState,
        core::{WishId, delete_wish},
    },
};

/// A route handler for deleting a wish owned by the current user.
pub async fn delete_wish_endpoint(
    State(state): State<WishState>,
    Extension(session): Extension<Session>,
    Path(wish_id): Path<WishId>,
) -> Result<Response, Error> {
    let connection = lock_connection(&state.db_connection)?;
    let deleted = delete_wish(wish_id, session.user_id, &connection)?;

    record_activity(
        &*connection,
        session.user_id,
        "Deleted wish",
        json!({
            "wish_id": deleted.id,
            "wish_name": deleted.name,
            "deleted_data": deleted,
        }),
    );

    Ok(message(StatusCode::OK, "Wish deleted successfully"))
}
