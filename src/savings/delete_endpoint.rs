//! Defines the endpoint for deleting a savings account.

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
    savings::{
        SavingsState,
        core::{SavingsId, delete_savings},
    },
};

/// A route handler for deleting a savings account owned by the current user.
pub async fn delete_savings_endpoint(
    State(state): State<SavingsState>,
    Extension(session): Extension<Session>,
    Path(savings_id): Path<SavingsId>,
) -> Result<Response, Error> {
    let connection = lock_connection(&state.db_connection)?;
    let tx = connection.unchecked_transaction()?;
    let deleted = delete_savings(savings_id, session.user_id, &tx)?;
    state
        .wish_funding_policy
        .refresh_after_savings_change(session.user_id, &tx)?;
    tx.commit()?;

    record_activity(
        &*connection,
        session.user_id,
        "Deleted saving",
        json!({
            "saving_id": deleted.id,
            "bank": deleted.bank,
            "deleted_data": deleted,
        }),
    );

    Ok(message(StatusCode::OK, "Saving deleted successfully"))
}
