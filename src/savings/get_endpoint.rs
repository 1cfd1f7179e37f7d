//! Defines the endpoint for getting a single savings account.

use axum::{
    Extension,
    extract::{Path, State},
    http::StatusCode,
    response::Response,
};

use crate::{
    Error, Session,
    db::lock_connection,
    response::envelope,
    savings::{
        SavingsState,
        core::{SavingsId, get_savings},
    },
};

/// A route handler for getting a savings account owned by the current user.
pub async fn get_savings_endpoint(
    State(state): State<SavingsState>,
    Extension(session): Extension<Session>,
    Path(savings_id): Path<SavingsId>,
) -> Result<Response, Error> {
    let connection = lock_connection(&state.db_connection)?;
    let account = get_savings(savings_id, session.user_id, &connection)?;

    Ok(envelope(StatusCode::OK, "Saving retrieved successfully", account))
}
