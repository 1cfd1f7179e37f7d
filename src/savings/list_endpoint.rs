//! Defines the endpoint for listing the current user's savings accounts.

use axum::{Extension, extract::State, http::StatusCode, response::Response};
use serde::{Deserialize, Serialize};

use crate::{
    Error, Session,
    db::lock_connection,
    extract::ApiQuery,
    pagination::SortOrder,
    response::envelope,
    savings::{
        SavingsState,
        core::{SavingsAccount, SavingsFilter, SavingsSummary, list_savings},
    },
};

/// The filters for listing savings accounts.
#[derive(Debug, Default, Deserialize)]
pub struct SavingsQuery {
    /// Only include accounts whose bank contains this text.
    pub bank: Option<String>,
    /// The order to list the accounts in.
    pub sort: Option<SortOrder>,
}

/// The savings accounts and their totals.
#[derive(Debug, Serialize)]
struct SavingsList {
    savings: Vec<SavingsAccount>,
    summary: SavingsSummary,
}

/// A route handler for listing the current user's savings accounts with
/// totals over the listed accounts.
pub async fn list_savings_endpoint(
    State(state): State<SavingsState>,
    Extension(session): Extension<Session>,
    ApiQuery(query): ApiQuery<SavingsQuery>,
) -> Result<Response, Error> {
    let filter = SavingsFilter {
        bank: query.bank.filter(|bank| !bank.trim().is_empty()),
        sort: query.sort.unwrap_or_default(),
    };

    let connection = lock_connection(&state.db_connection)?;
    let savings = list_savings(session.user_id, &filter, &connection)?;
    let summary = SavingsSummary::new(&savings);

    Ok(envelope(
        StatusCode::OK,
        "Savings retrieved successfully",
        SavingsList { savings, summary },
    ))
}
