//! Defines the endpoint for listing the current user's wishes.

use axum::{Extension, extract::State, http::StatusCode, response::Response};
use serde::{Deserialize, Serialize};

use crate::{
    Error, Session,
    db::lock_connection,
    extract::ApiQuery,
    funding::WishStatus,
    money::Money,
    pagination::SortOrder,
    response::envelope,
    savings::get_aggregate_balance,
    wish::{
        WishState,
        core::{WishFilter, WishView, list_wishes},
    },
};

/// The filters for listing wishes.
#[derive(Debug, Default, Deserialize)]
pub struct WishQuery {
    /// Only include wishes with this stored status.
    pub status: Option<WishStatus>,
    /// The order to list the wishes in.
    pub sort: Option<SortOrder>,
}

#[derive(Debug, Serialize)]
struct WishList {
    wishes: Vec<WishView>,
    aggregate_balance: Money,
}

/// A route handler for listing the current user's wishes, each with its
/// funding against the current savings balance.
pub async fn list_wishes_endpoint(
    State(state): State<WishState>,
    Extension(session): Extension<Session>,
    ApiQuery(query): ApiQuery<WishQuery>,
) -> Result<Response, Error> {
    let filter = WishFilter {
        status: query.status,
        sort: query.sort.unwrap_or_default(),
    };

    let connection = lock_connection(&state.db_connection)?;
    let balance = get_aggregate_balance(session.user_id, &connection)?;
    let wishes = list_wishes(session.user_id, &filter, &connection)?
        .into_iter()
        .map(|wish| WishView::new(wish, balance))
        .collect();

    Ok(envelope(
        StatusCode::OK,
        "Wishes retrieved successfully",
        WishList {
            wishes,
            aggregate_balance: balance,
        },
    ))
}
