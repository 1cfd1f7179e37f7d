//! Defines the endpoints for listing the activity feed and the current user's activity log.

use axum::{
    Extension,
    extract::State,
    http::StatusCode,
    response::Response,
};
use serde::Deserialize;

use crate::{
    Error, Session,
    activity::{
        ActivityState,
        core::{ActivityFilter, list_activity, list_user_activity},
    },
    db::lock_connection,
    extract::ApiQuery,
    pagination::PageRequest,
    response::envelope,
    user::UserID,
};

/// The filters and page for the activity feed.
#[derive(Debug, Default, Deserialize)]
pub struct LogsQuery {
    /// Only include entries whose description contains this text.
    pub activity: Option<String>,
    /// Only include entries belonging to this user.
    pub user_id: Option<i64>,
    /// The page number, starting from 1.
    pub page: Option<u64>,
    /// The number of entries per page.
    pub per_page: Option<u64>,
}

/// A route handler for the activity feed across all users, newest first.
pub async fn list_logs_endpoint(
    State(state): State<ActivityState>,
    ApiQuery(query): ApiQuery<LogsQuery>,
) -> Result<Response, Error> {
    let filter = ActivityFilter {
        activity: query.activity.filter(|activity| !activity.is_empty()),
        user_id: query.user_id.map(UserID::new),
    };
    let page = PageRequest::new(query.page, query.per_page, &state.pagination_config);

    let connection = lock_connection(&state.db_connection)?;
    let logs = list_activity(&filter, page, &connection)?;

    Ok(envelope(StatusCode::OK, "Logs retrieved successfully", logs))
}

/// The page of the current user's activity log.
#[derive(Debug, Default, Deserialize)]
pub struct MyLogsQuery {
    /// The page number, starting from 1.
    pub page: Option<u64>,
    /// The number of entries per page.
    pub per_page: Option<u64>,
}

/// A route handler for the current user's activity log, newest first.
pub async fn list_my_logs_endpoint(
    State(state): State<ActivityState>,
    Extension(session): Extension<Session>,
    ApiQuery(query): ApiQuery<MyLogsQuery>,
) -> Result<Response, Error> {
    let page = PageRequest::new(query.page, query.per_page, &state.pagination_config);

    let connection = lock_connection(&state.db_connection)?;
    let logs = list_user_activity(session.user_id, page, &connection)?;

    Ok(envelope(StatusCode::OK, "User logs retrieved successfully", logs))
}
