//! Defines the endpoint for updating an entry in the current user's activity log.

use axum::{
    Extension,
    extract::{Path, State},
    http::StatusCode,
    response::Response,
};
use serde::{Deserialize, Deserializer};
use serde_json::Value;

use crate::{
    Error, Session, ValidationErrors,
    activity::{
        ActivityState,
        core::{ActivityLogId, ActivityUpdate, MAX_ACTIVITY_LENGTH, update_activity},
        create_endpoint::parse_activity_data,
    },
    db::lock_connection,
    extract::ApiJson,
    response::envelope,
};

/// The request body for updating an activity log entry. Omitted fields keep
/// their current value, an explicit `"data": null` clears the data.
#[derive(Debug, Deserialize)]
pub struct EditLogRequest {
    /// The new description.
    pub activity: Option<String>,
    /// The new structured detail.
    #[serde(default, deserialize_with = "present_or_null")]
    pub data: Option<Option<Value>>,
}

/// Distinguish a field that is present but `null` from one that is missing.
fn present_or_null<'de, D>(deserializer: D) -> Result<Option<Option<Value>>, D::Error>
where
    D: Deserializer<'de>,
{
    Option::<Value>::deserialize(deserializer).map(Some)
}

/// A route handler for updating an activity log entry owned by the current user.
pub async fn edit_log_endpoint(
    State(state): State<ActivityState>,
    Extension(session): Extension<Session>,
    Path(log_id): Path<ActivityLogId>,
    ApiJson(request): ApiJson<EditLogRequest>,
) -> Result<Response, Error> {
    let mut errors = ValidationErrors::default();
    if let Some(activity) = &request.activity {
        errors.check_required_text("activity", activity, MAX_ACTIVITY_LENGTH);
    }
    let data = request
        .data
        .map(|data| parse_activity_data(data, &mut errors));
    errors.into_result()?;

    let update = ActivityUpdate {
        activity: request.activity,
        data,
    };

    let connection = lock_connection(&state.db_connection)?;
    let entry = update_activity(log_id, session.user_id, update, &connection)?;

    Ok(envelope(StatusCode::OK, "Log updated successfully", entry))
}
