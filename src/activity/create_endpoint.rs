//! Defines the endpoint for adding an entry to the current user's activity log.

use axum::{
    Extension,
    extract::State,
    http::StatusCode,
    response::Response,
};
use serde::Deserialize;
use serde_json::Value;

use crate::{
    Error, Session, ValidationErrors,
    activity::{
        ActivityState,
        core::{ActivityData, MAX_ACTIVITY_LENGTH, insert_activity},
    },
    db::lock_connection,
    extract::ApiJson,
    response::envelope,
};

/// The request body for creating an activity log entry.
#[derive(Debug, Deserialize)]
pub struct CreateLogRequest {
    /// A short description of what happened.
    #[serde(default)]
    pub activity: String,
    /// Structured detail about what happened.
    pub data: Option<Value>,
}

/// A route handler for adding an entry to the current user's activity log.
pub async fn create_log_endpoint(
    State(state): State<ActivityState>,
    Extension(session): Extension<Session>,
    ApiJson(request): ApiJson<CreateLogRequest>,
) -> Result<Response, Error> {
    let mut errors = ValidationErrors::default();
    errors.check_required_text("activity", &request.activity, MAX_ACTIVITY_LENGTH);
    let data = parse_activity_data(request.data, &mut errors);
    errors.into_result()?;

    let connection = lock_connection(&state.db_connection)?;
    let entry = insert_activity(session.user_id, &request.activity, data.as_ref(), &connection)?;

    Ok(envelope(StatusCode::CREATED, "Log created successfully", entry))
}

/// Convert the `data` field of a request, treating `null` as no data.
///
/// Invalid data is reported in `errors` and `None` is returned.
pub(super) fn parse_activity_data(
    value: Option<Value>,
    errors: &mut ValidationErrors,
) -> Option<ActivityData> {
    match value {
        None | Some(Value::Null) => None,
        Some(value) => match ActivityData::try_from(value) {
            Ok(data) => Some(data),
            Err(error) => {
                errors.add("data", error.to_string());
                None
            }
        },
    }
}
