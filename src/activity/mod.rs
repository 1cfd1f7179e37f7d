//! The activity log: an audit trail of what each user has done.

mod core;
mod create_endpoint;
mod delete_endpoint;
mod edit_endpoint;
mod get_endpoint;
mod list_endpoint;

use std::sync::{Arc, Mutex};

use axum::extract::FromRef;
use rusqlite::Connection;

use crate::{AppState, pagination::PaginationConfig};

pub use core::{
    ActivityData, ActivityLogEntry, ActivityLogId, ActivityRecorder, MAX_ACTIVITY_DATA_DEPTH,
    count_user_activity, create_activity_log_table, insert_activity, list_user_activity,
    map_row_to_activity, record_activity,
};
pub use create_endpoint::create_log_endpoint;
pub use delete_endpoint::delete_log_endpoint;
pub use edit_endpoint::edit_log_endpoint;
pub use get_endpoint::get_log_endpoint;
pub use list_endpoint::{list_logs_endpoint, list_my_logs_endpoint};

/// The state needed by the activity log endpoints.
#[derive(Debug, Clone)]
pub struct ActivityState {
    /// The database connection for managing the activity log.
    pub db_connection: Arc<Mutex<Connection>>,
    /// The config that controls how to page the activity log.
    pub pagination_config: PaginationConfig,
}

impl FromRef<AppState> for ActivityState {
    fn from_ref(state: &AppState) -> Self {
        Self {
            db_connection: state.db_connection.clone(),
            pagination_config: state.pagination_config.clone(),
        }
    }
}
