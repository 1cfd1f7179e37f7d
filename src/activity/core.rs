//! The activity log table, the structured data attached to entries and the
//! recorder used by the other endpoints to audit their changes.

use rusqlite::{
    Connection, Row,
    types::{FromSql, FromSqlError, FromSqlResult, ToSql, ToSqlOutput, ValueRef},
};
use serde::{Deserialize, Serialize, Serializer};
use serde_json::{Map, Value};
use time::OffsetDateTime;

use crate::{
    Error,
    database_id::DatabaseId,
    db::{escape_like, query_count},
    pagination::{Page, PageRequest},
    user::{UserID, UserSummary},
};

/// The ID of an entry in the activity log.
pub type ActivityLogId = DatabaseId;

/// The deepest that objects and arrays may be nested in [ActivityData],
/// counting the top-level object as depth 1.
pub const MAX_ACTIVITY_DATA_DEPTH: usize = 8;

/// The maximum number of characters in an activity description.
pub const MAX_ACTIVITY_LENGTH: usize = 255;

/// Why a JSON value cannot be used as [ActivityData].
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ActivityDataError {
    /// The value is a string, number, array, etc.
    #[error("The data field must be an object.")]
    NotAnObject,
    /// The value is nested deeper than [MAX_ACTIVITY_DATA_DEPTH].
    #[error("The data field must not be nested more than {MAX_ACTIVITY_DATA_DEPTH} levels deep.")]
    TooDeep,
}

/// Structured detail attached to an activity log entry: a JSON object with
/// string keys and arbitrary values, nested at most [MAX_ACTIVITY_DATA_DEPTH] deep.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(try_from = "Value")]
pub struct ActivityData(Map<String, Value>);

impl ActivityData {
    /// The key-value pairs of the data.
    pub fn as_map(&self) -> &Map<String, Value> {
        &self.0
    }

    /// Get the value for `key`.
    pub fn get(&self, key: &str) -> Option<&Value> {
        self.0.get(key)
    }
}

impl TryFrom<Value> for ActivityData {
    type Error = ActivityDataError;

    fn try_from(value: Value) -> Result<Self, Self::Error> {
        if json_depth(&value) > MAX_ACTIVITY_DATA_DEPTH {
            return Err(ActivityDataError::TooDeep);
        }

        match value {
            Value::Object(map) => Ok(Self(map)),
            _ => Err(ActivityDataError::NotAnObject),
        }
    }
}

impl Serialize for ActivityData {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        self.0.serialize(serializer)
    }
}

fn json_depth(value: &Value) -> usize {
    match value {
        Value::Object(map) => 1 + map.values().map(json_depth).max().unwrap_or(0),
        Value::Array(values) => 1 + values.iter().map(json_depth).max().unwrap_or(0),
        _ => 0,
    }
}

impl ToSql for ActivityData {
    fn to_sql(&self) -> rusqlite::Result<ToSqlOutput<'_>> {
        serde_json::to_string(&self.0)
            .map(ToSqlOutput::from)
            .map_err(|error| rusqlite::Error::ToSqlConversionFailure(Box::new(error)))
    }
}

impl FromSql for ActivityData {
    fn column_result(value: ValueRef<'_>) -> FromSqlResult<Self> {
        let json: Value = serde_json::from_str(value.as_str()?)
            .map_err(|error| FromSqlError::Other(Box::new(error)))?;

        ActivityData::try_from(json).map_err(|error| FromSqlError::Other(Box::new(error)))
    }
}

/// An entry in the activity log.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ActivityLogEntry {
    /// The ID of the entry.
    pub id: ActivityLogId,
    /// The user the activity belongs to.
    pub user_id: UserID,
    /// A short description of what happened, e.g. "Created new saving".
    pub activity: String,
    /// Structured detail about what happened.
    pub data: Option<ActivityData>,
    /// When the entry was created.
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
    /// When the entry was last changed.
    #[serde(with = "time::serde::rfc3339")]
    pub updated_at: OffsetDateTime,
    /// The name and email of the user, included in the activity feed.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub user: Option<UserSummary>,
}

/// Records activities on behalf of users.
pub trait ActivityRecorder {
    /// Add an entry to the activity log of `user_id`.
    ///
    /// # Errors
    ///
    /// Returns an error if the entry could not be saved.
    fn record(
        &self,
        user_id: UserID,
        activity: &str,
        data: Option<&ActivityData>,
    ) -> Result<ActivityLogId, Error>;
}

impl ActivityRecorder for Connection {
    fn record(
        &self,
        user_id: UserID,
        activity: &str,
        data: Option<&ActivityData>,
    ) -> Result<ActivityLogId, Error> {
        insert_activity(user_id, activity, data, self).map(|entry| entry.id)
    }
}

/// Record an activity for `user_id` after a change has been saved.
///
/// Failing to record the activity must not undo or fail the change, so errors
/// are logged and `None` is returned instead.
pub fn record_activity(
    recorder: &impl ActivityRecorder,
    user_id: UserID,
    activity: &str,
    data: Value,
) -> Option<ActivityLogId> {
    let data = match ActivityData::try_from(data) {
        Ok(data) => data,
        Err(error) => {
            tracing::error!("could not record activity \"{activity}\" for user {user_id}: {error}");
            return None;
        }
    };

    match recorder.record(user_id, activity, Some(&data)) {
        Ok(id) => Some(id),
        Err(error) => {
            tracing::error!("could not record activity \"{activity}\" for user {user_id}: {error}");
            None
        }
    }
}

/// Create the activity log table.
///
/// # Errors
///
/// This function will return an error if the SQL query failed.
pub fn create_activity_log_table(connection: &Connection) -> Result<(), rusqlite::Error> {
    connection.execute(
        "CREATE TABLE IF NOT EXISTS activity_log (
            id INTEGER PRIMARY KEY,
            user_id INTEGER NOT NULL,
            activity TEXT NOT NULL,
            data TEXT,
            created_at TEXT NOT NULL,
            updated_at TEXT NOT NULL,
            FOREIGN KEY(user_id) REFERENCES user(id) ON UPDATE CASCADE ON DELETE CASCADE
        )",
        (),
    )?;

    connection.execute(
        "CREATE INDEX IF NOT EXISTS idx_activity_log_user_created
        ON activity_log(user_id, created_at)",
        (),
    )?;

    Ok(())
}

const ENTRY_COLUMNS: &str = "activity_log.id, activity_log.user_id, activity_log.activity, \
    activity_log.data, activity_log.created_at, activity_log.updated_at";

/// Map a row with the columns in [ENTRY_COLUMNS] to an entry without user details.
pub fn map_row_to_activity(row: &Row) -> Result<ActivityLogEntry, rusqlite::Error> {
    Ok(ActivityLogEntry {
        id: row.get(0)?,
        user_id: row.get(1)?,
        activity: row.get(2)?,
        data: row.get(3)?,
        created_at: row.get(4)?,
        updated_at: row.get(5)?,
        user: None,
    })
}

/// Map a row with the columns in [ENTRY_COLUMNS] followed by the user's name
/// and email to an entry with user details.
fn map_row_to_activity_with_user(row: &Row) -> Result<ActivityLogEntry, rusqlite::Error> {
    let mut entry = map_row_to_activity(row)?;
    let name: Option<String> = row.get(6)?;
    let email: Option<String> = row.get(7)?;

    entry.user = name.zip(email).map(|(name, email)| UserSummary {
        id: entry.user_id,
        name,
        email,
    });

    Ok(entry)
}

/// Add an entry to the activity log of `user_id`.
///
/// # Errors
///
/// Returns an [Error::SqlError] if the entry could not be inserted.
pub fn insert_activity(
    user_id: UserID,
    activity: &str,
    data: Option<&ActivityData>,
    connection: &Connection,
) -> Result<ActivityLogEntry, Error> {
    let now = OffsetDateTime::now_utc();

    connection.execute(
        "INSERT INTO activity_log (user_id, activity, data, created_at, updated_at)
        VALUES (?1, ?2, ?3, ?4, ?4)",
        (user_id, activity, data, now),
    )?;

    Ok(ActivityLogEntry {
        id: connection.last_insert_rowid(),
        user_id,
        activity: activity.to_owned(),
        data: data.cloned(),
        created_at: now,
        updated_at: now,
        user: None,
    })
}

/// Get the entry `id` if it belongs to `user_id`.
///
/// # Errors
///
/// Returns an [Error::NotFound] if the entry does not exist or belongs to another user.
pub fn get_activity(
    id: ActivityLogId,
    user_id: UserID,
    connection: &Connection,
) -> Result<ActivityLogEntry, Error> {
    connection
        .query_row(
            &format!(
                "SELECT {ENTRY_COLUMNS}, user.name, user.email
                FROM activity_log LEFT JOIN user ON user.id = activity_log.user_id
                WHERE activity_log.id = ?1 AND activity_log.user_id = ?2"
            ),
            (id, user_id),
            map_row_to_activity_with_user,
        )
        .map_err(Error::from)
}

/// The changes to make to an activity log entry.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ActivityUpdate {
    /// The new description, if it should change.
    pub activity: Option<String>,
    /// The new data, if it should change. `Some(None)` clears the data.
    pub data: Option<Option<ActivityData>>,
}

/// Apply `update` to the entry `id` owned by `user_id` and return the updated entry.
///
/// # Errors
///
/// Returns an [Error::NotFound] if the entry does not exist or belongs to another user.
pub fn update_activity(
    id: ActivityLogId,
    user_id: UserID,
    update: ActivityUpdate,
    connection: &Connection,
) -> Result<ActivityLogEntry, Error> {
    let mut entry = get_activity(id, user_id, connection)?;

    if let Some(activity) = update.activity {
        entry.activity = activity;
    }
    if let Some(data) = update.data {
        entry.data = data;
    }
    entry.updated_at = OffsetDateTime::now_utc();

    connection.execute(
        "UPDATE activity_log SET activity = ?1, data = ?2, updated_at = ?3
        WHERE id = ?4 AND user_id = ?5",
        (&entry.activity, &entry.data, entry.updated_at, id, user_id),
    )?;

    Ok(entry)
}

type RowsAffected = usize;

/// Delete the entry `id` owned by `user_id`.
///
/// # Errors
///
/// Returns an [Error::SqlError] if the query failed.
pub fn delete_activity(
    id: ActivityLogId,
    user_id: UserID,
    connection: &Connection,
) -> Result<RowsAffected, Error> {
    connection
        .execute(
            "DELETE FROM activity_log WHERE id = ?1 AND user_id = ?2",
            (id, user_id),
        )
        .map_err(Error::from)
}

/// Which entries to include in the activity feed.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ActivityFilter {
    /// Only include entries whose description contains this text.
    pub activity: Option<String>,
    /// Only include entries belonging to this user.
    pub user_id: Option<UserID>,
}

/// Get a page of the activity feed across all users, newest first, with the
/// name and email of each entry's user.
///
/// # Errors
///
/// Returns an [Error::SqlError] if the query failed.
pub fn list_activity(
    filter: &ActivityFilter,
    page: PageRequest,
    connection: &Connection,
) -> Result<Page<ActivityLogEntry>, Error> {
    let pattern = filter
        .activity
        .as_ref()
        .map(|activity| format!("%{}%", escape_like(activity)));
    let where_clause = "(?1 IS NULL OR activity_log.activity LIKE ?1 ESCAPE '\\')
        AND (?2 IS NULL OR activity_log.user_id = ?2)";

    let total = query_count(
        connection,
        &format!("SELECT COUNT(activity_log.id) FROM activity_log WHERE {where_clause}"),
        (&pattern, filter.user_id),
    )?;

    let entries = connection
        .prepare(&format!(
            "SELECT {ENTRY_COLUMNS}, user.name, user.email
            FROM activity_log LEFT JOIN user ON user.id = activity_log.user_id
            WHERE {where_clause}
            ORDER BY activity_log.created_at DESC, activity_log.id DESC
            LIMIT {} OFFSET {}",
            page.per_page,
            page.offset()
        ))?
        .query_map((&pattern, filter.user_id), map_row_to_activity_with_user)?
        .collect::<Result<Vec<_>, _>>()?;

    Ok(page.into_page(total, entries))
}

/// Get a page of the activity log of `user_id`, newest first.
///
/// # Errors
///
/// Returns an [Error::SqlError] if the query failed.
pub fn list_user_activity(
    user_id: UserID,
    page: PageRequest,
    connection: &Connection,
) -> Result<Page<ActivityLogEntry>, Error> {
    let total = count_user_activity(user_id, connection)?;

    let entries = connection
        .prepare(&format!(
            "SELECT {ENTRY_COLUMNS} FROM activity_log
            WHERE activity_log.user_id = ?1
            ORDER BY activity_log.created_at DESC, activity_log.id DESC
            LIMIT {} OFFSET {}",
            page.per_page,
            page.offset()
        ))?
        .query_map((user_id,), map_row_to_activity)?
        .collect::<Result<Vec<_>, _>>()?;

    Ok(page.into_page(total, entries))
}

/// Count the entries in the activity log of `user_id`.
///
/// # Errors
///
/// Returns an [Error::SqlError] if the query failed.
pub fn count_user_activity(user_id: UserID, connection: &Connection) -> Result<u64, Error> {
    query_count(
        connection,
        "SELECT COUNT(id) FROM activity_log WHERE user_id = ?1",
        (user_id,),
    )
}


#[cfg(test)]
mod recorder_tests {
    use serde_json::json;

    use crate::{
        Error,
        test_utils::{create_test_user, get_test_connection},
        user::UserID,
    };

    use super::{ActivityData, ActivityLogId, ActivityRecorder, get_activity, record_activity};

    struct FailingRecorder;

    impl ActivityRecorder for FailingRecorder {
        fn record(
            &self,
            _user_id: UserID,
            _activity: &str,
            _data: Option<&ActivityData>,
        ) -> Result<ActivityLogId, Error> {
            Err(Error::DatabaseLockError)
        }
    }

    #[test]
    fn records_activity_with_data() {
        let connection = get_test_connection();
        let user = create_test_user(&connection, "ahmad@example.com");

        let id = record_activity(
            &connection,
            user.id,
            "Created new saving",
            json!({ "saving_id": 1 }),
        )
        .expect("activity should be recorded");

        let entry = get_activity(id, user.id, &connection).unwrap();
        assert_eq!(entry.activity, "Created new saving");
        assert_eq!(entry.data.unwrap().get("saving_id"), Some(&json!(1)));
    }

    #[test]
    fn failing_recorder_returns_none() {
        let id = record_activity(
            &FailingRecorder,
            UserID::new(1),
            "Created new saving",
            json!({}),
        );

        assert_eq!(id, None);
    }

    #[test]
    fn invalid_data_is_not_recorded() {
        let connection = get_test_connection();
        let user = create_test_user(&connection, "ahmad@example.com");

        let id = record_activity(&connection, user.id, "Created new saving", json!("oops"));

        assert_eq!(id, None);
    }
}
