//! Creates the application's tables and provides access to the shared database connection.

use std::sync::{Mutex, MutexGuard};

use rusqlite::{Connection, Params, Transaction, TransactionBehavior};

use crate::{
    Error,
    activity::create_activity_log_table,
    auth::create_access_token_table,
    savings::create_savings_table,
    user::create_user_table,
    wish::create_wish_table,
};

/// Create the tables for the domain models if they do not already exist.
///
/// Foreign key enforcement is switched on for `connection` so that deleting a
/// user also deletes everything the user owns.
///
/// # Errors
///
/// Returns an [Error::SqlError] if any of the tables could not be created.
pub fn initialize(connection: &Connection) -> Result<(), Error> {
    // Pragmas have no effect inside a transaction.
    connection.execute_batch("PRAGMA foreign_keys = ON;")?;

    let transaction = Transaction::new_unchecked(connection, TransactionBehavior::Exclusive)?;

    create_user_table(&transaction)?;
    create_access_token_table(&transaction)?;
    create_savings_table(&transaction)?;
    create_wish_table(&transaction)?;
    create_activity_log_table(&transaction)?;

    transaction.commit()?;

    Ok(())
}

/// Acquire the lock on the shared database connection.
///
/// # Errors
///
/// Returns an [Error::DatabaseLockError] if the lock has been poisoned.
pub fn lock_connection(
    connection: &Mutex<Connection>,
) -> Result<MutexGuard<'_, Connection>, Error> {
    connection.lock().map_err(|error| {
        tracing::error!("could not acquire database lock: {error}");
        Error::DatabaseLockError
    })
}

/// Run a `SELECT COUNT(...)` query that returns a single row.
///
/// # Errors
///
/// Returns an [Error::SqlError] if the query failed.
pub fn query_count<P: Params>(connection: &Connection, sql: &str, params: P) -> Result<u64, Error> {
    let count: i64 = connection.query_row(sql, params, |row| row.get(0))?;

    Ok(u64::try_from(count).unwrap_or_default())
}

/// Escape the wildcards in `text` for a `LIKE ... ESCAPE '\\'` pattern.
pub fn escape_like(text: &str) -> String {
    text.replace('\\', "\\\\")
        .replace('%', "\\%")
        .replace('_', "\\_")
}

#[cfg(test)]
mod tests {
    use rusqlite::Connection;

    use super::{escape_like, initialize};

    #[test]
    fn escapes_like_wildcards() {
        assert_eq!(escape_like(r"50%_off\"), r"50\%\_off\\");
    }

    #[test]
    fn creates_all_tables() {
        let connection = Connection::open_in_memory().unwrap();

        initialize(&connection).unwrap();

        let mut tables: Vec<String> = connection
            .prepare("SELECT name FROM sqlite_master WHERE type = 'table' ORDER BY name")
            .unwrap()
            .query_map([], |row| row.get(0))
            .unwrap()
            .collect::<Result<_, _>>()
            .unwrap();
        tables.sort();

        assert_eq!(
            tables,
            ["access_token", "activity_log", "savings", "user", "wish"]
        );
    }

    #[test]
    fn initialize_is_idempotent() {
        let connection = Connection::open_in_memory().unwrap();

        initialize(&connection).unwrap();

        assert_eq!(initialize(&connection), Ok(()));
    }

    #[test]
    fn enables_foreign_keys() {
        let connection = Connection::open_in_memory().unwrap();

        initialize(&connection).unwrap();

        let enabled: bool = connection
            .query_row("PRAGMA foreign_keys", [], |row| row.get(0))
            .unwrap();
        assert!(enabled);
    }
}
