#![allow(missing_docs)]

use axum_test::TestServer;
use email_address::EmailAddress;
use rusqlite::Connection;

use crate::{
    AppState, PasswordHash, WishFundingPolicy,
    activity::ActivityLogEntry,
    auth::issue_token,
    build_router,
    db::initialize,
    pagination::PaginationConfig,
    user::{NewUser, User, UserID, create_user},
};

/// The password of every user created by [create_test_user].
pub(crate) const TEST_PASSWORD: &str = "password123";

/// The lowest cost bcrypt accepts, so tests do not spend their time hashing.
const TEST_HASH_COST: u32 = 4;

pub(crate) fn get_test_connection() -> Connection {
    let connection =
        Connection::open_in_memory().expect("Could not open in-memory SQLite database");
    initialize(&connection).expect("Could not initialize database");
    connection
}

#[track_caller]
pub(crate) fn create_test_user(connection: &Connection, email: &str) -> User {
    let name = email.split('@').next().unwrap_or(email).to_owned();
    let password_hash = PasswordHash::from_raw_password(TEST_PASSWORD, TEST_HASH_COST)
        .expect("Could not hash test password");

    create_user(
        NewUser {
            name,
            email: EmailAddress::new_unchecked(email),
            password_hash,
            avatar: None,
            phone_number: None,
        },
        connection,
    )
    .expect("Could not create test user")
}

pub(crate) fn get_test_state() -> AppState {
    get_test_state_with_policy(WishFundingPolicy::default())
}

pub(crate) fn get_test_state_with_policy(policy: WishFundingPolicy) -> AppState {
    let connection =
        Connection::open_in_memory().expect("Could not open in-memory SQLite database");

    AppState::new(connection, "foobar", PaginationConfig::default(), policy)
        .expect("Could not create app state")
}

pub(crate) fn get_test_server(state: &AppState) -> TestServer {
    TestServer::try_new(build_router(state.clone())).expect("Could not create test server")
}

/// Create a user and issue an access token for them.
#[track_caller]
pub(crate) fn create_user_with_token(state: &AppState, email: &str) -> (User, String) {
    let connection = state.db_connection.lock().unwrap();
    let user = create_test_user(&connection, email);
    let token = issue_token(user.id, state.token_duration, &state.jwt_keys, &connection)
        .expect("Could not issue test token");

    (user, token.token)
}

/// Get every activity log entry of `user_id`, newest first.
#[track_caller]
pub(crate) fn must_get_activities(state: &AppState, user_id: UserID) -> Vec<ActivityLogEntry> {
    let connection = state.db_connection.lock().unwrap();

    connection
        .prepare(
            "SELECT id, user_id, activity, data, created_at, updated_at FROM activity_log
            WHERE user_id = ?1 ORDER BY created_at DESC, id DESC",
        )
        .unwrap()
        .query_map((user_id,), crate::activity::map_row_to_activity)
        .unwrap()
        .collect::<Result<_, _>>()
        .expect("Could not get activity log")
}
