//! Implements a struct that holds the state of the REST server.

use std::sync::{Arc, Mutex};

use rusqlite::Connection;
use time::Duration;

use crate::{
    Error,
    auth::{DEFAULT_TOKEN_DURATION, JwtKeys},
    db::initialize,
    pagination::PaginationConfig,
    wish::WishFundingPolicy,
};

/// The state of the REST server.
#[derive(Debug, Clone)]
pub struct AppState {
    /// The keys for signing and verifying access tokens.
    pub jwt_keys: JwtKeys,

    /// The duration for which access tokens are valid.
    pub token_duration: Duration,

    /// The config that controls how to page lists of data.
    pub pagination_config: PaginationConfig,

    /// How the funding of wishes is decided.
    pub wish_funding_policy: WishFundingPolicy,

    /// The database connection
    pub db_connection: Arc<Mutex<Connection>>,
}

impl AppState {
    /// Create a new [AppState] with a SQLite database connection.
    ///
    /// This function will initialize the database by adding the tables for the domain models.
    /// Access tokens are signed with a key derived from `token_secret`.
    ///
    /// # Errors
    /// Returns an error if the database cannot be initialized.
    pub fn new(
        db_connection: Connection,
        token_secret: &str,
        pagination_config: PaginationConfig,
        wish_funding_policy: WishFundingPolicy,
    ) -> Result<Self, Error> {
        initialize(&db_connection)?;

        Ok(Self {
            jwt_keys: JwtKeys::new(token_secret),
            token_duration: DEFAULT_TOKEN_DURATION,
            pagination_config,
            wish_funding_policy,
            db_connection: Arc::new(Mutex::new(db_connection)),
        })
    }

    /// Use `token_duration` for newly issued access tokens.
    pub fn with_token_duration(mut self, token_duration: Duration) -> Self {
        self.token_duration = token_duration;
        self
    }
}
