//! Bearer tokens for authenticating API requests.
//!
//! A token is a JSON Web Token naming the user (`sub`) and a row in the
//! `access_token` table (`jti`). Deleting that row revokes the token even
//! though the JWT itself has not expired.

use jsonwebtoken::{DecodingKey, EncodingKey, Header, Validation, decode, encode};
use rusqlite::Connection;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha512};
use time::{Duration, OffsetDateTime};

use crate::{Error, database_id::DatabaseId, user::UserID};

/// How long a newly issued access token is valid for.
pub const DEFAULT_TOKEN_DURATION: Duration = Duration::days(7);

/// The ID of a row in the `access_token` table.
pub type AccessTokenId = DatabaseId;

/// The keys used for signing and verifying access tokens.
#[derive(Clone)]
pub struct JwtKeys {
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
}

impl JwtKeys {
    /// Create the signing keys from a `secret` string.
    ///
    /// The secret is hashed with SHA-512 so that short secrets still give a
    /// full length key.
    pub fn new(secret: &str) -> Self {
        let hash = Sha512::digest(secret);

        Self {
            encoding_key: EncodingKey::from_secret(&hash),
            decoding_key: DecodingKey::from_secret(&hash),
        }
    }
}

impl std::fmt::Debug for JwtKeys {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("JwtKeys { .. }")
    }
}

/// The contents of a JSON Web Token.
#[derive(Debug, Serialize, Deserialize, PartialEq)]
pub struct Claims {
    /// The ID of the user the token was issued to.
    pub sub: String,
    /// The ID of the access token row.
    pub jti: AccessTokenId,
    /// The time the token was issued as a Unix timestamp.
    pub iat: i64,
    /// The expiry time of the token as a Unix timestamp.
    pub exp: i64,
}

/// The authenticated user and the token they used, placed into the request
/// extensions by the auth guard.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Session {
    /// The user that made the request.
    pub user_id: UserID,
    /// The access token the request was made with.
    pub token_id: AccessTokenId,
}

impl Claims {
    /// The session described by the claims.
    ///
    /// # Errors
    ///
    /// Returns an [Error::Unauthenticated] if the subject is not a user ID.
    pub fn session(&self) -> Result<Session, Error> {
        let user_id = self
            .sub
            .parse::<i64>()
            .map_err(|_| Error::Unauthenticated)?;

        Ok(Session {
            user_id: UserID::new(user_id),
            token_id: self.jti,
        })
    }
}

/// A newly issued access token.
#[derive(Debug, Clone, PartialEq)]
pub struct AccessToken {
    /// The encoded token to send in the `Authorization` header.
    pub token: String,
    /// The ID of the access token row.
    pub id: AccessTokenId,
    /// When the token stops being valid.
    pub expires_at: OffsetDateTime,
}

/// Create the access token table.
///
/// # Errors
///
/// This function will return an error if the SQL query failed.
pub fn create_access_token_table(connection: &Connection) -> Result<(), rusqlite::Error> {
    connection.execute(
        "CREATE TABLE IF NOT EXISTS access_token (
            id INTEGER PRIMARY KEY,
            user_id INTEGER NOT NULL,
            created_at TEXT NOT NULL,
            expires_at TEXT NOT NULL,
            FOREIGN KEY(user_id) REFERENCES user(id) ON UPDATE CASCADE ON DELETE CASCADE
        )",
        (),
    )?;

    connection.execute(
        "CREATE INDEX IF NOT EXISTS idx_access_token_user_id ON access_token(user_id)",
        (),
    )?;

    Ok(())
}

/// Issue a new access token for `user_id` that is valid for `duration`.
///
/// Any of the user's tokens that have already expired are removed.
///
/// # Errors
///
/// Returns an:
/// - [Error::SqlError] if the token could not be saved, e.g. `user_id` does not exist,
/// - [Error::TokenError] if the token could not be encoded.
pub fn issue_token(
    user_id: UserID,
    duration: Duration,
    keys: &JwtKeys,
    connection: &Connection,
) -> Result<AccessToken, Error> {
    let now = OffsetDateTime::now_utc();
    let expires_at = now + duration;

    connection.execute(
        "DELETE FROM access_token WHERE user_id = ?1 AND expires_at <= ?2",
        (user_id, now),
    )?;
    connection.execute(
        "INSERT INTO access_token (user_id, created_at, expires_at) VALUES (?1, ?2, ?3)",
        (user_id, now, expires_at),
    )?;
    let id = connection.last_insert_rowid();

    let claims = Claims {
        sub: user_id.to_string(),
        jti: id,
        iat: now.unix_timestamp(),
        exp: expires_at.unix_timestamp(),
    };
    let token = encode(&Header::default(), &claims, &keys.encoding_key)
        .map_err(|error| Error::TokenError(error.to_string()))?;

    Ok(AccessToken {
        token,
        id,
        expires_at,
    })
}

/// Verify the signature and expiry of `token` and return its claims.
///
/// # Errors
///
/// Returns an [Error::Unauthenticated] if the token is malformed, was not
/// signed with `keys` or has expired.
pub fn decode_token(token: &str, keys: &JwtKeys) -> Result<Claims, Error> {
    decode::<Claims>(token, &keys.decoding_key, &Validation::default())
        .map(|data| data.claims)
        .map_err(|error| {
            tracing::debug!("rejected access token: {error}");
            Error::Unauthenticated
        })
}

/// Whether the token `token_id` belongs to `user_id` and has neither expired
/// nor been revoked.
///
/// # Errors
///
/// Returns an [Error::SqlError] if the query failed.
pub fn token_is_active(
    token_id: AccessTokenId,
    user_id: UserID,
    connection: &Connection,
) -> Result<bool, Error> {
    connection
        .query_row(
            "SELECT EXISTS(
                SELECT 1 FROM access_token WHERE id = ?1 AND user_id = ?2 AND expires_at > ?3
            )",
            (token_id, user_id, OffsetDateTime::now_utc()),
            |row| row.get(0),
        )
        .map_err(Error::from)
}

/// Revoke the token `token_id` so it can no longer be used.
///
/// # Errors
///
/// Returns an [Error::SqlError] if the query failed.
pub fn revoke_token(token_id: AccessTokenId, connection: &Connection) -> Result<(), Error> {
    connection.execute("DELETE FROM access_token WHERE id = ?1", (token_id,))?;

    Ok(())
}
