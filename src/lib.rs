//! Savewish is a web service for tracking savings accounts and the "wishes"
//! (savings goals) they pay for.
//!
//! This library provides a JSON REST API. Savings totals and wish funding
//! statuses are derived by the pure functions in [funding], which every
//! endpoint calls instead of computing the rules itself.

#![warn(missing_docs)]

use std::{net::SocketAddr, time::Duration};

use axum::{
    Json,
    extract::rejection::{JsonRejection, QueryRejection},
    http::StatusCode,
    response::{IntoResponse, Response},
};
use axum_server::Handle;
use serde_json::json;
use tokio::signal;

mod activity;
mod app_state;
mod auth;
mod dashboard;
mod database_id;
mod db;
mod endpoints;
mod extract;
pub mod funding;
mod logging;
pub mod money;
mod pagination;
mod password;
mod response;
mod routing;
mod savings;
pub mod user;
mod validation;
mod wish;

#[cfg(test)]
mod test_utils;

pub use activity::{ActivityData, ActivityLogId, ActivityRecorder, record_activity};
pub use app_state::AppState;
pub use auth::{DEFAULT_TOKEN_DURATION, JwtKeys, Session};
pub use db::initialize as initialize_db;
pub use logging::{LOG_BODY_LENGTH_LIMIT, logging_middleware};
pub use pagination::PaginationConfig;
pub use password::{PasswordHash, ValidatedPassword};
pub use routing::build_router;
pub use savings::{NewSavings, SavingsAccount, create_savings};
pub use validation::ValidationErrors;
pub use wish::{NewWish, Wish, WishFundingPolicy, create_wish};

/// An async task that waits for either the ctrl+c or terminate signal, whichever comes first, and
/// then signals the server to shut down gracefully.
///
/// `handle` is a handle to an Axum `Server`.
pub async fn graceful_shutdown(handle: Handle<SocketAddr>) {
    let ctrl_c = async {
        if let Err(error) = signal::ctrl_c().await {
            tracing::error!("Could not listen for the ctrl+c signal: {error}");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut terminate) => {
                terminate.recv().await;
            }
            Err(error) => {
                tracing::error!("Could not listen for the terminate signal: {error}");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            tracing::debug!("Received ctrl+c signal.");
            handle.graceful_shutdown(Some(Duration::from_secs(1)));
        },
        _ = terminate => {
            tracing::debug!("Received terminate signal.");
            handle.graceful_shutdown(Some(Duration::from_secs(1)));
        },
    }
}

/// The errors that may occur in the application.
#[derive(Debug, thiserror::Error, PartialEq)]
pub enum Error {
    /// One or more fields in the request failed validation.
    ///
    /// This covers malformed or out-of-range amounts, a non-positive wish
    /// price, negative income or expense, empty names and so on.
    #[error("{0}")]
    Validation(ValidationErrors),

    /// The request body could not be parsed into the expected shape.
    ///
    /// The status code is the one chosen by the JSON extractor, e.g. 415 when
    /// the content type is missing.
    #[error("invalid request body: {message}")]
    InvalidRequestBody {
        /// The status code to respond with.
        status: StatusCode,
        /// A description of what was wrong with the body.
        message: String,
    },

    /// The email and password combination did not match a registered user.
    #[error("the provided credentials are incorrect")]
    InvalidCredentials,

    /// The bearer token is missing, malformed, expired or has been revoked.
    #[error("unauthenticated")]
    Unauthenticated,

    /// The email address is already registered to another user.
    #[error("the email has already been taken")]
    DuplicateEmail,

    /// An unexpected error occurred with the underlying hashing library.
    ///
    /// The error string should only be logged for debugging on the server.
    /// When communicating with the application client this error should be
    /// replaced with a general error type indicating an internal server error.
    #[error("hashing failed: {0}")]
    HashingError(String),

    /// A bearer token could not be created.
    #[error("could not create token: {0}")]
    TokenError(String),

    /// The requested resource was not found.
    ///
    /// Resources owned by another user are reported as not found so that
    /// their existence is not leaked.
    ///
    /// Internally, this error may occur when a query returns no rows.
    #[error("the requested resource could not be found")]
    NotFound,

    /// An unhandled/unexpected SQL error.
    #[error("an unexpected SQL error occurred: {0}")]
    SqlError(rusqlite::Error),

    /// An error occurred while serializing a struct as JSON
    #[error("could not serialize as JSON: {0}")]
    JSONSerializationError(String),

    /// Could not acquire the database lock
    #[error("could not acquire the database lock")]
    DatabaseLockError,
}

impl From<rusqlite::Error> for Error {
    fn from(value: rusqlite::Error) -> Self {
        match value {
            // Code 2067 occurs when a UNIQUE constraint failed.
            rusqlite::Error::SqliteFailure(sql_error, Some(ref desc))
                if sql_error.extended_code == 2067 && desc.ends_with("user.email") =>
            {
                Error::DuplicateEmail
            }
            rusqlite::Error::QueryReturnedNoRows => Error::NotFound,
            error => {
                tracing::error!("an unhandled SQL error occurred: {}", error);
                Error::SqlError(error)
            }
        }
    }
}

impl From<JsonRejection> for Error {
    fn from(rejection: JsonRejection) -> Self {
        Error::InvalidRequestBody {
            status: rejection.status(),
            message: rejection.body_text(),
        }
    }
}

impl From<QueryRejection> for Error {
    fn from(rejection: QueryRejection) -> Self {
        Error::InvalidRequestBody {
            status: rejection.status(),
            message: rejection.body_text(),
        }
    }
}

impl From<serde_json::Error> for Error {
    fn from(error: serde_json::Error) -> Self {
        Error::JSONSerializationError(error.to_string())
    }
}

impl IntoResponse for Error {
    fn into_response(self) -> Response {
        match self {
            Error::Validation(errors) => (
                StatusCode::UNPROCESSABLE_ENTITY,
                Json(json!({
                    "message": errors.summary(),
                    "errors": errors,
                })),
            )
                .into_response(),
            Error::InvalidCredentials => {
                Error::Validation(ValidationErrors::single("email", INVALID_CREDENTIALS_MESSAGE))
                    .into_response()
            }
            Error::DuplicateEmail => Error::Validation(ValidationErrors::single(
                "email",
                "The email has already been taken.",
            ))
            .into_response(),
            Error::InvalidRequestBody { status, message } => {
                (status, Json(json!({ "message": message }))).into_response()
            }
            Error::Unauthenticated => (
                StatusCode::UNAUTHORIZED,
                Json(json!({ "message": "Unauthenticated." })),
            )
                .into_response(),
            Error::NotFound => (
                StatusCode::NOT_FOUND,
                Json(json!({ "message": "The requested resource could not be found." })),
            )
                .into_response(),
            // Any errors that are not handled above are not intended to be shown to the client.
            error => {
                tracing::error!("An unexpected error occurred: {}", error);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    Json(json!({
                        "message": "An unexpected error occurred, check the server logs for more details."
                    })),
                )
                    .into_response()
            }
        }
    }
}

const INVALID_CREDENTIALS_MESSAGE: &str = "The provided credentials are incorrect.";
