//! The JSON envelope that successful responses are wrapped in.

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::Serialize;

/// A message for the client alongside the requested data, e.g.
/// `{"message": "Saving created successfully", "data": {...}}`.
#[derive(Debug, Serialize)]
pub struct Envelope<T> {
    /// A human readable description of the outcome.
    pub message: String,
    /// The resource or resources the request produced.
    pub data: T,
}

/// Respond with `status` and `data` wrapped in an [Envelope].
pub fn envelope<T: Serialize>(status: StatusCode, message: impl Into<String>, data: T) -> Response {
    (
        status,
        Json(Envelope {
            message: message.into(),
            data,
        }),
    )
        .into_response()
}

/// Respond with only a message, e.g. after deleting a resource.
pub fn message(status: StatusCode, message: impl Into<String>) -> Response {
    envelope(status, message, ())
}
