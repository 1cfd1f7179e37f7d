//! Defines the endpoint for updating a wish.

use axum::{
    Extension,
    extract::{Path, State},
    http::StatusCode,
    response::Response,
};
use serde::Deserialize;
use serde_json::{Value, json};

use crate::{
    Error, Session, ValidationErrors,
    activity::record_activity,
    db::lock_connection,
    extract::ApiJson,
    response::envelope,
    wish::{
        MAX_WISH_NAME_LENGTH, WishState,
        core::{WishId, WishUpdate, update_wish},
    },
};

/// The request body for updating a wish. Omitted fields keep their stored value.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct EditWishRequest {
    /// The new name.
    pub name: Option<String>,
    /// The new description.
    ///
    /// Omitting it or sending `null` keeps the stored description, so a
    /// description cannot be cleared once set. Send an empty string instead.
    pub description: Option<String>,
    /// The new price, as a string or number.
    pub price: Option<Value>,
    /// How much more must be saved, as a string or number.
    pub amount_still_needed: Option<Value>,
}

impl EditWishRequest {
    fn validate(self) -> Result<WishUpdate, Error> {
        let mut errors = ValidationErrors::default();

        if let Some(name) = &self.name {
            errors.check_required_text("name", name, MAX_WISH_NAME_LENGTH);
        }
        let price = errors.parse_amount("price", self.price.as_ref());
        if let Some(price) = price {
            errors.check_positive("price", price);
        }
        let amount_still_needed =
            errors.parse_amount("amount_still_needed", self.amount_still_needed.as_ref());
        if let Some(amount) = amount_still_needed {
            errors.check_non_negative("amount_still_needed", amount);
        }

        errors.into_result()?;

        Ok(WishUpdate {
            name: self.name.map(|name| name.trim().to_owned()),
            description: self.description,
            price,
            amount_still_needed,
        })
    }
}

/// A route handler for updating a wish owned by the current user.
///
/// The status is always re-resolved, even when only the name changes.
pub async fn edit_wish_endpoint(
    State(state): State<WishState>,
    Extension(session): Extension<Session>,
    Path(wish_id): Path<WishId>,
    ApiJson(request): ApiJson<EditWishRequest>,
) -> Result<Response, Error> {
    let update = request.validate()?;

    let connection = lock_connection(&state.db_connection)?;
    let (old, new) = update_wish(
        wish_id,
        session.user_id,
        update,
        state.wish_funding_policy,
        &connection,
    )?;

    record_activity(
        &*connection,
        session.user_id,
        "Updated wish",
        json!({
            "wish_id": new.id,
            "wish_name": new.name,
            "old_data": old,
            "new_data": new,
        }),
    );

    Ok(envelope(StatusCode::OK, "Wish updated successfully", new))
}
