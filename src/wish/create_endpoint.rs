//! Defines the endpoint for creating a wish.

use axum::{Extension, extract::State, http::StatusCode, response::Response};
use serde::Deserialize;
use serde_json::{Value, json};

use crate::{
    Error, Session, ValidationErrors,
    activity::record_activity,
    db::lock_connection,
    extract::ApiJson,
    money::Money,
    response::envelope,
    wish::{
        MAX_WISH_NAME_LENGTH, WishState,
        core::{NewWish, create_wish},
    },
};

/// The request body for creating a wish.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct CreateWishRequest {
    /// What the user wants.
    pub name: String,
    /// Optional detail about the wish.
    pub description: Option<String>,
    /// How much the wish costs, as a string or number.
    pub price: Option<Value>,
    /// How much more must be saved, as a string or number. Only used when
    /// the server lets clients supply the funding.
    pub amount_still_needed: Option<Value>,
}

/// The validated fields of a create request, before the funding is decided.
struct ValidCreateWish {
    name: String,
    description: Option<String>,
    price: Money,
    amount_still_needed: Option<Money>,
}

impl CreateWishRequest {
    fn validate(self) -> Result<ValidCreateWish, Error> {
        let mut errors = ValidationErrors::default();

        errors.check_required_text("name", &self.name, MAX_WISH_NAME_LENGTH);
        let price = errors.require_amount("price", self.price.as_ref());
        if let Some(price) = price {
            errors.check_positive("price", price);
        }
        let amount_still_needed =
            errors.parse_amount("amount_still_needed", self.amount_still_needed.as_ref());
        if let Some(amount) = amount_still_needed {
            errors.check_non_negative("amount_still_needed", amount);
        }

        errors.into_result()?;

        Ok(ValidCreateWish {
            name: self.name.trim().to_owned(),
            description: self.description,
            price: price.unwrap_or_default(),
            amount_still_needed,
        })
    }
}

/// A route handler for creating a wish owned by the current user.
pub async fn create_wish_endpoint(
    State(state): State<WishState>,
    Extension(session): Extension<Session>,
    ApiJson(request): ApiJson<CreateWishRequest>,
) -> Result<Response, Error> {
    let request = request.validate()?;

    let connection = lock_connection(&state.db_connection)?;
    let tx = connection.unchecked_transaction()?;
    let funding = state.wish_funding_policy.fund(
        session.user_id,
        request.price,
        request.amount_still_needed,
        &tx,
    )?;
    let wish = create_wish(
        session.user_id,
        NewWish {
            name: request.name,
            description: request.description,
            price: request.price,
            funding,
        },
        &tx,
    )?;
    tx.commit()?;

    record_activity(
        &*connection,
        session.user_id,
        "Created new wish",
        json!({
            "wish_id": wish.id,
            "wish_name": wish.name,
            "price": wish.price,
            "status": wish.status,
        }),
    );

    Ok(envelope(StatusCode::CREATED, "Wish created successfully", wish))
}
