//! Defines the endpoint for getting a single wish.

use axum::{
    Extension,
    extract::{Path, State},
    http::StatusCode,
    response::Response,
};

use crate::{
    Error, Session,
    db::lock_connection,
    response::envelope,
    savings::get_aggregate_balance,
    wish::{
        WishState,
        core::{WishId, WishView, get_wish},
    },
};

/// A route handler for getting a wish owned by the current user along with
/// its funding against the current savings balance.
pub async fn get_wish_endpoint(
    State(state): State<WishState>,
    Extension(session): Extension<Session>,
    Path(wish_id): Path<WishId>,
) -> Result<Response, Error> {
    let connection = lock_connection(&state.db_connection)?;
    let wish = get_wish(wish_id, session.user_id, &connection)?;
    let balance = get_aggregate_balance(session.user_id, &connection)?;

    Ok(envelope(
        StatusCode::OK,
        "Wish retrieved successfully",
        WishView::new(wish, balance),
    ))
}

#[cfg(test)]
mod tests {
    use rust_decimal_macros::dec;
    use serde_json::Value;

    use crate::{
        endpoints::{self, format_endpoint},
        funding::WishFunding,
        money::Money,
        savings::{NewSavings, create_savings},
        test_utils::{create_user_with_token, get_test_server, get_test_state},
        wish::{NewWish, create_wish},
    };

    #[tokio::test]
    async fn includes_live_funding() {
        let state = get_test_state();
        let (user, token) = create_user_with_token(&state, "ahmad@example.com");
        let wish = {
            let connection = state.db_connection.lock().unwrap();
            create_savings(
                user.id,
                NewSavings {
                    bank: "BCA".to_owned(),
                    income: Money::new(dec!(250)).unwrap(),
                    expense: Money::ZERO,
                },
                &connection,
            )
            .unwrap();
            let price = Money::new(dec!(1000)).unwrap();
            create_wish(
                user.id,
                NewWish {
                    name: "Headphones".to_owned(),
                    description: None,
                    price,
                    funding: WishFunding::from_shortfall(price, None),
                },
                &connection,
            )
            .unwrap()
        };
        let server = get_test_server(&state);

        let response = server
            .get(&format_endpoint(endpoints::WISH, wish.id))
            .authorization_bearer(&token)
            .await;

        response.assert_status_ok();
        let body = response.json::<Value>();
        assert_eq!(body["message"], "Wish retrieved successfully");
        assert_eq!(body["data"]["name"], "Headphones");
        assert_eq!(body["data"]["live_funding"]["is_funded"], false);
        assert_eq!(body["data"]["live_funding"]["amount_still_needed"], "750.00");
        assert_eq!(body["data"]["live_funding"]["progress_percent"], "25.00");
    }

    #[tokio::test]
    async fn missing_wish_is_not_found() {
        let state = get_test_state();
        let (_, token) = create_user_with_token(&state, "ahmad@example.com");
        let server = get_test_server(&state);

        server
            .get(&format_endpoint(endpoints::WISH, 42))
            .authorization_bearer(&token)
            .await
            .assert_status_not_found();
    }
}
