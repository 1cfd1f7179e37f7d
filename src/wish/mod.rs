//! Wishes: the things a user is saving up for.

mod core;
mod create_endpoint;
mod delete_endpoint;
mod edit_endpoint;
mod get_endpoint;
mod list_endpoint;

use std::sync::{Arc, Mutex};

use axum::extract::FromRef;
use rusqlite::Connection;

use crate::{
    AppState, Error,
    funding::WishFunding,
    money::Money,
    savings::get_aggregate_balance,
    user::UserID,
};

pub use core::{
    NewWish, Wish, count_wishes_by_live_status, create_wish, create_wish_table,
    refresh_wish_funding,
};
pub use create_endpoint::create_wish_endpoint;
pub use delete_endpoint::delete_wish_endpoint;
pub use edit_endpoint::edit_wish_endpoint;
pub use get_endpoint::get_wish_endpoint;
pub use list_endpoint::list_wishes_endpoint;

/// The maximum number of characters in a wish name.
const MAX_WISH_NAME_LENGTH: usize = 255;

/// How the stored `amount_still_needed` and `status` of a wish are decided.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, clap::ValueEnum)]
pub enum WishFundingPolicy {
    /// Derive the funding from the owner's aggregate savings balance and
    /// refresh every wish of the owner whenever their savings change.
    #[default]
    LiveBalance,
    /// Take `amount_still_needed` from the request and leave wishes alone
    /// when savings change.
    CallerSupplied,
}

impl WishFundingPolicy {
    /// Decide the funding of a wish owned by `user_id` costing `price`.
    ///
    /// `requested` is the `amount_still_needed` given by the client, which
    /// only [WishFundingPolicy::CallerSupplied] uses. A missing value means
    /// the whole price is still needed.
    ///
    /// # Errors
    ///
    /// Returns an [Error::SqlError] if the aggregate balance could not be read.
    pub fn fund(
        self,
        user_id: UserID,
        price: Money,
        requested: Option<Money>,
        connection: &Connection,
    ) -> Result<WishFunding, Error> {
        match self {
            WishFundingPolicy::LiveBalance => {
                let balance = get_aggregate_balance(user_id, connection)?;
                Ok(WishFunding::from_balance(price, balance))
            }
            WishFundingPolicy::CallerSupplied => Ok(WishFunding::from_shortfall(price, requested)),
        }
    }

    /// Bring the stored funding of `user_id`'s wishes in line with their
    /// savings after a savings account was created, updated or deleted.
    ///
    /// # Errors
    ///
    /// Returns an [Error::SqlError] if the wishes could not be updated.
    pub fn refresh_after_savings_change(
        self,
        user_id: UserID,
        connection: &Connection,
    ) -> Result<(), Error> {
        match self {
            WishFundingPolicy::LiveBalance => {
                let refreshed = refresh_wish_funding(user_id, connection)?;
                tracing::debug!("refreshed the funding of {refreshed} wishes for user {user_id}");
                Ok(())
            }
            WishFundingPolicy::CallerSupplied => Ok(()),
        }
    }
}

/// The state needed by the wish endpoints.
#[derive(Debug, Clone)]
pub struct WishState {
    /// The database connection for managing wishes.
    pub db_connection: Arc<Mutex<Connection>>,
    /// How the funding of wishes is decided.
    pub wish_funding_policy: WishFundingPolicy,
}

impl FromRef<AppState> for WishState {
    fn from_ref(state: &AppState) -> Self {
        Self {
            db_connection: state.db_connection.clone(),
            wish_funding_policy: state.wish_funding_policy,
        }
    }
}
