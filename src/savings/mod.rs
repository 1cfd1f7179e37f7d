//! Savings accounts: the income and expense a user records per bank.

mod core;
mod create_endpoint;
mod delete_endpoint;
mod edit_endpoint;
mod get_endpoint;
mod list_endpoint;

use std::sync::{Arc, Mutex};

use axum::extract::FromRef;
use rusqlite::Connection;

use crate::{AppState, wish::WishFundingPolicy};

pub use core::{
    NewSavings, SavingsAccount, count_savings, create_savings, create_savings_table,
    get_aggregate_balance,
};
pub use create_endpoint::create_savings_endpoint;
pub use delete_endpoint::delete_savings_endpoint;
pub use edit_endpoint::edit_savings_endpoint;
pub use get_endpoint::get_savings_endpoint;
pub use list_endpoint::list_savings_endpoint;

/// The maximum number of characters in a bank name.
const MAX_BANK_LENGTH: usize = 255;

/// The state needed by the savings endpoints.
#[derive(Debug, Clone)]
pub struct SavingsState {
    /// The database connection for managing savings accounts.
    pub db_connection: Arc<Mutex<Connection>>,
    /// Decides whether wishes are refunded when savings change.
    pub wish_funding_policy: WishFundingPolicy,
}

impl FromRef<AppState> for SavingsState {
    fn from_ref(state: &AppState) -> Self {
        Self {
            db_connection: state.db_connection.clone(),
            wish_funding_policy: state.wish_funding_policy,
        }
    }
}
