//! Defines the endpoint for creating a savings account.

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
    savings::{
        MAX_BANK_LENGTH, SavingsState,
        core::{NewSavings, create_savings},
    },
};

/// The request body for creating a savings account.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct CreateSavingsRequest {
    /// The name of the bank.
    pub bank: String,
    /// The money paid in, as a string or number.
    pub income: Option<Value>,
    /// The money taken out, as a string or number. Defaults to zero.
    pub expense: Option<Value>,
}

impl CreateSavingsRequest {
    fn validate(self) -> Result<NewSavings, Error> {
        let mut errors = ValidationErrors::default();

        errors.check_required_text("bank", &self.bank, MAX_BANK_LENGTH);
        let income = errors.require_amount("income", self.income.as_ref());
        let expense = errors.parse_amount("expense", self.expense.as_ref());
        if let Some(income) = income {
            errors.check_non_negative("income", income);
        }
        if let Some(expense) = expense {
            errors.check_non_negative("expense", expense);
        }

        errors.into_result()?;

        Ok(NewSavings {
            bank: self.bank.trim().to_owned(),
            income: income.unwrap_or_default(),
            expense: expense.unwrap_or(Money::ZERO),
        })
    }
}

/// A route handler for creating a savings account owned by the current user.
pub async fn create_savings_endpoint(
    State(state): State<SavingsState>,
    Extension(session): Extension<Session>,
    ApiJson(request): ApiJson<CreateSavingsRequest>,
) -> Result<Response, Error> {
    let new_savings = request.validate()?;

    let connection = lock_connection(&state.db_connection)?;
    let tx = connection.unchecked_transaction()?;
    let account = create_savings(session.user_id, new_savings, &tx)?;
    state
        .wish_funding_policy
        .refresh_after_savings_change(session.user_id, &tx)?;
    tx.commit()?;

    record_activity(
        &*connection,
        session.user_id,
        "Created new saving",
        json!({
            "saving_id": account.id,
            "bank": account.bank,
            "income": account.income,
            "expense": account.expense,
            "total": account.total,
        }),
    );

    Ok(envelope(
        StatusCode::CREATED,
        "Saving created successfully",
        account,
    ))
}
