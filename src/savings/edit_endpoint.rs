//! Defines the endpoint for updating a savings account.

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
    savings::{
        MAX_BANK_LENGTH, SavingsState,
        core::{SavingsId, SavingsUpdate, update_savings},
    },
};

/// The request body for updating a savings account. Omitted fields keep
/// their stored value.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct EditSavingsRequest {
    /// The new bank name.
    pub bank: Option<String>,
    /// The new income, as a string or number.
    pub income: Option<Value>,
    /// The new expense, as a string or number.
    pub expense: Option<Value>,
}

impl EditSavingsRequest {
    fn validate(self) -> Result<SavingsUpdate, Error> {
        let mut errors = ValidationErrors::default();

        if let Some(bank) = &self.bank {
            errors.check_required_text("bank", bank, MAX_BANK_LENGTH);
        }
        let income = errors.parse_amount("income", self.income.as_ref());
        let expense = errors.parse_amount("expense", self.expense.as_ref());
        if let Some(income) = income {
            errors.check_non_negative("income", income);
        }
        if let Some(expense) = expense {
            errors.check_non_negative("expense", expense);
        }

        errors.into_result()?;

        Ok(SavingsUpdate {
            bank: self.bank.map(|bank| bank.trim().to_owned()),
            income,
            expense,
        })
    }
}

/// A route handler for updating a savings account owned by the current user.
///
/// The total is recomputed from the updated income and expense.
pub async fn edit_savings_endpoint(
    State(state): State<SavingsState>,
    Extension(session): Extension<Session>,
    Path(savings_id): Path<SavingsId>,
    ApiJson(request): ApiJson<EditSavingsRequest>,
) -> Result<Response, Error> {
    let update = request.validate()?;

    let connection = lock_connection(&state.db_connection)?;
    let tx = connection.unchecked_transaction()?;
    let (old, new) = update_savings(savings_id, session.user_id, update, &tx)?;
    state
        .wish_funding_policy
        .refresh_after_savings_change(session.user_id, &tx)?;
    tx.commit()?;

    record_activity(
        &*connection,
        session.user_id,
        "Updated saving",
        json!({
            "saving_id": new.id,
            "bank": new.bank,
            "old_data": old,
            "new_data": new,
        }),
    );

    Ok(envelope(StatusCode::OK, "Saving updated successfully", new))
}

#[cfg(test)]
mod tests {
    use rust_decimal_macros::dec;
    use serde_json::{Value, json};

    use crate::{
        AppState,
        endpoints::{self, format_endpoint},
        money::Money,
        savings::{NewSavings, SavingsAccount, create_savings},
        test_utils::{
            create_user_with_token, get_test_server, get_test_state, must_get_activities,
        },
        user::UserID,
    };

    #[track_caller]
    fn must_create_savings(state: &AppState, user_id: UserID) -> SavingsAccount {
        create_savings(
            user_id,
            NewSavings {
                bank: "BCA".to_owned(),
                income: Money::new(dec!(5000000)).unwrap(),
                expense: Money::new(dec!(2000000)).unwrap(),
            },
            &state.db_connection.lock().unwrap(),
        )
        .unwrap()
    }

    #[tokio::test]
    async fn update_recomputes_total_and_records_both_snapshots() {
        let state = get_test_state();
        let (user, token) = create_user_with_token(&state, "ahmad@example.com");
        let account = must_create_savings(&state, user.id);
        let server = get_test_server(&state);

        let response = server
            .put(&format_endpoint(endpoints::SAVING, account.id))
            .authorization_bearer(&token)
            .json(&json!({ "expense": "2500000" }))
            .await;

        response.assert_status_ok();
        let body = response.json::<Value>();
        assert_eq!(body["message"], "Saving updated successfully");
        assert_eq!(body["data"]["bank"], "BCA");
        assert_eq!(body["data"]["income"], "5000000.00");
        assert_eq!(body["data"]["expense"], "2500000.00");
        assert_eq!(body["data"]["total"], "2500000.00");

        let activities = must_get_activities(&state, user.id);
        assert_eq!(activities.len(), 1);
        assert_eq!(activities[0].activity, "Updated saving");
        let data = activities[0].data.as_ref().unwrap();
        assert_eq!(data.get("saving_id"), Some(&json!(account.id)));
        assert_eq!(data.get("old_data").unwrap()["total"], "3000000.00");
        assert_eq!(data.get("old_data").unwrap()["expense"], "2000000.00");
        assert_eq!(data.get("new_data").unwrap()["total"], "2500000.00");
        assert_eq!(data.get("new_data").unwrap()["expense"], "2500000.00");
    }

    #[tokio::test]
    async fn negative_expense_is_rejected() {
        let state = get_test_state();
        let (user, token) = create_user_with_token(&state, "ahmad@example.com");
        let account = must_create_savings(&state, user.id);
        let server = get_test_server(&state);

        let response = server
            .put(&format_endpoint(endpoints::SAVING, account.id))
            .authorization_bearer(&token)
            .json(&json!({ "expense": -5 }))
            .await;

        response.assert_status_unprocessable_entity();
        assert_eq!(
            response.json::<Value>()["errors"]["expense"],
            json!(["The expense field must be at least 0."])
        );
    }

    #[tokio::test]
    async fn cannot_update_savings_of_other_user() {
        let state = get_test_state();
        let (owner, _) = create_user_with_token(&state, "ahmad@example.com");
        let (_, other_token) = create_user_with_token(&state, "siti@example.com");
        let account = must_create_savings(&state, owner.id);
        let server = get_test_server(&state);

        server
            .put(&format_endpoint(endpoints::SAVING, account.id))
            .authorization_bearer(&other_token)
            .json(&json!({ "income": "1" }))
            .await
            .assert_status_not_found();

        assert!(must_get_activities(&state, owner.id).is_empty());
    }
}
