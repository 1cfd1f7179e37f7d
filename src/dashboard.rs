//! The dashboard: a summary of the current user's savings, wishes and activity.

use std::sync::{Arc, Mutex};

use axum::{
    Extension,
    extract::{FromRef, State},
    http::StatusCode,
    response::Response,
};
use rusqlite::Connection;
use serde::Serialize;

use crate::{
    AppState, Error, Session,
    activity::{ActivityLogEntry, count_user_activity, list_user_activity},
    db::lock_connection,
    money::Money,
    pagination::PageRequest,
    response::envelope,
    savings::{count_savings, get_aggregate_balance},
    user::UserID,
    wish::count_wishes_by_live_status,
};

/// How many of the newest activity log entries the dashboard shows.
const RECENT_ACTIVITY_COUNT: u64 = 5;

/// The state needed for the dashboard.
#[derive(Debug, Clone)]
pub struct DashboardState {
    /// The database connection for reading the user's data.
    pub db_connection: Arc<Mutex<Connection>>,
}

impl FromRef<AppState> for DashboardState {
    fn from_ref(state: &AppState) -> Self {
        Self {
            db_connection: state.db_connection.clone(),
        }
    }
}

/// An overview of a user's data.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DashboardSummary {
    /// The aggregate balance over all savings accounts.
    pub total_savings: Money,
    /// The number of savings accounts.
    pub savings_count: u64,
    /// Wishes the current balance does not cover yet.
    pub active_wishes: u64,
    /// Wishes the current balance covers.
    pub achieved_wishes: u64,
    /// The number of entries in the user's activity log.
    pub total_logs: u64,
    /// The newest activity log entries.
    pub recent_activity: Vec<ActivityLogEntry>,
}

/// Gather the dashboard figures for `user_id`.
///
/// Wishes are counted with their live funding, so the counts reflect the
/// current balance regardless of what is stored on each wish.
///
/// # Errors
///
/// Returns an [Error::SqlError] if any of the queries failed.
pub fn get_dashboard_summary(
    user_id: UserID,
    connection: &Connection,
) -> Result<DashboardSummary, Error> {
    let wish_counts = count_wishes_by_live_status(user_id, connection)?;
    let recent_activity = list_user_activity(
        user_id,
        PageRequest {
            page: 1,
            per_page: RECENT_ACTIVITY_COUNT,
        },
        connection,
    )?;

    Ok(DashboardSummary {
        total_savings: get_aggregate_balance(user_id, connection)?,
        savings_count: count_savings(user_id, connection)?,
        active_wishes: wish_counts.active,
        achieved_wishes: wish_counts.achieved,
        total_logs: count_user_activity(user_id, connection)?,
        recent_activity: recent_activity.data,
    })
}

/// A route handler for the current user's dashboard.
pub async fn get_dashboard_endpoint(
    State(state): State<DashboardState>,
    Extension(session): Extension<Session>,
) -> Result<Response, Error> {
    let connection = lock_connection(&state.db_connection)?;
    let summary = get_dashboard_summary(session.user_id, &connection)?;

    Ok(envelope(
        StatusCode::OK,
        "Dashboard data retrieved successfully",
        summary,
    ))
}

#[cfg(test)]
mod tests {
    use rust_decimal::Decimal;
    use rust_decimal_macros::dec;
    use serde_json::{Value, json};

    use crate::{
        endpoints,
        funding::WishFunding,
        money::Money,
        record_activity,
        savings::{NewSavings, create_savings},
        test_utils::{
            create_test_user, create_user_with_token, get_test_connection, get_test_server,
            get_test_state,
        },
        wish::{NewWish, create_wish},
    };

    use super::get_dashboard_summary;

    fn money(amount: Decimal) -> Money {
        Money::new(amount).unwrap()
    }

    #[test]
    fn counts_wishes_against_live_balance() {
        let connection = get_test_connection();
        let user = create_test_user(&connection, "ahmad@example.com");
        for (bank, income, expense) in [
            ("BCA", dec!(5000000), dec!(2000000)),
            ("Mandiri", dec!(3000000), dec!(1500000)),
        ] {
            create_savings(
                user.id,
                NewSavings {
                    bank: bank.to_owned(),
                    income: money(income),
                    expense: money(expense),
                },
                &connection,
            )
            .unwrap();
        }
        // Stored as unfunded, but the live balance of 4,500,000 covers the
        // cheaper two.
        for price in [dec!(1000000), dec!(4500000), dec!(15000000)] {
            let price = money(price);
            create_wish(
                user.id,
                NewWish {
                    name: "Wish".to_owned(),
                    description: None,
                    price,
                    funding: WishFunding::from_shortfall(price, None),
                },
                &connection,
            )
            .unwrap();
        }

        let summary = get_dashboard_summary(user.id, &connection).unwrap();

        assert_eq!(summary.total_savings, money(dec!(4500000)));
        assert_eq!(summary.savings_count, 2);
        assert_eq!(summary.achieved_wishes, 2);
        assert_eq!(summary.active_wishes, 1);
    }

    #[test]
    fn shows_five_newest_activity_entries() {
        let connection = get_test_connection();
        let user = create_test_user(&connection, "ahmad@example.com");
        for i in 0..7 {
            record_activity(&connection, user.id, &format!("Action {i}"), json!({}));
        }

        let summary = get_dashboard_summary(user.id, &connection).unwrap();

        assert_eq!(summary.total_logs, 7);
        assert_eq!(summary.recent_activity.len(), 5);
        assert_eq!(summary.recent_activity[0].activity, "Action 6");
        assert_eq!(summary.recent_activity[4].activity, "Action 2");
    }

    #[tokio::test]
    async fn empty_dashboard_for_new_user() {
        let state = get_test_state();
        let (_, token) = create_user_with_token(&state, "ahmad@example.com");
        let server = get_test_server(&state);

        let response = server
            .get(endpoints::DASHBOARD)
            .authorization_bearer(&token)
            .await;

        response.assert_status_ok();
        assert_eq!(
            response.json::<Value>(),
            json!({
                "message": "Dashboard data retrieved successfully",
                "data": {
                    "total_savings": "0.00",
                    "savings_count": 0,
                    "active_wishes": 0,
                    "achieved_wishes": 0,
                    "total_logs": 0,
                    "recent_activity": [],
                }
            })
        );
    }

    #[tokio::test]
    async fn requires_authentication() {
        let state = get_test_state();
        let server = get_test_server(&state);

        server
            .get(endpoints::DASHBOARD)
            .await
            .assert_status_unauthorized();
    }
}
