//! Application router configuration with protected and unprotected route definitions.

use axum::{
    Json, Router,
    http::StatusCode,
    middleware,
    response::{IntoResponse, Response},
    routing::{get, post},
};
use serde_json::json;

use crate::{
    AppState,
    activity::{
        create_log_endpoint, delete_log_endpoint, edit_log_endpoint, get_log_endpoint,
        list_logs_endpoint, list_my_logs_endpoint,
    },
    auth::{
        auth_guard, delete_me_endpoint, get_me_endpoint, log_in_endpoint, log_out_endpoint,
        register_endpoint,
    },
    dashboard::get_dashboard_endpoint,
    endpoints,
    savings::{
        create_savings_endpoint, delete_savings_endpoint, edit_savings_endpoint,
        get_savings_endpoint, list_savings_endpoint,
    },
    wish::{
        create_wish_endpoint, delete_wish_endpoint, edit_wish_endpoint, get_wish_endpoint,
        list_wishes_endpoint,
    },
};

/// Return a router with all the app's routes.
pub fn build_router(state: AppState) -> Router {
    let unprotected_routes = Router::new()
        .route(endpoints::REGISTER, post(register_endpoint))
        .route(endpoints::LOG_IN, post(log_in_endpoint));

    let protected_routes = Router::new()
        .route(endpoints::LOG_OUT, post(log_out_endpoint))
        .route(
            endpoints::ME,
            get(get_me_endpoint).delete(delete_me_endpoint),
        )
        .route(
            endpoints::SAVINGS,
            get(list_savings_endpoint).post(create_savings_endpoint),
        )
        .route(
            endpoints::SAVING,
            get(get_savings_endpoint)
                .put(edit_savings_endpoint)
                .delete(delete_savings_endpoint),
        )
        .route(
            endpoints::WISHES,
            get(list_wishes_endpoint).post(create_wish_endpoint),
        )
        .route(
            endpoints::WISH,
            get(get_wish_endpoint)
                .put(edit_wish_endpoint)
                .delete(delete_wish_endpoint),
        )
        .route(
            endpoints::LOGS,
            get(list_logs_endpoint).post(create_log_endpoint),
        )
        .route(endpoints::MY_LOGS, get(list_my_logs_endpoint))
        .route(
            endpoints::LOG,
            get(get_log_endpoint)
                .put(edit_log_endpoint)
                .delete(delete_log_endpoint),
        )
        .route(endpoints::DASHBOARD, get(get_dashboard_endpoint))
        .route_layer(middleware::from_fn_with_state(state.clone(), auth_guard));

    protected_routes
        .merge(unprotected_routes)
        .fallback(get_404_not_found)
        .with_state(state)
}

/// The JSON response for routes that do not exist.
async fn get_404_not_found() -> Response {
    (
        StatusCode::NOT_FOUND,
        Json(json!({ "message": "Route not found." })),
    )
        .into_response()
}
