//! The API endpoints URIs.
//!
//! For endpoints that take a parameter, e.g., '/api/savings/{saving_id}', use [format_endpoint].

/// The route for registering a new user.
pub const REGISTER: &str = "/api/register";
/// The route for logging in a user.
pub const LOG_IN: &str = "/api/login";
/// The route for revoking the current access token.
pub const LOG_OUT: &str = "/api/logout";
/// The route to get or delete the current user.
pub const ME: &str = "/api/me";
/// The route to list and create savings accounts.
pub const SAVINGS: &str = "/api/savings";
/// The route to access a single savings account.
pub const SAVING: &str = "/api/savings/{saving_id}";
/// The route to list and create wishes.
pub const WISHES: &str = "/api/wishes";
/// The route to access a single wish.
pub const WISH: &str = "/api/wishes/{wish_id}";
/// The route for the activity feed and for adding entries to the activity log.
pub const LOGS: &str = "/api/logs";
/// The route for the current user's activity log.
pub const MY_LOGS: &str = "/api/logs/my";
/// The route to access a single activity log entry.
pub const LOG: &str = "/api/logs/{log_id}";
/// The route for the dashboard summary.
pub const DASHBOARD: &str = "/api/dashboard";

/// Replace the parameter in `endpoint_path` with `id`.
///
/// A parameter is a string that starts with a left brace and ends with a right brace.
/// For example, in the endpoint path '/api/wishes/{wish_id}', '{wish_id}' is the parameter.
///
/// This function assumes that an endpoint path contains at most one parameter.
/// If no parameter is found in `endpoint_path`, the function returns the original `endpoint_path`.
pub fn format_endpoint(endpoint_path: &str, id: i64) -> String {
    let Some(param_start) = endpoint_path.find('{') else {
        return endpoint_path.to_owned();
    };

    let param_end = endpoint_path[param_start..]
        .find('}')
        .map(|offset| param_start + offset + 1)
        .unwrap_or(endpoint_path.len());

    format!(
        "{}{}{}",
        &endpoint_path[..param_start],
        id,
        &endpoint_path[param_end..]
    )
}
