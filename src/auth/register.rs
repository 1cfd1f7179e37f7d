//! Defines the endpoint for registering a new user.

use axum::{extract::State, http::StatusCode, response::Response};
use email_address::EmailAddress;
use serde::Deserialize;
use serde_json::json;

use crate::{
    Error, PasswordHash, ValidatedPassword, ValidationErrors,
    activity::record_activity,
    auth::{SessionState, token::issue_token, token_response},
    db::lock_connection,
    extract::ApiJson,
    password::MIN_PASSWORD_LENGTH,
    user::{MAX_NAME_LENGTH, MAX_PHONE_NUMBER_LENGTH, NewUser, create_user},
};

/// The maximum number of characters in an email address.
const MAX_EMAIL_LENGTH: usize = 255;

/// The request body for registering a new user.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct RegisterRequest {
    /// The user's display name.
    pub name: String,
    /// The email address the user will log in with.
    pub email: String,
    /// The password the user will log in with.
    pub password: String,
    /// Must match `password`.
    pub password_confirmation: String,
    /// A URL or path to the user's avatar image.
    pub avatar: Option<String>,
    /// The user's phone number.
    pub phone_number: Option<String>,
}

impl RegisterRequest {
    /// Check every field, collecting all of the problems.
    fn validate(&self) -> Result<(EmailAddress, ValidatedPassword), Error> {
        let mut errors = ValidationErrors::default();

        errors.check_required_text("name", &self.name, MAX_NAME_LENGTH);

        let email = self.email.trim().to_lowercase();
        errors.check_required_text("email", &email, MAX_EMAIL_LENGTH);
        let email = match email.parse::<EmailAddress>() {
            Ok(email) => Some(email),
            Err(_) => {
                if !email.is_empty() {
                    errors.add("email", "The email field must be a valid email address.");
                }
                None
            }
        };

        if self.password.is_empty() {
            errors.add("password", "The password field is required.");
        } else if self.password.chars().count() < MIN_PASSWORD_LENGTH {
            errors.add(
                "password",
                format!("The password field must be at least {MIN_PASSWORD_LENGTH} characters."),
            );
        } else if self.password != self.password_confirmation {
            errors.add("password", "The password field confirmation does not match.");
        }

        if let Some(phone_number) = &self.phone_number {
            errors.check_max_length("phone_number", phone_number, MAX_PHONE_NUMBER_LENGTH);
        }

        errors.into_result()?;

        match email {
            Some(email) => Ok((email, ValidatedPassword::new(&self.password)?)),
            None => Err(Error::Validation(ValidationErrors::single(
                "email",
                "The email field must be a valid email address.",
            ))),
        }
    }
}

/// A route handler for registering a new user and logging them in.
///
/// Responds with the new user and an access token.
pub async fn register_endpoint(
    State(state): State<SessionState>,
    ApiJson(request): ApiJson<RegisterRequest>,
) -> Result<Response, Error> {
    let (email, password) = request.validate()?;
    let password_hash = PasswordHash::new(password, PasswordHash::DEFAULT_COST)?;

    let connection = lock_connection(&state.db_connection)?;
    let tx = connection.unchecked_transaction()?;
    let user = create_user(
        NewUser {
            name: request.name.trim().to_owned(),
            email,
            password_hash,
            avatar: request.avatar,
            phone_number: request.phone_number,
        },
        &tx,
    )?;
    let token = issue_token(user.id, state.token_duration, &state.jwt_keys, &tx)?;
    tx.commit()?;

    tracing::info!("registered user {}", user.id);
    record_activity(
        &*connection,
        user.id,
        "User registered",
        json!({ "email": user.email, "name": user.name }),
    );

    Ok(token_response(
        StatusCode::CREATED,
        "User registered successfully",
        &user,
        &token,
    ))
}

#[cfg(test)]
mod tests {
    use axum::http::StatusCode;
    use serde_json::{Value, json};

    use crate::{
        endpoints,
        test_utils::{create_user_with_token, get_test_server, get_test_state, must_get_activities},
        user::{UserID, count_users},
    };

    fn registration() -> Value {
        json!({
            "name": "Ahmad",
            "email": "Ahmad@Example.com",
            "password": "password123",
            "password_confirmation": "password123",
            "phone_number": "+60123456789",
        })
    }

    #[tokio::test]
    async fn can_register() {
        let state = get_test_state();
        let server = get_test_server(&state);

        let response = server.post(endpoints::REGISTER).json(&registration()).await;

        response.assert_status(StatusCode::CREATED);
        let body = response.json::<Value>();
        assert_eq!(body["message"], "User registered successfully");
        assert_eq!(body["token_type"], "Bearer");
        assert_eq!(body["user"]["name"], "Ahmad");
        assert_eq!(body["user"]["email"], "ahmad@example.com");
        assert_eq!(body["user"]["phone_number"], "+60123456789");
        assert!(body["user"].get("password_hash").is_none());

        let token = body["access_token"].as_str().unwrap();
        server
            .get(endpoints::ME)
            .authorization_bearer(token)
            .await
            .assert_status_ok();

        let user_id = UserID::new(body["user"]["id"].as_i64().unwrap());
        let activities = must_get_activities(&state, user_id);
        assert_eq!(activities.len(), 1);
        assert_eq!(activities[0].activity, "User registered");
        assert_eq!(
            activities[0].data.as_ref().unwrap().get("email"),
            Some(&json!("ahmad@example.com"))
        );
    }

    #[tokio::test]
    async fn duplicate_email_is_rejected() {
        let state = get_test_state();
        create_user_with_token(&state, "ahmad@example.com");
        let server = get_test_server(&state);

        let response = server.post(endpoints::REGISTER).json(&registration()).await;

        response.assert_status_unprocessable_entity();
        assert_eq!(
            response.json::<Value>()["errors"]["email"],
            json!(["The email has already been taken."])
        );
        assert_eq!(count_users(&state.db_connection.lock().unwrap()).unwrap(), 1);
    }

    #[tokio::test]
    async fn mismatched_confirmation_is_rejected() {
        let server = get_test_server(&get_test_state());
        let mut body = registration();
        body["password_confirmation"] = json!("password124");

        let response = server.post(endpoints::REGISTER).json(&body).await;

        response.assert_status_unprocessable_entity();
        assert_eq!(
            response.json::<Value>()["errors"]["password"],
            json!(["The password field confirmation does not match."])
        );
    }

    #[tokio::test]
    async fn reports_every_invalid_field() {
        let server = get_test_server(&get_test_state());

        let response = server
            .post(endpoints::REGISTER)
            .json(&json!({
                "name": "",
                "email": "not an email",
                "password": "short",
                "password_confirmation": "short",
                "phone_number": "1".repeat(21),
            }))
            .await;

        response.assert_status_unprocessable_entity();
        let errors = &response.json::<Value>()["errors"];
        assert_eq!(errors["name"], json!(["The name field is required."]));
        assert_eq!(
            errors["email"],
            json!(["The email field must be a valid email address."])
        );
        assert_eq!(
            errors["password"],
            json!(["The password field must be at least 8 characters."])
        );
        assert_eq!(
            errors["phone_number"],
            json!(["The phone number field must not be greater than 20 characters."])
        );
    }
}
