//! Registers new users and hands back a token for them.

use axum::{Json, extract::State, http::StatusCode, response::IntoResponse};
use rusqlite::Connection;
use serde::{Deserialize, Serialize};

use crate::{
    AppState, Error,
    auth::{
        TokenConfig, User, create_user, get_user_by_email, issue_token, normalize_email,
        password::{PasswordHash, Salt},
    },
    extract::JsonBody,
};

/// The email and password entered by a user when signing up or logging in.
///
/// A field that is absent or `null` is treated as empty.
#[derive(Debug, Deserialize)]
pub struct Credentials {
    /// The user's email, compared case-insensitively.
    #[serde(default)]
    pub email: Option<String>,
    /// The user's password in plain text.
    #[serde(default)]
    pub password: Option<String>,
}

impl Credentials {
    /// The email, or an empty string if none was given.
    pub fn email(&self) -> &str {
        self.email.as_deref().unwrap_or_default()
    }

    /// The password, or an empty string if none was given.
    pub fn password(&self) -> &str {
        self.password.as_deref().unwrap_or_default()
    }
}

/// The response body for a successful sign up or log in.
#[derive(Debug, Serialize)]
pub struct AuthResponse {
    /// A bearer token for the user.
    pub token: String,
    /// The signed up or logged in user.
    pub user: User,
}

/// Create a new user with `email` and `password` and issue a token for them.
///
/// # Errors
/// This function will return a:
/// - [Error::MissingCredentials] if the email or password is empty,
/// - [Error::DuplicateEmail] if the email already belongs to a user,
/// - [Error::TokenCreation] if the token could not be created,
/// - or [Error::SqlError] if there is some other SQL error.
pub fn register(
    email: &str,
    password: &str,
    connection: &Connection,
    token_config: &TokenConfig,
) -> Result<(User, String), Error> {
    let email = normalize_email(email);

    if email.is_empty() || password.is_empty() {
        return Err(Error::MissingCredentials);
    }

    match get_user_by_email(&email, connection) {
        Ok(_) => return Err(Error::DuplicateEmail),
        Err(Error::NotFound) => {}
        Err(error) => return Err(error),
    }

    let salt = Salt::generate();
    let password_hash = PasswordHash::new(password, &salt);
    let user = create_user(&email, password_hash, salt, connection)?;
    let token = issue_token(user.id, token_config)?;

    tracing::info!("Registered new user {}", user.id);

    Ok((user, token))
}

/// A route handler for signing up a new user.
pub async fn sign_up(
    State(state): State<AppState>,
    JsonBody(credentials): JsonBody<Credentials>,
) -> Result<impl IntoResponse, Error> {
    let connection = state.connection()?;

    let (user, token) = register(
        credentials.email(),
        credentials.password(),
        &connection,
        &state.token_config,
    )?;

    Ok((StatusCode::CREATED, Json(AuthResponse { token, user })))
}
