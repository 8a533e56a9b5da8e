//! Authenticates users by email and password and hands back a token for them.

use axum::{Json, extract::State};
use rusqlite::Connection;

use crate::{
    AppState, Error,
    auth::{
        TokenConfig, User, get_user_by_email, issue_token, normalize_email,
        sign_up::{AuthResponse, Credentials},
    },
    extract::JsonBody,
};

/// Check `email` and `password` against the registered users and issue a token
/// for the matching user.
///
/// # Errors
/// This function will return a:
/// - [Error::MissingCredentials] if the email or password is empty,
/// - [Error::InvalidCredentials] if the email is unknown or the password is wrong,
/// - [Error::TokenCreation] if the token could not be created,
/// - or [Error::SqlError] if there is some other SQL error.
pub fn authenticate(
    email: &str,
    password: &str,
    connection: &Connection,
    token_config: &TokenConfig,
) -> Result<(User, String), Error> {
    let email = normalize_email(email);

    if email.is_empty() || password.is_empty() {
        return Err(Error::MissingCredentials);
    }

    let user = get_user_by_email(&email, connection).map_err(|error| match error {
        Error::NotFound => Error::InvalidCredentials,
        error => error,
    })?;

    if !user.password_hash.verify(password, &user.salt) {
        return Err(Error::InvalidCredentials);
    }

    let token = issue_token(user.id, token_config)?;

    Ok((user, token))
}

/// Handler for log-in requests.
///
/// # Errors
///
/// This function will return an error in a few situtations.
/// - The email or password is empty.
/// - The email does not belong to a registered user.
/// - The password is not correct.
/// - An internal error occurred when creating the token.
pub async fn log_in(
    State(state): State<AppState>,
    JsonBody(credentials): JsonBody<Credentials>,
) -> Result<Json<AuthResponse>, Error> {
    let connection = state.connection()?;

    let (user, token) = authenticate(
        credentials.email(),
        credentials.password(),
        &connection,
        &state.token_config,
    )?;

    Ok(Json(AuthResponse { token, user }))
}
