//! Helpers shared by the unit and HTTP tests.

#![allow(missing_docs)]

use axum_test::TestServer;
use rusqlite::Connection;
use serde_json::{Value, json};

use crate::{
    AppState, TokenConfig, UserID, build_router,
    auth::{DEFAULT_TOKEN_LIFETIME, PasswordHash, Salt, create_user, normalize_email},
    db::initialize,
    endpoints,
};

pub(crate) const TEST_PASSWORD: &str = "hunter2";

pub(crate) fn get_test_connection() -> Connection {
    let connection =
        Connection::open_in_memory().expect("Could not create in-memory SQLite database");
    initialize(&connection).expect("Could not initialize database");

    connection
}

pub(crate) fn get_test_token_config() -> TokenConfig {
    TokenConfig::new("averysecretsecret", DEFAULT_TOKEN_LIFETIME)
}

pub(crate) fn get_test_state() -> AppState {
    let connection =
        Connection::open_in_memory().expect("Could not create in-memory SQLite database");

    AppState::new(connection, get_test_token_config()).expect("Could not create app state")
}

pub(crate) fn get_test_server() -> TestServer {
    TestServer::try_new(build_router(get_test_state())).expect("Could not create test server")
}

/// Insert a user directly into the database, skipping the password hashing.
pub(crate) fn insert_test_user(email: &str, connection: &Connection) -> UserID {
    create_user(
        &normalize_email(email),
        PasswordHash::new_unchecked("hash"),
        Salt::new_unchecked("salt"),
        connection,
    )
    .expect("Could not create test user")
    .id
}

/// Sign up `email` through the API and return the issued token and the user's ID.
pub(crate) async fn sign_up_test_user(server: &TestServer, email: &str) -> (String, i64) {
    let response = server
        .post(endpoints::SIGN_UP)
        .json(&json!({ "email": email, "password": TEST_PASSWORD }))
        .await;
    let body = response.json::<Value>();

    let token = body["token"]
        .as_str()
        .expect("Sign up response is missing the token")
        .to_owned();
    let user_id = body["user"]["id"]
        .as_i64()
        .expect("Sign up response is missing the user ID");

    (token, user_id)
}
