//! Ledgerly is a personal finance ledger.
//!
//! This library provides a JSON REST API where authenticated users record
//! income and expense transactions and query monthly, yearly and per-category
//! summaries of them, as well as a rendered chart of their monthly spending.

#![warn(missing_docs)]

use std::{net::SocketAddr, time::Duration};

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use axum_server::Handle;
use serde_json::json;
use tokio::signal;

mod app_state;
mod auth;
mod database_id;
mod db;
mod endpoints;
mod extract;
mod logging;
mod routing;
mod summary;
mod transaction;

#[cfg(test)]
mod test_utils;

pub use app_state::AppState;
pub use auth::{DEFAULT_TOKEN_LIFETIME, TokenConfig, User, UserID};
pub use db::initialize as initialize_db;
pub use logging::{LOG_BODY_LENGTH_LIMIT, logging_middleware};
pub use routing::build_router;

/// An async task that waits for either the ctrl+c or terminate signal, whichever comes first, and
/// then signals the server to shut down gracefully.
///
/// `handle` is a handle to an Axum `Server`.
pub async fn graceful_shutdown(handle: Handle<SocketAddr>) {
    let ctrl_c = async {
        signal::ctrl_c()
            .await
            .expect("failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        signal::unix::signal(signal::unix::SignalKind::terminate())
            .expect("failed to install signal handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            tracing::debug!("Received ctrl+c signal.");
            handle.graceful_shutdown(Some(Duration::from_secs(1)));
        },
        _ = terminate => {
            tracing::debug!("Received terminate signal.");
            handle.graceful_shutdown(Some(Duration::from_secs(1)));
        },
    }
}

/// The errors that may occur in the application.
#[derive(Debug, thiserror::Error, PartialEq)]
pub enum Error {
    /// The request did not carry a valid bearer token.
    #[error("Unauthorized")]
    Unauthorized,

    /// The request carried a valid token, but the resource belongs to another user.
    ///
    /// Unlike [Error::NotFound], this tells the client that the resource
    /// exists, but nothing about its contents.
    #[error("Forbidden")]
    Forbidden,

    /// The requested resource was not found.
    ///
    /// Internally, this error may occur when a query returns no rows.
    #[error("Not found")]
    NotFound,

    /// A field in the request could not be parsed.
    ///
    /// The string describes which field was invalid and why.
    #[error("Invalid payload: {0}")]
    InvalidPayload(String),

    /// One or more required fields were absent or empty.
    #[error("Missing fields: {}", .0.join(", "))]
    MissingFields(Vec<&'static str>),

    /// The email or password was empty when signing up or logging in.
    #[error("Email and password required")]
    MissingCredentials,

    /// The email used to sign up already belongs to a registered user.
    #[error("Email already registered")]
    DuplicateEmail,

    /// The email and password did not match a registered user.
    ///
    /// The same error is used for an unknown email and a wrong password so
    /// that clients cannot tell which one it was.
    #[error("Invalid credentials")]
    InvalidCredentials,

    /// The token for an authenticated user could not be created.
    ///
    /// The error string should only be logged for debugging on the server.
    #[error("could not create token: {0}")]
    TokenCreation(String),

    /// The spending chart could not be drawn or encoded.
    #[error("could not render chart: {0}")]
    ChartRendering(String),

    /// An unhandled/unexpected SQL error.
    #[error("an unexpected SQL error occurred: {0}")]
    SqlError(rusqlite::Error),

    /// Could not acquire the database lock
    #[error("could not acquire the database lock")]
    DatabaseLockError,
}

impl From<rusqlite::Error> for Error {
    fn from(value: rusqlite::Error) -> Self {
        match value {
            rusqlite::Error::SqliteFailure(sql_error, Some(ref desc))
                if sql_error.extended_code == rusqlite::ffi::SQLITE_CONSTRAINT_UNIQUE
                    && desc.ends_with("user.email") =>
            {
                Error::DuplicateEmail
            }
            rusqlite::Error::QueryReturnedNoRows => Error::NotFound,
            error => {
                tracing::error!("an unhandled SQL error occurred: {}", error);
                Error::SqlError(error)
            }
        }
    }
}

impl Error {
    fn status_code(&self) -> StatusCode {
        match self {
            Error::Unauthorized | Error::InvalidCredentials => StatusCode::UNAUTHORIZED,
            Error::Forbidden => StatusCode::FORBIDDEN,
            Error::NotFound => StatusCode::NOT_FOUND,
            Error::InvalidPayload(_) | Error::MissingFields(_) | Error::MissingCredentials => {
                StatusCode::BAD_REQUEST
            }
            Error::DuplicateEmail => StatusCode::CONFLICT,
            Error::TokenCreation(_)
            | Error::ChartRendering(_)
            | Error::SqlError(_)
            | Error::DatabaseLockError => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for Error {
    fn into_response(self) -> Response {
        let status = self.status_code();

        let message = if status == StatusCode::INTERNAL_SERVER_ERROR {
            // Internal errors are not intended to be shown to the client.
            tracing::error!("An unexpected error occurred: {}", self);
            "Internal server error".to_owned()
        } else {
            self.to_string()
        };

        (status, Json(json!({ "error": message }))).into_response()
    }
}

#[cfg(test)]
mod error_tests {
    use axum::{http::StatusCode, response::IntoResponse};

    use crate::Error;

    #[test]
    fn missing_fields_message_names_each_field() {
        let error = Error::MissingFields(vec!["date", "amount"]);

        assert_eq!(error.to_string(), "Missing fields: date, amount");
    }

    #[test]
    fn query_returned_no_rows_maps_to_not_found() {
        assert_eq!(
            Error::from(rusqlite::Error::QueryReturnedNoRows),
            Error::NotFound
        );
    }

    #[test]
    fn internal_errors_are_opaque_server_errors() {
        let response = Error::TokenCreation("bad key".to_owned()).into_response();

        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    }

    #[test]
    fn ownership_errors_have_distinct_status_codes() {
        assert_eq!(
            Error::Forbidden.into_response().status(),
            StatusCode::FORBIDDEN
        );
        assert_eq!(
            Error::NotFound.into_response().status(),
            StatusCode::NOT_FOUND
        );
        assert_eq!(
            Error::DuplicateEmail.into_response().status(),
            StatusCode::CONFLICT
        );
    }
}
