//! Resolves the bearer token on an incoming request to the user making it.

use std::convert::Infallible;

use axum::{
    RequestPartsExt,
    extract::{FromRef, FromRequestParts},
    http::request::Parts,
};
use axum_extra::{
    TypedHeader,
    headers::{Authorization, authorization::Bearer},
};

use crate::{
    Error,
    auth::{TokenConfig, UserID, verify_token},
};

/// The identity behind a request.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum CurrentUser {
    /// The request carried a valid bearer token for this user.
    Authenticated(UserID),
    /// The request had no `Authorization` header, a scheme other than
    /// `Bearer`, or a token that failed verification.
    Anonymous,
}

impl CurrentUser {
    /// Get the ID of the authenticated user.
    ///
    /// # Errors
    /// Returns [Error::Unauthorized] for an anonymous request.
    pub fn require(self) -> Result<UserID, Error> {
        match self {
            CurrentUser::Authenticated(user_id) => Ok(user_id),
            CurrentUser::Anonymous => Err(Error::Unauthorized),
        }
    }
}

/// Resolve a bearer `token` to the user it was issued to.
///
/// A missing token and an invalid token are treated the same way.
pub fn resolve(token: Option<&str>, config: &TokenConfig) -> CurrentUser {
    token
        .and_then(|token| verify_token(token, config))
        .map_or(CurrentUser::Anonymous, CurrentUser::Authenticated)
}

impl<S> FromRequestParts<S> for CurrentUser
where
    TokenConfig: FromRef<S>,
    S: Send + Sync,
{
    type Rejection = Infallible;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let config = TokenConfig::from_ref(state);

        let current_user = match parts.extract::<TypedHeader<Authorization<Bearer>>>().await {
            Ok(TypedHeader(Authorization(bearer))) => resolve(Some(bearer.token()), &config),
            Err(_) => CurrentUser::Anonymous,
        };

        Ok(current_user)
    }
}
