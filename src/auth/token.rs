//! Issues and verifies the bearer tokens that identify an authenticated user.
//!
//! Tokens are JSON Web Tokens signed with HS256 using a secret that is set
//! once at startup through [TokenConfig].

use std::fmt::Debug;

use jsonwebtoken::{Algorithm, DecodingKey, EncodingKey, Header, Validation, decode, encode};
use serde::{Deserialize, Serialize};
use time::{Duration, OffsetDateTime};

use crate::{Error, auth::UserID};

/// The only signing algorithm that is issued and accepted.
const ALGORITHM: Algorithm = Algorithm::HS256;

/// How long a token is valid for if not otherwise configured.
pub const DEFAULT_TOKEN_LIFETIME: Duration = Duration::days(7);

/// The contents of a JSON Web Token.
#[derive(Debug, Serialize, Deserialize, PartialEq)]
pub struct Claims {
    /// The ID of the user the token was issued to.
    pub sub: String,
    /// The time the token was issued, in seconds since the Unix epoch.
    pub iat: i64,
    /// The expiry time of the token, in seconds since the Unix epoch.
    pub exp: i64,
}

/// The keys and settings for issuing and verifying tokens.
#[derive(Clone)]
pub struct TokenConfig {
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    lifetime: Duration,
}

impl TokenConfig {
    /// Create a token config that signs tokens with `secret` and issues tokens
    /// that expire after `lifetime`.
    pub fn new(secret: &str, lifetime: Duration) -> Self {
        Self {
            encoding_key: EncodingKey::from_secret(secret.as_bytes()),
            decoding_key: DecodingKey::from_secret(secret.as_bytes()),
            lifetime,
        }
    }

    /// How long newly issued tokens are valid for.
    pub fn lifetime(&self) -> Duration {
        self.lifetime
    }
}

impl Debug for TokenConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TokenConfig")
            .field("lifetime", &self.lifetime)
            .finish_non_exhaustive()
    }
}

/// Issue a signed token for `user_id`.
///
/// # Errors
/// Returns an [Error::TokenCreation] if the expiry time is out of range or the
/// claims could not be encoded.
pub fn issue_token(user_id: UserID, config: &TokenConfig) -> Result<String, Error> {
    issue_token_at(user_id, OffsetDateTime::now_utc(), config)
}

fn issue_token_at(
    user_id: UserID,
    issued_at: OffsetDateTime,
    config: &TokenConfig,
) -> Result<String, Error> {
    let expires_at = issued_at.checked_add(config.lifetime).ok_or_else(|| {
        Error::TokenCreation(format!(
            "a lifetime of {} puts the expiry out of range",
            config.lifetime
        ))
    })?;

    let claims = Claims {
        sub: user_id.to_string(),
        iat: issued_at.unix_timestamp(),
        exp: expires_at.unix_timestamp(),
    };

    encode(&Header::new(ALGORITHM), &claims, &config.encoding_key)
        .map_err(|error| Error::TokenCreation(error.to_string()))
}

/// Verify `token` and return the ID of the user it was issued to.
///
/// Returns `None` if the signature, algorithm or expiry is invalid, or if the
/// subject is not a user ID. The reason is only logged at the debug level, so
/// callers cannot tell the cases apart.
pub fn verify_token(token: &str, config: &TokenConfig) -> Option<UserID> {
    let mut validation = Validation::new(ALGORITHM);
    validation.set_required_spec_claims(&["exp", "sub"]);

    let claims = match decode::<Claims>(token, &config.decoding_key, &validation) {
        Ok(token_data) => token_data.claims,
        Err(error) => {
            tracing::debug!("Rejected bearer token: {error}");
            return None;
        }
    };

    claims.sub.parse().ok().map(UserID::new)
}
