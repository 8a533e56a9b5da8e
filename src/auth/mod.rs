//! User credentials, bearer tokens, and the access guard that resolves a
//! request to the user making it.

mod guard;
mod log_in;
mod password;
mod sign_up;
mod token;
mod user;

pub use guard::CurrentUser;
pub use log_in::log_in;
pub use sign_up::sign_up;
pub use token::{DEFAULT_TOKEN_LIFETIME, TokenConfig, issue_token, verify_token};
#[cfg(test)]
pub(crate) use password::{PasswordHash, Salt};
pub use user::{
    User, UserID, create_user, create_user_table, get_user_by_email, normalize_email,
};
