//! Code for creating the user table and fetching users from the database.

use std::fmt::Display;

use rusqlite::{Connection, Row};
use serde::{Deserialize, Serialize};

use crate::{
    Error,
    auth::password::{PasswordHash, Salt},
};

/// A newtype wrapper for integer user IDs.
///
/// This helps disambiguate user IDs from other types of IDs, leading to better compile time
/// errors, and more flexible generics that can have distinct implementations for multiple ID types.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize, Hash)]
pub struct UserID(i64);

impl UserID {
    /// Create a new user ID.
    pub fn new(id: i64) -> Self {
        Self(id)
    }

    /// Cast the user ID to a 64 bit integer.
    pub fn as_i64(&self) -> i64 {
        self.0
    }
}

impl Display for UserID {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        self.0.fmt(f)
    }
}

/// Trim surrounding whitespace and lowercase `email`.
///
/// Emails are stored and looked up in this form so that sign up and log in are
/// case-insensitive.
pub fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}

/// A user of the application.
///
/// Only the ID and email are serialized, the password hash and salt never
/// leave the server.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct User {
    /// The user's ID in the application database.
    pub id: UserID,
    /// The user's normalized email address.
    pub email: String,
    /// The user's password hash.
    #[serde(skip_serializing)]
    pub password_hash: PasswordHash,
    /// The salt used to create `password_hash`.
    #[serde(skip_serializing)]
    pub salt: Salt,
}

/// Create the user table.
///
/// # Errors
///
/// This function will return an error if the SQL query failed.
pub fn create_user_table(connection: &Connection) -> Result<(), rusqlite::Error> {
    connection.execute(
        "CREATE TABLE IF NOT EXISTS user (
                id INTEGER PRIMARY KEY,
                email TEXT NOT NULL UNIQUE,
                password_hash TEXT NOT NULL,
                salt TEXT NOT NULL
                )",
        (),
    )?;

    Ok(())
}

/// Create and insert a new user into the database.
///
/// `email` is expected to already be normalized with [normalize_email].
///
/// # Errors
///
/// Returns a:
/// - [Error::DuplicateEmail] if `email` already belongs to a user,
/// - or [Error::SqlError] if some other SQL related error occurred.
pub fn create_user(
    email: &str,
    password_hash: PasswordHash,
    salt: Salt,
    connection: &Connection,
) -> Result<User, Error> {
    connection.execute(
        "INSERT INTO user (email, password_hash, salt) VALUES (?1, ?2, ?3)",
        (email, password_hash.as_ref(), salt.as_ref()),
    )?;

    let id = UserID::new(connection.last_insert_rowid());

    Ok(User {
        id,
        email: email.to_owned(),
        password_hash,
        salt,
    })
}

/// Get the user from the database with the normalized email `email`.
///
/// # Errors
///
/// This function will return an error if:
/// - `email` does not belong to a registered user.
/// - there was an error trying to access the store.
pub fn get_user_by_email(email: &str, connection: &Connection) -> Result<User, Error> {
    connection
        .prepare("SELECT id, email, password_hash, salt FROM user WHERE email = :email")?
        .query_row(&[(":email", &email)], map_user_row)
        .map_err(|error| error.into())
}

fn map_user_row(row: &Row) -> Result<User, rusqlite::Error> {
    let raw_id = row.get(0)?;
    let email = row.get(1)?;
    let raw_password_hash: String = row.get(2)?;
    let raw_salt: String = row.get(3)?;

    Ok(User {
        id: UserID::new(raw_id),
        email,
        password_hash: PasswordHash::new_unchecked(&raw_password_hash),
        salt: Salt::new_unchecked(&raw_salt),
    })
}

#[cfg(test)]
mod user_tests {
    use rusqlite::Connection;

    use crate::{
        Error,
        auth::{
            password::{PasswordHash, Salt},
            user::{create_user, create_user_table, get_user_by_email, normalize_email},
        },
    };

    fn get_db_connection() -> Connection {
        let conn =
            Connection::open_in_memory().expect("Could not create in-memory SQLite database");
        create_user_table(&conn).expect("Could not create user table");

        conn
    }

    fn insert_test_user(email: &str, conn: &Connection) -> Result<crate::User, Error> {
        let salt = Salt::generate();
        let password_hash = PasswordHash::new("hunter2", &salt);

        create_user(email, password_hash, salt, conn)
    }

    #[test]
    fn normalize_email_trims_and_lowercases() {
        assert_eq!(normalize_email("  Foo@Bar.BAZ "), "foo@bar.baz");
    }

    #[test]
    fn insert_user_succeeds() {
        let db_connection = get_db_connection();

        let inserted_user = insert_test_user("foo@bar.baz", &db_connection).unwrap();

        assert!(inserted_user.id.as_i64() > 0);
        assert_eq!(inserted_user.email, "foo@bar.baz");
    }

    #[test]
    fn insert_user_fails_on_duplicate_email() {
        let db_connection = get_db_connection();
        insert_test_user("foo@bar.baz", &db_connection).unwrap();

        let result = insert_test_user("foo@bar.baz", &db_connection);

        assert_eq!(result, Err(Error::DuplicateEmail));
    }

    #[test]
    fn get_user_fails_with_unknown_email() {
        let db_connection = get_db_connection();

        assert_eq!(
            get_user_by_email("foo@bar.baz", &db_connection),
            Err(Error::NotFound)
        );
    }

    #[test]
    fn get_user_succeeds_with_existing_email() {
        let db_connection = get_db_connection();
        let test_user = insert_test_user("foo@bar.baz", &db_connection).unwrap();

        let retrieved_user = get_user_by_email("foo@bar.baz", &db_connection).unwrap();

        assert_eq!(retrieved_user, test_user);
    }

    #[test]
    fn serialized_user_omits_secrets() {
        let db_connection = get_db_connection();
        let test_user = insert_test_user("foo@bar.baz", &db_connection).unwrap();

        let json = serde_json::to_value(&test_user).unwrap();

        assert_eq!(
            json,
            serde_json::json!({ "id": test_user.id.as_i64(), "email": "foo@bar.baz" })
        );
    }
}
