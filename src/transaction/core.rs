//! Defines the core data models and database queries for transactions.

use std::{fmt::Display, str::FromStr};

use rusqlite::{
    Connection, Row,
    types::{FromSql, FromSqlError, FromSqlResult, ToSql, ToSqlOutput, ValueRef},
};
use serde::{Deserialize, Serialize};
use time::Date;

use crate::{Error, auth::UserID, database_id::TransactionId};

// ============================================================================
// MODELS
// ============================================================================

time::serde::format_description!(iso_date, Date, "[year]-[month]-[day]");

/// Whether a transaction earned or spent money.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TransactionType {
    /// Money that was earned.
    Income,
    /// Money that was spent.
    Expense,
}

impl TransactionType {
    /// The lowercase name used in the database and in JSON.
    pub fn as_str(&self) -> &'static str {
        match self {
            TransactionType::Income => "income",
            TransactionType::Expense => "expense",
        }
    }
}

impl Display for TransactionType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for TransactionType {
    type Err = Error;

    /// Parse a transaction type, ignoring case and surrounding whitespace.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "income" => Ok(TransactionType::Income),
            "expense" => Ok(TransactionType::Expense),
            _ => Err(Error::InvalidPayload(format!(
                "type must be \"income\" or \"expense\", got \"{s}\""
            ))),
        }
    }
}

impl ToSql for TransactionType {
    fn to_sql(&self) -> rusqlite::Result<ToSqlOutput<'_>> {
        Ok(ToSqlOutput::from(self.as_str()))
    }
}

impl FromSql for TransactionType {
    fn column_result(value: ValueRef<'_>) -> FromSqlResult<Self> {
        value
            .as_str()?
            .parse()
            .map_err(|error: Error| FromSqlError::Other(Box::new(error)))
    }
}

/// An expense or income recorded by a user.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Transaction {
    /// The ID of the transaction.
    pub id: TransactionId,
    /// When the transaction happened, written as `YYYY-MM-DD`.
    #[serde(with = "iso_date")]
    pub date: Date,
    /// A free-text label such as "Food" or "Salary".
    pub category: String,
    /// Whether money was earned or spent.
    #[serde(rename = "type")]
    pub kind: TransactionType,
    /// The amount of money spent or earned.
    pub amount: f64,
    /// Optional free-text notes, never an empty string.
    pub notes: Option<String>,
    /// The user that owns the transaction.
    pub user_id: UserID,
}

/// The validated fields for a transaction that has not been stored yet.
#[derive(Debug, Clone, PartialEq)]
pub struct NewTransaction {
    /// When the transaction happened.
    pub date: Date,
    /// A trimmed, non-empty label.
    pub category: String,
    /// Whether money was earned or spent.
    pub kind: TransactionType,
    /// The amount of money spent or earned.
    pub amount: f64,
    /// Trimmed notes, `None` instead of an empty string.
    pub notes: Option<String>,
}

// ============================================================================
// DATABASE FUNCTIONS
// ============================================================================

/// Create a new transaction owned by `user_id` in the database.
///
/// # Errors
/// This function will return a [Error::SqlError] if there is an SQL error.
pub fn create_transaction(
    new_transaction: NewTransaction,
    user_id: UserID,
    connection: &Connection,
) -> Result<Transaction, Error> {
    let transaction = connection
        .prepare(
            "INSERT INTO \"transaction\" (date, category, type, amount, notes, user_id)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6)
             RETURNING id, date, category, type, amount, notes, user_id",
        )?
        .query_row(
            (
                new_transaction.date,
                new_transaction.category,
                new_transaction.kind,
                new_transaction.amount,
                new_transaction.notes,
                user_id.as_i64(),
            ),
            map_transaction_row,
        )?;

    Ok(transaction)
}

/// Retrieve a transaction from the database by its `id`, regardless of owner.
///
/// Callers are responsible for checking the owner before exposing the result.
///
/// # Errors
/// This function will return a:
/// - [Error::NotFound] if `id` does not refer to a valid transaction,
/// - or [Error::SqlError] there is some other SQL error.
pub fn get_transaction(id: TransactionId, connection: &Connection) -> Result<Transaction, Error> {
    let transaction = connection
        .prepare(
            "SELECT id, date, category, type, amount, notes, user_id FROM \"transaction\" WHERE id = :id",
        )?
        .query_one(&[(":id", &id)], map_transaction_row)?;

    Ok(transaction)
}

/// Retrieve the transaction `id` if it is owned by `user_id`.
///
/// # Errors
/// This function will return a:
/// - [Error::NotFound] if `id` does not refer to any transaction,
/// - [Error::Forbidden] if the transaction belongs to another user,
/// - or [Error::SqlError] there is some other SQL error.
pub fn get_owned_transaction(
    id: TransactionId,
    user_id: UserID,
    connection: &Connection,
) -> Result<Transaction, Error> {
    let transaction = get_transaction(id, connection)?;

    if transaction.user_id != user_id {
        tracing::warn!("User {user_id} tried to access transaction {id} owned by another user");
        return Err(Error::Forbidden);
    }

    Ok(transaction)
}

type RowsAffected = usize;

/// Overwrite the stored fields of `transaction` with its current values.
///
/// The owner is part of the `WHERE` clause, so a transaction can never be
/// moved to another user.
///
/// # Errors
/// This function will return a [Error::SqlError] if there is an SQL error.
pub fn save_transaction(
    transaction: &Transaction,
    connection: &Connection,
) -> Result<RowsAffected, Error> {
    connection
        .execute(
            "UPDATE \"transaction\"
            SET \
                date = ?1, \
                category = ?2, \
                type = ?3, \
                amount = ?4, \
                notes = ?5 \
            WHERE id = ?6 AND user_id = ?7;",
            (
                transaction.date,
                &transaction.category,
                transaction.kind,
                transaction.amount,
                &transaction.notes,
                transaction.id,
                transaction.user_id.as_i64(),
            ),
        )
        .map_err(Error::from)
}

/// Delete the transaction `id` owned by `user_id`.
///
/// # Errors
/// This function will return a [Error::SqlError] if there is an SQL error.
pub fn delete_transaction(
    id: TransactionId,
    user_id: UserID,
    connection: &Connection,
) -> Result<RowsAffected, Error> {
    connection
        .execute(
            "DELETE FROM \"transaction\" WHERE id = ?1 AND user_id = ?2",
            (id, user_id.as_i64()),
        )
        .map_err(|err| err.into())
}

/// Create the transaction table in the database.
///
/// # Errors
/// Returns an error if the table cannot be created or if there is an SQL error.
pub fn create_transaction_table(connection: &Connection) -> Result<(), rusqlite::Error> {
    connection.execute(
        "CREATE TABLE IF NOT EXISTS \"transaction\" (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                date TEXT NOT NULL,
                category TEXT NOT NULL,
                type TEXT NOT NULL CHECK (type IN ('income', 'expense')),
                amount REAL NOT NULL,
                notes TEXT,
                user_id INTEGER NOT NULL,
                FOREIGN KEY(user_id) REFERENCES user(id) ON UPDATE CASCADE ON DELETE CASCADE
                )",
        (),
    )?;

    // Every query is scoped to one owner, most of them by date as well.
    connection.execute(
        "CREATE INDEX IF NOT EXISTS idx_transaction_user_date ON \"transaction\"(user_id, date);",
        (),
    )?;

    Ok(())
}

/// Map a database row to a Transaction.
pub fn map_transaction_row(row: &Row) -> Result<Transaction, rusqlite::Error> {
    let id = row.get(0)?;
    let date = row.get(1)?;
    let category = row.get(2)?;
    let kind = row.get(3)?;
    let amount = row.get(4)?;
    let notes = row.get(5)?;
    let raw_user_id = row.get(6)?;

    Ok(Transaction {
        id,
        date,
        category,
        kind,
        amount,
        notes,
        user_id: UserID::new(raw_user_id),
    })
}

// ============================================================================
// TESTS
// ============================================================================
