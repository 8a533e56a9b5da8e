//! The transaction ledger.
//!
//! This module contains everything related to transactions:
//! - The `Transaction` model and its database functions
//! - Parsing of the JSON bodies for creating and updating transactions
//! - Filtered listing of a user's transactions
//! - The route handlers for the ledger operations

mod core;
mod endpoints;
mod payload;
mod query;

pub use core::{
    NewTransaction, Transaction, TransactionType, create_transaction, create_transaction_table,
    delete_transaction, get_owned_transaction, map_transaction_row, save_transaction,
};
pub use endpoints::{
    create_transaction_endpoint, delete_transaction_endpoint, list_transactions_endpoint,
    update_transaction_endpoint,
};
pub use query::{TransactionFilter, list_transactions};
pub(crate) use query::parse_optional_date;

pub use crate::database_id::TransactionId;
