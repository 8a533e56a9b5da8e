//! Route handlers for listing, creating, updating and deleting transactions.

use axum::{Json, extract::State, http::StatusCode, response::IntoResponse};
use serde_json::json;

use crate::{
    AppState, Error,
    auth::CurrentUser,
    extract::{JsonBody, PathParam, QueryParams},
    transaction::{
        NewTransaction, Transaction, TransactionId, create_transaction, delete_transaction,
        get_owned_transaction,
        payload::{CreateTransactionBody, TransactionUpdate, UpdateTransactionBody},
        query::{ListQuery, TransactionFilter, list_transactions},
        save_transaction,
    },
};

/// A route handler for listing the current user's transactions.
pub async fn list_transactions_endpoint(
    State(state): State<AppState>,
    current_user: CurrentUser,
    QueryParams(query): QueryParams<ListQuery>,
) -> Result<Json<Vec<Transaction>>, Error> {
    let user_id = current_user.require()?;
    let filter = TransactionFilter::try_from(query)?;

    let connection = state.connection()?;
    let transactions = list_transactions(user_id, &filter, &connection)?;

    Ok(Json(transactions))
}

/// A route handler for creating a new transaction owned by the current user.
///
/// The body is only looked at once the user is known, so anonymous requests
/// get a 401 whatever they send.
pub async fn create_transaction_endpoint(
    State(state): State<AppState>,
    current_user: CurrentUser,
    body: Result<JsonBody<CreateTransactionBody>, Error>,
) -> Result<impl IntoResponse, Error> {
    let user_id = current_user.require()?;
    let JsonBody(body) = body?;
    let new_transaction = NewTransaction::try_from(body)?;

    let connection = state.connection()?;
    let transaction = create_transaction(new_transaction, user_id, &connection)?;

    tracing::debug!("User {user_id} created transaction {}", transaction.id);

    Ok((StatusCode::CREATED, Json(transaction)))
}

/// A route handler for changing some of the fields of a transaction.
///
/// Ownership is checked before the body is validated, so a client cannot
/// learn anything about another user's transaction from validation errors.
pub async fn update_transaction_endpoint(
    State(state): State<AppState>,
    current_user: CurrentUser,
    PathParam(transaction_id): PathParam<TransactionId>,
    body: Result<JsonBody<UpdateTransactionBody>, Error>,
) -> Result<Json<Transaction>, Error> {
    let user_id = current_user.require()?;

    let connection = state.connection()?;
    let mut transaction = get_owned_transaction(transaction_id, user_id, &connection)?;

    let JsonBody(body) = body?;
    let update = TransactionUpdate::try_from(body)?;
    update.apply_to(&mut transaction);

    match save_transaction(&transaction, &connection)? {
        0 => Err(Error::NotFound),
        _ => Ok(Json(transaction)),
    }
}

/// A route handler for deleting a transaction.
pub async fn delete_transaction_endpoint(
    State(state): State<AppState>,
    current_user: CurrentUser,
    PathParam(transaction_id): PathParam<TransactionId>,
) -> Result<impl IntoResponse, Error> {
    let user_id = current_user.require()?;

    let connection = state.connection()?;
    get_owned_transaction(transaction_id, user_id, &connection)?;

    match delete_transaction(transaction_id, user_id, &connection)? {
        0 => Err(Error::NotFound),
        _ => Ok(Json(json!({ "deleted": true }))),
    }
}
