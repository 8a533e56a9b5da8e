//! Application router configuration.

use axum::{
    Json, Router,
    routing::{get, post, put},
};
use serde_json::{Value, json};

use crate::{
    AppState, Error,
    auth::{log_in, sign_up},
    endpoints,
    summary::{category_summary_endpoint, spending_chart_endpoint, summary_endpoint},
    transaction::{
        create_transaction_endpoint, delete_transaction_endpoint, list_transactions_endpoint,
        update_transaction_endpoint,
    },
};

/// Return a router with all the app's routes.
///
/// The ledger and summary routes check the bearer token themselves through
/// the [crate::auth::CurrentUser] extractor, so there is no auth layer here.
pub fn build_router(state: AppState) -> Router {
    let auth_routes = Router::new()
        .route(endpoints::SIGN_UP, post(sign_up))
        .route(endpoints::LOG_IN, post(log_in));

    let ledger_routes = Router::new()
        .route(
            endpoints::TRANSACTIONS,
            get(list_transactions_endpoint).post(create_transaction_endpoint),
        )
        .route(
            endpoints::TRANSACTION,
            put(update_transaction_endpoint).delete(delete_transaction_endpoint),
        )
        .route(endpoints::SUMMARY, get(summary_endpoint))
        .route(endpoints::CATEGORY_SUMMARY, get(category_summary_endpoint))
        .route(endpoints::SPENDING_CHART, get(spending_chart_endpoint));

    Router::new()
        .route(endpoints::HEALTH, get(get_health))
        .merge(auth_routes)
        .merge(ledger_routes)
        .fallback(get_404_not_found)
        .with_state(state)
}

async fn get_health() -> Json<Value> {
    Json(json!({ "status": "ok" }))
}

async fn get_404_not_found() -> Error {
    Error::NotFound
}

#[cfg(test)]
mod routing_tests {
    use axum::http::StatusCode;
    use serde_json::json;

    use crate::{endpoints, test_utils::get_test_server};

    #[tokio::test]
    async fn health_check_needs_no_token() {
        let server = get_test_server();

        let response = server.get(endpoints::HEALTH).await;

        response.assert_status_ok();
        response.assert_json(&json!({ "status": "ok" }));
    }

    #[tokio::test]
    async fn unknown_route_is_json_not_found() {
        let server = get_test_server();

        let response = server.get("/api/coffee").await;

        response.assert_status(StatusCode::NOT_FOUND);
        response.assert_json(&json!({ "error": "Not found" }));
    }
}
