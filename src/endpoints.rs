//! The API endpoints URIs.
//!
//! Tests fill in endpoints that take a parameter, e.g., '/api/transactions/{transaction_id}',
//! with `format_endpoint`.

/// The route for checking that the server is up.
pub const HEALTH: &str = "/api/health";
/// The route for registering a new user.
pub const SIGN_UP: &str = "/api/auth/signup";
/// The route for logging in a user.
pub const LOG_IN: &str = "/api/auth/login";
/// The route to list and create transactions.
pub const TRANSACTIONS: &str = "/api/transactions";
/// The route to update or delete a single transaction.
pub const TRANSACTION: &str = "/api/transactions/{transaction_id}";
/// The route for income and expense totals per month or year.
pub const SUMMARY: &str = "/api/summary";
/// The route for income and expense totals per category.
pub const CATEGORY_SUMMARY: &str = "/api/category-summary";
/// The route for the monthly spending chart image.
pub const SPENDING_CHART: &str = "/api/chart/spending.png";

/// Replace the parameter in `endpoint_path` with `id`.
///
/// A parameter is a string that starts with a left brace, followed by
/// lowercase letters or underscores, and ends with a right brace.
/// For example, in the endpoint path '/users/{user_id}', '{user_id}' is the parameter.
///
/// This function assumes that an endpoint path only contains ASCII characters
/// and a single parameter.
///
/// If no parameter is found, `endpoint_path` is returned unchanged.
#[cfg(test)]
pub fn format_endpoint(endpoint_path: &str, id: i64) -> String {
    let Some(param_start) = endpoint_path.find('{') else {
        return endpoint_path.to_string();
    };

    let param_end = endpoint_path[param_start..]
        .find('}')
        .map_or(endpoint_path.len(), |offset| param_start + offset + 1);

    format!(
        "{}{}{}",
        &endpoint_path[..param_start],
        id,
        &endpoint_path[param_end..]
    )
}

// These tests are here so that we know when we call `Uri::from_shared` it will not panic.
#[cfg(test)]
mod endpoints_tests {
    use axum::http::Uri;

    use crate::endpoints;

    use super::format_endpoint;

    fn assert_endpoint_is_valid_uri(uri: &str) {
        assert!(uri.parse::<Uri>().is_ok());
    }

    #[test]
    fn endpoints_are_valid_uris() {
        assert_endpoint_is_valid_uri(endpoints::HEALTH);
        assert_endpoint_is_valid_uri(endpoints::SIGN_UP);
        assert_endpoint_is_valid_uri(endpoints::LOG_IN);
        assert_endpoint_is_valid_uri(endpoints::TRANSACTIONS);
        assert_endpoint_is_valid_uri(endpoints::TRANSACTION);
        assert_endpoint_is_valid_uri(endpoints::SUMMARY);
        assert_endpoint_is_valid_uri(endpoints::CATEGORY_SUMMARY);
        assert_endpoint_is_valid_uri(endpoints::SPENDING_CHART);
    }

    #[test]
    fn format_endpoint_replaces_parameter() {
        assert_eq!(
            format_endpoint(endpoints::TRANSACTION, 42),
            "/api/transactions/42"
        );
    }

    #[test]
    fn format_endpoint_keeps_text_after_parameter() {
        assert_eq!(format_endpoint("/hello/{id}/world", 1), "/hello/1/world");
    }

    #[test]
    fn format_endpoint_without_parameter_is_unchanged() {
        assert_eq!(
            format_endpoint(endpoints::TRANSACTIONS, 1),
            endpoints::TRANSACTIONS
        );
    }
}
