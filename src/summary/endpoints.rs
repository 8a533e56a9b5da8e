//! Route handlers for the summaries and the spending chart.

use std::collections::BTreeMap;

use axum::{
    Json,
    extract::{Query, State, rejection::QueryRejection},
    http::{StatusCode, header::CONTENT_TYPE},
    response::{IntoResponse, Response},
};

use crate::{
    AppState, Error,
    auth::CurrentUser,
    extract::QueryParams,
    summary::{
        aggregation::{
            DateRange, DateRangeQuery, Period, PeriodSummary, SummaryQuery, spending_series,
            summarize_by_category, summarize_by_period,
        },
        chart::{Placeholder, SpendingChart, render_spending_chart},
    },
};

/// A route handler for income and expense totals per month or year.
///
/// Anonymous requests get a 401 with empty totals rather than an error body.
pub async fn summary_endpoint(
    State(state): State<AppState>,
    current_user: CurrentUser,
    QueryParams(query): QueryParams<SummaryQuery>,
) -> Result<Response, Error> {
    let CurrentUser::Authenticated(user_id) = current_user else {
        return Ok((StatusCode::UNAUTHORIZED, Json(PeriodSummary::default())).into_response());
    };

    let period = Period::from(query);

    let connection = state.connection()?;
    let summary = summarize_by_period(user_id, period, &connection)?;

    Ok(Json(summary).into_response())
}

/// A route handler for income and expense totals per category.
///
/// Anonymous requests get a 401 with an empty object rather than an error body.
pub async fn category_summary_endpoint(
    State(state): State<AppState>,
    current_user: CurrentUser,
    QueryParams(query): QueryParams<DateRangeQuery>,
) -> Result<Response, Error> {
    let CurrentUser::Authenticated(user_id) = current_user else {
        return Ok((
            StatusCode::UNAUTHORIZED,
            Json(BTreeMap::<String, f64>::new()),
        )
            .into_response());
    };

    let range = DateRange::try_from(query)?;

    let connection = state.connection()?;
    let summary = summarize_by_category(user_id, range, &connection)?;

    Ok(Json(summary).into_response())
}

/// A route handler for the monthly spending chart.
///
/// Always responds with a PNG. Problems with the request are drawn as a
/// placeholder message instead of being returned as an error status.
pub async fn spending_chart_endpoint(
    State(state): State<AppState>,
    current_user: CurrentUser,
    query: Result<Query<DateRangeQuery>, QueryRejection>,
) -> Result<Response, Error> {
    let chart = load_spending_chart(&state, current_user, query);

    let png = match render_spending_chart(&chart) {
        Ok(png) => png,
        Err(error) => {
            tracing::error!("Could not render spending chart: {error}");
            render_spending_chart(&SpendingChart::Placeholder(Placeholder::ServerError))?
        }
    };

    Ok(([(CONTENT_TYPE, "image/png")], png).into_response())
}

fn load_spending_chart(
    state: &AppState,
    current_user: CurrentUser,
    query: Result<Query<DateRangeQuery>, QueryRejection>,
) -> SpendingChart {
    let CurrentUser::Authenticated(user_id) = current_user else {
        return SpendingChart::Placeholder(Placeholder::Unauthorized);
    };

    let range = match query
        .map_err(Error::from)
        .and_then(|Query(query)| DateRange::try_from(query))
    {
        Ok(range) => range,
        Err(error) => {
            tracing::debug!("Invalid spending chart request: {error}");
            return SpendingChart::Placeholder(Placeholder::InvalidRequest);
        }
    };

    let series = state
        .connection()
        .and_then(|connection| spending_series(user_id, range, &connection));

    match series {
        Ok(chart) => chart,
        Err(error) => {
            tracing::error!("Could not load spending for user {user_id}: {error}");
            SpendingChart::Placeholder(Placeholder::ServerError)
        }
    }
}
