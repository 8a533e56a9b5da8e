//! Transaction data aggregation for the summary endpoints and the spending chart.
//!
//! Totals are summed per group first and rounded to cents afterwards, see
//! [round_currency].

use std::collections::BTreeMap;

use rusqlite::Connection;
use serde::{Deserialize, Serialize};
use time::Date;

use crate::{
    Error,
    auth::UserID,
    summary::chart::{Placeholder, SpendingChart},
    transaction::{
        Transaction, TransactionFilter, TransactionType, list_transactions, parse_optional_date,
    },
};

/// The calendar period that summary totals are grouped by.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub enum Period {
    /// Group by calendar month, keys look like "2024-01".
    #[default]
    Month,
    /// Group by calendar year, keys look like "2024".
    Year,
}

impl Period {
    /// The bucket key for `date`.
    pub fn bucket(&self, date: Date) -> String {
        match self {
            Period::Month => format!("{:04}-{:02}", date.year(), u8::from(date.month())),
            Period::Year => format!("{:04}", date.year()),
        }
    }
}

impl From<&str> for Period {
    /// Only "year" selects [Period::Year], any other value falls back to months.
    fn from(s: &str) -> Self {
        match s {
            "year" => Period::Year,
            _ => Period::Month,
        }
    }
}

/// Round `value` to two decimal places, with ties rounded away from zero.
///
/// For example, `0.125` rounds to `0.13` and `-0.125` to `-0.13`.
/// Values too large to scale by 100 have no fractional part and are returned
/// as they are.
pub fn round_currency(value: f64) -> f64 {
    let cents = value * 100.0;

    if !cents.is_finite() {
        return value;
    }

    cents.round() / 100.0
}

/// The raw `period` query parameter of the summary endpoint.
#[derive(Debug, Default, Deserialize)]
pub struct SummaryQuery {
    /// "month" or "year", defaults to "month".
    pub period: Option<String>,
}

impl From<SummaryQuery> for Period {
    fn from(query: SummaryQuery) -> Self {
        query.period.as_deref().map(Period::from).unwrap_or_default()
    }
}

/// The raw `from` and `to` query parameters.
#[derive(Debug, Default, Deserialize)]
pub struct DateRangeQuery {
    /// The earliest date to include.
    pub from: Option<String>,
    /// The latest date to include.
    pub to: Option<String>,
}

/// An inclusive date range where either end may be open.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct DateRange {
    /// Inclusive lower bound.
    pub from: Option<Date>,
    /// Inclusive upper bound.
    pub to: Option<Date>,
}

impl TryFrom<DateRangeQuery> for DateRange {
    type Error = Error;

    fn try_from(query: DateRangeQuery) -> Result<Self, Self::Error> {
        Ok(DateRange {
            from: parse_optional_date(query.from.as_deref(), "from")?,
            to: parse_optional_date(query.to.as_deref(), "to")?,
        })
    }
}

/// Income and expense totals keyed by period bucket.
#[derive(Debug, Default, Clone, PartialEq, Serialize)]
pub struct PeriodSummary {
    /// Total income per bucket.
    pub income: BTreeMap<String, f64>,
    /// Total expenses per bucket.
    pub expense: BTreeMap<String, f64>,
}

/// The totals for a single category.
///
/// A type with no transactions in the category is left out when serialized.
#[derive(Debug, Default, Clone, PartialEq, Serialize)]
pub struct CategoryTotals {
    /// Total income in the category.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub income: Option<f64>,
    /// Total expenses in the category.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub expense: Option<f64>,
}

/// The total spent in one calendar month.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MonthlySpending {
    /// The month as "YYYY-MM".
    pub month: String,
    /// The rounded sum of the expenses in the month.
    pub total: f64,
}

fn get_user_transactions(
    user_id: UserID,
    range: DateRange,
    connection: &Connection,
) -> Result<Vec<Transaction>, Error> {
    let filter = TransactionFilter {
        from: range.from,
        to: range.to,
        ..Default::default()
    };

    list_transactions(user_id, &filter, connection)
}

/// Total each of the user's transactions by period and type.
///
/// # Errors
/// Returns [Error::SqlError] if the transactions cannot be fetched.
pub fn summarize_by_period(
    user_id: UserID,
    period: Period,
    connection: &Connection,
) -> Result<PeriodSummary, Error> {
    let transactions = get_user_transactions(user_id, DateRange::default(), connection)?;

    Ok(aggregate_by_period(&transactions, period))
}

fn aggregate_by_period(transactions: &[Transaction], period: Period) -> PeriodSummary {
    let mut summary = PeriodSummary::default();

    for transaction in transactions {
        let totals = match transaction.kind {
            TransactionType::Income => &mut summary.income,
            TransactionType::Expense => &mut summary.expense,
        };

        *totals.entry(period.bucket(transaction.date)).or_insert(0.0) += transaction.amount;
    }

    for total in summary.income.values_mut().chain(summary.expense.values_mut()) {
        *total = round_currency(*total);
    }

    summary
}

/// Total the user's transactions in `range` by category and type.
///
/// # Errors
/// Returns [Error::SqlError] if the transactions cannot be fetched.
pub fn summarize_by_category(
    user_id: UserID,
    range: DateRange,
    connection: &Connection,
) -> Result<BTreeMap<String, CategoryTotals>, Error> {
    let transactions = get_user_transactions(user_id, range, connection)?;

    Ok(aggregate_by_category(&transactions))
}

fn aggregate_by_category(transactions: &[Transaction]) -> BTreeMap<String, CategoryTotals> {
    let mut categories: BTreeMap<String, CategoryTotals> = BTreeMap::new();

    for transaction in transactions {
        let totals = categories.entry(transaction.category.clone()).or_default();
        let total = match transaction.kind {
            TransactionType::Income => &mut totals.income,
            TransactionType::Expense => &mut totals.expense,
        };

        *total.get_or_insert(0.0) += transaction.amount;
    }

    for totals in categories.values_mut() {
        totals.income = totals.income.map(round_currency);
        totals.expense = totals.expense.map(round_currency);
    }

    categories
}

/// Total the user's expenses in `range` by month, in chronological order.
///
/// An empty result is returned as a placeholder that says whether there were
/// no transactions at all or only income.
///
/// # Errors
/// Returns [Error::SqlError] if the transactions cannot be fetched.
pub fn spending_series(
    user_id: UserID,
    range: DateRange,
    connection: &Connection,
) -> Result<SpendingChart, Error> {
    let transactions = get_user_transactions(user_id, range, connection)?;

    Ok(aggregate_spending(&transactions))
}

fn aggregate_spending(transactions: &[Transaction]) -> SpendingChart {
    if transactions.is_empty() {
        return SpendingChart::Placeholder(Placeholder::NoData);
    }

    let mut monthly_totals: BTreeMap<String, f64> = BTreeMap::new();

    for transaction in transactions
        .iter()
        .filter(|transaction| transaction.kind == TransactionType::Expense)
    {
        *monthly_totals
            .entry(Period::Month.bucket(transaction.date))
            .or_insert(0.0) += transaction.amount;
    }

    if monthly_totals.is_empty() {
        return SpendingChart::Placeholder(Placeholder::NoExpenseData);
    }

    SpendingChart::Series(
        monthly_totals
            .into_iter()
            .map(|(month, total)| MonthlySpending {
                month,
                total: round_currency(total),
            })
            .collect(),
    )
}


#[cfg(test)]
mod query_tests {
    use time::macros::date;

    use crate::{
        Error,
        summary::aggregation::{DateRange, DateRangeQuery, Period, SummaryQuery},
    };

    fn period_of(value: &str) -> Period {
        Period::from(SummaryQuery {
            period: Some(value.to_owned()),
        })
    }

    #[test]
    fn period_defaults_to_month() {
        assert_eq!(Period::from(SummaryQuery::default()), Period::Month);
        assert_eq!(period_of(""), Period::Month);
        assert_eq!(period_of("month"), Period::Month);
    }

    #[test]
    fn only_exact_year_selects_years() {
        assert_eq!(period_of("year"), Period::Year);
        assert_eq!(period_of("Year"), Period::Month);
        assert_eq!(period_of("week"), Period::Month);
    }

    #[test]
    fn buckets_by_month_and_year() {
        assert_eq!(Period::Month.bucket(date!(2024 - 01 - 15)), "2024-01");
        assert_eq!(Period::Year.bucket(date!(2024 - 01 - 15)), "2024");
    }

    #[test]
    fn parses_date_range() {
        let range = DateRange::try_from(DateRangeQuery {
            from: Some("2024-01-01".to_owned()),
            to: None,
        });

        assert_eq!(
            range,
            Ok(DateRange {
                from: Some(date!(2024 - 01 - 01)),
                to: None
            })
        );
    }

    #[test]
    fn invalid_range_date_is_rejected() {
        let range = DateRange::try_from(DateRangeQuery {
            from: None,
            to: Some("31/01/2024".to_owned()),
        });

        assert!(matches!(range, Err(Error::InvalidPayload(_))));
    }
}
