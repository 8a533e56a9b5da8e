//! Database queries for listing a user's transactions with filters.

use rusqlite::{Connection, named_params};
use serde::Deserialize;
use time::Date;

use crate::{
    Error,
    auth::UserID,
    transaction::{Transaction, TransactionType, map_transaction_row, payload::parse_date},
};

/// The raw query string for listing transactions.
///
/// Every parameter is optional and an empty value is treated as if it were
/// left out.
#[derive(Debug, Default, Deserialize)]
pub struct ListQuery {
    /// The earliest date to include.
    pub from: Option<String>,
    /// The latest date to include.
    pub to: Option<String>,
    /// Only include income or expenses.
    #[serde(rename = "type")]
    pub kind: Option<String>,
    /// Only include transactions with exactly this category.
    pub category: Option<String>,
}

/// The validated filters for [list_transactions].
#[derive(Debug, Default, Clone, PartialEq)]
pub struct TransactionFilter {
    /// Inclusive lower bound on the date.
    pub from: Option<Date>,
    /// Inclusive upper bound on the date.
    pub to: Option<Date>,
    /// Only include transactions of this type.
    pub kind: Option<TransactionType>,
    /// Only include transactions with this category.
    pub category: Option<String>,
}

/// Drop query values that are empty after trimming.
fn non_empty(value: Option<&str>) -> Option<&str> {
    value.map(str::trim).filter(|value| !value.is_empty())
}

/// Parse an optional date query parameter.
///
/// # Errors
/// Returns [Error::InvalidPayload] if the value is present but not a valid date.
pub(crate) fn parse_optional_date(value: Option<&str>, field: &str) -> Result<Option<Date>, Error> {
    non_empty(value)
        .map(|text| parse_date(text, field))
        .transpose()
}

impl TryFrom<ListQuery> for TransactionFilter {
    type Error = Error;

    /// Validate the list query.
    ///
    /// A `type` other than income or expense is ignored rather than rejected.
    ///
    /// # Errors
    /// Returns [Error::InvalidPayload] if `from` or `to` is not a valid date.
    fn try_from(query: ListQuery) -> Result<Self, Self::Error> {
        let kind = non_empty(query.kind.as_deref()).and_then(|kind| kind.parse().ok());

        Ok(TransactionFilter {
            from: parse_optional_date(query.from.as_deref(), "from")?,
            to: parse_optional_date(query.to.as_deref(), "to")?,
            kind,
            category: non_empty(query.category.as_deref()).map(str::to_owned),
        })
    }
}

/// Get the transactions owned by `user_id` that match every filter in `filter`.
///
/// Transactions are ordered by date, newest first, and then by ID so that the
/// order is stable for transactions on the same day.
///
/// # Errors
/// Returns [Error::SqlError] if the query fails or a row cannot be mapped.
pub fn list_transactions(
    user_id: UserID,
    filter: &TransactionFilter,
    connection: &Connection,
) -> Result<Vec<Transaction>, Error> {
    connection
        .prepare(
            "SELECT id, date, category, type, amount, notes, user_id FROM \"transaction\"
            WHERE user_id = :user_id
                AND (:from IS NULL OR date >= :from)
                AND (:to IS NULL OR date <= :to)
                AND (:type IS NULL OR type = :type)
                AND (:category IS NULL OR category = :category)
            ORDER BY date DESC, id DESC",
        )?
        .query_map(
            named_params! {
                ":user_id": user_id.as_i64(),
                ":from": filter.from,
                ":to": filter.to,
                ":type": filter.kind,
                ":category": filter.category,
            },
            map_transaction_row,
        )?
        .map(|transaction_result| transaction_result.map_err(Error::SqlError))
        .collect()
}

#[cfg(test)]
mod filter_tests {
    use time::macros::date;

    use crate::{
        Error,
        transaction::{
            TransactionType,
            query::{ListQuery, TransactionFilter},
        },
    };

    #[test]
    fn empty_values_are_absent() {
        let query = ListQuery {
            from: Some(String::new()),
            to: Some("  ".to_owned()),
            kind: Some(String::new()),
            category: Some(String::new()),
        };

        assert_eq!(TransactionFilter::try_from(query), Ok(TransactionFilter::default()));
    }

    #[test]
    fn parses_every_filter() {
        let query = ListQuery {
            from: Some("2024-01-01".to_owned()),
            to: Some("2024-01-31".to_owned()),
            kind: Some("Income".to_owned()),
            category: Some("Salary".to_owned()),
        };

        assert_eq!(
            TransactionFilter::try_from(query),
            Ok(TransactionFilter {
                from: Some(date!(2024 - 01 - 01)),
                to: Some(date!(2024 - 01 - 31)),
                kind: Some(TransactionType::Income),
                category: Some("Salary".to_owned()),
            })
        );
    }

    #[test]
    fn unknown_type_is_ignored() {
        let query = ListQuery {
            kind: Some("refund".to_owned()),
            ..Default::default()
        };

        assert_eq!(TransactionFilter::try_from(query), Ok(TransactionFilter::default()));
    }

    #[test]
    fn invalid_date_is_rejected() {
        let query = ListQuery {
            from: Some("January".to_owned()),
            ..Default::default()
        };

        assert!(matches!(
            TransactionFilter::try_from(query),
            Err(Error::InvalidPayload(_))
        ));
    }
}

#[cfg(test)]
mod database_tests {
    use rusqlite::Connection;
    use time::{Date, macros::date};

    use crate::{
        auth::UserID,
        test_utils::{get_test_connection, insert_test_user},
        transaction::{
            NewTransaction, TransactionId, TransactionType, create_transaction,
            query::{TransactionFilter, list_transactions},
        },
    };

    fn insert(
        date: Date,
        category: &str,
        kind: TransactionType,
        user_id: UserID,
        conn: &Connection,
    ) -> TransactionId {
        create_transaction(
            NewTransaction {
                date,
                category: category.to_owned(),
                kind,
                amount: 10.0,
                notes: None,
            },
            user_id,
            conn,
        )
        .expect("Could not create transaction")
        .id
    }

    fn list_ids(user_id: UserID, filter: TransactionFilter, conn: &Connection) -> Vec<TransactionId> {
        list_transactions(user_id, &filter, conn)
            .expect("Could not list transactions")
            .into_iter()
            .map(|transaction| transaction.id)
            .collect()
    }

    #[test]
    fn lists_only_own_transactions_newest_first() {
        let conn = get_test_connection();
        let owner = insert_test_user("owner@example.com", &conn);
        let other = insert_test_user("other@example.com", &conn);
        let older = insert(date!(2024 - 01 - 01), "Food", TransactionType::Expense, owner, &conn);
        let newer = insert(date!(2024 - 02 - 01), "Food", TransactionType::Expense, owner, &conn);
        let same_day = insert(date!(2024 - 02 - 01), "Rent", TransactionType::Expense, owner, &conn);
        insert(date!(2024 - 03 - 01), "Food", TransactionType::Expense, other, &conn);

        let ids = list_ids(owner, TransactionFilter::default(), &conn);

        assert_eq!(ids, vec![same_day, newer, older]);
    }

    #[test]
    fn date_range_is_inclusive() {
        let conn = get_test_connection();
        let owner = insert_test_user("owner@example.com", &conn);
        insert(date!(2023 - 12 - 31), "Food", TransactionType::Expense, owner, &conn);
        let first = insert(date!(2024 - 01 - 01), "Food", TransactionType::Expense, owner, &conn);
        let last = insert(date!(2024 - 01 - 31), "Food", TransactionType::Expense, owner, &conn);
        insert(date!(2024 - 02 - 01), "Food", TransactionType::Expense, owner, &conn);

        let ids = list_ids(
            owner,
            TransactionFilter {
                from: Some(date!(2024 - 01 - 01)),
                to: Some(date!(2024 - 01 - 31)),
                ..Default::default()
            },
            &conn,
        );

        assert_eq!(ids, vec![last, first]);
    }

    #[test]
    fn filters_by_type_and_category() {
        let conn = get_test_connection();
        let owner = insert_test_user("owner@example.com", &conn);
        let salary = insert(date!(2024 - 01 - 01), "Salary", TransactionType::Income, owner, &conn);
        insert(date!(2024 - 01 - 02), "Food", TransactionType::Expense, owner, &conn);
        insert(date!(2024 - 01 - 03), "Salary", TransactionType::Expense, owner, &conn);

        let income = list_ids(
            owner,
            TransactionFilter {
                kind: Some(TransactionType::Income),
                ..Default::default()
            },
            &conn,
        );
        let salary_income = list_ids(
            owner,
            TransactionFilter {
                kind: Some(TransactionType::Income),
                category: Some("Salary".to_owned()),
                ..Default::default()
            },
            &conn,
        );

        assert_eq!(income, vec![salary]);
        assert_eq!(salary_income, vec![salary]);
    }
}
