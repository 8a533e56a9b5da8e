//! Parses the JSON bodies for creating and updating transactions.
//!
//! Clients send dates and amounts in a few shapes, so the raw bodies keep each
//! field as a [serde_json::Value] and the functions here turn them into the
//! validated [NewTransaction] and [TransactionUpdate].

use serde::{Deserialize, Deserializer};
use serde_json::Value;
use time::{Date, format_description::BorrowedFormatItem, macros::format_description};

use crate::{
    Error,
    transaction::{NewTransaction, Transaction, TransactionType},
};

/// The format used for dates in requests and responses.
pub const DATE_FORMAT: &[BorrowedFormatItem] = format_description!("[year]-[month]-[day]");

/// The raw body of a create request.
#[derive(Debug, Default, Deserialize)]
pub struct CreateTransactionBody {
    #[serde(default)]
    date: Option<Value>,
    #[serde(default)]
    category: Option<Value>,
    #[serde(default, rename = "type")]
    kind: Option<Value>,
    #[serde(default)]
    amount: Option<Value>,
    #[serde(default)]
    notes: Option<Value>,
}

/// The raw body of an update request.
///
/// A key that is present with a `null` value is kept as `Some(Value::Null)`,
/// so it can be told apart from a key that was left out.
#[derive(Debug, Default, Deserialize)]
pub struct UpdateTransactionBody {
    #[serde(default, deserialize_with = "deserialize_present")]
    date: Option<Value>,
    #[serde(default, deserialize_with = "deserialize_present")]
    category: Option<Value>,
    #[serde(default, rename = "type", deserialize_with = "deserialize_present")]
    kind: Option<Value>,
    #[serde(default, deserialize_with = "deserialize_present")]
    amount: Option<Value>,
    #[serde(default, deserialize_with = "deserialize_present")]
    notes: Option<Value>,
}

fn deserialize_present<'de, D>(deserializer: D) -> Result<Option<Value>, D::Error>
where
    D: Deserializer<'de>,
{
    Value::deserialize(deserializer).map(Some)
}

/// The validated changes for a partial update.
///
/// `None` means the field is left untouched. For `notes`, `Some(None)` clears
/// the notes.
#[derive(Debug, Default, Clone, PartialEq)]
pub struct TransactionUpdate {
    /// The new date.
    pub date: Option<Date>,
    /// The new category.
    pub category: Option<String>,
    /// The new transaction type.
    pub kind: Option<TransactionType>,
    /// The new amount.
    pub amount: Option<f64>,
    /// The new notes, or `Some(None)` to clear them.
    pub notes: Option<Option<String>>,
}

impl TransactionUpdate {
    /// Apply the changes to `transaction`, leaving omitted fields as they were.
    pub fn apply_to(self, transaction: &mut Transaction) {
        if let Some(date) = self.date {
            transaction.date = date;
        }

        if let Some(category) = self.category {
            transaction.category = category;
        }

        if let Some(kind) = self.kind {
            transaction.kind = kind;
        }

        if let Some(amount) = self.amount {
            transaction.amount = amount;
        }

        if let Some(notes) = self.notes {
            transaction.notes = notes;
        }
    }
}

/// Parse a `YYYY-MM-DD` date.
///
/// # Errors
/// Returns [Error::InvalidPayload] naming `field` if the date is invalid.
pub fn parse_date(text: &str, field: &str) -> Result<Date, Error> {
    Date::parse(text.trim(), DATE_FORMAT)
        .map_err(|error| Error::InvalidPayload(format!("{field} must be a YYYY-MM-DD date: {error}")))
}

/// Whether a required field should be reported as missing.
fn is_blank(value: Option<&Value>) -> bool {
    match value {
        None | Some(Value::Null) => true,
        Some(Value::String(text)) => text.trim().is_empty(),
        Some(_) => false,
    }
}

fn expect_string<'a>(value: &'a Value, field: &str) -> Result<&'a str, Error> {
    value
        .as_str()
        .ok_or_else(|| Error::InvalidPayload(format!("{field} must be a string")))
}

fn parse_date_value(value: &Value) -> Result<Date, Error> {
    parse_date(expect_string(value, "date")?, "date")
}

fn parse_category_value(value: &Value) -> Result<String, Error> {
    let category = expect_string(value, "category")?.trim();

    if category.is_empty() {
        return Err(Error::InvalidPayload("category must not be empty".to_owned()));
    }

    Ok(category.to_owned())
}

fn parse_kind_value(value: &Value) -> Result<TransactionType, Error> {
    expect_string(value, "type")?.parse()
}

/// Amounts may be sent as a JSON number or as a numeric string.
fn parse_amount_value(value: &Value) -> Result<f64, Error> {
    let amount = match value {
        Value::Number(number) => number.as_f64(),
        Value::String(text) => text.trim().parse::<f64>().ok(),
        _ => None,
    };

    match amount {
        Some(amount) if amount.is_finite() => Ok(amount),
        _ => Err(Error::InvalidPayload(format!(
            "amount must be a finite number, got {value}"
        ))),
    }
}

/// Notes are optional, `null` and blank strings both mean "no notes".
fn parse_notes_value(value: &Value) -> Result<Option<String>, Error> {
    match value {
        Value::Null => Ok(None),
        Value::String(text) => {
            let notes = text.trim();
            Ok((!notes.is_empty()).then(|| notes.to_owned()))
        }
        _ => Err(Error::InvalidPayload("notes must be a string".to_owned())),
    }
}

impl TryFrom<CreateTransactionBody> for NewTransaction {
    type Error = Error;

    /// Validate a create request.
    ///
    /// # Errors
    /// Returns a:
    /// - [Error::MissingFields] listing every required field that is absent,
    ///   `null` or blank, in the order date, category, type, amount,
    /// - or [Error::InvalidPayload] if a present field cannot be parsed.
    fn try_from(body: CreateTransactionBody) -> Result<Self, Self::Error> {
        let missing_fields: Vec<&'static str> = [
            ("date", &body.date),
            ("category", &body.category),
            ("type", &body.kind),
            ("amount", &body.amount),
        ]
        .into_iter()
        .filter(|(_, value)| is_blank(value.as_ref()))
        .map(|(name, _)| name)
        .collect();

        let (Some(date), Some(category), Some(kind), Some(amount)) =
            (&body.date, &body.category, &body.kind, &body.amount)
        else {
            return Err(Error::MissingFields(missing_fields));
        };

        if !missing_fields.is_empty() {
            return Err(Error::MissingFields(missing_fields));
        }

        Ok(NewTransaction {
            date: parse_date_value(date)?,
            category: parse_category_value(category)?,
            kind: parse_kind_value(kind)?,
            amount: parse_amount_value(amount)?,
            notes: match &body.notes {
                Some(notes) => parse_notes_value(notes)?,
                None => None,
            },
        })
    }
}

impl TryFrom<UpdateTransactionBody> for TransactionUpdate {
    type Error = Error;

    /// Validate an update request.
    ///
    /// Present fields follow the same rules as for creating a transaction,
    /// except that a blank required field is invalid rather than missing.
    ///
    /// # Errors
    /// Returns [Error::InvalidPayload] if a present field cannot be parsed.
    fn try_from(body: UpdateTransactionBody) -> Result<Self, Self::Error> {
        Ok(TransactionUpdate {
            date: body.date.as_ref().map(parse_date_value).transpose()?,
            category: body
                .category
                .as_ref()
                .map(parse_category_value)
                .transpose()?,
            kind: body.kind.as_ref().map(parse_kind_value).transpose()?,
            amount: body.amount.as_ref().map(parse_amount_value).transpose()?,
            notes: body.notes.as_ref().map(parse_notes_value).transpose()?,
        })
    }
}


#[cfg(test)]
mod update_body_tests {
    use serde_json::json;
    use time::macros::date;

    use crate::{
        Error,
        auth::UserID,
        transaction::{
            Transaction, TransactionType,
            payload::{TransactionUpdate, UpdateTransactionBody},
        },
    };

    fn parse(body: serde_json::Value) -> Result<TransactionUpdate, Error> {
        serde_json::from_value::<UpdateTransactionBody>(body)
            .unwrap()
            .try_into()
    }

    fn sample_transaction() -> Transaction {
        Transaction {
            id: 1,
            date: date!(2024 - 01 - 15),
            category: "Food".to_owned(),
            kind: TransactionType::Expense,
            amount: 12.5,
            notes: Some("lunch".to_owned()),
            user_id: UserID::new(1),
        }
    }

    #[test]
    fn empty_body_changes_nothing() {
        let update = parse(json!({})).unwrap();
        let mut transaction = sample_transaction();

        update.apply_to(&mut transaction);

        assert_eq!(transaction, sample_transaction());
    }

    #[test]
    fn applies_only_present_fields() {
        let update = parse(json!({ "amount": 20, "type": "INCOME" })).unwrap();
        let mut transaction = sample_transaction();

        update.apply_to(&mut transaction);

        assert_eq!(transaction.amount, 20.0);
        assert_eq!(transaction.kind, TransactionType::Income);
        assert_eq!(transaction.category, "Food");
        assert_eq!(transaction.notes.as_deref(), Some("lunch"));
    }

    #[test]
    fn null_notes_clear_notes() {
        let update = parse(json!({ "notes": null })).unwrap();
        let mut transaction = sample_transaction();

        update.apply_to(&mut transaction);

        assert_eq!(transaction.notes, None);
    }

    #[test]
    fn present_but_empty_required_fields_are_invalid() {
        for body in [
            json!({ "category": "" }),
            json!({ "type": null }),
            json!({ "date": "" }),
            json!({ "amount": null }),
        ] {
            let result = parse(body.clone());

            assert!(
                matches!(result, Err(Error::InvalidPayload(_))),
                "expected invalid payload for {body}, got {result:?}"
            );
        }
    }
}
