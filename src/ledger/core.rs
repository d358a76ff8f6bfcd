//! Defines the account book entry model and the rules for validating new entries.

use std::{fmt::Display, str::FromStr};

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use time::{Date, OffsetDateTime, format_description::BorrowedFormatItem, macros::format_description};

use crate::{
    DatabaseId, Error, FieldError, UserID,
    validation::{has_length_between, into_result, is_date_pattern},
};

const TITLE_MIN_LENGTH: usize = 10;
const TITLE_MAX_LENGTH: usize = 100;

/// The number of fractional digits an amount is stored with.
pub const AMOUNT_SCALE: u32 = 2;
/// The maximum number of digits in an amount, including the fractional digits.
pub const AMOUNT_PRECISION: u32 = 10;

const DATE_FORMAT: &[BorrowedFormatItem<'_>] = format_description!("[year]-[month]-[day]");

/// Whether money came in or went out.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PaymentType {
    /// Money received.
    Income,
    /// Money spent.
    Expense,
}

impl PaymentType {
    /// The lowercase name used in requests and in the database.
    pub fn as_str(self) -> &'static str {
        match self {
            PaymentType::Income => "income",
            PaymentType::Expense => "expense",
        }
    }
}

impl Display for PaymentType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for PaymentType {
    type Err = FieldError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "income" => Ok(PaymentType::Income),
            "expense" => Ok(PaymentType::Expense),
            _ => Err(FieldError::new(
                "paymentType",
                "paymentType must be one of: income, expense",
            )),
        }
    }
}

/// An amount as sent by the client, either a JSON string or a JSON number.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum AmountInput {
    /// An amount sent as a string, e.g. "12.50".
    Text(String),
    /// An amount sent as a number, e.g. 12.5.
    Number(serde_json::Number),
}

impl AmountInput {
    /// Parse the amount into a decimal with exactly [AMOUNT_SCALE] fractional digits.
    ///
    /// # Errors
    ///
    /// Returns a [FieldError] if the input is not a plain decimal number, has
    /// more than two fractional digits or has more than [AMOUNT_PRECISION]
    /// digits.
    pub fn parse(&self) -> Result<Decimal, FieldError> {
        let text = match self {
            AmountInput::Text(text) => text.clone(),
            AmountInput::Number(number) => number.to_string(),
        };

        let format_error = || {
            FieldError::new(
                "paymentAmount",
                "paymentAmount must be a decimal number with at most 2 decimal places",
            )
        };

        if !is_decimal_text(&text) {
            return Err(format_error());
        }

        let mut amount = Decimal::from_str(&text).map_err(|_| format_error())?;

        if amount.scale() > AMOUNT_SCALE {
            return Err(format_error());
        }

        amount.rescale(AMOUNT_SCALE);

        if amount.mantissa().unsigned_abs() >= 10u128.pow(AMOUNT_PRECISION) {
            return Err(FieldError::new(
                "paymentAmount",
                "paymentAmount must have at most 8 digits before the decimal point",
            ));
        }

        Ok(amount)
    }
}

/// Whether `text` is an optional minus sign, one or more digits and an
/// optional fractional part.
fn is_decimal_text(text: &str) -> bool {
    let unsigned = text.strip_prefix('-').unwrap_or(text);
    let (whole, fraction) = match unsigned.split_once('.') {
        Some((whole, fraction)) => (whole, Some(fraction)),
        None => (unsigned, None),
    };

    let all_digits = |part: &str| !part.is_empty() && part.bytes().all(|b| b.is_ascii_digit());

    all_digits(whole) && fraction.is_none_or(all_digits)
}

/// The request body for creating an account book entry.
///
/// Missing fields are reported as validation errors by [LedgerForm::validate]
/// rather than rejected by the JSON extractor, so that every problem is
/// reported at once.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct LedgerForm {
    /// A short description, 10 to 100 characters.
    #[serde(default)]
    pub title: String,
    /// The amount of money, with at most two decimal places.
    #[serde(default)]
    pub payment_amount: Option<AmountInput>,
    /// Either "income" or "expense".
    #[serde(default)]
    pub payment_type: String,
    /// The category the entry belongs to.
    #[serde(default)]
    pub category_id: Option<DatabaseId>,
    /// The payment method used, if any.
    #[serde(default)]
    pub payment_method_id: Option<DatabaseId>,
    /// Accepted for compatibility with older clients and ignored: the owner
    /// is always the authenticated user.
    #[serde(default)]
    pub user_id: Option<DatabaseId>,
}

/// The fields of a [LedgerForm] after validation.
#[derive(Debug, Clone, PartialEq)]
pub struct ValidatedLedgerFields {
    /// The validated title.
    pub title: String,
    /// The amount with exactly two fractional digits.
    pub payment_amount: Decimal,
    /// Whether the entry is income or an expense.
    pub payment_type: PaymentType,
    /// The category the entry belongs to.
    pub category_id: DatabaseId,
    /// The payment method used, if any.
    pub payment_method_id: Option<DatabaseId>,
}

impl LedgerForm {
    /// Check every field and collect all the problems.
    ///
    /// # Errors
    ///
    /// Returns [Error::Validation] with one [FieldError] per problem.
    pub fn validate(&self) -> Result<ValidatedLedgerFields, Error> {
        let mut errors = Vec::new();

        if !has_length_between(&self.title, TITLE_MIN_LENGTH, TITLE_MAX_LENGTH) {
            errors.push(FieldError::new(
                "title",
                "title must be between 10 and 100 characters long",
            ));
        }

        let payment_amount = match &self.payment_amount {
            Some(input) => input.parse().map_err(|error| errors.push(error)).ok(),
            None => {
                errors.push(FieldError::new(
                    "paymentAmount",
                    "paymentAmount must be a decimal number with at most 2 decimal places",
                ));
                None
            }
        };

        let payment_type = self
            .payment_type
            .parse::<PaymentType>()
            .map_err(|error| errors.push(error))
            .ok();

        if self.category_id.is_none() {
            errors.push(FieldError::new("categoryId", "categoryId must be an integer"));
        }

        match (payment_amount, payment_type, self.category_id) {
            (Some(payment_amount), Some(payment_type), Some(category_id)) if errors.is_empty() => {
                Ok(ValidatedLedgerFields {
                    title: self.title.clone(),
                    payment_amount,
                    payment_type,
                    category_id,
                    payment_method_id: self.payment_method_id,
                })
            }
            _ => Err(Error::Validation(errors)),
        }
    }
}

/// An account book entry as stored.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LedgerRecord {
    /// The ID of the entry.
    pub idx: DatabaseId,
    /// A short description of the entry.
    pub title: String,
    /// The amount with exactly two fractional digits.
    pub payment_amount: Decimal,
    /// Whether the entry is income or an expense.
    pub payment_type: PaymentType,
    /// When the entry was created.
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
    /// When the entry was last changed.
    #[serde(with = "time::serde::rfc3339")]
    pub updated_at: OffsetDateTime,
    /// The category the entry belongs to.
    pub category_id: DatabaseId,
    /// The payment method used, if any.
    pub payment_method_id: Option<DatabaseId>,
    /// The user that created the entry.
    pub user_id: UserID,
}

/// The data needed to add an entry to a ledger store.
#[derive(Debug, Clone, PartialEq)]
pub struct NewLedgerRecord {
    /// A short description of the entry.
    pub title: String,
    /// The amount with exactly two fractional digits.
    pub payment_amount: Decimal,
    /// Whether the entry is income or an expense.
    pub payment_type: PaymentType,
    /// When the entry was created.
    pub created_at: OffsetDateTime,
    /// When the entry was last changed.
    pub updated_at: OffsetDateTime,
    /// The category the entry belongs to.
    pub category_id: DatabaseId,
    /// The payment method used, if any.
    pub payment_method_id: Option<DatabaseId>,
    /// The user that created the entry.
    pub user_id: UserID,
}

/// The name of a category or payment method linked to an entry.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LinkedName {
    /// The unique name of the linked entry.
    pub name: String,
}

/// An account book entry with the names of its category and payment method.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LedgerRecordView {
    /// The ID of the entry.
    pub idx: DatabaseId,
    /// A short description of the entry.
    pub title: String,
    /// Whether the entry is income or an expense.
    pub payment_type: PaymentType,
    /// The amount with exactly two fractional digits.
    pub payment_amount: Decimal,
    /// When the entry was created.
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
    /// The category of the entry.
    pub category: LinkedName,
    /// The payment method of the entry, if any.
    pub payment_method: Option<LinkedName>,
}

/// An inclusive range of calendar dates to search by creation date.
///
/// A missing bound leaves that side of the range open.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DateRange {
    /// The first day to include.
    pub start: Option<Date>,
    /// The last day to include.
    pub end: Option<Date>,
}

impl DateRange {
    /// Parse the optional `YYYY-MM-DD` bounds of a search.
    ///
    /// # Errors
    ///
    /// Returns [Error::Validation] with a message for each bound that is not
    /// a real calendar date in `YYYY-MM-DD` format.
    pub fn parse(start_date: Option<&str>, end_date: Option<&str>) -> Result<Self, Error> {
        let mut errors = Vec::new();

        let start = parse_bound("startDate", start_date, &mut errors);
        let end = parse_bound("endDate", end_date, &mut errors);

        into_result(errors)?;

        Ok(Self { start, end })
    }
}

fn parse_bound(
    field: &'static str,
    value: Option<&str>,
    errors: &mut Vec<FieldError>,
) -> Option<Date> {
    let value = value?;

    let date = is_date_pattern(value)
        .then(|| Date::parse(value, DATE_FORMAT).ok())
        .flatten();

    if date.is_none() {
        errors.push(FieldError {
            field,
            message: format!("{field} must be in YYYY-MM-DD format"),
        });
    }

    date
}
