//! Field level validation helpers shared by the request handlers.
//!
//! Validation functions collect every problem with the input into a list of
//! [FieldError]s so that the client can fix all of them at once.

use axum::{
    Json,
    extract::{
        Path, Query,
        rejection::{JsonRejection, PathRejection, QueryRejection},
    },
};
use serde::Serialize;

use crate::Error;

/// A problem with a single field of a request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FieldError {
    /// The name of the field as the client sent it, e.g. "paymentAmount".
    pub field: &'static str,
    /// A message the client can show to the user.
    pub message: String,
}

impl FieldError {
    /// Create a field error.
    pub fn new(field: &'static str, message: &str) -> Self {
        Self {
            field,
            message: message.to_owned(),
        }
    }
}

pub(crate) fn join_messages(errors: &[FieldError]) -> String {
    errors
        .iter()
        .map(|error| error.message.as_str())
        .collect::<Vec<_>>()
        .join("; ")
}

/// Turn the collected field errors into a result.
pub(crate) fn into_result(errors: Vec<FieldError>) -> Result<(), Error> {
    if errors.is_empty() {
        Ok(())
    } else {
        Err(Error::Validation(errors))
    }
}

/// Whether the number of characters in `value` is within `min..=max`.
pub(crate) fn has_length_between(value: &str, min: usize, max: usize) -> bool {
    let length = value.chars().count();

    (min..=max).contains(&length)
}

/// Whether `value` looks like a calendar date `YYYY-MM-DD` with a month in
/// 01-12 and a day in 01-31.
///
/// This only checks the shape of the string, e.g. "2024-02-31" passes.
pub(crate) fn is_date_pattern(value: &str) -> bool {
    let bytes = value.as_bytes();

    if bytes.len() != 10 || bytes[4] != b'-' || bytes[7] != b'-' {
        return false;
    }

    let all_digits = bytes
        .iter()
        .enumerate()
        .filter(|(i, _)| *i != 4 && *i != 7)
        .all(|(_, byte)| byte.is_ascii_digit());

    if !all_digits {
        return false;
    }

    let month = &value[5..7];
    let day = &value[8..10];

    ("01"..="12").contains(&month) && ("01"..="31").contains(&day)
}

/// Unwrap a JSON body, reporting a malformed body as a validation error.
pub(crate) fn parse_json<T>(payload: Result<Json<T>, JsonRejection>) -> Result<T, Error> {
    payload.map(|Json(value)| value).map_err(|rejection| {
        tracing::debug!("Rejected JSON body: {rejection}");
        Error::Validation(vec![FieldError {
            field: "body",
            message: rejection.body_text(),
        }])
    })
}

/// Unwrap a query string, reporting a malformed query as a validation error.
pub(crate) fn parse_query<T>(query: Result<Query<T>, QueryRejection>) -> Result<T, Error> {
    query.map(|Query(value)| value).map_err(|rejection| {
        Error::Validation(vec![FieldError {
            field: "query",
            message: rejection.body_text(),
        }])
    })
}

/// Unwrap a path parameter, reporting a malformed parameter as a validation error.
pub(crate) fn parse_path<T>(path: Result<Path<T>, PathRejection>) -> Result<T, Error> {
    path.map(|Path(value)| value).map_err(|rejection| {
        Error::Validation(vec![FieldError {
            field: "path",
            message: rejection.body_text(),
        }])
    })
}
