//! Field-level validation errors and the checks shared by the request handlers.

use std::{collections::BTreeMap, fmt::Display};

use serde::Serialize;
use serde_json::Value;

use crate::{
    Error,
    money::{Money, MoneyError},
};

/// The validation messages for each invalid field of a request, keyed by field name.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(transparent)]
pub struct ValidationErrors(BTreeMap<&'static str, Vec<String>>);

impl ValidationErrors {
    /// Create a set of errors containing a single message for `field`.
    pub fn single(field: &'static str, message: impl Into<String>) -> Self {
        let mut errors = Self::default();
        errors.add(field, message);
        errors
    }

    /// Add a message for `field`.
    pub fn add(&mut self, field: &'static str, message: impl Into<String>) {
        self.0.entry(field).or_default().push(message.into());
    }

    /// Whether no field has failed validation.
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Get the messages for `field`, if any.
    pub fn get(&self, field: &str) -> Option<&[String]> {
        self.0.get(field).map(Vec::as_slice)
    }

    /// The first message followed by a count of the remaining messages,
    /// e.g. "The name field is required. (and 2 more errors)".
    pub fn summary(&self) -> String {
        let mut messages = self.0.values().flatten();

        let Some(first) = messages.next() else {
            return "The given data was invalid.".to_owned();
        };

        match messages.count() {
            0 => first.clone(),
            1 => format!("{first} (and 1 more error)"),
            remaining => format!("{first} (and {remaining} more errors)"),
        }
    }

    /// Return `Ok(())` if there are no errors, otherwise [Error::Validation].
    pub fn into_result(self) -> Result<(), Error> {
        if self.is_empty() {
            Ok(())
        } else {
            Err(Error::Validation(self))
        }
    }

    /// Check that `value` is not blank and at most `max_length` characters long.
    pub fn check_required_text(&mut self, field: &'static str, value: &str, max_length: usize) {
        if value.trim().is_empty() {
            self.add(field, format!("The {} field is required.", display_name(field)));
        } else {
            self.check_max_length(field, value, max_length);
        }
    }

    /// Check that `value` is at most `max_length` characters long.
    pub fn check_max_length(&mut self, field: &'static str, value: &str, max_length: usize) {
        if value.chars().count() > max_length {
            self.add(
                field,
                format!(
                    "The {} field must not be greater than {max_length} characters.",
                    display_name(field)
                ),
            );
        }
    }

    /// Parse the amount in `value`, given either as a JSON string or number.
    ///
    /// A missing or `null` value gives `None` without an error. Anything else
    /// that is not an amount adds a message for `field` and gives `None`.
    pub fn parse_amount(&mut self, field: &'static str, value: Option<&Value>) -> Option<Money> {
        let parsed = match value? {
            Value::Null => return None,
            Value::String(text) => text.parse::<Money>(),
            Value::Number(number) => number.to_string().parse::<Money>(),
            other => Err(MoneyError::Malformed(other.to_string())),
        }
        .and_then(Money::within_limit);

        match parsed {
            Ok(amount) => Some(amount),
            Err(MoneyError::Malformed(_)) => {
                self.add(
                    field,
                    format!("The {} field must be a number.", display_name(field)),
                );
                None
            }
            Err(MoneyError::OutOfRange(_)) => {
                self.add(
                    field,
                    format!(
                        "The {} field must be less than 10000000000000.",
                        display_name(field)
                    ),
                );
                None
            }
        }
    }

    /// Like [ValidationErrors::parse_amount], but a missing value is an error.
    pub fn require_amount(&mut self, field: &'static str, value: Option<&Value>) -> Option<Money> {
        match value {
            None | Some(Value::Null) => {
                self.add(field, format!("The {} field is required.", display_name(field)));
                None
            }
            value => self.parse_amount(field, value),
        }
    }

    /// Check that `amount` is zero or more.
    pub fn check_non_negative(&mut self, field: &'static str, amount: Money) {
        if amount.is_negative() {
            self.add(
                field,
                format!("The {} field must be at least 0.", display_name(field)),
            );
        }
    }

    /// Check that `amount` is strictly greater than zero.
    pub fn check_positive(&mut self, field: &'static str, amount: Money) {
        if !amount.is_positive() {
            self.add(
                field,
                format!("The {} field must be greater than 0.", display_name(field)),
            );
        }
    }
}

impl Display for ValidationErrors {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.summary())
    }
}

/// Field names are snake_case, messages read better with spaces.
fn display_name(field: &str) -> String {
    field.replace('_', " ")
}
