//! Errors raised when a write breaks the user record contract.

use core::fmt;

use thiserror::Error;

use crate::types::Email;

/// What is wrong with a single field.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FieldErrorKind {
    /// A required field is absent, `null` or empty.
    Missing,
    /// The value has the wrong JSON type or cannot be read as the field's type.
    WrongType {
        /// Human-readable name of the expected type.
        expected: &'static str,
    },
    /// The value is not one of the enumerated choices.
    InvalidEnum {
        /// The rejected value.
        value: String,
        /// The accepted values.
        allowed: &'static [&'static str],
    },
}

impl fmt::Display for FieldErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Missing => f.write_str("is required"),
            Self::WrongType { expected } => write!(f, "must be {expected}"),
            Self::InvalidEnum { value, allowed } => {
                write!(f, "`{value}` is not one of: {}", allowed.join(", "))
            }
        }
    }
}

/// A single offending field, addressed by dotted path (`documents.0.status`).
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("`{field}` {kind}")]
pub struct FieldError {
    pub field: String,
    pub kind: FieldErrorKind,
}

impl FieldError {
    #[must_use]
    pub fn new(field: impl Into<String>, kind: FieldErrorKind) -> Self {
        Self {
            field: field.into(),
            kind,
        }
    }
}

/// A candidate record does not conform to the schema.
///
/// Carries every offending field found, not just the first one.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("invalid user record: {}", describe(.fields))]
pub struct ValidationError {
    fields: Vec<FieldError>,
}

impl ValidationError {
    /// Build an error from a non-empty list of field errors.
    #[must_use]
    pub const fn new(fields: Vec<FieldError>) -> Self {
        Self { fields }
    }

    /// The offending fields, in the order they were checked.
    #[must_use]
    pub fn fields(&self) -> &[FieldError] {
        &self.fields
    }

    /// Whether `field` (a dotted path) is among the offending fields.
    #[must_use]
    pub fn names(&self, field: &str) -> bool {
        self.fields.iter().any(|e| e.field == field)
    }

    /// The error recorded for `field`, if any.
    #[must_use]
    pub fn kind_of(&self, field: &str) -> Option<&FieldErrorKind> {
        self.fields
            .iter()
            .find(|e| e.field == field)
            .map(|e| &e.kind)
    }
}

fn describe(fields: &[FieldError]) -> String {
    fields
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join("; ")
}

/// Another user record already holds this email.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("a user with email `{email}` already exists")]
pub struct UniquenessError {
    pub email: Email,
}
