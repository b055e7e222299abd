//! Field readers that collect every problem instead of stopping at the first.

use chrono::{DateTime, SubsecRound, Utc};
use serde_json::Value;

use crate::error::{FieldError, FieldErrorKind, ValidationError};
use crate::types::{CartId, DocumentStatus, DocumentSubRecord, ResetToken, Role};

/// `null` counts as absent everywhere in the schema.
fn present(value: Option<&Value>) -> Option<&Value> {
    value.filter(|v| !v.is_null())
}

#[derive(Debug, Default)]
pub(crate) struct FieldCheck {
    errors: Vec<FieldError>,
}

impl FieldCheck {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    pub(crate) fn fail(&mut self, path: &str, kind: FieldErrorKind) {
        self.errors.push(FieldError::new(path, kind));
    }

    fn wrong_type(&mut self, path: &str, expected: &'static str) {
        self.fail(path, FieldErrorKind::WrongType { expected });
    }

    pub(crate) fn is_clean(&self) -> bool {
        self.errors.is_empty()
    }

    pub(crate) fn into_error(self) -> ValidationError {
        ValidationError::new(self.errors)
    }

    /// Optional text: absent and `null` read as `None`.
    pub(crate) fn text(&mut self, path: &str, value: Option<&Value>) -> Option<String> {
        match present(value)? {
            Value::String(s) => Some(s.clone()),
            _ => {
                self.wrong_type(path, "a string");
                None
            }
        }
    }

    /// Required text: absent, `null` and `""` are all missing.
    pub(crate) fn required_text(&mut self, path: &str, value: Option<&Value>) -> Option<String> {
        if present(value).is_none() {
            self.fail(path, FieldErrorKind::Missing);
            return None;
        }
        let text = self.text(path, value)?;
        if text.is_empty() {
            self.fail(path, FieldErrorKind::Missing);
            return None;
        }
        Some(text)
    }

    pub(crate) fn required_integer(&mut self, path: &str, value: Option<&Value>) -> Option<i64> {
        let Some(value) = present(value) else {
            self.fail(path, FieldErrorKind::Missing);
            return None;
        };
        let int = value.as_i64();
        if int.is_none() {
            self.wrong_type(path, "an integer");
        }
        int
    }

    /// Role falls back to its default when absent. An explicit `null` is
    /// missing; anything else must match exactly.
    pub(crate) fn role(&mut self, path: &str, value: Option<&Value>) -> Role {
        let Some(value) = value else {
            return Role::default();
        };
        if value.is_null() {
            self.fail(path, FieldErrorKind::Missing);
            return Role::default();
        }
        let raw = match value {
            Value::String(s) => s.clone(),
            other => other.to_string(),
        };
        raw.parse().unwrap_or_else(|_| {
            self.fail(
                path,
                FieldErrorKind::InvalidEnum {
                    value: raw.clone(),
                    allowed: Role::ALLOWED,
                },
            );
            Role::default()
        })
    }

    pub(crate) fn cart(&mut self, path: &str, value: Option<&Value>) -> Option<CartId> {
        let raw = self.text(path, value)?;
        match raw.parse() {
            Ok(id) => Some(id),
            Err(_) => {
                self.wrong_type(path, "a cart id (UUID)");
                None
            }
        }
    }

    /// Accepts RFC 3339 strings or integer milliseconds since the Unix epoch.
    ///
    /// Timestamps are kept to microseconds, the finest precision any store holds.
    pub(crate) fn timestamp(&mut self, path: &str, value: Option<&Value>) -> Option<DateTime<Utc>> {
        let parsed = match present(value)? {
            Value::String(s) => DateTime::parse_from_rfc3339(s)
                .ok()
                .map(|t| t.with_timezone(&Utc)),
            Value::Number(n) => n.as_i64().and_then(DateTime::from_timestamp_millis),
            _ => None,
        }
        .map(|t| t.trunc_subsecs(6));
        if parsed.is_none() {
            self.wrong_type(path, "an RFC 3339 timestamp");
        }
        parsed
    }

    pub(crate) fn documents(&mut self, path: &str, value: Option<&Value>) -> Vec<DocumentSubRecord> {
        let Some(value) = present(value) else {
            return Vec::new();
        };
        let Value::Array(entries) = value else {
            self.wrong_type(path, "an array");
            return Vec::new();
        };

        let mut documents = Vec::with_capacity(entries.len());
        for (i, entry) in entries.iter().enumerate() {
            let entry_path = format!("{path}.{i}");
            let Value::Object(fields) = entry else {
                self.wrong_type(&entry_path, "an object");
                continue;
            };
            let name = self.text(&format!("{entry_path}.name"), fields.get("name"));
            let reference = self.text(&format!("{entry_path}.reference"), fields.get("reference"));
            let status = self
                .text(&format!("{entry_path}.status"), fields.get("status"))
                .map(DocumentStatus::new)
                .unwrap_or_default();
            documents.push(DocumentSubRecord {
                name,
                reference,
                status,
            });
        }
        documents
    }

    pub(crate) fn reset_token(&mut self, path: &str, value: Option<&Value>) -> Option<ResetToken> {
        match present(value)? {
            Value::Object(fields) => Some(ResetToken {
                token: self.text(&format!("{path}.token"), fields.get("token")),
                expires_at: self.timestamp(&format!("{path}.expiresAt"), fields.get("expiresAt")),
            }),
            _ => {
                self.wrong_type(path, "an object");
                None
            }
        }
    }
}
