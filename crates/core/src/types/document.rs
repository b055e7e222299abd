//! Verification documents embedded in a user record.

use core::fmt;

use serde::{Deserialize, Serialize};

/// Review status of an uploaded document.
///
/// Free text: the verification workflow decides which values exist and how
/// they follow each other. The registry only guarantees that a document
/// starts out as [`DocumentStatus::PENDING`].
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct DocumentStatus(String);

impl DocumentStatus {
    /// Status of a freshly attached document.
    pub const PENDING: &'static str = "Pending";

    /// Wrap a status value as given.
    #[must_use]
    pub fn new(status: impl Into<String>) -> Self {
        Self(status.into())
    }

    /// Returns the status as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Whether the document is still awaiting review.
    #[must_use]
    pub fn is_pending(&self) -> bool {
        self.0 == Self::PENDING
    }
}

impl Default for DocumentStatus {
    fn default() -> Self {
        Self(Self::PENDING.to_owned())
    }
}

impl fmt::Display for DocumentStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// A document attached to a user for verification.
///
/// Owned by its user record: it has no identity of its own and is removed
/// together with the user.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DocumentSubRecord {
    /// Display name (e.g. "ID", "proof of address").
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    /// Where the file lives (path, URL, object key).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reference: Option<String>,
    #[serde(default)]
    pub status: DocumentStatus,
}

impl DocumentSubRecord {
    /// A pending document with the given name and reference.
    #[must_use]
    pub fn pending(name: impl Into<String>, reference: impl Into<String>) -> Self {
        Self {
            name: Some(name.into()),
            reference: Some(reference.into()),
            status: DocumentStatus::default(),
        }
    }
}
