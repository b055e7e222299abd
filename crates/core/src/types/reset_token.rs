//! Password-reset token embedded in a user record.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A pending password reset.
///
/// The registry only stores it. Issuing, checking and invalidating tokens
/// (including expiry) belongs to the password-reset flow.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResetToken {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub token: Option<String>,
    #[serde(
        default,
        rename = "expiresAt",
        skip_serializing_if = "Option::is_none"
    )]
    pub expires_at: Option<DateTime<Utc>>,
}
