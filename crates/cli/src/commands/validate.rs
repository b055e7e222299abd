//! Offline validation of a candidate user document.
//!
//! # Usage
//!
//! ```bash
//! user-registry validate candidate.json
//! ```
//!
//! Prints the normalized record (defaults applied, unknown keys dropped) or
//! logs every offending field. Needs no database.

use std::path::Path;

use chrono::Utc;
use serde_json::{Map, Value};

use user_registry_core::{NewUser, UserId};

use crate::error::CliError;

/// Validate the JSON document in `path` and print its normalized form.
///
/// # Errors
///
/// Returns `CliError::Validation` if the document breaks the schema.
pub fn run(path: &Path) -> Result<(), CliError> {
    let raw = std::fs::read_to_string(path).map_err(|source| CliError::Read {
        path: path.display().to_string(),
        source,
    })?;
    let candidate: Value = serde_json::from_str(&raw)?;

    let doc = normalize(&candidate)?;
    tracing::info!("{} is a valid user record", path.display());
    super::print_document(doc)
}

/// The document that would be stored, minus the identity a store assigns.
fn normalize(candidate: &Value) -> Result<Map<String, Value>, CliError> {
    let new_user = NewUser::from_document(candidate, Utc::now()).inspect_err(|err| {
        for field in err.fields() {
            tracing::error!(field = %field.field, "{}", field.kind);
        }
    })?;

    let mut doc = new_user.into_record(UserId::generate()).to_document();
    doc.remove("_id");
    Ok(doc)
}
