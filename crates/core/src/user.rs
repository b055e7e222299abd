//! The user record and its write contract.
//!
//! A write goes through three steps, in this order:
//!
//! 1. [`apply_defaults`] fills `role`, `documents[i].status`,
//!    `documents` and `last_connection` on the raw candidate document.
//! 2. [`NewUser::from_document`] validates every field and normalizes the
//!    document into typed values, reporting all offending fields at once.
//! 3. The store assigns a [`UserId`] ([`NewUser::into_record`]) and enforces
//!    email uniqueness at its own serialization point.
//!
//! Unknown keys are dropped, so a version key such as `__v` can never make
//! it into a persisted record.

use chrono::{DateTime, SecondsFormat, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::error::{FieldErrorKind, ValidationError};
use crate::types::{
    CartId, DocumentStatus, DocumentSubRecord, Email, Password, ResetToken, Role, UserId,
};
use crate::validate::FieldCheck;

/// A persisted user account.
///
/// Serializes to the stored document layout. `documents` and `reset_token`
/// are owned by value; `cart` is only an identifier.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserRecord {
    #[serde(rename = "_id")]
    pub id: UserId,
    pub username: String,
    pub first_name: String,
    pub last_name: String,
    pub email: Email,
    pub password: Password,
    pub age: i64,
    #[serde(default)]
    pub role: Role,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cart: Option<CartId>,
    #[serde(default)]
    pub documents: Vec<DocumentSubRecord>,
    #[serde(
        default,
        rename = "resetToken",
        skip_serializing_if = "Option::is_none"
    )]
    pub reset_token: Option<ResetToken>,
    pub last_connection: DateTime<Utc>,
}

/// A validated candidate that has not been given an identity yet.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewUser {
    pub username: String,
    pub first_name: String,
    pub last_name: String,
    pub email: Email,
    pub password: Password,
    pub age: i64,
    pub role: Role,
    pub cart: Option<CartId>,
    pub documents: Vec<DocumentSubRecord>,
    pub reset_token: Option<ResetToken>,
    pub last_connection: DateTime<Utc>,
}

/// Fill schema defaults into a raw candidate document.
///
/// `role` is filled only when the key is absent, so an explicit `null`
/// still fails as missing. The other defaults also replace `null`. Anything
/// else is left for validation to judge.
pub fn apply_defaults(doc: &mut Map<String, Value>, now: DateTime<Utc>) {
    if !doc.contains_key("role") {
        doc.insert("role".to_owned(), Value::from(Role::default().as_str()));
    }

    if doc.get("last_connection").is_none_or(Value::is_null) {
        doc.insert(
            "last_connection".to_owned(),
            Value::from(now.to_rfc3339_opts(SecondsFormat::AutoSi, true)),
        );
    }

    if doc.get("documents").is_none_or(Value::is_null) {
        doc.insert("documents".to_owned(), Value::Array(Vec::new()));
    } else if let Some(Value::Array(entries)) = doc.get_mut("documents") {
        for entry in entries {
            if let Value::Object(fields) = entry
                && fields.get("status").is_none_or(Value::is_null)
            {
                fields.insert("status".to_owned(), Value::from(DocumentStatus::PENDING));
            }
        }
    }
}

impl NewUser {
    /// Validate-and-normalize a candidate document.
    ///
    /// Defaults are applied first, using `now` as the creation time.
    ///
    /// # Errors
    ///
    /// Returns a [`ValidationError`] naming every field that is missing,
    /// has the wrong type, or holds a value outside its enumeration.
    pub fn from_document(candidate: &Value, now: DateTime<Utc>) -> Result<Self, ValidationError> {
        let Value::Object(fields) = candidate else {
            let mut check = FieldCheck::new();
            check.fail(
                "$",
                FieldErrorKind::WrongType {
                    expected: "an object",
                },
            );
            return Err(check.into_error());
        };

        let mut doc = fields.clone();
        apply_defaults(&mut doc, now);

        let mut check = FieldCheck::new();
        let username = check.required_text("username", doc.get("username"));
        let first_name = check.required_text("first_name", doc.get("first_name"));
        let last_name = check.required_text("last_name", doc.get("last_name"));
        let email = check
            .required_text("email", doc.get("email"))
            .and_then(|raw| Email::parse(&raw).ok());
        let password = check.required_text("password", doc.get("password"));
        let age = check.required_integer("age", doc.get("age"));
        let role = check.role("role", doc.get("role"));
        let cart = check.cart("cart", doc.get("cart"));
        let documents = check.documents("documents", doc.get("documents"));
        let reset_token = check.reset_token("resetToken", doc.get("resetToken"));
        let last_connection = check.timestamp("last_connection", doc.get("last_connection"));

        match (
            username,
            first_name,
            last_name,
            email,
            password,
            age,
            last_connection,
        ) {
            (
                Some(username),
                Some(first_name),
                Some(last_name),
                Some(email),
                Some(password),
                Some(age),
                Some(last_connection),
            ) if check.is_clean() => Ok(Self {
                username,
                first_name,
                last_name,
                email,
                password: Password::new(password),
                age,
                role,
                cart,
                documents,
                reset_token,
                last_connection,
            }),
            _ => Err(check.into_error()),
        }
    }

    /// Attach the store-assigned identity.
    #[must_use]
    pub fn into_record(self, id: UserId) -> UserRecord {
        UserRecord {
            id,
            username: self.username,
            first_name: self.first_name,
            last_name: self.last_name,
            email: self.email,
            password: self.password,
            age: self.age,
            role: self.role,
            cart: self.cart,
            documents: self.documents,
            reset_token: self.reset_token,
            last_connection: self.last_connection,
        }
    }
}

impl UserRecord {
    /// The stored document form of this record.
    ///
    /// Every field serializes to a string, number, array or string-keyed
    /// object, so conversion to a JSON object cannot fail.
    #[must_use]
    pub fn to_document(&self) -> Map<String, Value> {
        let value = serde_json::to_value(self);
        debug_assert!(
            matches!(value, Ok(Value::Object(_))),
            "user record must serialize to a JSON object: {value:?}"
        );
        match value {
            Ok(Value::Object(doc)) => doc,
            _ => Map::new(),
        }
    }

    /// Apply a partial update and re-validate the whole result.
    ///
    /// Each key in `patch` replaces the stored top-level field. A `null`
    /// value is validated like any other: `cart` and `resetToken` are
    /// cleared, `documents` becomes empty, `last_connection` falls back to
    /// `now`, and required fields (`role` included) fail as missing. `_id`
    /// is immutable and ignored.
    ///
    /// # Errors
    ///
    /// Returns a [`ValidationError`] if the patch is not an object or the
    /// patched record no longer conforms.
    pub fn patched(&self, patch: &Value, now: DateTime<Utc>) -> Result<Self, ValidationError> {
        let Value::Object(changes) = patch else {
            let mut check = FieldCheck::new();
            check.fail(
                "$",
                FieldErrorKind::WrongType {
                    expected: "an object",
                },
            );
            return Err(check.into_error());
        };

        let mut doc = self.to_document();
        for (key, value) in changes {
            if key == "_id" {
                continue;
            }
            doc.insert(key.clone(), value.clone());
        }

        Ok(NewUser::from_document(&Value::Object(doc), now)?.into_record(self.id))
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::indexing_slicing)]
mod tests {
    use chrono::TimeZone;
    use serde_json::json;

    use super::*;

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 10, 17, 12, 0, 0).unwrap()
    }

    fn candidate() -> Value {
        json!({
            "username": "jdoe",
            "first_name": "Jane",
            "last_name": "Doe",
            "email": "jane@example.com",
            "password": "$2b$10$hash",
            "age": 34
        })
    }

    fn without(key: &str) -> Value {
        let mut doc = candidate();
        doc.as_object_mut().unwrap().remove(key);
        doc
    }

    fn with(key: &str, value: Value) -> Value {
        let mut doc = candidate();
        doc[key] = value;
        doc
    }

    #[test]
    fn test_minimal_candidate_gets_defaults() {
        let user = NewUser::from_document(&candidate(), now()).unwrap();
        assert_eq!(user.role, Role::User);
        assert!(user.documents.is_empty());
        assert_eq!(user.cart, None);
        assert_eq!(user.reset_token, None);
        assert_eq!(user.last_connection, now());
        assert_eq!(user.password.expose(), "$2b$10$hash");
    }

    #[test]
    fn test_each_required_field_is_enforced() {
        for field in ["username", "first_name", "last_name", "email", "password", "age"] {
            let err = NewUser::from_document(&without(field), now()).unwrap_err();
            assert_eq!(
                err.kind_of(field),
                Some(&FieldErrorKind::Missing),
                "{field} should be required"
            );
        }
    }

    #[test]
    fn test_null_and_empty_text_count_as_missing() {
        let err = NewUser::from_document(&with("username", Value::Null), now()).unwrap_err();
        assert_eq!(err.kind_of("username"), Some(&FieldErrorKind::Missing));

        let err = NewUser::from_document(&with("email", json!("")), now()).unwrap_err();
        assert_eq!(err.kind_of("email"), Some(&FieldErrorKind::Missing));
    }

    #[test]
    fn test_all_offending_fields_are_reported() {
        let mut doc = without("username");
        doc["age"] = json!("thirty");
        doc["role"] = json!("admin");
        let err = NewUser::from_document(&doc, now()).unwrap_err();
        assert_eq!(err.fields().len(), 3);
        assert!(err.names("username"));
        assert!(err.names("age"));
        assert!(err.names("role"));
    }

    #[test]
    fn test_wrong_types() {
        let err = NewUser::from_document(&with("age", json!(30.5)), now()).unwrap_err();
        assert!(matches!(
            err.kind_of("age"),
            Some(FieldErrorKind::WrongType { .. })
        ));

        let err = NewUser::from_document(&with("first_name", json!(7)), now()).unwrap_err();
        assert!(matches!(
            err.kind_of("first_name"),
            Some(FieldErrorKind::WrongType { .. })
        ));

        let err = NewUser::from_document(&with("cart", json!("cart-1")), now()).unwrap_err();
        assert!(err.names("cart"));

        let err = NewUser::from_document(&with("documents", json!({})), now()).unwrap_err();
        assert!(err.names("documents"));
    }

    #[test]
    fn test_role_enumeration() {
        let user = NewUser::from_document(&with("role", json!("premium")), now()).unwrap();
        assert_eq!(user.role, Role::Premium);

        for bad in [json!("admin"), json!("Premium"), json!(""), json!(1)] {
            let err = NewUser::from_document(&with("role", bad), now()).unwrap_err();
            assert!(matches!(
                err.kind_of("role"),
                Some(FieldErrorKind::InvalidEnum { .. })
            ));
        }
    }

    #[test]
    fn test_explicit_null_role_is_missing() {
        let err = NewUser::from_document(&with("role", Value::Null), now()).unwrap_err();
        assert_eq!(err.kind_of("role"), Some(&FieldErrorKind::Missing));
        assert_eq!(err.fields().len(), 1);

        let user = NewUser::from_document(&without("role"), now()).unwrap();
        assert_eq!(user.role, Role::User);
    }

    #[test]
    fn test_document_status_defaults_to_pending() {
        let doc = with(
            "documents",
            json!([
                { "name": "ID", "reference": "r1" },
                { "name": "proof", "reference": "r2", "status": "Approved" },
                { "status": null }
            ]),
        );
        let user = NewUser::from_document(&doc, now()).unwrap();
        assert_eq!(user.documents.len(), 3);
        assert_eq!(user.documents[0], DocumentSubRecord::pending("ID", "r1"));
        assert_eq!(user.documents[1].status.as_str(), "Approved");
        assert!(user.documents[2].status.is_pending());
        assert_eq!(user.documents[2].name, None);
    }

    #[test]
    fn test_document_entries_are_checked_by_path() {
        let doc = with("documents", json!([{ "name": 5 }, "loose"]));
        let err = NewUser::from_document(&doc, now()).unwrap_err();
        assert!(err.names("documents.0.name"));
        assert!(err.names("documents.1"));
    }

    #[test]
    fn test_reset_token() {
        let doc = with(
            "resetToken",
            json!({ "token": "t0k3n", "expiresAt": "2026-10-17T13:00:00Z" }),
        );
        let user = NewUser::from_document(&doc, now()).unwrap();
        let token = user.reset_token.unwrap();
        assert_eq!(token.token.as_deref(), Some("t0k3n"));
        assert_eq!(
            token.expires_at,
            Some(Utc.with_ymd_and_hms(2026, 10, 17, 13, 0, 0).unwrap())
        );

        let doc = with("resetToken", json!({ "expiresAt": "tomorrow" }));
        let err = NewUser::from_document(&doc, now()).unwrap_err();
        assert!(err.names("resetToken.expiresAt"));
    }

    #[test]
    fn test_explicit_last_connection_is_preserved() {
        let doc = with("last_connection", json!("2020-02-29T08:15:30.123456Z"));
        let user = NewUser::from_document(&doc, now()).unwrap();
        assert_eq!(
            user.last_connection,
            DateTime::parse_from_rfc3339("2020-02-29T08:15:30.123456Z").unwrap()
        );
    }

    #[test]
    fn test_timestamps_are_kept_to_microseconds() {
        let mut doc = with("last_connection", json!("2021-06-01T10:20:30.123456789Z"));
        doc["resetToken"] = json!({ "expiresAt": "2021-06-02T00:00:00.999999999Z" });
        let user = NewUser::from_document(&doc, now()).unwrap();
        assert_eq!(
            user.last_connection,
            DateTime::parse_from_rfc3339("2021-06-01T10:20:30.123456Z").unwrap()
        );
        assert_eq!(
            user.reset_token.unwrap().expires_at.unwrap(),
            DateTime::parse_from_rfc3339("2021-06-02T00:00:00.999999Z").unwrap()
        );
    }

    #[test]
    fn test_last_connection_accepts_epoch_millis() {
        let doc = with("last_connection", json!(1_700_000_000_000_i64));
        let user = NewUser::from_document(&doc, now()).unwrap();
        assert_eq!(user.last_connection.timestamp(), 1_700_000_000);
    }

    #[test]
    fn test_non_object_candidate() {
        let err = NewUser::from_document(&json!(["nope"]), now()).unwrap_err();
        assert!(err.names("$"));
    }

    #[test]
    fn test_unknown_keys_and_version_key_are_dropped() {
        let mut doc = candidate();
        doc["__v"] = json!(3);
        doc["is_admin"] = json!(true);
        let record = NewUser::from_document(&doc, now())
            .unwrap()
            .into_record(UserId::generate());
        let stored = record.to_document();
        assert!(!stored.contains_key("__v"));
        assert!(!stored.contains_key("is_admin"));
    }

    #[test]
    fn test_persisted_layout() {
        let record = NewUser::from_document(
            &with("cart", json!("67e55044-10b1-426f-9247-bb680e5fe0c8")),
            now(),
        )
        .unwrap()
        .into_record(UserId::generate());
        let stored = record.to_document();
        let mut keys: Vec<_> = stored.keys().map(String::as_str).collect();
        keys.sort_unstable();
        assert_eq!(
            keys,
            [
                "_id",
                "age",
                "cart",
                "documents",
                "email",
                "first_name",
                "last_connection",
                "last_name",
                "password",
                "role",
                "username"
            ]
        );
        assert_eq!(stored["role"], "user");
        assert_eq!(stored["documents"], json!([]));
    }

    #[test]
    fn test_apply_defaults_leaves_present_values() {
        let mut doc = Map::new();
        doc.insert("role".to_owned(), json!("premium"));
        doc.insert("documents".to_owned(), json!([{ "status": "Rejected" }, {}]));
        apply_defaults(&mut doc, now());
        assert_eq!(doc["role"], "premium");
        assert_eq!(doc["documents"][0]["status"], "Rejected");
        assert_eq!(doc["documents"][1]["status"], "Pending");
        assert_eq!(doc["last_connection"], "2026-10-17T12:00:00Z");
    }

    #[test]
    fn test_patch_replaces_fields_and_keeps_identity() {
        let record = NewUser::from_document(&candidate(), now())
            .unwrap()
            .into_record(UserId::generate());
        let later = now() + chrono::Duration::hours(1);
        let patched = record
            .patched(
                &json!({
                    "_id": "67e55044-10b1-426f-9247-bb680e5fe0c8",
                    "role": "premium",
                    "documents": [{ "name": "ID", "reference": "r1" }],
                    "last_connection": later.to_rfc3339()
                }),
                later,
            )
            .unwrap();
        assert_eq!(patched.id, record.id);
        assert_eq!(patched.role, Role::Premium);
        assert!(patched.documents[0].status.is_pending());
        assert_eq!(patched.last_connection, later);
        assert_eq!(patched.email, record.email);
    }

    #[test]
    fn test_patch_null_semantics() {
        let record = NewUser::from_document(
            &json!({
                "username": "jdoe",
                "first_name": "Jane",
                "last_name": "Doe",
                "email": "jane@example.com",
                "password": "pw",
                "age": 34,
                "role": "premium",
                "cart": "67e55044-10b1-426f-9247-bb680e5fe0c8",
                "resetToken": { "token": "abc" }
            }),
            now(),
        )
        .unwrap()
        .into_record(UserId::generate());

        let later = now() + chrono::Duration::minutes(5);
        let cleared = record
            .patched(
                &json!({ "cart": null, "resetToken": null, "last_connection": null }),
                later,
            )
            .unwrap();
        assert_eq!(cleared.cart, None);
        assert_eq!(cleared.reset_token, None);
        assert_eq!(cleared.last_connection, later);
        assert_eq!(cleared.role, Role::Premium);

        let err = record.patched(&json!({ "email": null }), now()).unwrap_err();
        assert_eq!(err.kind_of("email"), Some(&FieldErrorKind::Missing));

        let err = record.patched(&json!({ "role": null }), now()).unwrap_err();
        assert_eq!(err.kind_of("role"), Some(&FieldErrorKind::Missing));
    }

    #[test]
    fn test_patch_rejects_bad_values() {
        let record = NewUser::from_document(&candidate(), now())
            .unwrap()
            .into_record(UserId::generate());
        let err = record.patched(&json!({ "role": "owner" }), now()).unwrap_err();
        assert!(err.names("role"));
        assert!(record.patched(&json!("role=premium"), now()).is_err());
    }

    #[test]
    fn test_record_round_trips_through_storage_form() {
        let record = NewUser::from_document(
            &with("documents", json!([{ "name": "ID", "reference": "r1" }])),
            now(),
        )
        .unwrap()
        .into_record(UserId::generate());
        let restored: UserRecord =
            serde_json::from_value(Value::Object(record.to_document())).unwrap();
        assert_eq!(restored, record);
    }

    #[test]
    fn test_document_form_carries_every_field() {
        let record = NewUser::from_document(
            &with("resetToken", json!({ "token": "t" })),
            now(),
        )
        .unwrap()
        .into_record(UserId::generate());
        let stored = record.to_document();
        assert_eq!(stored["_id"], record.id.to_string());
        assert_eq!(stored["username"], "jdoe");
        assert_eq!(stored["resetToken"]["token"], "t");
        assert_eq!(stored.len(), 11);
    }

    #[test]
    fn test_debug_hides_password() {
        let user = NewUser::from_document(&candidate(), now()).unwrap();
        assert!(!format!("{user:?}").contains("$2b$10$hash"));
    }
}
