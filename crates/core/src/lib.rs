//! User Registry Core - User record schema and shared types.
//!
//! This crate defines the persisted shape of a user account and the
//! contract every write must satisfy, whatever store sits behind it:
//! - `store` - `UserStore` implementations (in-memory and `PostgreSQL`)
//! - `cli` - Command-line tools for migrations and user management
//!
//! # Architecture
//!
//! The core crate contains only types and pure validation - no I/O, no
//! database access. Email uniqueness is a cross-record invariant, so only
//! the error type lives here; enforcing it is the store's job.
//!
//! # Modules
//!
//! - [`types`] - Newtype wrappers for ids, emails, roles and embedded sub-records
//! - [`user`] - The `UserRecord` entity, validate-and-normalize, defaults and patches
//! - [`error`] - `ValidationError` and `UniquenessError`

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod error;
pub mod types;
pub mod user;
mod validate;

pub use error::{FieldError, FieldErrorKind, UniquenessError, ValidationError};
pub use types::*;
pub use user::{NewUser, UserRecord, apply_defaults};
