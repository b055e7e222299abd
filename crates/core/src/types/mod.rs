//! Core types for the user registry.
//!
//! This module provides type-safe wrappers for the values a user record holds.

pub mod document;
pub mod email;
pub mod id;
pub mod password;
pub mod reset_token;
pub mod role;

pub use document::{DocumentStatus, DocumentSubRecord};
pub use email::{Email, EmailError};
pub use id::*;
pub use password::Password;
pub use reset_token::ResetToken;
pub use role::{InvalidRole, Role};
