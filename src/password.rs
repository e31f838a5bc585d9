// ABOUTME: Password composition policy and bcrypt hashing helpers
// ABOUTME: Ordered rule checks returning the first violation only
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 EduStack

//! # Password Policy
//!
//! Pure composition validator for credentials. Rule order is part of the
//! contract: length, then uppercase, lowercase, digit, symbol. Callers and
//! UI tests depend on which violation is reported first.

use crate::constants::password_policy::{MAX_LENGTH, MIN_LENGTH};
use crate::errors::{AppError, AppResult};
use thiserror::Error;

/// First violated composition rule, in declaration order
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum PasswordPolicyError {
    #[error("Password must be between 8 and 100 characters")]
    Length,
    #[error("Password must contain at least one uppercase letter")]
    MissingUppercase,
    #[error("Password must contain at least one lowercase letter")]
    MissingLowercase,
    #[error("Password must contain at least one number")]
    MissingDigit,
    #[error("Password must contain at least one special character")]
    MissingSymbol,
}

/// Validate a password against the composition policy
///
/// Returns the *first* violated rule only, not an aggregate.
///
/// # Errors
///
/// Returns the first [`PasswordPolicyError`] in rule order.
pub fn validate(password: &str) -> Result<(), PasswordPolicyError> {
    let length = password.chars().count();
    if !(MIN_LENGTH..=MAX_LENGTH).contains(&length) {
        return Err(PasswordPolicyError::Length);
    }
    if !password.chars().any(|c| c.is_ascii_uppercase()) {
        return Err(PasswordPolicyError::MissingUppercase);
    }
    if !password.chars().any(|c| c.is_ascii_lowercase()) {
        return Err(PasswordPolicyError::MissingLowercase);
    }
    if !password.chars().any(|c| c.is_ascii_digit()) {
        return Err(PasswordPolicyError::MissingDigit);
    }
    if !password.chars().any(|c| !c.is_alphanumeric()) {
        return Err(PasswordPolicyError::MissingSymbol);
    }
    Ok(())
}

/// Hash a policy-valid password for storage
///
/// # Errors
///
/// Returns `InvalidInput` when the password fails the composition policy,
/// or an internal error if bcrypt fails.
pub fn hash_password(password: &str) -> AppResult<String> {
    validate(password).map_err(|e| AppError::invalid_input(e.to_string()))?;
    bcrypt::hash(password, bcrypt::DEFAULT_COST)
        .map_err(|e| AppError::internal(format!("Password hashing failed: {e}")))
}

/// Verify a password against a stored bcrypt hash
///
/// Runs on the blocking pool so bcrypt's work factor does not stall the
/// async executor.
///
/// # Errors
///
/// Returns an internal error if the blocking task or bcrypt itself fails;
/// a wrong password is `Ok(false)`, not an error.
pub async fn verify_password(password: &str, password_hash: &str) -> AppResult<bool> {
    let password = password.to_owned();
    let password_hash = password_hash.to_owned();
    tokio::task::spawn_blocking(move || bcrypt::verify(&password, &password_hash))
        .await
        .map_err(|e| AppError::internal(format!("Password verification task failed: {e}")))?
        .map_err(|e| AppError::internal(format!("Password verification error: {e}")))
}
