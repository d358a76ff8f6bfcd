//! This file defines types that handle password validation and hashing.
//! `ValidatedPassword` wraps a string and ensures it follows the password rules.
//! `PasswordHash` converts a `ValidatedPassword` into a salted and hashed password.

use std::fmt::Display;

use bcrypt::{hash, verify};
use serde::{Deserialize, Serialize};

use crate::{Error, FieldError, validation::has_length_between};

/// The characters, other than letters and digits, that a password may contain.
pub const PASSWORD_SPECIAL_CHARACTERS: &str = "@$!%*?&";

const PASSWORD_MIN_LENGTH: usize = 10;
const PASSWORD_MAX_LENGTH: usize = 20;

/// A password that has been validated, but not yet hashed.
///
/// This struct can be used to construct a [PasswordHash].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ValidatedPassword(String);

impl ValidatedPassword {
    /// Create and validate a new password from a string.
    ///
    /// A valid password is 10 to 20 characters long, contains at least one
    /// lowercase letter, one uppercase letter, one digit and one of the
    /// characters in [PASSWORD_SPECIAL_CHARACTERS], and contains no other
    /// characters.
    ///
    /// # Errors
    ///
    /// This function will return an error for each rule the password breaks.
    pub fn new(raw_password_string: &str) -> Result<Self, Vec<FieldError>> {
        let mut errors = Vec::new();

        if !has_length_between(
            raw_password_string,
            PASSWORD_MIN_LENGTH,
            PASSWORD_MAX_LENGTH,
        ) {
            errors.push(FieldError::new(
                "password",
                "password must be between 10 and 20 characters long",
            ));
        }

        if !has_required_character_classes(raw_password_string) {
            errors.push(FieldError::new(
                "password",
                "password must contain an uppercase letter, a lowercase letter, a digit and a \
                special character (@$!%*?&), and no other characters",
            ));
        }

        if errors.is_empty() {
            Ok(Self(raw_password_string.to_string()))
        } else {
            Err(errors)
        }
    }

    /// Create a new `ValidatedPassword` without any validation.
    ///
    /// The caller should ensure that `raw_password_string` is a valid and secure password.
    ///
    /// This function has `_unchecked` in the name but is not `unsafe`, because if an invalid password is provided it may cause incorrect behaviour but will not affect memory safety.
    pub fn new_unchecked(raw_password_string: &str) -> Self {
        Self(raw_password_string.to_string())
    }
}

fn is_special_character(c: char) -> bool {
    PASSWORD_SPECIAL_CHARACTERS.contains(c)
}

fn has_required_character_classes(password: &str) -> bool {
    let only_allowed_characters = password
        .chars()
        .all(|c| c.is_ascii_alphanumeric() || is_special_character(c));

    only_allowed_characters
        && password.chars().any(|c| c.is_ascii_lowercase())
        && password.chars().any(|c| c.is_ascii_uppercase())
        && password.chars().any(|c| c.is_ascii_digit())
        && password.chars().any(is_special_character)
}

impl Display for ValidatedPassword {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", str::repeat("*", 8))
    }
}

/// A salted and hashed password.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PasswordHash(String);

impl PasswordHash {
    /// An alias for the default encryption cost for hashing passwords.
    pub const DEFAULT_COST: u32 = bcrypt::DEFAULT_COST;

    /// Create a hashed password from a validated password with the specified `cost`.
    ///
    /// `cost` increases the rounds of hashing and therefore the time needed to verify a password.
    /// A value of at least 12 is recommended. Pass in [PasswordHash::DEFAULT_COST] to use the recommended cost.
    ///
    /// A new salt is generated on every call, so hashing the same password
    /// twice gives two different hashes.
    ///
    /// # Errors
    ///
    /// This function will return an error if `cost` is outside the range
    /// bcrypt supports (4 to 31) or if the password could not be hashed.
    pub fn new(password: ValidatedPassword, cost: u32) -> Result<Self, Error> {
        match hash(&password.0, cost) {
            Ok(password_hash) => Ok(Self(password_hash)),
            Err(e) => Err(Error::HashingError(e.to_string())),
        }
    }

    /// Create a new `PasswordHash` without any validation.
    ///
    /// The caller should ensure that `raw_password_hash` is a valid password hash.
    ///
    /// This function has `_unchecked` in the name but is not `unsafe`, because if an invalid hash is provided it will cause incorrect behaviour but not affect memory safety.
    pub fn new_unchecked(raw_password_hash: &str) -> Self {
        Self(raw_password_hash.to_string())
    }

    /// Check that `raw_password` matches the stored password.
    ///
    /// A wrong password gives `Ok(false)`.
    ///
    /// # Errors
    ///
    /// Returns [Error::HashingError] if the stored hash is malformed.
    pub fn verify(&self, raw_password: &str) -> Result<bool, Error> {
        verify(raw_password, &self.0).map_err(|error| Error::HashingError(error.to_string()))
    }
}

impl AsRef<str> for PasswordHash {
    fn as_ref(&self) -> &str {
        &self.0
    }
}
