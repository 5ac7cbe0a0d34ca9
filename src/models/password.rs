//! This file defines the types for handling passwords: [ValidatedPassword] for
//! raw passwords that have passed validation, and [PasswordHash] for storage.

use std::fmt::Display;

use bcrypt::BcryptError;

use crate::Error;

/// The minimum number of characters a password must have.
const MIN_PASSWORD_LENGTH: usize = 8;

/// A raw password that has passed the validation checks.
///
/// This type does not prevent the raw password from being logged or displayed,
/// it only guarantees that the password met the minimum requirements at the
/// time it was checked.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ValidatedPassword(String);

impl ValidatedPassword {
    /// Validate a raw password.
    ///
    /// # Errors
    ///
    /// This function will return [Error::TooWeak] if the password has fewer
    /// than eight characters.
    pub fn new(raw_password: &str) -> Result<Self, Error> {
        if raw_password.chars().count() < MIN_PASSWORD_LENGTH {
            return Err(Error::TooWeak(format!(
                "passwords must have at least {MIN_PASSWORD_LENGTH} characters"
            )));
        }

        Ok(Self(raw_password.to_string()))
    }

    /// Create a validated password without performing the validation checks.
    ///
    /// This function has `_unchecked` in the name but is not `unsafe`, because
    /// if the invariant is violated it will cause incorrect behaviour but not
    /// affect memory safety.
    pub fn new_unchecked(raw_password: &str) -> Self {
        Self(raw_password.to_string())
    }
}

/// The hash of a user's password, suitable for storage.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PasswordHash(String);

impl PasswordHash {
    /// The default cost for hashing passwords.
    ///
    /// Tests should prefer a lower cost since hashing at this cost is slow by
    /// design.
    pub const DEFAULT_COST: u32 = bcrypt::DEFAULT_COST;

    /// Hash a validated password.
    ///
    /// # Errors
    ///
    /// This function will return [Error::HashingError] if there is an error
    /// hashing the password.
    pub fn new(password: ValidatedPassword, cost: u32) -> Result<Self, Error> {
        bcrypt::hash(&password.0, cost)
            .map(Self)
            .map_err(|error| Error::HashingError(error.to_string()))
    }

    /// Validate and hash a raw password in one step.
    ///
    /// # Errors
    ///
    /// This function will return:
    /// - [Error::TooWeak] if the password does not meet the minimum requirements,
    /// - or [Error::HashingError] if there is an error hashing the password.
    pub fn from_raw_password(raw_password: &str, cost: u32) -> Result<Self, Error> {
        let password = ValidatedPassword::new(raw_password)?;

        Self::new(password, cost)
    }

    /// Wrap a string that is already a bcrypt hash, e.g. one read from the database.
    ///
    /// This function has `_unchecked` in the name but is not `unsafe`, because
    /// if the invariant is violated it will cause incorrect behaviour but not
    /// affect memory safety.
    pub fn new_unchecked(hash: &str) -> Self {
        Self(hash.to_string())
    }

    /// Check whether `raw_password` matches this hash.
    pub fn verify(&self, raw_password: &str) -> Result<bool, BcryptError> {
        bcrypt::verify(raw_password, &self.0)
    }
}

impl Display for PasswordHash {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[cfg(test)]
mod validated_password_tests {
    use crate::{Error, models::ValidatedPassword};

    #[test]
    fn new_fails_on_short_password() {
        let result = ValidatedPassword::new("hunter2");

        assert!(matches!(result, Err(Error::TooWeak(_))));
    }

    #[test]
    fn new_succeeds_on_long_enough_password() {
        let result = ValidatedPassword::new("correcthorsebatterystaple");

        assert!(result.is_ok());
    }
}
