//! This file defines the [User] type and the types needed to create a user.

use std::fmt::Display;

use email_address::EmailAddress;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::models::{ExpenseSummary, PasswordHash};

/// The unique ID of a user.
///
/// IDs are opaque strings minted by the application, not by the database.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize, Hash)]
pub struct UserId(String);

impl UserId {
    /// Mint a new, unique user ID.
    pub fn new_random() -> Self {
        Self(Uuid::new_v4().to_string())
    }

    /// Wrap an existing ID string, e.g. one taken from a request path.
    pub fn new(id: &str) -> Self {
        Self(id.to_string())
    }

    /// The ID as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Display for UserId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A registered user and the summary list of the expenses they own.
///
/// The password hash is never serialized, so user records can be returned from
/// API routes directly.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct User {
    /// The unique ID of the user.
    pub id: UserId,
    /// The display name of the user.
    pub name: String,
    /// The user's email address. Unique across all users.
    pub email: EmailAddress,
    /// The hash of the user's password.
    #[serde(skip_serializing)]
    pub password_hash: PasswordHash,
    /// The user's yearly income, if they chose to provide it.
    pub yearly_income: Option<f64>,
    /// Denormalized copies of the expenses this user owns.
    pub expense_summaries: Vec<ExpenseSummary>,
}

/// The data needed to register a new user.
#[derive(Debug)]
pub struct NewUser {
    /// The display name of the user.
    pub name: String,
    /// The user's email address.
    pub email: EmailAddress,
    /// The hash of the user's password.
    pub password_hash: PasswordHash,
    /// The user's yearly income, if they chose to provide it.
    pub yearly_income: Option<f64>,
}
