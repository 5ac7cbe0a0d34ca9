//! This file defines the expense types: the canonical [Expense] record and the
//! [ExpenseSummary] that is embedded in the owner's user record.

use std::fmt::Display;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{Error, models::UserId};

/// The unique ID of an expense.
///
/// IDs are opaque strings minted by the application, not by the database.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize, Hash)]
pub struct ExpenseId(String);

impl ExpenseId {
    /// Mint a new, unique expense ID.
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

impl Display for ExpenseId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// The display name of an expense.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize, Hash)]
pub struct ExpenseName(String);

impl ExpenseName {
    /// Create an expense name, trimming surrounding whitespace.
    ///
    /// # Errors
    ///
    /// This function will return [Error::EmptyExpenseName] if `name` is empty or
    /// contains only whitespace.
    pub fn new(name: &str) -> Result<Self, Error> {
        let name = name.trim();

        if name.is_empty() {
            Err(Error::EmptyExpenseName)
        } else {
            Ok(Self(name.to_string()))
        }
    }

    /// Create an expense name without validation.
    ///
    /// The caller should ensure that the string is not empty.
    ///
    /// This function has `_unchecked` in the name but is not `unsafe`, because
    /// if the non-empty invariant is violated it will cause incorrect behaviour
    /// but not affect memory safety.
    pub fn new_unchecked(name: &str) -> Self {
        Self(name.to_string())
    }
}

impl AsRef<str> for ExpenseName {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl Display for ExpenseName {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Check that a cost is a non-negative amount of money and round it to whole cents.
///
/// # Errors
///
/// This function will return [Error::InvalidCost] if `cost` is negative, NaN or infinite.
pub fn validate_cost(cost: f64) -> Result<f64, Error> {
    // Checking the scaled value also rejects costs so large that scaling to
    // cents overflows to infinity. A non-finite cost must never be stored: it
    // serializes as a JSON null that no summary list can be read back from.
    let cents = cost * 100.0;

    if !cents.is_finite() || cost < 0.0 {
        return Err(Error::InvalidCost(cost));
    }

    Ok(cents.round() / 100.0)
}

/// An expense owned by a user.
///
/// This is the canonical record: whether an expense exists, and what its real
/// cost is, is always decided by this record and never by the copy embedded in
/// the owner's user record.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Expense {
    /// The unique ID of the expense.
    pub id: ExpenseId,
    /// The ID of the user that owns the expense.
    pub owner_id: UserId,
    /// The display name of the expense.
    pub name: ExpenseName,
    /// The cost of the expense, rounded to whole cents.
    pub cost: f64,
}

/// The copy of an expense embedded in the owner's user record.
///
/// Summaries are denormalized for read performance and may briefly disagree
/// with the canonical [Expense] after a partial write. They are reconciled by
/// the next successful operation on the same expense.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ExpenseSummary {
    /// The ID of the canonical expense this entry mirrors.
    pub id: ExpenseId,
    /// The display name of the expense.
    pub name: ExpenseName,
    /// The cost of the expense.
    pub cost: f64,
}

impl From<&Expense> for ExpenseSummary {
    fn from(expense: &Expense) -> Self {
        Self {
            id: expense.id.clone(),
            name: expense.name.clone(),
            cost: expense.cost,
        }
    }
}


#[cfg(test)]
mod validate_cost_tests {
    use crate::{Error, models::validate_cost};

    #[test]
    fn accepts_zero() {
        assert_eq!(validate_cost(0.0), Ok(0.0));
    }

    #[test]
    fn rounds_to_whole_cents() {
        assert_eq!(validate_cost(3.14159), Ok(3.14));
    }

    #[test]
    fn rejects_negative_cost() {
        assert_eq!(validate_cost(-1.5), Err(Error::InvalidCost(-1.5)));
    }

    #[test]
    fn rejects_non_finite_cost() {
        assert!(validate_cost(f64::NAN).is_err());
        assert!(validate_cost(f64::INFINITY).is_err());
    }

    #[test]
    fn rejects_cost_that_overflows_when_scaled_to_cents() {
        assert_eq!(validate_cost(1e307), Err(Error::InvalidCost(1e307)));
    }
}
