//! Defines the user store trait.

use email_address::EmailAddress;

use crate::{
    Error,
    models::{ExpenseId, ExpenseSummary, NewUser, User, UserId},
};

/// Handles user accounts and the expense summary list embedded in each user
/// record.
///
/// The summary operations return whether a record matched rather than treating
/// a missing user or summary entry as an error: the caller decides whether
/// absence means a failed operation or a tolerated inconsistency.
pub trait UserStore {
    /// Create a new user and add it to the store.
    ///
    /// # Errors
    /// Returns [Error::DuplicateEmail] if a user with the same email already
    /// exists.
    fn create(&mut self, new_user: NewUser) -> Result<User, Error>;

    /// Get the user with the ID `user_id`.
    ///
    /// # Errors
    /// Returns [Error::UserNotFound] if no user has the ID `user_id`.
    fn get(&self, user_id: &UserId) -> Result<User, Error>;

    /// Get the user with the email address `email`.
    ///
    /// # Errors
    /// Returns [Error::UserNotFound] if no user has the email address `email`.
    fn get_by_email(&self, email: &EmailAddress) -> Result<User, Error>;

    /// Retrieve all users from the store.
    fn list(&self) -> Result<Vec<User>, Error>;

    /// Add `summary` to the summary list of the user with the ID `owner_id`.
    ///
    /// Adding a summary with an ID that is already in the list is a no-op that
    /// still counts as a match, so a retried operation cannot create a
    /// duplicate entry.
    ///
    /// Returns whether a user matched `owner_id`.
    fn append_summary(&mut self, owner_id: &UserId, summary: ExpenseSummary) -> Result<bool, Error>;

    /// Set the cost of the summary entry with the ID `expense_id` in the
    /// summary list of the user with the ID `owner_id`.
    ///
    /// Returns whether both the user and the summary entry matched.
    fn update_summary_cost(
        &mut self,
        owner_id: &UserId,
        expense_id: &ExpenseId,
        cost: f64,
    ) -> Result<bool, Error>;

    /// Remove the summary entry with the ID `expense_id` from the summary list
    /// of the user with the ID `owner_id`.
    ///
    /// Returns whether both the user and the summary entry matched.
    fn remove_summary(&mut self, owner_id: &UserId, expense_id: &ExpenseId) -> Result<bool, Error>;
}
