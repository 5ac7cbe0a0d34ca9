//! Defines the expense store trait.

use crate::{
    Error,
    models::{Expense, ExpenseId},
};

/// Handles the canonical expense records.
///
/// Each operation must be atomic on its own record, but implementations are
/// not expected to provide atomicity across calls. The coordination between
/// this store and the summary list in the owner's user record is handled by
/// [ExpenseEngine](crate::ExpenseEngine).
pub trait ExpenseStore {
    /// Insert a new canonical expense record into the store.
    fn create(&mut self, expense: &Expense) -> Result<(), Error>;

    /// Retrieve an expense from the store.
    ///
    /// # Errors
    /// Returns [Error::ExpenseNotFound] if no expense has the ID `expense_id`.
    fn get(&self, expense_id: &ExpenseId) -> Result<Expense, Error>;

    /// Retrieve all expenses from the store.
    fn list(&self) -> Result<Vec<Expense>, Error>;

    /// Set the cost of the expense with the ID `expense_id`.
    ///
    /// Returns the updated record, or `None` if no expense matched. A missing
    /// record is a normal outcome here, not an error, so that callers can
    /// decide what absence means for them.
    fn update_cost(&mut self, expense_id: &ExpenseId, cost: f64) -> Result<Option<Expense>, Error>;

    /// Delete the expense with the ID `expense_id`.
    ///
    /// Returns the record as it was before deletion, or `None` if no expense
    /// matched.
    fn delete(&mut self, expense_id: &ExpenseId) -> Result<Option<Expense>, Error>;
}
