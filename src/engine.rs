//! The write path for expenses.
//!
//! Every expense mutation touches two records: the canonical record in the
//! expense store and the summary entry embedded in the owner's user record.
//! There is no transaction spanning the two stores, so this module owns the
//! write ordering, the compensation step, and the rules for tolerating a
//! missing counterpart. All expense mutations must go through
//! [ExpenseEngine]; reads may use the stores directly.

use crate::{
    Error,
    models::{Expense, ExpenseId, ExpenseName, ExpenseSummary, UserId, validate_cost},
    stores::{ExpenseStore, UserStore},
};

/// Coordinates the paired writes that keep each user's expense summary list
/// consistent with the canonical expense records.
///
/// The canonical record is always written first. Between the two writes of an
/// operation the stores may briefly disagree, but only ever in the direction
/// of a canonical record without a summary entry, never a summary entry
/// without a canonical record.
#[derive(Debug, Clone)]
pub struct ExpenseEngine<E, U> {
    expense_store: E,
    user_store: U,
}

impl<E, U> ExpenseEngine<E, U>
where
    E: ExpenseStore,
    U: UserStore,
{
    /// Create an engine over the given backing stores.
    pub fn new(expense_store: E, user_store: U) -> Self {
        Self {
            expense_store,
            user_store,
        }
    }

    /// Create an expense owned by the user `owner_id` and mirror it into the
    /// owner's summary list.
    ///
    /// The expense name is trimmed and the cost rounded to whole cents before
    /// anything is written. If the owner turns out not to exist, the canonical
    /// record written in the first step is deleted again so that no orphan is
    /// left behind. When that cleanup itself fails, the orphaned record is
    /// logged for out-of-band repair and the operation still reports
    /// [Error::OwnerNotFound].
    ///
    /// # Errors
    /// This function will return a:
    /// - [Error::EmptyExpenseName] if `name` is empty or whitespace,
    /// - [Error::InvalidCost] if `cost` is negative, NaN or infinite,
    /// - [Error::OwnerNotFound] if `owner_id` does not refer to a valid user,
    /// - or any error from the underlying stores.
    pub fn add_expense(
        &mut self,
        owner_id: &UserId,
        name: &str,
        cost: f64,
    ) -> Result<Expense, Error> {
        let name = ExpenseName::new(name)?;
        let cost = validate_cost(cost)?;

        let expense = Expense {
            id: ExpenseId::new_random(),
            owner_id: owner_id.clone(),
            name,
            cost,
        };

        self.expense_store.create(&expense)?;

        let matched = self
            .user_store
            .append_summary(owner_id, ExpenseSummary::from(&expense))?;

        if matched {
            return Ok(expense);
        }

        if let Err(error) = self.expense_store.delete(&expense.id) {
            tracing::warn!(
                expense_id = %expense.id,
                owner_id = %owner_id,
                %error,
                "could not remove the canonical record for an expense whose owner does not \
                 exist, the record is orphaned until it is cleaned up out-of-band",
            );
        }

        Err(Error::OwnerNotFound)
    }

    /// Set a new cost on the expense `expense_id` and on the matching summary
    /// entry in its owner's summary list.
    ///
    /// The canonical record decides the outcome: once it is updated the
    /// operation counts as applied, and a summary entry that cannot be found
    /// is logged rather than failing the call. The next successful operation
    /// on the same expense converges the summary list again.
    ///
    /// # Errors
    /// This function will return a:
    /// - [Error::InvalidCost] if `new_cost` is negative, NaN or infinite,
    /// - [Error::ExpenseNotFound] if `expense_id` does not refer to a valid expense,
    /// - or any error from the underlying stores.
    pub fn update_expense_cost(
        &mut self,
        expense_id: &ExpenseId,
        new_cost: f64,
    ) -> Result<Expense, Error> {
        let new_cost = validate_cost(new_cost)?;

        let Some(expense) = self.expense_store.update_cost(expense_id, new_cost)? else {
            return Err(Error::ExpenseNotFound);
        };

        let matched = self
            .user_store
            .update_summary_cost(&expense.owner_id, expense_id, new_cost)?;

        if !matched {
            tracing::warn!(
                expense_id = %expense_id,
                owner_id = %expense.owner_id,
                new_cost,
                "updated the canonical record but found no matching summary entry in the \
                 owner's summary list",
            );
        }

        Ok(expense)
    }

    /// Delete the expense `expense_id` and remove the matching entry from its
    /// owner's summary list.
    ///
    /// A summary entry that is already gone leaves nothing to reconcile, so it
    /// is noted in the logs but does not fail the operation.
    ///
    /// # Errors
    /// This function will return a:
    /// - [Error::ExpenseNotFound] if `expense_id` does not refer to a valid expense,
    /// - or any error from the underlying stores.
    pub fn delete_expense(&mut self, expense_id: &ExpenseId) -> Result<(), Error> {
        let Some(expense) = self.expense_store.delete(expense_id)? else {
            return Err(Error::ExpenseNotFound);
        };

        let matched = self
            .user_store
            .remove_summary(&expense.owner_id, expense_id)?;

        if !matched {
            tracing::debug!(
                expense_id = %expense_id,
                owner_id = %expense.owner_id,
                "deleted the canonical record but found no summary entry to remove",
            );
        }

        Ok(())
    }
}
