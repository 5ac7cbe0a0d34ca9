//! This module defines the domain data types.

pub use expense::{Expense, ExpenseId, ExpenseName, ExpenseSummary, validate_cost};
pub use password::{PasswordHash, ValidatedPassword};
pub use user::{NewUser, User, UserId};

mod expense;
mod password;
mod user;
