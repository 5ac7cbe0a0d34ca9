//! SQLite backed implementations of the store traits.

pub use expense::SQLiteExpenseStore;
pub use user::SQLiteUserStore;

mod expense;
mod user;
