//! This module defines the store traits that abstract over the database, and
//! their SQLite implementations.

pub use expense::ExpenseStore;
pub use user::UserStore;

mod expense;
pub mod sqlite;
mod user;
