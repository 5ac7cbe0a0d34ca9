//! Implements a SQLite backed expense store.

use std::sync::{Arc, Mutex};

use rusqlite::{Connection, Row};

use crate::{
    Error,
    db::{CreateTable, MapRow},
    models::{Expense, ExpenseId, ExpenseName, UserId},
    stores::ExpenseStore,
};

/// Stores the canonical expense records in a SQLite database.
#[derive(Debug, Clone)]
pub struct SQLiteExpenseStore {
    connection: Arc<Mutex<Connection>>,
}

impl SQLiteExpenseStore {
    /// Create a new store for the SQLite `connection`.
    pub fn new(connection: Arc<Mutex<Connection>>) -> Self {
        Self { connection }
    }
}

impl ExpenseStore for SQLiteExpenseStore {
    /// Insert a new canonical expense record into the database.
    ///
    /// # Panics
    /// Panics if the lock for the database connection is already held by the same thread.
    ///
    /// # Errors
    /// Returns an [Error::SqlError] if there is an unexpected SQL error.
    fn create(&mut self, expense: &Expense) -> Result<(), Error> {
        self.connection.lock().unwrap().execute(
            "INSERT INTO expense (id, owner_id, name, cost) VALUES (?1, ?2, ?3, ?4)",
            (
                expense.id.as_str(),
                expense.owner_id.as_str(),
                expense.name.as_ref(),
                expense.cost,
            ),
        )?;

        Ok(())
    }

    /// Retrieve an expense from the database.
    ///
    /// # Panics
    /// Panics if the lock for the database connection is already held by the same thread.
    ///
    /// # Errors
    /// This function will return a:
    /// - [Error::ExpenseNotFound] if no expense has the ID `expense_id`,
    /// - or [Error::SqlError] if there is an unexpected SQL error.
    fn get(&self, expense_id: &ExpenseId) -> Result<Expense, Error> {
        self.connection
            .lock()
            .unwrap()
            .prepare("SELECT id, owner_id, name, cost FROM expense WHERE id = :id")?
            .query_row(&[(":id", &expense_id.as_str())], Self::map_row)
            .map_err(|error| match error {
                rusqlite::Error::QueryReturnedNoRows => Error::ExpenseNotFound,
                error => error.into(),
            })
    }

    /// Retrieve all expenses from the database.
    ///
    /// # Panics
    /// Panics if the lock for the database connection is already held by the same thread.
    ///
    /// # Errors
    /// Returns an [Error::SqlError] if there is an unexpected SQL error.
    fn list(&self) -> Result<Vec<Expense>, Error> {
        self.connection
            .lock()
            .unwrap()
            .prepare("SELECT id, owner_id, name, cost FROM expense")?
            .query_map((), Self::map_row)?
            .map(|maybe_expense| maybe_expense.map_err(Error::SqlError))
            .collect()
    }

    /// Set the cost of the expense with the ID `expense_id`.
    ///
    /// The match check and the update happen in a single statement, so there
    /// is no window in which another caller could delete the record between
    /// the two.
    ///
    /// # Panics
    /// Panics if the lock for the database connection is already held by the same thread.
    ///
    /// # Errors
    /// Returns an [Error::SqlError] if there is an unexpected SQL error.
    fn update_cost(&mut self, expense_id: &ExpenseId, cost: f64) -> Result<Option<Expense>, Error> {
        self.connection
            .lock()
            .unwrap()
            .prepare(
                "UPDATE expense SET cost = ?1 WHERE id = ?2
                 RETURNING id, owner_id, name, cost",
            )?
            .query_row((cost, expense_id.as_str()), Self::map_row)
            .map(Some)
            .or_else(|error| match error {
                rusqlite::Error::QueryReturnedNoRows => Ok(None),
                error => Err(error.into()),
            })
    }

    /// Delete the expense with the ID `expense_id`, returning the deleted
    /// record.
    ///
    /// # Panics
    /// Panics if the lock for the database connection is already held by the same thread.
    ///
    /// # Errors
    /// Returns an [Error::SqlError] if there is an unexpected SQL error.
    fn delete(&mut self, expense_id: &ExpenseId) -> Result<Option<Expense>, Error> {
        self.connection
            .lock()
            .unwrap()
            .prepare(
                "DELETE FROM expense WHERE id = ?1
                 RETURNING id, owner_id, name, cost",
            )?
            .query_row([expense_id.as_str()], Self::map_row)
            .map(Some)
            .or_else(|error| match error {
                rusqlite::Error::QueryReturnedNoRows => Ok(None),
                error => Err(error.into()),
            })
    }
}

impl CreateTable for SQLiteExpenseStore {
    fn create_table(connection: &Connection) -> Result<(), rusqlite::Error> {
        // Deliberately no foreign key on owner_id: the pairing between an
        // expense and the summary list in the owner's user record is enforced
        // by the engine, not by the schema.
        connection.execute(
            "CREATE TABLE IF NOT EXISTS expense (
                id TEXT PRIMARY KEY,
                owner_id TEXT NOT NULL,
                name TEXT NOT NULL,
                cost REAL NOT NULL
            )",
            (),
        )?;

        Ok(())
    }
}

impl MapRow for SQLiteExpenseStore {
    type ReturnType = Expense;

    fn map_row_with_offset(row: &Row, offset: usize) -> Result<Self::ReturnType, rusqlite::Error> {
        let id: String = row.get(offset)?;
        let owner_id: String = row.get(offset + 1)?;
        let name: String = row.get(offset + 2)?;
        let cost = row.get(offset + 3)?;

        Ok(Expense {
            id: ExpenseId::new(&id),
            owner_id: UserId::new(&owner_id),
            name: ExpenseName::new_unchecked(&name),
            cost,
        })
    }
}
