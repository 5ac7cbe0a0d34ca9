//! Implements a SQLite backed user store.
//!
//! The expense summary list of each user is stored as a JSON string in a
//! single column, so reading or replacing the whole list is one statement on
//! one row.

use std::{
    str::FromStr,
    sync::{Arc, Mutex},
};

use email_address::EmailAddress;
use rusqlite::{Connection, Row};

use crate::{
    Error,
    db::{CreateTable, MapRow},
    models::{ExpenseId, ExpenseSummary, NewUser, PasswordHash, User, UserId},
    stores::UserStore,
};

/// Stores users and their embedded expense summaries in a SQLite database.
#[derive(Debug, Clone)]
pub struct SQLiteUserStore {
    connection: Arc<Mutex<Connection>>,
}

impl SQLiteUserStore {
    /// Create a new store for the SQLite `connection`.
    pub fn new(connection: Arc<Mutex<Connection>>) -> Self {
        Self { connection }
    }
}

impl UserStore for SQLiteUserStore {
    /// Create a new user and insert it into the database.
    ///
    /// # Panics
    /// Panics if the lock for the database connection is already held by the same thread.
    ///
    /// # Errors
    /// This function will return a:
    /// - [Error::DuplicateEmail] if a user with the same email already exists,
    /// - or [Error::SqlError] if there is an unexpected SQL error.
    fn create(&mut self, new_user: NewUser) -> Result<User, Error> {
        let user = User {
            id: UserId::new_random(),
            name: new_user.name,
            email: new_user.email,
            password_hash: new_user.password_hash,
            yearly_income: new_user.yearly_income,
            expense_summaries: Vec::new(),
        };

        self.connection.lock().unwrap().execute(
            "INSERT INTO user (id, name, email, password, yearly_income, expense_summaries)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
            (
                user.id.as_str(),
                &user.name,
                user.email.to_string(),
                user.password_hash.to_string(),
                user.yearly_income,
                "[]",
            ),
        )?;

        Ok(user)
    }

    /// Get the user with the ID `user_id` from the database.
    ///
    /// # Panics
    /// Panics if the lock for the database connection is already held by the same thread.
    ///
    /// # Errors
    /// This function will return a:
    /// - [Error::UserNotFound] if no user has the ID `user_id`,
    /// - or [Error::SqlError] if there is an unexpected SQL error.
    fn get(&self, user_id: &UserId) -> Result<User, Error> {
        self.connection
            .lock()
            .unwrap()
            .prepare(
                "SELECT id, name, email, password, yearly_income, expense_summaries
                 FROM user WHERE id = :id",
            )?
            .query_row(&[(":id", &user_id.as_str())], Self::map_row)
            .map_err(|error| match error {
                rusqlite::Error::QueryReturnedNoRows => Error::UserNotFound,
                error => error.into(),
            })
    }

    /// Get the user with the email address `email` from the database.
    ///
    /// # Panics
    /// Panics if the lock for the database connection is already held by the same thread.
    ///
    /// # Errors
    /// This function will return a:
    /// - [Error::UserNotFound] if no user has the email address `email`,
    /// - or [Error::SqlError] if there is an unexpected SQL error.
    fn get_by_email(&self, email: &EmailAddress) -> Result<User, Error> {
        self.connection
            .lock()
            .unwrap()
            .prepare(
                "SELECT id, name, email, password, yearly_income, expense_summaries
                 FROM user WHERE email = :email",
            )?
            .query_row(&[(":email", &email.to_string())], Self::map_row)
            .map_err(|error| match error {
                rusqlite::Error::QueryReturnedNoRows => Error::UserNotFound,
                error => error.into(),
            })
    }

    /// Retrieve all users from the database.
    ///
    /// # Panics
    /// Panics if the lock for the database connection is already held by the same thread.
    ///
    /// # Errors
    /// Returns an [Error::SqlError] if there is an unexpected SQL error.
    fn list(&self) -> Result<Vec<User>, Error> {
        self.connection
            .lock()
            .unwrap()
            .prepare(
                "SELECT id, name, email, password, yearly_income, expense_summaries FROM user",
            )?
            .query_map((), Self::map_row)?
            .map(|maybe_user| maybe_user.map_err(Error::SqlError))
            .collect()
    }

    /// Add `summary` to the summary list of the user with the ID `owner_id`.
    ///
    /// A summary whose ID is already in the list is not added again, but still
    /// counts as a match.
    ///
    /// # Panics
    /// Panics if the lock for the database connection is already held by the same thread.
    ///
    /// # Errors
    /// Returns an [Error::SqlError] if there is an unexpected SQL error.
    fn append_summary(
        &mut self,
        owner_id: &UserId,
        summary: ExpenseSummary,
    ) -> Result<bool, Error> {
        // The lock is held across the read and the write, so the list cannot
        // change in between.
        let connection = self.connection.lock().unwrap();

        let Some(mut summaries) = select_summary_list(&connection, owner_id)? else {
            return Ok(false);
        };

        if summaries.iter().any(|existing| existing.id == summary.id) {
            return Ok(true);
        }

        summaries.push(summary);
        update_summary_list(&connection, owner_id, &summaries)?;

        Ok(true)
    }

    /// Set the cost of the summary entry `expense_id` in the summary list of
    /// the user with the ID `owner_id`.
    ///
    /// # Panics
    /// Panics if the lock for the database connection is already held by the same thread.
    ///
    /// # Errors
    /// Returns an [Error::SqlError] if there is an unexpected SQL error.
    fn update_summary_cost(
        &mut self,
        owner_id: &UserId,
        expense_id: &ExpenseId,
        cost: f64,
    ) -> Result<bool, Error> {
        let connection = self.connection.lock().unwrap();

        let Some(mut summaries) = select_summary_list(&connection, owner_id)? else {
            return Ok(false);
        };

        let Some(entry) = summaries.iter_mut().find(|entry| &entry.id == expense_id) else {
            return Ok(false);
        };

        entry.cost = cost;
        update_summary_list(&connection, owner_id, &summaries)?;

        Ok(true)
    }

    /// Remove the summary entry `expense_id` from the summary list of the user
    /// with the ID `owner_id`.
    ///
    /// # Panics
    /// Panics if the lock for the database connection is already held by the same thread.
    ///
    /// # Errors
    /// Returns an [Error::SqlError] if there is an unexpected SQL error.
    fn remove_summary(&mut self, owner_id: &UserId, expense_id: &ExpenseId) -> Result<bool, Error> {
        let connection = self.connection.lock().unwrap();

        let Some(mut summaries) = select_summary_list(&connection, owner_id)? else {
            return Ok(false);
        };

        let summary_count = summaries.len();
        summaries.retain(|entry| &entry.id != expense_id);

        if summaries.len() == summary_count {
            return Ok(false);
        }

        update_summary_list(&connection, owner_id, &summaries)?;

        Ok(true)
    }
}

/// Read the summary list of the user `owner_id`, or `None` if there is no such
/// user.
fn select_summary_list(
    connection: &Connection,
    owner_id: &UserId,
) -> Result<Option<Vec<ExpenseSummary>>, Error> {
    connection
        .prepare("SELECT expense_summaries FROM user WHERE id = :id")?
        .query_row(&[(":id", &owner_id.as_str())], |row| {
            let raw_summaries: String = row.get(0)?;

            parse_summary_list(&raw_summaries, 0)
        })
        .map(Some)
        .or_else(|error| match error {
            rusqlite::Error::QueryReturnedNoRows => Ok(None),
            error => Err(error.into()),
        })
}

/// Replace the summary list of the user `owner_id` with `summaries`.
fn update_summary_list(
    connection: &Connection,
    owner_id: &UserId,
    summaries: &[ExpenseSummary],
) -> Result<(), Error> {
    let raw_summaries = serde_json::to_string(summaries)
        .map_err(|error| Error::JSONSerializationError(error.to_string()))?;

    connection.execute(
        "UPDATE user SET expense_summaries = ?1 WHERE id = ?2",
        (raw_summaries, owner_id.as_str()),
    )?;

    Ok(())
}

/// Parse the JSON summary list read from `column` of a user row.
fn parse_summary_list(
    raw_summaries: &str,
    column: usize,
) -> Result<Vec<ExpenseSummary>, rusqlite::Error> {
    serde_json::from_str(raw_summaries).map_err(|error| {
        rusqlite::Error::FromSqlConversionFailure(
            column,
            rusqlite::types::Type::Text,
            Box::new(error),
        )
    })
}

impl CreateTable for SQLiteUserStore {
    fn create_table(connection: &Connection) -> Result<(), rusqlite::Error> {
        connection.execute(
            "CREATE TABLE IF NOT EXISTS user (
                id TEXT PRIMARY KEY,
                name TEXT NOT NULL,
                email TEXT UNIQUE NOT NULL,
                password TEXT NOT NULL,
                yearly_income REAL,
                expense_summaries TEXT NOT NULL
            )",
            (),
        )?;

        Ok(())
    }
}

impl MapRow for SQLiteUserStore {
    type ReturnType = User;

    fn map_row_with_offset(row: &Row, offset: usize) -> Result<Self::ReturnType, rusqlite::Error> {
        let id: String = row.get(offset)?;
        let name: String = row.get(offset + 1)?;

        let raw_email: String = row.get(offset + 2)?;
        let email = EmailAddress::from_str(&raw_email).map_err(|error| {
            rusqlite::Error::FromSqlConversionFailure(
                offset + 2,
                rusqlite::types::Type::Text,
                Box::new(error),
            )
        })?;

        let raw_password_hash: String = row.get(offset + 3)?;
        let yearly_income: Option<f64> = row.get(offset + 4)?;

        let raw_summaries: String = row.get(offset + 5)?;
        let expense_summaries = parse_summary_list(&raw_summaries, offset + 5)?;

        Ok(User {
            id: UserId::new(&id),
            name,
            email,
            password_hash: PasswordHash::new_unchecked(&raw_password_hash),
            yearly_income,
            expense_summaries,
        })
    }
}
