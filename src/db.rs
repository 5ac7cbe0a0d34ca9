/*! Database setup for the application. */

use rusqlite::{Connection, Row};

use crate::{
    Error,
    stores::sqlite::{SQLiteExpenseStore, SQLiteUserStore},
};

/// A trait for adding an object's schema to the application database.
pub trait CreateTable {
    /// Create the table(s) for the implementing store.
    ///
    /// # Errors
    /// Returns an error if the table(s) could not be created, e.g. invalid SQL.
    fn create_table(connection: &Connection) -> Result<(), rusqlite::Error>;
}

/// A trait for converting a SQL table row to a concrete type.
pub trait MapRow {
    /// The type that the table row will be converted to.
    type ReturnType;

    /// Convert `row` to [Self::ReturnType], reading columns starting from the first column.
    ///
    /// # Errors
    /// Returns an error if a column could not be read, e.g. the wrong column
    /// order or an invalid value.
    fn map_row(row: &Row) -> Result<Self::ReturnType, rusqlite::Error> {
        Self::map_row_with_offset(row, 0)
    }

    /// Convert `row` to [Self::ReturnType], reading columns starting from `offset`.
    ///
    /// # Errors
    /// Returns an error if a column could not be read, e.g. the wrong column
    /// order or an invalid value.
    fn map_row_with_offset(row: &Row, offset: usize) -> Result<Self::ReturnType, rusqlite::Error>;
}

/// Create the application tables in the database if they do not already exist.
///
/// # Errors
/// This function will return an [Error::SqlError] if the tables could not be
/// created.
pub fn initialize(connection: &Connection) -> Result<(), Error> {
    SQLiteUserStore::create_table(connection)?;
    SQLiteExpenseStore::create_table(connection)?;

    Ok(())
}
