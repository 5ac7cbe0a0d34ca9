//! Implements a struct that holds the state of the REST server.

use std::sync::{Arc, Mutex};

use jsonwebtoken::{DecodingKey, EncodingKey};
use rusqlite::Connection;

use crate::{
    Error,
    db::initialize,
    engine::ExpenseEngine,
    stores::sqlite::{SQLiteExpenseStore, SQLiteUserStore},
};

/// The keys for signing and verifying bearer tokens.
#[derive(Clone)]
struct JwtKeys {
    encoding: EncodingKey,
    decoding: DecodingKey,
}

impl JwtKeys {
    /// Create the key pair from the shared `secret`.
    fn new(secret: &str) -> Self {
        Self {
            encoding: EncodingKey::from_secret(secret.as_bytes()),
            decoding: DecodingKey::from_secret(secret.as_bytes()),
        }
    }
}

/// The state of the REST server.
#[derive(Clone)]
pub struct AppState {
    /// The store for user accounts and their embedded expense summaries.
    pub user_store: SQLiteUserStore,

    /// The store for the canonical expense records.
    pub expense_store: SQLiteExpenseStore,

    /// The engine that all expense mutations must go through.
    pub engine: ExpenseEngine<SQLiteExpenseStore, SQLiteUserStore>,

    jwt_keys: JwtKeys,
}

impl AppState {
    /// Create a new [AppState] with a SQLite database connection.
    ///
    /// This function will initialize the database by adding the tables for the
    /// domain models.
    ///
    /// # Errors
    /// Returns an error if the database cannot be initialized.
    pub fn new(db_connection: Connection, jwt_secret: &str) -> Result<Self, Error> {
        initialize(&db_connection)?;

        let connection = Arc::new(Mutex::new(db_connection));
        let user_store = SQLiteUserStore::new(connection.clone());
        let expense_store = SQLiteExpenseStore::new(connection);
        let engine = ExpenseEngine::new(expense_store.clone(), user_store.clone());

        Ok(Self {
            user_store,
            expense_store,
            engine,
            jwt_keys: JwtKeys::new(jwt_secret),
        })
    }

    /// The key for signing new bearer tokens.
    pub fn encoding_key(&self) -> &EncodingKey {
        &self.jwt_keys.encoding
    }

    /// The key for verifying bearer tokens.
    pub fn decoding_key(&self) -> &DecodingKey {
        &self.jwt_keys.decoding
    }
}
