//! Expensier is a backend for tracking personal expenses.
//!
//! This library provides a JSON REST API over two kinds of records: user
//! accounts and the expenses they own. Each user record embeds a summary list
//! of the user's expenses so that a single user lookup can render an overview;
//! [ExpenseEngine] keeps that list consistent with the canonical expense
//! records without relying on database transactions.

#![warn(missing_docs)]

use std::{net::SocketAddr, time::Duration};

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use axum_server::Handle;
use serde_json::json;
use tokio::signal;

mod auth;
mod config;
mod db;
mod endpoints;
mod engine;
pub mod models;
mod routes;
pub mod stores;

pub use config::AppState;
pub use db::initialize as initialize_db;
pub use engine::ExpenseEngine;
pub use routes::build_router;

/// An async task that waits for either the ctrl+c or terminate signal, whichever comes first, and
/// then signals the server to shut down gracefully.
///
/// `handle` is a handle to an Axum `Server`.
pub async fn graceful_shutdown(handle: Handle<SocketAddr>) {
    let ctrl_c = async {
        signal::ctrl_c()
            .await
            .expect("failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        signal::unix::signal(signal::unix::SignalKind::terminate())
            .expect("failed to install signal handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            tracing::debug!("Received ctrl+c signal.");
            handle.graceful_shutdown(Some(Duration::from_secs(1)));
        },
        _ = terminate => {
            tracing::debug!("Received terminate signal.");
            handle.graceful_shutdown(Some(Duration::from_secs(1)));
        },
    }
}

/// The errors that may occur in the application.
#[derive(Debug, thiserror::Error, PartialEq)]
pub enum Error {
    /// An empty string was used to create an expense name.
    #[error("expense name cannot be empty")]
    EmptyExpenseName,

    /// A negative or non-finite number was used as the cost of an expense.
    #[error("{0} is not a valid cost, costs must be non-negative amounts")]
    InvalidCost(f64),

    /// An empty string was used as the display name of a user.
    #[error("user name cannot be empty")]
    EmptyUserName,

    /// The string could not be parsed as an email address.
    #[error("\"{0}\" is not a valid email address")]
    InvalidEmail(String),

    /// The user provided a password that is too easy to guess.
    #[error("password is too weak: {0}")]
    TooWeak(String),

    /// An unexpected error occurred with the underlying hashing library.
    ///
    /// The error string should only be logged for debugging on the server.
    /// When communicating with the application client this error should be
    /// replaced with a general error type indicating an internal server error.
    #[error("hashing failed: {0}")]
    HashingError(String),

    /// The specified email address already belongs to a registered user.
    #[error("the email address is already in use")]
    DuplicateEmail,

    /// The owner ID used to create an expense does not refer to a valid user.
    ///
    /// By the time this error is returned, the canonical record written for
    /// the expense has been compensated for, so no state change remains.
    #[error("the owner ID does not refer to a valid user")]
    OwnerNotFound,

    /// The requested expense was not found.
    #[error("the expense ID does not refer to a valid expense")]
    ExpenseNotFound,

    /// The requested user was not found.
    #[error("the given details do not refer to a valid user")]
    UserNotFound,

    /// An error occurred while serializing a struct as JSON.
    #[error("could not serialize as JSON: {0}")]
    JSONSerializationError(String),

    /// An unhandled/unexpected SQL error.
    #[error("an unexpected SQL error occurred: {0}")]
    SqlError(rusqlite::Error),
}

impl From<rusqlite::Error> for Error {
    fn from(value: rusqlite::Error) -> Self {
        match value {
            // Code 2067 occurs when a UNIQUE constraint failed.
            rusqlite::Error::SqliteFailure(sql_error, Some(ref desc))
                if sql_error.extended_code == 2067 && desc.ends_with("user.email") =>
            {
                Error::DuplicateEmail
            }
            error => {
                tracing::error!("an unhandled SQL error occurred: {}", error);
                Error::SqlError(error)
            }
        }
    }
}

impl IntoResponse for Error {
    fn into_response(self) -> Response {
        let (status, message) = match self {
            Error::EmptyExpenseName
            | Error::InvalidCost(_)
            | Error::EmptyUserName
            | Error::InvalidEmail(_)
            | Error::TooWeak(_)
            | Error::DuplicateEmail => (StatusCode::BAD_REQUEST, self.to_string()),
            Error::OwnerNotFound | Error::ExpenseNotFound | Error::UserNotFound => {
                (StatusCode::NOT_FOUND, self.to_string())
            }
            // Internal errors are not intended to be shown to the client.
            error => {
                tracing::error!("An unexpected error occurred: {}", error);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "an internal error occurred".to_string(),
                )
            }
        };

        (status, Json(json!({ "error": message }))).into_response()
    }
}
