//! Accounting client core.
//!
//! The client records credit and debit transactions for a selected month and
//! shows the running totals and balance for that month. This library holds the
//! parts of the client with real state: the idle-timeout session guard that
//! logs a user out after a period of inactivity across every open tab, and the
//! ledger derivations (totals and running balance) computed from a month's
//! transactions.
//!
//! Rendering, routing and the REST client are collaborators supplied by the
//! host through the traits in [session] and [ledger].

#![warn(missing_docs)]

mod clock;
mod currency;
pub mod ledger;
mod logging;
mod password;
pub mod session;
mod timezone;

#[cfg(test)]
mod test_utils;

pub use clock::{Clock, SystemClock, epoch_millis, from_epoch_millis};
pub use currency::format_minor_units;
pub use logging::{APP_LOGS_KEY, LogEntry, StoreLogWriter, append_log, clear_logs, read_logs};
pub use password::{PasswordHash, PasswordStrength, ValidatedPassword, is_complex, password_strength};
pub use timezone::get_local_offset;

use crate::ledger::{Period, TransactionId};

/// The errors that may occur in the application.
#[derive(Debug, thiserror::Error, PartialEq)]
pub enum Error {
    /// The idle timeout must be a positive number of milliseconds.
    #[error("the idle timeout must be a positive number of milliseconds, got {0}")]
    InvalidTimeout(i64),

    /// The interval between expiry checks must be a positive number of milliseconds.
    #[error("the poll interval must be a positive number of milliseconds, got {0}")]
    InvalidPollInterval(i64),

    /// A value in the session store could not be parsed.
    ///
    /// Callers should pass in the key of the corrupt entry and the reason it
    /// could not be parsed.
    #[error("the session store entry \"{0}\" is corrupt: {1}")]
    CorruptSessionData(String, String),

    /// An error occurred while serializing a struct as JSON.
    #[error("could not serialize as JSON: {0}")]
    JSONSerializationError(String),

    /// Could not acquire the lock guarding an in-memory store or database connection.
    #[error("could not acquire the store lock")]
    StoreLockError,

    /// An unhandled/unexpected SQL error.
    #[error("an unexpected SQL error occurred: {0}")]
    SqlError(rusqlite::Error),

    /// A month number outside of 1-12 was used to create a period.
    #[error("{0} is not a valid month number")]
    InvalidMonth(u8),

    /// A month name that is not one of the Portuguese month names was used to
    /// create a period.
    #[error("\"{0}\" is not a valid month name")]
    InvalidMonthName(String),

    /// A transaction was added to a set for a different month.
    #[error("transaction {id} belongs to {found_month:02}/{found_year}, not {expected}")]
    PeriodMismatch {
        /// The ID of the offending transaction.
        id: TransactionId,
        /// The period of the transaction set.
        expected: Period,
        /// The month of the offending transaction.
        found_month: u8,
        /// The year of the offending transaction.
        found_year: i32,
    },

    /// Transaction values are amounts of money in minor currency units and
    /// the credit/debit direction is given by the entry type, so they can
    /// never be negative.
    #[error("transaction values cannot be negative, got {0}")]
    NegativeValue(i64),

    /// The backend that stores transactions returned an error.
    #[error("the transaction backend failed: {0}")]
    BackendError(String),

    /// The transactions file could not be parsed.
    #[error("could not parse the transactions: {0}")]
    InvalidTransactions(String),

    /// An error occurred while getting the local timezone from a canonical timezone string.
    #[error("invalid timezone {0}")]
    InvalidTimezoneError(String),

    /// The user provided a password that is too easy to guess.
    #[error("password is too weak: {0}")]
    TooWeak(String),

    /// An unexpected error occurred with the underlying hashing library.
    #[error("hashing failed: {0}")]
    HashingError(String),
}

impl From<rusqlite::Error> for Error {
    fn from(value: rusqlite::Error) -> Self {
        match value {
            // Code 26 occurs when the file is not a SQLite database.
            rusqlite::Error::SqliteFailure(sql_error, Some(ref desc))
                if sql_error.extended_code == 26 =>
            {
                Error::CorruptSessionData("database".to_owned(), desc.to_owned())
            }
            error => Error::SqlError(error),
        }
    }
}

impl From<serde_json::Error> for Error {
    fn from(value: serde_json::Error) -> Self {
        Error::JSONSerializationError(value.to_string())
    }
}
