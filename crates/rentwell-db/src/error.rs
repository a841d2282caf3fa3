//! Errors raised by the store.
//!
//! sqlx failures are folded into [`DbError`] here, and the API layer turns
//! them into status codes:
//!
//! ```text
//! sqlx::Error ──► DbError ──► ApiError { code, message }
//!                  NotFound        404
//!                  everything else 500
//! ```
//!
//! "Item already rented" and "item delisted" are answers, not failures, and
//! live in `ReserveError` next to the rental repository.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum DbError {
    /// No row with that id, or an update matched nothing.
    #[error("{entity} not found: {id}")]
    NotFound { entity: String, id: String },

    /// A UNIQUE index refused the row. `field` is `table.column` as SQLite
    /// reports it, e.g. `rentals.renter_id, rentals.request_key`.
    #[error("{field} is already taken ({value})")]
    UniqueViolation { field: String, value: String },

    /// A rental or item pointing at a row that does not exist.
    #[error("referenced row is missing: {message}")]
    ForeignKeyViolation { message: String },

    /// A CHECK constraint refused the row (bad status text, negative price).
    #[error("row rejected by check constraint: {0}")]
    CheckViolation(String),

    /// The write lock stayed held past `busy_timeout`.
    #[error("database is busy: {0}")]
    Busy(String),

    #[error("could not open database: {0}")]
    ConnectionFailed(String),

    #[error("schema migration failed: {0}")]
    MigrationFailed(String),

    #[error("query error: {0}")]
    QueryFailed(String),

    /// BEGIN, COMMIT or ROLLBACK itself failed.
    #[error("transaction error: {0}")]
    TransactionFailed(String),

    #[error("no free database connection")]
    PoolExhausted,

    #[error("unexpected database error: {0}")]
    Internal(String),
}

impl DbError {
    pub fn not_found(entity: impl Into<String>, id: impl Into<String>) -> Self {
        DbError::NotFound {
            entity: entity.into(),
            id: id.into(),
        }
    }

    pub fn duplicate(field: impl Into<String>, value: impl Into<String>) -> Self {
        DbError::UniqueViolation {
            field: field.into(),
            value: value.into(),
        }
    }

    /// For `map_err` on `begin`, `commit` and `rollback`.
    pub fn transaction(err: sqlx::Error) -> Self {
        DbError::TransactionFailed(err.to_string())
    }

    /// Sorts a SQLite error message into a variant.
    fn from_sqlite_message(msg: &str) -> Self {
        const UNIQUE: &str = "UNIQUE constraint failed: ";
        const CHECK: &str = "CHECK constraint failed: ";

        if let Some(columns) = msg.strip_prefix(UNIQUE) {
            DbError::duplicate(columns, "-")
        } else if msg.starts_with("FOREIGN KEY constraint failed") {
            DbError::ForeignKeyViolation {
                message: msg.to_string(),
            }
        } else if let Some(rule) = msg.strip_prefix(CHECK) {
            DbError::CheckViolation(rule.to_string())
        } else if msg.contains("database is locked") || msg.contains("database is busy") {
            DbError::Busy(msg.to_string())
        } else {
            DbError::QueryFailed(msg.to_string())
        }
    }
}

impl From<sqlx::Error> for DbError {
    fn from(err: sqlx::Error) -> Self {
        match err {
            sqlx::Error::RowNotFound => DbError::not_found("Row", "?"),
            sqlx::Error::Database(db_err) => DbError::from_sqlite_message(db_err.message()),
            sqlx::Error::PoolTimedOut => DbError::PoolExhausted,
            sqlx::Error::PoolClosed => DbError::ConnectionFailed("pool already closed".into()),
            other => DbError::Internal(other.to_string()),
        }
    }
}

impl From<sqlx::migrate::MigrateError> for DbError {
    fn from(err: sqlx::migrate::MigrateError) -> Self {
        DbError::MigrationFailed(err.to_string())
    }
}

pub type DbResult<T> = Result<T, DbError>;
