use thiserror::Error;

/// Errors raised by the persistence layer
#[derive(Debug, Error)]
pub enum Error {
    /// The addressed row does not exist (or a history row referenced a
    /// resource that no longer exists)
    #[error("record not found")]
    NotFound,

    #[error("database query failed: {0}")]
    Query(#[from] libsql::Error),

    #[error("failed to acquire a database connection: {0}")]
    Pool(#[from] deadpool::managed::PoolError<libsql::Error>),

    /// A stored value could not be mapped back into a model
    #[error("corrupt row: {0}")]
    Decode(String),
}

pub type Result<T> = std::result::Result<T, Error>;

/// Treat SQLite foreign-key violations as a missing parent row.
pub(crate) fn map_constraint(error: libsql::Error) -> Error {
    if error.to_string().contains("FOREIGN KEY constraint failed") {
        Error::NotFound
    } else {
        Error::Query(error)
    }
}
