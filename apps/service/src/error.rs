use thiserror::Error;

use crate::database;

/// Errors surfaced by the resource operations.
///
/// The core never formats user-facing text; the API layer maps each kind to
/// one status/detail pair.
#[derive(Debug, Error)]
pub enum ResourceError {
    #[error("resource with this url already exists")]
    AlreadyExists,

    #[error("resource not found")]
    NotFound,

    #[error("resource id is out of range")]
    OutOfRange,

    #[error("resource did not answer with a healthy status")]
    Unavailable,

    /// A check was dispatched without the previous-state snapshot
    #[error("check job is missing the resource state")]
    MissingState,

    #[error("invalid url: {0}")]
    InvalidUrl(String),

    #[error(transparent)]
    Storage(database::Error),
}

impl From<database::Error> for ResourceError {
    fn from(error: database::Error) -> Self {
        match error {
            database::Error::NotFound => ResourceError::NotFound,
            other => ResourceError::Storage(other),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn storage_not_found_becomes_domain_not_found() {
        assert!(matches!(ResourceError::from(database::Error::NotFound), ResourceError::NotFound));
        assert!(matches!(
            ResourceError::from(database::Error::Decode("x".into())),
            ResourceError::Storage(_)
        ));
    }
}
