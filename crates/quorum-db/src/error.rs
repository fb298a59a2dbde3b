use thiserror::Error;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("invalid content type: {0}")]
    InvalidContentType(String),

    #[error("invalid vote direction: {0}")]
    InvalidDirection(String),

    #[error("invalid sort key: {0}")]
    InvalidSort(String),

    #[error("{0} not found")]
    NotFound(&'static str),

    #[error("not authorized")]
    Forbidden,

    #[error("database error: {0}")]
    Sqlite(#[from] rusqlite::Error),

    #[error("database lock poisoned")]
    LockPoisoned,
}

pub type Result<T, E = StoreError> = std::result::Result<T, E>;

/// Extension trait for optional query results
pub(crate) trait OptionalExt<T> {
    fn optional(self) -> Result<Option<T>>;
}

impl<T> OptionalExt<T> for std::result::Result<T, rusqlite::Error> {
    fn optional(self) -> Result<Option<T>> {
        match self {
            Ok(val) => Ok(Some(val)),
            Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
            Err(e) => Err(e.into()),
        }
    }
}
