use crate::thiserror::Error as ThisError;
use std::io;

/// Postgres SQLSTATE for `foreign_key_violation`.
const FOREIGN_KEY_VIOLATION: &str = "23503";

#[derive(Debug, ThisError)]
pub enum Error {
    #[error("database error: {0}")]
    Database(sqlx::Error),

    #[error("integrity error: {0}")]
    Integrity(String),

    #[error("not found: {0}")]
    NotFound(String),

    #[error("bussiness error: {0}")]
    BusinessError(String),

    #[error("question {0} is frozen")]
    Frozen(i32),

    #[error("forbidden")]
    Forbidden,

    #[error("io error: {0}")]
    Io(#[from] io::Error),

    #[error("dotenv error: {0}")]
    DotEnv(#[from] dotenv::Error),

    #[error("casbin error: {0}")]
    Casbin(#[from] casbin::Error),

    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),
}

impl From<sqlx::Error> for Error {
    fn from(err: sqlx::Error) -> Self {
        match err {
            sqlx::Error::RowNotFound => Error::NotFound("row not found".into()),
            sqlx::Error::Database(db_err) if db_err.code().as_deref() == Some(FOREIGN_KEY_VIOLATION) => Error::Integrity(db_err.message().to_owned()),
            err => Error::Database(err),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn row_not_found_maps_to_not_found() {
        let err: Error = sqlx::Error::RowNotFound.into();
        assert!(matches!(err, Error::NotFound(_)));
    }

    #[test]
    fn other_sqlx_errors_stay_database_errors() {
        let err: Error = sqlx::Error::PoolTimedOut.into();
        assert!(matches!(err, Error::Database(_)));
    }
}
