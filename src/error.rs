use thiserror::Error;
use std::io;

#[derive(Debug, Error)]
pub enum DbError {
    #[error("duplicate key {0}")]
    DuplicateKey(i64),
    #[error("value too large for column '{column}' (limit {max})")]
    ValueTooLarge { column: &'static str, max: usize },
    #[error("key {0} is negative; keys must be non-negative")]
    NegativeKey(i64),
    #[error("table full: page limit reached")]
    TableFull,
    #[error("corrupted database file: {0}")]
    Corrupted(String),
    #[error(transparent)]
    Io(#[from] io::Error),
}

pub type DbResult<T> = Result<T, DbError>;
