//! Error type for `schemaindex-store-sqlite`.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
  /// A registry policy refused the write.
  #[error("core error: {0}")]
  Core(#[from] schemaindex_core::Error),

  #[error("database error: {0}")]
  Database(#[from] tokio_rusqlite::Error),

  #[error("uuid parse error: {0}")]
  Uuid(#[from] uuid::Error),

  #[error("date/time parse error: {0}")]
  DateParse(String),

  /// A stored enum column holds a value this build does not know.
  #[error("cannot decode column {column}: {value:?}")]
  Decode { column: &'static str, value: String },
}

impl From<rusqlite::Error> for Error {
  fn from(e: rusqlite::Error) -> Self { Self::Database(tokio_rusqlite::Error::from(e)) }
}

/// Policy violations keep their meaning; everything else is a store failure.
impl From<Error> for schemaindex_core::Error {
  fn from(e: Error) -> Self {
    match e {
      Error::Core(e) => e,
      other => Self::Store(Box::new(other)),
    }
  }
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
