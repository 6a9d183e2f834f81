//! Error type for `roster-store-sqlite`.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
  #[error("database error: {0}")]
  Database(#[from] tokio_rusqlite::Error),

  #[error("json error: {0}")]
  Json(#[from] serde_json::Error),

  #[error("uuid parse error: {0}")]
  Uuid(#[from] uuid::Error),

  /// The row key and the id inside the stored document disagree.
  #[error("row {row} holds a document for student {document}")]
  IdMismatch {
    row:      uuid::Uuid,
    document: uuid::Uuid,
  },
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
