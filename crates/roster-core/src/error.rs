//! Error types for `roster-core`.
//!
//! There is no permission-denied variant: a missing capability is enforced by
//! the [`Gate`](crate::gate::Gate) rendering nothing, never by an error.

use thiserror::Error;
use uuid::Uuid;

use crate::student::RequiredField;

#[derive(Debug, Error)]
pub enum Error {
  #[error("missing required fields: {}", join_fields(.0))]
  MissingFields(Vec<RequiredField>),

  #[error("invalid {field}: {reason}")]
  InvalidEntry {
    field:  &'static str,
    reason: String,
  },

  #[error("unsupported image payload")]
  UnsupportedImage,

  #[error("student not found: {0}")]
  StudentNotFound(Uuid),

  #[error("unknown role: {0:?}")]
  UnknownRole(String),
}

impl Error {
  /// `true` for errors the user fixes by correcting form input.
  pub fn is_validation(&self) -> bool {
    matches!(
      self,
      Self::MissingFields(_) | Self::InvalidEntry { .. } | Self::UnsupportedImage
    )
  }

  pub(crate) fn invalid(field: &'static str, reason: impl Into<String>) -> Self {
    Self::InvalidEntry { field, reason: reason.into() }
  }
}

fn join_fields(fields: &[RequiredField]) -> String {
  fields
    .iter()
    .map(ToString::to_string)
    .collect::<Vec<_>>()
    .join(", ")
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
