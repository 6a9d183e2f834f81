//! Encoding and decoding between [`Student`] and its row representation.
//!
//! Ids are stored as hyphenated lowercase strings, timestamps as RFC 3339,
//! and the aggregate itself as a JSON document.

use chrono::{DateTime, Utc};
use roster_core::student::Student;
use uuid::Uuid;

use crate::{Error, Result};

pub fn encode_uuid(id: Uuid) -> String { id.hyphenated().to_string() }

pub fn decode_uuid(s: &str) -> Result<Uuid> { Ok(Uuid::parse_str(s)?) }

pub fn encode_dt(dt: DateTime<Utc>) -> String { dt.to_rfc3339() }

pub fn encode_student(student: &Student) -> Result<String> {
  Ok(serde_json::to_string(student)?)
}

/// A row as read from the `students` table, before decoding.
pub struct RawStudent {
  pub student_id: String,
  pub document:   String,
}

impl RawStudent {
  pub fn into_student(self) -> Result<Student> {
    let row = decode_uuid(&self.student_id)?;
    let student: Student = serde_json::from_str(&self.document)?;
    if student.id() != row {
      return Err(Error::IdMismatch { row, document: student.id() });
    }
    Ok(student)
  }
}
