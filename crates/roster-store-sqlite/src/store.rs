//! [`SqliteStore`], the SQLite implementation of [`StudentPersistence`].

use std::path::Path;

use chrono::Utc;
use roster_core::{store::StudentPersistence, student::Student};
use tracing::debug;

use crate::{
  Result,
  encode::{RawStudent, encode_dt, encode_student, encode_uuid},
  schema::SCHEMA,
};

// ─── Store ───────────────────────────────────────────────────────────────────

/// Student aggregates persisted in a single SQLite file.
///
/// The inner connection is reference-counted, so clones share it.
#[derive(Clone)]
pub struct SqliteStore {
  pub(crate) conn: tokio_rusqlite::Connection,
}

impl SqliteStore {
  /// Open (or create) a store at `path` and run schema initialisation.
  pub async fn open(path: impl AsRef<Path>) -> Result<Self> {
    let conn = tokio_rusqlite::Connection::open(path).await?;
    let store = Self { conn };
    store.init_schema().await?;
    Ok(store)
  }

  /// Open an in-memory store.
  pub async fn open_in_memory() -> Result<Self> {
    let conn = tokio_rusqlite::Connection::open_in_memory().await?;
    let store = Self { conn };
    store.init_schema().await?;
    Ok(store)
  }

  async fn init_schema(&self) -> Result<()> {
    self
      .conn
      .call(|conn| {
        conn.execute_batch(SCHEMA)?;
        Ok(())
      })
      .await?;
    Ok(())
  }

  /// Number of stored aggregates.
  pub async fn count(&self) -> Result<usize> {
    let n: i64 = self
      .conn
      .call(|conn| Ok(conn.query_row("SELECT COUNT(*) FROM students", [], |r| r.get(0))?))
      .await?;
    Ok(usize::try_from(n).unwrap_or_default())
  }
}

// ─── StudentPersistence impl ─────────────────────────────────────────────────

impl StudentPersistence for SqliteStore {
  type Error = crate::Error;

  async fn load_all(&self) -> Result<Vec<Student>> {
    let raws: Vec<RawStudent> = self
      .conn
      .call(|conn| {
        let mut stmt =
          conn.prepare("SELECT student_id, document FROM students ORDER BY seq")?;
        let rows = stmt
          .query_map([], |row| {
            Ok(RawStudent {
              student_id: row.get(0)?,
              document:   row.get(1)?,
            })
          })?
          .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
      })
      .await?;

    let students = raws
      .into_iter()
      .map(RawStudent::into_student)
      .collect::<Result<Vec<_>>>()?;
    debug!(count = students.len(), "students loaded");
    Ok(students)
  }

  async fn upsert(&self, student: &Student) -> Result<()> {
    let id_str   = encode_uuid(student.id());
    let at_str   = encode_dt(Utc::now());
    let document = encode_student(student)?;

    self
      .conn
      .call(move |conn| {
        conn.execute(
          "INSERT INTO students (student_id, updated_at, document)
           VALUES (?1, ?2, ?3)
           ON CONFLICT (student_id) DO UPDATE SET
             updated_at = excluded.updated_at,
             document   = excluded.document",
          rusqlite::params![id_str, at_str, document],
        )?;
        Ok(())
      })
      .await?;
    debug!(student_id = %student.id(), "student upserted");
    Ok(())
  }
}
