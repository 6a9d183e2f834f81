//! The in-memory [`StudentStore`] and the [`StudentPersistence`] trait.
//!
//! The store is the single authority over live aggregates: one copy per id,
//! insertion order, whole-aggregate replace on update. Durability is delegated
//! to a persistence backend (e.g. `roster-store-sqlite`) which only has to
//! load everything once and accept whole-aggregate upserts keyed by id.

use std::future::Future;

use chrono::{DateTime, Utc};
use tracing::{debug, warn};
use uuid::Uuid;

use crate::{
  Error, Result,
  student::{NewStudent, Student},
};

// ─── Persistence boundary ────────────────────────────────────────────────────

/// Abstraction over a durable backend for student aggregates.
///
/// `load_all` must be idempotent and return aggregates in insertion order.
/// `upsert` replaces any stored aggregate with the same id.
pub trait StudentPersistence: Send + Sync {
  type Error: std::error::Error + Send + Sync + 'static;

  fn load_all(&self) -> impl Future<Output = Result<Vec<Student>, Self::Error>> + Send + '_;

  fn upsert<'a>(
    &'a self,
    student: &'a Student,
  ) -> impl Future<Output = Result<(), Self::Error>> + Send + 'a;
}

// ─── Store ───────────────────────────────────────────────────────────────────

/// Canonical collection of student aggregates for one session.
#[derive(Debug)]
pub struct StudentStore {
  students: Vec<Student>,
  loading:  bool,
  /// Ids written since the last [`StudentStore::drain_pending_writes`].
  pending:  Vec<Uuid>,
}

impl Default for StudentStore {
  fn default() -> Self { Self::new() }
}

impl StudentStore {
  /// An empty store whose initial load is still pending.
  pub fn new() -> Self {
    Self { students: Vec::new(), loading: true, pending: Vec::new() }
  }

  /// A store that starts out loaded with `students`.
  pub fn loaded(students: Vec<Student>) -> Self {
    let mut store = Self::new();
    store.hydrate(students);
    store
  }

  /// Complete the initial load. The result follows the order supplied by
  /// persistence, with aggregates created locally before the load finished
  /// after it. A loaded aggregate replaces the live one unless the live one
  /// has an unflushed local write. Applying the same load twice yields the
  /// same state.
  pub fn hydrate(&mut self, students: Vec<Student>) {
    let count = students.len();
    let mut local = std::mem::take(&mut self.students);
    let mut merged: Vec<Student> = Vec::with_capacity(count + local.len());
    for student in students {
      let id = student.id();
      if merged.iter().any(|s| s.id() == id) {
        continue;
      }
      let live = local
        .iter()
        .position(|s| s.id() == id)
        .map(|i| local.remove(i));
      match live {
        Some(live) if self.pending.contains(&id) => merged.push(live),
        _ => merged.push(student),
      }
    }
    merged.extend(local);
    self.students = merged;
    self.loading = false;
    debug!(count, total = self.students.len(), "student store hydrated");
  }

  /// Whether the initial load has not completed yet. Views use this to avoid
  /// showing an empty state prematurely.
  pub fn is_loading(&self) -> bool { self.loading }

  /// All aggregates in insertion order.
  pub fn list(&self) -> &[Student] { &self.students }

  pub fn get(&self, id: Uuid) -> Option<&Student> {
    self.students.iter().find(|s| s.id() == id)
  }

  pub fn contains(&self, id: Uuid) -> bool { self.position(id).is_some() }

  pub fn len(&self) -> usize { self.students.len() }

  pub fn is_empty(&self) -> bool { self.students.is_empty() }

  /// Create a new aggregate: fresh id, default status, empty collections.
  pub fn create(&mut self, input: NewStudent) -> Result<Student> {
    self.create_at(input, Utc::now())
  }

  /// [`StudentStore::create`] with an explicit creation time.
  pub fn create_at(&mut self, input: NewStudent, now: DateTime<Utc>) -> Result<Student> {
    input.profile.validate()?;
    let student = Student::from_new(input, now);
    debug!(student_id = %student.id(), "student created");
    self.students.push(student.clone());
    self.mark_pending(student.id());
    Ok(student)
  }

  /// Replace the aggregate with the same id. Last write wins; there is no
  /// field-level merge.
  pub fn update(&mut self, student: Student) -> Result<()> {
    let id = student.id();
    let Some(i) = self.position(id) else {
      warn!(student_id = %id, "update for unknown student");
      return Err(Error::StudentNotFound(id));
    };
    student.validate()?;
    self.students[i] = student;
    self.mark_pending(id);
    debug!(student_id = %id, "student updated");
    Ok(())
  }

  /// Current values of every aggregate written since the last drain, in
  /// first-write order, for handing to persistence.
  pub fn drain_pending_writes(&mut self) -> Vec<Student> {
    std::mem::take(&mut self.pending)
      .into_iter()
      .filter_map(|id| self.get(id).cloned())
      .collect()
  }

  fn position(&self, id: Uuid) -> Option<usize> {
    self.students.iter().position(|s| s.id() == id)
  }

  fn mark_pending(&mut self, id: Uuid) {
    if !self.pending.contains(&id) {
      self.pending.push(id);
    }
  }
}

// ─── Tests ───────────────────────────────────────────────────────────────────
