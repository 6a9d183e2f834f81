//! Entry types for the student aggregate's nested collections.
//!
//! Every entry carries an [`EntryId`] that is unique within its collection on
//! one aggregate. Ids are not globally unique and mean nothing outside their
//! parent.

use std::fmt;

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

// ─── EntryId ─────────────────────────────────────────────────────────────────

/// Identifier of a nested-collection entry, scoped to its parent aggregate.
#[derive(
  Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(transparent)]
pub struct EntryId(u64);

impl EntryId {
  pub fn get(self) -> u64 { self.0 }

  /// Next id for a collection: the wall clock in milliseconds, bumped past
  /// the largest id already present. Only sound with a single writer.
  pub fn next<E: Entry>(existing: &[E], now: DateTime<Utc>) -> Self {
    let clock = u64::try_from(now.timestamp_millis()).unwrap_or(0);
    let floor = existing
      .iter()
      .map(|e| e.entry_id().0.saturating_add(1))
      .max()
      .unwrap_or(0);
    Self(clock.max(floor))
  }
}

impl fmt::Display for EntryId {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result { write!(f, "{}", self.0) }
}

/// Implemented by every nested-collection entry.
pub trait Entry {
  fn entry_id(&self) -> EntryId;
}

macro_rules! impl_entry {
  ($($ty:ty),* $(,)?) => {
    $(impl Entry for $ty {
      fn entry_id(&self) -> EntryId { self.entry_id }
    })*
  };
}

impl_entry!(Grade, AttendanceRecord, Occurrence, Document, CommunicationEntry, AgendaEntry);

// ─── Grades ──────────────────────────────────────────────────────────────────

/// One assessed score on the 0–10 scale.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Grade {
  pub entry_id:    EntryId,
  pub subject:     String,
  /// Term label, e.g. "1º Bimestre".
  pub term:        String,
  pub score:       f32,
  pub recorded_on: NaiveDate,
}

// ─── Attendance ──────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AttendanceMark {
  Present,
  Absent,
  Late,
  Excused,
}

impl AttendanceMark {
  pub fn label(self) -> &'static str {
    match self {
      Self::Present => "Presente",
      Self::Absent => "Falta",
      Self::Late => "Atraso",
      Self::Excused => "Justificada",
    }
  }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AttendanceRecord {
  pub entry_id: EntryId,
  pub date:     NaiveDate,
  pub mark:     AttendanceMark,
  pub note:     Option<String>,
}

// ─── Occurrences ─────────────────────────────────────────────────────────────

/// A disciplinary or pastoral incident.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Occurrence {
  pub entry_id:    EntryId,
  pub date:        NaiveDate,
  pub kind:        String,
  pub description: String,
  pub reported_by: Option<String>,
}

// ─── Documents ───────────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Document {
  pub entry_id:    EntryId,
  pub name:        String,
  pub kind:        String,
  /// Where the document lives; a path, URL or `data:` URL.
  pub reference:   String,
  pub uploaded_on: NaiveDate,
}

// ─── Communication log ───────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Channel {
  Email,
  Phone,
  Whatsapp,
  Letter,
  Meeting,
}

impl Channel {
  pub fn label(self) -> &'static str {
    match self {
      Self::Email => "E-mail",
      Self::Phone => "Telefone",
      Self::Whatsapp => "WhatsApp",
      Self::Letter => "Carta",
      Self::Meeting => "Reunião",
    }
  }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CommunicationEntry {
  pub entry_id: EntryId,
  pub sent_at:  DateTime<Utc>,
  pub channel:  Channel,
  pub subject:  String,
  pub message:  String,
}

// ─── Individual agenda ───────────────────────────────────────────────────────

/// A note in the student's individual agenda, addressed to the family.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AgendaEntry {
  pub entry_id:   EntryId,
  /// The date the entry refers to; the collection is ordered on this.
  pub date:       NaiveDate,
  pub created_at: DateTime<Utc>,
  pub title:      String,
  pub message:    String,
  /// Whether the entry has been delivered to the family.
  pub delivered:  bool,
}
