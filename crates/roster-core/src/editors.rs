//! Nested-collection editors.
//!
//! Each editor takes the current aggregate and a payload and returns a new
//! aggregate with one collection extended. The input aggregate is never
//! mutated; the result goes back through
//! [`StudentStore::update`](crate::store::StudentStore::update) like any
//! other edit.

use base64::{Engine as _, engine::general_purpose::STANDARD as B64};
use chrono::{DateTime, NaiveDate, Utc};

use crate::{
  Error, Result,
  entry::{
    AgendaEntry, AttendanceMark, AttendanceRecord, Channel, CommunicationEntry,
    Document, EntryId, Grade, Occurrence,
  },
  student::Student,
};

// ─── Payloads ────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq)]
pub struct GradeInput {
  pub subject: String,
  pub term:    String,
  pub score:   f32,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AttendanceInput {
  pub date: NaiveDate,
  pub mark: AttendanceMark,
  pub note: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OccurrenceInput {
  pub date:        NaiveDate,
  pub kind:        String,
  pub description: String,
  pub reported_by: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DocumentInput {
  pub name:      String,
  pub kind:      String,
  pub reference: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommunicationInput {
  pub channel: Channel,
  pub subject: String,
  pub message: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AgendaInput {
  pub date:    NaiveDate,
  pub title:   String,
  pub message: String,
}

// ─── Collection selector ─────────────────────────────────────────────────────

/// The nested collections of a [`Student`], in display order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum NestedCollection {
  Grades,
  Attendance,
  Occurrences,
  Documents,
  Agenda,
  Communications,
}

impl NestedCollection {
  pub const ALL: [NestedCollection; 6] = [
    Self::Grades,
    Self::Attendance,
    Self::Occurrences,
    Self::Documents,
    Self::Agenda,
    Self::Communications,
  ];

  pub fn label(self) -> &'static str {
    match self {
      Self::Grades => "Notas",
      Self::Attendance => "Frequência",
      Self::Occurrences => "Ocorrências",
      Self::Documents => "Documentos",
      Self::Agenda => "Agenda",
      Self::Communications => "Comunicações",
    }
  }

  pub fn len(self, student: &Student) -> usize {
    match self {
      Self::Grades => student.grades.len(),
      Self::Attendance => student.attendance.len(),
      Self::Occurrences => student.occurrences.len(),
      Self::Documents => student.documents.len(),
      Self::Agenda => student.agenda.len(),
      Self::Communications => student.communications.len(),
    }
  }
}

/// Any editor payload, for callers that pick the collection at runtime.
#[derive(Debug, Clone, PartialEq)]
pub enum EntryInput {
  Grade(GradeInput),
  Attendance(AttendanceInput),
  Occurrence(OccurrenceInput),
  Document(DocumentInput),
  Agenda(AgendaInput),
  Communication(CommunicationInput),
}

impl EntryInput {
  pub fn collection(&self) -> NestedCollection {
    match self {
      Self::Grade(_) => NestedCollection::Grades,
      Self::Attendance(_) => NestedCollection::Attendance,
      Self::Occurrence(_) => NestedCollection::Occurrences,
      Self::Document(_) => NestedCollection::Documents,
      Self::Agenda(_) => NestedCollection::Agenda,
      Self::Communication(_) => NestedCollection::Communications,
    }
  }

  /// Dispatch to the matching editor.
  pub fn apply(self, student: &Student, now: DateTime<Utc>) -> Result<Student> {
    match self {
      Self::Grade(i) => add_grade(student, i, now),
      Self::Attendance(i) => add_attendance(student, i, now),
      Self::Occurrence(i) => add_occurrence(student, i, now),
      Self::Document(i) => add_document(student, i, now),
      Self::Agenda(i) => add_agenda_entry(student, i, now),
      Self::Communication(i) => add_communication(student, i, now),
    }
  }
}

// ─── Editors ─────────────────────────────────────────────────────────────────

fn require(field: &'static str, value: &str) -> Result<()> {
  if value.trim().is_empty() {
    Err(Error::invalid(field, "must not be empty"))
  } else {
    Ok(())
  }
}

pub fn add_grade(student: &Student, input: GradeInput, now: DateTime<Utc>) -> Result<Student> {
  require("subject", &input.subject)?;
  if !input.score.is_finite() || !(0.0..=10.0).contains(&input.score) {
    return Err(Error::invalid("score", format!("{} is outside 0–10", input.score)));
  }

  let mut next = student.clone();
  next.grades.push(Grade {
    entry_id:    EntryId::next(&student.grades, now),
    subject:     input.subject.trim().to_string(),
    term:        input.term.trim().to_string(),
    score:       input.score,
    recorded_on: now.date_naive(),
  });
  Ok(next)
}

pub fn add_attendance(
  student: &Student,
  input: AttendanceInput,
  now: DateTime<Utc>,
) -> Result<Student> {
  let mut next = student.clone();
  next.attendance.push(AttendanceRecord {
    entry_id: EntryId::next(&student.attendance, now),
    date:     input.date,
    mark:     input.mark,
    note:     input.note.filter(|n| !n.trim().is_empty()),
  });
  Ok(next)
}

pub fn add_occurrence(
  student: &Student,
  input: OccurrenceInput,
  now: DateTime<Utc>,
) -> Result<Student> {
  require("kind", &input.kind)?;
  require("description", &input.description)?;

  let mut next = student.clone();
  next.occurrences.push(Occurrence {
    entry_id:    EntryId::next(&student.occurrences, now),
    date:        input.date,
    kind:        input.kind,
    description: input.description,
    reported_by: input.reported_by.filter(|r| !r.trim().is_empty()),
  });
  Ok(next)
}

pub fn add_document(
  student: &Student,
  input: DocumentInput,
  now: DateTime<Utc>,
) -> Result<Student> {
  require("name", &input.name)?;
  require("reference", &input.reference)?;

  let mut next = student.clone();
  next.documents.push(Document {
    entry_id:    EntryId::next(&student.documents, now),
    name:        input.name,
    kind:        input.kind,
    reference:   input.reference,
    uploaded_on: now.date_naive(),
  });
  Ok(next)
}

pub fn add_communication(
  student: &Student,
  input: CommunicationInput,
  now: DateTime<Utc>,
) -> Result<Student> {
  require("subject", &input.subject)?;

  let mut next = student.clone();
  next.communications.push(CommunicationEntry {
    entry_id: EntryId::next(&student.communications, now),
    sent_at:  now,
    channel:  input.channel,
    subject:  input.subject,
    message:  input.message,
  });
  Ok(next)
}

/// Append an agenda entry, stamped `now` and not yet delivered, then re-sort
/// the whole agenda. Entry dates come from the user, so a plain prepend would
/// not keep the order.
pub fn add_agenda_entry(
  student: &Student,
  input: AgendaInput,
  now: DateTime<Utc>,
) -> Result<Student> {
  require("title", &input.title)?;

  let mut next = student.clone();
  next.agenda.push(AgendaEntry {
    entry_id:   EntryId::next(&student.agenda, now),
    date:       input.date,
    created_at: now,
    title:      input.title,
    message:    input.message,
    delivered:  false,
  });
  sort_agenda(&mut next.agenda);
  Ok(next)
}

/// Mark one agenda entry as delivered to the family.
pub fn mark_agenda_delivered(student: &Student, entry_id: EntryId) -> Result<Student> {
  let mut next = student.clone();
  let entry = next
    .agenda
    .iter_mut()
    .find(|e| e.entry_id == entry_id)
    .ok_or_else(|| Error::invalid("agenda entry", format!("no entry {entry_id}")))?;
  entry.delivered = true;
  Ok(next)
}

/// Most recent entry date first; ties go to the most recently created entry.
pub fn sort_agenda(entries: &mut [AgendaEntry]) {
  entries.sort_by(|a, b| {
    b.date
      .cmp(&a.date)
      .then_with(|| b.created_at.cmp(&a.created_at))
      .then_with(|| b.entry_id.cmp(&a.entry_id))
  });
}

// ─── Avatar ──────────────────────────────────────────────────────────────────

/// Media type of a supported image, sniffed from its leading bytes.
pub fn sniff_image_type(bytes: &[u8]) -> Option<&'static str> {
  if bytes.starts_with(b"\x89PNG\r\n\x1a\n") {
    Some("image/png")
  } else if bytes.starts_with(&[0xFF, 0xD8, 0xFF]) {
    Some("image/jpeg")
  } else if bytes.starts_with(b"GIF87a") || bytes.starts_with(b"GIF89a") {
    Some("image/gif")
  } else if bytes.len() >= 12 && &bytes[..4] == b"RIFF" && &bytes[8..12] == b"WEBP" {
    Some("image/webp")
  } else {
    None
  }
}

/// Encode an image as an embeddable `data:` URL.
pub fn encode_avatar(bytes: &[u8]) -> Result<String> {
  let media_type = sniff_image_type(bytes).ok_or(Error::UnsupportedImage)?;
  Ok(format!("data:{media_type};base64,{}", B64.encode(bytes)))
}

/// Replace the avatar reference.
pub fn with_avatar(student: &Student, data_url: String) -> Student {
  let mut next = student.clone();
  next.avatar = Some(data_url);
  next
}

// ─── Tests ───────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
  use chrono::{Duration, TimeZone};

  use super::*;
  use crate::student::{NewStudent, Profile};

  fn student() -> Student {
    Student::from_new(
      NewStudent::new(Profile {
        name: "Bruno Lima".into(),
        class_name: "3º Ano B".into(),
        guardian_name: "Carla Lima".into(),
        guardian_contact: "carla@example.com".into(),
        ..Profile::default()
      }),
      t0(),
    )
  }

  fn t0() -> DateTime<Utc> { Utc.with_ymd_and_hms(2024, 5, 10, 12, 0, 0).unwrap() }

  fn day(d: u32) -> NaiveDate { NaiveDate::from_ymd_opt(2024, 5, d).unwrap() }

  fn agenda(date: NaiveDate, title: &str) -> AgendaInput {
    AgendaInput { date, title: title.into(), message: String::new() }
  }

  #[test]
  fn agenda_is_sorted_descending_regardless_of_insertion_order() {
    let s = student();
    let s = add_agenda_entry(&s, agenda(day(2), "A"), t0()).unwrap();
    let s = add_agenda_entry(&s, agenda(day(1), "B"), t0() + Duration::seconds(1)).unwrap();
    let titles: Vec<_> = s.agenda.iter().map(|e| e.title.as_str()).collect();
    assert_eq!(titles, ["A", "B"]);

    let s = student();
    let s = add_agenda_entry(&s, agenda(day(1), "B"), t0()).unwrap();
    let s = add_agenda_entry(&s, agenda(day(2), "A"), t0() + Duration::seconds(1)).unwrap();
    let titles: Vec<_> = s.agenda.iter().map(|e| e.title.as_str()).collect();
    assert_eq!(titles, ["A", "B"]);
  }

  #[test]
  fn agenda_entry_gets_stamp_id_and_undelivered_marker() {
    let s = add_agenda_entry(&student(), agenda(day(3), "Passeio"), t0()).unwrap();
    let e = &s.agenda[0];
    assert_eq!(e.created_at, t0());
    assert!(!e.delivered);
    assert_eq!(e.entry_id.get(), t0().timestamp_millis() as u64);
  }

  #[test]
  fn same_instant_entries_get_distinct_ids() {
    let s = add_agenda_entry(&student(), agenda(day(3), "x"), t0()).unwrap();
    let s = add_agenda_entry(&s, agenda(day(3), "y"), t0()).unwrap();
    assert_ne!(s.agenda[0].entry_id, s.agenda[1].entry_id);
    // Equal dates: the later insertion comes first.
    assert_eq!(s.agenda[0].title, "y");
  }

  #[test]
  fn editors_never_mutate_their_input() {
    let original = student();
    let before = original.clone();
    let _ = add_grade(
      &original,
      GradeInput { subject: "História".into(), term: "1º".into(), score: 9.0 },
      t0(),
    )
    .unwrap();
    let _ = add_agenda_entry(&original, agenda(day(1), "x"), t0()).unwrap();
    assert_eq!(original, before);
  }

  #[test]
  fn grade_outside_scale_is_rejected() {
    let err = add_grade(
      &student(),
      GradeInput { subject: "Artes".into(), term: "2º".into(), score: 11.0 },
      t0(),
    )
    .unwrap_err();
    assert!(err.is_validation());
    assert!(add_grade(
      &student(),
      GradeInput { subject: "Artes".into(), term: "2º".into(), score: f32::NAN },
      t0(),
    )
    .is_err());
  }

  #[test]
  fn blank_required_payload_fields_are_rejected() {
    let err = add_occurrence(
      &student(),
      OccurrenceInput {
        date:        day(4),
        kind:        "Atraso".into(),
        description: "  ".into(),
        reported_by: None,
      },
      t0(),
    )
    .unwrap_err();
    assert!(matches!(err, Error::InvalidEntry { field: "description", .. }));
  }

  #[test]
  fn entry_input_dispatches_to_matching_collection() {
    let input = EntryInput::Communication(CommunicationInput {
      channel: Channel::Whatsapp,
      subject: "Reunião de pais".into(),
      message: "Sexta às 18h".into(),
    });
    assert_eq!(input.collection(), NestedCollection::Communications);
    let s = input.apply(&student(), t0()).unwrap();
    assert_eq!(NestedCollection::Communications.len(&s), 1);
    assert_eq!(s.communications[0].sent_at, t0());
  }

  #[test]
  fn mark_delivered_flips_only_the_target() {
    let s = add_agenda_entry(&student(), agenda(day(1), "a"), t0()).unwrap();
    let s = add_agenda_entry(&s, agenda(day(2), "b"), t0()).unwrap();
    let target = s.agenda[1].entry_id;
    let s = mark_agenda_delivered(&s, target).unwrap();
    assert!(s.agenda[1].delivered);
    assert!(!s.agenda[0].delivered);
    assert!(mark_agenda_delivered(&s, EntryId::next(&s.agenda, t0())).is_err());
  }

  #[test]
  fn avatar_encodes_known_images_as_data_urls() {
    let png = b"\x89PNG\r\n\x1a\n\0\0\0\rIHDR";
    let url = encode_avatar(png).unwrap();
    assert!(url.starts_with("data:image/png;base64,"));
    let s = with_avatar(&student(), url.clone());
    assert_eq!(s.avatar.as_deref(), Some(url.as_str()));
  }

  #[test]
  fn avatar_rejects_unknown_payloads() {
    assert!(matches!(encode_avatar(b"%PDF-1.7"), Err(Error::UnsupportedImage)));
    assert!(matches!(encode_avatar(&[]), Err(Error::UnsupportedImage)));
    assert_eq!(sniff_image_type(b"RIFF\0\0\0\0WEBPVP8 "), Some("image/webp"));
  }
}
