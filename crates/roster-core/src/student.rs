//! The student aggregate: a profile plus its owned nested collections.
//!
//! A [`Student`] is stored and updated as one unit. Its nested collections
//! have no identity outside the aggregate and no independent lifecycle.

use std::{fmt, str::FromStr};

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{
  Error, Result,
  entry::{AgendaEntry, AttendanceRecord, CommunicationEntry, Document, Grade, Occurrence},
};

// ─── Status ──────────────────────────────────────────────────────────────────

/// Enrolment status. Statuses beyond the built-in ones come from settings.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StudentStatus {
  #[default]
  Active,
  Inactive,
  Transferred,
  Graduated,
  Custom(String),
}

impl StudentStatus {
  pub fn label(&self) -> &str {
    match self {
      Self::Active => "Ativo",
      Self::Inactive => "Inativo",
      Self::Transferred => "Transferido",
      Self::Graduated => "Formado",
      Self::Custom(s) => s,
    }
  }
}

impl fmt::Display for StudentStatus {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result { f.write_str(self.label()) }
}

impl FromStr for StudentStatus {
  type Err = std::convert::Infallible;

  /// Built-in names are matched case-insensitively; anything else becomes
  /// [`StudentStatus::Custom`].
  fn from_str(s: &str) -> Result<Self, Self::Err> {
    let trimmed = s.trim();
    Ok(match trimmed.to_lowercase().as_str() {
      "active" | "ativo" => Self::Active,
      "inactive" | "inativo" => Self::Inactive,
      "transferred" | "transferido" => Self::Transferred,
      "graduated" | "formado" => Self::Graduated,
      _ => Self::Custom(trimmed.to_string()),
    })
  }
}

// ─── Profile ─────────────────────────────────────────────────────────────────

/// A profile field that must be present on create and on edit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RequiredField {
  Name,
  ClassName,
  GuardianName,
  GuardianContact,
}

impl fmt::Display for RequiredField {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.write_str(match self {
      Self::Name => "name",
      Self::ClassName => "class",
      Self::GuardianName => "guardian name",
      Self::GuardianContact => "guardian contact",
    })
  }
}

/// The user-editable profile fields of a student.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Profile {
  pub name:             String,
  pub class_name:       String,
  pub guardian_name:    String,
  pub guardian_contact: String,
  pub cpf:              Option<String>,
  pub address:          Option<String>,
  pub email:            Option<String>,
  pub phone:            Option<String>,
  pub medical_notes:    Option<String>,
}

impl Profile {
  /// Required fields that are empty or whitespace-only, in form order.
  pub fn missing_fields(&self) -> Vec<RequiredField> {
    [
      (RequiredField::Name, &self.name),
      (RequiredField::ClassName, &self.class_name),
      (RequiredField::GuardianName, &self.guardian_name),
      (RequiredField::GuardianContact, &self.guardian_contact),
    ]
    .into_iter()
    .filter(|(_, value)| value.trim().is_empty())
    .map(|(field, _)| field)
    .collect()
  }

  pub fn validate(&self) -> Result<()> {
    let missing = self.missing_fields();
    if missing.is_empty() { Ok(()) } else { Err(Error::MissingFields(missing)) }
  }
}

// ─── NewStudent ──────────────────────────────────────────────────────────────

/// Input to [`crate::store::StudentStore::create`]. The id, status and
/// nested collections are always assigned by the store.
#[derive(Debug, Clone, Default)]
pub struct NewStudent {
  pub profile:         Profile,
  /// Defaults to the creation date.
  pub enrollment_date: Option<NaiveDate>,
}

impl NewStudent {
  pub fn new(profile: Profile) -> Self {
    Self { profile, enrollment_date: None }
  }
}

// ─── Student ─────────────────────────────────────────────────────────────────

/// The student aggregate. The id and creation stamp are fixed at creation and
/// have no setters.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Student {
  student_id:          Uuid,
  created_at:          DateTime<Utc>,
  #[serde(flatten)]
  pub profile:         Profile,
  pub enrollment_date: NaiveDate,
  /// `data:` URL of the profile photo.
  pub avatar:          Option<String>,
  pub status:          StudentStatus,

  #[serde(default)]
  pub grades:         Vec<Grade>,
  #[serde(default)]
  pub attendance:     Vec<AttendanceRecord>,
  #[serde(default)]
  pub occurrences:    Vec<Occurrence>,
  #[serde(default)]
  pub documents:      Vec<Document>,
  /// Always sorted by entry date, most recent first.
  #[serde(default)]
  pub agenda:         Vec<AgendaEntry>,
  #[serde(default)]
  pub communications: Vec<CommunicationEntry>,
}

impl Student {
  /// A fresh aggregate: default status, every nested collection empty.
  pub(crate) fn from_new(input: NewStudent, now: DateTime<Utc>) -> Self {
    Self {
      student_id:      Uuid::new_v4(),
      created_at:      now,
      enrollment_date: input.enrollment_date.unwrap_or_else(|| now.date_naive()),
      profile:         input.profile,
      avatar:          None,
      status:          StudentStatus::default(),
      grades:          Vec::new(),
      attendance:      Vec::new(),
      occurrences:     Vec::new(),
      documents:       Vec::new(),
      agenda:          Vec::new(),
      communications:  Vec::new(),
    }
  }

  pub fn id(&self) -> Uuid { self.student_id }

  pub fn created_at(&self) -> DateTime<Utc> { self.created_at }

  pub fn name(&self) -> &str { &self.profile.name }

  pub fn class_name(&self) -> &str { &self.profile.class_name }

  pub fn validate(&self) -> Result<()> { self.profile.validate() }
}

#[cfg(test)]
mod tests {
  use super::*;

  fn profile() -> Profile {
    Profile {
      name: "Ana Souza".into(),
      class_name: "5º Ano A".into(),
      guardian_name: "Marta Souza".into(),
      guardian_contact: "(11) 98888-0000".into(),
      ..Profile::default()
    }
  }

  #[test]
  fn complete_profile_validates() {
    assert!(profile().validate().is_ok());
  }

  #[test]
  fn whitespace_only_fields_count_as_missing() {
    let mut p = profile();
    p.class_name = "   ".into();
    p.guardian_contact = String::new();
    assert_eq!(
      p.missing_fields(),
      vec![RequiredField::ClassName, RequiredField::GuardianContact]
    );
    let err = p.validate().unwrap_err();
    assert!(err.is_validation());
    assert_eq!(err.to_string(), "missing required fields: class, guardian contact");
  }

  #[test]
  fn new_student_defaults() {
    let now = Utc::now();
    let s = Student::from_new(NewStudent::new(profile()), now);
    assert_eq!(s.status, StudentStatus::Active);
    assert_eq!(s.enrollment_date, now.date_naive());
    assert!(s.grades.is_empty() && s.agenda.is_empty() && s.communications.is_empty());
    assert!(s.avatar.is_none());
  }

  #[test]
  fn status_parse_falls_back_to_custom() {
    assert_eq!("Ativo".parse::<StudentStatus>().unwrap(), StudentStatus::Active);
    assert_eq!(
      "inactive".parse::<StudentStatus>().unwrap(),
      StudentStatus::Inactive
    );
    assert_eq!(
      " Trancado ".parse::<StudentStatus>().unwrap(),
      StudentStatus::Custom("Trancado".into())
    );
  }

  #[test]
  fn serde_roundtrip_keeps_identity() {
    let s = Student::from_new(NewStudent::new(profile()), Utc::now());
    let json = serde_json::to_string(&s).unwrap();
    let back: Student = serde_json::from_str(&json).unwrap();
    assert_eq!(back, s);
    assert_eq!(back.id(), s.id());
  }
}
