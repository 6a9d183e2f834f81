//! Text buffers behind the add/edit student form.

use anyhow::Result;
use roster_core::{
  settings::Settings,
  student::{NewStudent, Profile, Student, StudentStatus},
};

use crate::prompt::parse_date;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldKey {
  Name,
  ClassName,
  GuardianName,
  GuardianContact,
  Cpf,
  Address,
  Email,
  Phone,
  EnrollmentDate,
  MedicalNotes,
  Status,
}

impl FieldKey {
  pub fn label(self) -> &'static str {
    match self {
      Self::Name => "Nome",
      Self::ClassName => "Turma",
      Self::GuardianName => "Responsável",
      Self::GuardianContact => "Contato do responsável",
      Self::Cpf => "CPF",
      Self::Address => "Endereço",
      Self::Email => "E-mail",
      Self::Phone => "Telefone",
      Self::EnrollmentDate => "Data de matrícula",
      Self::MedicalNotes => "Observações médicas",
      Self::Status => "Situação",
    }
  }

  pub fn is_required(self) -> bool {
    matches!(
      self,
      Self::Name | Self::ClassName | Self::GuardianName | Self::GuardianContact
    )
  }

  /// Choice fields cycle through settings values instead of taking text.
  pub fn is_choice(self) -> bool { matches!(self, Self::ClassName | Self::Status) }
}

const CREATE_FIELDS: &[FieldKey] = &[
  FieldKey::Name,
  FieldKey::ClassName,
  FieldKey::GuardianName,
  FieldKey::GuardianContact,
  FieldKey::Cpf,
  FieldKey::Address,
  FieldKey::Email,
  FieldKey::Phone,
  FieldKey::EnrollmentDate,
  FieldKey::MedicalNotes,
];

const EDIT_FIELDS: &[FieldKey] = &[
  FieldKey::Name,
  FieldKey::ClassName,
  FieldKey::GuardianName,
  FieldKey::GuardianContact,
  FieldKey::Cpf,
  FieldKey::Address,
  FieldKey::Email,
  FieldKey::Phone,
  FieldKey::EnrollmentDate,
  FieldKey::MedicalNotes,
  FieldKey::Status,
];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FormMode {
  Create,
  Edit,
}

#[derive(Debug, Clone)]
pub struct StudentForm {
  pub mode:   FormMode,
  pub cursor: usize,
  profile:    Profile,
  date:       String,
  status:     StudentStatus,
}

impl StudentForm {
  /// Empty form for a new student; the class starts at the first setting.
  pub fn blank(settings: &Settings) -> Self {
    Self {
      mode:    FormMode::Create,
      cursor:  0,
      profile: Profile {
        class_name: settings.class_names.first().cloned().unwrap_or_default(),
        ..Profile::default()
      },
      date:    String::new(),
      status:  StudentStatus::default(),
    }
  }

  pub fn from_student(student: &Student) -> Self {
    Self {
      mode:    FormMode::Edit,
      cursor:  0,
      profile: student.profile.clone(),
      date:    student.enrollment_date.format("%d/%m/%Y").to_string(),
      status:  student.status.clone(),
    }
  }

  pub fn fields(&self) -> &'static [FieldKey] {
    match self.mode {
      FormMode::Create => CREATE_FIELDS,
      FormMode::Edit => EDIT_FIELDS,
    }
  }

  pub fn current(&self) -> FieldKey { self.fields()[self.cursor] }

  pub fn next(&mut self) { self.cursor = (self.cursor + 1) % self.fields().len(); }

  pub fn prev(&mut self) {
    let len = self.fields().len();
    self.cursor = (self.cursor + len - 1) % len;
  }

  /// Display value of a field.
  pub fn value(&self, key: FieldKey) -> &str {
    match key {
      FieldKey::EnrollmentDate => &self.date,
      FieldKey::Status => self.status.label(),
      _ => self.text(key).map(String::as_str).unwrap_or_default(),
    }
  }

  fn text(&self, key: FieldKey) -> Option<&String> {
    let p = &self.profile;
    Some(match key {
      FieldKey::Name => &p.name,
      FieldKey::ClassName => &p.class_name,
      FieldKey::GuardianName => &p.guardian_name,
      FieldKey::GuardianContact => &p.guardian_contact,
      FieldKey::Cpf => p.cpf.as_ref()?,
      FieldKey::Address => p.address.as_ref()?,
      FieldKey::Email => p.email.as_ref()?,
      FieldKey::Phone => p.phone.as_ref()?,
      FieldKey::MedicalNotes => p.medical_notes.as_ref()?,
      FieldKey::EnrollmentDate | FieldKey::Status => return None,
    })
  }

  fn buffer_mut(&mut self, key: FieldKey) -> Option<&mut String> {
    let p = &mut self.profile;
    let slot = match key {
      FieldKey::Name => return Some(&mut p.name),
      FieldKey::GuardianName => return Some(&mut p.guardian_name),
      FieldKey::GuardianContact => return Some(&mut p.guardian_contact),
      FieldKey::EnrollmentDate => return Some(&mut self.date),
      FieldKey::Cpf => &mut p.cpf,
      FieldKey::Address => &mut p.address,
      FieldKey::Email => &mut p.email,
      FieldKey::Phone => &mut p.phone,
      FieldKey::MedicalNotes => &mut p.medical_notes,
      FieldKey::ClassName | FieldKey::Status => return None,
    };
    Some(slot.get_or_insert_with(String::new))
  }

  pub fn input(&mut self, c: char) {
    if let Some(buf) = self.buffer_mut(self.current()) {
      buf.push(c);
    }
  }

  pub fn backspace(&mut self) {
    if let Some(buf) = self.buffer_mut(self.current()) {
      buf.pop();
    }
  }

  /// Advance a choice field to the next value from settings.
  pub fn cycle_choice(&mut self, settings: &Settings) {
    match self.current() {
      FieldKey::ClassName => {
        if let Some(next) = settings.next_class(&self.profile.class_name) {
          self.profile.class_name = next.to_string();
        }
      }
      FieldKey::Status => {
        if let Some(next) = settings.next_status(&self.status) {
          self.status = next.clone();
        }
      }
      _ => {}
    }
  }

  /// Profile with optional fields trimmed and blanks turned into `None`.
  fn cleaned_profile(&self) -> Profile {
    let clean = |v: &Option<String>| {
      v.as_deref()
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(String::from)
    };
    let p = &self.profile;
    Profile {
      name:             p.name.trim().to_string(),
      class_name:       p.class_name.clone(),
      guardian_name:    p.guardian_name.trim().to_string(),
      guardian_contact: p.guardian_contact.trim().to_string(),
      cpf:              clean(&p.cpf),
      address:          clean(&p.address),
      email:            clean(&p.email),
      phone:            clean(&p.phone),
      medical_notes:    clean(&p.medical_notes),
    }
  }

  /// Input for the store's create; an empty date defaults to today.
  pub fn to_new_student(&self) -> Result<NewStudent> {
    let enrollment_date = if self.date.trim().is_empty() {
      None
    } else {
      Some(parse_date(&self.date)?)
    };
    Ok(NewStudent { profile: self.cleaned_profile(), enrollment_date })
  }

  /// Write the form into an edit draft.
  pub fn apply_to(&self, draft: &mut Student) -> Result<()> {
    if !self.date.trim().is_empty() {
      draft.enrollment_date = parse_date(&self.date)?;
    }
    draft.profile = self.cleaned_profile();
    draft.status = self.status.clone();
    Ok(())
  }
}
