//! One-line prompts for adding nested-collection entries and uploading a
//! photo. Entry fields are separated by `|`.

use anyhow::{Result, anyhow, bail};
use chrono::NaiveDate;
use roster_core::{
  editors::{
    AgendaInput, AttendanceInput, CommunicationInput, DocumentInput, EntryInput,
    GradeInput, NestedCollection, OccurrenceInput,
  },
  entry::{AttendanceMark, Channel},
};

/// What the prompt line is collecting.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PromptKind {
  Entry(NestedCollection),
  /// Path of an image file for the student's photo.
  Photo,
}

#[derive(Debug, Clone)]
pub struct Prompt {
  pub kind:   PromptKind,
  pub buffer: String,
}

impl Prompt {
  pub fn new(kind: PromptKind) -> Self { Self { kind, buffer: String::new() } }

  pub fn hint(&self) -> &'static str {
    match self.kind {
      PromptKind::Photo => "caminho da imagem (png, jpg, gif, webp)",
      PromptKind::Entry(c) => entry_hint(c),
    }
  }
}

pub fn entry_hint(collection: NestedCollection) -> &'static str {
  match collection {
    NestedCollection::Grades => "disciplina | período | nota",
    NestedCollection::Attendance => "data | presente/falta/atraso/justificada [| obs]",
    NestedCollection::Occurrences => "data | tipo | descrição [| registrado por]",
    NestedCollection::Documents => "nome | tipo | referência",
    NestedCollection::Agenda => "data | título [| mensagem]",
    NestedCollection::Communications => "canal | assunto [| mensagem]",
  }
}

/// Accepts `dd/mm/yyyy` or ISO `yyyy-mm-dd`.
pub fn parse_date(s: &str) -> Result<NaiveDate> {
  let s = s.trim();
  NaiveDate::parse_from_str(s, "%d/%m/%Y")
    .or_else(|_| NaiveDate::parse_from_str(s, "%Y-%m-%d"))
    .map_err(|_| anyhow!("data inválida: {s:?}"))
}

fn parse_score(s: &str) -> Result<f32> {
  s.trim()
    .replace(',', ".")
    .parse::<f32>()
    .map_err(|_| anyhow!("nota inválida: {:?}", s.trim()))
}

fn parse_mark(s: &str) -> Result<AttendanceMark> {
  Ok(match s.trim().to_lowercase().as_str() {
    "p" | "presente" | "present" => AttendanceMark::Present,
    "f" | "falta" | "absent" => AttendanceMark::Absent,
    "a" | "atraso" | "late" => AttendanceMark::Late,
    "j" | "justificada" | "excused" => AttendanceMark::Excused,
    other => bail!("marcação desconhecida: {other:?}"),
  })
}

fn parse_channel(s: &str) -> Result<Channel> {
  Ok(match s.trim().to_lowercase().as_str() {
    "email" | "e-mail" => Channel::Email,
    "telefone" | "phone" => Channel::Phone,
    "whatsapp" => Channel::Whatsapp,
    "carta" | "letter" => Channel::Letter,
    "reunião" | "reuniao" | "meeting" => Channel::Meeting,
    other => bail!("canal desconhecido: {other:?}"),
  })
}

fn optional(parts: &[&str], i: usize) -> Option<String> {
  parts
    .get(i)
    .map(|p| p.trim().to_string())
    .filter(|p| !p.is_empty())
}

/// Parse a prompt line into the editor payload for `collection`.
pub fn parse_entry(collection: NestedCollection, line: &str) -> Result<EntryInput> {
  let parts: Vec<&str> = line.split('|').map(str::trim).collect();
  let need = |n: usize| -> Result<()> {
    if parts.len() < n {
      bail!("esperado: {}", entry_hint(collection));
    }
    Ok(())
  };

  Ok(match collection {
    NestedCollection::Grades => {
      need(3)?;
      EntryInput::Grade(GradeInput {
        subject: parts[0].to_string(),
        term:    parts[1].to_string(),
        score:   parse_score(parts[2])?,
      })
    }
    NestedCollection::Attendance => {
      need(2)?;
      EntryInput::Attendance(AttendanceInput {
        date: parse_date(parts[0])?,
        mark: parse_mark(parts[1])?,
        note: optional(&parts, 2),
      })
    }
    NestedCollection::Occurrences => {
      need(3)?;
      EntryInput::Occurrence(OccurrenceInput {
        date:        parse_date(parts[0])?,
        kind:        parts[1].to_string(),
        description: parts[2].to_string(),
        reported_by: optional(&parts, 3),
      })
    }
    NestedCollection::Documents => {
      need(3)?;
      EntryInput::Document(DocumentInput {
        name:      parts[0].to_string(),
        kind:      parts[1].to_string(),
        reference: parts[2].to_string(),
      })
    }
    NestedCollection::Agenda => {
      need(2)?;
      EntryInput::Agenda(AgendaInput {
        date:    parse_date(parts[0])?,
        title:   parts[1].to_string(),
        message: optional(&parts, 2).unwrap_or_default(),
      })
    }
    NestedCollection::Communications => {
      need(2)?;
      EntryInput::Communication(CommunicationInput {
        channel: parse_channel(parts[0])?,
        subject: parts[1].to_string(),
        message: optional(&parts, 2).unwrap_or_default(),
      })
    }
  })
}
