//! Read-only school settings: valid class names and statuses.
//!
//! Loaded once at session start and shared immutably with the views that
//! populate filters and forms.

use serde::{Deserialize, Serialize};

use crate::student::StudentStatus;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Settings {
  pub class_names: Vec<String>,
  pub statuses:    Vec<StudentStatus>,
}

impl Default for Settings {
  fn default() -> Self {
    Self {
      class_names: ["1º Ano A", "2º Ano A", "3º Ano A", "4º Ano A", "5º Ano A"]
        .into_iter()
        .map(String::from)
        .collect(),
      statuses:    vec![
        StudentStatus::Active,
        StudentStatus::Inactive,
        StudentStatus::Transferred,
        StudentStatus::Graduated,
      ],
    }
  }
}

impl Settings {
  /// Build from raw strings as found in a config file. Blank and duplicate
  /// entries are dropped; an empty list falls back to the default.
  pub fn from_raw(class_names: Vec<String>, statuses: Vec<String>) -> Self {
    let defaults = Self::default();

    let mut classes: Vec<String> = Vec::new();
    for name in class_names.iter().map(|c| c.trim()).filter(|c| !c.is_empty()) {
      if !classes.iter().any(|c| c == name) {
        classes.push(name.to_string());
      }
    }

    let mut parsed: Vec<StudentStatus> = Vec::new();
    for raw in statuses.iter().filter(|s| !s.trim().is_empty()) {
      let Ok(status) = raw.parse::<StudentStatus>();
      if !parsed.contains(&status) {
        parsed.push(status);
      }
    }

    Self {
      class_names: if classes.is_empty() { defaults.class_names } else { classes },
      statuses:    if parsed.is_empty() { defaults.statuses } else { parsed },
    }
  }

  /// The class after `current` in settings order, wrapping around. Unknown or
  /// empty input starts at the first class.
  pub fn next_class(&self, current: &str) -> Option<&str> {
    cycle(&self.class_names, |c| c == current).map(String::as_str)
  }

  /// The status after `current` in settings order, wrapping around.
  pub fn next_status(&self, current: &StudentStatus) -> Option<&StudentStatus> {
    cycle(&self.statuses, |s| s == current)
  }
}

fn cycle<T>(items: &[T], is_current: impl Fn(&T) -> bool) -> Option<&T> {
  let next = match items.iter().position(is_current) {
    Some(i) => (i + 1) % items.len(),
    None => 0,
  };
  items.get(next)
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn from_raw_dedups_and_parses() {
    let s = Settings::from_raw(
      vec!["6º Ano".into(), " ".into(), "6º Ano".into(), "7º Ano".into()],
      vec!["active".into(), "Trancado".into(), "ativo".into()],
    );
    assert_eq!(s.class_names, vec!["6º Ano", "7º Ano"]);
    assert_eq!(
      s.statuses,
      vec![StudentStatus::Active, StudentStatus::Custom("Trancado".into())]
    );
  }

  #[test]
  fn empty_raw_lists_fall_back_to_defaults() {
    assert_eq!(Settings::from_raw(Vec::new(), Vec::new()), Settings::default());
  }

  #[test]
  fn cycling_wraps_and_starts_from_first_on_unknown() {
    let s = Settings::from_raw(vec!["A".into(), "B".into()], Vec::new());
    assert_eq!(s.next_class("A"), Some("B"));
    assert_eq!(s.next_class("B"), Some("A"));
    assert_eq!(s.next_class(""), Some("A"));
    assert_eq!(
      s.next_status(&StudentStatus::Graduated),
      Some(&StudentStatus::Active)
    );
  }
}
