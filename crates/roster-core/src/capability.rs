//! Capability tokens and the per-session [`CapabilityRegistry`].
//!
//! A capability is an opaque string naming one grantable view or action. The
//! registry is assembled once at session start, from a [`Role`] preset or an
//! explicit token list, and is read-only afterwards. Queries are exact-match:
//! an unknown or misspelled token is simply not held.

use std::{collections::BTreeSet, fmt, str::FromStr};

use serde::{Deserialize, Serialize};

use crate::Error;

// ─── Token vocabulary ────────────────────────────────────────────────────────

pub const VIEW_DASHBOARD: &str = "view_dashboard";
pub const VIEW_STUDENTS: &str = "view_students";
pub const CREATE_STUDENTS: &str = "create_students";
pub const EDIT_STUDENTS: &str = "edit_students";
pub const VIEW_STAFF: &str = "view_staff";
pub const EDIT_STAFF: &str = "edit_staff";
pub const VIEW_FINANCIAL: &str = "view_financial";
pub const EDIT_FINANCIAL: &str = "edit_financial";
pub const VIEW_COMMUNICATIONS: &str = "view_communications";
pub const EDIT_COMMUNICATIONS: &str = "edit_communications";
pub const VIEW_REPORTS: &str = "view_reports";
pub const VIEW_SETTINGS: &str = "view_settings";
pub const EDIT_SETTINGS: &str = "edit_settings";

/// Every token the console knows about.
pub const ALL_CAPABILITIES: &[&str] = &[
  VIEW_DASHBOARD,
  VIEW_STUDENTS,
  CREATE_STUDENTS,
  EDIT_STUDENTS,
  VIEW_STAFF,
  EDIT_STAFF,
  VIEW_FINANCIAL,
  EDIT_FINANCIAL,
  VIEW_COMMUNICATIONS,
  EDIT_COMMUNICATIONS,
  VIEW_REPORTS,
  VIEW_SETTINGS,
  EDIT_SETTINGS,
];

const SECRETARY: &[&str] = &[
  VIEW_DASHBOARD,
  VIEW_STUDENTS,
  CREATE_STUDENTS,
  EDIT_STUDENTS,
  VIEW_STAFF,
  VIEW_COMMUNICATIONS,
  EDIT_COMMUNICATIONS,
  VIEW_REPORTS,
];

const TEACHER: &[&str] = &[
  VIEW_DASHBOARD,
  VIEW_STUDENTS,
  EDIT_STUDENTS,
  VIEW_COMMUNICATIONS,
];

const FINANCE: &[&str] = &[
  VIEW_DASHBOARD,
  VIEW_STUDENTS,
  VIEW_FINANCIAL,
  EDIT_FINANCIAL,
  VIEW_REPORTS,
];

// ─── Roles ───────────────────────────────────────────────────────────────────

/// The actor's role; each maps to a fixed capability preset.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
  Admin,
  Secretary,
  Teacher,
  Finance,
}

impl Role {
  pub fn capabilities(self) -> &'static [&'static str] {
    match self {
      Self::Admin => ALL_CAPABILITIES,
      Self::Secretary => SECRETARY,
      Self::Teacher => TEACHER,
      Self::Finance => FINANCE,
    }
  }

  pub fn as_str(self) -> &'static str {
    match self {
      Self::Admin => "admin",
      Self::Secretary => "secretary",
      Self::Teacher => "teacher",
      Self::Finance => "finance",
    }
  }
}

impl fmt::Display for Role {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.write_str(self.as_str())
  }
}

impl FromStr for Role {
  type Err = Error;

  fn from_str(s: &str) -> Result<Self, Self::Err> {
    match s.trim() {
      "admin" => Ok(Self::Admin),
      "secretary" => Ok(Self::Secretary),
      "teacher" => Ok(Self::Teacher),
      "finance" => Ok(Self::Finance),
      other => Err(Error::UnknownRole(other.to_string())),
    }
  }
}

// ─── Registry ────────────────────────────────────────────────────────────────

/// Anything that can answer "does the current actor hold this token?".
///
/// Implementations must fail closed: a token they do not recognise is `false`.
pub trait CapabilitySource {
  fn has_capability(&self, token: &str) -> bool;
}

/// Snapshot of the capabilities granted to the current actor.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CapabilityRegistry {
  granted: BTreeSet<String>,
}

impl CapabilityRegistry {
  /// Registry holding exactly the preset for `role`.
  pub fn for_role(role: Role) -> Self {
    Self::from_tokens(role.capabilities().iter().copied())
  }

  /// Registry holding an explicit token list. Surrounding whitespace is
  /// trimmed and blank entries are dropped; nothing else is normalised.
  pub fn from_tokens<I, T>(tokens: I) -> Self
  where
    I: IntoIterator<Item = T>,
    T: AsRef<str>,
  {
    let granted = tokens
      .into_iter()
      .filter_map(|t| {
        let t = t.as_ref().trim();
        (!t.is_empty()).then(|| t.to_string())
      })
      .collect();
    Self { granted }
  }

  pub fn has_capability(&self, token: &str) -> bool {
    self.granted.contains(token)
  }

  /// Granted tokens in lexical order.
  pub fn tokens(&self) -> impl Iterator<Item = &str> {
    self.granted.iter().map(String::as_str)
  }

  pub fn is_empty(&self) -> bool { self.granted.is_empty() }
}

impl CapabilitySource for CapabilityRegistry {
  fn has_capability(&self, token: &str) -> bool {
    CapabilityRegistry::has_capability(self, token)
  }
}

impl<C: CapabilitySource + ?Sized> CapabilitySource for std::sync::Arc<C> {
  fn has_capability(&self, token: &str) -> bool { (**self).has_capability(token) }
}

// ─── Tests ───────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn admin_holds_every_token() {
    let reg = CapabilityRegistry::for_role(Role::Admin);
    assert!(ALL_CAPABILITIES.iter().all(|t| reg.has_capability(t)));
  }

  #[test]
  fn teacher_cannot_create_students() {
    let reg = CapabilityRegistry::for_role(Role::Teacher);
    assert!(reg.has_capability(VIEW_STUDENTS));
    assert!(reg.has_capability(EDIT_STUDENTS));
    assert!(!reg.has_capability(CREATE_STUDENTS));
    assert!(!reg.has_capability(VIEW_FINANCIAL));
  }

  #[test]
  fn unknown_and_misspelled_tokens_fail_closed() {
    let reg = CapabilityRegistry::for_role(Role::Admin);
    assert!(!reg.has_capability("view_student"));
    assert!(!reg.has_capability("VIEW_STUDENTS"));
    assert!(!reg.has_capability(" view_students"));
    assert!(!reg.has_capability(""));
  }

  #[test]
  fn explicit_tokens_are_trimmed_and_blank_entries_dropped() {
    let reg = CapabilityRegistry::from_tokens([" view_students ", "", "  "]);
    assert!(reg.has_capability(VIEW_STUDENTS));
    assert_eq!(reg.tokens().count(), 1);
  }

  #[test]
  fn empty_registry_grants_nothing() {
    let reg = CapabilityRegistry::default();
    assert!(reg.is_empty());
    assert!(ALL_CAPABILITIES.iter().all(|t| !reg.has_capability(t)));
  }

  #[test]
  fn role_parse_rejects_unknown_names() {
    assert_eq!("finance".parse::<Role>().unwrap(), Role::Finance);
    assert!(matches!(
      "principal".parse::<Role>(),
      Err(Error::UnknownRole(r)) if r == "principal"
    ));
  }
}
