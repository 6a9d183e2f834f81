//! Navigation menu with per-destination capability guards.

use crate::{
  capability::{
    CapabilitySource, VIEW_COMMUNICATIONS, VIEW_DASHBOARD, VIEW_FINANCIAL,
    VIEW_REPORTS, VIEW_SETTINGS, VIEW_STAFF, VIEW_STUDENTS,
  },
  gate::Gate,
};

/// A top-level screen reachable from the navigation shell.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Destination {
  Dashboard,
  Students,
  Staff,
  Financial,
  Communications,
  Reports,
  Settings,
}

impl Destination {
  /// Menu order.
  pub const ALL: [Destination; 7] = [
    Self::Dashboard,
    Self::Students,
    Self::Staff,
    Self::Financial,
    Self::Communications,
    Self::Reports,
    Self::Settings,
  ];

  pub fn label(self) -> &'static str {
    match self {
      Self::Dashboard => "Painel",
      Self::Students => "Alunos",
      Self::Staff => "Funcionários",
      Self::Financial => "Financeiro",
      Self::Communications => "Comunicação",
      Self::Reports => "Relatórios",
      Self::Settings => "Configurações",
    }
  }

  pub fn required_capability(self) -> &'static str {
    match self {
      Self::Dashboard => VIEW_DASHBOARD,
      Self::Students => VIEW_STUDENTS,
      Self::Staff => VIEW_STAFF,
      Self::Financial => VIEW_FINANCIAL,
      Self::Communications => VIEW_COMMUNICATIONS,
      Self::Reports => VIEW_REPORTS,
      Self::Settings => VIEW_SETTINGS,
    }
  }
}

/// Destinations the actor may see, in menu order.
pub fn visible<C: CapabilitySource + ?Sized>(caps: &C) -> Vec<Destination> {
  Gate::new(caps).render_all(
    Destination::ALL
      .iter()
      .map(|d| (d.required_capability(), *d)),
  )
}

/// Resolve a navigation request. Returns `None` when the destination is not
/// permitted, whether it came from the menu, a shortcut or a deep link.
pub fn navigate<C: CapabilitySource + ?Sized>(
  caps: &C,
  destination: Destination,
) -> Option<Destination> {
  Gate::new(caps).render(destination.required_capability(), destination)
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::capability::{CapabilityRegistry, Role};

  #[test]
  fn admin_sees_full_menu_in_order() {
    let reg = CapabilityRegistry::for_role(Role::Admin);
    assert_eq!(visible(&reg), Destination::ALL.to_vec());
  }

  #[test]
  fn teacher_menu_hides_financial_and_settings() {
    let reg = CapabilityRegistry::for_role(Role::Teacher);
    assert_eq!(
      visible(&reg),
      vec![
        Destination::Dashboard,
        Destination::Students,
        Destination::Communications
      ]
    );
  }

  #[test]
  fn hidden_destination_is_unreachable_directly() {
    let reg = CapabilityRegistry::for_role(Role::Teacher);
    assert_eq!(navigate(&reg, Destination::Financial), None);
    assert_eq!(
      navigate(&reg, Destination::Students),
      Some(Destination::Students)
    );
  }
}
