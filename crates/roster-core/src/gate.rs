//! The permission gate: render content only when a capability is held.
//!
//! On a missing capability the gate yields `None`, never a disabled
//! placeholder, so a withheld control is indistinguishable from one that was
//! never built. The gate wraps any content type and must be applied at every
//! point of action, not only in navigation.

use crate::capability::{CapabilityRegistry, CapabilitySource};

/// A borrowed view over the current actor's capabilities.
pub struct Gate<'a, C: CapabilitySource + ?Sized = CapabilityRegistry> {
  caps: &'a C,
}

impl<C: CapabilitySource + ?Sized> Clone for Gate<'_, C> {
  fn clone(&self) -> Self { *self }
}

impl<C: CapabilitySource + ?Sized> Copy for Gate<'_, C> {}

impl<'a, C: CapabilitySource + ?Sized> Gate<'a, C> {
  pub fn new(caps: &'a C) -> Self { Self { caps } }

  pub fn allows(&self, capability: &str) -> bool {
    self.caps.has_capability(capability)
  }

  /// Return `content` unchanged if `capability` is held, otherwise nothing.
  pub fn render<T>(&self, capability: &str, content: T) -> Option<T> {
    self.allows(capability).then_some(content)
  }

  /// Like [`Gate::render`], but only builds the content when it will be shown.
  pub fn render_with<T>(&self, capability: &str, build: impl FnOnce() -> T) -> Option<T> {
    self.allows(capability).then(build)
  }

  /// Keep only the items whose capability is held, preserving order.
  pub fn render_all<'t, T, I>(&self, items: I) -> Vec<T>
  where
    I: IntoIterator<Item = (&'t str, T)>,
  {
    items
      .into_iter()
      .filter_map(|(capability, content)| self.render(capability, content))
      .collect()
  }
}
