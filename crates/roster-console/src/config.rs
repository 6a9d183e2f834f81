//! Console configuration: a TOML file layered under `ROSTER_*` environment
//! variables, with CLI flags applied on top by `main`.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use roster_core::{
  capability::{CapabilityRegistry, Role},
  settings::Settings,
};
use serde::Deserialize;

/// Shape of the merged configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct ConsoleConfig {
  /// SQLite file holding student aggregates.
  #[serde(default = "default_store_path")]
  pub store_path:   PathBuf,
  /// One of `admin`, `secretary`, `teacher`, `finance`.
  #[serde(default = "default_role")]
  pub role:         String,
  /// Explicit token list; replaces the role preset when present.
  #[serde(default)]
  pub capabilities: Option<Vec<String>>,
  #[serde(default)]
  pub class_names:  Vec<String>,
  #[serde(default)]
  pub statuses:     Vec<String>,
  #[serde(default = "default_log_file")]
  pub log_file:     PathBuf,
}

fn default_store_path() -> PathBuf { PathBuf::from("roster.db") }

fn default_role() -> String { Role::Secretary.to_string() }

fn default_log_file() -> PathBuf { PathBuf::from("roster.log") }

impl ConsoleConfig {
  /// Merge the optional config file with the environment. An explicitly
  /// named file must exist.
  pub fn load(path: Option<&Path>) -> Result<Self> {
    let mut builder = config::Config::builder();
    builder = match path {
      Some(p) => builder.add_source(config::File::from(p).required(true)),
      None => builder.add_source(config::File::with_name("roster").required(false)),
    };
    let settings = builder
      .add_source(
        config::Environment::with_prefix("ROSTER")
          .try_parsing(true)
          .list_separator(",")
          .with_list_parse_key("capabilities")
          .with_list_parse_key("class_names")
          .with_list_parse_key("statuses"),
      )
      .build()
      .context("failed to read configuration")?;

    settings
      .try_deserialize()
      .context("failed to deserialise ConsoleConfig")
  }

  /// Apply command-line flags. An explicit role replaces any configured
  /// capability list.
  pub fn with_overrides(
    mut self,
    store_path: Option<PathBuf>,
    role: Option<String>,
    log_file: Option<PathBuf>,
  ) -> Self {
    if let Some(store_path) = store_path {
      self.store_path = store_path;
    }
    if let Some(role) = role {
      self.role = role;
      self.capabilities = None;
    }
    if let Some(log_file) = log_file {
      self.log_file = log_file;
    }
    self
  }

  /// The actor's capability set for this session.
  pub fn registry(&self) -> Result<CapabilityRegistry> {
    if let Some(tokens) = &self.capabilities {
      return Ok(CapabilityRegistry::from_tokens(tokens));
    }
    let role: Role = self
      .role
      .parse()
      .with_context(|| format!("invalid role in configuration: {:?}", self.role))?;
    Ok(CapabilityRegistry::for_role(role))
  }

  pub fn settings(&self) -> Settings {
    Settings::from_raw(self.class_names.clone(), self.statuses.clone())
  }
}
