//! `roster`: terminal console for the school student roster.
//!
//! # Usage
//!
//! ```
//! roster --store school.db --role secretary
//! roster --config ~/.config/roster/roster.toml --student <uuid>
//! ```

mod app;
mod config;
mod form;
mod prompt;
mod ui;

use std::{fs::OpenOptions, io, path::PathBuf, sync::Arc, time::Duration};

use anyhow::{Context, Result};
use app::App;
use clap::Parser;
use crossterm::{
  event::{self, Event},
  execute,
  terminal::{EnterAlternateScreen, LeaveAlternateScreen, disable_raw_mode, enable_raw_mode},
};
use ratatui::{Terminal, backend::CrosstermBackend};
use roster_store_sqlite::SqliteStore;
use tokio::sync::mpsc;
use tracing::info;
use tracing_subscriber::{EnvFilter, filter::LevelFilter};
use uuid::Uuid;

use crate::config::ConsoleConfig;

// ─── CLI args ─────────────────────────────────────────────────────────────────

#[derive(Parser, Debug)]
#[command(name = "roster", about = "Terminal console for the school student roster")]
struct Args {
  /// Path to a TOML config file.
  #[arg(short, long, value_name = "FILE")]
  config: Option<PathBuf>,

  /// SQLite database file (overrides the config file).
  #[arg(long, env = "ROSTER_STORE_PATH")]
  store: Option<PathBuf>,

  /// Acting role: admin, secretary, teacher or finance. Replaces any
  /// capability list from the config file or `ROSTER_CAPABILITIES`; the
  /// `ROSTER_ROLE` variable is read by the config layer instead.
  #[arg(long)]
  role: Option<String>,

  /// Where tracing output goes; the terminal belongs to the UI.
  #[arg(long, env = "ROSTER_LOG_FILE", value_name = "FILE")]
  log_file: Option<PathBuf>,

  /// Open this student's detail once the roster has loaded.
  #[arg(long, value_name = "UUID")]
  student: Option<Uuid>,
}

// ─── Entry point ──────────────────────────────────────────────────────────────

#[tokio::main]
async fn main() -> Result<()> {
  let args = Args::parse();

  // CLI flags override the config file and environment.
  let cfg = ConsoleConfig::load(args.config.as_deref())?.with_overrides(
    args.store,
    args.role,
    args.log_file,
  );

  init_tracing(&cfg)?;

  let caps = Arc::new(cfg.registry()?);
  let settings = Arc::new(cfg.settings());
  info!(
    store = %cfg.store_path.display(),
    role = %cfg.role,
    capabilities = caps.tokens().count(),
    "starting roster console",
  );

  let persistence = Arc::new(
    SqliteStore::open(&cfg.store_path)
      .await
      .with_context(|| format!("opening store at {}", cfg.store_path.display()))?,
  );

  let (tx, rx) = mpsc::unbounded_channel();
  let mut app = App::new(caps, settings, persistence, tx);
  app.deep_link = args.student;
  app.start_load();

  // Set up the terminal.
  enable_raw_mode().context("enabling raw mode")?;
  let mut stdout = io::stdout();
  execute!(stdout, EnterAlternateScreen).context("entering alternate screen")?;
  let backend = CrosstermBackend::new(stdout);
  let mut terminal = Terminal::new(backend).context("creating terminal")?;

  // Run the event loop; restore terminal even on error.
  let run_result = run_event_loop(&mut terminal, &mut app, rx).await;

  // Restore terminal regardless of result.
  disable_raw_mode().ok();
  execute!(terminal.backend_mut(), LeaveAlternateScreen).ok();
  terminal.show_cursor().ok();

  // Anything written during the final keystrokes.
  app.flush_writes().await;

  run_result
}

fn init_tracing(cfg: &ConsoleConfig) -> Result<()> {
  let file = OpenOptions::new()
    .create(true)
    .append(true)
    .open(&cfg.log_file)
    .with_context(|| format!("opening log file {}", cfg.log_file.display()))?;

  tracing_subscriber::fmt()
    .with_env_filter(
      EnvFilter::builder()
        .with_default_directive(LevelFilter::INFO.into())
        .from_env_lossy(),
    )
    .with_ansi(false)
    .with_writer(std::sync::Mutex::new(file))
    .init();
  Ok(())
}

// ─── Event loop ───────────────────────────────────────────────────────────────

async fn run_event_loop(
  terminal: &mut Terminal<CrosstermBackend<io::Stdout>>,
  app: &mut App,
  mut rx: mpsc::UnboundedReceiver<app::Background>,
) -> Result<()> {
  loop {
    terminal.draw(|f| ui::draw(f, app)).context("drawing frame")?;

    // Poll for an event, yielding control to tokio while waiting.
    let maybe_event = tokio::task::block_in_place(|| {
      if event::poll(Duration::from_millis(50))? {
        Ok::<_, io::Error>(Some(event::read()?))
      } else {
        Ok(None)
      }
    })?;

    if let Some(Event::Key(key)) = maybe_event {
      if !app.handle_key(key) {
        break;
      }
    }

    while let Ok(done) = rx.try_recv() {
      app.on_background(done);
    }

    app.flush_writes().await;
  }

  Ok(())
}

#[cfg(test)]
mod tests {
  use clap::CommandFactory;

  use super::Args;

  #[test]
  fn role_flag_is_command_line_only() {
    let cmd = Args::command();
    let role = cmd
      .get_arguments()
      .find(|a| a.get_id() == "role")
      .unwrap();
    assert!(role.get_env().is_none());
  }
}
