//! Application state and key dispatch for the console.

use std::{path::PathBuf, sync::Arc};

use anyhow::Context as _;
use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};
use fuzzy_matcher::{FuzzyMatcher, skim::SkimMatcherV2};
use roster_core::{
  capability::{CREATE_STUDENTS, CapabilityRegistry, EDIT_STUDENTS},
  editors::{self, NestedCollection},
  nav::{self, Destination},
  orchestrator::{AvatarOutcome, AvatarTicket, NoticeLevel, Orchestrator, ViewState},
  settings::Settings,
  store::{StudentPersistence, StudentStore},
  student::{Student, StudentStatus},
};
use roster_store_sqlite::SqliteStore;
use tokio::sync::mpsc;
use tracing::{info, warn};
use uuid::Uuid;

use crate::{
  form::{FormMode, StudentForm},
  prompt::{Prompt, PromptKind, parse_entry},
};

// ─── Background completions ───────────────────────────────────────────────────

/// Results of work started off the event loop. Each request yields exactly
/// one completion; nothing is retried.
pub enum Background {
  Loaded(anyhow::Result<Vec<Student>>),
  Avatar {
    ticket: AvatarTicket,
    result: anyhow::Result<String>,
  },
}

// ─── Focus ────────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Focus {
  Nav,
  Main,
}

// ─── App ──────────────────────────────────────────────────────────────────────

/// Top-level application state.
pub struct App {
  pub focus:  Focus,
  /// Destination currently shown in the main pane.
  pub screen: Destination,
  /// Cursor within the visible navigation entries.
  pub nav_cursor: usize,

  pub roster:   Orchestrator,
  pub caps:     Arc<CapabilityRegistry>,
  pub settings: Arc<Settings>,

  /// Cursor position within the *visible* student list.
  pub list_cursor: usize,
  /// Fuzzy name search, applied on top of the class/status filters.
  pub search:        String,
  pub search_active: bool,

  pub detail_tab:    NestedCollection,
  pub detail_cursor: usize,

  pub form:   Option<StudentForm>,
  pub prompt: Option<Prompt>,

  /// One-line status message shown in the status bar.
  pub status_msg: String,
  /// Student to open once the initial load lands.
  pub deep_link:  Option<Uuid>,

  persistence: Arc<SqliteStore>,
  tx:          mpsc::UnboundedSender<Background>,
}

impl App {
  pub fn new(
    caps: Arc<CapabilityRegistry>,
    settings: Arc<Settings>,
    persistence: Arc<SqliteStore>,
    tx: mpsc::UnboundedSender<Background>,
  ) -> Self {
    let screen = nav::visible(caps.as_ref())
      .into_iter()
      .find(|d| *d == Destination::Students)
      .or_else(|| nav::visible(caps.as_ref()).first().copied())
      .unwrap_or(Destination::Dashboard);

    Self {
      focus: Focus::Main,
      screen,
      nav_cursor: 0,
      roster: Orchestrator::new(StudentStore::new(), Arc::clone(&caps)),
      caps,
      settings,
      list_cursor: 0,
      search: String::new(),
      search_active: false,
      detail_tab: NestedCollection::Grades,
      detail_cursor: 0,
      form: None,
      prompt: None,
      status_msg: String::new(),
      deep_link: None,
      persistence,
      tx,
    }
  }

  // ── Background work ───────────────────────────────────────────────────────

  /// Start the initial load. The list shows a loading state until it
  /// completes; there is no timeout.
  pub fn start_load(&mut self) {
    self.status_msg = "Carregando alunos…".into();
    let store = Arc::clone(&self.persistence);
    let tx = self.tx.clone();
    tokio::spawn(async move {
      let result = store.load_all().await.context("loading students");
      let _ = tx.send(Background::Loaded(result));
    });
  }

  /// Read and encode a photo off the event loop.
  fn start_avatar_upload(&mut self, path: PathBuf) {
    let Some(ticket) = self.roster.begin_avatar_upload() else {
      return;
    };
    self.status_msg = "Enviando foto…".into();
    let tx = self.tx.clone();
    tokio::spawn(async move {
      let result = async {
        let bytes = tokio::fs::read(&path)
          .await
          .with_context(|| format!("reading {}", path.display()))?;
        Ok::<_, anyhow::Error>(editors::encode_avatar(&bytes)?)
      }
      .await;
      let _ = tx.send(Background::Avatar { ticket, result });
    });
  }

  /// Apply one background completion.
  pub fn on_background(&mut self, event: Background) {
    match event {
      Background::Loaded(Ok(students)) => {
        info!(count = students.len(), "initial load complete");
        self.roster.store_mut().hydrate(students);
        self.status_msg.clear();
        if let Some(id) = self.deep_link.take() {
          self.roster.open_deep_link(id);
        }
      }
      Background::Loaded(Err(e)) => {
        // The store stays in its loading state; nothing is retried.
        warn!(error = %e, "initial load failed");
        self.status_msg = format!("Erro: {e:#}");
      }
      Background::Avatar { ticket, result: Ok(data_url) } => {
        match self.roster.complete_avatar_upload(ticket, data_url) {
          Ok(AvatarOutcome::Drafted) => self.status_msg = "Foto pronta; salve para gravar.".into(),
          Ok(AvatarOutcome::Saved) => {}
          Ok(AvatarOutcome::Discarded) => self.status_msg.clear(),
          Err(e) => self.status_msg = format!("Erro: {e}"),
        }
        self.take_notice();
      }
      Background::Avatar { ticket, result: Err(e) } => {
        warn!(student_id = %ticket.student_id(), error = %e, "photo upload failed");
        self.status_msg = format!("Erro: {e:#}");
      }
    }
  }

  /// Hand every store write since the last flush to persistence.
  pub async fn flush_writes(&mut self) {
    for student in self.roster.store_mut().drain_pending_writes() {
      if let Err(e) = self.persistence.upsert(&student).await {
        warn!(student_id = %student.id(), error = %e, "failed to persist student");
        self.status_msg = format!("Erro ao gravar {}: {e}", student.name());
      }
    }
  }

  fn take_notice(&mut self) {
    if let Some(notice) = self.roster.take_notice() {
      self.status_msg = match notice.level {
        NoticeLevel::Info => notice.message,
        NoticeLevel::Warning => format!("Atenção: {}", notice.message),
      };
    }
  }

  // ── Derived views ─────────────────────────────────────────────────────────

  pub fn nav_entries(&self) -> Vec<Destination> { nav::visible(self.caps.as_ref()) }

  /// Students after filters and search, in store order.
  pub fn list_rows(&self) -> Vec<&Student> {
    let rows = self.roster.visible_students();
    if self.search.is_empty() {
      return rows;
    }
    let matcher = SkimMatcherV2::default();
    rows
      .into_iter()
      .filter(|s| matcher.fuzzy_match(s.name(), &self.search).is_some())
      .collect()
  }

  pub fn cursor_student(&self) -> Option<&Student> {
    self.list_rows().get(self.list_cursor).copied()
  }

  // ── Key handling ──────────────────────────────────────────────────────────

  /// Process a key event. Returns `true` to continue, `false` to quit.
  pub fn handle_key(&mut self, key: KeyEvent) -> bool {
    if key.modifiers.contains(KeyModifiers::CONTROL) && key.code == KeyCode::Char('c') {
      return false;
    }

    if self.prompt.is_some() {
      self.handle_prompt_key(key);
      return true;
    }
    if self.search_active {
      self.handle_search_key(key);
      return true;
    }

    if self.focus == Focus::Nav {
      return self.handle_nav_key(key);
    }

    if self.screen != Destination::Students {
      return self.handle_other_key(key);
    }

    match self.roster.state() {
      ViewState::Idle | ViewState::ListFiltered => self.handle_list_key(key),
      ViewState::DetailOpen => self.handle_detail_key(key),
      ViewState::EditOpen | ViewState::CreateOpen => {
        self.handle_form_key(key);
        true
      }
    }
  }

  fn handle_nav_key(&mut self, key: KeyEvent) -> bool {
    let entries = self.nav_entries();
    match key.code {
      KeyCode::Char('q') => return false,
      KeyCode::Down | KeyCode::Char('j') => {
        if self.nav_cursor + 1 < entries.len() {
          self.nav_cursor += 1;
        }
      }
      KeyCode::Up | KeyCode::Char('k') => {
        self.nav_cursor = self.nav_cursor.saturating_sub(1);
      }
      KeyCode::Enter | KeyCode::Right | KeyCode::Char('l') => {
        if let Some(dest) = entries.get(self.nav_cursor).copied() {
          self.go_to(dest);
        }
      }
      KeyCode::Tab | KeyCode::Esc => self.focus = Focus::Main,
      _ => {}
    }
    true
  }

  /// Switch the main pane, gated at the point of action.
  pub fn go_to(&mut self, destination: Destination) {
    let Some(dest) = nav::navigate(self.caps.as_ref(), destination) else {
      return;
    };
    self.roster.close();
    self.form = None;
    self.screen = dest;
    self.focus = Focus::Main;
  }

  fn handle_other_key(&mut self, key: KeyEvent) -> bool {
    match key.code {
      KeyCode::Char('q') => return false,
      KeyCode::Tab => self.focus = Focus::Nav,
      _ => {}
    }
    true
  }

  fn handle_search_key(&mut self, key: KeyEvent) {
    match key.code {
      KeyCode::Esc => {
        self.search_active = false;
        self.search.clear();
      }
      KeyCode::Enter => self.search_active = false,
      KeyCode::Backspace => {
        self.search.pop();
      }
      KeyCode::Char(c) => self.search.push(c),
      _ => {}
    }
    self.list_cursor = 0;
  }

  fn handle_list_key(&mut self, key: KeyEvent) -> bool {
    match key.code {
      KeyCode::Char('q') => return false,
      KeyCode::Tab => self.focus = Focus::Nav,

      KeyCode::Down | KeyCode::Char('j') => {
        if self.list_cursor + 1 < self.list_rows().len() {
          self.list_cursor += 1;
        }
      }
      KeyCode::Up | KeyCode::Char('k') => {
        self.list_cursor = self.list_cursor.saturating_sub(1);
      }

      KeyCode::Enter | KeyCode::Right | KeyCode::Char('l') => {
        if let Some(id) = self.cursor_student().map(Student::id) {
          self.open_detail(id);
        }
      }

      KeyCode::Char('/') => {
        self.search_active = true;
        self.search.clear();
        self.list_cursor = 0;
      }
      KeyCode::Char('c') => {
        let next = next_filter(
          &self.settings.class_names,
          self.roster.filters().class_name.as_ref(),
        );
        self.roster.set_class_filter(next);
        self.list_cursor = 0;
      }
      KeyCode::Char('s') => {
        let next: Option<StudentStatus> =
          next_filter(&self.settings.statuses, self.roster.filters().status.as_ref());
        self.roster.set_status_filter(next);
        self.list_cursor = 0;
      }
      KeyCode::Char('x') => {
        self.roster.clear_filters();
        self.search.clear();
        self.list_cursor = 0;
      }

      KeyCode::Char('a') => {
        if self.roster.open_create() {
          self.form = Some(StudentForm::blank(&self.settings));
        }
      }
      KeyCode::Char('e') => {
        let Some(id) = self.cursor_student().map(Student::id) else {
          return true;
        };
        if self.roster.request_edit_for(id) {
          self.form = self.roster.draft().map(StudentForm::from_student);
        }
      }
      _ => {}
    }
    true
  }

  fn open_detail(&mut self, id: Uuid) {
    if self.roster.select(id) {
      self.detail_tab = NestedCollection::Grades;
      self.detail_cursor = 0;
    }
  }

  fn handle_detail_key(&mut self, key: KeyEvent) -> bool {
    let tab_len = self
      .roster
      .detail()
      .map_or(0, |s| self.detail_tab.len(s));

    match key.code {
      KeyCode::Char('q') => return false,
      KeyCode::Esc | KeyCode::Char('h') => self.roster.close(),

      KeyCode::Tab | KeyCode::Right => self.shift_tab(1),
      KeyCode::BackTab | KeyCode::Left => self.shift_tab(NestedCollection::ALL.len() - 1),

      KeyCode::Down | KeyCode::Char('j') => {
        if self.detail_cursor + 1 < tab_len {
          self.detail_cursor += 1;
        }
      }
      KeyCode::Up | KeyCode::Char('k') => {
        self.detail_cursor = self.detail_cursor.saturating_sub(1);
      }

      KeyCode::Char('e') => {
        if self.roster.request_edit() {
          self.form = self.roster.draft().map(StudentForm::from_student);
        }
      }
      KeyCode::Char('n') => {
        if self.roster.gate().allows(EDIT_STUDENTS) {
          self.prompt = Some(Prompt::new(PromptKind::Entry(self.detail_tab)));
        }
      }
      KeyCode::Char('p') => {
        if self.roster.gate().allows(EDIT_STUDENTS) {
          self.prompt = Some(Prompt::new(PromptKind::Photo));
        }
      }
      KeyCode::Char('d') if self.detail_tab == NestedCollection::Agenda => {
        let entry_id = self
          .roster
          .detail()
          .and_then(|s| s.agenda.get(self.detail_cursor))
          .map(|e| e.entry_id);
        if let Some(entry_id) = entry_id {
          match self.roster.mark_agenda_delivered(entry_id) {
            Ok(true) => self.status_msg = "Agenda: marcado como entregue.".into(),
            Ok(false) => {}
            Err(e) => warn!(%entry_id, error = %e, "failed to mark agenda entry delivered"),
          }
          self.take_notice();
        }
      }
      _ => {}
    }
    true
  }

  fn shift_tab(&mut self, by: usize) {
    let all = NestedCollection::ALL;
    let i = all.iter().position(|c| *c == self.detail_tab).unwrap_or(0);
    self.detail_tab = all[(i + by) % all.len()];
    self.detail_cursor = 0;
  }

  fn handle_form_key(&mut self, key: KeyEvent) {
    let Some(form) = self.form.as_mut() else {
      // Orchestrator and form out of step; drop back to the list.
      self.roster.close();
      return;
    };
    let ctrl = key.modifiers.contains(KeyModifiers::CONTROL);

    match key.code {
      KeyCode::Esc => {
        self.roster.close();
        self.form = None;
        self.status_msg = "Edição descartada.".into();
      }
      KeyCode::Char('s') if ctrl => self.submit_form(),
      KeyCode::Char('p') if ctrl && form.mode == FormMode::Edit => {
        if self.roster.gate().allows(EDIT_STUDENTS) {
          self.prompt = Some(Prompt::new(PromptKind::Photo));
        }
      }
      KeyCode::Tab | KeyCode::Down => form.next(),
      KeyCode::BackTab | KeyCode::Up => form.prev(),
      KeyCode::Left | KeyCode::Right | KeyCode::Char(' ') if form.current().is_choice() => {
        form.cycle_choice(&self.settings);
      }
      KeyCode::Enter => form.next(),
      KeyCode::Backspace => form.backspace(),
      KeyCode::Char(c) if !ctrl => form.input(c),
      _ => {}
    }
  }

  fn submit_form(&mut self) {
    let Some(form) = self.form.as_ref() else {
      return;
    };

    match form.mode {
      FormMode::Create => {
        if !self.roster.gate().allows(CREATE_STUDENTS) {
          return;
        }
        let input = match form.to_new_student() {
          Ok(input) => input,
          Err(e) => {
            self.status_msg = format!("Erro: {e}");
            return;
          }
        };
        match self.roster.submit_create(input) {
          Ok(_) => self.form = None,
          Err(e) => warn!(error = %e, "student not created"),
        }
      }
      FormMode::Edit => {
        let applied = match self.roster.draft_mut() {
          Some(draft) => form.apply_to(draft),
          None => Ok(()),
        };
        if let Err(e) = applied {
          self.status_msg = format!("Erro: {e}");
          return;
        }
        if let Err(e) = self.roster.save_edit() {
          warn!(error = %e, "edit not saved");
        }
        if !matches!(self.roster.state(), ViewState::EditOpen) {
          self.form = None;
        }
      }
    }
    self.take_notice();
  }

  fn handle_prompt_key(&mut self, key: KeyEvent) {
    let Some(prompt) = self.prompt.as_mut() else {
      return;
    };
    match key.code {
      KeyCode::Esc => self.prompt = None,
      KeyCode::Backspace => {
        prompt.buffer.pop();
      }
      KeyCode::Char(c) => prompt.buffer.push(c),
      KeyCode::Enter => {
        if let Some(prompt) = self.prompt.take() {
          self.submit_prompt(prompt);
        }
      }
      _ => {}
    }
  }

  fn submit_prompt(&mut self, prompt: Prompt) {
    match prompt.kind {
      PromptKind::Photo => {
        let path = prompt.buffer.trim();
        if !path.is_empty() {
          self.start_avatar_upload(PathBuf::from(path));
        }
      }
      PromptKind::Entry(collection) => match parse_entry(collection, &prompt.buffer) {
        Ok(input) => {
          match self.roster.append_entry(input) {
            Ok(true) => self.status_msg = format!("{}: registro adicionado.", collection.label()),
            Ok(false) => {}
            Err(e) => warn!(?collection, error = %e, "entry not appended"),
          }
          self.take_notice();
        }
        Err(e) => {
          self.status_msg = format!("Erro: {e}");
          self.prompt = Some(prompt);
        }
      },
    }
  }
}

/// Cycle a filter: no filter → each option in order → no filter.
fn next_filter<T: Clone + PartialEq>(options: &[T], current: Option<&T>) -> Option<T> {
  match current {
    None => options.first().cloned(),
    Some(cur) => {
      let i = options.iter().position(|o| o == cur)?;
      options.get(i + 1).cloned()
    }
  }
}

#[cfg(test)]
mod tests {
  use roster_core::{
    capability::Role,
    student::{NewStudent, Profile},
  };

  use super::*;

  fn students(names: &[&str]) -> Vec<Student> {
    let mut scratch = StudentStore::loaded(Vec::new());
    names
      .iter()
      .map(|name| {
        scratch
          .create(NewStudent::new(Profile {
            name: (*name).into(),
            class_name: "1º Ano A".into(),
            guardian_name: "Responsável".into(),
            guardian_contact: "(11) 90000-0000".into(),
            ..Profile::default()
          }))
          .unwrap()
      })
      .collect()
  }

  async fn console(role: Role) -> App {
    let persistence = Arc::new(SqliteStore::open_in_memory().await.unwrap());
    let (tx, _rx) = mpsc::unbounded_channel();
    let mut app = App::new(
      Arc::new(CapabilityRegistry::for_role(role)),
      Arc::new(Settings::default()),
      persistence,
      tx,
    );
    app.on_background(Background::Loaded(Ok(students(&["Ana Souza", "Bruno Lima"]))));
    app
  }

  fn press(app: &mut App, code: KeyCode) -> bool {
    app.handle_key(KeyEvent::new(code, KeyModifiers::NONE))
  }

  #[test]
  fn filter_cycle_returns_to_none() {
    let opts = vec!["A".to_string(), "B".to_string()];
    let a = next_filter(&opts, None);
    assert_eq!(a.as_deref(), Some("A"));
    let b = next_filter(&opts, a.as_ref());
    assert_eq!(b.as_deref(), Some("B"));
    assert_eq!(next_filter(&opts, b.as_ref()), None);
    assert_eq!(next_filter(&opts, Some(&"Z".to_string())), None);
  }

  #[tokio::test]
  async fn add_key_is_inert_without_create_capability() {
    let mut app = console(Role::Teacher).await;
    assert!(press(&mut app, KeyCode::Char('a')));
    assert_eq!(app.roster.state(), ViewState::Idle);
    assert!(app.form.is_none());

    let mut app = console(Role::Secretary).await;
    press(&mut app, KeyCode::Char('a'));
    assert_eq!(app.roster.state(), ViewState::CreateOpen);
    assert!(app.form.is_some());
  }

  #[tokio::test]
  async fn search_narrows_the_list() {
    let mut app = console(Role::Secretary).await;
    assert_eq!(app.list_rows().len(), 2);
    press(&mut app, KeyCode::Char('/'));
    for c in "brn".chars() {
      press(&mut app, KeyCode::Char(c));
    }
    let rows = app.list_rows();
    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0].name(), "Bruno Lima");
  }

  #[tokio::test]
  async fn enter_opens_detail_and_esc_returns_to_list() {
    let mut app = console(Role::Secretary).await;
    press(&mut app, KeyCode::Down);
    press(&mut app, KeyCode::Enter);
    assert_eq!(app.roster.state(), ViewState::DetailOpen);
    assert_eq!(app.roster.detail().unwrap().name(), "Bruno Lima");
    press(&mut app, KeyCode::Esc);
    assert_eq!(app.roster.state(), ViewState::Idle);
  }

  #[tokio::test]
  async fn entry_prompt_appends_and_flush_persists() {
    let mut app = console(Role::Teacher).await;
    press(&mut app, KeyCode::Enter);
    press(&mut app, KeyCode::Char('n'));
    for c in "Matemática | 1º Bimestre | 8".chars() {
      press(&mut app, KeyCode::Char(c));
    }
    press(&mut app, KeyCode::Enter);
    assert!(app.prompt.is_none());
    assert_eq!(app.roster.detail().unwrap().grades.len(), 1);

    app.flush_writes().await;
    let saved = app.persistence.load_all().await.unwrap();
    assert_eq!(saved.len(), 1);
    assert_eq!(saved[0].grades.len(), 1);
  }

  #[tokio::test]
  async fn hidden_destination_cannot_be_reached() {
    let mut app = console(Role::Teacher).await;
    app.go_to(Destination::Financial);
    assert_eq!(app.screen, Destination::Students);
    app.go_to(Destination::Dashboard);
    assert_eq!(app.screen, Destination::Dashboard);
  }

  #[tokio::test]
  async fn rejected_edit_keeps_the_form_open_and_warns() {
    let mut app = console(Role::Secretary).await;
    press(&mut app, KeyCode::Enter);
    press(&mut app, KeyCode::Char('e'));
    assert_eq!(app.roster.state(), ViewState::EditOpen);
    for _ in "Ana Souza".chars() {
      press(&mut app, KeyCode::Backspace);
    }
    app.handle_key(KeyEvent::new(KeyCode::Char('s'), KeyModifiers::CONTROL));

    assert_eq!(app.roster.state(), ViewState::EditOpen);
    assert!(app.form.is_some());
    assert!(app.status_msg.starts_with("Atenção"));
    assert_eq!(app.roster.store().list()[0].name(), "Ana Souza");
  }

  #[tokio::test]
  async fn agenda_entry_can_be_marked_delivered_from_detail() {
    let mut app = console(Role::Secretary).await;
    press(&mut app, KeyCode::Enter);
    while app.detail_tab != NestedCollection::Agenda {
      press(&mut app, KeyCode::Tab);
    }
    press(&mut app, KeyCode::Char('n'));
    for c in "02/05/2024 | Passeio".chars() {
      press(&mut app, KeyCode::Char(c));
    }
    press(&mut app, KeyCode::Enter);
    assert!(!app.roster.detail().unwrap().agenda[0].delivered);

    press(&mut app, KeyCode::Char('d'));
    assert!(app.roster.detail().unwrap().agenda[0].delivered);
    assert_eq!(app.status_msg, "Agenda: marcado como entregue.");
  }
}
