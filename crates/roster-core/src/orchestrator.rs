//! Selection and modal orchestration over the [`StudentStore`].
//!
//! The orchestrator owns the store for the session and tracks which student is
//! selected and which modal (detail, edit, create) is open. Read views only
//! ever hold a [`Snapshot`]; every write goes through the store's single
//! update entry point, after which any snapshot of the same id is refreshed.
//!
//! Mutating requests are gated at the point of action: without the matching
//! capability they are no-ops, exactly as if the affordance did not exist.

use std::{ops::Deref, sync::Arc};

use chrono::Utc;
use tracing::{debug, warn};
use uuid::Uuid;

use crate::{
  Error, Result,
  capability::{CREATE_STUDENTS, CapabilityRegistry, EDIT_STUDENTS, VIEW_STUDENTS},
  editors::{self, EntryInput},
  entry::EntryId,
  gate::Gate,
  store::StudentStore,
  student::{NewStudent, Student, StudentStatus},
};

// ─── View state ──────────────────────────────────────────────────────────────

/// Observable state of the students screen.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ViewState {
  /// List shown with no filter applied and no modal open.
  Idle,
  /// List shown with at least one filter applied and no modal open.
  ListFiltered,
  DetailOpen,
  EditOpen,
  CreateOpen,
}

/// Class and status filters for the list. `None` means "no filter".
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ListFilters {
  pub class_name: Option<String>,
  pub status:     Option<StudentStatus>,
}

impl ListFilters {
  pub fn is_active(&self) -> bool { self.class_name.is_some() || self.status.is_some() }

  /// Conjunction of both filters.
  pub fn matches(&self, student: &Student) -> bool {
    self.class_name.as_deref().is_none_or(|c| student.class_name() == c)
      && self.status.as_ref().is_none_or(|s| &student.status == s)
  }
}

// ─── Snapshot ────────────────────────────────────────────────────────────────

/// A view-local copy of an aggregate taken at selection time.
///
/// Snapshots are read-only and are never handed back to the store; they are
/// replaced wholesale whenever the store value for their id changes.
#[derive(Debug, Clone, PartialEq)]
pub struct Snapshot(Student);

impl Snapshot {
  fn of(student: &Student) -> Self { Self(student.clone()) }

  pub fn student(&self) -> &Student { &self.0 }
}

impl Deref for Snapshot {
  type Target = Student;

  fn deref(&self) -> &Student { &self.0 }
}

// ─── Notices ─────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NoticeLevel {
  Info,
  Warning,
}

/// A non-fatal, one-line message for the user.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notice {
  pub level:   NoticeLevel,
  pub message: String,
}

// ─── Tickets ─────────────────────────────────────────────────────────────────

/// Issued when an avatar upload starts. A completion is applied only if the
/// view it was issued for is still open.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AvatarTicket {
  student_id: Uuid,
  generation: u64,
}

impl AvatarTicket {
  pub fn student_id(&self) -> Uuid { self.student_id }
}

/// What happened to a completed avatar upload.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AvatarOutcome {
  /// Written to the store and the detail snapshot refreshed.
  Saved,
  /// Placed in the edit draft; persisted when the edit is saved.
  Drafted,
  /// The view the upload was started from has gone away.
  Discarded,
}

// ─── Orchestrator ────────────────────────────────────────────────────────────

#[derive(Debug)]
enum Modal {
  None,
  Detail(Snapshot),
  Edit {
    draft:     Student,
    /// The detail snapshot to return to on save, if the edit came from there.
    return_to: Option<Snapshot>,
  },
  Create,
}

/// Session state for the students screen.
#[derive(Debug)]
pub struct Orchestrator {
  store:      StudentStore,
  caps:       Arc<CapabilityRegistry>,
  filters:    ListFilters,
  modal:      Modal,
  /// Bumped on every modal transition; stale tickets compare unequal.
  generation: u64,
  notice:     Option<Notice>,
}

impl Orchestrator {
  pub fn new(store: StudentStore, caps: Arc<CapabilityRegistry>) -> Self {
    Self {
      store,
      caps,
      filters: ListFilters::default(),
      modal: Modal::None,
      generation: 0,
      notice: None,
    }
  }

  // ── Accessors ─────────────────────────────────────────────────────────────

  pub fn state(&self) -> ViewState {
    match &self.modal {
      Modal::None if self.filters.is_active() => ViewState::ListFiltered,
      Modal::None => ViewState::Idle,
      Modal::Detail(_) => ViewState::DetailOpen,
      Modal::Edit { .. } => ViewState::EditOpen,
      Modal::Create => ViewState::CreateOpen,
    }
  }

  pub fn store(&self) -> &StudentStore { &self.store }

  /// Mutable store access for loading and flushing writes. View code should
  /// go through the orchestrator's operations instead.
  pub fn store_mut(&mut self) -> &mut StudentStore { &mut self.store }

  pub fn gate(&self) -> Gate<'_> { Gate::new(self.caps.as_ref()) }

  pub fn filters(&self) -> &ListFilters { &self.filters }

  /// The detail snapshot, while the detail view is open.
  pub fn detail(&self) -> Option<&Snapshot> {
    match &self.modal {
      Modal::Detail(snapshot) => Some(snapshot),
      _ => None,
    }
  }

  /// The in-progress edit, while the edit form is open.
  pub fn draft(&self) -> Option<&Student> {
    match &self.modal {
      Modal::Edit { draft, .. } => Some(draft),
      _ => None,
    }
  }

  /// Mutable access to the in-progress edit. The id cannot change through
  /// this; only profile, status and avatar are meant to be edited.
  pub fn draft_mut(&mut self) -> Option<&mut Student> {
    match &mut self.modal {
      Modal::Edit { draft, .. } => Some(draft),
      _ => None,
    }
  }

  pub fn take_notice(&mut self) -> Option<Notice> { self.notice.take() }

  pub fn notice(&self) -> Option<&Notice> { self.notice.as_ref() }

  /// Students passing the current filters, in store order.
  pub fn visible_students(&self) -> Vec<&Student> {
    if !self.gate().allows(VIEW_STUDENTS) {
      return Vec::new();
    }
    self
      .store
      .list()
      .iter()
      .filter(|s| self.filters.matches(s))
      .collect()
  }

  // ── Filters ───────────────────────────────────────────────────────────────

  pub fn set_class_filter(&mut self, class_name: Option<String>) {
    self.filters.class_name = class_name;
  }

  pub fn set_status_filter(&mut self, status: Option<StudentStatus>) {
    self.filters.status = status;
  }

  pub fn clear_filters(&mut self) { self.filters = ListFilters::default(); }

  // ── Transitions ───────────────────────────────────────────────────────────

  /// Row selection: open the detail view on a snapshot of `id`. Returns
  /// whether the transition happened.
  pub fn select(&mut self, id: Uuid) -> bool {
    if !self.gate().allows(VIEW_STUDENTS) {
      return false;
    }
    let Some(student) = self.store.get(id) else {
      debug!(student_id = %id, "selection of absent student ignored");
      return false;
    };
    let snapshot = Snapshot::of(student);
    self.transition(Modal::Detail(snapshot));
    true
  }

  /// External trigger (deep link, shortcut): open the detail for `id` from
  /// the list. If the student is not in the store, or a modal is already
  /// open, nothing happens and nothing is reported.
  pub fn open_deep_link(&mut self, id: Uuid) -> bool {
    if !matches!(self.modal, Modal::None) {
      return false;
    }
    self.select(id)
  }

  /// Open the create form from the list.
  pub fn open_create(&mut self) -> bool {
    if !self.gate().allows(CREATE_STUDENTS) || !matches!(self.modal, Modal::None) {
      return false;
    }
    self.transition(Modal::Create);
    true
  }

  /// From the detail view: close it and open the edit form on the same
  /// snapshot.
  pub fn request_edit(&mut self) -> bool {
    if !self.gate().allows(EDIT_STUDENTS) {
      return false;
    }
    let Modal::Detail(snapshot) = &self.modal else {
      return false;
    };
    let snapshot = snapshot.clone();
    self.transition(Modal::Edit {
      draft:     snapshot.student().clone(),
      return_to: Some(snapshot),
    });
    true
  }

  /// From the list (an edit button on a row): open the edit form directly.
  /// Saving returns to the list.
  pub fn request_edit_for(&mut self, id: Uuid) -> bool {
    if !self.gate().allows(EDIT_STUDENTS) || !matches!(self.modal, Modal::None) {
      return false;
    }
    let Some(student) = self.store.get(id) else {
      return false;
    };
    let draft = student.clone();
    self.transition(Modal::Edit { draft, return_to: None });
    true
  }

  /// Close whatever is open, discarding any in-progress edit.
  pub fn close(&mut self) {
    if !matches!(self.modal, Modal::None) {
      self.transition(Modal::None);
    }
  }

  // ── Writes ────────────────────────────────────────────────────────────────

  /// Submit the create form. On a validation error the form stays open.
  pub fn submit_create(&mut self, input: NewStudent) -> Result<Student> {
    if !matches!(self.modal, Modal::Create) || !self.gate().allows(CREATE_STUDENTS) {
      return Err(Error::invalid("form", "the create form is not open"));
    }
    match self.store.create(input) {
      Ok(student) => {
        self.transition(Modal::None);
        self.inform(format!("Aluno {} cadastrado.", student.name()));
        Ok(student)
      }
      Err(e) => {
        self.warn_user(e.to_string());
        Err(e)
      }
    }
  }

  /// Submit the edit draft through the store's update.
  ///
  /// - Success: back to the detail view (refreshed from the store) if the
  ///   edit came from there, otherwise back to the list.
  /// - Validation error: the form stays open with the draft intact.
  /// - Not found: a notice is raised and the view returns to the list.
  pub fn save_edit(&mut self) -> Result<()> {
    let Modal::Edit { draft, .. } = &self.modal else {
      return Err(Error::invalid("form", "the edit form is not open"));
    };
    if !self.gate().allows(EDIT_STUDENTS) {
      return Err(Error::invalid("form", "the edit form is not open"));
    }
    let draft = draft.clone();
    let id = draft.id();

    match self.store.update(draft) {
      Ok(()) => {
        let modal = std::mem::replace(&mut self.modal, Modal::None);
        let next = match modal {
          Modal::Edit { return_to: Some(snapshot), .. } => {
            let fresh = self.store.get(snapshot.id()).map(Snapshot::of);
            fresh.map_or(Modal::None, Modal::Detail)
          }
          _ => Modal::None,
        };
        self.transition(next);
        self.inform("Alterações salvas.".to_string());
        Ok(())
      }
      Err(e @ Error::StudentNotFound(_)) => {
        warn!(student_id = %id, "edit saved against a student missing from the store");
        self.transition(Modal::None);
        self.warn_user(e.to_string());
        Err(e)
      }
      Err(e) => {
        self.warn_user(e.to_string());
        Err(e)
      }
    }
  }

  /// Append a nested-collection entry to the student in the detail view.
  ///
  /// The editor runs against the store's current value, not the snapshot, and
  /// the snapshot is refreshed afterwards. Returns `Ok(false)` when no detail
  /// is open or the actor may not edit.
  pub fn append_entry(&mut self, input: EntryInput) -> Result<bool> {
    if !self.gate().allows(EDIT_STUDENTS) {
      return Ok(false);
    }
    let Some(id) = self.detail().map(|s| s.id()) else {
      return Ok(false);
    };
    let collection = input.collection();
    self.write_through(id, |current| input.apply(current, Utc::now()))?;
    debug!(student_id = %id, ?collection, "entry appended");
    Ok(true)
  }

  /// Mark an agenda entry of the student in the detail view as delivered.
  pub fn mark_agenda_delivered(&mut self, entry_id: EntryId) -> Result<bool> {
    if !self.gate().allows(EDIT_STUDENTS) {
      return Ok(false);
    }
    let Some(id) = self.detail().map(|s| s.id()) else {
      return Ok(false);
    };
    self.write_through(id, |current| editors::mark_agenda_delivered(current, entry_id))?;
    Ok(true)
  }

  // ── Avatar upload ─────────────────────────────────────────────────────────

  /// Start an avatar upload for the student in the detail or edit view.
  pub fn begin_avatar_upload(&self) -> Option<AvatarTicket> {
    if !self.gate().allows(EDIT_STUDENTS) {
      return None;
    }
    let student_id = match &self.modal {
      Modal::Detail(snapshot) => snapshot.id(),
      Modal::Edit { draft, .. } => draft.id(),
      _ => return None,
    };
    Some(AvatarTicket { student_id, generation: self.generation })
  }

  /// Deliver an encoded avatar. Applied only if the view the ticket was
  /// issued for is still open; otherwise the result is dropped.
  pub fn complete_avatar_upload(
    &mut self,
    ticket: AvatarTicket,
    data_url: String,
  ) -> Result<AvatarOutcome> {
    if ticket.generation != self.generation {
      debug!(student_id = %ticket.student_id, "stale avatar upload discarded");
      return Ok(AvatarOutcome::Discarded);
    }
    match &mut self.modal {
      Modal::Edit { draft, .. } if draft.id() == ticket.student_id => {
        draft.avatar = Some(data_url);
        Ok(AvatarOutcome::Drafted)
      }
      Modal::Detail(snapshot) if snapshot.id() == ticket.student_id => {
        let id = snapshot.id();
        self.write_through(id, |current| Ok(editors::with_avatar(current, data_url)))?;
        self.inform("Foto atualizada.".to_string());
        Ok(AvatarOutcome::Saved)
      }
      _ => Ok(AvatarOutcome::Discarded),
    }
  }

  // ── Internals ─────────────────────────────────────────────────────────────

  /// Read the canonical aggregate, derive a new one, update, refresh.
  fn write_through(
    &mut self,
    id: Uuid,
    derive: impl FnOnce(&Student) -> Result<Student>,
  ) -> Result<()> {
    let Some(current) = self.store.get(id) else {
      warn!(student_id = %id, "write against a student missing from the store");
      self.transition(Modal::None);
      let e = Error::StudentNotFound(id);
      self.warn_user(e.to_string());
      return Err(e);
    };
    let next = match derive(current) {
      Ok(next) => next,
      Err(e) => {
        self.warn_user(e.to_string());
        return Err(e);
      }
    };
    if let Err(e) = self.store.update(next) {
      self.warn_user(e.to_string());
      return Err(e);
    }
    self.refresh_snapshots(id);
    Ok(())
  }

  /// Replace every snapshot of `id` with the store's current value.
  fn refresh_snapshots(&mut self, id: Uuid) {
    let Some(fresh) = self.store.get(id).map(Snapshot::of) else {
      return;
    };
    match &mut self.modal {
      Modal::Detail(snapshot) if snapshot.id() == id => *snapshot = fresh,
      Modal::Edit { return_to: Some(snapshot), .. } if snapshot.id() == id => {
        *snapshot = fresh;
      }
      _ => {}
    }
  }

  fn transition(&mut self, next: Modal) {
    self.modal = next;
    self.generation = self.generation.wrapping_add(1);
    debug!(state = ?self.state(), generation = self.generation, "view transition");
  }

  fn inform(&mut self, message: String) {
    self.notice = Some(Notice { level: NoticeLevel::Info, message });
  }

  fn warn_user(&mut self, message: String) {
    self.notice = Some(Notice { level: NoticeLevel::Warning, message });
  }
}

// ─── Tests ───────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
  use chrono::NaiveDate;

  use super::*;
  use crate::{
    capability::Role,
    editors::{AgendaInput, GradeInput},
    student::Profile,
  };

  fn profile(name: &str, class_name: &str) -> Profile {
    Profile {
      name: name.into(),
      class_name: class_name.into(),
      guardian_name: "Responsável".into(),
      guardian_contact: "(31) 96666-2222".into(),
      ..Profile::default()
    }
  }

  fn orchestrator(role: Role) -> (Orchestrator, Vec<Uuid>) {
    let mut store = StudentStore::loaded(Vec::new());
    let ids = [("Ana", "1º Ano A"), ("Bia", "2º Ano A"), ("Caio", "1º Ano A")]
      .into_iter()
      .map(|(n, c)| store.create(NewStudent::new(profile(n, c))).unwrap().id())
      .collect();
    let caps = Arc::new(CapabilityRegistry::for_role(role));
    (Orchestrator::new(store, caps), ids)
  }

  #[test]
  fn starts_idle_and_filters_move_to_list_filtered() {
    let (mut o, ids) = orchestrator(Role::Admin);
    assert_eq!(o.state(), ViewState::Idle);
    assert_eq!(o.visible_students().len(), 3);

    o.set_class_filter(Some("1º Ano A".into()));
    assert_eq!(o.state(), ViewState::ListFiltered);
    let visible: Vec<_> = o.visible_students().iter().map(|s| s.id()).collect();
    assert_eq!(visible, vec![ids[0], ids[2]]);
    assert_eq!(o.store().len(), 3);
  }

  #[test]
  fn filters_are_a_conjunction() {
    let (mut o, ids) = orchestrator(Role::Admin);
    o.select(ids[2]);
    o.request_edit();
    o.draft_mut().unwrap().status = StudentStatus::Inactive;
    o.save_edit().unwrap();
    o.close();

    o.set_class_filter(Some("1º Ano A".into()));
    o.set_status_filter(Some(StudentStatus::Active));
    let visible: Vec<_> = o.visible_students().iter().map(|s| s.id()).collect();
    assert_eq!(visible, vec![ids[0]]);

    o.clear_filters();
    assert_eq!(o.state(), ViewState::Idle);
  }

  #[test]
  fn select_request_edit_and_save_refreshes_detail() {
    let (mut o, ids) = orchestrator(Role::Secretary);
    assert!(o.select(ids[0]));
    assert_eq!(o.state(), ViewState::DetailOpen);

    assert!(o.request_edit());
    assert_eq!(o.state(), ViewState::EditOpen);
    assert!(o.detail().is_none());
    o.draft_mut().unwrap().profile.name = "Ana Clara".into();
    o.save_edit().unwrap();

    assert_eq!(o.state(), ViewState::DetailOpen);
    assert_eq!(o.detail().unwrap().name(), "Ana Clara");
    assert_eq!(o.store().get(ids[0]).unwrap().name(), "Ana Clara");
  }

  #[test]
  fn edit_from_list_returns_to_list() {
    let (mut o, ids) = orchestrator(Role::Admin);
    assert!(o.request_edit_for(ids[1]));
    o.draft_mut().unwrap().profile.phone = Some("123".into());
    o.save_edit().unwrap();
    assert_eq!(o.state(), ViewState::Idle);
    assert_eq!(
      o.store().get(ids[1]).unwrap().profile.phone.as_deref(),
      Some("123")
    );
  }

  #[test]
  fn invalid_edit_keeps_form_open_and_store_untouched() {
    let (mut o, ids) = orchestrator(Role::Admin);
    let before = o.store().get(ids[0]).cloned().unwrap();
    o.select(ids[0]);
    o.request_edit();
    o.draft_mut().unwrap().profile.guardian_contact.clear();

    let err = o.save_edit().unwrap_err();
    assert!(err.is_validation());
    assert_eq!(o.state(), ViewState::EditOpen);
    assert!(o.draft().unwrap().profile.guardian_contact.is_empty());
    assert_eq!(o.store().get(ids[0]), Some(&before));
    assert_eq!(o.take_notice().unwrap().level, NoticeLevel::Warning);
  }

  #[test]
  fn cancel_discards_edit_without_update() {
    let (mut o, ids) = orchestrator(Role::Admin);
    o.store_mut().drain_pending_writes();
    o.select(ids[0]);
    o.request_edit();
    o.draft_mut().unwrap().profile.name = "Changed".into();
    o.close();
    assert_eq!(o.state(), ViewState::Idle);
    assert_eq!(o.store().get(ids[0]).unwrap().name(), "Ana");
    assert!(o.store_mut().drain_pending_writes().is_empty());
  }

  #[test]
  fn closing_keeps_filters() {
    let (mut o, ids) = orchestrator(Role::Admin);
    o.set_status_filter(Some(StudentStatus::Active));
    o.select(ids[1]);
    o.close();
    assert_eq!(o.state(), ViewState::ListFiltered);
  }

  #[test]
  fn deep_link_to_absent_id_is_a_silent_no_op() {
    let (mut o, _) = orchestrator(Role::Admin);
    assert!(!o.open_deep_link(Uuid::new_v4()));
    assert_eq!(o.state(), ViewState::Idle);
    assert!(o.take_notice().is_none());
  }

  #[test]
  fn deep_link_opens_detail_only_from_the_list() {
    let (mut o, ids) = orchestrator(Role::Admin);
    assert!(o.open_create());
    assert!(!o.open_deep_link(ids[0]));
    assert_eq!(o.state(), ViewState::CreateOpen);
    o.close();
    assert!(o.open_deep_link(ids[0]));
    assert_eq!(o.detail().unwrap().id(), ids[0]);
  }

  #[test]
  fn create_requires_capability_and_returns_to_list() {
    let (mut o, _) = orchestrator(Role::Teacher);
    assert!(!o.open_create());
    assert_eq!(o.state(), ViewState::Idle);

    let (mut o, _) = orchestrator(Role::Secretary);
    assert!(o.open_create());
    let err = o.submit_create(NewStudent::new(profile("", "1º Ano A"))).unwrap_err();
    assert!(err.is_validation());
    assert_eq!(o.state(), ViewState::CreateOpen);

    let created = o.submit_create(NewStudent::new(profile("Davi", "3º Ano A"))).unwrap();
    assert_eq!(o.state(), ViewState::Idle);
    assert_eq!(o.store().len(), 4);
    assert_eq!(o.store().get(created.id()).unwrap().status, StudentStatus::Active);
  }

  #[test]
  fn edit_is_withheld_without_capability() {
    let (mut o, ids) = orchestrator(Role::Finance);
    assert!(o.select(ids[0]));
    assert!(!o.request_edit());
    assert!(!o.request_edit_for(ids[0]));
    assert_eq!(o.state(), ViewState::DetailOpen);
    assert!(o.begin_avatar_upload().is_none());
    let appended = o
      .append_entry(EntryInput::Grade(GradeInput {
        subject: "Português".into(),
        term:    "1º".into(),
        score:   8.0,
      }))
      .unwrap();
    assert!(!appended);
    assert!(o.store().get(ids[0]).unwrap().grades.is_empty());
  }

  #[test]
  fn append_entry_updates_store_and_snapshot() {
    let (mut o, ids) = orchestrator(Role::Teacher);
    o.select(ids[0]);
    let day = |d| NaiveDate::from_ymd_opt(2024, 6, d).unwrap();
    for (d, title) in [(2, "A"), (1, "B")] {
      let input = EntryInput::Agenda(AgendaInput {
        date:    day(d),
        title:   title.into(),
        message: String::new(),
      });
      assert!(o.append_entry(input).unwrap());
    }
    let titles: Vec<_> = o.detail().unwrap().agenda.iter().map(|e| e.title.clone()).collect();
    assert_eq!(titles, vec!["A", "B"]);
    assert_eq!(o.store().get(ids[0]).unwrap().agenda.len(), 2);

    let first = o.detail().unwrap().agenda[0].entry_id;
    assert!(o.mark_agenda_delivered(first).unwrap());
    assert!(o.detail().unwrap().agenda[0].delivered);
  }

  #[test]
  fn append_entry_rejects_invalid_payload() {
    let (mut o, ids) = orchestrator(Role::Admin);
    o.select(ids[0]);
    let result = o.append_entry(EntryInput::Grade(GradeInput {
      subject: String::new(),
      term:    "1º".into(),
      score:   5.0,
    }));
    assert!(result.unwrap_err().is_validation());
    assert_eq!(o.state(), ViewState::DetailOpen);
  }

  #[test]
  fn avatar_from_detail_goes_through_store_update() {
    let (mut o, ids) = orchestrator(Role::Admin);
    o.select(ids[0]);
    let ticket = o.begin_avatar_upload().unwrap();
    let outcome = o
      .complete_avatar_upload(ticket, "data:image/png;base64,AAAA".into())
      .unwrap();
    assert_eq!(outcome, AvatarOutcome::Saved);
    assert!(o.store().get(ids[0]).unwrap().avatar.is_some());
    assert!(o.detail().unwrap().avatar.is_some());
  }

  #[test]
  fn avatar_in_edit_lands_in_draft_only() {
    let (mut o, ids) = orchestrator(Role::Admin);
    o.request_edit_for(ids[0]);
    let ticket = o.begin_avatar_upload().unwrap();
    let outcome = o.complete_avatar_upload(ticket, "data:x".into()).unwrap();
    assert_eq!(outcome, AvatarOutcome::Drafted);
    assert!(o.store().get(ids[0]).unwrap().avatar.is_none());
    o.save_edit().unwrap();
    assert_eq!(o.store().get(ids[0]).unwrap().avatar.as_deref(), Some("data:x"));
  }

  #[test]
  fn avatar_completion_after_view_closed_is_discarded() {
    let (mut o, ids) = orchestrator(Role::Admin);
    o.select(ids[0]);
    let ticket = o.begin_avatar_upload().unwrap();
    o.close();
    o.select(ids[0]);
    let outcome = o.complete_avatar_upload(ticket, "data:late".into()).unwrap();
    assert_eq!(outcome, AvatarOutcome::Discarded);
    assert!(o.store().get(ids[0]).unwrap().avatar.is_none());
  }

  #[test]
  fn visible_list_is_empty_without_view_capability() {
    let store = StudentStore::loaded(Vec::new());
    let o = Orchestrator::new(store, Arc::new(CapabilityRegistry::default()));
    assert!(o.visible_students().is_empty());
  }

  #[test]
  fn save_against_a_vanished_student_warns_and_returns_to_idle() {
    let (mut o, ids) = orchestrator(Role::Admin);
    o.select(ids[1]);
    o.request_edit();
    o.draft_mut().unwrap().profile.phone = Some("(31) 3222-0000".into());
    *o.store_mut() = StudentStore::loaded(Vec::new());

    let err = o.save_edit().unwrap_err();
    assert!(matches!(err, Error::StudentNotFound(id) if id == ids[1]));
    assert_eq!(o.state(), ViewState::Idle);
    assert!(o.store().is_empty());
    let notice = o.take_notice().unwrap();
    assert_eq!(notice.level, NoticeLevel::Warning);
  }

  #[test]
  fn append_against_a_vanished_student_warns_and_returns_to_idle() {
    let (mut o, ids) = orchestrator(Role::Admin);
    o.select(ids[0]);
    *o.store_mut() = StudentStore::loaded(Vec::new());

    let grade = EntryInput::Grade(GradeInput {
      subject: "Ciências".into(),
      term:    "2º Bimestre".into(),
      score:   9.0,
    });
    let err = o.append_entry(grade).unwrap_err();
    assert!(matches!(err, Error::StudentNotFound(id) if id == ids[0]));
    assert_eq!(o.state(), ViewState::Idle);
    assert!(o.detail().is_none());
    assert_eq!(o.take_notice().unwrap().level, NoticeLevel::Warning);
  }
}
