//! Student detail pane: profile header plus one tab per nested collection.

use ratatui::{
  Frame,
  layout::{Constraint, Direction, Layout, Rect},
  style::{Color, Modifier, Style},
  text::{Line, Span},
  widgets::{Block, Borders, List, ListItem, ListState, Paragraph, Tabs},
};
use roster_core::{
  capability::EDIT_STUDENTS, editors::NestedCollection, student::Student,
};

use crate::app::App;

// ─── Public entry ─────────────────────────────────────────────────────────────

/// Render the open detail snapshot into `area`.
pub fn draw(f: &mut Frame, area: Rect, app: &App) {
  let Some(student) = app.roster.detail() else {
    return;
  };

  let block = Block::default()
    .title(format!(" {} ", student.name()))
    .borders(Borders::ALL)
    .border_style(Style::default().fg(Color::Cyan));
  let inner = block.inner(area);
  f.render_widget(block, area);

  let rows = Layout::default()
    .direction(Direction::Vertical)
    .constraints([
      Constraint::Length(6), // profile
      Constraint::Length(1), // tabs
      Constraint::Min(0),    // entries
    ])
    .split(inner);

  draw_profile(f, rows[0], student);
  draw_tabs(f, rows[1], app);
  draw_entries(f, rows[2], app, student);
}

// ─── Profile ──────────────────────────────────────────────────────────────────

fn field(label: &str, value: impl Into<String>) -> Line<'static> {
  Line::from(vec![
    Span::styled(
      format!("{label:<14}"),
      Style::default()
        .fg(Color::Cyan)
        .add_modifier(Modifier::BOLD),
    ),
    Span::raw(value.into()),
  ])
}

fn draw_profile(f: &mut Frame, area: Rect, student: &Student) {
  let p = &student.profile;
  let photo = match student.avatar.as_deref() {
    Some(url) => url
      .strip_prefix("data:")
      .and_then(|rest| rest.split(';').next())
      .unwrap_or("foto")
      .to_string(),
    None => "sem foto".to_string(),
  };

  let lines = vec![
    field("Turma", format!("{}  ({})", p.class_name, student.status.label())),
    field("Responsável", format!("{}  {}", p.guardian_name, p.guardian_contact)),
    field(
      "Matrícula",
      student.enrollment_date.format("%d/%m/%Y").to_string(),
    ),
    field(
      "Contato",
      [p.email.as_deref(), p.phone.as_deref()]
        .into_iter()
        .flatten()
        .collect::<Vec<_>>()
        .join("  "),
    ),
    field("Foto", photo),
    field("Saúde", p.medical_notes.clone().unwrap_or_else(|| "—".into())),
  ];
  f.render_widget(Paragraph::new(lines), area);
}

// ─── Tabs ─────────────────────────────────────────────────────────────────────

fn draw_tabs(f: &mut Frame, area: Rect, app: &App) {
  let titles: Vec<&str> = NestedCollection::ALL.iter().map(|c| c.label()).collect();
  let selected = NestedCollection::ALL
    .iter()
    .position(|c| *c == app.detail_tab)
    .unwrap_or(0);
  f.render_widget(
    Tabs::new(titles)
      .select(selected)
      .highlight_style(Style::default().fg(Color::Yellow).add_modifier(Modifier::BOLD)),
    area,
  );
}

// ─── Entries ──────────────────────────────────────────────────────────────────

fn draw_entries(f: &mut Frame, area: Rect, app: &App, student: &Student) {
  let lines = entry_lines(app.detail_tab, student);

  if lines.is_empty() {
    let mut hint = vec![Line::from(Span::styled(
      "Nenhum registro.",
      Style::default().fg(Color::DarkGray),
    ))];
    if let Some(action) = app.roster.gate().render(EDIT_STUDENTS, "[n] Adicionar registro") {
      hint.push(Line::from(Span::styled(action, Style::default().fg(Color::Green))));
    }
    f.render_widget(Paragraph::new(hint), area);
    return;
  }

  let mut state = ListState::default();
  state.select(Some(app.detail_cursor.min(lines.len() - 1)));

  let items: Vec<ListItem> = lines.into_iter().map(ListItem::new).collect();
  f.render_stateful_widget(
    List::new(items).highlight_style(Style::default().bg(Color::Blue).fg(Color::White)),
    area,
    &mut state,
  );
}

fn dim(s: String) -> Span<'static> { Span::styled(s, Style::default().fg(Color::DarkGray)) }

fn entry_lines(tab: NestedCollection, s: &Student) -> Vec<Line<'static>> {
  match tab {
    NestedCollection::Grades => s
      .grades
      .iter()
      .map(|g| {
        Line::from(vec![
          Span::raw(format!("{:<16}{:<14}", g.subject, g.term)),
          Span::styled(format!("{:>5.1}", g.score), Style::default().fg(Color::Yellow)),
          dim(format!("  {}", g.recorded_on.format("%d/%m/%Y"))),
        ])
      })
      .collect(),
    NestedCollection::Attendance => s
      .attendance
      .iter()
      .map(|a| {
        Line::from(vec![
          Span::raw(format!("{}  {}", a.date.format("%d/%m/%Y"), a.mark.label())),
          dim(a.note.as_deref().map(|n| format!("  {n}")).unwrap_or_default()),
        ])
      })
      .collect(),
    NestedCollection::Occurrences => s
      .occurrences
      .iter()
      .map(|o| {
        Line::from(vec![
          Span::raw(format!("{}  {}: {}", o.date.format("%d/%m/%Y"), o.kind, o.description)),
          dim(o.reported_by.as_deref().map(|r| format!("  ({r})")).unwrap_or_default()),
        ])
      })
      .collect(),
    NestedCollection::Documents => s
      .documents
      .iter()
      .map(|d| {
        Line::from(vec![
          Span::raw(format!("{}  [{}]", d.name, d.kind)),
          dim(format!("  {}  {}", d.reference, d.uploaded_on.format("%d/%m/%Y"))),
        ])
      })
      .collect(),
    NestedCollection::Agenda => s
      .agenda
      .iter()
      .map(|e| {
        let mark = if e.delivered { "✓" } else { "·" };
        Line::from(vec![
          Span::styled(
            format!("{mark} "),
            Style::default().fg(if e.delivered { Color::Green } else { Color::Yellow }),
          ),
          Span::raw(format!("{}  {}", e.date.format("%d/%m/%Y"), e.title)),
          dim(if e.message.is_empty() {
            String::new()
          } else {
            format!("  {}", e.message)
          }),
        ])
      })
      .collect(),
    NestedCollection::Communications => s
      .communications
      .iter()
      .map(|c| {
        Line::from(vec![
          Span::raw(format!(
            "{}  {:<9}{}",
            c.sent_at.format("%d/%m/%Y"),
            c.channel.label(),
            c.subject
          )),
          dim(if c.message.is_empty() {
            String::new()
          } else {
            format!("  {}", c.message)
          }),
        ])
      })
      .collect(),
  }
}
