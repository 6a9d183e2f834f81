//! TUI rendering for all panes.

pub mod dashboard;
pub mod student_detail;
pub mod student_form;
pub mod student_list;

use chrono::Local;
use ratatui::{
  Frame,
  layout::{Constraint, Direction, Layout, Rect},
  style::{Color, Modifier, Style},
  text::{Line, Span},
  widgets::{Block, Borders, List, ListItem, ListState, Paragraph},
};
use roster_core::{
  capability::{CREATE_STUDENTS, EDIT_STUDENTS},
  nav::Destination,
  orchestrator::ViewState,
};

use crate::app::{App, Focus};

// ─── Root draw ────────────────────────────────────────────────────────────────

/// Main draw function called each frame.
pub fn draw(f: &mut Frame, app: &App) {
  let area = f.area();

  // Vertical stack: header, body, status bar.
  let rows = Layout::default()
    .direction(Direction::Vertical)
    .constraints([
      Constraint::Length(1), // header
      Constraint::Min(0),    // body
      Constraint::Length(1), // status bar
    ])
    .split(area);

  draw_header(f, rows[0], app);
  draw_body(f, rows[1], app);
  draw_status(f, rows[2], app);
}

// ─── Header ───────────────────────────────────────────────────────────────────

fn draw_header(f: &mut Frame, area: Rect, app: &App) {
  let date = Local::now().format("%d/%m/%Y").to_string();

  let left = Span::styled(
    format!(" roster · {}  [Tab] menu  [q] sair", app.screen.label()),
    Style::default()
      .fg(Color::White)
      .add_modifier(Modifier::BOLD),
  );
  let right = Span::styled(format!("{date} "), Style::default().fg(Color::Gray));

  let left_width = left.content.chars().count() as u16;
  let right_width = right.content.chars().count() as u16;
  let pad = area
    .width
    .saturating_sub(left_width)
    .saturating_sub(right_width);

  let line = Line::from(vec![left, Span::raw(" ".repeat(pad as usize)), right]);

  let block = Block::default().style(Style::default().bg(Color::DarkGray));
  let inner = block.inner(area);
  f.render_widget(block, area);
  f.render_widget(Paragraph::new(line), inner);
}

// ─── Body ─────────────────────────────────────────────────────────────────────

fn draw_body(f: &mut Frame, area: Rect, app: &App) {
  let cols = Layout::default()
    .direction(Direction::Horizontal)
    .constraints([Constraint::Length(20), Constraint::Min(0)])
    .split(area);

  draw_nav(f, cols[0], app);

  match app.screen {
    Destination::Students => draw_students(f, cols[1], app),
    Destination::Dashboard => dashboard::draw(f, cols[1], app),
    other => dashboard::draw_placeholder(f, cols[1], other),
  }
}

/// Left menu: only the destinations the actor may see.
fn draw_nav(f: &mut Frame, area: Rect, app: &App) {
  let border = if app.focus == Focus::Nav {
    Color::Cyan
  } else {
    Color::DarkGray
  };
  let block = Block::default()
    .title(" Menu ")
    .borders(Borders::ALL)
    .border_style(Style::default().fg(border));

  let entries = app.nav_entries();
  let items: Vec<ListItem> = entries
    .iter()
    .map(|d| {
      let style = if *d == app.screen {
        Style::default().add_modifier(Modifier::BOLD)
      } else {
        Style::default()
      };
      ListItem::new(Span::styled(d.label(), style))
    })
    .collect();

  let mut state = ListState::default();
  if app.focus == Focus::Nav && !entries.is_empty() {
    state.select(Some(app.nav_cursor.min(entries.len() - 1)));
  }

  f.render_stateful_widget(
    List::new(items)
      .block(block)
      .highlight_style(Style::default().bg(Color::Blue).fg(Color::White)),
    area,
    &mut state,
  );
}

fn draw_students(f: &mut Frame, area: Rect, app: &App) {
  let cols = Layout::default()
    .direction(Direction::Horizontal)
    .constraints([Constraint::Percentage(35), Constraint::Percentage(65)])
    .split(area);

  student_list::draw(f, cols[0], app);

  match app.roster.state() {
    ViewState::DetailOpen => student_detail::draw(f, cols[1], app),
    ViewState::EditOpen | ViewState::CreateOpen => student_form::draw(f, cols[1], app),
    ViewState::Idle | ViewState::ListFiltered => draw_empty_detail(f, cols[1]),
  }
}

fn draw_empty_detail(f: &mut Frame, area: Rect) {
  let block = Block::default()
    .title(" Aluno ")
    .borders(Borders::ALL)
    .border_style(Style::default().fg(Color::DarkGray));
  let inner = block.inner(area);
  f.render_widget(block, area);
  f.render_widget(
    Paragraph::new("Selecione um aluno e pressione Enter.")
      .style(Style::default().fg(Color::DarkGray)),
    inner,
  );
}

// ─── Status bar ───────────────────────────────────────────────────────────────

fn draw_status(f: &mut Frame, area: Rect, app: &App) {
  if let Some(prompt) = &app.prompt {
    let line = Line::from(vec![
      Span::styled(
        format!(" {} ", prompt.hint()),
        Style::default().fg(Color::Black).bg(Color::Yellow),
      ),
      Span::raw(format!(" {}_", prompt.buffer)),
    ]);
    f.render_widget(
      Paragraph::new(line).style(Style::default().bg(Color::Black)),
      area,
    );
    return;
  }

  let gate = app.roster.gate();
  let (mode_label, hints) = if app.focus == Focus::Nav {
    ("MENU", "↑↓/jk navegar  Enter abrir  Tab voltar  q sair".to_string())
  } else if app.screen != Destination::Students {
    ("VISÃO", "Tab menu  q sair".to_string())
  } else if app.search_active {
    ("BUSCA", "Digite para filtrar  Enter confirmar  Esc limpar".to_string())
  } else {
    match app.roster.state() {
      ViewState::Idle | ViewState::ListFiltered => {
        let mut hints = vec!["↑↓/jk navegar", "Enter abrir", "/ busca", "c turma", "s situação", "x limpar"];
        hints.extend(gate.render_all([
          (CREATE_STUDENTS, "a adicionar"),
          (EDIT_STUDENTS, "e editar"),
        ]));
        ("LISTA", hints.join("  "))
      }
      ViewState::DetailOpen => {
        let mut hints = vec!["Tab aba", "↑↓ rolar", "Esc voltar"];
        hints.extend(gate.render_all([
          (EDIT_STUDENTS, "e editar"),
          (EDIT_STUDENTS, "n novo registro"),
          (EDIT_STUDENTS, "p foto"),
          (EDIT_STUDENTS, "d entregue"),
        ]));
        ("DETALHE", hints.join("  "))
      }
      ViewState::EditOpen => (
        "EDITAR",
        "Tab campo  ←→ opção  Ctrl-S salvar  Ctrl-P foto  Esc descartar".to_string(),
      ),
      ViewState::CreateOpen => (
        "NOVO",
        "Tab campo  ←→ opção  Ctrl-S salvar  Esc descartar".to_string(),
      ),
    }
  };

  let status = if app.status_msg.is_empty() {
    hints
  } else {
    app.status_msg.clone()
  };

  let mode_span = Span::styled(
    format!(" {mode_label} "),
    Style::default()
      .fg(Color::Black)
      .bg(Color::Cyan)
      .add_modifier(Modifier::BOLD),
  );
  let hint_span = Span::styled(format!("  {status}"), Style::default().fg(Color::Gray));

  let line = Line::from(vec![mode_span, hint_span]);
  f.render_widget(
    Paragraph::new(line).style(Style::default().bg(Color::Black)),
    area,
  );
}
