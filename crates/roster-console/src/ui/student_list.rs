//! Student list pane, left panel of the students screen.

use ratatui::{
  Frame,
  layout::Rect,
  style::{Color, Modifier, Style},
  text::{Line, Span},
  widgets::{Block, Borders, List, ListItem, ListState, Paragraph},
};
use roster_core::capability::CREATE_STUDENTS;

use crate::app::App;

/// Render the student list into `area`.
pub fn draw(f: &mut Frame, area: Rect, app: &App) {
  let store = app.roster.store();
  let rows = app.list_rows();
  let filters = app.roster.filters();

  let title = if filters.is_active() || !app.search.is_empty() {
    format!(" Alunos ({}/{}) ", rows.len(), store.len())
  } else {
    format!(" Alunos ({}) ", store.len())
  };

  let block = Block::default()
    .title(title)
    .borders(Borders::ALL)
    .border_style(Style::default().fg(Color::DarkGray));
  let mut inner = block.inner(area);
  f.render_widget(block, area);

  if store.is_loading() {
    f.render_widget(
      Paragraph::new("Carregando…").style(Style::default().fg(Color::DarkGray)),
      inner,
    );
    return;
  }

  // Header lines: active filters and the gated add action.
  let mut header: Vec<Line> = Vec::new();
  if filters.is_active() {
    let class = filters.class_name.as_deref().unwrap_or("todas");
    let status = filters
      .status
      .as_ref()
      .map_or("todas", |s| s.label());
    header.push(Line::from(Span::styled(
      format!("Turma: {class}  Situação: {status}"),
      Style::default().fg(Color::Yellow),
    )));
  }
  if let Some(action) = app.roster.gate().render(CREATE_STUDENTS, "[a] Adicionar aluno") {
    header.push(Line::from(Span::styled(action, Style::default().fg(Color::Green))));
  }
  if !header.is_empty() && inner.height > header.len() as u16 {
    let header_area = Rect { height: header.len() as u16, ..inner };
    inner.y += header_area.height;
    inner.height -= header_area.height;
    f.render_widget(Paragraph::new(header), header_area);
  }

  // Search bar at the bottom of the inner area.
  if (app.search_active || !app.search.is_empty()) && inner.height > 2 {
    let search_area = Rect {
      x:      inner.x,
      y:      inner.y + inner.height - 1,
      width:  inner.width,
      height: 1,
    };
    inner.height = inner.height.saturating_sub(1);

    let text = if app.search_active {
      format!("/{}_", app.search)
    } else {
      format!("/{}", app.search)
    };
    f.render_widget(
      Paragraph::new(text).style(Style::default().fg(Color::Yellow)),
      search_area,
    );
  }

  if rows.is_empty() {
    let empty = if store.is_empty() {
      "Nenhum aluno cadastrado."
    } else {
      "Nenhum aluno corresponde aos filtros."
    };
    f.render_widget(
      Paragraph::new(empty).style(Style::default().fg(Color::DarkGray)),
      inner,
    );
    return;
  }

  let items: Vec<ListItem> = rows
    .iter()
    .map(|student| {
      ListItem::new(Line::from(vec![
        Span::raw(student.name().to_string()),
        Span::styled(
          format!("  {} · {}", student.class_name(), student.status.label()),
          Style::default().fg(Color::DarkGray),
        ),
      ]))
    })
    .collect();

  let mut state = ListState::default();
  state.select(Some(app.list_cursor.min(rows.len() - 1)));

  f.render_stateful_widget(
    List::new(items).highlight_style(
      Style::default()
        .bg(Color::Blue)
        .fg(Color::White)
        .add_modifier(Modifier::BOLD),
    ),
    inner,
    &mut state,
  );
}
