//! Dashboard and the screens that only carry a heading for now.

use std::collections::BTreeMap;

use ratatui::{
  Frame,
  layout::Rect,
  style::{Color, Modifier, Style},
  text::{Line, Span},
  widgets::{Block, Borders, Paragraph},
};
use roster_core::{capability::VIEW_STUDENTS, nav::Destination};

use crate::app::App;

/// Headcounts by class and status.
pub fn draw(f: &mut Frame, area: Rect, app: &App) {
  let block = Block::default()
    .title(" Painel ")
    .borders(Borders::ALL)
    .border_style(Style::default().fg(Color::DarkGray));
  let inner = block.inner(area);
  f.render_widget(block, area);

  let store = app.roster.store();
  if !app.roster.gate().allows(VIEW_STUDENTS) {
    f.render_widget(Paragraph::new("Bem-vindo."), inner);
    return;
  }
  if store.is_loading() {
    f.render_widget(
      Paragraph::new("Carregando…").style(Style::default().fg(Color::DarkGray)),
      inner,
    );
    return;
  }

  let mut by_class: BTreeMap<&str, usize> = BTreeMap::new();
  let mut by_status: BTreeMap<&str, usize> = BTreeMap::new();
  for s in store.list() {
    *by_class.entry(s.class_name()).or_default() += 1;
    *by_status.entry(s.status.label()).or_default() += 1;
  }

  let heading = |text: &str| {
    Line::from(Span::styled(
      text.to_string(),
      Style::default()
        .fg(Color::Cyan)
        .add_modifier(Modifier::BOLD),
    ))
  };

  let mut lines = vec![
    Line::from(format!("Total de alunos: {}", store.len())),
    Line::from(""),
    heading("Por turma"),
  ];
  lines.extend(
    by_class
      .iter()
      .map(|(class, n)| Line::from(format!("  {class:<16}{n:>4}"))),
  );
  lines.push(Line::from(""));
  lines.push(heading("Por situação"));
  lines.extend(
    by_status
      .iter()
      .map(|(status, n)| Line::from(format!("  {status:<16}{n:>4}"))),
  );

  f.render_widget(Paragraph::new(lines), inner);
}

pub fn draw_placeholder(f: &mut Frame, area: Rect, destination: Destination) {
  let block = Block::default()
    .title(format!(" {} ", destination.label()))
    .borders(Borders::ALL)
    .border_style(Style::default().fg(Color::DarkGray));
  let inner = block.inner(area);
  f.render_widget(block, area);
  f.render_widget(
    Paragraph::new("Nada para mostrar aqui ainda.").style(Style::default().fg(Color::DarkGray)),
    inner,
  );
}
