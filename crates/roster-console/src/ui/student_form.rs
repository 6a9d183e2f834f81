//! Add/edit student form pane.

use ratatui::{
  Frame,
  layout::Rect,
  style::{Color, Modifier, Style},
  text::{Line, Span},
  widgets::{Block, Borders, Paragraph},
};
use roster_core::orchestrator::ViewState;

use crate::{app::App, form::FormMode};

/// Render the open form into `area`.
pub fn draw(f: &mut Frame, area: Rect, app: &App) {
  let Some(form) = &app.form else {
    return;
  };

  let title = match (form.mode, app.roster.draft()) {
    (FormMode::Create, _) => " Novo aluno ".to_string(),
    (FormMode::Edit, Some(draft)) => format!(" Editando {} ", draft.name()),
    (FormMode::Edit, None) => " Editar ".to_string(),
  };
  let border = if app.roster.state() == ViewState::CreateOpen {
    Color::Green
  } else {
    Color::Yellow
  };
  let block = Block::default()
    .title(title)
    .borders(Borders::ALL)
    .border_style(Style::default().fg(border));
  let inner = block.inner(area);
  f.render_widget(block, area);

  let current = form.current();
  let mut lines: Vec<Line> = form
    .fields()
    .iter()
    .map(|&key| {
      let marker = if key.is_required() { "*" } else { " " };
      let label_style = if key == current {
        Style::default()
          .fg(Color::Black)
          .bg(Color::Cyan)
          .add_modifier(Modifier::BOLD)
      } else {
        Style::default().fg(Color::Cyan)
      };
      let value = if key.is_choice() {
        format!("‹ {} ›", form.value(key))
      } else if key == current {
        format!("{}_", form.value(key))
      } else {
        form.value(key).to_string()
      };
      Line::from(vec![
        Span::styled(format!("{marker}{:<24}", key.label()), label_style),
        Span::raw(" "),
        Span::raw(value),
      ])
    })
    .collect();

  if form.mode == FormMode::Edit {
    let photo = match app.roster.draft().and_then(|d| d.avatar.as_ref()) {
      Some(_) => "foto anexada",
      None => "sem foto",
    };
    lines.push(Line::from(""));
    lines.push(Line::from(Span::styled(
      format!(" Foto: {photo}"),
      Style::default().fg(Color::DarkGray),
    )));
  }

  lines.push(Line::from(""));
  lines.push(Line::from(Span::styled(
    " * obrigatório",
    Style::default().fg(Color::DarkGray),
  )));

  f.render_widget(Paragraph::new(lines), inner);
}
