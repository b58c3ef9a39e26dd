use super::Palette;
use crate::app::App;
use ratatui::{
    Frame,
    layout::{Constraint, Direction, Layout},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Paragraph, Wrap},
};

pub fn render<S, P>(app: &App<S, P>, frame: &mut Frame, palette: &Palette) {
    let area = frame.area();
    let session = &app.session;

    let body: Vec<Line> = match session.frame() {
        Some(content) if !content.text_lines().is_empty() => content
            .text_lines()
            .iter()
            .map(|l| Line::from(l.as_str()))
            .collect(),
        Some(_) => vec![Line::styled("(empty document)", Style::default().fg(palette.dim))],
        None if session.is_loading() => vec![Line::styled(
            "Loading...",
            Style::default().fg(Color::Yellow),
        )],
        None => Vec::new(),
    };

    // Fullscreen: the frame text alone, no chrome
    if session.is_fullscreen() {
        let paragraph = Paragraph::new(body)
            .wrap(Wrap { trim: false })
            .scroll((session.scroll(), 0));
        frame.render_widget(paragraph, area);
        return;
    }

    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(3),
            Constraint::Min(3),
            Constraint::Length(1),
        ])
        .split(area);

    // ── Header ──
    let header = match session.meta() {
        Some(meta) => Line::from(vec![
            Span::styled(
                format!(" {}", meta.name),
                Style::default().fg(palette.accent).add_modifier(Modifier::BOLD),
            ),
            Span::raw("  "),
            Span::styled(meta.author.clone(), Style::default().fg(Color::Yellow)),
            Span::raw("  "),
            Span::styled(
                meta.author_link.clone(),
                Style::default().fg(palette.dim).add_modifier(Modifier::UNDERLINED),
            ),
        ]),
        None => {
            let name = session.current().map(|z| z.name.as_str()).unwrap_or("");
            Line::from(Span::styled(
                format!(" {}", name),
                Style::default().fg(palette.accent).add_modifier(Modifier::BOLD),
            ))
        }
    };
    frame.render_widget(
        Paragraph::new(header).block(
            Block::default()
                .borders(Borders::BOTTOM)
                .border_style(Style::default().fg(palette.dim)),
        ),
        chunks[0],
    );

    // ── Frame ──
    let title = match session.frame() {
        Some(content) => format!(
            " Frame #{} ({} bytes) ",
            content.id(),
            content.document().html().len()
        ),
        None => " Frame ".to_string(),
    };
    let paragraph = Paragraph::new(body)
        .block(
            Block::default()
                .borders(Borders::ALL)
                .border_style(Style::default().fg(palette.accent))
                .title(title),
        )
        .wrap(Wrap { trim: false })
        .scroll((session.scroll(), 0));
    frame.render_widget(paragraph, chunks[1]);

    // ── Status bar ──
    let key = |k: &'static str| {
        Span::styled(k, Style::default().fg(palette.accent).add_modifier(Modifier::BOLD))
    };
    let status_line = Line::from(vec![
        key(" Esc"),
        Span::raw(" Close  "),
        key("↑↓"),
        Span::raw(" Scroll  "),
        key("f"),
        Span::raw(" Fullscreen  "),
        key("b"),
        Span::raw(" Blank tab  "),
        key("d"),
        Span::raw(" Download  "),
        Span::styled(&app.status_msg, Style::default().fg(palette.dim)),
    ]);
    frame.render_widget(Paragraph::new(status_line), chunks[2]);
}
