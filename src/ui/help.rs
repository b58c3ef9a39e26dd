use super::centered_rect;
use ratatui::{
    Frame,
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Clear, Paragraph, Wrap},
};

fn section(title: &'static str) -> Line<'static> {
    Line::from(Span::styled(
        title,
        Style::default().fg(Color::Cyan).add_modifier(Modifier::BOLD),
    ))
}

fn binding(keys: &'static str, action: &'static str) -> Line<'static> {
    Line::from(vec![
        Span::styled(format!("    {:<10}", keys), Style::default().fg(Color::Yellow)),
        Span::raw(action),
    ])
}

pub fn render(frame: &mut Frame) {
    let area = centered_rect(70, 70, frame.area());

    // Clear the area behind the popup
    frame.render_widget(Clear, area);

    let help_text = vec![
        Line::from(""),
        section("  Global"),
        binding("?", "Toggle this help"),
        binding("o", "Settings (dark mode, tab cloak, contact)"),
        binding("c", "Tab cloak"),
        Line::from(""),
        section("  Zone Grid"),
        binding("←↑↓→/hjkl", "Move between tiles"),
        binding("Enter", "Open selected zone"),
        binding("/", "Search by name or tag"),
        binding("s", "Cycle sort (name, id, popular)"),
        binding("g/G", "Jump to first/last zone"),
        binding("PgUp/PgDn", "Scroll one screen"),
        binding("Esc", "Clear search"),
        binding("q", "Quit application"),
        Line::from(""),
        section("  Zone Viewer"),
        binding("↑/↓", "Scroll content"),
        binding("f", "Fullscreen"),
        binding("b", "Open in blank tab"),
        binding("d", "Download HTML"),
        binding("Esc", "Leave fullscreen / close zone"),
        binding("q", "Close zone"),
        Line::from(""),
    ];

    let help = Paragraph::new(help_text)
        .wrap(Wrap { trim: false })
        .block(
            Block::default()
                .borders(Borders::ALL)
                .border_style(Style::default().fg(Color::Cyan))
                .title(" Help: Keybindings ")
                .title_bottom(Line::from(" Press ? or Esc to close ").style(Style::default().fg(Color::DarkGray))),
        )
        .style(Style::default().fg(Color::White));

    frame.render_widget(help, area);
}
