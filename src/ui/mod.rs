pub mod grid;
mod help;
pub mod popup;
mod viewer;

use crate::app::App;
use crate::cosmetic::Theme;
use ratatui::{
    Frame,
    layout::{Constraint, Direction, Layout, Rect},
    style::{Color, Style},
    widgets::Block,
};

/// Colours for the current theme.
#[derive(Debug, Clone, Copy)]
pub struct Palette {
    pub bg: Color,
    pub fg: Color,
    pub accent: Color,
    pub dim: Color,
    pub highlight_bg: Color,
}

impl Palette {
    pub fn for_theme(theme: Theme) -> Self {
        match theme {
            Theme::Light => Self {
                bg: Color::Reset,
                fg: Color::Reset,
                accent: Color::Cyan,
                dim: Color::DarkGray,
                highlight_bg: Color::DarkGray,
            },
            Theme::Dark => Self {
                bg: Color::Black,
                fg: Color::Gray,
                accent: Color::Magenta,
                dim: Color::DarkGray,
                highlight_bg: Color::Rgb(40, 40, 60),
            },
        }
    }
}

/// Top-level render dispatch.
pub fn render<S, P>(app: &App<S, P>, frame: &mut Frame) {
    let palette = Palette::for_theme(app.cosmetic.theme());
    frame.render_widget(
        Block::default().style(Style::default().bg(palette.bg).fg(palette.fg)),
        frame.area(),
    );

    if app.viewer_active() {
        viewer::render(app, frame, &palette);
    } else {
        grid::render(app, frame, &palette);
    }

    if let Some(popup) = app.cosmetic.popup() {
        popup::render_popup(popup, frame, &palette);
    }

    // Render help overlay on top if active
    if app.show_help {
        help::render(frame);
    }

    if let Some(message) = &app.alert {
        popup::render_alert(message, frame);
    }
}

/// Create a centered rectangle using percentage of parent area.
pub fn centered_rect(percent_x: u16, percent_y: u16, area: Rect) -> Rect {
    let vertical = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Percentage((100 - percent_y) / 2),
            Constraint::Percentage(percent_y),
            Constraint::Percentage((100 - percent_y) / 2),
        ])
        .split(area);

    let horizontal = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([
            Constraint::Percentage((100 - percent_x) / 2),
            Constraint::Percentage(percent_x),
            Constraint::Percentage((100 - percent_x) / 2),
        ])
        .split(vertical[1]);

    horizontal[1]
}

/// Truncate a string to `max_width` columns, adding "…" if truncated.
pub fn truncate_str(s: &str, max_width: usize) -> String {
    use unicode_width::{UnicodeWidthChar, UnicodeWidthStr};

    if s.width() <= max_width {
        return s.to_string();
    }
    let mut result = String::new();
    let mut width = 0;
    for c in s.chars() {
        let w = c.width().unwrap_or(0);
        if width + w + 1 > max_width {
            break;
        }
        result.push(c);
        width += w;
    }
    result.push('…');
    result
}
