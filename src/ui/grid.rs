use super::{Palette, truncate_str};
use crate::app::{App, InputMode};
use crate::view::{Tile, TileTarget};
use ratatui::{
    Frame,
    layout::{Alignment, Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Paragraph, Wrap},
};
use std::rc::Rc;

pub const TILE_WIDTH: u16 = 28;
pub const TILE_HEIGHT: u16 = 4;

const FILTER_LABEL_EDITING: &str = " 🔍 Search (Enter to apply, Esc to cancel): ";
const FILTER_LABEL: &str = " 🔍 Search (/): ";

/// header(3) + search(3) + grid(min) + status(1)
pub fn screen_chunks(area: Rect) -> Rc<[Rect]> {
    Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(3),
            Constraint::Length(3),
            Constraint::Min(5),
            Constraint::Length(1),
        ])
        .split(area)
}

fn grid_block(palette: &Palette) -> Block<'static> {
    Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(palette.dim))
        .title(" Zones ")
}

/// Area inside the grid border where tiles are placed.
pub fn grid_inner(screen: Rect) -> Rect {
    Block::default().borders(Borders::ALL).inner(screen_chunks(screen)[2])
}

/// Columns and rows of tiles that fit in `inner`.
pub fn grid_shape(inner: Rect) -> (usize, usize) {
    let columns = (inner.width / TILE_WIDTH).max(1) as usize;
    let rows = (inner.height / TILE_HEIGHT).max(1) as usize;
    (columns, rows)
}

/// Rectangles of the tiles visible when the grid is scrolled to `first_row`.
pub fn grid_layout(inner: Rect, count: usize, columns: usize, first_row: usize) -> Vec<(usize, Rect)> {
    let (_, rows) = grid_shape(inner);
    let start = first_row * columns;
    let end = (start + rows * columns).min(count);
    (start..end)
        .filter_map(|index| {
            let slot = index - start;
            let x = inner.x + (slot % columns) as u16 * TILE_WIDTH;
            let y = inner.y + (slot / columns) as u16 * TILE_HEIGHT;
            let width = TILE_WIDTH.min(inner.right().saturating_sub(x));
            let height = TILE_HEIGHT.min(inner.bottom().saturating_sub(y));
            (width > 0 && height > 0).then(|| (index, Rect::new(x, y, width, height)))
        })
        .collect()
}

/// Tile and part of it under a screen position, if any.
pub fn hit_test<S, P>(app: &App<S, P>, screen: Rect, x: u16, y: u16) -> Option<(usize, TileTarget)> {
    let inner = grid_inner(screen);
    grid_layout(inner, app.grid.len(), app.grid_columns, app.scroll_row)
        .into_iter()
        .find(|(_, rect)| rect.contains((x, y).into()))
        .map(|(index, rect)| {
            // Label sits on the second line inside the tile border
            let target = if y == rect.y + 2 {
                TileTarget::Label
            } else {
                TileTarget::Cover
            };
            (index, target)
        })
}

/// Last path segment of a cover URL without its query.
fn cover_name(url: &str) -> &str {
    let path = url.split('?').next().unwrap_or(url);
    path.rsplit('/').next().unwrap_or(path)
}

fn render_tile(tile: &Tile, selected: bool, popularity: u64, frame: &mut Frame, area: Rect, palette: &Palette) {
    let border_style = if selected {
        Style::default().fg(palette.accent).add_modifier(Modifier::BOLD)
    } else {
        Style::default().fg(palette.dim)
    };
    let inner_width = area.width.saturating_sub(2) as usize;

    let cover = Line::from(vec![
        Span::styled("▣ ", Style::default().fg(palette.accent)),
        Span::styled(
            truncate_str(cover_name(&tile.image_url), inner_width.saturating_sub(2)),
            Style::default().fg(palette.dim),
        ),
    ]);
    let label_style = if selected {
        Style::default()
            .bg(palette.highlight_bg)
            .fg(Color::White)
            .add_modifier(Modifier::BOLD)
    } else {
        Style::default().add_modifier(Modifier::BOLD)
    };
    let label = Line::from(Span::styled(
        format!("[ {} ]", truncate_str(&tile.label, inner_width.saturating_sub(4))),
        label_style,
    ));

    let mut block = Block::default().borders(Borders::ALL).border_style(border_style);
    if popularity > 0 {
        block = block.title_bottom(
            Line::from(format!(" {} ", popularity)).alignment(Alignment::Right),
        );
    }
    frame.render_widget(Paragraph::new(vec![cover, label]).block(block), area);
}

pub fn render<S, P>(app: &App<S, P>, frame: &mut Frame, palette: &Palette) {
    let area = frame.area();
    let chunks = screen_chunks(area);

    // ── Header ──
    // A cloaked title replaces the app name
    let title = app.cosmetic.title().unwrap_or("Zone Explorer");
    let mut header_spans = vec![
        Span::styled(
            format!(" {}", title),
            Style::default().fg(palette.accent).add_modifier(Modifier::BOLD),
        ),
        Span::styled(
            format!("   Sort: {}", app.sort_key.label()),
            Style::default().fg(Color::Yellow),
        ),
    ];
    if !app.grid.count_label.is_empty() {
        header_spans.insert(
            1,
            Span::styled(
                format!("   [{}]", app.grid.count_label),
                Style::default().fg(palette.dim),
            ),
        );
    }
    if let Some(icon) = app.cosmetic.icon() {
        header_spans.push(Span::styled(
            format!("   icon: {}", icon),
            Style::default().fg(palette.dim),
        ));
    }
    let header = Paragraph::new(Line::from(header_spans))
        .alignment(Alignment::Left)
        .block(
            Block::default()
                .borders(Borders::BOTTOM)
                .border_style(Style::default().fg(palette.dim)),
        );
    frame.render_widget(header, chunks[0]);

    // ── Search bar ──
    let filter_style = match app.input_mode {
        InputMode::Editing => Style::default().fg(Color::Yellow),
        InputMode::Normal => Style::default().fg(palette.dim),
    };
    let filter_label = if app.input_mode == InputMode::Editing {
        FILTER_LABEL_EDITING
    } else {
        FILTER_LABEL
    };
    let search_bar = Paragraph::new(format!("{}{}", filter_label, app.query))
        .style(filter_style)
        .block(
            Block::default()
                .borders(Borders::ALL)
                .border_style(filter_style)
                .title(" Search "),
        );
    frame.render_widget(search_bar, chunks[1]);

    if app.input_mode == InputMode::Editing {
        use unicode_width::UnicodeWidthStr;
        let cursor_x = chunks[1].x + 1 + (filter_label.width() + app.query.width()) as u16;
        frame.set_cursor_position((cursor_x, chunks[1].y + 1));
    }

    // ── Grid ──
    let block = grid_block(palette);
    let inner = block.inner(chunks[2]);
    frame.render_widget(block, chunks[2]);

    if let Some(err) = &app.load_error {
        let message = Paragraph::new(err.as_str())
            .style(Style::default().fg(Color::Red))
            .wrap(Wrap { trim: true });
        frame.render_widget(message, inner);
    } else if app.is_catalog_pending() {
        let message = Paragraph::new("Loading zones...")
            .style(Style::default().fg(Color::Yellow))
            .alignment(Alignment::Center);
        frame.render_widget(message, inner);
    } else if app.grid.is_empty() {
        let message = Paragraph::new(app.grid.count_label.as_str())
            .style(Style::default().fg(palette.dim))
            .alignment(Alignment::Center);
        frame.render_widget(message, inner);
    } else {
        for (index, rect) in grid_layout(inner, app.grid.len(), app.grid_columns, app.scroll_row) {
            let tile = &app.grid.tiles[index];
            let popularity = app.catalog.popularity(tile.zone_id);
            render_tile(tile, index == app.selected, popularity, frame, rect, palette);
        }
    }

    // ── Status bar ──
    let key = |k: &'static str| {
        Span::styled(k, Style::default().fg(palette.accent).add_modifier(Modifier::BOLD))
    };
    let status_line = Line::from(vec![
        key(" ←↑↓→"),
        Span::raw(" Navigate  "),
        key("/"),
        Span::raw(" Search  "),
        key("Enter"),
        Span::raw(" Open  "),
        key("s"),
        Span::raw(" Sort  "),
        key("o"),
        Span::raw(" Settings  "),
        key("?"),
        Span::raw(" Help  "),
        key("q"),
        Span::raw(" Quit  "),
        Span::styled(&app.status_msg, Style::default().fg(palette.dim)),
    ]);
    frame.render_widget(Paragraph::new(status_line), chunks[3]);
}
