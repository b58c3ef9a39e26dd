use super::{Palette, centered_rect};
use crate::cosmetic::{
    CLOAK_ICON_PLACEHOLDER, CLOAK_TITLE_PLACEHOLDER, CONTACT_DISCORD, CloakField, Popup, PopupBody,
    SettingsAction,
};
use ratatui::prelude::*;
use ratatui::widgets::{Block, Borders, Clear, Paragraph, Wrap};

/// Screen area taken by the popup content box.
pub fn popup_area(screen: Rect) -> Rect {
    centered_rect(50, 40, screen)
}

pub fn render_popup(popup: &Popup, frame: &mut Frame, palette: &Palette) {
    let area = popup_area(frame.area());
    frame.render_widget(Clear, area);

    let block = Block::default()
        .title(format!(" {} ", popup.title))
        .borders(Borders::ALL)
        .border_style(Style::default().fg(palette.accent))
        .title_bottom(
            Line::from(" Esc: Close ").style(Style::default().fg(Color::DarkGray)),
        );
    let inner = block.inner(area);
    frame.render_widget(block, area);

    match &popup.body {
        PopupBody::Settings { selected } => {
            let lines: Vec<Line> = SettingsAction::ALL
                .iter()
                .enumerate()
                .map(|(i, action)| {
                    if i == *selected {
                        Line::styled(
                            format!(" ▸ {}", action.label()),
                            Style::default()
                                .bg(palette.highlight_bg)
                                .fg(Color::White)
                                .add_modifier(Modifier::BOLD),
                        )
                    } else {
                        Line::from(format!("   {}", action.label()))
                    }
                })
                .collect();
            frame.render_widget(Paragraph::new(lines), inner);
        }
        PopupBody::TabCloak {
            title_input,
            icon_input,
            focus,
        } => {
            let chunks = Layout::default()
                .direction(Direction::Vertical)
                .constraints([
                    Constraint::Length(3),
                    Constraint::Length(3),
                    Constraint::Min(1),
                ])
                .split(inner);

            render_input(
                frame,
                chunks[0],
                " Title ",
                title_input,
                CLOAK_TITLE_PLACEHOLDER,
                *focus == CloakField::Title,
                palette,
            );
            render_input(
                frame,
                chunks[1],
                " Icon ",
                icon_input,
                CLOAK_ICON_PLACEHOLDER,
                *focus == CloakField::Icon,
                palette,
            );

            let help = Paragraph::new("Tab: Switch field | Applied as you type")
                .style(Style::default().fg(Color::DarkGray))
                .alignment(Alignment::Center);
            frame.render_widget(help, chunks[2]);
        }
        PopupBody::Contact => {
            let text = vec![
                Line::from(""),
                Line::from("Discord:").alignment(Alignment::Center),
                Line::styled(
                    CONTACT_DISCORD,
                    Style::default().fg(palette.accent).add_modifier(Modifier::UNDERLINED),
                )
                .alignment(Alignment::Center),
            ];
            frame.render_widget(Paragraph::new(text).wrap(Wrap { trim: true }), inner);
        }
    }
}

fn render_input(
    frame: &mut Frame,
    area: Rect,
    label: &str,
    value: &str,
    placeholder: &str,
    focused: bool,
    palette: &Palette,
) {
    let border = if focused {
        Style::default().fg(Color::Yellow)
    } else {
        Style::default().fg(palette.dim)
    };
    let field = if value.is_empty() {
        Paragraph::new(placeholder).style(Style::default().fg(Color::DarkGray))
    } else {
        Paragraph::new(value)
    };
    frame.render_widget(
        field.block(
            Block::default()
                .borders(Borders::ALL)
                .border_style(border)
                .title(label.to_string()),
        ),
        area,
    );

    if focused {
        use unicode_width::UnicodeWidthStr;
        let x = (area.x + 1 + value.width() as u16).min(area.right().saturating_sub(2));
        frame.set_cursor_position((x, area.y + 1));
    }
}

/// Modal message, dismissed by any key or click.
pub fn render_alert(message: &str, frame: &mut Frame) {
    let area = centered_rect(50, 20, frame.area());
    frame.render_widget(Clear, area);

    let alert = Paragraph::new(message)
        .style(Style::default().fg(Color::White))
        .alignment(Alignment::Center)
        .wrap(Wrap { trim: true })
        .block(
            Block::default()
                .title(" Alert ")
                .borders(Borders::ALL)
                .border_style(Style::default().fg(Color::Red))
                .title_bottom(
                    Line::from(" Press any key ").style(Style::default().fg(Color::DarkGray)),
                ),
        );
    frame.render_widget(alert, area);
}
