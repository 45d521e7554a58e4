use crossterm::event::{KeyCode, KeyEvent};
use ratatui::Frame;
use ratatui::layout::{Constraint, Flex, Layout, Rect};
use ratatui::style::{Color, Modifier, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::{Block, BorderType, Borders, Clear, Padding, Paragraph};

use crate::config::Config;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SettingsEvent {
    None,
    Changed,
    Close,
}

#[derive(Debug, Clone, Copy, Default)]
pub struct SettingsPanelState {
    pub selected_row: usize,
}

const SETTINGS_ROW_COUNT: usize = 4;
const CANVAS_WIDTH_STEP: f64 = 80.0;
const CANVAS_HEIGHT_STEP: f64 = 60.0;
const MIN_CANVAS: f64 = 240.0;

pub fn handle_key(
    key: KeyEvent,
    state: &mut SettingsPanelState,
    config: &mut Config,
) -> SettingsEvent {
    match key.code {
        KeyCode::Esc | KeyCode::Backspace | KeyCode::Char('q') => SettingsEvent::Close,
        KeyCode::Up | KeyCode::Char('k') => {
            state.selected_row = state.selected_row.saturating_sub(1);
            SettingsEvent::None
        }
        KeyCode::Down | KeyCode::Char('j') => {
            state.selected_row = (state.selected_row + 1).min(SETTINGS_ROW_COUNT - 1);
            SettingsEvent::None
        }
        KeyCode::Left | KeyCode::Char('h') => adjust(config, state.selected_row, -1),
        KeyCode::Right | KeyCode::Char('l') | KeyCode::Enter | KeyCode::Char(' ') => {
            adjust(config, state.selected_row, 1)
        }
        _ => SettingsEvent::None,
    }
}

pub fn draw(frame: &mut Frame, state: &SettingsPanelState, config: &Config) {
    let area = centered_rect(frame.area(), 56, 48);
    frame.render_widget(Clear, area);

    let title = Line::from(vec![
        Span::styled(
            "Settings",
            Style::default()
                .fg(Color::Cyan)
                .add_modifier(Modifier::BOLD),
        ),
        Span::raw("  "),
        Span::styled("[Esc] close", Style::default().fg(Color::Gray)),
    ]);

    let selected_row = state.selected_row.min(SETTINGS_ROW_COUNT - 1);
    let mut lines = vec![
        settings_row(
            selected_row == 0,
            "canvas width",
            format!("{:.0}", config.canvas_width),
        ),
        settings_row(
            selected_row == 1,
            "canvas height",
            format!("{:.0}", config.canvas_height),
        ),
        settings_row(
            selected_row == 2,
            "line captions",
            on_off(config.show_captions),
        ),
        settings_row(selected_row == 3, "autosave on quit", on_off(config.autosave)),
        Line::from(""),
        Line::from(Span::styled(
            "About this option",
            Style::default()
                .fg(Color::Gray)
                .add_modifier(Modifier::BOLD),
        )),
    ];
    for text in selected_row_description(selected_row) {
        lines.push(Line::from(Span::styled(
            text,
            Style::default().fg(Color::DarkGray),
        )));
    }
    lines.extend([
        Line::from(""),
        Line::from(Span::styled(
            "Use h/l or arrows to change a value.",
            Style::default().fg(Color::DarkGray),
        )),
        Line::from(Span::styled(
            "Changes write to the config file immediately.",
            Style::default().fg(Color::DarkGray),
        )),
    ]);

    let panel = Paragraph::new(lines).block(
        Block::default()
            .title(title)
            .borders(Borders::ALL)
            .border_type(BorderType::Rounded)
            .border_style(Style::default().fg(Color::Cyan))
            .padding(Padding::new(1, 1, 1, 0)),
    );
    frame.render_widget(panel, area);
}

fn on_off(enabled: bool) -> String {
    if enabled { "[ON]".to_string() } else { "[OFF]".to_string() }
}

fn settings_row(selected: bool, key: &str, value: String) -> Line<'static> {
    let indicator = if selected { ">" } else { " " };
    let base_style = if selected {
        Style::default()
            .fg(Color::White)
            .bg(Color::DarkGray)
            .add_modifier(Modifier::BOLD)
    } else {
        Style::default().fg(Color::Gray)
    };
    let mut value_style = Style::default().fg(Color::Green).add_modifier(Modifier::BOLD);
    if selected {
        value_style = value_style.bg(Color::DarkGray);
    }

    Line::from(vec![
        Span::styled(format!("{indicator} {key:<24}"), base_style),
        Span::styled(value, value_style),
    ])
}

fn selected_row_description(selected_row: usize) -> [&'static str; 2] {
    match selected_row {
        0 => [
            "World width the tidy layout spreads leaves across.",
            "Wider canvases give long sibling rows more room.",
        ],
        1 => [
            "World height; the tree occupies the height minus a",
            "top reserve kept for line captions.",
        ],
        2 => [
            "Draw each extra line's joining fact at the midpoint",
            "of the line.",
        ],
        3 => [
            "Write the document back to disk automatically when",
            "the viewer quits.",
        ],
        _ => ["", ""],
    }
}

fn adjust(config: &mut Config, selected_row: usize, sign: i32) -> SettingsEvent {
    match selected_row {
        0 => {
            config.canvas_width =
                (config.canvas_width + sign as f64 * CANVAS_WIDTH_STEP).max(MIN_CANVAS);
            SettingsEvent::Changed
        }
        1 => {
            config.canvas_height =
                (config.canvas_height + sign as f64 * CANVAS_HEIGHT_STEP).max(MIN_CANVAS);
            SettingsEvent::Changed
        }
        2 => {
            config.show_captions = !config.show_captions;
            SettingsEvent::Changed
        }
        3 => {
            config.autosave = !config.autosave;
            SettingsEvent::Changed
        }
        _ => SettingsEvent::None,
    }
}

fn centered_rect(area: Rect, width_percent: u16, height_percent: u16) -> Rect {
    let vertical = Layout::vertical([
        Constraint::Percentage((100 - height_percent) / 2),
        Constraint::Percentage(height_percent),
        Constraint::Percentage((100 - height_percent) / 2),
    ])
    .flex(Flex::Center)
    .split(area);
    Layout::horizontal([
        Constraint::Percentage((100 - width_percent) / 2),
        Constraint::Percentage(width_percent),
        Constraint::Percentage((100 - width_percent) / 2),
    ])
    .flex(Flex::Center)
    .split(vertical[1])[1]
}
