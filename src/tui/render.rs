//! Drawing: the node-link canvas, the fact panel, the status line, and the
//! help overlay.
//!
//! Everything here is read-only presentation of [`CanvasRenderData`]; the
//! app state decides what is visible, this module decides how it looks.

use ratatui::Frame;
use ratatui::layout::{Constraint, Flex, Layout, Margin, Rect};
use ratatui::style::{Color, Modifier, Style};
use ratatui::symbols::Marker;
use ratatui::text::{Line, Span};
use ratatui::widgets::canvas::{Canvas, Line as CanvasLine};
use ratatui::widgets::{Block, BorderType, Borders, Clear, Padding, Paragraph, Wrap};

/// One node, already positioned in world coordinates.
#[derive(Debug, Clone)]
pub struct RenderNode {
    pub name: String,
    pub x: f64,
    pub y: f64,
    pub focused: bool,
    pub grabbed: bool,
    /// Position in the selection order; 0 is the line source.
    pub selection_order: Option<usize>,
}

/// One link, tree or extra, as a world-coordinate segment.
#[derive(Debug, Clone)]
pub struct RenderLink {
    pub x1: f64,
    pub y1: f64,
    pub x2: f64,
    pub y2: f64,
    pub caption: String,
    /// Extra (captioned) lines draw differently from hierarchy links.
    pub extra: bool,
}

/// World-space window: what part of the graph the canvas shows.
#[derive(Debug, Clone, Copy)]
pub struct Viewport {
    pub center_x: f64,
    pub center_y: f64,
    /// 1.0 = one canvas-width of world fits the pane.
    pub zoom: f64,
}

#[derive(Debug)]
pub struct CanvasRenderData<'a> {
    pub nodes: &'a [RenderNode],
    pub links: &'a [RenderLink],
    pub viewport: Viewport,
    pub canvas_width: f64,
    pub canvas_height: f64,
    pub mode_label: &'a str,
    pub hints: &'a str,
    pub message: Option<&'a str>,
    pub selected_count: usize,
    pub show_captions: bool,
    pub show_help: bool,
}

const DEFAULT_MESSAGE: &str =
    "Click a node (Enter) to read its fact. Space multi-selects for adding a line.";

pub fn draw(frame: &mut Frame, data: &CanvasRenderData) {
    let area = frame.area().inner(Margin {
        horizontal: 1,
        vertical: 0,
    });
    let [map_area, fact_area, status_area] = Layout::vertical([
        Constraint::Min(6),
        Constraint::Length(6),
        Constraint::Length(1),
    ])
    .areas(area);

    draw_map(frame, map_area, data);
    draw_fact_panel(frame, fact_area, data.message);
    draw_status(frame, status_area, data);

    if data.show_help {
        draw_help(frame);
    }
}

fn draw_map(frame: &mut Frame, area: Rect, data: &CanvasRenderData) {
    let zoom = data.viewport.zoom.max(0.01);
    let half_w = data.canvas_width / (2.0 * zoom);
    let half_h = data.canvas_height / (2.0 * zoom);
    // World y grows downward; the canvas widget's y grows upward, so every
    // world point is drawn at -y.
    let x_bounds = [
        data.viewport.center_x - half_w,
        data.viewport.center_x + half_w,
    ];
    let y_bounds = [
        -(data.viewport.center_y + half_h),
        -(data.viewport.center_y - half_h),
    ];

    let canvas = Canvas::default()
        .block(
            Block::default()
                .title(" map ")
                .borders(Borders::ALL)
                .border_type(BorderType::Rounded),
        )
        .marker(Marker::Braille)
        .x_bounds(x_bounds)
        .y_bounds(y_bounds)
        .paint(|ctx| {
            for link in data.links {
                ctx.draw(&CanvasLine {
                    x1: link.x1,
                    y1: -link.y1,
                    x2: link.x2,
                    y2: -link.y2,
                    color: if link.extra { Color::Yellow } else { Color::DarkGray },
                });
            }
            if data.show_captions {
                for link in data.links {
                    if link.extra && !link.caption.is_empty() {
                        let mx = (link.x1 + link.x2) / 2.0;
                        let my = (link.y1 + link.y2) / 2.0;
                        ctx.print(
                            mx,
                            -my,
                            Line::from(Span::styled(
                                link.caption.clone(),
                                Style::default().fg(Color::Yellow),
                            )),
                        );
                    }
                }
            }
            for node in data.nodes {
                ctx.print(node.x, -node.y, node_label(node));
            }
        });
    frame.render_widget(canvas, area);
}

fn node_label(node: &RenderNode) -> Line<'static> {
    let mut style = Style::default().fg(Color::White);
    let mut marker = "○";
    match node.selection_order {
        Some(0) => {
            style = Style::default().fg(Color::Green).add_modifier(Modifier::BOLD);
            marker = "●";
        }
        Some(_) => {
            style = Style::default().fg(Color::Cyan).add_modifier(Modifier::BOLD);
            marker = "●";
        }
        None => {}
    }
    if node.grabbed {
        style = Style::default()
            .fg(Color::Magenta)
            .add_modifier(Modifier::BOLD);
    } else if node.focused {
        style = style.add_modifier(Modifier::BOLD | Modifier::UNDERLINED);
    }
    Line::from(Span::styled(format!("{marker} {}", node.name), style))
}

fn draw_fact_panel(frame: &mut Frame, area: Rect, message: Option<&str>) {
    let (text, style) = match message {
        Some(m) => (m, Style::default().fg(Color::White)),
        None => (DEFAULT_MESSAGE, Style::default().fg(Color::DarkGray)),
    };
    let paragraph = Paragraph::new(Line::from(Span::styled(text.to_string(), style)))
        .block(
            Block::default()
                .title(" facts ")
                .borders(Borders::ALL)
                .border_type(BorderType::Rounded)
                .padding(Padding::new(1, 1, 0, 0)),
        )
        .wrap(Wrap { trim: false });
    frame.render_widget(paragraph, area);
}

fn draw_status(frame: &mut Frame, area: Rect, data: &CanvasRenderData) {
    let mut spans = vec![
        Span::styled(
            format!(" {} ", data.mode_label),
            Style::default()
                .fg(Color::Black)
                .bg(Color::Cyan)
                .add_modifier(Modifier::BOLD),
        ),
        Span::raw(" "),
        Span::styled(data.hints.to_string(), Style::default().fg(Color::DarkGray)),
    ];
    if data.selected_count > 0 {
        spans.push(Span::styled(
            format!("  [{} selected]", data.selected_count),
            Style::default().fg(Color::Cyan),
        ));
    }
    frame.render_widget(Paragraph::new(Line::from(spans)), area);
}

fn draw_help(frame: &mut Frame) {
    let area = centered_rect(frame.area(), 56, 70);
    frame.render_widget(Clear, area);

    let rows: &[(&str, &str)] = &[
        ("arrows / hjkl", "move focus between nodes"),
        ("Enter", "select focused node (shows its fact)"),
        ("Space", "toggle focused node in the selection"),
        ("Esc", "clear selection / cancel"),
        ("g", "grab: move the focused node, Enter drops it"),
        ("a", "add child node under the selected node"),
        ("c", "add a captioned line between selected nodes"),
        ("d", "delete a line at the focused node"),
        ("D", "delete the focused node (leaves only)"),
        ("t", "tidy up: reset the layout"),
        ("f", "fit the whole graph on screen"),
        ("p", "pan mode (arrows scroll the canvas)"),
        ("+ / -", "zoom"),
        ("w", "write the document to disk"),
        ("r", "reload the document from disk"),
        ("s", "settings"),
        ("q", "quit"),
    ];
    let mut lines = vec![
        Line::from(Span::styled(
            "Keys",
            Style::default().add_modifier(Modifier::BOLD),
        )),
        Line::from(""),
    ];
    for (keys, what) in rows {
        lines.push(Line::from(vec![
            Span::styled(format!("{keys:>14}  "), Style::default().fg(Color::Cyan)),
            Span::styled((*what).to_string(), Style::default().fg(Color::Gray)),
        ]));
    }
    let paragraph = Paragraph::new(lines).block(
        Block::default()
            .title(" help ")
            .borders(Borders::ALL)
            .border_type(BorderType::Double)
            .padding(Padding::new(2, 2, 1, 1)),
    );
    frame.render_widget(paragraph, area);
}

pub fn centered_rect(area: Rect, width_percent: u16, height_percent: u16) -> Rect {
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
