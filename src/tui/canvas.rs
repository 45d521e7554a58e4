use std::io;
use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::Result;
use crossterm::event::{self, Event, KeyCode, KeyEvent, KeyEventKind};
use crossterm::execute;
use crossterm::terminal::{
    EnterAlternateScreen, LeaveAlternateScreen, disable_raw_mode, enable_raw_mode,
};
use ratatui::backend::CrosstermBackend;
use ratatui::style::{Color, Modifier, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::{Block, BorderType, Borders, Clear, Paragraph};
use ratatui::{Frame, Terminal};

use crate::config::Config;
use crate::graph::model::demo_document;
use crate::session::GraphSession;
use crate::store;
use crate::tui::input::{self, Action, Direction};
use crate::tui::render::{
    self, CanvasRenderData, RenderLink, RenderNode, Viewport, centered_rect,
};
use crate::tui::settings::{self, SettingsEvent, SettingsPanelState};

const MIN_ZOOM: f64 = 0.2;
const MAX_ZOOM: f64 = 6.0;
const GRAB_STEP: f64 = 24.0;
const PAN_STEP: f64 = 60.0;

/// Hint shown when a plain click lands on a node without a fact, mirroring
/// the message the fact panel is otherwise used for.
const NO_FACT_HINT: &str =
    "No fact available for this node. Use Space to select multiple nodes for adding a line.";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Mode {
    Normal,
    Grabbing,
}

#[derive(Debug, Clone)]
enum PendingTextKind {
    /// First step of add-node: the display name.
    NodeName { parent: String },
    /// Second step of add-node: the optional fact.
    NodeFact { parent: String, name: String },
    /// Caption for new lines between the selected nodes.
    LineCaption,
}

#[derive(Debug, Clone)]
struct PendingText {
    title: String,
    buffer: String,
    cursor: usize,
    kind: PendingTextKind,
}

#[derive(Debug, Clone)]
enum PendingConfirm {
    DeleteLine {
        source_id: String,
        target_id: String,
    },
    DeleteNode {
        id: String,
    },
}

#[derive(Debug)]
struct AppState {
    document_path: Option<PathBuf>,
    config_path: Option<PathBuf>,
    session: GraphSession,
    config: Config,
    focused: usize,
    grabbed: Option<String>,
    mode: Mode,
    view_center: (f64, f64),
    zoom: f64,
    pan_mode: bool,
    show_help: bool,
    show_settings: bool,
    settings_state: SettingsPanelState,
    status_message: Option<String>,
    pending_text: Option<PendingText>,
    pending_confirm: Option<PendingConfirm>,
    delete_pick: Option<usize>,
    dirty: bool,
    demo: bool,
}

impl AppState {
    fn load(path: Option<&Path>, demo: bool, open_settings: bool) -> Result<Self> {
        let (document, document_path, config_path, config) = if demo {
            (demo_document(), None, None, Config::default())
        } else {
            let path = store::document_path(path);
            let config_path = store::config_path(&path);
            let config = Config::load(&config_path)?;
            (store::read_document(&path)?, Some(path), Some(config_path), config)
        };

        let session = GraphSession::open(document, config.layout())?;
        let mut app = Self {
            document_path,
            config_path,
            session,
            config,
            focused: 0,
            grabbed: None,
            mode: Mode::Normal,
            view_center: (0.0, 0.0),
            zoom: 1.0,
            pan_mode: false,
            show_help: false,
            show_settings: open_settings,
            settings_state: SettingsPanelState::default(),
            status_message: demo
                .then(|| "demo mode: changes are in-memory only".to_string()),
            pending_text: None,
            pending_confirm: None,
            delete_pick: None,
            dirty: false,
            demo,
        };
        app.fit_to_screen();
        app.focused = app.session.tree().root();
        Ok(app)
    }

    fn focused_id(&self) -> Option<String> {
        self.session
            .tree()
            .nodes()
            .get(self.focused)
            .map(|n| n.id.clone())
    }

    // ------------------------------------------------------------------
    // Drawing
    // ------------------------------------------------------------------

    fn draw(&self, frame: &mut Frame) {
        let tree = self.session.tree();
        let nodes: Vec<RenderNode> = tree
            .nodes()
            .iter()
            .enumerate()
            .map(|(idx, node)| RenderNode {
                name: node.name.clone(),
                x: node.x,
                y: node.y,
                focused: idx == self.focused,
                grabbed: self.grabbed.as_deref() == Some(node.id.as_str()),
                selection_order: self
                    .session
                    .selection()
                    .iter()
                    .position(|s| *s == node.id),
            })
            .collect();

        let mut links: Vec<RenderLink> = tree
            .nodes()
            .iter()
            .filter_map(|node| {
                let parent = node.parent?;
                let parent = tree.node(parent);
                Some(RenderLink {
                    x1: node.x,
                    y1: node.y,
                    x2: parent.x,
                    y2: parent.y,
                    caption: String::new(),
                    extra: false,
                })
            })
            .collect();
        for link in self.session.renderable_links() {
            let source = tree.get(&link.source_id).expect("renderable source exists");
            let target = tree.get(&link.target_id).expect("renderable target exists");
            links.push(RenderLink {
                x1: source.x,
                y1: source.y,
                x2: target.x,
                y2: target.y,
                caption: link.joining_fact.clone(),
                extra: true,
            });
        }

        let hints = self.hints();
        let data = CanvasRenderData {
            nodes: &nodes,
            links: &links,
            viewport: Viewport {
                center_x: self.view_center.0,
                center_y: self.view_center.1,
                zoom: self.zoom,
            },
            canvas_width: self.config.canvas_width,
            canvas_height: self.config.canvas_height,
            mode_label: self.mode_label(),
            hints: &hints,
            message: self.status_message.as_deref(),
            selected_count: self.session.selection().len(),
            show_captions: self.config.show_captions,
            show_help: self.show_help,
        };
        render::draw(frame, &data);

        if self.show_settings {
            settings::draw(frame, &self.settings_state, &self.config);
        }
        if let Some(prompt) = &self.pending_text {
            self.draw_text_prompt(frame, prompt);
        } else if let Some(confirm) = &self.pending_confirm {
            self.draw_confirm_prompt(frame, confirm);
        }
    }

    fn draw_text_prompt(&self, frame: &mut Frame, prompt: &PendingText) {
        let area = centered_rect(frame.area(), 60, 26);
        frame.render_widget(Clear, area);
        let paragraph = Paragraph::new(vec![
            Line::from(Span::styled(
                prompt.title.clone(),
                Style::default().add_modifier(Modifier::BOLD),
            )),
            Line::from(""),
            line_with_cursor(
                &prompt.buffer,
                prompt.cursor,
                Style::default().fg(Color::White),
                Style::default()
                    .fg(Color::Yellow)
                    .add_modifier(Modifier::BOLD | Modifier::SLOW_BLINK),
            ),
            Line::from(""),
            Line::from(Span::styled(
                "[Backspace] delete  [Enter] apply  [Esc] cancel",
                Style::default().fg(Color::DarkGray),
            )),
        ])
        .block(
            Block::default()
                .title(" input ")
                .borders(Borders::ALL)
                .border_type(BorderType::Rounded),
        );
        frame.render_widget(paragraph, area);
    }

    fn draw_confirm_prompt(&self, frame: &mut Frame, confirm: &PendingConfirm) {
        let area = centered_rect(frame.area(), 52, 20);
        frame.render_widget(Clear, area);
        let text = match confirm {
            PendingConfirm::DeleteLine {
                source_id,
                target_id,
            } => format!("Delete the line {source_id} ─ {target_id}?"),
            PendingConfirm::DeleteNode { id } => format!("Delete node '{id}'?"),
        };
        let paragraph = Paragraph::new(vec![
            Line::from(Span::styled(
                text,
                Style::default().add_modifier(Modifier::BOLD),
            )),
            Line::from(""),
            Line::from(vec![
                Span::styled(
                    "[y/Enter]",
                    Style::default()
                        .fg(Color::Green)
                        .add_modifier(Modifier::BOLD),
                ),
                Span::styled(" yes   ", Style::default().fg(Color::DarkGray)),
                Span::styled(
                    "[n/Esc]",
                    Style::default().fg(Color::Red).add_modifier(Modifier::BOLD),
                ),
                Span::styled(" no", Style::default().fg(Color::DarkGray)),
            ]),
        ])
        .block(
            Block::default()
                .title(" confirm ")
                .borders(Borders::ALL)
                .border_type(BorderType::Rounded)
                .border_style(Style::default().fg(Color::Yellow)),
        );
        frame.render_widget(paragraph, area);
    }

    fn mode_label(&self) -> &'static str {
        if self.show_settings {
            return "Settings";
        }
        if self.pending_text.is_some() {
            return "Typing";
        }
        if self.pending_confirm.is_some() {
            return "Confirming";
        }
        if self.delete_pick.is_some() {
            return "DELETE";
        }
        match self.mode {
            Mode::Grabbing => "GRAB",
            Mode::Normal if self.pan_mode => "Pan",
            Mode::Normal => "Map",
        }
    }

    fn hints(&self) -> String {
        if self.show_settings {
            return "[j/k] row  [h/l] change  [Esc] close".to_string();
        }
        if self.pending_text.is_some() {
            return "type text, [Enter] apply, [Esc] cancel".to_string();
        }
        if self.pending_confirm.is_some() {
            return "[y] confirm  [n/Esc] cancel".to_string();
        }
        if self.delete_pick.is_some() {
            return "DELETE: [j/k] line  [Enter] delete  [Esc] cancel".to_string();
        }
        match self.mode {
            Mode::Grabbing => "GRAB: [arrows/hjkl] move node  [Enter/Esc] drop".to_string(),
            Mode::Normal if self.pan_mode => {
                "[arrows/hjkl] scroll  [p] exit pan  [q] quit".to_string()
            }
            Mode::Normal => {
                "[Enter] select  [Space] multi  [a] node  [c] line  [g] grab  [t] tidy  [?] help  [q] quit"
                    .to_string()
            }
        }
    }

    // ------------------------------------------------------------------
    // Key handling
    // ------------------------------------------------------------------

    fn handle_key(&mut self, key: KeyEvent) -> Result<bool> {
        let preserve_status = self.delete_pick.is_some() || self.mode == Mode::Grabbing;
        if !preserve_status {
            self.status_message = None;
        }

        if self.show_settings {
            let event = settings::handle_key(key, &mut self.settings_state, &mut self.config);
            match event {
                SettingsEvent::Changed => {
                    self.session.set_layout_config(self.config.layout());
                    self.persist_config()?;
                }
                SettingsEvent::Close => self.show_settings = false,
                SettingsEvent::None => {}
            }
            return Ok(false);
        }

        if self.pending_confirm.is_some() {
            self.handle_confirm_key(key)?;
            return Ok(false);
        }

        let in_text_mode = self.pending_text.is_some();
        let action = input::action_for_key(key, in_text_mode);

        if in_text_mode {
            self.handle_text_action(action);
            return Ok(false);
        }

        match action {
            Action::Quit => return Ok(true),
            Action::ToggleHelp => self.show_help = !self.show_help,
            Action::OpenSettings => self.show_settings = true,
            Action::ZoomIn => self.zoom = (self.zoom * 1.2).min(MAX_ZOOM),
            Action::ZoomOut => self.zoom = (self.zoom / 1.2).max(MIN_ZOOM),
            Action::NextNode => self.cycle_node(),
            Action::Move(direction) => self.handle_move(direction),
            Action::Select => self.handle_select(),
            Action::ToggleSelect => self.handle_toggle_select(),
            Action::Cancel => self.handle_cancel(),
            Action::Grab => self.toggle_grab(),
            Action::AddNode => self.start_add_node_prompt(),
            Action::AddLine => self.start_add_line_prompt(),
            Action::DeleteLine => self.enter_delete_pick(),
            Action::DeleteNode => self.start_delete_node_confirm(),
            Action::Save => self.save_document()?,
            Action::Reload => self.reload_document(),
            Action::TidyUp => {
                self.session.tidy();
                self.dirty = true;
                self.status_message = Some("Graph layout has been reset.".to_string());
            }
            Action::FitToScreen => self.fit_to_screen(),
            Action::TogglePan => self.pan_mode = !self.pan_mode,
            Action::SubmitText | Action::Backspace | Action::InputChar(_) | Action::Noop => {}
        }
        Ok(false)
    }

    fn handle_confirm_key(&mut self, key: KeyEvent) -> Result<()> {
        match key.code {
            KeyCode::Char('y') | KeyCode::Enter => {
                let Some(confirm) = self.pending_confirm.take() else {
                    return Ok(());
                };
                match confirm {
                    PendingConfirm::DeleteLine {
                        source_id,
                        target_id,
                    } => match self.session.remove_edge(&source_id, &target_id) {
                        Ok(()) => {
                            self.dirty = true;
                            self.status_message =
                                Some(format!("deleted line {source_id} ─ {target_id}"));
                        }
                        Err(err) => self.status_message = Some(err.to_string()),
                    },
                    PendingConfirm::DeleteNode { id } => match self.session.remove_node(&id) {
                        Ok(()) => {
                            self.dirty = true;
                            self.focused = self.session.tree().root();
                            self.status_message = Some(format!("deleted node '{id}'"));
                        }
                        Err(err) => self.status_message = Some(err.to_string()),
                    },
                }
                self.delete_pick = None;
            }
            KeyCode::Char('n') | KeyCode::Esc | KeyCode::Backspace => {
                self.pending_confirm = None;
                self.delete_pick = None;
            }
            _ => {}
        }
        Ok(())
    }

    fn handle_text_action(&mut self, action: Action) {
        let Some(mut prompt) = self.pending_text.take() else {
            return;
        };
        match action {
            Action::SubmitText => {
                self.apply_text_prompt(prompt);
                return;
            }
            Action::Cancel => {
                self.status_message = Some("cancelled".to_string());
                return;
            }
            Action::Backspace => {
                if prompt.cursor > 0 {
                    let idx = byte_index_for_cursor(&prompt.buffer, prompt.cursor - 1);
                    prompt.buffer.remove(idx);
                    prompt.cursor -= 1;
                }
            }
            Action::Move(Direction::Left) => prompt.cursor = prompt.cursor.saturating_sub(1),
            Action::Move(Direction::Right) => {
                prompt.cursor = (prompt.cursor + 1).min(prompt.buffer.chars().count());
            }
            Action::InputChar(c) => {
                let idx = byte_index_for_cursor(&prompt.buffer, prompt.cursor);
                prompt.buffer.insert(idx, c);
                prompt.cursor += 1;
            }
            _ => {}
        }
        self.pending_text = Some(prompt);
    }

    fn apply_text_prompt(&mut self, prompt: PendingText) {
        match prompt.kind {
            PendingTextKind::NodeName { parent } => {
                let name = prompt.buffer.trim().to_string();
                if name.is_empty() {
                    self.status_message = Some("Node name is required.".to_string());
                    return;
                }
                self.pending_text = Some(PendingText {
                    title: format!("Fact for '{name}' (optional):"),
                    buffer: String::new(),
                    cursor: 0,
                    kind: PendingTextKind::NodeFact { parent, name },
                });
            }
            PendingTextKind::NodeFact { parent, name } => {
                let fact = prompt.buffer.trim().to_string();
                match self.session.add_node(&name, &parent, &fact) {
                    Ok(id) => {
                        self.dirty = true;
                        if let Some(idx) = self.session.tree().index_of(&id) {
                            self.focused = idx;
                        }
                        self.status_message =
                            Some(format!("added node '{id}' under '{parent}'"));
                    }
                    Err(err) => self.status_message = Some(err.to_string()),
                }
            }
            PendingTextKind::LineCaption => {
                let caption = prompt.buffer.trim().to_string();
                match self.session.add_edges(&caption) {
                    Ok(0) => {
                        self.status_message =
                            Some("No new lines: those nodes are already joined.".to_string());
                    }
                    Ok(added) => {
                        self.dirty = true;
                        self.status_message = Some(if caption.is_empty() {
                            format!("Added {added} new line(s).")
                        } else {
                            format!("Added {added} new line(s) with fact: \"{caption}\"")
                        });
                    }
                    Err(err) => self.status_message = Some(err.to_string()),
                }
            }
        }
    }

    fn handle_move(&mut self, direction: Direction) {
        if self.mode == Mode::Grabbing {
            self.grab_move(direction);
            return;
        }
        if self.delete_pick.is_some() {
            match direction {
                Direction::Up => self.move_delete_pick(-1),
                Direction::Down => self.move_delete_pick(1),
                _ => {}
            }
            return;
        }
        if self.pan_mode {
            let step = PAN_STEP / self.zoom;
            match direction {
                Direction::Up => self.view_center.1 -= step,
                Direction::Down => self.view_center.1 += step,
                Direction::Left => self.view_center.0 -= step,
                Direction::Right => self.view_center.0 += step,
            }
            return;
        }
        self.move_focus(direction);
    }

    /// Spatial focus movement: the nearest node in the pressed direction's
    /// half-plane, preferring candidates straight ahead.
    fn move_focus(&mut self, direction: Direction) {
        let tree = self.session.tree();
        let Some(current) = tree.nodes().get(self.focused) else {
            return;
        };
        let (cx, cy) = (current.x, current.y);
        let mut best: Option<(usize, f64)> = None;
        for (idx, node) in tree.nodes().iter().enumerate() {
            if idx == self.focused {
                continue;
            }
            let dx = node.x - cx;
            let dy = node.y - cy;
            let (along, cross) = match direction {
                Direction::Up => (-dy, dx),
                Direction::Down => (dy, dx),
                Direction::Left => (-dx, dy),
                Direction::Right => (dx, dy),
            };
            if along <= 0.0 {
                continue;
            }
            let score = along + cross.abs() * 2.0;
            if best.is_none_or(|(_, s)| score < s) {
                best = Some((idx, score));
            }
        }
        if let Some((idx, _)) = best {
            self.focused = idx;
        }
    }

    fn cycle_node(&mut self) {
        let len = self.session.tree().len();
        if len > 0 {
            self.focused = (self.focused + 1) % len;
        }
    }

    fn handle_select(&mut self) {
        if self.mode == Mode::Grabbing {
            self.drop_grab();
            return;
        }
        if self.delete_pick.is_some() {
            self.confirm_delete_pick();
            return;
        }
        let Some(id) = self.focused_id() else {
            return;
        };
        match self.session.select_only(&id) {
            Ok(Some(fact)) => self.status_message = Some(fact),
            Ok(None) => self.status_message = Some(NO_FACT_HINT.to_string()),
            Err(err) => self.status_message = Some(err.to_string()),
        }
    }

    fn handle_toggle_select(&mut self) {
        if self.mode == Mode::Grabbing || self.delete_pick.is_some() {
            return;
        }
        let Some(id) = self.focused_id() else {
            return;
        };
        match self.session.toggle_select(&id) {
            Ok(true) => {
                self.status_message = Some(format!(
                    "'{id}' added to selection ({} selected)",
                    self.session.selection().len()
                ));
            }
            Ok(false) => {
                self.status_message = Some(format!("'{id}' removed from selection"));
            }
            Err(err) => self.status_message = Some(err.to_string()),
        }
    }

    fn handle_cancel(&mut self) {
        if self.mode == Mode::Grabbing {
            self.drop_grab();
            return;
        }
        if self.delete_pick.is_some() {
            self.delete_pick = None;
            self.status_message = None;
            return;
        }
        if self.pan_mode {
            self.pan_mode = false;
            return;
        }
        // background click
        self.session.clear_selection();
        self.status_message = None;
    }

    // ------------------------------------------------------------------
    // Grab (drag) mode
    // ------------------------------------------------------------------

    fn toggle_grab(&mut self) {
        if self.mode == Mode::Grabbing {
            self.drop_grab();
            return;
        }
        let Some(id) = self.focused_id() else {
            return;
        };
        self.mode = Mode::Grabbing;
        self.grabbed = Some(id);
    }

    /// A drag step: reposition only, never selection.
    fn grab_move(&mut self, direction: Direction) {
        let Some(id) = self.grabbed.clone() else {
            return;
        };
        let Some(node) = self.session.tree().get(&id) else {
            return;
        };
        let step = GRAB_STEP / self.zoom;
        let (mut x, mut y) = (node.x, node.y);
        match direction {
            Direction::Up => y -= step,
            Direction::Down => y += step,
            Direction::Left => x -= step,
            Direction::Right => x += step,
        }
        if self.session.move_node(&id, x, y).is_ok() {
            self.dirty = true;
        }
    }

    /// Releasing a drag is not a click: selection stays untouched.
    fn drop_grab(&mut self) {
        self.mode = Mode::Normal;
        if let Some(id) = self.grabbed.take() {
            self.status_message = Some(format!("placed '{id}'"));
        }
    }

    // ------------------------------------------------------------------
    // Prompts
    // ------------------------------------------------------------------

    fn start_add_node_prompt(&mut self) {
        match self.session.selection() {
            [parent] => {
                let parent = parent.clone();
                self.pending_text = Some(PendingText {
                    title: format!("New node name (child of '{parent}'):"),
                    buffer: String::new(),
                    cursor: 0,
                    kind: PendingTextKind::NodeName { parent },
                });
            }
            [] => {
                self.status_message = Some(
                    "Please select a single node to be the parent of the new node.".to_string(),
                );
            }
            _ => {
                self.status_message =
                    Some("Please select ONLY one node to add a child node to.".to_string());
            }
        }
    }

    fn start_add_line_prompt(&mut self) {
        if self.session.selection().len() < 2 {
            self.status_message =
                Some("Please select at least two nodes to add a line.".to_string());
            return;
        }
        self.pending_text = Some(PendingText {
            title: "Joining fact for the new line(s):".to_string(),
            buffer: String::new(),
            cursor: 0,
            kind: PendingTextKind::LineCaption,
        });
    }

    fn start_delete_node_confirm(&mut self) {
        let Some(id) = self.focused_id() else {
            return;
        };
        self.pending_confirm = Some(PendingConfirm::DeleteNode { id });
    }

    // ------------------------------------------------------------------
    // Delete-line pick mode
    // ------------------------------------------------------------------

    /// All extra lines touching the focused node, dangling ones included so
    /// they can still be deleted.
    fn lines_at_focus(&self) -> Vec<(String, String, String)> {
        let Some(id) = self.focused_id() else {
            return Vec::new();
        };
        self.session
            .links()
            .iter()
            .filter(|l| l.source_id == id || l.target_id == id)
            .map(|l| {
                (
                    l.source_id.clone(),
                    l.target_id.clone(),
                    l.joining_fact.clone(),
                )
            })
            .collect()
    }

    fn enter_delete_pick(&mut self) {
        if self.delete_pick.is_some() {
            return;
        }
        let lines = self.lines_at_focus();
        if lines.is_empty() {
            self.status_message = Some("no lines to delete at this node".to_string());
            return;
        }
        self.delete_pick = Some(0);
        self.status_message = Some(delete_pick_status(&lines, 0));
    }

    fn move_delete_pick(&mut self, delta: isize) {
        let Some(idx) = self.delete_pick else {
            return;
        };
        let lines = self.lines_at_focus();
        if lines.is_empty() {
            return;
        }
        let next = ((idx as isize + delta).rem_euclid(lines.len() as isize)) as usize;
        self.delete_pick = Some(next);
        self.status_message = Some(delete_pick_status(&lines, next));
    }

    fn confirm_delete_pick(&mut self) {
        let Some(idx) = self.delete_pick else {
            return;
        };
        let lines = self.lines_at_focus();
        let Some((source_id, target_id, _)) = lines.get(idx).cloned() else {
            self.delete_pick = None;
            return;
        };
        self.pending_confirm = Some(PendingConfirm::DeleteLine {
            source_id,
            target_id,
        });
    }

    // ------------------------------------------------------------------
    // Viewport
    // ------------------------------------------------------------------

    /// Zoom and center so the whole graph fits, with a little margin.
    fn fit_to_screen(&mut self) {
        let tree = self.session.tree();
        if tree.is_empty() {
            return;
        }
        let xs = tree.nodes().iter().map(|n| n.x);
        let ys = tree.nodes().iter().map(|n| n.y);
        let min_x = xs.clone().fold(f64::INFINITY, f64::min);
        let max_x = xs.fold(f64::NEG_INFINITY, f64::max);
        let min_y = ys.clone().fold(f64::INFINITY, f64::min);
        let max_y = ys.fold(f64::NEG_INFINITY, f64::max);

        self.view_center = ((min_x + max_x) / 2.0, (min_y + max_y) / 2.0);
        let extent_x = (max_x - min_x).max(1.0);
        let extent_y = (max_y - min_y).max(1.0);
        let fit = (self.config.canvas_width / extent_x)
            .min(self.config.canvas_height / extent_y)
            * 0.9;
        self.zoom = fit.clamp(MIN_ZOOM, MAX_ZOOM);
    }

    // ------------------------------------------------------------------
    // Persistence
    // ------------------------------------------------------------------

    /// Re-read the document from disk and replace all state. Any parse or
    /// structure failure leaves the in-memory graph exactly as it was and
    /// only reports a message.
    fn reload_document(&mut self) {
        if self.demo {
            self.status_message = Some("demo mode: nothing on disk to reload".to_string());
            return;
        }
        let Some(path) = self.document_path.clone() else {
            return;
        };
        let document = match store::read_document(&path) {
            Ok(doc) => doc,
            Err(err) => {
                self.status_message = Some(format!("{err:#}"));
                return;
            }
        };
        match self.session.load(document) {
            Ok(()) => {
                self.focused = self.session.tree().root();
                self.delete_pick = None;
                self.dirty = false;
                self.status_message = Some("File loaded successfully!".to_string());
            }
            Err(err) => self.status_message = Some(err.to_string()),
        }
    }

    fn save_document(&mut self) -> Result<()> {
        if self.demo {
            self.status_message = Some("demo mode: changes are in-memory only".to_string());
            return Ok(());
        }
        let Some(path) = &self.document_path else {
            return Ok(());
        };
        store::write_document(path, &self.session.export())?;
        self.dirty = false;
        self.status_message = Some(format!("saved {}", path.display()));
        Ok(())
    }

    fn persist_config(&self) -> Result<()> {
        if self.demo {
            return Ok(());
        }
        if let Some(path) = &self.config_path {
            self.config.save(path)?;
        }
        Ok(())
    }
}

fn delete_pick_status(lines: &[(String, String, String)], idx: usize) -> String {
    let (source, target, caption) = &lines[idx];
    let caption_part = if caption.is_empty() {
        String::new()
    } else {
        format!("  \"{caption}\"")
    };
    format!("({}/{})  {source} ─ {target}{caption_part}", idx + 1, lines.len())
}

pub fn run(path: Option<&Path>, demo: bool, open_settings: bool) -> Result<()> {
    let mut app = AppState::load(path, demo, open_settings)?;

    let mut stdout = io::stdout();
    enable_raw_mode()?;
    execute!(stdout, EnterAlternateScreen)?;
    let _guard = TerminalGuard;

    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    loop {
        terminal.draw(|f| app.draw(f))?;
        if !event::poll(Duration::from_millis(200))? {
            continue;
        }
        if let Event::Key(key) = event::read()? {
            if matches!(key.kind, KeyEventKind::Release | KeyEventKind::Repeat) {
                continue;
            }
            if app.handle_key(key)? {
                break;
            }
        }
    }

    if app.config.autosave && app.dirty {
        app.save_document()?;
    }
    Ok(())
}

struct TerminalGuard;

impl Drop for TerminalGuard {
    fn drop(&mut self) {
        let _ = disable_raw_mode();
        let mut stdout = io::stdout();
        let _ = execute!(stdout, LeaveAlternateScreen);
    }
}

fn line_with_cursor(text: &str, cursor: usize, text_style: Style, caret_style: Style) -> Line<'static> {
    let mut spans = Vec::new();
    let char_len = text.chars().count();
    let clamped = cursor.min(char_len);

    if char_len == 0 {
        spans.push(Span::styled("▌", caret_style));
        return Line::from(spans);
    }

    let split = byte_index_for_cursor(text, clamped);
    let (left, right) = text.split_at(split);
    if !left.is_empty() {
        spans.push(Span::styled(left.to_string(), text_style));
    }
    spans.push(Span::styled("▌", caret_style));
    if !right.is_empty() {
        spans.push(Span::styled(right.to_string(), text_style));
    }
    Line::from(spans)
}

fn byte_index_for_cursor(text: &str, cursor: usize) -> usize {
    text.char_indices()
        .nth(cursor)
        .map(|(idx, _)| idx)
        .unwrap_or(text.len())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crossterm::event::{KeyEventState, KeyModifiers};

    fn demo_app() -> AppState {
        AppState::load(None, true, false).unwrap()
    }

    fn key(code: KeyCode) -> KeyEvent {
        KeyEvent {
            code,
            modifiers: KeyModifiers::NONE,
            kind: KeyEventKind::Press,
            state: KeyEventState::NONE,
        }
    }

    fn focus(app: &mut AppState, id: &str) {
        app.focused = app.session.tree().index_of(id).expect("node in demo graph");
    }

    fn type_text(app: &mut AppState, text: &str) {
        for c in text.chars() {
            app.handle_key(key(KeyCode::Char(c))).unwrap();
        }
    }

    #[test]
    fn plain_click_selects_and_shows_fact() {
        let mut app = demo_app();
        focus(&mut app, "chicken");
        app.handle_key(key(KeyCode::Enter)).unwrap();
        assert_eq!(app.session.selection(), ["chicken"]);
        assert!(
            app.status_message.as_deref().unwrap().starts_with("Chickens can fly"),
            "clicking a node with a fact shows the fact"
        );

        focus(&mut app, "salmon");
        app.handle_key(key(KeyCode::Enter)).unwrap();
        assert_eq!(app.session.selection(), ["salmon"]);
        assert_eq!(app.status_message.as_deref(), Some(NO_FACT_HINT));
    }

    #[test]
    fn escape_acts_as_background_click() {
        let mut app = demo_app();
        focus(&mut app, "salmon");
        app.handle_key(key(KeyCode::Enter)).unwrap();
        app.handle_key(key(KeyCode::Esc)).unwrap();
        assert!(app.session.selection().is_empty());
    }

    #[test]
    fn add_line_flow_creates_one_edge_and_clears_selection() {
        let mut app = demo_app();
        focus(&mut app, "salmon");
        app.handle_key(key(KeyCode::Enter)).unwrap();
        focus(&mut app, "chicken");
        app.handle_key(key(KeyCode::Char(' '))).unwrap();
        app.handle_key(key(KeyCode::Char('c'))).unwrap();
        assert!(app.pending_text.is_some(), "caption prompt opens");
        type_text(&mut app, "they are both proteins");
        app.handle_key(key(KeyCode::Enter)).unwrap();

        assert_eq!(app.session.links().len(), 1);
        assert!(app.session.links()[0].connects("salmon", "chicken"));
        assert!(app.session.selection().is_empty());
        assert!(app.dirty);
    }

    #[test]
    fn add_line_needs_at_least_two_selected() {
        let mut app = demo_app();
        focus(&mut app, "salmon");
        app.handle_key(key(KeyCode::Enter)).unwrap();
        app.handle_key(key(KeyCode::Char('c'))).unwrap();
        assert!(app.pending_text.is_none());
        assert_eq!(
            app.status_message.as_deref(),
            Some("Please select at least two nodes to add a line.")
        );
    }

    #[test]
    fn add_node_flow_is_two_prompts() {
        let mut app = demo_app();
        focus(&mut app, "veggies");
        app.handle_key(key(KeyCode::Enter)).unwrap();
        app.handle_key(key(KeyCode::Char('a'))).unwrap();
        assert!(matches!(
            app.pending_text.as_ref().map(|p| &p.kind),
            Some(PendingTextKind::NodeName { .. })
        ));
        type_text(&mut app, "Bok Choy");
        app.handle_key(key(KeyCode::Enter)).unwrap();
        assert!(matches!(
            app.pending_text.as_ref().map(|p| &p.kind),
            Some(PendingTextKind::NodeFact { .. })
        ));
        type_text(&mut app, "A leafy green.");
        app.handle_key(key(KeyCode::Enter)).unwrap();

        let tree = app.session.tree();
        let idx = tree.index_of("bokchoy").expect("id derived from name");
        assert_eq!(tree.parent_id(idx), "veggies");
        assert_eq!(tree.node(idx).fact, "A leafy green.");
        assert_eq!(app.focused, idx, "focus lands on the new node");
    }

    #[test]
    fn add_node_requires_exactly_one_selected_parent() {
        let mut app = demo_app();
        app.handle_key(key(KeyCode::Char('a'))).unwrap();
        assert!(app.pending_text.is_none());
        assert_eq!(
            app.status_message.as_deref(),
            Some("Please select a single node to be the parent of the new node.")
        );

        focus(&mut app, "salmon");
        app.handle_key(key(KeyCode::Enter)).unwrap();
        focus(&mut app, "chicken");
        app.handle_key(key(KeyCode::Char(' '))).unwrap();
        app.handle_key(key(KeyCode::Char('a'))).unwrap();
        assert!(app.pending_text.is_none());
        assert_eq!(
            app.status_message.as_deref(),
            Some("Please select ONLY one node to add a child node to.")
        );
    }

    #[test]
    fn grab_moves_the_node_without_touching_selection() {
        let mut app = demo_app();
        focus(&mut app, "salmon");
        app.handle_key(key(KeyCode::Enter)).unwrap();
        let before = {
            let node = app.session.tree().get("salmon").unwrap();
            (node.x, node.y)
        };

        app.handle_key(key(KeyCode::Char('g'))).unwrap();
        assert_eq!(app.mode, Mode::Grabbing);
        app.handle_key(key(KeyCode::Right)).unwrap();
        app.handle_key(key(KeyCode::Down)).unwrap();
        app.handle_key(key(KeyCode::Enter)).unwrap();

        assert_eq!(app.mode, Mode::Normal);
        let node = app.session.tree().get("salmon").unwrap();
        assert!(node.x > before.0);
        assert!(node.y > before.1);
        assert_eq!(
            app.session.selection(),
            ["salmon"],
            "dropping a grab must not act as a click"
        );
    }

    #[test]
    fn delete_pick_cycles_and_deletes_the_chosen_line() {
        let mut app = demo_app();
        focus(&mut app, "salmon");
        app.handle_key(key(KeyCode::Enter)).unwrap();
        focus(&mut app, "chicken");
        app.handle_key(key(KeyCode::Char(' '))).unwrap();
        app.handle_key(key(KeyCode::Char('c'))).unwrap();
        app.handle_key(key(KeyCode::Enter)).unwrap();
        assert_eq!(app.session.links().len(), 1);

        focus(&mut app, "salmon");
        app.handle_key(key(KeyCode::Char('d'))).unwrap();
        assert_eq!(app.delete_pick, Some(0));
        app.handle_key(key(KeyCode::Enter)).unwrap();
        assert!(app.pending_confirm.is_some());
        app.handle_key(key(KeyCode::Char('y'))).unwrap();
        assert!(app.session.links().is_empty());
    }

    #[test]
    fn delete_node_is_refused_for_parents() {
        let mut app = demo_app();
        focus(&mut app, "steak");
        app.handle_key(key(KeyCode::Char('D'))).unwrap();
        app.handle_key(key(KeyCode::Char('y'))).unwrap();
        assert!(app.session.tree().contains("steak"));
        assert_eq!(
            app.status_message.as_deref(),
            Some("node 'steak' still has children")
        );

        focus(&mut app, "tbone");
        app.handle_key(key(KeyCode::Char('D'))).unwrap();
        app.handle_key(key(KeyCode::Enter)).unwrap();
        assert!(!app.session.tree().contains("tbone"));
    }

    #[test]
    fn tidy_up_resets_a_moved_node() {
        let mut app = demo_app();
        focus(&mut app, "ribeye");
        app.handle_key(key(KeyCode::Char('g'))).unwrap();
        app.handle_key(key(KeyCode::Right)).unwrap();
        app.handle_key(key(KeyCode::Esc)).unwrap();
        let moved = app.session.tree().get("ribeye").unwrap().x;

        app.handle_key(key(KeyCode::Char('t'))).unwrap();
        let reset = app.session.tree().get("ribeye").unwrap().x;
        assert_ne!(moved, reset);
        assert_eq!(
            app.status_message.as_deref(),
            Some("Graph layout has been reset.")
        );
    }

    #[test]
    fn move_focus_goes_to_a_node_in_that_direction() {
        let mut app = demo_app();
        focus(&mut app, "round");
        app.handle_key(key(KeyCode::Right)).unwrap();
        let id = app.focused_id().unwrap();
        let round_x = app.session.tree().get("round").unwrap().x;
        let new_x = app.session.tree().get(&id).unwrap().x;
        assert!(new_x > round_x, "focus moved right, landed on '{id}'");
    }

    #[test]
    fn typing_mode_swallows_command_keys() {
        let mut app = demo_app();
        focus(&mut app, "veggies");
        app.handle_key(key(KeyCode::Enter)).unwrap();
        app.handle_key(key(KeyCode::Char('a'))).unwrap();
        type_text(&mut app, "quit q");
        assert_eq!(app.pending_text.as_ref().unwrap().buffer, "quit q");
    }

    #[test]
    fn reload_failure_preserves_in_memory_state() {
        use std::fs;
        use tempfile::TempDir;

        let dir = TempDir::new().unwrap();
        let path = dir.path().join("factree.json");
        store::write_document(&path, &demo_document()).unwrap();
        let mut app = AppState::load(Some(&path), false, false).unwrap();

        focus(&mut app, "salmon");
        app.handle_key(key(KeyCode::Enter)).unwrap();
        focus(&mut app, "chicken");
        app.handle_key(key(KeyCode::Char(' '))).unwrap();
        app.handle_key(key(KeyCode::Char('c'))).unwrap();
        app.handle_key(key(KeyCode::Enter)).unwrap();
        assert_eq!(app.session.links().len(), 1);

        fs::write(&path, "{ this is not json").unwrap();
        app.handle_key(key(KeyCode::Char('r'))).unwrap();
        assert_eq!(
            app.session.links().len(),
            1,
            "a bad reload must not wipe the in-memory graph"
        );
        assert!(app.status_message.as_deref().unwrap().contains("parse"));

        store::write_document(&path, &demo_document()).unwrap();
        app.handle_key(key(KeyCode::Char('r'))).unwrap();
        assert!(app.session.links().is_empty());
        assert_eq!(
            app.status_message.as_deref(),
            Some("File loaded successfully!")
        );
    }

    #[test]
    fn fit_to_screen_centers_on_the_tree() {
        let mut app = demo_app();
        app.view_center = (9999.0, 9999.0);
        app.zoom = MAX_ZOOM;
        app.fit_to_screen();
        let tree = app.session.tree();
        let max_x = tree.nodes().iter().map(|n| n.x).fold(f64::NEG_INFINITY, f64::max);
        assert!(app.view_center.0 < max_x);
        assert!(app.zoom < MAX_ZOOM);
    }
}
