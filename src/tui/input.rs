use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    Up,
    Down,
    Left,
    Right,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Action {
    Move(Direction),
    Select,
    ToggleSelect,
    Grab,
    AddNode,
    AddLine,
    DeleteLine,
    DeleteNode,
    Save,
    Reload,
    TidyUp,
    FitToScreen,
    TogglePan,
    ZoomIn,
    ZoomOut,
    NextNode,
    ToggleHelp,
    OpenSettings,
    Quit,
    SubmitText,
    Cancel,
    Backspace,
    InputChar(char),
    Noop,
}

pub fn action_for_key(key: KeyEvent, text_mode: bool) -> Action {
    if text_mode {
        return match key.code {
            KeyCode::Enter => Action::SubmitText,
            KeyCode::Esc => Action::Cancel,
            KeyCode::Backspace => Action::Backspace,
            KeyCode::Left => Action::Move(Direction::Left),
            KeyCode::Right => Action::Move(Direction::Right),
            KeyCode::Char(c) => Action::InputChar(c),
            _ => Action::Noop,
        };
    }

    match key.code {
        KeyCode::Up => Action::Move(Direction::Up),
        KeyCode::Down => Action::Move(Direction::Down),
        KeyCode::Left => Action::Move(Direction::Left),
        KeyCode::Right => Action::Move(Direction::Right),
        KeyCode::Enter => Action::Select,
        KeyCode::Char(' ') => Action::ToggleSelect,
        KeyCode::Tab => Action::NextNode,
        KeyCode::Esc | KeyCode::Backspace => Action::Cancel,
        KeyCode::Char('+') => Action::ZoomIn,
        KeyCode::Char('=') if key.modifiers.contains(KeyModifiers::SHIFT) => Action::ZoomIn,
        KeyCode::Char('-') => Action::ZoomOut,
        KeyCode::Char('?') => Action::ToggleHelp,
        KeyCode::Char('q') => Action::Quit,
        KeyCode::Char('h') => Action::Move(Direction::Left),
        KeyCode::Char('j') => Action::Move(Direction::Down),
        KeyCode::Char('k') => Action::Move(Direction::Up),
        KeyCode::Char('l') => Action::Move(Direction::Right),
        KeyCode::Char('g') => Action::Grab,
        KeyCode::Char('a') => Action::AddNode,
        KeyCode::Char('c') => Action::AddLine,
        KeyCode::Char('d') => Action::DeleteLine,
        KeyCode::Char('D') => Action::DeleteNode,
        KeyCode::Char('w') => Action::Save,
        KeyCode::Char('r') => Action::Reload,
        KeyCode::Char('t') => Action::TidyUp,
        KeyCode::Char('f') => Action::FitToScreen,
        KeyCode::Char('p') => Action::TogglePan,
        KeyCode::Char('s') => Action::OpenSettings,
        _ => Action::Noop,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crossterm::event::KeyEventKind;

    fn key(code: KeyCode) -> KeyEvent {
        KeyEvent {
            code,
            modifiers: KeyModifiers::NONE,
            kind: KeyEventKind::Press,
            state: crossterm::event::KeyEventState::NONE,
        }
    }

    #[test]
    fn space_toggles_selection_in_normal_mode() {
        assert_eq!(action_for_key(key(KeyCode::Char(' ')), false), Action::ToggleSelect);
    }

    #[test]
    fn text_mode_captures_characters() {
        assert_eq!(
            action_for_key(key(KeyCode::Char('q')), true),
            Action::InputChar('q'),
            "q must type, not quit, while a prompt is open"
        );
        assert_eq!(action_for_key(key(KeyCode::Enter), true), Action::SubmitText);
        assert_eq!(action_for_key(key(KeyCode::Esc), true), Action::Cancel);
    }
}
