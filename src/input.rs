//! Key and mouse bindings.

use crossterm::event::{KeyCode, KeyEvent, KeyModifiers, MouseButton, MouseEvent, MouseEventKind};

/// Action from a key press.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
    Prev,
    Next,
    Up,
    Down,
    Select,
    Back,
    Restart,
    Menu,
    Leaderboard,
    Quit,
    None,
}

/// Map a key event to an action. Arrows and vim keys both work.
pub fn key_to_action(key: KeyEvent) -> Action {
    let KeyEvent { code, modifiers, .. } = key;
    if modifiers == KeyModifiers::CONTROL && code == KeyCode::Char('c') {
        return Action::Quit;
    }
    if !(modifiers.is_empty() || modifiers == KeyModifiers::SHIFT) {
        return Action::None;
    }
    match code {
        KeyCode::Char('q') | KeyCode::Char('Q') => Action::Quit,
        KeyCode::Esc | KeyCode::Backspace => Action::Back,
        KeyCode::Left | KeyCode::Char('h') | KeyCode::BackTab => Action::Prev,
        KeyCode::Right | KeyCode::Char('l') | KeyCode::Tab => Action::Next,
        KeyCode::Up | KeyCode::Char('k') => Action::Up,
        KeyCode::Down | KeyCode::Char('j') => Action::Down,
        KeyCode::Enter | KeyCode::Char(' ') => Action::Select,
        KeyCode::Char('r') | KeyCode::Char('R') => Action::Restart,
        KeyCode::Char('m') | KeyCode::Char('M') => Action::Menu,
        KeyCode::Char('b') | KeyCode::Char('B') => Action::Leaderboard,
        _ => Action::None,
    }
}

/// Terminal cell of a left-button press, if this is one.
pub fn mouse_click(event: MouseEvent) -> Option<(u16, u16)> {
    match event.kind {
        MouseEventKind::Down(MouseButton::Left) => Some((event.column, event.row)),
        _ => None,
    }
}
