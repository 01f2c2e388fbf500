//! Key bindings: arrows, wasd, vim and numeric keypad.

use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};
use mergetui::shift::Direction;

/// Action from a key press.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
    Move(Direction),
    Restart,
    Quit,
    None,
}

/// Map key event to game action.
pub fn key_to_action(key: KeyEvent) -> Action {
    let KeyEvent { code, modifiers, .. } = key;
    if modifiers == KeyModifiers::CONTROL {
        return match code {
            KeyCode::Char('c') => Action::Quit,
            _ => Action::None,
        };
    }
    let no_mod = modifiers.is_empty() || modifiers == KeyModifiers::SHIFT;
    if !no_mod {
        return Action::None;
    }
    match code {
        KeyCode::Char('q' | 'Q') | KeyCode::Esc => Action::Quit,
        KeyCode::Char('r' | 'R') => Action::Restart,
        KeyCode::Up | KeyCode::Char('w' | 'k' | '8') => Action::Move(Direction::Up),
        KeyCode::Left | KeyCode::Char('a' | 'h' | '4') => Action::Move(Direction::Left),
        KeyCode::Down | KeyCode::Char('s' | 'j' | '5') => Action::Move(Direction::Down),
        KeyCode::Right | KeyCode::Char('d' | 'l' | '6') => Action::Move(Direction::Right),
        _ => Action::None,
    }
}
