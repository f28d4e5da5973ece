//! Key bindings: normal and vim-style.

use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};

/// Action from a key press.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
    MoveLeft,
    MoveRight,
    Rotate,
    SoftDrop,
    HardDrop,
    Pause,
    NewGame,
    SpeedUp,
    SpeedDown,
    CycleColor,
    CycleType,
    TogglePanel,
    Quit,
    None,
}

/// Map key event to game action. Supports both normal (arrows, space) and vim (hjkl).
pub fn key_to_action(key: KeyEvent) -> Action {
    let KeyEvent { code, modifiers, .. } = key;
    let no_mod = modifiers.is_empty() || modifiers == KeyModifiers::SHIFT;
    if modifiers == KeyModifiers::CONTROL && code == KeyCode::Char('c') {
        return Action::Quit;
    }
    if !no_mod {
        return Action::None;
    }
    match code {
        KeyCode::Char('q') | KeyCode::Esc => Action::Quit,
        KeyCode::Char('p') => Action::Pause,
        KeyCode::Left | KeyCode::Char('h') => Action::MoveLeft,
        KeyCode::Right | KeyCode::Char('l') => Action::MoveRight,
        KeyCode::Up | KeyCode::Char('k') => Action::Rotate,
        KeyCode::Down | KeyCode::Char('j') => Action::SoftDrop,
        KeyCode::Enter | KeyCode::Char(' ') => Action::HardDrop,
        KeyCode::Char('n') => Action::NewGame,
        KeyCode::Char('+') | KeyCode::Char('=') => Action::SpeedUp,
        KeyCode::Char('-') => Action::SpeedDown,
        KeyCode::Char('c') => Action::CycleColor,
        KeyCode::Char('t') => Action::CycleType,
        KeyCode::Tab => Action::TogglePanel,
        _ => Action::None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn press(code: KeyCode) -> Action {
        key_to_action(KeyEvent::new(code, KeyModifiers::NONE))
    }

    #[test]
    fn test_arrows_and_vim_keys_agree() {
        assert_eq!(press(KeyCode::Left), press(KeyCode::Char('h')));
        assert_eq!(press(KeyCode::Right), press(KeyCode::Char('l')));
        assert_eq!(press(KeyCode::Up), Action::Rotate);
        assert_eq!(press(KeyCode::Char('j')), Action::SoftDrop);
    }

    #[test]
    fn test_modifiers() {
        let ctrl_c = KeyEvent::new(KeyCode::Char('c'), KeyModifiers::CONTROL);
        assert_eq!(key_to_action(ctrl_c), Action::Quit);
        let alt_h = KeyEvent::new(KeyCode::Char('h'), KeyModifiers::ALT);
        assert_eq!(key_to_action(alt_h), Action::None);
        let plus = KeyEvent::new(KeyCode::Char('+'), KeyModifiers::SHIFT);
        assert_eq!(key_to_action(plus), Action::SpeedUp);
    }
}
