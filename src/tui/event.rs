//! Keyboard event handling for the TUI.
//!
//! Maps crossterm keyboard events to application state changes. Key behavior
//! depends on which panel has focus.

use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};

use super::app::{App, Focus};

/// What the event loop should do after a key press.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
    /// Keep polling
    Continue,
    /// Run the pipeline on the current input
    Submit,
    /// Leave the TUI
    Quit,
}

/// Handles a keyboard event and updates the app state accordingly.
///
/// # Event Handling
///
/// - `Ctrl+C`: Quit (from any focus state)
/// - `q`: Quit when an output panel is focused
/// - `Tab` / `Shift+Tab`: Cycle focus between panels
/// - `Esc`: Return to the question input
/// - When `Input` focused: characters edit the question, Enter submits
/// - When `Answer`/`Sources` focused: j/k scroll
///
/// # Examples
///
/// ```
/// use webqa::tui::{App, event::{Action, handle_key_event}};
/// use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};
///
/// let mut app = App::new(None);
/// let key = KeyEvent::new(KeyCode::Char('c'), KeyModifiers::CONTROL);
/// assert_eq!(handle_key_event(&mut app, key), Action::Quit);
/// ```
pub fn handle_key_event(app: &mut App, key: KeyEvent) -> Action {
    if key.code == KeyCode::Char('c') && key.modifiers.contains(KeyModifiers::CONTROL) {
        return Action::Quit;
    }

    if key.code == KeyCode::Tab {
        app.next_focus();
        return Action::Continue;
    }
    if key.code == KeyCode::BackTab {
        app.prev_focus();
        return Action::Continue;
    }

    if key.code == KeyCode::Esc {
        app.reset_focus();
        return Action::Continue;
    }

    match app.focus() {
        Focus::Input => handle_input(app, key),
        Focus::Answer | Focus::Sources => handle_output_panel(app, key),
    }
}

/// Handles keyboard input when the question input is focused.
fn handle_input(app: &mut App, key: KeyEvent) -> Action {
    match key.code {
        KeyCode::Enter => {
            if app.can_ask() {
                Action::Submit
            } else {
                Action::Continue
            }
        }
        KeyCode::Char(c) if key.modifiers.is_empty() || key.modifiers == KeyModifiers::SHIFT => {
            app.push_char(c);
            Action::Continue
        }
        KeyCode::Backspace => {
            app.pop_char();
            Action::Continue
        }
        _ => Action::Continue,
    }
}

/// Handles keyboard input when an output panel is focused.
fn handle_output_panel(app: &mut App, key: KeyEvent) -> Action {
    match key.code {
        KeyCode::Char('q') if key.modifiers.is_empty() => Action::Quit,
        KeyCode::Char('j') | KeyCode::Down => {
            app.scroll_down(1);
            Action::Continue
        }
        KeyCode::Char('k') | KeyCode::Up => {
            app.scroll_up(1);
            Action::Continue
        }
        _ => Action::Continue,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn key(code: KeyCode) -> KeyEvent {
        KeyEvent::new(code, KeyModifiers::NONE)
    }

    #[test]
    fn ctrl_c_quits_from_any_focus() {
        let ctrl_c = KeyEvent::new(KeyCode::Char('c'), KeyModifiers::CONTROL);
        let mut app = App::default();
        assert_eq!(handle_key_event(&mut app, ctrl_c), Action::Quit);
        app.next_focus();
        assert_eq!(handle_key_event(&mut app, ctrl_c), Action::Quit);
    }

    #[test]
    fn q_is_typed_into_input() {
        let mut app = App::default();
        assert_eq!(handle_key_event(&mut app, key(KeyCode::Char('q'))), Action::Continue);
        assert_eq!(app.input(), "q");
    }

    #[test]
    fn q_quits_from_output_panels() {
        let mut app = App::default();
        app.next_focus();
        assert_eq!(handle_key_event(&mut app, key(KeyCode::Char('q'))), Action::Quit);
    }

    #[test]
    fn shifted_characters_are_typed() {
        let mut app = App::default();
        let upper = KeyEvent::new(KeyCode::Char('W'), KeyModifiers::SHIFT);
        handle_key_event(&mut app, upper);
        handle_key_event(&mut app, key(KeyCode::Char('?')));
        assert_eq!(app.input(), "W?");
    }

    #[test]
    fn backspace_removes_last_char() {
        let mut app = App::default();
        handle_key_event(&mut app, key(KeyCode::Char('a')));
        handle_key_event(&mut app, key(KeyCode::Char('b')));
        handle_key_event(&mut app, key(KeyCode::Backspace));
        assert_eq!(app.input(), "a");
    }

    #[test]
    fn enter_submits_from_input() {
        let mut app = App::default();
        handle_key_event(&mut app, key(KeyCode::Char('x')));
        assert_eq!(handle_key_event(&mut app, key(KeyCode::Enter)), Action::Submit);
    }

    #[test]
    fn enter_is_ignored_when_asking_is_disabled() {
        let mut app = App::new(Some("missing key".to_string()));
        handle_key_event(&mut app, key(KeyCode::Char('x')));
        assert_eq!(handle_key_event(&mut app, key(KeyCode::Enter)), Action::Continue);
    }

    #[test]
    fn tab_and_backtab_cycle_focus() {
        let mut app = App::default();
        handle_key_event(&mut app, key(KeyCode::Tab));
        assert_eq!(app.focus(), Focus::Answer);
        handle_key_event(&mut app, key(KeyCode::BackTab));
        assert_eq!(app.focus(), Focus::Input);
    }

    #[test]
    fn esc_returns_to_input() {
        let mut app = App::default();
        app.next_focus();
        app.next_focus();
        handle_key_event(&mut app, key(KeyCode::Esc));
        assert_eq!(app.focus(), Focus::Input);
    }

    #[test]
    fn j_and_k_scroll_output_panels() {
        let mut app = App::default();
        app.next_focus();
        handle_key_event(&mut app, key(KeyCode::Char('j')));
        handle_key_event(&mut app, key(KeyCode::Char('j')));
        handle_key_event(&mut app, key(KeyCode::Char('k')));
        assert_eq!(app.answer_scroll(), 1);
        assert_eq!(app.input(), "");
    }
}
