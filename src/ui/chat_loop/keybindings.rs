//! Key handling for the chat view and its overlays.
//!
//! Keys either edit the compose box directly or become [`AppAction`]s for the
//! reducer. Overlays capture all keys except Ctrl+C.

use ratatui::crossterm::event::{KeyCode, KeyEvent, KeyModifiers};

use crate::core::app::{App, AppAction, Focus, Modal};

pub fn handle_key(app: &mut App, key: KeyEvent) -> Vec<AppAction> {
    let ctrl = key.modifiers.contains(KeyModifiers::CONTROL);
    if ctrl && key.code == KeyCode::Char('c') {
        return vec![AppAction::Quit];
    }

    let action = match app.modal {
        Modal::None => return chat_key(app, key, ctrl),
        Modal::CharacterPicker(_) => picker_key(key, ctrl),
        Modal::Account(_) => account_key(key, ctrl),
        Modal::Login(_) => login_key(key, ctrl),
    };
    action.into_iter().collect()
}

fn picker_key(key: KeyEvent, ctrl: bool) -> Option<AppAction> {
    match key.code {
        KeyCode::Esc => Some(AppAction::CloseModal),
        KeyCode::Enter => Some(AppAction::PickerApplySelection),
        KeyCode::Up => Some(AppAction::PickerMoveUp),
        KeyCode::Down => Some(AppAction::PickerMoveDown),
        KeyCode::Left => Some(AppAction::PickerTagCursorLeft),
        KeyCode::Right => Some(AppAction::PickerTagCursorRight),
        KeyCode::Backspace => Some(AppAction::PickerBackspace),
        KeyCode::Char(' ') => Some(AppAction::PickerToggleTag),
        KeyCode::Char(ch) if !ctrl => Some(AppAction::PickerTypeChar { ch }),
        _ => None,
    }
}

fn account_key(key: KeyEvent, ctrl: bool) -> Option<AppAction> {
    match key.code {
        KeyCode::Esc => Some(AppAction::CloseModal),
        KeyCode::Enter => Some(AppAction::SubmitAccount),
        KeyCode::Tab | KeyCode::Up | KeyCode::Down => Some(AppAction::AccountFormNextField),
        KeyCode::Backspace => Some(AppAction::AccountFormBackspace),
        KeyCode::Char(ch) if !ctrl => Some(AppAction::AccountFormInput { ch }),
        _ => None,
    }
}

fn login_key(key: KeyEvent, ctrl: bool) -> Option<AppAction> {
    match key.code {
        KeyCode::Esc => Some(AppAction::CloseModal),
        KeyCode::Enter => Some(AppAction::SubmitLogin),
        KeyCode::Backspace => Some(AppAction::LoginBackspace),
        KeyCode::Char(ch) if !ctrl => Some(AppAction::LoginInput { ch }),
        _ => None,
    }
}

fn chat_key(app: &mut App, key: KeyEvent, ctrl: bool) -> Vec<AppAction> {
    if ctrl {
        return match key.code {
            KeyCode::Char('n') => vec![AppAction::OpenCharacterPicker],
            KeyCode::Char('a') => vec![AppAction::OpenAccountForm],
            KeyCode::Char('u') => vec![AppAction::OpenLoginForm],
            _ => {
                edit_input(app, key);
                Vec::new()
            }
        };
    }

    if key.code == KeyCode::Tab {
        return vec![AppAction::ToggleFocus];
    }

    match app.focus {
        Focus::Sidebar => match key.code {
            KeyCode::Up => vec![AppAction::SidebarMoveUp],
            KeyCode::Down => vec![AppAction::SidebarMoveDown],
            KeyCode::Enter => vec![AppAction::SidebarOpenSelected],
            _ => Vec::new(),
        },
        Focus::Input => match key.code {
            KeyCode::Enter if key.modifiers.contains(KeyModifiers::ALT) => {
                app.input.insert_newline();
                Vec::new()
            }
            KeyCode::Enter => vec![AppAction::SubmitMessage {
                message: app.input_text(),
            }],
            _ => {
                edit_input(app, key);
                Vec::new()
            }
        },
    }
}

fn edit_input(app: &mut App, key: KeyEvent) {
    app.input.input(tui_textarea::Input::from(key));
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::app::{apply_action, AccountForm, CharacterPickerState, LoginForm};
    use crate::utils::test_utils::create_test_app;

    fn press(code: KeyCode) -> KeyEvent {
        KeyEvent::new(code, KeyModifiers::NONE)
    }

    fn ctrl(ch: char) -> KeyEvent {
        KeyEvent::new(KeyCode::Char(ch), KeyModifiers::CONTROL)
    }

    #[test]
    fn typing_edits_input_and_enter_submits() {
        let mut app = create_test_app();
        for ch in "hey".chars() {
            assert!(handle_key(&mut app, press(KeyCode::Char(ch))).is_empty());
        }
        let actions = handle_key(&mut app, press(KeyCode::Enter));
        assert!(matches!(
            actions.as_slice(),
            [AppAction::SubmitMessage { message }] if message == "hey"
        ));
    }

    #[test]
    fn alt_enter_inserts_newline() {
        let mut app = create_test_app();
        handle_key(&mut app, press(KeyCode::Char('a')));
        handle_key(&mut app, KeyEvent::new(KeyCode::Enter, KeyModifiers::ALT));
        handle_key(&mut app, press(KeyCode::Char('b')));
        assert_eq!(app.input_text(), "a\nb");
    }

    #[test]
    fn control_shortcuts_open_overlays() {
        let mut app = create_test_app();
        assert!(matches!(
            handle_key(&mut app, ctrl('n')).as_slice(),
            [AppAction::OpenCharacterPicker]
        ));
        assert!(matches!(
            handle_key(&mut app, ctrl('a')).as_slice(),
            [AppAction::OpenAccountForm]
        ));
        assert!(matches!(
            handle_key(&mut app, ctrl('u')).as_slice(),
            [AppAction::OpenLoginForm]
        ));
        assert!(matches!(
            handle_key(&mut app, ctrl('c')).as_slice(),
            [AppAction::Quit]
        ));
    }

    #[test]
    fn sidebar_focus_routes_arrows_and_enter() {
        let mut app = create_test_app();
        apply_action(&mut app, AppAction::ToggleFocus);
        assert!(matches!(
            handle_key(&mut app, press(KeyCode::Down)).as_slice(),
            [AppAction::SidebarMoveDown]
        ));
        assert!(matches!(
            handle_key(&mut app, press(KeyCode::Enter)).as_slice(),
            [AppAction::SidebarOpenSelected]
        ));
        assert!(handle_key(&mut app, press(KeyCode::Char('x'))).is_empty());
        assert!(app.input_text().is_empty());
    }

    #[test]
    fn picker_captures_keys() {
        let mut app = create_test_app();
        app.modal = Modal::CharacterPicker(CharacterPickerState::default());
        assert!(matches!(
            handle_key(&mut app, press(KeyCode::Char(' '))).as_slice(),
            [AppAction::PickerToggleTag]
        ));
        assert!(matches!(
            handle_key(&mut app, press(KeyCode::Char('a'))).as_slice(),
            [AppAction::PickerTypeChar { ch: 'a' }]
        ));
        assert!(matches!(
            handle_key(&mut app, press(KeyCode::Right)).as_slice(),
            [AppAction::PickerTagCursorRight]
        ));
        assert!(matches!(
            handle_key(&mut app, press(KeyCode::Esc)).as_slice(),
            [AppAction::CloseModal]
        ));
        assert!(app.input_text().is_empty());
    }

    #[test]
    fn forms_capture_keys() {
        let mut app = create_test_app();
        app.modal = Modal::Account(AccountForm::default());
        assert!(matches!(
            handle_key(&mut app, press(KeyCode::Tab)).as_slice(),
            [AppAction::AccountFormNextField]
        ));
        assert!(matches!(
            handle_key(&mut app, press(KeyCode::Enter)).as_slice(),
            [AppAction::SubmitAccount]
        ));

        app.modal = Modal::Login(LoginForm::default());
        assert!(matches!(
            handle_key(&mut app, press(KeyCode::Char('u'))).as_slice(),
            [AppAction::LoginInput { ch: 'u' }]
        ));
        assert!(matches!(
            handle_key(&mut app, press(KeyCode::Enter)).as_slice(),
            [AppAction::SubmitLogin]
        ));
    }
}
