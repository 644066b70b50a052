use tracing::debug;

use super::chat::open_chat;
use super::{AppAction, AppCommand};
use crate::core::app::{App, CharacterPickerState, Modal};

pub const UID_REQUIRED_FOR_PICKER: &str = "Set a UID or create an anonymous account first.";

pub(super) fn handle_picker_action(app: &mut App, action: AppAction) -> Option<AppCommand> {
    match action {
        AppAction::OpenCharacterPicker => {
            if app.session.uid.is_none() {
                app.show_error(UID_REQUIRED_FOR_PICKER);
                return None;
            }
            app.modal = Modal::CharacterPicker(CharacterPickerState::loading());
            Some(AppCommand::LoadCharacters {
                limit: app.session.character_page_size,
            })
        }
        AppAction::CharactersLoaded { characters } => {
            debug!(count = characters.len(), "characters loaded");
            if let Some(picker) = app.picker_mut() {
                picker.set_characters(characters);
            }
            None
        }
        AppAction::CharactersFailed { message } => {
            if let Some(picker) = app.picker_mut() {
                picker.loading = false;
            }
            app.show_error(format!("Failed to load characters: {message}"));
            None
        }
        AppAction::PickerTypeChar { ch } => {
            with_picker(app, |picker| picker.push_search_char(ch));
            None
        }
        AppAction::PickerBackspace => {
            with_picker(app, CharacterPickerState::pop_search_char);
            None
        }
        AppAction::PickerToggleTag => {
            with_picker(app, CharacterPickerState::toggle_tag_under_cursor);
            None
        }
        AppAction::PickerMoveUp => {
            with_picker(app, CharacterPickerState::move_up);
            None
        }
        AppAction::PickerMoveDown => {
            with_picker(app, CharacterPickerState::move_down);
            None
        }
        AppAction::PickerTagCursorLeft => {
            with_picker(app, CharacterPickerState::tag_cursor_left);
            None
        }
        AppAction::PickerTagCursorRight => {
            with_picker(app, CharacterPickerState::tag_cursor_right);
            None
        }
        AppAction::PickerApplySelection => {
            let character = app
                .picker()
                .filter(|picker| !picker.selecting)
                .and_then(|picker| picker.selected_character().cloned())?;
            open_chat(app, character)
        }
        _ => unreachable!("non-picker action routed to picker handler"),
    }
}

fn with_picker(app: &mut App, f: impl FnOnce(&mut CharacterPickerState)) {
    if let Some(picker) = app.picker_mut() {
        f(picker);
    }
}
