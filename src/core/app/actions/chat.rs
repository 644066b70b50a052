use tracing::{debug, info};

use super::{abandon_send, AppAction, AppCommand};
use crate::core::app::{App, Focus, Modal};
use crate::core::character::Character;

const BUSY_SWITCHING: &str = "Wait for the current reply to finish before switching chats.";

pub(super) fn handle_chat_action(app: &mut App, action: AppAction) -> Option<AppCommand> {
    match action {
        AppAction::OpenChat { character } => open_chat(app, character),
        AppAction::ChatOpened { character, result } => {
            info!(
                character_id = %character.id,
                conversation_id = %result.conversation_id,
                is_new = result.is_new_conversation,
                "chat opened"
            );
            abandon_send(app);
            app.loading_history = result.has_history();
            app.current_character = Some(character);
            app.current_conversation_id = Some(result.conversation_id);
            app.messages.clear();
            app.modal = Modal::None;
            app.focus = Focus::Input;
            None
        }
        AppAction::ChatFailed { message } => {
            if let Some(picker) = app.picker_mut() {
                picker.selecting = false;
            }
            app.show_error(format!("Failed to select character: {message}"));
            None
        }
        AppAction::OpenExistingChat { chat } => {
            if app.send.is_in_flight() {
                app.show_error(BUSY_SWITCHING);
                return None;
            }
            let uid = app.session.uid.clone()?;
            let character = Character::from(&chat);
            let character_id = character.id.clone();
            app.current_character = Some(character);
            app.current_conversation_id = Some(chat.conversation_id);
            app.messages.clear();
            app.loading_history = true;
            app.focus = Focus::Input;
            Some(AppCommand::LoadHistory {
                character_id,
                uid,
                limit: app.session.history_limit,
            })
        }
        AppAction::HistoryLoaded {
            character_id,
            messages,
        } => {
            if !app.is_current_character(&character_id) {
                debug!(%character_id, "dropping history for a chat that is no longer open");
                return None;
            }
            abandon_send(app);
            app.loading_history = false;
            app.messages = messages;
            None
        }
        AppAction::HistoryFailed {
            character_id,
            message,
        } => {
            if app.is_current_character(&character_id) {
                app.loading_history = false;
            }
            app.show_error(format!("Failed to load chat history: {message}"));
            None
        }
        AppAction::SidebarMoveUp => {
            app.sidebar_selected = app.sidebar_selected.saturating_sub(1);
            None
        }
        AppAction::SidebarMoveDown => {
            if app.sidebar_selected + 1 < app.user_chats.len() {
                app.sidebar_selected += 1;
            }
            None
        }
        AppAction::SidebarOpenSelected => {
            let chat = app.selected_chat().cloned()?;
            handle_chat_action(app, AppAction::OpenExistingChat { chat })
        }
        AppAction::ToggleFocus => {
            app.focus = match app.focus {
                Focus::Sidebar => Focus::Input,
                Focus::Input => Focus::Sidebar,
            };
            None
        }
        _ => unreachable!("non-chat action routed to chat handler"),
    }
}

/// Ask the backend for the conversation with `character`.
pub(super) fn open_chat(app: &mut App, character: Character) -> Option<AppCommand> {
    if app.send.is_in_flight() {
        app.show_error(BUSY_SWITCHING);
        return None;
    }
    let uid = app.session.uid.clone()?;
    if let Some(picker) = app.picker_mut() {
        picker.selecting = true;
    }
    debug!(character_id = %character.id, "starting chat");
    Some(AppCommand::StartChat {
        character,
        uid,
        history_limit: app.session.history_limit,
    })
}
