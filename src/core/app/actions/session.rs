use tracing::{debug, info};

use super::{AppAction, AppCommand};
use crate::core::app::{App, Modal, SendState};

pub const UID_REQUIRED: &str = "Enter your UID, or create a new anonymous account.";

pub(super) fn handle_session_action(app: &mut App, action: AppAction) -> Option<AppCommand> {
    match action {
        AppAction::SetUser { uid } => set_user(app, &uid),
        AppAction::UserChatsLoaded { chats } => {
            debug!(count = chats.len(), "user chats loaded");
            app.user_chats = chats;
            if app.sidebar_selected >= app.user_chats.len() {
                app.sidebar_selected = app.user_chats.len().saturating_sub(1);
            }
            None
        }
        AppAction::UserChatsFailed { error } => {
            if error.is_empty_state() {
                debug!(%error, "no chats yet");
                app.user_chats.clear();
                app.sidebar_selected = 0;
            } else {
                app.show_error(format!("Failed to load chats: {error}"));
            }
            None
        }
        AppAction::ShowError { message } => {
            app.show_error(message);
            None
        }
        AppAction::Tick { now } => {
            if app.banner.as_ref().is_some_and(|b| b.is_expired(now)) {
                app.banner = None;
            }
            if let Modal::Account(form) = &app.modal {
                if form.close_at.is_some_and(|at| now >= at) {
                    app.modal = Modal::None;
                }
            }
            None
        }
        AppAction::Quit => {
            app.session.cancel_stream();
            app.exit_requested = true;
            None
        }
        _ => unreachable!("non-session action routed to session handler"),
    }
}

/// Adopt a uid. Chat state from a previous user is dropped.
pub(super) fn set_user(app: &mut App, uid: &str) -> Option<AppCommand> {
    let uid = uid.trim();
    if uid.is_empty() {
        app.show_error(UID_REQUIRED);
        return None;
    }
    if app.send.is_in_flight() {
        app.show_error("Wait for the current reply to finish first.");
        return None;
    }

    info!(uid, "switching user");
    app.session.uid = Some(uid.to_string());
    app.user_chats.clear();
    app.sidebar_selected = 0;
    app.current_character = None;
    app.current_conversation_id = None;
    app.messages.clear();
    app.send = SendState::Idle;
    if matches!(app.modal, Modal::Login(_)) {
        app.modal = Modal::None;
    }
    Some(AppCommand::PersistUid {
        uid: uid.to_string(),
    })
}
