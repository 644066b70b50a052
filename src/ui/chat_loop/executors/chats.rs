use tracing::{debug, error};

use super::ExecutorContext;
use crate::core::app::AppAction;
use crate::core::character::Character;

pub async fn load_user_chats(ctx: &ExecutorContext, uid: &str) {
    let action = match ctx.backend.get_user_chats(uid).await {
        Ok(chats) => AppAction::UserChatsLoaded { chats },
        Err(error) => {
            if error.is_empty_state() {
                debug!(%error, "user has no chats yet");
            } else {
                error!(%error, "failed to load user chats");
            }
            AppAction::UserChatsFailed { error }
        }
    };
    ctx.dispatch(action);
}

pub async fn load_characters(ctx: &ExecutorContext, limit: u32) {
    let action = match ctx.backend.list_characters(limit, &[]).await {
        Ok(characters) => AppAction::CharactersLoaded { characters },
        Err(err) => {
            error!(error = %err, "failed to load characters");
            AppAction::CharactersFailed {
                message: err.to_string(),
            }
        }
    };
    ctx.dispatch(action);
}

/// `newChat`, then the history if the conversation has any, then the chat list.
pub async fn start_chat(ctx: &ExecutorContext, character: Character, uid: &str, history_limit: u32) {
    let result = match ctx.backend.new_chat(&character.id, uid).await {
        Ok(result) => result,
        Err(err) => {
            error!(character_id = %character.id, error = %err, "failed to start chat");
            ctx.dispatch(AppAction::ChatFailed {
                message: err.to_string(),
            });
            return;
        }
    };

    let character_id = character.id.clone();
    let wants_history = result.has_history();
    ctx.dispatch(AppAction::ChatOpened { character, result });

    if wants_history {
        load_history(ctx, &character_id, uid, history_limit).await;
    }
    load_user_chats(ctx, uid).await;
}

pub async fn load_history(ctx: &ExecutorContext, character_id: &str, uid: &str, limit: u32) {
    let action = match ctx.backend.get_chat_history(character_id, uid, limit).await {
        Ok(messages) => AppAction::HistoryLoaded {
            character_id: character_id.to_string(),
            messages,
        },
        Err(err) => {
            error!(character_id, error = %err, "failed to load chat history");
            AppAction::HistoryFailed {
                character_id: character_id.to_string(),
                message: err.to_string(),
            }
        }
    };
    ctx.dispatch(action);
}
