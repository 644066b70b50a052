//! Background work requested by the reducer.
//!
//! Each command runs on its own task and reports back through the
//! dispatcher. Multi-step flows (account creation, opening a chat) are
//! sequenced here so the reducer only ever sees their outcomes.

use std::sync::Arc;

use tracing::error;

use crate::api::WhispiBackend;
use crate::core::app::{AppAction, AppActionDispatcher, AppCommand};
use crate::core::chat_stream::ChatStreamService;
use crate::core::session_store::SessionStore;

pub mod account;
pub mod chats;

#[derive(Clone)]
pub struct ExecutorContext {
    pub backend: Arc<dyn WhispiBackend>,
    pub store: SessionStore,
    pub dispatcher: AppActionDispatcher,
}

impl ExecutorContext {
    pub fn new(
        backend: Arc<dyn WhispiBackend>,
        store: SessionStore,
        dispatcher: AppActionDispatcher,
    ) -> Self {
        Self {
            backend,
            store,
            dispatcher,
        }
    }

    pub fn dispatch(&self, action: AppAction) {
        self.dispatcher.dispatch(action);
    }

    /// Store the uid, then refresh the chat list for it.
    pub async fn persist_uid(&self, uid: String) {
        if let Err(err) = self.store.save_uid(&uid) {
            error!(error = %err, "failed to persist uid");
            self.dispatch(AppAction::ShowError {
                message: format!("Failed to save session: {err}"),
            });
        }
        chats::load_user_chats(self, &uid).await;
    }
}

pub fn spawn_command(ctx: &ExecutorContext, stream_service: &ChatStreamService, cmd: AppCommand) {
    if let AppCommand::SpawnStream(params) = cmd {
        stream_service.spawn_stream(params);
        return;
    }

    let ctx = ctx.clone();
    tokio::spawn(async move {
        match cmd {
            AppCommand::LoadUserChats { uid } => chats::load_user_chats(&ctx, &uid).await,
            AppCommand::PersistUid { uid } => ctx.persist_uid(uid).await,
            AppCommand::CreateAccount {
                display_name,
                birth_year,
            } => account::create_account(&ctx, &display_name, birth_year).await,
            AppCommand::LoadCharacters { limit } => chats::load_characters(&ctx, limit).await,
            AppCommand::StartChat {
                character,
                uid,
                history_limit,
            } => chats::start_chat(&ctx, character, &uid, history_limit).await,
            AppCommand::LoadHistory {
                character_id,
                uid,
                limit,
            } => chats::load_history(&ctx, &character_id, &uid, limit).await,
            AppCommand::SpawnStream(_) => {}
        }
    });
}
