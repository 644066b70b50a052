mod account;
mod chat;
mod picker;
mod session;
mod streaming;

pub use account::{ACCOUNT_CREATED, CREATING_ACCOUNT, SETTING_UP_ACCOUNT};
pub use picker::UID_REQUIRED_FOR_PICKER;
pub use session::UID_REQUIRED;

use std::time::Instant;

use tokio::sync::mpsc;
use tracing::debug;

use super::{App, SendState};
use crate::api::{ApiError, NewChatResult, UserChat};
use crate::core::character::Character;
use crate::core::chat_stream::StreamParams;
use crate::core::message::Message;

pub enum AppAction {
    // session
    SetUser {
        uid: String,
    },
    UserChatsLoaded {
        chats: Vec<UserChat>,
    },
    UserChatsFailed {
        error: ApiError,
    },

    // account and login forms
    OpenAccountForm,
    AccountFormInput {
        ch: char,
    },
    AccountFormBackspace,
    AccountFormNextField,
    SubmitAccount,
    AccountProgress {
        status: String,
    },
    AccountCreated {
        uid: String,
        device_id: String,
    },
    AccountFailed {
        message: String,
    },
    OpenLoginForm,
    LoginInput {
        ch: char,
    },
    LoginBackspace,
    SubmitLogin,
    CloseModal,

    // character picker
    OpenCharacterPicker,
    CharactersLoaded {
        characters: Vec<Character>,
    },
    CharactersFailed {
        message: String,
    },
    PickerTypeChar {
        ch: char,
    },
    PickerBackspace,
    PickerToggleTag,
    PickerMoveUp,
    PickerMoveDown,
    PickerTagCursorLeft,
    PickerTagCursorRight,
    PickerApplySelection,

    // chat selection
    OpenChat {
        character: Character,
    },
    ChatOpened {
        character: Character,
        result: NewChatResult,
    },
    ChatFailed {
        message: String,
    },
    OpenExistingChat {
        chat: UserChat,
    },
    HistoryLoaded {
        character_id: String,
        messages: Vec<Message>,
    },
    HistoryFailed {
        character_id: String,
        message: String,
    },
    SidebarMoveUp,
    SidebarMoveDown,
    SidebarOpenSelected,
    ToggleFocus,

    // streaming
    SubmitMessage {
        message: String,
    },
    StreamChunk {
        content: String,
        stream_id: u64,
    },
    StreamComplete {
        content: String,
        stream_id: u64,
    },
    StreamError {
        message: String,
        stream_id: u64,
    },
    StreamEnded {
        stream_id: u64,
    },

    // misc
    ShowError {
        message: String,
    },
    Tick {
        now: Instant,
    },
    Quit,
}

#[derive(Clone)]
pub struct AppActionDispatcher {
    tx: mpsc::UnboundedSender<AppAction>,
}

impl AppActionDispatcher {
    pub fn new(tx: mpsc::UnboundedSender<AppAction>) -> Self {
        Self { tx }
    }

    pub fn dispatch(&self, action: AppAction) {
        let _ = self.tx.send(action);
    }

    pub fn dispatch_many<I>(&self, actions: I)
    where
        I: IntoIterator<Item = AppAction>,
    {
        for action in actions.into_iter() {
            self.dispatch(action);
        }
    }
}

/// Side effects requested by the reducer.
pub enum AppCommand {
    LoadUserChats {
        uid: String,
    },
    /// Store the uid, then refresh the chat list for it.
    PersistUid {
        uid: String,
    },
    CreateAccount {
        display_name: String,
        birth_year: i32,
    },
    LoadCharacters {
        limit: u32,
    },
    /// `newChat`, then history when the conversation has some, then the chat list.
    StartChat {
        character: Character,
        uid: String,
        history_limit: u32,
    },
    LoadHistory {
        character_id: String,
        uid: String,
        limit: u32,
    },
    SpawnStream(StreamParams),
}

pub fn apply_actions(
    app: &mut App,
    actions: impl IntoIterator<Item = AppAction>,
) -> Vec<AppCommand> {
    let mut commands = Vec::new();
    for action in actions {
        if let Some(cmd) = apply_action(app, action) {
            commands.push(cmd);
        }
    }
    commands
}

pub fn apply_action(app: &mut App, action: AppAction) -> Option<AppCommand> {
    match action {
        AppAction::SetUser { .. }
        | AppAction::UserChatsLoaded { .. }
        | AppAction::UserChatsFailed { .. }
        | AppAction::ShowError { .. }
        | AppAction::Tick { .. }
        | AppAction::Quit => session::handle_session_action(app, action),

        AppAction::OpenAccountForm
        | AppAction::AccountFormInput { .. }
        | AppAction::AccountFormBackspace
        | AppAction::AccountFormNextField
        | AppAction::SubmitAccount
        | AppAction::AccountProgress { .. }
        | AppAction::AccountCreated { .. }
        | AppAction::AccountFailed { .. }
        | AppAction::OpenLoginForm
        | AppAction::LoginInput { .. }
        | AppAction::LoginBackspace
        | AppAction::SubmitLogin
        | AppAction::CloseModal => account::handle_account_action(app, action),

        AppAction::OpenCharacterPicker
        | AppAction::CharactersLoaded { .. }
        | AppAction::CharactersFailed { .. }
        | AppAction::PickerTypeChar { .. }
        | AppAction::PickerBackspace
        | AppAction::PickerToggleTag
        | AppAction::PickerMoveUp
        | AppAction::PickerMoveDown
        | AppAction::PickerTagCursorLeft
        | AppAction::PickerTagCursorRight
        | AppAction::PickerApplySelection => picker::handle_picker_action(app, action),

        AppAction::OpenChat { .. }
        | AppAction::ChatOpened { .. }
        | AppAction::ChatFailed { .. }
        | AppAction::OpenExistingChat { .. }
        | AppAction::HistoryLoaded { .. }
        | AppAction::HistoryFailed { .. }
        | AppAction::SidebarMoveUp
        | AppAction::SidebarMoveDown
        | AppAction::SidebarOpenSelected
        | AppAction::ToggleFocus => chat::handle_chat_action(app, action),

        AppAction::SubmitMessage { .. }
        | AppAction::StreamChunk { .. }
        | AppAction::StreamComplete { .. }
        | AppAction::StreamError { .. }
        | AppAction::StreamEnded { .. } => streaming::handle_streaming_action(app, action),
    }
}

/// Refresh the sidebar for the current user, if there is one.
fn reload_user_chats(app: &App) -> Option<AppCommand> {
    app.session
        .uid
        .clone()
        .map(|uid| AppCommand::LoadUserChats { uid })
}

/// Drop the send in flight when the transcript it writes into is replaced.
fn abandon_send(app: &mut App) {
    if app.send.is_in_flight() {
        debug!(
            stream_id = app.session.current_stream_id,
            "abandoning send in flight"
        );
        app.session.abandon_stream();
        app.send = SendState::Idle;
    }
}
