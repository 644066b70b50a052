//! Client state as a single reducer-style object.
//!
//! [`App`] is only ever mutated through [`actions::apply_action`]. Side
//! effects are requested by returning an [`AppCommand`], which the event loop
//! runs on a spawned task and answers with more actions.

use std::time::Instant;

use tracing::debug;
use tui_textarea::TextArea;

use crate::api::UserChat;
use crate::core::character::Character;
use crate::core::message::Message;

pub mod actions;
pub mod banner;
pub mod forms;
pub mod picker;
pub mod session;

pub use actions::{apply_action, apply_actions, AppAction, AppActionDispatcher, AppCommand};
pub use banner::ErrorBanner;
pub use forms::{AccountField, AccountForm, LoginForm};
pub use picker::CharacterPickerState;
pub use session::SessionContext;

/// Lifecycle of a single send.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum SendState {
    #[default]
    Idle,
    /// Request issued, nothing received yet.
    Sending { typing: bool },
    /// At least one frame arrived. `placeholder` indexes the assistant
    /// message being filled in.
    Streaming {
        accumulated: String,
        placeholder: Option<usize>,
    },
}

impl SendState {
    pub fn is_in_flight(&self) -> bool {
        !matches!(self, SendState::Idle)
    }
}

#[derive(Debug, Clone, Default)]
pub enum Modal {
    #[default]
    None,
    CharacterPicker(CharacterPickerState),
    Account(AccountForm),
    Login(LoginForm),
}

impl Modal {
    pub fn is_open(&self) -> bool {
        !matches!(self, Modal::None)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Focus {
    Sidebar,
    #[default]
    Input,
}

pub struct App {
    pub session: SessionContext,
    pub device_id: Option<String>,
    pub user_chats: Vec<UserChat>,
    pub sidebar_selected: usize,
    pub current_character: Option<Character>,
    pub current_conversation_id: Option<String>,
    pub messages: Vec<Message>,
    pub loading_history: bool,
    pub send: SendState,
    pub banner: Option<ErrorBanner>,
    pub modal: Modal,
    pub focus: Focus,
    pub input: TextArea<'static>,
    pub exit_requested: bool,
}

impl App {
    pub fn new(session: SessionContext, device_id: Option<String>) -> Self {
        Self {
            session,
            device_id,
            user_chats: Vec::new(),
            sidebar_selected: 0,
            current_character: None,
            current_conversation_id: None,
            messages: Vec::new(),
            loading_history: false,
            send: SendState::Idle,
            banner: None,
            modal: Modal::None,
            focus: Focus::Input,
            input: new_input(),
            exit_requested: false,
        }
    }

    /// Work to kick off before the first key press.
    pub fn initial_command(&self) -> Option<AppCommand> {
        self.session
            .uid
            .clone()
            .map(|uid| AppCommand::LoadUserChats { uid })
    }

    pub fn input_text(&self) -> String {
        self.input.lines().join("\n")
    }

    pub fn reset_input(&mut self) {
        self.input = new_input();
    }

    pub fn can_send(&self) -> bool {
        !self.send.is_in_flight()
            && !self.loading_history
            && !self.input_text().trim().is_empty()
            && self.current_character.is_some()
            && self.session.uid.is_some()
    }

    pub fn typing_visible(&self) -> bool {
        matches!(self.send, SendState::Sending { typing: true })
    }

    /// Log and surface an error. A newer error replaces the current banner.
    pub fn show_error(&mut self, message: impl Into<String>) {
        let message = message.into();
        debug!(%message, "showing error banner");
        self.banner = Some(ErrorBanner::new(
            message,
            Instant::now(),
            self.session.banner_ttl,
        ));
    }

    pub fn selected_chat(&self) -> Option<&UserChat> {
        self.user_chats.get(self.sidebar_selected)
    }

    pub fn is_current_character(&self, character_id: &str) -> bool {
        self.current_character
            .as_ref()
            .is_some_and(|character| character.id == character_id)
    }

    pub fn picker(&self) -> Option<&CharacterPickerState> {
        match &self.modal {
            Modal::CharacterPicker(state) => Some(state),
            _ => None,
        }
    }

    pub fn picker_mut(&mut self) -> Option<&mut CharacterPickerState> {
        match &mut self.modal {
            Modal::CharacterPicker(state) => Some(state),
            _ => None,
        }
    }

    pub fn account_form_mut(&mut self) -> Option<&mut AccountForm> {
        match &mut self.modal {
            Modal::Account(form) => Some(form),
            _ => None,
        }
    }

    pub fn login_form_mut(&mut self) -> Option<&mut LoginForm> {
        match &mut self.modal {
            Modal::Login(form) => Some(form),
            _ => None,
        }
    }
}

fn new_input() -> TextArea<'static> {
    let mut input = TextArea::default();
    input.set_placeholder_text("Type a message...");
    input
}
