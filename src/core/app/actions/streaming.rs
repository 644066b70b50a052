use tracing::{debug, error};

use super::{reload_user_chats, AppAction, AppCommand};
use crate::core::app::{App, SendState};
use crate::core::message::Message;

const HISTORY_LOADING: &str = "Wait for the chat history to load first.";

pub(super) fn handle_streaming_action(app: &mut App, action: AppAction) -> Option<AppCommand> {
    match action {
        AppAction::SubmitMessage { message } => submit_message(app, &message),
        AppAction::StreamChunk { content, stream_id } => {
            if !app.session.is_current_stream(stream_id) {
                return None;
            }
            append_chunk(app, &content);
            None
        }
        AppAction::StreamComplete { content, stream_id } => {
            if !app.session.is_current_stream(stream_id) {
                return None;
            }
            complete_reply(app, content);
            None
        }
        AppAction::StreamError { message, stream_id } => {
            if !app.session.is_current_stream(stream_id) {
                return None;
            }
            error!(stream_id, %message, "stream failed");
            finish_stream(app);
            app.show_error(format!("Failed to send message: {message}"));
            reload_user_chats(app)
        }
        AppAction::StreamEnded { stream_id } => {
            if !app.session.is_current_stream(stream_id) {
                return None;
            }
            debug!(stream_id, "stream ended");
            finish_stream(app);
            reload_user_chats(app)
        }
        _ => unreachable!("non-streaming action routed to streaming handler"),
    }
}

fn submit_message(app: &mut App, message: &str) -> Option<AppCommand> {
    let prompt = message.trim();
    if app.send.is_in_flight() || prompt.is_empty() {
        return None;
    }
    if app.loading_history {
        app.show_error(HISTORY_LOADING);
        return None;
    }
    let character_id = app.current_character.as_ref()?.id.clone();
    let uid = app.session.uid.clone()?;

    app.messages.push(Message::user(prompt));
    app.reset_input();
    app.send = SendState::Sending { typing: true };

    let params = app
        .session
        .begin_stream(prompt.to_string(), character_id, uid);
    debug!(stream_id = params.stream_id, "sending message");
    Some(AppCommand::SpawnStream(params))
}

/// Index of the assistant message for this send, creating it on first use.
/// A recorded index is reused only while it still points at an assistant entry.
fn ensure_placeholder(app: &mut App, placeholder: Option<usize>) -> usize {
    match placeholder {
        Some(index)
            if app
                .messages
                .get(index)
                .is_some_and(Message::is_assistant) =>
        {
            index
        }
        _ => {
            app.messages.push(Message::assistant_placeholder());
            app.messages.len() - 1
        }
    }
}

fn append_chunk(app: &mut App, content: &str) {
    let (mut accumulated, placeholder) = match std::mem::take(&mut app.send) {
        SendState::Streaming {
            accumulated,
            placeholder,
        } => (accumulated, placeholder),
        SendState::Sending { .. } => (String::new(), None),
        SendState::Idle => {
            debug!("chunk arrived with no send in flight");
            return;
        }
    };

    let index = ensure_placeholder(app, placeholder);
    accumulated.push_str(content);
    app.messages[index].content.clone_from(&accumulated);
    app.send = SendState::Streaming {
        accumulated,
        placeholder: Some(index),
    };
}

/// The complete frame is authoritative, whatever the fragments added up to.
fn complete_reply(app: &mut App, content: String) {
    let placeholder = match std::mem::take(&mut app.send) {
        SendState::Streaming { placeholder, .. } => placeholder,
        SendState::Sending { .. } => None,
        SendState::Idle => {
            debug!("complete frame arrived with no send in flight");
            return;
        }
    };

    let index = ensure_placeholder(app, placeholder);
    app.messages[index].content.clone_from(&content);
    app.send = SendState::Streaming {
        accumulated: content,
        placeholder: Some(index),
    };
}

fn finish_stream(app: &mut App) {
    app.send = SendState::Idle;
    app.session.finish_stream();
}
