//! Request and response payloads for the Whispi backend.
//!
//! JSON endpoints are "callable functions": the request body is wrapped as
//! `{"data": {...}}` and a successful reply as `{"result": {...}}`. The chat
//! stream endpoint takes a bare body and answers with newline-delimited
//! frames (see [`StreamFrame`]).

use chrono::{DateTime, Utc};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;
use tracing::warn;

use crate::core::character::Character;
use crate::core::message::{Message, Role};

pub mod client;

pub use client::{ApiError, WhispiBackend, WhispiClient};

pub const GET_USER_CHATS: &str = "getUserChats";
pub const CREATE_ANONYMOUS_USER: &str = "createAnonymousUser";
pub const ONBOARD_USER: &str = "onboardUser";
pub const LIST_CHARACTERS: &str = "listCharacters";
pub const NEW_CHAT: &str = "newChat";
pub const GET_CHAT_HISTORY: &str = "getChatHistory";
pub const CHAT_STREAM: &str = "chatApi/chatStream";

#[derive(Serialize)]
pub struct Envelope<T> {
    pub data: T,
}

#[derive(Deserialize)]
pub struct CallableResponse<T> {
    pub result: T,
}

#[derive(Deserialize, Default)]
pub struct CallableErrorBody {
    #[serde(default)]
    pub error: Option<CallableError>,
}

#[derive(Deserialize, Default)]
pub struct CallableError {
    #[serde(default)]
    pub message: Option<String>,
    #[serde(default)]
    pub status: Option<String>,
}

#[derive(Serialize)]
pub struct UidRequest<'a> {
    pub uid: &'a str,
}

#[derive(Serialize)]
pub struct EmptyRequest {}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct OnboardRequest<'a> {
    pub uid: &'a str,
    pub device_id: &'a str,
    pub display_name: &'a str,
    pub birth_year: i32,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ListCharactersRequest<'a> {
    pub limit: u32,
    pub filtered_tags: &'a [String],
    pub prefetch_mode: bool,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NewChatRequest<'a> {
    pub character_id: &'a str,
    pub uid: &'a str,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ChatHistoryRequest<'a> {
    pub character_id: &'a str,
    pub uid: &'a str,
    pub limit: u32,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ChatStreamRequest<'a> {
    pub prompt: &'a str,
    pub character_id: &'a str,
    pub uid: &'a str,
}

/// Sidebar summary of one conversation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserChat {
    pub character_id: String,
    pub character_name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub character_avatar: Option<String>,
    #[serde(default)]
    pub conversation_id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_message: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_message_time: Option<String>,
}

#[derive(Deserialize)]
pub struct UserChatsResult {
    #[serde(default, deserialize_with = "lenient_list")]
    pub conversations: Option<Vec<UserChat>>,
}

#[derive(Deserialize)]
pub struct AnonymousUserResult {
    pub uid: String,
}

#[derive(Deserialize)]
pub struct CharactersResult {
    #[serde(default, deserialize_with = "lenient_list")]
    pub characters: Option<Vec<Character>>,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewChatResult {
    pub conversation_id: String,
    #[serde(default)]
    pub is_new_conversation: bool,
    #[serde(default)]
    pub message_count: u64,
}

impl NewChatResult {
    /// History is worth fetching only for a resumed conversation that has messages.
    pub fn has_history(&self) -> bool {
        !self.is_new_conversation && self.message_count > 0
    }
}

#[derive(Deserialize)]
pub struct ChatHistoryResult {
    #[serde(default, deserialize_with = "lenient_list")]
    pub messages: Option<Vec<HistoryMessage>>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct HistoryMessage {
    #[serde(default)]
    pub content: String,
    pub role: Role,
    #[serde(default)]
    pub timestamp: Option<String>,
}

impl HistoryMessage {
    pub fn into_message(self) -> Message {
        let timestamp = self
            .timestamp
            .as_deref()
            .and_then(|raw| DateTime::parse_from_rfc3339(raw).ok())
            .map(|ts| ts.with_timezone(&Utc))
            .unwrap_or_else(Utc::now);
        Message::new(self.role, self.content, timestamp)
    }
}

/// Decode a list entry by entry. Entries that do not fit `T` are logged and
/// skipped so one bad record does not hide the rest.
fn lenient_list<'de, D, T>(deserializer: D) -> Result<Option<Vec<T>>, D::Error>
where
    D: Deserializer<'de>,
    T: DeserializeOwned,
{
    let raw: Option<Vec<Value>> = Option::deserialize(deserializer)?;
    Ok(raw.map(|entries| {
        entries
            .into_iter()
            .filter_map(|entry| match serde_json::from_value(entry) {
                Ok(item) => Some(item),
                Err(err) => {
                    warn!(%err, "skipping malformed list entry");
                    None
                }
            })
            .collect()
    }))
}

/// One decoded frame of the chat stream.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum StreamFrame {
    Chunk {
        #[serde(default)]
        content: String,
    },
    Complete {
        #[serde(default)]
        content: String,
    },
    Error {
        #[serde(default = "unknown_stream_error")]
        message: String,
    },
    #[serde(other)]
    Unknown,
}

fn unknown_stream_error() -> String {
    "Unknown error".to_string()
}
