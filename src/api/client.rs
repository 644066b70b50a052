use std::error::Error as StdError;
use std::fmt;

use async_trait::async_trait;
use reqwest::StatusCode;
use serde::de::DeserializeOwned;
use serde::Serialize;
use tracing::debug;

use super::{
    AnonymousUserResult, CallableErrorBody, CallableResponse, CharactersResult,
    ChatHistoryRequest, ChatHistoryResult, ChatStreamRequest, EmptyRequest, Envelope,
    ListCharactersRequest, NewChatRequest, NewChatResult, OnboardRequest,
    UidRequest, UserChat, UserChatsResult, CHAT_STREAM, CREATE_ANONYMOUS_USER, GET_CHAT_HISTORY,
    GET_USER_CHATS, LIST_CHARACTERS, NEW_CHAT, ONBOARD_USER,
};
use crate::core::character::Character;
use crate::core::config::data::{Config, API_BASE_URL_ENV};
use crate::core::message::Message;
use crate::utils::url::{construct_api_url, validate_base_url};

/// Failure of a JSON endpoint call.
#[derive(Debug)]
pub enum ApiError {
    /// The request never produced a response (DNS, TLS, connection reset, ...).
    Transport(reqwest::Error),

    /// The server answered with a non-success status.
    Status {
        status: StatusCode,
        /// `error.message` from the body, or the endpoint's default text.
        message: String,
        /// `error.status` from the body, e.g. `NOT_FOUND`.
        code: Option<String>,
    },

    /// A success status whose body did not match the expected shape.
    Decode {
        endpoint: &'static str,
        source: serde_json::Error,
    },
}

impl ApiError {
    /// Whether the failure means "nothing stored yet" rather than a real error.
    ///
    /// A 404 or a `NOT_FOUND` code is authoritative. Older deployments only say
    /// so in prose, so a message mentioning "not found" or "empty" also counts.
    pub fn is_empty_state(&self) -> bool {
        match self {
            ApiError::Status {
                status,
                message,
                code,
            } => {
                if *status == StatusCode::NOT_FOUND {
                    return true;
                }
                if code
                    .as_deref()
                    .is_some_and(|c| c.eq_ignore_ascii_case("not_found") || c.eq_ignore_ascii_case("not-found"))
                {
                    return true;
                }
                let lowered = message.to_lowercase();
                lowered.contains("not found") || lowered.contains("empty")
            }
            ApiError::Transport(_) | ApiError::Decode { .. } => false,
        }
    }
}

impl fmt::Display for ApiError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ApiError::Transport(err) => write!(f, "{err}"),
            ApiError::Status { message, .. } => write!(f, "{message}"),
            ApiError::Decode { endpoint, source } => {
                write!(f, "Unexpected response from {endpoint}: {source}")
            }
        }
    }
}

impl StdError for ApiError {
    fn source(&self) -> Option<&(dyn StdError + 'static)> {
        match self {
            ApiError::Transport(err) => Some(err),
            ApiError::Status { .. } => None,
            ApiError::Decode { source, .. } => Some(source),
        }
    }
}

impl From<reqwest::Error> for ApiError {
    fn from(err: reqwest::Error) -> Self {
        ApiError::Transport(err)
    }
}

/// Map a non-success status to [`ApiError::Status`], preferring the body's message.
pub(crate) fn check_status(
    status: StatusCode,
    body: &str,
    default_error: &str,
) -> Result<(), ApiError> {
    if status.is_success() {
        return Ok(());
    }
    let parsed: CallableErrorBody = serde_json::from_str(body).unwrap_or_default();
    let error = parsed.error.unwrap_or_default();
    let message = error
        .message
        .filter(|m| !m.trim().is_empty())
        .unwrap_or_else(|| default_error.to_string());
    Err(ApiError::Status {
        status,
        message,
        code: error.status,
    })
}

/// Turn a raw status + body into the endpoint's result.
pub(crate) fn decode_callable<T: DeserializeOwned>(
    endpoint: &'static str,
    status: StatusCode,
    body: &str,
    default_error: &str,
) -> Result<T, ApiError> {
    check_status(status, body, default_error)?;
    serde_json::from_str::<CallableResponse<T>>(body)
        .map(|response| response.result)
        .map_err(|source| ApiError::Decode { endpoint, source })
}

/// The remote operations the client depends on.
///
/// [`WhispiClient`] is the real implementation; tests substitute an in-memory one.
#[async_trait]
pub trait WhispiBackend: Send + Sync {
    async fn get_user_chats(&self, uid: &str) -> Result<Vec<UserChat>, ApiError>;

    async fn create_anonymous_user(&self) -> Result<String, ApiError>;

    async fn onboard_user(
        &self,
        uid: &str,
        device_id: &str,
        display_name: &str,
        birth_year: i32,
    ) -> Result<(), ApiError>;

    async fn list_characters(
        &self,
        limit: u32,
        filtered_tags: &[String],
    ) -> Result<Vec<Character>, ApiError>;

    async fn new_chat(&self, character_id: &str, uid: &str) -> Result<NewChatResult, ApiError>;

    async fn get_chat_history(
        &self,
        character_id: &str,
        uid: &str,
        limit: u32,
    ) -> Result<Vec<Message>, ApiError>;
}

#[derive(Clone, Debug)]
pub struct WhispiClient {
    http: reqwest::Client,
    base_url: String,
}

impl WhispiClient {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self::with_http_client(reqwest::Client::new(), base_url)
    }

    pub fn with_http_client(http: reqwest::Client, base_url: impl Into<String>) -> Self {
        Self {
            http,
            base_url: base_url.into(),
        }
    }

    /// Client for the effective base URL: `--api-base-url`, then
    /// `WHISPI_API_BASE_URL`, then the config file, then the default.
    pub fn from_config(config: &Config, flag: Option<&str>) -> Result<Self, String> {
        let env = std::env::var(API_BASE_URL_ENV).ok();
        let base_url = validate_base_url(&config.resolve_api_base_url(flag, env))?;
        Ok(Self::new(base_url))
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    async fn call<Req, Res>(
        &self,
        endpoint: &'static str,
        data: Req,
        default_error: &str,
    ) -> Result<Res, ApiError>
    where
        Req: Serialize,
        Res: DeserializeOwned,
    {
        let (status, body) = self.post(endpoint, data).await?;
        decode_callable(endpoint, status, &body, default_error)
    }

    async fn post<Req: Serialize>(
        &self,
        endpoint: &'static str,
        data: Req,
    ) -> Result<(StatusCode, String), ApiError> {
        let url = construct_api_url(&self.base_url, endpoint);
        debug!(endpoint, "calling backend");

        let response = self
            .http
            .post(url)
            .header("Content-Type", "application/json")
            .json(&Envelope { data })
            .send()
            .await?;

        let status = response.status();
        let body = response.text().await?;
        Ok((status, body))
    }

    /// Build the streaming request. The uid doubles as the bearer token.
    pub fn chat_stream_request(
        &self,
        prompt: &str,
        character_id: &str,
        uid: &str,
    ) -> reqwest::RequestBuilder {
        let url = construct_api_url(&self.base_url, CHAT_STREAM);
        self.http
            .post(url)
            .query(&[("uid", uid)])
            .header("Content-Type", "application/json")
            .bearer_auth(uid)
            .json(&ChatStreamRequest {
                prompt,
                character_id,
                uid,
            })
    }
}

#[async_trait]
impl WhispiBackend for WhispiClient {
    async fn get_user_chats(&self, uid: &str) -> Result<Vec<UserChat>, ApiError> {
        let result: UserChatsResult = self
            .call(GET_USER_CHATS, UidRequest { uid }, "Failed to get user chats")
            .await?;
        Ok(result.conversations.unwrap_or_default())
    }

    async fn create_anonymous_user(&self) -> Result<String, ApiError> {
        let result: AnonymousUserResult = self
            .call(
                CREATE_ANONYMOUS_USER,
                EmptyRequest {},
                "Failed to create anonymous user",
            )
            .await?;
        Ok(result.uid)
    }

    async fn onboard_user(
        &self,
        uid: &str,
        device_id: &str,
        display_name: &str,
        birth_year: i32,
    ) -> Result<(), ApiError> {
        // Any success counts; the reply body carries nothing the client uses.
        let (status, body) = self
            .post(
                ONBOARD_USER,
                OnboardRequest {
                    uid,
                    device_id,
                    display_name,
                    birth_year,
                },
            )
            .await?;
        check_status(status, &body, "Failed to onboard user")
    }

    async fn list_characters(
        &self,
        limit: u32,
        filtered_tags: &[String],
    ) -> Result<Vec<Character>, ApiError> {
        let result: CharactersResult = self
            .call(
                LIST_CHARACTERS,
                ListCharactersRequest {
                    limit,
                    filtered_tags,
                    prefetch_mode: false,
                },
                "Failed to list characters",
            )
            .await?;
        Ok(result.characters.unwrap_or_default())
    }

    async fn new_chat(&self, character_id: &str, uid: &str) -> Result<NewChatResult, ApiError> {
        self.call(
            NEW_CHAT,
            NewChatRequest { character_id, uid },
            "Failed to create new chat",
        )
        .await
    }

    async fn get_chat_history(
        &self,
        character_id: &str,
        uid: &str,
        limit: u32,
    ) -> Result<Vec<Message>, ApiError> {
        let result: ChatHistoryResult = self
            .call(
                GET_CHAT_HISTORY,
                ChatHistoryRequest {
                    character_id,
                    uid,
                    limit,
                },
                "Failed to get chat history",
            )
            .await?;
        Ok(result
            .messages
            .unwrap_or_default()
            .into_iter()
            .map(|message| message.into_message())
            .collect())
    }
}
