use std::time::Duration;

use tokio_util::sync::CancellationToken;

use crate::api::WhispiClient;
use crate::core::chat_stream::StreamParams;
use crate::core::config::data::{
    Config, DEFAULT_CHARACTER_PAGE_SIZE, DEFAULT_ERROR_BANNER_SECS, DEFAULT_HISTORY_LIMIT,
};

/// Connection and identity details the reducer needs to build commands.
pub struct SessionContext {
    pub client: WhispiClient,
    pub uid: Option<String>,
    pub character_page_size: u32,
    pub history_limit: u32,
    pub banner_ttl: Duration,
    pub current_stream_id: u64,
    pub stream_cancel_token: Option<CancellationToken>,
}

impl SessionContext {
    pub fn new(client: WhispiClient, uid: Option<String>) -> Self {
        Self {
            client,
            uid: uid.filter(|uid| !uid.trim().is_empty()),
            character_page_size: DEFAULT_CHARACTER_PAGE_SIZE,
            history_limit: DEFAULT_HISTORY_LIMIT,
            banner_ttl: Duration::from_secs(DEFAULT_ERROR_BANNER_SECS),
            current_stream_id: 0,
            stream_cancel_token: None,
        }
    }

    pub fn with_config(mut self, config: &Config) -> Self {
        self.character_page_size = config.character_page_size();
        self.history_limit = config.history_limit();
        self.banner_ttl = config.error_banner_duration();
        self
    }

    pub fn is_current_stream(&self, stream_id: u64) -> bool {
        self.current_stream_id == stream_id
    }

    /// Allocate a new stream id and token; messages from older streams are ignored.
    pub fn begin_stream(
        &mut self,
        prompt: String,
        character_id: String,
        uid: String,
    ) -> StreamParams {
        self.current_stream_id += 1;
        let token = CancellationToken::new();
        self.stream_cancel_token = Some(token.clone());
        StreamParams {
            client: self.client.clone(),
            prompt,
            character_id,
            uid,
            cancel_token: token,
            stream_id: self.current_stream_id,
        }
    }

    pub fn finish_stream(&mut self) {
        self.stream_cancel_token = None;
    }

    pub fn cancel_stream(&mut self) {
        if let Some(token) = self.stream_cancel_token.take() {
            token.cancel();
        }
    }

    /// Cancel the running stream and retire its id so queued messages from it are dropped.
    pub fn abandon_stream(&mut self) {
        self.cancel_stream();
        self.current_stream_id += 1;
    }
}
