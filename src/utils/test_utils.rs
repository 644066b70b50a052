#[cfg(test)]
use crate::api::{UserChat, WhispiClient};
#[cfg(test)]
use crate::core::app::{App, SessionContext};

/// An app signed in as `u1` with default limits and nothing loaded.
#[cfg(test)]
pub fn create_test_app() -> App {
    let session = SessionContext::new(
        WhispiClient::new("https://functions.test"),
        Some("u1".to_string()),
    );
    App::new(session, Some("device_test".to_string()))
}

#[cfg(test)]
pub fn create_test_chat(character_id: &str, character_name: &str) -> UserChat {
    UserChat {
        character_id: character_id.to_string(),
        character_name: character_name.to_string(),
        character_avatar: None,
        conversation_id: format!("conv-{character_id}"),
        last_message: Some("Hello".to_string()),
        last_message_time: Some("2024-05-01T10:15:00Z".to_string()),
    }
}

/// In-memory backend. Endpoints succeed with the canned data unless a
/// failure was registered for them with [`FakeBackend::fail`].
#[cfg(test)]
#[derive(Default)]
pub struct FakeBackend {
    pub user_chats: Vec<UserChat>,
    pub characters: Vec<crate::core::character::Character>,
    pub new_chat: Option<crate::api::NewChatResult>,
    pub history: Vec<crate::core::message::Message>,
    pub created_uid: String,
    pub(crate) failures: std::collections::HashMap<&'static str, (reqwest::StatusCode, String)>,
    pub(crate) calls: std::sync::Mutex<Vec<String>>,
}

#[cfg(test)]
impl FakeBackend {
    pub fn fail(mut self, endpoint: &'static str, status: u16, message: &str) -> Self {
        let status = reqwest::StatusCode::from_u16(status).unwrap();
        self.failures.insert(endpoint, (status, message.to_string()));
        self
    }

    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }

    fn record(&self, endpoint: &'static str, detail: String) -> Result<(), crate::api::ApiError> {
        self.calls.lock().unwrap().push(format!("{endpoint}:{detail}"));
        match self.failures.get(endpoint) {
            Some((status, message)) => Err(crate::api::ApiError::Status {
                status: *status,
                message: message.clone(),
                code: None,
            }),
            None => Ok(()),
        }
    }
}

#[cfg(test)]
#[async_trait::async_trait]
impl crate::api::WhispiBackend for FakeBackend {
    async fn get_user_chats(&self, uid: &str) -> Result<Vec<UserChat>, crate::api::ApiError> {
        self.record(crate::api::GET_USER_CHATS, uid.to_string())?;
        Ok(self.user_chats.clone())
    }

    async fn create_anonymous_user(&self) -> Result<String, crate::api::ApiError> {
        self.record(crate::api::CREATE_ANONYMOUS_USER, String::new())?;
        Ok(self.created_uid.clone())
    }

    async fn onboard_user(
        &self,
        uid: &str,
        device_id: &str,
        display_name: &str,
        birth_year: i32,
    ) -> Result<(), crate::api::ApiError> {
        self.record(
            crate::api::ONBOARD_USER,
            format!("{uid}:{device_id}:{display_name}:{birth_year}"),
        )
    }

    async fn list_characters(
        &self,
        limit: u32,
        filtered_tags: &[String],
    ) -> Result<Vec<crate::core::character::Character>, crate::api::ApiError> {
        self.record(
            crate::api::LIST_CHARACTERS,
            format!("{limit}:{}", filtered_tags.join(",")),
        )?;
        Ok(self.characters.clone())
    }

    async fn new_chat(
        &self,
        character_id: &str,
        uid: &str,
    ) -> Result<crate::api::NewChatResult, crate::api::ApiError> {
        self.record(crate::api::NEW_CHAT, format!("{character_id}:{uid}"))?;
        Ok(self.new_chat.clone().unwrap_or(crate::api::NewChatResult {
            conversation_id: format!("conv-{character_id}"),
            is_new_conversation: true,
            message_count: 0,
        }))
    }

    async fn get_chat_history(
        &self,
        character_id: &str,
        uid: &str,
        limit: u32,
    ) -> Result<Vec<crate::core::message::Message>, crate::api::ApiError> {
        self.record(
            crate::api::GET_CHAT_HISTORY,
            format!("{character_id}:{uid}:{limit}"),
        )?;
        Ok(self.history.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::{WhispiBackend, GET_USER_CHATS, NEW_CHAT};

    #[tokio::test]
    async fn fake_backend_records_calls_and_fails_registered_endpoints() {
        let backend = FakeBackend {
            user_chats: vec![create_test_chat("c1", "Ada")],
            ..FakeBackend::default()
        }
        .fail(NEW_CHAT, 500, "boom");

        let chats = backend.get_user_chats("u1").await.expect("chats");
        assert_eq!(chats.len(), 1);
        let err = backend.new_chat("c1", "u1").await.unwrap_err();
        assert!(err.to_string().contains("boom"));
        assert_eq!(
            backend.calls(),
            vec![format!("{GET_USER_CHATS}:u1"), format!("{NEW_CHAT}:c1:u1")]
        );
    }
}
