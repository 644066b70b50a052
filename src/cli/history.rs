use chrono::Local;

use crate::api::WhispiBackend;
use crate::core::message::Message;

pub async fn print_history(
    backend: &dyn WhispiBackend,
    character_id: &str,
    uid: &str,
    limit: u32,
) -> Result<(), String> {
    let messages = backend
        .get_chat_history(character_id, uid, limit)
        .await
        .map_err(|err| format!("Failed to load chat history: {err}"))?;

    if messages.is_empty() {
        println!("No messages yet.");
        return Ok(());
    }
    for message in &messages {
        println!("{}\n", format_message(message));
    }
    Ok(())
}

fn format_message(message: &Message) -> String {
    let who = if message.is_user() { "You" } else { "Them" };
    let time = message.timestamp.with_timezone(&Local).format("%Y-%m-%d %H:%M");
    format!("[{time}] {who}:\n{}", message.content)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::GET_CHAT_HISTORY;
    use crate::utils::test_utils::FakeBackend;

    #[test]
    fn messages_are_labelled_by_role() {
        let formatted = format_message(&Message::user("hi"));
        assert!(formatted.contains("] You:\nhi"));
        let reply = format_message(&Message::assistant_placeholder());
        assert!(reply.ends_with("] Them:\n"));
    }

    #[tokio::test]
    async fn history_is_requested_with_the_limit() {
        let backend = FakeBackend {
            history: vec![Message::user("hi")],
            ..FakeBackend::default()
        };
        print_history(&backend, "c1", "u1", 25).await.expect("history");
        assert_eq!(backend.calls(), vec![format!("{GET_CHAT_HISTORY}:c1:u1:25")]);
    }

    #[tokio::test]
    async fn failures_name_the_operation() {
        let backend = FakeBackend::default().fail(GET_CHAT_HISTORY, 403, "denied");
        assert_eq!(
            print_history(&backend, "c1", "u1", 25).await,
            Err("Failed to load chat history: denied".to_string())
        );
    }
}
