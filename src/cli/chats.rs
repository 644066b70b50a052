use tracing::debug;

use crate::api::{UserChat, WhispiBackend};

pub async fn list_chats(backend: &dyn WhispiBackend, uid: &str) -> Result<(), String> {
    let chats = match backend.get_user_chats(uid).await {
        Ok(chats) => chats,
        Err(err) if err.is_empty_state() => {
            debug!(error = %err, "no chats stored yet");
            Vec::new()
        }
        Err(err) => return Err(format!("Failed to load chats: {err}")),
    };

    if chats.is_empty() {
        println!("No chats yet.");
        println!("\n💡 Find someone to talk to with:");
        println!("   whispi characters");
        return Ok(());
    }

    println!("Your chats:\n");
    for chat in &chats {
        println!("{}", summary_line(chat));
    }
    Ok(())
}

fn summary_line(chat: &UserChat) -> String {
    let mut line = format!("  • {} [{}]", chat.character_name, chat.character_id);
    if let Some(time) = chat.last_message_time.as_deref() {
        line.push_str(&format!("  {time}"));
    }
    if let Some(preview) = chat.last_message.as_deref().filter(|m| !m.is_empty()) {
        line.push_str(&format!("\n      {}", preview.replace('\n', " ")));
    }
    line
}
