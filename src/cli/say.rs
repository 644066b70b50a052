//! TUI-less "say" command

use std::io::{self, Write};

use tokio_util::sync::CancellationToken;
use tracing::debug;

use crate::api::{WhispiBackend, WhispiClient};
use crate::core::chat_stream::{ChatStreamService, StreamMessage, StreamParams};

#[derive(Debug, PartialEq)]
enum Outcome {
    Continue,
    Done,
    Failed(String),
}

/// Writes fragments as they arrive. A complete frame that disagrees with
/// the streamed text is printed on its own line at the end.
struct ReplyPrinter<W: Write> {
    out: W,
    streamed: String,
    complete: Option<String>,
}

impl<W: Write> ReplyPrinter<W> {
    fn new(out: W) -> Self {
        Self {
            out,
            streamed: String::new(),
            complete: None,
        }
    }

    fn handle(&mut self, message: StreamMessage) -> io::Result<Outcome> {
        match message {
            StreamMessage::Chunk(content) => {
                write!(self.out, "{content}")?;
                self.out.flush()?;
                self.streamed.push_str(&content);
                Ok(Outcome::Continue)
            }
            StreamMessage::Complete(content) => {
                self.complete = Some(content);
                Ok(Outcome::Continue)
            }
            StreamMessage::Error(message) => {
                if !self.streamed.is_empty() {
                    writeln!(self.out)?;
                }
                Ok(Outcome::Failed(message))
            }
            StreamMessage::End => {
                if let Some(complete) = self.complete.take() {
                    if complete != self.streamed {
                        if !self.streamed.is_empty() {
                            writeln!(self.out)?;
                        }
                        write!(self.out, "{complete}")?;
                    }
                }
                writeln!(self.out)?;
                self.out.flush()?;
                Ok(Outcome::Done)
            }
        }
    }
}

pub async fn run_say(
    client: WhispiClient,
    character_id: &str,
    uid: &str,
    prompt: &str,
) -> Result<(), String> {
    let prompt = prompt.trim();
    if prompt.is_empty() {
        return Err("Usage: whispi say --character <ID> <PROMPT...>".to_string());
    }

    let chat = client
        .new_chat(character_id, uid)
        .await
        .map_err(|err| format!("Failed to select character: {err}"))?;
    debug!(conversation_id = %chat.conversation_id, "conversation ready");

    let (service, mut rx) = ChatStreamService::new();
    service.spawn_stream(StreamParams {
        client,
        prompt: prompt.to_string(),
        character_id: character_id.to_string(),
        uid: uid.to_string(),
        cancel_token: CancellationToken::new(),
        stream_id: 1,
    });
    // The spawned task holds the only sender left, so the channel closes with it.
    drop(service);

    let mut printer = ReplyPrinter::new(io::stdout().lock());
    while let Some((message, _)) = rx.recv().await {
        match printer.handle(message).map_err(|err| err.to_string())? {
            Outcome::Continue => {}
            Outcome::Done => return Ok(()),
            Outcome::Failed(message) => return Err(format!("Failed to send message: {message}")),
        }
    }
    Err("Failed to send message: the reply stream closed unexpectedly".to_string())
}
