use std::fmt::Display;

use futures_util::{Stream, StreamExt};
use memchr::memchr;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

use crate::api::{StreamFrame, WhispiClient};

/// Updates produced by one streaming send.
///
/// Every stream finishes with exactly one `Error` or `End`.
#[derive(Clone, Debug, PartialEq)]
pub enum StreamMessage {
    Chunk(String),
    Complete(String),
    Error(String),
    End,
}

type StreamSender = mpsc::UnboundedSender<(StreamMessage, u64)>;

/// Strip the optional `data:` marker. Blank lines and `:` comments carry nothing.
fn extract_data_payload(line: &str) -> Option<&str> {
    let line = line.trim();
    if line.is_empty() || line.starts_with(':') {
        return None;
    }
    let payload = line
        .strip_prefix("data:")
        .map(str::trim_start)
        .unwrap_or(line);
    if payload.is_empty() {
        None
    } else {
        Some(payload)
    }
}

/// Decode one line and forward it. Returns true when the stream must stop.
fn process_stream_line(line: &str, tx: &StreamSender, stream_id: u64) -> bool {
    let Some(payload) = extract_data_payload(line) else {
        return false;
    };

    match serde_json::from_str::<StreamFrame>(payload) {
        Ok(StreamFrame::Chunk { content }) => {
            let _ = tx.send((StreamMessage::Chunk(content), stream_id));
            false
        }
        Ok(StreamFrame::Complete { content }) => {
            let _ = tx.send((StreamMessage::Complete(content), stream_id));
            false
        }
        Ok(StreamFrame::Error { message }) => {
            let _ = tx.send((StreamMessage::Error(message), stream_id));
            true
        }
        Ok(StreamFrame::Unknown) => {
            debug!(stream_id, payload, "ignoring stream frame of unknown type");
            false
        }
        Err(err) => {
            warn!(stream_id, payload, error = %err, "skipping malformed stream frame");
            false
        }
    }
}

/// Split a byte stream into lines and feed them through the frame decoder.
///
/// Bytes are buffered until a newline so that neither a frame nor a UTF-8
/// sequence split across network chunks is torn.
pub async fn pump_stream<S, B, E>(stream: S, tx: &StreamSender, stream_id: u64)
where
    S: Stream<Item = Result<B, E>>,
    B: AsRef<[u8]>,
    E: Display,
{
    futures_util::pin_mut!(stream);
    let mut buffer: Vec<u8> = Vec::new();

    while let Some(chunk) = stream.next().await {
        let chunk = match chunk {
            Ok(chunk) => chunk,
            Err(err) => {
                let _ = tx.send((StreamMessage::Error(err.to_string()), stream_id));
                return;
            }
        };
        buffer.extend_from_slice(chunk.as_ref());

        while let Some(newline_pos) = memchr(b'\n', &buffer) {
            let should_end = match std::str::from_utf8(&buffer[..newline_pos]) {
                Ok(line) => process_stream_line(line, tx, stream_id),
                Err(err) => {
                    warn!(stream_id, error = %err, "skipping stream line with invalid UTF-8");
                    false
                }
            };
            buffer.drain(..=newline_pos);
            if should_end {
                return;
            }
        }
    }

    if !buffer.is_empty() {
        match std::str::from_utf8(&buffer) {
            Ok(line) => {
                if process_stream_line(line, tx, stream_id) {
                    return;
                }
            }
            Err(err) => warn!(stream_id, error = %err, "dropping trailing invalid UTF-8"),
        }
    }

    let _ = tx.send((StreamMessage::End, stream_id));
}

pub struct StreamParams {
    pub client: WhispiClient,
    pub prompt: String,
    pub character_id: String,
    pub uid: String,
    pub cancel_token: CancellationToken,
    pub stream_id: u64,
}

#[derive(Clone)]
pub struct ChatStreamService {
    tx: StreamSender,
}

impl ChatStreamService {
    pub fn new() -> (Self, mpsc::UnboundedReceiver<(StreamMessage, u64)>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (Self { tx }, rx)
    }

    pub fn spawn_stream(&self, params: StreamParams) {
        let tx = self.tx.clone();
        tokio::spawn(async move {
            let StreamParams {
                client,
                prompt,
                character_id,
                uid,
                cancel_token,
                stream_id,
            } = params;

            tokio::select! {
                _ = run_stream(&client, &prompt, &character_id, &uid, &tx, stream_id) => {}
                _ = cancel_token.cancelled() => {
                    debug!(stream_id, "stream cancelled");
                }
            }
        });
    }

    #[cfg(test)]
    pub fn send_for_test(&self, message: StreamMessage, stream_id: u64) {
        let _ = self.tx.send((message, stream_id));
    }
}

async fn run_stream(
    client: &WhispiClient,
    prompt: &str,
    character_id: &str,
    uid: &str,
    tx: &StreamSender,
    stream_id: u64,
) {
    debug!(stream_id, character_id, "opening chat stream");
    let response = match client
        .chat_stream_request(prompt, character_id, uid)
        .send()
        .await
    {
        Ok(response) => response,
        Err(err) => {
            let _ = tx.send((StreamMessage::Error(err.to_string()), stream_id));
            return;
        }
    };

    if !response.status().is_success() {
        let message = format!("HTTP error! status: {}", response.status().as_u16());
        let _ = tx.send((StreamMessage::Error(message), stream_id));
        return;
    }

    pump_stream(response.bytes_stream(), tx, stream_id).await;
}

#[cfg(test)]
mod tests {
    use super::*;
    use futures_util::stream;
    use std::io;

    fn drain(rx: &mut mpsc::UnboundedReceiver<(StreamMessage, u64)>) -> Vec<StreamMessage> {
        let mut out = Vec::new();
        while let Ok((message, _)) = rx.try_recv() {
            out.push(message);
        }
        out
    }

    async fn pump_chunks(chunks: &[&[u8]]) -> Vec<StreamMessage> {
        let (tx, mut rx) = mpsc::unbounded_channel();
        let items: Vec<Result<Vec<u8>, io::Error>> =
            chunks.iter().map(|c| Ok(c.to_vec())).collect();
        pump_stream(stream::iter(items), &tx, 7).await;
        drain(&mut rx)
    }

    #[test]
    fn payload_marker_is_optional() {
        assert_eq!(extract_data_payload(r#"data: {"a":1}"#), Some(r#"{"a":1}"#));
        assert_eq!(extract_data_payload(r#"data:{"a":1}"#), Some(r#"{"a":1}"#));
        assert_eq!(extract_data_payload(r#"{"a":1}"#), Some(r#"{"a":1}"#));
        assert_eq!(extract_data_payload("data: "), None);
        assert_eq!(extract_data_payload(": keep-alive"), None);
        assert_eq!(extract_data_payload("   "), None);
    }

    #[tokio::test]
    async fn chunks_and_complete_are_forwarded_in_order() {
        let messages = pump_chunks(&[
            &b"data: {\"type\":\"chunk\",\"content\":\"Hi\"}\n"[..],
            &b"data: {\"type\":\"chunk\",\"content\":\" there\"}\n"[..],
            &b"data: {\"type\":\"complete\",\"content\":\"Hi there!\"}\n"[..],
        ])
        .await;
        assert_eq!(
            messages,
            vec![
                StreamMessage::Chunk("Hi".into()),
                StreamMessage::Chunk(" there".into()),
                StreamMessage::Complete("Hi there!".into()),
                StreamMessage::End,
            ]
        );
    }

    #[tokio::test]
    async fn malformed_frames_are_skipped_without_ending_the_stream() {
        let messages = pump_chunks(&[
            &b"data: {bad json}\ndata: {\"type\":\"chunk\",\"content\":\"hi\"}\n"[..],
        ])
        .await;
        assert_eq!(
            messages,
            vec![StreamMessage::Chunk("hi".into()), StreamMessage::End]
        );
    }

    #[tokio::test]
    async fn error_frame_stops_reading() {
        let messages = pump_chunks(&[
            &b"data: {\"type\":\"error\",\"message\":\"quota exceeded\"}\n"[..],
            &b"data: {\"type\":\"chunk\",\"content\":\"never\"}\n"[..],
        ])
        .await;
        assert_eq!(messages, vec![StreamMessage::Error("quota exceeded".into())]);
    }

    #[tokio::test]
    async fn frames_split_across_network_chunks_are_reassembled() {
        let messages = pump_chunks(&[
            &b"data: {\"type\":\"chu"[..],
            &b"nk\",\"content\":\"caf\xc3"[..],
            &b"\xa9\"}\r\n\ndata: {\"type\":\"complete\",\"content\":\"caf\xc3\xa9!\"}"[..],
        ])
        .await;
        assert_eq!(
            messages,
            vec![
                StreamMessage::Chunk("café".into()),
                StreamMessage::Complete("café!".into()),
                StreamMessage::End,
            ]
        );
    }

    #[tokio::test]
    async fn unknown_frame_types_and_invalid_utf8_are_ignored() {
        let messages = pump_chunks(&[
            &b"data: {\"type\":\"ping\"}\n"[..],
            &b"data: \xff\xfe\n"[..],
            &b"data: {\"type\":\"chunk\",\"content\":\"ok\"}\n"[..],
        ])
        .await;
        assert_eq!(
            messages,
            vec![StreamMessage::Chunk("ok".into()), StreamMessage::End]
        );
    }

    #[tokio::test]
    async fn transport_errors_mid_body_surface_as_stream_errors() {
        let (tx, mut rx) = mpsc::unbounded_channel();
        let items: Vec<Result<Vec<u8>, io::Error>> = vec![
            Ok(b"data: {\"type\":\"chunk\",\"content\":\"par\"}\n".to_vec()),
            Err(io::Error::new(io::ErrorKind::ConnectionReset, "connection reset")),
        ];
        pump_stream(stream::iter(items), &tx, 3).await;
        assert_eq!(
            drain(&mut rx),
            vec![
                StreamMessage::Chunk("par".into()),
                StreamMessage::Error("connection reset".into()),
            ]
        );
    }

    #[test]
    fn messages_are_tagged_with_their_stream_id() {
        let (service, mut rx) = ChatStreamService::new();
        assert!(!process_stream_line(
            r#"data: {"type":"chunk","content":"a"}"#,
            &service.tx,
            11
        ));
        let (message, id) = rx.try_recv().expect("chunk");
        assert_eq!(id, 11);
        assert_eq!(message, StreamMessage::Chunk("a".into()));
    }
}
