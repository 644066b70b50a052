//! Event polling, dispatching, and UI rendering loop.
//!
//! Terminal events and stream updates are turned into actions, the action
//! queue is drained through the reducer once per iteration, and the
//! resulting commands are handed to the executors. Redraws are capped at
//! 60 fps.

use std::{
    error::Error,
    io,
    sync::Arc,
    time::{Duration, Instant},
};

use ratatui::crossterm::event::{self, Event, KeyEventKind};
use tokio::sync::{mpsc, Mutex};
use tracing::info;

use crate::core::app::{apply_actions, AppAction, AppActionDispatcher};
use crate::core::chat_stream::{ChatStreamService, StreamMessage};
use crate::ui::renderer::ui;

use super::executors::{spawn_command, ExecutorContext};
use super::keybindings::handle_key;
use super::lifecycle::{restore_terminal, setup_terminal, SharedTerminal};
use super::setup::{bootstrap_app, ChatBootstrap};
use super::AppHandle;

#[derive(Debug)]
pub enum UiEvent {
    Crossterm(Event),
}

async fn try_draw_frame(
    app: &AppHandle,
    terminal: &SharedTerminal,
    request_redraw: &mut bool,
    last_draw: &mut Instant,
    frame_duration: Duration,
) -> io::Result<()> {
    if !*request_redraw {
        return Ok(());
    }

    let now = Instant::now();
    if now.duration_since(*last_draw) < frame_duration {
        return Ok(());
    }

    let mut terminal_guard = terminal.lock().await;
    app.update(|app| terminal_guard.draw(|f| ui(f, app)).map(|_| ()))
        .await?;
    *last_draw = now;
    *request_redraw = false;
    Ok(())
}

pub(crate) fn sanitize_pasted_text(text: &str) -> String {
    let without_crlf = text.replace("\r\n", "\n");
    let without_cr = without_crlf.replace('\r', "\n");
    let expanded_tabs = without_cr.replace('\t', "    ");
    expanded_tabs
        .chars()
        .filter(|&c| c == '\n' || !c.is_control())
        .collect()
}

/// Returns true when at least one event was handled.
async fn process_ui_events(
    app: &AppHandle,
    event_rx: &mut mpsc::UnboundedReceiver<UiEvent>,
    dispatcher: &AppActionDispatcher,
) -> bool {
    let mut processed = false;
    while let Ok(ev) = event_rx.try_recv() {
        processed = true;
        match ev {
            UiEvent::Crossterm(Event::Key(key)) if key.kind == KeyEventKind::Press => {
                let actions = app.update(|app| handle_key(app, key)).await;
                dispatcher.dispatch_many(actions);
            }
            UiEvent::Crossterm(Event::Paste(text)) => {
                let text = sanitize_pasted_text(&text);
                if !text.is_empty() {
                    app.update(|app| {
                        if !app.modal.is_open() {
                            app.input.insert_str(text);
                        }
                    })
                    .await;
                }
            }
            UiEvent::Crossterm(_) => {}
        }
    }
    processed
}

/// Convert stream updates to actions, merging runs of consecutive chunks.
fn stream_updates_to_actions(updates: Vec<(StreamMessage, u64)>) -> Vec<AppAction> {
    let mut actions = Vec::with_capacity(updates.len());
    let mut pending_chunk: Option<(String, u64)> = None;

    for (message, stream_id) in updates {
        let action = match message {
            StreamMessage::Chunk(content) => {
                if let Some((buffer, id)) = pending_chunk.as_mut() {
                    if *id == stream_id {
                        buffer.push_str(&content);
                        continue;
                    }
                }
                if let Some((content, stream_id)) = pending_chunk.replace((content, stream_id)) {
                    actions.push(AppAction::StreamChunk { content, stream_id });
                }
                continue;
            }
            StreamMessage::Complete(content) => AppAction::StreamComplete { content, stream_id },
            StreamMessage::Error(message) => AppAction::StreamError { message, stream_id },
            StreamMessage::End => AppAction::StreamEnded { stream_id },
        };

        if let Some((content, stream_id)) = pending_chunk.take() {
            actions.push(AppAction::StreamChunk { content, stream_id });
        }
        actions.push(action);
    }

    if let Some((content, stream_id)) = pending_chunk {
        actions.push(AppAction::StreamChunk { content, stream_id });
    }
    actions
}

fn process_stream_updates(
    dispatcher: &AppActionDispatcher,
    rx: &mut mpsc::UnboundedReceiver<(StreamMessage, u64)>,
) -> bool {
    let mut updates = Vec::new();
    while let Ok(update) = rx.try_recv() {
        updates.push(update);
    }
    if updates.is_empty() {
        return false;
    }
    dispatcher.dispatch_many(stream_updates_to_actions(updates));
    true
}

async fn drain_action_queue(
    app: &AppHandle,
    executor: &ExecutorContext,
    stream_service: &ChatStreamService,
    action_rx: &mut mpsc::UnboundedReceiver<AppAction>,
) -> bool {
    let mut pending = Vec::new();
    while let Ok(action) = action_rx.try_recv() {
        pending.push(action);
    }
    if pending.is_empty() {
        return false;
    }

    let commands = app.update(|app| apply_actions(app, pending)).await;
    for cmd in commands {
        spawn_command(executor, stream_service, cmd);
    }
    true
}

fn spawn_event_reader(event_tx: mpsc::UnboundedSender<UiEvent>) -> tokio::task::JoinHandle<()> {
    tokio::spawn(async move {
        loop {
            if let Ok(true) = event::poll(Duration::from_millis(10)) {
                match event::read() {
                    Ok(ev) => {
                        if event_tx.send(UiEvent::Crossterm(ev)).is_err() {
                            break;
                        }
                    }
                    Err(_) => {
                        continue;
                    }
                }
            } else {
                tokio::task::yield_now().await;
            }
        }
    })
}

pub async fn run_chat(api_base_url: Option<String>) -> Result<(), Box<dyn Error>> {
    let ChatBootstrap { app, client, store } = bootstrap_app(api_base_url.as_deref())?;
    let initial_command = app.initial_command();
    let app = AppHandle::new(Arc::new(Mutex::new(app)));

    let (action_tx, mut action_rx) = mpsc::unbounded_channel::<AppAction>();
    let dispatcher = AppActionDispatcher::new(action_tx);
    let executor = ExecutorContext::new(Arc::new(client), store, dispatcher.clone());
    let (stream_service, mut stream_rx) = ChatStreamService::new();

    if let Some(cmd) = initial_command {
        spawn_command(&executor, &stream_service, cmd);
    }

    let terminal = setup_terminal()?;
    let (event_tx, mut event_rx) = mpsc::unbounded_channel::<UiEvent>();
    let event_reader_handle = spawn_event_reader(event_tx);

    const MAX_FPS: u64 = 60;
    let frame_duration = Duration::from_millis(1000 / MAX_FPS);
    let mut last_draw = Instant::now() - frame_duration;
    let mut request_redraw = true;

    let result: Result<(), Box<dyn Error>> = loop {
        if app.read(|app| app.exit_requested).await {
            break Ok(());
        }

        if let Err(err) = try_draw_frame(
            &app,
            &terminal,
            &mut request_redraw,
            &mut last_draw,
            frame_duration,
        )
        .await
        {
            break Err(err.into());
        }

        let events_processed = process_ui_events(&app, &mut event_rx, &dispatcher).await;
        let received_any = process_stream_updates(&dispatcher, &mut stream_rx);
        dispatcher.dispatch(AppAction::Tick {
            now: Instant::now(),
        });
        drain_action_queue(&app, &executor, &stream_service, &mut action_rx).await;

        let timers_running = app
            .read(|app| app.banner.is_some() || app.typing_visible())
            .await;
        if events_processed || received_any || timers_running {
            request_redraw = true;
        }

        if !events_processed && !received_any {
            tokio::time::sleep(Duration::from_millis(16)).await;
        }
    };

    app.update(|app| app.session.cancel_stream()).await;
    event_reader_handle.abort();
    restore_terminal(&terminal).await?;
    info!("chat session closed");
    result
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pasted_text_is_normalized() {
        assert_eq!(sanitize_pasted_text("a\r\nb\rc\td\u{7}"), "a\nb\nc    d");
    }

    #[test]
    fn consecutive_chunks_are_merged_in_order() {
        let actions = stream_updates_to_actions(vec![
            (StreamMessage::Chunk("Hi".into()), 1),
            (StreamMessage::Chunk(" there".into()), 1),
            (StreamMessage::Complete("Hi there!".into()), 1),
            (StreamMessage::End, 1),
        ]);
        assert!(matches!(
            actions.as_slice(),
            [
                AppAction::StreamChunk { content, stream_id: 1 },
                AppAction::StreamComplete { .. },
                AppAction::StreamEnded { stream_id: 1 },
            ] if content == "Hi there"
        ));
    }

    #[test]
    fn chunks_from_different_streams_stay_separate() {
        let actions = stream_updates_to_actions(vec![
            (StreamMessage::Chunk("old".into()), 1),
            (StreamMessage::Chunk("new".into()), 2),
        ]);
        assert!(matches!(
            actions.as_slice(),
            [
                AppAction::StreamChunk { stream_id: 1, .. },
                AppAction::StreamChunk { stream_id: 2, .. },
            ]
        ));
    }

    #[tokio::test]
    async fn drained_actions_reach_the_reducer() {
        use crate::ui::chat_loop::executors::test_support::Harness;
        use crate::utils::test_utils::{create_test_app, FakeBackend};

        let app = AppHandle::new(Arc::new(Mutex::new(create_test_app())));
        let harness = Harness::new(FakeBackend::default());
        let (stream_service, _stream_rx) = ChatStreamService::new();
        let (tx, mut rx) = mpsc::unbounded_channel();
        let dispatcher = AppActionDispatcher::new(tx);

        dispatcher.dispatch(AppAction::ToggleFocus);
        assert!(drain_action_queue(&app, &harness.ctx, &stream_service, &mut rx).await);
        assert!(!drain_action_queue(&app, &harness.ctx, &stream_service, &mut rx).await);
        assert_eq!(
            app.read(|app| app.focus).await,
            crate::core::app::Focus::Sidebar
        );
    }
}
