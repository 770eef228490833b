//! # TUI Adapter
//!
//! The ratatui-specific layer. Handles terminal I/O, renders the UI,
//! and translates keyboard events into core::Action values.
//!
//! This is the only module that knows about ratatui and crossterm.
//!
//! ## Redraw Strategy
//!
//! - **Animating** (waiting for or streaming an answer): draws every ~80ms so
//!   the spinner and streaming cursor move.
//! - **Idle**: sleeps up to 500ms and only redraws on input or resize.
//!
//! ## Requests
//!
//! Each question runs on two tokio tasks: the provider writes `StreamEvent`s
//! into a bounded channel and a forwarder wraps them in `Action::Stream`
//! tagged with the question's generation. Events from an older generation
//! are ignored by the conversation, so a reset never needs to wait for a
//! request to finish.

mod component;
mod components;
mod event;
pub mod markdown;
mod ui;

use std::io::stdout;
use std::sync::{Arc, mpsc};
use std::time::Duration;

use crossterm::cursor::{SetCursorStyle, Show};
use crossterm::event::{
    DisableBracketedPaste, DisableMouseCapture, EnableBracketedPaste, EnableMouseCapture,
};
use crossterm::execute;
use log::{debug, info, warn};
use tokio::task::AbortHandle;

use crate::core::action::{Action, Effect, update};
use crate::core::config::ResolvedConfig;
use crate::core::state::App;
use crate::rag::{AnswerProvider, AskRequest, StreamEvent, stream_to_channel};
use crate::tui::component::EventHandler;
use crate::tui::components::landing::next_suggestion;
use crate::tui::components::{InputBox, InputEvent, MessageListState};
use crate::tui::event::{TuiEvent, poll_event_immediate, poll_event_timeout};

const ANIMATION_TICK: Duration = Duration::from_millis(80);
const IDLE_TICK: Duration = Duration::from_millis(500);
/// Events buffered between the provider and the forwarder.
const STREAM_BUFFER: usize = 100;

/// TUI-specific presentation state (not part of core business logic)
pub struct TuiState {
    pub message_list: MessageListState,
    pub input_box: InputBox,
    /// Show citation lists under answers and the sources panel.
    pub show_citations: bool,
    /// Next landing-page suggestion Tab inserts.
    pub suggestion_index: usize,
}

impl Default for TuiState {
    fn default() -> Self {
        Self::new()
    }
}

impl TuiState {
    pub fn new() -> Self {
        Self {
            message_list: MessageListState::new(),
            input_box: InputBox::new(),
            show_citations: true,
            suggestion_index: 0,
        }
    }
}

struct TerminalModeGuard;

impl TerminalModeGuard {
    fn new() -> std::io::Result<Self> {
        execute!(
            stdout(),
            EnableMouseCapture,
            EnableBracketedPaste,
            Show,
            SetCursorStyle::SteadyBlock, // blinking resets on every draw()
        )?;
        info!("Terminal modes enabled (mouse, bracketed paste, steady block cursor)");
        Ok(Self)
    }
}

impl Drop for TerminalModeGuard {
    fn drop(&mut self) {
        let _ = execute!(stdout(), DisableMouseCapture, DisableBracketedPaste);
    }
}

pub fn run(config: ResolvedConfig) -> std::io::Result<()> {
    let mut app = App::from_config(&config);
    let mut tui = TuiState::new();

    let mut terminal = ratatui::init();
    let _terminal_mode_guard = TerminalModeGuard::new();

    // Actions from background tasks
    let (tx, rx) = mpsc::channel();
    let mut active_abort_handles: Vec<AbortHandle> = Vec::new();

    let start_time = std::time::Instant::now();
    let mut needs_redraw = true;

    loop {
        let animating = app.is_loading || app.conversation.is_streaming();
        if animating {
            needs_redraw = true;
        }

        if needs_redraw {
            let spinner_frame = (start_time.elapsed().as_millis() / ANIMATION_TICK.as_millis()) as usize;
            terminal.draw(|f| ui::draw_ui(f, &app, &mut tui, spinner_frame))?;
            needs_redraw = false;
        }

        let timeout = if animating { ANIMATION_TICK } else { IDLE_TICK };
        let first_event = poll_event_timeout(timeout);
        if first_event.is_some() {
            needs_redraw = true;
        }

        let mut should_quit = false;
        for event in first_event
            .into_iter()
            .chain(std::iter::from_fn(poll_event_immediate))
        {
            match handle_event(&mut app, &mut tui, event) {
                Effect::Quit => should_quit = true,
                Effect::SpawnRequest {
                    generation,
                    request,
                } => {
                    active_abort_handles =
                        spawn_request(app.provider(), generation, request, tx.clone());
                }
                Effect::None => {}
            }
        }

        if should_quit {
            break;
        }

        // Streamed events from background tasks
        while let Ok(action) = rx.try_recv() {
            needs_redraw = true;
            debug!("Event loop received: {action:?}");
            if let Effect::SpawnRequest { .. } = update(&mut app, action) {
                warn!("Stream action unexpectedly requested a new request");
            }
        }
        tui.input_box.disabled = app.conversation.is_streaming();
    }

    for handle in active_abort_handles.drain(..) {
        handle.abort();
    }
    ratatui::restore();
    info!("Corpus shutting down");
    Ok(())
}

/// Route one terminal event to the TUI state or the core reducer.
///
/// The input box is re-synced with the conversation after every update, so a
/// second Enter in the same poll batch leaves its text in place instead of
/// submitting into a busy conversation.
fn handle_event(app: &mut App, tui: &mut TuiState, event: TuiEvent) -> Effect {
    let action = match event {
        TuiEvent::Resize => None,
        TuiEvent::Quit => Some(Action::Quit),
        TuiEvent::Reset => {
            tui.message_list.reset();
            Some(Action::Reset)
        }
        TuiEvent::ToggleDemo => Some(Action::ToggleDemoMode),
        TuiEvent::CycleSemester => Some(Action::CycleSemester),
        TuiEvent::ToggleCitations => {
            tui.show_citations = !tui.show_citations;
            app.status_message = if tui.show_citations {
                "Citations shown".to_string()
            } else {
                "Citations hidden".to_string()
            };
            None
        }
        TuiEvent::NextSuggestion => {
            if app.conversation.is_empty() && tui.input_box.buffer.is_empty() {
                let (next, text) = next_suggestion(tui.suggestion_index);
                tui.suggestion_index = next;
                tui.input_box.set_text(text);
            }
            None
        }
        TuiEvent::ScrollUp
        | TuiEvent::ScrollDown
        | TuiEvent::ScrollPageUp
        | TuiEvent::ScrollPageDown
        | TuiEvent::ScrollToBottom => {
            tui.message_list.handle_event(&event);
            None
        }
        _ => match tui.input_box.handle_event(&event) {
            Some(InputEvent::Submit(text)) => Some(Action::Submit(text)),
            _ => None,
        },
    };

    let Some(action) = action else {
        return Effect::None;
    };
    let effect = update(app, action);
    tui.input_box.disabled = app.conversation.is_streaming();
    if let Effect::SpawnRequest { .. } = effect {
        tui.message_list.stick_to_bottom = true;
    }
    effect
}

/// Start answering `request`, forwarding every event to the UI as an
/// `Action::Stream` for `generation`.
fn spawn_request(
    provider: Arc<dyn AnswerProvider>,
    generation: u64,
    request: AskRequest,
    tx: mpsc::Sender<Action>,
) -> Vec<AbortHandle> {
    info!(
        "Spawning {} request (generation {generation})",
        provider.name()
    );

    let (event_tx, mut event_rx) = tokio::sync::mpsc::channel::<StreamEvent>(STREAM_BUFFER);

    let stream_handle = tokio::spawn(async move {
        stream_to_channel(provider.as_ref(), &request, event_tx).await;
    });

    let forward_handle = tokio::spawn(async move {
        let request_start = std::time::Instant::now();
        let mut first_token: Option<Duration> = None;
        let mut forwarded = 0usize;

        while let Some(event) = event_rx.recv().await {
            forwarded += 1;
            if first_token.is_none() && matches!(event, StreamEvent::Token(_)) {
                first_token = Some(request_start.elapsed());
            }
            let terminal = event.is_terminal();
            if tx.send(Action::Stream { generation, event }).is_err() {
                warn!("Failed to forward stream event: receiver dropped");
                return;
            }
            if terminal {
                break;
            }
        }

        info!(
            "Generation {generation} finished: {forwarded} events, first token after {}ms, total {}ms",
            first_token.map_or(0, |t| t.as_millis()),
            request_start.elapsed().as_millis()
        );
    });

    vec![stream_handle.abort_handle(), forward_handle.abort_handle()]
}
