//! # TUI Adapter
//!
//! The ratatui-specific layer. Handles terminal I/O, renders the post
//! browser, and translates keyboard events into `core::Action` values.
//!
//! Network work never runs on this loop. Page loads and mutations are
//! spawned as tokio tasks and report back over a channel as actions.
//! Scrolling can spawn many page loads in a burst; the feed controller
//! lets exactly one of them fetch and the rest return immediately.

mod component;
pub mod event;
pub mod form;
mod ui;

use log::{debug, info, warn};
use std::future::Future;
use std::io::stdout;
use std::sync::{Arc, mpsc};
use std::time::Duration;

use crossterm::event::{
    DisableBracketedPaste, DisableMouseCapture, EnableBracketedPaste, EnableMouseCapture,
};
use crossterm::execute;
use ratatui::widgets::ListState;

use crate::core::action::{Action, Effect, update};
use crate::core::feed::FeedController;
use crate::core::state::App;
use crate::remote::{ClientError, PostClient, PostStore};
use crate::tui::component::EventHandler;
use crate::tui::event::{TuiEvent, poll_event_immediate, poll_event_timeout};
use crate::tui::form::{Form, FormEvent, FormKind};

/// Rows moved by PageUp / PageDown.
const PAGE_JUMP: usize = 10;

/// TUI-specific presentation state (not part of core business logic)
pub struct TuiState {
    pub list_state: ListState,
    /// Modal form overlay (None = hidden)
    pub form: Option<Form>,
}

impl TuiState {
    pub fn new() -> Self {
        Self {
            list_state: ListState::default(),
            form: None,
        }
    }
}

impl Default for TuiState {
    fn default() -> Self {
        Self::new()
    }
}

struct TerminalModeGuard;

impl TerminalModeGuard {
    fn new() -> std::io::Result<Self> {
        execute!(stdout(), EnableMouseCapture, EnableBracketedPaste)?;
        info!("Terminal modes enabled (mouse, bracketed paste)");
        Ok(Self)
    }
}

impl Drop for TerminalModeGuard {
    fn drop(&mut self) {
        let _ = execute!(stdout(), DisableMouseCapture, DisableBracketedPaste);
    }
}

/// Handles to everything background tasks need.
struct Workers {
    client: Arc<PostClient>,
    feed: Arc<FeedController>,
    tx: mpsc::Sender<Action>,
}

impl Workers {
    fn spawn_page_load(&self) {
        let feed = self.feed.clone();
        let tx = self.tx.clone();
        tokio::spawn(async move {
            let action = match feed.load_next_page().await {
                Ok(Some(page)) => Action::PageLoaded(page),
                Ok(None) => Action::PageSkipped,
                Err(e) => {
                    warn!("Page load failed: {}", e);
                    Action::LoadFailed {
                        reauth: e.is_authorization_failure(),
                        message: e.to_string(),
                    }
                }
            };
            if tx.send(action).is_err() {
                warn!("Failed to send page result: receiver dropped");
            }
        });
    }

    /// Runs a store mutation off the UI loop and reports the outcome.
    fn spawn_mutation<F, Fut>(&self, op: F)
    where
        F: FnOnce(Arc<PostClient>) -> Fut + Send + 'static,
        Fut: Future<Output = Result<Action, ClientError>> + Send + 'static,
    {
        let client = self.client.clone();
        let tx = self.tx.clone();
        tokio::spawn(async move {
            let action = op(client).await.unwrap_or_else(|e| {
                warn!("Mutation failed: {}", e);
                Action::MutationFailed {
                    reauth: e.is_authorization_failure(),
                    message: e.to_string(),
                }
            });
            if tx.send(action).is_err() {
                warn!("Failed to send mutation result: receiver dropped");
            }
        });
    }
}

/// Applies an action and carries out whatever effects follow. Returns true on quit.
fn dispatch(app: &mut App, action: Action, workers: &Workers) -> bool {
    let mut next = Some(action);
    while let Some(action) = next.take() {
        match update(app, action) {
            Effect::None => {}
            Effect::Quit => return true,
            Effect::RestartFeed => {
                next = Some(Action::FeedRestarted(workers.feed.start_feed()));
            }
            Effect::LoadNextPage => workers.spawn_page_load(),
        }
    }
    false
}

fn submit_form(app: &mut App, workers: &Workers, kind: FormKind, first: String, second: String) {
    match kind {
        FormKind::Login => {
            workers.client.authenticate(&first, &second);
            dispatch(app, Action::Authenticated(first), workers);
        }
        FormKind::NewPost => {
            app.status_message = String::from("Creating post...");
            workers.spawn_mutation(move |client| async move {
                client.create_post(&first, &second).await.map(Action::PostCreated)
            });
        }
        FormKind::EditPost(id) => {
            app.status_message = format!("Saving post {id}...");
            workers.spawn_mutation(move |client| async move {
                client.update_post(id, &first, &second).await.map(Action::PostUpdated)
            });
        }
    }
}

/// Browse-mode key handling. Returns true on quit.
fn handle_browse_event(app: &mut App, tui: &mut TuiState, event: TuiEvent, workers: &Workers) -> bool {
    match event {
        TuiEvent::Escape | TuiEvent::InputChar('q') => dispatch(app, Action::Quit, workers),
        TuiEvent::Down | TuiEvent::InputChar('j') => dispatch(app, Action::SelectNext, workers),
        TuiEvent::Up | TuiEvent::InputChar('k') => dispatch(app, Action::SelectPrev, workers),
        TuiEvent::PageDown => {
            (0..PAGE_JUMP).any(|_| dispatch(app, Action::SelectNext, workers))
        }
        TuiEvent::PageUp => {
            (0..PAGE_JUMP).any(|_| dispatch(app, Action::SelectPrev, workers))
        }
        TuiEvent::InputChar('r') => dispatch(app, Action::Refresh, workers),
        TuiEvent::InputChar('n') => {
            tui.form = Some(Form::new_post());
            false
        }
        TuiEvent::InputChar('l') => {
            tui.form = Some(Form::login(app.current_user.as_deref()));
            false
        }
        TuiEvent::InputChar('e') if app.can_modify_selected() => {
            tui.form = app.selected_post().map(Form::edit);
            false
        }
        TuiEvent::InputChar('d') if app.can_modify_selected() => {
            if let Some(id) = app.selected_post().map(|p| p.id) {
                app.status_message = format!("Deleting post {id}...");
                workers.spawn_mutation(move |client| async move {
                    client.delete_post(id).await.map(|_| Action::PostDeleted(id))
                });
            }
            false
        }
        _ => false,
    }
}

pub fn run(client: Arc<PostClient>) -> std::io::Result<()> {
    let feed = Arc::new(FeedController::new(client.clone()));
    let base_url = client.base_url().to_string();
    let mut app = App::new(client.current_user());
    let mut tui = TuiState::new();

    // Channel for actions from background tasks
    let (tx, rx) = mpsc::channel();
    let workers = Workers { client, feed, tx };

    let mut terminal = ratatui::init();
    let _terminal_mode_guard = TerminalModeGuard::new();

    let mut should_quit = dispatch(&mut app, Action::Refresh, &workers);
    let mut needs_redraw = true;

    while !should_quit {
        if needs_redraw {
            terminal.draw(|f| ui::draw_ui(f, &app, &mut tui, &base_url))?;
            needs_redraw = false;
        }

        // Short poll while waiting on the network so results show up promptly
        let timeout = if app.is_loading {
            Duration::from_millis(50)
        } else {
            Duration::from_millis(250)
        };
        let first_event = poll_event_timeout(timeout);
        if first_event.is_some() {
            needs_redraw = true;
        }

        // Process first event + drain ALL pending events before next draw
        for event in first_event
            .into_iter()
            .chain(std::iter::from_fn(poll_event_immediate))
        {
            if matches!(event, TuiEvent::Resize) {
                continue;
            }
            if matches!(event, TuiEvent::ForceQuit) {
                should_quit = true;
                break;
            }

            // When a form is open, route all events to it
            if let Some(form) = tui.form.as_mut() {
                if let Some(form_event) = form.handle_event(&event) {
                    tui.form = None;
                    if let FormEvent::Submit { kind, first, second } = form_event {
                        submit_form(&mut app, &workers, kind, first, second);
                    }
                }
                continue;
            }

            if handle_browse_event(&mut app, &mut tui, event, &workers) {
                should_quit = true;
                break;
            }
        }

        // Handle background task results
        while let Ok(action) = rx.try_recv() {
            needs_redraw = true;
            debug!("Event loop received: {:?}", action);
            if dispatch(&mut app, action, &workers) {
                should_quit = true;
            }
        }
    }

    ratatui::restore();
    Ok(())
}
