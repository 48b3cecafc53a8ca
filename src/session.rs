//! The wizard session actor.
//!
//! [`WizardSession::spawn`] moves a [`Wizard`] into a tokio task that owns
//! it exclusively. Callers talk to it through a cloneable [`WizardHandle`]:
//! each call sends a command over an mpsc channel and awaits the reply on a
//! oneshot channel. Card loads run as separate tasks that post their result
//! back to the actor, so a slow fetch never holds up navigation.

use std::sync::Arc;
use tokio::sync::{broadcast, mpsc, oneshot};
use tracing::{debug, info, info_span, Instrument};

use crate::wizard::{LoadRequest, NavigationOutcome, OptionsStatus, SelectionOutcome, WizardState};
use crate::{
    Card, LoadError, NavigationView, Result, SelectionSummary, StepId, StepLoader, WaymarkError,
    Wizard, WizardEvent,
};

/// Default capacity of the session's command channel.
pub const DEFAULT_COMMAND_CHANNEL_CAPACITY: usize = 64;

/// Configuration for a wizard session.
#[derive(Debug, Clone)]
pub struct SessionConfig {
    /// Capacity of the command channel.
    pub command_capacity: usize,
    /// Name recorded on the session's tracing span.
    pub name: String,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            command_capacity: DEFAULT_COMMAND_CHANNEL_CAPACITY,
            name: "character-creation".to_string(),
        }
    }
}

impl SessionConfig {
    /// Sets the command channel capacity.
    pub fn with_command_capacity(mut self, capacity: usize) -> Self {
        self.command_capacity = capacity;
        self
    }

    /// Sets the session name.
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }
}

/// A point-in-time copy of everything a view needs to render.
#[derive(Debug, Clone)]
pub struct WizardSnapshot {
    /// The wizard state.
    pub state: WizardState,
    /// The navigation view model.
    pub navigation: NavigationView,
    /// The selection summary.
    pub summary: SelectionSummary,
    /// Status of the current step's selectable cards.
    pub current_options: OptionsStatus,
}

impl WizardSnapshot {
    fn of(wizard: &Wizard) -> Self {
        Self {
            state: wizard.state().clone(),
            navigation: wizard.navigation(),
            summary: wizard.summary(),
            current_options: wizard.options_status(wizard.current_step()),
        }
    }

    /// Returns the current step's cards once they have loaded.
    pub fn cards(&self) -> Option<&[Card]> {
        match &self.current_options {
            OptionsStatus::Ready(cards) => Some(cards),
            _ => None,
        }
    }
}

enum Command {
    Select {
        card: Card,
        reply: oneshot::Sender<SelectionOutcome>,
    },
    Navigate {
        target: StepId,
        reply: oneshot::Sender<NavigationOutcome>,
    },
    Next {
        reply: oneshot::Sender<NavigationOutcome>,
    },
    Previous {
        reply: oneshot::Sender<NavigationOutcome>,
    },
    RetryLoad {
        reply: oneshot::Sender<bool>,
    },
    Reset {
        reply: oneshot::Sender<()>,
    },
    Snapshot {
        reply: oneshot::Sender<WizardSnapshot>,
    },
    LoadFinished {
        request: LoadRequest,
        result: std::result::Result<Arc<[Card]>, LoadError>,
    },
    Shutdown,
}

/// Spawns wizard sessions.
pub struct WizardSession;

impl WizardSession {
    /// Moves `wizard` into a new task and returns a handle to it.
    ///
    /// The session issues the first step's load immediately. It stops when
    /// every handle is dropped or [`WizardHandle::shutdown`] is called.
    ///
    /// Must be called from within a tokio runtime.
    pub fn spawn(wizard: Wizard, loader: Arc<dyn StepLoader>, config: SessionConfig) -> WizardHandle {
        let (tx, commands) = mpsc::channel(config.command_capacity.max(1));
        let events = wizard.event_sender();

        let actor = SessionActor {
            wizard,
            loader,
            commands,
            loopback: tx.downgrade(),
        };
        let span = info_span!("wizard_session", name = %config.name);
        tokio::spawn(actor.run().instrument(span));

        WizardHandle { tx, events }
    }
}

struct SessionActor {
    wizard: Wizard,
    loader: Arc<dyn StepLoader>,
    commands: mpsc::Receiver<Command>,
    /// Weak so in-flight loads do not keep a closed session alive.
    loopback: mpsc::WeakSender<Command>,
}

impl SessionActor {
    async fn run(mut self) {
        info!(current = %self.wizard.current_step(), "session started");
        let initial = self.wizard.start();
        self.spawn_load(initial);

        while let Some(command) = self.commands.recv().await {
            match command {
                Command::Select { card, reply } => {
                    let _ = reply.send(self.wizard.select_item(card));
                }
                Command::Navigate { target, reply } => {
                    let outcome = self.wizard.request_navigate(target);
                    self.spawn_load(outcome.load());
                    let _ = reply.send(outcome);
                }
                Command::Next { reply } => {
                    let outcome = self.wizard.go_next();
                    self.spawn_load(outcome.load());
                    let _ = reply.send(outcome);
                }
                Command::Previous { reply } => {
                    let outcome = self.wizard.go_previous();
                    self.spawn_load(outcome.load());
                    let _ = reply.send(outcome);
                }
                Command::RetryLoad { reply } => {
                    let request = self.wizard.retry_load();
                    let retried = request.is_some();
                    self.spawn_load(request);
                    let _ = reply.send(retried);
                }
                Command::Reset { reply } => {
                    self.loader.clear_cache().await;
                    let request = self.wizard.reset();
                    self.spawn_load(request);
                    let _ = reply.send(());
                }
                Command::Snapshot { reply } => {
                    let _ = reply.send(WizardSnapshot::of(&self.wizard));
                }
                Command::LoadFinished { request, result } => {
                    self.wizard.complete_load(request, result);
                }
                Command::Shutdown => break,
            }
        }

        info!("session stopped");
    }

    fn spawn_load(&self, request: Option<LoadRequest>) {
        let Some(request) = request else {
            return;
        };

        let loader = Arc::clone(&self.loader);
        let loopback = self.loopback.clone();
        let span = info_span!("load", key = %request.key, ticket = request.ticket);

        tokio::spawn(
            async move {
                let result = loader.load(&request.key).await;
                match loopback.upgrade() {
                    Some(tx) => {
                        let _ = tx.send(Command::LoadFinished { request, result }).await;
                    }
                    None => debug!("session closed before load finished"),
                }
            }
            .instrument(span),
        );
    }
}

/// A cloneable handle to a running wizard session.
#[derive(Clone)]
pub struct WizardHandle {
    tx: mpsc::Sender<Command>,
    events: broadcast::Sender<WizardEvent>,
}

impl WizardHandle {
    async fn request<T>(&self, make: impl FnOnce(oneshot::Sender<T>) -> Command) -> Result<T> {
        let (reply, response) = oneshot::channel();
        self.tx
            .send(make(reply))
            .await
            .map_err(|_| WaymarkError::SessionClosed)?;
        response.await.map_err(|_| WaymarkError::SessionClosed)
    }

    /// Applies a card click on the current step.
    ///
    /// # Errors
    ///
    /// Returns [`WaymarkError::SessionClosed`] if the session has stopped.
    pub async fn select(&self, card: Card) -> Result<SelectionOutcome> {
        self.request(|reply| Command::Select { card, reply }).await
    }

    /// Requests navigation to `target`.
    ///
    /// # Errors
    ///
    /// Returns [`WaymarkError::SessionClosed`] if the session has stopped.
    pub async fn navigate(&self, target: StepId) -> Result<NavigationOutcome> {
        self.request(|reply| Command::Navigate { target, reply }).await
    }

    /// Moves to the next step.
    ///
    /// # Errors
    ///
    /// Returns [`WaymarkError::SessionClosed`] if the session has stopped.
    pub async fn next(&self) -> Result<NavigationOutcome> {
        self.request(|reply| Command::Next { reply }).await
    }

    /// Moves to the previous step.
    ///
    /// # Errors
    ///
    /// Returns [`WaymarkError::SessionClosed`] if the session has stopped.
    pub async fn previous(&self) -> Result<NavigationOutcome> {
        self.request(|reply| Command::Previous { reply }).await
    }

    /// Retries the current step's failed load. Returns false if there was
    /// nothing to retry.
    ///
    /// # Errors
    ///
    /// Returns [`WaymarkError::SessionClosed`] if the session has stopped.
    pub async fn retry_load(&self) -> Result<bool> {
        self.request(|reply| Command::RetryLoad { reply }).await
    }

    /// Clears the loader cache and resets the wizard.
    ///
    /// # Errors
    ///
    /// Returns [`WaymarkError::SessionClosed`] if the session has stopped.
    pub async fn reset(&self) -> Result<()> {
        self.request(|reply| Command::Reset { reply }).await
    }

    /// Returns a snapshot of the wizard.
    ///
    /// # Errors
    ///
    /// Returns [`WaymarkError::SessionClosed`] if the session has stopped.
    pub async fn snapshot(&self) -> Result<WizardSnapshot> {
        self.request(|reply| Command::Snapshot { reply }).await
    }

    /// Subscribes to the session's wizard events.
    pub fn subscribe(&self) -> broadcast::Receiver<WizardEvent> {
        self.events.subscribe()
    }

    /// Stops the session. Pending loads are discarded.
    ///
    /// # Errors
    ///
    /// Returns [`WaymarkError::SessionClosed`] if the session already stopped.
    pub async fn shutdown(&self) -> Result<()> {
        self.tx
            .send(Command::Shutdown)
            .await
            .map_err(|_| WaymarkError::SessionClosed)
    }

    /// Returns true if the session has stopped.
    pub fn is_closed(&self) -> bool {
        self.tx.is_closed()
    }
}

impl std::fmt::Debug for WizardHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WizardHandle")
            .field("closed", &self.tx.is_closed())
            .finish()
    }
}
