use std::sync::Arc;
use tokio::sync::mpsc;

use super::{Effect, Event, Machine, SessionSettings, State};
use crate::{credential::CredentialStore, repository::ContentRepository};

/// Carries out the effects that talk to collaborators. Each remote call runs
/// as its own task and reports back as an [`Event`] on the channel; nothing
/// here blocks the caller.
pub struct EffectRunner {
    repository: Arc<dyn ContentRepository>,
    credentials: Arc<dyn CredentialStore>,
    events: mpsc::UnboundedSender<Event>,
}

impl EffectRunner {
    pub fn new(
        repository: Arc<dyn ContentRepository>,
        credentials: Arc<dyn CredentialStore>,
        events: mpsc::UnboundedSender<Event>,
    ) -> Self {
        Self {
            repository,
            credentials,
            events,
        }
    }

    /// Start the I/O effects and return the remaining ones, in order, for the
    /// UI to render.
    pub fn run(&self, effects: Vec<Effect>) -> Vec<Effect> {
        let mut ui = Vec::new();
        for effect in effects {
            match effect {
                Effect::CheckIdentity => {
                    let repo = Arc::clone(&self.repository);
                    let tx = self.events.clone();
                    tokio::spawn(async move {
                        let valid = repo.check_identity().await;
                        let _ = tx.send(Event::IdentityChecked(valid));
                    });
                }
                Effect::ReadFile { session, path } => {
                    let repo = Arc::clone(&self.repository);
                    let tx = self.events.clone();
                    tokio::spawn(async move {
                        let result = repo.read_file(&path).await;
                        let _ = tx.send(Event::ReadCompleted { session, result });
                    });
                }
                Effect::WriteFile {
                    session,
                    path,
                    content,
                    version_token,
                    message,
                } => {
                    let repo = Arc::clone(&self.repository);
                    let tx = self.events.clone();
                    tokio::spawn(async move {
                        let result = repo
                            .write_file(&path, &content, &version_token, &message)
                            .await;
                        let _ = tx.send(Event::WriteCompleted { session, result });
                    });
                }
                Effect::ScheduleClose { session, after } => {
                    let tx = self.events.clone();
                    tokio::spawn(async move {
                        tokio::time::sleep(after).await;
                        let _ = tx.send(Event::CloseDelayElapsed(session));
                    });
                }
                Effect::StoreCredential(credential) => {
                    if let Err(e) = self.credentials.set(credential) {
                        tracing::error!("Failed to store token: {}", e);
                        ui.push(Effect::Notify(format!("Could not store token: {e}")));
                    }
                }
                Effect::ClearCredential => {
                    if let Err(e) = self.credentials.clear() {
                        tracing::error!("Failed to clear token: {}", e);
                        ui.push(Effect::Notify(format!("Could not remove token: {e}")));
                    }
                }
                other => ui.push(other),
            }
        }
        ui
    }
}

/// The state machine wired to its collaborators.
pub struct Controller {
    machine: Machine,
    runner: EffectRunner,
    events: mpsc::UnboundedReceiver<Event>,
}

impl Controller {
    pub fn new(
        settings: SessionSettings,
        repository: Arc<dyn ContentRepository>,
        credentials: Arc<dyn CredentialStore>,
    ) -> Self {
        let (tx, rx) = mpsc::unbounded_channel();
        Self {
            machine: Machine::new(settings),
            runner: EffectRunner::new(repository, credentials, tx),
            events: rx,
        }
    }

    pub fn state(&self) -> &State {
        self.machine.state()
    }

    /// Feed one event through the machine; returns the UI effects.
    pub fn dispatch(&mut self, event: Event) -> Vec<Effect> {
        let effects = self.machine.handle(event);
        self.runner.run(effects)
    }

    /// Next completion from an outstanding call or timer.
    pub async fn next_event(&mut self) -> Option<Event> {
        self.events.recv().await
    }
}
