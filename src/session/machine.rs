use super::{
    Confirmation, EditSession, Effect, Event, SessionId, SessionSettings, State, StatusKind,
};
use crate::{
    credential::Credential,
    document_path::DocumentPath,
    error::{RepositoryError, ValidationError},
    front_matter,
    repository::{CommitResult, FileRevision},
};

const CONFLICT_MESSAGE: &str = "Save rejected: the post changed on GitHub since you loaded it. \
     Copy your edits, then close and reopen the editor to load the latest version.";

/// The edit/save/cancel state machine. Owns no I/O: every call to
/// [`Machine::handle`] moves the state forward and returns what to do next.
#[derive(Debug)]
pub struct Machine {
    settings: SessionSettings,
    state: State,
    pending: Option<Confirmation>,
    next_id: u64,
}

impl Machine {
    pub fn new(settings: SessionSettings) -> Self {
        Self {
            settings,
            state: State::Unauthenticated,
            pending: None,
            next_id: 1,
        }
    }

    pub fn state(&self) -> &State {
        &self.state
    }

    pub fn handle(&mut self, event: Event) -> Vec<Effect> {
        match event {
            Event::PageLoaded => {
                self.state = State::Unauthenticated;
                self.pending = None;
                vec![Effect::CheckIdentity]
            }
            Event::IdentityChecked(valid) => self.on_identity(valid),
            Event::LoginRequested => match self.state {
                State::Unauthenticated => vec![Effect::PromptCredential],
                _ => Vec::new(),
            },
            Event::CredentialEntered(input) => on_credential(input),
            Event::LogoutRequested => match self.state {
                State::Idle { open: None } => self.ask(Confirmation::Logout),
                _ => Vec::new(),
            },
            Event::OpenRequested(meta) => {
                if !matches!(self.state, State::Idle { open: None }) {
                    tracing::debug!("Open ignored: editor already open or not authenticated");
                    return Vec::new();
                }
                match DocumentPath::derive(&meta, &self.settings.layout) {
                    Ok(path) => self.open(path),
                    Err(e) => {
                        tracing::error!("Could not find post metadata: {}", e);
                        vec![Effect::Notify(e.to_string())]
                    }
                }
            }
            Event::ReadCompleted { session, result } => self.on_read(session, result),
            Event::SaveRequested { content, message } => self.save(content, &message),
            Event::WriteCompleted { session, result } => self.on_write(session, result),
            Event::CloseRequested { content } => self.request_close(&content),
            Event::Answered {
                confirmation,
                accepted,
            } => self.on_answer(confirmation, accepted),
            Event::CloseDelayElapsed(id) => self.on_close_delay(id),
        }
    }

    // ── Transitions ──────────────────────────────────────────────────────────

    fn on_identity(&mut self, valid: bool) -> Vec<Effect> {
        if self.state != State::Unauthenticated {
            return Vec::new();
        }
        if valid {
            self.state = State::Idle { open: None };
            vec![Effect::ShowEditControls]
        } else {
            vec![Effect::ShowLogin]
        }
    }

    fn open(&mut self, path: DocumentPath) -> Vec<Effect> {
        let id = SessionId(self.next_id);
        self.next_id += 1;
        tracing::info!(session = %id, path = %path, "Opening editor");

        self.state = State::Loading(EditSession {
            id,
            path: path.clone(),
            version_token: None,
        });
        vec![
            Effect::OpenModal,
            Effect::SetModalTitle(path.to_string()),
            status("Loading post content...", StatusKind::Info),
            Effect::ReadFile { session: id, path },
        ]
    }

    fn on_read(
        &mut self,
        id: SessionId,
        result: Result<FileRevision, RepositoryError>,
    ) -> Vec<Effect> {
        let session = match &self.state {
            State::Loading(s) if s.id == id => s.clone(),
            _ => {
                tracing::debug!(session = %id, "Dropping read result for a closed session");
                return Vec::new();
            }
        };

        match result {
            Ok(revision) => {
                let mut effects = Vec::new();
                if let Some(title) = front_matter::header(&revision.content).title {
                    effects.push(Effect::SetModalTitle(title));
                }
                effects.push(Effect::SetEditorContent(revision.content));
                effects.push(Effect::SetSaveEnabled(true));
                effects.push(status("Ready to edit", StatusKind::Info));
                self.state = State::Editing(EditSession {
                    version_token: Some(revision.version_token),
                    ..session
                });
                effects
            }
            Err(e) => {
                tracing::error!(session = %id, path = %session.path, "Error loading file: {}", e);
                self.state = State::Idle {
                    open: Some(EditSession {
                        version_token: None,
                        ..session
                    }),
                };
                vec![status(format!("Error loading file: {e}"), StatusKind::Error)]
            }
        }
    }

    fn save(&mut self, content: String, message: &str) -> Vec<Effect> {
        let session = match &self.state {
            State::Editing(s) => s.clone(),
            _ => return Vec::new(),
        };

        if content.trim().is_empty() {
            return vec![Effect::Notify(ValidationError::EmptyContent.to_string())];
        }
        let Some(version_token) = session.version_token.clone() else {
            return vec![status(CONFLICT_MESSAGE, StatusKind::Error)];
        };

        let message = match message.trim() {
            "" => self.settings.default_message.clone(),
            m => m.to_string(),
        };
        tracing::info!(session = %session.id, path = %session.path, "Saving");

        let effects = vec![
            Effect::SetSaveEnabled(false),
            status("Committing changes to GitHub...", StatusKind::Info),
            Effect::WriteFile {
                session: session.id,
                path: session.path.clone(),
                content,
                version_token,
                message,
            },
        ];
        self.state = State::Saving(session);
        effects
    }

    fn on_write(
        &mut self,
        id: SessionId,
        result: Result<CommitResult, RepositoryError>,
    ) -> Vec<Effect> {
        let session = match &self.state {
            State::Saving(s) if s.id == id => s.clone(),
            _ => {
                tracing::debug!(session = %id, "Dropping write result for a closed session");
                return Vec::new();
            }
        };

        match result {
            Ok(commit) => {
                tracing::info!(
                    session = %id,
                    path = %session.path,
                    commit = commit.commit_sha.as_deref().unwrap_or("?"),
                    version = commit.version_token.as_deref().unwrap_or("?"),
                    url = commit.html_url.as_deref().unwrap_or("-"),
                    "Saved post"
                );
                self.state = State::Idle {
                    open: Some(EditSession {
                        version_token: None,
                        ..session
                    }),
                };
                vec![
                    Effect::SetSaveEnabled(true),
                    status("Changes saved successfully!", StatusKind::Success),
                    Effect::ScheduleClose {
                        session: id,
                        after: self.settings.close_delay,
                    },
                ]
            }
            Err(e) if e.is_conflict() => {
                tracing::warn!(session = %id, path = %session.path, "Save rejected as stale: {}", e);
                // The token is now known to be stale and must never be sent again.
                self.state = State::Editing(EditSession {
                    version_token: None,
                    ..session
                });
                vec![
                    Effect::SetSaveEnabled(true),
                    status(CONFLICT_MESSAGE, StatusKind::Error),
                ]
            }
            // Not proof of staleness: the token is kept so the save can be retried.
            Err(e) => {
                tracing::error!(
                    session = %id,
                    path = %session.path,
                    status = ?e.status(),
                    "Error saving file: {}",
                    e
                );
                self.state = State::Editing(session);
                vec![
                    Effect::SetSaveEnabled(true),
                    status(format!("Error saving: {e}"), StatusKind::Error),
                ]
            }
        }
    }

    fn request_close(&mut self, content: &str) -> Vec<Effect> {
        match self.state {
            State::Saving(_) => vec![status(
                "Save in progress, wait for it to finish before closing.",
                StatusKind::Info,
            )],
            State::Loading(_) | State::Editing(_) | State::Idle { open: Some(_) } => {
                if content.is_empty() {
                    self.close()
                } else {
                    self.ask(Confirmation::DiscardChanges)
                }
            }
            _ => Vec::new(),
        }
    }

    fn close(&mut self) -> Vec<Effect> {
        if let Some(s) = self.state.session() {
            tracing::info!(session = %s.id, "Closing editor");
        }
        self.state = State::Idle { open: None };
        vec![Effect::ClearEditor, Effect::CloseModal]
    }

    fn ask(&mut self, confirmation: Confirmation) -> Vec<Effect> {
        self.pending = Some(confirmation);
        vec![Effect::Confirm(confirmation)]
    }

    fn on_answer(&mut self, confirmation: Confirmation, accepted: bool) -> Vec<Effect> {
        if self.pending != Some(confirmation) {
            return Vec::new();
        }
        self.pending = None;
        if !accepted {
            return Vec::new();
        }

        match confirmation {
            Confirmation::DiscardChanges => match self.state {
                State::Loading(_) | State::Editing(_) | State::Idle { open: Some(_) } => {
                    self.close()
                }
                _ => Vec::new(),
            },
            Confirmation::Logout => vec![Effect::ClearCredential, Effect::ReloadPage],
            Confirmation::ReloadAfterSave => vec![Effect::ReloadPage],
        }
    }

    fn on_close_delay(&mut self, id: SessionId) -> Vec<Effect> {
        let lingering = matches!(&self.state, State::Idle { open: Some(s) } if s.id == id);
        if !lingering {
            return Vec::new();
        }
        let mut effects = self.close();
        effects.extend(self.ask(Confirmation::ReloadAfterSave));
        effects
    }
}

fn on_credential(input: Option<String>) -> Vec<Effect> {
    match input.as_deref().map(str::trim) {
        Some(token) if !token.is_empty() => vec![
            Effect::StoreCredential(Credential::new(token)),
            Effect::ReloadPage,
        ],
        _ => Vec::new(),
    }
}

fn status(text: impl Into<String>, kind: StatusKind) -> Effect {
    Effect::Status {
        text: text.into(),
        kind,
    }
}
