//! Edit session controller.
//!
//! [`Machine`] is the pure transition function: it takes an [`Event`] and
//! returns the [`Effect`]s the outside world must carry out. [`Controller`]
//! wires it to the repository and credential store, feeding async results
//! back in as events. The terminal UI is only an adapter on top.

mod driver;
mod machine;

pub use driver::Controller;
pub use machine::Machine;

use std::{fmt, time::Duration};

use crate::{
    credential::Credential,
    document_path::{DocumentPath, PageMetadata, PostLayout},
    error::RepositoryError,
    repository::{CommitResult, FileRevision},
};

pub const DEFAULT_COMMIT_MESSAGE: &str = "Update post via inline editor";
pub const DEFAULT_CLOSE_DELAY: Duration = Duration::from_millis(1500);

/// Identifies one open/close cycle of the modal. Async results tagged with an
/// older id are dropped.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SessionId(u64);

impl fmt::Display for SessionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// State of one editing session. The version token is present only between a
/// successful read and the write that consumes it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EditSession {
    pub id: SessionId,
    pub path: DocumentPath,
    pub version_token: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum State {
    Unauthenticated,
    /// Authenticated with no edit in progress. `open` is set while the modal
    /// is still showing after a failed load or a successful save.
    Idle { open: Option<EditSession> },
    Loading(EditSession),
    Editing(EditSession),
    Saving(EditSession),
}

impl State {
    pub fn session(&self) -> Option<&EditSession> {
        match self {
            State::Loading(s) | State::Editing(s) | State::Saving(s) => Some(s),
            State::Idle { open } => open.as_ref(),
            State::Unauthenticated => None,
        }
    }
}

/// Questions the user must answer before the machine continues.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Confirmation {
    DiscardChanges,
    Logout,
    ReloadAfterSave,
}

impl Confirmation {
    pub fn prompt(self) -> &'static str {
        match self {
            Confirmation::DiscardChanges => "Close editor? Unsaved changes will be lost.",
            Confirmation::Logout => "Remove stored GitHub token?",
            Confirmation::ReloadAfterSave => {
                "Post updated successfully! Reload page to see changes?"
            }
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StatusKind {
    Info,
    Success,
    Error,
}

#[derive(Debug)]
pub enum Event {
    PageLoaded,
    IdentityChecked(bool),
    LoginRequested,
    /// Answer to a credential prompt; `None` when the prompt was dismissed.
    CredentialEntered(Option<String>),
    LogoutRequested,
    OpenRequested(PageMetadata),
    ReadCompleted {
        session: SessionId,
        result: Result<FileRevision, RepositoryError>,
    },
    SaveRequested {
        content: String,
        message: String,
    },
    WriteCompleted {
        session: SessionId,
        result: Result<CommitResult, RepositoryError>,
    },
    /// Cancel, close button or backdrop. Carries the editor's current text.
    CloseRequested {
        content: String,
    },
    Answered {
        confirmation: Confirmation,
        accepted: bool,
    },
    CloseDelayElapsed(SessionId),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Effect {
    CheckIdentity,
    ShowLogin,
    ShowEditControls,
    PromptCredential,
    StoreCredential(Credential),
    ClearCredential,
    ReloadPage,
    /// A message the user must acknowledge, outside the modal.
    Notify(String),
    OpenModal,
    CloseModal,
    SetModalTitle(String),
    SetEditorContent(String),
    ClearEditor,
    SetSaveEnabled(bool),
    Status {
        text: String,
        kind: StatusKind,
    },
    ReadFile {
        session: SessionId,
        path: DocumentPath,
    },
    WriteFile {
        session: SessionId,
        path: DocumentPath,
        content: String,
        version_token: String,
        message: String,
    },
    ScheduleClose {
        session: SessionId,
        after: Duration,
    },
    Confirm(Confirmation),
}

/// Fixed knobs of the session controller.
#[derive(Debug, Clone)]
pub struct SessionSettings {
    pub layout: PostLayout,
    pub default_message: String,
    pub close_delay: Duration,
}

impl Default for SessionSettings {
    fn default() -> Self {
        Self {
            layout: PostLayout::default(),
            default_message: DEFAULT_COMMIT_MESSAGE.into(),
            close_delay: DEFAULT_CLOSE_DELAY,
        }
    }
}
