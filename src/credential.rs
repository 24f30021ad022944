//! Persisted bearer credential.
//!
//! The store is a single named slot in a small TOML key/value file. Nothing
//! here validates the token; the identity probe in the repository client is
//! the only judge of whether it works.

use std::{
    collections::BTreeMap,
    fmt,
    path::{Path, PathBuf},
};

use crate::error::CredentialError;

/// Slot name the token is kept under.
pub const TOKEN_KEY: &str = "github_editor_token";

/// An opaque bearer secret. `Debug` never prints the value.
#[derive(Clone, PartialEq, Eq)]
pub struct Credential(String);

impl Credential {
    pub fn new(secret: impl Into<String>) -> Self {
        Self(secret.into())
    }

    pub fn expose(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for Credential {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Credential(***)")
    }
}

pub trait CredentialStore: Send + Sync {
    fn get(&self) -> Option<Credential>;
    fn set(&self, credential: Credential) -> Result<(), CredentialError>;
    fn clear(&self) -> Result<(), CredentialError>;
}

// ── File-backed store ─────────────────────────────────────────────────────────

/// Default store location: `<config dir>/blog-inline-editor/store.toml`.
pub fn default_store_path() -> Result<PathBuf, CredentialError> {
    dirs::config_dir()
        .map(|d| d.join("blog-inline-editor").join("store.toml"))
        .ok_or(CredentialError::NoConfigDir)
}

pub struct FileCredentialStore {
    path: PathBuf,
}

impl FileCredentialStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn load(&self) -> Result<BTreeMap<String, String>, CredentialError> {
        match std::fs::read_to_string(&self.path) {
            Ok(text) => Ok(toml::from_str(&text)?),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(BTreeMap::new()),
            Err(e) => Err(e.into()),
        }
    }

    /// Writes atomically via a sibling temp file + rename so a crash mid-write
    /// never leaves a truncated store behind.
    fn save(&self, slots: &BTreeMap<String, String>) -> Result<(), CredentialError> {
        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let text = toml::to_string(slots)?;
        let tmp_path = self.path.with_extension("toml.tmp");
        std::fs::write(&tmp_path, text)?;
        restrict_permissions(&tmp_path)?;
        std::fs::rename(&tmp_path, &self.path)?;
        Ok(())
    }
}

impl CredentialStore for FileCredentialStore {
    fn get(&self) -> Option<Credential> {
        match self.load() {
            Ok(mut slots) => slots.remove(TOKEN_KEY).map(Credential),
            Err(e) => {
                tracing::warn!(path = %self.path.display(), "Failed to read credential store: {}", e);
                None
            }
        }
    }

    fn set(&self, credential: Credential) -> Result<(), CredentialError> {
        let mut slots = self.load()?;
        slots.insert(TOKEN_KEY.to_string(), credential.0);
        self.save(&slots)
    }

    fn clear(&self) -> Result<(), CredentialError> {
        let mut slots = self.load()?;
        if slots.remove(TOKEN_KEY).is_some() {
            self.save(&slots)?;
        }
        Ok(())
    }
}

#[cfg(unix)]
fn restrict_permissions(path: &Path) -> std::io::Result<()> {
    use std::os::unix::fs::PermissionsExt;
    std::fs::set_permissions(path, std::fs::Permissions::from_mode(0o600))
}

#[cfg(not(unix))]
fn restrict_permissions(_path: &Path) -> std::io::Result<()> {
    Ok(())
}

// ── In-memory store ───────────────────────────────────────────────────────────

#[cfg(test)]
#[derive(Default)]
pub struct MemoryCredentialStore {
    slot: std::sync::Mutex<Option<Credential>>,
}

#[cfg(test)]
impl MemoryCredentialStore {
    pub fn with(credential: &str) -> Self {
        Self {
            slot: std::sync::Mutex::new(Some(Credential::new(credential))),
        }
    }
}

#[cfg(test)]
impl CredentialStore for MemoryCredentialStore {
    fn get(&self) -> Option<Credential> {
        self.slot.lock().ok().and_then(|s| s.clone())
    }

    fn set(&self, credential: Credential) -> Result<(), CredentialError> {
        if let Ok(mut slot) = self.slot.lock() {
            *slot = Some(credential);
        }
        Ok(())
    }

    fn clear(&self) -> Result<(), CredentialError> {
        if let Ok(mut slot) = self.slot.lock() {
            *slot = None;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn file_store_persists_across_instances() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("store.toml");

        let store = FileCredentialStore::new(&path);
        assert!(store.get().is_none());
        store.set(Credential::new("ghp_first")).unwrap();

        let reopened = FileCredentialStore::new(&path);
        assert_eq!(reopened.get(), Some(Credential::new("ghp_first")));
    }

    #[test]
    fn set_overwrites_and_clear_removes() {
        let dir = tempfile::tempdir().unwrap();
        let store = FileCredentialStore::new(dir.path().join("store.toml"));

        store.set(Credential::new("one")).unwrap();
        store.set(Credential::new("two")).unwrap();
        assert_eq!(store.get().unwrap().expose(), "two");

        store.clear().unwrap();
        assert!(store.get().is_none());
        // Clearing an empty slot is not an error.
        store.clear().unwrap();
    }

    #[test]
    fn other_slots_survive() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("store.toml");
        std::fs::write(&path, "theme = \"dark\"\n").unwrap();

        let store = FileCredentialStore::new(&path);
        store.set(Credential::new("tok")).unwrap();
        store.clear().unwrap();

        let text = std::fs::read_to_string(&path).unwrap();
        assert!(text.contains("theme"));
        assert!(!text.contains(TOKEN_KEY));
    }

    #[test]
    fn corrupt_store_reads_as_absent() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("store.toml");
        std::fs::write(&path, "this is = = not toml").unwrap();

        let store = FileCredentialStore::new(&path);
        assert!(store.get().is_none());
        assert!(matches!(
            store.set(Credential::new("x")),
            Err(CredentialError::Parse(_))
        ));
    }

    #[test]
    fn debug_redacts_secret() {
        let c = Credential::new("ghp_secret");
        assert_eq!(format!("{c:?}"), "Credential(***)");
    }

    #[test]
    fn memory_store_round() {
        let store = MemoryCredentialStore::default();
        assert!(store.get().is_none());
        store.set(Credential::new("abc")).unwrap();
        assert_eq!(store.get().unwrap().expose(), "abc");
        store.clear().unwrap();
        assert!(store.get().is_none());
    }
}
