use std::sync::{Arc, Mutex};

use wallet_link_core::{PersistedSession, PortError, SessionStore};

/// Process-local store. Clones share the same slot.
#[derive(Debug, Clone, Default)]
pub struct MemorySessionStore {
    slot: Arc<Mutex<Option<PersistedSession>>>,
}

impl MemorySessionStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_session(wallet_name: &str) -> Self {
        Self {
            slot: Arc::new(Mutex::new(Some(PersistedSession {
                wallet_name: wallet_name.to_owned(),
            }))),
        }
    }

    fn lock(&self) -> Result<std::sync::MutexGuard<'_, Option<PersistedSession>>, PortError> {
        self.slot
            .lock()
            .map_err(|e| PortError::Transport(format!("session lock poisoned: {e}")))
    }
}

impl SessionStore for MemorySessionStore {
    fn load(&self) -> Result<Option<PersistedSession>, PortError> {
        Ok(self.lock()?.clone())
    }

    fn save(&self, session: &PersistedSession) -> Result<(), PortError> {
        *self.lock()? = Some(session.clone());
        Ok(())
    }

    fn clear(&self) -> Result<(), PortError> {
        *self.lock()? = None;
        Ok(())
    }
}

/// JSON file holding the last-connected wallet, for native hosts.
#[cfg(not(target_arch = "wasm32"))]
#[derive(Debug, Clone)]
pub struct FileSessionStore {
    path: std::path::PathBuf,
}

#[cfg(not(target_arch = "wasm32"))]
impl FileSessionStore {
    pub fn new(path: impl Into<std::path::PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &std::path::Path {
        &self.path
    }
}

#[cfg(not(target_arch = "wasm32"))]
impl SessionStore for FileSessionStore {
    fn load(&self) -> Result<Option<PersistedSession>, PortError> {
        let raw = match std::fs::read_to_string(&self.path) {
            Ok(raw) => raw,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
            Err(e) => {
                return Err(PortError::Transport(format!(
                    "read session file {}: {e}",
                    self.path.display()
                )))
            }
        };
        if raw.trim().is_empty() {
            return Ok(None);
        }
        serde_json::from_str(&raw)
            .map(Some)
            .map_err(|e| PortError::Validation(format!("corrupt session file: {e}")))
    }

    fn save(&self, session: &PersistedSession) -> Result<(), PortError> {
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)
                .map_err(|e| PortError::Transport(format!("create {}: {e}", parent.display())))?;
        }
        let raw = serde_json::to_string_pretty(session)
            .map_err(|e| PortError::Validation(format!("encode session: {e}")))?;
        std::fs::write(&self.path, raw).map_err(|e| {
            PortError::Transport(format!("write session file {}: {e}", self.path.display()))
        })
    }

    fn clear(&self) -> Result<(), PortError> {
        match std::fs::remove_file(&self.path) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(PortError::Transport(format!(
                "remove session file {}: {e}",
                self.path.display()
            ))),
        }
    }
}

/// `localStorage` entry whose value is the bare wallet name.
#[cfg(target_arch = "wasm32")]
#[derive(Debug, Clone)]
pub struct BrowserSessionStore {
    key: String,
}

#[cfg(target_arch = "wasm32")]
impl BrowserSessionStore {
    pub fn new(key: impl Into<String>) -> Self {
        Self { key: key.into() }
    }

    fn storage(&self) -> Result<web_sys::Storage, PortError> {
        web_sys::window()
            .ok_or_else(|| PortError::Transport("missing window".to_owned()))?
            .local_storage()
            .map_err(|e| PortError::Transport(format!("localStorage unavailable: {e:?}")))?
            .ok_or_else(|| PortError::NotFound("localStorage disabled".to_owned()))
    }
}

#[cfg(target_arch = "wasm32")]
impl SessionStore for BrowserSessionStore {
    fn load(&self) -> Result<Option<PersistedSession>, PortError> {
        let value = self
            .storage()?
            .get_item(&self.key)
            .map_err(|e| PortError::Transport(format!("localStorage read failed: {e:?}")))?;
        Ok(value
            .filter(|name| !name.trim().is_empty())
            .map(|wallet_name| PersistedSession { wallet_name }))
    }

    fn save(&self, session: &PersistedSession) -> Result<(), PortError> {
        self.storage()?
            .set_item(&self.key, &session.wallet_name)
            .map_err(|e| PortError::Transport(format!("localStorage write failed: {e:?}")))
    }

    fn clear(&self) -> Result<(), PortError> {
        self.storage()?
            .remove_item(&self.key)
            .map_err(|e| PortError::Transport(format!("localStorage remove failed: {e:?}")))
    }
}
