//! Temporary preview handles for local uploads.
//!
//! A [`PreviewRegistry`] maps `blob:` style URLs to the bytes they preview.
//! Handles release their entry when released explicitly or dropped, so an
//! early return or `?` between acquire and release cannot leak one.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use tracing::debug;
use uuid::Uuid;

const URL_PREFIX: &str = "blob:imaginai/";

#[derive(Debug, Clone)]
pub struct PreviewEntry {
    pub mime_type: String,
    pub bytes: Arc<[u8]>,
}

type Entries = HashMap<Uuid, PreviewEntry>;

#[derive(Debug, Clone, Default)]
pub struct PreviewRegistry {
    entries: Arc<Mutex<Entries>>,
}

impl PreviewRegistry {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers `bytes` and returns the handle that owns the entry.
    pub fn acquire(&self, bytes: impl Into<Arc<[u8]>>, mime_type: &str) -> PreviewHandle {
        let id = Uuid::new_v4();
        self.lock().insert(
            id,
            PreviewEntry {
                mime_type: mime_type.to_string(),
                bytes: bytes.into(),
            },
        );
        debug!("Acquired preview handle {}", id);
        PreviewHandle {
            id,
            registry: Some(self.clone()),
        }
    }

    /// Looks up the entry behind a preview URL.
    #[must_use]
    pub fn resolve(&self, url: &str) -> Option<PreviewEntry> {
        let id = Uuid::parse_str(url.strip_prefix(URL_PREFIX)?).ok()?;
        self.lock().get(&id).cloned()
    }

    #[must_use]
    pub fn live_handles(&self) -> usize {
        self.lock().len()
    }

    fn remove(&self, id: Uuid) {
        if self.lock().remove(&id).is_some() {
            debug!("Released preview handle {}", id);
        }
    }

    fn lock(&self) -> MutexGuard<'_, Entries> {
        self.entries.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

/// Owner of one registry entry.
#[derive(Debug)]
pub struct PreviewHandle {
    id: Uuid,
    registry: Option<PreviewRegistry>,
}

impl PreviewHandle {
    #[must_use]
    pub fn url(&self) -> String {
        format!("{URL_PREFIX}{}", self.id)
    }

    /// Releases the entry now. Dropping the handle has the same effect.
    pub fn release(mut self) {
        self.release_inner();
    }

    fn release_inner(&mut self) {
        if let Some(registry) = self.registry.take() {
            registry.remove(self.id);
        }
    }
}

impl Drop for PreviewHandle {
    fn drop(&mut self) {
        self.release_inner();
    }
}

/// Holds at most one preview, as an upload widget shows at most one image.
#[derive(Debug)]
pub struct PreviewSlot {
    registry: PreviewRegistry,
    current: Option<PreviewHandle>,
}

impl PreviewSlot {
    #[must_use]
    pub fn new(registry: PreviewRegistry) -> Self {
        Self {
            registry,
            current: None,
        }
    }

    /// Releases the current preview, then acquires one for `bytes`.
    /// Returns the new preview URL.
    pub fn replace(&mut self, bytes: impl Into<Arc<[u8]>>, mime_type: &str) -> String {
        self.clear();
        let handle = self.registry.acquire(bytes, mime_type);
        let url = handle.url();
        self.current = Some(handle);
        url
    }

    pub fn clear(&mut self) {
        if let Some(handle) = self.current.take() {
            handle.release();
        }
    }

    #[must_use]
    pub fn current_url(&self) -> Option<String> {
        self.current.as_ref().map(PreviewHandle::url)
    }
}
