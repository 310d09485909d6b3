//! Core contract for autocache storage backends.
//!
//! A storage backend persists the caching layer's key/value entries in some
//! external store. This crate declares the pieces every backend shares:
//!
//! - [`Store`] — the storage contract (`get`/`set`/`destroy`/`clear`).
//! - [`StoreEvent`] / [`StoreObserver`] / [`StoreLifecycle`] — connection
//!   lifecycle notifications, so a consumer learns when its backend comes
//!   and goes without polling.
//! - [`AutocacheError`] — the unified error type.
//! - [`InMemoryStore`] — a process-local reference backend, also used to
//!   exercise the contract in tests.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;
use tokio::sync::RwLock;

// ---------------------------------------------------------------------------
// Errors
// ---------------------------------------------------------------------------

/// Unified error type for autocache storage backends.
#[derive(Debug, Error)]
pub enum AutocacheError {
    /// Transport or server-side failure from the underlying store.
    #[error("store error: {0}")]
    Store(String),
    /// The value could not be encoded; nothing was written.
    #[error("serialization error: {0}")]
    Serialization(String),
    /// A stored payload could not be decoded.
    #[error("deserialization error: {0}")]
    Deserialization(String),
    /// Authentication against the store failed.
    #[error("authentication error: {0}")]
    Auth(String),
    /// Invalid or unusable connection configuration.
    #[error("config error: {0}")]
    Config(String),
    /// An observer's event handler failed.
    #[error("callback error: {0}")]
    Callback(String),
}

// ---------------------------------------------------------------------------
// Lifecycle events
// ---------------------------------------------------------------------------

/// Connection lifecycle events emitted by a store, received by
/// [`StoreObserver`] implementations.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum StoreEvent {
    /// The underlying connection is up.
    Connected,
    /// The underlying connection was lost, or the client reported an
    /// unrecoverable error.
    Disconnected { error: String },
}

/// Consumer-side handler for store lifecycle events.
#[async_trait]
pub trait StoreObserver: Send + Sync {
    async fn on_event(&self, event: StoreEvent) -> Result<(), AutocacheError>;
}

/// Per-store connection state and observer registry.
///
/// The connected flag is flipped only by lifecycle transitions and read when
/// docking, so an observer registered after the connection already succeeded
/// is still told [`StoreEvent::Connected`].
pub struct StoreLifecycle {
    connected: AtomicBool,
    observers: RwLock<Vec<Arc<dyn StoreObserver>>>,
}

impl Default for StoreLifecycle {
    fn default() -> Self {
        Self::new()
    }
}

impl StoreLifecycle {
    pub fn new() -> Self {
        Self {
            connected: AtomicBool::new(false),
            observers: RwLock::new(Vec::new()),
        }
    }

    pub fn is_connected(&self) -> bool {
        self.connected.load(Ordering::SeqCst)
    }

    /// Register an observer. Cannot fail. If the connection is already up,
    /// the newly docked observer receives [`StoreEvent::Connected`]
    /// immediately so it never misses the already-occurred connection.
    pub async fn dock(&self, observer: Arc<dyn StoreObserver>) {
        self.observers.write().await.push(Arc::clone(&observer));
        if self.is_connected() {
            notify(&observer, StoreEvent::Connected).await;
        }
    }

    /// Record a successful connection. Broadcasts only on the
    /// not-connected → connected transition.
    pub async fn mark_connected(&self) {
        if !self.connected.swap(true, Ordering::SeqCst) {
            self.broadcast(StoreEvent::Connected).await;
        }
    }

    /// Record a lost connection. Broadcasts only on the
    /// connected → not-connected transition.
    pub async fn mark_disconnected(&self, error: impl Into<String>) {
        if self.connected.swap(false, Ordering::SeqCst) {
            self.broadcast(StoreEvent::Disconnected {
                error: error.into(),
            })
            .await;
        }
    }

    async fn broadcast(&self, event: StoreEvent) {
        let observers = self.observers.read().await.clone();
        for observer in &observers {
            notify(observer, event.clone()).await;
        }
    }
}

/// Deliver one event to one observer. A failing observer is logged and
/// skipped; store operations never fail on account of a consumer's handler.
async fn notify(observer: &Arc<dyn StoreObserver>, event: StoreEvent) {
    if let Err(e) = observer.on_event(event).await {
        tracing::warn!("store observer error: {e}");
    }
}

/// An observer that records every event it receives for later inspection,
/// useful for testing.
#[derive(Default, Clone)]
pub struct RecordingObserver {
    events: Arc<RwLock<Vec<StoreEvent>>>,
}

impl RecordingObserver {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn events(&self) -> Vec<StoreEvent> {
        self.events.read().await.clone()
    }
}

#[async_trait]
impl StoreObserver for RecordingObserver {
    async fn on_event(&self, event: StoreEvent) -> Result<(), AutocacheError> {
        self.events.write().await.push(event);
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Store trait
// ---------------------------------------------------------------------------

/// Storage contract consumed by the caching layer.
///
/// Keys are logical cache keys; backends decide how to map them onto the
/// underlying store (the Redis backend prefixes them for namespace
/// isolation). Values are arbitrary JSON. A missing key is `Ok(None)`,
/// never an error. Operations issued concurrently are independent and may
/// complete in any order; callers sequence where ordering matters.
#[async_trait]
pub trait Store: Send + Sync {
    /// Fetch the value stored under `key`.
    async fn get(&self, key: &str) -> Result<Option<Value>, AutocacheError>;

    /// Store `value` under `key`, replacing any previous value.
    async fn set(&self, key: &str, value: Value) -> Result<(), AutocacheError>;

    /// Remove the entry under `key`. Returns `true` iff an entry existed
    /// and was removed.
    async fn destroy(&self, key: &str) -> Result<bool, AutocacheError>;

    /// Remove every entry this store is responsible for.
    async fn clear(&self) -> Result<(), AutocacheError>;
}

// ---------------------------------------------------------------------------
// In-memory store
// ---------------------------------------------------------------------------

/// Process-local implementation of the [`Store`] trait.
///
/// Entries go through the same encode-on-write / decode-on-read path as the
/// remote backends, so serialization behavior is observably identical. The
/// map is private to the store, so no key prefixing is involved.
#[derive(Default)]
pub struct InMemoryStore {
    entries: RwLock<HashMap<String, String>>,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl Store for InMemoryStore {
    async fn get(&self, key: &str) -> Result<Option<Value>, AutocacheError> {
        let entries = self.entries.read().await;
        match entries.get(key) {
            Some(raw) => {
                let value = serde_json::from_str(raw).map_err(|e| {
                    AutocacheError::Deserialization(format!("JSON deserialize error: {e}"))
                })?;
                Ok(Some(value))
            }
            None => Ok(None),
        }
    }

    async fn set(&self, key: &str, value: Value) -> Result<(), AutocacheError> {
        let raw = serde_json::to_string(&value)
            .map_err(|e| AutocacheError::Serialization(format!("JSON serialize error: {e}")))?;
        self.entries.write().await.insert(key.to_string(), raw);
        Ok(())
    }

    async fn destroy(&self, key: &str) -> Result<bool, AutocacheError> {
        Ok(self.entries.write().await.remove(key).is_some())
    }

    async fn clear(&self) -> Result<(), AutocacheError> {
        self.entries.write().await.clear();
        Ok(())
    }
}
