//! Redis storage backend for the autocache caching layer.
//!
//! Entries are persisted as JSON strings under prefixed keys (default prefix
//! `autocache:`), so several applications can share one Redis instance
//! without stepping on each other. Bulk [`clear`](autocache_core::Store::clear)
//! only ever deletes keys under the configured prefix.
//!
//! Connection lifecycle changes are bridged to docked
//! [`StoreObserver`]s: a command failure broadcasts
//! [`StoreEvent::Disconnected`], a later success broadcasts
//! [`StoreEvent::Connected`] again, and an observer docked after the
//! connection already succeeded still receives `Connected` right away.
//!
//! # Quick start
//!
//! ```rust,no_run
//! use autocache_redis::{RedisStore, RedisStoreConfig, Store};
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let config = RedisStoreConfig::default().with_prefix("sessions:");
//! let store = RedisStore::connect(config).await?;
//!
//! store.set("greeting", serde_json::json!("hello")).await?;
//! let value = store.get("greeting").await?;
//! assert_eq!(value, Some(serde_json::json!("hello")));
//! # Ok(())
//! # }
//! ```

mod config;
mod store;

pub use config::RedisStoreConfig;
pub use store::RedisStore;

// Re-export core types for convenience.
pub use autocache_core::{AutocacheError, Store, StoreEvent, StoreLifecycle, StoreObserver};
