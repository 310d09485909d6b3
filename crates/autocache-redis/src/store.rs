use std::fmt;
use std::sync::Arc;

use async_trait::async_trait;
use autocache_core::{AutocacheError, Store, StoreLifecycle, StoreObserver};
use redis::aio::ConnectionManager;
use redis::AsyncCommands;
use serde_json::Value;

use crate::RedisStoreConfig;

/// Redis-backed implementation of the [`Store`] trait.
///
/// Every entry lives under `{prefix}{key}` as a JSON string; the store
/// never touches a key outside its configured prefix, and bulk clear only
/// deletes keys under it.
///
/// Connection state is tracked per store, derived at the command boundary:
/// a command failure while connected broadcasts a disconnect to docked
/// observers, and a later success broadcasts a reconnect (re-asserting the
/// configured database first, since a reconnecting client resets to the
/// default database).
pub struct RedisStore {
    manager: ConnectionManager,
    config: RedisStoreConfig,
    lifecycle: Arc<StoreLifecycle>,
}

impl RedisStore {
    /// Connect to Redis with the given configuration.
    ///
    /// Builds a client from the resolved connection parameters and wraps it
    /// in an auto-reconnecting [`ConnectionManager`], then authenticates
    /// and selects the configured database.
    ///
    /// # Errors
    ///
    /// Returns an error if the configuration is unusable, the initial
    /// connection cannot be established, or authentication fails. An
    /// unauthenticated store cannot serve any operation, so an AUTH
    /// failure aborts construction instead of surfacing later on every
    /// call.
    pub async fn connect(config: RedisStoreConfig) -> Result<Self, AutocacheError> {
        let client = redis::Client::open(config.connection_info())
            .map_err(|e| AutocacheError::Config(format!("invalid Redis connection config: {e}")))?;
        Self::with_client(client, config).await
    }

    /// Wrap an already-constructed [`redis::Client`] handle.
    ///
    /// Authentication and database selection from `config` are still
    /// applied, matching [`connect`](Self::connect).
    pub async fn with_client(
        client: redis::Client,
        config: RedisStoreConfig,
    ) -> Result<Self, AutocacheError> {
        let manager = ConnectionManager::new(client)
            .await
            .map_err(|e| AutocacheError::Store(format!("Redis connection manager: {e}")))?;
        let store = Self {
            manager,
            config,
            lifecycle: Arc::new(StoreLifecycle::new()),
        };
        store.authenticate().await?;
        store.select_db().await?;
        store.lifecycle.mark_connected().await;
        Ok(store)
    }

    /// Connect and dock `observer` in one step.
    pub async fn docked(
        config: RedisStoreConfig,
        observer: Arc<dyn StoreObserver>,
    ) -> Result<Self, AutocacheError> {
        let store = Self::connect(config).await?;
        store.dock(observer).await;
        Ok(store)
    }

    /// Register an observer for connection lifecycle events. An observer
    /// docked after the connection already succeeded receives `Connected`
    /// immediately.
    pub async fn dock(&self, observer: Arc<dyn StoreObserver>) {
        self.lifecycle.dock(observer).await;
    }

    /// Whether the last command round trip found the connection healthy.
    pub fn is_connected(&self) -> bool {
        self.lifecycle.is_connected()
    }

    fn prefixed(&self, key: &str) -> String {
        format!("{}{key}", self.config.prefix)
    }

    async fn authenticate(&self) -> Result<(), AutocacheError> {
        if let Some(pass) = &self.config.pass {
            let mut conn = self.manager.clone();
            let mut cmd = redis::cmd("AUTH");
            if let Some(user) = &self.config.user {
                cmd.arg(user);
            }
            cmd.arg(pass);
            let result: redis::RedisResult<()> = cmd.query_async(&mut conn).await;
            result.map_err(|e| AutocacheError::Auth(format!("Redis AUTH failed: {e}")))?;
        }
        Ok(())
    }

    /// Issue SELECT for the configured database. Runs at construction and
    /// again after every detected reconnection, since a reconnecting
    /// client resets to the default database. Idempotent re-assertion,
    /// not a retry.
    async fn select_db(&self) -> Result<(), AutocacheError> {
        if let Some(db) = self.config.db {
            let mut conn = self.manager.clone();
            let result: redis::RedisResult<()> =
                redis::cmd("SELECT").arg(db).query_async(&mut conn).await;
            result.map_err(|e| AutocacheError::Config(format!("Redis SELECT {db} error: {e}")))?;
        }
        Ok(())
    }

    /// Route a command result through the lifecycle: a failure marks the
    /// store disconnected, a success after a failure re-asserts the
    /// database and marks it connected again.
    async fn observe<T>(&self, result: redis::RedisResult<T>) -> redis::RedisResult<T> {
        match &result {
            Ok(_) => {
                if !self.lifecycle.is_connected() {
                    if let Err(e) = self.select_db().await {
                        tracing::warn!("database re-select after reconnect failed: {e}");
                    }
                    self.lifecycle.mark_connected().await;
                }
            }
            Err(e) => self.lifecycle.mark_disconnected(e.to_string()).await,
        }
        result
    }
}

impl fmt::Display for RedisStore {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "RedisStore()")
    }
}

// ConnectionManager is opaque, so derive is out.
impl fmt::Debug for RedisStore {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RedisStore")
            .field("prefix", &self.config.prefix)
            .field("db", &self.config.db)
            .finish_non_exhaustive()
    }
}

#[async_trait]
impl Store for RedisStore {
    async fn get(&self, key: &str) -> Result<Option<Value>, AutocacheError> {
        let pkey = self.prefixed(key);
        tracing::debug!(key = %pkey, "get");

        let mut conn = self.manager.clone();
        let result: redis::RedisResult<Option<String>> = conn.get(&pkey).await;
        let raw = self
            .observe(result)
            .await
            .map_err(|e| AutocacheError::Store(format!("Redis GET error: {e}")))?;

        match raw {
            Some(json_str) => {
                let value = serde_json::from_str(&json_str).map_err(|e| {
                    AutocacheError::Deserialization(format!("JSON deserialize error: {e}"))
                })?;
                Ok(Some(value))
            }
            None => Ok(None),
        }
    }

    async fn set(&self, key: &str, value: Value) -> Result<(), AutocacheError> {
        // Encode before touching the wire; an unencodable value must not
        // issue any remote call.
        let payload = serde_json::to_string(&value)
            .map_err(|e| AutocacheError::Serialization(format!("JSON serialize error: {e}")))?;

        let pkey = self.prefixed(key);
        tracing::debug!(key = %pkey, "set");

        let mut conn = self.manager.clone();
        let result: redis::RedisResult<()> = conn.set(&pkey, &payload).await;
        self.observe(result)
            .await
            .map_err(|e| AutocacheError::Store(format!("Redis SET error: {e}")))?;
        Ok(())
    }

    async fn destroy(&self, key: &str) -> Result<bool, AutocacheError> {
        let pkey = self.prefixed(key);
        tracing::debug!(key = %pkey, "destroy");

        let mut conn = self.manager.clone();
        let result: redis::RedisResult<i64> = conn.del(&pkey).await;
        let removed = self
            .observe(result)
            .await
            .map_err(|e| AutocacheError::Store(format!("Redis DEL error: {e}")))?;
        Ok(removed == 1)
    }

    async fn clear(&self) -> Result<(), AutocacheError> {
        let pattern = format!("{}*", self.config.prefix);
        tracing::debug!(pattern = %pattern, "clear");

        let mut conn = self.manager.clone();

        // Collect matching keys via SCAN, deleting each batch with a single
        // variadic DEL. An empty keyspace under the prefix is a no-op
        // success.
        let mut cursor: u64 = 0;
        loop {
            let result: redis::RedisResult<(u64, Vec<String>)> = redis::cmd("SCAN")
                .arg(cursor)
                .arg("MATCH")
                .arg(&pattern)
                .arg("COUNT")
                .arg(100)
                .query_async(&mut conn)
                .await;
            let (next_cursor, keys) = self
                .observe(result)
                .await
                .map_err(|e| AutocacheError::Store(format!("Redis SCAN error: {e}")))?;

            if !keys.is_empty() {
                let result: redis::RedisResult<()> = conn.del(&keys).await;
                self.observe(result)
                    .await
                    .map_err(|e| AutocacheError::Store(format!("Redis DEL error: {e}")))?;
            }

            cursor = next_cursor;
            if cursor == 0 {
                break;
            }
        }

        Ok(())
    }
}
