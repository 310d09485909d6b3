use std::path::PathBuf;

use redis::{ConnectionAddr, ConnectionInfo, IntoConnectionInfo, RedisConnectionInfo};

/// Configuration for [`RedisStore`](crate::RedisStore).
#[derive(Debug, Clone)]
pub struct RedisStoreConfig {
    /// Key prefix for all entries. Defaults to `"autocache:"`.
    pub prefix: String,
    /// Server host. Defaults to `"127.0.0.1"`.
    pub host: String,
    /// Server port. Defaults to `6379`.
    pub port: u16,
    /// Unix socket path. Takes precedence over `host`/`port` when set.
    pub socket: Option<PathBuf>,
    /// Database index to SELECT. `None` leaves the client on the default
    /// database.
    pub db: Option<i64>,
    /// Username for AUTH. Only meaningful together with `pass`.
    pub user: Option<String>,
    /// Password for AUTH.
    pub pass: Option<String>,
    /// Deprecated connection-URL form. Fields parsed from the URL override
    /// the discrete ones above; a malformed URL is warned about and
    /// ignored, never a construction failure.
    pub url: Option<String>,
}

impl Default for RedisStoreConfig {
    fn default() -> Self {
        Self {
            prefix: "autocache:".to_string(),
            host: "127.0.0.1".to_string(),
            port: 6379,
            socket: None,
            db: None,
            user: None,
            pass: None,
            url: None,
        }
    }
}

impl RedisStoreConfig {
    pub fn with_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.prefix = prefix.into();
        self
    }

    pub fn with_host(mut self, host: impl Into<String>) -> Self {
        self.host = host.into();
        self
    }

    pub fn with_port(mut self, port: u16) -> Self {
        self.port = port;
        self
    }

    pub fn with_socket(mut self, socket: impl Into<PathBuf>) -> Self {
        self.socket = Some(socket.into());
        self
    }

    pub fn with_db(mut self, db: i64) -> Self {
        self.db = Some(db);
        self
    }

    pub fn with_user(mut self, user: impl Into<String>) -> Self {
        self.user = Some(user.into());
        self
    }

    pub fn with_pass(mut self, pass: impl Into<String>) -> Self {
        self.pass = Some(pass.into());
        self
    }

    pub fn with_url(mut self, url: impl Into<String>) -> Self {
        self.url = Some(url.into());
        self
    }

    /// Resolve this configuration into a [`ConnectionInfo`].
    ///
    /// The deprecated `url` field, when present, is parsed and its
    /// host/port/auth/db components override the discrete fields. The
    /// database index and credentials ride in the [`RedisConnectionInfo`],
    /// so the client re-asserts both on every reconnect handshake.
    pub fn connection_info(&self) -> ConnectionInfo {
        let mut host = self.host.clone();
        let mut port = self.port;
        let mut socket = self.socket.clone();
        let mut db = self.db;
        let mut user = self.user.clone();
        let mut pass = self.pass.clone();

        if let Some(url) = &self.url {
            tracing::warn!(
                "the `url` option is deprecated and will be removed in a later release; \
                 pass discrete connection parameters instead"
            );
            match url.as_str().into_connection_info() {
                Ok(parsed) => {
                    match parsed.addr {
                        ConnectionAddr::Tcp(h, p) => {
                            host = h;
                            port = p;
                        }
                        ConnectionAddr::TcpTls {
                            host: h, port: p, ..
                        } => {
                            host = h;
                            port = p;
                        }
                        ConnectionAddr::Unix(path) => socket = Some(path),
                    }
                    if parsed.redis.db != 0 {
                        db = Some(parsed.redis.db);
                    }
                    if parsed.redis.username.is_some() {
                        user = parsed.redis.username;
                    }
                    if parsed.redis.password.is_some() {
                        pass = parsed.redis.password;
                    }
                }
                Err(e) => tracing::warn!("ignoring malformed `url` option: {e}"),
            }
        }

        let addr = match socket {
            Some(path) => ConnectionAddr::Unix(path),
            None => ConnectionAddr::Tcp(host, port),
        };

        ConnectionInfo {
            addr,
            redis: RedisConnectionInfo {
                db: db.unwrap_or(0),
                username: user,
                password: pass,
                ..Default::default()
            },
        }
    }
}
