//! Session management
//!
//! The controller never reaches for ambient session state: the manager loads
//! (or creates) the client's record before dispatch and stores whatever record
//! the controller hands back afterwards.

use std::{
    collections::HashMap,
    sync::{Arc, RwLock},
};

use async_trait::async_trait;
use axum_extra::extract::cookie::{Cookie, CookieJar, SameSite};
use chrono::{Duration, Utc};
use common::{cache::RedisPool, error::CacheError};
use thiserror::Error;
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::models::SessionRecord;

/// Session backend failure
#[derive(Error, Debug)]
pub enum SessionError {
    #[error("Session lock poisoned")]
    LockPoisoned,

    #[error("Redis error: {0}")]
    Cache(#[from] CacheError),

    #[error("Session serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// Storage for session records keyed by session id
#[async_trait]
pub trait SessionStore: Send + Sync {
    /// Record for `id`, or `None` if absent or expired
    async fn load(&self, id: &str) -> Result<Option<SessionRecord>, SessionError>;

    /// Store `record` under `id`, restarting its idle timeout
    async fn save(&self, id: &str, record: &SessionRecord) -> Result<(), SessionError>;

    /// Drop expired records, returning how many were removed
    async fn prune_expired(&self) -> Result<u64, SessionError>;

    async fn health_check(&self) -> Result<bool, SessionError>;
}

/// Session records held in process memory
///
/// Lost on restart; expired records are dropped lazily on load and by
/// [`SessionStore::prune_expired`].
#[derive(Clone)]
pub struct InMemorySessionStore {
    sessions: Arc<RwLock<HashMap<String, SessionRecord>>>,
    ttl: Duration,
}

impl InMemorySessionStore {
    pub fn new(ttl: Duration) -> Self {
        Self {
            sessions: Arc::new(RwLock::new(HashMap::new())),
            ttl,
        }
    }
}

#[async_trait]
impl SessionStore for InMemorySessionStore {
    async fn load(&self, id: &str) -> Result<Option<SessionRecord>, SessionError> {
        let mut sessions = self
            .sessions
            .write()
            .map_err(|_| SessionError::LockPoisoned)?;

        let expired = match sessions.get(id) {
            Some(record) => record.is_expired(self.ttl, Utc::now()),
            None => return Ok(None),
        };

        if expired {
            debug!("Session {} expired", id);
            sessions.remove(id);
            return Ok(None);
        }

        Ok(sessions.get(id).cloned())
    }

    async fn save(&self, id: &str, record: &SessionRecord) -> Result<(), SessionError> {
        self.sessions
            .write()
            .map_err(|_| SessionError::LockPoisoned)?
            .insert(id.to_string(), record.clone());
        Ok(())
    }

    async fn prune_expired(&self) -> Result<u64, SessionError> {
        let now = Utc::now();
        let mut sessions = self
            .sessions
            .write()
            .map_err(|_| SessionError::LockPoisoned)?;

        let before = sessions.len();
        sessions.retain(|_, record| !record.is_expired(self.ttl, now));
        Ok((before - sessions.len()) as u64)
    }

    async fn health_check(&self) -> Result<bool, SessionError> {
        self.sessions
            .read()
            .map(|_| true)
            .map_err(|_| SessionError::LockPoisoned)
    }
}

/// Session records stored as JSON in Redis, expired by key TTL
#[derive(Clone)]
pub struct RedisSessionStore {
    redis_pool: RedisPool,
    ttl_seconds: u64,
}

impl RedisSessionStore {
    pub fn new(redis_pool: RedisPool, ttl_seconds: u64) -> Self {
        Self {
            redis_pool,
            ttl_seconds,
        }
    }

    fn session_key(id: &str) -> String {
        format!("session:{}", id)
    }

    /// Decode a stored record; a value that no longer matches
    /// [`SessionRecord`] is treated as absent
    fn decode(id: &str, json: &str) -> Option<SessionRecord> {
        match serde_json::from_str(json) {
            Ok(record) => Some(record),
            Err(e) => {
                warn!("Discarding unreadable session {}: {}", id, e);
                None
            }
        }
    }
}

#[async_trait]
impl SessionStore for RedisSessionStore {
    async fn load(&self, id: &str) -> Result<Option<SessionRecord>, SessionError> {
        let key = Self::session_key(id);
        let Some(json) = self.redis_pool.get(&key).await? else {
            return Ok(None);
        };

        match Self::decode(id, &json) {
            Some(record) => Ok(Some(record)),
            None => {
                self.redis_pool.delete(&key).await?;
                Ok(None)
            }
        }
    }

    async fn save(&self, id: &str, record: &SessionRecord) -> Result<(), SessionError> {
        let json = serde_json::to_string(record)?;
        self.redis_pool
            .set(&Self::session_key(id), &json, Some(self.ttl_seconds))
            .await?;
        Ok(())
    }

    async fn prune_expired(&self) -> Result<u64, SessionError> {
        // Redis expires keys with TTL on its own
        Ok(0)
    }

    async fn health_check(&self) -> Result<bool, SessionError> {
        Ok(self.redis_pool.health_check().await?)
    }
}

/// Session in use by one request
#[derive(Debug, Clone)]
pub struct ActiveSession {
    pub id: String,
    pub record: SessionRecord,
    pub is_new: bool,
}

/// Binds session records to clients through a cookie
#[derive(Clone)]
pub struct SessionManager {
    store: Arc<dyn SessionStore>,
    cookie_name: String,
}

impl SessionManager {
    /// Create a new session manager
    pub fn new(store: Arc<dyn SessionStore>, cookie_name: impl Into<String>) -> Self {
        Self {
            store,
            cookie_name: cookie_name.into(),
        }
    }

    /// Load the client's session, creating one when the cookie is missing or
    /// names a record the store no longer has
    pub async fn acquire(&self, jar: &CookieJar) -> Result<ActiveSession, SessionError> {
        if let Some(cookie) = jar.get(&self.cookie_name) {
            let id = cookie.value();
            if let Some(mut record) = self.store.load(id).await? {
                record.touch();
                return Ok(ActiveSession {
                    id: id.to_string(),
                    record,
                    is_new: false,
                });
            }
            debug!("Session {} not found, starting a new one", id);
        }

        let id = Uuid::new_v4().to_string();
        info!("Creating session: {}", id);

        Ok(ActiveSession {
            id,
            record: SessionRecord::new(),
            is_new: true,
        })
    }

    /// Persist the session and return the jar to send back
    ///
    /// The cookie is only set when the session was created by this request.
    pub async fn commit(
        &self,
        session: &ActiveSession,
        jar: CookieJar,
    ) -> Result<CookieJar, SessionError> {
        self.store.save(&session.id, &session.record).await?;

        if session.is_new {
            let cookie = Cookie::build((self.cookie_name.clone(), session.id.clone()))
                .path("/")
                .http_only(true)
                .same_site(SameSite::Lax)
                .build();
            Ok(jar.add(cookie))
        } else {
            Ok(jar)
        }
    }

    /// Cleanup expired sessions
    pub async fn cleanup_expired_sessions(&self) -> Result<u64, SessionError> {
        let removed = self.store.prune_expired().await?;
        if removed > 0 {
            info!("Pruned {} expired sessions", removed);
        }
        Ok(removed)
    }

    /// Get session store health status
    pub async fn health_check(&self) -> Result<bool, SessionError> {
        self.store.health_check().await
    }
}
