//! Session record model

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

use super::LoggedInUser;

/// Server-held state for one client
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SessionRecord {
    pub user: LoggedInUser,
    pub created_at: DateTime<Utc>,
    pub last_accessed_at: DateTime<Utc>,
}

impl SessionRecord {
    /// Fresh record with an inactive, empty user attached
    pub fn new() -> Self {
        let now = Utc::now();
        Self {
            user: LoggedInUser::default(),
            created_at: now,
            last_accessed_at: now,
        }
    }

    pub fn is_authenticated(&self) -> bool {
        self.user.active
    }

    /// Record with `user` in place of the current one
    pub fn replace_user(self, user: LoggedInUser) -> Self {
        Self { user, ..self }
    }

    pub fn touch(&mut self) {
        self.last_accessed_at = Utc::now();
    }

    /// Idle for at least `ttl`
    pub fn is_expired(&self, ttl: Duration, now: DateTime<Utc>) -> bool {
        now >= self.last_accessed_at + ttl
    }
}

impl Default for SessionRecord {
    fn default() -> Self {
        Self::new()
    }
}
