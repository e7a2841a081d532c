//! Typed, versioned session state.
//!
//! The session holds exactly one record per visitor: the reservation draft,
//! the logged-in user id, and the one-shot flash slots. The record is encoded
//! as JSON; decoding is strict (unknown schema versions and malformed bodies
//! are errors, never a silent empty session) so a corrupt record is visible
//! to the caller instead of quietly dropping a visitor's draft.

use std::time::Duration;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::draft::ReservationDraft;

pub const SESSION_SCHEMA_VERSION: u32 = 1;

#[derive(Debug, thiserror::Error)]
pub enum SessionError {
    #[error("session backend failure: {0}")]
    Backend(String),
    #[error("malformed session record: {0}")]
    Decode(String),
    #[error("unsupported session schema version {0}")]
    Version(u32),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SessionRecord {
    pub version: u32,
    #[serde(rename = "reservation")]
    pub draft: Option<ReservationDraft>,
    pub user_id: Option<i64>,
    pub flash: Option<String>,
    pub error: Option<String>,
    pub warning: Option<String>,
}

impl Default for SessionRecord {
    fn default() -> Self {
        Self {
            version: SESSION_SCHEMA_VERSION,
            draft: None,
            user_id: None,
            flash: None,
            error: None,
            warning: None,
        }
    }
}

impl SessionRecord {
    pub fn encode(&self) -> Result<String, SessionError> {
        serde_json::to_string(self).map_err(|e| SessionError::Decode(e.to_string()))
    }

    pub fn decode(raw: &str) -> Result<Self, SessionError> {
        let record: SessionRecord =
            serde_json::from_str(raw).map_err(|e| SessionError::Decode(e.to_string()))?;
        if record.version != SESSION_SCHEMA_VERSION {
            return Err(SessionError::Version(record.version));
        }
        Ok(record)
    }
}

/// Backend holding one record per session id, expiring after `ttl`.
#[async_trait]
pub trait SessionStore: Send + Sync {
    async fn load(&self, id: &str) -> Result<Option<SessionRecord>, SessionError>;
    async fn save(&self, id: &str, record: &SessionRecord, ttl: Duration) -> Result<(), SessionError>;
    async fn delete(&self, id: &str) -> Result<(), SessionError>;
}
