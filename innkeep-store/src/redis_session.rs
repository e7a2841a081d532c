use std::time::Duration;

use async_trait::async_trait;
use redis::AsyncCommands;

use innkeep_core::session::{SessionError, SessionRecord, SessionStore};

/// Session backend keeping one JSON record per `sess:{id}` key; the TTL is
/// refreshed on every save, so sessions expire after inactivity.
#[derive(Clone)]
pub struct RedisSessionStore {
    client: redis::Client,
}

impl RedisSessionStore {
    pub fn new(connection_string: &str) -> Result<Self, redis::RedisError> {
        let client = redis::Client::open(connection_string)?;
        Ok(Self { client })
    }

    fn key(id: &str) -> String {
        format!("sess:{}", id)
    }
}

fn backend_error(e: redis::RedisError) -> SessionError {
    SessionError::Backend(e.to_string())
}

#[async_trait]
impl SessionStore for RedisSessionStore {
    async fn load(&self, id: &str) -> Result<Option<SessionRecord>, SessionError> {
        let mut conn = self
            .client
            .get_multiplexed_async_connection()
            .await
            .map_err(backend_error)?;

        let raw: Option<String> = conn.get(Self::key(id)).await.map_err(backend_error)?;
        match raw {
            Some(raw) => Ok(Some(SessionRecord::decode(&raw)?)),
            None => Ok(None),
        }
    }

    async fn save(&self, id: &str, record: &SessionRecord, ttl: Duration) -> Result<(), SessionError> {
        let mut conn = self
            .client
            .get_multiplexed_async_connection()
            .await
            .map_err(backend_error)?;

        let raw = record.encode()?;
        conn.set_ex::<_, _, ()>(Self::key(id), raw, ttl.as_secs())
            .await
            .map_err(backend_error)?;
        Ok(())
    }

    async fn delete(&self, id: &str) -> Result<(), SessionError> {
        let mut conn = self
            .client
            .get_multiplexed_async_connection()
            .await
            .map_err(backend_error)?;

        conn.del::<_, ()>(Self::key(id)).await.map_err(backend_error)?;
        Ok(())
    }
}
