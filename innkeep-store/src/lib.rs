pub mod app_config;
pub mod database;
pub mod memory;
pub mod pg;
pub mod redis_session;

pub use database::DbClient;
pub use memory::{MemorySessionStore, MemoryStore};
pub use pg::PgStore;
pub use redis_session::RedisSessionStore;
