//! Token Cache Guard - query cache facade and JWT revocation guard
//!
//! Both components sit on one shared key-value store: the cache degrades to
//! direct computation when the store fails, the revocation check rejects.

pub mod api;
pub mod auth;
pub mod cache;
pub mod config;
pub mod error;
pub mod models;
pub mod store;
pub mod tasks;

pub use api::{create_router, AppState};
pub use auth::RevocationGuard;
pub use cache::QueryCache;
pub use config::Config;
pub use store::{KvStore, MemoryStore, RedisStore, SharedStore};
pub use tasks::spawn_cleanup_task;
