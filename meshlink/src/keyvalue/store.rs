//! In-memory implementation of both services.

use async_trait::async_trait;
use parking_lot::RwLock;
use std::collections::HashMap;
use tracing::{debug, info};

use super::service::{Admin, KeyValue};
use super::types::{ClearAllException, GetException, InvalidKey, KeyNotFound, NotAuthorized, SetException};
use crate::rpc::{Context, HandlerError, NoException};

/// Header naming the calling user.
pub const USER_HEADER: &str = "user";
/// The only user allowed to clear the store.
pub const ADMIN_USER: &str = "root";

/// Key-value store held in memory.
#[derive(Debug, Default)]
pub struct MemoryStore {
    values: RwLock<HashMap<String, String>>,
}

impl MemoryStore {
    /// Creates an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of stored keys.
    #[must_use]
    pub fn len(&self) -> usize {
        self.values.read().len()
    }

    /// Returns `true` if nothing is stored.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.values.read().is_empty()
    }
}

#[async_trait]
impl KeyValue for MemoryStore {
    async fn get(&self, _ctx: &Context, key: &str) -> Result<String, HandlerError<GetException>> {
        self.values.read().get(key).cloned().ok_or_else(|| {
            HandlerError::exception(KeyNotFound {
                key: key.to_string(),
            })
        })
    }

    async fn set(
        &self,
        _ctx: &Context,
        key: &str,
        value: &str,
    ) -> Result<(), HandlerError<SetException>> {
        if key.trim().is_empty() {
            return Err(HandlerError::exception(InvalidKey {
                key: key.to_string(),
            }));
        }
        debug!(key, "Storing value");
        self.values.write().insert(key.to_string(), value.to_string());
        Ok(())
    }

    async fn health_check(&self, _ctx: &Context) -> Result<String, HandlerError<NoException>> {
        Ok("OK".to_string())
    }
}

#[async_trait]
impl Admin for MemoryStore {
    async fn health_check(&self, _ctx: &Context) -> Result<String, HandlerError<NoException>> {
        Ok("OK".to_string())
    }

    async fn clear_all(&self, ctx: &Context) -> Result<(), HandlerError<ClearAllException>> {
        let user = ctx.header(USER_HEADER).unwrap_or_default();
        if user != ADMIN_USER {
            return Err(HandlerError::exception(NotAuthorized {
                user: user.to_string(),
            }));
        }
        let removed = {
            let mut values = self.values.write();
            let removed = values.len();
            values.clear();
            removed
        };
        info!(removed, "Cleared key-value store");
        Ok(())
    }
}
