//! Expiring authentication context store.

use std::collections::HashMap;
use std::time::{Duration, Instant};

use parking_lot::RwLock;

use crate::error::{Error, Result};

/// One in-flight 5G-AKA challenge, keyed by `auth_ctx_id`.
///
/// Consumable exactly once: confirmation removes the context whether it
/// matches or not.
#[derive(Debug, Clone)]
pub struct AuthContext {
    pub auth_ctx_id: String,
    pub supi: String,
    pub serving_network: String,
    pub rand: [u8; 16],
    pub autn: [u8; 16],
    pub hxres_star: [u8; 16],
    pub kausf: [u8; 32],
    pub kseaf: [u8; 32],
    pub expires_at: Instant,
}

pub struct ContextStore {
    contexts: RwLock<HashMap<String, AuthContext>>,
    ttl: Duration,
}

impl ContextStore {
    pub fn new(ttl: Duration) -> Self {
        ContextStore {
            contexts: RwLock::new(HashMap::new()),
            ttl,
        }
    }

    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    pub fn insert(&self, mut ctx: AuthContext) {
        ctx.expires_at = Instant::now() + self.ttl;
        self.contexts.write().insert(ctx.auth_ctx_id.clone(), ctx);
    }

    /// Removes and returns the context. Expiry is checked before anything
    /// else; exactly-at-deadline counts as expired, and an expired context
    /// is deleted without being returned.
    pub fn take_valid(&self, auth_ctx_id: &str) -> Result<AuthContext> {
        self.take_valid_at(auth_ctx_id, Instant::now())
    }

    pub fn take_valid_at(&self, auth_ctx_id: &str, now: Instant) -> Result<AuthContext> {
        let ctx = self
            .contexts
            .write()
            .remove(auth_ctx_id)
            .ok_or_else(|| Error::NotFound(format!("auth context {auth_ctx_id}")))?;
        if now >= ctx.expires_at {
            return Err(Error::Expired(format!("auth context {auth_ctx_id}")));
        }
        Ok(ctx)
    }

    /// Janitor pass; returns how many contexts were dropped.
    pub fn sweep_expired(&self) -> usize {
        let now = Instant::now();
        let mut guard = self.contexts.write();
        let before = guard.len();
        guard.retain(|_, ctx| now < ctx.expires_at);
        before - guard.len()
    }

    pub fn len(&self) -> usize {
        self.contexts.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.contexts.read().is_empty()
    }
}
