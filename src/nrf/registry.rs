//! Profile store and registry operations.

use std::collections::HashMap;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use parking_lot::RwLock;
use uuid::Uuid;

use crate::error::{Error, Result};
use crate::nrf::matcher::DiscoveryQuery;
use crate::nrf::subscription::{
    NfSubscription, NotificationEvent, NotificationJob, SubscriptionStore,
};
use crate::types::{NfProfile, NfStatus};

/// Storage interface for NF profiles.
///
/// The registry only needs these four operations, which keeps the door open
/// for a durable implementation; the in-memory one below is what the core
/// ships.
pub trait ProfileRepository: Send + Sync {
    fn get(&self, id: &Uuid) -> Option<NfProfile>;
    fn put(&self, profile: NfProfile);
    fn remove(&self, id: &Uuid) -> Option<NfProfile>;
    fn list(&self) -> Vec<NfProfile>;
}

/// Readers-writer-locked map; discovery scans share the read lock.
#[derive(Default)]
pub struct InMemoryRepository {
    profiles: RwLock<HashMap<Uuid, NfProfile>>,
}

impl ProfileRepository for InMemoryRepository {
    fn get(&self, id: &Uuid) -> Option<NfProfile> {
        self.profiles.read().get(id).cloned()
    }

    fn put(&self, profile: NfProfile) {
        self.profiles.write().insert(profile.nf_instance_id, profile);
    }

    fn remove(&self, id: &Uuid) -> Option<NfProfile> {
        self.profiles.write().remove(id)
    }

    fn list(&self) -> Vec<NfProfile> {
        self.profiles.read().values().cloned().collect()
    }
}

/// The NRF registry: profiles, subscriptions, and the operations of the
/// `nnrf-nfm`/`nnrf-disc` services.
pub struct Registry {
    repo: Arc<dyn ProfileRepository>,
    subscriptions: SubscriptionStore,
}

impl Registry {
    pub fn new(repo: Arc<dyn ProfileRepository>) -> Self {
        Registry {
            repo,
            subscriptions: SubscriptionStore::default(),
        }
    }

    pub fn with_in_memory_store() -> Self {
        Registry::new(Arc::new(InMemoryRepository::default()))
    }

    /// PUT registration. Creating stamps `created_at`/`last_heartbeat` and
    /// forces status REGISTERED; a PUT on an existing id has update
    /// semantics (never a second entry for the same id).
    pub fn register(
        &self,
        id: Uuid,
        mut profile: NfProfile,
    ) -> Result<(NfProfile, bool, Vec<NotificationJob>)> {
        if profile.nf_instance_id != id {
            return Err(Error::InvalidInput(format!(
                "body nf_instance_id {} does not match path {id}",
                profile.nf_instance_id
            )));
        }
        if let Some(plmn) = &profile.plmn_id {
            plmn.validate()?;
        }

        let now = Utc::now();
        let created = match self.repo.get(&id) {
            Some(existing) => {
                profile.created_at = existing.created_at;
                profile.last_heartbeat = existing.last_heartbeat;
                false
            }
            None => {
                profile.created_at = Some(now);
                profile.last_heartbeat = Some(now);
                true
            }
        };
        profile.updated_at = Some(now);
        profile.nf_status = NfStatus::Registered;
        self.repo.put(profile.clone());

        let event = if created {
            NotificationEvent::NfRegistered
        } else {
            NotificationEvent::NfProfileChanged
        };
        let jobs = self.subscriptions.jobs_for(event, &profile, now);
        Ok((profile, created, jobs))
    }

    /// PATCH update: replaces mutable fields, preserving `created_at` and
    /// `last_heartbeat`.
    pub fn update(
        &self,
        id: Uuid,
        mut profile: NfProfile,
    ) -> Result<(NfProfile, Vec<NotificationJob>)> {
        let existing = self
            .repo
            .get(&id)
            .ok_or_else(|| Error::NotFound(format!("NF instance {id}")))?;
        profile.nf_instance_id = id;
        profile.created_at = existing.created_at;
        profile.last_heartbeat = existing.last_heartbeat;
        profile.updated_at = Some(Utc::now());
        self.repo.put(profile.clone());

        let jobs =
            self.subscriptions
                .jobs_for(NotificationEvent::NfProfileChanged, &profile, Utc::now());
        Ok((profile, jobs))
    }

    /// Heartbeat refreshes `last_heartbeat` without touching `updated_at`.
    pub fn heartbeat(&self, id: Uuid) -> Result<()> {
        let mut profile = self
            .repo
            .get(&id)
            .ok_or_else(|| Error::NotFound(format!("NF instance {id}")))?;
        profile.last_heartbeat = Some(Utc::now());
        self.repo.put(profile);
        Ok(())
    }

    pub fn deregister(&self, id: Uuid) -> Result<Vec<NotificationJob>> {
        let profile = self
            .repo
            .remove(&id)
            .ok_or_else(|| Error::NotFound(format!("NF instance {id}")))?;
        Ok(self
            .subscriptions
            .jobs_for(NotificationEvent::NfDeregistered, &profile, Utc::now()))
    }

    pub fn get(&self, id: Uuid) -> Result<NfProfile> {
        self.repo
            .get(&id)
            .ok_or_else(|| Error::NotFound(format!("NF instance {id}")))
    }

    /// Discovery: REGISTERED, non-expired profiles matching the query,
    /// ordered by priority ascending, capacity descending, then instance id
    /// for a stable result.
    pub fn discover(&self, query: &DiscoveryQuery) -> Vec<NfProfile> {
        self.discover_at(query, Utc::now())
    }

    pub fn discover_at(&self, query: &DiscoveryQuery, now: DateTime<Utc>) -> Vec<NfProfile> {
        let mut matches: Vec<NfProfile> = self
            .repo
            .list()
            .into_iter()
            .filter(|p| p.nf_status == NfStatus::Registered)
            .filter(|p| !p.is_expired(now))
            .filter(|p| query.matches(p))
            .collect();
        matches.sort_by(|a, b| {
            let pa = a.priority.unwrap_or(0);
            let pb = b.priority.unwrap_or(0);
            pa.cmp(&pb)
                .then_with(|| b.capacity.unwrap_or(0).cmp(&a.capacity.unwrap_or(0)))
                .then_with(|| {
                    a.nf_instance_id
                        .to_string()
                        .cmp(&b.nf_instance_id.to_string())
                })
        });
        matches
    }

    pub fn subscribe(&self, sub: NfSubscription) -> String {
        self.subscriptions.insert(sub)
    }

    pub fn unsubscribe(&self, subscription_id: &str) -> Result<()> {
        self.subscriptions.remove(subscription_id)
    }

    /// Removes every profile whose heartbeat lapsed, emitting
    /// NF_DEREGISTERED jobs. The in-memory scan is cheap; removals go
    /// through the repository one id at a time so readers are never blocked
    /// for the whole sweep.
    pub fn sweep_expired_at(&self, now: DateTime<Utc>) -> (Vec<Uuid>, Vec<NotificationJob>) {
        let expired: Vec<Uuid> = self
            .repo
            .list()
            .into_iter()
            .filter(|p| p.is_expired(now))
            .map(|p| p.nf_instance_id)
            .collect();

        let mut jobs = Vec::new();
        let mut removed = Vec::new();
        for id in expired {
            if let Some(profile) = self.repo.remove(&id) {
                jobs.extend(self.subscriptions.jobs_for(
                    NotificationEvent::NfDeregistered,
                    &profile,
                    now,
                ));
                removed.push(id);
            }
        }
        (removed, jobs)
    }
}
