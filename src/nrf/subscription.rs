//! Status-change subscriptions and notification delivery.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};

use chrono::{DateTime, Utc};
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::{Error, Result};
use crate::types::{NfProfile, NfType};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum NotificationEvent {
    NfRegistered,
    NfDeregistered,
    NfProfileChanged,
}

/// A subscriber's standing request for change notifications.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NfSubscription {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub subscription_id: Option<String>,
    pub callback_uri: String,
    /// Restrict to one instance; `None` means any.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub nf_instance_id: Option<Uuid>,
    /// Restrict to one NF type; `None` means any.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub nf_type: Option<NfType>,
    /// Events wanted; empty subscribes to all.
    #[serde(default)]
    pub events: Vec<NotificationEvent>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub validity_time: Option<DateTime<Utc>>,
}

impl NfSubscription {
    fn wants(&self, event: NotificationEvent, profile: &NfProfile, now: DateTime<Utc>) -> bool {
        if let Some(valid_until) = self.validity_time {
            if now > valid_until {
                return false;
            }
        }
        if let Some(id) = self.nf_instance_id {
            if id != profile.nf_instance_id {
                return false;
            }
        }
        if let Some(nf_type) = self.nf_type {
            if nf_type != profile.nf_type {
                return false;
            }
        }
        self.events.is_empty() || self.events.contains(&event)
    }
}

/// One pending POST to a subscriber.
#[derive(Debug, Clone)]
pub struct NotificationJob {
    pub callback_uri: String,
    pub body: NotificationBody,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NotificationBody {
    pub event: NotificationEvent,
    pub nf_instance_id: Uuid,
    pub profile: NfProfile,
}

#[derive(Default)]
pub struct SubscriptionStore {
    subscriptions: RwLock<HashMap<String, NfSubscription>>,
    next_id: AtomicU64,
}

impl SubscriptionStore {
    pub fn insert(&self, mut sub: NfSubscription) -> String {
        let id = format!("sub-{}", self.next_id.fetch_add(1, Ordering::Relaxed) + 1);
        sub.subscription_id = Some(id.clone());
        self.subscriptions.write().insert(id.clone(), sub);
        id
    }

    pub fn remove(&self, id: &str) -> Result<()> {
        self.subscriptions
            .write()
            .remove(id)
            .map(|_| ())
            .ok_or_else(|| Error::NotFound(format!("subscription {id}")))
    }

    /// Jobs for all live subscriptions matching the event.
    pub fn jobs_for(
        &self,
        event: NotificationEvent,
        profile: &NfProfile,
        now: DateTime<Utc>,
    ) -> Vec<NotificationJob> {
        self.subscriptions
            .read()
            .values()
            .filter(|sub| sub.wants(event, profile, now))
            .map(|sub| NotificationJob {
                callback_uri: sub.callback_uri.clone(),
                body: NotificationBody {
                    event,
                    nf_instance_id: profile.nf_instance_id,
                    profile: profile.clone(),
                },
            })
            .collect()
    }
}

/// Delivers notification jobs: one POST attempt each, failures logged and
/// counted, never retried.
pub struct Notifier {
    client: reqwest::Client,
    pub failed: AtomicU64,
}

impl Notifier {
    pub fn new() -> Self {
        Notifier {
            client: reqwest::Client::new(),
            failed: AtomicU64::new(0),
        }
    }

    pub async fn deliver(&self, jobs: Vec<NotificationJob>) {
        for job in jobs {
            let outcome = self
                .client
                .post(&job.callback_uri)
                .json(&job.body)
                .send()
                .await;
            match outcome {
                Ok(resp) if resp.status().is_success() => {}
                Ok(resp) => {
                    self.failed.fetch_add(1, Ordering::Relaxed);
                    tracing::warn!(
                        callback = %job.callback_uri,
                        status = %resp.status(),
                        "notification rejected by subscriber"
                    );
                }
                Err(err) => {
                    self.failed.fetch_add(1, Ordering::Relaxed);
                    tracing::warn!(
                        callback = %job.callback_uri,
                        error = %err,
                        "notification delivery failed"
                    );
                }
            }
        }
    }
}

impl Default for Notifier {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sub(events: Vec<NotificationEvent>) -> NfSubscription {
        NfSubscription {
            subscription_id: None,
            callback_uri: "http://127.0.0.1:9/cb".into(),
            nf_instance_id: None,
            nf_type: None,
            events,
            validity_time: None,
        }
    }

    #[test]
    fn empty_event_mask_matches_everything() {
        let store = SubscriptionStore::default();
        store.insert(sub(vec![]));
        let profile = NfProfile::new(Uuid::new_v4(), NfType::Amf);
        let jobs = store.jobs_for(NotificationEvent::NfRegistered, &profile, Utc::now());
        assert_eq!(jobs.len(), 1);
    }

    #[test]
    fn event_mask_filters() {
        let store = SubscriptionStore::default();
        store.insert(sub(vec![NotificationEvent::NfDeregistered]));
        let profile = NfProfile::new(Uuid::new_v4(), NfType::Amf);
        assert!(store
            .jobs_for(NotificationEvent::NfRegistered, &profile, Utc::now())
            .is_empty());
        assert_eq!(
            store
                .jobs_for(NotificationEvent::NfDeregistered, &profile, Utc::now())
                .len(),
            1
        );
    }

    #[test]
    fn expired_subscription_is_skipped() {
        let store = SubscriptionStore::default();
        let mut s = sub(vec![]);
        s.validity_time = Some(Utc::now() - chrono::Duration::seconds(1));
        store.insert(s);
        let profile = NfProfile::new(Uuid::new_v4(), NfType::Smf);
        assert!(store
            .jobs_for(NotificationEvent::NfRegistered, &profile, Utc::now())
            .is_empty());
    }

    #[test]
    fn type_and_instance_filters() {
        let store = SubscriptionStore::default();
        let watched = Uuid::new_v4();
        let mut s = sub(vec![]);
        s.nf_instance_id = Some(watched);
        s.nf_type = Some(NfType::Upf);
        store.insert(s);

        let other = NfProfile::new(Uuid::new_v4(), NfType::Upf);
        assert!(store
            .jobs_for(NotificationEvent::NfRegistered, &other, Utc::now())
            .is_empty());

        let matching = NfProfile::new(watched, NfType::Upf);
        assert_eq!(
            store
                .jobs_for(NotificationEvent::NfRegistered, &matching, Utc::now())
                .len(),
            1
        );
    }

    #[test]
    fn unsubscribe_unknown_id_fails() {
        let store = SubscriptionStore::default();
        assert!(store.remove("sub-999").is_err());
        let id = store.insert(sub(vec![]));
        assert!(store.remove(&id).is_ok());
    }
}
