//! NRF: NF service registry.
//!
//! Profile store with heartbeat-driven liveness, a discovery query matcher,
//! and best-effort change notifications toward subscribers. The registry
//! itself is synchronous behind readers-writer locks; delivery of
//! notifications and the expiry sweeper run as tokio tasks owned by the
//! binary.

pub mod handlers;
pub mod matcher;
pub mod registry;
pub mod subscription;

use std::sync::Arc;
use std::time::Duration;

use tokio_util::sync::CancellationToken;
use tracing::debug;

use crate::nrf::registry::Registry;
use crate::nrf::subscription::Notifier;

/// Shared state behind the NRF's HTTP surface.
#[derive(Clone)]
pub struct NrfState {
    pub registry: Arc<Registry>,
    pub notifier: Arc<Notifier>,
}

impl NrfState {
    pub fn new() -> Self {
        NrfState {
            registry: Arc::new(Registry::with_in_memory_store()),
            notifier: Arc::new(Notifier::new()),
        }
    }
}

impl Default for NrfState {
    fn default() -> Self {
        Self::new()
    }
}

/// Periodically removes expired profiles and notifies subscribers.
///
/// The scan collects expired ids under a read lock; each removal then takes
/// a short write lock, so discovery and registration proceed in parallel
/// with the sweep.
pub fn spawn_sweeper(state: NrfState, interval: Duration, cancel: CancellationToken) {
    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(interval);
        ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);
        loop {
            tokio::select! {
                _ = cancel.cancelled() => break,
                _ = ticker.tick() => {
                    let (removed, jobs) = state.registry.sweep_expired_at(chrono::Utc::now());
                    for id in &removed {
                        debug!(nf_instance_id = %id, "expired profile removed by sweeper");
                    }
                    state.notifier.deliver(jobs).await;
                }
            }
        }
    });
}
