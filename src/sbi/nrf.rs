//! NRF client used by every NF.
//!
//! Registers the NF's own profile at startup, keeps it alive with a
//! heartbeat loop, discovers peers, and deregisters best-effort on
//! shutdown.

use std::sync::Arc;
use std::time::Duration;

use serde::Deserialize;
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};
use uuid::Uuid;

use crate::error::Result;
use crate::sbi::client::SbiClient;
use crate::types::{NfProfile, NfService, NfType};

/// Body of `GET /nnrf-disc/v1/nf-instances`.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SearchResult {
    pub validity_period: u64,
    pub nf_instances: Vec<NfProfile>,
    pub search_id: String,
}

#[derive(Clone)]
pub struct NrfClient {
    base_url: String,
    client: SbiClient,
    /// Heartbeats get a single attempt; the next tick is the retry.
    heartbeat_client: SbiClient,
}

impl NrfClient {
    pub fn new(base_url: impl Into<String>) -> Self {
        NrfClient {
            base_url: base_url.into(),
            client: SbiClient::new(),
            heartbeat_client: SbiClient::with_retries(0),
        }
    }

    pub async fn register(&self, profile: &NfProfile) -> Result<NfProfile> {
        let url = format!(
            "{}/nnrf-nfm/v1/nf-instances/{}",
            self.base_url, profile.nf_instance_id
        );
        self.client.put_json(&url, profile).await
    }

    pub async fn heartbeat(&self, nf_instance_id: Uuid) -> Result<()> {
        let url = format!(
            "{}/nnrf-nfm/v1/nf-instances/{nf_instance_id}/heartbeat",
            self.base_url
        );
        self.heartbeat_client.put_no_content(&url).await
    }

    pub async fn deregister(&self, nf_instance_id: Uuid) -> Result<()> {
        let url = format!(
            "{}/nnrf-nfm/v1/nf-instances/{nf_instance_id}",
            self.base_url
        );
        self.client.delete(&url).await
    }

    /// Discovers instances of `nf_type`, best (priority/capacity) first.
    pub async fn discover(&self, nf_type: NfType) -> Result<Vec<NfProfile>> {
        let url = format!(
            "{}/nnrf-disc/v1/nf-instances?target-nf-type={nf_type}",
            self.base_url
        );
        let result: SearchResult = self.client.get_json(&url).await?;
        Ok(result.nf_instances)
    }
}

/// Profile skeleton the binaries register at startup. `api_base` is the
/// NF's reachable SBI base URI, advertised as the service's `apiPrefix` so
/// discovery consumers can build request URLs from it.
pub fn base_profile(
    nf_instance_id: Option<Uuid>,
    nf_type: NfType,
    api_base: &str,
    heartbeat_timer: u64,
    service_names: &[&str],
) -> NfProfile {
    let mut profile = NfProfile::new(nf_instance_id.unwrap_or_else(Uuid::new_v4), nf_type);
    profile.heartbeat_timer = heartbeat_timer;
    profile.nf_services = service_names
        .iter()
        .enumerate()
        .map(|(i, name)| NfService {
            service_instance_id: format!("{i}"),
            service_name: (*name).to_string(),
            api_prefix: Some(api_base.to_string()),
        })
        .collect();
    profile
}

/// Registers `profile` and keeps heartbeating until cancelled, then
/// deregisters best-effort. Registration failures at startup are retried by
/// the normal client policy and then surfaced.
pub async fn register_and_heartbeat(
    nrf: Arc<NrfClient>,
    profile: NfProfile,
    cancel: CancellationToken,
) -> Result<()> {
    nrf.register(&profile).await?;
    debug!(nf_instance_id = %profile.nf_instance_id, "registered with NRF");

    let interval = Duration::from_secs(profile.heartbeat_timer.max(1));
    let id = profile.nf_instance_id;
    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(interval);
        ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);
        ticker.tick().await; // immediate first tick
        loop {
            tokio::select! {
                _ = cancel.cancelled() => {
                    if let Err(err) = nrf.deregister(id).await {
                        warn!(error = %err, "NRF deregistration failed during shutdown");
                    }
                    break;
                }
                _ = ticker.tick() => {
                    if let Err(err) = nrf.heartbeat(id).await {
                        warn!(error = %err, "NRF heartbeat failed; will retry next tick");
                    }
                }
            }
        }
    });
    Ok(())
}
