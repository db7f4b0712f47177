//! AUSF: two-phase 5G-AKA orchestration.
//!
//! `initiate` fetches a vector from the UDM, derives KSEAF, and parks the
//! challenge in an expiring context; `confirm` consumes the context,
//! compares the UE response in constant time, and reports the outcome to
//! the UDM best-effort.

pub mod context;
pub mod handlers;

use std::sync::Arc;
use std::time::{Duration, Instant};

use rand::rngs::OsRng;
use rand::RngCore;
use serde::{Deserialize, Serialize};
use subtle::ConstantTimeEq;
use tokio_util::sync::CancellationToken;

use crate::ausf::context::{AuthContext, ContextStore};
use crate::crypto::kdf;
use crate::error::{Error, Result};
use crate::sbi::client::SbiClient;
use crate::types::validate_supi;

/// Challenge returned to the AMF. HXRES* and KSEAF stay server-side.
#[derive(Debug, Clone)]
pub struct Challenge {
    pub auth_ctx_id: String,
    pub rand: [u8; 16],
    pub autn: [u8; 16],
}

#[derive(Debug, Clone)]
pub enum Confirmation {
    Success { supi: String, kseaf: [u8; 32] },
    Failure,
}

/// Client-side view of the UDM's generate-auth-data response.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct UdmAuthData {
    #[allow(dead_code)]
    auth_type: String,
    authentication_vector: UdmVector,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct UdmVector {
    rand: String,
    autn: String,
    hxres: String,
    kausf: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerateAuthDataRequest<'a> {
    serving_network_name: &'a str,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct AuthEventBody {
    success: bool,
    time_stamp: chrono::DateTime<chrono::Utc>,
}

pub struct AusfService {
    contexts: Arc<ContextStore>,
    client: SbiClient,
    udm_base: String,
    /// 3GPP-correct comparison (hash the submitted RES* before comparing)
    /// versus the reference behaviour of comparing directly.
    hashed_res_star: bool,
}

impl AusfService {
    pub fn new(udm_base: String, context_ttl: Duration, hashed_res_star: bool) -> Self {
        AusfService {
            contexts: Arc::new(ContextStore::new(context_ttl)),
            client: SbiClient::new(),
            udm_base,
            hashed_res_star,
        }
    }

    pub fn contexts(&self) -> &Arc<ContextStore> {
        &self.contexts
    }

    pub async fn initiate(&self, supi: &str, serving_network: &str) -> Result<Challenge> {
        validate_supi(supi)?;

        let url = format!(
            "{}/nudm-ueau/v1/supi/{supi}/security-information/generate-auth-data",
            self.udm_base
        );
        let data: UdmAuthData = self
            .client
            .post_json(&url, &GenerateAuthDataRequest {
                serving_network_name: serving_network,
            })
            .await?;

        let rand = decode_fixed::<16>("RAND", &data.authentication_vector.rand)?;
        let autn = decode_fixed::<16>("AUTN", &data.authentication_vector.autn)?;
        let hxres_star = decode_fixed::<16>("HXRES*", &data.authentication_vector.hxres)?;
        let kausf = decode_fixed::<32>("KAUSF", &data.authentication_vector.kausf)?;
        let kseaf = kdf::derive_kseaf(&kausf, serving_network);

        let auth_ctx_id = fresh_ctx_id();
        self.contexts.insert(AuthContext {
            auth_ctx_id: auth_ctx_id.clone(),
            supi: supi.to_string(),
            serving_network: serving_network.to_string(),
            rand,
            autn,
            hxres_star,
            kausf,
            kseaf,
            expires_at: Instant::now(), // stamped by the store
        });

        Ok(Challenge {
            auth_ctx_id,
            rand,
            autn,
        })
    }

    pub async fn confirm(&self, auth_ctx_id: &str, res_star: &[u8; 16]) -> Result<Confirmation> {
        let ctx = self.contexts.take_valid(auth_ctx_id)?;

        let matched = if self.hashed_res_star {
            let hashed = kdf::derive_hxres_star(&ctx.rand, res_star);
            hashed.ct_eq(&ctx.hxres_star).unwrap_u8() == 1
        } else {
            res_star.ct_eq(&ctx.hxres_star).unwrap_u8() == 1
        };

        if !matched {
            self.report_auth_event(&ctx.supi, false);
            return Ok(Confirmation::Failure);
        }

        self.report_auth_event(&ctx.supi, true);
        Ok(Confirmation::Success {
            supi: ctx.supi,
            kseaf: ctx.kseaf,
        })
    }

    /// Best-effort auth-event toward the UDM; failures are logged only.
    fn report_auth_event(&self, supi: &str, success: bool) {
        let url = format!("{}/nudm-ueau/v1/supi/{supi}/auth-events", self.udm_base);
        let client = self.client.clone();
        tokio::spawn(async move {
            let body = AuthEventBody {
                success,
                time_stamp: chrono::Utc::now(),
            };
            if let Err(err) = client.post_no_content(&url, &body).await {
                tracing::warn!(error = %err, "auth-event notification to UDM failed");
            }
        });
    }
}

/// 128-bit random context id, lowercase hex.
fn fresh_ctx_id() -> String {
    let mut bytes = [0u8; 16];
    OsRng.fill_bytes(&mut bytes);
    hex::encode(bytes)
}

fn decode_fixed<const N: usize>(what: &str, value: &str) -> Result<[u8; N]> {
    let bytes =
        hex::decode(value).map_err(|_| Error::Protocol(format!("UDM sent non-hex {what}")))?;
    bytes
        .try_into()
        .map_err(|_| Error::Protocol(format!("UDM sent {what} of wrong length")))
}

/// Sweeps expired contexts at half the TTL.
pub fn spawn_janitor(contexts: Arc<ContextStore>, cancel: CancellationToken) {
    let period = contexts.ttl() / 2;
    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(period.max(Duration::from_secs(1)));
        ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);
        loop {
            tokio::select! {
                _ = cancel.cancelled() => break,
                _ = ticker.tick() => {
                    let dropped = contexts.sweep_expired();
                    if dropped > 0 {
                        tracing::debug!(dropped, "expired auth contexts swept");
                    }
                }
            }
        }
    });
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ctx_ids_are_random_128_bit_hex() {
        let a = fresh_ctx_id();
        let b = fresh_ctx_id();
        assert_eq!(a.len(), 32);
        assert_ne!(a, b);
        assert!(a.chars().all(|c| c.is_ascii_hexdigit()));
    }

    #[test]
    fn decode_fixed_validates() {
        assert!(decode_fixed::<16>("RAND", "23553cbe9637a89d218ae64dae47bf35").is_ok());
        assert!(decode_fixed::<16>("RAND", "2355").is_err());
        assert!(decode_fixed::<16>("RAND", "not-hex").is_err());
    }
}
