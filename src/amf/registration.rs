//! Registration state machine and AUSF-facing authentication glue.

use serde::{Deserialize, Serialize};

use crate::amf::context::{
    ConnectionState, RegistrationState, SecurityContext, UeContextStore,
};
use crate::crypto::kdf;
use crate::error::{Error, Result};
use crate::sbi::client::SbiClient;
use crate::types::{validate_supi, Guami, Snssai, Tai};

/// ABBA parameter for the initial KAMF derivation (TS 33.501 A.7.1).
const ABBA_INITIAL: [u8; 2] = [0x00, 0x00];

/// Static serving-side identity and policy, from config.
#[derive(Debug, Clone)]
pub struct AmfPolicy {
    pub guami: Guami,
    pub tai: Tai,
    pub supported_nssai: Vec<Snssai>,
    pub default_nssai: Vec<Snssai>,
    /// Ordered preference; the first entry is always selected.
    pub integrity_order: Vec<String>,
    pub ciphering_order: Vec<String>,
    pub t3512_secs: u32,
}

/// Challenge material relayed toward the UE (NGAP stands outside the core).
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UeChallenge {
    pub rand: String,
    pub autn: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum RegistrationResult {
    Success,
    Failure,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RegistrationResponse {
    pub result: RegistrationResult,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub guami: Option<Guami>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tai: Option<Tai>,
    #[serde(skip_serializing_if = "Vec::is_empty", default)]
    pub allowed_nssai: Vec<Snssai>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub t3512_secs: Option<u32>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RegistrationRequest {
    #[serde(default)]
    pub registration_type: Option<String>,
    #[serde(default)]
    pub requested_nssai: Vec<Snssai>,
}

// AUSF SBI bodies, client side.

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct AuthenticationInfo<'a> {
    supi_or_suci: &'a str,
    serving_network_name: &'a str,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct UeAuthenticationCtx {
    #[allow(dead_code)]
    auth_type: String,
    #[serde(rename = "_5gAuthData")]
    auth_data: FiveGAuthData,
    #[serde(rename = "_links")]
    links: Links,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct FiveGAuthData {
    rand: String,
    autn: String,
}

#[derive(Debug, Deserialize)]
struct Links {
    #[serde(rename = "5g-aka")]
    five_g_aka: Href,
}

#[derive(Debug, Deserialize)]
struct Href {
    href: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct ConfirmationData<'a> {
    res_star: &'a str,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ConfirmationDataResponse {
    auth_result: String,
    #[serde(default)]
    supi: Option<String>,
    #[serde(default)]
    kseaf: Option<String>,
}

pub struct AmfService {
    ues: UeContextStore,
    client: SbiClient,
    ausf_base: String,
    serving_network: String,
    policy: AmfPolicy,
}

impl AmfService {
    pub fn new(ausf_base: String, serving_network: String, policy: AmfPolicy) -> Self {
        AmfService {
            ues: UeContextStore::default(),
            client: SbiClient::new(),
            ausf_base,
            serving_network,
            policy,
        }
    }

    pub fn ues(&self) -> &UeContextStore {
        &self.ues
    }

    /// `InitiateAuth`: calls the AUSF, creates the UE context if needed,
    /// stashes the auth context id, and marks the UE connected.
    pub async fn initiate_auth(&self, supi: &str) -> Result<UeChallenge> {
        validate_supi(supi)?;

        let url = format!("{}/nausf-auth/v1/ue-authentications", self.ausf_base);
        let ctx: UeAuthenticationCtx = self
            .client
            .post_json(&url, &AuthenticationInfo {
                supi_or_suci: supi,
                serving_network_name: &self.serving_network,
            })
            .await?;

        let auth_ctx_id = ctx_id_from_href(&ctx.links.five_g_aka.href)?;
        self.ues.with_ue(supi, |ue| {
            ue.connection_state = ConnectionState::Connected;
            ue.auth_ctx_id = Some(auth_ctx_id.clone());
            ue.configured_nssai = self.policy.default_nssai.clone();
        });

        Ok(UeChallenge {
            rand: ctx.auth_data.rand,
            autn: ctx.auth_data.autn,
        })
    }

    /// `ConfirmAuth`: forwards RES* to the AUSF and, on success, installs
    /// the security context (KSEAF, derived KAMF, configured algorithm
    /// selections).
    pub async fn confirm_auth(&self, supi: &str, res_star_hex: &str) -> Result<RegistrationResult> {
        let auth_ctx_id = self
            .ues
            .get(supi)
            .and_then(|ue| ue.auth_ctx_id)
            .ok_or_else(|| Error::NotFound(format!("pending authentication for {supi}")))?;

        let url = format!(
            "{}/nausf-auth/v1/ue-authentications/{auth_ctx_id}/5g-aka-confirmation",
            self.ausf_base
        );
        let resp: ConfirmationDataResponse = self
            .client
            .put_json(&url, &ConfirmationData { res_star: res_star_hex })
            .await?;

        if resp.auth_result != "AUTHENTICATION_SUCCESS" {
            self.ues.with_existing_ue(supi, |ue| {
                ue.auth_ctx_id = None;
                Ok(())
            })?;
            return Ok(RegistrationResult::Failure);
        }

        let kseaf_hex = resp
            .kseaf
            .ok_or_else(|| Error::Protocol("AUSF success without kseaf".into()))?;
        let kseaf: [u8; 32] = hex::decode(&kseaf_hex)
            .map_err(|_| Error::Protocol("AUSF sent non-hex kseaf".into()))?
            .try_into()
            .map_err(|_| Error::Protocol("AUSF sent kseaf of wrong length".into()))?;
        let kamf = kdf::derive_kamf(&kseaf, resp.supi.as_deref().unwrap_or(supi), &ABBA_INITIAL);

        let integrity_alg = first_preference(&self.policy.integrity_order, "NIA0");
        let ciphering_alg = first_preference(&self.policy.ciphering_order, "NEA0");
        self.ues.with_existing_ue(supi, |ue| {
            ue.auth_ctx_id = None;
            ue.security = Some(SecurityContext {
                kseaf,
                kamf,
                integrity_alg: integrity_alg.clone(),
                ciphering_alg: ciphering_alg.clone(),
                uplink_nas_count: 0,
                downlink_nas_count: 0,
                nas_security_established: true,
            });
            Ok(())
        })?;
        Ok(RegistrationResult::Success)
    }

    /// `Register`: gated on an established security context. Computes the
    /// allowed NSSAI, assigns GUAMI and TAI, and moves the UE to
    /// REGISTERED.
    pub fn register(&self, supi: &str, req: &RegistrationRequest) -> RegistrationResponse {
        let Some(ue) = self.ues.get(supi) else {
            return failure("UE not authenticated");
        };
        match &ue.security {
            None => return failure("UE not authenticated"),
            Some(sec) if !sec.nas_security_established => {
                return failure("Security context not established")
            }
            Some(_) => {}
        }

        let allowed_nssai = if req.requested_nssai.is_empty() {
            self.policy.default_nssai.clone()
        } else {
            req.requested_nssai
                .iter()
                .filter(|s| self.policy.supported_nssai.contains(s))
                .cloned()
                .collect()
        };

        self.ues.with_ue(supi, |ue| {
            ue.registration_state = RegistrationState::Registered;
            ue.guami = Some(self.policy.guami.clone());
            ue.tai = Some(self.policy.tai.clone());
            ue.allowed_nssai = allowed_nssai.clone();
        });

        RegistrationResponse {
            result: RegistrationResult::Success,
            reason: None,
            guami: Some(self.policy.guami.clone()),
            tai: Some(self.policy.tai.clone()),
            allowed_nssai,
            t3512_secs: Some(self.policy.t3512_secs),
        }
    }

    /// `Deregister`: transitions through DEREGISTERED/IDLE, then frees the
    /// context.
    pub fn deregister(&self, supi: &str) -> Result<()> {
        self.ues.with_existing_ue(supi, |ue| {
            ue.registration_state = RegistrationState::Deregistered;
            ue.connection_state = ConnectionState::Idle;
            Ok(())
        })?;
        self.ues.remove(supi);
        Ok(())
    }
}

fn failure(reason: &str) -> RegistrationResponse {
    RegistrationResponse {
        result: RegistrationResult::Failure,
        reason: Some(reason.to_string()),
        guami: None,
        tai: None,
        allowed_nssai: Vec::new(),
        t3512_secs: None,
    }
}

/// Deterministic algorithm selection: the head of the configured order.
fn first_preference(order: &[String], fallback: &str) -> String {
    order.first().cloned().unwrap_or_else(|| fallback.to_string())
}

/// The AUSF hands back the confirmation URL; the context id is its
/// second-to-last path segment.
fn ctx_id_from_href(href: &str) -> Result<String> {
    let mut segments = href.trim_end_matches('/').rsplit('/');
    let last = segments.next();
    if last != Some("5g-aka-confirmation") {
        return Err(Error::Protocol(format!("unexpected 5g-aka href {href:?}")));
    }
    segments
        .next()
        .filter(|s| !s.is_empty())
        .map(|s| s.to_string())
        .ok_or_else(|| Error::Protocol(format!("no auth context id in href {href:?}")))
}
