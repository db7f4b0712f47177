//! Shared SBA data model.
//!
//! The types in this module cross NF boundaries on the SBI plane and are
//! serialized with the 3GPP camelCase field convention. NF-type-specific
//! profile info is a tagged variant ([`NfInfo`]) so discovery matching is a
//! plain `match` instead of downcasting.

use std::fmt;
use std::net::{Ipv4Addr, Ipv6Addr};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::{Error, Result};

// ============================================================================
// PLMN / slice / tracking-area identifiers
// ============================================================================

/// Public Land Mobile Network identifier: MCC (3 digits) + MNC (2-3 digits).
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct PlmnId {
    pub mcc: String,
    pub mnc: String,
}

impl PlmnId {
    pub fn new(mcc: impl Into<String>, mnc: impl Into<String>) -> Self {
        PlmnId {
            mcc: mcc.into(),
            mnc: mnc.into(),
        }
    }

    /// Validates digit counts: MCC exactly 3, MNC 2 or 3.
    pub fn validate(&self) -> Result<()> {
        let digits = |s: &str| s.chars().all(|c| c.is_ascii_digit());
        if self.mcc.len() != 3 || !digits(&self.mcc) {
            return Err(Error::InvalidInput(format!("invalid MCC {:?}", self.mcc)));
        }
        if !(2..=3).contains(&self.mnc.len()) || !digits(&self.mnc) {
            return Err(Error::InvalidInput(format!("invalid MNC {:?}", self.mnc)));
        }
        Ok(())
    }

    /// Serving network name for the 5G-AKA KDFs:
    /// `5G:mnc<3 digits>.mcc<3 digits>.3gppnetwork.org`.
    pub fn serving_network_name(&self) -> String {
        format!(
            "5G:mnc{:0>3}.mcc{:0>3}.3gppnetwork.org",
            self.mnc, self.mcc
        )
    }
}

impl fmt::Display for PlmnId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}-{}", self.mcc, self.mnc)
    }
}

/// Single Network Slice Selection Assistance Information.
///
/// SST is the slice type (0-255); SD is an optional 24-bit differentiator in
/// lowercase hex (6 chars).
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Snssai {
    pub sst: u8,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sd: Option<String>,
}

impl Snssai {
    pub fn new(sst: u8) -> Self {
        Snssai { sst, sd: None }
    }

    pub fn with_sd(sst: u8, sd: impl Into<String>) -> Self {
        Snssai {
            sst,
            sd: Some(sd.into()),
        }
    }

    /// Discovery match: SSTs equal, and the *query* SD (self) empty or equal.
    pub fn matches(&self, profile: &Snssai) -> bool {
        self.sst == profile.sst
            && match &self.sd {
                None => true,
                Some(sd) => profile.sd.as_deref() == Some(sd.as_str()),
            }
    }
}

impl fmt::Display for Snssai {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.sd {
            Some(sd) => write!(f, "{}-{}", self.sst, sd),
            None => write!(f, "{}", self.sst),
        }
    }
}

/// Globally Unique AMF Identifier: PLMN + region + set + pointer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Guami {
    pub plmn_id: PlmnId,
    pub amf_region_id: String,
    pub amf_set_id: String,
    pub amf_pointer: String,
}

/// Tracking Area Identity: PLMN + TAC.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Tai {
    pub plmn_id: PlmnId,
    pub tac: String,
}

// ============================================================================
// SUPI
// ============================================================================

/// Validates an IMSI-form SUPI (`imsi-` followed by 5-15 digits).
pub fn validate_supi(supi: &str) -> Result<()> {
    let digits = supi
        .strip_prefix("imsi-")
        .ok_or_else(|| Error::InvalidInput(format!("SUPI {supi:?} is not imsi-form")))?;
    if !(5..=15).contains(&digits.len()) || !digits.chars().all(|c| c.is_ascii_digit()) {
        return Err(Error::InvalidInput(format!("invalid IMSI digits in {supi:?}")));
    }
    Ok(())
}

// ============================================================================
// NF profile
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum NfType {
    #[serde(rename = "AMF")]
    Amf,
    #[serde(rename = "SMF")]
    Smf,
    #[serde(rename = "UPF")]
    Upf,
    #[serde(rename = "AUSF")]
    Ausf,
    #[serde(rename = "UDM")]
    Udm,
    #[serde(rename = "UDR")]
    Udr,
    #[serde(rename = "PCF")]
    Pcf,
    #[serde(rename = "NRF")]
    Nrf,
    #[serde(rename = "NSSF")]
    Nssf,
    #[serde(rename = "NEF")]
    Nef,
    #[serde(rename = "NWDAF")]
    Nwdaf,
}

impl fmt::Display for NfType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            NfType::Amf => "AMF",
            NfType::Smf => "SMF",
            NfType::Upf => "UPF",
            NfType::Ausf => "AUSF",
            NfType::Udm => "UDM",
            NfType::Udr => "UDR",
            NfType::Pcf => "PCF",
            NfType::Nrf => "NRF",
            NfType::Nssf => "NSSF",
            NfType::Nef => "NEF",
            NfType::Nwdaf => "NWDAF",
        };
        f.write_str(s)
    }
}

impl std::str::FromStr for NfType {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_ascii_uppercase().as_str() {
            "AMF" => Ok(NfType::Amf),
            "SMF" => Ok(NfType::Smf),
            "UPF" => Ok(NfType::Upf),
            "AUSF" => Ok(NfType::Ausf),
            "UDM" => Ok(NfType::Udm),
            "UDR" => Ok(NfType::Udr),
            "PCF" => Ok(NfType::Pcf),
            "NRF" => Ok(NfType::Nrf),
            "NSSF" => Ok(NfType::Nssf),
            "NEF" => Ok(NfType::Nef),
            "NWDAF" => Ok(NfType::Nwdaf),
            other => Err(Error::InvalidInput(format!("unknown NF type {other:?}"))),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum NfStatus {
    Registered,
    Suspended,
    Undiscoverable,
}

/// One SBI service advertised by a profile (e.g. `nausf-auth`).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NfService {
    pub service_instance_id: String,
    pub service_name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_prefix: Option<String>,
}

/// AMF-specific profile info.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AmfInfo {
    pub amf_set_id: String,
    pub amf_region_id: String,
    #[serde(default)]
    pub guami_list: Vec<Guami>,
    #[serde(default)]
    pub tai_list: Vec<Tai>,
}

/// Per-S-NSSAI DNN support advertised by an SMF.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SnssaiSmfInfoItem {
    pub s_nssai: Snssai,
    pub dnn_list: Vec<String>,
}

/// SMF-specific profile info.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SmfInfo {
    #[serde(default)]
    pub sm_info_list: Vec<SnssaiSmfInfoItem>,
    #[serde(default)]
    pub tai_list: Vec<Tai>,
}

/// One user-plane interface advertised by a UPF (N3, N6, N9).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpfInterface {
    pub interface_type: String,
    #[serde(default)]
    pub ipv4_endpoint_addresses: Vec<Ipv4Addr>,
}

/// UPF-specific profile info.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpfInfo {
    #[serde(default)]
    pub interface_upf_info_list: Vec<UpfInterface>,
}

/// NF-type-specific info as one tagged variant.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum NfInfo {
    AmfInfo(AmfInfo),
    SmfInfo(SmfInfo),
    UpfInfo(UpfInfo),
}

/// A registered Network Function instance.
///
/// `nf_instance_id` is immutable for the lifetime of the registration.
/// `last_heartbeat` is refreshed by heartbeats only and never by updates.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NfProfile {
    pub nf_instance_id: Uuid,
    pub nf_type: NfType,
    pub nf_status: NfStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub plmn_id: Option<PlmnId>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub s_nssais: Vec<Snssai>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub ipv4_addresses: Vec<Ipv4Addr>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub ipv6_addresses: Vec<Ipv6Addr>,
    /// Seconds between expected heartbeats; 0 disables liveness expiry.
    #[serde(default)]
    pub heartbeat_timer: u64,
    /// Lower sorts first in discovery results.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub priority: Option<u16>,
    /// Higher sorts first among equal priorities.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub capacity: Option<u16>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub nf_services: Vec<NfService>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub nf_info: Option<NfInfo>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_heartbeat: Option<DateTime<Utc>>,
}

impl NfProfile {
    pub fn new(nf_instance_id: Uuid, nf_type: NfType) -> Self {
        NfProfile {
            nf_instance_id,
            nf_type,
            nf_status: NfStatus::Registered,
            plmn_id: None,
            s_nssais: Vec::new(),
            ipv4_addresses: Vec::new(),
            ipv6_addresses: Vec::new(),
            heartbeat_timer: 0,
            priority: None,
            capacity: None,
            nf_services: Vec::new(),
            nf_info: None,
            created_at: None,
            updated_at: None,
            last_heartbeat: None,
        }
    }

    /// A profile with a nonzero heartbeat timer expires when no heartbeat
    /// has arrived within the timer interval.
    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        if self.heartbeat_timer == 0 {
            return false;
        }
        match self.last_heartbeat {
            Some(hb) => {
                now.signed_duration_since(hb)
                    > chrono::Duration::seconds(self.heartbeat_timer as i64)
            }
            None => true,
        }
    }

    pub fn amf_info(&self) -> Option<&AmfInfo> {
        match &self.nf_info {
            Some(NfInfo::AmfInfo(info)) => Some(info),
            _ => None,
        }
    }

    pub fn smf_info(&self) -> Option<&SmfInfo> {
        match &self.nf_info {
            Some(NfInfo::SmfInfo(info)) => Some(info),
            _ => None,
        }
    }

    pub fn upf_info(&self) -> Option<&UpfInfo> {
        match &self.nf_info {
            Some(NfInfo::UpfInfo(info)) => Some(info),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn plmn_validation() {
        assert!(PlmnId::new("001", "01").validate().is_ok());
        assert!(PlmnId::new("001", "001").validate().is_ok());
        assert!(PlmnId::new("01", "01").validate().is_err());
        assert!(PlmnId::new("001", "1").validate().is_err());
        assert!(PlmnId::new("00a", "01").validate().is_err());
    }

    #[test]
    fn serving_network_name_pads_mnc() {
        let plmn = PlmnId::new("001", "01");
        assert_eq!(
            plmn.serving_network_name(),
            "5G:mnc001.mcc001.3gppnetwork.org"
        );
    }

    #[test]
    fn snssai_match_requires_equal_sst() {
        let query = Snssai::new(1);
        assert!(query.matches(&Snssai::with_sd(1, "000001")));
        assert!(!query.matches(&Snssai::new(2)));
    }

    #[test]
    fn snssai_match_with_sd_requires_equal_sd() {
        let query = Snssai::with_sd(1, "000001");
        assert!(query.matches(&Snssai::with_sd(1, "000001")));
        assert!(!query.matches(&Snssai::with_sd(1, "000002")));
        assert!(!query.matches(&Snssai::new(1)));
    }

    #[test]
    fn supi_validation() {
        assert!(validate_supi("imsi-001010000000001").is_ok());
        assert!(validate_supi("001010000000001").is_err());
        assert!(validate_supi("imsi-abc").is_err());
        assert!(validate_supi("imsi-0010100000000011234").is_err());
    }

    #[test]
    fn profile_expiry_honors_zero_timer() {
        let mut profile = NfProfile::new(Uuid::new_v4(), NfType::Amf);
        profile.heartbeat_timer = 0;
        profile.last_heartbeat = None;
        assert!(!profile.is_expired(Utc::now()));
    }

    #[test]
    fn profile_expiry_after_timer_elapses() {
        let mut profile = NfProfile::new(Uuid::new_v4(), NfType::Amf);
        profile.heartbeat_timer = 30;
        let now = Utc::now();
        profile.last_heartbeat = Some(now - chrono::Duration::seconds(31));
        assert!(profile.is_expired(now));
        profile.last_heartbeat = Some(now - chrono::Duration::seconds(29));
        assert!(!profile.is_expired(now));
    }

    #[test]
    fn nf_type_serde_uses_uppercase() {
        assert_eq!(serde_json::to_string(&NfType::Ausf).unwrap(), "\"AUSF\"");
        let t: NfType = serde_json::from_str("\"UPF\"").unwrap();
        assert_eq!(t, NfType::Upf);
    }

    #[test]
    fn nf_info_is_a_tagged_variant() {
        let info = NfInfo::SmfInfo(SmfInfo {
            sm_info_list: vec![SnssaiSmfInfoItem {
                s_nssai: Snssai::with_sd(1, "000001"),
                dnn_list: vec!["internet".into()],
            }],
            tai_list: vec![],
        });
        let json = serde_json::to_string(&info).unwrap();
        assert!(json.contains("smfInfo"));
        let back: NfInfo = serde_json::from_str(&json).unwrap();
        assert_eq!(back, info);
    }
}
