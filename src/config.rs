//! Per-NF YAML configuration.
//!
//! Each binary takes `--config <path>`; the structs below are the schema.
//! Hex-encoded credentials are validated at load time so a bad subscriber
//! record fails startup (exit code 1) instead of the first authentication.

use std::net::{Ipv4Addr, SocketAddr};
use std::path::Path;

use serde::de::DeserializeOwned;
use serde::Deserialize;
use uuid::Uuid;

use crate::crypto::milenage;
use crate::error::{Error, Result};
use crate::types::{PlmnId, Snssai};
use crate::udm::store::AuthSubscription;

pub fn load<T: DeserializeOwned>(path: &Path) -> Result<T> {
    let text = std::fs::read_to_string(path)
        .map_err(|e| Error::InvalidInput(format!("read {}: {e}", path.display())))?;
    serde_yaml_ng::from_str(&text)
        .map_err(|e| Error::InvalidInput(format!("parse {}: {e}", path.display())))
}

fn default_log_level() -> String {
    "info".into()
}

fn default_heartbeat_timer() -> u64 {
    30
}

#[derive(Debug, Clone, Deserialize)]
pub struct NrfConfig {
    pub bind_addr: SocketAddr,
    #[serde(default = "default_sweep_interval")]
    pub sweep_interval_secs: u64,
    #[serde(default = "default_log_level")]
    pub log_level: String,
}

fn default_sweep_interval() -> u64 {
    30
}

/// One subscriber record; `opc` wins over `op` when both are present.
#[derive(Debug, Clone, Deserialize)]
pub struct SubscriberEntry {
    pub supi: String,
    pub k: String,
    #[serde(default)]
    pub opc: Option<String>,
    #[serde(default)]
    pub op: Option<String>,
    pub amf: String,
    /// Initial SQN, 12 hex digits.
    #[serde(default)]
    pub sqn: Option<String>,
}

impl SubscriberEntry {
    pub fn to_subscription(&self) -> Result<AuthSubscription> {
        let k: [u8; 16] = decode_hex("k", &self.k)?;
        let opc: [u8; 16] = match (&self.opc, &self.op) {
            (Some(opc), _) => decode_hex("opc", opc)?,
            (None, Some(op)) => {
                let op: [u8; 16] = decode_hex("op", op)?;
                milenage::compute_opc(&k, &op)?
            }
            (None, None) => {
                return Err(Error::InvalidInput(format!(
                    "subscriber {} has neither opc nor op",
                    self.supi
                )))
            }
        };
        let amf: [u8; 2] = decode_hex("amf", &self.amf)?;
        let sqn = match &self.sqn {
            Some(sqn) => {
                let bytes: [u8; 6] = decode_hex("sqn", sqn)?;
                let mut wide = [0u8; 8];
                wide[2..8].copy_from_slice(&bytes);
                u64::from_be_bytes(wide)
            }
            None => 0,
        };
        Ok(AuthSubscription {
            supi: self.supi.clone(),
            k,
            opc,
            amf,
            sqn,
        })
    }
}

fn decode_hex<const N: usize>(field: &str, value: &str) -> Result<[u8; N]> {
    hex::decode(value)
        .map_err(|_| Error::InvalidInput(format!("{field} is not valid hex")))?
        .try_into()
        .map_err(|_| Error::invalid_length(field, N, value.len() / 2))
}

#[derive(Debug, Clone, Deserialize)]
pub struct UdmConfig {
    pub bind_addr: SocketAddr,
    #[serde(default)]
    pub nrf_uri: Option<String>,
    #[serde(default)]
    pub nf_instance_id: Option<Uuid>,
    #[serde(default = "default_heartbeat_timer")]
    pub heartbeat_timer: u64,
    #[serde(default = "default_sqn_step")]
    pub sqn_step: u64,
    #[serde(default)]
    pub subscribers: Vec<SubscriberEntry>,
    #[serde(default = "default_log_level")]
    pub log_level: String,
}

fn default_sqn_step() -> u64 {
    1
}

#[derive(Debug, Clone, Deserialize)]
pub struct AusfConfig {
    pub bind_addr: SocketAddr,
    #[serde(default)]
    pub nrf_uri: Option<String>,
    /// Static fallback when NRF discovery is unavailable.
    pub udm_uri: String,
    #[serde(default)]
    pub nf_instance_id: Option<Uuid>,
    #[serde(default = "default_heartbeat_timer")]
    pub heartbeat_timer: u64,
    #[serde(default = "default_context_ttl")]
    pub context_ttl_secs: u64,
    /// Compare SHA-256(RAND || RES*) against HXRES* instead of the raw
    /// submitted value.
    #[serde(default)]
    pub hashed_res_star: bool,
    #[serde(default = "default_log_level")]
    pub log_level: String,
}

fn default_context_ttl() -> u64 {
    300
}

#[derive(Debug, Clone, Deserialize)]
pub struct AmfConfig {
    pub bind_addr: SocketAddr,
    #[serde(default)]
    pub nrf_uri: Option<String>,
    /// Static fallback when NRF discovery is unavailable.
    pub ausf_uri: String,
    #[serde(default)]
    pub nf_instance_id: Option<Uuid>,
    #[serde(default = "default_heartbeat_timer")]
    pub heartbeat_timer: u64,
    pub plmn: PlmnId,
    pub amf_region_id: String,
    pub amf_set_id: String,
    #[serde(default = "default_amf_pointer")]
    pub amf_pointer: String,
    pub tac: String,
    #[serde(default)]
    pub supported_nssai: Vec<Snssai>,
    #[serde(default)]
    pub default_nssai: Vec<Snssai>,
    #[serde(default = "default_integrity_order")]
    pub integrity_order: Vec<String>,
    #[serde(default = "default_ciphering_order")]
    pub ciphering_order: Vec<String>,
    #[serde(default = "default_t3512")]
    pub t3512_secs: u32,
    #[serde(default = "default_log_level")]
    pub log_level: String,
}

fn default_amf_pointer() -> String {
    "00".into()
}

fn default_integrity_order() -> Vec<String> {
    vec!["NIA2".into(), "NIA1".into(), "NIA0".into()]
}

fn default_ciphering_order() -> Vec<String> {
    vec!["NEA2".into(), "NEA1".into(), "NEA0".into()]
}

fn default_t3512() -> u32 {
    3600
}

#[derive(Debug, Clone, Deserialize)]
pub struct DnnPoolConfig {
    pub dnn: String,
    pub cidr: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct SmfConfig {
    pub bind_addr: SocketAddr,
    #[serde(default)]
    pub nrf_uri: Option<String>,
    #[serde(default)]
    pub nf_instance_id: Option<Uuid>,
    #[serde(default = "default_heartbeat_timer")]
    pub heartbeat_timer: u64,
    /// UPF N4 endpoint.
    pub upf_n4_addr: SocketAddr,
    /// Address used in the SMF's Node ID and F-SEID.
    pub node_addr: Ipv4Addr,
    pub dnn_pools: Vec<DnnPoolConfig>,
    #[serde(default = "default_ambr")]
    pub ambr_uplink_bps: u64,
    #[serde(default = "default_ambr")]
    pub ambr_downlink_bps: u64,
    #[serde(default = "default_log_level")]
    pub log_level: String,
}

fn default_ambr() -> u64 {
    100_000_000
}

#[derive(Debug, Clone, Deserialize)]
pub struct UpfConfig {
    /// N4 (PFCP) bind address, conventionally port 8805.
    pub n4_bind: SocketAddr,
    /// N3 (GTP-U) bind address, conventionally port 2152.
    pub n3_bind: SocketAddr,
    /// N6 socket toward the data network.
    pub n6_bind: SocketAddr,
    /// Where decapsulated uplink packets are sent.
    pub n6_peer: SocketAddr,
    /// N3 address advertised in allocated F-TEIDs.
    pub n3_addr: Ipv4Addr,
    #[serde(default = "default_upf_heartbeat")]
    pub heartbeat_interval_secs: u64,
    #[serde(default = "default_log_level")]
    pub log_level: String,
}

fn default_upf_heartbeat() -> u64 {
    30
}

#[cfg(test)]
mod tests {
    use super::*;
    use hex_literal::hex;

    #[test]
    fn subscriber_entry_with_opc() {
        let entry = SubscriberEntry {
            supi: "imsi-001010000000001".into(),
            k: "465b5ce8b199b49faa5f0a2ee238a6bc".into(),
            opc: Some("cd63cb71954a9f4e48a5994e37a02baf".into()),
            op: None,
            amf: "b9b9".into(),
            sqn: Some("000000000020".into()),
        };
        let sub = entry.to_subscription().unwrap();
        assert_eq!(sub.opc, hex!("cd63cb71954a9f4e48a5994e37a02baf"));
        assert_eq!(sub.sqn, 0x20);
    }

    #[test]
    fn subscriber_entry_derives_opc_from_op() {
        let entry = SubscriberEntry {
            supi: "imsi-001010000000001".into(),
            k: "465b5ce8b199b49faa5f0a2ee238a6bc".into(),
            opc: None,
            op: Some("cdc202d5123e20f62b6d676ac72cb318".into()),
            amf: "b9b9".into(),
            sqn: None,
        };
        let sub = entry.to_subscription().unwrap();
        assert_eq!(sub.opc, hex!("cd63cb71954a9f4e48a5994e37a02baf"));
        assert_eq!(sub.sqn, 0);
    }

    #[test]
    fn subscriber_entry_without_keys_fails() {
        let entry = SubscriberEntry {
            supi: "imsi-001010000000001".into(),
            k: "465b5ce8b199b49faa5f0a2ee238a6bc".into(),
            opc: None,
            op: None,
            amf: "b9b9".into(),
            sqn: None,
        };
        assert!(entry.to_subscription().is_err());
    }

    #[test]
    fn smf_config_parses_from_yaml() {
        let yaml = r#"
bind_addr: "127.0.0.1:7003"
upf_n4_addr: "127.0.0.1:8805"
node_addr: "127.0.0.1"
dnn_pools:
  - dnn: internet
    cidr: "10.60.0.0/16"
"#;
        let config: SmfConfig = serde_yaml_ng::from_str(yaml).unwrap();
        assert_eq!(config.dnn_pools.len(), 1);
        assert_eq!(config.ambr_uplink_bps, 100_000_000);
        assert_eq!(config.heartbeat_timer, 30);
    }
}
