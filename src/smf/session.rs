//! PDU session lifecycle and PFCP orchestration.

use std::collections::HashMap;
use std::net::Ipv4Addr;
use std::sync::Arc;

use parking_lot::{Mutex, RwLock};
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::error::{Error, Result};
use crate::pfcp::ie::apply_action::ApplyAction;
use crate::pfcp::ie::create_far::CreateFar;
use crate::pfcp::ie::create_pdr::CreatePdr;
use crate::pfcp::ie::create_qer::CreateQer;
use crate::pfcp::ie::destination_interface::DestinationInterface;
use crate::pfcp::ie::f_teid::Fteid;
use crate::pfcp::ie::far_id::FarId;
use crate::pfcp::ie::forwarding_parameters::ForwardingParameters;
use crate::pfcp::ie::fseid::Fseid;
use crate::pfcp::ie::mbr::Mbr;
use crate::pfcp::ie::network_instance::NetworkInstance;
use crate::pfcp::ie::outer_header_creation::OuterHeaderCreation;
use crate::pfcp::ie::pdi::Pdi;
use crate::pfcp::ie::pdr_id::PdrId;
use crate::pfcp::ie::precedence::Precedence;
use crate::pfcp::ie::qer_id::QerId;
use crate::pfcp::ie::qfi::Qfi;
use crate::pfcp::ie::ue_ip_address::UeIpAddress;
use crate::pfcp::message::SessionEstablishmentRequestBuilder;
use crate::smf::ip_pool::IpPool;
use crate::smf::pfcp_client::PfcpClient;
use crate::types::{validate_supi, Snssai};

pub const PDU_SESSION_ID_MIN: u8 = 1;
pub const PDU_SESSION_ID_MAX: u8 = 15;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PduSessionState {
    Inactive,
    ActivePending,
    Active,
    Modifying,
    Releasing,
    Released,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PduType {
    #[serde(rename = "IPV4")]
    Ipv4,
    #[serde(rename = "IPV6")]
    Ipv6,
    #[serde(rename = "IPV4V6")]
    Ipv4v6,
    #[serde(rename = "ETHERNET")]
    Ethernet,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QosFlow {
    pub qfi: u8,
    pub five_qi: u8,
    pub priority: u8,
}

/// Default flow installed with every session.
pub const DEFAULT_QOS_FLOW: QosFlow = QosFlow {
    qfi: 1,
    five_qi: 9,
    priority: 10,
};

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PduSession {
    pub supi: String,
    pub pdu_session_id: u8,
    pub dnn: String,
    pub s_nssai: Snssai,
    pub pdu_type: PduType,
    pub ssc_mode: u8,
    pub state: PduSessionState,
    pub seid: u64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ue_ip: Option<Ipv4Addr>,
    pub ambr_uplink_bps: u64,
    pub ambr_downlink_bps: u64,
    pub qos_flows: Vec<QosFlow>,
    pub gnb_n3_addr: Ipv4Addr,
    pub gnb_teid_uplink: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub upf_n3_addr: Option<Ipv4Addr>,
    /// Single TEID per session: the UPF-allocated uplink TEID doubles as
    /// the downlink binding.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub upf_teid_downlink: Option<u32>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateSessionRequest {
    pub supi: String,
    pub pdu_session_id: u8,
    pub dnn: String,
    pub s_nssai: Snssai,
    pub pdu_type: PduType,
    #[serde(default = "default_ssc_mode")]
    pub ssc_mode: u8,
    pub gnb_n3_addr: Ipv4Addr,
    pub gnb_teid_uplink: u32,
}

fn default_ssc_mode() -> u8 {
    1
}

type SessionKey = (String, u8);

pub struct SmfService {
    sessions: RwLock<HashMap<SessionKey, PduSession>>,
    /// Per-(SUPI, id) async locks: operations on one session serialize,
    /// different sessions proceed in parallel.
    op_locks: Mutex<HashMap<SessionKey, Arc<tokio::sync::Mutex<()>>>>,
    pools: Mutex<HashMap<String, IpPool>>,
    pfcp: Arc<PfcpClient>,
    ambr_uplink_bps: u64,
    ambr_downlink_bps: u64,
}

impl SmfService {
    pub fn new(
        pfcp: Arc<PfcpClient>,
        pools: HashMap<String, IpPool>,
        ambr_uplink_bps: u64,
        ambr_downlink_bps: u64,
    ) -> Self {
        SmfService {
            sessions: RwLock::new(HashMap::new()),
            op_locks: Mutex::new(HashMap::new()),
            pools: Mutex::new(pools),
            pfcp,
            ambr_uplink_bps,
            ambr_downlink_bps,
        }
    }

    fn op_lock(&self, key: &SessionKey) -> Arc<tokio::sync::Mutex<()>> {
        self.op_locks
            .lock()
            .entry(key.clone())
            .or_default()
            .clone()
    }

    pub fn get_session(&self, supi: &str, pdu_session_id: u8) -> Option<PduSession> {
        self.sessions
            .read()
            .get(&(supi.to_string(), pdu_session_id))
            .cloned()
    }

    pub fn session_count(&self) -> usize {
        self.sessions.read().len()
    }

    pub async fn create_session(&self, req: CreateSessionRequest) -> Result<PduSession> {
        validate_supi(&req.supi)?;
        if !(PDU_SESSION_ID_MIN..=PDU_SESSION_ID_MAX).contains(&req.pdu_session_id) {
            return Err(Error::InvalidInput(format!(
                "PDU session id {} outside 1..15",
                req.pdu_session_id
            )));
        }

        let key = (req.supi.clone(), req.pdu_session_id);
        let lock = self.op_lock(&key);
        let _guard = lock.lock().await;

        if self.sessions.read().contains_key(&key) {
            return Err(Error::Conflict(format!(
                "session ({}, {}) already exists",
                req.supi, req.pdu_session_id
            )));
        }

        let ue_ip = {
            let mut pools = self.pools.lock();
            let pool = pools
                .get_mut(&req.dnn)
                .ok_or_else(|| Error::NotFound(format!("IP pool for DNN {:?}", req.dnn)))?;
            pool.allocate()?
        };

        let seid = deterministic_seid(&req.supi, req.pdu_session_id);
        let mut session = PduSession {
            supi: req.supi.clone(),
            pdu_session_id: req.pdu_session_id,
            dnn: req.dnn.clone(),
            s_nssai: req.s_nssai.clone(),
            pdu_type: req.pdu_type,
            ssc_mode: req.ssc_mode,
            state: PduSessionState::Inactive,
            seid,
            ue_ip: Some(ue_ip),
            ambr_uplink_bps: self.ambr_uplink_bps,
            ambr_downlink_bps: self.ambr_downlink_bps,
            qos_flows: vec![DEFAULT_QOS_FLOW],
            gnb_n3_addr: req.gnb_n3_addr,
            gnb_teid_uplink: req.gnb_teid_uplink,
            upf_n3_addr: None,
            upf_teid_downlink: None,
        };

        session.state = PduSessionState::ActivePending;
        let establishment = self.build_establishment(&session, ue_ip);
        match self.pfcp.establish_session(establishment).await {
            Ok(fteid) => {
                session.upf_teid_downlink = Some(fteid.teid);
                session.upf_n3_addr = fteid.ipv4_address;
                session.state = PduSessionState::Active;
                info!(
                    supi = %session.supi,
                    pdu_session_id = session.pdu_session_id,
                    seid = format_args!("{seid:#x}"),
                    %ue_ip,
                    upf_teid = fteid.teid,
                    "PDU session active"
                );
                self.sessions.write().insert(key, session.clone());
                Ok(session)
            }
            Err(err) => {
                // The SMF owns the IP either way; roll the allocation back.
                self.release_ip(&req.dnn, ue_ip);
                match err {
                    Error::Timeout(d) => Err(Error::Timeout(d)),
                    other => Err(Error::PfcpFailure(other.to_string())),
                }
            }
        }
    }

    pub async fn release_session(
        &self,
        supi: &str,
        pdu_session_id: u8,
        cause: &str,
    ) -> Result<()> {
        let key = (supi.to_string(), pdu_session_id);
        let lock = self.op_lock(&key);
        let _guard = lock.lock().await;

        let mut session = {
            let mut sessions = self.sessions.write();
            let session = sessions
                .get_mut(&key)
                .ok_or_else(|| Error::NotFound(format!("session ({supi}, {pdu_session_id})")))?;
            session.state = PduSessionState::Releasing;
            session.clone()
        };

        // UPF cleanup is best-effort; the SMF stays authoritative for the
        // IP either way.
        if let Err(err) = self.pfcp.delete_session(session.seid).await {
            warn!(
                supi = %supi,
                seid = format_args!("{:#x}", session.seid),
                error = %err,
                "PFCP session deletion failed; releasing resources anyway"
            );
        }

        if let Some(ue_ip) = session.ue_ip.take() {
            self.release_ip(&session.dnn, ue_ip);
        }
        session.state = PduSessionState::Released;
        self.sessions.write().remove(&key);
        self.op_locks.lock().remove(&key);
        info!(supi = %supi, pdu_session_id, cause, "PDU session released");
        Ok(())
    }

    fn release_ip(&self, dnn: &str, ue_ip: Ipv4Addr) {
        if let Some(pool) = self.pools.lock().get_mut(dnn) {
            pool.release(ue_ip);
        }
    }

    /// The standard rule set: uplink decap PDR toward the core, downlink
    /// PDR with GTP-U encap back to the gNB, one QER carrying the session
    /// AMBR.
    fn build_establishment(
        &self,
        session: &PduSession,
        ue_ip: Ipv4Addr,
    ) -> crate::pfcp::message::SessionEstablishmentRequest {
        SessionEstablishmentRequestBuilder::new(session.seid, 0)
            .node_id(self.pfcp.node_id())
            .fseid(Fseid::new(session.seid, Some(self.pfcp.node_addr())))
            .create_pdr(
                CreatePdr::new(
                    PdrId::new(1),
                    Precedence::new(255),
                    Pdi::uplink_access()
                        .with_f_teid(Fteid::new(
                            session.gnb_teid_uplink,
                            Some(session.gnb_n3_addr),
                        ))
                        .with_ue_ip(UeIpAddress::new(ue_ip)),
                )
                .with_outer_header_removal()
                .with_far_id(FarId::new(1))
                .with_qer_id(QerId::new(1)),
            )
            .create_pdr(
                CreatePdr::new(
                    PdrId::new(2),
                    Precedence::new(100),
                    Pdi::downlink_core().with_ue_ip(UeIpAddress::new(ue_ip)),
                )
                .with_far_id(FarId::new(2))
                .with_qer_id(QerId::new(1)),
            )
            .create_far(
                CreateFar::new(FarId::new(1), ApplyAction::FORW).with_forwarding_parameters(
                    ForwardingParameters::new(DestinationInterface::Core)
                        .with_network_instance(NetworkInstance::new(session.dnn.clone())),
                ),
            )
            .create_far(
                CreateFar::new(FarId::new(2), ApplyAction::FORW).with_forwarding_parameters(
                    ForwardingParameters::new(DestinationInterface::Access)
                        .with_outer_header_creation(OuterHeaderCreation::gtpu_udp_ipv4(
                            session.gnb_teid_uplink,
                            session.gnb_n3_addr,
                        )),
                ),
            )
            .create_qer(
                CreateQer::new(QerId::new(1))
                    .with_qfi(Qfi::new(DEFAULT_QOS_FLOW.qfi))
                    .with_mbr(Mbr::new(
                        session.ambr_uplink_bps,
                        session.ambr_downlink_bps,
                    )),
            )
            .build()
            .expect("establishment builder carries all mandatory IEs")
    }
}

/// FNV-1a over the SUPI, shifted to leave room for the session id: retries
/// for the same (SUPI, id) always yield the same SEID.
pub fn deterministic_seid(supi: &str, pdu_session_id: u8) -> u64 {
    const FNV_OFFSET: u64 = 0xcbf2_9ce4_8422_2325;
    const FNV_PRIME: u64 = 0x0000_0100_0000_01b3;
    let mut hash = FNV_OFFSET;
    for byte in supi.bytes() {
        hash ^= byte as u64;
        hash = hash.wrapping_mul(FNV_PRIME);
    }
    (hash << 8) | pdu_session_id as u64
}
