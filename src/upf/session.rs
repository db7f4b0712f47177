//! UPF session table and rule evaluation.
//!
//! Sessions are keyed by SEID with side indices by local TEID and UE IP for
//! O(1) lookup in both packet directions. Rule lists are small; PDRs stay
//! sorted by descending precedence and matching is a linear first-hit walk.

use std::collections::{HashMap, VecDeque};
use std::net::Ipv4Addr;
use std::time::Instant;

use parking_lot::{Mutex, RwLock};

use crate::error::{Error, Result};
use crate::pfcp::ie::apply_action::ApplyAction;
use crate::pfcp::ie::create_far::CreateFar;
use crate::pfcp::ie::create_pdr::CreatePdr;
use crate::pfcp::ie::create_qer::CreateQer;
use crate::pfcp::ie::destination_interface::DestinationInterface;
use crate::pfcp::ie::gate_status::Gate;
use crate::pfcp::ie::source_interface::SourceInterface;
use crate::pfcp::message::{SessionEstablishmentRequest, SessionModificationRequest};
use crate::upf::teid::TeidAllocator;

/// CREATED to MODIFIED to DELETED; deletion removes the entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    Created,
    Modified,
}

/// Decoded Packet Detection Rule.
#[derive(Debug, Clone)]
pub struct Pdr {
    pub pdr_id: u16,
    pub precedence: u32,
    pub source_interface: SourceInterface,
    pub teid: Option<u32>,
    pub ue_ip: Option<Ipv4Addr>,
    pub outer_header_removal: bool,
    pub far_id: Option<u32>,
    pub qer_id: Option<u32>,
}

impl Pdr {
    pub fn from_create(create: &CreatePdr) -> Self {
        Pdr {
            pdr_id: create.pdr_id.0,
            precedence: create.precedence.0,
            source_interface: create.pdi.source_interface,
            teid: create.pdi.f_teid.map(|f| f.teid),
            ue_ip: create.pdi.ue_ip_address.map(|u| u.ipv4_address),
            outer_header_removal: create.outer_header_removal.is_some(),
            far_id: create.far_id.map(|f| f.0),
            qer_id: create.qer_id.map(|q| q.0),
        }
    }

    /// PDI match: source interface always, TEID and UE IP only when the
    /// rule specifies them.
    pub fn matches(
        &self,
        source: SourceInterface,
        teid: Option<u32>,
        ue_ip: Option<Ipv4Addr>,
    ) -> bool {
        if self.source_interface != source {
            return false;
        }
        if let Some(rule_teid) = self.teid {
            if teid != Some(rule_teid) {
                return false;
            }
        }
        if let Some(rule_ip) = self.ue_ip {
            if ue_ip != Some(rule_ip) {
                return false;
            }
        }
        true
    }
}

/// Decoded Forwarding Action Rule.
#[derive(Debug, Clone)]
pub struct Far {
    pub far_id: u32,
    pub apply_action: ApplyAction,
    pub destination: Option<DestinationInterface>,
    /// GTP-U encap target when forwarding toward the access side.
    pub outer_header_creation: Option<(u32, Ipv4Addr)>,
}

impl Far {
    pub fn from_create(create: &CreateFar) -> Self {
        let params = create.forwarding_parameters.as_ref();
        Far {
            far_id: create.far_id.0,
            apply_action: create.apply_action,
            destination: params.map(|p| p.destination_interface),
            outer_header_creation: params
                .and_then(|p| p.outer_header_creation)
                .map(|ohc| (ohc.teid, ohc.ipv4_address)),
        }
    }
}

/// Byte token bucket: rate = MBR in bytes/second, burst = rate / 8.
#[derive(Debug, Clone)]
pub struct TokenBucket {
    rate: f64,
    burst: f64,
    tokens: f64,
    refilled_at: Instant,
}

impl TokenBucket {
    pub fn new(rate_bytes_per_sec: f64) -> Self {
        let burst = rate_bytes_per_sec / 8.0;
        TokenBucket {
            rate: rate_bytes_per_sec,
            burst,
            tokens: burst,
            refilled_at: Instant::now(),
        }
    }

    pub fn allow(&mut self, bytes: usize, now: Instant) -> bool {
        let elapsed = now.duration_since(self.refilled_at).as_secs_f64();
        self.tokens = (self.tokens + elapsed * self.rate).min(self.burst);
        self.refilled_at = now;
        if self.tokens >= bytes as f64 {
            self.tokens -= bytes as f64;
            true
        } else {
            false
        }
    }
}

/// Decoded QoS Enforcement Rule with live bucket state.
#[derive(Debug, Clone)]
pub struct Qer {
    pub qer_id: u32,
    pub uplink_open: bool,
    pub downlink_open: bool,
    pub uplink_bucket: Option<TokenBucket>,
    pub downlink_bucket: Option<TokenBucket>,
}

impl Qer {
    pub fn from_create(create: &CreateQer) -> Self {
        // MBR arrives in bits/second; buckets meter bytes.
        let bucket = |bps: u64| {
            if bps == 0 {
                None
            } else {
                Some(TokenBucket::new(bps as f64 / 8.0))
            }
        };
        Qer {
            qer_id: create.qer_id.0,
            uplink_open: create.gate_status.uplink == Gate::Open,
            downlink_open: create.gate_status.downlink == Gate::Open,
            uplink_bucket: create.mbr.and_then(|m| bucket(m.uplink_bps)),
            downlink_bucket: create.mbr.and_then(|m| bucket(m.downlink_bps)),
        }
    }
}

/// Bounded downlink buffer, oldest dropped on overflow.
pub const BUFFER_CAP_DEFAULT: usize = 64;

#[derive(Debug)]
pub struct UpfSession {
    pub seid: u64,
    pub state: SessionState,
    /// UPF-allocated N3 tunnel endpoint.
    pub local_teid: u32,
    pub ue_ip: Option<Ipv4Addr>,
    pub dnn: Option<String>,
    pub pdrs: Vec<Pdr>,
    pub fars: HashMap<u32, Far>,
    pub qers: HashMap<u32, Qer>,
    pub buffer: VecDeque<Vec<u8>>,
    pub buffer_cap: usize,
    pub last_activity: Instant,
}

impl UpfSession {
    /// Highest-precedence PDR whose PDI matches.
    pub fn match_pdr(
        &self,
        source: SourceInterface,
        teid: Option<u32>,
        ue_ip: Option<Ipv4Addr>,
    ) -> Option<&Pdr> {
        self.pdrs.iter().find(|pdr| pdr.matches(source, teid, ue_ip))
    }

    pub fn far(&self, far_id: u32) -> Option<&Far> {
        self.fars.get(&far_id)
    }

    pub fn buffer_packet(&mut self, packet: Vec<u8>) {
        if self.buffer.len() >= self.buffer_cap {
            self.buffer.pop_front();
        }
        self.buffer.push_back(packet);
    }

    fn sort_pdrs(&mut self) {
        self.pdrs.sort_by(|a, b| b.precedence.cmp(&a.precedence));
    }

    fn apply_creates(
        &mut self,
        pdrs: &[CreatePdr],
        fars: &[CreateFar],
        qers: &[CreateQer],
    ) {
        for create in fars {
            let far = Far::from_create(create);
            self.fars.insert(far.far_id, far);
        }
        for create in qers {
            let qer = Qer::from_create(create);
            self.qers.insert(qer.qer_id, qer);
        }
        for create in pdrs {
            let mut pdr = Pdr::from_create(create);
            if pdr.ue_ip.is_some() {
                self.ue_ip = pdr.ue_ip;
            }
            // Access-side matching is on the locally allocated F-TEID; the
            // signalled one identifies the gNB endpoint, not this node.
            if pdr.source_interface == SourceInterface::Access && pdr.teid.is_some() {
                pdr.teid = Some(self.local_teid);
            }
            self.pdrs.retain(|p| p.pdr_id != pdr.pdr_id);
            self.pdrs.push(pdr);
        }
        self.sort_pdrs();
    }

    /// Every PDR must reference a FAR that exists in this session.
    fn validate_rule_refs(&self) -> Result<()> {
        for pdr in &self.pdrs {
            if let Some(far_id) = pdr.far_id {
                if !self.fars.contains_key(&far_id) {
                    return Err(Error::Protocol(format!(
                        "PDR {} references missing FAR {far_id}",
                        pdr.pdr_id
                    )));
                }
            }
        }
        Ok(())
    }
}

/// SEID-keyed session table with TEID and UE-IP side indices.
pub struct SessionTable {
    sessions: RwLock<HashMap<u64, UpfSession>>,
    by_teid: RwLock<HashMap<u32, u64>>,
    by_ue_ip: RwLock<HashMap<Ipv4Addr, u64>>,
    teids: Mutex<TeidAllocator>,
    buffer_cap: usize,
}

impl SessionTable {
    pub fn new() -> Self {
        SessionTable::with_buffer_cap(BUFFER_CAP_DEFAULT)
    }

    pub fn with_buffer_cap(buffer_cap: usize) -> Self {
        SessionTable {
            sessions: RwLock::new(HashMap::new()),
            by_teid: RwLock::new(HashMap::new()),
            by_ue_ip: RwLock::new(HashMap::new()),
            teids: Mutex::new(TeidAllocator::new()),
            buffer_cap,
        }
    }

    /// Creates (or, for a duplicate SEID, replaces) a session and returns
    /// the allocated local TEID.
    pub fn establish(&self, req: &SessionEstablishmentRequest) -> Result<u32> {
        // Duplicate SEID acts as a replacement, releasing prior resources.
        self.delete(req.seid).ok();

        let local_teid = self.teids.lock().allocate()?;
        let mut session = UpfSession {
            seid: req.seid,
            state: SessionState::Created,
            local_teid,
            ue_ip: None,
            dnn: req
                .create_fars
                .iter()
                .filter_map(|far| {
                    far.forwarding_parameters
                        .as_ref()
                        .and_then(|p| p.network_instance.as_ref())
                })
                .map(|ni| ni.0.clone())
                .next(),
            pdrs: Vec::new(),
            fars: HashMap::new(),
            qers: HashMap::new(),
            buffer: VecDeque::new(),
            buffer_cap: self.buffer_cap,
            last_activity: Instant::now(),
        };
        session.apply_creates(&req.create_pdrs, &req.create_fars, &req.create_qers);
        if let Err(err) = session.validate_rule_refs() {
            self.teids.lock().release(local_teid);
            return Err(err);
        }

        self.by_teid.write().insert(local_teid, req.seid);
        if let Some(ue_ip) = session.ue_ip {
            self.by_ue_ip.write().insert(ue_ip, req.seid);
        }
        self.sessions.write().insert(req.seid, session);
        Ok(local_teid)
    }

    /// Merges rule changes into an existing session.
    pub fn modify(&self, req: &SessionModificationRequest) -> Result<()> {
        let mut sessions = self.sessions.write();
        let session = sessions
            .get_mut(&req.seid)
            .ok_or_else(|| Error::NotFound(format!("PFCP session {:#x}", req.seid)))?;

        for rm in &req.remove_pdrs {
            session.pdrs.retain(|p| p.pdr_id != rm.pdr_id.0);
        }
        for rm in &req.remove_fars {
            session.fars.remove(&rm.far_id.0);
        }
        session.apply_creates(&req.create_pdrs, &req.create_fars, &req.create_qers);
        session.validate_rule_refs()?;
        session.state = SessionState::Modified;
        session.last_activity = Instant::now();

        if let Some(ue_ip) = session.ue_ip {
            self.by_ue_ip.write().insert(ue_ip, req.seid);
        }
        Ok(())
    }

    /// Drops a session and releases its TEID.
    pub fn delete(&self, seid: u64) -> Result<()> {
        let session = self
            .sessions
            .write()
            .remove(&seid)
            .ok_or_else(|| Error::NotFound(format!("PFCP session {seid:#x}")))?;
        self.by_teid.write().remove(&session.local_teid);
        if let Some(ue_ip) = session.ue_ip {
            self.by_ue_ip.write().remove(&ue_ip);
        }
        self.teids.lock().release(session.local_teid);
        Ok(())
    }

    pub fn with_session_by_teid<T>(
        &self,
        teid: u32,
        f: impl FnOnce(&mut UpfSession) -> T,
    ) -> Option<T> {
        let seid = *self.by_teid.read().get(&teid)?;
        let mut sessions = self.sessions.write();
        sessions.get_mut(&seid).map(f)
    }

    pub fn with_session_by_ue_ip<T>(
        &self,
        ue_ip: Ipv4Addr,
        f: impl FnOnce(&mut UpfSession) -> T,
    ) -> Option<T> {
        let seid = *self.by_ue_ip.read().get(&ue_ip)?;
        let mut sessions = self.sessions.write();
        sessions.get_mut(&seid).map(f)
    }

    pub fn get_state(&self, seid: u64) -> Option<SessionState> {
        self.sessions.read().get(&seid).map(|s| s.state)
    }

    pub fn len(&self) -> usize {
        self.sessions.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.sessions.read().is_empty()
    }

    /// Live TEIDs, for the uniqueness invariant.
    pub fn teids_in_use(&self) -> Vec<u32> {
        self.by_teid.read().keys().copied().collect()
    }
}

impl Default for SessionTable {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pfcp::ie::f_teid::Fteid;
    use crate::pfcp::ie::far_id::FarId;
    use crate::pfcp::ie::forwarding_parameters::ForwardingParameters;
    use crate::pfcp::ie::network_instance::NetworkInstance;
    use crate::pfcp::ie::outer_header_creation::OuterHeaderCreation;
    use crate::pfcp::ie::pdi::Pdi;
    use crate::pfcp::ie::pdr_id::PdrId;
    use crate::pfcp::ie::precedence::Precedence;
    use crate::pfcp::ie::ue_ip_address::UeIpAddress;
    use crate::pfcp::ie::{Fseid, NodeId};
    use crate::pfcp::message::SessionEstablishmentRequestBuilder;

    fn establishment(seid: u64) -> SessionEstablishmentRequest {
        SessionEstablishmentRequestBuilder::new(seid, 1)
            .node_id(NodeId::Ipv4("10.20.0.1".parse().unwrap()))
            .fseid(Fseid::new(seid, Some("10.20.0.1".parse().unwrap())))
            .create_pdr(
                CreatePdr::new(
                    PdrId::new(1),
                    Precedence::new(255),
                    Pdi::uplink_access()
                        .with_f_teid(Fteid::new(0x100, Some("10.10.0.1".parse().unwrap())))
                        .with_ue_ip(UeIpAddress::new("10.60.0.1".parse().unwrap())),
                )
                .with_outer_header_removal()
                .with_far_id(FarId::new(1)),
            )
            .create_pdr(
                CreatePdr::new(
                    PdrId::new(2),
                    Precedence::new(100),
                    Pdi::downlink_core().with_ue_ip(UeIpAddress::new("10.60.0.1".parse().unwrap())),
                )
                .with_far_id(FarId::new(2)),
            )
            .create_far(
                CreateFar::new(FarId::new(1), ApplyAction::FORW).with_forwarding_parameters(
                    ForwardingParameters::new(DestinationInterface::Core)
                        .with_network_instance(NetworkInstance::new("internet")),
                ),
            )
            .create_far(
                CreateFar::new(FarId::new(2), ApplyAction::FORW).with_forwarding_parameters(
                    ForwardingParameters::new(DestinationInterface::Access)
                        .with_outer_header_creation(OuterHeaderCreation::gtpu_udp_ipv4(
                            0x100,
                            "10.10.0.1".parse().unwrap(),
                        )),
                ),
            )
            .build()
            .unwrap()
    }

    #[test]
    fn establish_allocates_teid_and_indexes() {
        let table = SessionTable::new();
        let teid = table.establish(&establishment(0xab01)).unwrap();
        assert_eq!(teid, 0x3e9);
        assert_eq!(table.len(), 1);
        assert_eq!(table.get_state(0xab01), Some(SessionState::Created));

        assert!(table
            .with_session_by_teid(teid, |s| s.seid)
            .is_some_and(|seid| seid == 0xab01));
        assert!(table
            .with_session_by_ue_ip("10.60.0.1".parse().unwrap(), |s| s.seid)
            .is_some_and(|seid| seid == 0xab01));
    }

    #[test]
    fn duplicate_seid_replaces_the_session() {
        let table = SessionTable::new();
        let first = table.establish(&establishment(0xab01)).unwrap();
        let second = table.establish(&establishment(0xab01)).unwrap();
        assert_ne!(first, second);
        assert_eq!(table.len(), 1);
        // The first TEID no longer resolves.
        assert!(table.with_session_by_teid(first, |_| ()).is_none());
    }

    #[test]
    fn pdr_matching_honours_precedence_and_pdi() {
        let table = SessionTable::new();
        let teid = table.establish(&establishment(0xab01)).unwrap();
        table
            .with_session_by_teid(teid, |session| {
                // Uplink matching is on the allocated local TEID.
                let uplink = session
                    .match_pdr(SourceInterface::Access, Some(teid), None)
                    .expect("uplink PDR");
                assert_eq!(uplink.pdr_id, 1);
                assert!(uplink.outer_header_removal);

                let downlink = session
                    .match_pdr(
                        SourceInterface::Core,
                        None,
                        Some("10.60.0.1".parse().unwrap()),
                    )
                    .expect("downlink PDR");
                assert_eq!(downlink.pdr_id, 2);

                // Wrong TEID: the uplink PDR's F-TEID filter rejects.
                assert!(session
                    .match_pdr(SourceInterface::Access, Some(0x999), None)
                    .is_none());
            })
            .unwrap();
    }

    #[test]
    fn pdr_referencing_missing_far_is_rejected() {
        let table = SessionTable::new();
        let mut req = establishment(0xab01);
        req.create_fars.clear();
        assert!(table.establish(&req).is_err());
        // TEID released on the failure path.
        assert!(table.teids_in_use().is_empty());
    }

    #[test]
    fn modify_merges_and_removes_rules() {
        let table = SessionTable::new();
        table.establish(&establishment(0xab01)).unwrap();

        let req = crate::pfcp::message::SessionModificationRequestBuilder::new(0xab01, 2)
            .remove_pdr(crate::pfcp::ie::remove_pdr::RemovePdr::new(PdrId::new(2)))
            .create_far(CreateFar::new(FarId::new(3), ApplyAction::DROP))
            .build();
        table.modify(&req).unwrap();
        assert_eq!(table.get_state(0xab01), Some(SessionState::Modified));

        let table_teid = table.teids_in_use()[0];
        table
            .with_session_by_teid(table_teid, |session| {
                assert!(session.pdrs.iter().all(|p| p.pdr_id != 2));
                assert!(session.fars.contains_key(&3));
            })
            .unwrap();
    }

    #[test]
    fn delete_releases_everything() {
        let table = SessionTable::new();
        let teid = table.establish(&establishment(0xab01)).unwrap();
        table.delete(0xab01).unwrap();
        assert!(table.is_empty());
        assert!(table.teids_in_use().is_empty());
        assert!(table.with_session_by_teid(teid, |_| ()).is_none());
        assert!(table.delete(0xab01).is_err());
    }

    #[test]
    fn teids_are_unique_across_sessions() {
        let table = SessionTable::new();
        for seid in 0..20u64 {
            table.establish(&establishment(0x1000 + seid)).unwrap();
        }
        let mut teids = table.teids_in_use();
        teids.sort_unstable();
        teids.dedup();
        assert_eq!(teids.len(), 20);
    }

    #[test]
    fn buffer_drops_oldest_on_overflow() {
        let table = SessionTable::with_buffer_cap(2);
        let teid = table.establish(&establishment(0xab01)).unwrap();
        table
            .with_session_by_teid(teid, |session| {
                session.buffer_packet(vec![1]);
                session.buffer_packet(vec![2]);
                session.buffer_packet(vec![3]);
                assert_eq!(session.buffer.len(), 2);
                assert_eq!(session.buffer.front().unwrap(), &vec![2]);
            })
            .unwrap();
    }

    #[test]
    fn token_bucket_enforces_rate() {
        let mut bucket = TokenBucket::new(8000.0); // 8 kB/s, burst 1 kB
        let t0 = Instant::now();
        assert!(bucket.allow(1000, t0));
        assert!(!bucket.allow(1000, t0));
        // After 125 ms, 1000 bytes have refilled.
        assert!(bucket.allow(1000, t0 + std::time::Duration::from_millis(125)));
    }
}
