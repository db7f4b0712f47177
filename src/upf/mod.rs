//! UPF: PFCP (N4) server and GTP-U (N3) forwarder.

pub mod association;
pub mod forwarder;
pub mod pfcp_server;
pub mod session;
pub mod teid;

use std::net::Ipv4Addr;
use std::sync::atomic::AtomicU64;
use std::sync::Arc;
use std::time::SystemTime;

use crate::upf::association::AssociationHandle;
use crate::upf::session::SessionTable;

/// Write-only counters; exporters outside the core read them.
#[derive(Debug, Default)]
pub struct UpfStats {
    pub malformed: AtomicU64,
    pub forwarded_uplink: AtomicU64,
    pub forwarded_downlink: AtomicU64,
    pub dropped: AtomicU64,
    pub buffered: AtomicU64,
    pub qos_violations: AtomicU64,
}

/// Shared state of one UPF instance.
#[derive(Clone)]
pub struct UpfState {
    pub sessions: Arc<SessionTable>,
    pub association: Arc<AssociationHandle>,
    pub stats: Arc<UpfStats>,
    /// N3 address advertised in allocated F-TEIDs.
    pub n3_addr: Ipv4Addr,
    pub started_at: SystemTime,
}

impl UpfState {
    pub fn new(n3_addr: Ipv4Addr) -> Self {
        UpfState {
            sessions: Arc::new(SessionTable::new()),
            association: Arc::new(AssociationHandle::default()),
            stats: Arc::new(UpfStats::default()),
            n3_addr,
            started_at: SystemTime::now(),
        }
    }
}
