//! GTP-U (N3) forwarder.
//!
//! Uplink: decapsulate G-PDUs arriving from the gNB, evaluate the session's
//! PDR/FAR/QER rules, and pass the inner packet toward N6. Downlink: match
//! raw IP packets on the UE address and encapsulate toward the gNB. The
//! rule evaluation is synchronous and socket-free so it can be exercised
//! directly by tests; the async loops below only move bytes.

use std::net::{Ipv4Addr, SocketAddr};
use std::sync::atomic::Ordering;
use std::sync::Arc;
use std::time::Instant;

use tokio::net::UdpSocket;
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

use crate::gtpu::{self, GtpuHeader, GTPU_PORT, MSG_ECHO_REQUEST, MSG_G_PDU};
use crate::pfcp::ie::apply_action::ApplyAction;
use crate::pfcp::ie::source_interface::SourceInterface;
use crate::upf::session::{SessionTable, UpfSession};
use crate::upf::UpfStats;

/// Outcome of processing one packet.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Verdict {
    /// Send this datagram back to the sender (Echo Response).
    Reply(Vec<u8>),
    /// Send the payload out the N6 side.
    ToCore(Vec<u8>),
    /// Send the datagram to a GTP-U peer on the access side.
    ToAccess { datagram: Vec<u8>, peer: SocketAddr },
    Buffered,
    Dropped,
}

#[derive(Clone)]
pub struct ForwarderCore {
    pub sessions: Arc<SessionTable>,
    pub stats: Arc<UpfStats>,
}

impl ForwarderCore {
    pub fn new(sessions: Arc<SessionTable>, stats: Arc<UpfStats>) -> Self {
        ForwarderCore { sessions, stats }
    }

    /// Uplink path: datagram received on N3.
    pub fn handle_n3(&self, datagram: &[u8]) -> Verdict {
        let header = match GtpuHeader::unmarshal(datagram) {
            Ok(header) => header,
            Err(err) => {
                self.stats.malformed.fetch_add(1, Ordering::Relaxed);
                debug!(error = %err, "dropping malformed GTP-U datagram");
                return Verdict::Dropped;
            }
        };

        if header.message_type == MSG_ECHO_REQUEST {
            return Verdict::Reply(gtpu::echo_response(&header));
        }
        if header.message_type != MSG_G_PDU {
            debug!(msg_type = header.message_type, "ignoring GTP-U message");
            return Verdict::Dropped;
        }

        let inner = header.payload(datagram);
        let src_ip = ipv4_source(inner);
        let now = Instant::now();

        let verdict = self.sessions.with_session_by_teid(header.teid, |session| {
            evaluate(
                session,
                SourceInterface::Access,
                Some(header.teid),
                src_ip,
                inner,
                datagram,
                now,
                &self.stats,
            )
        });

        match verdict {
            Some(v) => {
                if matches!(v, Verdict::ToCore(_)) {
                    self.stats.forwarded_uplink.fetch_add(1, Ordering::Relaxed);
                }
                v
            }
            None => {
                self.stats.dropped.fetch_add(1, Ordering::Relaxed);
                debug!(teid = header.teid, "no session for TEID");
                Verdict::Dropped
            }
        }
    }

    /// Downlink path: raw IP packet received on N6.
    pub fn handle_n6(&self, packet: &[u8]) -> Verdict {
        let Some(dst_ip) = ipv4_destination(packet) else {
            self.stats.malformed.fetch_add(1, Ordering::Relaxed);
            return Verdict::Dropped;
        };
        let now = Instant::now();

        let verdict = self.sessions.with_session_by_ue_ip(dst_ip, |session| {
            evaluate(
                session,
                SourceInterface::Core,
                None,
                Some(dst_ip),
                packet,
                packet,
                now,
                &self.stats,
            )
        });

        match verdict {
            Some(v) => {
                if matches!(v, Verdict::ToAccess { .. }) {
                    self.stats.forwarded_downlink.fetch_add(1, Ordering::Relaxed);
                }
                v
            }
            None => {
                self.stats.dropped.fetch_add(1, Ordering::Relaxed);
                debug!(%dst_ip, "no session for UE IP");
                Verdict::Dropped
            }
        }
    }
}

/// PDR, FAR, then QER evaluation, shared by both directions.
#[allow(clippy::too_many_arguments)]
fn evaluate(
    session: &mut UpfSession,
    source: SourceInterface,
    teid: Option<u32>,
    ue_ip: Option<Ipv4Addr>,
    payload: &[u8],
    datagram: &[u8],
    now: Instant,
    stats: &UpfStats,
) -> Verdict {
    session.last_activity = now;

    let Some(pdr) = session.match_pdr(source, teid, ue_ip) else {
        stats.dropped.fetch_add(1, Ordering::Relaxed);
        return Verdict::Dropped;
    };
    let pdr = pdr.clone();

    let Some(far) = pdr.far_id.and_then(|id| session.far(id)).cloned() else {
        stats.dropped.fetch_add(1, Ordering::Relaxed);
        return Verdict::Dropped;
    };

    // The forwarded bytes are what QER enforcement meters.
    let forwarded: &[u8] = if pdr.outer_header_removal {
        payload
    } else {
        datagram
    };

    if let Some(qer_id) = pdr.qer_id {
        if let Some(qer) = session.qers.get_mut(&qer_id) {
            let (open, bucket) = match source {
                SourceInterface::Access => (qer.uplink_open, qer.uplink_bucket.as_mut()),
                SourceInterface::Core => (qer.downlink_open, qer.downlink_bucket.as_mut()),
            };
            if !open {
                stats.dropped.fetch_add(1, Ordering::Relaxed);
                return Verdict::Dropped;
            }
            if let Some(bucket) = bucket {
                if !bucket.allow(forwarded.len(), now) {
                    stats.qos_violations.fetch_add(1, Ordering::Relaxed);
                    return Verdict::Dropped;
                }
            }
        }
    }

    if far.apply_action.contains(ApplyAction::DROP) {
        stats.dropped.fetch_add(1, Ordering::Relaxed);
        return Verdict::Dropped;
    }
    if far.apply_action.contains(ApplyAction::BUFF) {
        session.buffer_packet(forwarded.to_vec());
        stats.buffered.fetch_add(1, Ordering::Relaxed);
        return Verdict::Buffered;
    }
    if far.apply_action.contains(ApplyAction::FORW) {
        if let Some((out_teid, peer_addr)) = far.outer_header_creation {
            let datagram = gtpu::encapsulate(out_teid, forwarded);
            return Verdict::ToAccess {
                datagram,
                peer: SocketAddr::from((peer_addr, GTPU_PORT)),
            };
        }
        return Verdict::ToCore(forwarded.to_vec());
    }

    stats.dropped.fetch_add(1, Ordering::Relaxed);
    Verdict::Dropped
}

/// Source address of an IPv4 packet, if it looks like one.
fn ipv4_source(packet: &[u8]) -> Option<Ipv4Addr> {
    if packet.len() < 20 || packet[0] >> 4 != 4 {
        return None;
    }
    Some(Ipv4Addr::new(packet[12], packet[13], packet[14], packet[15]))
}

/// Destination address of an IPv4 packet, if it looks like one.
fn ipv4_destination(packet: &[u8]) -> Option<Ipv4Addr> {
    if packet.len() < 20 || packet[0] >> 4 != 4 {
        return None;
    }
    Some(Ipv4Addr::new(packet[16], packet[17], packet[18], packet[19]))
}

/// N3 receive loop: uplink G-PDUs and echo handling.
pub async fn run_n3(
    core: ForwarderCore,
    n3_socket: Arc<UdpSocket>,
    n6_socket: Arc<UdpSocket>,
    n6_peer: SocketAddr,
    cancel: CancellationToken,
) -> crate::Result<()> {
    let mut buf = vec![0u8; 9000];
    loop {
        tokio::select! {
            _ = cancel.cancelled() => return Ok(()),
            recv = n3_socket.recv_from(&mut buf) => {
                let (len, src) = recv.map_err(|e| crate::Error::Internal(format!("N3 recv: {e}")))?;
                match core.handle_n3(&buf[..len]) {
                    Verdict::Reply(datagram) => send(&n3_socket, &datagram, src).await,
                    Verdict::ToCore(packet) => send(&n6_socket, &packet, n6_peer).await,
                    Verdict::ToAccess { datagram, peer } => send(&n3_socket, &datagram, peer).await,
                    Verdict::Buffered | Verdict::Dropped => {}
                }
            }
        }
    }
}

/// N6 receive loop: downlink IP packets toward UEs.
pub async fn run_n6(
    core: ForwarderCore,
    n3_socket: Arc<UdpSocket>,
    n6_socket: Arc<UdpSocket>,
    cancel: CancellationToken,
) -> crate::Result<()> {
    let mut buf = vec![0u8; 9000];
    loop {
        tokio::select! {
            _ = cancel.cancelled() => return Ok(()),
            recv = n6_socket.recv_from(&mut buf) => {
                let (len, _) = recv.map_err(|e| crate::Error::Internal(format!("N6 recv: {e}")))?;
                match core.handle_n6(&buf[..len]) {
                    Verdict::ToAccess { datagram, peer } => send(&n3_socket, &datagram, peer).await,
                    // Downlink rules always encapsulate; anything else drops.
                    _ => {}
                }
            }
        }
    }
}

async fn send(socket: &UdpSocket, data: &[u8], to: SocketAddr) {
    if let Err(err) = socket.send_to(data, to).await {
        warn!(%to, error = %err, "forwarder send failed");
    }
}
