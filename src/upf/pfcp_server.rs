//! PFCP (N4) server.
//!
//! Stateless dispatch on the parsed message: heartbeats are answered with
//! the node's recovery timestamp, association setup records the SMF peer,
//! and the session messages drive the session table. Unknown types are
//! logged and ignored; malformed datagrams only bump a counter.

use std::net::SocketAddr;
use std::sync::atomic::Ordering;
use std::sync::Arc;
use std::time::Duration;

use tokio::net::UdpSocket;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::pfcp::ie::created_pdr::CreatedPdr;
use crate::pfcp::ie::f_teid::Fteid;
use crate::pfcp::ie::{CauseValue, NodeId};
use crate::pfcp::message::{
    AssociationSetupResponse, HeartbeatRequest, HeartbeatResponse, SessionDeletionResponse,
    SessionEstablishmentResponse, SessionModificationResponse,
};
use crate::pfcp::{parse, Msg};
use crate::upf::UpfState;

/// Default N4 heartbeat period toward the associated SMF.
pub const HEARTBEAT_INTERVAL: Duration = Duration::from_secs(30);

/// Handles one datagram, returning the response to send back, if any.
pub fn handle_datagram(state: &UpfState, data: &[u8], src: SocketAddr) -> Option<Vec<u8>> {
    let msg = match parse(data) {
        Ok(msg) => msg,
        Err(err) => {
            state.stats.malformed.fetch_add(1, Ordering::Relaxed);
            debug!(%src, error = %err, "dropping malformed PFCP datagram");
            return None;
        }
    };

    match msg {
        Msg::HeartbeatRequest(req) => {
            Some(HeartbeatResponse::new(req.sequence, state.started_at).marshal())
        }
        Msg::HeartbeatResponse(_) => {
            state.association.note_heartbeat_answered();
            None
        }
        Msg::AssociationSetupRequest(req) => {
            info!(%src, "PFCP association established");
            state.association.establish(src, req.node_id);
            Some(
                AssociationSetupResponse::new(
                    req.sequence,
                    NodeId::Ipv4(state.n3_addr),
                    CauseValue::RequestAccepted,
                    state.started_at,
                )
                .marshal(),
            )
        }
        Msg::SessionEstablishmentRequest(req) => {
            let first_pdr_id = req.create_pdrs.first().map(|p| p.pdr_id);
            let response = match state.sessions.establish(&req) {
                Ok(local_teid) => {
                    debug!(seid = format_args!("{:#x}", req.seid), teid = local_teid, "session established");
                    let created = first_pdr_id
                        .map(|pdr_id| {
                            CreatedPdr::new(
                                pdr_id,
                                Some(Fteid::new(local_teid, Some(state.n3_addr))),
                            )
                        })
                        .into_iter()
                        .collect();
                    SessionEstablishmentResponse::new(
                        req.seid,
                        req.sequence,
                        NodeId::Ipv4(state.n3_addr),
                        CauseValue::RequestAccepted,
                        created,
                    )
                }
                Err(err) => {
                    warn!(seid = format_args!("{:#x}", req.seid), error = %err, "session establishment rejected");
                    SessionEstablishmentResponse::new(
                        req.seid,
                        req.sequence,
                        NodeId::Ipv4(state.n3_addr),
                        CauseValue::RequestRejected,
                        vec![],
                    )
                }
            };
            Some(response.marshal())
        }
        Msg::SessionModificationRequest(req) => {
            let cause = match state.sessions.modify(&req) {
                Ok(()) => CauseValue::RequestAccepted,
                Err(crate::Error::NotFound(_)) => CauseValue::SessionContextNotFound,
                Err(err) => {
                    warn!(seid = format_args!("{:#x}", req.seid), error = %err, "session modification rejected");
                    CauseValue::RequestRejected
                }
            };
            Some(SessionModificationResponse::new(req.seid, req.sequence, cause).marshal())
        }
        Msg::SessionDeletionRequest(req) => {
            let cause = match state.sessions.delete(req.seid) {
                Ok(()) => CauseValue::RequestAccepted,
                Err(_) => CauseValue::SessionContextNotFound,
            };
            Some(SessionDeletionResponse::new(req.seid, req.sequence, cause).marshal())
        }
        Msg::Unknown { msg_type, .. } => {
            debug!(msg_type, %src, "ignoring unknown PFCP message type");
            None
        }
        // Responses the UPF never expects as a server.
        other => {
            debug!(name = other.msg_name(), %src, "ignoring unexpected PFCP message");
            None
        }
    }
}

/// Receive loop on the N4 socket.
pub async fn run(
    state: UpfState,
    socket: Arc<UdpSocket>,
    cancel: CancellationToken,
) -> crate::Result<()> {
    let mut buf = vec![0u8; 4096];
    loop {
        tokio::select! {
            _ = cancel.cancelled() => return Ok(()),
            recv = socket.recv_from(&mut buf) => {
                let (len, src) = recv.map_err(|e| crate::Error::Internal(format!("N4 recv: {e}")))?;
                if let Some(response) = handle_datagram(&state, &buf[..len], src) {
                    if let Err(err) = socket.send_to(&response, src).await {
                        warn!(%src, error = %err, "failed to send PFCP response");
                    }
                }
            }
        }
    }
}

/// Heartbeats the associated SMF; unanswered probes eventually mark the
/// association down (sessions stay).
pub fn spawn_heartbeat(
    state: UpfState,
    socket: Arc<UdpSocket>,
    interval: Duration,
    cancel: CancellationToken,
) {
    tokio::spawn(async move {
        let mut sequence: u32 = 1;
        let mut ticker = tokio::time::interval(interval);
        ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);
        loop {
            tokio::select! {
                _ = cancel.cancelled() => break,
                _ = ticker.tick() => {
                    let Some(peer) = state.association.peer() else { continue };
                    let request = HeartbeatRequest::new(sequence, state.started_at);
                    sequence = sequence.wrapping_add(1);
                    state.association.note_heartbeat_sent();
                    if let Err(err) = socket.send_to(&request.marshal(), peer).await {
                        warn!(%peer, error = %err, "failed to send PFCP heartbeat");
                    }
                }
            }
        }
    });
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pfcp::ie::apply_action::ApplyAction;
    use crate::pfcp::ie::create_far::CreateFar;
    use crate::pfcp::ie::create_pdr::CreatePdr;
    use crate::pfcp::ie::destination_interface::DestinationInterface;
    use crate::pfcp::ie::far_id::FarId;
    use crate::pfcp::ie::forwarding_parameters::ForwardingParameters;
    use crate::pfcp::ie::fseid::Fseid;
    use crate::pfcp::ie::pdi::Pdi;
    use crate::pfcp::ie::pdr_id::PdrId;
    use crate::pfcp::ie::precedence::Precedence;
    use crate::pfcp::message::{AssociationSetupRequest, SessionEstablishmentRequestBuilder};
    use std::time::SystemTime;

    fn state() -> UpfState {
        UpfState::new("10.30.0.2".parse().unwrap())
    }

    fn smf() -> SocketAddr {
        "10.20.0.1:8805".parse().unwrap()
    }

    #[test]
    fn heartbeat_request_gets_a_response() {
        let state = state();
        let req = HeartbeatRequest::new(9, SystemTime::now()).marshal();
        let resp = handle_datagram(&state, &req, smf()).expect("response");
        match parse(&resp).unwrap() {
            Msg::HeartbeatResponse(hb) => assert_eq!(hb.sequence, 9),
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn association_setup_records_peer() {
        let state = state();
        let req = AssociationSetupRequest::new(
            1,
            NodeId::Ipv4("10.20.0.1".parse().unwrap()),
            SystemTime::now(),
        )
        .marshal();
        let resp = handle_datagram(&state, &req, smf()).expect("response");
        match parse(&resp).unwrap() {
            Msg::AssociationSetupResponse(r) => assert!(r.cause.value.is_accepted()),
            other => panic!("unexpected {other:?}"),
        }
        assert_eq!(state.association.peer(), Some(smf()));
    }

    #[test]
    fn establishment_allocates_and_answers_with_fteid() {
        let state = state();
        let req = SessionEstablishmentRequestBuilder::new(0xab01, 3)
            .node_id(NodeId::Ipv4("10.20.0.1".parse().unwrap()))
            .fseid(Fseid::new(0xab01, Some("10.20.0.1".parse().unwrap())))
            .create_pdr(CreatePdr::new(
                PdrId::new(1),
                Precedence::new(255),
                Pdi::uplink_access(),
            ).with_far_id(FarId::new(1)))
            .create_far(CreateFar::new(FarId::new(1), ApplyAction::FORW)
                .with_forwarding_parameters(ForwardingParameters::new(DestinationInterface::Core)))
            .build()
            .unwrap()
            .marshal();

        let resp = handle_datagram(&state, &req, smf()).expect("response");
        match parse(&resp).unwrap() {
            Msg::SessionEstablishmentResponse(r) => {
                assert!(r.cause.value.is_accepted());
                let fteid = r.local_f_teid().expect("allocated F-TEID");
                assert_eq!(fteid.teid, 0x3e9);
                assert_eq!(fteid.ipv4_address, Some("10.30.0.2".parse().unwrap()));
            }
            other => panic!("unexpected {other:?}"),
        }
        assert_eq!(state.sessions.len(), 1);
    }

    #[test]
    fn deletion_of_unknown_session_reports_context_not_found() {
        let state = state();
        let req = crate::pfcp::message::SessionDeletionRequest::new(0x77, 4).marshal();
        let resp = handle_datagram(&state, &req, smf()).expect("response");
        match parse(&resp).unwrap() {
            Msg::SessionDeletionResponse(r) => {
                assert_eq!(r.cause.value, CauseValue::SessionContextNotFound)
            }
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn malformed_datagram_increments_counter() {
        let state = state();
        assert!(handle_datagram(&state, &[0xff, 0x00, 0x01], smf()).is_none());
        assert_eq!(state.stats.malformed.load(Ordering::Relaxed), 1);
    }

    #[test]
    fn unknown_message_type_is_ignored() {
        let state = state();
        // Valid header with message type 200.
        let mut buf = Vec::new();
        crate::pfcp::Header::new(crate::pfcp::MsgType::Unknown, 5).marshal_into(&mut buf, 0);
        buf[1] = 200;
        assert!(handle_datagram(&state, &buf, smf()).is_none());
        assert_eq!(state.stats.malformed.load(Ordering::Relaxed), 0);
    }
}
