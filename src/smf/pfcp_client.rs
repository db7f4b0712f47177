//! PFCP (N4) client toward the UPF.
//!
//! One UDP socket per client. A reader task owns `recv` and routes
//! datagrams: responses resolve the pending request with the matching
//! sequence number; heartbeat requests from the UPF are answered inline.
//! Requests retry on timeout with exponential backoff. Per-SEID ordering is
//! the caller's concern (the session service serializes per session).

use std::collections::HashMap;
use std::net::{Ipv4Addr, SocketAddr};
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Arc;
use std::time::{Duration, SystemTime};

use parking_lot::Mutex;
use rand::Rng;
use tokio::net::UdpSocket;
use tokio::sync::oneshot;
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

use crate::error::{Error, Result};
use crate::pfcp::ie::{Fteid, NodeId};
use crate::pfcp::message::{
    AssociationSetupRequest, HeartbeatResponse, SessionDeletionRequest,
    SessionEstablishmentRequest,
};
use crate::pfcp::{parse, Msg};

const RESPONSE_TIMEOUT: Duration = Duration::from_secs(2);
const RETRY_BUDGET: u32 = 3;
const BACKOFF_BASE: Duration = Duration::from_millis(200);

type Pending = Arc<Mutex<HashMap<u32, oneshot::Sender<Msg>>>>;

pub struct PfcpClient {
    socket: Arc<UdpSocket>,
    upf_addr: SocketAddr,
    node_addr: Ipv4Addr,
    sequence: AtomicU32,
    pending: Pending,
    started_at: SystemTime,
}

impl PfcpClient {
    /// Binds an ephemeral socket and starts the reader task.
    pub async fn connect(
        upf_addr: SocketAddr,
        node_addr: Ipv4Addr,
        cancel: CancellationToken,
    ) -> Result<Self> {
        let socket = UdpSocket::bind(("0.0.0.0", 0))
            .await
            .map_err(|e| Error::Unavailable(format!("bind PFCP client socket: {e}")))?;
        let socket = Arc::new(socket);
        let pending: Pending = Arc::new(Mutex::new(HashMap::new()));
        spawn_reader(
            socket.clone(),
            pending.clone(),
            SystemTime::now(),
            cancel,
        );
        Ok(PfcpClient {
            socket,
            upf_addr,
            node_addr,
            sequence: AtomicU32::new(1),
            pending,
            started_at: SystemTime::now(),
        })
    }

    pub fn node_id(&self) -> NodeId {
        NodeId::Ipv4(self.node_addr)
    }

    pub fn node_addr(&self) -> Ipv4Addr {
        self.node_addr
    }

    fn next_sequence(&self) -> u32 {
        self.sequence.fetch_add(1, Ordering::Relaxed) & 0x00ff_ffff
    }

    /// Association Setup; must succeed before any session operation.
    pub async fn associate(&self) -> Result<()> {
        let sequence = self.next_sequence();
        let request =
            AssociationSetupRequest::new(sequence, self.node_id(), self.started_at).marshal();
        match self.request(request, sequence).await? {
            Msg::AssociationSetupResponse(resp) if resp.cause.value.is_accepted() => Ok(()),
            Msg::AssociationSetupResponse(resp) => Err(Error::PfcpFailure(format!(
                "association rejected: {:?}",
                resp.cause.value
            ))),
            other => Err(Error::Protocol(format!(
                "unexpected reply to association setup: {}",
                other.msg_name()
            ))),
        }
    }

    /// Session Establishment; returns the UPF-allocated F-TEID.
    pub async fn establish_session(
        &self,
        mut request: SessionEstablishmentRequest,
    ) -> Result<Fteid> {
        let sequence = self.next_sequence();
        request.sequence = sequence;
        match self.request(request.marshal(), sequence).await? {
            Msg::SessionEstablishmentResponse(resp) => {
                if !resp.cause.value.is_accepted() {
                    return Err(Error::PfcpFailure(format!(
                        "session establishment rejected: {:?}",
                        resp.cause.value
                    )));
                }
                resp.local_f_teid().copied().ok_or_else(|| {
                    Error::Protocol("accepted establishment without F-TEID".into())
                })
            }
            other => Err(Error::Protocol(format!(
                "unexpected reply to session establishment: {}",
                other.msg_name()
            ))),
        }
    }

    /// Session Deletion; the UPF side is best-effort for the SMF, so a
    /// missing context is reported as success to the caller's cleanup path.
    pub async fn delete_session(&self, seid: u64) -> Result<()> {
        let sequence = self.next_sequence();
        let request = SessionDeletionRequest::new(seid, sequence).marshal();
        match self.request(request, sequence).await? {
            Msg::SessionDeletionResponse(_) => Ok(()),
            other => Err(Error::Protocol(format!(
                "unexpected reply to session deletion: {}",
                other.msg_name()
            ))),
        }
    }

    /// Sends and awaits the response with the same sequence, retrying on
    /// timeout up to the budget (200 ms doubling backoff, 20% jitter).
    async fn request(&self, datagram: Vec<u8>, sequence: u32) -> Result<Msg> {
        let mut attempt = 0u32;
        loop {
            let (tx, rx) = oneshot::channel();
            self.pending.lock().insert(sequence, tx);

            self.socket
                .send_to(&datagram, self.upf_addr)
                .await
                .map_err(|e| Error::Unavailable(format!("PFCP send: {e}")))?;

            match tokio::time::timeout(RESPONSE_TIMEOUT, rx).await {
                Ok(Ok(msg)) => return Ok(msg),
                Ok(Err(_)) => return Err(Error::Internal("PFCP reader task gone".into())),
                Err(_) => {
                    self.pending.lock().remove(&sequence);
                    if attempt >= RETRY_BUDGET {
                        return Err(Error::Timeout(RESPONSE_TIMEOUT));
                    }
                    let backoff = BACKOFF_BASE * 2u32.saturating_pow(attempt);
                    let jitter = rand::thread_rng().gen_range(0.8..=1.2);
                    tokio::time::sleep(backoff.mul_f64(jitter)).await;
                    attempt += 1;
                    debug!(sequence, attempt, "retrying PFCP request");
                }
            }
        }
    }
}

fn spawn_reader(
    socket: Arc<UdpSocket>,
    pending: Pending,
    started_at: SystemTime,
    cancel: CancellationToken,
) {
    tokio::spawn(async move {
        let mut buf = vec![0u8; 4096];
        loop {
            let (len, src) = tokio::select! {
                _ = cancel.cancelled() => break,
                recv = socket.recv_from(&mut buf) => match recv {
                    Ok(pair) => pair,
                    Err(err) => {
                        warn!(error = %err, "PFCP client socket error");
                        break;
                    }
                },
            };

            match parse(&buf[..len]) {
                // The UPF heartbeats its association peer on this socket.
                Ok(Msg::HeartbeatRequest(req)) => {
                    let reply = HeartbeatResponse::new(req.sequence, started_at).marshal();
                    if let Err(err) = socket.send_to(&reply, src).await {
                        warn!(error = %err, "failed to answer UPF heartbeat");
                    }
                }
                Ok(msg) => {
                    let sequence = msg.sequence();
                    if let Some(tx) = pending.lock().remove(&sequence) {
                        let _ = tx.send(msg);
                    } else {
                        debug!(sequence, "PFCP response with no pending request");
                    }
                }
                Err(err) => {
                    debug!(%src, error = %err, "dropping malformed PFCP datagram");
                }
            }
        }
    });
}
