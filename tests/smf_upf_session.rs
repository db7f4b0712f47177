//! SMF ↔ UPF session lifecycle over real PFCP datagrams: establishment,
//! duplicate detection, release with IP reuse, and rollback on a dead UPF.

use std::collections::HashMap;
use std::net::{Ipv4Addr, SocketAddr};
use std::sync::Arc;

use rs_5gc::smf::ip_pool::IpPool;
use rs_5gc::smf::pfcp_client::PfcpClient;
use rs_5gc::smf::session::{
    deterministic_seid, CreateSessionRequest, PduSessionState, PduType, SmfService,
};
use rs_5gc::types::Snssai;
use rs_5gc::upf::{pfcp_server, UpfState};
use tokio::net::UdpSocket;
use tokio_util::sync::CancellationToken;

const SUPI: &str = "imsi-001010000000001";

async fn spawn_upf(cancel: CancellationToken) -> (UpfState, SocketAddr) {
    let socket = UdpSocket::bind("127.0.0.1:0").await.unwrap();
    let addr = socket.local_addr().unwrap();
    let state = UpfState::new("127.0.0.1".parse().unwrap());
    tokio::spawn(pfcp_server::run(state.clone(), Arc::new(socket), cancel));
    (state, addr)
}

async fn smf_against(upf_addr: SocketAddr, cancel: CancellationToken) -> SmfService {
    let pfcp = PfcpClient::connect(upf_addr, "127.0.0.1".parse().unwrap(), cancel)
        .await
        .unwrap();
    pfcp.associate().await.unwrap();
    let mut pools = HashMap::new();
    pools.insert("internet".to_string(), IpPool::new("10.60.0.0/16").unwrap());
    SmfService::new(Arc::new(pfcp), pools, 100_000_000, 200_000_000)
}

fn create_request(pdu_session_id: u8) -> CreateSessionRequest {
    CreateSessionRequest {
        supi: SUPI.into(),
        pdu_session_id,
        dnn: "internet".into(),
        s_nssai: Snssai::with_sd(1, "000001"),
        pdu_type: PduType::Ipv4,
        ssc_mode: 1,
        gnb_n3_addr: "10.10.0.1".parse().unwrap(),
        gnb_teid_uplink: 0x100,
    }
}

#[tokio::test]
async fn establishment_happy_path() {
    let cancel = CancellationToken::new();
    let (upf, upf_addr) = spawn_upf(cancel.clone()).await;
    let smf = smf_against(upf_addr, cancel.clone()).await;

    let session = smf.create_session(create_request(1)).await.unwrap();
    assert_eq!(session.state, PduSessionState::Active);
    assert_eq!(
        session.ue_ip,
        Some("10.60.0.1".parse::<Ipv4Addr>().unwrap())
    );
    assert_eq!(session.seid, deterministic_seid(SUPI, 1));
    assert_eq!(session.upf_teid_downlink, Some(0x3e9));
    assert_eq!(
        session.upf_n3_addr,
        Some("127.0.0.1".parse::<Ipv4Addr>().unwrap())
    );
    assert_eq!(session.qos_flows.len(), 1);
    assert_eq!(session.qos_flows[0].qfi, 1);

    // The UPF holds a session under the SMF's SEID.
    assert!(upf.sessions.get_state(session.seid).is_some());
    assert_eq!(upf.sessions.teids_in_use(), vec![0x3e9]);

    cancel.cancel();
}

#[tokio::test]
async fn duplicate_create_is_a_conflict() {
    let cancel = CancellationToken::new();
    let (_upf, upf_addr) = spawn_upf(cancel.clone()).await;
    let smf = smf_against(upf_addr, cancel.clone()).await;

    smf.create_session(create_request(1)).await.unwrap();
    let err = smf.create_session(create_request(1)).await.unwrap_err();
    assert_eq!(err.status(), 409);
    assert_eq!(smf.session_count(), 1);

    cancel.cancel();
}

#[tokio::test]
async fn invalid_pdu_session_ids_are_rejected() {
    let cancel = CancellationToken::new();
    let (_upf, upf_addr) = spawn_upf(cancel.clone()).await;
    let smf = smf_against(upf_addr, cancel.clone()).await;

    for id in [0u8, 16] {
        let err = smf.create_session(create_request(id)).await.unwrap_err();
        assert_eq!(err.status(), 400, "id {id}");
    }

    cancel.cancel();
}

#[tokio::test]
async fn release_returns_the_ip_and_clears_both_sides() {
    let cancel = CancellationToken::new();
    let (upf, upf_addr) = spawn_upf(cancel.clone()).await;
    let smf = smf_against(upf_addr, cancel.clone()).await;

    let session = smf.create_session(create_request(1)).await.unwrap();
    let first_ip = session.ue_ip.unwrap();

    smf.release_session(SUPI, 1, "REGULAR_DEACTIVATION")
        .await
        .unwrap();
    assert!(smf.get_session(SUPI, 1).is_none());
    assert!(upf.sessions.is_empty());
    assert!(upf.sessions.teids_in_use().is_empty());

    // The released address is the next one handed out.
    let again = smf.create_session(create_request(1)).await.unwrap();
    assert_eq!(again.ue_ip, Some(first_ip));

    cancel.cancel();
}

#[tokio::test]
async fn teids_stay_unique_across_sessions() {
    let cancel = CancellationToken::new();
    let (upf, upf_addr) = spawn_upf(cancel.clone()).await;
    let smf = smf_against(upf_addr, cancel.clone()).await;

    for id in 1..=5u8 {
        smf.create_session(create_request(id)).await.unwrap();
    }
    let mut teids = upf.sessions.teids_in_use();
    teids.sort_unstable();
    let mut deduped = teids.clone();
    deduped.dedup();
    assert_eq!(teids.len(), 5);
    assert_eq!(teids, deduped);

    cancel.cancel();
}

#[tokio::test(start_paused = true)]
async fn transport_failure_rolls_back_the_ip() {
    let cancel = CancellationToken::new();
    // Nothing listens here: every attempt times out.
    let dead: SocketAddr = "127.0.0.1:9".parse().unwrap();
    let pfcp = PfcpClient::connect(dead, "127.0.0.1".parse().unwrap(), cancel.clone())
        .await
        .unwrap();
    let mut pools = HashMap::new();
    pools.insert("internet".to_string(), IpPool::new("10.60.0.0/16").unwrap());
    let smf = SmfService::new(Arc::new(pfcp), pools, 100_000_000, 200_000_000);

    let err = smf.create_session(create_request(1)).await.unwrap_err();
    assert!(err.status() == 500 || err.status() == 504, "got {err}");
    assert!(smf.get_session(SUPI, 1).is_none());

    // The address went back to the pool: the next create starts from it.
    let err2 = smf.create_session(create_request(2)).await.unwrap_err();
    assert!(err2.status() == 500 || err2.status() == 504);
    assert_eq!(smf.session_count(), 0);

    cancel.cancel();
}
