//! 5G-AKA end to end: AMF → AUSF → UDM with in-process SBI servers, plus
//! the registration gating that rides on it.

use std::sync::Arc;
use std::time::Duration;

use axum::Router;
use hex_literal::hex;
use rs_5gc::amf::registration::{
    AmfPolicy, AmfService, RegistrationRequest, RegistrationResult,
};
use rs_5gc::ausf::handlers::AusfState;
use rs_5gc::ausf::{AusfService, Confirmation};
use rs_5gc::crypto::kdf;
use rs_5gc::crypto::milenage::Milenage;
use rs_5gc::types::{Guami, PlmnId, Snssai, Tai};
use rs_5gc::udm::store::{AuthSubscription, SubscriberStore};
use rs_5gc::udm::UdmState;
use rs_5gc::{ausf, udm};

const K: [u8; 16] = hex!("465b5ce8b199b49faa5f0a2ee238a6bc");
const OPC: [u8; 16] = hex!("cd63cb71954a9f4e48a5994e37a02baf");
const SUPI: &str = "imsi-001010000000001";
const SNN: &str = "5G:mnc001.mcc001.3gppnetwork.org";

async fn spawn_router(router: Router) -> String {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, router).await.unwrap();
    });
    format!("http://{addr}")
}

fn udm_state() -> UdmState {
    let store = SubscriberStore::default();
    store.insert(AuthSubscription {
        supi: SUPI.into(),
        k: K,
        opc: OPC,
        amf: hex!("b9b9"),
        sqn: 0x20,
    });
    UdmState::new(store, 1)
}

async fn spawn_udm() -> String {
    spawn_router(udm::handlers::router(udm_state())).await
}

async fn spawn_ausf(udm_base: String) -> (Arc<AusfService>, String) {
    let service = Arc::new(AusfService::new(udm_base, Duration::from_secs(300), false));
    let base = spawn_router(ausf::handlers::router(AusfState {
        service: service.clone(),
    }))
    .await;
    (service, base)
}

fn amf_policy() -> AmfPolicy {
    AmfPolicy {
        guami: Guami {
            plmn_id: PlmnId::new("001", "01"),
            amf_region_id: "01".into(),
            amf_set_id: "001".into(),
            amf_pointer: "00".into(),
        },
        tai: Tai {
            plmn_id: PlmnId::new("001", "01"),
            tac: "000001".into(),
        },
        supported_nssai: vec![Snssai::with_sd(1, "000001"), Snssai::new(2)],
        default_nssai: vec![Snssai::with_sd(1, "000001")],
        integrity_order: vec!["NIA2".into(), "NIA1".into(), "NIA0".into()],
        ciphering_order: vec!["NEA2".into(), "NEA1".into(), "NEA0".into()],
        t3512_secs: 3600,
    }
}

/// What the UE side would compute from the challenge. The reference
/// behaviour compares the submitted value directly against the stored
/// HXRES*, so that is what a passing confirmation submits.
fn expected_hxres_star(rand_hex: &str) -> String {
    let rand: [u8; 16] = hex::decode(rand_hex).unwrap().try_into().unwrap();
    let milenage = Milenage::new(&K, &OPC).unwrap();
    let (res, ck, ik, _ak) = milenage.f2345(&rand).unwrap();
    let res_star = kdf::derive_res_star(&ck, &ik, SNN, &rand, &res);
    hex::encode(kdf::derive_hxres_star(&rand, &res_star))
}

#[tokio::test]
async fn five_g_aka_round_trip() {
    let udm_base = spawn_udm().await;
    let (_ausf_service, ausf_base) = spawn_ausf(udm_base).await;
    let amf = AmfService::new(ausf_base, SNN.into(), amf_policy());

    let challenge = amf.initiate_auth(SUPI).await.unwrap();
    assert_eq!(challenge.rand.len(), 32);
    assert_eq!(challenge.autn.len(), 32);

    let result = amf
        .confirm_auth(SUPI, &expected_hxres_star(&challenge.rand))
        .await
        .unwrap();
    assert_eq!(result, RegistrationResult::Success);

    let ue = amf.ues().get(SUPI).unwrap();
    let security = ue.security.expect("security context installed");
    assert!(security.nas_security_established);
    assert_eq!(security.integrity_alg, "NIA2");
    assert_eq!(security.ciphering_alg, "NEA2");
    assert_ne!(security.kseaf, [0u8; 32]);
    assert_ne!(security.kamf, security.kseaf);
}

#[tokio::test]
async fn auth_context_is_consumed_exactly_once() {
    let udm_base = spawn_udm().await;
    let service = AusfService::new(udm_base, Duration::from_secs(300), false);

    let challenge = service.initiate(SUPI, SNN).await.unwrap();
    let res_star: [u8; 16] = hex::decode(expected_hxres_star(&hex::encode(challenge.rand)))
        .unwrap()
        .try_into()
        .unwrap();

    match service.confirm(&challenge.auth_ctx_id, &res_star).await {
        Ok(Confirmation::Success { supi, kseaf }) => {
            assert_eq!(supi, SUPI);
            assert_ne!(kseaf, [0u8; 32]);
        }
        other => panic!("expected success, got {other:?}"),
    }

    // Second confirmation with the same context id: context unknown.
    let err = service
        .confirm(&challenge.auth_ctx_id, &res_star)
        .await
        .unwrap_err();
    assert_eq!(err.status(), 404);
}

#[tokio::test]
async fn mismatched_res_star_fails_without_supi() {
    let udm_base = spawn_udm().await;
    let service = AusfService::new(udm_base, Duration::from_secs(300), false);

    let challenge = service.initiate(SUPI, SNN).await.unwrap();
    let result = service
        .confirm(&challenge.auth_ctx_id, &[0u8; 16])
        .await
        .unwrap();
    assert!(matches!(result, Confirmation::Failure));

    // Mismatch also consumed the context.
    assert_eq!(
        service
            .confirm(&challenge.auth_ctx_id, &[0u8; 16])
            .await
            .unwrap_err()
            .status(),
        404
    );
}

#[tokio::test]
async fn registration_is_gated_on_authentication() {
    let udm_base = spawn_udm().await;
    let (_ausf_service, ausf_base) = spawn_ausf(udm_base).await;
    let amf = AmfService::new(ausf_base, SNN.into(), amf_policy());

    // No prior authentication: documented failure reason.
    let refused = amf.register(
        "imsi-001010000000002",
        &RegistrationRequest {
            registration_type: Some("INITIAL".into()),
            requested_nssai: vec![],
        },
    );
    assert_eq!(refused.result, RegistrationResult::Failure);
    assert_eq!(refused.reason.as_deref(), Some("UE not authenticated"));

    // Authenticate, then register on the same SUPI.
    let challenge = amf.initiate_auth(SUPI).await.unwrap();
    amf.confirm_auth(SUPI, &expected_hxres_star(&challenge.rand))
        .await
        .unwrap();

    let accepted = amf.register(
        SUPI,
        &RegistrationRequest {
            registration_type: Some("INITIAL".into()),
            requested_nssai: vec![Snssai::with_sd(1, "000001")],
        },
    );
    assert_eq!(accepted.result, RegistrationResult::Success);
    assert!(accepted.guami.is_some());
    assert!(accepted.tai.is_some());
    assert_eq!(accepted.allowed_nssai, vec![Snssai::with_sd(1, "000001")]);
    assert_eq!(accepted.t3512_secs, Some(3600));
}

#[tokio::test]
async fn sqn_advances_across_authentications() {
    let state = udm_state();
    let before = state.vectors.store().get(SUPI).unwrap().sqn;

    let udm_base = spawn_router(udm::handlers::router(state.clone())).await;
    let service = AusfService::new(udm_base, Duration::from_secs(300), false);
    service.initiate(SUPI, SNN).await.unwrap();
    service.initiate(SUPI, SNN).await.unwrap();

    let after = state.vectors.store().get(SUPI).unwrap().sqn;
    assert_eq!(after, before + 2);
}
