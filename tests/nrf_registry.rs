//! NRF registry scenarios: registration, heartbeat-driven liveness, and
//! discovery stability.

use chrono::{Duration as ChronoDuration, Utc};
use rs_5gc::nrf::matcher::DiscoveryQuery;
use rs_5gc::nrf::registry::Registry;
use rs_5gc::nrf::subscription::{NfSubscription, NotificationEvent};
use rs_5gc::types::{NfProfile, NfType};
use uuid::Uuid;

fn amf_profile(id: Uuid) -> NfProfile {
    let mut profile = NfProfile::new(id, NfType::Amf);
    profile.heartbeat_timer = 30;
    profile
}

#[test]
fn happy_path_register_heartbeat_expire() {
    let registry = Registry::with_in_memory_store();
    let id: Uuid = "00000000-0000-0000-0000-0000000000a1".parse().unwrap();
    registry.register(id, amf_profile(id)).unwrap();

    let query = DiscoveryQuery::for_type(NfType::Amf);
    assert_eq!(registry.discover(&query).len(), 1);

    // A heartbeat keeps the profile discoverable.
    registry.heartbeat(id).unwrap();
    assert_eq!(registry.discover(&query).len(), 1);

    // 31 seconds of silence: gone from discovery, then reaped by the
    // sweeper tick.
    let later = Utc::now() + ChronoDuration::seconds(31);
    assert!(registry.discover_at(&query, later).is_empty());
    let (removed, jobs) = registry.sweep_expired_at(later);
    assert_eq!(removed, vec![id]);
    assert!(jobs.is_empty()); // nobody subscribed
    assert!(registry.get(id).is_err());
}

#[test]
fn discovery_with_empty_filter_returns_all_registered() {
    let registry = Registry::with_in_memory_store();
    for _ in 0..3 {
        let id = Uuid::new_v4();
        registry.register(id, amf_profile(id)).unwrap();
    }
    let all = registry.discover(&DiscoveryQuery::default());
    assert_eq!(all.len(), 3);
}

#[test]
fn discovery_is_a_subset_of_the_matcher() {
    let registry = Registry::with_in_memory_store();
    let amf = Uuid::new_v4();
    registry.register(amf, amf_profile(amf)).unwrap();
    let smf = Uuid::new_v4();
    let mut smf_profile = NfProfile::new(smf, NfType::Smf);
    smf_profile.heartbeat_timer = 30;
    registry.register(smf, smf_profile).unwrap();

    let query = DiscoveryQuery::for_type(NfType::Amf);
    let results = registry.discover(&query);
    assert!(results.iter().all(|p| query.matches(p)));
    assert_eq!(results.len(), 1);
}

#[test]
fn discovery_order_is_stable_under_identical_input() {
    let registry = Registry::with_in_memory_store();
    for _ in 0..5 {
        let id = Uuid::new_v4();
        registry.register(id, amf_profile(id)).unwrap();
    }
    let query = DiscoveryQuery::for_type(NfType::Amf);
    let first: Vec<Uuid> = registry
        .discover(&query)
        .into_iter()
        .map(|p| p.nf_instance_id)
        .collect();
    for _ in 0..3 {
        let again: Vec<Uuid> = registry
            .discover(&query)
            .into_iter()
            .map(|p| p.nf_instance_id)
            .collect();
        assert_eq!(again, first);
    }
}

#[test]
fn deregistration_notifies_matching_subscribers() {
    let registry = Registry::with_in_memory_store();
    let id = Uuid::new_v4();
    registry.register(id, amf_profile(id)).unwrap();

    registry.subscribe(NfSubscription {
        subscription_id: None,
        callback_uri: "http://127.0.0.1:9/cb".into(),
        nf_instance_id: None,
        nf_type: Some(NfType::Amf),
        events: vec![NotificationEvent::NfDeregistered],
        validity_time: None,
    });

    let jobs = registry.deregister(id).unwrap();
    assert_eq!(jobs.len(), 1);
    assert_eq!(jobs[0].body.nf_instance_id, id);
    assert!(matches!(
        jobs[0].body.event,
        NotificationEvent::NfDeregistered
    ));
}

#[test]
fn expiry_sweep_emits_deregistered_jobs() {
    let registry = Registry::with_in_memory_store();
    let id = Uuid::new_v4();
    registry.register(id, amf_profile(id)).unwrap();
    registry.subscribe(NfSubscription {
        subscription_id: None,
        callback_uri: "http://127.0.0.1:9/cb".into(),
        nf_instance_id: Some(id),
        nf_type: None,
        events: vec![],
        validity_time: None,
    });

    let later = Utc::now() + ChronoDuration::seconds(31);
    let (_, jobs) = registry.sweep_expired_at(later);
    assert_eq!(jobs.len(), 1);
}

#[test]
fn heartbeat_on_unknown_id_is_404() {
    let registry = Registry::with_in_memory_store();
    assert_eq!(
        registry.heartbeat(Uuid::new_v4()).unwrap_err().status(),
        404
    );
}

#[test]
fn duplicate_registration_keeps_one_entry() {
    let registry = Registry::with_in_memory_store();
    let id = Uuid::new_v4();
    let (_, created_first, _) = registry.register(id, amf_profile(id)).unwrap();
    let (_, created_second, _) = registry.register(id, amf_profile(id)).unwrap();
    assert!(created_first);
    assert!(!created_second);
    assert_eq!(registry.discover(&DiscoveryQuery::default()).len(), 1);
}
