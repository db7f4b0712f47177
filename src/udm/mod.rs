//! UDM: authentication vector service.
//!
//! Owns the per-SUPI authentication subscriptions (permanent key, OPc, AMF
//! field, sequence number) and answers `generate-auth-data` requests by
//! running MILENAGE and the serving-network-bound KDFs. The subscriber
//! records load from config; a durable UDR is an external collaborator.

pub mod handlers;
pub mod store;
pub mod vectors;

use std::sync::Arc;

use crate::udm::store::SubscriberStore;
use crate::udm::vectors::VectorService;

#[derive(Clone)]
pub struct UdmState {
    pub vectors: Arc<VectorService>,
}

impl UdmState {
    pub fn new(store: SubscriberStore, sqn_step: u64) -> Self {
        UdmState {
            vectors: Arc::new(VectorService::new(Arc::new(store), sqn_step)),
        }
    }
}
