//! SMF: PDU session management.
//!
//! Session lifecycle (INACTIVE, ACTIVE_PENDING, ACTIVE, RELEASING),
//! per-DNN UE IP pools, and PFCP programming of the UPF.

pub mod handlers;
pub mod ip_pool;
pub mod pfcp_client;
pub mod session;

use std::sync::Arc;

use crate::smf::session::SmfService;

#[derive(Clone)]
pub struct SmfState {
    pub service: Arc<SmfService>,
}
