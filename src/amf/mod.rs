//! AMF: UE registration.
//!
//! UE context store plus the security-gated registration state machine. The
//! HTTP surface under `/namf-reg/v1/` stands in for NGAP, which is outside
//! the core; it carries exactly the state-machine events of the
//! registration procedure.

pub mod context;
pub mod handlers;
pub mod registration;

use std::sync::Arc;

use crate::amf::registration::AmfService;

#[derive(Clone)]
pub struct AmfState {
    pub service: Arc<AmfService>,
}
