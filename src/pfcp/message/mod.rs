//! PFCP messages.

pub mod association_setup_request;
pub mod association_setup_response;
pub mod heartbeat_request;
pub mod heartbeat_response;
pub mod session_deletion_request;
pub mod session_deletion_response;
pub mod session_establishment_request;
pub mod session_establishment_response;
pub mod session_modification_request;
pub mod session_modification_response;

pub use association_setup_request::AssociationSetupRequest;
pub use association_setup_response::AssociationSetupResponse;
pub use heartbeat_request::HeartbeatRequest;
pub use heartbeat_response::HeartbeatResponse;
pub use session_deletion_request::SessionDeletionRequest;
pub use session_deletion_response::SessionDeletionResponse;
pub use session_establishment_request::{
    SessionEstablishmentRequest, SessionEstablishmentRequestBuilder,
};
pub use session_establishment_response::SessionEstablishmentResponse;
pub use session_modification_request::{
    SessionModificationRequest, SessionModificationRequestBuilder,
};
pub use session_modification_response::SessionModificationResponse;
