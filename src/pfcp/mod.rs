//! PFCP (N4) protocol: header, Information Elements, and messages.
//!
//! The codec covers the message set the SMF↔UPF interaction needs:
//! heartbeat, association setup, and session establishment / modification /
//! deletion. Unknown IEs inside known messages are skipped with a length
//! advance; unknown message types surface as [`Msg::Unknown`] so the server
//! can log and ignore them.

pub mod header;
pub mod ie;
pub mod message;

pub use header::Header;

use crate::error::Result;
use message::{
    AssociationSetupRequest, AssociationSetupResponse, HeartbeatRequest, HeartbeatResponse,
    SessionDeletionRequest, SessionDeletionResponse, SessionEstablishmentRequest,
    SessionEstablishmentResponse, SessionModificationRequest, SessionModificationResponse,
};

/// PFCP message type octet values (3GPP TS 29.244 §7.3).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum MsgType {
    HeartbeatRequest = 1,
    HeartbeatResponse = 2,
    AssociationSetupRequest = 5,
    AssociationSetupResponse = 6,
    SessionEstablishmentRequest = 50,
    SessionEstablishmentResponse = 51,
    SessionModificationRequest = 52,
    SessionModificationResponse = 53,
    SessionDeletionRequest = 54,
    SessionDeletionResponse = 55,
    Unknown,
}

impl From<u8> for MsgType {
    fn from(v: u8) -> Self {
        match v {
            1 => MsgType::HeartbeatRequest,
            2 => MsgType::HeartbeatResponse,
            5 => MsgType::AssociationSetupRequest,
            6 => MsgType::AssociationSetupResponse,
            50 => MsgType::SessionEstablishmentRequest,
            51 => MsgType::SessionEstablishmentResponse,
            52 => MsgType::SessionModificationRequest,
            53 => MsgType::SessionModificationResponse,
            54 => MsgType::SessionDeletionRequest,
            55 => MsgType::SessionDeletionResponse,
            _ => MsgType::Unknown,
        }
    }
}

/// A parsed PFCP message.
///
/// One variant per supported type; [`Msg::Unknown`] carries the raw type
/// octet so callers can log it before dropping the packet.
#[derive(Debug, Clone, PartialEq)]
pub enum Msg {
    HeartbeatRequest(HeartbeatRequest),
    HeartbeatResponse(HeartbeatResponse),
    AssociationSetupRequest(AssociationSetupRequest),
    AssociationSetupResponse(AssociationSetupResponse),
    SessionEstablishmentRequest(SessionEstablishmentRequest),
    SessionEstablishmentResponse(SessionEstablishmentResponse),
    SessionModificationRequest(SessionModificationRequest),
    SessionModificationResponse(SessionModificationResponse),
    SessionDeletionRequest(SessionDeletionRequest),
    SessionDeletionResponse(SessionDeletionResponse),
    Unknown { msg_type: u8, sequence: u32 },
}

impl Msg {
    pub fn msg_name(&self) -> &'static str {
        match self {
            Msg::HeartbeatRequest(_) => "Heartbeat Request",
            Msg::HeartbeatResponse(_) => "Heartbeat Response",
            Msg::AssociationSetupRequest(_) => "Association Setup Request",
            Msg::AssociationSetupResponse(_) => "Association Setup Response",
            Msg::SessionEstablishmentRequest(_) => "Session Establishment Request",
            Msg::SessionEstablishmentResponse(_) => "Session Establishment Response",
            Msg::SessionModificationRequest(_) => "Session Modification Request",
            Msg::SessionModificationResponse(_) => "Session Modification Response",
            Msg::SessionDeletionRequest(_) => "Session Deletion Request",
            Msg::SessionDeletionResponse(_) => "Session Deletion Response",
            Msg::Unknown { .. } => "Unknown",
        }
    }

    pub fn sequence(&self) -> u32 {
        match self {
            Msg::HeartbeatRequest(m) => m.sequence,
            Msg::HeartbeatResponse(m) => m.sequence,
            Msg::AssociationSetupRequest(m) => m.sequence,
            Msg::AssociationSetupResponse(m) => m.sequence,
            Msg::SessionEstablishmentRequest(m) => m.sequence,
            Msg::SessionEstablishmentResponse(m) => m.sequence,
            Msg::SessionModificationRequest(m) => m.sequence,
            Msg::SessionModificationResponse(m) => m.sequence,
            Msg::SessionDeletionRequest(m) => m.sequence,
            Msg::SessionDeletionResponse(m) => m.sequence,
            Msg::Unknown { sequence, .. } => *sequence,
        }
    }

    pub fn seid(&self) -> Option<u64> {
        match self {
            Msg::SessionEstablishmentRequest(m) => Some(m.seid),
            Msg::SessionEstablishmentResponse(m) => Some(m.seid),
            Msg::SessionModificationRequest(m) => Some(m.seid),
            Msg::SessionModificationResponse(m) => Some(m.seid),
            Msg::SessionDeletionRequest(m) => Some(m.seid),
            Msg::SessionDeletionResponse(m) => Some(m.seid),
            _ => None,
        }
    }
}

/// Parses a datagram into a typed message.
pub fn parse(data: &[u8]) -> Result<Msg> {
    let header = Header::unmarshal(data)?;
    match header.message_type {
        MsgType::HeartbeatRequest => Ok(Msg::HeartbeatRequest(HeartbeatRequest::unmarshal(data)?)),
        MsgType::HeartbeatResponse => {
            Ok(Msg::HeartbeatResponse(HeartbeatResponse::unmarshal(data)?))
        }
        MsgType::AssociationSetupRequest => Ok(Msg::AssociationSetupRequest(
            AssociationSetupRequest::unmarshal(data)?,
        )),
        MsgType::AssociationSetupResponse => Ok(Msg::AssociationSetupResponse(
            AssociationSetupResponse::unmarshal(data)?,
        )),
        MsgType::SessionEstablishmentRequest => Ok(Msg::SessionEstablishmentRequest(
            SessionEstablishmentRequest::unmarshal(data)?,
        )),
        MsgType::SessionEstablishmentResponse => Ok(Msg::SessionEstablishmentResponse(
            SessionEstablishmentResponse::unmarshal(data)?,
        )),
        MsgType::SessionModificationRequest => Ok(Msg::SessionModificationRequest(
            SessionModificationRequest::unmarshal(data)?,
        )),
        MsgType::SessionModificationResponse => Ok(Msg::SessionModificationResponse(
            SessionModificationResponse::unmarshal(data)?,
        )),
        MsgType::SessionDeletionRequest => Ok(Msg::SessionDeletionRequest(
            SessionDeletionRequest::unmarshal(data)?,
        )),
        MsgType::SessionDeletionResponse => Ok(Msg::SessionDeletionResponse(
            SessionDeletionResponse::unmarshal(data)?,
        )),
        MsgType::Unknown => Ok(Msg::Unknown {
            msg_type: data[1],
            sequence: header.sequence_number,
        }),
    }
}
