//! Information Elements for PFCP messages.
//!
//! Each IE lives in its own module with a typed struct, `marshal`/`unmarshal`
//! over its payload, and `to_ie` for TLV framing. Only the IEs the SMF↔UPF
//! exchange needs are implemented; unknown IEs in incoming messages are
//! skipped by the message parsers.

pub mod apply_action;
pub mod cause;
pub mod create_far;
pub mod create_pdr;
pub mod create_qer;
pub mod created_pdr;
pub mod destination_interface;
pub mod f_teid;
pub mod far_id;
pub mod forwarding_parameters;
pub mod fseid;
pub mod gate_status;
pub mod mbr;
pub mod network_instance;
pub mod node_id;
pub mod outer_header_creation;
pub mod outer_header_removal;
pub mod pdi;
pub mod pdr_id;
pub mod precedence;
pub mod qer_id;
pub mod qfi;
pub mod recovery_time_stamp;
pub mod remove_far;
pub mod remove_pdr;
pub mod source_interface;
pub mod ue_ip_address;

pub use cause::{Cause, CauseValue};
pub use f_teid::Fteid;
pub use fseid::Fseid;
pub use node_id::NodeId;
pub use recovery_time_stamp::RecoveryTimeStamp;

use crate::error::{Error, Result};

/// IE type values (3GPP TS 29.244 §8.1.2).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u16)]
pub enum IeType {
    CreatePdr = 1,
    Pdi = 2,
    CreateFar = 3,
    ForwardingParameters = 4,
    CreateQer = 7,
    CreatedPdr = 8,
    RemovePdr = 15,
    RemoveFar = 16,
    Cause = 19,
    SourceInterface = 20,
    Fteid = 21,
    NetworkInstance = 22,
    GateStatus = 25,
    Mbr = 26,
    Precedence = 29,
    DestinationInterface = 42,
    ApplyAction = 44,
    PdrId = 56,
    Fseid = 57,
    NodeId = 60,
    OuterHeaderCreation = 84,
    UeIpAddress = 93,
    OuterHeaderRemoval = 95,
    RecoveryTimeStamp = 96,
    FarId = 108,
    QerId = 109,
    Qfi = 124,
    Unknown = 0,
}

impl From<u16> for IeType {
    fn from(v: u16) -> Self {
        match v {
            1 => IeType::CreatePdr,
            2 => IeType::Pdi,
            3 => IeType::CreateFar,
            4 => IeType::ForwardingParameters,
            7 => IeType::CreateQer,
            8 => IeType::CreatedPdr,
            15 => IeType::RemovePdr,
            16 => IeType::RemoveFar,
            19 => IeType::Cause,
            20 => IeType::SourceInterface,
            21 => IeType::Fteid,
            22 => IeType::NetworkInstance,
            25 => IeType::GateStatus,
            26 => IeType::Mbr,
            29 => IeType::Precedence,
            42 => IeType::DestinationInterface,
            44 => IeType::ApplyAction,
            56 => IeType::PdrId,
            57 => IeType::Fseid,
            60 => IeType::NodeId,
            84 => IeType::OuterHeaderCreation,
            93 => IeType::UeIpAddress,
            95 => IeType::OuterHeaderRemoval,
            96 => IeType::RecoveryTimeStamp,
            108 => IeType::FarId,
            109 => IeType::QerId,
            124 => IeType::Qfi,
            _ => IeType::Unknown,
        }
    }
}

/// One TLV-framed IE: type (2 bytes), length (2 bytes), payload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Ie {
    pub ie_type: IeType,
    /// Raw type code as received; differs from `ie_type` only for unknowns.
    pub type_code: u16,
    pub payload: Vec<u8>,
}

impl Ie {
    pub fn new(ie_type: IeType, payload: Vec<u8>) -> Self {
        Ie {
            ie_type,
            type_code: ie_type as u16,
            payload,
        }
    }

    /// Total wire length including the 4-byte TL prefix.
    pub fn len(&self) -> usize {
        4 + self.payload.len()
    }

    pub fn is_empty(&self) -> bool {
        self.payload.is_empty()
    }

    pub fn marshal_into(&self, buf: &mut Vec<u8>) {
        buf.extend_from_slice(&self.type_code.to_be_bytes());
        buf.extend_from_slice(&(self.payload.len() as u16).to_be_bytes());
        buf.extend_from_slice(&self.payload);
    }

    pub fn marshal(&self) -> Vec<u8> {
        let mut buf = Vec::with_capacity(self.len());
        self.marshal_into(&mut buf);
        buf
    }

    /// Reads one IE from the start of `b`. `Ie::len()` of the result tells
    /// the caller how far to advance.
    pub fn unmarshal(b: &[u8]) -> Result<Self> {
        if b.len() < 4 {
            return Err(Error::Protocol("IE header too short".into()));
        }
        let type_code = u16::from_be_bytes([b[0], b[1]]);
        let length = u16::from_be_bytes([b[2], b[3]]) as usize;
        if b.len() < 4 + length {
            return Err(Error::Protocol(format!(
                "IE {type_code} truncated: declared {length} bytes, {} available",
                b.len() - 4
            )));
        }
        Ok(Ie {
            ie_type: IeType::from(type_code),
            type_code,
            payload: b[4..4 + length].to_vec(),
        })
    }
}

/// Iterates the IEs in a payload, skipping unknown types with a length
/// advance.
pub fn ies_in(payload: &[u8]) -> IeIter<'_> {
    IeIter {
        payload,
        offset: 0,
    }
}

pub struct IeIter<'a> {
    payload: &'a [u8],
    offset: usize,
}

impl Iterator for IeIter<'_> {
    type Item = Result<Ie>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.offset >= self.payload.len() {
            return None;
        }
        match Ie::unmarshal(&self.payload[self.offset..]) {
            Ok(ie) => {
                self.offset += ie.len();
                Some(Ok(ie))
            }
            Err(e) => {
                self.offset = self.payload.len();
                Some(Err(e))
            }
        }
    }
}
