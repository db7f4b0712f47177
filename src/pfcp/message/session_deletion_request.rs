//! Session Deletion Request message.

use crate::error::Result;
use crate::pfcp::header::Header;
use crate::pfcp::MsgType;

/// Tears a session down; the header SEID identifies it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SessionDeletionRequest {
    pub seid: u64,
    pub sequence: u32,
}

impl SessionDeletionRequest {
    pub fn new(seid: u64, sequence: u32) -> Self {
        SessionDeletionRequest { seid, sequence }
    }

    pub fn marshal(&self) -> Vec<u8> {
        let mut buf = Vec::with_capacity(16);
        Header::with_seid(MsgType::SessionDeletionRequest, self.seid, self.sequence)
            .marshal_into(&mut buf, 0);
        buf
    }

    pub fn unmarshal(data: &[u8]) -> Result<Self> {
        let header = Header::unmarshal(data)?;
        Ok(SessionDeletionRequest {
            seid: header.seid,
            sequence: header.sequence_number,
        })
    }
}
