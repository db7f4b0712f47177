//! PFCP message header.
//!
//! Wire layout: flags (version in bits 7-5, S-flag in bit 0), message type,
//! 16-bit length covering everything after the length field, optional 64-bit
//! SEID when S is set, then a 24-bit sequence number and a spare octet.

use crate::error::{Error, Result};
use crate::pfcp::MsgType;

pub const PFCP_VERSION: u8 = 1;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Header {
    pub version: u8,
    pub has_seid: bool,
    pub message_type: MsgType,
    /// Bytes after the length field; maintained by `marshal`.
    pub length: u16,
    pub seid: u64,
    pub sequence_number: u32,
}

impl Header {
    pub fn new(message_type: MsgType, sequence_number: u32) -> Self {
        Header {
            version: PFCP_VERSION,
            has_seid: false,
            message_type,
            length: 0,
            seid: 0,
            sequence_number,
        }
    }

    pub fn with_seid(message_type: MsgType, seid: u64, sequence_number: u32) -> Self {
        Header {
            version: PFCP_VERSION,
            has_seid: true,
            message_type,
            length: 0,
            seid,
            sequence_number,
        }
    }

    /// Header size in bytes: 8 fixed, plus 8 when the SEID is present.
    pub fn len(&self) -> usize {
        if self.has_seid {
            16
        } else {
            8
        }
    }

    pub fn is_empty(&self) -> bool {
        self.length == 0
    }

    /// Appends the header, with `length` set to cover `payload_len` bytes of
    /// IEs following it.
    pub fn marshal_into(&self, buf: &mut Vec<u8>, payload_len: usize) {
        let length = (self.len() - 4 + payload_len) as u16;
        buf.push((self.version << 5) | (self.has_seid as u8));
        buf.push(self.message_type as u8);
        buf.extend_from_slice(&length.to_be_bytes());
        if self.has_seid {
            buf.extend_from_slice(&self.seid.to_be_bytes());
        }
        let seq = self.sequence_number.to_be_bytes();
        buf.extend_from_slice(&seq[1..]);
        buf.push(0); // spare
    }

    pub fn unmarshal(b: &[u8]) -> Result<Self> {
        if b.len() < 8 {
            return Err(Error::Protocol("PFCP header too short".into()));
        }

        let flags = b[0];
        let version = flags >> 5;
        if version != PFCP_VERSION {
            return Err(Error::Protocol(format!("unsupported PFCP version {version}")));
        }
        let has_seid = flags & 0x01 == 1;

        let message_type = MsgType::from(b[1]);
        let length = u16::from_be_bytes([b[2], b[3]]);

        let mut offset = 4;
        let seid = if has_seid {
            if b.len() < 16 {
                return Err(Error::Protocol("PFCP header with SEID too short".into()));
            }
            let seid = u64::from_be_bytes(b[4..12].try_into().unwrap());
            offset = 12;
            seid
        } else {
            0
        };

        if b.len() < offset + 4 {
            return Err(Error::Protocol("PFCP header sequence part too short".into()));
        }
        let sequence_number = u32::from_be_bytes([0, b[offset], b[offset + 1], b[offset + 2]]);

        Ok(Header {
            version,
            has_seid,
            message_type,
            length,
            seid,
            sequence_number,
        })
    }
}
