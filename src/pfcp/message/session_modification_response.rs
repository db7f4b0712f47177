//! Session Modification Response message.

use crate::error::{Error, Result};
use crate::pfcp::header::Header;
use crate::pfcp::ie::{ies_in, Cause, CauseValue, IeType};
use crate::pfcp::MsgType;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionModificationResponse {
    pub seid: u64,
    pub sequence: u32,
    pub cause: Cause,
}

impl SessionModificationResponse {
    pub fn new(seid: u64, sequence: u32, cause: CauseValue) -> Self {
        SessionModificationResponse {
            seid,
            sequence,
            cause: Cause::new(cause),
        }
    }

    pub fn marshal(&self) -> Vec<u8> {
        let mut ies = Vec::new();
        self.cause.to_ie().marshal_into(&mut ies);

        let mut buf = Vec::with_capacity(16 + ies.len());
        Header::with_seid(MsgType::SessionModificationResponse, self.seid, self.sequence)
            .marshal_into(&mut buf, ies.len());
        buf.extend_from_slice(&ies);
        buf
    }

    pub fn unmarshal(data: &[u8]) -> Result<Self> {
        let header = Header::unmarshal(data)?;
        let mut cause = None;

        for ie in ies_in(&data[header.len()..]) {
            let ie = ie?;
            if ie.ie_type == IeType::Cause {
                cause = Some(Cause::unmarshal(&ie.payload)?);
            }
        }

        Ok(SessionModificationResponse {
            seid: header.seid,
            sequence: header.sequence_number,
            cause: cause.ok_or_else(|| {
                Error::Protocol("Session Modification Response missing Cause".into())
            })?,
        })
    }
}
