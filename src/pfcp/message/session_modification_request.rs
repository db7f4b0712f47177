//! Session Modification Request message.

use crate::error::Result;
use crate::pfcp::header::Header;
use crate::pfcp::ie::create_far::CreateFar;
use crate::pfcp::ie::create_pdr::CreatePdr;
use crate::pfcp::ie::create_qer::CreateQer;
use crate::pfcp::ie::remove_far::RemoveFar;
use crate::pfcp::ie::remove_pdr::RemovePdr;
use crate::pfcp::ie::{ies_in, IeType};
use crate::pfcp::MsgType;

/// Replaces or merges rule lists on an established session. A Create IE
/// carrying an id that already exists replaces that rule.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct SessionModificationRequest {
    pub seid: u64,
    pub sequence: u32,
    pub create_pdrs: Vec<CreatePdr>,
    pub create_fars: Vec<CreateFar>,
    pub create_qers: Vec<CreateQer>,
    pub remove_pdrs: Vec<RemovePdr>,
    pub remove_fars: Vec<RemoveFar>,
}

impl SessionModificationRequest {
    pub fn marshal(&self) -> Vec<u8> {
        let mut ies = Vec::new();
        for pdr in &self.create_pdrs {
            pdr.to_ie().marshal_into(&mut ies);
        }
        for far in &self.create_fars {
            far.to_ie().marshal_into(&mut ies);
        }
        for qer in &self.create_qers {
            qer.to_ie().marshal_into(&mut ies);
        }
        for rm in &self.remove_pdrs {
            rm.to_ie().marshal_into(&mut ies);
        }
        for rm in &self.remove_fars {
            rm.to_ie().marshal_into(&mut ies);
        }

        let mut buf = Vec::with_capacity(16 + ies.len());
        Header::with_seid(MsgType::SessionModificationRequest, self.seid, self.sequence)
            .marshal_into(&mut buf, ies.len());
        buf.extend_from_slice(&ies);
        buf
    }

    pub fn unmarshal(data: &[u8]) -> Result<Self> {
        let header = Header::unmarshal(data)?;
        let mut msg = SessionModificationRequest {
            seid: header.seid,
            sequence: header.sequence_number,
            ..Default::default()
        };

        for ie in ies_in(&data[header.len()..]) {
            let ie = ie?;
            match ie.ie_type {
                IeType::CreatePdr => msg.create_pdrs.push(CreatePdr::unmarshal(&ie.payload)?),
                IeType::CreateFar => msg.create_fars.push(CreateFar::unmarshal(&ie.payload)?),
                IeType::CreateQer => msg.create_qers.push(CreateQer::unmarshal(&ie.payload)?),
                IeType::RemovePdr => msg.remove_pdrs.push(RemovePdr::unmarshal(&ie.payload)?),
                IeType::RemoveFar => msg.remove_fars.push(RemoveFar::unmarshal(&ie.payload)?),
                _ => {}
            }
        }

        Ok(msg)
    }
}

/// Builder mirroring the establishment request builder.
#[derive(Debug, Default)]
pub struct SessionModificationRequestBuilder {
    msg: SessionModificationRequest,
}

impl SessionModificationRequestBuilder {
    pub fn new(seid: u64, sequence: u32) -> Self {
        SessionModificationRequestBuilder {
            msg: SessionModificationRequest {
                seid,
                sequence,
                ..Default::default()
            },
        }
    }

    pub fn create_pdr(mut self, pdr: CreatePdr) -> Self {
        self.msg.create_pdrs.push(pdr);
        self
    }

    pub fn create_far(mut self, far: CreateFar) -> Self {
        self.msg.create_fars.push(far);
        self
    }

    pub fn create_qer(mut self, qer: CreateQer) -> Self {
        self.msg.create_qers.push(qer);
        self
    }

    pub fn remove_pdr(mut self, rm: RemovePdr) -> Self {
        self.msg.remove_pdrs.push(rm);
        self
    }

    pub fn remove_far(mut self, rm: RemoveFar) -> Self {
        self.msg.remove_fars.push(rm);
        self
    }

    pub fn build(self) -> SessionModificationRequest {
        self.msg
    }
}
