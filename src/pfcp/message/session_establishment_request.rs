//! Session Establishment Request message.

use crate::error::{Error, Result};
use crate::pfcp::header::Header;
use crate::pfcp::ie::create_far::CreateFar;
use crate::pfcp::ie::create_pdr::CreatePdr;
use crate::pfcp::ie::create_qer::CreateQer;
use crate::pfcp::ie::{ies_in, Fseid, IeType, NodeId};
use crate::pfcp::MsgType;

/// Programs a new session into the UPF: CP F-SEID plus the initial
/// PDR/FAR/QER rule set. The header SEID keys the session on the UPF side.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionEstablishmentRequest {
    pub seid: u64,
    pub sequence: u32,
    pub node_id: NodeId,
    pub fseid: Fseid,
    pub create_pdrs: Vec<CreatePdr>,
    pub create_fars: Vec<CreateFar>,
    pub create_qers: Vec<CreateQer>,
}

impl SessionEstablishmentRequest {
    pub fn marshal(&self) -> Vec<u8> {
        let mut ies = Vec::new();
        self.node_id.to_ie().marshal_into(&mut ies);
        self.fseid.to_ie().marshal_into(&mut ies);
        for pdr in &self.create_pdrs {
            pdr.to_ie().marshal_into(&mut ies);
        }
        for far in &self.create_fars {
            far.to_ie().marshal_into(&mut ies);
        }
        for qer in &self.create_qers {
            qer.to_ie().marshal_into(&mut ies);
        }

        let mut buf = Vec::with_capacity(16 + ies.len());
        Header::with_seid(MsgType::SessionEstablishmentRequest, self.seid, self.sequence)
            .marshal_into(&mut buf, ies.len());
        buf.extend_from_slice(&ies);
        buf
    }

    pub fn unmarshal(data: &[u8]) -> Result<Self> {
        let header = Header::unmarshal(data)?;
        let mut node_id = None;
        let mut fseid = None;
        let mut create_pdrs = Vec::new();
        let mut create_fars = Vec::new();
        let mut create_qers = Vec::new();

        for ie in ies_in(&data[header.len()..]) {
            let ie = ie?;
            match ie.ie_type {
                IeType::NodeId => node_id = Some(NodeId::unmarshal(&ie.payload)?),
                IeType::Fseid => fseid = Some(Fseid::unmarshal(&ie.payload)?),
                IeType::CreatePdr => create_pdrs.push(CreatePdr::unmarshal(&ie.payload)?),
                IeType::CreateFar => create_fars.push(CreateFar::unmarshal(&ie.payload)?),
                IeType::CreateQer => create_qers.push(CreateQer::unmarshal(&ie.payload)?),
                _ => {}
            }
        }

        Ok(SessionEstablishmentRequest {
            seid: header.seid,
            sequence: header.sequence_number,
            node_id: node_id.ok_or_else(|| {
                Error::Protocol("Session Establishment Request missing Node ID".into())
            })?,
            fseid: fseid.ok_or_else(|| {
                Error::Protocol("Session Establishment Request missing F-SEID".into())
            })?,
            create_pdrs,
            create_fars,
            create_qers,
        })
    }
}

/// Builder validating the mandatory IEs before marshal.
#[derive(Debug, Default)]
pub struct SessionEstablishmentRequestBuilder {
    seid: u64,
    sequence: u32,
    node_id: Option<NodeId>,
    fseid: Option<Fseid>,
    create_pdrs: Vec<CreatePdr>,
    create_fars: Vec<CreateFar>,
    create_qers: Vec<CreateQer>,
}

impl SessionEstablishmentRequestBuilder {
    pub fn new(seid: u64, sequence: u32) -> Self {
        SessionEstablishmentRequestBuilder {
            seid,
            sequence,
            ..Default::default()
        }
    }

    pub fn node_id(mut self, node_id: NodeId) -> Self {
        self.node_id = Some(node_id);
        self
    }

    pub fn fseid(mut self, fseid: Fseid) -> Self {
        self.fseid = Some(fseid);
        self
    }

    pub fn create_pdr(mut self, pdr: CreatePdr) -> Self {
        self.create_pdrs.push(pdr);
        self
    }

    pub fn create_far(mut self, far: CreateFar) -> Self {
        self.create_fars.push(far);
        self
    }

    pub fn create_qer(mut self, qer: CreateQer) -> Self {
        self.create_qers.push(qer);
        self
    }

    pub fn build(self) -> Result<SessionEstablishmentRequest> {
        Ok(SessionEstablishmentRequest {
            seid: self.seid,
            sequence: self.sequence,
            node_id: self
                .node_id
                .ok_or_else(|| Error::InvalidInput("node_id is required".into()))?,
            fseid: self
                .fseid
                .ok_or_else(|| Error::InvalidInput("fseid is required".into()))?,
            create_pdrs: self.create_pdrs,
            create_fars: self.create_fars,
            create_qers: self.create_qers,
        })
    }
}
