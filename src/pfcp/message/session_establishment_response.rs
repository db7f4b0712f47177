//! Session Establishment Response message.

use crate::error::{Error, Result};
use crate::pfcp::header::Header;
use crate::pfcp::ie::created_pdr::CreatedPdr;
use crate::pfcp::ie::{ies_in, Cause, CauseValue, IeType, NodeId};
use crate::pfcp::MsgType;

/// UPF answer to an establishment: cause plus the allocated F-TEIDs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionEstablishmentResponse {
    pub seid: u64,
    pub sequence: u32,
    pub node_id: NodeId,
    pub cause: Cause,
    pub created_pdrs: Vec<CreatedPdr>,
}

impl SessionEstablishmentResponse {
    pub fn new(
        seid: u64,
        sequence: u32,
        node_id: NodeId,
        cause: CauseValue,
        created_pdrs: Vec<CreatedPdr>,
    ) -> Self {
        SessionEstablishmentResponse {
            seid,
            sequence,
            node_id,
            cause: Cause::new(cause),
            created_pdrs,
        }
    }

    /// First allocated local F-TEID, the one the SMF binds as the session's
    /// UPF tunnel endpoint.
    pub fn local_f_teid(&self) -> Option<&crate::pfcp::ie::Fteid> {
        self.created_pdrs
            .iter()
            .find_map(|pdr| pdr.local_f_teid.as_ref())
    }

    pub fn marshal(&self) -> Vec<u8> {
        let mut ies = Vec::new();
        self.node_id.to_ie().marshal_into(&mut ies);
        self.cause.to_ie().marshal_into(&mut ies);
        for created in &self.created_pdrs {
            created.to_ie().marshal_into(&mut ies);
        }

        let mut buf = Vec::with_capacity(16 + ies.len());
        Header::with_seid(MsgType::SessionEstablishmentResponse, self.seid, self.sequence)
            .marshal_into(&mut buf, ies.len());
        buf.extend_from_slice(&ies);
        buf
    }

    pub fn unmarshal(data: &[u8]) -> Result<Self> {
        let header = Header::unmarshal(data)?;
        let mut node_id = None;
        let mut cause = None;
        let mut created_pdrs = Vec::new();

        for ie in ies_in(&data[header.len()..]) {
            let ie = ie?;
            match ie.ie_type {
                IeType::NodeId => node_id = Some(NodeId::unmarshal(&ie.payload)?),
                IeType::Cause => cause = Some(Cause::unmarshal(&ie.payload)?),
                IeType::CreatedPdr => created_pdrs.push(CreatedPdr::unmarshal(&ie.payload)?),
                _ => {}
            }
        }

        Ok(SessionEstablishmentResponse {
            seid: header.seid,
            sequence: header.sequence_number,
            node_id: node_id.ok_or_else(|| {
                Error::Protocol("Session Establishment Response missing Node ID".into())
            })?,
            cause: cause.ok_or_else(|| {
                Error::Protocol("Session Establishment Response missing Cause".into())
            })?,
            created_pdrs,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pfcp::ie::f_teid::Fteid;
    use crate::pfcp::ie::pdr_id::PdrId;

    #[test]
    fn roundtrip_with_allocated_teid() {
        let resp = SessionEstablishmentResponse::new(
            0xabcd0001,
            7,
            NodeId::Ipv4("10.30.0.2".parse().unwrap()),
            CauseValue::RequestAccepted,
            vec![CreatedPdr::new(
                PdrId::new(1),
                Some(Fteid::new(0x3e9, Some("10.30.0.2".parse().unwrap()))),
            )],
        );
        let parsed = SessionEstablishmentResponse::unmarshal(&resp.marshal()).unwrap();
        assert_eq!(parsed, resp);
        assert_eq!(parsed.local_f_teid().unwrap().teid, 0x3e9);
    }

    #[test]
    fn rejection_roundtrip() {
        let resp = SessionEstablishmentResponse::new(
            1,
            2,
            NodeId::Ipv4("10.30.0.2".parse().unwrap()),
            CauseValue::NoResourcesAvailable,
            vec![],
        );
        let parsed = SessionEstablishmentResponse::unmarshal(&resp.marshal()).unwrap();
        assert!(!parsed.cause.value.is_accepted());
        assert!(parsed.local_f_teid().is_none());
    }
}
