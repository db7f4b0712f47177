//! Association Setup Request message.

use std::time::SystemTime;

use crate::error::{Error, Result};
use crate::pfcp::header::Header;
use crate::pfcp::ie::{ies_in, IeType, NodeId, RecoveryTimeStamp};
use crate::pfcp::MsgType;

/// Opens the N4 association between an SMF and a UPF.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AssociationSetupRequest {
    pub sequence: u32,
    pub node_id: NodeId,
    pub recovery_time_stamp: RecoveryTimeStamp,
}

impl AssociationSetupRequest {
    pub fn new(sequence: u32, node_id: NodeId, started_at: SystemTime) -> Self {
        AssociationSetupRequest {
            sequence,
            node_id,
            recovery_time_stamp: RecoveryTimeStamp::new(started_at),
        }
    }

    pub fn marshal(&self) -> Vec<u8> {
        let mut ies = Vec::new();
        self.node_id.to_ie().marshal_into(&mut ies);
        self.recovery_time_stamp.to_ie().marshal_into(&mut ies);

        let mut buf = Vec::with_capacity(8 + ies.len());
        Header::new(MsgType::AssociationSetupRequest, self.sequence)
            .marshal_into(&mut buf, ies.len());
        buf.extend_from_slice(&ies);
        buf
    }

    pub fn unmarshal(data: &[u8]) -> Result<Self> {
        let header = Header::unmarshal(data)?;
        let mut node_id = None;
        let mut recovery_time_stamp = None;

        for ie in ies_in(&data[header.len()..]) {
            let ie = ie?;
            match ie.ie_type {
                IeType::NodeId => node_id = Some(NodeId::unmarshal(&ie.payload)?),
                IeType::RecoveryTimeStamp => {
                    recovery_time_stamp = Some(RecoveryTimeStamp::unmarshal(&ie.payload)?)
                }
                _ => {}
            }
        }

        Ok(AssociationSetupRequest {
            sequence: header.sequence_number,
            node_id: node_id
                .ok_or_else(|| Error::Protocol("Association Setup Request missing Node ID".into()))?,
            recovery_time_stamp: recovery_time_stamp.ok_or_else(|| {
                Error::Protocol("Association Setup Request missing Recovery Time Stamp".into())
            })?,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::{Duration, UNIX_EPOCH};

    #[test]
    fn roundtrip() {
        let req = AssociationSetupRequest::new(
            1,
            NodeId::Ipv4("10.20.0.1".parse().unwrap()),
            UNIX_EPOCH + Duration::from_secs(1_700_000_000),
        );
        assert_eq!(
            AssociationSetupRequest::unmarshal(&req.marshal()).unwrap(),
            req
        );
    }

    #[test]
    fn missing_node_id_fails() {
        let mut ies = Vec::new();
        RecoveryTimeStamp::new(UNIX_EPOCH)
            .to_ie()
            .marshal_into(&mut ies);
        let mut buf = Vec::new();
        Header::new(MsgType::AssociationSetupRequest, 1).marshal_into(&mut buf, ies.len());
        buf.extend_from_slice(&ies);
        assert!(AssociationSetupRequest::unmarshal(&buf).is_err());
    }
}
