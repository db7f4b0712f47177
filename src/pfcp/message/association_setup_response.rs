//! Association Setup Response message.

use std::time::SystemTime;

use crate::error::{Error, Result};
use crate::pfcp::header::Header;
use crate::pfcp::ie::{ies_in, Cause, CauseValue, IeType, NodeId, RecoveryTimeStamp};
use crate::pfcp::MsgType;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AssociationSetupResponse {
    pub sequence: u32,
    pub node_id: NodeId,
    pub cause: Cause,
    pub recovery_time_stamp: RecoveryTimeStamp,
}

impl AssociationSetupResponse {
    pub fn new(sequence: u32, node_id: NodeId, cause: CauseValue, started_at: SystemTime) -> Self {
        AssociationSetupResponse {
            sequence,
            node_id,
            cause: Cause::new(cause),
            recovery_time_stamp: RecoveryTimeStamp::new(started_at),
        }
    }

    pub fn marshal(&self) -> Vec<u8> {
        let mut ies = Vec::new();
        self.node_id.to_ie().marshal_into(&mut ies);
        self.cause.to_ie().marshal_into(&mut ies);
        self.recovery_time_stamp.to_ie().marshal_into(&mut ies);

        let mut buf = Vec::with_capacity(8 + ies.len());
        Header::new(MsgType::AssociationSetupResponse, self.sequence)
            .marshal_into(&mut buf, ies.len());
        buf.extend_from_slice(&ies);
        buf
    }

    pub fn unmarshal(data: &[u8]) -> Result<Self> {
        let header = Header::unmarshal(data)?;
        let mut node_id = None;
        let mut cause = None;
        let mut recovery_time_stamp = None;

        for ie in ies_in(&data[header.len()..]) {
            let ie = ie?;
            match ie.ie_type {
                IeType::NodeId => node_id = Some(NodeId::unmarshal(&ie.payload)?),
                IeType::Cause => cause = Some(Cause::unmarshal(&ie.payload)?),
                IeType::RecoveryTimeStamp => {
                    recovery_time_stamp = Some(RecoveryTimeStamp::unmarshal(&ie.payload)?)
                }
                _ => {}
            }
        }

        Ok(AssociationSetupResponse {
            sequence: header.sequence_number,
            node_id: node_id.ok_or_else(|| {
                Error::Protocol("Association Setup Response missing Node ID".into())
            })?,
            cause: cause
                .ok_or_else(|| Error::Protocol("Association Setup Response missing Cause".into()))?,
            recovery_time_stamp: recovery_time_stamp.ok_or_else(|| {
                Error::Protocol("Association Setup Response missing Recovery Time Stamp".into())
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
        let resp = AssociationSetupResponse::new(
            1,
            NodeId::Ipv4("10.30.0.2".parse().unwrap()),
            CauseValue::RequestAccepted,
            UNIX_EPOCH + Duration::from_secs(1_700_000_000),
        );
        let parsed = AssociationSetupResponse::unmarshal(&resp.marshal()).unwrap();
        assert_eq!(parsed, resp);
        assert!(parsed.cause.value.is_accepted());
    }
}
