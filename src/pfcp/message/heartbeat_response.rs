//! Heartbeat Response message.

use std::time::SystemTime;

use crate::error::{Error, Result};
use crate::pfcp::header::Header;
use crate::pfcp::ie::{ies_in, IeType, RecoveryTimeStamp};
use crate::pfcp::MsgType;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HeartbeatResponse {
    pub sequence: u32,
    pub recovery_time_stamp: RecoveryTimeStamp,
}

impl HeartbeatResponse {
    pub fn new(sequence: u32, started_at: SystemTime) -> Self {
        HeartbeatResponse {
            sequence,
            recovery_time_stamp: RecoveryTimeStamp::new(started_at),
        }
    }

    pub fn marshal(&self) -> Vec<u8> {
        let mut ies = Vec::new();
        self.recovery_time_stamp.to_ie().marshal_into(&mut ies);

        let mut buf = Vec::with_capacity(8 + ies.len());
        Header::new(MsgType::HeartbeatResponse, self.sequence).marshal_into(&mut buf, ies.len());
        buf.extend_from_slice(&ies);
        buf
    }

    pub fn unmarshal(data: &[u8]) -> Result<Self> {
        let header = Header::unmarshal(data)?;
        let mut recovery_time_stamp = None;

        for ie in ies_in(&data[header.len()..]) {
            let ie = ie?;
            if ie.ie_type == IeType::RecoveryTimeStamp {
                recovery_time_stamp = Some(RecoveryTimeStamp::unmarshal(&ie.payload)?);
            }
        }

        Ok(HeartbeatResponse {
            sequence: header.sequence_number,
            recovery_time_stamp: recovery_time_stamp.ok_or_else(|| {
                Error::Protocol("Heartbeat Response missing Recovery Time Stamp".into())
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
        let resp = HeartbeatResponse::new(42, UNIX_EPOCH + Duration::from_secs(1_700_000_000));
        assert_eq!(HeartbeatResponse::unmarshal(&resp.marshal()).unwrap(), resp);
    }
}
