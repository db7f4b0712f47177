//! Recovery Time Stamp IE.

use std::time::{Duration, SystemTime, UNIX_EPOCH};

use crate::error::{Error, Result};
use crate::pfcp::ie::{Ie, IeType};

/// Seconds between the NTP epoch (1900) and the Unix epoch (1970).
const NTP_EPOCH_OFFSET: u64 = 2_208_988_800;

/// Time the node started, exchanged in heartbeats and association setup so
/// peers can detect restarts.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RecoveryTimeStamp {
    pub timestamp: SystemTime,
}

impl RecoveryTimeStamp {
    pub fn new(timestamp: SystemTime) -> Self {
        RecoveryTimeStamp { timestamp }
    }

    pub fn marshal(&self) -> [u8; 4] {
        let unix = self
            .timestamp
            .duration_since(UNIX_EPOCH)
            .unwrap_or_default()
            .as_secs();
        ((unix + NTP_EPOCH_OFFSET) as u32).to_be_bytes()
    }

    pub fn unmarshal(data: &[u8]) -> Result<Self> {
        if data.len() < 4 {
            return Err(Error::Protocol("Recovery Time Stamp needs 4 bytes".into()));
        }
        let ntp = u32::from_be_bytes(data[0..4].try_into().unwrap()) as u64;
        let unix = ntp.saturating_sub(NTP_EPOCH_OFFSET);
        Ok(RecoveryTimeStamp {
            timestamp: UNIX_EPOCH + Duration::from_secs(unix),
        })
    }

    pub fn to_ie(&self) -> Ie {
        Ie::new(IeType::RecoveryTimeStamp, self.marshal().to_vec())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn roundtrip_drops_subsecond_precision() {
        let now = UNIX_EPOCH + Duration::from_secs(1_700_000_000);
        let ts = RecoveryTimeStamp::new(now);
        let parsed = RecoveryTimeStamp::unmarshal(&ts.marshal()).unwrap();
        assert_eq!(parsed.timestamp, now);
    }

    #[test]
    fn short_payload_fails() {
        assert!(RecoveryTimeStamp::unmarshal(&[0, 1]).is_err());
    }
}
