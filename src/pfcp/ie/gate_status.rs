//! Gate Status IE.

use crate::error::{Error, Result};
use crate::pfcp::ie::{Ie, IeType};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[repr(u8)]
pub enum Gate {
    #[default]
    Open = 0,
    Closed = 1,
}

/// Per-direction gate of a QER. Wire layout packs UL into bits 3-2 and DL
/// into bits 1-0.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct GateStatus {
    pub uplink: Gate,
    pub downlink: Gate,
}

impl GateStatus {
    pub fn open() -> Self {
        GateStatus::default()
    }

    pub fn new(uplink: Gate, downlink: Gate) -> Self {
        GateStatus { uplink, downlink }
    }

    pub fn marshal(&self) -> [u8; 1] {
        [((self.uplink as u8) << 2) | self.downlink as u8]
    }

    pub fn unmarshal(data: &[u8]) -> Result<Self> {
        let first = data
            .first()
            .ok_or_else(|| Error::Protocol("empty Gate Status payload".into()))?;
        let gate = |bits: u8| if bits & 0x03 == 0 { Gate::Open } else { Gate::Closed };
        Ok(GateStatus {
            uplink: gate(first >> 2),
            downlink: gate(*first),
        })
    }

    pub fn to_ie(&self) -> Ie {
        Ie::new(IeType::GateStatus, self.marshal().to_vec())
    }
}
