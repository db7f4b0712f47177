//! Destination Interface IE.

use crate::error::{Error, Result};
use crate::pfcp::ie::{Ie, IeType};

/// Where a FAR forwards matched traffic.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum DestinationInterface {
    /// N3, toward the gNB.
    Access = 0,
    /// N6, toward the data network.
    Core = 1,
}

impl DestinationInterface {
    pub fn marshal(&self) -> [u8; 1] {
        [*self as u8]
    }

    pub fn unmarshal(data: &[u8]) -> Result<Self> {
        let first = data
            .first()
            .ok_or_else(|| Error::Protocol("empty Destination Interface payload".into()))?;
        match first & 0x0f {
            0 => Ok(DestinationInterface::Access),
            1 => Ok(DestinationInterface::Core),
            other => Err(Error::Protocol(format!(
                "unsupported destination interface {other}"
            ))),
        }
    }

    pub fn to_ie(&self) -> Ie {
        Ie::new(IeType::DestinationInterface, self.marshal().to_vec())
    }
}
