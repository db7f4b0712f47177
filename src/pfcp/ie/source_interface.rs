//! Source Interface IE.

use crate::error::{Error, Result};
use crate::pfcp::ie::{Ie, IeType};

/// Where a PDR expects traffic to arrive from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum SourceInterface {
    /// N3, from the gNB.
    Access = 0,
    /// N6/N9, from the data network side.
    Core = 1,
}

impl SourceInterface {
    pub fn marshal(&self) -> [u8; 1] {
        [*self as u8]
    }

    pub fn unmarshal(data: &[u8]) -> Result<Self> {
        let first = data
            .first()
            .ok_or_else(|| Error::Protocol("empty Source Interface payload".into()))?;
        match first & 0x0f {
            0 => Ok(SourceInterface::Access),
            1 => Ok(SourceInterface::Core),
            other => Err(Error::Protocol(format!(
                "unsupported source interface {other}"
            ))),
        }
    }

    pub fn to_ie(&self) -> Ie {
        Ie::new(IeType::SourceInterface, self.marshal().to_vec())
    }
}
