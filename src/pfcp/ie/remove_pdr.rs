//! Remove PDR grouped IE.

use crate::error::{Error, Result};
use crate::pfcp::ie::pdr_id::PdrId;
use crate::pfcp::ie::{ies_in, Ie, IeType};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RemovePdr {
    pub pdr_id: PdrId,
}

impl RemovePdr {
    pub fn new(pdr_id: PdrId) -> Self {
        RemovePdr { pdr_id }
    }

    pub fn marshal(&self) -> Vec<u8> {
        self.pdr_id.to_ie().marshal()
    }

    pub fn unmarshal(payload: &[u8]) -> Result<Self> {
        for ie in ies_in(payload) {
            let ie = ie?;
            if ie.ie_type == IeType::PdrId {
                return Ok(RemovePdr {
                    pdr_id: PdrId::unmarshal(&ie.payload)?,
                });
            }
        }
        Err(Error::Protocol("Remove PDR missing PDR ID".into()))
    }

    pub fn to_ie(&self) -> Ie {
        Ie::new(IeType::RemovePdr, self.marshal())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn roundtrip() {
        let rm = RemovePdr::new(PdrId::new(2));
        assert_eq!(RemovePdr::unmarshal(&rm.marshal()).unwrap(), rm);
    }
}
