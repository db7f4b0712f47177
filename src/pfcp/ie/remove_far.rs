//! Remove FAR grouped IE.

use crate::error::{Error, Result};
use crate::pfcp::ie::far_id::FarId;
use crate::pfcp::ie::{ies_in, Ie, IeType};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RemoveFar {
    pub far_id: FarId,
}

impl RemoveFar {
    pub fn new(far_id: FarId) -> Self {
        RemoveFar { far_id }
    }

    pub fn marshal(&self) -> Vec<u8> {
        self.far_id.to_ie().marshal()
    }

    pub fn unmarshal(payload: &[u8]) -> Result<Self> {
        for ie in ies_in(payload) {
            let ie = ie?;
            if ie.ie_type == IeType::FarId {
                return Ok(RemoveFar {
                    far_id: FarId::unmarshal(&ie.payload)?,
                });
            }
        }
        Err(Error::Protocol("Remove FAR missing FAR ID".into()))
    }

    pub fn to_ie(&self) -> Ie {
        Ie::new(IeType::RemoveFar, self.marshal())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn roundtrip() {
        let rm = RemoveFar::new(FarId::new(2));
        assert_eq!(RemoveFar::unmarshal(&rm.marshal()).unwrap(), rm);
    }
}
