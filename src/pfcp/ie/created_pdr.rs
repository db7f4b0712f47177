//! Created PDR grouped IE.

use crate::error::{Error, Result};
use crate::pfcp::ie::f_teid::Fteid;
use crate::pfcp::ie::pdr_id::PdrId;
use crate::pfcp::ie::{ies_in, Ie, IeType};

/// Server-side answer to a Create PDR: the PDR id plus the UPF-allocated
/// local F-TEID.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CreatedPdr {
    pub pdr_id: PdrId,
    pub local_f_teid: Option<Fteid>,
}

impl CreatedPdr {
    pub fn new(pdr_id: PdrId, local_f_teid: Option<Fteid>) -> Self {
        CreatedPdr {
            pdr_id,
            local_f_teid,
        }
    }

    pub fn marshal(&self) -> Vec<u8> {
        let mut buf = Vec::new();
        self.pdr_id.to_ie().marshal_into(&mut buf);
        if let Some(f_teid) = &self.local_f_teid {
            f_teid.to_ie().marshal_into(&mut buf);
        }
        buf
    }

    pub fn unmarshal(payload: &[u8]) -> Result<Self> {
        let mut pdr_id = None;
        let mut local_f_teid = None;

        for ie in ies_in(payload) {
            let ie = ie?;
            match ie.ie_type {
                IeType::PdrId => pdr_id = Some(PdrId::unmarshal(&ie.payload)?),
                IeType::Fteid => local_f_teid = Some(Fteid::unmarshal(&ie.payload)?),
                _ => {}
            }
        }

        Ok(CreatedPdr {
            pdr_id: pdr_id.ok_or_else(|| Error::Protocol("Created PDR missing PDR ID".into()))?,
            local_f_teid,
        })
    }

    pub fn to_ie(&self) -> Ie {
        Ie::new(IeType::CreatedPdr, self.marshal())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn roundtrip() {
        let created = CreatedPdr::new(
            PdrId::new(1),
            Some(Fteid::new(0x3e9, Some("10.30.0.2".parse().unwrap()))),
        );
        assert_eq!(CreatedPdr::unmarshal(&created.marshal()).unwrap(), created);
    }
}
