//! Create PDR grouped IE.

use crate::error::{Error, Result};
use crate::pfcp::ie::far_id::FarId;
use crate::pfcp::ie::outer_header_removal::OuterHeaderRemoval;
use crate::pfcp::ie::pdi::Pdi;
use crate::pfcp::ie::pdr_id::PdrId;
use crate::pfcp::ie::precedence::Precedence;
use crate::pfcp::ie::qer_id::QerId;
use crate::pfcp::ie::{ies_in, Ie, IeType};

/// A Packet Detection Rule to install: match (PDI) plus the FAR/QER it
/// references.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CreatePdr {
    pub pdr_id: PdrId,
    pub precedence: Precedence,
    pub pdi: Pdi,
    pub outer_header_removal: Option<OuterHeaderRemoval>,
    pub far_id: Option<FarId>,
    pub qer_id: Option<QerId>,
}

impl CreatePdr {
    pub fn new(pdr_id: PdrId, precedence: Precedence, pdi: Pdi) -> Self {
        CreatePdr {
            pdr_id,
            precedence,
            pdi,
            outer_header_removal: None,
            far_id: None,
            qer_id: None,
        }
    }

    pub fn with_outer_header_removal(mut self) -> Self {
        self.outer_header_removal = Some(OuterHeaderRemoval::gtpu_udp_ipv4());
        self
    }

    pub fn with_far_id(mut self, far_id: FarId) -> Self {
        self.far_id = Some(far_id);
        self
    }

    pub fn with_qer_id(mut self, qer_id: QerId) -> Self {
        self.qer_id = Some(qer_id);
        self
    }

    pub fn marshal(&self) -> Vec<u8> {
        let mut buf = Vec::new();
        self.pdr_id.to_ie().marshal_into(&mut buf);
        self.precedence.to_ie().marshal_into(&mut buf);
        self.pdi.to_ie().marshal_into(&mut buf);
        if let Some(ohr) = &self.outer_header_removal {
            ohr.to_ie().marshal_into(&mut buf);
        }
        if let Some(far_id) = &self.far_id {
            far_id.to_ie().marshal_into(&mut buf);
        }
        if let Some(qer_id) = &self.qer_id {
            qer_id.to_ie().marshal_into(&mut buf);
        }
        buf
    }

    pub fn unmarshal(payload: &[u8]) -> Result<Self> {
        let mut pdr_id = None;
        let mut precedence = None;
        let mut pdi = None;
        let mut outer_header_removal = None;
        let mut far_id = None;
        let mut qer_id = None;

        for ie in ies_in(payload) {
            let ie = ie?;
            match ie.ie_type {
                IeType::PdrId => pdr_id = Some(PdrId::unmarshal(&ie.payload)?),
                IeType::Precedence => precedence = Some(Precedence::unmarshal(&ie.payload)?),
                IeType::Pdi => pdi = Some(Pdi::unmarshal(&ie.payload)?),
                IeType::OuterHeaderRemoval => {
                    outer_header_removal = Some(OuterHeaderRemoval::unmarshal(&ie.payload)?)
                }
                IeType::FarId => far_id = Some(FarId::unmarshal(&ie.payload)?),
                IeType::QerId => qer_id = Some(QerId::unmarshal(&ie.payload)?),
                _ => {}
            }
        }

        Ok(CreatePdr {
            pdr_id: pdr_id.ok_or_else(|| Error::Protocol("Create PDR missing PDR ID".into()))?,
            precedence: precedence
                .ok_or_else(|| Error::Protocol("Create PDR missing Precedence".into()))?,
            pdi: pdi.ok_or_else(|| Error::Protocol("Create PDR missing PDI".into()))?,
            outer_header_removal,
            far_id,
            qer_id,
        })
    }

    pub fn to_ie(&self) -> Ie {
        Ie::new(IeType::CreatePdr, self.marshal())
    }
}
