//! Create QER grouped IE.

use crate::error::{Error, Result};
use crate::pfcp::ie::gate_status::GateStatus;
use crate::pfcp::ie::mbr::Mbr;
use crate::pfcp::ie::qer_id::QerId;
use crate::pfcp::ie::qfi::Qfi;
use crate::pfcp::ie::{ies_in, Ie, IeType};

/// A QoS Enforcement Rule to install: gate plus optional MBR and QFI.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CreateQer {
    pub qer_id: QerId,
    pub gate_status: GateStatus,
    pub mbr: Option<Mbr>,
    pub qfi: Option<Qfi>,
}

impl CreateQer {
    pub fn new(qer_id: QerId) -> Self {
        CreateQer {
            qer_id,
            gate_status: GateStatus::open(),
            mbr: None,
            qfi: None,
        }
    }

    pub fn with_gate_status(mut self, gate_status: GateStatus) -> Self {
        self.gate_status = gate_status;
        self
    }

    pub fn with_mbr(mut self, mbr: Mbr) -> Self {
        self.mbr = Some(mbr);
        self
    }

    pub fn with_qfi(mut self, qfi: Qfi) -> Self {
        self.qfi = Some(qfi);
        self
    }

    pub fn marshal(&self) -> Vec<u8> {
        let mut buf = Vec::new();
        self.qer_id.to_ie().marshal_into(&mut buf);
        self.gate_status.to_ie().marshal_into(&mut buf);
        if let Some(mbr) = &self.mbr {
            mbr.to_ie().marshal_into(&mut buf);
        }
        if let Some(qfi) = &self.qfi {
            qfi.to_ie().marshal_into(&mut buf);
        }
        buf
    }

    pub fn unmarshal(payload: &[u8]) -> Result<Self> {
        let mut qer_id = None;
        let mut gate_status = None;
        let mut mbr = None;
        let mut qfi = None;

        for ie in ies_in(payload) {
            let ie = ie?;
            match ie.ie_type {
                IeType::QerId => qer_id = Some(QerId::unmarshal(&ie.payload)?),
                IeType::GateStatus => gate_status = Some(GateStatus::unmarshal(&ie.payload)?),
                IeType::Mbr => mbr = Some(Mbr::unmarshal(&ie.payload)?),
                IeType::Qfi => qfi = Some(Qfi::unmarshal(&ie.payload)?),
                _ => {}
            }
        }

        Ok(CreateQer {
            qer_id: qer_id.ok_or_else(|| Error::Protocol("Create QER missing QER ID".into()))?,
            gate_status: gate_status.unwrap_or_default(),
            mbr,
            qfi,
        })
    }

    pub fn to_ie(&self) -> Ie {
        Ie::new(IeType::CreateQer, self.marshal())
    }
}
