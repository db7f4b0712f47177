//! PDI (Packet Detection Information) grouped IE.

use crate::error::{Error, Result};
use crate::pfcp::ie::f_teid::Fteid;
use crate::pfcp::ie::network_instance::NetworkInstance;
use crate::pfcp::ie::source_interface::SourceInterface;
use crate::pfcp::ie::ue_ip_address::UeIpAddress;
use crate::pfcp::ie::{ies_in, Ie, IeType};

/// The match half of a PDR: source interface plus optional F-TEID and UE IP
/// filters.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Pdi {
    pub source_interface: SourceInterface,
    pub f_teid: Option<Fteid>,
    pub ue_ip_address: Option<UeIpAddress>,
    pub network_instance: Option<NetworkInstance>,
}

impl Pdi {
    /// Uplink template: traffic arriving from the gNB.
    pub fn uplink_access() -> Self {
        Pdi {
            source_interface: SourceInterface::Access,
            f_teid: None,
            ue_ip_address: None,
            network_instance: None,
        }
    }

    /// Downlink template: traffic arriving from the data network.
    pub fn downlink_core() -> Self {
        Pdi {
            source_interface: SourceInterface::Core,
            f_teid: None,
            ue_ip_address: None,
            network_instance: None,
        }
    }

    pub fn with_f_teid(mut self, f_teid: Fteid) -> Self {
        self.f_teid = Some(f_teid);
        self
    }

    pub fn with_ue_ip(mut self, ue_ip: UeIpAddress) -> Self {
        self.ue_ip_address = Some(ue_ip);
        self
    }

    pub fn with_network_instance(mut self, ni: NetworkInstance) -> Self {
        self.network_instance = Some(ni);
        self
    }

    pub fn marshal(&self) -> Vec<u8> {
        let mut buf = Vec::new();
        self.source_interface.to_ie().marshal_into(&mut buf);
        if let Some(f_teid) = &self.f_teid {
            f_teid.to_ie().marshal_into(&mut buf);
        }
        if let Some(ue_ip) = &self.ue_ip_address {
            ue_ip.to_ie().marshal_into(&mut buf);
        }
        if let Some(ni) = &self.network_instance {
            ni.to_ie().marshal_into(&mut buf);
        }
        buf
    }

    pub fn unmarshal(payload: &[u8]) -> Result<Self> {
        let mut source_interface = None;
        let mut f_teid = None;
        let mut ue_ip_address = None;
        let mut network_instance = None;

        for ie in ies_in(payload) {
            let ie = ie?;
            match ie.ie_type {
                IeType::SourceInterface => {
                    source_interface = Some(SourceInterface::unmarshal(&ie.payload)?)
                }
                IeType::Fteid => f_teid = Some(Fteid::unmarshal(&ie.payload)?),
                IeType::UeIpAddress => ue_ip_address = Some(UeIpAddress::unmarshal(&ie.payload)?),
                IeType::NetworkInstance => {
                    network_instance = Some(NetworkInstance::unmarshal(&ie.payload)?)
                }
                _ => {}
            }
        }

        Ok(Pdi {
            source_interface: source_interface
                .ok_or_else(|| Error::Protocol("PDI missing Source Interface".into()))?,
            f_teid,
            ue_ip_address,
            network_instance,
        })
    }

    pub fn to_ie(&self) -> Ie {
        Ie::new(IeType::Pdi, self.marshal())
    }
}
