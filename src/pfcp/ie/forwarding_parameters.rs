//! Forwarding Parameters grouped IE.

use crate::error::{Error, Result};
use crate::pfcp::ie::destination_interface::DestinationInterface;
use crate::pfcp::ie::network_instance::NetworkInstance;
use crate::pfcp::ie::outer_header_creation::OuterHeaderCreation;
use crate::pfcp::ie::{ies_in, Ie, IeType};

/// Where and how a FAR forwards: destination interface, optional DNN, and
/// optional GTP-U encapsulation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ForwardingParameters {
    pub destination_interface: DestinationInterface,
    pub network_instance: Option<NetworkInstance>,
    pub outer_header_creation: Option<OuterHeaderCreation>,
}

impl ForwardingParameters {
    pub fn new(destination_interface: DestinationInterface) -> Self {
        ForwardingParameters {
            destination_interface,
            network_instance: None,
            outer_header_creation: None,
        }
    }

    pub fn with_network_instance(mut self, ni: NetworkInstance) -> Self {
        self.network_instance = Some(ni);
        self
    }

    pub fn with_outer_header_creation(mut self, ohc: OuterHeaderCreation) -> Self {
        self.outer_header_creation = Some(ohc);
        self
    }

    pub fn marshal(&self) -> Vec<u8> {
        let mut buf = Vec::new();
        self.destination_interface.to_ie().marshal_into(&mut buf);
        if let Some(ni) = &self.network_instance {
            ni.to_ie().marshal_into(&mut buf);
        }
        if let Some(ohc) = &self.outer_header_creation {
            ohc.to_ie().marshal_into(&mut buf);
        }
        buf
    }

    pub fn unmarshal(payload: &[u8]) -> Result<Self> {
        let mut destination_interface = None;
        let mut network_instance = None;
        let mut outer_header_creation = None;

        for ie in ies_in(payload) {
            let ie = ie?;
            match ie.ie_type {
                IeType::DestinationInterface => {
                    destination_interface = Some(DestinationInterface::unmarshal(&ie.payload)?)
                }
                IeType::NetworkInstance => {
                    network_instance = Some(NetworkInstance::unmarshal(&ie.payload)?)
                }
                IeType::OuterHeaderCreation => {
                    outer_header_creation = Some(OuterHeaderCreation::unmarshal(&ie.payload)?)
                }
                _ => {}
            }
        }

        Ok(ForwardingParameters {
            destination_interface: destination_interface.ok_or_else(|| {
                Error::Protocol("Forwarding Parameters missing Destination Interface".into())
            })?,
            network_instance,
            outer_header_creation,
        })
    }

    pub fn to_ie(&self) -> Ie {
        Ie::new(IeType::ForwardingParameters, self.marshal())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn core_forward_roundtrip() {
        let params = ForwardingParameters::new(DestinationInterface::Core)
            .with_network_instance(NetworkInstance::new("internet"));
        assert_eq!(
            ForwardingParameters::unmarshal(&params.marshal()).unwrap(),
            params
        );
    }

    #[test]
    fn access_forward_with_encap_roundtrip() {
        let params = ForwardingParameters::new(DestinationInterface::Access)
            .with_outer_header_creation(OuterHeaderCreation::gtpu_udp_ipv4(
                0x100,
                "10.10.0.1".parse().unwrap(),
            ));
        assert_eq!(
            ForwardingParameters::unmarshal(&params.marshal()).unwrap(),
            params
        );
    }
}
