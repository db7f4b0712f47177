//! Create FAR grouped IE.

use crate::error::{Error, Result};
use crate::pfcp::ie::apply_action::ApplyAction;
use crate::pfcp::ie::far_id::FarId;
use crate::pfcp::ie::forwarding_parameters::ForwardingParameters;
use crate::pfcp::ie::{ies_in, Ie, IeType};

/// A Forwarding Action Rule to install.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CreateFar {
    pub far_id: FarId,
    pub apply_action: ApplyAction,
    pub forwarding_parameters: Option<ForwardingParameters>,
}

impl CreateFar {
    pub fn new(far_id: FarId, apply_action: ApplyAction) -> Self {
        CreateFar {
            far_id,
            apply_action,
            forwarding_parameters: None,
        }
    }

    pub fn with_forwarding_parameters(mut self, params: ForwardingParameters) -> Self {
        self.forwarding_parameters = Some(params);
        self
    }

    pub fn marshal(&self) -> Vec<u8> {
        let mut buf = Vec::new();
        self.far_id.to_ie().marshal_into(&mut buf);
        self.apply_action.to_ie().marshal_into(&mut buf);
        if let Some(params) = &self.forwarding_parameters {
            params.to_ie().marshal_into(&mut buf);
        }
        buf
    }

    pub fn unmarshal(payload: &[u8]) -> Result<Self> {
        let mut far_id = None;
        let mut apply_action = None;
        let mut forwarding_parameters = None;

        for ie in ies_in(payload) {
            let ie = ie?;
            match ie.ie_type {
                IeType::FarId => far_id = Some(FarId::unmarshal(&ie.payload)?),
                IeType::ApplyAction => apply_action = Some(ApplyAction::unmarshal(&ie.payload)?),
                IeType::ForwardingParameters => {
                    forwarding_parameters = Some(ForwardingParameters::unmarshal(&ie.payload)?)
                }
                _ => {}
            }
        }

        Ok(CreateFar {
            far_id: far_id.ok_or_else(|| Error::Protocol("Create FAR missing FAR ID".into()))?,
            apply_action: apply_action
                .ok_or_else(|| Error::Protocol("Create FAR missing Apply Action".into()))?,
            forwarding_parameters,
        })
    }

    pub fn to_ie(&self) -> Ie {
        Ie::new(IeType::CreateFar, self.marshal())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pfcp::ie::destination_interface::DestinationInterface;

    #[test]
    fn forward_roundtrip() {
        let far = CreateFar::new(FarId::new(1), ApplyAction::FORW).with_forwarding_parameters(
            ForwardingParameters::new(DestinationInterface::Core),
        );
        assert_eq!(CreateFar::unmarshal(&far.marshal()).unwrap(), far);
    }

    #[test]
    fn drop_without_parameters_roundtrip() {
        let far = CreateFar::new(FarId::new(2), ApplyAction::DROP);
        assert_eq!(CreateFar::unmarshal(&far.marshal()).unwrap(), far);
    }
}
