//! Outer Header Removal IE.

use crate::error::{Error, Result};
use crate::pfcp::ie::{Ie, IeType};

/// Instructs the UPF to strip the GTP-U/UDP/IPv4 outer header before
/// forwarding. The description octet 0 is the only value this core emits.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct OuterHeaderRemoval {
    pub description: u8,
}

impl OuterHeaderRemoval {
    pub fn gtpu_udp_ipv4() -> Self {
        OuterHeaderRemoval { description: 0 }
    }

    pub fn marshal(&self) -> [u8; 1] {
        [self.description]
    }

    pub fn unmarshal(data: &[u8]) -> Result<Self> {
        let first = data
            .first()
            .ok_or_else(|| Error::Protocol("empty Outer Header Removal payload".into()))?;
        Ok(OuterHeaderRemoval { description: *first })
    }

    pub fn to_ie(&self) -> Ie {
        Ie::new(IeType::OuterHeaderRemoval, self.marshal().to_vec())
    }
}
