//! PDR ID IE.

use crate::error::{Error, Result};
use crate::pfcp::ie::{Ie, IeType};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct PdrId(pub u16);

impl PdrId {
    pub fn new(id: u16) -> Self {
        PdrId(id)
    }

    pub fn marshal(&self) -> [u8; 2] {
        self.0.to_be_bytes()
    }

    pub fn unmarshal(data: &[u8]) -> Result<Self> {
        if data.len() < 2 {
            return Err(Error::Protocol("PDR ID needs 2 bytes".into()));
        }
        Ok(PdrId(u16::from_be_bytes([data[0], data[1]])))
    }

    pub fn to_ie(&self) -> Ie {
        Ie::new(IeType::PdrId, self.marshal().to_vec())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn roundtrip() {
        let id = PdrId::new(0x1234);
        assert_eq!(PdrId::unmarshal(&id.marshal()).unwrap(), id);
        assert!(PdrId::unmarshal(&[1]).is_err());
    }
}
