//! FAR ID IE.

use crate::error::{Error, Result};
use crate::pfcp::ie::{Ie, IeType};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct FarId(pub u32);

impl FarId {
    pub fn new(id: u32) -> Self {
        FarId(id)
    }

    pub fn marshal(&self) -> [u8; 4] {
        self.0.to_be_bytes()
    }

    pub fn unmarshal(data: &[u8]) -> Result<Self> {
        if data.len() < 4 {
            return Err(Error::Protocol("FAR ID needs 4 bytes".into()));
        }
        Ok(FarId(u32::from_be_bytes(data[0..4].try_into().unwrap())))
    }

    pub fn to_ie(&self) -> Ie {
        Ie::new(IeType::FarId, self.marshal().to_vec())
    }
}
