//! QFI IE.

use crate::error::{Error, Result};
use crate::pfcp::ie::{Ie, IeType};

/// QoS Flow Identifier, 6 bits (1..=63).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Qfi(pub u8);

impl Qfi {
    pub fn new(value: u8) -> Self {
        Qfi(value & 0x3f)
    }

    pub fn marshal(&self) -> [u8; 1] {
        [self.0 & 0x3f]
    }

    pub fn unmarshal(data: &[u8]) -> Result<Self> {
        let first = data
            .first()
            .ok_or_else(|| Error::Protocol("empty QFI payload".into()))?;
        Ok(Qfi(first & 0x3f))
    }

    pub fn to_ie(&self) -> Ie {
        Ie::new(IeType::Qfi, self.marshal().to_vec())
    }
}
