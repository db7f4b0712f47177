//! Precedence IE.

use crate::error::{Error, Result};
use crate::pfcp::ie::{Ie, IeType};

/// PDR match order: higher precedence is evaluated first by this UPF.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Precedence(pub u32);

impl Precedence {
    pub fn new(value: u32) -> Self {
        Precedence(value)
    }

    pub fn marshal(&self) -> [u8; 4] {
        self.0.to_be_bytes()
    }

    pub fn unmarshal(data: &[u8]) -> Result<Self> {
        if data.len() < 4 {
            return Err(Error::Protocol("Precedence needs 4 bytes".into()));
        }
        Ok(Precedence(u32::from_be_bytes(data[0..4].try_into().unwrap())))
    }

    pub fn to_ie(&self) -> Ie {
        Ie::new(IeType::Precedence, self.marshal().to_vec())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn roundtrip() {
        let p = Precedence::new(255);
        assert_eq!(Precedence::unmarshal(&p.marshal()).unwrap(), p);
    }
}
