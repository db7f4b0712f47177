//! Apply Action Information Element.

use bitflags::bitflags;

use crate::error::{Error, Result};
use crate::pfcp::ie::{Ie, IeType};

bitflags! {
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
    pub struct ApplyAction: u8 {
        const DROP = 1 << 0;
        const FORW = 1 << 1;
        const BUFF = 1 << 2;
        const NOCP = 1 << 3;
        const DUPL = 1 << 4;
    }
}

impl ApplyAction {
    pub fn marshal(&self) -> [u8; 1] {
        [self.bits()]
    }

    pub fn unmarshal(data: &[u8]) -> Result<Self> {
        let first = data
            .first()
            .ok_or_else(|| Error::Protocol("empty Apply Action payload".into()))?;
        Ok(ApplyAction::from_bits_truncate(*first))
    }

    pub fn to_ie(&self) -> Ie {
        Ie::new(IeType::ApplyAction, self.marshal().to_vec())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn roundtrip() {
        let action = ApplyAction::FORW;
        assert_eq!(ApplyAction::unmarshal(&action.marshal()).unwrap(), action);
    }

    #[test]
    fn unknown_bits_are_truncated() {
        let parsed = ApplyAction::unmarshal(&[0xe1]).unwrap();
        assert!(parsed.contains(ApplyAction::DROP));
        assert!(!parsed.contains(ApplyAction::FORW));
    }
}
