//! QER ID IE.

use crate::error::{Error, Result};
use crate::pfcp::ie::{Ie, IeType};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct QerId(pub u32);

impl QerId {
    pub fn new(id: u32) -> Self {
        QerId(id)
    }

    pub fn marshal(&self) -> [u8; 4] {
        self.0.to_be_bytes()
    }

    pub fn unmarshal(data: &[u8]) -> Result<Self> {
        if data.len() < 4 {
            return Err(Error::Protocol("QER ID needs 4 bytes".into()));
        }
        Ok(QerId(u32::from_be_bytes(data[0..4].try_into().unwrap())))
    }

    pub fn to_ie(&self) -> Ie {
        Ie::new(IeType::QerId, self.marshal().to_vec())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn roundtrip() {
        let id = QerId::new(1);
        assert_eq!(QerId::unmarshal(&id.marshal()).unwrap(), id);
    }
}
